use anyhow::{anyhow, bail, Result};
use dialoguer::Confirm;
use std::os::unix::fs::MetadataExt;

pub fn confirm_or_yes(yes: bool, prompt: &str) -> Result<()> {
    if yes {
        return Ok(());
    }
    let confirmed = Confirm::new()
        .with_prompt(prompt)
        .default(false)
        .interact()
        .map_err(|e| anyhow!("prompt failed: {e}"))?;
    if confirmed {
        Ok(())
    } else {
        bail!("aborted by user")
    }
}

/// `/proc/self` belongs to the effective uid of the current process.
pub fn is_root() -> bool {
    euid_of("/proc/self") == Some(0)
}

fn euid_of(proc_dir: &str) -> Option<u32> {
    match std::fs::metadata(proc_dir) {
        Ok(meta) => Some(meta.uid()),
        Err(e) => {
            debug!("cannot stat {proc_dir}: {e}");
            None
        }
    }
}

/// Quote `arg` for a POSIX shell so it survives word splitting and globbing.
pub fn shell_quote(arg: &str) -> String {
    let plain = !arg.is_empty()
        && arg
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || b"_-./=:,+@%".contains(&b));
    if plain {
        arg.to_string()
    } else {
        format!("'{}'", arg.replace('\'', r"'\''"))
    }
}
