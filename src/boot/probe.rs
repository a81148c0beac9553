use anyhow::{anyhow, bail, Result};
use std::process::Command;

use super::command::{BootCommand, BOOT_MANAGER};
use super::config::ToolsConfig;

/// Access to the running system: block devices, partition tables and the
/// firmware boot entries.
pub trait SystemProbe {
    /// Whole-disk device names (`sda`, `nvme0n1`, ...) in enumeration order.
    fn list_disks(&self) -> Result<Vec<String>>;

    /// Raw `sfdisk --dump` style partition records of one disk.
    fn read_partition_table(&self, disk: &str) -> Result<String>;

    /// Raw `efibootmgr -v` listing, in firmware order.
    fn read_boot_entries(&self) -> Result<String>;

    /// Binary the rename commands are built for and run with.
    fn boot_manager(&self) -> &str {
        BOOT_MANAGER
    }

    fn apply(&self, command: &BootCommand) -> Result<()>;
}

/// Probe backed by the util-linux and efibootmgr binaries.
pub struct HostProbe {
    efibootmgr: String,
    lsblk: String,
    sfdisk: String,
}

impl HostProbe {
    pub fn new(tools: ToolsConfig) -> Self {
        Self {
            efibootmgr: tools.efibootmgr.unwrap_or_else(|| BOOT_MANAGER.to_string()),
            lsblk: tools.lsblk.unwrap_or_else(|| "lsblk".to_string()),
            sfdisk: tools.sfdisk.unwrap_or_else(|| "sfdisk".to_string()),
        }
    }
}

impl SystemProbe for HostProbe {
    fn list_disks(&self) -> Result<Vec<String>> {
        let out = capture(&self.lsblk, &["-d", "-n", "-o", "NAME,TYPE"])?;
        Ok(parse_disk_list(&out))
    }

    fn read_partition_table(&self, disk: &str) -> Result<String> {
        let device = if disk.starts_with("/dev/") {
            disk.to_string()
        } else {
            format!("/dev/{disk}")
        };
        capture(&self.sfdisk, &["--dump", &device])
    }

    fn read_boot_entries(&self) -> Result<String> {
        capture(&self.efibootmgr, &["-v"])
    }

    fn boot_manager(&self) -> &str {
        &self.efibootmgr
    }

    fn apply(&self, command: &BootCommand) -> Result<()> {
        info!("running: {command}");
        let program = command.program();
        let status = Command::new(program)
            .args(command.args())
            .status()
            .map_err(|e| anyhow!("failed to run {program}: {e}"))?;
        if !status.success() {
            bail!("{program} failed with {status}");
        }
        Ok(())
    }
}

fn capture(program: &str, args: &[&str]) -> Result<String> {
    debug!("exec: {} {}", program, args.join(" "));
    let output = Command::new(program)
        .args(args)
        .output()
        .map_err(|e| anyhow!("failed to run {program}: {e}"))?;
    if !output.status.success() {
        bail!(
            "{program} failed with {}: {}",
            output.status,
            String::from_utf8_lossy(&output.stderr).trim()
        );
    }
    Ok(String::from_utf8_lossy(&output.stdout).into_owned())
}

/// Keep the `disk` rows of `lsblk -d -n -o NAME,TYPE`.
pub fn parse_disk_list(text: &str) -> Vec<String> {
    text.lines()
        .filter_map(|line| {
            let mut cols = line.split_whitespace();
            let name = cols.next()?;
            (cols.next()? == "disk").then(|| name.to_string())
        })
        .collect()
}
