use super::error::{RenameError, RenameResult};
use super::types::{BootEntry, BootNum, LabelFilter};

/// Parse one line of `efibootmgr -v` output.
///
/// Accepted shapes, with `*` marking an active entry:
///
/// ```text
/// Boot0001* ubuntu	HD(1,GPT,<uuid>,0x800,0x100000)/File(\EFI\ubuntu\shimx64.efi)
/// Boot0001* ubuntu	HD(1,GPT,<uuid>,0x800,0x100000)/\EFI\ubuntu\shimx64.efi
/// ```
///
/// Anything else (header lines, MBR disks, firmware apps) yields `None`.
pub fn parse_boot_entry(line: &str) -> Option<BootEntry> {
    let rest = line.trim_end().strip_prefix("Boot")?;
    let boot_num: BootNum = rest.get(..4)?.parse().ok()?;
    let rest = &rest[4..];
    let (active, rest) = match rest.strip_prefix('*') {
        Some(rest) => (true, rest),
        None => (false, rest),
    };
    if !rest.starts_with(char::is_whitespace) {
        return None;
    }

    let (label, device_path) = match rest.split_once('\t') {
        Some(split) => split,
        None => {
            let at = rest.find(" HD(")?;
            (&rest[..at], &rest[at + 1..])
        }
    };
    let label = label.trim();
    if label.is_empty() {
        return None;
    }

    let (hd_args, tail) = find_hd_node(device_path)?
        .strip_prefix("HD(")?
        .split_once(')')?;
    let mut fields = hd_args.split(',').map(str::trim);
    let partition_index: u32 = fields.next()?.parse().ok()?;
    if fields.next()? != "GPT" {
        return None;
    }
    let partition_uuid = fields.next()?;
    if partition_uuid.is_empty()
        || !partition_uuid
            .bytes()
            .all(|b| b.is_ascii_hexdigit() || b == b'-')
    {
        return None;
    }

    let loader_path = parse_loader(tail.strip_prefix('/')?)?;

    Some(BootEntry {
        boot_num,
        active,
        label: label.to_string(),
        partition_index,
        partition_uuid: partition_uuid.to_ascii_lowercase(),
        loader_path: loader_path.to_string(),
    })
}

/// The `HD(...)` node, either first in the device path or after a `/`
/// (`PciRoot(0x0)/Pci(0x1d,0x0)/NVMe(...)/HD(...)`).
fn find_hd_node(device_path: &str) -> Option<&str> {
    device_path
        .match_indices("HD(")
        .map(|(at, _)| at)
        .find(|&at| at == 0 || device_path[..at].ends_with('/'))
        .map(|at| &device_path[at..])
}

fn parse_loader(path: &str) -> Option<&str> {
    let loader = match path.strip_prefix("File(") {
        Some(wrapped) => {
            let close = matching_paren(wrapped)?;
            // a later ')' means the close cannot be told apart from optional data
            let trailing = wrapped[close + 1..].split('\t').next()?;
            if trailing.contains(')') {
                return None;
            }
            &wrapped[..close]
        }
        None => {
            // efibootmgr 18+ prints the path bare, optional data follows a tab
            let bare = path.split('\t').next()?.trim_end();
            if !bare.starts_with('\\') {
                return None;
            }
            bare
        }
    };
    (!loader.is_empty()).then_some(loader)
}

/// Byte offset of the `)` closing an already opened `File(`.
fn matching_paren(text: &str) -> Option<usize> {
    let mut depth = 0usize;
    for (at, c) in text.char_indices() {
        match c {
            '(' => depth += 1,
            ')' if depth == 0 => return Some(at),
            ')' => depth -= 1,
            _ => {}
        }
    }
    None
}

pub fn parse_boot_entries(text: &str) -> Vec<BootEntry> {
    text.lines().filter_map(parse_boot_entry).collect()
}

/// Pick the single entry to rename.
///
/// Entries are scanned in firmware order. Without a bootnum the first
/// matching entry is taken and a second match is reported as ambiguous
/// right away; with a bootnum only that entry can be selected.
pub fn locate_entry(
    entries: &[BootEntry],
    label: &LabelFilter,
    boot_num: Option<&BootNum>,
) -> RenameResult<BootEntry> {
    let mut candidate: Option<&BootEntry> = None;

    for entry in entries.iter().filter(|e| label.matches(&e.label)) {
        match (candidate, boot_num) {
            (None, None) => candidate = Some(entry),
            (None, Some(wanted)) if *wanted == entry.boot_num => candidate = Some(entry),
            (Some(first), None) => {
                return Err(RenameError::Ambiguous {
                    label: label.to_string(),
                    first: first.boot_num.clone(),
                    second: entry.boot_num.clone(),
                });
            }
            _ => debug!("skipping Boot{} '{}'", entry.boot_num, entry.label),
        }
    }

    candidate.cloned().ok_or_else(|| RenameError::NotFound {
        filter: match boot_num {
            Some(num) => format!("label {label} with bootnum {num}"),
            None => format!("label {label}"),
        },
    })
}
