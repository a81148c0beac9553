use super::error::{RenameError, RenameResult};
use super::types::{BootEntry, DeviceFamily, DiskPartition, PartitionIndex};

impl DeviceFamily {
    const ALL: [DeviceFamily; 3] = [DeviceFamily::Scsi, DeviceFamily::Nvme, DeviceFamily::Mmc];

    /// Split `path` if it belongs to this family.
    ///
    /// `/dev/sdX<n>` has no separator; `/dev/nvmeXnY` and `/dev/mmcblkX`
    /// always put a `p` before the partition number.
    fn decompose(self, path: &str) -> Option<DiskPartition> {
        let number = match self {
            DeviceFamily::Scsi => {
                let rest = path.strip_prefix("/dev/sd")?;
                let letters = rest.bytes().take_while(|b| b.is_ascii_lowercase()).count();
                if letters == 0 {
                    return None;
                }
                &rest[letters..]
            }
            DeviceFamily::Nvme => {
                let rest = path.strip_prefix("/dev/nvme")?;
                let rest = skip_digits(rest)?.strip_prefix('n')?;
                skip_digits(rest)?.strip_prefix('p')?
            }
            DeviceFamily::Mmc => {
                let rest = path.strip_prefix("/dev/mmcblk")?;
                skip_digits(rest)?.strip_prefix('p')?
            }
        };

        if number.is_empty() || !number.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }

        let disk_len = path.len() - number.len();
        let disk = match self {
            DeviceFamily::Scsi => &path[..disk_len],
            DeviceFamily::Nvme | DeviceFamily::Mmc => &path[..disk_len - 1],
        };

        Some(DiskPartition {
            family: self,
            device: path.to_string(),
            disk: disk.to_string(),
            number: number.parse().ok()?,
        })
    }
}

fn skip_digits(s: &str) -> Option<&str> {
    let digits = s.bytes().take_while(|b| b.is_ascii_digit()).count();
    (digits > 0).then(|| &s[digits..])
}

pub fn decompose_device_path(path: &str) -> RenameResult<DiskPartition> {
    DeviceFamily::ALL
        .iter()
        .find_map(|family| family.decompose(path))
        .ok_or_else(|| RenameError::DeviceFormat {
            path: path.to_string(),
        })
}

/// Resolve the entry's partition on the running system and make sure the
/// partition table agrees with the firmware about its number.
pub fn validate_entry(entry: &BootEntry, index: &PartitionIndex) -> RenameResult<DiskPartition> {
    let device = index
        .get(&entry.partition_uuid)
        .ok_or_else(|| RenameError::UnknownPartition {
            boot_num: entry.boot_num.clone(),
            uuid: entry.partition_uuid.clone(),
        })?;

    let target = decompose_device_path(device)?;
    debug!(
        "Boot{} lives on {} ({:?} disk {}, partition {})",
        entry.boot_num, target.device, target.family, target.disk, target.number
    );

    if target.number != entry.partition_index {
        return Err(RenameError::PartitionMismatch {
            boot_num: entry.boot_num.clone(),
            device: target.device,
            expected: entry.partition_index,
            found: target.number,
        });
    }
    Ok(target)
}
