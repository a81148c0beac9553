use super::probe::SystemProbe;
use super::types::{Partition, PartitionIndex};

/// Parse `sfdisk --dump` output into partitions.
///
/// Only `<device> : key=value, ...` lines carrying a `uuid=` key are kept,
/// which drops the dump header (`label:`, `label-id:`, `device:`, `unit:`).
pub fn parse_partition_records(text: &str) -> Vec<Partition> {
    text.lines().filter_map(parse_partition_record).collect()
}

fn parse_partition_record(line: &str) -> Option<Partition> {
    let (device, attrs) = line.split_once(':')?;
    let device = device.trim();
    if device.is_empty() || device.contains(char::is_whitespace) {
        return None;
    }

    let uuid = attrs
        .split(',')
        .find_map(|attr| attr.trim().strip_prefix("uuid="))?
        .trim()
        .trim_matches('"');
    if uuid.is_empty() {
        return None;
    }

    Some(Partition {
        device_path: device.to_string(),
        uuid: uuid.to_ascii_lowercase(),
    })
}

/// Index the partitions of every disk, in enumeration order.
///
/// A disk whose table cannot be read contributes nothing. A UUID seen
/// twice keeps the device from the disk scanned last.
pub fn build_partition_index<P: SystemProbe + ?Sized>(
    probe: &P,
    disks: &[String],
) -> PartitionIndex {
    let mut index = PartitionIndex::new();

    for disk in disks {
        let table = match probe.read_partition_table(disk) {
            Ok(table) => table,
            Err(e) => {
                warn!("skipping {disk}: {e:#}");
                continue;
            }
        };

        for partition in parse_partition_records(&table) {
            debug!("{} -> {}", partition.uuid, partition.device_path);
            let uuid = partition.uuid.clone();
            let device = partition.device_path.clone();
            if let Some(previous) = index.insert(partition) {
                warn!("duplicate partition uuid {uuid}: {device} replaces {previous}");
            }
        }
    }

    if index.is_empty() {
        warn!("no partitions with a UUID were found on any disk");
    } else {
        debug!(
            "indexed {} partition(s) across {} disk(s)",
            index.len(),
            disks.len()
        );
    }
    index
}
