use serde::Serialize;
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use super::command::BootCommand;
use super::error::RenameError;

/// Label argument that matches every boot entry.
pub const ANY_LABEL: &str = "*";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Partition {
    pub device_path: String,
    pub uuid: String,
}

/// Partition UUID (lowercase) to device path.
#[derive(Debug, Clone, Default)]
pub struct PartitionIndex {
    by_uuid: HashMap<String, String>,
}

impl PartitionIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Later inserts for the same UUID replace earlier ones; the replaced
    /// device path is returned.
    pub fn insert(&mut self, partition: Partition) -> Option<String> {
        self.by_uuid
            .insert(partition.uuid.to_ascii_lowercase(), partition.device_path)
    }

    pub fn get(&self, uuid: &str) -> Option<&str> {
        self.by_uuid
            .get(&uuid.to_ascii_lowercase())
            .map(String::as_str)
    }

    pub fn uuids(&self) -> impl Iterator<Item = &str> {
        self.by_uuid.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.by_uuid.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_uuid.is_empty()
    }
}

/// Four hex digit boot entry number, stored uppercase as efibootmgr prints it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct BootNum(String);

impl BootNum {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl FromStr for BootNum {
    type Err = RenameError;

    fn from_str(input: &str) -> Result<Self, Self::Err> {
        let s = input.trim();
        let s = s.strip_prefix("Boot").unwrap_or(s);
        if s.len() == 4 && s.bytes().all(|b| b.is_ascii_hexdigit()) {
            Ok(BootNum(s.to_ascii_uppercase()))
        } else {
            Err(RenameError::InvalidBootNum(input.to_string()))
        }
    }
}

impl fmt::Display for BootNum {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BootEntry {
    pub boot_num: BootNum,
    pub active: bool,
    pub label: String,
    pub partition_index: u32,
    pub partition_uuid: String,
    pub loader_path: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LabelFilter {
    Any,
    Exact(String),
}

impl LabelFilter {
    pub fn matches(&self, label: &str) -> bool {
        match self {
            LabelFilter::Any => true,
            LabelFilter::Exact(wanted) => wanted == label,
        }
    }
}

impl From<&str> for LabelFilter {
    fn from(label: &str) -> Self {
        if label == ANY_LABEL {
            LabelFilter::Any
        } else {
            LabelFilter::Exact(label.to_string())
        }
    }
}

impl fmt::Display for LabelFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LabelFilter::Any => f.write_str(ANY_LABEL),
            LabelFilter::Exact(label) => write!(f, "'{label}'"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DeviceFamily {
    Scsi,
    Nvme,
    Mmc,
}

/// A partition device path split into its whole-disk device and number.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DiskPartition {
    pub family: DeviceFamily,
    pub device: String,
    pub disk: String,
    pub number: u32,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenameRequest {
    pub old_label: LabelFilter,
    pub new_label: String,
    pub boot_num: Option<BootNum>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RenamePlan {
    pub delete: BootCommand,
    pub create: BootCommand,
}
