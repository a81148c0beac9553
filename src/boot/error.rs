use thiserror::Error;

use super::types::BootNum;

/// Failures of the rename pipeline. Every variant aborts before any
/// boot entry is touched.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RenameError {
    #[error("no boot entry matches {filter}")]
    NotFound { filter: String },

    #[error(
        "label {label} is ambiguous: Boot{first} and Boot{second} both match, pass a BOOTNUM to pick one"
    )]
    Ambiguous {
        label: String,
        first: BootNum,
        second: BootNum,
    },

    #[error("partition {uuid} of Boot{boot_num} is not currently known to the system")]
    UnknownPartition { boot_num: BootNum, uuid: String },

    #[error("unrecognized device path format: {path}")]
    DeviceFormat { path: String },

    #[error(
        "Boot{boot_num} points at partition {expected} but {device} is partition {found}, refusing to rename"
    )]
    PartitionMismatch {
        boot_num: BootNum,
        device: String,
        expected: u32,
        found: u32,
    },

    #[error("invalid bootnum '{0}': expected 4 hex digits")]
    InvalidBootNum(String),

    #[error("modifying boot entries requires root privileges")]
    InsufficientPrivilege,
}

pub type RenameResult<T> = Result<T, RenameError>;
