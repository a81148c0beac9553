use serde::{Deserialize, Serialize};

use super::command::BOOT_MANAGER;

/// `[tools]` table: binaries used to inspect and modify the system.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ToolsConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub efibootmgr: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lsblk: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sfdisk: Option<String>,
}

impl ToolsConfig {
    pub fn with_defaults() -> Self {
        Self {
            efibootmgr: Some(BOOT_MANAGER.to_string()),
            lsblk: Some("lsblk".to_string()),
            sfdisk: Some("sfdisk".to_string()),
        }
    }
}
