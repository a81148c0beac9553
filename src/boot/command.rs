use serde::Serialize;
use std::fmt;

use super::types::{BootEntry, BootNum, DiskPartition, RenamePlan};
use super::utils::shell_quote;

pub const BOOT_MANAGER: &str = "efibootmgr";

/// What a boot manager invocation does to NVRAM.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "action", rename_all = "lowercase")]
pub enum BootAction {
    Delete {
        boot_num: BootNum,
    },
    Create {
        disk: String,
        partition: u32,
        label: String,
        loader: String,
    },
}

/// One boot manager invocation. The same value is printed for
/// confirmation and executed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BootCommand {
    pub program: String,
    #[serde(flatten)]
    pub action: BootAction,
}

impl BootCommand {
    pub fn new(program: &str, action: BootAction) -> Self {
        Self {
            program: program.to_string(),
            action,
        }
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    /// Argument vector passed to the boot manager, one element per argument.
    pub fn args(&self) -> Vec<String> {
        match &self.action {
            BootAction::Delete { boot_num } => {
                vec!["-b".into(), boot_num.to_string(), "-B".into()]
            }
            BootAction::Create {
                disk,
                partition,
                label,
                loader,
            } => vec![
                "-c".into(),
                "-d".into(),
                disk.clone(),
                "-p".into(),
                partition.to_string(),
                "-L".into(),
                label.clone(),
                "-l".into(),
                loader.clone(),
            ],
        }
    }
}

/// Shell form shown before confirmation. The loader is quoted, the label
/// is printed as given.
impl fmt::Display for BootCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let program = shell_quote(&self.program);
        match &self.action {
            BootAction::Delete { boot_num } => write!(f, "{program} -b {boot_num} -B"),
            BootAction::Create {
                disk,
                partition,
                label,
                loader,
            } => write!(
                f,
                "{program} -c -d {} -p {partition} -L \"{label}\" -l {}",
                shell_quote(disk),
                shell_quote(loader)
            ),
        }
    }
}

/// Commands that replace `entry` with an identical one named `new_label`,
/// both run through `program`.
pub fn build_rename_plan(
    program: &str,
    target: &DiskPartition,
    entry: &BootEntry,
    new_label: &str,
) -> RenamePlan {
    RenamePlan {
        delete: BootCommand::new(
            program,
            BootAction::Delete {
                boot_num: entry.boot_num.clone(),
            },
        ),
        create: BootCommand::new(
            program,
            BootAction::Create {
                disk: target.disk.clone(),
                partition: target.number,
                label: new_label.to_string(),
                loader: entry.loader_path.clone(),
            },
        ),
    }
}
