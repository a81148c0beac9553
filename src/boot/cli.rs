use anyhow::{bail, Result};
use clap::Args;

use super::types::{BootNum, LabelFilter, RenameRequest, ANY_LABEL};

#[derive(Args, Debug)]
pub struct RenameCli {
    /// Current label of the boot entry, or `*` to match any label
    #[arg(value_name = "OLD_LABEL", required_unless_present = "gen_config")]
    pub old_label: Option<String>,

    /// Label to give the boot entry
    #[arg(value_name = "NEW_LABEL", required_unless_present = "gen_config")]
    pub new_label: Option<String>,

    /// Boot entry number (e.g. 0003) when several entries share the label
    #[arg(value_name = "BOOTNUM")]
    pub boot_num: Option<BootNum>,

    /// Skip confirmation
    #[arg(short = 'y', long)]
    pub yes: bool,

    /// Print the commands without running them
    #[arg(long)]
    pub dry_run: bool,

    /// Print the commands as JSON
    #[arg(long)]
    pub json: bool,
}

impl RenameCli {
    pub fn request(&self) -> Result<RenameRequest> {
        let (Some(old_label), Some(new_label)) = (&self.old_label, &self.new_label) else {
            bail!("both OLD_LABEL and NEW_LABEL are required");
        };
        if new_label.trim().is_empty() {
            bail!("NEW_LABEL must not be empty");
        }
        if new_label == ANY_LABEL {
            bail!("NEW_LABEL cannot be the wildcard {ANY_LABEL}");
        }
        Ok(RenameRequest {
            old_label: LabelFilter::from(old_label.as_str()),
            new_label: new_label.clone(),
            boot_num: self.boot_num.clone(),
        })
    }
}
