use anyhow::{Context, Result};

use super::cli::RenameCli;
use super::command::build_rename_plan;
use super::device::validate_entry;
use super::entries::{locate_entry, parse_boot_entries};
use super::error::RenameError;
use super::partitions::build_partition_index;
use super::probe::{HostProbe, SystemProbe};
use super::types::{RenamePlan, RenameRequest};
use super::utils::{confirm_or_yes, is_root};
use crate::config::AppConfig;

/// Work out the delete/create pair for `request` without touching NVRAM.
pub fn plan_rename<P: SystemProbe + ?Sized>(
    probe: &P,
    request: &RenameRequest,
) -> Result<RenamePlan> {
    let disks = probe.list_disks().context("failed to enumerate disks")?;
    debug!("disks: {}", disks.join(", "));
    let index = build_partition_index(probe, &disks);

    let listing = probe
        .read_boot_entries()
        .context("failed to read boot entries")?;
    let entries = parse_boot_entries(&listing);
    debug!("parsed {} boot entries", entries.len());

    let entry = locate_entry(&entries, &request.old_label, request.boot_num.as_ref())?;
    info!(
        "selected Boot{} '{}' ({})",
        entry.boot_num, entry.label, entry.loader_path
    );

    let target = validate_entry(&entry, &index)?;
    Ok(build_rename_plan(
        probe.boot_manager(),
        &target,
        &entry,
        &request.new_label,
    ))
}

/// Delete the old entry, then create the new one. Creation is skipped
/// when the delete fails.
pub fn execute_plan<P: SystemProbe + ?Sized>(probe: &P, plan: &RenamePlan) -> Result<()> {
    probe
        .apply(&plan.delete)
        .with_context(|| format!("failed to delete old entry: {}", plan.delete))?;
    probe.apply(&plan.create).with_context(|| {
        format!(
            "old entry was deleted but creating the new one failed: {}",
            plan.create
        )
    })?;
    Ok(())
}

pub fn run(cli: RenameCli, config: Option<AppConfig>) -> Result<()> {
    let request = cli.request()?;
    let config = config.unwrap_or_default();

    if !cli.dry_run && !is_root() {
        return Err(RenameError::InsufficientPrivilege.into());
    }

    let probe = HostProbe::new(config.tools.unwrap_or_default());
    let plan = plan_rename(&probe, &request)?;

    if cli.json {
        println!("{}", serde_json::to_string_pretty(&plan)?);
    } else {
        println!("{}", plan.delete);
        println!("{}", plan.create);
    }

    if cli.dry_run {
        info!("dry run, boot entries left unchanged");
        return Ok(());
    }

    let assume_yes = cli.yes || config.assume_yes.unwrap_or(false);
    confirm_or_yes(assume_yes, "Apply these changes to the boot entries?")?;
    execute_plan(&probe, &plan)?;
    info!("boot entry renamed to '{}'", request.new_label);
    Ok(())
}
