use anyhow::{anyhow, bail, Result};
use std::cell::RefCell;

use efilabel::boot::command::{BootAction, BootCommand, BOOT_MANAGER};
use efilabel::boot::partitions::build_partition_index;
use efilabel::boot::probe::SystemProbe;
use efilabel::boot::types::{LabelFilter, RenameRequest};
use efilabel::boot::{execute_plan, plan_rename, RenameError};

const ESP_UUID: &str = "2ffcc127-1f3b-4a4d-9a3f-3c1f0e5d2a11";

/// In-memory system: canned tool output, records applied commands.
#[derive(Default)]
struct FakeProbe {
    disks: Vec<(String, Option<String>)>,
    boot_entries: String,
    fail_on: Option<&'static str>,
    boot_manager: Option<&'static str>,
    applied: RefCell<Vec<BootCommand>>,
}

impl FakeProbe {
    fn disk(mut self, name: &str, table: &str) -> Self {
        self.disks.push((name.to_string(), Some(table.to_string())));
        self
    }

    fn unreadable_disk(mut self, name: &str) -> Self {
        self.disks.push((name.to_string(), None));
        self
    }

    fn entries(mut self, lines: &[String]) -> Self {
        self.boot_entries = format!("BootCurrent: 0001\nTimeout: 1 seconds\n{}\n", lines.join("\n"));
        self
    }
}

impl SystemProbe for FakeProbe {
    fn list_disks(&self) -> Result<Vec<String>> {
        Ok(self.disks.iter().map(|(name, _)| name.clone()).collect())
    }

    fn read_partition_table(&self, disk: &str) -> Result<String> {
        self.disks
            .iter()
            .find(|(name, _)| name == disk)
            .and_then(|(_, table)| table.clone())
            .ok_or_else(|| anyhow!("sfdisk: cannot open /dev/{disk}"))
    }

    fn read_boot_entries(&self) -> Result<String> {
        Ok(self.boot_entries.clone())
    }

    fn boot_manager(&self) -> &str {
        self.boot_manager.unwrap_or(BOOT_MANAGER)
    }

    fn apply(&self, command: &BootCommand) -> Result<()> {
        let action = match command.action {
            BootAction::Delete { .. } => "delete",
            BootAction::Create { .. } => "create",
        };
        if self.fail_on == Some(action) {
            bail!("efibootmgr: {action} failed");
        }
        self.applied.borrow_mut().push(command.clone());
        Ok(())
    }
}

fn boot_line(num: &str, label: &str, part: u32, uuid: &str) -> String {
    format!(
        "Boot{num}* {label}\tHD({part},GPT,{uuid},0x800,0x100000)/File(\\EFI\\{label}\\shimx64.efi)"
    )
}

fn sfdisk_line(device: &str, uuid: &str) -> String {
    format!("{device} : start=2048, size=1048576, type=C12A7328-F81F-11D2-BA4B-00A0C93EC93B, uuid={uuid}\n")
}

fn request(old: &str, new: &str, boot_num: Option<&str>) -> RenameRequest {
    RenameRequest {
        old_label: LabelFilter::from(old),
        new_label: new.to_string(),
        boot_num: boot_num.map(|n| n.parse().unwrap()),
    }
}

fn rename_error(err: &anyhow::Error) -> &RenameError {
    err.downcast_ref::<RenameError>()
        .unwrap_or_else(|| panic!("not a rename error: {err:#}"))
}

#[test]
fn single_entry_produces_delete_and_create() {
    let probe = FakeProbe::default()
        .disk("sda", &sfdisk_line("/dev/sda1", &ESP_UUID.to_uppercase()))
        .entries(&[boot_line("0001", "ubuntu", 1, ESP_UUID)]);

    let plan = plan_rename(&probe, &request("ubuntu", "Ubuntu 24.04", None)).unwrap();

    assert_eq!(
        plan.delete,
        BootCommand::new(
            BOOT_MANAGER,
            BootAction::Delete {
                boot_num: "0001".parse().unwrap()
            }
        )
    );
    assert_eq!(
        plan.create,
        BootCommand::new(
            BOOT_MANAGER,
            BootAction::Create {
                disk: "/dev/sda".into(),
                partition: 1,
                label: "Ubuntu 24.04".into(),
                loader: "\\EFI\\ubuntu\\shimx64.efi".into(),
            }
        )
    );
}

#[test]
fn same_label_twice_is_ambiguous() {
    let probe = FakeProbe::default()
        .disk("sda", &sfdisk_line("/dev/sda1", ESP_UUID))
        .entries(&[
            boot_line("0001", "ubuntu", 1, ESP_UUID),
            boot_line("0002", "ubuntu", 1, ESP_UUID),
        ]);

    let err = plan_rename(&probe, &request("ubuntu", "new", None)).unwrap_err();
    match rename_error(&err) {
        RenameError::Ambiguous { first, second, .. } => {
            assert_eq!(first.as_str(), "0001");
            assert_eq!(second.as_str(), "0002");
        }
        other => panic!("unexpected error: {other}"),
    }
    assert!(err.to_string().contains("Boot0001 and Boot0002"));
}

#[test]
fn bootnum_picks_one_of_several() {
    let probe = FakeProbe::default()
        .disk("nvme0n1", &sfdisk_line("/dev/nvme0n1p2", ESP_UUID))
        .entries(&[
            boot_line("0001", "ubuntu", 2, ESP_UUID),
            boot_line("0002", "ubuntu", 2, ESP_UUID),
        ]);

    let plan = plan_rename(&probe, &request("ubuntu", "new", Some("0002"))).unwrap();
    assert_eq!(plan.delete.args(), ["-b", "0002", "-B"]);
    assert_eq!(
        plan.create.args(),
        ["-c", "-d", "/dev/nvme0n1", "-p", "2", "-L", "new", "-l", "\\EFI\\ubuntu\\shimx64.efi"]
    );
}

#[test]
fn wildcard_matches_any_label() {
    let probe = FakeProbe::default()
        .disk("mmcblk0", &sfdisk_line("/dev/mmcblk0p1", ESP_UUID))
        .entries(&[boot_line("0007", "Linux Boot Manager", 1, ESP_UUID)]);

    let plan = plan_rename(&probe, &request("*", "systemd-boot", None)).unwrap();
    assert_eq!(plan.delete.args(), ["-b", "0007", "-B"]);
}

#[test]
fn missing_label_is_not_found() {
    let probe = FakeProbe::default()
        .disk("sda", &sfdisk_line("/dev/sda1", ESP_UUID))
        .entries(&[boot_line("0001", "ubuntu", 1, ESP_UUID)]);

    let err = plan_rename(&probe, &request("fedora", "new", None)).unwrap_err();
    assert!(matches!(rename_error(&err), RenameError::NotFound { .. }));
}

#[test]
fn uuid_missing_from_system_is_unknown_partition() {
    let probe = FakeProbe::default()
        .disk("sda", &sfdisk_line("/dev/sda1", "00000000-0000-0000-0000-000000000000"))
        .entries(&[boot_line("0001", "ubuntu", 1, ESP_UUID)]);

    let err = plan_rename(&probe, &request("ubuntu", "new", None)).unwrap_err();
    assert_eq!(
        rename_error(&err),
        &RenameError::UnknownPartition {
            boot_num: "0001".parse().unwrap(),
            uuid: ESP_UUID.into(),
        }
    );
}

#[test]
fn partition_number_disagreement_is_rejected() {
    let probe = FakeProbe::default()
        .disk("sda", &sfdisk_line("/dev/sda1", ESP_UUID))
        .entries(&[boot_line("0001", "ubuntu", 2, ESP_UUID)]);

    let err = plan_rename(&probe, &request("ubuntu", "new", None)).unwrap_err();
    assert!(matches!(
        rename_error(&err),
        RenameError::PartitionMismatch {
            expected: 2,
            found: 1,
            ..
        }
    ));
}

#[test]
fn unsupported_device_is_format_error() {
    let probe = FakeProbe::default()
        .disk("vda", &sfdisk_line("/dev/vda1", ESP_UUID))
        .entries(&[boot_line("0001", "ubuntu", 1, ESP_UUID)]);

    let err = plan_rename(&probe, &request("ubuntu", "new", None)).unwrap_err();
    assert!(matches!(rename_error(&err), RenameError::DeviceFormat { .. }));
}

#[test]
fn unreadable_disk_does_not_stop_the_scan() {
    let probe = FakeProbe::default()
        .unreadable_disk("sda")
        .disk("sdb", &sfdisk_line("/dev/sdb1", ESP_UUID))
        .entries(&[boot_line("0001", "ubuntu", 1, ESP_UUID)]);

    let plan = plan_rename(&probe, &request("ubuntu", "new", None)).unwrap();
    assert!(matches!(plan.create.action, BootAction::Create { ref disk, .. } if disk == "/dev/sdb"));
}

#[test]
fn duplicate_uuid_keeps_last_disk() {
    let probe = FakeProbe::default()
        .disk("sda", &sfdisk_line("/dev/sda1", ESP_UUID))
        .disk("sdb", &sfdisk_line("/dev/sdb1", &ESP_UUID.to_uppercase()));
    let disks = probe.list_disks().unwrap();

    let index = build_partition_index(&probe, &disks);
    assert_eq!(index.len(), 1);
    assert_eq!(index.get(ESP_UUID), Some("/dev/sdb1"));
}

#[test]
fn index_keys_are_lowercase() {
    let probe = FakeProbe::default()
        .disk("sda", &sfdisk_line("/dev/sda1", "AAAA-BBBB"))
        .disk("sdb", &sfdisk_line("/dev/sdb1", "cccc-DDDD"));
    let disks = probe.list_disks().unwrap();

    let index = build_partition_index(&probe, &disks);
    let mut uuids: Vec<_> = index.uuids().collect();
    uuids.sort();
    assert_eq!(uuids, vec!["aaaa-bbbb", "cccc-dddd"]);
}

#[test]
fn empty_index_still_reports_the_entry_problem() {
    let probe = FakeProbe::default()
        .unreadable_disk("sda")
        .entries(&[boot_line("0001", "ubuntu", 1, ESP_UUID)]);

    let err = plan_rename(&probe, &request("ubuntu", "new", None)).unwrap_err();
    assert!(matches!(rename_error(&err), RenameError::UnknownPartition { .. }));
}

#[test]
fn execute_runs_delete_then_create() {
    let probe = FakeProbe::default()
        .disk("sda", &sfdisk_line("/dev/sda1", ESP_UUID))
        .entries(&[boot_line("0001", "ubuntu", 1, ESP_UUID)]);
    let plan = plan_rename(&probe, &request("ubuntu", "new", None)).unwrap();

    execute_plan(&probe, &plan).unwrap();
    assert_eq!(*probe.applied.borrow(), vec![plan.delete, plan.create]);
}

#[test]
fn failed_delete_skips_create() {
    let mut probe = FakeProbe::default()
        .disk("sda", &sfdisk_line("/dev/sda1", ESP_UUID))
        .entries(&[boot_line("0001", "ubuntu", 1, ESP_UUID)]);
    let plan = plan_rename(&probe, &request("ubuntu", "new", None)).unwrap();
    probe.fail_on = Some("delete");

    let err = execute_plan(&probe, &plan).unwrap_err();
    assert!(err.to_string().contains("failed to delete old entry"));
    assert!(probe.applied.borrow().is_empty());
}

#[test]
fn failed_create_reports_the_deleted_entry() {
    let mut probe = FakeProbe::default()
        .disk("sda", &sfdisk_line("/dev/sda1", ESP_UUID))
        .entries(&[boot_line("0001", "ubuntu", 1, ESP_UUID)]);
    let plan = plan_rename(&probe, &request("ubuntu", "new", None)).unwrap();
    probe.fail_on = Some("create");

    let err = execute_plan(&probe, &plan).unwrap_err();
    let message = err.to_string();
    assert!(message.contains("old entry was deleted but creating the new one failed"));
    assert!(message.contains("-c -d /dev/sda -p 1"));
    assert_eq!(*probe.applied.borrow(), vec![plan.delete]);
}

#[test]
fn configured_boot_manager_runs_what_was_shown() {
    let mut probe = FakeProbe::default()
        .disk("sda", &sfdisk_line("/dev/sda1", ESP_UUID))
        .entries(&[boot_line("0001", "ubuntu", 1, ESP_UUID)]);
    probe.boot_manager = Some("/usr/local/sbin/efibootmgr");

    let plan = plan_rename(&probe, &request("ubuntu", "new", None)).unwrap();
    assert!(plan.delete.to_string().starts_with("/usr/local/sbin/efibootmgr -b 0001"));
    assert!(plan.create.to_string().starts_with("/usr/local/sbin/efibootmgr -c"));

    execute_plan(&probe, &plan).unwrap();
    let applied = probe.applied.borrow();
    assert!(applied
        .iter()
        .all(|command| command.program() == "/usr/local/sbin/efibootmgr"));
}

#[test]
fn parenthesised_loader_directory_is_kept_whole() {
    let probe = FakeProbe::default()
        .disk("sda", &sfdisk_line("/dev/sda1", ESP_UUID))
        .entries(&[format!(
            "Boot0005* Tools\tHD(1,GPT,{ESP_UUID},0x800,0x100000)/File(\\EFI\\tools (x64)\\shell.efi)"
        )]);

    let plan = plan_rename(&probe, &request("Tools", "UEFI Shell", None)).unwrap();
    assert!(matches!(
        plan.create.action,
        BootAction::Create { ref loader, .. } if loader == "\\EFI\\tools (x64)\\shell.efi"
    ));
}

#[test]
fn full_firmware_device_path_is_matched() {
    let probe = FakeProbe::default()
        .disk("nvme0n1", &sfdisk_line("/dev/nvme0n1p1", ESP_UUID))
        .entries(&[format!(
            "Boot0003* UEFI OS\tPciRoot(0x0)/Pci(0x1d,0x0)/Pci(0x0,0x0)/NVMe(0x1,00-00-00-00-00-00-00-00)/HD(1,GPT,{ESP_UUID},0x800,0x100000)/File(\\EFI\\BOOT\\BOOTX64.EFI)..BO"
        )]);

    let plan = plan_rename(&probe, &request("UEFI OS", "Fallback", None)).unwrap();
    assert_eq!(
        plan.create.args(),
        ["-c", "-d", "/dev/nvme0n1", "-p", "1", "-L", "Fallback", "-l", "\\EFI\\BOOT\\BOOTX64.EFI"]
    );
}
