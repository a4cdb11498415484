// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

const QM_LIST: &str = "\
      VMID NAME                 STATUS     MEM(MB)    BOOTDISK(GB) PID
       100 web                  running    4096              32.00 1234
       101 db                   running    8192              64.00 1235
       200 scratch              stopped    2048              16.00 0
";

fn handler(spec: ProxmoxVmsSpec) -> ProxmoxVmsHandler {
    let host: HostEndpoint = "root@pve.lan".parse().unwrap();
    ProxmoxVmsHandler::new(&host, spec, RunLog::new())
}

#[test]
fn parse_vm_ids_skips_the_header() {
    assert_eq!(ProxmoxVmsHandler::parse_vm_ids(QM_LIST), vec![100, 101, 200]);
}

#[test]
fn parse_vm_ids_of_empty_output() {
    assert!(ProxmoxVmsHandler::parse_vm_ids("").is_empty());
    assert!(ProxmoxVmsHandler::parse_vm_ids("VMID NAME\n").is_empty());
}

#[test]
fn limit_and_exclude_filter_vms() {
    let h = handler(ProxmoxVmsSpec {
        limit: vec![100, 200],
        exclude: vec![200],
        ..ProxmoxVmsSpec::default()
    });
    assert_eq!(h.filter_vms(vec![100, 101, 200]), vec![100]);
}

#[test]
fn no_filters_keep_everything() {
    let h = handler(ProxmoxVmsSpec::default());
    assert_eq!(h.filter_vms(vec![100, 101]), vec![100, 101]);
}
