// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

fn handler(spec: FilesSpec) -> FilesHandler {
    let host: HostEndpoint = "root@web01.lan".parse().unwrap();
    FilesHandler::new(&host, spec, RunLog::new())
}

#[test]
fn source_paths_default_to_root() {
    let h = handler(FilesSpec::default());
    assert_eq!(h.source_paths().unwrap(), vec!["/"]);
}

#[test]
fn source_paths_get_trailing_slashes() {
    let h = handler(FilesSpec {
        limit: vec!["/etc".to_string(), "/var/www/".to_string()],
        ..FilesSpec::default()
    });
    assert_eq!(h.source_paths().unwrap(), vec!["/etc/", "/var/www/"]);
}

#[test]
fn relative_limit_is_rejected() {
    let h = handler(FilesSpec {
        limit: vec!["etc".to_string()],
        ..FilesSpec::default()
    });
    assert!(matches!(
        h.source_paths(),
        Err(EngineError::Handler(message)) if message.contains("absolute")
    ));
}

#[test]
fn rsync_options_carry_excludes_bwlimit_and_link_dest() {
    let h = handler(FilesSpec {
        exclude: vec!["*.tmp".to_string()],
        bwlimit: Some(10000),
        ..FilesSpec::default()
    });
    let link = PathRef::local("/srv/backups/web01/2025_06_01-00_00_00/files");
    let options = h.rsync_options(Some(&link));

    assert!(options.contains(&"--archive".to_string()));
    assert!(options.contains(&"--delete-during".to_string()));
    assert!(options.contains(&"--exclude=*.tmp".to_string()));
    assert!(options.contains(&"--bwlimit=10000".to_string()));
    assert!(options
        .contains(&"--link-dest=/srv/backups/web01/2025_06_01-00_00_00/files".to_string()));
}

#[test]
fn full_mode_options_have_no_link_dest() {
    let h = handler(FilesSpec::default());
    let options = h.rsync_options(None);
    assert!(!options.iter().any(|o| o.starts_with("--link-dest")));
}
