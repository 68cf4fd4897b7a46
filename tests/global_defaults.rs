// (c) 2024 Ross Younger
//! The process-wide default table.
//!
//! This lives in its own test binary, with a single test, because changing the
//! process-wide table would otherwise disturb tests running in parallel.

use sshconf::{default, set_default, UserSettings};

#[test]
fn process_wide_defaults() {
    assert_eq!(default("IdentityFile"), "~/.ssh/identity");
    assert_eq!(default("port"), "22");
    assert_eq!(default("HostName"), "");

    let settings = UserSettings::new()
        .config_finder(|| None)
        .system_config_finder(|| None);
    assert_eq!(settings.get("anyhost", "IdentityFile"), "~/.ssh/identity");
    assert_eq!(
        settings.get_all("anyhost", "IdentityFile"),
        vec!["~/.ssh/identity"]
    );

    set_default("IdentityFile", "");
    assert_eq!(default("IdentityFile"), "");
    assert_eq!(settings.get("anyhost", "IdentityFile"), "");
    assert!(settings.get_all("anyhost", "IdentityFile").is_empty());

    set_default("IdentityFile", "~/.ssh/identity");
    assert_eq!(default("IdentityFile"), "~/.ssh/identity");
}
