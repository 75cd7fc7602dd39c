//! Fuzz target: `Uf2Updater::install` configuration handling
//!
//! Splits arbitrary bytes into a partition subtype, a flags byte, and the
//! label / partition / namespace strings, then drives them through the
//! install path of a simulated updater.
//!
//! Invariants checked:
//! - No panics under any byte sequence
//! - A config that fails `validate()` never leaves the updater installed
//! - A successful install can always be uninstalled
//!
//! cargo fuzz run fuzz_install_config

#![no_main]

use esp_tinyuf2::adapters::default_updater;
use esp_tinyuf2::config::{NvsConfig, OtaConfig, PartitionSubtype, UpdaterSettings};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let [subtype, flags, rest @ ..] = data else {
        return;
    };

    // Remaining bytes are three NUL-separated names.
    let mut names = rest.split(|&b| b == 0).map(|s| core::str::from_utf8(s).ok());
    let (Some(label), Some(part), Some(ns)) = (
        names.next().flatten(),
        names.next().flatten(),
        names.next().flatten(),
    ) else {
        return;
    };

    let ota = OtaConfig {
        subtype: PartitionSubtype::from_raw(*subtype),
        label: (flags & 0x01 != 0).then_some(label),
        complete_cb: None,
        restart: flags & 0x02 != 0,
    };
    let nvs = NvsConfig {
        part_name: part,
        namespace: ns,
        modified_cb: None,
    };
    let ota = (flags & 0x04 != 0).then_some(&ota);
    let nvs = (flags & 0x08 != 0).then_some(&nvs);

    let mut updater = default_updater(UpdaterSettings {
        usb_console: flags & 0x10 != 0,
        ..Default::default()
    });

    let valid = (ota.is_some() || nvs.is_some())
        && ota.is_none_or(|c| c.validate().is_ok())
        && nvs.is_none_or(|c| c.validate().is_ok());

    match updater.install(ota, nvs) {
        Ok(()) => {
            assert!(valid, "install accepted an invalid config");
            assert!(updater.uninstall().is_ok());
        }
        Err(_) => assert!(!updater.is_installed()),
    }
});
