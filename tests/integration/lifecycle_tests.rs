//! Install/uninstall lifecycle against recording mocks.

use esp_tinyuf2::app::updater::InstallState;
use esp_tinyuf2::config::{ConsoleConfig, NvsConfig, OtaConfig, PartitionSubtype, UpdateMode, UpdaterSettings};
use esp_tinyuf2::error::{BackendError, Error, ErrorKind, StateError};

use super::mock_backends::{Call, mock_updater, mock_updater_with, take_calls};

fn ota_0_restart() -> OtaConfig<'static> {
    OtaConfig {
        subtype: PartitionSubtype::OTA_0,
        label: Some("ota_0"),
        complete_cb: None,
        restart: true,
    }
}

fn noop_complete(_mode: UpdateMode) {}

fn noop_modified() {}

// ── Happy paths ───────────────────────────────────────────────

#[test]
fn ota_only_install_forwards_exact_fields() {
    let (mut updater, log) = mock_updater();

    updater.install(Some(&ota_0_restart()), None).unwrap();

    assert_eq!(updater.state(), InstallState::Installed);
    assert_eq!(
        take_calls(&log),
        vec![
            Call::OtaInit {
                subtype: PartitionSubtype::OTA_0,
                label: Some("ota_0".into()),
                has_cb: false,
                restart: true,
            },
            Call::Uf2Init,
        ]
    );
}

#[test]
fn both_configs_initialise_in_order() {
    let (mut updater, log) = mock_updater();
    let ota = OtaConfig {
        complete_cb: Some(noop_complete),
        restart: false,
        ..Default::default()
    };
    let nvs = NvsConfig {
        part_name: "nvs",
        namespace: "settings",
        modified_cb: Some(noop_modified),
    };

    updater.install(Some(&ota), Some(&nvs)).unwrap();

    assert_eq!(
        take_calls(&log),
        vec![
            Call::OtaInit {
                subtype: PartitionSubtype::ANY,
                label: None,
                has_cb: true,
                restart: false,
            },
            Call::NvsInit {
                part: "nvs".into(),
                namespace: "settings".into(),
                has_cb: true,
            },
            Call::Uf2Init,
        ]
    );
}

#[test]
fn console_initialised_last_when_enabled() {
    let (mut updater, log) = mock_updater_with(UpdaterSettings {
        usb_console: true,
        console: ConsoleConfig { cdc_port: 0 },
    });

    updater.install(None, Some(&NvsConfig::default())).unwrap();

    let calls = take_calls(&log);
    assert_eq!(calls.last(), Some(&Call::ConsoleInit { port: 0 }));
    assert_eq!(calls.len(), 3);
}

#[test]
fn round_trip_allows_reinstall() {
    let (mut updater, log) = mock_updater();
    let ota = ota_0_restart();

    updater.install(Some(&ota), None).unwrap();
    updater.uninstall().unwrap();
    assert_eq!(updater.state(), InstallState::Uninstalled);

    take_calls(&log);
    updater.install(Some(&ota), None).unwrap();
    assert!(updater.is_installed());
    assert_eq!(take_calls(&log).len(), 2);
}

// ── State errors ──────────────────────────────────────────────

#[test]
fn double_install_is_invalid_state_without_side_effects() {
    let (mut updater, log) = mock_updater();
    updater.install(Some(&OtaConfig::default()), None).unwrap();
    take_calls(&log);

    let err = updater
        .install(Some(&OtaConfig::default()), Some(&NvsConfig::default()))
        .unwrap_err();

    assert_eq!(err, Error::InvalidState(StateError::AlreadyInstalled));
    assert_eq!(updater.state(), InstallState::Installed);
    assert!(take_calls(&log).is_empty());
}

#[test]
fn uninstall_without_install_is_invalid_state() {
    let (mut updater, log) = mock_updater();

    let err = updater.uninstall().unwrap_err();

    assert_eq!(err, Error::InvalidState(StateError::NotInstalled));
    assert!(take_calls(&log).is_empty());
}

#[test]
fn second_uninstall_does_not_deinit_again() {
    let (mut updater, log) = mock_updater();
    updater.install(None, Some(&NvsConfig::default())).unwrap();
    updater.uninstall().unwrap();
    take_calls(&log);

    assert_eq!(updater.uninstall().unwrap_err().kind(), ErrorKind::InvalidState);
    assert!(take_calls(&log).is_empty());
}

#[test]
fn uninstall_releases_both_backends() {
    let (mut updater, log) = mock_updater();
    updater.install(None, Some(&NvsConfig::default())).unwrap();
    take_calls(&log);

    updater.uninstall().unwrap();

    assert_eq!(take_calls(&log), vec![Call::OtaDeinit, Call::NvsDeinit]);
}

// ── Argument errors ───────────────────────────────────────────

#[test]
fn missing_configs_is_invalid_argument() {
    let (mut updater, log) = mock_updater();

    let err = updater.install(None, None).unwrap_err();

    assert_eq!(err.kind(), ErrorKind::InvalidArgument);
    assert_eq!(err.esp_err(), 0x102);
    assert_eq!(updater.state(), InstallState::Uninstalled);
    assert!(take_calls(&log).is_empty());
}

#[test]
fn out_of_range_subtype_is_invalid_argument() {
    let (mut updater, log) = mock_updater();
    for raw in [0x00, 0x0F, 0x20, 0xFE] {
        let ota = OtaConfig {
            subtype: PartitionSubtype::from_raw(raw),
            ..Default::default()
        };
        assert_eq!(
            updater.install(Some(&ota), None),
            Err(Error::InvalidArgument("invalid partition type")),
            "subtype 0x{raw:02x}"
        );
    }
    // Validation failures never mark the updater installed.
    assert_eq!(updater.state(), InstallState::Uninstalled);
    assert!(take_calls(&log).is_empty());

    updater.install(Some(&ota_0_restart()), None).unwrap();
}

#[test]
fn bad_ota_subtype_blocks_valid_nvs() {
    let (mut updater, log) = mock_updater();
    let ota = OtaConfig {
        subtype: PartitionSubtype::FACTORY,
        ..Default::default()
    };

    let err = updater.install(Some(&ota), Some(&NvsConfig::default())).unwrap_err();

    assert_eq!(err.kind(), ErrorKind::InvalidArgument);
    assert!(take_calls(&log).is_empty());
}

// ── Backend failures ──────────────────────────────────────────

#[test]
fn ota_failure_propagates_and_stays_uninstalled() {
    let (mut updater, log) = mock_updater();
    updater.ota_backend_mut().fail = Some(BackendError::PartitionNotFound);

    let err = updater.install(Some(&ota_0_restart()), Some(&NvsConfig::default())).unwrap_err();

    assert_eq!(err, Error::Backend(BackendError::PartitionNotFound));
    assert!(!updater.is_installed());
    // NVS and the engine are never reached.
    assert_eq!(take_calls(&log).len(), 1);
}

#[test]
fn nvs_failure_rolls_back_ota() {
    let (mut updater, log) = mock_updater();
    updater.nvs_backend_mut().fail = Some(BackendError::Esp(0x1101));

    let err = updater.install(Some(&ota_0_restart()), Some(&NvsConfig::default())).unwrap_err();

    assert_eq!(err.esp_err(), 0x1101);
    let calls = take_calls(&log);
    assert!(matches!(calls[0], Call::OtaInit { .. }));
    assert!(matches!(calls[1], Call::NvsInit { .. }));
    assert_eq!(calls[2..], [Call::OtaDeinit]);
    assert!(!updater.is_installed());
}

#[test]
fn engine_failure_rolls_back_everything() {
    let (mut updater, log) = mock_updater();
    updater.uf2_engine_mut().fail = Some(BackendError::Esp(0x101));

    assert!(updater.install(Some(&OtaConfig::default()), Some(&NvsConfig::default())).is_err());

    let calls = take_calls(&log);
    assert_eq!(calls[2], Call::Uf2Init);
    assert_eq!(calls[3..], [Call::NvsDeinit, Call::OtaDeinit]);
    assert!(!updater.is_installed());

    // Retry succeeds once the fault clears.
    updater.uf2_engine_mut().fail = None;
    updater.install(Some(&OtaConfig::default()), Some(&NvsConfig::default())).unwrap();
    assert!(updater.is_installed());
}

#[test]
fn console_failure_still_installs() {
    let (mut updater, log) = mock_updater_with(UpdaterSettings {
        usb_console: true,
        ..Default::default()
    });
    updater.console_mut().fail = Some(BackendError::Esp(0x101));

    updater.install(Some(&OtaConfig::default()), None).unwrap();

    assert!(updater.is_installed());
    assert_eq!(take_calls(&log).last(), Some(&Call::ConsoleInit { port: 0 }));
}
