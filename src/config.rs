//! Updater configuration
//!
//! Caller-supplied settings for the OTA (application image) and NVS
//! (key-value) update paths, plus the crate-level [`UpdaterSettings`].
//! Both configs are borrowed for the duration of `install` only; backends
//! copy whatever they need to keep.

use crate::error::{Error, Result};

/// Longest partition label ESP-IDF stores (`esp_partition_t::label` is 17 bytes with NUL).
pub const PARTITION_LABEL_MAX: usize = 16;
/// Longest NVS namespace name (`NVS_KEY_NAME_MAX_SIZE - 1`).
pub const NVS_NAMESPACE_MAX: usize = 15;
/// Longest NVS key name (`NVS_KEY_NAME_MAX_SIZE - 1`).
pub const NVS_KEY_MAX: usize = 15;

/// First OTA app slot subtype (`ESP_PARTITION_SUBTYPE_APP_OTA_MIN`).
pub const OTA_SUBTYPE_MIN: u8 = 0x10;
/// Last OTA app slot subtype (`ESP_PARTITION_SUBTYPE_APP_OTA_MAX`).
pub const OTA_SUBTYPE_MAX: u8 = OTA_SUBTYPE_MIN + 15;
/// `ESP_PARTITION_SUBTYPE_ANY`
pub const SUBTYPE_ANY: u8 = 0xFF;

/// Returns `true` if every byte of `s` is in the printable ASCII range
/// `0x20..=0x7E` (space through tilde, inclusive).
///
/// Used to validate partition labels, NVS namespaces and NVS keys.
pub fn is_printable_ascii(s: &str) -> bool {
    s.bytes().all(|b| (0x20..=0x7E).contains(&b))
}

/// `true` if `name` is 1..=`max` printable ASCII bytes.
pub fn is_valid_name(name: &str, max: usize) -> bool {
    !name.is_empty() && name.len() <= max && is_printable_ascii(name)
}

/// Raw ESP-IDF app partition subtype.
///
/// Kept as a raw byte rather than a closed enum: values arrive from C
/// headers and Kconfig, and out-of-range ones must reach validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PartitionSubtype(u8);

impl PartitionSubtype {
    pub const FACTORY: Self = Self(0x00);
    pub const OTA_0: Self = Self(OTA_SUBTYPE_MIN);
    pub const OTA_1: Self = Self(OTA_SUBTYPE_MIN + 1);
    pub const TEST: Self = Self(0x20);
    /// Let the flash backend pick the next OTA update slot.
    pub const ANY: Self = Self(SUBTYPE_ANY);

    pub const fn from_raw(raw: u8) -> Self {
        Self(raw)
    }

    /// Subtype for OTA slot `n` (0–15).
    pub const fn ota(slot: u8) -> Option<Self> {
        if slot <= OTA_SUBTYPE_MAX - OTA_SUBTYPE_MIN {
            Some(Self(OTA_SUBTYPE_MIN + slot))
        } else {
            None
        }
    }

    pub const fn raw(self) -> u8 {
        self.0
    }

    pub const fn is_any(self) -> bool {
        self.0 == SUBTYPE_ANY
    }

    /// OTA slot index, if this subtype names one.
    pub const fn ota_slot(self) -> Option<u8> {
        if self.0 >= OTA_SUBTYPE_MIN && self.0 <= OTA_SUBTYPE_MAX {
            Some(self.0 - OTA_SUBTYPE_MIN)
        } else {
            None
        }
    }

    /// An update target is an OTA slot or [`ANY`](Self::ANY).
    pub const fn is_update_target(self) -> bool {
        self.ota_slot().is_some() || self.is_any()
    }
}

/// Which store an update completion refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(C)]
pub enum UpdateMode {
    /// A new application image was written to the OTA partition.
    App = 0,
    /// The NVS contents were rewritten.
    Nvs = 1,
}

/// Fired by the flash backend once an image (or NVS file) is fully written.
pub type UpdateCompleteCallback = fn(UpdateMode);

/// Fired by the NVS backend when stored data changes.
pub type NvsModifiedCallback = fn();

// ---------------------------------------------------------------------------
// OTA
// ---------------------------------------------------------------------------

/// Application-image update settings.
#[derive(Debug, Clone, Copy)]
pub struct OtaConfig<'a> {
    /// Target app partition subtype, or [`PartitionSubtype::ANY`].
    pub subtype: PartitionSubtype,
    /// Optional partition label to disambiguate the target.
    pub label: Option<&'a str>,
    /// Invoked when an image write completes.
    pub complete_cb: Option<UpdateCompleteCallback>,
    /// Reboot into the new image automatically after a completed update.
    pub restart: bool,
}

impl Default for OtaConfig<'_> {
    fn default() -> Self {
        Self {
            subtype: PartitionSubtype::ANY,
            label: None,
            complete_cb: None,
            restart: true,
        }
    }
}

impl OtaConfig<'_> {
    pub fn validate(&self) -> Result<()> {
        if !self.subtype.is_update_target() {
            return Err(Error::InvalidArgument("invalid partition type"));
        }
        if let Some(label) = self.label {
            if !is_valid_name(label, PARTITION_LABEL_MAX) {
                return Err(Error::InvalidArgument(
                    "partition label must be 1–16 printable ASCII bytes",
                ));
            }
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// NVS
// ---------------------------------------------------------------------------

/// NVS (key-value) update settings.
#[derive(Debug, Clone, Copy)]
pub struct NvsConfig<'a> {
    /// NVS partition label.
    pub part_name: &'a str,
    /// Namespace the updater reads and writes.
    pub namespace: &'a str,
    /// Invoked when stored data changes.
    pub modified_cb: Option<NvsModifiedCallback>,
}

impl Default for NvsConfig<'_> {
    fn default() -> Self {
        Self {
            part_name: "nvs",
            namespace: "tuf2",
            modified_cb: None,
        }
    }
}

impl NvsConfig<'_> {
    pub fn validate(&self) -> Result<()> {
        let part = self.part_name;
        if !is_valid_name(part, PARTITION_LABEL_MAX) {
            return Err(Error::InvalidArgument(
                "NVS partition name must be 1–16 printable ASCII bytes",
            ));
        }
        let ns = self.namespace;
        if !is_valid_name(ns, NVS_NAMESPACE_MAX) {
            return Err(Error::InvalidArgument(
                "NVS namespace must be 1–15 printable ASCII bytes",
            ));
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Crate-level settings
// ---------------------------------------------------------------------------

/// USB CDC-ACM console settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ConsoleConfig {
    /// CDC-ACM interface index (`TINYUSB_CDC_ACM_0` = 0).
    pub cdc_port: u8,
}

/// Options fixed at updater construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UpdaterSettings {
    /// Redirect the console to USB CDC-ACM on install.
    pub usb_console: bool,
    pub console: ConsoleConfig,
}

impl Default for UpdaterSettings {
    fn default() -> Self {
        Self {
            usb_console: cfg!(feature = "usb-console"),
            console: ConsoleConfig::default(),
        }
    }
}
