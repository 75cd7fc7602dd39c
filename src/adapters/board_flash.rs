//! OTA flash backend adapter.
//!
//! Implements [`OtaFlashPort`] on top of the component's `board_flash`
//! writer.  `init` resolves the target app partition up front so that a
//! missing partition surfaces as [`BackendError::PartitionNotFound`]
//! instead of a silent no-op in C.
//!
//! Resolution rules (same as ESP-IDF):
//! - `ANY`: the next OTA update slot after the running app.
//! - otherwise: the first app partition with that subtype (and label,
//!   when given).
//!
//! On host targets the partition table is an in-memory simulation and
//! [`BoardFlash::complete_update`] stands in for the writer finishing an
//! image.

use log::{info, warn};

use crate::adapters::utils::fixed_string;
use crate::app::ports::OtaFlashPort;
use crate::config::{PARTITION_LABEL_MAX, PartitionSubtype, UpdateCompleteCallback};
use crate::error::BackendError;

#[cfg(not(target_os = "espidf"))]
use crate::config::UpdateMode;
#[cfg(target_os = "espidf")]
use esp_idf_sys::*;

/// Label storage sized for ESP-IDF partition labels.
pub type PartitionLabel = heapless::String<PARTITION_LABEL_MAX>;

/// App partition the backend will write into.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FlashTarget {
    pub subtype: PartitionSubtype,
    pub label: PartitionLabel,
    pub address: u32,
    pub size: u32,
}

/// Simulated partition table entry (host only).
#[cfg(not(target_os = "espidf"))]
pub type PartitionInfo = FlashTarget;

#[cfg(not(target_os = "espidf"))]
const SIM_TABLE_CAP: usize = 8;

pub struct BoardFlash {
    target: Option<FlashTarget>,
    on_complete: Option<UpdateCompleteCallback>,
    restart_on_complete: bool,
    #[cfg(not(target_os = "espidf"))]
    table: heapless::Vec<PartitionInfo, SIM_TABLE_CAP>,
    #[cfg(not(target_os = "espidf"))]
    running: PartitionSubtype,
    #[cfg(not(target_os = "espidf"))]
    restart_requested: bool,
}

impl BoardFlash {
    /// Backend over the device partition table.
    #[cfg(target_os = "espidf")]
    pub fn new() -> Self {
        Self {
            target: None,
            on_complete: None,
            restart_on_complete: false,
        }
    }

    /// Simulation backend: factory app running, two OTA slots.
    #[cfg(not(target_os = "espidf"))]
    pub fn new() -> Self {
        let table = [
            (PartitionSubtype::FACTORY, "factory", 0x0001_0000),
            (PartitionSubtype::OTA_0, "ota_0", 0x0011_0000),
            (PartitionSubtype::OTA_1, "ota_1", 0x0021_0000),
        ]
        .into_iter()
        .map(|(subtype, label, address)| FlashTarget {
            subtype,
            label: fixed_string(label),
            address,
            size: 0x0010_0000,
        });
        Self::with_table(table, PartitionSubtype::FACTORY)
    }

    /// Simulation backend over a custom app partition table.  Entries
    /// beyond the table capacity are dropped.
    #[cfg(not(target_os = "espidf"))]
    pub fn with_table(
        partitions: impl IntoIterator<Item = PartitionInfo>,
        running: PartitionSubtype,
    ) -> Self {
        let mut table = heapless::Vec::new();
        for p in partitions {
            if table.push(p).is_err() {
                break;
            }
        }
        Self {
            target: None,
            on_complete: None,
            restart_on_complete: false,
            table,
            running,
            restart_requested: false,
        }
    }

    /// Currently selected partition, if initialised.
    pub fn target(&self) -> Option<&FlashTarget> {
        self.target.as_ref()
    }

    pub fn is_initialized(&self) -> bool {
        self.target.is_some()
    }

    pub fn restart_on_complete(&self) -> bool {
        self.restart_on_complete
    }

    pub fn has_complete_callback(&self) -> bool {
        self.on_complete.is_some()
    }

    // ── Partition resolution ──────────────────────────────────

    #[cfg(not(target_os = "espidf"))]
    fn resolve(&self, subtype: PartitionSubtype, label: Option<&str>) -> Option<FlashTarget> {
        if subtype.is_any() {
            return self.next_update_partition();
        }
        self.table
            .iter()
            .find(|p| p.subtype == subtype && label.is_none_or(|l| p.label == l))
            .cloned()
    }

    /// Next OTA slot after the running one, wrapping; the lowest slot
    /// when running from factory.
    #[cfg(not(target_os = "espidf"))]
    fn next_update_partition(&self) -> Option<FlashTarget> {
        let mut slots: heapless::Vec<&FlashTarget, SIM_TABLE_CAP> = self
            .table
            .iter()
            .filter(|p| p.subtype.ota_slot().is_some())
            .collect();
        slots.sort_unstable_by_key(|p| p.subtype.raw());

        let after = match self.running.ota_slot() {
            Some(_) => slots.iter().find(|p| p.subtype.raw() > self.running.raw()),
            None => None,
        };
        after.or_else(|| slots.first()).map(|p| (*p).clone())
    }

    #[cfg(target_os = "espidf")]
    fn resolve(&self, subtype: PartitionSubtype, label: Option<&str>) -> Option<FlashTarget> {
        let label_buf: [u8; PARTITION_LABEL_MAX + 1] = crate::adapters::utils::c_name(label.unwrap_or(""));
        let label_ptr = if label.is_some() {
            label_buf.as_ptr().cast()
        } else {
            core::ptr::null()
        };

        // SAFETY: both lookups return pointers into the static partition
        // table (or NULL); `label_buf` outlives the call.
        let part = unsafe {
            if subtype.is_any() {
                esp_ota_get_next_update_partition(core::ptr::null())
            } else {
                esp_partition_find_first(
                    esp_partition_type_t_ESP_PARTITION_TYPE_APP,
                    subtype.raw() as esp_partition_subtype_t,
                    label_ptr,
                )
            }
        };
        if part.is_null() {
            return None;
        }

        // SAFETY: non-null entries of the partition table live for the
        // whole program.
        let part = unsafe { &*part };
        let name = unsafe { core::ffi::CStr::from_ptr(part.label.as_ptr()) };
        Some(FlashTarget {
            subtype: PartitionSubtype::from_raw(part.subtype as u8),
            label: fixed_string(name.to_str().unwrap_or("")),
            address: part.address,
            size: part.size,
        })
    }

    // ── Completion (simulation) ───────────────────────────────

    /// Simulation: the flash writer finished an image.  Fires the
    /// completion callback and records a restart request when armed.
    #[cfg(not(target_os = "espidf"))]
    pub fn complete_update(&mut self) -> Result<(), BackendError> {
        let target = self.target.as_ref().ok_or(BackendError::NotInitialized)?;
        info!("BoardFlash: image complete in '{}'", target.label);
        if let Some(cb) = self.on_complete {
            cb(UpdateMode::App);
        }
        if self.restart_on_complete {
            info!("BoardFlash: restart requested (simulation)");
            self.restart_requested = true;
        }
        Ok(())
    }

    #[cfg(not(target_os = "espidf"))]
    pub fn restart_requested(&self) -> bool {
        self.restart_requested
    }
}

impl Default for BoardFlash {
    fn default() -> Self {
        Self::new()
    }
}

impl OtaFlashPort for BoardFlash {
    fn init(
        &mut self,
        subtype: PartitionSubtype,
        label: Option<&str>,
        on_complete: Option<UpdateCompleteCallback>,
        restart_on_complete: bool,
    ) -> Result<(), BackendError> {
        let target = self.resolve(subtype, label).ok_or_else(|| {
            warn!(
                "BoardFlash: no app partition for subtype 0x{:02x} label {:?}",
                subtype.raw(),
                label
            );
            BackendError::PartitionNotFound
        })?;

        #[cfg(target_os = "espidf")]
        ffi::init(subtype, label, on_complete, restart_on_complete);

        info!(
            "BoardFlash: target '{}' @ 0x{:08x} ({} bytes)",
            target.label, target.address, target.size
        );
        self.target = Some(target);
        self.on_complete = on_complete;
        self.restart_on_complete = restart_on_complete;
        Ok(())
    }

    fn deinit(&mut self) {
        #[cfg(target_os = "espidf")]
        ffi::deinit();

        if self.target.take().is_some() {
            info!("BoardFlash: released");
        }
        self.on_complete = None;
        self.restart_on_complete = false;
    }
}

// ── C collaborator glue ───────────────────────────────────────

#[cfg(target_os = "espidf")]
mod ffi {
    use core::ffi::{c_char, c_int};
    use std::sync::Mutex;

    use esp_idf_sys::esp_partition_subtype_t;

    use crate::config::{PARTITION_LABEL_MAX, PartitionSubtype, UpdateCompleteCallback, UpdateMode};

    static COMPLETE_CB: Mutex<Option<UpdateCompleteCallback>> = Mutex::new(None);

    unsafe extern "C" {
        fn board_flash_init(
            subtype: esp_partition_subtype_t,
            label: *const c_char,
            complete_cb: Option<unsafe extern "C" fn(c_int)>,
            if_restart: bool,
        );
        fn board_flash_deinit();
    }

    unsafe extern "C" fn complete_trampoline(mode: c_int) {
        let mode = if mode == UpdateMode::Nvs as c_int {
            UpdateMode::Nvs
        } else {
            UpdateMode::App
        };
        let cb = COMPLETE_CB.lock().ok().and_then(|slot| *slot);
        if let Some(cb) = cb {
            cb(mode);
        }
    }

    pub(super) fn init(
        subtype: PartitionSubtype,
        label: Option<&str>,
        on_complete: Option<UpdateCompleteCallback>,
        restart: bool,
    ) {
        if let Ok(mut slot) = COMPLETE_CB.lock() {
            *slot = on_complete;
        }
        // board_flash keeps the label pointer, so it must be 'static.
        static LABEL: Mutex<[u8; PARTITION_LABEL_MAX + 1]> = Mutex::new([0; PARTITION_LABEL_MAX + 1]);
        let label_ptr = match (label, LABEL.lock()) {
            (Some(l), Ok(mut buf)) => {
                *buf = crate::adapters::utils::c_name(l);
                buf.as_ptr().cast()
            }
            _ => core::ptr::null(),
        };
        let cb = on_complete.map(|_| complete_trampoline as unsafe extern "C" fn(c_int));
        // SAFETY: called from the installing task only; `label_ptr` points
        // into a static buffer.
        unsafe { board_flash_init(subtype.raw() as esp_partition_subtype_t, label_ptr, cb, restart) };
    }

    pub(super) fn deinit() {
        // SAFETY: board_flash_deinit tolerates being called uninitialised.
        unsafe { board_flash_deinit() };
        if let Ok(mut slot) = COMPLETE_CB.lock() {
            *slot = None;
        }
    }
}
