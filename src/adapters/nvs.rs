//! NVS (Non-Volatile Storage) backend adapter.
//!
//! Implements [`NvsPort`] for the UF2 updater: `init` hands the partition
//! and namespace to the component's `board_flash_nvs` writer (which
//! exposes them as an INI file on the UF2 drive) and opens a handle of
//! our own for string reads and writes.
//!
//! - Keys are 1..=15 printable ASCII bytes and values must not contain
//!   NUL; both are checked before anything reaches C, where they would be
//!   silently truncated.
//! - The modified callback fires only when a write actually changes the
//!   stored value.
//! - Writes are committed immediately; ESP-IDF NVS commits are atomic.
//! - On host targets the namespace lives in an in-memory map.

use log::{info, warn};

use crate::adapters::utils::fixed_string;
use crate::app::ports::NvsPort;
use crate::config::{
    NVS_KEY_MAX, NVS_NAMESPACE_MAX, NvsModifiedCallback, PARTITION_LABEL_MAX, is_printable_ascii,
};
use crate::error::{
    BackendError, ESP_ERR_INVALID_ARG, ESP_ERR_INVALID_SIZE, ESP_ERR_NVS_INVALID_NAME,
    ESP_ERR_NVS_KEY_TOO_LONG,
};

#[cfg(not(target_os = "espidf"))]
use std::collections::HashMap;

#[cfg(target_os = "espidf")]
use esp_idf_sys::*;

/// Longest string value read back through [`NvsStore::get_str`].
pub const MAX_VALUE_LEN: usize = 256;

/// Partition and namespace of an open store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NvsLocation {
    pub part_name: heapless::String<PARTITION_LABEL_MAX>,
    pub namespace: heapless::String<NVS_NAMESPACE_MAX>,
}

pub struct NvsStore {
    location: Option<NvsLocation>,
    on_modified: Option<NvsModifiedCallback>,
    #[cfg(not(target_os = "espidf"))]
    store: HashMap<String, String>,
    #[cfg(target_os = "espidf")]
    handle: nvs_handle_t,
}

impl NvsStore {
    pub fn new() -> Self {
        #[cfg(not(target_os = "espidf"))]
        info!("NvsStore: simulation backend");

        Self {
            location: None,
            on_modified: None,
            #[cfg(not(target_os = "espidf"))]
            store: HashMap::new(),
            #[cfg(target_os = "espidf")]
            handle: 0,
        }
    }

    pub fn location(&self) -> Option<&NvsLocation> {
        self.location.as_ref()
    }

    pub fn is_open(&self) -> bool {
        self.location.is_some()
    }

    /// Write a string value, committing immediately.  Fires the modified
    /// callback if the stored value changed.
    pub fn set_str(&mut self, key: &str, value: &str) -> Result<(), BackendError> {
        check_key(key)?;
        if !self.is_open() {
            return Err(BackendError::NotInitialized);
        }
        if value.contains('\0') {
            return Err(BackendError::Esp(ESP_ERR_INVALID_ARG));
        }
        if value.len() > MAX_VALUE_LEN {
            return Err(BackendError::Esp(ESP_ERR_INVALID_SIZE));
        }
        let mut current = heapless::String::<MAX_VALUE_LEN>::new();
        let found = self.read_into(key, &mut current)?;
        if found && current == value {
            return Ok(());
        }

        self.write_raw(key, value)?;
        info!("NvsStore: '{}' updated", key);
        if let Some(cb) = self.on_modified {
            cb();
        }
        Ok(())
    }

    /// Read a string value.  `Ok(None)` if the key does not exist.
    pub fn get_str(&self, key: &str) -> Result<Option<heapless::String<MAX_VALUE_LEN>>, BackendError> {
        check_key(key)?;
        if !self.is_open() {
            return Err(BackendError::NotInitialized);
        }
        let mut out = heapless::String::new();
        Ok(self.read_into(key, &mut out)?.then_some(out))
    }

    // ── Storage primitives ────────────────────────────────────

    #[cfg(not(target_os = "espidf"))]
    fn read_into(
        &self,
        key: &str,
        out: &mut heapless::String<MAX_VALUE_LEN>,
    ) -> Result<bool, BackendError> {
        match self.store.get(key) {
            Some(v) => {
                *out = fixed_string(v);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    #[cfg(not(target_os = "espidf"))]
    fn write_raw(&mut self, key: &str, value: &str) -> Result<(), BackendError> {
        self.store.insert(key.to_owned(), value.to_owned());
        Ok(())
    }

    #[cfg(target_os = "espidf")]
    fn read_into(
        &self,
        key: &str,
        out: &mut heapless::String<MAX_VALUE_LEN>,
    ) -> Result<bool, BackendError> {
        let key_buf: [u8; NVS_KEY_MAX + 1] = crate::adapters::utils::c_name(key);
        let mut buf = [0u8; MAX_VALUE_LEN + 1];
        let mut len = buf.len();
        // SAFETY: `handle` is open while `location` is Some; both buffers
        // outlive the call and `len` holds the destination capacity.
        let ret = unsafe {
            nvs_get_str(
                self.handle,
                key_buf.as_ptr().cast(),
                buf.as_mut_ptr().cast(),
                &mut len,
            )
        };
        if ret == ESP_ERR_NVS_NOT_FOUND {
            return Ok(false);
        }
        if ret != ESP_OK {
            return Err(BackendError::Esp(ret));
        }
        let text = core::ffi::CStr::from_bytes_until_nul(&buf)
            .ok()
            .and_then(|s| s.to_str().ok())
            .unwrap_or("");
        *out = fixed_string(text);
        Ok(true)
    }

    #[cfg(target_os = "espidf")]
    fn write_raw(&mut self, key: &str, value: &str) -> Result<(), BackendError> {
        let key_buf: [u8; NVS_KEY_MAX + 1] = crate::adapters::utils::c_name(key);
        let value_buf: [u8; MAX_VALUE_LEN + 1] = crate::adapters::utils::c_name(value);
        // SAFETY: see `read_into`.
        let ret = unsafe { nvs_set_str(self.handle, key_buf.as_ptr().cast(), value_buf.as_ptr().cast()) };
        if ret != ESP_OK {
            return Err(BackendError::Esp(ret));
        }
        let ret = unsafe { nvs_commit(self.handle) };
        if ret != ESP_OK {
            return Err(BackendError::Esp(ret));
        }
        Ok(())
    }
}

/// Reject keys ESP-IDF would refuse (or that `c_name` would truncate).
fn check_key(key: &str) -> Result<(), BackendError> {
    if key.len() > NVS_KEY_MAX {
        return Err(BackendError::Esp(ESP_ERR_NVS_KEY_TOO_LONG));
    }
    if key.is_empty() || !is_printable_ascii(key) {
        return Err(BackendError::Esp(ESP_ERR_NVS_INVALID_NAME));
    }
    Ok(())
}

impl Default for NvsStore {
    fn default() -> Self {
        Self::new()
    }
}

impl NvsPort for NvsStore {
    fn init(
        &mut self,
        part_name: &str,
        namespace: &str,
        on_modified: Option<NvsModifiedCallback>,
    ) -> Result<(), BackendError> {
        if self.is_open() {
            warn!("NvsStore: re-init without deinit, closing previous namespace");
            self.deinit();
        }

        #[cfg(target_os = "espidf")]
        {
            self.handle = ffi::open(part_name, namespace, on_modified)?;
        }

        self.location = Some(NvsLocation {
            part_name: fixed_string(part_name),
            namespace: fixed_string(namespace),
        });
        self.on_modified = on_modified;
        info!("NvsStore: opened '{}' on partition '{}'", namespace, part_name);
        Ok(())
    }

    fn deinit(&mut self) {
        #[cfg(target_os = "espidf")]
        {
            ffi::close(self.handle, self.is_open());
            self.handle = 0;
        }

        if self.location.take().is_some() {
            info!("NvsStore: closed");
        }
        self.on_modified = None;
    }
}

// ── C collaborator glue ───────────────────────────────────────

#[cfg(target_os = "espidf")]
mod ffi {
    use core::ffi::c_char;
    use std::sync::Mutex;

    use esp_idf_sys::*;

    use crate::adapters::utils::c_name;
    use crate::config::{NVS_NAMESPACE_MAX, NvsModifiedCallback, PARTITION_LABEL_MAX};
    use crate::error::BackendError;

    static MODIFIED_CB: Mutex<Option<NvsModifiedCallback>> = Mutex::new(None);

    // board_flash_nvs keeps both name pointers until deinit.
    static PART_NAME: Mutex<[u8; PARTITION_LABEL_MAX + 1]> = Mutex::new([0; PARTITION_LABEL_MAX + 1]);
    static NAMESPACE: Mutex<[u8; NVS_NAMESPACE_MAX + 1]> = Mutex::new([0; NVS_NAMESPACE_MAX + 1]);

    unsafe extern "C" {
        fn board_flash_nvs_init(
            part_name: *const c_char,
            namespace_name: *const c_char,
            modified_cb: Option<unsafe extern "C" fn()>,
        );
        fn board_flash_nvs_deinit();
    }

    unsafe extern "C" fn modified_trampoline() {
        let cb = MODIFIED_CB.lock().ok().and_then(|slot| *slot);
        if let Some(cb) = cb {
            cb();
        }
    }

    pub(super) fn open(
        part_name: &str,
        namespace: &str,
        on_modified: Option<NvsModifiedCallback>,
    ) -> Result<nvs_handle_t, BackendError> {
        let (Ok(mut part), Ok(mut ns)) = (PART_NAME.lock(), NAMESPACE.lock()) else {
            return Err(BackendError::Esp(ESP_FAIL));
        };
        *part = c_name(part_name);
        *ns = c_name(namespace);
        if let Ok(mut slot) = MODIFIED_CB.lock() {
            *slot = on_modified;
        }

        let cb = on_modified.map(|_| modified_trampoline as unsafe extern "C" fn());
        // SAFETY: both names live in statics; board_flash_nvs_init also
        // runs nvs_flash_init_partition for `part`.
        unsafe { board_flash_nvs_init(part.as_ptr().cast(), ns.as_ptr().cast(), cb) };

        let mut handle: nvs_handle_t = 0;
        let ret = unsafe {
            nvs_open_from_partition(
                part.as_ptr().cast(),
                ns.as_ptr().cast(),
                nvs_open_mode_t_NVS_READWRITE,
                &mut handle,
            )
        };
        if ret != ESP_OK {
            unsafe { board_flash_nvs_deinit() };
            return Err(BackendError::Esp(ret));
        }
        Ok(handle)
    }

    pub(super) fn close(handle: nvs_handle_t, open: bool) {
        if open {
            // SAFETY: `handle` came from nvs_open_from_partition.
            unsafe { nvs_close(handle) };
        }
        // SAFETY: board_flash_nvs_deinit tolerates being called uninitialised.
        unsafe { board_flash_nvs_deinit() };
        if let Ok(mut slot) = MODIFIED_CB.lock() {
            *slot = None;
        }
    }
}
