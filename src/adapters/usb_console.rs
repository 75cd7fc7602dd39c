//! USB CDC-ACM console adapter.
//!
//! Implements [`ConsolePort`]: brings up a CDC-ACM interface on the
//! TinyUSB stack and points the ESP-IDF console (stdout/stderr and the log
//! output) at it, so logs keep flowing while the UF2 drive is mounted.

use log::info;

use crate::app::ports::ConsolePort;
use crate::config::ConsoleConfig;
use crate::error::BackendError;

#[derive(Debug, Default)]
pub struct UsbConsole {
    active: Option<ConsoleConfig>,
}

impl UsbConsole {
    pub fn new() -> Self {
        Self::default()
    }

    /// Port the console is redirected to, if any.
    pub fn active(&self) -> Option<&ConsoleConfig> {
        self.active.as_ref()
    }
}

impl ConsolePort for UsbConsole {
    fn init(&mut self, config: &ConsoleConfig) -> Result<(), BackendError> {
        #[cfg(target_os = "espidf")]
        ffi::init(config.cdc_port)?;

        self.active = Some(*config);
        info!("USB console on CDC-ACM {}", config.cdc_port);
        Ok(())
    }
}

#[cfg(target_os = "espidf")]
mod ffi {
    use core::ffi::c_int;

    use esp_idf_sys::ESP_OK;

    use crate::error::BackendError;

    /// `tinyusb_config_cdcacm_t` with every callback left unset.
    #[repr(C)]
    struct CdcAcmConfig {
        usb_dev: c_int,
        cdc_port: c_int,
        rx_unread_buf_sz: usize,
        callbacks: [usize; 4],
    }

    unsafe extern "C" {
        fn tusb_cdc_acm_init(cfg: *const CdcAcmConfig) -> c_int;
        fn esp_tusb_init_console(cdc_intf: c_int) -> c_int;
    }

    pub(super) fn init(port: u8) -> Result<(), BackendError> {
        let cfg = CdcAcmConfig {
            usb_dev: 0,
            cdc_port: c_int::from(port),
            rx_unread_buf_sz: 0,
            callbacks: [0; 4],
        };
        // SAFETY: `cfg` is only read for the duration of the call.
        let ret = unsafe { tusb_cdc_acm_init(&cfg) };
        if ret != ESP_OK {
            return Err(BackendError::Esp(ret));
        }
        let ret = unsafe { esp_tusb_init_console(c_int::from(port)) };
        if ret != ESP_OK {
            return Err(BackendError::Esp(ret));
        }
        Ok(())
    }
}
