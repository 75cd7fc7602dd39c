//! UF2 drag-and-drop firmware updater for ESP32-S2/S3.
//!
//! Exposes the install/uninstall lifecycle ([`app::updater::Uf2Updater`])
//! and the adapters that connect it to flash, NVS and USB.  All
//! ESP-IDF-specific code is guarded by `#[cfg(target_os = "espidf")]`
//! within each module; host builds get in-memory simulations.

#![deny(unused_must_use)]

pub mod adapters;
pub mod app;
pub mod config;
pub mod error;

pub use error::{Error, Result};
