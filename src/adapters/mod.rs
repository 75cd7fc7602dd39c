//! Adapters: concrete implementations of the updater port traits.
//!
//! | Adapter       | Implements     | Connects to                        |
//! |---------------|----------------|------------------------------------|
//! | `board_flash` | OtaFlashPort   | OTA app partitions / `board_flash` |
//! | `nvs`         | NvsPort        | NVS namespace / `board_flash_nvs`  |
//! | `uf2`         | Uf2EnginePort  | UF2 MSC engine (`uf2_init`)        |
//! | `usb_console` | ConsolePort    | TinyUSB CDC-ACM console            |
//!
//! Every adapter has an ESP-IDF implementation and an in-memory
//! simulation selected by `target_os`.

pub mod board_flash;
pub mod nvs;
pub mod uf2;
pub mod usb_console;
pub(crate) mod utils;

use crate::app::updater::Uf2Updater;
use crate::config::UpdaterSettings;

/// Updater wired to the stock adapters.
pub type DefaultUpdater = Uf2Updater<board_flash::BoardFlash, nvs::NvsStore, uf2::TinyUsbUf2, usb_console::UsbConsole>;

/// Build a [`DefaultUpdater`] over fresh adapters.
pub fn default_updater(settings: UpdaterSettings) -> DefaultUpdater {
    Uf2Updater::new(
        board_flash::BoardFlash::new(),
        nvs::NvsStore::new(),
        uf2::TinyUsbUf2::new(),
        usb_console::UsbConsole::new(),
        settings,
    )
}
