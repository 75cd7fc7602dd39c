//! TinyUF2 demo firmware: main entry point.
//!
//! Boots ESP-IDF, confirms the running image, then installs the UF2
//! updater with both the OTA and NVS paths enabled.  The board shows up
//! as a USB drive: dropping a `.uf2` image onto it flashes the next OTA
//! slot, and editing `CONFIG.INI` rewrites the `tuf2` NVS namespace.
//!
//! ```text
//!  esp_idf_logger ─┐
//!                  ▼
//!  main ──▶ Uf2Updater ──▶ BoardFlash · NvsStore · TinyUsbUf2 · UsbConsole
//! ```
#![deny(unused_must_use)]

use anyhow::Result;
use esp_idf_hal::delay::FreeRtos;
use log::{info, warn};

use esp_tinyuf2::adapters::default_updater;
use esp_tinyuf2::config::{NvsConfig, OtaConfig, UpdateMode, UpdaterSettings};

fn on_update_complete(mode: UpdateMode) {
    match mode {
        UpdateMode::App => info!("UF2: firmware image written"),
        UpdateMode::Nvs => info!("UF2: NVS contents written"),
    }
}

fn on_nvs_modified() {
    info!("UF2: NVS namespace modified");
}

fn main() -> Result<()> {
    // ── 1. ESP-IDF bootstrap ──────────────────────────────────
    esp_idf_svc::sys::link_patches();
    esp_idf_logger::init()?;

    info!("TinyUF2 v{}", env!("CARGO_PKG_VERSION"));

    // ── 2. Rollback check ─────────────────────────────────────
    // A freshly flashed image is pending verification; reaching main is
    // good enough to keep it.
    match esp_ota::mark_app_valid() {
        Ok(()) => info!("OTA: firmware marked valid (rollback cancelled)"),
        Err(e) => warn!("OTA: mark_app_valid failed: {:?}", e),
    }

    // ── 3. Install the updater ────────────────────────────────
    let ota = OtaConfig {
        complete_cb: Some(on_update_complete),
        ..Default::default()
    };
    let nvs = NvsConfig {
        modified_cb: Some(on_nvs_modified),
        ..Default::default()
    };

    let mut updater = default_updater(UpdaterSettings::default());
    updater
        .install(Some(&ota), Some(&nvs))
        .map_err(|e| anyhow::anyhow!("UF2 updater install failed: {e}"))?;

    if let Some(target) = updater.ota_backend().target() {
        info!(
            "UF2 drive ready, images go to '{}' @ 0x{:08x}",
            target.label, target.address
        );
    }

    // ── 4. Idle ───────────────────────────────────────────────
    // USB and flash work happens in the TinyUSB task; restart after a
    // completed image is handled by the flash writer.
    loop {
        FreeRtos::delay_ms(1000);
    }
}
