//! Port traits: the boundary between the updater lifecycle and its collaborators.
//!
//! ```text
//!   Adapter ──▶ Port trait ──▶ Uf2Updater (lifecycle)
//! ```
//!
//! Each collaborator the C component calls directly (`board_flash_init`,
//! `board_flash_nvs_init`, `uf2_init`, the CDC console) becomes a trait
//! here.  [`Uf2Updater`](super::updater::Uf2Updater) consumes them via
//! generics, so the lifecycle never touches flash or USB directly.
//!
//! All `init` methods are synchronous and report failures as
//! [`BackendError`]; `deinit` cannot fail and must tolerate being called
//! on a backend that was never initialised.

use crate::config::{
    ConsoleConfig, NvsModifiedCallback, PartitionSubtype, UpdateCompleteCallback,
};
use crate::error::BackendError;

// ───────────────────────────────────────────────────────────────
// OTA flash backend
// ───────────────────────────────────────────────────────────────

/// Writes application images received over UF2 into an OTA partition.
pub trait OtaFlashPort {
    /// Select the target partition and arm the completion hook.
    ///
    /// `label` is borrowed for the call only; implementations copy it if
    /// they need it later.
    fn init(
        &mut self,
        subtype: PartitionSubtype,
        label: Option<&str>,
        on_complete: Option<UpdateCompleteCallback>,
        restart_on_complete: bool,
    ) -> Result<(), BackendError>;

    /// Release the target partition.
    fn deinit(&mut self);
}

// ───────────────────────────────────────────────────────────────
// NVS backend
// ───────────────────────────────────────────────────────────────

/// Exposes an NVS namespace for update over UF2.
pub trait NvsPort {
    fn init(
        &mut self,
        part_name: &str,
        namespace: &str,
        on_modified: Option<NvsModifiedCallback>,
    ) -> Result<(), BackendError>;

    fn deinit(&mut self);
}

// ───────────────────────────────────────────────────────────────
// UF2 protocol engine
// ───────────────────────────────────────────────────────────────

/// The UF2 mass-storage engine.  A singleton that discovers the active
/// flash/NVS backends itself, so `init` takes no arguments and repeated
/// calls must be harmless.
pub trait Uf2EnginePort {
    fn init(&mut self) -> Result<(), BackendError>;
}

// ───────────────────────────────────────────────────────────────
// USB console redirect
// ───────────────────────────────────────────────────────────────

/// Routes the ESP-IDF console to a USB CDC-ACM port.
pub trait ConsolePort {
    fn init(&mut self, config: &ConsoleConfig) -> Result<(), BackendError>;
}
