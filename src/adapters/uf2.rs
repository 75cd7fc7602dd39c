//! UF2 engine adapter.
//!
//! Implements [`Uf2EnginePort`] by starting the component's UF2 mass-storage
//! engine (`uf2_init`).  The engine is a process-wide singleton that finds
//! the flash and NVS writers on its own; it is started once per process and
//! stays up across uninstall/install cycles, so later `init` calls (from
//! this adapter or any other instance) are no-ops.

use core::sync::atomic::{AtomicBool, Ordering};

use log::info;

use crate::app::ports::Uf2EnginePort;
use crate::error::BackendError;

#[cfg(target_os = "espidf")]
unsafe extern "C" {
    fn uf2_init();
}

/// Set by whichever adapter instance starts the engine.
static ENGINE_STARTED: AtomicBool = AtomicBool::new(false);

/// Start the engine unless some instance already did.  Returns `true` if
/// this call started it.
fn start_engine() -> bool {
    if ENGINE_STARTED.swap(true, Ordering::AcqRel) {
        return false;
    }

    // SAFETY: uf2_init only registers the MSC callbacks and formats the
    // virtual FAT; the swap above guarantees a single call per process.
    #[cfg(target_os = "espidf")]
    unsafe {
        uf2_init();
    }

    info!("UF2 engine started");
    true
}

#[derive(Debug, Default)]
pub struct TinyUsbUf2 {
    running: bool,
    started_engine: bool,
    init_calls: u32,
}

impl TinyUsbUf2 {
    pub fn new() -> Self {
        Self::default()
    }

    /// `true` once this adapter has been initialised; the engine itself
    /// may have been started by another instance.
    pub fn is_running(&self) -> bool {
        self.running
    }

    /// `true` if this instance's `init` is the one that called `uf2_init`.
    pub fn started_engine(&self) -> bool {
        self.started_engine
    }

    /// Number of `init` requests seen, including no-op repeats.
    pub fn init_calls(&self) -> u32 {
        self.init_calls
    }
}

impl Uf2EnginePort for TinyUsbUf2 {
    fn init(&mut self) -> Result<(), BackendError> {
        self.init_calls += 1;
        if self.running {
            return Ok(());
        }

        self.started_engine = start_engine();
        self.running = true;
        Ok(())
    }
}
