//! UF2 updater lifecycle: the install/uninstall core.
//!
//! [`Uf2Updater`] owns the install state of one updater instance and the
//! port implementations it forwards to.  It validates caller
//! configuration, initialises the collaborators in a fixed order and
//! unwinds them if one fails, so a failed install never leaves a
//! half-initialised updater behind.
//!
//! ```text
//!                 ┌─────────────────────────┐ ──▶ OtaFlashPort
//!  install()   ──▶│       Uf2Updater        │ ──▶ NvsPort
//!  uninstall() ──▶│ Uninstalled ⇄ Installed │ ──▶ Uf2EnginePort
//!                 └─────────────────────────┘ ──▶ ConsolePort (optional)
//! ```
//!
//! Both operations take `&mut self`; share an updater between tasks by
//! wrapping it in a mutex.

use log::{error, info, warn};

use crate::config::{NvsConfig, OtaConfig, UpdaterSettings};
use crate::error::{Error, Result, StateError};

use super::ports::{ConsolePort, NvsPort, OtaFlashPort, Uf2EnginePort};

/// Lifecycle phase of a [`Uf2Updater`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum InstallState {
    #[default]
    Uninstalled,
    Installed,
}

// ───────────────────────────────────────────────────────────────
// Uf2Updater
// ───────────────────────────────────────────────────────────────

pub struct Uf2Updater<O, N, U, C> {
    ota: O,
    nvs: N,
    uf2: U,
    console: C,
    settings: UpdaterSettings,
    state: InstallState,
}

impl<O, N, U, C> Uf2Updater<O, N, U, C>
where
    O: OtaFlashPort,
    N: NvsPort,
    U: Uf2EnginePort,
    C: ConsolePort,
{
    /// Build an updater in the `Uninstalled` state.  Nothing is
    /// initialised until [`install`](Self::install).
    pub fn new(ota: O, nvs: N, uf2: U, console: C, settings: UpdaterSettings) -> Self {
        Self {
            ota,
            nvs,
            uf2,
            console,
            settings,
            state: InstallState::Uninstalled,
        }
    }

    pub fn state(&self) -> InstallState {
        self.state
    }

    pub fn is_installed(&self) -> bool {
        self.state == InstallState::Installed
    }

    pub fn settings(&self) -> &UpdaterSettings {
        &self.settings
    }

    // ── Lifecycle ─────────────────────────────────────────────

    /// Install the updater.
    ///
    /// At least one of `ota` / `nvs` must be given.  Every check runs
    /// before any backend is touched; the state flips to `Installed`
    /// only once all backends are up.
    pub fn install(&mut self, ota: Option<&OtaConfig<'_>>, nvs: Option<&NvsConfig<'_>>) -> Result<()> {
        if self.is_installed() {
            error!("UF2 updater already installed");
            return Err(StateError::AlreadyInstalled.into());
        }

        if ota.is_none() && nvs.is_none() {
            error!("Invalid parameter, OTA and NVS config can't both be empty");
            return Err(Error::InvalidArgument(
                "configuration must supply at least one of OTA or NVS settings",
            ));
        }

        if let Some(cfg) = ota {
            cfg.validate().inspect_err(|e| {
                error!("OTA config rejected (subtype 0x{:02x}): {}", cfg.subtype.raw(), e);
            })?;
        }
        if let Some(cfg) = nvs {
            cfg.validate().inspect_err(|e| error!("NVS config rejected: {}", e))?;
        }

        self.bring_up(ota, nvs)?;

        self.state = InstallState::Installed;
        info!(
            "UF2 updater installed (ota={}, nvs={})",
            ota.is_some(),
            nvs.is_some()
        );
        Ok(())
    }

    /// Uninstall the updater.  Both storage backends are released
    /// unconditionally, whichever of them `install` actually set up.
    pub fn uninstall(&mut self) -> Result<()> {
        if !self.is_installed() {
            error!("UF2 updater not installed");
            return Err(StateError::NotInstalled.into());
        }

        self.ota.deinit();
        self.nvs.deinit();
        info!("UF2 updater uninstall succeeded");
        self.state = InstallState::Uninstalled;
        Ok(())
    }

    // ── Backend bring-up ──────────────────────────────────────

    fn bring_up(&mut self, ota: Option<&OtaConfig<'_>>, nvs: Option<&NvsConfig<'_>>) -> Result<()> {
        if let Some(cfg) = ota {
            if cfg.restart {
                warn!("Restart enabled, SoC will restart after update completes");
            }
            self.ota
                .init(cfg.subtype, cfg.label, cfg.complete_cb, cfg.restart)
                .inspect_err(|e| error!("OTA flash backend init failed: {}", e))?;
        }

        if let Some(cfg) = nvs {
            if let Err(e) = self.nvs.init(cfg.part_name, cfg.namespace, cfg.modified_cb) {
                error!("NVS backend init failed: {}", e);
                if ota.is_some() {
                    self.ota.deinit();
                }
                return Err(e.into());
            }
        }

        if let Err(e) = self.uf2.init() {
            error!("UF2 engine init failed: {}", e);
            if nvs.is_some() {
                self.nvs.deinit();
            }
            if ota.is_some() {
                self.ota.deinit();
            }
            return Err(e.into());
        }

        if self.settings.usb_console {
            info!("Enable USB console, log will be output to USB");
            if let Err(e) = self.console.init(&self.settings.console) {
                warn!("USB console init failed ({}), keeping default console", e);
            }
        }

        Ok(())
    }

    // ── Backend access ────────────────────────────────────────

    pub fn ota_backend(&self) -> &O {
        &self.ota
    }

    pub fn ota_backend_mut(&mut self) -> &mut O {
        &mut self.ota
    }

    pub fn nvs_backend(&self) -> &N {
        &self.nvs
    }

    pub fn nvs_backend_mut(&mut self) -> &mut N {
        &mut self.nvs
    }

    pub fn uf2_engine(&self) -> &U {
        &self.uf2
    }

    pub fn uf2_engine_mut(&mut self) -> &mut U {
        &mut self.uf2
    }

    pub fn console(&self) -> &C {
        &self.console
    }

    pub fn console_mut(&mut self) -> &mut C {
        &mut self.console
    }

    /// Tear the updater apart, returning the backends as-is (no deinit).
    pub fn into_parts(self) -> (O, N, U, C) {
        (self.ota, self.nvs, self.uf2, self.console)
    }
}

// ── Tests ─────────────────────────────────────────────────────
