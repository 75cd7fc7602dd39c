//! Unified error types for the UF2 updater.
//!
//! A single `Error` enum that every layer converts into, mirroring the
//! status codes the ESP-IDF component reports (`ESP_ERR_INVALID_STATE`,
//! `ESP_ERR_INVALID_ARG`, ...).  All variants are `Copy` so they can be
//! passed back through FFI shims and logs without allocation.

use core::fmt;

// ---------------------------------------------------------------------------
// ESP-IDF status codes
// ---------------------------------------------------------------------------

/// `ESP_ERR_INVALID_ARG`
pub const ESP_ERR_INVALID_ARG: i32 = 0x102;
/// `ESP_ERR_INVALID_STATE`
pub const ESP_ERR_INVALID_STATE: i32 = 0x103;
/// `ESP_ERR_INVALID_SIZE`
pub const ESP_ERR_INVALID_SIZE: i32 = 0x104;
/// `ESP_ERR_NOT_FOUND`
pub const ESP_ERR_NOT_FOUND: i32 = 0x105;
/// `ESP_ERR_NVS_INVALID_NAME`
pub const ESP_ERR_NVS_INVALID_NAME: i32 = 0x1106;
/// `ESP_ERR_NVS_KEY_TOO_LONG`
pub const ESP_ERR_NVS_KEY_TOO_LONG: i32 = 0x1109;

// ---------------------------------------------------------------------------
// Top-level updater error
// ---------------------------------------------------------------------------

/// Every fallible updater operation funnels into this type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    /// The lifecycle is in the wrong phase for the requested operation.
    InvalidState(StateError),
    /// Caller-supplied configuration violates a precondition.
    InvalidArgument(&'static str),
    /// A collaborator (flash, NVS, USB) failed to initialise.
    Backend(BackendError),
}

/// Coarse status class, one per ESP-IDF error family the updater reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    InvalidState,
    InvalidArgument,
    Backend,
}

impl Error {
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::InvalidState(_) => ErrorKind::InvalidState,
            Self::InvalidArgument(_) => ErrorKind::InvalidArgument,
            Self::Backend(_) => ErrorKind::Backend,
        }
    }

    /// The `esp_err_t` value the C component would have returned.
    pub const fn esp_err(&self) -> i32 {
        match self {
            Self::InvalidState(_) => ESP_ERR_INVALID_STATE,
            Self::InvalidArgument(_) => ESP_ERR_INVALID_ARG,
            Self::Backend(e) => e.esp_err(),
        }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidState(e) => write!(f, "invalid state: {e}"),
            Self::InvalidArgument(msg) => write!(f, "invalid argument: {msg}"),
            Self::Backend(e) => write!(f, "backend: {e}"),
        }
    }
}

// ---------------------------------------------------------------------------
// Lifecycle state errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StateError {
    /// `install` called while already installed.
    AlreadyInstalled,
    /// `uninstall` called without a prior successful `install`.
    NotInstalled,
}

impl fmt::Display for StateError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::AlreadyInstalled => write!(f, "UF2 updater already installed"),
            Self::NotInstalled => write!(f, "UF2 updater not installed"),
        }
    }
}

impl From<StateError> for Error {
    fn from(e: StateError) -> Self {
        Self::InvalidState(e)
    }
}

// ---------------------------------------------------------------------------
// Collaborator errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackendError {
    /// No app partition matches the requested subtype/label.
    PartitionNotFound,
    /// Backend operation attempted before `init` (or after `deinit`).
    NotInitialized,
    /// Raw `esp_err_t` returned by an ESP-IDF call.
    Esp(i32),
}

impl BackendError {
    pub const fn esp_err(&self) -> i32 {
        match self {
            Self::PartitionNotFound => ESP_ERR_NOT_FOUND,
            Self::NotInitialized => ESP_ERR_INVALID_STATE,
            Self::Esp(code) => *code,
        }
    }
}

impl fmt::Display for BackendError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::PartitionNotFound => write!(f, "no matching app partition"),
            Self::NotInitialized => write!(f, "backend not initialised"),
            Self::Esp(code) => write!(f, "ESP-IDF error 0x{code:x}"),
        }
    }
}

impl From<BackendError> for Error {
    fn from(e: BackendError) -> Self {
        Self::Backend(e)
    }
}

// ---------------------------------------------------------------------------
// Convenience Result alias
// ---------------------------------------------------------------------------

/// Crate-wide `Result` alias.
pub type Result<T> = core::result::Result<T, Error>;
