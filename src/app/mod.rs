//! Application core: the updater lifecycle, zero I/O.
//!
//! [`updater`] holds the install/uninstall state machine.  All interaction
//! with flash, NVS and USB happens through the **port traits** defined in
//! [`ports`], keeping this layer fully testable without real peripherals.

pub mod ports;
pub mod updater;
