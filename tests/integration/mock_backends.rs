//! Recording mock backends for integration tests.
//!
//! Every port call is appended to one shared log so tests can assert on
//! call order across backends, not just per-backend counts.

use std::cell::RefCell;
use std::rc::Rc;

use esp_tinyuf2::app::ports::{ConsolePort, NvsPort, OtaFlashPort, Uf2EnginePort};
use esp_tinyuf2::app::updater::Uf2Updater;
use esp_tinyuf2::config::{
    ConsoleConfig, NvsModifiedCallback, PartitionSubtype, UpdateCompleteCallback, UpdaterSettings,
};
use esp_tinyuf2::error::BackendError;

// ── Call record ───────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    OtaInit {
        subtype: PartitionSubtype,
        label: Option<String>,
        has_cb: bool,
        restart: bool,
    },
    OtaDeinit,
    NvsInit {
        part: String,
        namespace: String,
        has_cb: bool,
    },
    NvsDeinit,
    Uf2Init,
    ConsoleInit {
        port: u8,
    },
}

pub type CallLog = Rc<RefCell<Vec<Call>>>;

// ── Mocks ─────────────────────────────────────────────────────

pub struct MockOta {
    log: CallLog,
    pub fail: Option<BackendError>,
}

pub struct MockNvs {
    log: CallLog,
    pub fail: Option<BackendError>,
}

pub struct MockUf2 {
    log: CallLog,
    pub fail: Option<BackendError>,
}

pub struct MockConsole {
    log: CallLog,
    pub fail: Option<BackendError>,
}

impl OtaFlashPort for MockOta {
    fn init(
        &mut self,
        subtype: PartitionSubtype,
        label: Option<&str>,
        on_complete: Option<UpdateCompleteCallback>,
        restart_on_complete: bool,
    ) -> Result<(), BackendError> {
        self.log.borrow_mut().push(Call::OtaInit {
            subtype,
            label: label.map(str::to_owned),
            has_cb: on_complete.is_some(),
            restart: restart_on_complete,
        });
        self.fail.map_or(Ok(()), Err)
    }

    fn deinit(&mut self) {
        self.log.borrow_mut().push(Call::OtaDeinit);
    }
}

impl NvsPort for MockNvs {
    fn init(
        &mut self,
        part_name: &str,
        namespace: &str,
        on_modified: Option<NvsModifiedCallback>,
    ) -> Result<(), BackendError> {
        self.log.borrow_mut().push(Call::NvsInit {
            part: part_name.to_owned(),
            namespace: namespace.to_owned(),
            has_cb: on_modified.is_some(),
        });
        self.fail.map_or(Ok(()), Err)
    }

    fn deinit(&mut self) {
        self.log.borrow_mut().push(Call::NvsDeinit);
    }
}

impl Uf2EnginePort for MockUf2 {
    fn init(&mut self) -> Result<(), BackendError> {
        self.log.borrow_mut().push(Call::Uf2Init);
        self.fail.map_or(Ok(()), Err)
    }
}

impl ConsolePort for MockConsole {
    fn init(&mut self, config: &ConsoleConfig) -> Result<(), BackendError> {
        self.log.borrow_mut().push(Call::ConsoleInit {
            port: config.cdc_port,
        });
        self.fail.map_or(Ok(()), Err)
    }
}

// ── Builders ──────────────────────────────────────────────────

pub type MockUpdater = Uf2Updater<MockOta, MockNvs, MockUf2, MockConsole>;

pub fn mock_updater_with(settings: UpdaterSettings) -> (MockUpdater, CallLog) {
    let log: CallLog = Rc::new(RefCell::new(Vec::new()));
    let updater = Uf2Updater::new(
        MockOta {
            log: log.clone(),
            fail: None,
        },
        MockNvs {
            log: log.clone(),
            fail: None,
        },
        MockUf2 {
            log: log.clone(),
            fail: None,
        },
        MockConsole {
            log: log.clone(),
            fail: None,
        },
        settings,
    );
    (updater, log)
}

/// Updater with the console redirect disabled.
pub fn mock_updater() -> (MockUpdater, CallLog) {
    mock_updater_with(UpdaterSettings {
        usb_console: false,
        ..Default::default()
    })
}

#[allow(dead_code)]
pub fn take_calls(log: &CallLog) -> Vec<Call> {
    std::mem::take(&mut *log.borrow_mut())
}
