//! In-memory collaborators for controller tests.

use std::{
    cell::{Cell, RefCell},
    collections::VecDeque,
    net::Ipv4Addr,
    rc::Rc,
};

use embedded_hal::{
    delay::DelayNs,
    digital::{ErrorKind, ErrorType, OutputPin},
};

use crate::{
    ports::{DocumentClient, LinkError, NetworkLink, TransportError},
    types::{LinkStatus, PollResult},
};

/// Output pin whose level stays observable after the pin is moved into the
/// controller.
#[derive(Clone, Default)]
pub struct MockPin {
    level: Rc<Cell<Option<bool>>>,
    writes: Rc<Cell<usize>>,
    failing: Rc<Cell<bool>>,
}

impl MockPin {
    pub fn level(&self) -> Option<bool> {
        self.level.get()
    }

    pub fn writes(&self) -> usize {
        self.writes.get()
    }

    pub fn set_failing(&self, failing: bool) {
        self.failing.set(failing);
    }

    fn write(&mut self, high: bool) -> Result<(), ErrorKind> {
        if self.failing.get() {
            return Err(ErrorKind::Other);
        }
        self.level.set(Some(high));
        self.writes.set(self.writes.get() + 1);
        Ok(())
    }
}

impl ErrorType for MockPin {
    type Error = ErrorKind;
}

impl OutputPin for MockPin {
    fn set_low(&mut self) -> Result<(), Self::Error> {
        self.write(false)
    }

    fn set_high(&mut self) -> Result<(), Self::Error> {
        self.write(true)
    }
}

#[derive(Clone, Default)]
pub struct RecordingDelay {
    waits_ns: Rc<RefCell<Vec<u64>>>,
}

impl RecordingDelay {
    pub fn total_ms(&self) -> u64 {
        self.waits_ns.borrow().iter().sum::<u64>() / 1_000_000
    }

    pub fn calls(&self) -> usize {
        self.waits_ns.borrow().len()
    }
}

impl DelayNs for RecordingDelay {
    fn delay_ns(&mut self, ns: u32) {
        self.waits_ns.borrow_mut().push(u64::from(ns));
    }

    fn delay_ms(&mut self, ms: u32) {
        self.waits_ns
            .borrow_mut()
            .push(u64::from(ms) * 1_000_000);
    }
}

/// Link that fails a scripted number of attempts before associating.
#[derive(Clone)]
pub struct ScriptedLink {
    failures_left: Rc<Cell<u32>>,
    attempts: Rc<Cell<u32>>,
    status: Rc<Cell<LinkStatus>>,
    address: Ipv4Addr,
}

impl ScriptedLink {
    pub fn failing(times: u32) -> Self {
        Self {
            failures_left: Rc::new(Cell::new(times)),
            attempts: Rc::new(Cell::new(0)),
            status: Rc::new(Cell::new(LinkStatus::Disconnected)),
            address: Ipv4Addr::new(192, 168, 4, 20),
        }
    }

    pub fn attempts(&self) -> u32 {
        self.attempts.get()
    }

    pub fn drop_link(&self, further_failures: u32) {
        self.status.set(LinkStatus::Disconnected);
        self.failures_left.set(further_failures);
    }
}

impl NetworkLink for ScriptedLink {
    fn connect(&mut self, _ssid: &str, _password: &str) -> Result<(), LinkError> {
        self.attempts.set(self.attempts.get() + 1);
        if self.failures_left.get() > 0 {
            self.failures_left.set(self.failures_left.get() - 1);
            return Err(LinkError::Association("no ap found".to_string()));
        }
        self.status.set(LinkStatus::Connected);
        Ok(())
    }

    fn current_address(&self) -> Option<Ipv4Addr> {
        (self.status.get() == LinkStatus::Connected).then_some(self.address)
    }

    fn status(&self) -> LinkStatus {
        self.status.get()
    }
}

/// Client that replays queued responses and records requested paths.
#[derive(Clone, Default)]
pub struct ScriptedClient {
    responses: Rc<RefCell<VecDeque<Result<PollResult, TransportError>>>>,
    paths: Rc<RefCell<Vec<String>>>,
}

impl ScriptedClient {
    pub fn respond(&self, status_code: u16, body: &str) {
        self.responses
            .borrow_mut()
            .push_back(Ok(PollResult::new(status_code, body)));
    }

    pub fn fail(&self, err: TransportError) {
        self.responses.borrow_mut().push_back(Err(err));
    }

    pub fn paths(&self) -> Vec<String> {
        self.paths.borrow().clone()
    }
}

impl DocumentClient for ScriptedClient {
    fn get(&mut self, path: &str) -> Result<PollResult, TransportError> {
        self.paths.borrow_mut().push(path.to_string());
        self.responses
            .borrow_mut()
            .pop_front()
            .unwrap_or_else(|| Err(TransportError::Other("no scripted response".to_string())))
    }
}
