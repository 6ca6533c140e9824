// Shared fixtures: a driver that records every request, and a callback
// that records every delivery.

#![allow(dead_code)]

use std::cell::{Cell, RefCell};
use std::sync::Mutex;
use std::vec::Vec;

use pool_timer::{Context, DriverError, TimerDriver, TimerEvent, TimerId, TimerName};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Call {
    Create(TimerId),
    StartOnce(usize, u64),
    StartPeriodic(usize, u64),
    Stop(usize),
}

/// Accepts everything unless told otherwise; stop is always idempotent.
pub struct RecordingDriver {
    calls: RefCell<Vec<Call>>,
    created: Cell<usize>,
    now: Cell<u64>,
    pub fail_create: Cell<Option<DriverError>>,
    pub fail_start: Cell<Option<DriverError>>,
    pub fail_stop: Cell<Option<DriverError>>,
}

impl RecordingDriver {
    pub fn new() -> Self {
        Self {
            calls: RefCell::new(Vec::new()),
            created: Cell::new(0),
            now: Cell::new(0),
            fail_create: Cell::new(None),
            fail_start: Cell::new(None),
            fail_stop: Cell::new(None),
        }
    }

    pub fn take_calls(&self) -> Vec<Call> {
        self.calls.borrow_mut().drain(..).collect()
    }

    pub fn set_time(&self, now: u64) {
        self.now.set(now);
    }

    fn record(&self, call: Call) {
        self.calls.borrow_mut().push(call);
    }
}

impl TimerDriver for RecordingDriver {
    type Handle = usize;

    fn create(&self, arg: TimerId, _name: &TimerName) -> Result<usize, DriverError> {
        if let Some(e) = self.fail_create.get() {
            return Err(e);
        }
        self.record(Call::Create(arg));
        let handle = self.created.get();
        self.created.set(handle + 1);
        Ok(handle)
    }

    fn start_once(&self, handle: usize, interval: u64) -> Result<(), DriverError> {
        if let Some(e) = self.fail_start.get() {
            return Err(e);
        }
        self.record(Call::StartOnce(handle, interval));
        Ok(())
    }

    fn start_periodic(&self, handle: usize, interval: u64) -> Result<(), DriverError> {
        if let Some(e) = self.fail_start.get() {
            return Err(e);
        }
        self.record(Call::StartPeriodic(handle, interval));
        Ok(())
    }

    fn stop(&self, handle: usize) -> Result<(), DriverError> {
        if let Some(e) = self.fail_stop.get() {
            return Err(e);
        }
        self.record(Call::Stop(handle));
        Ok(())
    }

    fn current_time(&self) -> u64 {
        self.now.get()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Fired {
    pub event: TimerEvent,
    pub creator: Context,
    pub user: Context,
}

// Shared by every test in a binary; tests keep apart by creator context.
static FIRED: Mutex<Vec<Fired>> = Mutex::new(Vec::new());

pub fn record(event: TimerEvent, creator: Context, user: Context) {
    FIRED.lock().unwrap().push(Fired {
        event,
        creator,
        user,
    });
}

/// Deliveries so far for `creator`, oldest first.
pub fn fired_for(creator: Context) -> Vec<Fired> {
    FIRED
        .lock()
        .unwrap()
        .iter()
        .filter(|f| f.creator == creator)
        .copied()
        .collect()
}
