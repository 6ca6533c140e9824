//! Software timers handed out from a fixed pool.
//!
//! Callers see a [`Timer`] capability; the concrete object lives in a
//! [`TimerPool`] slot addressed by [`TimerId`]. Every expiry is routed
//! through one dispatch path that hands the owner back its creator and
//! user contexts.

pub mod error;
pub mod interface;
pub mod pool;

pub use error::TimerError;
pub use interface::Timer;
pub use pool::{PoolTimer, TimerPool};

use core::fmt;

use crate::config::TIMER_NAME_LEN;

/// How `start` arms the driver.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RunType {
    #[default]
    OneShot,
    Periodic,
}

/// Event handed to a [`TimerCallback`].
///
/// Only `Elapsed` is delivered; `Started` and `Stopped` are reserved.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerEvent {
    Started,
    Elapsed,
    Stopped,
}

impl fmt::Display for TimerEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TimerEvent::Started => write!(f, "Started"),
            TimerEvent::Elapsed => write!(f, "Elapsed"),
            TimerEvent::Stopped => write!(f, "Stopped"),
        }
    }
}

/// Opaque owner tag. Forwarded untouched, never interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Context(pub usize);

impl Context {
    pub const NONE: Context = Context(0);
}

/// `(event, creator_context, user_context)`
pub type TimerCallback = fn(TimerEvent, Context, Context);

/// Slot index inside a [`TimerPool`]; also the driver's opaque argument.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TimerId(u8);

impl TimerId {
    pub const fn from_index(index: usize) -> Self {
        debug_assert!(index <= u8::MAX as usize, "TimerId index out of range");
        Self(index as u8)
    }

    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for TimerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Diagnostic name, truncated on a char boundary to [`TIMER_NAME_LEN`] bytes.
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct TimerName {
    buf: [u8; TIMER_NAME_LEN],
    len: u8,
}

impl TimerName {
    pub const fn empty() -> Self {
        Self {
            buf: [0u8; TIMER_NAME_LEN],
            len: 0,
        }
    }

    pub fn new(name: &str) -> Self {
        let mut end = name.len().min(TIMER_NAME_LEN);
        while !name.is_char_boundary(end) {
            end -= 1;
        }
        let mut buf = [0u8; TIMER_NAME_LEN];
        buf[..end].copy_from_slice(&name.as_bytes()[..end]);
        Self {
            buf,
            len: end as u8,
        }
    }

    pub fn as_str(&self) -> &str {
        // only ever filled from a &str cut on a char boundary
        core::str::from_utf8(&self.buf[..self.len as usize]).unwrap_or("")
    }

    pub fn len(&self) -> usize {
        self.len as usize
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }
}

impl Default for TimerName {
    fn default() -> Self {
        Self::empty()
    }
}

impl fmt::Display for TimerName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl fmt::Debug for TimerName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self.as_str())
    }
}
