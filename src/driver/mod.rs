//! Native timer drivers the pool is built on.
//!
//! A driver owns the actual expiry scheduling. The pool only asks it to
//! create, arm and stop native timers, and expects to be told about
//! expiries through [`ExpiryClient`] with the [`TimerId`] it passed at
//! creation.

pub mod service;

pub use service::TimerService;

use core::fmt;

use crate::timer::{TimerId, TimerName};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DriverError {
    /// No native timer left
    NoMemory,
    InvalidArgument,
    /// e.g. start on an armed timer
    InvalidState,
    /// Raw status from a foreign driver
    Code(i32),
}

impl fmt::Display for DriverError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DriverError::NoMemory => write!(f, "no memory"),
            DriverError::InvalidArgument => write!(f, "invalid argument"),
            DriverError::InvalidState => write!(f, "invalid state"),
            DriverError::Code(code) => write!(f, "code {}", code),
        }
    }
}

pub trait TimerDriver {
    /// Native timer instance, owned by exactly one pool slot.
    type Handle: Copy;

    /// Create an idle native timer that reports expiry with `arg`.
    fn create(&self, arg: TimerId, name: &TimerName) -> Result<Self::Handle, DriverError>;

    fn start_once(&self, handle: Self::Handle, interval: u64) -> Result<(), DriverError>;

    fn start_periodic(&self, handle: Self::Handle, interval: u64) -> Result<(), DriverError>;

    /// Stopping an idle timer is not an error.
    fn stop(&self, handle: Self::Handle) -> Result<(), DriverError>;

    /// Monotonic clock in driver units.
    fn current_time(&self) -> u64;
}

/// Receiver of expiry notifications, called from the driver's own context.
pub trait ExpiryClient {
    fn expired(&self, arg: TimerId);
}
