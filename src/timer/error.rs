use core::fmt;

use crate::driver::DriverError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerError {
    /// Id does not name an initialized slot of this pool
    InvalidHandle,
    /// Every slot has been handed out
    PoolExhausted,
    /// No callback at creation, or none registered at dispatch
    CallbackRequired,
    DriverCreateFailed(DriverError),
    DriverStartFailed(DriverError),
    DriverStopFailed(DriverError),
}

impl TimerError {
    /// Driver error carried by this failure, if the driver reported it.
    pub const fn driver_error(&self) -> Option<DriverError> {
        match self {
            TimerError::DriverCreateFailed(e)
            | TimerError::DriverStartFailed(e)
            | TimerError::DriverStopFailed(e) => Some(*e),
            _ => None,
        }
    }
}

impl fmt::Display for TimerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TimerError::InvalidHandle => write!(f, "invalid timer handle"),
            TimerError::PoolExhausted => write!(f, "timer pool exhausted"),
            TimerError::CallbackRequired => write!(f, "timer callback required"),
            TimerError::DriverCreateFailed(e) => write!(f, "driver create failed: {}", e),
            TimerError::DriverStartFailed(e) => write!(f, "driver start failed: {}", e),
            TimerError::DriverStopFailed(e) => write!(f, "driver stop failed: {}", e),
        }
    }
}
