// Statically allocated software timers for small MCUs (ESP32-C3)
//
// A fixed-capacity pool hands out timer capabilities; one shared
// dispatch path routes every expiry back to its owner through a
// (creator, user) context pair.

#![cfg_attr(not(test), no_std)]

pub mod config;
pub mod driver;
pub mod input;
pub mod timer;

#[cfg(feature = "esp32c3")]
pub mod board;
#[cfg(feature = "esp32c3")]
pub mod kernel;

pub use driver::{DriverError, ExpiryClient, TimerDriver};
pub use timer::{
    Context, PoolTimer, RunType, Timer, TimerCallback, TimerError, TimerEvent, TimerId, TimerName,
    TimerPool,
};
