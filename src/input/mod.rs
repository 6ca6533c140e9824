//! Debounced button input driven by pool timers.
//!
//! Timer callbacks run in the timer-service context, so they do no
//! work themselves: [`forward_expiry`] queues the expiry on
//! [`EXPIRIES`] and the keypad task picks it up from there.

pub mod keypad;

pub use keypad::{Keypad, Phase};

use core::fmt;

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::channel::Channel;
use log::warn;

use crate::config::EXPIRY_QUEUE_CAP;
use crate::timer::{Context, TimerEvent};

/// Button position within its keypad.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ButtonId(pub u8);

impl fmt::Display for ButtonId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "B{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Event {
    Press(ButtonId),
    Release(ButtonId),
    LongPress(ButtonId),
    Repeat(ButtonId),
}

impl Event {
    pub const fn button(self) -> ButtonId {
        match self {
            Event::Press(b) | Event::Release(b) | Event::LongPress(b) | Event::Repeat(b) => b,
        }
    }
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Event::Press(b) => write!(f, "Press({})", b),
            Event::Release(b) => write!(f, "Release({})", b),
            Event::LongPress(b) => write!(f, "LongPress({})", b),
            Event::Repeat(b) => write!(f, "Repeat({})", b),
        }
    }
}

/// One timer callback, as seen by the keypad task.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Expiry {
    pub event: TimerEvent,
    pub creator: Context,
    pub user: Context,
}

/// Expiries waiting for the keypad task.
pub static EXPIRIES: Channel<CriticalSectionRawMutex, Expiry, EXPIRY_QUEUE_CAP> = Channel::new();

/// Timer callback for keypad timers.
pub fn forward_expiry(event: TimerEvent, creator: Context, user: Context) {
    let expiry = Expiry {
        event,
        creator,
        user,
    };
    // a full queue means the keypad task is stuck; drop rather than block
    // the timer service
    if EXPIRIES.try_send(expiry).is_err() {
        warn!("input: expiry queue full, dropped {:?}", expiry);
    }
}
