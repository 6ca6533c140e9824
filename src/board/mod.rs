//! ESP32-C3 DevKitM board support
//!
//! Maps the keypad buttons to GPIOs and fixes the concrete pool,
//! timer and keypad types the firmware tasks are built from.

pub mod pins;

use esp_hal::gpio::{Input, InputConfig, Pull};
use esp_hal::peripherals::{GPIO5, GPIO6, GPIO9};

use crate::config::{DebounceConfig, KEYPAD_BUTTONS, MAX_TIMERS};
use crate::driver::TimerService;
use crate::input::{Keypad, forward_expiry};
use crate::timer::{Context, PoolTimer, TimerError, TimerPool};

// Type Aliases
pub type BoardDriver = TimerService<MAX_TIMERS>;
pub type BoardPool = TimerPool<BoardDriver, MAX_TIMERS>;
pub type BoardTimer = PoolTimer<'static, BoardDriver, MAX_TIMERS>;
pub type BoardKeypad = Keypad<BoardTimer, Input<'static>, KEYPAD_BUTTONS>;

/// Creator context of the on-board keypad's timers.
pub const KEYPAD_ID: Context = Context(1);

const KEYPAD_TIMER_NAMES: [&str; KEYPAD_BUTTONS] = ["kp1-b0", "kp1-b1", "kp1-b2"];

// Hardware Bundles
/// Keypad buttons, in button-index order.
pub struct KeypadHw {
    pub pins: [Input<'static>; KEYPAD_BUTTONS],
}

impl KeypadHw {
    pub fn new(b0: GPIO9<'static>, b1: GPIO5<'static>, b2: GPIO6<'static>) -> Self {
        let pins = [
            Input::new(b0, pull_up()),
            Input::new(b1, pull_up()),
            Input::new(b2, pull_up()),
        ];
        KeypadHw { pins }
    }
}

fn pull_up() -> InputConfig {
    InputConfig::default().with_pull(Pull::Up)
}

/// Create one pool timer per button and hand them to a keypad.
pub fn keypad(pool: &'static BoardPool, hw: KeypadHw) -> Result<BoardKeypad, TimerError> {
    let [t0, t1, t2] = [
        pool.create(KEYPAD_TIMER_NAMES[0], Some(forward_expiry), KEYPAD_ID)?,
        pool.create(KEYPAD_TIMER_NAMES[1], Some(forward_expiry), KEYPAD_ID)?,
        pool.create(KEYPAD_TIMER_NAMES[2], Some(forward_expiry), KEYPAD_ID)?,
    ];
    let [p0, p1, p2] = hw.pins;
    Keypad::new(
        KEYPAD_ID,
        [(p0, t0), (p1, t1), (p2, t2)],
        DebounceConfig::defaults(),
    )
}
