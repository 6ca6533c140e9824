// Compile-time limits and input timing defaults
//
// Time values are in timer-driver units; the bundled service driver
// counts microseconds.

/// Timers the firmware pool can hand out. Slots are never recycled.
pub const MAX_TIMERS: usize = 8;

/// Visible bytes kept from a timer name.
pub const TIMER_NAME_LEN: usize = 9;

/// Expiries buffered between the timer service and the keypad task.
pub const EXPIRY_QUEUE_CAP: usize = 8;

/// Debounced key events buffered for the main loop.
pub const KEY_EVENT_QUEUE_CAP: usize = 8;

/// Buttons on the on-board keypad.
pub const KEYPAD_BUTTONS: usize = 3;

const US_PER_MS: u64 = 1000;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DebounceConfig {
    pub debounce_us: u64,   // quiet time before a level is trusted
    pub long_press_us: u64, // held time before LongPress fires
    pub repeat_us: u64,     // Repeat period after LongPress
    pub active_low: bool,   // pressed reads low (pull-up wiring)
}

impl Default for DebounceConfig {
    fn default() -> Self {
        Self::defaults()
    }
}

impl DebounceConfig {
    pub const fn defaults() -> Self {
        Self {
            debounce_us: 30 * US_PER_MS,
            long_press_us: 600 * US_PER_MS,
            repeat_us: 150 * US_PER_MS,
            active_low: true,
        }
    }

    // Clamp to values the service driver can honour; a zero repeat
    // period would be rejected by start_periodic.
    pub fn sanitize(&mut self) {
        self.debounce_us = self.debounce_us.clamp(US_PER_MS, 500 * US_PER_MS);
        self.long_press_us = self.long_press_us.clamp(100 * US_PER_MS, 10_000 * US_PER_MS);
        self.repeat_us = self.repeat_us.clamp(20 * US_PER_MS, 5_000 * US_PER_MS);
    }

    pub fn sanitized(mut self) -> Self {
        self.sanitize();
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_survive_sanitize() {
        let cfg = DebounceConfig::defaults();
        assert_eq!(cfg.sanitized(), cfg);
    }

    #[test]
    fn sanitize_clamps_zero_periods() {
        let cfg = DebounceConfig {
            debounce_us: 0,
            long_press_us: 0,
            repeat_us: 0,
            active_low: false,
        }
        .sanitized();
        assert_eq!(cfg.debounce_us, 1000);
        assert_eq!(cfg.long_press_us, 100_000);
        assert_eq!(cfg.repeat_us, 20_000);
        assert!(!cfg.active_low);
    }
}
