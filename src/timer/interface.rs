// The capability consumers hold instead of the concrete timer
//
// Object safe: subsystems may keep `&dyn Timer` or be generic over
// `T: Timer`.

use super::{Context, RunType, TimerCallback, TimerError};

pub trait Timer {
    /// Store the interval used by the next `start`/`restart`.
    fn set_interval(&self, interval: u64) -> Result<(), TimerError>;

    /// Arm once or periodically with the stored interval.
    fn start(&self, run_type: RunType) -> Result<(), TimerError>;

    fn stop(&self) -> Result<(), TimerError>;

    /// Stop, then re-arm with the stored run type and interval.
    fn restart(&self) -> Result<(), TimerError>;

    /// Driver clock. Does not depend on the instance.
    fn current_time(&self) -> u64;

    fn register_callback(&self, callback: Option<TimerCallback>) -> Result<(), TimerError>;

    fn register_user_context(&self, context: Context) -> Result<(), TimerError>;

    /// Stop for good. Panics if the driver cannot stop the timer.
    fn destroy(&self) -> Result<(), TimerError>;
}
