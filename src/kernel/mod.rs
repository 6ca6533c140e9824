// Embassy tasks for the firmware
//
// The timer service task is the only context that runs timer
// callbacks; everything else talks to it through the pool.

pub mod tasks;

pub use tasks::{KEY_EVENTS, keypad_task, timer_service_task};
