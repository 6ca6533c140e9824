// Embassy spawned tasks: timer service and keypad
//
//   • `timer_service_task`: owns the expiry loop of the pool's
//                            TimerService. Sleeps until the earliest
//                            deadline, then dispatches every due timer
//                            to its callback.
//
//   • `keypad_task`:        waits on button edges and on forwarded
//                            timer expiries, advances the debouncer
//                            and publishes key events on KEY_EVENTS.

use embassy_futures::select::{Either, select};
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::channel::Channel;
use log::{error, info, warn};

use crate::board::{BoardKeypad, BoardPool};
use crate::config::KEY_EVENT_QUEUE_CAP;
use crate::input::{EXPIRIES, Event};

// ═════════════════════════════════════════════════════════════════════════
// Timer service task
// ═════════════════════════════════════════════════════════════════════════

/// Drives every timer of `pool`. Spawn exactly once per pool.
#[embassy_executor::task]
pub async fn timer_service_task(pool: &'static BoardPool) -> ! {
    pool.driver().run(pool).await
}

// ═════════════════════════════════════════════════════════════════════════
// Keypad task
// ═════════════════════════════════════════════════════════════════════════

/// Debounced key events for the main loop. Full channel drops events.
pub static KEY_EVENTS: Channel<CriticalSectionRawMutex, Event, KEY_EVENT_QUEUE_CAP> =
    Channel::new();

#[embassy_executor::task]
pub async fn keypad_task(mut keypad: BoardKeypad) -> ! {
    loop {
        let step = select(keypad.next_edge(), EXPIRIES.receive()).await;
        let result = match step {
            Either::First(index) => keypad.on_edge(index).map(|()| None),
            Either::Second(expiry) => keypad.on_expiry(expiry),
        };

        match result {
            Ok(Some(event)) => {
                info!("input: {}", event);
                if KEY_EVENTS.try_send(event).is_err() {
                    warn!("input: key queue full, dropped {}", event);
                }
            }
            Ok(None) => {}
            Err(e) => error!("input: keypad timer: {}", e),
        }
    }
}
