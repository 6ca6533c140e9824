// Keypad debouncer: one pool timer per button
//
// The keypad id travels as the timers' creator context and the button
// index as their user context, so a single callback serves every
// button of every keypad.
//
// Per button:
//   Idle --edge--> Debouncing --settled pressed--> Pressed
//   Pressed --long press--> Repeating (periodic timer)
//   any edge while pressed re-enters Debouncing; settling released
//   goes back to Idle.
//
// 30ms debounce, 600ms long press, 150ms repeat by default.

use embedded_hal::digital::InputPin;
use embedded_hal_async::digital::Wait;
use embassy_futures::select::select_array;
use log::{debug, warn};

use super::{ButtonId, Event, Expiry};
use crate::config::DebounceConfig;
use crate::timer::{Context, RunType, Timer, TimerError, TimerEvent};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Idle,
    Debouncing,
    Pressed,
    Repeating,
}

struct ButtonSlot<T, P> {
    pin: P,
    timer: T,
    phase: Phase,
    pressed: bool,
    // when the pending one-shot is due; earlier expiries are stale
    deadline: u64,
}

impl<T: Timer, P> ButtonSlot<T, P> {
    fn arm_once(&mut self, interval: u64) -> Result<(), TimerError> {
        self.timer.set_interval(interval)?;
        self.deadline = self.timer.current_time().saturating_add(interval);
        self.timer.start(RunType::OneShot)
    }

    fn is_stale(&self) -> bool {
        self.timer.current_time() < self.deadline
    }
}

impl<T, P: Wait> ButtonSlot<T, P> {
    async fn wait_edge(&mut self) {
        if self.pin.wait_for_any_edge().await.is_err() {
            warn!("input: edge wait failed");
        }
    }
}

pub struct Keypad<T: Timer, P: InputPin, const B: usize> {
    id: Context,
    buttons: [ButtonSlot<T, P>; B],
    config: DebounceConfig,
}

impl<T: Timer, P: InputPin, const B: usize> Keypad<T, P, B> {
    /// Take ownership of `(pin, timer)` pairs. Each timer must have been
    /// created with `id` as its creator context.
    pub fn new(
        id: Context,
        buttons: [(P, T); B],
        config: DebounceConfig,
    ) -> Result<Self, TimerError> {
        let buttons = buttons.map(|(pin, timer)| ButtonSlot {
            pin,
            timer,
            phase: Phase::Idle,
            pressed: false,
            deadline: 0,
        });
        for (index, button) in buttons.iter().enumerate() {
            button.timer.register_user_context(Context(index))?;
        }
        Ok(Self {
            id,
            buttons,
            config: config.sanitized(),
        })
    }

    pub fn id(&self) -> Context {
        self.id
    }

    pub const fn len(&self) -> usize {
        B
    }

    pub const fn is_empty(&self) -> bool {
        B == 0
    }

    pub fn phase(&self, index: usize) -> Option<Phase> {
        self.buttons.get(index).map(|b| b.phase)
    }

    pub fn is_pressed(&self, index: usize) -> bool {
        self.buttons.get(index).is_some_and(|b| b.pressed)
    }

    /// A level change was seen on button `index`; (re)open its debounce
    /// window.
    pub fn on_edge(&mut self, index: usize) -> Result<(), TimerError> {
        let debounce = self.config.debounce_us;
        let Some(button) = self.buttons.get_mut(index) else {
            warn!("input: edge on unknown button {}", index);
            return Ok(());
        };

        if button.phase == Phase::Debouncing {
            button.deadline = button.timer.current_time().saturating_add(debounce);
            return button.timer.restart();
        }

        button.timer.stop()?;
        button.arm_once(debounce)?;
        button.phase = Phase::Debouncing;
        Ok(())
    }

    /// Advance the button named by `expiry`, returning the event it
    /// produced. Expiries of other keypads are ignored.
    pub fn on_expiry(&mut self, expiry: Expiry) -> Result<Option<Event>, TimerError> {
        if expiry.creator != self.id || expiry.event != TimerEvent::Elapsed {
            return Ok(None);
        }
        let config = self.config;
        let index = expiry.user.0;
        let Some(button) = self.buttons.get_mut(index) else {
            warn!("input: expiry for unknown button {}", index);
            return Ok(None);
        };
        let id = ButtonId(index as u8);

        match button.phase {
            Phase::Idle => Ok(None),
            Phase::Debouncing | Phase::Pressed if button.is_stale() => {
                debug!("input: stale expiry on {}", id);
                Ok(None)
            }
            Phase::Debouncing => {
                let pressed = read_pressed(&mut button.pin, config.active_low);
                let event = if pressed != button.pressed {
                    button.pressed = pressed;
                    Some(if pressed {
                        Event::Press(id)
                    } else {
                        Event::Release(id)
                    })
                } else {
                    None
                };

                if pressed {
                    button.arm_once(config.long_press_us)?;
                    button.phase = Phase::Pressed;
                } else {
                    button.phase = Phase::Idle;
                }
                Ok(event)
            }
            Phase::Pressed => {
                button.timer.set_interval(config.repeat_us)?;
                button.timer.start(RunType::Periodic)?;
                button.phase = Phase::Repeating;
                Ok(Some(Event::LongPress(id)))
            }
            Phase::Repeating => Ok(Some(Event::Repeat(id))),
        }
    }
}

impl<T: Timer, P: InputPin + Wait, const B: usize> Keypad<T, P, B> {
    /// Wait for an edge on any button and return its index.
    pub async fn next_edge(&mut self) -> usize {
        let waits = self.buttons.each_mut().map(ButtonSlot::wait_edge);
        let ((), index) = select_array(waits).await;
        index
    }
}

fn read_pressed<P: InputPin>(pin: &mut P, active_low: bool) -> bool {
    let level = if active_low {
        pin.is_low()
    } else {
        pin.is_high()
    };
    match level {
        Ok(pressed) => pressed,
        Err(_) => {
            warn!("input: pin read failed");
            false
        }
    }
}
