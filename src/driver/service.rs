// Software timer service on top of embassy-time
//
// Works like the ESP-IDF esp_timer service: a table of native timers
// with absolute deadlines, drained by one service task that sleeps
// until the earliest deadline. Arming or stopping a timer wakes the
// task so it can recompute its sleep.
//
// Time unit: microseconds since boot.

use core::cell::RefCell;

use embassy_futures::select::select;
use embassy_sync::blocking_mutex::Mutex;
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::signal::Signal;
use embassy_time::{Instant, Timer};
use log::{debug, trace};

use super::{DriverError, ExpiryClient, TimerDriver};
use crate::timer::{TimerId, TimerName};

/// Index into the service table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ServiceHandle(usize);

#[derive(Clone, Copy)]
struct NativeTimer {
    arg: TimerId,
    name: TimerName,
    deadline: Option<u64>,
    period: Option<u64>,
}

impl NativeTimer {
    fn is_armed(&self) -> bool {
        self.deadline.is_some()
    }
}

pub struct TimerService<const N: usize> {
    table: Mutex<CriticalSectionRawMutex, RefCell<[Option<NativeTimer>; N]>>,
    // earliest deadline may have changed
    rearm: Signal<CriticalSectionRawMutex, ()>,
}

impl<const N: usize> Default for TimerService<N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<const N: usize> TimerService<N> {
    pub const fn new() -> Self {
        Self {
            table: Mutex::new(RefCell::new([None; N])),
            rearm: Signal::new(),
        }
    }

    fn with_timer<R>(
        &self,
        handle: ServiceHandle,
        f: impl FnOnce(&mut NativeTimer) -> Result<R, DriverError>,
    ) -> Result<R, DriverError> {
        self.table.lock(|table| {
            let mut table = table.borrow_mut();
            match table.get_mut(handle.0) {
                Some(Some(timer)) => f(timer),
                _ => Err(DriverError::InvalidArgument),
            }
        })
    }

    fn arm(&self, handle: ServiceHandle, interval: u64, period: Option<u64>) -> Result<(), DriverError> {
        let deadline = self.current_time().saturating_add(interval);
        self.with_timer(handle, |timer| {
            if timer.is_armed() {
                return Err(DriverError::InvalidState);
            }
            timer.deadline = Some(deadline);
            timer.period = period;
            trace!("service: {} armed for {}", timer.name, deadline);
            Ok(())
        })?;
        self.rearm.signal(());
        Ok(())
    }

    /// Whether `handle` currently has a deadline.
    pub fn is_armed(&self, handle: ServiceHandle) -> bool {
        self.with_timer(handle, |timer| Ok(timer.is_armed()))
            .unwrap_or(false)
    }

    /// Earliest armed deadline.
    pub fn next_deadline(&self) -> Option<u64> {
        self.table.lock(|table| {
            table
                .borrow()
                .iter()
                .flatten()
                .filter_map(|t| t.deadline)
                .min()
        })
    }

    /// Fire every timer due at `now`, then report the next deadline.
    ///
    /// One-shot timers are disarmed before their client runs; periodic
    /// timers move one period on, or to `now + period` if they fell
    /// behind. The client is called with the table unlocked.
    pub fn expire(&self, now: u64, client: &impl ExpiryClient) -> Option<u64> {
        let mut due: [Option<TimerId>; N] = [None; N];
        let mut fired = 0;

        self.table.lock(|table| {
            let mut table = table.borrow_mut();
            for timer in table.iter_mut().flatten() {
                let Some(deadline) = timer.deadline else {
                    continue;
                };
                if deadline > now {
                    continue;
                }
                timer.deadline = match timer.period {
                    Some(period) => {
                        let next = deadline.saturating_add(period);
                        Some(if next <= now { now.saturating_add(period) } else { next })
                    }
                    None => None,
                };
                due[fired] = Some(timer.arg);
                fired += 1;
            }
        });

        for arg in due.iter().flatten() {
            client.expired(*arg);
        }
        if fired > 0 {
            debug!("service: {} timer(s) fired at {}", fired, now);
        }
        self.next_deadline()
    }

    /// Service loop. Run from a dedicated task; expiry callbacks run here.
    pub async fn run(&self, client: &impl ExpiryClient) -> ! {
        loop {
            let next = self.expire(self.current_time(), client);
            match next {
                Some(deadline) => {
                    select(Timer::at(Instant::from_micros(deadline)), self.rearm.wait()).await;
                }
                None => self.rearm.wait().await,
            }
        }
    }
}

impl<const N: usize> TimerDriver for TimerService<N> {
    type Handle = ServiceHandle;

    fn create(&self, arg: TimerId, name: &TimerName) -> Result<ServiceHandle, DriverError> {
        self.table.lock(|table| {
            let mut table = table.borrow_mut();
            let index = table
                .iter()
                .position(Option::is_none)
                .ok_or(DriverError::NoMemory)?;
            table[index] = Some(NativeTimer {
                arg,
                name: *name,
                deadline: None,
                period: None,
            });
            Ok(ServiceHandle(index))
        })
    }

    fn start_once(&self, handle: ServiceHandle, interval: u64) -> Result<(), DriverError> {
        self.arm(handle, interval, None)
    }

    fn start_periodic(&self, handle: ServiceHandle, interval: u64) -> Result<(), DriverError> {
        if interval == 0 {
            return Err(DriverError::InvalidArgument);
        }
        self.arm(handle, interval, Some(interval))
    }

    fn stop(&self, handle: ServiceHandle) -> Result<(), DriverError> {
        let was_armed = self.with_timer(handle, |timer| {
            let armed = timer.is_armed();
            timer.deadline = None;
            timer.period = None;
            Ok(armed)
        })?;
        if was_armed {
            self.rearm.signal(());
        }
        Ok(())
    }

    fn current_time(&self) -> u64 {
        Instant::now().as_micros()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::vec::Vec;

    // embassy-time's mock driver is never advanced, so now() stays at 0
    // and every deadline equals the interval.

    struct Fired(RefCell<Vec<TimerId>>);

    impl Fired {
        fn new() -> Self {
            Self(RefCell::new(Vec::new()))
        }

        fn take(&self) -> Vec<TimerId> {
            self.0.borrow_mut().drain(..).collect()
        }
    }

    impl ExpiryClient for Fired {
        fn expired(&self, arg: TimerId) {
            self.0.borrow_mut().push(arg);
        }
    }

    fn create(service: &TimerService<4>, index: usize) -> ServiceHandle {
        service
            .create(TimerId::from_index(index), &TimerName::new("svc"))
            .unwrap()
    }

    #[test]
    fn one_shot_fires_once_at_deadline() {
        let service: TimerService<4> = TimerService::new();
        let fired = Fired::new();
        let h = create(&service, 3);

        service.start_once(h, 2_000_000).unwrap();
        assert_eq!(service.next_deadline(), Some(2_000_000));

        assert_eq!(service.expire(1_999_999, &fired), Some(2_000_000));
        assert!(fired.take().is_empty());

        assert_eq!(service.expire(2_000_000, &fired), None);
        assert_eq!(fired.take(), [TimerId::from_index(3)]);
        assert!(!service.is_armed(h));

        service.expire(10_000_000, &fired);
        assert!(fired.take().is_empty());
    }

    #[test]
    fn periodic_rearms_each_period() {
        let service: TimerService<4> = TimerService::new();
        let fired = Fired::new();
        let h = create(&service, 0);

        service.start_periodic(h, 1000).unwrap();
        assert_eq!(service.expire(1000, &fired), Some(2000));
        assert_eq!(service.expire(2000, &fired), Some(3000));
        assert_eq!(fired.take().len(), 2);
    }

    #[test]
    fn late_periodic_skips_missed_periods() {
        let service: TimerService<4> = TimerService::new();
        let fired = Fired::new();
        let h = create(&service, 0);

        service.start_periodic(h, 1000).unwrap();
        assert_eq!(service.expire(5500, &fired), Some(6500));
        assert_eq!(fired.take().len(), 1);
    }

    #[test]
    fn start_on_armed_timer_is_invalid_state() {
        let service: TimerService<4> = TimerService::new();
        let h = create(&service, 0);

        service.start_once(h, 10).unwrap();
        assert_eq!(service.start_once(h, 10), Err(DriverError::InvalidState));
        assert_eq!(service.start_periodic(h, 10), Err(DriverError::InvalidState));
    }

    #[test]
    fn zero_period_rejected() {
        let service: TimerService<4> = TimerService::new();
        let h = create(&service, 0);
        assert_eq!(service.start_periodic(h, 0), Err(DriverError::InvalidArgument));
    }

    #[test]
    fn stop_disarms_and_is_idempotent() {
        let service: TimerService<4> = TimerService::new();
        let fired = Fired::new();
        let h = create(&service, 0);

        assert_eq!(service.stop(h), Ok(()));
        service.start_periodic(h, 100).unwrap();
        assert_eq!(service.stop(h), Ok(()));
        assert_eq!(service.stop(h), Ok(()));
        assert_eq!(service.expire(1000, &fired), None);
        assert!(fired.take().is_empty());
    }

    #[test]
    fn table_full_is_no_memory() {
        let service: TimerService<4> = TimerService::new();
        for i in 0..4 {
            create(&service, i);
        }
        let err = service.create(TimerId::from_index(4), &TimerName::new("x"));
        assert_eq!(err, Err(DriverError::NoMemory));
    }

    #[test]
    fn handles_stay_distinct_past_256_timers() {
        let service: TimerService<300> = TimerService::new();
        let name = TimerName::new("many");
        let handles: Vec<ServiceHandle> = (0..257)
            .map(|_| service.create(TimerId::from_index(0), &name).unwrap())
            .collect();

        assert_ne!(handles[0], handles[256]);
        service.start_once(handles[256], 10).unwrap();
        assert!(service.is_armed(handles[256]));
        assert!(!service.is_armed(handles[0]));
    }

    #[test]
    fn unknown_handle_rejected() {
        let service: TimerService<4> = TimerService::new();
        assert_eq!(
            service.start_once(ServiceHandle(2), 10),
            Err(DriverError::InvalidArgument)
        );
    }

    #[test]
    fn earliest_of_several_deadlines_reported() {
        let service: TimerService<4> = TimerService::new();
        let fired = Fired::new();
        let a = create(&service, 0);
        let b = create(&service, 1);

        service.start_once(a, 500).unwrap();
        service.start_once(b, 300).unwrap();
        assert_eq!(service.expire(300, &fired), Some(500));
        assert_eq!(fired.take(), [TimerId::from_index(1)]);
    }
}
