// Fixed-capacity timer arena and the operations behind `Timer`
//
// Slots are handed out in order and never recycled; a TimerId is the
// slot index, so resolving a handle is an array lookup. All slot
// state sits behind one critical-section mutex. Only driver creation
// runs under the lock (so a refused slot can be handed back); arming,
// stopping and user callbacks run unlocked and may re-enter the pool.

use core::cell::RefCell;

use critical_section::Mutex;
use log::{debug, error, info, warn};

use super::{
    Context, RunType, Timer, TimerCallback, TimerError, TimerEvent, TimerId, TimerName,
};
use crate::driver::{ExpiryClient, TimerDriver};

/// State backing one timer capability.
#[derive(Clone, Copy)]
pub struct TimerObject<H: Copy> {
    pub interval: u64,
    pub run_type: RunType,
    pub driver_handle: H,
    pub callback: Option<TimerCallback>,
    pub creator_context: Context,
    pub user_context: Context,
    pub name: TimerName,
}

struct Arena<H: Copy, const N: usize> {
    slots: [Option<TimerObject<H>>; N],
    // slots handed out so far, initialized or reserved
    count: usize,
}

impl<H: Copy, const N: usize> Arena<H, N> {
    const fn new() -> Self {
        Self {
            slots: [None; N],
            count: 0,
        }
    }

    fn allocate(&mut self) -> Result<TimerId, TimerError> {
        if self.count >= N {
            return Err(TimerError::PoolExhausted);
        }
        let id = TimerId::from_index(self.count);
        self.count += 1;
        Ok(id)
    }

    // undo the most recent allocate, used when the driver refuses
    fn release_last(&mut self, id: TimerId) {
        if self.count > 0 && id.index() == self.count - 1 {
            self.slots[id.index()] = None;
            self.count -= 1;
        }
    }

    fn get_mut(&mut self, id: TimerId) -> Option<&mut TimerObject<H>> {
        self.slots.get_mut(id.index()).and_then(Option::as_mut)
    }
}

pub struct TimerPool<D: TimerDriver, const N: usize> {
    driver: D,
    arena: Mutex<RefCell<Arena<D::Handle, N>>>,
}

impl<D: TimerDriver, const N: usize> TimerPool<D, N> {
    pub const fn new(driver: D) -> Self {
        const { assert!(N <= u8::MAX as usize, "TimerId holds a u8 slot index") };
        Self {
            driver,
            arena: Mutex::new(RefCell::new(Arena::new())),
        }
    }

    pub fn driver(&self) -> &D {
        &self.driver
    }

    pub const fn capacity(&self) -> usize {
        N
    }

    pub fn len(&self) -> usize {
        critical_section::with(|cs| self.arena.borrow_ref(cs).count)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn is_full(&self) -> bool {
        self.len() >= N
    }

    pub fn current_time(&self) -> u64 {
        self.driver.current_time()
    }

    /// Reserve the next slot. Reserved slots stay invalid until `create`
    /// fills them.
    pub fn allocate(&self) -> Result<TimerId, TimerError> {
        critical_section::with(|cs| self.arena.borrow_ref_mut(cs).allocate())
    }

    /// Create a timer and hand back its capability.
    ///
    /// The callback is checked before a slot is reserved, and a slot whose
    /// driver timer could not be created is returned to the pool.
    pub fn create(
        &self,
        name: &str,
        callback: Option<TimerCallback>,
        creator_context: Context,
    ) -> Result<PoolTimer<'_, D, N>, TimerError> {
        let Some(callback) = callback else {
            warn!("timer: create {:?} without callback", name);
            return Err(TimerError::CallbackRequired);
        };
        let name = TimerName::new(name);

        let id = critical_section::with(|cs| {
            let mut arena = self.arena.borrow_ref_mut(cs);
            let id = arena.allocate()?;
            match self.driver.create(id, &name) {
                Ok(driver_handle) => {
                    arena.slots[id.index()] = Some(TimerObject {
                        interval: 0,
                        run_type: RunType::OneShot,
                        driver_handle,
                        callback: Some(callback),
                        creator_context,
                        user_context: Context::NONE,
                        name,
                    });
                    Ok(id)
                }
                Err(e) => {
                    arena.release_last(id);
                    Err(TimerError::DriverCreateFailed(e))
                }
            }
        })
        .inspect_err(|e| warn!("timer: create {} failed: {}", name, e))?;

        info!("timer: created {} in slot {}", name, id);
        Ok(PoolTimer { pool: self, id })
    }

    /// Capability for an already created timer.
    pub fn timer(&self, id: TimerId) -> Option<PoolTimer<'_, D, N>> {
        self.with_object(id, |_| ())
            .ok()
            .map(|()| PoolTimer { pool: self, id })
    }

    /// Copy of a slot's state, for diagnostics.
    pub fn object(&self, id: TimerId) -> Result<TimerObject<D::Handle>, TimerError> {
        self.with_object(id, |t| *t)
    }

    fn with_object<R>(
        &self,
        id: TimerId,
        f: impl FnOnce(&mut TimerObject<D::Handle>) -> R,
    ) -> Result<R, TimerError> {
        critical_section::with(|cs| {
            let mut arena = self.arena.borrow_ref_mut(cs);
            arena.get_mut(id).map(f).ok_or(TimerError::InvalidHandle)
        })
    }

    pub fn set_interval(&self, id: TimerId, interval: u64) -> Result<(), TimerError> {
        self.with_object(id, |t| t.interval = interval)
    }

    pub fn start(&self, id: TimerId, run_type: RunType) -> Result<(), TimerError> {
        let (handle, interval) = self.with_object(id, |t| {
            t.run_type = run_type;
            (t.driver_handle, t.interval)
        })?;
        self.arm(handle, run_type, interval)
    }

    pub fn stop(&self, id: TimerId) -> Result<(), TimerError> {
        let handle = self.with_object(id, |t| t.driver_handle)?;
        self.driver
            .stop(handle)
            .map_err(TimerError::DriverStopFailed)
    }

    /// Stop, then re-arm with the stored run type and interval.
    ///
    /// A refused stop is only logged: drivers refuse to stop an idle
    /// timer, which is exactly the state of an expired one-shot.
    pub fn restart(&self, id: TimerId) -> Result<(), TimerError> {
        let (handle, run_type, interval) =
            self.with_object(id, |t| (t.driver_handle, t.run_type, t.interval))?;
        if let Err(e) = self.driver.stop(handle) {
            warn!("timer: restart {} stop refused: {}", id, e);
        }
        self.arm(handle, run_type, interval)
    }

    fn arm(&self, handle: D::Handle, run_type: RunType, interval: u64) -> Result<(), TimerError> {
        match run_type {
            RunType::OneShot => self.driver.start_once(handle, interval),
            RunType::Periodic => self.driver.start_periodic(handle, interval),
        }
        .map_err(TimerError::DriverStartFailed)
    }

    pub fn register_callback(
        &self,
        id: TimerId,
        callback: Option<TimerCallback>,
    ) -> Result<(), TimerError> {
        self.with_object(id, |t| t.callback = callback)
    }

    pub fn register_user_context(&self, id: TimerId, context: Context) -> Result<(), TimerError> {
        self.with_object(id, |t| t.user_context = context)
    }

    /// Stop the driver timer for good. The slot is not reclaimed.
    ///
    /// # Panics
    ///
    /// If the driver fails to stop the timer; an orphaned timer must never
    /// fire again.
    pub fn destroy(&self, id: TimerId) -> Result<(), TimerError> {
        let (handle, name) = self.with_object(id, |t| (t.driver_handle, t.name))?;
        if let Err(e) = self.driver.stop(handle) {
            panic!("timer: destroy {} ({}) could not stop driver: {}", name, id, e);
        }
        info!("timer: destroyed {} ({})", name, id);
        Ok(())
    }

    /// Deliver an expiry for `id` to its registered callback.
    pub fn dispatch(&self, id: TimerId) -> Result<(), TimerError> {
        let (callback, creator, user, name) = self.with_object(id, |t| {
            (t.callback, t.creator_context, t.user_context, t.name)
        })?;
        let Some(callback) = callback else {
            error!("timer: {} ({}) expired with no callback", name, id);
            return Err(TimerError::CallbackRequired);
        };
        debug!("timer: {} elapsed", name);
        callback(TimerEvent::Elapsed, creator, user);
        Ok(())
    }
}

impl<D: TimerDriver, const N: usize> ExpiryClient for TimerPool<D, N> {
    fn expired(&self, arg: TimerId) {
        if let Err(e) = self.dispatch(arg) {
            error!("timer: dispatch {} failed: {}", arg, e);
        }
    }
}

/// Capability for one pool slot.
pub struct PoolTimer<'a, D: TimerDriver, const N: usize> {
    pool: &'a TimerPool<D, N>,
    id: TimerId,
}

impl<D: TimerDriver, const N: usize> Clone for PoolTimer<'_, D, N> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<D: TimerDriver, const N: usize> Copy for PoolTimer<'_, D, N> {}

impl<'a, D: TimerDriver, const N: usize> PoolTimer<'a, D, N> {
    pub fn id(&self) -> TimerId {
        self.id
    }

    pub fn pool(&self) -> &'a TimerPool<D, N> {
        self.pool
    }
}

impl<D: TimerDriver, const N: usize> Timer for PoolTimer<'_, D, N> {
    fn set_interval(&self, interval: u64) -> Result<(), TimerError> {
        self.pool.set_interval(self.id, interval)
    }

    fn start(&self, run_type: RunType) -> Result<(), TimerError> {
        self.pool.start(self.id, run_type)
    }

    fn stop(&self) -> Result<(), TimerError> {
        self.pool.stop(self.id)
    }

    fn restart(&self) -> Result<(), TimerError> {
        self.pool.restart(self.id)
    }

    fn current_time(&self) -> u64 {
        self.pool.current_time()
    }

    fn register_callback(&self, callback: Option<TimerCallback>) -> Result<(), TimerError> {
        self.pool.register_callback(self.id, callback)
    }

    fn register_user_context(&self, context: Context) -> Result<(), TimerError> {
        self.pool.register_user_context(self.id, context)
    }

    fn destroy(&self) -> Result<(), TimerError> {
        self.pool.destroy(self.id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::driver::DriverError;
    use core::cell::Cell;

    // Driver that only counts creations and can be told to refuse them.
    struct CountingDriver {
        created: Cell<usize>,
        refuse: Cell<bool>,
    }

    impl CountingDriver {
        fn new() -> Self {
            Self {
                created: Cell::new(0),
                refuse: Cell::new(false),
            }
        }
    }

    impl TimerDriver for CountingDriver {
        type Handle = usize;

        fn create(&self, _arg: TimerId, _name: &TimerName) -> Result<usize, DriverError> {
            if self.refuse.get() {
                return Err(DriverError::NoMemory);
            }
            let n = self.created.get();
            self.created.set(n + 1);
            Ok(n)
        }

        fn start_once(&self, _h: usize, _interval: u64) -> Result<(), DriverError> {
            Ok(())
        }

        fn start_periodic(&self, _h: usize, _interval: u64) -> Result<(), DriverError> {
            Ok(())
        }

        fn stop(&self, _h: usize) -> Result<(), DriverError> {
            Ok(())
        }

        fn current_time(&self) -> u64 {
            42
        }
    }

    fn nop(_: TimerEvent, _: Context, _: Context) {}

    #[test]
    fn allocate_hands_out_slots_in_order() {
        let pool: TimerPool<CountingDriver, 2> = TimerPool::new(CountingDriver::new());
        assert_eq!(pool.allocate(), Ok(TimerId::from_index(0)));
        assert_eq!(pool.allocate(), Ok(TimerId::from_index(1)));
        assert_eq!(pool.allocate(), Err(TimerError::PoolExhausted));
        assert!(pool.is_full());
    }

    #[test]
    fn reserved_slot_is_not_a_valid_handle() {
        let pool: TimerPool<CountingDriver, 2> = TimerPool::new(CountingDriver::new());
        let id = pool.allocate().unwrap();
        assert!(pool.timer(id).is_none());
        assert_eq!(pool.stop(id), Err(TimerError::InvalidHandle));
    }

    #[test]
    fn refused_driver_create_returns_slot() {
        let pool: TimerPool<CountingDriver, 1> = TimerPool::new(CountingDriver::new());
        pool.driver().refuse.set(true);
        let err = pool.create("t", Some(nop), Context(1)).err();
        assert_eq!(err, Some(TimerError::DriverCreateFailed(DriverError::NoMemory)));
        assert_eq!(pool.len(), 0);

        pool.driver().refuse.set(false);
        assert!(pool.create("t", Some(nop), Context(1)).is_ok());
        assert_eq!(pool.len(), 1);
    }

    #[test]
    fn new_object_defaults() {
        let pool: TimerPool<CountingDriver, 1> = TimerPool::new(CountingDriver::new());
        let t = pool.create("a-very-long-name", Some(nop), Context(9)).unwrap();
        let obj = pool.object(t.id()).unwrap();
        assert_eq!(obj.interval, 0);
        assert_eq!(obj.run_type, RunType::OneShot);
        assert_eq!(obj.creator_context, Context(9));
        assert_eq!(obj.user_context, Context::NONE);
        assert_eq!(obj.name.as_str(), "a-very-lo");
        assert_eq!(t.current_time(), 42);
    }
}
