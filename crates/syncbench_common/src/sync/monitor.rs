use parking_lot::{Condvar, Mutex};

/// A monitor
///
/// Gives exclusive access to a single owner, like a mutex, but is built from an occupied flag and a condition variable instead of a lock primitive.
/// Correctness relies on a waiter re-checking the flag after every wake-up, not on the wake-up itself.
pub struct Monitor {
    occupied : Mutex<bool>,
    cond     : Condvar,
}

impl Monitor {
    /// Create a new, unoccupied monitor.
    pub const fn new() -> Self {
        Self { occupied: parking_lot::const_mutex(false), cond: Condvar::new() }
    }

    /// Block until the monitor is free, then occupy it.
    pub fn locker(&self) {
        let mut occupied = self.occupied.lock();
        while *occupied {
            self.cond.wait(&mut occupied);
        }
        *occupied = true;
    }

    /// Free the monitor and wake up a single waiting thread.
    ///
    /// This should only be called by the thread currently occupying the monitor.
    pub fn unlocker(&self) {
        let mut occupied = self.occupied.lock();
        debug_assert!(*occupied, "Unlocked a monitor which was not occupied");
        *occupied = false;
        self.cond.notify_one();
    }

    /// Occupy the monitor, returning a guard that frees it when dropped.
    pub fn enter(&self) -> MonitorGuard<'_> {
        self.locker();
        MonitorGuard { monitor: self }
    }

    /// Check if the monitor is currently occupied.
    pub fn is_occupied(&self) -> bool {
        *self.occupied.lock()
    }
}

impl Default for Monitor {
    fn default() -> Self {
        Self::new()
    }
}

/// RAII guard occupying a [`Monitor`]
#[must_use = "if unused the Monitor will immediately be freed"]
pub struct MonitorGuard<'a> {
    monitor : &'a Monitor,
}

impl Drop for MonitorGuard<'_> {
    fn drop(&mut self) {
        self.monitor.unlocker();
    }
}
