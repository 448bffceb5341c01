use parking_lot::{Condvar, Mutex};
use crate::{Error, Result};

/// A counting semaphore
///
/// The semaphore holds a count in the range `[0, max]`.
/// Acquiring takes one unit from the count, blocking while the count is 0, releasing gives one back.
///
/// Blocked threads are parked by the OS until a unit is released.
/// No fairness is guaranteed, only that a release will eventually unblock one of the waiting threads, if there are any.
pub struct CountingSemaphore {
    count : Mutex<usize>,
    cond  : Condvar,
    max   : usize,
}

impl CountingSemaphore {
    /// Create a new semaphore with `initial_count` available units and at most `max_count` units.
    ///
    /// # Error
    ///
    /// Returns an error if `max_count` is 0, or if `initial_count` exceeds `max_count`.
    pub fn new(initial_count: usize, max_count: usize) -> Result<Self> {
        if max_count == 0 {
            return Err(Error::InvalidCount("semaphore max count", max_count));
        }
        if initial_count > max_count {
            return Err(Error::InvalidParameter("semaphore initial count exceeds the max count"));
        }
        Ok(Self { count: Mutex::new(initial_count), cond: Condvar::new(), max: max_count })
    }

    /// Block the current thread until a unit is available and take it.
    pub fn acquire(&self) {
        let mut count = self.count.lock();
        while *count == 0 {
            self.cond.wait(&mut count);
        }
        *count -= 1;
    }

    /// Try to take a unit without blocking.
    ///
    /// Returns `true` if a unit was taken.
    pub fn try_acquire(&self) -> bool {
        let mut count = self.count.lock();
        if *count == 0 {
            false
        } else {
            *count -= 1;
            true
        }
    }

    /// Give a unit back to the semaphore, waking up a single waiting thread.
    ///
    /// # Panics
    ///
    /// Panics if the semaphore is already at its max count, as this means a unit was released that was never acquired.
    pub fn release(&self) {
        let mut count = self.count.lock();
        assert!(*count < self.max, "Released a semaphore which is already at its max count ({})", self.max);
        *count += 1;
        drop(count);

        // Only a single unit got released, so only a single waiter can make progress
        self.cond.notify_one();
    }

    /// Get the number of units that are currently available.
    pub fn available(&self) -> usize {
        *self.count.lock()
    }

    /// Get the max number of units.
    pub fn max(&self) -> usize {
        self.max
    }
}
