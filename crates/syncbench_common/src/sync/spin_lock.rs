use core::{
    hint::spin_loop,
    marker::PhantomData,
    sync::atomic::{AtomicBool, Ordering},
};
use static_assertions as sa;
use crate::os::thread_yield;

/// What a spin lock does between two failed attempts at acquiring it
pub trait SpinPolicy {
    /// Called after every failed acquire attempt.
    fn relax();
}

/// Keep the CPU busy, only hinting it that we are in a spin loop.
///
/// Lowest wake-up latency for very short critical sections, at the cost of burning a whole core while waiting.
pub struct Busy;

impl SpinPolicy for Busy {
    #[inline]
    fn relax() {
        spin_loop();
    }
}

/// Give the rest of the timeslice back to the OS between attempts.
///
/// Trades some latency for less contention on the cache line of the flag and a fairer share of CPU time for the holder.
pub struct Yielding;

impl SpinPolicy for Yielding {
    #[inline]
    fn relax() {
        thread_yield();
    }
}

/// A spin lock using an atomic test-and-set, with a policy deciding what to do while the lock is taken.
///
/// The lock has no bound on how long it spins, if the holder never releases it, every other acquirer spins forever.
pub struct RawSpinLock<P: SpinPolicy> {
    locked  : AtomicBool,
    _policy : PhantomData<fn() -> P>,
}

/// Spin lock which busy-retries without yielding
pub type SpinLock = RawSpinLock<Busy>;
/// Spin lock which yields to the OS between retries
pub type SpinWait = RawSpinLock<Yielding>;

sa::const_assert_eq!(core::mem::size_of::<SpinLock>(), 1);
sa::assert_impl_all!(SpinLock: Send, Sync);
sa::assert_impl_all!(SpinWait: Send, Sync);

impl<P: SpinPolicy> RawSpinLock<P> {
    /// Create a new, unlocked spin lock.
    pub const fn new() -> Self {
        Self { locked: AtomicBool::new(false), _policy: PhantomData }
    }

    /// Spin until the lock is acquired.
    #[inline]
    pub fn acquire(&self) {
        // `Acquire` makes everything written before the matching release visible to us
        while self.locked.swap(true, Ordering::Acquire) {
            P::relax();
        }
    }

    /// Try to acquire the lock with a single test-and-set.
    ///
    /// Returns `true` if the lock was acquired.
    #[inline]
    pub fn try_acquire(&self) -> bool {
        !self.locked.swap(true, Ordering::Acquire)
    }

    /// Release the lock.
    ///
    /// This should only be called by the thread currently holding the lock.
    #[inline]
    pub fn release(&self) {
        self.locked.store(false, Ordering::Release);
    }

    /// Acquire the lock, returning a guard that releases it when dropped.
    pub fn lock(&self) -> SpinLockGuard<'_, P> {
        self.acquire();
        SpinLockGuard { lock: self }
    }

    /// Check if the lock is currently held.
    #[inline]
    pub fn is_locked(&self) -> bool {
        self.locked.load(Ordering::Relaxed)
    }
}

impl<P: SpinPolicy> Default for RawSpinLock<P> {
    fn default() -> Self {
        Self::new()
    }
}

/// RAII guard holding a [`RawSpinLock`]
#[must_use = "if unused the spin lock will immediately be released"]
pub struct SpinLockGuard<'a, P: SpinPolicy> {
    lock : &'a RawSpinLock<P>,
}

impl<P: SpinPolicy> Drop for SpinLockGuard<'_, P> {
    fn drop(&mut self) {
        self.lock.release();
    }
}

#[cfg(test)]
mod tests {
    use std::{
        cell::UnsafeCell,
        sync::Arc,
        thread,
    };
    use super::*;

    // Counter which is only protected by the spin lock, so a broken lock shows up as lost increments
    struct Unguarded<P: SpinPolicy> {
        lock  : RawSpinLock<P>,
        value : UnsafeCell<usize>,
    }

    unsafe impl<P: SpinPolicy> Sync for Unguarded<P> {}

    fn count_under_lock<P: SpinPolicy + 'static>() -> usize {
        const WORKERS: usize = 4;
        const ITERATIONS: usize = 10_000;

        let shared = Arc::new(Unguarded::<P> { lock: RawSpinLock::new(), value: UnsafeCell::new(0) });
        let workers: Vec<_> = (0..WORKERS).map(|_| {
            let shared = shared.clone();
            thread::spawn(move || {
                for _ in 0..ITERATIONS {
                    let _guard = shared.lock.lock();
                    unsafe { *shared.value.get() += 1 };
                }
            })
        }).collect();

        for worker in workers {
            worker.join().unwrap();
        }
        assert!(!shared.lock.is_locked());
        let value = unsafe { *shared.value.get() };
        assert_eq!(value, WORKERS * ITERATIONS);
        value
    }

    #[test]
    fn try_acquire() {
        let lock = SpinLock::new();
        assert!(lock.try_acquire());
        assert!(!lock.try_acquire());
        assert!(lock.is_locked());
        lock.release();
        assert!(!lock.is_locked());
    }

    #[test]
    fn busy_spin_is_exclusive() {
        count_under_lock::<Busy>();
    }

    #[test]
    fn yielding_spin_is_exclusive() {
        count_under_lock::<Yielding>();
    }
}
