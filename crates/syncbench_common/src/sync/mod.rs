//! Hand-built synchronization primitives
//!
//! ## Scope
//!
//! Each primitive in this module exposes the minimal acquire/release contract of the classic textbook object.
//! They are compared against each other under an identical contended workload, and are not a replacement for the locks in [`parking_lot`] or `std`.
//!
//! ## Blocking and spinning
//!
//! There are two ways a thread can wait for a primitive to become available:
//!
//! - *Blocking*: the thread is parked by the OS and consumes no CPU time until another thread wakes it up.
//!   [`CountingSemaphore`], [`CyclicBarrier`] and [`Monitor`] block, using a [`parking_lot`] mutex and condition variable to protect their state.
//!
//! - *Spinning*: the thread keeps polling an atomic flag.
//!   [`SpinLock`] retries as fast as it can, with only a CPU hint between attempts, while [`SpinWait`] gives the rest of its timeslice back to the OS after each failed attempt.
//!
//! ## Spurious wakeups
//!
//! A woken waiter can never assume the condition it waited for is true.
//! Both [`Monitor::locker`] and [`CyclicBarrier::wait`] re-check their predicate after every wake, even though the [`parking_lot`] condition variable does not wake spuriously itself:
//! a notification can race with another thread that grabs the state first.
//!
//! ## Memory ordering
//!
//! Every primitive establishes a happens-before edge between a release and the next successful acquire,
//! so all writes done by the releasing thread are visible to the next owner.
//! The blocking primitives get this from their internal mutex, the spin locks from `Acquire`/`Release` ordering on their flag.
//!
//! ## Overview
//!
//! - [`CountingSemaphore`]: Counter gating access to a bounded number of slots.
//!
//! - [`CyclicBarrier`]: Rendezvous point releasing a fixed number of threads together, after which it resets for the next generation.
//!
//! - [`Monitor`]: Single-owner gate built from an occupied flag and explicit wait/notify signaling.
//!
//! - [`SpinLock`] and [`SpinWait`]: Single-owner gate built on an atomic test-and-set.
//!
//! [`parking_lot`]: https://github.com/Amanieu/parking_lot

mod barrier;
mod monitor;
mod semaphore;
mod spin_lock;

pub use barrier::{BarrierWaitResult, CyclicBarrier};
pub use monitor::{Monitor, MonitorGuard};
pub use semaphore::CountingSemaphore;
pub use spin_lock::{Busy, RawSpinLock, SpinLock, SpinLockGuard, SpinPolicy, SpinWait, Yielding};
