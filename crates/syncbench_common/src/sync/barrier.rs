use parking_lot::{Condvar, Mutex};
use crate::{Error, Result};

/// Result returned by [`CyclicBarrier::wait`]
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct BarrierWaitResult(bool);

impl BarrierWaitResult {
    /// Returns whether this thread was the last one to arrive, i.e. the one that released the generation.
    ///
    /// Exactly one thread per generation is the leader.
    #[inline]
    pub fn is_leader(self) -> bool {
        self.0
    }
}

struct BarrierState {
    remaining  : usize,
    generation : u64,
}

/// A cyclic barrier
///
/// Blocks threads calling [`wait`](CyclicBarrier::wait) until `parties` threads have arrived, at which point all of them are released together.
/// The barrier then resets itself, so the same barrier can be used for the next round (generation).
///
/// There is no way to cancel a pending wait: if fewer than `parties` threads ever arrive, the waiters will block forever.
pub struct CyclicBarrier {
    state   : Mutex<BarrierState>,
    cond    : Condvar,
    parties : usize,
}

impl CyclicBarrier {
    /// Create a new barrier releasing threads once `parties` threads have arrived.
    ///
    /// # Error
    ///
    /// Returns an error if `parties` is 0.
    pub fn new(parties: usize) -> Result<Self> {
        if parties == 0 {
            return Err(Error::InvalidCount("barrier parties", parties));
        }
        Ok(Self {
            state: Mutex::new(BarrierState { remaining: parties, generation: 0 }),
            cond: Condvar::new(),
            parties,
        })
    }

    /// Block until all parties have arrived at the barrier.
    pub fn wait(&self) -> BarrierWaitResult {
        let mut state = self.state.lock();
        let generation = state.generation;

        state.remaining -= 1;
        if state.remaining == 0 {
            // Move to the next generation before waking anyone, so a woken waiter always sees the new generation
            state.generation += 1;
            state.remaining = self.parties;
            self.cond.notify_all();
            BarrierWaitResult(true)
        } else {
            // Only a change of generation releases us, any other wake-up goes back to sleep
            while state.generation == generation {
                self.cond.wait(&mut state);
            }
            BarrierWaitResult(false)
        }
    }

    /// Get the number of completed rendezvous.
    pub fn generation(&self) -> u64 {
        self.state.lock().generation
    }

    /// Get the number of threads needed to release a generation.
    pub fn parties(&self) -> usize {
        self.parties
    }
}
