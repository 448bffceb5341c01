use core::{fmt, str::FromStr};
use std::sync::Arc;
use parking_lot::lock_api::RawMutex as _;
use syncbench_common::{
    sync::{CountingSemaphore, CyclicBarrier, Monitor, SpinLock, SpinWait},
    Result,
};
use crate::BenchmarkSettings;

/// A primitive that workers contend on around their critical section
pub trait ContendedPrimitive : Send + Sync {
    /// The kind of primitive
    fn kind(&self) -> PrimitiveKind;

    /// Enter the critical section, blocking or spinning until the primitive allows it.
    fn enter(&self);

    /// Leave the critical section.
    ///
    /// # Safety
    ///
    /// This method may only be called by a worker that is inside the critical section, i.e. it must be paired with a preceding call to [`enter`].
    ///
    /// [`enter`]: ContendedPrimitive::enter
    unsafe fn leave(&self);
}

/// The kinds of primitives the benchmark can run
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum PrimitiveKind {
    /// Baseline: the `parking_lot` mutex
    Mutex,
    /// [`CountingSemaphore`]
    Semaphore,
    /// [`CyclicBarrier`] with one party per worker
    Barrier,
    /// [`SpinLock`]
    SpinLock,
    /// [`SpinWait`]
    SpinWait,
    /// [`Monitor`]
    Monitor,
}

impl PrimitiveKind {
    /// All kinds, in the order the benchmark runs them
    pub const ALL: [PrimitiveKind; 6] = [
        PrimitiveKind::Mutex,
        PrimitiveKind::Semaphore,
        PrimitiveKind::Barrier,
        PrimitiveKind::SpinLock,
        PrimitiveKind::SpinWait,
        PrimitiveKind::Monitor,
    ];

    /// Get the display name of the primitive
    pub fn name(self) -> &'static str {
        match self {
            PrimitiveKind::Mutex     => "Mutex",
            PrimitiveKind::Semaphore => "Semaphore",
            PrimitiveKind::Barrier   => "Barrier",
            PrimitiveKind::SpinLock  => "SpinLock",
            PrimitiveKind::SpinWait  => "SpinWait",
            PrimitiveKind::Monitor   => "Monitor",
        }
    }

    /// Create a fresh primitive of this kind for the given benchmark settings.
    pub fn create(self, settings: &BenchmarkSettings) -> Result<Arc<dyn ContendedPrimitive>> {
        let primitive: Arc<dyn ContendedPrimitive> = match self {
            PrimitiveKind::Mutex     => Arc::new(BaselineMutex(parking_lot::RawMutex::INIT)),
            PrimitiveKind::Semaphore => Arc::new(CountingSemaphore::new(settings.semaphore_initial, settings.semaphore_max)?),
            PrimitiveKind::Barrier   => Arc::new(CyclicBarrier::new(settings.workers)?),
            PrimitiveKind::SpinLock  => Arc::new(SpinLock::new()),
            PrimitiveKind::SpinWait  => Arc::new(SpinWait::new()),
            PrimitiveKind::Monitor   => Arc::new(Monitor::new()),
        };
        Ok(primitive)
    }
}

impl fmt::Display for PrimitiveKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for PrimitiveKind {
    type Err = ();

    fn from_str(s: &str) -> core::result::Result<Self, Self::Err> {
        match s {
            "mutex"     => Ok(PrimitiveKind::Mutex),
            "semaphore" => Ok(PrimitiveKind::Semaphore),
            "barrier"   => Ok(PrimitiveKind::Barrier),
            "spinlock"  => Ok(PrimitiveKind::SpinLock),
            "spinwait"  => Ok(PrimitiveKind::SpinWait),
            "monitor"   => Ok(PrimitiveKind::Monitor),
            _           => Err(()),
        }
    }
}

struct BaselineMutex(parking_lot::RawMutex);

impl ContendedPrimitive for BaselineMutex {
    fn kind(&self) -> PrimitiveKind {
        PrimitiveKind::Mutex
    }

    fn enter(&self) {
        self.0.lock();
    }

    unsafe fn leave(&self) {
        self.0.unlock();
    }
}

impl ContendedPrimitive for CountingSemaphore {
    fn kind(&self) -> PrimitiveKind {
        PrimitiveKind::Semaphore
    }

    fn enter(&self) {
        self.acquire();
    }

    unsafe fn leave(&self) {
        self.release();
    }
}

// The barrier only orders workers, it does not keep them out of the critical section
impl ContendedPrimitive for CyclicBarrier {
    fn kind(&self) -> PrimitiveKind {
        PrimitiveKind::Barrier
    }

    fn enter(&self) {
        self.wait();
    }

    unsafe fn leave(&self) {}
}

impl ContendedPrimitive for SpinLock {
    fn kind(&self) -> PrimitiveKind {
        PrimitiveKind::SpinLock
    }

    fn enter(&self) {
        self.acquire();
    }

    unsafe fn leave(&self) {
        self.release();
    }
}

impl ContendedPrimitive for SpinWait {
    fn kind(&self) -> PrimitiveKind {
        PrimitiveKind::SpinWait
    }

    fn enter(&self) {
        self.acquire();
    }

    unsafe fn leave(&self) {
        self.release();
    }
}

impl ContendedPrimitive for Monitor {
    fn kind(&self) -> PrimitiveKind {
        PrimitiveKind::Monitor
    }

    fn enter(&self) {
        self.locker();
    }

    unsafe fn leave(&self) {
        self.unlocker();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kinds_round_trip_names() {
        for kind in PrimitiveKind::ALL {
            assert_eq!(kind.name().to_lowercase().parse::<PrimitiveKind>(), Ok(kind));
            assert_eq!(kind.to_string(), kind.name());
        }
        assert!("futex".parse::<PrimitiveKind>().is_err());
    }

    #[test]
    fn create_matches_kind() {
        let settings = BenchmarkSettings::default();
        for kind in PrimitiveKind::ALL {
            assert_eq!(kind.create(&settings).unwrap().kind(), kind);
        }
    }

    #[test]
    fn create_rejects_bad_parameters() {
        let settings = BenchmarkSettings::default().with_semaphore(5, 4);
        assert!(PrimitiveKind::Semaphore.create(&settings).is_err());

        let settings = BenchmarkSettings::default().with_workers(0);
        assert!(PrimitiveKind::Barrier.create(&settings).is_err());
    }
}
