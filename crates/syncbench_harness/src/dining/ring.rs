use core::sync::atomic::{AtomicUsize, Ordering};
use std::thread;
use parking_lot::{Mutex, MutexGuard};
use syncbench_common::{Error, Result};
use super::PhilosopherState;

const NO_HOLDER : usize = usize::MAX;

struct Resource {
    lock   : Mutex<()>,
    holder : AtomicUsize,
}

/// Ring of independent resources, each held by at most one worker at a time.
///
/// Worker `i` needs the resources `i` and `(i + 1) % len`.
/// A pair is acquired all-or-nothing, starting with the lowest index.
pub struct ResourceRing {
    resources : Box<[Resource]>,
}

impl ResourceRing {
    /// Create a ring of `len` free resources.
    ///
    /// # Error
    ///
    /// Returns an error if `len` is smaller than 2, as a worker needs 2 distinct resources.
    pub fn new(len: usize) -> Result<Self> {
        if len < 2 {
            return Err(Error::InvalidCount("resource ring length", len));
        }
        let resources = (0..len).map(|_| Resource { lock: Mutex::new(()), holder: AtomicUsize::new(NO_HOLDER) }).collect();
        Ok(Self { resources })
    }

    pub fn len(&self) -> usize {
        self.resources.len()
    }

    /// Get the resource indices needed by `worker`, in acquisition order: `(lower, higher)`.
    pub fn pair_for(&self, worker: usize) -> Result<(usize, usize)> {
        let len = self.len();
        if worker >= len {
            return Err(Error::IndexOutOfRange { index: worker, len });
        }
        let left = worker;
        let right = (worker + 1) % len;
        Ok((left.min(right), left.max(right)))
    }

    /// Lock the resource at `index` for `worker`, blocking until it is free.
    pub fn lock(&self, index: usize, worker: usize) -> Result<ResourceGuard<'_>> {
        let resource = self.resource(index)?;
        let guard = resource.lock.lock();
        Ok(ResourceGuard::new(resource, guard, worker))
    }

    /// Try to lock the resource at `index` for `worker`, returns `None` if it is held by another worker.
    pub fn try_lock(&self, index: usize, worker: usize) -> Result<Option<ResourceGuard<'_>>> {
        let resource = self.resource(index)?;
        Ok(resource.lock.try_lock().map(|guard| ResourceGuard::new(resource, guard, worker)))
    }

    /// Lock both resources needed by `worker` as a pair.
    ///
    /// The worker blocks on one resource at a time and only tries the other one, so it never waits while holding a resource.
    /// The lower index is blocked on first. When the other resource is taken, the held one is released again,
    /// and the next attempt blocks on the resource that was busy.
    ///
    /// `on_state` is called with the progress of the worker through the acquisition.
    /// The guards are returned as `(lower, higher)`.
    pub fn lock_pair(&self, worker: usize, mut on_state: impl FnMut(PhilosopherState)) -> Result<(ResourceGuard<'_>, ResourceGuard<'_>)> {
        let (low, high) = self.pair_for(worker)?;
        let (mut first, mut second) = (low, high);
        loop {
            on_state(PhilosopherState::WaitingFirst);
            let held = self.lock(first, worker)?;
            on_state(PhilosopherState::HoldingFirst);

            on_state(PhilosopherState::WaitingSecond);
            if let Some(other) = self.try_lock(second, worker)? {
                return Ok(if first == low { (held, other) } else { (other, held) });
            }

            drop(held);
            core::mem::swap(&mut first, &mut second);
            thread::yield_now();
        }
    }

    /// Try to lock both resources needed by `worker` without blocking.
    ///
    /// Returns `None` when either resource is held, in which case neither is held on return.
    pub fn try_lock_pair(&self, worker: usize) -> Result<Option<(ResourceGuard<'_>, ResourceGuard<'_>)>> {
        let (low, high) = self.pair_for(worker)?;
        let Some(first) = self.try_lock(low, worker)? else {
            return Ok(None);
        };
        Ok(self.try_lock(high, worker)?.map(|second| (first, second)))
    }

    /// Get the worker currently holding the resource at `index`, if any.
    pub fn holder(&self, index: usize) -> Result<Option<usize>> {
        let holder = self.resource(index)?.holder.load(Ordering::Acquire);
        Ok((holder != NO_HOLDER).then_some(holder))
    }

    fn resource(&self, index: usize) -> Result<&Resource> {
        self.resources.get(index).ok_or(Error::IndexOutOfRange { index, len: self.resources.len() })
    }
}

/// Held resource of a [`ResourceRing`], released when dropped
pub struct ResourceGuard<'a> {
    resource : &'a Resource,
    _guard   : MutexGuard<'a, ()>,
}

impl<'a> ResourceGuard<'a> {
    fn new(resource: &'a Resource, guard: MutexGuard<'a, ()>, worker: usize) -> Self {
        resource.holder.store(worker, Ordering::Release);
        Self { resource, _guard: guard }
    }
}

impl Drop for ResourceGuard<'_> {
    fn drop(&mut self) {
        // Cleared before the lock itself is released by `_guard`
        self.resource.holder.store(NO_HOLDER, Ordering::Release);
    }
}

#[cfg(test)]
mod tests {
    use std::{sync::{mpsc, Arc}, time::Duration};
    use super::*;

    #[test]
    fn ring_needs_two_resources() {
        assert!(matches!(ResourceRing::new(0), Err(Error::InvalidCount(_, 0))));
        assert!(matches!(ResourceRing::new(1), Err(Error::InvalidCount(_, 1))));
        assert_eq!(ResourceRing::new(2).unwrap().len(), 2);
    }

    #[test]
    fn pairs_are_ordered() {
        let ring = ResourceRing::new(5).unwrap();
        assert_eq!(ring.pair_for(0).unwrap(), (0, 1));
        assert_eq!(ring.pair_for(3).unwrap(), (3, 4));
        assert_eq!(ring.pair_for(4).unwrap(), (0, 4));
        assert!(matches!(ring.pair_for(5), Err(Error::IndexOutOfRange { index: 5, len: 5 })));
    }

    #[test]
    fn guards_track_holder() {
        let ring = ResourceRing::new(3).unwrap();
        assert_eq!(ring.holder(1).unwrap(), None);
        {
            let _guard = ring.lock(1, 7).unwrap();
            assert_eq!(ring.holder(1).unwrap(), Some(7));
            assert!(ring.try_lock(1, 8).unwrap().is_none());
        }
        assert_eq!(ring.holder(1).unwrap(), None);
        assert!(ring.try_lock(1, 8).unwrap().is_some());
        assert!(ring.holder(3).is_err());
    }

    #[test]
    fn try_pair_is_all_or_nothing() {
        let ring = ResourceRing::new(4).unwrap();

        let held = ring.lock(1, 0).unwrap();
        assert!(ring.try_lock_pair(0).unwrap().is_none());
        assert_eq!(ring.holder(0).unwrap(), None);
        drop(held);

        let mut states = Vec::new();
        let (first, second) = ring.lock_pair(3, |state| states.push(state)).unwrap();
        assert_eq!(states, [PhilosopherState::WaitingFirst, PhilosopherState::HoldingFirst, PhilosopherState::WaitingSecond]);
        assert_eq!(ring.holder(0).unwrap(), Some(3));
        assert_eq!(ring.holder(3).unwrap(), Some(3));
        drop((first, second));
        assert!(ring.try_lock_pair(3).unwrap().is_some());
    }

    #[test]
    fn pair_never_waits_while_holding() {
        let ring = Arc::new(ResourceRing::new(5).unwrap());
        let outside = ring.lock(1, 99).unwrap();

        let (sender, receiver) = mpsc::channel();
        let worker = {
            let ring = ring.clone();
            thread::spawn(move || {
                let (low, high) = ring.lock_pair(0, |_| {}).unwrap();
                assert_eq!(ring.holder(0).unwrap(), Some(0));
                assert_eq!(ring.holder(1).unwrap(), Some(0));
                drop((low, high));
                sender.send(()).unwrap();
            })
        };

        // Resource 1 is busy, so worker 0 has to be waiting on it without holding resource 0
        thread::sleep(Duration::from_millis(200));
        assert_eq!(ring.holder(0).unwrap(), None);
        assert_eq!(ring.holder(1).unwrap(), Some(99));
        assert!(receiver.try_recv().is_err());

        drop(outside);
        receiver.recv_timeout(Duration::from_secs(30)).expect("worker did not get its pair in time");
        worker.join().unwrap();
        assert_eq!(ring.holder(0).unwrap(), None);
    }
}
