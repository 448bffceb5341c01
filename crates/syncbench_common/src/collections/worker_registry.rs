use std::thread::{self, JoinHandle};
use crate::{Error, Result};
use super::{DoubleOrMinReserveStrategy, ReserveStrategy};

/// Owning registry of spawned workers
///
/// Worker handles are stored in the order they were added, and the capacity doubles whenever a handle is added to a full registry.
///
/// The registry guarantees that every worker it owns is joined exactly once:
/// either explicitly using [`join_all`](WorkerRegistry::join_all), or when the registry is dropped, in index order.
pub struct WorkerRegistry<T = ()> {
    handles  : Vec<JoinHandle<T>>,
    capacity : usize,
}

impl<T> WorkerRegistry<T> {
    /// Create an empty registry, with room for a single worker.
    pub fn new() -> Self {
        Self::with_capacity(1)
    }

    /// Create an empty registry, with room for at least `capacity` workers.
    pub fn with_capacity(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self { handles: Vec::with_capacity(capacity), capacity }
    }

    /// Add a worker handle to the registry, growing the registry when it is full.
    pub fn add(&mut self, handle: JoinHandle<T>) {
        if self.handles.len() == self.capacity {
            self.grow(self.handles.len() + 1);
        }
        self.handles.push(handle);
    }

    /// Get the handle of the worker at `index`.
    ///
    /// # Error
    ///
    /// Returns an error if `index` is not smaller than [`count`](WorkerRegistry::count).
    pub fn get(&self, index: usize) -> Result<&JoinHandle<T>> {
        self.handles.get(index).ok_or(Error::IndexOutOfRange { index, len: self.handles.len() })
    }

    /// Get the number of workers in the registry.
    pub fn count(&self) -> usize {
        self.handles.len()
    }

    /// Check if the registry contains no workers.
    pub fn is_empty(&self) -> bool {
        self.handles.is_empty()
    }

    /// Get the number of workers the registry can hold before it needs to grow.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Join all workers in index order and return their results.
    ///
    /// Every worker is joined, even when an earlier one panicked.
    ///
    /// # Error
    ///
    /// Returns [`Error::WorkerPanicked`] with the index of the first worker that panicked.
    pub fn join_all(mut self) -> Result<Vec<T>> {
        let handles = core::mem::take(&mut self.handles);
        let mut results = Vec::with_capacity(handles.len());
        let mut first_panic = None;

        for (idx, handle) in handles.into_iter().enumerate() {
            match handle.join() {
                Ok(res) => results.push(res),
                Err(_) => { first_panic.get_or_insert(idx); },
            }
        }

        match first_panic {
            Some(idx) => Err(Error::WorkerPanicked(idx)),
            None => Ok(results),
        }
    }

    fn grow(&mut self, min_capacity: usize) {
        let new_cap = match DoubleOrMinReserveStrategy::calculate(self.capacity, min_capacity) {
            Some(cap) => cap,
            None => panic!("WorkerRegistry capacity overflow"),
        };
        self.handles.reserve_exact(new_cap - self.handles.len());
        self.capacity = new_cap;
    }
}

impl<T: Send + 'static> WorkerRegistry<T> {
    /// Spawn a named worker thread running `f` and add it to the registry.
    ///
    /// Returns the index of the new worker.
    pub fn spawn<F>(&mut self, name: impl Into<String>, f: F) -> Result<usize>
    where
        F : FnOnce() -> T + Send + 'static,
    {
        let handle = thread::Builder::new().name(name.into()).spawn(f)?;
        let index = self.handles.len();
        self.add(handle);
        Ok(index)
    }
}

impl<T> Default for WorkerRegistry<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Drop for WorkerRegistry<T> {
    fn drop(&mut self) {
        // Panics of workers are only reported by `join_all`
        for handle in self.handles.drain(..) {
            _ = handle.join();
        }
    }
}
