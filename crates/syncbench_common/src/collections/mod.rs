mod worker_registry;
pub use worker_registry::WorkerRegistry;

//--------------------------------------------------------------

/// A trait used to define a strategy to reserve additional space for containers.
pub trait ReserveStrategy {
    /// Calculate the new capacity for a container.
    ///
    /// `cur_capacity` represents the current capacity of the container.
    ///
    /// `min_capacity` represents the minimum required capacity to be able to fit the new element(s).
    ///
    /// Returns `None` if the capacity were to overflow
    fn calculate(cur_capacity: usize, min_capacity: usize) -> Option<usize>;
}

/// A reserve strategy that will return either double the current capacity, or the minimum required capacity, whichever is bigger.
pub struct DoubleOrMinReserveStrategy;

impl ReserveStrategy for DoubleOrMinReserveStrategy {
    fn calculate(cur_capacity: usize, min_capacity: usize) -> Option<usize> {
        let double_cap = cur_capacity.checked_mul(2)?;
        let new_cap = double_cap.max(min_capacity);
        if new_cap <= isize::MAX as usize {
            Some(new_cap)
        } else {
            None
        }
    }
}
