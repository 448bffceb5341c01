/// Yield the rest of the current timeslice to the OS
#[inline]
pub fn thread_yield() {
    std::thread::yield_now();
}
