use windows::Win32::System::Threading::Sleep;

/// Yield the rest of the current timeslice to the OS
#[inline]
pub fn thread_yield() {
    unsafe {
        // Not SwitchToThread, it only considers threads on the current processor
        Sleep(0);
    }
}
