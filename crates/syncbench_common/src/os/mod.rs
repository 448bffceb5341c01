cfg_if::cfg_if! {
    if #[cfg(windows)] {
        mod windows;
        pub use self::windows::*;
    } else {
        mod generic;
        pub use self::generic::*;
    }
}
