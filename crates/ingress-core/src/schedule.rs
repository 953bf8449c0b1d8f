use std::time::Duration;

/// Waits between batch runs and between health checks.
pub trait Pause {
    fn pause(&self, duration: Duration);
}

/// Blocks the current thread. Only a process interrupt cuts it short.
#[derive(Debug, Default, Clone, Copy)]
pub struct ThreadPause;

impl Pause for ThreadPause {
    fn pause(&self, duration: Duration) {
        if !duration.is_zero() {
            std::thread::sleep(duration);
        }
    }
}

impl<P: Pause + ?Sized> Pause for &P {
    fn pause(&self, duration: Duration) {
        (**self).pause(duration)
    }
}
