use std::sync::atomic::{AtomicBool, Ordering};

/// RAII engagement of a replicator's suppression flag.
///
/// Engaged while a remote value is applied to the local mirror, so a
/// presenter callback that reacts by requesting the same mutation is treated
/// as a no-op instead of starting a write/echo loop. Clears on drop, so the
/// flag never sticks if a callback panics.
pub(crate) struct EchoGuard<'a> {
    flag: &'a AtomicBool,
}

impl<'a> EchoGuard<'a> {
    pub(crate) fn engage(flag: &'a AtomicBool) -> Self {
        flag.store(true, Ordering::SeqCst);
        Self { flag }
    }

    pub(crate) fn is_engaged(flag: &AtomicBool) -> bool {
        flag.load(Ordering::SeqCst)
    }
}

impl Drop for EchoGuard<'_> {
    fn drop(&mut self) {
        self.flag.store(false, Ordering::SeqCst);
    }
}
