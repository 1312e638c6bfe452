use static_assertions::assert_impl_all;
use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

static NEXT_ID: AtomicU64 = AtomicU64::new(1);

/// Requests an in-progress scan or connect to stop.
///
/// Clones share the same flag. Cancelling more than once is harmless.
#[derive(Clone)]
pub struct CancelHandle {
    id: u64,
    cancelled: Arc<AtomicBool>,
}

assert_impl_all!(CancelHandle: Send, Sync);

impl CancelHandle {
    pub fn new() -> Self {
        Self {
            id: NEXT_ID.fetch_add(1, Ordering::Relaxed),
            cancelled: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Returns `true` if this call cancelled the handle, `false` if it already was.
    pub fn cancel(&self) -> bool {
        !self.cancelled.swap(true, Ordering::SeqCst)
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }

    /// Whether both handles share the same flag.
    pub fn same(&self, other: &CancelHandle) -> bool {
        Arc::ptr_eq(&self.cancelled, &other.cancelled)
    }
}

impl Default for CancelHandle {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for CancelHandle {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "CancelHandle(#{}{})", self.id, if self.is_cancelled() { ", cancelled" } else { "" })
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn cancel_once() {
        let h = CancelHandle::new();
        let clone = h.clone();
        assert!(!clone.is_cancelled());
        assert!(h.cancel());
        assert!(!clone.cancel());
        assert!(clone.is_cancelled());
        assert!(h.same(&clone));
        assert!(!h.same(&CancelHandle::new()));
    }
}
