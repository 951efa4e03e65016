//! Global pointer listener lifetime.
//!
//! While a session is pending, dragging or resizing the machine holds a
//! [`CaptureGuard`]; dropping the guard detaches the listeners. This covers
//! normal ends, cancellation and teardown of the machine itself.

use std::sync::Arc;

/// Something that can route global pointer/touch move and release events
/// to the gesture machine.
pub trait InputCapture: Send + Sync {
    fn attach(&self);
    fn detach(&self);
}

pub struct CaptureGuard {
    capture: Arc<dyn InputCapture>,
}

impl CaptureGuard {
    pub fn acquire(capture: Arc<dyn InputCapture>) -> Self {
        capture.attach();
        log::debug!("Global pointer listeners attached");
        Self { capture }
    }
}

impl Drop for CaptureGuard {
    fn drop(&mut self) {
        self.capture.detach();
        log::debug!("Global pointer listeners detached");
    }
}

impl std::fmt::Debug for CaptureGuard {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("CaptureGuard")
    }
}

/// Capture that does nothing; for hosts that always deliver global events.
#[derive(Debug, Default)]
pub struct NoCapture;

impl InputCapture for NoCapture {
    fn attach(&self) {}
    fn detach(&self) {}
}


#[cfg(test)]
mod tests {
    use super::testing::CountingCapture;
    use super::*;

    #[test]
    fn test_guard_pairs_attach_and_detach() {
        let capture = Arc::new(CountingCapture::default());
        {
            let _guard = CaptureGuard::acquire(capture.clone());
            assert!(capture.is_active());
        }
        assert_eq!(capture.attached(), 1);
        assert_eq!(capture.detached(), 1);
    }
}
