use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Shared "state changed, please redraw" flag.
///
/// Producers on any thread call [`RedrawSignal::request`]; the render loop
/// calls [`RedrawSignal::take`] once per tick and repaints when it returns
/// `true`. Repeated requests between two ticks coalesce into one repaint.
#[derive(Debug, Clone, Default)]
pub struct RedrawSignal {
    dirty: Arc<AtomicBool>,
}

impl RedrawSignal {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn request(&self) {
        self.dirty.store(true, Ordering::Release);
    }

    /// Returns whether a redraw was requested since the last call and clears the flag.
    pub fn take(&self) -> bool {
        self.dirty.swap(false, Ordering::AcqRel)
    }

    pub fn is_requested(&self) -> bool {
        self.dirty.load(Ordering::Acquire)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn requests_coalesce_until_taken() {
        let signal = RedrawSignal::new();
        assert!(!signal.take());

        let producer = signal.clone();
        producer.request();
        producer.request();

        assert!(signal.is_requested());
        assert!(signal.take());
        assert!(!signal.take());
    }
}
