//! Debouncing for selection-change events
//!
//! Browsers fire a selection-change on every intermediate step of a drag.
//! The debouncer keeps only the latest selection and releases it once no new
//! change has arrived for the debounce window. Time is passed in so tests
//! can drive it deterministically.

use std::time::{Duration, Instant};

use super::types::TextSelection;

/// Default debounce window in milliseconds.
pub const DEFAULT_SELECTION_DEBOUNCE_MS: u64 = 50;

pub struct SelectionDebouncer {
    pending: Option<(TextSelection, Instant)>,
    window: Duration,
}

impl SelectionDebouncer {
    pub fn new(debounce_ms: u64) -> Self {
        Self {
            pending: None,
            window: Duration::from_millis(debounce_ms),
        }
    }

    pub fn with_default() -> Self {
        Self::new(DEFAULT_SELECTION_DEBOUNCE_MS)
    }

    /// Record the latest selection, restarting the window
    pub fn register(&mut self, selection: TextSelection, now: Instant) {
        self.pending = Some((selection, now));
    }

    /// The selection collapsed; drop whatever was pending
    pub fn cancel(&mut self) {
        self.pending = None;
    }

    /// Release the pending selection if its window has elapsed
    pub fn flush_ready(&mut self, now: Instant) -> Option<TextSelection> {
        match &self.pending {
            Some((_, changed_at)) if now.duration_since(*changed_at) >= self.window => {
                self.pending.take().map(|(selection, _)| selection)
            }
            _ => None,
        }
    }

    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pdf::types::NodeId;

    fn selection(text: &str) -> TextSelection {
        TextSelection {
            anchor: NodeId(1),
            client_rects: Vec::new(),
            text: text.to_string(),
        }
    }

    #[test]
    fn releases_after_window() {
        let mut debouncer = SelectionDebouncer::new(50);
        let start = Instant::now();

        debouncer.register(selection("a"), start);
        assert!(debouncer.flush_ready(start + Duration::from_millis(49)).is_none());

        let released = debouncer.flush_ready(start + Duration::from_millis(50));
        assert_eq!(released.unwrap().text, "a");
        assert!(!debouncer.is_pending());
    }

    #[test]
    fn new_change_restarts_window_and_wins() {
        let mut debouncer = SelectionDebouncer::new(50);
        let start = Instant::now();

        debouncer.register(selection("a"), start);
        debouncer.register(selection("ab"), start + Duration::from_millis(30));

        assert!(debouncer.flush_ready(start + Duration::from_millis(60)).is_none());
        let released = debouncer.flush_ready(start + Duration::from_millis(80));
        assert_eq!(released.unwrap().text, "ab");
    }

    #[test]
    fn cancel_drops_pending() {
        let mut debouncer = SelectionDebouncer::with_default();
        let start = Instant::now();

        debouncer.register(selection("a"), start);
        debouncer.cancel();
        assert!(debouncer.flush_ready(start + Duration::from_secs(1)).is_none());
    }
}
