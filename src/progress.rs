//! Progress-callback trait for per-note batch events.
//!
//! Inject an [`Arc<dyn ConversionProgressCallback>`] via
//! [`crate::config::ConversionConfigBuilder::progress_callback`] to receive
//! events as [`crate::stream::convert_batch`] works through a set of notes.
//!
//! Failed notes are reported here, one event per note, and the batch carries
//! on; deciding whether a failure should stop anything is the caller's call.
//!
//! # Example
//!
//! ```rust
//! use note2md::{ConversionProgressCallback, ConversionConfig};
//! use std::sync::{Arc, atomic::{AtomicUsize, Ordering}};
//!
//! struct CountingCallback {
//!     completed: Arc<AtomicUsize>,
//! }
//!
//! impl ConversionProgressCallback for CountingCallback {
//!     fn on_note_complete(&self, position: usize, title: &str, markdown_len: usize) {
//!         self.completed.fetch_add(1, Ordering::SeqCst);
//!         eprintln!("#{position} {title}: {markdown_len} bytes");
//!     }
//! }
//!
//! let counter = Arc::new(CountingCallback {
//!     completed: Arc::new(AtomicUsize::new(0)),
//! });
//!
//! let config = ConversionConfig::builder()
//!     .progress_callback(counter as Arc<dyn ConversionProgressCallback>)
//!     .build()
//!     .unwrap();
//! ```

use std::sync::Arc;

/// Called by the batch driver as it converts each note.
///
/// Implementations must be `Send + Sync`: notes are converted concurrently
/// and the per-note methods may be called from different threads. All
/// methods default to no-ops.
pub trait ConversionProgressCallback: Send + Sync {
    /// Called once before any note is converted.
    fn on_batch_start(&self, total_notes: usize) {
        let _ = total_notes;
    }

    /// Called when a note converts without error.
    ///
    /// # Arguments
    /// * `position`    : 0-indexed position of the note in the batch
    /// * `title`       : note title
    /// * `markdown_len`: byte length of the produced Markdown
    fn on_note_complete(&self, position: usize, title: &str, markdown_len: usize) {
        let _ = (position, title, markdown_len);
    }

    /// Called when a note fails; `error` is its sticky error, formatted.
    fn on_note_error(&self, position: usize, title: &str, error: &str) {
        let _ = (position, title, error);
    }

    /// Called once after every note has been attempted.
    fn on_batch_complete(&self, total_notes: usize, success_count: usize) {
        let _ = (total_notes, success_count);
    }
}

/// A no-op implementation for callers that don't need progress events.
pub struct NoopProgressCallback;

impl ConversionProgressCallback for NoopProgressCallback {}

/// Convenience alias matching the type stored in [`crate::config::ConversionConfig`].
pub type ProgressCallback = Arc<dyn ConversionProgressCallback>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Default)]
    struct TrackingCallback {
        completes: AtomicUsize,
        errors: AtomicUsize,
        started_total: AtomicUsize,
        succeeded: AtomicUsize,
    }

    impl ConversionProgressCallback for TrackingCallback {
        fn on_batch_start(&self, total_notes: usize) {
            self.started_total.store(total_notes, Ordering::SeqCst);
        }

        fn on_note_complete(&self, _position: usize, _title: &str, _markdown_len: usize) {
            self.completes.fetch_add(1, Ordering::SeqCst);
        }

        fn on_note_error(&self, _position: usize, _title: &str, _error: &str) {
            self.errors.fetch_add(1, Ordering::SeqCst);
        }

        fn on_batch_complete(&self, _total_notes: usize, success_count: usize) {
            self.succeeded.store(success_count, Ordering::SeqCst);
        }
    }

    #[test]
    fn noop_callback_does_not_panic() {
        let cb = NoopProgressCallback;
        cb.on_batch_start(2);
        cb.on_note_complete(0, "a", 42);
        cb.on_note_error(1, "b", "bad attachment");
        cb.on_batch_complete(2, 1);
    }

    #[test]
    fn tracking_callback_receives_events() {
        let tracker = TrackingCallback::default();

        tracker.on_batch_start(3);
        tracker.on_note_complete(0, "one", 100);
        tracker.on_note_complete(1, "two", 200);
        tracker.on_note_error(2, "three", "decode failed");
        tracker.on_batch_complete(3, 2);

        assert_eq!(tracker.started_total.load(Ordering::SeqCst), 3);
        assert_eq!(tracker.completes.load(Ordering::SeqCst), 2);
        assert_eq!(tracker.errors.load(Ordering::SeqCst), 1);
        assert_eq!(tracker.succeeded.load(Ordering::SeqCst), 2);
    }
}
