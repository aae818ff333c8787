//! Batch conversion API: emit notes as they complete.
//!
//! A notebook export can hold thousands of notes. [`convert_batch`] converts
//! them concurrently and yields each [`NoteOutcome`] through a `Stream` as
//! soon as it is ready, so callers can write files or drive a progress bar
//! without buffering the whole batch.
//!
//! Every note gets its own conversion state; a failing note produces an
//! outcome carrying its error and the batch carries on. Outcomes arrive in
//! completion order. Sort by `position` if order matters, or use
//! [`convert_all`].

use crate::config::ConversionConfig;
use crate::convert::Converter;
use crate::error::ConversionError;
use crate::note::SourceNote;
use crate::output::MarkdownNote;
use crate::progress::ProgressCallback;
use futures::future;
use futures::stream::{self, StreamExt};
use std::pin::Pin;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio_stream::Stream;
use tracing::{info, warn};

/// The result of converting one note in a batch.
#[derive(Debug)]
pub struct NoteOutcome {
    /// 0-indexed position of the note in the batch.
    pub position: usize,
    pub title: String,
    pub result: Result<MarkdownNote, ConversionError>,
}

/// A boxed stream of note outcomes.
pub type NoteStream = Pin<Box<dyn Stream<Item = NoteOutcome> + Send>>;

/// Convert `notes` with the default renderer.
///
/// # Example
/// ```rust,no_run
/// use futures::StreamExt;
/// use note2md::{convert_batch, ConversionConfig, SourceNote};
///
/// # #[tokio::main]
/// # async fn main() {
/// let notes: Vec<SourceNote> = Vec::new();
/// let mut outcomes = convert_batch(notes, &ConversionConfig::default());
/// while let Some(outcome) = outcomes.next().await {
///     match outcome.result {
///         Ok(doc) => println!("{}: {} bytes", outcome.title, doc.content.len()),
///         Err(e) => eprintln!("{}: {e}", outcome.title),
///     }
/// }
/// # }
/// ```
pub fn convert_batch(notes: Vec<SourceNote>, config: &ConversionConfig) -> NoteStream {
    convert_batch_with(notes, Converter::new(config.clone()))
}

/// Convert `notes` with a prepared [`Converter`].
pub fn convert_batch_with(notes: Vec<SourceNote>, converter: Converter) -> NoteStream {
    let total = notes.len();
    let concurrency = converter.config().concurrency.max(1);
    let callback = converter.config().progress_callback.clone();
    info!(
        "Starting batch conversion: {} notes, concurrency {}",
        total, concurrency
    );

    if let Some(cb) = &callback {
        cb.on_batch_start(total);
    }

    let successes = Arc::new(AtomicUsize::new(0));

    let outcomes = {
        let callback = callback.clone();
        let successes = Arc::clone(&successes);
        stream::iter(notes.into_iter().enumerate().map(move |(position, note)| {
            let converter = converter.clone();
            let callback = callback.clone();
            let successes = Arc::clone(&successes);
            async move {
                let title = note.title.clone();
                let result =
                    tokio::task::spawn_blocking(move || converter.convert(&note, position))
                        .await
                        .unwrap_or_else(|e| {
                            Err(ConversionError::Internal(format!("conversion task: {e}")))
                        });
                report(&callback, &successes, position, &title, &result);
                NoteOutcome {
                    position,
                    title,
                    result,
                }
            }
        }))
        .buffer_unordered(concurrency)
    };

    let finished = stream::once(async move {
        let ok = successes.load(Ordering::SeqCst);
        info!("Batch complete: {}/{} notes converted", ok, total);
        if let Some(cb) = &callback {
            cb.on_batch_complete(total, ok);
        }
    })
    .filter_map(|()| future::ready(None::<NoteOutcome>));

    Box::pin(outcomes.chain(finished))
}

/// Convert `notes` and collect the outcomes in batch order.
pub async fn convert_all(notes: Vec<SourceNote>, config: &ConversionConfig) -> Vec<NoteOutcome> {
    let mut outcomes: Vec<NoteOutcome> = convert_batch(notes, config).collect().await;
    outcomes.sort_by_key(|o| o.position);
    outcomes
}

fn report(
    callback: &Option<ProgressCallback>,
    successes: &AtomicUsize,
    position: usize,
    title: &str,
    result: &Result<MarkdownNote, ConversionError>,
) {
    match result {
        Ok(doc) => {
            successes.fetch_add(1, Ordering::SeqCst);
            if let Some(cb) = callback {
                cb.on_note_complete(position, title, doc.content.len());
            }
        }
        Err(e) => {
            warn!("Note {} ({:?}) failed: {}", position, title, e);
            if let Some(cb) = callback {
                cb.on_note_error(position, title, &e.to_string());
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::progress::ConversionProgressCallback;
    use std::sync::Mutex;

    #[derive(Default)]
    struct Recorder {
        events: Mutex<Vec<String>>,
    }

    impl ConversionProgressCallback for Recorder {
        fn on_batch_start(&self, total: usize) {
            self.events.lock().unwrap().push(format!("start {total}"));
        }
        fn on_note_complete(&self, position: usize, _: &str, _: usize) {
            self.events.lock().unwrap().push(format!("ok {position}"));
        }
        fn on_note_error(&self, position: usize, _: &str, _: &str) {
            self.events.lock().unwrap().push(format!("err {position}"));
        }
        fn on_batch_complete(&self, total: usize, ok: usize) {
            self.events.lock().unwrap().push(format!("done {ok}/{total}"));
        }
    }

    fn note(title: &str) -> SourceNote {
        SourceNote {
            title: title.into(),
            content: format!("<p>{title} body</p>"),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn failing_note_does_not_abort_batch() {
        let recorder = Arc::new(Recorder::default());
        let config = ConversionConfig::builder()
            .concurrency(2)
            .progress_callback(recorder.clone())
            .build()
            .unwrap();

        let mut broken = note("broken");
        broken.resources = vec![crate::note::Attachment::new("%%%", "image/png")];
        let notes = vec![note("a"), broken, note("c")];

        let outcomes = convert_all(notes, &config).await;
        assert_eq!(outcomes.len(), 3);
        assert!(outcomes[0].result.is_ok());
        assert!(matches!(
            outcomes[1].result,
            Err(ConversionError::ResourceDecode { .. })
        ));
        assert_eq!(outcomes[2].result.as_ref().unwrap().content, "# c\n\nc body\n");

        let events = recorder.events.lock().unwrap().clone();
        assert_eq!(events.first().map(String::as_str), Some("start 3"));
        assert_eq!(events.last().map(String::as_str), Some("done 2/3"));
        assert!(events.contains(&"err 1".to_string()));
    }

    #[tokio::test]
    async fn empty_batch_completes() {
        let outcomes = convert_all(Vec::new(), &ConversionConfig::default()).await;
        assert!(outcomes.is_empty());
    }
}
