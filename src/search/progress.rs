//! Optional progress event stream.
//!
//! Long runs (hundreds of resamples, each a full search) report progress through
//! a callback rather than printing. Core logic never depends on whether a
//! listener is attached: `Progress::none()` simply drops events.

use std::fmt;
use std::sync::Arc;
use std::sync::mpsc::{Receiver, channel};

use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum ProgressEvent {
    SearchStarted {
        predictors: usize,
        max_depth: usize,
    },
    DepthCompleted {
        depth: usize,
        /// Kept children before deduplication and the `L` cap.
        candidates: usize,
        retained: usize,
        best_score: f64,
    },
    /// No parent at `depth` produced a viable child; the search ended early.
    SearchStopped {
        depth: usize,
    },
    ResampleFinished {
        index: usize,
        total: usize,
        ok: bool,
    },
}

type Sink = Arc<dyn Fn(&ProgressEvent) + Send + Sync>;

#[derive(Clone, Default)]
pub struct Progress {
    sink: Option<Sink>,
}

impl Progress {
    pub fn none() -> Self {
        Self { sink: None }
    }

    pub fn new(f: impl Fn(&ProgressEvent) + Send + Sync + 'static) -> Self {
        Self {
            sink: Some(Arc::new(f)),
        }
    }

    /// A progress handle that forwards every event into a channel.
    pub fn channel() -> (Self, Receiver<ProgressEvent>) {
        let (tx, rx) = channel();
        let progress = Self::new(move |event| {
            // A dropped receiver just means nobody is listening anymore.
            let _ = tx.send(event.clone());
        });
        (progress, rx)
    }

    pub fn is_active(&self) -> bool {
        self.sink.is_some()
    }

    pub fn emit(&self, event: ProgressEvent) {
        if let Some(sink) = &self.sink {
            sink(&event);
        }
    }
}

impl fmt::Debug for Progress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Progress")
            .field("active", &self.is_active())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn channel_receives_events_in_order() {
        let (progress, rx) = Progress::channel();
        progress.emit(ProgressEvent::SearchStarted {
            predictors: 3,
            max_depth: 2,
        });
        progress.emit(ProgressEvent::SearchStopped { depth: 1 });
        drop(progress);

        let events: Vec<_> = rx.iter().collect();
        assert_eq!(events.len(), 2);
        assert_eq!(events[1], ProgressEvent::SearchStopped { depth: 1 });
    }

    #[test]
    fn none_drops_events() {
        let progress = Progress::none();
        assert!(!progress.is_active());
        progress.emit(ProgressEvent::SearchStopped { depth: 1 });
    }
}
