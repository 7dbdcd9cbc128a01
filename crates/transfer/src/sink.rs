//! Progress sinks: where session updates are pushed.

use std::sync::{Mutex, PoisonError};

use crate::projection::ProgressView;

/// Receives a projection after every session state change.
///
/// Called with the session locked so that renders arrive in the order
/// the changes happened. Implementations must not call back into the
/// controller.
pub trait ProgressSink: Send + Sync {
    fn render(&self, view: &ProgressView);
}

impl<F> ProgressSink for F
where
    F: Fn(&ProgressView) + Send + Sync,
{
    fn render(&self, view: &ProgressView) {
        self(view)
    }
}

/// Sink that keeps every view it was given.
#[derive(Debug, Default)]
pub struct RecordingSink {
    views: Mutex<Vec<ProgressView>>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// All views rendered so far, oldest first.
    pub fn views(&self) -> Vec<ProgressView> {
        self.views
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// The most recent view.
    pub fn last(&self) -> Option<ProgressView> {
        self.views
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .last()
            .cloned()
    }
}

impl ProgressSink for RecordingSink {
    fn render(&self, view: &ProgressView) {
        self.views
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(view.clone());
    }
}
