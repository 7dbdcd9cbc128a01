//! Terminal progress output.

use std::io::Write;

use waltz_transfer::{ProgressSink, ProgressView};

/// Output format for progress lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    /// One human-readable line per update.
    Text,
    /// One JSON object per update.
    Json,
}

/// Writes one line per session update to stdout.
#[derive(Debug)]
pub struct TerminalSink {
    format: Format,
}

impl TerminalSink {
    pub fn new(format: Format) -> Self {
        Self { format }
    }

    /// Formats `view` as a single line.
    pub fn line(&self, view: &ProgressView) -> String {
        match self.format {
            Format::Text => format!("[{:>3.0}%] {view}", view.fraction() * 100.0),
            Format::Json => serde_json::to_string(view).unwrap_or_else(|e| {
                tracing::warn!(error = %e, "failed to encode progress view");
                String::new()
            }),
        }
    }
}

impl ProgressSink for TerminalSink {
    fn render(&self, view: &ProgressView) {
        let line = self.line(view);
        if line.is_empty() {
            return;
        }
        let mut out = std::io::stdout().lock();
        let _ = writeln!(out, "{line}");
        let _ = out.flush();
    }
}
