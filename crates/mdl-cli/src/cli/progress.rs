//! Terminal rendering of pipeline events (stderr, so stdout stays scriptable).

use mdl_core::downloader::ProgressUpdate;
use mdl_core::pipeline::{format_progress, PipelineEvent, SessionState};
use std::time::Instant;

const PROGRESS_INTERVAL_MS: u64 = 500;

#[derive(Default)]
pub struct Renderer {
    last_print: Option<Instant>,
    progress_line_open: bool,
}

impl Renderer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn render(&mut self, event: &PipelineEvent) {
        match event {
            PipelineEvent::State(state) => match state {
                SessionState::Analyzing
                | SessionState::WaitingForSave
                | SessionState::Converting => self.line(state.status_text()),
                _ => {}
            },
            PipelineEvent::Metadata(meta) => self.line(&format!("{} ({})", meta.title, meta.author)),
            PipelineEvent::Resolved(media) => {
                tracing::debug!(url = %media.direct_url, "resolved direct url");
                self.line(&format!("Resolved: {}", media.filename));
            }
            PipelineEvent::Progress(update) => {
                let now = Instant::now();
                let due = self
                    .last_print
                    .map(|t| now.duration_since(t).as_millis() as u64 >= PROGRESS_INTERVAL_MS)
                    .unwrap_or(true);
                if due || update.percent >= 100.0 {
                    eprint!("\r  {}   ", progress_line(update));
                    self.progress_line_open = true;
                    self.last_print = Some(now);
                }
            }
            // Outcome and errors are reported by the command itself.
            PipelineEvent::Saved { .. }
            | PipelineEvent::OpenedExternally { .. }
            | PipelineEvent::Error { .. } => {}
        }
    }

    pub fn finish(&mut self) {
        if self.progress_line_open {
            eprintln!();
            self.progress_line_open = false;
        }
    }

    fn line(&mut self, text: &str) {
        self.finish();
        eprintln!("{}", text);
    }
}

/// `"42% 4.2 / 10.0 MiB"`, or `"7% 1.3 MiB"` without a known size.
pub fn progress_line(update: &ProgressUpdate) -> String {
    let done_mib = update.bytes_received as f64 / 1_048_576.0;
    match update.total_bytes {
        Some(total) => format!(
            "{} {:.1} / {:.1} MiB",
            format_progress(update.percent),
            done_mib,
            total as f64 / 1_048_576.0
        ),
        None => format!("{} {:.1} MiB", format_progress(update.percent), done_mib),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn progress_line_with_and_without_total() {
        let known = ProgressUpdate {
            percent: 42.4,
            bytes_received: 4 * 1_048_576,
            total_bytes: Some(10 * 1_048_576),
        };
        assert_eq!(progress_line(&known), "42% 4.0 / 10.0 MiB");
        let unknown = ProgressUpdate {
            percent: 7.0,
            bytes_received: 1_048_576 / 2,
            total_bytes: None,
        };
        assert_eq!(progress_line(&unknown), "7% 0.5 MiB");
    }
}
