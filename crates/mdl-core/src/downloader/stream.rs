//! Blocking single-stream HTTP GET that accumulates the body in memory.

use std::cell::Cell;
use std::str;
use std::time::Duration;

use super::progress::{ProgressTracker, ProgressUpdate};
use super::DownloadError;
use crate::control::CancelToken;

/// Result of a completed GET: the chunks in arrival order and byte count.
pub(super) struct FetchedBody {
    pub chunks: Vec<Vec<u8>>,
    pub bytes_received: u64,
    pub total_bytes: Option<u64>,
}

/// Parses the status code from an HTTP status line ("HTTP/1.1 200 OK").
fn parse_status_line(line: &str) -> Option<u32> {
    if !line.starts_with("HTTP/") {
        return None;
    }
    line.split_whitespace().nth(1)?.parse().ok()
}

/// Parses a `Content-Length` header line.
fn parse_content_length(line: &str) -> Option<u64> {
    let (name, value) = line.split_once(':')?;
    if !name.trim().eq_ignore_ascii_case("content-length") {
        return None;
    }
    value.trim().parse().ok()
}

/// Performs the GET, calling `on_progress` after each body chunk.
///
/// Follows redirects. Aborts as soon as `cancel` is set (checked from both
/// the write and progress callbacks). No overall timeout.
/// Runs in the current thread; call from `spawn_blocking` if used from async code.
pub(super) fn fetch_blocking(
    url: &str,
    cancel: &CancelToken,
    on_progress: &mut dyn FnMut(ProgressUpdate),
) -> Result<FetchedBody, DownloadError> {
    let status = Cell::new(0u32);
    let content_length: Cell<Option<u64>> = Cell::new(None);
    let mut tracker: Option<ProgressTracker> = None;
    let mut chunks: Vec<Vec<u8>> = Vec::new();

    let mut easy = curl::easy::Easy::new();
    easy.url(url)?;
    easy.follow_location(true)?;
    easy.max_redirections(10)?;
    easy.connect_timeout(Duration::from_secs(30))?;
    easy.progress(true)?;

    let perform_result = {
        let mut transfer = easy.transfer();
        transfer.header_function(|data| {
            if let Ok(line) = str::from_utf8(data) {
                let line = line.trim_end();
                if let Some(code) = parse_status_line(line) {
                    // New response (e.g. after a redirect): forget earlier headers.
                    status.set(code);
                    content_length.set(None);
                } else if let Some(len) = parse_content_length(line) {
                    content_length.set(Some(len));
                }
            }
            true
        })?;
        transfer.write_function(|data| {
            if cancel.is_cancelled() {
                return Ok(0);
            }
            if !(200..300).contains(&status.get()) {
                // Error body: drain without recording; status is checked after perform.
                return Ok(data.len());
            }
            let tracker = tracker.get_or_insert_with(|| ProgressTracker::new(content_length.get()));
            chunks.push(data.to_vec());
            on_progress(tracker.on_chunk(data.len()));
            Ok(data.len())
        })?;
        transfer.progress_function(|_, _, _, _| !cancel.is_cancelled())?;
        transfer.perform()
    };

    if cancel.is_cancelled() {
        return Err(DownloadError::Cancelled);
    }
    perform_result?;

    let code = easy.response_code()?;
    if !(200..300).contains(&code) {
        return Err(DownloadError::Http(code));
    }

    let (bytes_received, total_bytes) = match &tracker {
        Some(t) => (t.bytes_received(), t.total_bytes()),
        None => (0, content_length.get().filter(|&l| l > 0)),
    };
    Ok(FetchedBody {
        chunks,
        bytes_received,
        total_bytes,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_line_parsing() {
        assert_eq!(parse_status_line("HTTP/1.1 200 OK"), Some(200));
        assert_eq!(parse_status_line("HTTP/2 404"), Some(404));
        assert_eq!(parse_status_line("Content-Length: 5"), None);
    }

    #[test]
    fn content_length_parsing() {
        assert_eq!(parse_content_length("Content-Length: 1234"), Some(1234));
        assert_eq!(parse_content_length("content-length:42"), Some(42));
        assert_eq!(parse_content_length("Content-Type: video/mp4"), None);
        assert_eq!(parse_content_length("Content-Length: abc"), None);
    }
}
