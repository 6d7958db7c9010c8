//! Request/response transport for mirror calls.
//!
//! The resolver only needs "POST this JSON, give me the 2xx body"; the trait
//! keeps it independent of libcurl so the mirror loop can be tested offline.

use std::time::Duration;

use super::error::MirrorFailure;

/// Sends one JSON POST to a mirror endpoint.
pub trait MirrorTransport: Send + Sync {
    /// Returns the response body on a 2xx status, `MirrorFailure::Http` otherwise.
    /// Must give up after `timeout`.
    fn post_json(&self, endpoint: &str, body: &[u8], timeout: Duration)
        -> Result<Vec<u8>, MirrorFailure>;
}

/// libcurl-backed transport. Blocking; call from `spawn_blocking` in async code.
#[derive(Debug, Clone, Copy, Default)]
pub struct CurlTransport;

impl MirrorTransport for CurlTransport {
    fn post_json(
        &self,
        endpoint: &str,
        body: &[u8],
        timeout: Duration,
    ) -> Result<Vec<u8>, MirrorFailure> {
        let to_failure = |e: curl::Error| classify_curl_error(&e, timeout);
        let mut response = Vec::new();

        let mut easy = curl::easy::Easy::new();
        easy.url(endpoint).map_err(to_failure)?;
        easy.post(true).map_err(to_failure)?;
        easy.post_fields_copy(body).map_err(to_failure)?;
        easy.connect_timeout(timeout).map_err(to_failure)?;
        easy.timeout(timeout).map_err(to_failure)?;

        let mut list = curl::easy::List::new();
        list.append("Accept: application/json").map_err(to_failure)?;
        list.append("Content-Type: application/json").map_err(to_failure)?;
        // No 100-continue round trip; some mirrors never answer it.
        list.append("Expect:").map_err(to_failure)?;
        easy.http_headers(list).map_err(to_failure)?;

        {
            let mut transfer = easy.transfer();
            transfer
                .write_function(|data| {
                    response.extend_from_slice(data);
                    Ok(data.len())
                })
                .map_err(to_failure)?;
            transfer.perform().map_err(to_failure)?;
        }

        let code = easy.response_code().map_err(to_failure)?;
        if !(200..300).contains(&code) {
            return Err(MirrorFailure::Http(code));
        }
        Ok(response)
    }
}

/// Maps a curl error to a transient mirror failure.
pub fn classify_curl_error(e: &curl::Error, timeout: Duration) -> MirrorFailure {
    if e.is_operation_timedout() {
        return MirrorFailure::Timeout(timeout.as_secs());
    }
    MirrorFailure::Connection(e.to_string())
}
