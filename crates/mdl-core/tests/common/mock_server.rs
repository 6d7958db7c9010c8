//! Minimal HTTP/1.1 server with scripted per-path responses for integration tests.
//!
//! Each path serves a fixed status and body. Bodies can be sent without
//! `Content-Length` (connection closed at the end) or in slow chunks so a
//! transfer can be cancelled mid-stream. Hits and request bodies are
//! recorded per path.

#![allow(dead_code)]

use std::collections::HashMap;
use std::io::{Read, Write};
use std::net::{TcpListener, TcpStream};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct Route {
    pub status: u16,
    pub body: Vec<u8>,
    pub content_type: &'static str,
    /// If false, omit `Content-Length` and close the connection after the body.
    pub send_length: bool,
    pub chunk_size: usize,
    /// Pause after each chunk.
    pub chunk_delay: Duration,
}

impl Route {
    pub fn bytes(body: Vec<u8>) -> Self {
        Self {
            status: 200,
            body,
            content_type: "application/octet-stream",
            send_length: true,
            chunk_size: 16 * 1024,
            chunk_delay: Duration::ZERO,
        }
    }

    pub fn json(body: &str) -> Self {
        Self {
            content_type: "application/json",
            ..Self::bytes(body.as_bytes().to_vec())
        }
    }

    pub fn status(code: u16) -> Self {
        Self {
            status: code,
            ..Self::bytes(b"error".to_vec())
        }
    }

    pub fn without_length(mut self) -> Self {
        self.send_length = false;
        self
    }

    pub fn slow(mut self, chunk_size: usize, delay: Duration) -> Self {
        self.chunk_size = chunk_size.max(1);
        self.chunk_delay = delay;
        self
    }
}

#[derive(Default)]
struct Recorded {
    hits: HashMap<String, usize>,
    bodies: HashMap<String, Vec<Vec<u8>>>,
}

pub struct MockServer {
    base: String,
    recorded: Arc<Mutex<Recorded>>,
}

impl MockServer {
    /// Starts the server on an ephemeral port. Runs until the process exits.
    pub fn start(routes: Vec<(&str, Route)>) -> Self {
        let routes: Arc<HashMap<String, Route>> = Arc::new(
            routes
                .into_iter()
                .map(|(path, route)| (path.to_string(), route))
                .collect(),
        );
        let recorded = Arc::new(Mutex::new(Recorded::default()));
        let listener = TcpListener::bind("127.0.0.1:0").expect("bind");
        let port = listener.local_addr().unwrap().port();
        let server_recorded = Arc::clone(&recorded);
        thread::spawn(move || {
            for stream in listener.incoming().flatten() {
                let routes = Arc::clone(&routes);
                let recorded = Arc::clone(&server_recorded);
                thread::spawn(move || handle(stream, &routes, &recorded));
            }
        });
        Self {
            base: format!("http://127.0.0.1:{}", port),
            recorded,
        }
    }

    /// Absolute URL for `path` (which starts with '/').
    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base, path)
    }

    pub fn hits(&self, path: &str) -> usize {
        let recorded = self.recorded.lock().unwrap();
        recorded.hits.get(path).copied().unwrap_or(0)
    }

    pub fn bodies(&self, path: &str) -> Vec<Vec<u8>> {
        let recorded = self.recorded.lock().unwrap();
        recorded.bodies.get(path).cloned().unwrap_or_default()
    }
}

fn handle(mut stream: TcpStream, routes: &HashMap<String, Route>, recorded: &Mutex<Recorded>) {
    let _ = stream.set_read_timeout(Some(Duration::from_secs(2)));
    let _ = stream.set_write_timeout(Some(Duration::from_secs(2)));
    let (path, body) = match read_request(&mut stream) {
        Some(r) => r,
        None => return,
    };
    {
        let mut rec = recorded.lock().unwrap();
        *rec.hits.entry(path.clone()).or_insert(0) += 1;
        rec.bodies.entry(path.clone()).or_default().push(body);
    }

    let route = match routes.get(&path) {
        Some(route) => route.clone(),
        None => Route::status(404),
    };
    let mut head = format!(
        "HTTP/1.1 {} {}\r\nContent-Type: {}\r\n",
        route.status,
        reason(route.status),
        route.content_type
    );
    if route.send_length {
        head.push_str(&format!("Content-Length: {}\r\n", route.body.len()));
    }
    head.push_str("Connection: close\r\n\r\n");
    if stream.write_all(head.as_bytes()).is_err() {
        return;
    }
    for chunk in route.body.chunks(route.chunk_size) {
        if stream.write_all(chunk).is_err() || stream.flush().is_err() {
            // Client went away (cancelled transfer).
            return;
        }
        if !route.chunk_delay.is_zero() {
            thread::sleep(route.chunk_delay);
        }
    }
}

/// Reads one request; returns (path, body).
fn read_request(stream: &mut TcpStream) -> Option<(String, Vec<u8>)> {
    let mut buf = Vec::new();
    let mut tmp = [0u8; 4096];
    let header_end = loop {
        let n = stream.read(&mut tmp).ok()?;
        if n == 0 {
            return None;
        }
        buf.extend_from_slice(&tmp[..n]);
        if let Some(pos) = find(&buf, b"\r\n\r\n") {
            break pos + 4;
        }
    };
    let head = std::str::from_utf8(&buf[..header_end]).ok()?;
    let mut lines = head.lines();
    let path = lines.next()?.split_whitespace().nth(1)?.to_string();
    let content_length = lines
        .filter_map(|l| l.split_once(':'))
        .find(|(name, _)| name.trim().eq_ignore_ascii_case("content-length"))
        .and_then(|(_, value)| value.trim().parse::<usize>().ok())
        .unwrap_or(0);

    let mut body = buf[header_end..].to_vec();
    while body.len() < content_length {
        let n = stream.read(&mut tmp).ok()?;
        if n == 0 {
            break;
        }
        body.extend_from_slice(&tmp[..n]);
    }
    Some((path, body))
}

fn find(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    haystack.windows(needle.len()).position(|w| w == needle)
}

fn reason(status: u16) -> &'static str {
    match status {
        200 => "OK",
        404 => "Not Found",
        500 => "Internal Server Error",
        502 => "Bad Gateway",
        503 => "Service Unavailable",
        _ => "Status",
    }
}
