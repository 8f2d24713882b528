//! Minimal HTTP/1.1 server that plays a scripted sequence of responses for
//! integration tests.
//!
//! Every POST consumes the next scripted response (or 200 `{"success":true}`
//! once the script runs dry) and is recorded, body included, so tests can
//! assert on what was submitted. `GET .../health` always answers 200.

use std::collections::VecDeque;
use std::io::{Read, Write};
use std::net::{TcpListener, TcpStream};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct ScriptedResponse {
    pub status: u32,
    pub body: String,
}

impl ScriptedResponse {
    pub fn new(status: u32, body: &str) -> Self {
        Self {
            status,
            body: body.to_string(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub path: String,
    pub authorization: Option<String>,
    pub body: String,
}

pub struct IngestServer {
    url: String,
    requests: Arc<Mutex<Vec<RecordedRequest>>>,
}

impl IngestServer {
    /// Endpoint base URL (with an `/api` path, so route joining is exercised).
    pub fn url(&self) -> String {
        self.url.clone()
    }

    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.requests.lock().unwrap().clone()
    }
}

/// Starts a server on an ephemeral port. Runs until the process exits.
pub fn start(script: Vec<ScriptedResponse>) -> IngestServer {
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind");
    let port = listener.local_addr().unwrap().port();
    let script = Arc::new(Mutex::new(VecDeque::from(script)));
    let requests = Arc::new(Mutex::new(Vec::new()));
    let recorded = Arc::clone(&requests);
    thread::spawn(move || {
        for stream in listener.incoming().flatten() {
            let script = Arc::clone(&script);
            let requests = Arc::clone(&recorded);
            thread::spawn(move || handle(stream, &script, &requests));
        }
    });
    IngestServer {
        url: format!("http://127.0.0.1:{}/api", port),
        requests,
    }
}

fn handle(
    mut stream: TcpStream,
    script: &Mutex<VecDeque<ScriptedResponse>>,
    requests: &Mutex<Vec<RecordedRequest>>,
) {
    let _ = stream.set_read_timeout(Some(Duration::from_secs(2)));
    let _ = stream.set_write_timeout(Some(Duration::from_secs(2)));

    // Read until the headers and the full Content-Length body have arrived.
    let mut buf = Vec::new();
    let mut chunk = [0u8; 8192];
    let request = loop {
        let n = match stream.read(&mut chunk) {
            Ok(0) | Err(_) => return,
            Ok(n) => n,
        };
        buf.extend_from_slice(&chunk[..n]);
        if let Some(request) = parse_request(&buf) {
            break request;
        }
    };
    let (method, path, authorization, body) = request;

    if method.eq_ignore_ascii_case("GET") && path.ends_with("/health") {
        respond(&mut stream, 200, r#"{"status":"ok"}"#);
        return;
    }
    if method.eq_ignore_ascii_case("POST") {
        requests.lock().unwrap().push(RecordedRequest {
            path,
            authorization,
            body,
        });
        let next = script.lock().unwrap().pop_front();
        match next {
            Some(r) => respond(&mut stream, r.status, &r.body),
            None => respond(&mut stream, 200, r#"{"success":true}"#),
        }
        return;
    }
    respond(&mut stream, 404, "");
}

/// Returns (method, path, authorization, body) once the buffer holds a
/// complete request.
fn parse_request(buf: &[u8]) -> Option<(String, String, Option<String>, String)> {
    let text = std::str::from_utf8(buf).ok()?;
    let header_end = text.find("\r\n\r\n")?;
    let head = &text[..header_end];

    let mut lines = head.lines();
    let request_line = lines.next()?;
    let mut parts = request_line.split_whitespace();
    let method = parts.next()?.to_string();
    let path = parts.next()?.to_string();

    let mut content_length = 0usize;
    let mut authorization = None;
    for line in lines {
        if let Some((name, value)) = line.split_once(':') {
            if name.trim().eq_ignore_ascii_case("content-length") {
                content_length = value.trim().parse().unwrap_or(0);
            }
            if name.trim().eq_ignore_ascii_case("authorization") {
                authorization = Some(value.trim().to_string());
            }
        }
    }

    let body_start = header_end + 4;
    if buf.len() < body_start + content_length {
        return None;
    }
    let body = String::from_utf8_lossy(&buf[body_start..body_start + content_length]).to_string();
    Some((method, path, authorization, body))
}

fn respond(stream: &mut TcpStream, status: u32, body: &str) {
    let reason = match status {
        200 => "OK",
        201 => "Created",
        204 => "No Content",
        400 => "Bad Request",
        401 => "Unauthorized",
        404 => "Not Found",
        422 => "Unprocessable Entity",
        500 => "Internal Server Error",
        503 => "Service Unavailable",
        _ => "",
    };
    let response = format!(
        "HTTP/1.1 {} {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
        status,
        reason,
        body.len(),
        body
    );
    let _ = stream.write_all(response.as_bytes());
}
