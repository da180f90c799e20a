//! Integration tests for the `nerlens serve` HTTP surface.
//!
//! Each test starts the server as a child process on a unique port,
//! pointed at a fake backend running on a thread in the test process,
//! makes raw HTTP requests, and verifies the responses.

use std::io::{Read, Write};
use std::net::{TcpListener, TcpStream};
use std::process::{Child, Command};
use std::sync::atomic::{AtomicU16, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Atomic port counter to avoid port conflicts between parallel tests.
/// Base port is derived from process ID so separate test binaries don't
/// collide on the same port range.
static NEXT_PORT: AtomicU16 = AtomicU16::new(0);
static PORT_INIT: std::sync::Once = std::sync::Once::new();

fn next_port() -> u16 {
    PORT_INIT.call_once(|| {
        let base = 20000 + (std::process::id() as u16 % 20000);
        NEXT_PORT.store(base, Ordering::SeqCst);
    });
    NEXT_PORT.fetch_add(1, Ordering::SeqCst)
}

const BOUNDARY: &str = "test-boundary-7f3a";

const PARIS_JSON: &str =
    r#"{"openai_results":[{"entity":"Paris","type":"LOC"}],"huggingface_results":[]}"#;

// ──────────────────────────────────────────────
// Fake backend
// ──────────────────────────────────────────────

/// A canned-response HTTP server that records every raw request.
struct FakeBackend {
    url: String,
    requests: Arc<Mutex<Vec<Vec<u8>>>>,
}

impl FakeBackend {
    fn start(status_line: &'static str, body: &'static str) -> FakeBackend {
        let listener = TcpListener::bind("127.0.0.1:0").expect("bind fake backend");
        let port = listener.local_addr().unwrap().port();
        let requests = Arc::new(Mutex::new(Vec::new()));
        let seen = requests.clone();

        std::thread::spawn(move || {
            for stream in listener.incoming() {
                let Ok(mut stream) = stream else { continue };
                let raw = read_request(&mut stream);
                seen.lock().unwrap().push(raw);
                let response = format!(
                    "HTTP/1.1 {}\r\nContent-Type: text/plain\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                    status_line,
                    body.len(),
                    body
                );
                let _ = stream.write_all(response.as_bytes());
            }
        });

        FakeBackend {
            url: format!("http://127.0.0.1:{}", port),
            requests,
        }
    }

    fn requests(&self) -> Vec<String> {
        self.requests
            .lock()
            .unwrap()
            .iter()
            .map(|r| String::from_utf8_lossy(r).to_string())
            .collect()
    }
}

fn find_subslice(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    haystack.windows(needle.len()).position(|w| w == needle)
}

/// Read one HTTP request: headers, then `Content-Length` bytes of body.
fn read_request(stream: &mut TcpStream) -> Vec<u8> {
    stream
        .set_read_timeout(Some(Duration::from_secs(5)))
        .unwrap();
    let mut buf = Vec::new();
    let mut chunk = [0u8; 4096];
    loop {
        let n = match stream.read(&mut chunk) {
            Ok(0) | Err(_) => break,
            Ok(n) => n,
        };
        buf.extend_from_slice(&chunk[..n]);
        if let Some(end) = find_subslice(&buf, b"\r\n\r\n") {
            let headers = String::from_utf8_lossy(&buf[..end]).to_lowercase();
            let content_length = headers
                .lines()
                .find_map(|l| l.strip_prefix("content-length:"))
                .and_then(|v| v.trim().parse::<usize>().ok())
                .unwrap_or(0);
            if buf.len() >= end + 4 + content_length {
                break;
            }
        }
    }
    buf
}

/// An address nothing listens on.
fn dead_backend_url() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let port = listener.local_addr().unwrap().port();
    drop(listener);
    format!("http://127.0.0.1:{}", port)
}

// ──────────────────────────────────────────────
// Server process and HTTP helpers
// ──────────────────────────────────────────────

/// Helper: start `nerlens serve` on the given port against `backend_url`.
fn start_server(port: u16, backend_url: &str, extra_args: &[&str]) -> Child {
    let mut cmd = serve_command(port);
    cmd.arg("--backend-url").arg(backend_url);
    for a in extra_args {
        cmd.arg(a);
    }
    cmd.env_remove("BACKEND_URL");
    spawn_server(cmd, port)
}

/// `nerlens serve --port <port>` with a clean redaction setting.
fn serve_command(port: u16) -> Command {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_nerlens"));
    cmd.arg("serve").arg("--port").arg(port.to_string());
    cmd.env_remove("NERLENS_REDACT_BACKEND_ERRORS");
    cmd
}

fn spawn_server(mut cmd: Command, port: u16) -> Child {
    // Redirect stdout/stderr to avoid blocking
    cmd.stdout(std::process::Stdio::null());
    cmd.stderr(std::process::Stdio::null());

    let child = cmd.spawn().expect("failed to start nerlens serve");
    // Wait for server to be ready by polling the port
    for _ in 0..50 {
        if TcpStream::connect(format!("127.0.0.1:{}", port)).is_ok() {
            return child;
        }
        std::thread::sleep(Duration::from_millis(100));
    }
    child
}

fn stop(mut child: Child) {
    child.kill().ok();
    child.wait().ok();
}

/// Send raw request bytes and return (status, body).
fn send(port: u16, request: &[u8]) -> (u16, String) {
    let mut stream = TcpStream::connect(format!("127.0.0.1:{}", port)).expect("failed to connect");
    stream
        .set_read_timeout(Some(Duration::from_secs(10)))
        .unwrap();
    stream.write_all(request).expect("failed to write");

    let mut response = Vec::new();
    let _ = stream.read_to_end(&mut response);
    parse_http_response(&String::from_utf8_lossy(&response))
}

fn http_get(port: u16, path: &str) -> (u16, String) {
    let request = format!(
        "GET {} HTTP/1.1\r\nHost: localhost:{}\r\nConnection: close\r\n\r\n",
        path, port
    );
    send(port, request.as_bytes())
}

fn http_post(port: u16, path: &str, content_type: &str, body: &[u8]) -> (u16, String) {
    let mut request = format!(
        "POST {} HTTP/1.1\r\nHost: localhost:{}\r\nContent-Type: {}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
        path,
        port,
        content_type,
        body.len()
    )
    .into_bytes();
    request.extend_from_slice(body);
    send(port, &request)
}

/// One form part: (field name, filename, content type, bytes).
type Part<'a> = (&'a str, Option<&'a str>, Option<&'a str>, &'a [u8]);

fn multipart_body(parts: &[Part<'_>]) -> Vec<u8> {
    let mut body = Vec::new();
    for (name, filename, content_type, bytes) in parts {
        body.extend_from_slice(format!("--{}\r\n", BOUNDARY).as_bytes());
        match filename {
            Some(f) => body.extend_from_slice(
                format!(
                    "Content-Disposition: form-data; name=\"{}\"; filename=\"{}\"\r\n",
                    name, f
                )
                .as_bytes(),
            ),
            None => body.extend_from_slice(
                format!("Content-Disposition: form-data; name=\"{}\"\r\n", name).as_bytes(),
            ),
        }
        if let Some(ct) = content_type {
            body.extend_from_slice(format!("Content-Type: {}\r\n", ct).as_bytes());
        }
        body.extend_from_slice(b"\r\n");
        body.extend_from_slice(bytes);
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{}--\r\n", BOUNDARY).as_bytes());
    body
}

fn post_form(port: u16, path: &str, parts: &[Part<'_>]) -> (u16, String) {
    http_post(
        port,
        path,
        &format!("multipart/form-data; boundary={}", BOUNDARY),
        &multipart_body(parts),
    )
}

fn paris_file() -> Part<'static> {
    (
        "file",
        Some("paris.txt"),
        Some("text/plain"),
        &b"Paris is the capital of France."[..],
    )
}

/// Parse an HTTP response into (status_code, body).
fn parse_http_response(response: &str) -> (u16, String) {
    let parts: Vec<&str> = response.splitn(2, "\r\n\r\n").collect();
    let headers = parts.first().unwrap_or(&"").to_string();
    let body = parts.get(1).unwrap_or(&"").to_string();

    let status = headers
        .lines()
        .next()
        .unwrap_or("")
        .split_whitespace()
        .nth(1)
        .and_then(|s| s.parse::<u16>().ok())
        .unwrap_or(0);

    let body = if headers.to_lowercase().contains("transfer-encoding: chunked") {
        decode_chunked(&body)
    } else {
        body
    };
    (status, body)
}

/// Decode chunked transfer encoding.
fn decode_chunked(data: &str) -> String {
    let mut result = String::new();
    let mut remaining = data;

    while let Some(line_end) = remaining.find("\r\n") {
        let size = match usize::from_str_radix(remaining[..line_end].trim(), 16) {
            Ok(s) => s,
            Err(_) => break,
        };
        if size == 0 {
            break;
        }
        let chunk_start = line_end + 2;
        let chunk_end = chunk_start + size;
        if chunk_end > remaining.len() {
            result.push_str(&remaining[chunk_start..]);
            break;
        }
        result.push_str(&remaining[chunk_start..chunk_end]);
        remaining = remaining.get(chunk_end + 2..).unwrap_or("");
    }

    result
}

fn json(body: &str) -> serde_json::Value {
    serde_json::from_str(body).expect("valid JSON")
}

// ──────────────────────────────────────────────
// Health and routing
// ──────────────────────────────────────────────

#[test]
fn health_returns_200_with_version() {
    let backend = FakeBackend::start("200 OK", PARIS_JSON);
    let port = next_port();
    let child = start_server(port, &backend.url, &[]);

    let (status, body) = http_get(port, "/health");
    stop(child);

    assert_eq!(status, 200);
    let v = json(&body);
    assert_eq!(v["status"], "ok");
    assert!(v.get("version").is_some());
}

#[test]
fn unknown_route_is_json_404() {
    let backend = FakeBackend::start("200 OK", PARIS_JSON);
    let port = next_port();
    let child = start_server(port, &backend.url, &[]);

    let (status, body) = http_get(port, "/nope");
    stop(child);

    assert_eq!(status, 404);
    assert_eq!(json(&body)["error"], "not found");
}

// ──────────────────────────────────────────────
// Relay endpoint
// ──────────────────────────────────────────────

#[test]
fn relay_without_file_is_400_and_never_calls_backend() {
    let backend = FakeBackend::start("200 OK", PARIS_JSON);
    let port = next_port();
    let child = start_server(port, &backend.url, &[]);

    let (status, body) = post_form(port, "/api/analyze", &[("note", None, None, &b"hello"[..])]);
    let (empty_status, _) = post_form(
        port,
        "/api/analyze",
        &[("file", Some(""), Some("application/octet-stream"), &b""[..])],
    );
    let (json_status, json_body) = http_post(port, "/api/analyze", "application/json", b"{}");
    stop(child);

    assert_eq!(status, 400);
    assert_eq!(json(&body)["error"], "No file uploaded");
    assert_eq!(empty_status, 400);
    assert_eq!(json_status, 400);
    assert_eq!(json(&json_body)["error"], "No file uploaded");
    assert!(backend.requests().is_empty());
}

#[test]
fn relay_forwards_file_once_and_returns_body_verbatim() {
    let backend = FakeBackend::start("200 OK", PARIS_JSON);
    let port = next_port();
    let child = start_server(port, &backend.url, &[]);

    let (status, body) = post_form(port, "/api/analyze", &[paris_file()]);
    stop(child);

    assert_eq!(status, 200);
    assert_eq!(json(&body), json(PARIS_JSON));

    let requests = backend.requests();
    assert_eq!(requests.len(), 1, "exactly one backend request");
    let request = &requests[0];
    assert!(request.starts_with("POST /analyze/ HTTP/1.1"));
    assert!(request.contains("name=\"file\"; filename=\"paris.txt\""));
    assert!(request.contains("Content-Type: text/plain\r\n\r\nParis is the capital of France.\r\n"));
}

#[test]
fn backend_url_env_selects_backend() {
    let backend = FakeBackend::start("200 OK", PARIS_JSON);
    let port = next_port();
    let mut cmd = serve_command(port);
    cmd.env("BACKEND_URL", format!("  {}/  ", backend.url));
    let child = spawn_server(cmd, port);

    let (status, body) = post_form(port, "/api/analyze", &[paris_file()]);
    stop(child);

    assert_eq!(status, 200);
    assert_eq!(json(&body), json(PARIS_JSON));
    let requests = backend.requests();
    assert_eq!(requests.len(), 1);
    assert!(requests[0].starts_with("POST /analyze/ HTTP/1.1"));
}

#[test]
fn backend_url_flag_overrides_env() {
    let flagged = FakeBackend::start("200 OK", PARIS_JSON);
    let from_env = FakeBackend::start("200 OK", PARIS_JSON);
    let port = next_port();
    let mut cmd = serve_command(port);
    cmd.arg("--backend-url").arg(&flagged.url);
    cmd.env("BACKEND_URL", &from_env.url);
    let child = spawn_server(cmd, port);

    let (status, _) = post_form(port, "/api/analyze", &[paris_file()]);
    stop(child);

    assert_eq!(status, 200);
    assert_eq!(flagged.requests().len(), 1);
    assert!(from_env.requests().is_empty());
}

#[test]
fn relay_passes_backend_500_through() {
    let backend = FakeBackend::start("500 Internal Server Error", "Internal error");
    let port = next_port();
    let child = start_server(port, &backend.url, &[]);

    let (status, body) = post_form(port, "/api/analyze", &[paris_file()]);
    stop(child);

    assert_eq!(status, 500);
    assert!(json(&body)["error"]
        .as_str()
        .unwrap()
        .contains("Internal error"));
}

#[test]
fn relay_keeps_backend_status_code() {
    let backend = FakeBackend::start(
        "400 Bad Request",
        r#"{"detail":"Only text files are allowed"}"#,
    );
    let port = next_port();
    let child = start_server(port, &backend.url, &[]);

    let (status, body) = post_form(port, "/api/analyze", &[paris_file()]);
    stop(child);

    assert_eq!(status, 400);
    assert_eq!(
        json(&body)["error"],
        r#"{"detail":"Only text files are allowed"}"#
    );
}

#[test]
fn relay_reports_unreachable_backend_as_500() {
    let port = next_port();
    let child = start_server(port, &dead_backend_url(), &[]);

    let (status, body) = post_form(port, "/api/analyze", &[paris_file()]);
    stop(child);

    assert_eq!(status, 500);
    assert!(json(&body)["error"]
        .as_str()
        .unwrap()
        .starts_with("Failed to communicate with backend:"));
}

#[test]
fn redaction_hides_backend_body() {
    let backend = FakeBackend::start("500 Internal Server Error", "Traceback: /srv/secret.py");
    let port = next_port();
    let child = start_server(port, &backend.url, &["--redact-backend-errors"]);

    let (status, body) = post_form(port, "/api/analyze", &[paris_file()]);
    stop(child);

    assert_eq!(status, 500);
    assert_eq!(json(&body)["error"], "backend returned status 500");
}

// ──────────────────────────────────────────────
// Page
// ──────────────────────────────────────────────

#[test]
fn index_renders_upload_form_without_results() {
    let backend = FakeBackend::start("200 OK", PARIS_JSON);
    let port = next_port();
    let child = start_server(port, &backend.url, &[]);

    let (status, body) = http_get(port, "/");
    stop(child);

    assert_eq!(status, 200);
    assert!(body.contains("enctype=\"multipart/form-data\""));
    assert!(body.contains("accept=\".txt,text/plain\""));
    assert!(body.contains("id=\"submit\" disabled>Analyze Text</button>"));
    assert!(!body.contains("Named Entity Recognition Results"));
}

#[test]
fn page_submit_renders_both_tables() {
    let backend = FakeBackend::start("200 OK", PARIS_JSON);
    let port = next_port();
    let child = start_server(port, &backend.url, &[]);

    let (status, body) = post_form(port, "/", &[paris_file()]);
    stop(child);

    assert_eq!(status, 200);
    assert!(body.contains("Analysis Complete"));
    assert!(body.contains("OpenAI Results"));
    assert!(body.contains("Hugging Face Results"));
    assert!(body.contains("<td class=\"entity\">Paris</td><td>LOC</td>"));
    assert_eq!(backend.requests().len(), 1);
}

#[test]
fn page_failure_keeps_previous_tables() {
    let backend = FakeBackend::start("500 Internal Server Error", "Internal error");
    let port = next_port();
    let child = start_server(port, &backend.url, &[]);

    let previous =
        r#"{"openai_results":[{"entity":"Berlin","type":"LOC"}],"huggingface_results":[]}"#;
    let (status, body) = post_form(
        port,
        "/",
        &[paris_file(), ("previous", None, None, previous.as_bytes())],
    );
    stop(child);

    assert_eq!(status, 200);
    assert!(body.contains("toast toast-destructive"));
    assert!(body.contains("Internal error"));
    assert!(body.contains("<td class=\"entity\">Berlin</td><td>LOC</td>"));
}

#[test]
fn page_truncated_form_keeps_previous_tables() {
    let backend = FakeBackend::start("200 OK", PARIS_JSON);
    let port = next_port();
    let child = start_server(port, &backend.url, &[]);

    let previous =
        r#"{"openai_results":[{"entity":"Berlin","type":"LOC"}],"huggingface_results":[]}"#;
    // Complete `previous` part, then a file part cut off before its boundary.
    let body = format!(
        "--{b}\r\nContent-Disposition: form-data; name=\"previous\"\r\n\r\n{previous}\r\n\
         --{b}\r\nContent-Disposition: form-data; name=\"file\"; filename=\"paris.txt\"\r\n\
         Content-Type: text/plain\r\n\r\nParis is",
        b = BOUNDARY,
        previous = previous
    );
    let (status, page) = http_post(
        port,
        "/",
        &format!("multipart/form-data; boundary={}", BOUNDARY),
        body.as_bytes(),
    );
    stop(child);

    assert_eq!(status, 200);
    assert!(page.contains("toast toast-destructive"));
    assert!(page.contains("invalid multipart body"));
    assert!(page.contains("<td class=\"entity\">Berlin</td><td>LOC</td>"));
    assert!(backend.requests().is_empty());
}

#[test]
fn page_rejects_non_text_file_without_calling_backend() {
    let backend = FakeBackend::start("200 OK", PARIS_JSON);
    let port = next_port();
    let child = start_server(port, &backend.url, &[]);

    let (status, body) = post_form(
        port,
        "/",
        &[("file", Some("scan.pdf"), Some("application/pdf"), &b"%PDF-1.4"[..])],
    );
    stop(child);

    assert_eq!(status, 200);
    assert!(body.contains("is not a plain-text (.txt) file"));
    assert!(backend.requests().is_empty());
}

#[test]
fn page_submit_without_file_issues_no_request() {
    let backend = FakeBackend::start("200 OK", PARIS_JSON);
    let port = next_port();
    let child = start_server(port, &backend.url, &[]);

    let (status, body) = post_form(
        port,
        "/",
        &[("file", Some(""), Some("application/octet-stream"), &b""[..])],
    );
    stop(child);

    assert_eq!(status, 200);
    assert!(!body.contains("role=\"alert\""));
    assert!(!body.contains("role=\"status\""));
    assert!(backend.requests().is_empty());
}
