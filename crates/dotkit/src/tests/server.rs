use crate::*;
use std::io::{Read, Write};
use std::net::{SocketAddr, TcpListener};
use std::thread;

/// One-shot HTTP responder. Accepts a single connection, reads the full
/// request (headers + Content-Length body), replies with the given status
/// line and body, and hands the raw request bytes back to the test.
fn spawn_stub_server(
    status_line: &'static str,
    body: &'static [u8],
) -> (SocketAddr, thread::JoinHandle<Vec<u8>>) {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    let handle = thread::spawn(move || {
        let (mut stream, _) = listener.accept().unwrap();
        let mut request = Vec::new();
        let mut chunk = [0u8; 1024];

        let header_end = loop {
            let n = stream.read(&mut chunk).unwrap();
            request.extend_from_slice(&chunk[..n]);
            if let Some(pos) = request
                .windows(4)
                .position(|window| window == b"\r\n\r\n")
            {
                break pos + 4;
            }
            assert!(n > 0, "connection closed before end of headers");
        };

        let headers = String::from_utf8_lossy(&request[..header_end]).to_ascii_lowercase();
        let content_length = headers
            .lines()
            .find_map(|line| line.strip_prefix("content-length:"))
            .and_then(|v| v.trim().parse::<usize>().ok())
            .unwrap_or(0);
        while request.len() < header_end + content_length {
            let n = stream.read(&mut chunk).unwrap();
            assert!(n > 0, "connection closed before end of body");
            request.extend_from_slice(&chunk[..n]);
        }

        let response = format!(
            "HTTP/1.1 {status_line}\r\nContent-Type: image/svg+xml\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
            body.len()
        );
        // Ignore write failures: a client that rejects the status line may
        // close the connection without draining the body.
        let _ = stream.write_all(response.as_bytes());
        let _ = stream.write_all(body);
        let _ = stream.flush();
        request
    });
    (addr, handle)
}

#[test]
fn stop_without_start_is_a_noop() {
    let engine = ServerEngine::connect("http://127.0.0.1:9099/").unwrap();
    engine.stop().unwrap();
    engine.stop().unwrap();
}

#[test]
fn start_without_launch_command_errors() {
    let engine = ServerEngine::connect("http://127.0.0.1:9099/").unwrap();
    let err = engine.start().unwrap_err();
    assert!(matches!(err, Error::Server { .. }), "got {err:?}");
}

#[test]
fn invalid_endpoint_is_rejected() {
    let err = ServerEngine::connect("not a url").unwrap_err();
    assert!(matches!(err, Error::Server { .. }), "got {err:?}");
}

#[cfg(unix)]
#[test]
fn start_and_stop_are_idempotent_with_a_managed_process() {
    use std::time::Duration;

    let engine = ServerEngine::connect("http://127.0.0.1:9099/")
        .unwrap()
        .with_launch_command(CommandLine::new("sleep").arg("30"))
        // The fake server never listens; skip the readiness probe.
        .with_ready_timeout(Duration::ZERO);

    engine.start().unwrap();
    engine.start().unwrap();
    engine.stop().unwrap();
    engine.stop().unwrap();
}

#[test]
fn render_posts_source_and_returns_response_body() {
    const BODY: &[u8] = b"<svg width=\"62pt\"></svg>";
    let (addr, handle) = spawn_stub_server("200 OK", BODY);

    let engine = ServerEngine::connect(&format!("http://{addr}/")).unwrap();
    let rendered = engine
        .render(&RenderRequest::new("graph g {a--b}", Format::Svg))
        .unwrap();
    assert_eq!(rendered.bytes(), BODY);

    let request = handle.join().unwrap();
    let request_text = String::from_utf8_lossy(&request);
    assert!(
        request_text.starts_with("POST /render/svg HTTP/1.1"),
        "got request: {request_text}"
    );
    assert!(request_text.ends_with("graph g {a--b}"));
}

#[test]
fn http_error_status_is_a_server_error() {
    let (addr, handle) = spawn_stub_server("500 Internal Server Error", b"boom");

    let engine = ServerEngine::connect(&format!("http://{addr}/")).unwrap();
    let err = engine
        .render(&RenderRequest::new("graph g {", Format::Svg))
        .unwrap_err();
    assert!(matches!(err, Error::Server { .. }), "got {err:?}");

    handle.join().unwrap();
}
