//! Blocking HTTP/1.1 connection handling.
//!
//! One request per connection (`Connection: close`). The request body is
//! buffered up front and handed to the router as a stream; the response is
//! buffered in the sink and committed — status line, headers, body — when
//! dispatch returns.

use super::worker::WorkerPool;
use super::TransportError;
use crate::method::Method;
use crate::request::Request;
use crate::response::ResponseSink;
use crate::router::Router;
use percent_encoding::percent_decode_str;
use std::io::{self, BufRead, BufReader, Cursor, Read, Write};
use std::net::TcpListener;
use std::sync::Arc;

const MAX_HEADERS: usize = 100;

pub(crate) fn serve(router: Arc<Router>, addr: &str) -> Result<(), TransportError> {
    let listener = TcpListener::bind(addr)?;
    let local = listener.local_addr()?;
    router.state.record_bound(local);
    let pool = WorkerPool::new(WorkerPool::default_size());
    tracing::info!(addr = %local, "http/1.1 transport listening");

    loop {
        let (stream, peer) = match listener.accept() {
            Ok(pair) => pair,
            Err(err) => {
                if router.state.is_shutting_down() {
                    break;
                }
                tracing::error!(error = %err, "accept failed");
                continue;
            }
        };
        if router.state.is_shutting_down() {
            break;
        }

        let _ = stream.set_read_timeout(Some(router.http2.idle_timeout));
        let peer = peer.to_string();
        let router = Arc::clone(&router);
        pool.execute(Box::new(move || {
            if let Err(err) = handle_connection(stream, peer, &router) {
                tracing::debug!(error = %err, "connection failed");
            }
        }));
    }

    pool.shutdown();
    router.state.clear_bound();
    tracing::info!("http/1.1 transport stopped");
    Ok(())
}

enum ReadOutcome {
    Request(Request),
    Reject(u16, &'static str),
    Eof,
}

pub(crate) fn handle_connection<S: Read + Write>(
    mut stream: S,
    peer: String,
    router: &Router,
) -> io::Result<()> {
    let max_body = router.http2.max_upload_buffer_per_connection as usize;
    match read_request(&mut stream, peer, max_body)? {
        ReadOutcome::Eof => Ok(()),
        ReadOutcome::Reject(code, reason) => {
            let mut sink = BufferedSink::new();
            sink.write_status(code);
            sink.write_body(reason.as_bytes())?;
            sink.finish(&mut stream)
        }
        ReadOutcome::Request(mut request) => {
            let mut sink = BufferedSink::new();
            router.dispatch(&mut sink, &mut request);
            sink.finish(&mut stream)
        }
    }
}

fn read_request<S: Read>(stream: &mut S, peer: String, max_body: usize) -> io::Result<ReadOutcome> {
    let mut reader = BufReader::new(stream);

    let mut line = String::new();
    if reader.read_line(&mut line)? == 0 {
        return Ok(ReadOutcome::Eof);
    }
    let mut parts = line.trim_end().split_whitespace();
    let (Some(method), Some(target), Some(version)) = (parts.next(), parts.next(), parts.next())
    else {
        return Ok(ReadOutcome::Reject(400, "Bad Request"));
    };
    if !version.starts_with("HTTP/1.") {
        return Ok(ReadOutcome::Reject(505, "HTTP Version Not Supported"));
    }
    let Some(method) = Method::parse(method) else {
        return Ok(ReadOutcome::Reject(501, "Not Implemented"));
    };

    // the router matches decoded path bytes; the raw query stays raw
    let (raw_path, raw_query) = match target.split_once('?') {
        Some((p, q)) => (p, q),
        None => (target, ""),
    };
    let Ok(path) = percent_decode_str(raw_path).decode_utf8() else {
        return Ok(ReadOutcome::Reject(400, "Bad Request"));
    };

    let mut request =
        Request::from_parts(method, path.into_owned(), raw_query.to_string()).with_remote_addr(peer);

    let mut seen = 0usize;
    loop {
        line.clear();
        if reader.read_line(&mut line)? == 0 {
            return Ok(ReadOutcome::Reject(400, "Bad Request"));
        }
        let trimmed = line.trim_end();
        if trimmed.is_empty() {
            break;
        }
        seen += 1;
        if seen > MAX_HEADERS {
            return Ok(ReadOutcome::Reject(431, "Request Header Fields Too Large"));
        }
        let Some((name, value)) = trimmed.split_once(':') else {
            return Ok(ReadOutcome::Reject(400, "Bad Request"));
        };
        request
            .headers_mut()
            .append(name.trim().to_string(), value.trim().to_string());
    }

    let content_length = request
        .headers()
        .get("Content-Length")
        .and_then(|v| v.parse::<usize>().ok())
        .unwrap_or(0);
    if content_length > max_body {
        return Ok(ReadOutcome::Reject(413, "Payload Too Large"));
    }
    if content_length > 0 {
        let mut body = vec![0u8; content_length];
        reader.read_exact(&mut body)?;
        request = request.with_body(Cursor::new(body));
    }

    Ok(ReadOutcome::Request(request))
}

/// Buffers the response and commits it in one write when dispatch is done.
/// The last status staged before the first body byte wins.
pub(crate) struct BufferedSink {
    status: u16,
    headers: Vec<(String, String)>,
    body: Vec<u8>,
}

impl BufferedSink {
    pub(crate) fn new() -> BufferedSink {
        BufferedSink {
            status: 200,
            headers: Vec::new(),
            body: Vec::new(),
        }
    }

    pub(crate) fn finish(self, w: &mut impl Write) -> io::Result<()> {
        write!(w, "HTTP/1.1 {} {}\r\n", self.status, reason_phrase(self.status))?;
        let mut has_length = false;
        let mut has_connection = false;
        for (name, value) in &self.headers {
            if name.eq_ignore_ascii_case("Content-Length") {
                has_length = true;
            }
            if name.eq_ignore_ascii_case("Connection") {
                has_connection = true;
            }
            write!(w, "{name}: {value}\r\n")?;
        }
        if !has_length {
            write!(w, "Content-Length: {}\r\n", self.body.len())?;
        }
        if !has_connection {
            w.write_all(b"Connection: close\r\n")?;
        }
        w.write_all(b"\r\n")?;
        w.write_all(&self.body)?;
        w.flush()
    }
}

impl ResponseSink for BufferedSink {
    fn write_status(&mut self, code: u16) {
        if self.body.is_empty() {
            self.status = code;
        }
    }

    fn set_header(&mut self, name: &str, value: &str) {
        match self
            .headers
            .iter_mut()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
        {
            Some(entry) => entry.1 = value.to_string(),
            None => self.headers.push((name.to_string(), value.to_string())),
        }
    }

    fn add_header(&mut self, name: &str, value: &str) {
        self.headers.push((name.to_string(), value.to_string()));
    }

    fn write_body(&mut self, chunk: &[u8]) -> io::Result<()> {
        self.body.extend_from_slice(chunk);
        Ok(())
    }
}

fn reason_phrase(code: u16) -> &'static str {
    match code {
        200 => "OK",
        201 => "Created",
        202 => "Accepted",
        204 => "No Content",
        301 => "Moved Permanently",
        302 => "Found",
        304 => "Not Modified",
        307 => "Temporary Redirect",
        308 => "Permanent Redirect",
        400 => "Bad Request",
        401 => "Unauthorized",
        403 => "Forbidden",
        404 => "Not Found",
        405 => "Method Not Allowed",
        408 => "Request Timeout",
        413 => "Payload Too Large",
        429 => "Too Many Requests",
        431 => "Request Header Fields Too Large",
        500 => "Internal Server Error",
        501 => "Not Implemented",
        503 => "Service Unavailable",
        505 => "HTTP Version Not Supported",
        _ => "",
    }
}
