//! Per-request context: captured parameters, chain control, response
//! helpers, cancellation, and the inter-handler attachment store.

use crate::cancel::{CancelGuard, CancelHandle, CancelReason};
use crate::pool::PooledParts;
use crate::request::Request;
use crate::response::{BodyWriter, PushError, ResponseSink};
use hashbrown::HashMap;
use serde::Serialize;
use smallvec::SmallVec;
use std::any::Any;
use std::fmt;
use std::io::{self, Read, Write};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// A route handler or middleware. The canonical middleware shape is
/// pre-work, [`Context::next`], post-work; a handler that calls neither
/// `next` nor `abort` ends the chain when it returns.
pub type Handler = Arc<dyn Fn(&mut Context<'_>) + Send + Sync>;

/// Path parameters captured during route matching.
#[derive(Debug, Default)]
pub struct Params {
    entries: SmallVec<[(String, String); 4]>,
}

impl Params {
    pub fn get(&self, name: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(n, v)| (n.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub(crate) fn push(&mut self, name: String, value: String) {
        self.entries.push((name, value));
    }

    pub(crate) fn clear(&mut self) {
        self.entries.clear();
    }
}

#[derive(Debug, Default)]
pub(crate) struct QueryCache {
    pairs: Vec<(String, String)>,
    parsed: bool,
}

impl QueryCache {
    pub(crate) fn clear(&mut self) {
        self.pairs.clear();
        self.parsed = false;
    }
}

pub(crate) type Attachments = HashMap<String, Box<dyn Any + Send + Sync>>;

/// The per-request state container.
///
/// A context borrows the response sink and the request for the duration of
/// one dispatch; it cannot escape the handler chain. Its reusable
/// allocations come from the router's pool and are reset on acquisition.
pub struct Context<'a> {
    writer: &'a mut dyn ResponseSink,
    request: &'a mut Request,
    cancel: CancelHandle,
    pub(crate) params: Params,
    pub(crate) handlers: Vec<Handler>,
    pub(crate) cursor: isize,
    query: QueryCache,
    values: Attachments,
    status: u16,
}

impl<'a> Context<'a> {
    pub(crate) fn from_parts(
        writer: &'a mut dyn ResponseSink,
        request: &'a mut Request,
        parts: PooledParts,
    ) -> Context<'a> {
        let cancel = request.cancel().clone();
        Context {
            writer,
            request,
            cancel,
            params: parts.params,
            handlers: parts.handlers,
            cursor: -1,
            query: parts.query,
            values: parts.values,
            status: 200,
        }
    }

    pub(crate) fn into_parts(self) -> PooledParts {
        PooledParts {
            params: self.params,
            handlers: self.handlers,
            query: self.query,
            values: self.values,
        }
    }

    // --- chain control ---

    /// Invoke the next handler in the chain, if any. Returns once that
    /// handler (and everything it invoked) has returned.
    pub fn next(&mut self) {
        self.cursor += 1;
        let idx = self.cursor as usize;
        if let Some(handler) = self.handlers.get(idx).cloned() {
            handler(self);
        }
    }

    /// Prevent any remaining handler from running. The current handler
    /// finishes normally.
    pub fn abort(&mut self) {
        self.cursor = self.handlers.len() as isize;
    }

    /// Abort and stage `code`.
    pub fn abort_with_status(&mut self, code: u16) {
        self.status(code);
        self.abort();
    }

    /// Abort and send a JSON body with `code`.
    pub fn abort_with_json<T: Serialize + ?Sized>(&mut self, code: u16, body: &T) {
        self.abort();
        if let Err(err) = self.json(code, body) {
            tracing::debug!(error = %err, "abort response failed");
        }
    }

    // --- request accessors ---

    pub fn method(&self) -> crate::Method {
        self.request.method()
    }

    pub fn path(&self) -> &str {
        self.request.path()
    }

    /// Path plus raw query, as received.
    pub fn full_path(&self) -> String {
        self.request.full_path()
    }

    pub fn request(&self) -> &Request {
        self.request
    }

    /// Captured path parameter, keyed by wildcard name without its sigil.
    pub fn param(&self, name: &str) -> Option<&str> {
        self.params.get(name)
    }

    pub fn params(&self) -> &Params {
        &self.params
    }

    /// First request header value for `name` (case-insensitive).
    pub fn header(&self, name: &str) -> Option<&str> {
        self.request.headers().get(name)
    }

    pub fn content_type(&self) -> &str {
        self.header("Content-Type").unwrap_or("")
    }

    pub fn is_json(&self) -> bool {
        self.content_type().contains("application/json")
    }

    pub fn is_xml(&self) -> bool {
        let ct = self.content_type();
        ct.contains("application/xml") || ct.contains("text/xml")
    }

    pub fn is_form(&self) -> bool {
        let ct = self.content_type();
        ct.contains("application/x-www-form-urlencoded") || ct.contains("multipart/form-data")
    }

    /// Client address: first `X-Forwarded-For` element, then `X-Real-IP`,
    /// then the remote address with any `:port` suffix stripped.
    pub fn client_ip(&self) -> String {
        if let Some(forwarded) = self.header("X-Forwarded-For") {
            let first = forwarded.split(',').next().unwrap_or("").trim();
            if !first.is_empty() {
                return first.to_string();
            }
        }
        if let Some(ip) = self.header("X-Real-IP") {
            if !ip.is_empty() {
                return ip.to_string();
            }
        }
        let remote = self.request.remote_addr();
        match remote.rfind(':') {
            Some(idx) => remote[..idx].to_string(),
            None => remote.to_string(),
        }
    }

    // --- query ---

    fn parse_query(&mut self) {
        if self.query.parsed {
            return;
        }
        self.query.parsed = true;
        for (name, value) in url::form_urlencoded::parse(self.request.raw_query().as_bytes()) {
            self.query
                .pairs
                .push((name.into_owned(), value.into_owned()));
        }
    }

    /// First query value for `key`. The query string is parsed on first
    /// access and cached for the rest of the request.
    pub fn query(&mut self, key: &str) -> Option<&str> {
        self.parse_query();
        self.query
            .pairs
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn query_default(&mut self, key: &str, default: &str) -> String {
        match self.query(key) {
            Some(value) if !value.is_empty() => value.to_string(),
            _ => default.to_string(),
        }
    }

    pub fn query_int(&mut self, key: &str, default: i64) -> i64 {
        self.query(key)
            .and_then(|value| value.parse().ok())
            .unwrap_or(default)
    }

    pub fn query_bool(&mut self, key: &str, default: bool) -> bool {
        self.query(key).and_then(parse_bool).unwrap_or(default)
    }

    /// Every query value registered under `key`.
    pub fn query_array(&mut self, key: &str) -> Vec<String> {
        self.parse_query();
        self.query
            .pairs
            .iter()
            .filter(|(k, _)| k == key)
            .map(|(_, v)| v.clone())
            .collect()
    }

    // --- body ---

    /// Read the raw body to its end. The body is a one-shot stream; a
    /// second call yields an empty buffer.
    pub fn body(&mut self) -> io::Result<Vec<u8>> {
        let mut buf = Vec::new();
        if let Some(mut reader) = self.request.take_body() {
            reader.read_to_end(&mut buf)?;
        }
        Ok(buf)
    }

    /// Decode the body as JSON into `T`. Consumes the body stream.
    pub fn bind_json<T: serde::de::DeserializeOwned>(&mut self) -> serde_json::Result<T> {
        match self.request.take_body() {
            Some(reader) => serde_json::from_reader(reader),
            None => serde_json::from_reader(io::empty()),
        }
    }

    // --- response ---

    /// Stage the response status. The transport commits it with the
    /// headers at the first body byte.
    pub fn status(&mut self, code: u16) -> &mut Self {
        self.status = code;
        self.writer.write_status(code);
        self
    }

    /// The status most recently staged for this request. Middleware reads
    /// this after `next` to observe what the handler wrote.
    pub fn status_code(&self) -> u16 {
        self.status
    }

    pub fn set_header(&mut self, name: &str, value: &str) {
        self.writer.set_header(name, value);
    }

    /// Send a JSON response.
    pub fn json<T: Serialize + ?Sized>(&mut self, code: u16, body: &T) -> serde_json::Result<()> {
        self.set_header("Content-Type", "application/json; charset=utf-8");
        self.status(code);
        serde_json::to_writer(BodyWriter(&mut *self.writer), body)
    }

    /// Send a plain-text response built from format arguments:
    /// `c.string(200, format_args!("hello {name}"))`.
    pub fn string(&mut self, code: u16, args: fmt::Arguments<'_>) -> io::Result<()> {
        self.set_header("Content-Type", "text/plain; charset=utf-8");
        self.status(code);
        BodyWriter(&mut *self.writer).write_fmt(args)
    }

    /// Send an HTML response.
    pub fn html(&mut self, code: u16, html: &str) -> io::Result<()> {
        self.set_header("Content-Type", "text/html; charset=utf-8");
        self.status(code);
        self.writer.write_body(html.as_bytes())
    }

    /// Send raw bytes under an explicit content type.
    pub fn data(&mut self, code: u16, content_type: &str, body: &[u8]) -> io::Result<()> {
        self.set_header("Content-Type", content_type);
        self.status(code);
        self.writer.write_body(body)
    }

    /// Stage a redirect to `location`.
    pub fn redirect(&mut self, code: u16, location: &str) {
        self.set_header("Location", location);
        self.status(code);
    }

    /// Value of the request cookie `name`, percent-decoded.
    pub fn cookie(&self, name: &str) -> Option<String> {
        let header = self.header("Cookie")?;
        for parsed in cookie::Cookie::split_parse_encoded(header.to_string()) {
            if let Ok(parsed) = parsed {
                if parsed.name() == name {
                    return Some(parsed.value().to_string());
                }
            }
        }
        None
    }

    /// Append a `Set-Cookie` header. A `max_age` of zero leaves the cookie
    /// session-scoped; empty `path`/`domain` are omitted.
    pub fn set_cookie(
        &mut self,
        name: &str,
        value: &str,
        max_age: i64,
        path: &str,
        domain: &str,
        secure: bool,
        http_only: bool,
    ) {
        let mut cookie = cookie::Cookie::new(name.to_string(), value.to_string());
        if max_age != 0 {
            cookie.set_max_age(cookie::time::Duration::seconds(max_age));
        }
        if !path.is_empty() {
            cookie.set_path(path.to_string());
        }
        if !domain.is_empty() {
            cookie.set_domain(domain.to_string());
        }
        cookie.set_secure(secure);
        cookie.set_http_only(http_only);
        self.writer.add_header("Set-Cookie", &cookie.encoded().to_string());
    }

    /// Ask the transport to push `target`, when it is capable of it.
    pub fn push(&mut self, target: &str) -> Result<(), PushError> {
        match self.writer.pusher() {
            Some(pusher) => pusher.push(target).map_err(PushError::Io),
            None => Err(PushError::NotSupported),
        }
    }

    // --- attachments ---

    /// Store a value for handlers further down (or back up) the chain.
    pub fn set<V: Any + Send + Sync>(&mut self, key: impl Into<String>, value: V) {
        self.values.insert(key.into(), Box::new(value));
    }

    /// Retrieve an attachment stored with [`Context::set`].
    pub fn get<V: Any + Send + Sync>(&self, key: &str) -> Option<&V> {
        self.values.get(key).and_then(|value| value.downcast_ref())
    }

    // --- cancellation ---

    pub fn cancel_handle(&self) -> &CancelHandle {
        &self.cancel
    }

    pub fn is_done(&self) -> bool {
        self.cancel.is_done()
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.cancel.deadline()
    }

    pub fn err(&self) -> Option<CancelReason> {
        self.cancel.err()
    }

    /// Replace this request's handle with a child that fires after
    /// `timeout`. The returned guard must be invoked (or dropped) on every
    /// exit path.
    pub fn with_timeout(&mut self, timeout: Duration) -> CancelGuard {
        let (handle, guard) = self.cancel.with_timeout(timeout);
        self.install_cancel(handle);
        guard
    }

    /// Replace this request's handle with a child that fires at `deadline`.
    pub fn with_deadline(&mut self, deadline: Instant) -> CancelGuard {
        let (handle, guard) = self.cancel.with_deadline(deadline);
        self.install_cancel(handle);
        guard
    }

    /// Replace this request's handle with an explicitly cancellable child.
    pub fn with_cancel(&mut self) -> CancelGuard {
        let (handle, guard) = self.cancel.with_cancel();
        self.install_cancel(handle);
        guard
    }

    fn install_cancel(&mut self, handle: CancelHandle) {
        self.request.set_cancel(handle.clone());
        self.cancel = handle;
    }
}

// strconv-style boolean forms
fn parse_bool(value: &str) -> Option<bool> {
    match value {
        "1" | "t" | "T" | "true" | "TRUE" | "True" => Some(true),
        "0" | "f" | "F" | "false" | "FALSE" | "False" => Some(false),
        _ => None,
    }
}
