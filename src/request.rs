//! Decoded request handed to the router by the transport.

use crate::cancel::CancelHandle;
use crate::method::Method;
use std::fmt;
use std::io::Read;

/// Request header collection. Lookup is case-insensitive; insertion order
/// is preserved.
#[derive(Debug, Default)]
pub struct Headers {
    entries: Vec<(String, String)>,
}

impl Headers {
    pub fn new() -> Self {
        Headers::default()
    }

    /// Append a header, keeping any previous values for the same name.
    pub fn append(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.entries.push((name.into(), value.into()));
    }

    /// First value for `name`, compared case-insensitively.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// Every value for `name`, in insertion order.
    pub fn get_all<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a str> + 'a {
        self.entries
            .iter()
            .filter(move |(n, _)| n.eq_ignore_ascii_case(name))
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
}

/// A decoded HTTP request.
///
/// Built by the transport (or directly by tests). The path must already be
/// percent-decoded; the router matches the bytes it is given.
pub struct Request {
    method: Method,
    path: String,
    raw_query: String,
    headers: Headers,
    remote_addr: String,
    body: Option<Box<dyn Read + Send>>,
    cancel: CancelHandle,
}

impl Request {
    /// Create a request from a method and a target of the form
    /// `/path` or `/path?raw=query`.
    pub fn new(method: Method, target: &str) -> Self {
        let (path, raw_query) = match target.split_once('?') {
            Some((p, q)) => (p.to_string(), q.to_string()),
            None => (target.to_string(), String::new()),
        };
        Request {
            method,
            path,
            raw_query,
            headers: Headers::new(),
            remote_addr: String::new(),
            body: None,
            cancel: CancelHandle::root(),
        }
    }

    /// Create a request from an already-split path and raw query. For
    /// transports that decode the path themselves (a decoded path may
    /// legitimately contain `?`).
    pub fn from_parts(method: Method, path: String, raw_query: String) -> Self {
        Request {
            method,
            path,
            raw_query,
            headers: Headers::new(),
            remote_addr: String::new(),
            body: None,
            cancel: CancelHandle::root(),
        }
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.append(name, value);
        self
    }

    pub fn with_remote_addr(mut self, addr: impl Into<String>) -> Self {
        self.remote_addr = addr.into();
        self
    }

    pub fn with_body(mut self, body: impl Read + Send + 'static) -> Self {
        self.body = Some(Box::new(body));
        self
    }

    pub fn with_cancel(mut self, cancel: CancelHandle) -> Self {
        self.cancel = cancel;
        self
    }

    pub fn method(&self) -> Method {
        self.method
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn raw_query(&self) -> &str {
        &self.raw_query
    }

    /// Path plus raw query, as received.
    pub fn full_path(&self) -> String {
        if self.raw_query.is_empty() {
            self.path.clone()
        } else {
            format!("{}?{}", self.path, self.raw_query)
        }
    }

    pub fn headers(&self) -> &Headers {
        &self.headers
    }

    pub fn headers_mut(&mut self) -> &mut Headers {
        &mut self.headers
    }

    pub fn remote_addr(&self) -> &str {
        &self.remote_addr
    }

    pub fn cancel(&self) -> &CancelHandle {
        &self.cancel
    }

    pub(crate) fn set_cancel(&mut self, cancel: CancelHandle) {
        self.cancel = cancel;
    }

    /// Take the body stream. Subsequent calls return `None`; the body can
    /// be consumed once.
    pub fn take_body(&mut self) -> Option<Box<dyn Read + Send>> {
        self.body.take()
    }
}

impl fmt::Debug for Request {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Request")
            .field("method", &self.method)
            .field("path", &self.path)
            .field("raw_query", &self.raw_query)
            .field("remote_addr", &self.remote_addr)
            .field("headers", &self.headers.len())
            .field("has_body", &self.body.is_some())
            .finish()
    }
}
