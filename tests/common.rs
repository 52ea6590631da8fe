#![allow(dead_code)]

use std::io;
use switchyard::{Method, Request, ResponseSink, Router, ServerPush};

/// In-memory response sink recording everything the router writes.
pub struct MockSink {
    pub status: u16,
    pub headers: Vec<(String, String)>,
    pub body: Vec<u8>,
    pub push_targets: Vec<String>,
    pub support_push: bool,
}

impl MockSink {
    pub fn new() -> MockSink {
        MockSink {
            status: 200,
            headers: Vec::new(),
            body: Vec::new(),
            push_targets: Vec::new(),
            support_push: false,
        }
    }

    pub fn with_push() -> MockSink {
        MockSink {
            support_push: true,
            ..MockSink::new()
        }
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    pub fn body_str(&self) -> &str {
        std::str::from_utf8(&self.body).expect("response body was not utf-8")
    }
}

impl ResponseSink for MockSink {
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

    fn pusher(&mut self) -> Option<&mut dyn ServerPush> {
        if self.support_push {
            Some(self)
        } else {
            None
        }
    }
}

impl ServerPush for MockSink {
    fn push(&mut self, target: &str) -> io::Result<()> {
        self.push_targets.push(target.to_string());
        Ok(())
    }
}

/// Dispatch a bare request and return the recorded response.
pub fn dispatch(router: &Router, method: Method, target: &str) -> MockSink {
    let mut request = Request::new(method, target);
    dispatch_request(router, &mut request)
}

pub fn dispatch_request(router: &Router, request: &mut Request) -> MockSink {
    let mut sink = MockSink::new();
    router.dispatch(&mut sink, request);
    sink
}
