//! Response sink contract between the router and the transport.

use std::fmt;
use std::io;

/// Server-push capability, probed at runtime through
/// [`ResponseSink::pusher`].
pub trait ServerPush {
    /// Ask the transport to push `target` to the client.
    fn push(&mut self, target: &str) -> io::Result<()>;
}

/// Where a dispatched request writes its response.
///
/// Contract: `write_status` and `set_header`/`add_header` are only
/// meaningful before the first body byte; the last staged status wins.
/// The transport commits status and headers when the first body byte is
/// written (or when dispatch completes without a body).
pub trait ResponseSink: Send {
    /// Stage the response status code.
    fn write_status(&mut self, code: u16);

    /// Set a header, replacing any previous value for the same name.
    fn set_header(&mut self, name: &str, value: &str);

    /// Append a header, keeping previous values (`Set-Cookie` and friends).
    fn add_header(&mut self, name: &str, value: &str);

    /// Stream a chunk of body bytes.
    fn write_body(&mut self, chunk: &[u8]) -> io::Result<()>;

    /// Server-push capability, when the transport supports it.
    fn pusher(&mut self) -> Option<&mut dyn ServerPush> {
        None
    }
}

/// Error from [`crate::Context::push`].
#[derive(Debug)]
pub enum PushError {
    /// The response sink has no push capability.
    NotSupported,
    /// The transport accepted the push and then failed.
    Io(io::Error),
}

impl fmt::Display for PushError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PushError::NotSupported => f.write_str("server push not supported"),
            PushError::Io(err) => write!(f, "server push failed: {err}"),
        }
    }
}

impl std::error::Error for PushError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            PushError::NotSupported => None,
            PushError::Io(err) => Some(err),
        }
    }
}

impl From<io::Error> for PushError {
    fn from(err: io::Error) -> Self {
        PushError::Io(err)
    }
}

/// `io::Write` adapter over a sink, for streaming serializers.
pub(crate) struct BodyWriter<'a>(pub(crate) &'a mut dyn ResponseSink);

impl io::Write for BodyWriter<'_> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.write_body(buf)?;
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}
