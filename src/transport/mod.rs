//! Built-in reference transport.
//!
//! The router itself is transport-agnostic: any host that owns sockets
//! calls [`crate::Router::dispatch`] with its own sink and request. The
//! modules here make `run`/`run_tls` work standalone with a blocking
//! HTTP/1.1 server.

pub(crate) mod http1;
pub(crate) mod tls;
mod worker;

use parking_lot::Mutex;
use std::fmt;
use std::io;
use std::net::{SocketAddr, TcpStream};
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

/// HTTP/2 tuning record. Consumed by the transport layer only; dispatch
/// never reads it. The built-in HTTP/1.1 transport maps `idle_timeout`
/// to socket read timeouts and `max_upload_buffer_per_connection` to the
/// request body cap.
#[derive(Debug, Clone)]
pub struct Http2Config {
    pub max_concurrent_streams: u32,
    pub max_read_frame_size: u32,
    pub idle_timeout: Duration,
    pub max_upload_buffer_per_connection: u32,
    pub max_upload_buffer_per_stream: u32,
}

impl Default for Http2Config {
    fn default() -> Self {
        Http2Config {
            max_concurrent_streams: 250,
            max_read_frame_size: 16384,
            idle_timeout: Duration::from_secs(120),
            max_upload_buffer_per_connection: 1 << 20,
            max_upload_buffer_per_stream: 1 << 20,
        }
    }
}

/// Failure starting or running a transport entry point.
#[derive(Debug)]
pub enum TransportError {
    Io(io::Error),
    Tls(rustls::Error),
    /// Certificate or key material could not be used.
    BadCertificate(String),
    /// The built-in transport does not implement HTTP/2 cleartext.
    H2cUnsupported,
}

impl fmt::Display for TransportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransportError::Io(err) => write!(f, "transport i/o error: {err}"),
            TransportError::Tls(err) => write!(f, "tls error: {err}"),
            TransportError::BadCertificate(msg) => write!(f, "bad certificate material: {msg}"),
            TransportError::H2cUnsupported => {
                f.write_str("h2c is not implemented by the built-in transport")
            }
        }
    }
}

impl std::error::Error for TransportError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            TransportError::Io(err) => Some(err),
            TransportError::Tls(err) => Some(err),
            _ => None,
        }
    }
}

impl From<io::Error> for TransportError {
    fn from(err: io::Error) -> Self {
        TransportError::Io(err)
    }
}

impl From<rustls::Error> for TransportError {
    fn from(err: rustls::Error) -> Self {
        TransportError::Tls(err)
    }
}

/// Shared serving state: the shutdown flag and the bound address used to
/// unblock the accept loop.
#[derive(Default)]
pub(crate) struct TransportState {
    shutting_down: AtomicBool,
    bound: Mutex<Option<SocketAddr>>,
}

impl TransportState {
    pub(crate) fn is_shutting_down(&self) -> bool {
        self.shutting_down.load(Ordering::Acquire)
    }

    pub(crate) fn request_shutdown(&self) {
        self.shutting_down.store(true, Ordering::Release);
        // wake the blocked accept with a throwaway connection
        let bound = *self.bound.lock();
        if let Some(addr) = bound {
            let _ = TcpStream::connect_timeout(&addr, Duration::from_millis(250));
        }
    }

    pub(crate) fn record_bound(&self, addr: SocketAddr) {
        *self.bound.lock() = Some(addr);
    }

    pub(crate) fn bound_addr(&self) -> Option<SocketAddr> {
        *self.bound.lock()
    }

    pub(crate) fn clear_bound(&self) {
        *self.bound.lock() = None;
        self.shutting_down.store(false, Ordering::Release);
    }
}
