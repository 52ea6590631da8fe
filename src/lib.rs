//! Radix-tree HTTP request router.
//!
//! One compressed radix tree per method resolves a path to a handler and
//! its captured parameters in time proportional to the path length. A
//! matched route runs as a flat handler chain — router middleware, group
//! middleware, route handler — driven by a pooled per-request [`Context`].
//!
//! The router is transport-agnostic: a host that owns the sockets calls
//! [`Router::dispatch`] with its own [`ResponseSink`] and [`Request`]. The
//! built-in blocking HTTP/1.1 transport backs [`Router::run`] and
//! [`Router::run_tls`] for standalone use.
//!
//! ```no_run
//! use std::sync::Arc;
//! use switchyard::{middleware, Router};
//!
//! let mut router = Router::new();
//! router.use_middleware(middleware::logger());
//! router
//!     .get("/users/:id", |c| {
//!         let id = c.param("id").unwrap_or("").to_string();
//!         let _ = c.string(200, format_args!("user {id}"));
//!     })
//!     .unwrap();
//!
//! let mut api = router.group("/api");
//! api.use_middleware(middleware::secure());
//! api.get("/health", |c| {
//!     let _ = c.json(200, &serde_json::json!({"ok": true}));
//! })
//! .unwrap();
//! drop(api);
//!
//! Arc::new(router).run("127.0.0.1:8080").unwrap();
//! ```

pub mod cancel;
pub mod context;
pub mod method;
pub mod middleware;
pub mod request;
pub mod response;
pub mod router;
pub mod transport;

mod pool;

pub use cancel::{CancelGuard, CancelHandle, CancelReason};
pub use context::{Context, Handler, Params};
pub use method::Method;
pub use request::{Headers, Request};
pub use response::{PushError, ResponseSink, ServerPush};
pub use router::{RegisterError, RouteGroup, Router};
pub use transport::{Http2Config, TransportError};
