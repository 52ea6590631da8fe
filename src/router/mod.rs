//! The router: per-method radix trees, the dispatch entry point, and the
//! 404/405/OPTIONS fallback policy.

pub mod errors;
mod group;
mod tree;

pub use errors::RegisterError;
pub use group::RouteGroup;

use crate::context::{Context, Handler, Params};
use crate::method::{Method, METHOD_COUNT};
use crate::pool::ContextPool;
use crate::request::Request;
use crate::response::ResponseSink;
use crate::transport::{self, Http2Config, TransportError, TransportState};
use std::path::Path;
use std::sync::Arc;
use tree::Node;

/// A request router.
///
/// Configure it fully — routes, middleware, fallbacks — before the first
/// request is dispatched; from then on it is shared immutably across
/// request threads. `GET /x` and `POST /x` live in independent trees.
pub struct Router {
    trees: [Option<Node>; METHOD_COUNT],
    middleware: Vec<Handler>,
    pool: ContextPool,
    not_found: Option<Handler>,
    method_not_allowed: Option<Handler>,
    /// Answer unrouted `OPTIONS` requests automatically with an `Allow`
    /// listing. On by default.
    pub handle_options: bool,
    /// HTTP/2 tuning handed through to the transport; dispatch never
    /// reads it.
    pub http2: Http2Config,
    pub(crate) state: TransportState,
}

impl Default for Router {
    fn default() -> Self {
        Router::new()
    }
}

impl Router {
    pub fn new() -> Router {
        Router {
            trees: Default::default(),
            middleware: Vec::new(),
            pool: ContextPool::default(),
            not_found: None,
            method_not_allowed: None,
            handle_options: true,
            http2: Http2Config::default(),
            state: TransportState::default(),
        }
    }

    /// Append router-level middleware. Runs before every matched route,
    /// in registration order.
    pub fn use_middleware<F>(&mut self, middleware: F)
    where
        F: Fn(&mut Context<'_>) + Send + Sync + 'static,
    {
        self.middleware.push(Arc::new(middleware));
    }

    /// Replace the fallback invoked when no route matches the path.
    pub fn set_not_found<F>(&mut self, handler: F)
    where
        F: Fn(&mut Context<'_>) + Send + Sync + 'static,
    {
        self.not_found = Some(Arc::new(handler));
    }

    /// Replace the fallback invoked when the path exists under other
    /// methods only.
    pub fn set_method_not_allowed<F>(&mut self, handler: F)
    where
        F: Fn(&mut Context<'_>) + Send + Sync + 'static,
    {
        self.method_not_allowed = Some(Arc::new(handler));
    }

    /// Register `handler` for `method` at `path`.
    pub fn route<F>(&mut self, method: Method, path: &str, handler: F) -> Result<(), RegisterError>
    where
        F: Fn(&mut Context<'_>) + Send + Sync + 'static,
    {
        self.add_route(method, path, Arc::new(handler))
    }

    pub fn get<F>(&mut self, path: &str, handler: F) -> Result<(), RegisterError>
    where
        F: Fn(&mut Context<'_>) + Send + Sync + 'static,
    {
        self.route(Method::Get, path, handler)
    }

    pub fn post<F>(&mut self, path: &str, handler: F) -> Result<(), RegisterError>
    where
        F: Fn(&mut Context<'_>) + Send + Sync + 'static,
    {
        self.route(Method::Post, path, handler)
    }

    pub fn put<F>(&mut self, path: &str, handler: F) -> Result<(), RegisterError>
    where
        F: Fn(&mut Context<'_>) + Send + Sync + 'static,
    {
        self.route(Method::Put, path, handler)
    }

    pub fn delete<F>(&mut self, path: &str, handler: F) -> Result<(), RegisterError>
    where
        F: Fn(&mut Context<'_>) + Send + Sync + 'static,
    {
        self.route(Method::Delete, path, handler)
    }

    pub fn patch<F>(&mut self, path: &str, handler: F) -> Result<(), RegisterError>
    where
        F: Fn(&mut Context<'_>) + Send + Sync + 'static,
    {
        self.route(Method::Patch, path, handler)
    }

    pub fn head<F>(&mut self, path: &str, handler: F) -> Result<(), RegisterError>
    where
        F: Fn(&mut Context<'_>) + Send + Sync + 'static,
    {
        self.route(Method::Head, path, handler)
    }

    pub fn options<F>(&mut self, path: &str, handler: F) -> Result<(), RegisterError>
    where
        F: Fn(&mut Context<'_>) + Send + Sync + 'static,
    {
        self.route(Method::Options, path, handler)
    }

    /// Register `handler` for every supported method.
    pub fn any<F>(&mut self, path: &str, handler: F) -> Result<(), RegisterError>
    where
        F: Fn(&mut Context<'_>) + Send + Sync + 'static,
    {
        let handler: Handler = Arc::new(handler);
        for method in Method::ALL {
            self.add_route(method, path, handler.clone())?;
        }
        Ok(())
    }

    pub(crate) fn add_route(
        &mut self,
        method: Method,
        path: &str,
        handler: Handler,
    ) -> Result<(), RegisterError> {
        if !path.starts_with('/') {
            return Err(RegisterError::PathMissingLeadingSlash {
                path: path.to_string(),
            });
        }
        tracing::trace!(method = %method, path = %path, "register route");
        let root = self.trees[method.index()].get_or_insert_with(Node::default);
        root.add_route(path, handler)
    }

    /// Dispatch one decoded request. This is the single callable the
    /// transport invokes per request; hosts with their own transport call
    /// it directly.
    pub fn dispatch(&self, writer: &mut dyn ResponseSink, request: &mut Request) {
        let method = request.method();
        let mut parts = self.pool.acquire();

        let handler = match &self.trees[method.index()] {
            Some(root) => {
                let handler = root.get_value(request.path(), &mut parts.params).cloned();
                if handler.is_none() {
                    parts.params.clear();
                }
                handler
            }
            None => None,
        };

        let mut c = Context::from_parts(writer, request, parts);

        if let Some(handler) = handler {
            c.handlers.reserve(self.middleware.len() + 1);
            c.handlers.extend(self.middleware.iter().cloned());
            c.handlers.push(handler);
            c.next();
        } else if method == Method::Options && self.handle_options {
            self.auto_options(&mut c);
        } else if let Some(allow) = self.allowed(c.path(), Some(method)) {
            tracing::trace!(method = %method, path = %c.path(), "method not allowed");
            match &self.method_not_allowed {
                Some(hook) => {
                    c.handlers.push(hook.clone());
                    c.next();
                }
                None => {
                    c.set_header("Allow", &allow);
                    fallback_write(&mut c, 405, "Method Not Allowed");
                }
            }
        } else {
            tracing::trace!(method = %method, path = %c.path(), "no route");
            match &self.not_found {
                Some(hook) => {
                    c.handlers.push(hook.clone());
                    c.next();
                }
                None => fallback_write(&mut c, 404, "404 page not found"),
            }
        }

        self.pool.release(c.into_parts());
    }

    fn auto_options(&self, c: &mut Context<'_>) {
        match self.allowed(c.path(), None) {
            Some(allow) => {
                c.set_header("Allow", &allow);
                c.status(204);
            }
            None => {
                c.status(404);
            }
        }
    }

    /// Comma-separated listing of the methods whose trees hold a handler
    /// for `path`, or `None` when no tree does.
    fn allowed(&self, path: &str, skip: Option<Method>) -> Option<String> {
        let mut scratch = Params::default();
        let mut allow = String::new();
        for method in Method::ALL {
            if Some(method) == skip {
                continue;
            }
            let Some(root) = &self.trees[method.index()] else {
                continue;
            };
            scratch.clear();
            if root.get_value(path, &mut scratch).is_some() {
                if !allow.is_empty() {
                    allow.push_str(", ");
                }
                allow.push_str(method.as_str());
            }
        }
        if allow.is_empty() {
            None
        } else {
            Some(allow)
        }
    }

    // --- transport entry points ---

    /// Serve plain HTTP/1.1 on `addr` with the built-in transport. Blocks
    /// until [`Router::shutdown`] is called from another thread.
    pub fn run(self: Arc<Self>, addr: &str) -> Result<(), TransportError> {
        transport::http1::serve(self, addr)
    }

    /// Serve HTTP/1.1 over TLS (rustls) on `addr`. PEM certificate chain
    /// and private key are read from the given files.
    pub fn run_tls(
        self: Arc<Self>,
        addr: &str,
        cert_file: impl AsRef<Path>,
        key_file: impl AsRef<Path>,
    ) -> Result<(), TransportError> {
        transport::tls::serve(self, addr, cert_file.as_ref(), key_file.as_ref())
    }

    /// HTTP/2 cleartext is not implemented by the built-in transport;
    /// embed the router behind a host transport and call
    /// [`Router::dispatch`] instead.
    pub fn run_h2c(self: Arc<Self>, _addr: &str) -> Result<(), TransportError> {
        tracing::warn!("built-in transport speaks HTTP/1.1 only; h2c needs a host transport");
        Err(TransportError::H2cUnsupported)
    }

    /// Stop the accept loop of a running `run`/`run_tls` call. In-flight
    /// connections drain before the serving call returns.
    pub fn shutdown(&self) {
        self.state.request_shutdown();
    }

    /// The address the built-in transport is currently bound to.
    pub fn local_addr(&self) -> Option<std::net::SocketAddr> {
        self.state.bound_addr()
    }
}

fn fallback_write(c: &mut Context<'_>, code: u16, body: &str) {
    if let Err(err) = c.string(code, format_args!("{body}")) {
        tracing::debug!(error = %err, code, "fallback response failed");
    }
}
