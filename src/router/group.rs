//! Route groups: a registration-time prefix plus middleware stack.

use super::Router;
use crate::context::{Context, Handler};
use crate::method::Method;
use crate::router::errors::RegisterError;
use std::sync::Arc;

/// A virtual prefix and middleware bundle. Groups never own routes; on
/// registration they bake their middleware stack into a closure and hand
/// it to the router at `prefix + path`. Groups are short-lived builders —
/// create them, register through them, drop them.
///
/// A nested group snapshots its parent's stack at creation; middleware
/// added to the parent afterwards does not reach it.
pub struct RouteGroup<'r> {
    router: &'r mut Router,
    prefix: String,
    middleware: Vec<Handler>,
}

impl Router {
    /// Create a top-level route group under `prefix`.
    pub fn group(&mut self, prefix: &str) -> RouteGroup<'_> {
        RouteGroup {
            router: self,
            prefix: prefix.to_string(),
            middleware: Vec::new(),
        }
    }
}

impl RouteGroup<'_> {
    /// Create a nested group. Prefixes concatenate; the parent's
    /// middleware stack is inherited.
    pub fn group(&mut self, prefix: &str) -> RouteGroup<'_> {
        RouteGroup {
            prefix: format!("{}{}", self.prefix, prefix),
            middleware: self.middleware.clone(),
            router: &mut *self.router,
        }
    }

    /// Append middleware to this group's own stack.
    pub fn use_middleware<F>(&mut self, middleware: F)
    where
        F: Fn(&mut Context<'_>) + Send + Sync + 'static,
    {
        self.middleware.push(Arc::new(middleware));
    }

    /// Register `handler` for `method` at `prefix + path`.
    pub fn route<F>(&mut self, method: Method, path: &str, handler: F) -> Result<(), RegisterError>
    where
        F: Fn(&mut Context<'_>) + Send + Sync + 'static,
    {
        self.route_handler(method, path, Arc::new(handler))
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
            self.route_handler(method, path, handler.clone())?;
        }
        Ok(())
    }

    fn route_handler(
        &mut self,
        method: Method,
        path: &str,
        handler: Handler,
    ) -> Result<(), RegisterError> {
        let full_path = format!("{}{}", self.prefix, path);

        let mut chain: Vec<Handler> = Vec::with_capacity(self.middleware.len() + 1);
        chain.extend(self.middleware.iter().cloned());
        chain.push(handler);
        let chain: Arc<[Handler]> = chain.into();

        // Run the group chain as its own flat chain, then restore the
        // outer one so the router's cursor keeps working.
        let composed: Handler = Arc::new(move |c: &mut Context<'_>| {
            let saved_handlers = std::mem::replace(&mut c.handlers, chain.to_vec());
            let saved_cursor = c.cursor;
            c.cursor = -1;
            c.next();
            c.handlers = saved_handlers;
            c.cursor = saved_cursor;
        });

        self.router.add_route(method, &full_path, composed)
    }
}
