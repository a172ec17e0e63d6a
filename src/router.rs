//! Declarative route table.
//!
//! Each route is `(method, pattern, options, handler)`. Exact patterns live in
//! one radix tree per method and ignore trailing slashes; prefix patterns are
//! a short list checked with `starts_with` on the path as received, so
//! `/api/messages/` matches a `/api/messages/` prefix with an empty tail.
//! Options say who may call the route and how its body is framed, so the
//! dispatcher can gate and read before the handler ever runs.

use std::collections::HashMap;
use std::sync::Arc;

use matchit::Router as MatchitRouter;

use crate::handler::{BoxedHandler, Handler};
use crate::method::Method;

/// Who may invoke a route.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub enum Access {
    #[default]
    Public,
    /// Requires a credential accepted by the configured
    /// [`AdminGate`](crate::auth::AdminGate).
    Admin,
}

/// How the request body is acquired before the handler runs.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub enum BodyPolicy {
    /// The body is not read.
    #[default]
    Empty,
    /// `content-length` or chunked transfer encoding.
    Framed,
    /// `content-length` only.
    DeclaredLength,
}

/// Per-route options. `RouteOptions::default()` is public with no body.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct RouteOptions {
    pub access: Access,
    pub body: BodyPolicy,
}

impl RouteOptions {
    pub fn admin(mut self) -> Self {
        self.access = Access::Admin;
        self
    }

    pub fn body(mut self, policy: BodyPolicy) -> Self {
        self.body = policy;
        self
    }
}

struct Endpoint<S> {
    handler: BoxedHandler<S>,
    options: RouteOptions,
}

impl<S> Endpoint<S> {
    fn matched(&self) -> Matched<S> {
        Matched { handler: Arc::clone(&self.handler), options: self.options }
    }
}

/// A successful lookup.
pub(crate) struct Matched<S> {
    pub(crate) handler: BoxedHandler<S>,
    pub(crate) options: RouteOptions,
}

/// The application router over shared state `S`.
///
/// Build it once at startup. Each registration returns `self` so calls chain.
pub struct Router<S> {
    exact: HashMap<Method, MatchitRouter<Endpoint<S>>>,
    prefixes: Vec<(Method, String, Endpoint<S>)>,
}

impl<S: Send + Sync + 'static> Router<S> {
    pub fn new() -> Self {
        Self { exact: HashMap::new(), prefixes: Vec::new() }
    }

    /// Public route without a body.
    ///
    /// ```rust,ignore
    /// Router::new()
    ///     .on(Method::Get, "/api/health", health::status)
    ///     .on(Method::Get, "/api/messages", messages::list);
    /// ```
    pub fn on(self, method: Method, path: &str, handler: impl Handler<S>) -> Self {
        self.on_with(method, path, RouteOptions::default(), handler)
    }

    /// Exact route with explicit options.
    ///
    /// # Panics
    ///
    /// Panics on an invalid or conflicting pattern; routes are static, so this
    /// is a programming error caught at startup.
    pub fn on_with(
        mut self,
        method: Method,
        path: &str,
        options: RouteOptions,
        handler: impl Handler<S>,
    ) -> Self {
        let endpoint = Endpoint { handler: handler.into_boxed_handler(), options };
        self.exact
            .entry(method)
            .or_default()
            .insert(path, endpoint)
            .unwrap_or_else(|e| panic!("invalid route `{path}`: {e}"));
        self
    }

    /// Route matching every path that starts with `prefix`.
    pub fn prefix_with(
        mut self,
        method: Method,
        prefix: &str,
        options: RouteOptions,
        handler: impl Handler<S>,
    ) -> Self {
        let endpoint = Endpoint { handler: handler.into_boxed_handler(), options };
        self.prefixes.push((method, prefix.to_owned(), endpoint));
        self
    }

    /// Looks `path` up. Exact routes, compared with trailing slashes ignored,
    /// win over prefix routes; among prefixes the first registered wins.
    pub(crate) fn lookup(&self, method: Method, path: &str) -> Option<Matched<S>> {
        let trimmed = match path.trim_end_matches('/') {
            "" => "/",
            p => p,
        };

        if let Some(matched) = self.exact.get(&method).and_then(|tree| tree.at(trimmed).ok()) {
            return Some(matched.value.matched());
        }

        self.prefixes
            .iter()
            .find(|(m, prefix, _)| *m == method && path.starts_with(prefix.as_str()))
            .map(|(_, _, endpoint)| endpoint.matched())
    }
}

impl<S: Send + Sync + 'static> Default for Router<S> {
    fn default() -> Self { Self::new() }
}
