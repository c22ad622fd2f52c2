use std::sync::Arc;

use http::Method;

use crate::{
    handler::{HandlerFunc, MiddlewareFunc},
    route::{
        info::{RouteInfo, RouteInfoData},
        router::normalize_path,
    },
};

/// A value that can be registered with a [`Router`](crate::Router).
///
/// The router calls [`to_route`](Routable::to_route) to obtain the handler
/// and middleware chain, and [`to_route_info`](Routable::to_route_info) —
/// after it has parsed the path for parameter names — to obtain the
/// [`RouteInfo`] it stores and later hands back on every match. Implementing
/// this trait on a custom type is the hook for attaching extra per-route
/// data to the registry.
pub trait Routable<C: 'static>: Send + Sync {
    /// The registration fields: method, path, name, handler and middleware.
    fn to_route(&self) -> Route<C>;

    /// Builds the [`RouteInfo`] stored for this route. `params` holds the
    /// parameter names extracted from the path, in occurrence order.
    fn to_route_info(&self, params: &[Arc<str>]) -> Arc<dyn RouteInfo>;

    /// Recreates this routable with a group path prefix and the group's
    /// middleware, which runs before the route's own.
    fn for_group(&self, prefix: &str, middlewares: &[MiddlewareFunc<C>]) -> Box<dyn Routable<C>>;
}

/// A plain route registration.
pub struct Route<C: 'static> {
    /// HTTP method to register the handler for.
    pub method: Method,
    /// Path pattern; `:name` captures a segment, a trailing `*` captures the
    /// rest of the path.
    pub path: String,
    /// Optional route name for lookup and reversal. Names may repeat.
    pub name: String,
    /// The handler. Registration fails without one.
    pub handler: Option<HandlerFunc<C>>,
    /// Middleware composed around the handler at registration time.
    pub middlewares: Vec<MiddlewareFunc<C>>,
}

impl<C: 'static> Route<C> {
    /// Creates a route for `method` and `path`.
    pub fn new(method: Method, path: impl Into<String>, handler: HandlerFunc<C>) -> Self {
        Self {
            method,
            path: path.into(),
            name: String::new(),
            handler: Some(handler),
            middlewares: Vec::new(),
        }
    }

    /// Sets the route name.
    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Appends a middleware to the route's own chain.
    #[must_use]
    pub fn with_middleware(mut self, middleware: MiddlewareFunc<C>) -> Self {
        self.middlewares.push(middleware);
        self
    }
}

impl<C: 'static> Clone for Route<C> {
    fn clone(&self) -> Self {
        Self {
            method: self.method.clone(),
            path: self.path.clone(),
            name: self.name.clone(),
            handler: self.handler.clone(),
            middlewares: self.middlewares.clone(),
        }
    }
}

impl<C: 'static> Routable<C> for Route<C> {
    fn to_route(&self) -> Route<C> {
        self.clone()
    }

    fn to_route_info(&self, params: &[Arc<str>]) -> Arc<dyn RouteInfo> {
        Arc::new(RouteInfoData::new(
            self.method.clone(),
            normalize_path(&self.path),
            self.name.as_str(),
            params.to_vec(),
        ))
    }

    fn for_group(&self, prefix: &str, middlewares: &[MiddlewareFunc<C>]) -> Box<dyn Routable<C>> {
        let mut grouped = self.clone();
        grouped.path = format!("{prefix}{}", self.path);
        let mut chain = middlewares.to_vec();
        chain.extend(self.middlewares.iter().cloned());
        grouped.middlewares = chain;
        Box::new(grouped)
    }
}
