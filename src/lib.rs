//! `stanza-router` is the request-routing core of the Stanza web framework.
//!
//! The router stores `(method, path pattern, handler)` triples in a radix
//! tree and resolves every inbound request to exactly one of three outcomes:
//! the matching handler together with the extracted path parameters, *no
//! route matches this path*, or *a route matches this path but not this
//! method*.
//!
//! # Quickstart
//!
//! ```
//! use std::sync::Arc;
//!
//! use stanza_router::{
//!     http::Method, HandlerFunc, PathParams, Route, RouteMatchKind, Router, RouterConfig,
//! };
//!
//! // The request context is opaque to the router; any type works.
//! struct Ctx;
//!
//! let handler: HandlerFunc<Ctx> = Arc::new(|_ctx| Ok(()));
//!
//! let mut router = Router::new(RouterConfig::default());
//! router
//!     .add(&Route::new(Method::GET, "/users/:id", handler))
//!     .unwrap();
//!
//! let mut params = PathParams::new();
//! let m = router.matches(&Method::GET, "/users/42", None, &mut params);
//! assert_eq!(m.kind, RouteMatchKind::Found);
//! assert_eq!(&*m.route_path, "/users/:id");
//! assert_eq!(params.get("id", ""), "42");
//! ```
//!
//! # Patterns
//!
//! - `/users/:id` captures one path segment as the parameter `id`.
//! - `/files/*` captures the whole remaining path, slashes included, as the
//!   parameter `*`.
//! - `\:` escapes a colon so it is matched literally.
//!
//! Static segments are preferred over parameters, and parameters over
//! catch-alls; the match walk backtracks across those alternatives until a
//! route is found or the tree is exhausted.
//!
//! # Concurrency
//!
//! Matching only writes to the caller-supplied [`PathParams`], so a router
//! that is no longer being mutated can be shared freely between threads.
//! [`Router::add`] and [`Router::remove`] are **not** safe to run while
//! other threads are matching; complete registration before serving.

#![forbid(unsafe_code)]
#![deny(unreachable_pub)]
#![warn(missing_docs)]

pub mod error;
pub mod middleware;
pub mod route;

mod handler;

#[doc(inline)]
pub use http;

pub use error::{Error, MethodNotAllowedError, NotFoundError, Result, RouteError};
pub use handler::{apply_middleware, HandlerFunc, MiddlewareFunc};
pub use route::{
    PathParam, PathParams, Routable, Route, RouteInfo, RouteInfoData, RouteMatch, RouteMatchKind,
    Router, RouterConfig, Routes, METHOD_NOT_ALLOWED_ROUTE_NAME, NOT_FOUND_ROUTE_NAME,
};
