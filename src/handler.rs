use std::sync::Arc;

use crate::error::Result;

/// A composed handler chain stored by the router.
///
/// The request context type `C` is opaque to the router; the framework
/// decides what a request looks like and the router only carries the chain
/// from registration to match.
pub type HandlerFunc<C> = Arc<dyn Fn(&mut C) -> Result<()> + Send + Sync>;

/// A middleware wraps a handler chain and yields a new one.
pub type MiddlewareFunc<C> = Arc<dyn Fn(HandlerFunc<C>) -> HandlerFunc<C> + Send + Sync>;

/// Composes `middlewares` around `handler`.
///
/// The first middleware in the slice becomes the outermost wrapper, so it
/// runs first on the way in and last on the way out.
pub fn apply_middleware<C: 'static>(
    handler: HandlerFunc<C>,
    middlewares: &[MiddlewareFunc<C>],
) -> HandlerFunc<C> {
    middlewares.iter().rev().fold(handler, |h, mw| mw(h))
}
