use std::{sync::Arc, time::Instant};

use http::Method;

use crate::handler::{HandlerFunc, MiddlewareFunc};

/// Returns a middleware that records one `tracing` event per request with
/// the request line, outcome and handler timing.
///
/// The router never sees the framework's request type, so `request_line`
/// reads the method and path out of the context for the log event.
pub fn logger<C, F>(request_line: F) -> MiddlewareFunc<C>
where
    C: 'static,
    F: Fn(&C) -> (Method, String) + Clone + Send + Sync + 'static,
{
    Arc::new(move |next: HandlerFunc<C>| -> HandlerFunc<C> {
        let request_line = request_line.clone();
        Arc::new(move |ctx: &mut C| {
            let (method, path) = request_line(ctx);
            let started = Instant::now();
            let result = next(ctx);
            match &result {
                Ok(()) => tracing::info!(
                    method = %method,
                    path = %path,
                    duration = ?started.elapsed(),
                    "request handled"
                ),
                Err(err) => tracing::info!(
                    method = %method,
                    path = %path,
                    status = %err.status(),
                    duration = ?started.elapsed(),
                    "request failed"
                ),
            }
            result
        })
    })
}
