//! Middleware shipped with the router.

mod logger;

pub use logger::logger;
