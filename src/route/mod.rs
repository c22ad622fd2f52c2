//! Route registration, matching and the route registry.

pub(crate) mod internal;

mod config;
mod info;
mod routable;
mod router;

pub use config::RouterConfig;
pub use info::{PathParam, PathParams, RouteInfo, RouteInfoData, Routes};
pub use routable::{Routable, Route};
pub use router::{
    RouteMatch, RouteMatchKind, Router, METHOD_NOT_ALLOWED_ROUTE_NAME, NOT_FOUND_ROUTE_NAME,
};
