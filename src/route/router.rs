use std::{borrow::Cow, sync::Arc};

use http::Method;
use percent_encoding::percent_decode_str;

use crate::{
    error::{MethodNotAllowedError, NotFoundError, RouteError},
    handler::{apply_middleware, HandlerFunc},
    route::{
        config::RouterConfig,
        info::{PathParams, RouteInfo, Routes},
        internal::radix_tree::{Kind, RadixTree, RouteMethod, TreeMatch},
        routable::{Routable, Route},
    },
};

/// Name of the [`RouteInfo`] attached to a [`RouteMatchKind::NotFound`]
/// result.
pub const NOT_FOUND_ROUTE_NAME: &str = "RouteNotFound";

/// Name of the [`RouteInfo`] attached to a
/// [`RouteMatchKind::MethodNotAllowed`] result.
pub const METHOD_NOT_ALLOWED_ROUTE_NAME: &str = "RouteMethodNotAllowed";

/// How a request fared against the routing table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteMatchKind {
    /// A route matched both path and method.
    Found,
    /// No route matched the request path.
    NotFound,
    /// A route matched the request path, but not the request method.
    MethodNotAllowed,
}

/// Result of [`Router::matches`].
///
/// The handler is always callable: for the negative outcomes it is a stock
/// handler raising [`NotFoundError`] or [`MethodNotAllowedError`], so the
/// caller can run the chain unconditionally.
pub struct RouteMatch<C: 'static> {
    /// Outcome kind.
    pub kind: RouteMatchKind,
    /// Pattern the matched route was registered with. On
    /// [`MethodNotAllowed`](RouteMatchKind::MethodNotAllowed) this is the
    /// pattern of the path-matching route; empty on
    /// [`NotFound`](RouteMatchKind::NotFound).
    pub route_path: Arc<str>,
    /// The composed handler chain to invoke.
    pub handler: HandlerFunc<C>,
    /// Information about the matched route, or the interned sentinel info
    /// for negative outcomes.
    pub route_info: Arc<dyn RouteInfo>,
}

// Sentinel infos attached to 404/405 results, created once per router.
struct SentinelRouteInfo {
    name: &'static str,
}

impl RouteInfo for SentinelRouteInfo {
    fn method(&self) -> &str {
        ""
    }

    fn path(&self) -> &str {
        ""
    }

    fn name(&self) -> &str {
        self.name
    }

    fn params(&self) -> &[Arc<str>] {
        &[]
    }
}

/// The registry of all registered routes for request matching and path
/// parameter extraction.
///
/// Not safe for concurrent mutation: finish every [`add`](Router::add) and
/// [`remove`](Router::remove) before matching from multiple threads.
pub struct Router<C: 'static> {
    tree: RadixTree<C>,
    routes: Routes,
    config: RouterConfig,

    not_found_handler: HandlerFunc<C>,
    method_not_allowed_handler: HandlerFunc<C>,
    not_found_info: Arc<dyn RouteInfo>,
    method_not_allowed_info: Arc<dyn RouteInfo>,
    empty_route_path: Arc<str>,
}

impl<C: 'static> Default for Router<C> {
    fn default() -> Self {
        Self::new(RouterConfig::default())
    }
}

impl<C: 'static> Router<C> {
    /// Creates an empty router with the given configuration.
    pub fn new(config: RouterConfig) -> Self {
        Self {
            tree: RadixTree::new(),
            routes: Routes::default(),
            config,
            not_found_handler: Arc::new(|_: &mut C| Err(NotFoundError.into())),
            method_not_allowed_handler: Arc::new(|_: &mut C| Err(MethodNotAllowedError.into())),
            not_found_info: Arc::new(SentinelRouteInfo {
                name: NOT_FOUND_ROUTE_NAME,
            }),
            method_not_allowed_info: Arc::new(SentinelRouteInfo {
                name: METHOD_NOT_ALLOWED_ROUTE_NAME,
            }),
            empty_route_path: Arc::from(""),
        }
    }

    /// Information about all registered routes, in registration order.
    pub fn routes(&self) -> &Routes {
        &self.routes
    }

    /// Registers a route and returns the stored [`RouteInfo`].
    ///
    /// Fails with [`RouteError::MissingHandler`] when the routable carries
    /// no handler, and with [`RouteError::Duplicate`] when the exact
    /// `(method, path)` pair is already registered and
    /// [`allow_overwriting_route`](RouterConfig::allow_overwriting_route) is
    /// disabled.
    pub fn add(&mut self, routable: &dyn Routable<C>) -> Result<Arc<dyn RouteInfo>, RouteError> {
        let Route {
            method,
            path,
            name: _,
            handler,
            middlewares,
        } = routable.to_route();

        let Some(handler) = handler else {
            return Err(RouteError::MissingHandler { method, path });
        };
        let handler = apply_middleware(handler, &middlewares);

        let mut path = normalize_path(&path);
        if !self.config.allow_overwriting_route
            && self.routes.find_by_method_path(&method, &path).is_some()
        {
            return Err(RouteError::Duplicate { method, path });
        }

        let original_path: Arc<str> = Arc::from(path.as_str());
        let mut param_names: Vec<Arc<str>> = Vec::new();
        let mut registered: Option<Arc<dyn RouteInfo>> = None;

        // Scan the pattern left to right. Literal runs go in as static
        // edges; `:name` collapses to a param edge carrying just `:` (the
        // name lives in the handler record); `*` ends the pattern with a
        // catch-all edge.
        let mut i = 0;
        while i < path.len() {
            match path.as_bytes()[i] {
                b':' if i > 0 && path.as_bytes()[i - 1] == b'\\' => {
                    // Escaped: the colon stays a literal, backslash included.
                    i += 1;
                }
                b':' => {
                    let j = i + 1;
                    self.tree.insert(Kind::Static, &path[..i], &method, None);

                    let mut k = i;
                    while k < path.len() && path.as_bytes()[k] != b'/' {
                        k += 1;
                    }
                    param_names.push(Arc::from(&path[j..k]));
                    path.replace_range(j..k, "");
                    i = j;

                    if i == path.len() {
                        let info = routable.to_route_info(&param_names);
                        let entry = route_entry(&method, &original_path, &param_names, &handler, &info);
                        self.tree.insert(Kind::Param, &path[..i], &method, Some(entry));
                        registered = Some(info);
                        break;
                    }
                    self.tree.insert(Kind::Param, &path[..i], &method, None);
                    i = j + 1;
                }
                b'*' => {
                    self.tree.insert(Kind::Static, &path[..i], &method, None);
                    param_names.push(Arc::from("*"));
                    let info = routable.to_route_info(&param_names);
                    let entry = route_entry(&method, &original_path, &param_names, &handler, &info);
                    self.tree
                        .insert(Kind::CatchAll, &path[..=i], &method, Some(entry));
                    registered = Some(info);
                    break;
                }
                _ => i += 1,
            }
        }

        let info = match registered {
            Some(info) => info,
            None => {
                let info = routable.to_route_info(&param_names);
                let entry = route_entry(&method, &original_path, &param_names, &handler, &info);
                self.tree.insert(Kind::Static, &path, &method, Some(entry));
                info
            }
        };

        tracing::debug!(method = %method, path = %original_path, "added route");
        self.routes.upsert(Arc::clone(&info));
        Ok(info)
    }

    /// Unregisters the route for exactly this method and pattern.
    ///
    /// The pattern node is located by deterministic descent over the
    /// pattern's own bytes, the method entry is cleared, and interior nodes
    /// left without handlers and children are pruned toward the root.
    pub fn remove(&mut self, method: &Method, path: &str) -> Result<(), RouteError> {
        let path = normalize_path(path);
        if self.tree.is_empty() {
            return Err(RouteError::NotRegistered {
                method: method.clone(),
                path,
            });
        }
        let Some(node) = self.tree.find_route(&path) else {
            return Err(RouteError::NotRegistered {
                method: method.clone(),
                path,
            });
        };
        if self.tree.method_entry(node, method).is_none() {
            return Err(RouteError::NotRegistered {
                method: method.clone(),
                path,
            });
        }

        let removed = self.tree.clear_handler(node, method);
        self.routes.remove(method, &path);
        self.tree.prune(node);

        if let Some(entry) = removed {
            tracing::debug!(method = %entry.method, path = %entry.path, "removed route");
        }
        Ok(())
    }

    /// Looks up the handler registered for `method` and the request path,
    /// writing extracted parameters into `params`.
    ///
    /// `path` is the decoded request path. `raw_path` is the on-the-wire
    /// form, passed only when it differs from `path`; it is used instead
    /// when [`use_escaped_path_for_matching`](RouterConfig::use_escaped_path_for_matching)
    /// is set.
    ///
    /// Negative outcomes are not errors: the returned [`RouteMatch`] then
    /// carries a stock handler raising the appropriate framework error. On
    /// [`MethodNotAllowed`](RouteMatchKind::MethodNotAllowed) the values
    /// captured along the best path match stay in `params`, but no
    /// parameter names are assigned.
    ///
    /// `params` must have capacity for the most parameter-heavy registered
    /// route; the match walk treats it as scratch space and never allocates
    /// entries of its own.
    pub fn matches(
        &self,
        method: &Method,
        path: &str,
        raw_path: Option<&str>,
        params: &mut PathParams,
    ) -> RouteMatch<C> {
        params.expand();
        let search_path = if self.config.use_escaped_path_for_matching {
            raw_path.unwrap_or(path)
        } else {
            path
        };

        match self.tree.matches(search_path, method, params) {
            TreeMatch::Found {
                route_method,
                params_count,
                is_static_node,
            } => {
                params.truncate(params_count);
                for (i, name) in route_method.params.iter().enumerate() {
                    params.set_name(i, Arc::clone(name));
                }
                if self.config.unescape_path_param_values && !is_static_node {
                    unescape_params(params);
                }
                RouteMatch {
                    kind: RouteMatchKind::Found,
                    route_path: Arc::clone(&route_method.path),
                    handler: Arc::clone(&route_method.handler),
                    route_info: Arc::clone(&route_method.route_info),
                }
            }
            TreeMatch::MethodNotAllowed {
                route_path,
                params_count,
                is_static_node,
            } => {
                params.truncate(params_count);
                if self.config.unescape_path_param_values && !is_static_node {
                    unescape_params(params);
                }
                RouteMatch {
                    kind: RouteMatchKind::MethodNotAllowed,
                    route_path,
                    handler: Arc::clone(&self.method_not_allowed_handler),
                    route_info: Arc::clone(&self.method_not_allowed_info),
                }
            }
            TreeMatch::NotFound => {
                params.truncate(0);
                RouteMatch {
                    kind: RouteMatchKind::NotFound,
                    route_path: Arc::clone(&self.empty_route_path),
                    handler: Arc::clone(&self.not_found_handler),
                    route_info: Arc::clone(&self.not_found_info),
                }
            }
        }
    }
}

fn route_entry<C: 'static>(
    method: &Method,
    path: &Arc<str>,
    params: &[Arc<str>],
    handler: &HandlerFunc<C>,
    info: &Arc<dyn RouteInfo>,
) -> RouteMethod<C> {
    RouteMethod {
        method: method.clone(),
        path: Arc::clone(path),
        params: params.to_vec().into(),
        handler: Arc::clone(handler),
        route_info: Arc::clone(info),
    }
}

fn unescape_params(params: &mut PathParams) {
    for i in 0..params.len() {
        // Values that fail to decode keep their raw form.
        let decoded = match percent_decode_str(params[i].value()).decode_utf8() {
            Ok(Cow::Owned(decoded)) => decoded,
            _ => continue,
        };
        params.set_decoded_value(i, decoded);
    }
}

pub(crate) fn normalize_path(path: &str) -> String {
    if path.is_empty() {
        return "/".to_string();
    }
    if !path.starts_with('/') {
        return format!("/{path}");
    }
    path.to_string()
}
