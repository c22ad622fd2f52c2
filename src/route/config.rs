/// Configuration options for [`Router`](crate::Router).
///
/// All flags default to `false`.
#[derive(Debug, Clone, Copy, Default)]
pub struct RouterConfig {
    /// When `true`, registering a route whose `(method, path)` pair already
    /// exists silently replaces the previous handler. When `false`, the
    /// registration fails with [`RouteError::Duplicate`](crate::RouteError::Duplicate).
    pub allow_overwriting_route: bool,

    /// When `true`, percent-decode path parameter values after a match.
    /// Values that fail to decode are kept as-is.
    pub unescape_path_param_values: bool,

    /// When `true`, match against the raw on-the-wire request path instead
    /// of the decoded one.
    pub use_escaped_path_for_matching: bool,
}
