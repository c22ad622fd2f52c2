use std::{
    fmt::{self, Debug, Display, Formatter},
    ops::Index,
    sync::Arc,
};

use http::Method;
use smallvec::SmallVec;

/// Information about a registered route.
///
/// The router stores one `RouteInfo` per registered `(method, path)` pair
/// and hands it back verbatim on every match. Custom
/// [`Routable`](crate::Routable) implementations can return their own type
/// to attach extra data (privileges, documentation, ...) to a route.
pub trait RouteInfo: Send + Sync {
    /// HTTP method of the route, e.g. `"GET"`.
    ///
    /// Empty for the sentinel infos attached to not-found and
    /// method-not-allowed results.
    fn method(&self) -> &str;

    /// The registered path pattern, placeholders included.
    fn path(&self) -> &str;

    /// Optional route name. Names may repeat; `(method, path)` is the
    /// unique key.
    fn name(&self) -> &str;

    /// Parameter names of the path pattern, in occurrence order. A
    /// catch-all is named `*`.
    fn params(&self) -> &[Arc<str>];

    /// Builds a concrete path from the pattern by substituting `args` for
    /// the placeholders in occurrence order.
    ///
    /// Extra arguments are ignored; once arguments run out the remaining
    /// pattern text is kept verbatim.
    fn reverse(&self, args: &[&dyn Display]) -> String {
        reverse_path(self.path(), args)
    }
}

impl Debug for dyn RouteInfo {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("RouteInfo")
            .field("method", &self.method())
            .field("path", &self.path())
            .field("name", &self.name())
            .field("params", &self.params())
            .finish()
    }
}

/// The [`RouteInfo`] implementation produced by [`Route`](crate::Route).
#[derive(Debug, Clone)]
pub struct RouteInfoData {
    method: Method,
    path: Arc<str>,
    name: Arc<str>,
    params: Arc<[Arc<str>]>,
}

impl RouteInfoData {
    /// Create route information from its parts.
    pub fn new(
        method: Method,
        path: impl Into<Arc<str>>,
        name: impl Into<Arc<str>>,
        params: impl Into<Arc<[Arc<str>]>>,
    ) -> Self {
        Self {
            method,
            path: path.into(),
            name: name.into(),
            params: params.into(),
        }
    }
}

impl RouteInfo for RouteInfoData {
    fn method(&self) -> &str {
        self.method.as_str()
    }

    fn path(&self) -> &str {
        &self.path
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn params(&self) -> &[Arc<str>] {
        &self.params
    }
}

pub(crate) fn reverse_path(path: &str, args: &[&dyn Display]) -> String {
    let bytes = path.as_bytes();
    let mut out: Vec<u8> = Vec::with_capacity(path.len());
    let mut n = 0;
    let mut i = 0;
    while i < bytes.len() {
        if (bytes[i] == b':' || bytes[i] == b'*') && n < args.len() {
            while i < bytes.len() && bytes[i] != b'/' {
                i += 1;
            }
            out.extend_from_slice(args[n].to_string().as_bytes());
            n += 1;
            if i < bytes.len() {
                out.push(bytes[i]);
            }
        } else {
            out.push(bytes[i]);
        }
        i += 1;
    }
    String::from_utf8_lossy(&out).into_owned()
}

/// One extracted path parameter.
#[derive(Clone)]
pub struct PathParam {
    name: Arc<str>,
    value: String,
    // Bytes the matcher consumed for this value; differs from `value.len()`
    // only when the consumed bytes were not valid UTF-8.
    matched_len: usize,
}

impl PathParam {
    /// Create a parameter from a name and a value.
    pub fn new(name: impl Into<Arc<str>>, value: impl Into<String>) -> Self {
        let value = value.into();
        Self {
            name: name.into(),
            matched_len: value.len(),
            value,
        }
    }

    /// Parameter name, as declared in the route pattern.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Parameter value extracted from the request path.
    pub fn value(&self) -> &str {
        &self.value
    }
}

impl Default for PathParam {
    fn default() -> Self {
        Self {
            name: Arc::from(""),
            value: String::new(),
            matched_len: 0,
        }
    }
}

impl PartialEq for PathParam {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name && self.value == other.value
    }
}

impl Eq for PathParam {}

impl Debug for PathParam {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("PathParam")
            .field("name", &self.name)
            .field("value", &self.value)
            .finish()
    }
}

/// Caller-owned scratch storage the matcher writes path parameters into.
///
/// Allocate it once per worker with enough capacity for the most
/// parameter-heavy route and reuse it across requests; the matcher reuses
/// the string buffers in place, so the steady state does not allocate.
///
/// During a match the live length is first grown to the full capacity of the
/// backing storage and then truncated to the matched route's parameter
/// count, so after [`Router::matches`](crate::Router::matches) the live
/// region holds exactly the extracted parameters.
#[derive(Debug, Default)]
pub struct PathParams {
    entries: SmallVec<[PathParam; 8]>,
    len: usize,
}

impl PathParams {
    /// Creates storage with the default inline capacity of eight parameters.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates storage for routes with up to `capacity` parameters.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: SmallVec::with_capacity(capacity),
            len: 0,
        }
    }

    /// Number of live parameters.
    pub fn len(&self) -> usize {
        self.len
    }

    /// Returns `true` if there are no live parameters.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Iterates over the live parameters.
    pub fn iter(&self) -> std::slice::Iter<'_, PathParam> {
        self.entries[..self.len].iter()
    }

    /// Returns the value of the parameter `name`, or `default` if no such
    /// parameter was extracted.
    pub fn get<'a>(&'a self, name: &str, default: &'a str) -> &'a str {
        self.iter()
            .find(|p| &*p.name == name)
            .map(|p| p.value())
            .unwrap_or(default)
    }

    pub(crate) fn expand(&mut self) {
        let capacity = self.entries.capacity();
        while self.entries.len() < capacity {
            self.entries.push(PathParam::default());
        }
        self.len = self.entries.len();
    }

    pub(crate) fn truncate(&mut self, len: usize) {
        self.len = self.len.min(len);
    }

    pub(crate) fn set_value(&mut self, index: usize, raw: &[u8]) {
        let entry = &mut self.entries[..self.len][index];
        entry.value.clear();
        entry.value.push_str(&String::from_utf8_lossy(raw));
        entry.matched_len = raw.len();
    }

    pub(crate) fn clear_value(&mut self, index: usize) {
        let entry = &mut self.entries[..self.len][index];
        entry.value.clear();
        entry.matched_len = 0;
    }

    pub(crate) fn matched_len(&self, index: usize) -> usize {
        self.entries[..self.len][index].matched_len
    }

    pub(crate) fn set_name(&mut self, index: usize, name: Arc<str>) {
        self.entries[..self.len][index].name = name;
    }

    pub(crate) fn set_decoded_value(&mut self, index: usize, value: String) {
        self.entries[..self.len][index].value = value;
    }
}

impl Index<usize> for PathParams {
    type Output = PathParam;

    fn index(&self, index: usize) -> &PathParam {
        &self.entries[..self.len][index]
    }
}

impl<'a> IntoIterator for &'a PathParams {
    type Item = &'a PathParam;
    type IntoIter = std::slice::Iter<'a, PathParam>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Ordered collection of every [`RouteInfo`] registered with a router.
#[derive(Debug, Default)]
pub struct Routes(Vec<Arc<dyn RouteInfo>>);

impl Routes {
    /// Number of registered routes.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns `true` if no routes are registered.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterates over the routes in registration order.
    pub fn iter(&self) -> std::slice::Iter<'_, Arc<dyn RouteInfo>> {
        self.0.iter()
    }

    /// Finds the route registered for exactly this method and path pattern.
    pub fn find_by_method_path(&self, method: &Method, path: &str) -> Option<&Arc<dyn RouteInfo>> {
        self.0
            .iter()
            .find(|r| r.method() == method.as_str() && r.path() == path)
    }

    /// Finds the first route with the given name.
    pub fn find_by_name(&self, name: &str) -> Option<&Arc<dyn RouteInfo>> {
        self.0.iter().find(|r| r.name() == name)
    }

    /// Reverses the first route with the given name; see
    /// [`RouteInfo::reverse`].
    pub fn reverse(&self, name: &str, args: &[&dyn Display]) -> Option<String> {
        self.find_by_name(name).map(|r| r.reverse(args))
    }

    pub(crate) fn upsert(&mut self, info: Arc<dyn RouteInfo>) {
        match self
            .0
            .iter_mut()
            .find(|r| r.method() == info.method() && r.path() == info.path())
        {
            Some(slot) => *slot = info,
            None => self.0.push(info),
        }
    }

    pub(crate) fn remove(&mut self, method: &Method, path: &str) {
        if let Some(pos) = self
            .0
            .iter()
            .position(|r| r.method() == method.as_str() && r.path() == path)
        {
            self.0.remove(pos);
        }
    }
}

impl<'a> IntoIterator for &'a Routes {
    type Item = &'a Arc<dyn RouteInfo>;
    type IntoIter = std::slice::Iter<'a, Arc<dyn RouteInfo>>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}
