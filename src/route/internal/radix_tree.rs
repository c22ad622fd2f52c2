use std::{collections::HashMap, sync::Arc};

use http::Method;

use crate::{
    handler::HandlerFunc,
    route::info::{PathParams, RouteInfo},
};

const PARAM_LABEL: u8 = b':';
const ANY_LABEL: u8 = b'*';

fn longest_common_prefix(a: &[u8], b: &[u8]) -> usize {
    a.iter().zip(b).take_while(|(a, b)| **a == **b).count()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Kind {
    Static,
    Param,
    CatchAll,
}

/// Handle into the node arena. Parent links are stored as handles so the
/// tree needs no ownership cycles.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct NodeId(usize);

/// Everything registered for one `(method, path)` pair: the composed handler
/// chain and the metadata handed back on a match.
pub(crate) struct RouteMethod<C: 'static> {
    pub(crate) method: Method,
    pub(crate) path: Arc<str>,
    pub(crate) params: Arc<[Arc<str>]>,
    pub(crate) handler: HandlerFunc<C>,
    pub(crate) route_info: Arc<dyn RouteInfo>,
}

/// Method dispatch table of a node.
///
/// Direct slots for the common HTTP and WebDAV methods keep the inner loop
/// on a branch table; everything else goes through the overflow map.
pub(crate) struct MethodTable<C: 'static> {
    connect: Option<Box<RouteMethod<C>>>,
    delete: Option<Box<RouteMethod<C>>>,
    get: Option<Box<RouteMethod<C>>>,
    head: Option<Box<RouteMethod<C>>>,
    options: Option<Box<RouteMethod<C>>>,
    patch: Option<Box<RouteMethod<C>>>,
    post: Option<Box<RouteMethod<C>>>,
    propfind: Option<Box<RouteMethod<C>>>,
    put: Option<Box<RouteMethod<C>>>,
    report: Option<Box<RouteMethod<C>>>,
    trace: Option<Box<RouteMethod<C>>>,
    any_other: HashMap<Method, Box<RouteMethod<C>>>,
}

impl<C: 'static> MethodTable<C> {
    fn new() -> Self {
        Self {
            connect: None,
            delete: None,
            get: None,
            head: None,
            options: None,
            patch: None,
            post: None,
            propfind: None,
            put: None,
            report: None,
            trace: None,
            any_other: HashMap::new(),
        }
    }

    fn set(
        &mut self,
        method: &Method,
        entry: Option<Box<RouteMethod<C>>>,
    ) -> Option<Box<RouteMethod<C>>> {
        let slot = match method.as_str() {
            "CONNECT" => &mut self.connect,
            "DELETE" => &mut self.delete,
            "GET" => &mut self.get,
            "HEAD" => &mut self.head,
            "OPTIONS" => &mut self.options,
            "PATCH" => &mut self.patch,
            "POST" => &mut self.post,
            "PROPFIND" => &mut self.propfind,
            "PUT" => &mut self.put,
            "REPORT" => &mut self.report,
            "TRACE" => &mut self.trace,
            _ => {
                return match entry {
                    Some(entry) => self.any_other.insert(method.clone(), entry),
                    None => self.any_other.remove(method),
                }
            }
        };
        std::mem::replace(slot, entry)
    }

    fn find(&self, method: &Method) -> Option<&RouteMethod<C>> {
        let slot = match method.as_str() {
            "CONNECT" => &self.connect,
            "DELETE" => &self.delete,
            "GET" => &self.get,
            "HEAD" => &self.head,
            "OPTIONS" => &self.options,
            "PATCH" => &self.patch,
            "POST" => &self.post,
            "PROPFIND" => &self.propfind,
            "PUT" => &self.put,
            "REPORT" => &self.report,
            "TRACE" => &self.trace,
            _ => return self.any_other.get(method).map(|entry| &**entry),
        };
        slot.as_deref()
    }

    fn is_handler(&self) -> bool {
        self.connect.is_some()
            || self.delete.is_some()
            || self.get.is_some()
            || self.head.is_some()
            || self.options.is_some()
            || self.patch.is_some()
            || self.post.is_some()
            || self.propfind.is_some()
            || self.put.is_some()
            || self.report.is_some()
            || self.trace.is_some()
            || !self.any_other.is_empty()
    }
}

/// One compressed edge of the radix tree.
struct Node<C: 'static> {
    kind: Kind,
    // First byte of `prefix`, kept separate for child lookup.
    label: u8,
    prefix: Vec<u8>,
    parent: Option<NodeId>,
    static_children: Vec<NodeId>,
    param_child: Option<NodeId>,
    catch_all_child: Option<NodeId>,
    methods: MethodTable<C>,
    // Full pattern of the route whose terminal this node is; empty otherwise.
    original_path: Arc<str>,
    // Parameters on the pattern ending here; meaningful on handler nodes.
    params_count: usize,
    is_leaf: bool,
    is_handler: bool,
}

/// Outcome of a tree walk, before the router attaches stock handlers and
/// parameter names.
pub(crate) enum TreeMatch<'a, C: 'static> {
    Found {
        route_method: &'a RouteMethod<C>,
        params_count: usize,
        is_static_node: bool,
    },
    MethodNotAllowed {
        route_path: Arc<str>,
        params_count: usize,
        is_static_node: bool,
    },
    NotFound,
}

struct MatchState {
    current: NodeId,
    search_index: usize,
    param_index: usize,
}

pub(crate) struct RadixTree<C: 'static> {
    slots: Vec<Option<Node<C>>>,
    free: Vec<NodeId>,
    root: NodeId,
}

impl<C: 'static> Default for RadixTree<C> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C: 'static> RadixTree<C> {
    pub(crate) fn new() -> Self {
        let root = Node {
            kind: Kind::Static,
            label: 0,
            prefix: Vec::new(),
            parent: None,
            static_children: Vec::new(),
            param_child: None,
            catch_all_child: None,
            methods: MethodTable::new(),
            original_path: Arc::from(""),
            params_count: 0,
            is_leaf: true,
            is_handler: false,
        };
        Self {
            slots: vec![Some(root)],
            free: Vec::new(),
            root: NodeId(0),
        }
    }

    /// Router with nothing registered; lets the remover fail fast.
    pub(crate) fn is_empty(&self) -> bool {
        let root = self.node(self.root);
        root.is_leaf && !root.is_handler
    }

    fn node(&self, id: NodeId) -> &Node<C> {
        self.slots[id.0].as_ref().expect("dangling node handle")
    }

    fn node_mut(&mut self, id: NodeId) -> &mut Node<C> {
        self.slots[id.0].as_mut().expect("dangling node handle")
    }

    fn alloc(&mut self, node: Node<C>) -> NodeId {
        match self.free.pop() {
            Some(id) => {
                self.slots[id.0] = Some(node);
                id
            }
            None => {
                let id = NodeId(self.slots.len());
                self.slots.push(Some(node));
                id
            }
        }
    }

    fn release(&mut self, id: NodeId) {
        self.slots[id.0] = None;
        self.free.push(id);
    }

    fn find_static_child(&self, id: NodeId, label: u8) -> Option<NodeId> {
        self.node(id)
            .static_children
            .iter()
            .copied()
            .find(|&child| self.node(child).label == label)
    }

    fn find_child_with_label(&self, id: NodeId, label: u8) -> Option<NodeId> {
        if let Some(child) = self.find_static_child(id, label) {
            return Some(child);
        }
        let node = self.node(id);
        match label {
            PARAM_LABEL => node.param_child,
            ANY_LABEL => node.catch_all_child,
            _ => None,
        }
    }

    fn refresh_is_leaf(&mut self, id: NodeId) {
        let node = self.node_mut(id);
        node.is_leaf = node.static_children.is_empty()
            && node.param_child.is_none()
            && node.catch_all_child.is_none();
    }

    fn set_handler(&mut self, id: NodeId, method: &Method, entry: Option<Box<RouteMethod<C>>>) {
        let adding = entry.is_some();
        let node = self.node_mut(id);
        node.methods.set(method, entry);
        node.is_handler = adding || node.methods.is_handler();
    }

    fn new_child(
        &mut self,
        kind: Kind,
        prefix: &[u8],
        parent: NodeId,
        method: &Method,
        route_method: Option<RouteMethod<C>>,
    ) -> NodeId {
        let mut node = Node {
            kind,
            label: prefix[0],
            prefix: prefix.to_vec(),
            parent: Some(parent),
            static_children: Vec::new(),
            param_child: None,
            catch_all_child: None,
            methods: MethodTable::new(),
            original_path: Arc::from(""),
            params_count: 0,
            is_leaf: true,
            is_handler: false,
        };
        if let Some(rm) = route_method {
            node.params_count = rm.params.len();
            node.original_path = Arc::clone(&rm.path);
            node.is_handler = true;
            node.methods.set(method, Some(Box::new(rm)));
        }
        self.alloc(node)
    }

    /// Inserts one edge of a pattern.
    ///
    /// Static inserts descend by longest common prefix and split existing
    /// edges where the prefix diverges. Param and catch-all inserts land in
    /// the dedicated single-child slot of the current node. The handler (if
    /// any) is attached to the terminal node's method table.
    pub(crate) fn insert(
        &mut self,
        kind: Kind,
        path: &str,
        method: &Method,
        route_method: Option<RouteMethod<C>>,
    ) {
        let mut current = self.root;
        let mut search: &[u8] = path.as_bytes();

        loop {
            let prefix_len = self.node(current).prefix.len();
            let lcp = longest_common_prefix(search, &self.node(current).prefix);

            if lcp == 0 {
                // Empty tree; seed the root edge.
                {
                    let node = self.node_mut(current);
                    node.label = search[0];
                    node.prefix = search.to_vec();
                }
                if let Some(rm) = route_method {
                    {
                        let node = self.node_mut(current);
                        node.kind = kind;
                        node.params_count = rm.params.len();
                        node.original_path = Arc::clone(&rm.path);
                    }
                    self.set_handler(current, method, Some(Box::new(rm)));
                }
                self.refresh_is_leaf(current);
            } else if lcp < prefix_len {
                // The new path diverges inside this edge: split it, moving
                // the tail and everything attached to it into a fresh child.
                let (tail, inherited_kind, inherited) = {
                    let node = self.node_mut(current);
                    let tail = node.prefix[lcp..].to_vec();
                    let inherited_kind = node.kind;
                    let inherited = (
                        std::mem::take(&mut node.static_children),
                        node.param_child.take(),
                        node.catch_all_child.take(),
                        std::mem::replace(&mut node.methods, MethodTable::new()),
                        std::mem::replace(&mut node.params_count, 0),
                        std::mem::replace(&mut node.original_path, Arc::from("")),
                    );
                    node.prefix.truncate(lcp);
                    node.kind = Kind::Static;
                    node.label = node.prefix[0];
                    node.is_handler = false;
                    node.is_leaf = false;
                    (tail, inherited_kind, inherited)
                };
                let (static_children, param_child, catch_all_child, methods, params_count, original_path) =
                    inherited;
                let split = Node {
                    kind: inherited_kind,
                    label: tail[0],
                    prefix: tail,
                    parent: Some(current),
                    is_leaf: static_children.is_empty()
                        && param_child.is_none()
                        && catch_all_child.is_none(),
                    is_handler: methods.is_handler(),
                    static_children,
                    param_child,
                    catch_all_child,
                    methods,
                    params_count,
                    original_path,
                };
                let split_id = self.alloc(split);
                for child in self.node(split_id).static_children.clone() {
                    self.node_mut(child).parent = Some(split_id);
                }
                if let Some(child) = self.node(split_id).param_child {
                    self.node_mut(child).parent = Some(split_id);
                }
                if let Some(child) = self.node(split_id).catch_all_child {
                    self.node_mut(child).parent = Some(split_id);
                }
                self.node_mut(current).static_children.push(split_id);

                if lcp == search.len() {
                    // The truncated edge is the terminal.
                    self.node_mut(current).kind = kind;
                    if let Some(rm) = route_method {
                        {
                            let node = self.node_mut(current);
                            node.params_count = rm.params.len();
                            node.original_path = Arc::clone(&rm.path);
                        }
                        self.set_handler(current, method, Some(Box::new(rm)));
                    }
                } else {
                    let child =
                        self.new_child(kind, &search[lcp..], current, method, route_method);
                    self.node_mut(current).static_children.push(child);
                }
            } else if lcp < search.len() {
                search = &search[lcp..];
                if let Some(child) = self.find_child_with_label(current, search[0]) {
                    current = child;
                    continue;
                }
                let child = self.new_child(kind, search, current, method, route_method);
                let node = self.node_mut(current);
                match kind {
                    Kind::Static => node.static_children.push(child),
                    Kind::Param => node.param_child = Some(child),
                    Kind::CatchAll => node.catch_all_child = Some(child),
                }
                node.is_leaf = false;
            } else {
                // Node already exists; attach or replace the handler.
                if let Some(rm) = route_method {
                    {
                        let node = self.node_mut(current);
                        node.params_count = rm.params.len();
                        node.original_path = Arc::clone(&rm.path);
                    }
                    self.set_handler(current, method, Some(Box::new(rm)));
                }
            }
            return;
        }
    }

    /// Priority-ordered descent with backtracking.
    ///
    /// At every node the static child is tried first, then the param child,
    /// then the catch-all; a dead end rewinds `(search_index, param_index)`
    /// to their values on entry and resumes at the parent's next
    /// alternative. The deepest handler node seen with an exhausted search
    /// is remembered to tell *method not allowed* apart from *not found*.
    pub(crate) fn matches<'a>(
        &'a self,
        path: &str,
        method: &Method,
        params: &mut PathParams,
    ) -> TreeMatch<'a, C> {
        let path = path.as_bytes();
        let mut state = MatchState {
            current: self.root,
            search_index: 0,
            param_index: 0,
        };
        let mut best_match: Option<NodeId> = None;
        let mut matched: Option<(NodeId, &'a RouteMethod<C>)> = None;
        let mut block = Kind::Static;

        loop {
            if block == Kind::Static {
                let node = self.node(state.current);
                let search = &path[state.search_index..];
                let (prefix_len, lcp) = if node.kind == Kind::Static {
                    (
                        node.prefix.len(),
                        longest_common_prefix(search, &node.prefix),
                    )
                } else {
                    (0, 0)
                };
                if lcp != prefix_len {
                    // Prefix mismatch: resume at the parent's param branch.
                    match self.backtrack(Kind::Static, &mut state, params) {
                        Some(Kind::Param) => {
                            block = Kind::Param;
                            continue;
                        }
                        _ => break,
                    }
                }
                state.search_index += lcp;
                let search = &path[state.search_index..];

                if search.is_empty() && node.is_handler {
                    if best_match.is_none() {
                        best_match = Some(state.current);
                    }
                    if let Some(rm) = node.methods.find(method) {
                        matched = Some((state.current, rm));
                        break;
                    }
                }

                if !search.is_empty() {
                    if let Some(child) = self.find_static_child(state.current, search[0]) {
                        state.current = child;
                        continue;
                    }
                }
            }

            if block != Kind::CatchAll {
                let search = &path[state.search_index..];
                if !search.is_empty() {
                    if let Some(child) = self.node(state.current).param_child {
                        state.current = child;
                        let end = search
                            .iter()
                            .position(|&c| c == b'/')
                            .unwrap_or(search.len());
                        params.set_value(state.param_index, &search[..end]);
                        state.param_index += 1;
                        state.search_index += end;
                        block = Kind::Static;
                        continue;
                    }
                }
            }

            if let Some(child) = self.node(state.current).catch_all_child {
                state.current = child;
                let child_node = self.node(child);
                let search = &path[state.search_index..];
                params.set_value(child_node.params_count - 1, search);
                state.param_index += 1;
                state.search_index += search.len();

                if best_match.is_none() {
                    best_match = Some(child);
                }
                if let Some(rm) = child_node.methods.find(method) {
                    matched = Some((child, rm));
                    break;
                }
            }

            // Leaving a dead-ended catch-all resumes at its parent, whose
            // own branches are already exhausted; keep ascending until a
            // node offers a param or catch-all alternative or the walk
            // passes the root.
            let mut next = self.backtrack(Kind::CatchAll, &mut state, params);
            while next == Some(Kind::Static) {
                next = self.backtrack(Kind::CatchAll, &mut state, params);
            }
            match next {
                Some(Kind::Param) => block = Kind::Param,
                Some(Kind::CatchAll) => block = Kind::CatchAll,
                _ => break,
            }
        }

        if let Some((id, route_method)) = matched {
            let node = self.node(id);
            TreeMatch::Found {
                route_method,
                params_count: node.params_count,
                is_static_node: node.kind == Kind::Static,
            }
        } else if let Some(id) = best_match {
            let node = self.node(id);
            TreeMatch::MethodNotAllowed {
                route_path: Arc::clone(&node.original_path),
                params_count: node.params_count,
                is_static_node: node.kind == Kind::Static,
            }
        } else {
            TreeMatch::NotFound
        }
    }

    /// Moves to the parent and reports which branch kind to try next,
    /// rewinding the search and param positions consumed by the node being
    /// left. Returns `None` above the root.
    fn backtrack(&self, from: Kind, state: &mut MatchState, params: &mut PathParams) -> Option<Kind> {
        let previous = self.node(state.current);
        let next = match previous.kind {
            Kind::Static => Kind::Param,
            Kind::Param => Kind::CatchAll,
            Kind::CatchAll => Kind::Static,
        };
        if from != Kind::Static {
            if previous.kind == Kind::Static {
                state.search_index -= previous.prefix.len();
            } else {
                // Param and catch-all prefixes are a single byte; the
                // recorded value tells how much search they consumed.
                state.param_index -= 1;
                state.search_index -= params.matched_len(state.param_index);
                params.clear_value(state.param_index);
            }
        }
        state.current = previous.parent?;
        Some(next)
    }

    /// Locates the terminal node of `pattern` by deterministic descent over
    /// the pattern's own bytes; no matching or backtracking is involved.
    pub(crate) fn find_route(&self, pattern: &str) -> Option<NodeId> {
        let bytes = pattern.as_bytes();
        let mut current = self.root;
        let mut pos = 0;

        loop {
            let node = self.node(current);
            if node.is_handler && &*node.original_path == pattern {
                return Some(current);
            }
            match node.kind {
                Kind::Static => {
                    if !bytes[pos..].starts_with(&node.prefix) {
                        return None;
                    }
                    pos += node.prefix.len();
                }
                Kind::Param => {
                    // Skip over `:name`.
                    pos += 1;
                    while pos < bytes.len() && bytes[pos] != b'/' {
                        pos += 1;
                    }
                }
                Kind::CatchAll => return None,
            }
            if pos >= bytes.len() {
                return None;
            }
            let next = match bytes[pos] {
                PARAM_LABEL => node.param_child,
                ANY_LABEL => node.catch_all_child,
                label => self.find_static_child(current, label),
            };
            match next {
                Some(child) => current = child,
                None => return None,
            }
        }
    }

    pub(crate) fn method_entry(&self, id: NodeId, method: &Method) -> Option<&RouteMethod<C>> {
        self.node(id).methods.find(method)
    }

    /// Detaches the method entry; returns it so the caller can report what
    /// was removed.
    pub(crate) fn clear_handler(
        &mut self,
        id: NodeId,
        method: &Method,
    ) -> Option<Box<RouteMethod<C>>> {
        let node = self.node_mut(id);
        let removed = node.methods.set(method, None);
        node.is_handler = node.methods.is_handler();
        removed
    }

    /// Removes the node if it carries neither handlers nor children, then
    /// walks up releasing every ancestor that became empty, stopping at the
    /// first one that is a handler node or still has other children.
    ///
    /// A parent left with a single static child is not merged with it;
    /// match behavior is unaffected.
    pub(crate) fn prune(&mut self, id: NodeId) {
        {
            let node = self.node(id);
            if node.is_handler || !node.is_leaf {
                return;
            }
        }
        let mut current = id;
        while let Some(parent) = self.node(current).parent {
            let kind = self.node(current).kind;
            {
                let parent_node = self.node_mut(parent);
                match kind {
                    Kind::Static => parent_node.static_children.retain(|&c| c != current),
                    Kind::Param => parent_node.param_child = None,
                    Kind::CatchAll => parent_node.catch_all_child = None,
                }
            }
            self.release(current);
            self.refresh_is_leaf(parent);
            let parent_node = self.node(parent);
            if !parent_node.is_leaf || parent_node.is_handler {
                break;
            }
            current = parent;
        }
    }
}
