//! Property-based tests for the router.
//!
//! Invariants exercised over generated route tables:
//! 1. Every registered route is retrievable by matching its own pattern.
//! 2. Static segments beat params, params beat catch-alls.
//! 3. Insert followed by remove restores not-found.
//! 4. Extracted parameters carry the declared names and the instantiating
//!    values.

use std::{collections::HashSet, sync::Arc};

use http::Method;
use proptest::prelude::*;
use stanza_router::{HandlerFunc, PathParams, Route, RouteMatchKind, Router, RouterConfig};

type Ctx = ();

fn handler() -> HandlerFunc<Ctx> {
    Arc::new(|_| Ok(()))
}

fn router() -> Router<Ctx> {
    Router::new(RouterConfig::default())
}

#[derive(Debug, Clone)]
enum Seg {
    Static(String),
    Param,
}

#[derive(Debug, Clone)]
struct Pattern {
    segs: Vec<Seg>,
    catch_all: bool,
}

impl Pattern {
    fn path(&self) -> String {
        let mut path = String::new();
        for (i, seg) in self.segs.iter().enumerate() {
            path.push('/');
            match seg {
                Seg::Static(word) => path.push_str(word),
                Seg::Param => {
                    path.push(':');
                    path.push_str(&format!("p{i}"));
                }
            }
        }
        if self.catch_all {
            path.push_str("/*");
        }
        path
    }

    /// Pattern shape with parameter names erased; two patterns with the same
    /// signature collide in the tree.
    fn signature(&self) -> String {
        let mut sig = String::new();
        for seg in &self.segs {
            sig.push('/');
            match seg {
                Seg::Static(word) => sig.push_str(word),
                Seg::Param => sig.push(':'),
            }
        }
        if self.catch_all {
            sig.push_str("/*");
        }
        sig
    }

    /// Signature of a terminal param route that would capture this
    /// pattern's own path before its catch-all gets a chance.
    fn catch_all_shadow_signature(&self) -> String {
        let mut sig = String::new();
        for seg in &self.segs {
            sig.push('/');
            match seg {
                Seg::Static(word) => sig.push_str(word),
                Seg::Param => sig.push(':'),
            }
        }
        sig.push_str("/:");
        sig
    }

    fn param_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self
            .segs
            .iter()
            .enumerate()
            .filter_map(|(i, seg)| match seg {
                Seg::Param => Some(format!("p{i}")),
                Seg::Static(_) => None,
            })
            .collect();
        if self.catch_all {
            names.push("*".to_string());
        }
        names
    }

    fn instantiate(&self, values: &[String], tail: &str) -> (String, Vec<(String, String)>) {
        let mut path = String::new();
        let mut expected = Vec::new();
        for (i, seg) in self.segs.iter().enumerate() {
            path.push('/');
            match seg {
                Seg::Static(word) => path.push_str(word),
                Seg::Param => {
                    let value = &values[i % values.len()];
                    path.push_str(value);
                    expected.push((format!("p{i}"), value.clone()));
                }
            }
        }
        if self.catch_all {
            path.push('/');
            path.push_str(tail);
            expected.push(("*".to_string(), tail.to_string()));
        }
        (path, expected)
    }
}

fn word() -> impl Strategy<Value = String> {
    "[a-d]{1,3}"
}

fn tail() -> impl Strategy<Value = String> {
    "[a-d]{1,3}(/[a-d]{1,3})?"
}

fn seg() -> impl Strategy<Value = Seg> {
    prop_oneof![2 => word().prop_map(Seg::Static), 1 => Just(Seg::Param)]
}

fn pattern() -> impl Strategy<Value = Pattern> {
    (prop::collection::vec(seg(), 1..4), any::<bool>())
        .prop_map(|(segs, catch_all)| Pattern { segs, catch_all })
}

fn collect(params: &PathParams) -> Vec<(String, String)> {
    params
        .iter()
        .map(|p| (p.name().to_string(), p.value().to_string()))
        .collect()
}

proptest! {
    #[test]
    fn registered_routes_are_retrievable(
        patterns in prop::collection::vec(pattern(), 1..6),
    ) {
        let mut sigs = HashSet::new();
        let patterns: Vec<Pattern> = patterns
            .into_iter()
            .filter(|p| sigs.insert(p.signature()))
            .collect();

        let mut router = router();
        for p in &patterns {
            router.add(&Route::new(Method::GET, p.path(), handler())).unwrap();
        }

        for p in &patterns {
            // A terminal param route at the catch-all's position captures
            // the `*` byte of this pattern's own path first; that is the
            // documented priority order, not a lost route.
            if p.catch_all && sigs.contains(&p.catch_all_shadow_signature()) {
                continue;
            }
            let mut params = PathParams::with_capacity(8);
            let m = router.matches(&Method::GET, &p.path(), None, &mut params);
            prop_assert_eq!(m.kind, RouteMatchKind::Found);
            let expected_path = p.path();
            prop_assert_eq!(&*m.route_path, expected_path.as_str());
            let names: Vec<String> =
                params.iter().map(|q| q.name().to_string()).collect();
            prop_assert_eq!(names, p.param_names());
        }
    }

    #[test]
    fn static_beats_param_beats_catch_all(w in word(), other in word()) {
        prop_assume!(w != other);

        let mut router = router();
        router.add(&Route::new(Method::GET, format!("/r/{w}"), handler())).unwrap();
        router.add(&Route::new(Method::GET, "/r/:p", handler())).unwrap();
        router.add(&Route::new(Method::GET, "/r/*", handler())).unwrap();

        let mut params = PathParams::with_capacity(8);
        let m = router.matches(&Method::GET, &format!("/r/{w}"), None, &mut params);
        prop_assert_eq!(m.kind, RouteMatchKind::Found);
        let expected_r_w = format!("/r/{w}");
        prop_assert_eq!(&*m.route_path, expected_r_w.as_str());

        let m = router.matches(&Method::GET, &format!("/r/{other}"), None, &mut params);
        prop_assert_eq!(m.kind, RouteMatchKind::Found);
        prop_assert_eq!(&*m.route_path, "/r/:p");
        prop_assert_eq!(params.get("p", ""), other.as_str());

        let m = router.matches(&Method::GET, &format!("/r/{other}/x"), None, &mut params);
        prop_assert_eq!(m.kind, RouteMatchKind::Found);
        prop_assert_eq!(&*m.route_path, "/r/*");
        let expected_other_x = format!("{other}/x");
        prop_assert_eq!(params.get("*", ""), expected_other_x.as_str());
    }

    #[test]
    fn method_specific_catch_alls_fall_back_across_depths(
        a in word(),
        b in word(),
        c in word(),
    ) {
        let mut router = router();
        router
            .add(&Route::new(Method::POST, format!("/{a}/:x/*"), handler()))
            .unwrap();
        router
            .add(&Route::new(Method::GET, format!("/{a}/*"), handler()))
            .unwrap();

        // The deepest path match is the POST catch-all; a GET request must
        // backtrack out of it and land on the outer catch-all instead.
        let path = format!("/{a}/{b}/{c}");
        let mut params = PathParams::with_capacity(8);
        let m = router.matches(&Method::GET, &path, None, &mut params);
        prop_assert_eq!(m.kind, RouteMatchKind::Found);
        let expected_a_star = format!("/{a}/*");
        prop_assert_eq!(&*m.route_path, expected_a_star.as_str());
        let expected_b_c = format!("{b}/{c}");
        prop_assert_eq!(params.get("*", ""), expected_b_c.as_str());

        let m = router.matches(&Method::POST, &path, None, &mut params);
        prop_assert_eq!(m.kind, RouteMatchKind::Found);
        let expected_a_x_star = format!("/{a}/:x/*");
        prop_assert_eq!(&*m.route_path, expected_a_x_star.as_str());
        prop_assert_eq!(params.get("x", ""), b.as_str());
        prop_assert_eq!(params.get("*", ""), c.as_str());
    }

    #[test]
    fn insert_then_remove_restores_not_found(
        p in pattern(),
        values in prop::collection::vec(word(), 4),
        tail in tail(),
    ) {
        let mut router = router();
        router.add(&Route::new(Method::GET, p.path(), handler())).unwrap();

        let (request, _) = p.instantiate(&values, &tail);
        let mut params = PathParams::with_capacity(8);
        let m = router.matches(&Method::GET, &request, None, &mut params);
        prop_assert_eq!(m.kind, RouteMatchKind::Found);

        router.remove(&Method::GET, &p.path()).unwrap();
        let m = router.matches(&Method::GET, &request, None, &mut params);
        prop_assert_eq!(m.kind, RouteMatchKind::NotFound);
        prop_assert!(router.routes().is_empty());
    }

    #[test]
    fn extracted_params_match_declared_names_and_values(
        p in pattern(),
        values in prop::collection::vec(word(), 4),
        tail in tail(),
    ) {
        let mut router = router();
        router.add(&Route::new(Method::GET, p.path(), handler())).unwrap();

        let (request, expected) = p.instantiate(&values, &tail);
        let mut params = PathParams::with_capacity(8);
        let m = router.matches(&Method::GET, &request, None, &mut params);
        prop_assert_eq!(m.kind, RouteMatchKind::Found);
        let expected_path = p.path();
        prop_assert_eq!(&*m.route_path, expected_path.as_str());
        prop_assert_eq!(collect(&params), expected);
    }
}
