use super::{Node, NodeKind};
use crate::context::{Context, Handler};
use crate::router::errors::RegisterError;
use std::sync::Arc;

fn handler() -> Handler {
    Arc::new(|_c: &mut Context<'_>| {})
}

fn tree(routes: &[&str]) -> Node {
    let mut root = Node::default();
    for path in routes {
        root.add_route(path, handler()).unwrap();
    }
    root
}

/// Structural invariants every tree must keep after any sequence of
/// successful registrations.
fn assert_structure(n: &Node) {
    if n.wild_child {
        assert!(n.indices.is_empty(), "wildcard child must not be indexed");
        assert_eq!(n.children.len(), 1);
        assert_eq!(n.children[0].kind, NodeKind::Param);
    } else {
        assert_eq!(
            n.indices.len(),
            n.children.len(),
            "indices and children must stay in lock-step at {:?}",
            n.path
        );
        for (i, child) in n.children.iter().enumerate() {
            assert_eq!(
                child.path.as_bytes()[0],
                n.indices[i],
                "child {} of {:?} disagrees with its branching byte",
                i,
                n.path
            );
        }
        for pair in n.children.windows(2) {
            assert!(
                pair[0].priority >= pair[1].priority,
                "children must be ordered by non-increasing priority"
            );
        }
    }
    if n.kind == NodeKind::CatchAll {
        assert!(n.children.is_empty());
        assert!(n.handler.is_some());
        assert_eq!(n.params.len(), 1);
    }
    for child in &n.children {
        assert_structure(child);
    }
}

mod structure {
    use super::*;

    #[test]
    fn keeps_invariants_over_static_routes() {
        let root = tree(&[
            "/", "/health", "/help", "/users", "/users/all", "/usage", "/contact",
        ]);
        assert_structure(&root);
    }

    #[test]
    fn keeps_invariants_over_mixed_routes() {
        let root = tree(&[
            "/users/:id",
            "/users/:id/posts",
            "/users/:id/posts/:post_id",
            "/files/*filepath",
            "/search",
            "/static/js",
            "/static/css",
        ]);
        assert_structure(&root);
    }

    #[test]
    fn splits_edges_on_divergence() {
        let root = tree(&["/contact", "/container"]);
        assert_structure(&root);
        assert_eq!(root.path, "/conta");
        assert_eq!(root.children.len(), 2);
        assert!(root.handler.is_none());
    }

    #[test]
    fn split_keeps_existing_handler_on_the_suffix_node() {
        let mut root = tree(&["/contact"]);
        root.add_route("/con", handler()).unwrap();
        assert_structure(&root);
        assert_eq!(root.path, "/con");
        assert!(root.handler.is_some());
        assert_eq!(root.children[0].path, "tact");
        assert!(root.children[0].handler.is_some());
    }

    #[test]
    fn hot_branches_bubble_to_the_front() {
        let root = tree(&["/a", "/b", "/b/one", "/b/two", "/b/three"]);
        assert_structure(&root);
        // the '/b' subtree carries more routes, so it must lead the scan
        assert_eq!(root.indices[0], b'b');
    }

    #[test]
    fn root_kind_is_root() {
        let root = tree(&["/x"]);
        assert_eq!(root.kind, NodeKind::Root);
    }
}

mod conflicts {
    use super::*;

    #[test]
    fn rejects_duplicate_route() {
        let mut root = tree(&["/users/:id"]);
        let err = root.add_route("/users/:id", handler()).unwrap_err();
        assert!(matches!(err, RegisterError::DuplicateRoute { .. }));
    }

    #[test]
    fn rejects_second_param_name_at_same_position() {
        let mut root = tree(&["/a/:x"]);
        let err = root.add_route("/a/:y", handler()).unwrap_err();
        assert!(matches!(err, RegisterError::WildcardConflict { .. }));
    }

    #[test]
    fn rejects_literal_under_existing_wildcard() {
        let mut root = tree(&["/a/:x"]);
        let err = root.add_route("/a/b", handler()).unwrap_err();
        assert!(matches!(err, RegisterError::WildcardConflict { .. }));
    }

    #[test]
    fn rejects_wildcard_over_existing_literal() {
        let mut root = tree(&["/a/b"]);
        let err = root.add_route("/a/:x", handler()).unwrap_err();
        assert!(matches!(err, RegisterError::WildcardConflict { .. }));
    }

    #[test]
    fn allows_extending_past_a_param() {
        let mut root = tree(&["/users/:id"]);
        root.add_route("/users/:id/posts", handler()).unwrap();
        root.add_route("/users/:id/albums", handler()).unwrap();
        assert_structure(&root);
    }

    #[test]
    fn rejects_unnamed_wildcards() {
        let mut root = Node::default();
        let err = root.add_route("/a/:", handler()).unwrap_err();
        assert!(matches!(err, RegisterError::UnnamedWildcard { .. }));
        let err = root.add_route("/a/*", handler()).unwrap_err();
        assert!(matches!(err, RegisterError::UnnamedWildcard { .. }));
    }

    #[test]
    fn rejects_mixed_segments() {
        let mut root = Node::default();
        let err = root.add_route("/a/b:x", handler()).unwrap_err();
        assert!(matches!(err, RegisterError::MixedWildcardSegment { .. }));
        let err = root.add_route("/a/:x:y", handler()).unwrap_err();
        assert!(matches!(err, RegisterError::MixedWildcardSegment { .. }));
    }

    #[test]
    fn rejects_catch_all_before_the_end() {
        let mut root = Node::default();
        let err = root.add_route("/src/*files/more", handler()).unwrap_err();
        assert!(matches!(err, RegisterError::CatchAllNotAtEnd { .. }));
    }

    #[test]
    fn rejects_catch_all_shadowing_a_segment_root() {
        let mut root = tree(&["/src/"]);
        let err = root.add_route("/src/*files", handler()).unwrap_err();
        assert!(matches!(err, RegisterError::CatchAllRootConflict { .. }));
    }

    #[test]
    fn rejects_routes_below_a_catch_all() {
        let mut root = tree(&["/files/*rest"]);
        let err = root.add_route("/files/static", handler()).unwrap_err();
        assert!(matches!(err, RegisterError::WildcardConflict { .. }));
    }

    #[test]
    fn catch_all_and_sibling_literal_can_coexist() {
        // '/filesx' never enters the '/' branch of '/files'
        let mut root = tree(&["/files/*rest"]);
        root.add_route("/filesx", handler()).unwrap();
        assert_structure(&root);
    }
}
