use super::Node;
use crate::context::{Context, Handler, Params};
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

fn lookup(root: &Node, path: &str) -> Option<Vec<(String, String)>> {
    let mut params = Params::default();
    root.get_value(path, &mut params)?;
    Some(
        params
            .iter()
            .map(|(n, v)| (n.to_string(), v.to_string()))
            .collect(),
    )
}

mod statics {
    use super::*;

    #[test]
    fn finds_exact_paths() {
        let root = tree(&["/", "/health", "/users", "/users/all"]);
        for path in ["/", "/health", "/users", "/users/all"] {
            assert!(lookup(&root, path).is_some(), "missing {path}");
        }
    }

    #[test]
    fn misses_unknown_paths() {
        let root = tree(&["/health"]);
        assert!(lookup(&root, "/heal").is_none());
        assert!(lookup(&root, "/healthy").is_none());
        assert!(lookup(&root, "/nope").is_none());
    }

    #[test]
    fn trailing_slash_is_a_distinct_route() {
        let root = tree(&["/foo"]);
        assert!(lookup(&root, "/foo/").is_none());

        let root = tree(&["/bar/"]);
        assert!(lookup(&root, "/bar").is_none());
    }

    #[test]
    fn matching_is_case_sensitive() {
        let root = tree(&["/Users"]);
        assert!(lookup(&root, "/users").is_none());
        assert!(lookup(&root, "/Users").is_some());
    }
}

mod params {
    use super::*;

    #[test]
    fn captures_single_segment() {
        let root = tree(&["/users/:id"]);
        let params = lookup(&root, "/users/42").unwrap();
        assert_eq!(params, vec![("id".to_string(), "42".to_string())]);
    }

    #[test]
    fn captures_nested_segments() {
        let root = tree(&["/users/:id", "/users/:id/posts/:postId"]);
        let params = lookup(&root, "/users/42/posts/7").unwrap();
        assert_eq!(
            params,
            vec![
                ("id".to_string(), "42".to_string()),
                ("postId".to_string(), "7".to_string()),
            ]
        );
    }

    #[test]
    fn does_not_match_across_segments() {
        let root = tree(&["/users/:id"]);
        assert!(lookup(&root, "/users/42/posts").is_none());
    }

    #[test]
    fn empty_capture_is_rejected() {
        // '/a/' stays a distinct, unregistered route
        let root = tree(&["/a/:x"]);
        assert!(lookup(&root, "/a/").is_none());
    }

    #[test]
    fn literal_and_param_branches_coexist_below_a_param() {
        let root = tree(&["/v/:version/users", "/v/:version/files"]);
        assert_eq!(
            lookup(&root, "/v/2/users").unwrap(),
            vec![("version".to_string(), "2".to_string())]
        );
        assert_eq!(
            lookup(&root, "/v/2/files").unwrap(),
            vec![("version".to_string(), "2".to_string())]
        );
        assert!(lookup(&root, "/v/2/other").is_none());
    }
}

mod catch_all {
    use super::*;

    #[test]
    fn captures_the_rest_of_the_path_with_leading_slash() {
        let root = tree(&["/files/*filepath"]);
        let params = lookup(&root, "/files/a/b/c.txt").unwrap();
        assert_eq!(
            params,
            vec![("filepath".to_string(), "/a/b/c.txt".to_string())]
        );
    }

    #[test]
    fn captures_a_bare_slash() {
        let root = tree(&["/files/*filepath"]);
        let params = lookup(&root, "/files/").unwrap();
        assert_eq!(params, vec![("filepath".to_string(), "/".to_string())]);
    }

    #[test]
    fn does_not_match_the_parent_path_itself() {
        let root = tree(&["/files/*filepath"]);
        assert!(lookup(&root, "/files").is_none());
    }

    #[test]
    fn catch_all_at_the_root_swallows_everything() {
        let root = tree(&["/*everything"]);
        let params = lookup(&root, "/a/b/c").unwrap();
        assert_eq!(
            params,
            vec![("everything".to_string(), "/a/b/c".to_string())]
        );
        let params = lookup(&root, "/").unwrap();
        assert_eq!(params, vec![("everything".to_string(), "/".to_string())]);
    }
}

mod revisits {
    use super::*;

    #[test]
    fn lookup_is_repeatable_with_identical_captures() {
        let root = tree(&["/users/:id/posts/:postId", "/files/*rest"]);
        for _ in 0..3 {
            assert_eq!(
                lookup(&root, "/users/9/posts/1").unwrap(),
                vec![
                    ("id".to_string(), "9".to_string()),
                    ("postId".to_string(), "1".to_string()),
                ]
            );
            assert_eq!(
                lookup(&root, "/files/x").unwrap(),
                vec![("rest".to_string(), "/x".to_string())]
            );
        }
    }
}
