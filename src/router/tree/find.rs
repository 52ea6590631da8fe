use super::{Node, NodeKind};
use crate::context::{Handler, Params};

impl Node {
    /// Match `path` against the tree, collecting wildcard captures into
    /// `params`. Matching is case-sensitive and trailing-slash strict;
    /// time is proportional to the path length, not the route count.
    ///
    /// Returns `None` when the path is unknown or the matched node carries
    /// no handler. `params` may hold partial captures after a miss; the
    /// caller resets it.
    pub(crate) fn get_value<'n>(&'n self, path: &str, params: &mut Params) -> Option<&'n Handler> {
        let mut n = self;
        let mut path = path;

        loop {
            if n.kind == NodeKind::CatchAll {
                // the whole remainder, leading '/' included
                let name = n.params.first()?;
                params.push(name.clone(), path.to_string());
                return n.handler.as_ref();
            }

            let prefix = n.path.as_str();
            if path.len() > prefix.len() {
                if !path.starts_with(prefix) {
                    return None;
                }
                path = &path[prefix.len()..];

                if !n.wild_child {
                    let c = path.as_bytes()[0];
                    match n.indices.iter().position(|&b| b == c) {
                        Some(pos) => {
                            n = &n.children[pos];
                            continue;
                        }
                        None => return None,
                    }
                }

                // the single wildcard child is a named parameter; capture
                // up to the next '/' or the end of the path
                n = &n.children[0];
                let end = path.bytes().position(|b| b == b'/').unwrap_or(path.len());
                if n.path.len() > 1 {
                    params.push(n.path[1..].to_string(), path[..end].to_string());
                }

                if end < path.len() {
                    if n.children.is_empty() {
                        return None;
                    }
                    path = &path[end..];
                    n = &n.children[0];
                    continue;
                }

                return n.handler.as_ref();
            }

            if path == prefix {
                return n.handler.as_ref();
            }

            return None;
        }
    }
}
