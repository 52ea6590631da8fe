use super::{Node, NodeKind};
use crate::context::Handler;
use crate::router::errors::RegisterError;

impl Node {
    /// Insert `full_path` into the tree rooted at `self`. Conflicting or
    /// malformed registrations are programmer errors and fail here.
    pub(crate) fn add_route(
        &mut self,
        full_path: &str,
        handler: Handler,
    ) -> Result<(), RegisterError> {
        self.priority += 1;

        // empty tree
        if self.path.is_empty() && self.children.is_empty() {
            self.insert_child(full_path, full_path, handler)?;
            if self.kind == NodeKind::Static {
                self.kind = NodeKind::Root;
            }
            return Ok(());
        }

        let mut path = full_path;
        let mut n = self;
        loop {
            let i = longest_common_prefix(path, &n.path);

            if i < n.path.len() {
                if n.kind == NodeKind::CatchAll {
                    return Err(RegisterError::WildcardConflict {
                        path: full_path.to_string(),
                        conflict: n.path.clone(),
                    });
                }
                n.split_edge(i);
            }

            if i < path.len() {
                path = &path[i..];

                if n.kind == NodeKind::CatchAll {
                    // a catch-all terminates its branch
                    return Err(RegisterError::WildcardConflict {
                        path: full_path.to_string(),
                        conflict: n.path.clone(),
                    });
                }

                if n.wild_child {
                    let compatible = {
                        let child = &mut n.children[0];
                        child.priority += 1;
                        path.starts_with(child.path.as_str())
                            && (path.len() == child.path.len()
                                || path.as_bytes()[child.path.len()] == b'/')
                    };
                    if !compatible {
                        return Err(RegisterError::WildcardConflict {
                            path: full_path.to_string(),
                            conflict: n.children[0].path.clone(),
                        });
                    }
                    n = &mut n.children[0];
                    continue;
                }

                let c = path.as_bytes()[0];

                // step past a parameter into its single literal child
                if n.kind == NodeKind::Param && c == b'/' && n.children.len() == 1 {
                    n = &mut n.children[0];
                    n.priority += 1;
                    continue;
                }

                if let Some(pos) = n.indices.iter().position(|&b| b == c) {
                    let pos = n.increment_child_priority(pos);
                    n = &mut n.children[pos];
                    continue;
                }

                if c != b':' && c != b'*' {
                    n.indices.push(c);
                    n.children.push(Node::default());
                    let pos = n.increment_child_priority(n.children.len() - 1);
                    let child = &mut n.children[pos];
                    return child.insert_child(path, full_path, handler);
                }

                return n.insert_child(path, full_path, handler);
            }

            // both exhausted: this node takes the handler
            if n.handler.is_some() {
                return Err(RegisterError::DuplicateRoute {
                    path: full_path.to_string(),
                });
            }
            n.handler = Some(handler);
            return Ok(());
        }
    }

    /// Write `path` below `self`, expanding wildcard segments into
    /// parameter and catch-all nodes.
    fn insert_child(
        &mut self,
        path: &str,
        full_path: &str,
        handler: Handler,
    ) -> Result<(), RegisterError> {
        let mut n = self;
        let mut path = path;

        loop {
            let Some((wildcard, start, valid)) = find_wildcard(path) else {
                break;
            };

            if !valid {
                return Err(RegisterError::MixedWildcardSegment {
                    path: full_path.to_string(),
                });
            }
            if wildcard.len() < 2 {
                return Err(RegisterError::UnnamedWildcard {
                    path: full_path.to_string(),
                });
            }
            if !n.children.is_empty() {
                return Err(RegisterError::WildcardConflict {
                    path: full_path.to_string(),
                    conflict: String::from("existing children"),
                });
            }

            // the wildcard must occupy a whole segment
            let at_segment_start = if start > 0 {
                path.as_bytes()[start - 1] == b'/'
            } else {
                n.path.is_empty() || n.path.ends_with('/')
            };
            if !at_segment_start {
                return Err(RegisterError::MixedWildcardSegment {
                    path: full_path.to_string(),
                });
            }

            if wildcard.as_bytes()[0] == b':' {
                if start > 0 {
                    n.path = path[..start].to_string();
                    path = &path[start..];
                }

                n.wild_child = true;
                n.children = vec![Node {
                    path: wildcard.to_string(),
                    kind: NodeKind::Param,
                    priority: 1,
                    ..Node::default()
                }];
                n = &mut n.children[0];

                // a non-wildcard subpath follows this segment; it always
                // starts with '/'
                if wildcard.len() < path.len() {
                    path = &path[wildcard.len()..];
                    n.indices = vec![b'/'];
                    n.children = vec![Node {
                        priority: 1,
                        ..Node::default()
                    }];
                    n = &mut n.children[0];
                    continue;
                }

                n.params.push(wildcard[1..].to_string());
                n.handler = Some(handler);
                return Ok(());
            }

            // catch-all
            if start + wildcard.len() != path.len() {
                return Err(RegisterError::CatchAllNotAtEnd {
                    path: full_path.to_string(),
                });
            }
            if start == 0 {
                // the node's own trailing '/' would be shadowed by the
                // zero-length catch
                return Err(RegisterError::CatchAllRootConflict {
                    path: full_path.to_string(),
                });
            }

            let i = start - 1;
            let name = wildcard[1..].to_string();
            if i == 0 {
                // the node itself becomes the catch-all edge
                n.path = path.to_string();
                n.kind = NodeKind::CatchAll;
                n.params.push(name);
                n.handler = Some(handler);
                return Ok(());
            }

            n.path = path[..i].to_string();
            n.indices = vec![b'/'];
            n.children = vec![Node {
                path: path[i..].to_string(),
                kind: NodeKind::CatchAll,
                priority: 1,
                handler: Some(handler),
                params: vec![name],
                ..Node::default()
            }];
            return Ok(());
        }

        // no wildcard left: plain edge
        n.path = path.to_string();
        n.handler = Some(handler);
        Ok(())
    }

    /// Clone this node into a child carrying the suffix of its label and
    /// the existing subtree; keep the common prefix here.
    fn split_edge(&mut self, i: usize) {
        let child = Node {
            path: self.path[i..].to_string(),
            indices: std::mem::take(&mut self.indices),
            wild_child: self.wild_child,
            kind: NodeKind::Static,
            priority: self.priority - 1,
            children: std::mem::take(&mut self.children),
            handler: self.handler.take(),
            params: std::mem::take(&mut self.params),
        };

        self.indices = vec![self.path.as_bytes()[i]];
        self.path.truncate(i);
        self.children = vec![child];
        self.wild_child = false;
    }
}

fn longest_common_prefix(a: &str, b: &str) -> usize {
    let max = a.len().min(b.len());
    let (a, b) = (a.as_bytes(), b.as_bytes());
    let mut i = 0;
    while i < max && a[i] == b[i] {
        i += 1;
    }
    i
}

/// Locate the next wildcard in `path`. Returns the wildcard (sigil
/// included), its start offset, and whether the segment holds only that
/// one wildcard.
fn find_wildcard(path: &str) -> Option<(&str, usize, bool)> {
    let bytes = path.as_bytes();
    for (start, &c) in bytes.iter().enumerate() {
        if c != b':' && c != b'*' {
            continue;
        }
        let mut valid = true;
        for (end, &c) in bytes[start + 1..].iter().enumerate() {
            match c {
                b'/' => return Some((&path[start..start + 1 + end], start, valid)),
                b':' | b'*' => valid = false,
                _ => {}
            }
        }
        return Some((&path[start..], start, valid));
    }
    None
}
