use std::fmt;

/// Registration-time failures. These are programmer errors: they indicate
/// a bug in the route table, so startup code is expected to fail loudly on
/// them rather than continue.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub enum RegisterError {
    /// Route paths must begin with `/`.
    PathMissingLeadingSlash { path: String },
    /// A handler is already registered for this (method, path).
    DuplicateRoute { path: String },
    /// `:` or `*` with no name behind it.
    UnnamedWildcard { path: String },
    /// A segment mixes literals and wildcards, or holds more than one
    /// wildcard.
    MixedWildcardSegment { path: String },
    /// The wildcard cannot be reached, or makes existing routes
    /// unreachable.
    WildcardConflict { path: String, conflict: String },
    /// `*name` must be the final segment.
    CatchAllNotAtEnd { path: String },
    /// The catch-all would shadow the existing handle for the segment
    /// root (the path already ends in `/`).
    CatchAllRootConflict { path: String },
}

impl RegisterError {
    /// The full path whose registration failed.
    pub fn path(&self) -> &str {
        match self {
            RegisterError::PathMissingLeadingSlash { path }
            | RegisterError::DuplicateRoute { path }
            | RegisterError::UnnamedWildcard { path }
            | RegisterError::MixedWildcardSegment { path }
            | RegisterError::WildcardConflict { path, .. }
            | RegisterError::CatchAllNotAtEnd { path }
            | RegisterError::CatchAllRootConflict { path } => path,
        }
    }
}

impl fmt::Display for RegisterError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RegisterError::PathMissingLeadingSlash { path } => {
                write!(f, "path '{path}' must begin with '/'")
            }
            RegisterError::DuplicateRoute { path } => {
                write!(f, "a route already exists for '{path}'")
            }
            RegisterError::UnnamedWildcard { path } => {
                write!(f, "wildcards must carry a non-empty name in '{path}'")
            }
            RegisterError::MixedWildcardSegment { path } => {
                write!(f, "only one whole-segment wildcard is allowed per segment in '{path}'")
            }
            RegisterError::WildcardConflict { path, conflict } => {
                write!(f, "'{path}' conflicts with {conflict}")
            }
            RegisterError::CatchAllNotAtEnd { path } => {
                write!(f, "catch-all is only allowed as the final segment in '{path}'")
            }
            RegisterError::CatchAllRootConflict { path } => {
                write!(
                    f,
                    "catch-all in '{path}' conflicts with the existing handle for the segment root"
                )
            }
        }
    }
}

impl std::error::Error for RegisterError {}
