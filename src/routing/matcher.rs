//! Route matching logic.
//!
//! # Responsibilities
//! - Match path prefix (case-sensitive, literal)
//! - Return the remainder of the path after the prefix
//!
//! # Design Decisions
//! - Literal string-prefix test, not segment-aware: "/img" matches "/images"
//! - No regex to guarantee O(n) matching
//! - First match in list order wins; callers decide the order

use super::router::Route;

/// Matches and strips a literal path prefix.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathPrefixMatcher {
    prefix: String,
}

impl PathPrefixMatcher {
    /// Create a new path prefix matcher.
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
        }
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// The part of `path` after the prefix, if the prefix matches.
    pub fn strip<'p>(&self, path: &'p str) -> Option<&'p str> {
        path.strip_prefix(self.prefix.as_str())
    }
}

/// A matched route and the sub-path left after removing its prefix.
#[derive(Debug, Clone, Copy)]
pub struct RouteMatch<'a> {
    pub route: &'a Route,
    pub sub_path: &'a str,
}

/// First route, in slice order, whose prefix starts `path`.
pub fn match_route<'a>(routes: &'a [Route], path: &'a str) -> Option<RouteMatch<'a>> {
    routes.iter().find_map(|route| {
        route
            .matcher()
            .strip(path)
            .map(|sub_path| RouteMatch { route, sub_path })
    })
}
