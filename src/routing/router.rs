//! Route table and target resolution.
//!
//! # Responsibilities
//! - Compile configured rules (parse targets once, at startup)
//! - Look up the route for a request path
//! - Resolve a sanitized sub-path against a route's target
//!
//! # Design Decisions
//! - Immutable after construction (thread-safe without locks)
//! - O(n) path prefix scan (acceptable for typical rule counts)
//! - Config order is authoritative; longest-prefix ordering is opt-in only
//! - A resolved URL must stay under its target (same origin, same directory)

use url::Url;

use super::matcher::{match_route, PathPrefixMatcher, RouteMatch};
use crate::config::validation::{parse_target, ValidationError};
use crate::config::ProxyRule;

/// Why a sub-path could not be resolved under a route's target.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("path `{path}` does not resolve under target {target}")]
pub struct EscapeError {
    pub path: String,
    pub target: String,
}

/// A compiled proxy rule.
#[derive(Debug, Clone)]
pub struct Route {
    rule: ProxyRule,
    matcher: PathPrefixMatcher,
    target: Url,
    /// `target` path up to and including its last `/`.
    target_dir_len: usize,
}

impl Route {
    pub fn compile(rule: ProxyRule) -> Result<Self, ValidationError> {
        let target = parse_target(&rule.target).map_err(|reason| ValidationError::InvalidTarget {
            index: 0,
            prefix: rule.prefix.clone(),
            target: rule.target.clone(),
            reason,
        })?;
        let target_dir_len = target.path().rfind('/').map_or(0, |i| i + 1);

        Ok(Self {
            matcher: PathPrefixMatcher::new(rule.prefix.clone()),
            rule,
            target,
            target_dir_len,
        })
    }

    pub fn rule(&self) -> &ProxyRule {
        &self.rule
    }

    pub fn matcher(&self) -> &PathPrefixMatcher {
        &self.matcher
    }

    pub fn target(&self) -> &Url {
        &self.target
    }

    /// Resolve `sanitized` against the target with standard URL joining.
    ///
    /// Rejects anything that lands outside the target's origin or directory:
    /// dot segments (plain or percent-encoded), backslashes, and inputs that
    /// parse as absolute URLs.
    pub fn resolve(&self, sanitized: &str) -> Result<Url, EscapeError> {
        let escape = || EscapeError {
            path: sanitized.to_string(),
            target: self.target.to_string(),
        };

        let mut resolved = self.target.join(sanitized).map_err(|_| escape())?;
        resolved.set_fragment(None);

        let dir = &self.target.path()[..self.target_dir_len];
        if resolved.origin() != self.target.origin() || !resolved.path().starts_with(dir) {
            return Err(escape());
        }
        Ok(resolved)
    }
}

/// Immutable route table.
#[derive(Debug, Clone, Default)]
pub struct Router {
    routes: Vec<Route>,
}

impl Router {
    /// Compile `rules`, keeping their order unless `longest_prefix_first`.
    pub fn from_rules(
        rules: Vec<ProxyRule>,
        longest_prefix_first: bool,
    ) -> Result<Self, Vec<ValidationError>> {
        let mut routes = Vec::with_capacity(rules.len());
        let mut errors = Vec::new();

        for (index, rule) in rules.into_iter().enumerate() {
            match Route::compile(rule) {
                Ok(route) => routes.push(route),
                Err(ValidationError::InvalidTarget { prefix, target, reason, .. }) => {
                    errors.push(ValidationError::InvalidTarget { index, prefix, target, reason })
                }
                Err(other) => errors.push(other),
            }
        }
        if !errors.is_empty() {
            return Err(errors);
        }

        if longest_prefix_first {
            // Stable: equal-length prefixes keep their written order.
            routes.sort_by(|a, b| b.rule.prefix.len().cmp(&a.rule.prefix.len()));
        }

        Ok(Self { routes })
    }

    /// Find the route for a request path.
    pub fn match_path<'a>(&'a self, path: &'a str) -> Option<RouteMatch<'a>> {
        match_route(&self.routes, path)
    }

    pub fn routes(&self) -> &[Route] {
        &self.routes
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn route(target: &str) -> Route {
        Route::compile(ProxyRule::new("/p/", target)).unwrap()
    }

    #[test]
    fn resolves_relative_to_target() {
        let r = route("https://cdn.example/gh/user/repo@master/");
        assert_eq!(
            r.resolve("img/a.png").unwrap().as_str(),
            "https://cdn.example/gh/user/repo@master/img/a.png"
        );
        assert_eq!(r.resolve("").unwrap().as_str(), "https://cdn.example/gh/user/repo@master/");
    }

    #[test]
    fn keeps_port_and_normalizes_inner_dots() {
        let r = route("https://cdn.imlazy.ink:233/img/background/");
        assert_eq!(
            r.resolve("x/../a.png").unwrap().as_str(),
            "https://cdn.imlazy.ink:233/img/background/a.png"
        );
    }

    #[test]
    fn rejects_traversal_out_of_target() {
        let r = route("https://cdn.example/gh/repo/");
        for path in [
            "..",
            "../secret",
            "a/../../secret",
            "%2e%2e/secret",
            ".%2E/secret",
            "..\\secret",
            "a\\..\\..\\secret",
        ] {
            assert!(r.resolve(path).is_err(), "{path:?} escaped the target");
        }
    }

    #[test]
    fn rejects_absolute_and_scheme_relative_inputs() {
        let r = route("https://cdn.example/gh/");
        for path in [
            "http:/evil.example/x",
            "https:/evil.example/x",
            "\\\\evil.example/x",
            "javascript:alert(1)",
        ] {
            assert!(r.resolve(path).is_err(), "{path:?} escaped the target");
        }
    }

    #[test]
    fn file_like_target_resolves_beside_it() {
        // URL joining replaces the last segment when the target has no trailing slash.
        let r = route("https://cdn.example/img/index.html");
        assert_eq!(r.resolve("a.png").unwrap().as_str(), "https://cdn.example/img/a.png");
    }

    #[test]
    fn longest_prefix_is_opt_in() {
        let rules = vec![
            ProxyRule::new("/", "https://fallback.example/"),
            ProxyRule::new("/imlazy/", "https://imlazy.example/"),
        ];

        let ordered = Router::from_rules(rules.clone(), false).unwrap();
        assert_eq!(ordered.match_path("/imlazy/a.png").unwrap().route.rule().prefix, "/");

        let sorted = Router::from_rules(rules, true).unwrap();
        let m = sorted.match_path("/imlazy/a.png").unwrap();
        assert_eq!(m.route.rule().prefix, "/imlazy/");
        assert_eq!(m.sub_path, "a.png");
    }

    #[test]
    fn reports_bad_targets_with_their_index() {
        let rules = vec![
            ProxyRule::new("/ok/", "https://ok.example/"),
            ProxyRule::new("/bad/", "gopher://old.example/"),
        ];
        let errors = Router::from_rules(rules, false).unwrap_err();
        assert!(matches!(errors[0], ValidationError::InvalidTarget { index: 1, .. }));
    }
}
