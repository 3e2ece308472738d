//! `raw=true` redirect construction.

use url::{form_urlencoded, Url};

use super::query::{QueryParams, RAW_PARAM};
use crate::config::ProxyRule;

/// Placeholder substituted with the sanitized sub-path.
pub const PATH_PLACEHOLDER: &str = "{path}";

/// Build the URL a `raw=true` request is redirected to.
///
/// Uses the rule's `raw_redirect` template when present (first `{path}` only),
/// otherwise the resolved target. Every inbound query pair except `raw` is
/// carried over.
pub fn build_redirect(
    rule: &ProxyRule,
    sanitized_path: &str,
    resolved_target: &Url,
    query: &QueryParams,
) -> String {
    let mut location = match &rule.raw_redirect {
        Some(template) => template.replacen(PATH_PLACEHOLDER, sanitized_path, 1),
        None => resolved_target.to_string(),
    };

    let extra = form_urlencoded::Serializer::new(String::new())
        .extend_pairs(query.without(RAW_PARAM))
        .finish();

    if !extra.is_empty() {
        location.push(if location.contains('?') { '&' } else { '?' });
        location.push_str(&extra);
    }
    location
}

#[cfg(test)]
mod tests {
    use super::*;

    fn target(path: &str) -> Url {
        Url::parse("https://origin.example/base/").unwrap().join(path).unwrap()
    }

    #[test]
    fn template_with_query() {
        let rule = ProxyRule::new("/img/", "https://origin.example/base/")
            .with_raw_redirect("https://x/{path}");
        let query = QueryParams::parse(Some("v=2&raw=true"));
        assert_eq!(
            build_redirect(&rule, "img/a.png", &target("img/a.png"), &query),
            "https://x/img/a.png?v=2"
        );
    }

    #[test]
    fn falls_back_to_target() {
        let rule = ProxyRule::new("/img/", "https://origin.example/base/");
        let query = QueryParams::parse(Some("raw=true"));
        assert_eq!(
            build_redirect(&rule, "a.png", &target("a.png"), &query),
            "https://origin.example/base/a.png"
        );
    }

    #[test]
    fn joins_onto_existing_query() {
        let rule = ProxyRule::new("/img/", "https://origin.example/")
            .with_raw_redirect("https://mirror.example/get?file={path}");
        let query = QueryParams::parse(Some("raw=true&w=100&h=a+b"));
        assert_eq!(
            build_redirect(&rule, "a.png", &target("a.png"), &query),
            "https://mirror.example/get?file=a.png&w=100&h=a+b"
        );
    }

    #[test]
    fn only_first_placeholder_is_replaced() {
        let rule = ProxyRule::new("/", "https://origin.example/")
            .with_raw_redirect("https://m.example/{path}#{path}");
        let query = QueryParams::default();
        assert_eq!(
            build_redirect(&rule, "a.png", &target("a.png"), &query),
            "https://m.example/a.png#{path}"
        );
    }
}
