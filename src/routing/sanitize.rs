//! Sub-path normalization.

/// Normalize a sub-path before it is resolved against a rule target.
///
/// Drops every `|`, collapses runs of `/` into one, and strips the single
/// leading `/` that may remain. Stripping after collapsing keeps the function
/// idempotent (`"|/a"` and `"//a"` both become `"a"`).
///
/// Total: every input yields a path, possibly empty (the target root).
pub fn sanitize(sub_path: &str) -> String {
    let mut out = String::with_capacity(sub_path.len());
    for c in sub_path.chars().filter(|&c| c != '|') {
        if c == '/' && (out.is_empty() || out.ends_with('/')) {
            continue;
        }
        out.push(c);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn documented_examples() {
        assert_eq!(sanitize("//a//b/"), "a/b/");
        assert_eq!(sanitize("a|b"), "ab");
        assert_eq!(sanitize("/img/a.png"), "img/a.png");
        assert_eq!(sanitize("img/a.png"), "img/a.png");
        assert_eq!(sanitize(""), "");
        assert_eq!(sanitize("/"), "");
    }

    #[test]
    fn pipes_do_not_shield_slashes() {
        // Removing the pipe joins the slashes, which are then collapsed.
        assert_eq!(sanitize("a/|/b"), "a/b");
        assert_eq!(sanitize("|/a"), "a");
        assert_eq!(sanitize("/|/a"), "a");
    }

    #[test]
    fn idempotent() {
        let samples = [
            "", "/", "//", "///x", "a|b", "/|/|/", "|/a", "||//|a//b|/", "img/../a.png",
            "/%2e%2e/x", "\\..\\x", "ünï/cødé//ß",
        ];
        for p in samples {
            let once = sanitize(p);
            assert_eq!(sanitize(&once), once, "sanitize not idempotent for {p:?}");
        }
    }
}
