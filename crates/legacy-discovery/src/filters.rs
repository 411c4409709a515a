//! Include/exclude glob filtering, applied after discovery and before page
//! selection (C3, spec §4.3). Supports `*` and `?` only — sufficient for the
//! path-style patterns the spec names (`/admin/*`, `*.pdf`).

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterMode {
    Include,
    Exclude,
}

/// `true` if `path` matches any of `patterns`.
pub fn matches_any(path: &str, patterns: &[String]) -> bool {
    patterns.iter().any(|p| glob_match(p, path))
}

/// Applies include/exclude pattern lists to a path, honoring `mode` when both
/// lists are non-empty (§4.3: `url_filter_mode` resolves precedence).
pub fn passes_filters(
    path: &str,
    include: &[String],
    exclude: &[String],
    mode: FilterMode,
) -> bool {
    let include_hit = include.is_empty() || matches_any(path, include);
    let exclude_hit = matches_any(path, exclude);

    if !include.is_empty() && !exclude.is_empty() {
        return match mode {
            FilterMode::Include => include_hit,
            FilterMode::Exclude => !exclude_hit,
        };
    }
    if !exclude.is_empty() {
        return !exclude_hit;
    }
    include_hit
}

/// Minimal glob matcher over `*` (any run of characters) and `?` (single
/// character), matched as a dynamic-programming table over the full string.
fn glob_match(pattern: &str, text: &str) -> bool {
    let p: Vec<char> = pattern.chars().collect();
    let t: Vec<char> = text.chars().collect();
    let mut dp = vec![vec![false; t.len() + 1]; p.len() + 1];
    dp[0][0] = true;
    for i in 1..=p.len() {
        if p[i - 1] == '*' {
            dp[i][0] = dp[i - 1][0];
        }
    }
    for i in 1..=p.len() {
        for j in 1..=t.len() {
            dp[i][j] = match p[i - 1] {
                '*' => dp[i - 1][j] || dp[i][j - 1],
                '?' => dp[i - 1][j - 1],
                c => dp[i - 1][j - 1] && c == t[j - 1],
            };
        }
    }
    dp[p.len()][t.len()]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn glob_match_supports_star_and_question() {
        assert!(glob_match("/admin/*", "/admin/users"));
        assert!(glob_match("*.pdf", "report.pdf"));
        assert!(!glob_match("*.pdf", "report.pdf.bak"));
        assert!(glob_match("/a?c", "/abc"));
        assert!(!glob_match("/a?c", "/abbc"));
    }

    #[test]
    fn exclude_mode_with_both_lists_prefers_exclude() {
        let include = vec!["/blog/*".to_string()];
        let exclude = vec!["/blog/draft*".to_string()];
        assert!(!passes_filters(
            "/blog/draft-1",
            &include,
            &exclude,
            FilterMode::Exclude
        ));
        assert!(passes_filters(
            "/blog/post-1",
            &include,
            &exclude,
            FilterMode::Exclude
        ));
    }

    #[test]
    fn exclude_only_rejects_matches() {
        assert!(!passes_filters(
            "/admin/x",
            &[],
            &["/admin/*".to_string()],
            FilterMode::Exclude
        ));
        assert!(passes_filters(
            "/about",
            &[],
            &["/admin/*".to_string()],
            FilterMode::Exclude
        ));
    }
}
