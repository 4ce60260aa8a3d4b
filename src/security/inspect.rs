//! Suspicious-content detection.
//!
//! Heuristic substring checks over the request body, decoded query, raw URL
//! and user agent. Detection is observational: callers log findings and
//! let the request through.

/// A named needle matched against normalised request text.
#[derive(Debug, Clone, Copy)]
pub struct SuspiciousPattern {
    pub name: &'static str,
    needle: &'static str,
}

const fn pattern(name: &'static str, needle: &'static str) -> SuspiciousPattern {
    SuspiciousPattern { name, needle }
}

/// Needles are lowercase and written in normalised form (see `normalize`).
pub const DEFAULT_PATTERNS: &[SuspiciousPattern] = &[
    pattern("script_tag", "<script"),
    pattern("javascript_uri", "javascript:"),
    pattern("eval_call", "eval("),
    pattern("sql_union_select", "union select"),
    pattern("sql_drop_table", "drop table"),
    pattern("sql_insert_into", "insert into"),
    pattern("sql_delete_from", "delete from"),
    pattern("onerror_handler", "onerror="),
    pattern("onload_handler", "onload="),
    pattern("onclick_handler", "onclick="),
    pattern("onmouseover_handler", "onmouseover="),
    pattern("onfocus_handler", "onfocus="),
];

/// The parts of a request that are scanned.
#[derive(Debug, Clone, Copy, Default)]
pub struct RequestSample<'a> {
    pub url: &'a str,
    pub query: &'a str,
    pub body: &'a str,
    pub user_agent: &'a str,
}

/// Matches request samples against a fixed pattern list.
#[derive(Debug, Clone)]
pub struct ContentInspector {
    patterns: &'static [SuspiciousPattern],
}

impl Default for ContentInspector {
    fn default() -> Self {
        Self {
            patterns: DEFAULT_PATTERNS,
        }
    }
}

impl ContentInspector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Names of every pattern found in the sample, in list order.
    pub fn inspect(&self, sample: &RequestSample<'_>) -> Vec<&'static str> {
        let haystack = normalize(&[sample.body, sample.query, sample.url, sample.user_agent]);
        self.patterns
            .iter()
            .filter(|p| haystack.contains(p.needle))
            .map(|p| p.name)
            .collect()
    }
}

/// Lowercase, join with single spaces, collapse whitespace runs, and drop
/// whitespace directly before `=` or `(` so `onload = x` and `eval (x)`
/// still match.
fn normalize(parts: &[&str]) -> String {
    let capacity = parts.iter().map(|p| p.len() + 1).sum();
    let mut out = String::with_capacity(capacity);
    let mut pending_space = false;

    for part in parts {
        for c in part.chars().chain(std::iter::once(' ')) {
            if c.is_whitespace() {
                pending_space = !out.is_empty();
                continue;
            }
            if pending_space && c != '=' && c != '(' {
                out.push(' ');
            }
            pending_space = false;
            out.extend(c.to_lowercase());
        }
    }
    out
}
