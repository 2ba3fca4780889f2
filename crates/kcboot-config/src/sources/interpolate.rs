//! `${name}` / `${name:default}` expansion of property values

use regex::{Captures, Regex};
use std::sync::LazyLock;

/// Nested expansions deeper than this are left as-is (breaks reference cycles)
const MAX_DEPTH: usize = 8;

static EXPRESSION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\$\{([^}:]+)(?::([^}]*))?\}").expect("interpolation pattern is valid")
});

/// Expand every expression in `value`, resolving names through `lookup`
///
/// Unresolved names fall back to the default, or to an empty string.
pub(crate) fn expand(value: &str, lookup: &dyn Fn(&str) -> Option<String>) -> String {
    expand_at(value, lookup, 0)
}

fn expand_at(value: &str, lookup: &dyn Fn(&str) -> Option<String>, depth: usize) -> String {
    if depth >= MAX_DEPTH || !value.contains("${") {
        return value.to_owned();
    }

    EXPRESSION
        .replace_all(value, |caps: &Captures<'_>| {
            let name = caps[1].trim();
            match lookup(name) {
                Some(found) => expand_at(&found, lookup, depth + 1),
                None => caps
                    .get(2)
                    .map(|default| expand_at(default.as_str(), lookup, depth + 1))
                    .unwrap_or_default(),
            }
        })
        .into_owned()
}
