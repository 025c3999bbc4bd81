//! Placeholder resolution: the [`Resolver`] capability, its static and
//! layered implementations, and `{{...}}` substitution over template text.
//!
//! The third implementation, an [`HttpFile`](crate::httpfile::HttpFile)
//! resolving its own variables, built-in functions and earlier cases'
//! request/response data, lives next to the file model.

use std::collections::HashMap;

pub mod file_cache;
pub mod functions;
pub mod jsonpath;

pub use file_cache::FileLineCache;

// ---------------------------------------------------------------------------
// Resolver
// ---------------------------------------------------------------------------

/// Maps a placeholder key to its current value.
///
/// `None` means "not found": the caller leaves the placeholder untouched.
pub trait Resolver: Send + Sync {
    fn lookup(&self, key: &str) -> Option<String>;
}

// ---------------------------------------------------------------------------
// MapResolver
// ---------------------------------------------------------------------------

/// Direct key lookup against a fixed mapping.
#[derive(Debug, Clone, Default)]
pub struct MapResolver {
    values: HashMap<String, String>,
}

impl MapResolver {
    pub fn new(values: HashMap<String, String>) -> Self {
        Self { values }
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.values.insert(key.into(), value.into());
    }
}

impl From<HashMap<String, String>> for MapResolver {
    fn from(values: HashMap<String, String>) -> Self {
        Self::new(values)
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for MapResolver {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self::new(
            iter.into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }
}

impl Resolver for MapResolver {
    fn lookup(&self, key: &str) -> Option<String> {
        self.values.get(key).cloned()
    }
}

impl Resolver for HashMap<String, String> {
    fn lookup(&self, key: &str) -> Option<String> {
        self.get(key).cloned()
    }
}

// ---------------------------------------------------------------------------
// ResolverChain
// ---------------------------------------------------------------------------

/// Ordered fallback list: the first resolver that knows a key wins.
#[derive(Default)]
pub struct ResolverChain<'a> {
    resolvers: Vec<&'a dyn Resolver>,
}

impl<'a> ResolverChain<'a> {
    pub fn new(resolvers: Vec<&'a dyn Resolver>) -> Self {
        Self { resolvers }
    }

    /// Append a resolver with lower priority than every existing one.
    pub fn push(&mut self, resolver: &'a dyn Resolver) {
        self.resolvers.push(resolver);
    }

    pub fn len(&self) -> usize {
        self.resolvers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.resolvers.is_empty()
    }
}

impl Resolver for ResolverChain<'_> {
    fn lookup(&self, key: &str) -> Option<String> {
        self.resolvers.iter().find_map(|r| r.lookup(key))
    }
}

// ---------------------------------------------------------------------------
// substitute
// ---------------------------------------------------------------------------

/// Replace every `{{ key }}` placeholder in `input` whose trimmed key the
/// resolver knows.
///
/// Unknown keys leave the placeholder exactly as written, so substitution can
/// run again later with a richer resolver. Placeholders do not nest and never
/// span lines; an unclosed `{{` is plain text.
pub fn substitute(input: &str, resolver: &dyn Resolver) -> String {
    // Fast path: nothing to substitute.
    if !input.contains("{{") {
        return input.to_string();
    }

    let mut result = String::with_capacity(input.len());
    let mut rest = input;

    while let Some(open) = rest.find("{{") {
        result.push_str(&rest[..open]);
        let after_open = &rest[open + 2..];

        // The key must be at least one character long.
        let close = match after_open.find("}}") {
            Some(0) => after_open[1..].find("}}").map(|i| i + 1),
            other => other,
        };

        match close {
            Some(close) if !after_open[..close].contains('\n') => {
                let end = open + 2 + close + 2;
                let key = after_open[..close].trim();
                match resolver.lookup(key) {
                    Some(value) => result.push_str(&value),
                    None => result.push_str(&rest[open..end]),
                }
                rest = &rest[end..];
            }
            _ => {
                result.push_str("{{");
                rest = after_open;
            }
        }
    }

    result.push_str(rest);
    result
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn make_map(pairs: &[(&str, &str)]) -> MapResolver {
        pairs.iter().copied().collect()
    }

    #[test]
    fn substitute_simple_variable() {
        let vars = make_map(&[("host", "example.com")]);
        assert_eq!(
            substitute("https://{{host}}/api", &vars),
            "https://example.com/api"
        );
    }

    #[test]
    fn substitute_trims_key_whitespace() {
        let vars = make_map(&[("server", "http://x")]);
        assert_eq!(substitute("{{ server }}", &vars), "http://x");
    }

    #[test]
    fn substitute_multiple_variables() {
        let vars = make_map(&[("base", "https://api.example.com"), ("version", "v2")]);
        assert_eq!(
            substitute("{{base}}/{{version}}/users", &vars),
            "https://api.example.com/v2/users"
        );
    }

    #[test]
    fn substitute_missing_variable_left_as_is() {
        let vars = MapResolver::default();
        assert_eq!(substitute("{{doesnotexist}}", &vars), "{{doesnotexist}}");
        assert_eq!(
            substitute("url/{{ missing }}/path", &vars),
            "url/{{ missing }}/path"
        );
    }

    #[test]
    fn substitute_mixed_hit_and_miss() {
        let vars = make_map(&[("a", "1")]);
        assert_eq!(substitute("{{a}}-{{b}}-{{a}}", &vars), "1-{{b}}-1");
    }

    #[test]
    fn substitute_is_idempotent_on_misses() {
        let vars = make_map(&[("a", "1")]);
        let once = substitute("{{a}} {{later}}", &vars);
        let twice = substitute(&once, &vars);
        assert_eq!(once, twice);

        let richer = make_map(&[("later", "2")]);
        assert_eq!(substitute(&once, &richer), "1 2");
    }

    #[test]
    fn substitute_unclosed_and_empty_are_literal() {
        let vars = make_map(&[("a", "1")]);
        assert_eq!(substitute("{{a", &vars), "{{a");
        assert_eq!(substitute("{{}}", &vars), "{{}}");
        assert_eq!(substitute("x {{a}} {{", &vars), "x 1 {{");
    }

    #[test]
    fn substitute_does_not_span_lines() {
        let vars = make_map(&[("a\nb", "x")]);
        assert_eq!(substitute("{{a\nb}}", &vars), "{{a\nb}}");
    }

    #[test]
    fn substitute_no_placeholders() {
        let vars = MapResolver::default();
        assert_eq!(
            substitute("https://example.com/api", &vars),
            "https://example.com/api"
        );
    }

    #[test]
    fn substitute_multibyte_text_around_placeholders() {
        let vars = make_map(&[("name", "张三")]);
        assert_eq!(substitute("你好 {{name}}！", &vars), "你好 张三！");
    }

    #[test]
    fn chain_first_hit_wins() {
        let high = make_map(&[("server", "http://override")]);
        let low = make_map(&[("server", "http://file"), ("port", "80")]);
        let chain = ResolverChain::new(vec![&high as &dyn Resolver, &low]);
        assert_eq!(chain.lookup("server").as_deref(), Some("http://override"));
        assert_eq!(chain.lookup("port").as_deref(), Some("80"));
        assert!(chain.lookup("nope").is_none());
    }

    #[test]
    fn empty_chain_finds_nothing() {
        let chain = ResolverChain::default();
        assert!(chain.is_empty());
        assert!(chain.lookup("anything").is_none());
    }

    #[test]
    fn chain_push_appends_lowest_priority() {
        let first = make_map(&[("k", "first")]);
        let second = make_map(&[("k", "second"), ("only", "second")]);
        let mut chain = ResolverChain::new(vec![&first as &dyn Resolver]);
        chain.push(&second);
        assert_eq!(chain.len(), 2);
        assert_eq!(chain.lookup("k").as_deref(), Some("first"));
        assert_eq!(chain.lookup("only").as_deref(), Some("second"));
    }
}
