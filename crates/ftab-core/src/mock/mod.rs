//! Realistic fake values for file variables.
//!
//! A [`MockRegistry`] is built once at startup and handed to
//! [`HttpFile::duplicate`](crate::httpfile::HttpFile::duplicate). It maps a
//! variable to a replacement by name first (`idcard`, `email`, `name`,
//! `mobile`, answered by the locale's [`Mocker`]) and then by the shape of
//! its current value (dates and times).

use std::collections::HashMap;
use std::sync::Arc;

pub mod cn;
pub mod patterns;

pub use cn::CnMocker;
pub use patterns::PatternMock;

/// Locale used when the configured one is unknown.
pub const DEFAULT_LOCALE: &str = "cn";

/// Variable names that are never mocked (compared lowercase).
const DO_NOT_MOCK: &[&str] = &["host", "port", "server"];

/// Locale-specific generator of personal data.
pub trait Mocker: Send + Sync {
    fn id_card(&self) -> String;
    fn email(&self) -> String;
    fn mobile(&self) -> String;
    fn name(&self) -> String;
}

pub struct MockRegistry {
    mockers: HashMap<String, Arc<dyn Mocker>>,
    locale: String,
    patterns: Vec<PatternMock>,
}

impl MockRegistry {
    /// A registry without mockers or patterns: every value passes through.
    pub fn empty() -> Self {
        Self {
            mockers: HashMap::new(),
            locale: DEFAULT_LOCALE.to_string(),
            patterns: Vec::new(),
        }
    }

    /// The `cn` mocker plus the builtin date/time shapes.
    pub fn builtin() -> Self {
        let mut registry = Self::empty();
        registry.register(DEFAULT_LOCALE, Arc::new(CnMocker::new()));
        registry.patterns = patterns::builtin_patterns();
        registry
    }

    /// Select the locale whose mocker answers name-based lookups.
    pub fn with_locale(mut self, locale: impl Into<String>) -> Self {
        let locale = locale.into();
        if !self.mockers.contains_key(&locale) {
            tracing::warn!(locale = %locale, fallback = DEFAULT_LOCALE, "unknown mocker locale");
        }
        self.locale = locale;
        self
    }

    pub fn register(&mut self, locale: impl Into<String>, mocker: Arc<dyn Mocker>) {
        self.mockers.insert(locale.into(), mocker);
    }

    /// Append a shape rule, checked after the builtin ones.
    pub fn add_pattern(&mut self, pattern: PatternMock) {
        self.patterns.push(pattern);
    }

    pub fn locale(&self) -> &str {
        &self.locale
    }

    /// Mocker for the selected locale, falling back to [`DEFAULT_LOCALE`].
    pub fn mocker(&self) -> Option<&dyn Mocker> {
        self.mockers
            .get(&self.locale)
            .or_else(|| self.mockers.get(DEFAULT_LOCALE))
            .map(|m| m.as_ref())
    }

    /// Replacement for variable `name` currently holding `original`.
    pub fn value(&self, name: &str, original: &str) -> String {
        let lower = name.to_lowercase();
        if DO_NOT_MOCK.contains(&lower.as_str()) {
            return original.to_string();
        }

        if let Some(mocker) = self.mocker() {
            match lower.as_str() {
                "idcard" => return mocker.id_card(),
                "email" => return mocker.email(),
                "name" => return mocker.name(),
                "mobile" => return mocker.mobile(),
                _ => {}
            }
        }

        self.patterns
            .iter()
            .find(|p| p.matches(original))
            .map(PatternMock::generate)
            .unwrap_or_else(|| original.to_string())
    }
}

impl Default for MockRegistry {
    fn default() -> Self {
        Self::builtin()
    }
}

impl std::fmt::Debug for MockRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut locales: Vec<&String> = self.mockers.keys().collect();
        locales.sort();
        f.debug_struct("MockRegistry")
            .field("locale", &self.locale)
            .field("mockers", &locales)
            .field("patterns", &self.patterns)
            .finish()
    }
}
