//! Builtin literal-shape generators: a variable whose value looks like a date
//! or time is replaced with a random instant near now in the same shape.

use chrono::{Local, TimeDelta};
use rand::Rng;
use regex::Regex;

/// Half-width of the window random instants are drawn from.
const WINDOW_DAYS: i64 = 30;

/// A regex recognising a value shape and a generator producing a fresh
/// value of that shape.
pub struct PatternMock {
    pattern: Regex,
    generate: Box<dyn Fn() -> String + Send + Sync>,
}

impl PatternMock {
    pub fn new(pattern: Regex, generate: impl Fn() -> String + Send + Sync + 'static) -> Self {
        Self {
            pattern,
            generate: Box::new(generate),
        }
    }

    pub fn matches(&self, value: &str) -> bool {
        self.pattern.is_match(value)
    }

    pub fn generate(&self) -> String {
        (self.generate)()
    }
}

impl std::fmt::Debug for PatternMock {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PatternMock")
            .field("pattern", &self.pattern.as_str())
            .finish_non_exhaustive()
    }
}

/// Generator for a random local time within [`WINDOW_DAYS`] of now, rendered
/// with a strftime `format`.
pub fn date_time_mock(format: &'static str) -> impl Fn() -> String + Send + Sync + 'static {
    move || {
        let window = TimeDelta::days(WINDOW_DAYS).num_milliseconds();
        let shift = rand::thread_rng().gen_range(-window..window);
        let when = Local::now() + TimeDelta::milliseconds(shift);
        when.format(format).to_string()
    }
}

fn shape(pattern: &str, format: &'static str) -> PatternMock {
    let re = Regex::new(pattern).expect("builtin shape pattern is valid");
    PatternMock::new(re, date_time_mock(format))
}

/// The builtin shapes, checked in order.
pub fn builtin_patterns() -> Vec<PatternMock> {
    vec![
        shape(r"^\d{4}-\d{2}-\d{2}$", "%Y-%m-%d"),
        shape(r"^\d{4}/\d{2}/\d{2}$", "%Y/%m/%d"),
        shape(r"^\d{2}/\d{2}/\d{2}$", "%y/%m/%d"),
        shape(r"^\d{2}:\d{2}:\d{2}$", "%H:%M:%S"),
        shape(
            r"^\d{4}-\d{2}-\d{2}T\d{2}:\d{2}:\d{2}\.\d{3}$",
            "%Y-%m-%dT%H:%M:%S%.3f",
        ),
        shape(r"^\d{4}-\d{2}-\d{2} \d{2}:\d{2}:\d{2}$", "%Y-%m-%d %H:%M:%S"),
    ]
}
