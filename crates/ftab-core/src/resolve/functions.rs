//! Built-in `$function` placeholders.
//!
//! A key starting with `$` is split on whitespace into a function name and
//! its arguments:
//!
//! | key                                   | value                              |
//! |---------------------------------------|------------------------------------|
//! | `$timestamp [offset unit]`            | Unix seconds                       |
//! | `$timestampms [offset unit]`          | Unix milliseconds                  |
//! | `$randomInt [min max]`                | integer in `[min, min + max)`      |
//! | `$datetime [layout] [offset unit]`    | formatted current UTC time         |
//! | `$localDatetime [layout] [offset unit]` | formatted current local time     |
//! | `$randomFromFile path`                | a random line of `path`            |
//!
//! `unit` is one of `y M d h m s ms`. `layout` is `rfc3339`, `rfc1123`,
//! `iso8601` or a mini-format such as `YYYY-MM-DD HH:mm:ss.SSS`.

use std::fmt::Write as _;
use std::path::Path;
use std::sync::OnceLock;

use chrono::{DateTime, Local, Months, SecondsFormat, TimeDelta, TimeZone, Utc};
use rand::Rng;
use regex::{Captures, Regex};

use crate::resolve::file_cache::FileLineCache;

/// Evaluate a built-in function key. `None` for unknown function names.
pub fn evaluate(key: &str) -> Option<String> {
    let args: Vec<&str> = key.split_whitespace().collect();
    let name = *args.first()?;
    let value = match name {
        "$timestamp" => timestamp(&args),
        "$timestampms" => timestamp_ms(&args),
        "$randomInt" => random_int(&args),
        "$datetime" => datetime(&args, Utc::now()),
        "$localDatetime" => datetime(&args, Local::now()),
        "$randomFromFile" => random_from_file(&args),
        _ => return None,
    };
    Some(value)
}

// ---------------------------------------------------------------------------
// Time offsets
// ---------------------------------------------------------------------------

/// Shift `now` by `offset` units. Unparsable offsets, unknown units and
/// out-of-range results leave `now` unchanged.
pub(crate) fn apply_offset<Tz: TimeZone>(now: DateTime<Tz>, offset: &str, unit: &str) -> DateTime<Tz> {
    let Ok(n) = offset.parse::<i64>() else {
        return now;
    };

    let shifted = match unit {
        "y" => shift_months(now.clone(), n.checked_mul(12)),
        "M" => shift_months(now.clone(), Some(n)),
        "d" => TimeDelta::try_days(n).and_then(|d| now.clone().checked_add_signed(d)),
        "h" => TimeDelta::try_hours(n).and_then(|d| now.clone().checked_add_signed(d)),
        "m" => TimeDelta::try_minutes(n).and_then(|d| now.clone().checked_add_signed(d)),
        "s" => TimeDelta::try_seconds(n).and_then(|d| now.clone().checked_add_signed(d)),
        "ms" => TimeDelta::try_milliseconds(n).and_then(|d| now.clone().checked_add_signed(d)),
        _ => None,
    };
    shifted.unwrap_or(now)
}

fn shift_months<Tz: TimeZone>(now: DateTime<Tz>, months: Option<i64>) -> Option<DateTime<Tz>> {
    let months = months?;
    let magnitude = Months::new(u32::try_from(months.unsigned_abs()).ok()?);
    if months >= 0 {
        now.checked_add_months(magnitude)
    } else {
        now.checked_sub_months(magnitude)
    }
}

fn now_with_offset(offset: Option<(&str, &str)>) -> DateTime<Utc> {
    let now = Utc::now();
    match offset {
        Some((n, unit)) => apply_offset(now, n, unit),
        None => now,
    }
}

// ---------------------------------------------------------------------------
// $timestamp / $timestampms
// ---------------------------------------------------------------------------

fn trailing_offset<'a>(args: &[&'a str], expected_len: usize) -> Option<(&'a str, &'a str)> {
    if args.len() == expected_len {
        Some((args[expected_len - 2], args[expected_len - 1]))
    } else {
        None
    }
}

fn timestamp(args: &[&str]) -> String {
    now_with_offset(trailing_offset(args, 3)).timestamp().to_string()
}

fn timestamp_ms(args: &[&str]) -> String {
    now_with_offset(trailing_offset(args, 3))
        .timestamp_millis()
        .to_string()
}

// ---------------------------------------------------------------------------
// $randomInt
// ---------------------------------------------------------------------------

/// `$randomInt min max` is uniform over `[min, min + max)`; a non-positive
/// `max` yields `min`. Without (valid) bounds any non-negative `i64`.
fn random_int(args: &[&str]) -> String {
    let mut rng = rand::thread_rng();
    let bounds = if args.len() == 3 {
        args[1].parse::<i64>().ok().zip(args[2].parse::<i64>().ok())
    } else {
        None
    };

    let n = match bounds {
        Some((min, max)) if max > 0 => min.saturating_add(rng.gen_range(0..max)),
        Some((min, _)) => min,
        None => rng.gen_range(0..=i64::MAX),
    };
    n.to_string()
}

// ---------------------------------------------------------------------------
// $datetime / $localDatetime
// ---------------------------------------------------------------------------

fn datetime<Tz: TimeZone>(args: &[&str], now: DateTime<Tz>) -> String
where
    Tz::Offset: std::fmt::Display,
{
    let layout = args.get(1).copied().unwrap_or("rfc3339");
    let now = match trailing_offset(args, 4) {
        Some((n, unit)) => apply_offset(now, n, unit),
        None => now,
    };
    format_time(&now, layout)
}

/// Render `time` with a named layout or a mini-format string.
pub fn format_time<Tz: TimeZone>(time: &DateTime<Tz>, layout: &str) -> String
where
    Tz::Offset: std::fmt::Display,
{
    match layout {
        "rfc3339" => time.to_rfc3339_opts(SecondsFormat::Secs, true),
        "rfc1123" => time
            .with_timezone(&Utc)
            .format("%a, %d %b %Y %H:%M:%S GMT")
            .to_string(),
        "iso8601" => time.to_rfc3339_opts(SecondsFormat::Millis, false),
        other => {
            let pattern = strftime_from_layout(other);
            let mut out = String::new();
            // chrono reports malformed patterns through fmt::Error.
            if write!(out, "{}", time.format(&pattern)).is_err() {
                return String::new();
            }
            out
        }
    }
}

fn layout_token() -> &'static Regex {
    static TOKEN: OnceLock<Regex> = OnceLock::new();
    TOKEN.get_or_init(|| Regex::new(r"[YMDHmsSZd]+").expect("layout token pattern is valid"))
}

/// Translate a mini-format layout into a chrono strftime pattern.
///
/// Runs of layout letters that are not a known token are copied verbatim.
pub(crate) fn strftime_from_layout(layout: &str) -> String {
    let escaped = layout.replace('%', "%%");
    layout_token()
        .replace_all(&escaped, |caps: &Captures| {
            let word = &caps[0];
            let directive = match word {
                "YYYY" => "%Y",
                "YY" => "%y",
                "M" => "%-m",
                "MM" => "%m",
                "MMM" => "%b",
                "MMMM" => "%B",
                "D" => "%-d",
                "DD" => "%d",
                "ddd" => "%a",
                "dddd" => "%A",
                "H" => "%-H",
                "HH" => "%H",
                "m" => "%-M",
                "mm" => "%M",
                "s" => "%-S",
                "ss" => "%S",
                "SSS" => "%3f",
                "Z" => "%:z",
                "ZZ" => "%z",
                _ => word,
            };
            directive.to_string()
        })
        .into_owned()
}

// ---------------------------------------------------------------------------
// $randomFromFile
// ---------------------------------------------------------------------------

fn random_from_file(args: &[&str]) -> String {
    match args.get(1) {
        Some(path) => FileLineCache::global().random_line(Path::new(path)),
        None => String::new(),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
