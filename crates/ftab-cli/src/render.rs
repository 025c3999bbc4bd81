use std::fmt::Write as _;

use ftab_core::engine::Report;

use crate::args::OutputFormat;

pub fn render(report: &Report, format: OutputFormat) -> Result<String, serde_json::Error> {
    match format {
        OutputFormat::Human => Ok(render_human(report)),
        OutputFormat::Plain => Ok(render_plain(report)),
        OutputFormat::Json => render_json(report),
    }
}

fn line(out: &mut String, label: &str, value: impl std::fmt::Display) {
    let _ = writeln!(out, "{label:<20}: {value}");
}

/// Raw numbers, one `label: value` per line. Times are seconds, speeds are
/// bytes per second.
pub fn render_plain(r: &Report) -> String {
    let mut out = String::new();
    line(&mut out, "Total Requests", r.total_requests);
    line(&mut out, "Concurrency", r.concurrency);
    line(&mut out, "Succeeded", r.succeeded);
    line(&mut out, "Failed", r.failed);
    line(&mut out, "Time Used", r.total_time);
    line(&mut out, "Requests Per Second", r.requests_per_second);
    line(&mut out, "Send Speed", r.send_rate);
    line(&mut out, "Recv Speed", r.recv_rate);
    out.push('\n');
    line(&mut out, "Avg Time Used", r.avg_time);
    line(&mut out, "Min Time Used", r.min_time);
    line(&mut out, "Max Time Used", r.max_time);
    out.push('\n');
    line(&mut out, "P50 Time Used", r.p50_time);
    line(&mut out, "P75 Time Used", r.p75_time);
    line(&mut out, "P90 Time Used", r.p90_time);
    line(&mut out, "P95 Time Used", r.p95_time);
    line(&mut out, "P99 Time Used", r.p99_time);
    out
}

/// Same layout as [`render_plain`] with grouped digits and units.
pub fn render_human(r: &Report) -> String {
    let mut out = String::new();
    line(&mut out, "Total Requests", thousands(r.total_requests));
    line(&mut out, "Concurrency", thousands(r.concurrency as u64));
    line(&mut out, "Succeeded", thousands(r.succeeded));
    line(&mut out, "Failed", thousands(r.failed));
    out.push('\n');
    line(&mut out, "Time Used", human_duration(r.total_time));
    line(
        &mut out,
        "Requests Per Second",
        format!("{}/s", thousands(r.requests_per_second.round() as u64)),
    );
    line(&mut out, "Send Speed", format!("{}/s", byte_size(r.send_rate)));
    line(&mut out, "Recv Speed", format!("{}/s", byte_size(r.recv_rate)));
    out.push('\n');
    line(&mut out, "Avg Time Used", human_duration(r.avg_time));
    line(&mut out, "Min Time Used", human_duration(r.min_time));
    line(&mut out, "Max Time Used", human_duration(r.max_time));
    out.push('\n');
    line(&mut out, "P50 Time Used", human_duration(r.p50_time));
    line(&mut out, "P75 Time Used", human_duration(r.p75_time));
    line(&mut out, "P90 Time Used", human_duration(r.p90_time));
    line(&mut out, "P95 Time Used", human_duration(r.p95_time));
    line(&mut out, "P99 Time Used", human_duration(r.p99_time));
    out
}

pub fn render_json(r: &Report) -> Result<String, serde_json::Error> {
    let mut out = serde_json::to_string_pretty(r)?;
    out.push('\n');
    Ok(out)
}

/// `1234567` -> `1,234,567`
fn thousands(n: u64) -> String {
    let digits = n.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    out
}

/// Up to three decimals, trailing zeros dropped.
fn trim_decimal(value: f64) -> String {
    let s = format!("{value:.3}");
    let s = s.trim_end_matches('0').trim_end_matches('.');
    s.to_string()
}

/// Seconds as `850ns`, `12.5µs`, `250ms`, `1.5s`, `2m3.25s` or `1h0m5s`.
fn human_duration(secs: f64) -> String {
    if !secs.is_finite() || secs <= 0.0 {
        return "0s".to_string();
    }
    if secs < 1e-6 {
        return format!("{}ns", (secs * 1e9).round() as u64);
    }
    if secs < 1e-3 {
        return format!("{}µs", trim_decimal(secs * 1e6));
    }
    if secs < 1.0 {
        return format!("{}ms", trim_decimal(secs * 1e3));
    }

    // Round to whole milliseconds once so the carry reaches minutes and hours.
    let total_ms = (secs * 1e3).round() as u64;
    if total_ms < 60_000 {
        return format!("{}s", trim_decimal(total_ms as f64 / 1e3));
    }

    let whole_minutes = total_ms / 60_000;
    let rest = (total_ms % 60_000) as f64 / 1e3;
    let (hours, minutes) = (whole_minutes / 60, whole_minutes % 60);
    if hours > 0 {
        format!("{hours}h{minutes}m{}s", trim_decimal(rest))
    } else {
        format!("{minutes}m{}s", trim_decimal(rest))
    }
}

/// Bytes with a binary unit: `512.000B`, `1.500K`, `3.000M`, `1.000G`.
fn byte_size(bytes: f64) -> String {
    const KIB: f64 = 1024.0;
    let (value, unit) = if bytes < KIB {
        (bytes, "B")
    } else if bytes < KIB * KIB {
        (bytes / KIB, "K")
    } else if bytes < KIB * KIB * KIB {
        (bytes / (KIB * KIB), "M")
    } else {
        (bytes / (KIB * KIB * KIB), "G")
    };
    format!("{value:.3}{unit}")
}
