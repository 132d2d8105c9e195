//! Value formatting shared by the spreadsheet exporters.
//!
//! Form rows arrive with loosely typed text: dates in several shapes,
//! numbers typed into text inputs, status words in mixed case. These helpers
//! turn them into the strings the templates expect.

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use regex::Regex;
use std::sync::OnceLock;

/// Parse the date part of a stored value.
///
/// Accepts `YYYY-MM-DD`, RFC 3339 timestamps and SQLite `YYYY-MM-DD HH:MM:SS`.
pub fn parse_date(text: &str) -> Option<NaiveDate> {
    let text = text.trim();
    if text.is_empty() {
        return None;
    }
    if let Ok(date) = NaiveDate::parse_from_str(text, "%Y-%m-%d") {
        return Some(date);
    }
    if let Ok(ts) = DateTime::parse_from_rfc3339(text) {
        return Some(ts.date_naive());
    }
    for pattern in ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"] {
        if let Ok(ts) = NaiveDateTime::parse_from_str(text, pattern) {
            return Some(ts.date());
        }
    }
    text.get(..10)
        .and_then(|head| NaiveDate::parse_from_str(head, "%Y-%m-%d").ok())
}

/// `DD/MM/YYYY`, or `N/A` when the value is not a date.
pub fn format_date_dmy(text: &str) -> String {
    match parse_date(text) {
        Some(date) => date.format("%d/%m/%Y").to_string(),
        None => "N/A".to_string(),
    }
}

/// Indian short date, `d/m/yyyy` without padding.
pub fn format_date_en_in(text: &str) -> String {
    match parse_date(text) {
        Some(date) => date.format("%-d/%-m/%Y").to_string(),
        None => "N/A".to_string(),
    }
}

/// Trim `HH:MM:SS` down to `HH:MM`.
pub fn format_time_hhmm(text: &str) -> String {
    let text = text.trim();
    if text.chars().count() == 5 {
        return text.to_string();
    }
    let parts: Vec<&str> = text.split(':').collect();
    if parts.len() >= 2 {
        format!("{}:{}", parts[0], parts[1])
    } else {
        text.to_string()
    }
}

fn float_prefix() -> &'static Regex {
    static FLOAT_PREFIX: OnceLock<Regex> = OnceLock::new();
    FLOAT_PREFIX.get_or_init(|| {
        Regex::new(r"^[+-]?(?:\d+\.?\d*|\.\d+)(?:[eE][+-]?\d+)?").expect("valid float regex")
    })
}

/// Leading-number parse: `"18.2 gsm"` is 18.2, `"abc"` is `None`.
pub fn parse_float_prefix(text: &str) -> Option<f64> {
    let text = text.trim_start();
    float_prefix()
        .find(text)
        .and_then(|m| m.as_str().parse::<f64>().ok())
        .filter(|n| n.is_finite())
}

/// Map a pass/fail word to the symbol printed on the checklists.
pub fn status_symbol(status: Option<&str>) -> String {
    match status.map(str::trim) {
        Some("Accept" | "accept" | "Pass" | "pass") => "✓".to_string(),
        Some("Reject" | "reject" | "Fail" | "fail") => "✗".to_string(),
        Some("NA" | "na" | "N/A" | "n/a") | None | Some("") => "N/A".to_string(),
        Some(other) => other.to_string(),
    }
}

/// Greedy word wrap into at most `max_lines` lines of `width` characters.
///
/// Newlines in the input are flattened first. A single word longer than
/// `width` gets a line of its own.
pub fn wrap_words(text: &str, width: usize, max_lines: usize) -> Vec<String> {
    let flat = text.replace('\n', " ");
    let flat = flat.trim();
    if flat.is_empty() {
        return Vec::new();
    }

    let mut lines = Vec::new();
    let mut current = String::new();
    for word in flat.split(' ') {
        let candidate_len = if current.is_empty() {
            word.chars().count()
        } else {
            current.chars().count() + 1 + word.chars().count()
        };
        if candidate_len <= width {
            if !current.is_empty() {
                current.push(' ');
            }
            current.push_str(word);
        } else if current.is_empty() {
            lines.push(word.to_string());
        } else {
            lines.push(std::mem::take(&mut current));
            current.push_str(word);
        }
    }
    if !current.is_empty() {
        lines.push(current);
    }

    lines
        .into_iter()
        .map(|line| line.trim().to_string())
        .take(max_lines)
        .collect()
}

fn jeddah_suffix() -> &'static Regex {
    static JEDDAH: OnceLock<Regex> = OnceLock::new();
    JEDDAH.get_or_init(|| Regex::new(r"(?i)\s*\([^)]*jeddah[^)]*\)").expect("valid jeddah regex"))
}

/// Drop a `(... Jeddah ...)` plant suffix from a product code.
pub fn clean_product_code(code: &str) -> String {
    if !code.to_lowercase().contains("jeddah") {
        return code.to_string();
    }
    jeddah_suffix().replace_all(code, "").trim().to_string()
}

fn unsafe_filename_chars() -> &'static Regex {
    static UNSAFE: OnceLock<Regex> = OnceLock::new();
    UNSAFE.get_or_init(|| Regex::new(r#"[\\/:*?"<>|\x00-\x1F\x7F]"#).expect("valid filename regex"))
}

/// Replace characters that cannot appear in a download filename.
pub fn sanitize_filename(name: &str) -> String {
    unsafe_filename_chars().replace_all(name, "-").into_owned()
}

/// Keep ASCII alphanumerics, underscore everything else.
pub fn slug_underscore(name: &str) -> String {
    name.chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
        .collect()
}
