//! Human-readable byte quantities
//!
//! Sizes in tool output are a telemetry signal, not something correctness
//! depends on, so anything that does not parse is simply 0 bytes.

use regex::Regex;
use std::sync::LazyLock;

#[allow(clippy::expect_used)]
static SIZE_TOKEN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(\d+(?:\.\d+)?)\s?(KiB|MiB|GiB|TiB|KB|MB|GB|TB|B)\b(/s)?")
        .expect("size pattern should compile")
});

/// Multiplier for a unit suffix
///
/// Binary units step by 1024, decimal units by 1000.
fn multiplier(unit: &str) -> Option<f64> {
    let factor = match unit {
        "B" => 1.0,
        "KiB" => 1024.0,
        "MiB" => 1024.0 * 1024.0,
        "GiB" => 1024.0 * 1024.0 * 1024.0,
        "TiB" => 1024.0 * 1024.0 * 1024.0 * 1024.0,
        "KB" => 1e3,
        "MB" => 1e6,
        "GB" => 1e9,
        "TB" => 1e12,
        _ => return None,
    };
    Some(factor)
}

fn to_bytes(number: &str, unit: &str) -> u64 {
    match (number.parse::<f64>(), multiplier(unit)) {
        (Ok(value), Some(factor)) if value.is_finite() => (value * factor).round() as u64,
        _ => 0,
    }
}

/// Parse a single size token such as `12.3MiB` or `~5GB`
///
/// Returns 0 when the text is not a size token.
///
/// # Examples
///
/// ```
/// use media_relay::size::parse_size;
///
/// assert_eq!(parse_size("5GB"), 5_000_000_000);
/// assert_eq!(parse_size("1KiB"), 1024);
/// assert_eq!(parse_size("fast"), 0);
/// ```
pub fn parse_size(text: &str) -> u64 {
    let token = text.trim().trim_start_matches('~').trim();
    let Some(captures) = SIZE_TOKEN.captures(token) else {
        return 0;
    };

    // The whole token must be the size; "12MiB of stuff" is not a size token.
    let Some(whole) = captures.get(0) else {
        return 0;
    };
    if whole.start() != 0 || whole.end() != token.len() || captures.get(3).is_some() {
        return 0;
    }

    to_bytes(&captures[1], &captures[2])
}

/// Every size token in a line, in order, as byte counts
///
/// Transfer rates (`1.2MiB/s`) are skipped.
pub fn find_sizes(line: &str) -> Vec<u64> {
    SIZE_TOKEN
        .captures_iter(line)
        .filter(|captures| captures.get(3).is_none())
        .map(|captures| to_bytes(&captures[1], &captures[2]))
        .collect()
}
