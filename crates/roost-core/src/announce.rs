//! The port announcement protocol.
//!
//! The API server emits exactly one announcement line after binding its
//! listening socket. The supervisor matches every line from the child's
//! stdout and stderr against the recognized formats below, in priority
//! order; the first successful match on either stream wins.
//!
//! Matching is substring-based so banner lines wrapped by a logging
//! framework (timestamps, level prefixes) still match. This is inherently
//! fragile against coincidental banner-like text; the format set is fixed
//! and deliberately not extended.

/// The dedicated sentinel prefix. Preferred over banner scraping.
pub const SENTINEL_PREFIX: &str = "SERVER_PORT:";

/// Framework banner formats accepted as fallbacks, in priority order.
const BANNER_PREFIXES: [&str; 2] = [
    "Now listening on: http://localhost:",
    "Server starting on http://localhost:",
];

/// Build the announcement line the server prints once its socket is bound.
#[must_use]
pub fn announcement_line(port: u16) -> String {
    format!("{SENTINEL_PREFIX}{port}")
}

/// Parse a single output line for a port announcement.
///
/// Returns the announced port if the line matches one of the recognized
/// formats with a valid `u16` port. Surrounding whitespace and prefix text
/// are tolerated; trailing text after the digits is ignored. A matching
/// prefix followed by a non-numeric or out-of-range port is not a match and
/// lower-priority formats are still tried.
#[must_use]
pub fn parse_announcement(line: &str) -> Option<u16> {
    let line = line.trim();

    if let Some(port) = port_after(line, SENTINEL_PREFIX) {
        return Some(port);
    }

    BANNER_PREFIXES
        .iter()
        .find_map(|prefix| port_after(line, prefix))
}

/// Find `pattern` in `text` and parse the digit run that follows it.
fn port_after(text: &str, pattern: &str) -> Option<u16> {
    let start = text.find(pattern)? + pattern.len();
    let digits: &str = {
        let rest = &text[start..];
        let end = rest
            .char_indices()
            .find(|(_, c)| !c.is_ascii_digit())
            .map_or(rest.len(), |(i, _)| i);
        &rest[..end]
    };

    if digits.is_empty() {
        return None;
    }
    digits.parse().ok()
}
