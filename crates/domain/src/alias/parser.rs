//! Text parsing helpers for alias inputs: hosted list lines, TTLs,
//! protocol lists and country codes.

use crate::common::entity::AddressFamily;

const LIST_DELIMITERS: [char; 4] = [',', ';', '|', '#'];

/// Extract the address token of one hosted-list line.
///
/// The token is everything before the first whitespace, `,`, `;`, `|` or `#`.
/// Lines starting with a delimiter and `//` comments yield `None`.
pub fn list_entry(line: &str) -> Option<&str> {
    let token = line
        .split(|c: char| c.is_whitespace() || LIST_DELIMITERS.contains(&c))
        .next()
        .unwrap_or("");
    if token.is_empty() || token.starts_with("//") {
        None
    } else {
        Some(token)
    }
}

/// Parse a TTL value such as `"300"` or `"300.5"` (truncated to seconds).
///
/// Anything else, including negative numbers, is `None` and the caller keeps
/// its default.
pub fn parse_ttl(raw: &str) -> Option<i64> {
    let text = raw.trim();
    let mut parts = text.split('.');
    let whole = parts.next()?;
    let fraction = parts.next();
    if parts.next().is_some() {
        return None;
    }

    let digits_only = |s: &str| s.bytes().all(|b| b.is_ascii_digit());
    if !digits_only(whole) || !fraction.is_none_or(digits_only) {
        return None;
    }
    if whole.is_empty() && fraction.is_none_or(str::is_empty) {
        return None;
    }
    if whole.is_empty() {
        return Some(0);
    }
    whole.parse().ok()
}

/// Canonical ISO country code for a GeoIP item (`"nl"` -> `"NL"`).
///
/// Only two ASCII letters are accepted, so the code is safe to use in a
/// dataset file name.
pub fn country_code(raw: &str) -> Option<String> {
    let code = raw.trim();
    if code.len() == 2 && code.bytes().all(|b| b.is_ascii_alphabetic()) {
        Some(code.to_ascii_uppercase())
    } else {
        None
    }
}

/// Parse a comma separated protocol list (`"IPv4,IPv6"`).
pub fn parse_protocols(raw: &str) -> Result<Vec<AddressFamily>, String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::parse)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn list_entry_first_token() {
        assert_eq!(list_entry("1.2.3.4 # comment"), Some("1.2.3.4"));
        assert_eq!(list_entry("5.6.7.8,extra"), Some("5.6.7.8"));
        assert_eq!(list_entry("10.0.0.0/8;SBL123"), Some("10.0.0.0/8"));
        assert_eq!(list_entry("192.0.2.1|tag"), Some("192.0.2.1"));
        assert_eq!(list_entry("198.51.100.0/24\tnote"), Some("198.51.100.0/24"));
        assert_eq!(list_entry("203.0.113.9#x"), Some("203.0.113.9"));
    }

    #[test]
    fn list_entry_skips_comments_and_blanks() {
        assert_eq!(list_entry("// skip"), None);
        assert_eq!(list_entry("# header"), None);
        assert_eq!(list_entry(""), None);
        assert_eq!(list_entry("   "), None);
        assert_eq!(list_entry(" 1.2.3.4"), None);
        assert_eq!(list_entry("; Spamhaus DROP List"), None);
    }

    #[test]
    fn ttl_integer_and_decimal() {
        assert_eq!(parse_ttl("300"), Some(300));
        assert_eq!(parse_ttl(" 86400 "), Some(86400));
        assert_eq!(parse_ttl("300.75"), Some(300));
        assert_eq!(parse_ttl("0"), Some(0));
    }

    #[test]
    fn ttl_malformed_is_ignored() {
        assert_eq!(parse_ttl(""), None);
        assert_eq!(parse_ttl("abc"), None);
        assert_eq!(parse_ttl("-5"), None);
        assert_eq!(parse_ttl("1.2.3"), None);
        assert_eq!(parse_ttl("5m"), None);
        assert_eq!(parse_ttl("."), None);
    }

    #[test]
    fn country_code_is_uppercased() {
        assert_eq!(country_code("nl").as_deref(), Some("NL"));
        assert_eq!(country_code(" De ").as_deref(), Some("DE"));
    }

    #[test]
    fn country_code_rejects_paths_and_lengths() {
        assert!(country_code("../NL").is_none());
        assert!(country_code("N/").is_none());
        assert!(country_code("NLD").is_none());
        assert!(country_code("").is_none());
    }

    #[test]
    fn protocols_parse() {
        assert_eq!(
            parse_protocols("IPv4,IPv6"),
            Ok(vec![AddressFamily::Ipv4, AddressFamily::Ipv6])
        );
        assert_eq!(parse_protocols("IPv6"), Ok(vec![AddressFamily::Ipv6]));
        assert_eq!(parse_protocols(""), Ok(Vec::new()));
        assert!(parse_protocols("IPv4,IPX").is_err());
    }
}
