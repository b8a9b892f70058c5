//! Change detection: input fingerprints and TTL expiry.

use std::time::Duration;

use crate::common::entity::AddressFamily;

/// Fingerprint of an alias input: md5 over the sorted items joined by `,`,
/// followed by `[<protocols>]` when protocols are set.
///
/// Depends only on the raw input, never on resolved content, so a mismatch
/// means the definition changed rather than the network.
pub fn fingerprint<'a, I>(items: I, protocols: &[AddressFamily]) -> String
where
    I: IntoIterator<Item = &'a str>,
{
    let mut sorted: Vec<&str> = items.into_iter().collect();
    sorted.sort_unstable();

    let mut text = sorted.join(",");
    if !protocols.is_empty() {
        let tags: Vec<&str> = protocols.iter().map(|p| p.as_str()).collect();
        text = format!("{text}[{}]", tags.join(","));
    }

    format!("{:x}", md5::compute(text.as_bytes()))
}

/// TTL expiry decision from the fingerprint artifact's age.
///
/// Only a positive TTL can expire, and a missing artifact (`age == None`)
/// never counts as expired; change detection covers that case.
pub fn is_expired(ttl_secs: i64, age: Option<Duration>) -> bool {
    match (u64::try_from(ttl_secs), age) {
        (Ok(ttl), Some(age)) if ttl > 0 => age.as_secs_f64() > ttl as f64,
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const BOTH: &[AddressFamily] = &[AddressFamily::Ipv4, AddressFamily::Ipv6];

    #[test]
    fn fingerprint_is_md5_hex() {
        let fp = fingerprint(["10.0.0.1"], BOTH);
        assert_eq!(fp.len(), 32);
        assert!(fp.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn fingerprint_matches_known_layout() {
        // md5("10.0.0.1,10.0.0.2[IPv4,IPv6]")
        let expected = format!("{:x}", md5::compute(b"10.0.0.1,10.0.0.2[IPv4,IPv6]"));
        assert_eq!(fingerprint(["10.0.0.2", "10.0.0.1"], BOTH), expected);
    }

    #[test]
    fn fingerprint_without_protocols_has_no_suffix() {
        let expected = format!("{:x}", md5::compute(b"a,b"));
        assert_eq!(fingerprint(["b", "a"], &[]), expected);
    }

    #[test]
    fn fingerprint_is_order_independent() {
        let items = ["www.example.com", "10.0.0.0/24", "!10.0.0.5", "2001:db8::1"];
        let reference = fingerprint(items, BOTH);

        let mut permuted = items;
        for _ in 0..items.len() {
            permuted.rotate_left(1);
            assert_eq!(fingerprint(permuted, BOTH), reference);
        }
        permuted.reverse();
        assert_eq!(fingerprint(permuted, BOTH), reference);
    }

    #[test]
    fn fingerprint_depends_on_protocols() {
        let v4 = fingerprint(["10.0.0.1"], &[AddressFamily::Ipv4]);
        let both = fingerprint(["10.0.0.1"], BOTH);
        let swapped = fingerprint(["10.0.0.1"], &[AddressFamily::Ipv6, AddressFamily::Ipv4]);
        assert_ne!(v4, both);
        assert_ne!(both, swapped);
    }

    #[test]
    fn fingerprint_depends_on_items() {
        assert_ne!(
            fingerprint(["10.0.0.1"], BOTH),
            fingerprint(["10.0.0.2"], BOTH)
        );
    }

    #[test]
    fn expiry_disabled_without_positive_ttl() {
        let old = Some(Duration::from_secs(1_000_000));
        assert!(!is_expired(0, old));
        assert!(!is_expired(-1, old));
    }

    #[test]
    fn expiry_requires_artifact() {
        assert!(!is_expired(60, None));
    }

    #[test]
    fn expiry_after_ttl_elapsed() {
        assert!(!is_expired(60, Some(Duration::ZERO)));
        assert!(!is_expired(60, Some(Duration::from_secs(60))));
        assert!(is_expired(60, Some(Duration::from_secs(61))));
    }
}
