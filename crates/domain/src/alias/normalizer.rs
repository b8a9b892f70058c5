//! Normalization of raw alias tokens into canonical addresses and networks.
//!
//! A token is classified in this order:
//! 1. `addr/wildcard` with a non-numeric suffix: IPv4 wildcard mask, expanded.
//! 2. `addr/len`: CIDR network, kept verbatim.
//! 3. `a-b`: inclusive address range, summarized into covering networks.
//! 4. single address, kept verbatim.
//! 5. anything else is a hostname candidate for the DNS collector.
//!
//! A leading `!` (negation) is carried onto every produced entry.

use std::net::{IpAddr, Ipv4Addr};

use ipnet::{IpNet, Ipv4Net, Ipv4Subnets, Ipv6Subnets};

/// Upper bound on the entries one wildcard mask may expand to.
pub const MAX_WILDCARD_EXPANSION: usize = 65_536;

const NEGATION: char = '!';

/// Outcome of normalizing a single token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Normalized {
    /// Canonical addresses or networks.
    Entries(Vec<String>),
    /// Wildcard expansion hit [`MAX_WILDCARD_EXPANSION`]; holds the
    /// truncated expansion.
    Overflow(Vec<String>),
    /// Not a literal. Must be looked up through DNS.
    Hostname(String),
    /// Neither a literal nor a usable hostname.
    Invalid,
}

impl Normalized {
    /// Entries produced directly, empty for hostnames and invalid tokens.
    pub fn into_entries(self) -> Vec<String> {
        match self {
            Self::Entries(entries) | Self::Overflow(entries) => entries,
            Self::Hostname(_) | Self::Invalid => Vec::new(),
        }
    }
}

/// Normalize one raw token.
pub fn normalize(raw: &str) -> Normalized {
    let token = raw.trim();
    if token.is_empty() {
        return Normalized::Invalid;
    }
    let (negated, body) = split_negation(token);

    if let Some((_, suffix)) = token.rsplit_once('/') {
        if suffix.is_empty() || !suffix.bytes().all(|b| b.is_ascii_digit()) {
            if let Some(expansion) = WildcardExpansion::parse(body) {
                return collect_wildcard(expansion, negated);
            }
        } else if body.parse::<IpNet>().is_ok() {
            return Normalized::Entries(vec![token.to_string()]);
        }
    }

    if let Some(entries) = summarize_range(body) {
        let prefix = if negated { "!" } else { "" };
        return Normalized::Entries(
            entries
                .into_iter()
                .map(|net| format!("{prefix}{net}"))
                .collect(),
        );
    }

    if body.parse::<IpAddr>().is_ok() {
        return Normalized::Entries(vec![token.to_string()]);
    }

    if is_viable_hostname(token) {
        Normalized::Hostname(token.to_string())
    } else {
        Normalized::Invalid
    }
}

fn split_negation(token: &str) -> (bool, &str) {
    let body = token.trim_start_matches(NEGATION);
    (body.len() != token.len(), body)
}

fn collect_wildcard(expansion: WildcardExpansion, negated: bool) -> Normalized {
    let mut entries: Vec<String> = expansion
        .take(MAX_WILDCARD_EXPANSION + 1)
        .map(|net| {
            let text = if net.prefix_len() == 32 {
                net.addr().to_string()
            } else {
                net.to_string()
            };
            if negated { format!("!{text}") } else { text }
        })
        .collect();

    if entries.len() > MAX_WILDCARD_EXPANSION {
        entries.truncate(MAX_WILDCARD_EXPANSION);
        Normalized::Overflow(entries)
    } else {
        Normalized::Entries(entries)
    }
}

// ── Wildcard masks ─────────────────────────────────────────────────

/// Lazy expansion of an IPv4 wildcard mask such as `192.168.0.1/0.0.255.0`.
///
/// Set bits in the wildcard are "don't care". Trailing contiguous don't-care
/// bits fold into the prefix length; every other don't-care bit doubles the
/// number of produced networks. Networks are produced in ascending order.
#[derive(Debug, Clone)]
pub struct WildcardExpansion {
    base: u32,
    varying: u32,
    prefix_len: u8,
    next: Option<u32>,
}

impl WildcardExpansion {
    /// Parse `addr/wildcard`; `None` if either half is not a dotted quad.
    pub fn parse(pattern: &str) -> Option<Self> {
        let (addr, wildcard) = pattern.split_once('/')?;
        let addr = u32::from(addr.trim().parse::<Ipv4Addr>().ok()?);
        let wildcard = u32::from(wildcard.trim().parse::<Ipv4Addr>().ok()?);

        let host_bits = wildcard.trailing_ones();
        let host_mask = ((1u64 << host_bits) - 1) as u32;
        let prefix_len = u8::try_from(32 - host_bits).ok()?;

        Some(Self {
            base: addr & !wildcard,
            varying: wildcard & !host_mask,
            prefix_len,
            next: Some(0),
        })
    }

    /// Total number of networks the mask describes.
    pub fn candidate_count(&self) -> u64 {
        1u64 << self.varying.count_ones()
    }
}

impl Iterator for WildcardExpansion {
    type Item = Ipv4Net;

    fn next(&mut self) -> Option<Self::Item> {
        let subset = self.next?;
        // Ascending enumeration of the subsets of `varying`.
        self.next = if subset == self.varying {
            None
        } else {
            Some(subset.wrapping_sub(self.varying) & self.varying)
        };
        Ipv4Net::new(Ipv4Addr::from(self.base | subset), self.prefix_len).ok()
    }
}

// ── Address ranges ─────────────────────────────────────────────────

/// Summarize `first-last` into the minimal list of covering networks.
///
/// Returns `None` unless both ends parse as addresses of the same family
/// and `first <= last`.
pub fn summarize_range(range: &str) -> Option<Vec<IpNet>> {
    let (first, last) = range.split_once('-')?;
    let first: IpAddr = first.trim().parse().ok()?;
    let last: IpAddr = last.trim().parse().ok()?;

    match (first, last) {
        (IpAddr::V4(a), IpAddr::V4(b)) if a <= b => {
            Some(Ipv4Subnets::new(a, b, 0).map(IpNet::V4).collect())
        }
        (IpAddr::V6(a), IpAddr::V6(b)) if a <= b => {
            Some(Ipv6Subnets::new(a, b, 0).map(IpNet::V6).collect())
        }
        _ => None,
    }
}

// ── Hostnames ──────────────────────────────────────────────────────

/// Whether a token could be a DNS name worth looking up.
///
/// Labels are 1-63 characters of `[A-Za-z0-9_-]`, the whole name at most
/// 253 characters, and the last label is not purely numeric (which rules out
/// malformed addresses and ranges).
pub fn is_viable_hostname(name: &str) -> bool {
    let name = name.strip_suffix('.').unwrap_or(name);
    if name.is_empty() || name.len() > 253 {
        return false;
    }

    let labels: Vec<&str> = name.split('.').collect();
    let labels_ok = labels.iter().all(|label| {
        !label.is_empty()
            && label.len() <= 63
            && label
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
    });

    labels_ok
        && labels
            .last()
            .is_some_and(|tld| !tld.chars().all(|c| c.is_ascii_digit()))
}
