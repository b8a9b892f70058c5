use std::future::Future;
use std::pin::Pin;

use domain::alias::error::AliasError;
use ports::secondary::arp_table_port::ArpTablePort;
use tracing::warn;

use super::command;

/// Neighbour table read from `arp -an` (IPv4) and `ndp -an` (IPv6).
///
/// Both tables are read on every lookup. One of them failing is logged and
/// tolerated; both failing is a fetch error.
pub struct SystemArpTable {
    arp_path: String,
    ndp_path: String,
}

impl SystemArpTable {
    pub fn new() -> Self {
        Self::with_paths("/usr/sbin/arp", "/usr/sbin/ndp")
    }

    pub fn with_paths(arp_path: impl Into<String>, ndp_path: impl Into<String>) -> Self {
        Self {
            arp_path: arp_path.into(),
            ndp_path: ndp_path.into(),
        }
    }

    async fn do_lookup(&self, mac: &str) -> Result<Vec<String>, AliasError> {
        let arp = command::run(&self.arp_path, &["-an"]).await;
        let ndp = command::run(&self.ndp_path, &["-an"]).await;

        let mut entries = Vec::new();
        let mut last_err = None;
        match arp {
            Ok(out) => entries.extend(parse_arp(&out)),
            Err(e) => {
                warn!(error = %e, "arp table unavailable");
                last_err = Some(e);
            }
        }
        match ndp {
            Ok(out) => entries.extend(parse_ndp(&out)),
            Err(e) => {
                warn!(error = %e, "ndp table unavailable");
                if let Some(first) = last_err.take() {
                    return Err(first);
                }
            }
        }

        Ok(addresses_for(&entries, mac))
    }
}

impl Default for SystemArpTable {
    fn default() -> Self {
        Self::new()
    }
}

/// One neighbour entry: address and link-layer address (lowercase).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Neighbour {
    pub address: String,
    pub mac: String,
}

/// Parse BSD `arp -an` output:
/// `? (192.168.1.10) at 00:11:22:33:44:55 on em0 expires in 1187 seconds [ethernet]`
pub fn parse_arp(output: &str) -> Vec<Neighbour> {
    output
        .lines()
        .filter_map(|line| {
            let open = line.find('(')?;
            let close = line[open..].find(')')? + open;
            let address = &line[open + 1..close];
            let mut rest = line[close + 1..].split_whitespace();
            if rest.next()? != "at" {
                return None;
            }
            let mac = rest.next()?;
            is_mac(mac).then(|| Neighbour {
                address: address.to_string(),
                mac: mac.to_ascii_lowercase(),
            })
        })
        .collect()
}

/// Parse BSD `ndp -an` output, skipping the header line. Scope suffixes
/// (`%em0`) are removed from addresses.
pub fn parse_ndp(output: &str) -> Vec<Neighbour> {
    output
        .lines()
        .filter_map(|line| {
            let mut fields = line.split_whitespace();
            let address = fields.next()?;
            let mac = fields.next()?;
            if !is_mac(mac) {
                return None;
            }
            let address = address.split('%').next().unwrap_or(address);
            Some(Neighbour {
                address: address.to_string(),
                mac: mac.to_ascii_lowercase(),
            })
        })
        .collect()
}

fn is_mac(value: &str) -> bool {
    let parts: Vec<&str> = value.split(':').collect();
    parts.len() == 6
        && parts
            .iter()
            .all(|p| !p.is_empty() && p.len() <= 2 && p.chars().all(|c| c.is_ascii_hexdigit()))
}

fn addresses_for(entries: &[Neighbour], mac: &str) -> Vec<String> {
    let wanted = mac.trim().to_ascii_lowercase();
    entries
        .iter()
        .filter(|n| n.mac == wanted)
        .map(|n| n.address.clone())
        .collect()
}

impl ArpTablePort for SystemArpTable {
    fn addresses_for<'a>(
        &'a self,
        mac: &'a str,
    ) -> Pin<Box<dyn Future<Output = Result<Vec<String>, AliasError>> + Send + 'a>> {
        Box::pin(self.do_lookup(mac))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ARP: &str = "\
? (192.168.1.1) at 00:0d:b9:4a:12:01 on igb0 permanent [ethernet]
? (192.168.1.23) at 3c:22:FB:0a:bb:cc on igb0 expires in 1133 seconds [ethernet]
? (192.168.1.99) at (incomplete) on igb0 expired [ethernet]
";

    const NDP: &str = "\
Neighbor                             Linklayer Address  Netif Expire    S Flags
fe80::3e22:fbff:fe0a:bbcc%igb0       3c:22:fb:0a:bb:cc   igb0 23h59m58s S
2001:db8::23                         3c:22:fb:0a:bb:cc   igb0 permanent R
2001:db8::1                          00:0d:b9:4a:12:01   igb0 permanent R
";

    #[test]
    fn parses_arp_and_skips_incomplete() {
        let entries = parse_arp(ARP);
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[1].address, "192.168.1.23");
        assert_eq!(entries[1].mac, "3c:22:fb:0a:bb:cc");
    }

    #[test]
    fn parses_ndp_and_strips_scope() {
        let entries = parse_ndp(NDP);
        assert_eq!(entries.len(), 3);
        assert_eq!(entries[0].address, "fe80::3e22:fbff:fe0a:bbcc");
    }

    #[test]
    fn mac_match_is_case_insensitive() {
        let mut entries = parse_arp(ARP);
        entries.extend(parse_ndp(NDP));
        let found = addresses_for(&entries, "3C:22:FB:0A:BB:CC");
        assert_eq!(
            found,
            vec![
                "192.168.1.23".to_string(),
                "fe80::3e22:fbff:fe0a:bbcc".to_string(),
                "2001:db8::23".to_string(),
            ]
        );
    }

    #[test]
    fn unknown_mac_yields_nothing() {
        let entries = parse_arp(ARP);
        assert!(addresses_for(&entries, "de:ad:be:ef:00:01").is_empty());
    }

    #[tokio::test]
    async fn both_tables_failing_is_an_error() {
        let table = SystemArpTable::with_paths("/nonexistent/arp", "/nonexistent/ndp");
        assert!(table.addresses_for("00:11:22:33:44:55").await.is_err());
    }

    #[tokio::test]
    async fn one_table_failing_is_tolerated() {
        let table = SystemArpTable::with_paths("true", "/nonexistent/ndp");
        let found = table.addresses_for("00:11:22:33:44:55").await.unwrap();
        assert!(found.is_empty());
    }
}
