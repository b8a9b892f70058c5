use std::future::Future;
use std::net::Ipv6Addr;
use std::pin::Pin;

use domain::alias::error::AliasError;
use ipnet::Ipv6Net;
use ports::secondary::interface_address_port::InterfaceAddressPort;
use tracing::{debug, warn};

use super::command;

/// Derives host addresses from an interface's global IPv6 prefixes,
/// read from `ifconfig <interface>`.
pub struct IfconfigInterfaceAddresses {
    ifconfig_path: String,
}

impl IfconfigInterfaceAddresses {
    pub fn new() -> Self {
        Self::with_path("/sbin/ifconfig")
    }

    pub fn with_path(ifconfig_path: impl Into<String>) -> Self {
        Self {
            ifconfig_path: ifconfig_path.into(),
        }
    }

    async fn do_derive(&self, interface: &str, host_part: &str) -> Result<Vec<String>, AliasError> {
        let host: Ipv6Addr = match host_part.trim().parse() {
            Ok(host) => host,
            Err(_) => {
                warn!(interface, host_part, "host part is not an IPv6 address, skipped");
                return Ok(Vec::new());
            }
        };

        let output = command::run(&self.ifconfig_path, &[interface]).await?;
        let derived: Vec<String> = global_prefixes(&output)
            .into_iter()
            .map(|prefix| combine(prefix, host).to_string())
            .collect();
        debug!(interface, count = derived.len(), "derived dynamic IPv6 hosts");
        Ok(derived)
    }
}

impl Default for IfconfigInterfaceAddresses {
    fn default() -> Self {
        Self::new()
    }
}

/// Global unicast `inet6` networks in `ifconfig` output. Link-local,
/// deprecated and detached addresses are ignored.
pub fn global_prefixes(output: &str) -> Vec<Ipv6Net> {
    output
        .lines()
        .filter_map(|line| {
            let fields: Vec<&str> = line.split_whitespace().collect();
            if fields.first() != Some(&"inet6") {
                return None;
            }
            if fields
                .iter()
                .any(|f| matches!(*f, "deprecated" | "detached" | "tentative"))
            {
                return None;
            }
            let addr: Ipv6Addr = fields.get(1)?.split('%').next()?.parse().ok()?;
            if is_link_local(addr) || addr.is_loopback() {
                return None;
            }
            let prefixlen = fields
                .iter()
                .position(|f| *f == "prefixlen")
                .and_then(|i| fields.get(i + 1))
                .and_then(|p| p.parse::<u8>().ok())?;
            Ipv6Net::new(addr, prefixlen).ok().map(|net| net.trunc())
        })
        .collect()
}

fn is_link_local(addr: Ipv6Addr) -> bool {
    addr.segments()[0] & 0xffc0 == 0xfe80
}

/// Network bits from `prefix`, host bits from `host`.
pub fn combine(prefix: Ipv6Net, host: Ipv6Addr) -> Ipv6Addr {
    let net = u128::from(prefix.network());
    let mask = u128::from(prefix.netmask());
    Ipv6Addr::from(net | (u128::from(host) & !mask))
}

impl InterfaceAddressPort for IfconfigInterfaceAddresses {
    fn dynamic_ipv6<'a>(
        &'a self,
        interface: &'a str,
        host_part: &'a str,
    ) -> Pin<Box<dyn Future<Output = Result<Vec<String>, AliasError>> + Send + 'a>> {
        Box::pin(self.do_derive(interface, host_part))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const IFCONFIG: &str = "\
igb1: flags=8863<UP,BROADCAST,RUNNING,SIMPLEX,MULTICAST> metric 0 mtu 1500
\tether 00:0d:b9:4a:12:02
\tinet 192.168.1.1 netmask 0xffffff00 broadcast 192.168.1.255
\tinet6 fe80::20d:b9ff:fe4a:1202%igb1 prefixlen 64 scopeid 0x2
\tinet6 2001:db8:aa:1::1 prefixlen 64
\tinet6 2001:db8:bb:1::1 prefixlen 64 deprecated
\tinet6 2001:db8:cc:10::1 prefixlen 56
";

    #[test]
    fn finds_global_prefixes_only() {
        let prefixes = global_prefixes(IFCONFIG);
        assert_eq!(
            prefixes,
            vec![
                "2001:db8:aa:1::/64".parse::<Ipv6Net>().unwrap(),
                "2001:db8:cc::/56".parse::<Ipv6Net>().unwrap(),
            ]
        );
    }

    #[test]
    fn combines_prefix_and_host_bits() {
        let prefix: Ipv6Net = "2001:db8:aa:1::/64".parse().unwrap();
        let host: Ipv6Addr = "::1:2:3:4".parse().unwrap();
        assert_eq!(combine(prefix, host).to_string(), "2001:db8:aa:1:1:2:3:4");
    }

    #[test]
    fn host_bits_beyond_prefix_are_masked() {
        let prefix: Ipv6Net = "2001:db8:cc::/56".parse().unwrap();
        let host: Ipv6Addr = "ffff::10:0:0:5".parse().unwrap();
        assert_eq!(combine(prefix, host).to_string(), "2001:db8:cc:0:10::5");
    }

    #[tokio::test]
    async fn invalid_host_part_yields_nothing() {
        let port = IfconfigInterfaceAddresses::with_path("/nonexistent/ifconfig");
        let out = port.dynamic_ipv6("igb1", "not-an-address").await.unwrap();
        assert!(out.is_empty());
    }

    #[tokio::test]
    async fn failing_ifconfig_is_fetch_error() {
        let port = IfconfigInterfaceAddresses::with_path("/nonexistent/ifconfig");
        let err = port.dynamic_ipv6("igb1", "::1").await.unwrap_err();
        assert!(matches!(err, AliasError::Fetch { .. }));
    }
}
