use serde::{Deserialize, Serialize};

/// Address family tag attached to an alias (`IPv4`, `IPv6`).
///
/// The textual form is part of the alias fingerprint, so `as_str()` must
/// stay stable across releases.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AddressFamily {
    #[serde(rename = "IPv4")]
    Ipv4,
    #[serde(rename = "IPv6")]
    Ipv6,
}

impl AddressFamily {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Ipv4 => "IPv4",
            Self::Ipv6 => "IPv6",
        }
    }

    /// Both families, in the default order.
    pub fn all() -> Vec<Self> {
        vec![Self::Ipv4, Self::Ipv6]
    }
}

impl std::fmt::Display for AddressFamily {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for AddressFamily {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "ipv4" | "inet" => Ok(Self::Ipv4),
            "ipv6" | "inet6" => Ok(Self::Ipv6),
            _ => Err(format!("invalid address family '{s}': expected IPv4|IPv6")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn address_family_as_str() {
        assert_eq!(AddressFamily::Ipv4.as_str(), "IPv4");
        assert_eq!(AddressFamily::Ipv6.as_str(), "IPv6");
    }

    #[test]
    fn address_family_from_str_case_insensitive() {
        assert_eq!("IPv4".parse::<AddressFamily>(), Ok(AddressFamily::Ipv4));
        assert_eq!("ipv6".parse::<AddressFamily>(), Ok(AddressFamily::Ipv6));
        assert_eq!(" inet ".parse::<AddressFamily>(), Ok(AddressFamily::Ipv4));
    }

    #[test]
    fn address_family_from_str_rejects_unknown() {
        assert!("ipx".parse::<AddressFamily>().is_err());
        assert!("".parse::<AddressFamily>().is_err());
    }

    #[test]
    fn address_family_default_order() {
        assert_eq!(
            AddressFamily::all(),
            vec![AddressFamily::Ipv4, AddressFamily::Ipv6]
        );
    }

    #[test]
    fn address_family_display() {
        assert_eq!(format!("{}", AddressFamily::Ipv6), "IPv6");
    }
}
