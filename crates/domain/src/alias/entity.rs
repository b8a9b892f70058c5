use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::common::entity::AddressFamily;

use super::error::AliasError;

/// Unique alias name; also the key of its cache artifacts.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct AliasName(pub String);

impl AliasName {
    pub fn validate(&self) -> Result<(), &'static str> {
        if self.0.is_empty() {
            return Err("alias name must not be empty");
        }
        if !self
            .0
            .chars()
            .all(|c| c.is_alphanumeric() || c == '-' || c == '_')
        {
            return Err("alias name must contain only alphanumeric, dashes, underscores");
        }
        Ok(())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for AliasName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The kind of alias; selects the source strategy used to resolve it.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum AliasKind {
    Host,
    Network,
    NetworkGroup,
    Url,
    UrlTable,
    GeoIp,
    DynIpv6Host,
    Mac,
    InterfaceNet,
    External,
    /// Any kind this resolver has no strategy for (ports, auth groups, ...).
    Other(String),
}

impl AliasKind {
    pub fn as_str(&self) -> &str {
        match self {
            Self::Host => "host",
            Self::Network => "network",
            Self::NetworkGroup => "networkgroup",
            Self::Url => "url",
            Self::UrlTable => "urltable",
            Self::GeoIp => "geoip",
            Self::DynIpv6Host => "dynipv6host",
            Self::Mac => "mac",
            Self::InterfaceNet => "interface_net",
            Self::External => "external",
            Self::Other(kind) => kind,
        }
    }

    /// Strategy producing this kind's entries, `None` when the alias is
    /// only fed by the table seed and DNS.
    pub fn strategy(&self) -> Option<SourceStrategy> {
        match self {
            Self::Host | Self::Network | Self::NetworkGroup => Some(SourceStrategy::Literal),
            Self::Url | Self::UrlTable => Some(SourceStrategy::RemoteList),
            Self::GeoIp => Some(SourceStrategy::GeoIp),
            Self::DynIpv6Host => Some(SourceStrategy::DynamicIpv6),
            Self::Mac => Some(SourceStrategy::MacTable),
            Self::InterfaceNet | Self::External | Self::Other(_) => None,
        }
    }

    /// Whether resolution starts from the live packet-filter table contents.
    pub fn seeds_from_table(&self) -> bool {
        matches!(self, Self::InterfaceNet | Self::External)
    }

    /// Whether the alias needs an `interface` to be resolvable.
    pub fn requires_interface(&self) -> bool {
        matches!(self, Self::InterfaceNet | Self::DynIpv6Host)
    }
}

impl From<&str> for AliasKind {
    fn from(s: &str) -> Self {
        match s.trim() {
            "host" => Self::Host,
            "network" => Self::Network,
            "networkgroup" => Self::NetworkGroup,
            "url" => Self::Url,
            "urltable" => Self::UrlTable,
            "geoip" => Self::GeoIp,
            "dynipv6host" => Self::DynIpv6Host,
            "mac" => Self::Mac,
            "interface_net" => Self::InterfaceNet,
            "external" => Self::External,
            other => Self::Other(other.to_string()),
        }
    }
}

impl std::fmt::Display for AliasKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Per-kind source strategy, selected once per alias.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceStrategy {
    /// Items are literal addresses, networks, ranges, wildcards or hostnames.
    Literal,
    /// Items are URLs of hosted address lists.
    RemoteList,
    /// Items are ISO country codes looked up in the GeoIP dataset.
    GeoIp,
    /// Items are host parts combined with the interface's IPv6 prefixes.
    DynamicIpv6,
    /// Items are MAC addresses looked up in the ARP/NDP tables.
    MacTable,
}

/// One parsed alias definition, as handed over by the configuration layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AliasDefinition {
    pub name: AliasName,
    pub kind: AliasKind,
    /// Ordered protocol tags; part of the fingerprint.
    pub protocols: Vec<AddressFamily>,
    /// Raw source tokens. Kept sorted, order carries no meaning.
    pub items: BTreeSet<String>,
    /// `<= 0` disables expiry; change detection alone triggers re-resolution.
    pub ttl_secs: i64,
    pub interface: Option<String>,
}

impl AliasDefinition {
    /// Minimal definition with both address families and no TTL.
    pub fn new<I, S>(name: &str, kind: AliasKind, items: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            name: AliasName(name.to_string()),
            kind,
            protocols: AddressFamily::all(),
            items: items.into_iter().map(Into::into).collect(),
            ttl_secs: -1,
            interface: None,
        }
    }

    pub fn validate(&self) -> Result<(), AliasError> {
        self.name.validate().map_err(|reason| AliasError::Invalid {
            reason: format!("{}: {reason}", self.name),
        })?;

        if self.kind.requires_interface()
            && self.interface.as_deref().is_none_or(str::is_empty)
        {
            return Err(AliasError::Invalid {
                reason: format!("{}: {} alias requires an interface", self.name, self.kind),
            });
        }

        let mut seen = Vec::with_capacity(self.protocols.len());
        for proto in &self.protocols {
            if seen.contains(proto) {
                return Err(AliasError::Invalid {
                    reason: format!("{}: duplicate protocol {proto}", self.name),
                });
            }
            seen.push(*proto);
        }

        Ok(())
    }
}

/// Lifecycle of one alias object within a resolution cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResolutionState {
    Unresolved,
    Resolving,
    /// Content is fresh, or was read unchanged from the cache.
    Resolved,
    /// A source failed; content is the last known good set.
    RolledBack,
}

impl ResolutionState {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Unresolved => "unresolved",
            Self::Resolving => "resolving",
            Self::Resolved => "resolved",
            Self::RolledBack => "rolled_back",
        }
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Resolved | Self::RolledBack)
    }
}

impl std::fmt::Display for ResolutionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Body of a hosted address list, split into lines.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchedList {
    pub status: u16,
    pub lines: Vec<String>,
}

impl FetchedList {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Summary of a GeoIP dataset refresh.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeoIpRefreshStats {
    pub file_count: usize,
    pub address_count: usize,
}
