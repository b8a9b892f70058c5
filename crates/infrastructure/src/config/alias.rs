//! Alias definition parsing.

use domain::alias::entity::{AliasDefinition, AliasKind, AliasName};
use domain::alias::parser::{parse_protocols, parse_ttl};
use domain::common::entity::AddressFamily;
use serde::{Deserialize, Serialize};

use super::common::{ConfigError, yaml_value_to_string};

/// YAML representation of a single alias entry.
///
/// Appears as an element of `aliases`:
/// ```yaml
/// - name: webservers
///   type: host
///   proto: IPv4,IPv6
///   items: ["10.0.0.0/24", "!10.0.0.5", "www.example.com"]
///   ttl: "300"
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AliasConfig {
    pub name: String,

    #[serde(rename = "type")]
    pub alias_type: String,

    /// Comma separated protocol tags. Defaults to `IPv4,IPv6`.
    #[serde(default)]
    pub proto: Option<String>,

    /// Raw items. Each entry may hold several whitespace separated tokens.
    #[serde(default)]
    pub items: Vec<serde_yaml_ng::Value>,

    /// Seconds, as number or string. Malformed values are ignored.
    #[serde(default)]
    pub ttl: Option<serde_yaml_ng::Value>,

    /// Required for `dynipv6host` and `interface_net`.
    #[serde(default)]
    pub interface: Option<String>,

    #[serde(default)]
    pub description: Option<String>,
}

impl AliasConfig {
    /// Validate this alias at the YAML level. `index` is its position in
    /// `aliases`, used in error paths.
    pub(super) fn validate(&self, index: usize) -> Result<(), ConfigError> {
        let prefix = format!("aliases[{index}]");

        AliasName(self.name.clone())
            .validate()
            .map_err(|reason| ConfigError::Validation {
                field: format!("{prefix}.name"),
                message: reason.to_string(),
            })?;

        if self.alias_type.trim().is_empty() {
            return Err(ConfigError::Validation {
                field: format!("{prefix}.type"),
                message: "alias type must not be empty".to_string(),
            });
        }

        self.protocols(&prefix)?;

        if AliasKind::from(self.alias_type.as_str()).requires_interface()
            && self.interface.as_deref().is_none_or(|i| i.trim().is_empty())
        {
            return Err(ConfigError::Validation {
                field: format!("{prefix}.interface"),
                message: format!("{} alias requires an interface", self.alias_type),
            });
        }

        Ok(())
    }

    fn protocols(&self, prefix: &str) -> Result<Vec<AddressFamily>, ConfigError> {
        match self.proto.as_deref() {
            None => Ok(AddressFamily::all()),
            Some(raw) => parse_protocols(raw).map_err(|_| ConfigError::InvalidValue {
                field: format!("{prefix}.proto"),
                value: raw.to_string(),
                expected: "IPv4, IPv6".to_string(),
            }),
        }
    }

    /// Parsed TTL, `None` when absent or malformed.
    pub fn ttl_secs(&self) -> Option<i64> {
        self.ttl
            .as_ref()
            .map(yaml_value_to_string)
            .and_then(|raw| parse_ttl(&raw))
    }

    /// Convert to the domain definition. `default_ttl` applies when the
    /// alias sets no usable TTL.
    pub fn to_domain(&self, index: usize, default_ttl: i64) -> Result<AliasDefinition, ConfigError> {
        let prefix = format!("aliases[{index}]");
        let definition = AliasDefinition {
            name: AliasName(self.name.clone()),
            kind: AliasKind::from(self.alias_type.as_str()),
            protocols: self.protocols(&prefix)?,
            items: self
                .items
                .iter()
                .map(yaml_value_to_string)
                .flat_map(|raw| {
                    raw.split_whitespace()
                        .map(str::to_string)
                        .collect::<Vec<_>>()
                })
                .collect(),
            ttl_secs: self.ttl_secs().unwrap_or(default_ttl),
            interface: self
                .interface
                .as_deref()
                .map(str::trim)
                .filter(|i| !i.is_empty())
                .map(str::to_string),
        };

        definition
            .validate()
            .map_err(|e| ConfigError::Validation {
                field: prefix,
                message: e.to_string(),
            })?;
        Ok(definition)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn host_config() -> AliasConfig {
        AliasConfig {
            name: "webservers".to_string(),
            alias_type: "host".to_string(),
            proto: None,
            items: vec![
                serde_yaml_ng::Value::String("10.0.0.0/24 !10.0.0.5".to_string()),
                serde_yaml_ng::Value::String("www.example.com".to_string()),
            ],
            ttl: None,
            interface: None,
            description: None,
        }
    }

    #[test]
    fn validate_host_ok() {
        assert!(host_config().validate(0).is_ok());
    }

    #[test]
    fn validate_rejects_bad_name() {
        let mut cfg = host_config();
        cfg.name = "web servers".to_string();
        let err = cfg.validate(3).unwrap_err();
        assert!(matches!(err, ConfigError::Validation { ref field, .. } if field == "aliases[3].name"));
    }

    #[test]
    fn validate_rejects_unknown_protocol() {
        let mut cfg = host_config();
        cfg.proto = Some("IPv4,IPX".to_string());
        assert!(matches!(
            cfg.validate(0),
            Err(ConfigError::InvalidValue { .. })
        ));
    }

    #[test]
    fn validate_requires_interface_for_interface_net() {
        let mut cfg = host_config();
        cfg.alias_type = "interface_net".to_string();
        assert!(cfg.validate(0).is_err());
        cfg.interface = Some("igb1".to_string());
        assert!(cfg.validate(0).is_ok());
    }

    #[test]
    fn items_are_split_on_whitespace() {
        let def = host_config().to_domain(0, -1).unwrap();
        let items: Vec<&str> = def.items.iter().map(String::as_str).collect();
        assert_eq!(items, vec!["!10.0.0.5", "10.0.0.0/24", "www.example.com"]);
        assert_eq!(def.kind, AliasKind::Host);
        assert_eq!(def.protocols, AddressFamily::all());
    }

    #[test]
    fn ttl_accepts_numbers_and_decimal_strings() {
        let mut cfg = host_config();
        cfg.ttl = Some(serde_yaml_ng::Value::Number(300.into()));
        assert_eq!(cfg.ttl_secs(), Some(300));
        cfg.ttl = Some(serde_yaml_ng::Value::String("86400.5".to_string()));
        assert_eq!(cfg.ttl_secs(), Some(86_400));
    }

    #[test]
    fn malformed_ttl_falls_back_to_default() {
        let mut cfg = host_config();
        cfg.ttl = Some(serde_yaml_ng::Value::String("1h".to_string()));
        assert_eq!(cfg.ttl_secs(), None);
        assert_eq!(cfg.to_domain(0, 600).unwrap().ttl_secs, 600);
    }

    #[test]
    fn geoip_codes_are_kept_as_written() {
        let cfg = AliasConfig {
            name: "eu".to_string(),
            alias_type: "geoip".to_string(),
            proto: Some("IPv4".to_string()),
            items: vec![serde_yaml_ng::Value::String("NL de".to_string())],
            ttl: None,
            interface: None,
            description: None,
        };
        let def = cfg.to_domain(1, -1).unwrap();
        assert_eq!(def.items.iter().collect::<Vec<_>>(), vec!["NL", "de"]);
    }

    #[test]
    fn unknown_type_maps_to_other() {
        let mut cfg = host_config();
        cfg.alias_type = "port".to_string();
        let def = cfg.to_domain(0, -1).unwrap();
        assert_eq!(def.kind, AliasKind::Other("port".to_string()));
    }
}
