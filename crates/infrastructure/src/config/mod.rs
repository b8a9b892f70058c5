//! Resolver configuration: structs, parsing, and validation.
//!
//! - `common`: shared helpers and `ConfigError`
//! - `resolver`: runtime settings for sources and artifacts
//! - `alias`: alias definitions

mod alias;
mod common;
mod resolver;

pub use alias::AliasConfig;
pub use common::ConfigError;
pub use resolver::{DnsQueryConfig, GeoIpConfig, ResolverConfig};

use std::collections::HashSet;
use std::path::Path;

use domain::alias::entity::AliasDefinition;
use serde::{Deserialize, Serialize};

use common::{MAX_ALIASES, check_limit, warn_if_world_readable};

// ── Top-level config ───────────────────────────────────────────────

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AgentConfig {
    #[serde(default)]
    pub agent: AgentInfo,

    #[serde(default)]
    pub resolver: ResolverConfig,

    #[serde(default)]
    pub aliases: Vec<AliasConfig>,
}

impl AgentConfig {
    /// Load config from a YAML file.
    ///
    /// On Unix, logs a warning if the config file is world-readable.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        warn_if_world_readable(path, "config file");
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml(&content)
    }

    /// Parse config from a YAML string.
    pub fn from_yaml(yaml: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_yaml_ng::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate the config after deserialization.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.resolver.validate()?;
        check_limit("aliases", self.aliases.len(), MAX_ALIASES)?;

        let mut seen = HashSet::with_capacity(self.aliases.len());
        for (i, alias) in self.aliases.iter().enumerate() {
            alias.validate(i)?;
            if !seen.insert(alias.name.as_str()) {
                return Err(ConfigError::Validation {
                    field: format!("aliases[{i}].name"),
                    message: format!("duplicate alias name '{}'", alias.name),
                });
            }
        }
        Ok(())
    }

    /// Domain definitions for every configured alias, in config order.
    pub fn to_definitions(&self) -> Result<Vec<AliasDefinition>, ConfigError> {
        self.aliases
            .iter()
            .enumerate()
            .map(|(i, alias)| alias.to_domain(i, self.resolver.default_ttl))
            .collect()
    }
}

// ── Agent info ─────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AgentInfo {
    #[serde(default = "default_log_level")]
    pub log_level: LogLevel,

    #[serde(default = "default_log_format")]
    pub log_format: LogFormat,
}

impl Default for AgentInfo {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            log_format: default_log_format(),
        }
    }
}

fn default_log_level() -> LogLevel {
    LogLevel::Info
}
fn default_log_format() -> LogFormat {
    LogFormat::Text
}

// ── Log level ──────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Error => "error",
            Self::Warn => "warn",
            Self::Info => "info",
            Self::Debug => "debug",
            Self::Trace => "trace",
        }
    }
}

impl std::fmt::Display for LogLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for LogLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "error" => Ok(Self::Error),
            "warn" | "warning" => Ok(Self::Warn),
            "info" => Ok(Self::Info),
            "debug" => Ok(Self::Debug),
            "trace" => Ok(Self::Trace),
            _ => Err(format!(
                "invalid log level '{s}': expected error|warn|info|debug|trace"
            )),
        }
    }
}

// ── Log format ────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    Json,
    Text,
}

impl LogFormat {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Json => "json",
            Self::Text => "text",
        }
    }
}

impl std::fmt::Display for LogFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "json" => Ok(Self::Json),
            "text" | "pretty" => Ok(Self::Text),
            _ => Err(format!("invalid log format '{s}': expected json|text")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use domain::alias::entity::AliasKind;
    use domain::common::entity::AddressFamily;
    use std::path::PathBuf;

    const FULL: &str = r#"
agent:
  log_level: debug
  log_format: json
resolver:
  cache_dir: /tmp/aliastables
  fetch_timeout_secs: 30
  ssl_no_verify: true
  default_ttl: 3600
  max_parallel_aliases: 2
  dns:
    max_concurrent_queries: 16
  geoip:
    dataset_dir: /tmp/geoip
    refresh_command: ["/usr/local/bin/fetch-geoip", "--quiet"]
aliases:
  - name: webservers
    type: host
    proto: IPv4,IPv6
    items: ["10.0.0.0/24", "!10.0.0.5", "www.example.com"]
    ttl: "300"
  - name: drop
    type: urltable
    items: ["https://lists.example.org/drop.txt"]
  - name: lan_net
    type: interface_net
    interface: igb1
"#;

    // ── Parsing ───────────────────────────────────────────────────

    #[test]
    fn empty_document_uses_defaults() {
        let config = AgentConfig::from_yaml("{}").unwrap();
        assert_eq!(config.agent.log_level, LogLevel::Info);
        assert_eq!(config.agent.log_format, LogFormat::Text);
        assert_eq!(config.resolver.cache_dir, PathBuf::from("/var/db/aliastables"));
        assert!(config.aliases.is_empty());
    }

    #[test]
    fn full_document_parses() {
        let config = AgentConfig::from_yaml(FULL).unwrap();
        assert_eq!(config.agent.log_level, LogLevel::Debug);
        assert_eq!(config.agent.log_format, LogFormat::Json);
        assert!(config.resolver.ssl_no_verify);
        assert_eq!(config.resolver.max_parallel_aliases, 2);
        assert_eq!(config.resolver.dns.max_concurrent_queries, 16);
        assert_eq!(config.resolver.dns.query_timeout_secs, 5);
        assert_eq!(config.resolver.geoip.refresh_command.len(), 2);
        assert_eq!(config.aliases.len(), 3);
    }

    #[test]
    fn definitions_apply_default_ttl() {
        let defs = AgentConfig::from_yaml(FULL).unwrap().to_definitions().unwrap();
        assert_eq!(defs[0].ttl_secs, 300);
        assert_eq!(defs[1].ttl_secs, 3600);
        assert_eq!(defs[1].kind, AliasKind::UrlTable);
        assert_eq!(defs[2].interface.as_deref(), Some("igb1"));
        assert_eq!(
            defs[0].protocols,
            vec![AddressFamily::Ipv4, AddressFamily::Ipv6]
        );
    }

    #[test]
    fn unknown_top_level_field_rejected() {
        let err = AgentConfig::from_yaml("firewall: {}\n").unwrap_err();
        assert!(matches!(err, ConfigError::Yaml(_)));
    }

    // ── Validation ────────────────────────────────────────────────

    #[test]
    fn duplicate_alias_names_rejected() {
        let yaml = r#"
aliases:
  - name: a
    type: host
  - name: a
    type: network
"#;
        let err = AgentConfig::from_yaml(yaml).unwrap_err();
        assert!(matches!(
            err,
            ConfigError::Validation { ref field, .. } if field == "aliases[1].name"
        ));
    }

    #[test]
    fn missing_interface_rejected() {
        let yaml = "aliases:\n  - name: v6\n    type: dynipv6host\n    items: ['::1']\n";
        let err = AgentConfig::from_yaml(yaml).unwrap_err();
        assert!(err.to_string().contains("aliases[0].interface"));
    }

    #[test]
    fn invalid_resolver_limit_rejected() {
        let yaml = "resolver:\n  fetch_timeout_secs: 0\n";
        assert!(AgentConfig::from_yaml(yaml).is_err());
    }

    #[test]
    fn too_many_aliases_rejected() {
        let mut config = AgentConfig::default();
        let alias = AliasConfig {
            name: "a".to_string(),
            alias_type: "host".to_string(),
            proto: None,
            items: Vec::new(),
            ttl: None,
            interface: None,
            description: None,
        };
        config.aliases = vec![alias; MAX_ALIASES + 1];
        assert!(config.validate().unwrap_err().to_string().contains("exceeds maximum"));
    }

    #[test]
    fn load_reads_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.yaml");
        std::fs::write(&path, FULL).unwrap();
        assert_eq!(AgentConfig::load(&path).unwrap().aliases.len(), 3);
    }

    #[test]
    fn load_missing_file_is_io_error() {
        assert!(matches!(
            AgentConfig::load(Path::new("/nonexistent/aliastables.yaml")),
            Err(ConfigError::Io(_))
        ));
    }

    // ── LogLevel / LogFormat ──────────────────────────────────────

    #[test]
    fn log_level_parse() {
        assert_eq!("WARNING".parse::<LogLevel>().unwrap(), LogLevel::Warn);
        assert_eq!(LogLevel::Trace.as_str(), "trace");
        assert!("verbose".parse::<LogLevel>().is_err());
    }

    #[test]
    fn log_format_parse() {
        assert_eq!("JSON".parse::<LogFormat>().unwrap(), LogFormat::Json);
        assert_eq!("pretty".parse::<LogFormat>().unwrap(), LogFormat::Text);
        assert!("xml".parse::<LogFormat>().is_err());
    }
}
