//! Resolver runtime settings.

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::common::{ConfigError, check_positive};
use crate::constants::{
    DEFAULT_CACHE_DIR, DEFAULT_DNS_MAX_CONCURRENT, DEFAULT_DNS_QUERY_TIMEOUT_SECS,
    DEFAULT_FETCH_TIMEOUT_SECS, DEFAULT_GEOIP_DIR, DEFAULT_GEOIP_MAX_AGE_SECS,
    DEFAULT_MAX_PARALLEL_ALIASES, DEFAULT_PFCTL_PATH,
};

/// ```yaml
/// resolver:
///   cache_dir: /var/db/aliastables
///   fetch_timeout_secs: 120
///   ssl_no_verify: false
///   default_ttl: -1
///   max_parallel_aliases: 4
///   pfctl_path: /sbin/pfctl
///   dns:
///     max_concurrent_queries: 64
///     query_timeout_secs: 5
///   geoip:
///     dataset_dir: /usr/local/share/GeoIP/alias
///     max_age_secs: 86310
///     refresh_command: []
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ResolverConfig {
    #[serde(default = "default_cache_dir")]
    pub cache_dir: PathBuf,

    #[serde(default = "default_fetch_timeout_secs")]
    pub fetch_timeout_secs: u64,

    /// Disable TLS certificate validation for hosted lists.
    #[serde(default)]
    pub ssl_no_verify: bool,

    /// TTL for aliases that do not set one. `<= 0` disables expiry.
    #[serde(default = "default_ttl")]
    pub default_ttl: i64,

    #[serde(default = "default_max_parallel_aliases")]
    pub max_parallel_aliases: usize,

    #[serde(default = "default_pfctl_path")]
    pub pfctl_path: String,

    #[serde(default)]
    pub dns: DnsQueryConfig,

    #[serde(default)]
    pub geoip: GeoIpConfig,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            cache_dir: default_cache_dir(),
            fetch_timeout_secs: default_fetch_timeout_secs(),
            ssl_no_verify: false,
            default_ttl: default_ttl(),
            max_parallel_aliases: default_max_parallel_aliases(),
            pfctl_path: default_pfctl_path(),
            dns: DnsQueryConfig::default(),
            geoip: GeoIpConfig::default(),
        }
    }
}

impl ResolverConfig {
    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_secs(self.fetch_timeout_secs)
    }

    pub(super) fn validate(&self) -> Result<(), ConfigError> {
        if self.cache_dir.as_os_str().is_empty() {
            return Err(ConfigError::Validation {
                field: "resolver.cache_dir".to_string(),
                message: "must not be empty".to_string(),
            });
        }
        check_positive("resolver.fetch_timeout_secs", self.fetch_timeout_secs)?;
        check_positive(
            "resolver.max_parallel_aliases",
            self.max_parallel_aliases as u64,
        )?;
        if self.pfctl_path.trim().is_empty() {
            return Err(ConfigError::Validation {
                field: "resolver.pfctl_path".to_string(),
                message: "must not be empty".to_string(),
            });
        }
        check_positive(
            "resolver.dns.max_concurrent_queries",
            self.dns.max_concurrent_queries as u64,
        )?;
        check_positive("resolver.dns.query_timeout_secs", self.dns.query_timeout_secs)?;
        check_positive("resolver.geoip.max_age_secs", self.geoip.max_age_secs)?;
        if self
            .geoip
            .refresh_command
            .first()
            .is_some_and(|program| program.trim().is_empty())
        {
            return Err(ConfigError::Validation {
                field: "resolver.geoip.refresh_command".to_string(),
                message: "program must not be empty".to_string(),
            });
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DnsQueryConfig {
    #[serde(default = "default_dns_max_concurrent")]
    pub max_concurrent_queries: usize,

    #[serde(default = "default_dns_query_timeout_secs")]
    pub query_timeout_secs: u64,
}

impl Default for DnsQueryConfig {
    fn default() -> Self {
        Self {
            max_concurrent_queries: default_dns_max_concurrent(),
            query_timeout_secs: default_dns_query_timeout_secs(),
        }
    }
}

impl DnsQueryConfig {
    pub fn query_timeout(&self) -> Duration {
        Duration::from_secs(self.query_timeout_secs)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GeoIpConfig {
    #[serde(default = "default_geoip_dir")]
    pub dataset_dir: PathBuf,

    #[serde(default = "default_geoip_max_age_secs")]
    pub max_age_secs: u64,

    /// Program and arguments that rewrite `dataset_dir`. Empty disables
    /// refreshing.
    #[serde(default)]
    pub refresh_command: Vec<String>,
}

impl Default for GeoIpConfig {
    fn default() -> Self {
        Self {
            dataset_dir: default_geoip_dir(),
            max_age_secs: default_geoip_max_age_secs(),
            refresh_command: Vec::new(),
        }
    }
}

impl GeoIpConfig {
    pub fn max_age(&self) -> Duration {
        Duration::from_secs(self.max_age_secs)
    }
}

fn default_cache_dir() -> PathBuf {
    PathBuf::from(DEFAULT_CACHE_DIR)
}
fn default_fetch_timeout_secs() -> u64 {
    DEFAULT_FETCH_TIMEOUT_SECS
}
fn default_ttl() -> i64 {
    -1
}
fn default_max_parallel_aliases() -> usize {
    DEFAULT_MAX_PARALLEL_ALIASES
}
fn default_pfctl_path() -> String {
    DEFAULT_PFCTL_PATH.to_string()
}
fn default_dns_max_concurrent() -> usize {
    DEFAULT_DNS_MAX_CONCURRENT
}
fn default_dns_query_timeout_secs() -> u64 {
    DEFAULT_DNS_QUERY_TIMEOUT_SECS
}
fn default_geoip_dir() -> PathBuf {
    PathBuf::from(DEFAULT_GEOIP_DIR)
}
fn default_geoip_max_age_secs() -> u64 {
    DEFAULT_GEOIP_MAX_AGE_SECS
}
