// ── Paths ──────────────────────────────────────────────────────────

pub const DEFAULT_CONFIG_PATH: &str = "/usr/local/etc/aliastables/config.yaml";

/// Where content and fingerprint artifacts live; the table loader reads
/// them from here.
pub const DEFAULT_CACHE_DIR: &str = "/var/db/aliastables";

pub const DEFAULT_GEOIP_DIR: &str = "/usr/local/share/GeoIP/alias";

pub const DEFAULT_PFCTL_PATH: &str = "/sbin/pfctl";

// ── Timeouts ───────────────────────────────────────────────────────

pub const DEFAULT_FETCH_TIMEOUT_SECS: u64 = 120;
pub const DEFAULT_DNS_QUERY_TIMEOUT_SECS: u64 = 5;

/// One day minus a 90 second margin.
pub const DEFAULT_GEOIP_MAX_AGE_SECS: u64 = 86_400 - 90;

// ── Concurrency ────────────────────────────────────────────────────

pub const DEFAULT_MAX_PARALLEL_ALIASES: usize = 4;
pub const DEFAULT_DNS_MAX_CONCURRENT: usize = 64;
