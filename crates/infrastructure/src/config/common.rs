//! Shared helpers and error types used across config modules.

use std::path::Path;

use tracing::warn;

// ── Security limits ────────────────────────────────────────────────

/// Maximum number of alias definitions in one config.
pub(super) const MAX_ALIASES: usize = 10_000;

// ── Config errors ──────────────────────────────────────────────────

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("I/O error reading config: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML parse error: {0}")]
    Yaml(String),

    #[error("validation error: {field}: {message}")]
    Validation { field: String, message: String },

    #[error("invalid value '{value}' for field '{field}': expected one of {expected}")]
    InvalidValue {
        field: String,
        value: String,
        expected: String,
    },
}

impl From<serde_yaml_ng::Error> for ConfigError {
    fn from(e: serde_yaml_ng::Error) -> Self {
        Self::Yaml(e.to_string())
    }
}

// ── Shared serde helpers ───────────────────────────────────────────

/// Render a scalar YAML value as text so `ttl: 300` and `ttl: "300"` read
/// the same.
pub(super) fn yaml_value_to_string(val: &serde_yaml_ng::Value) -> String {
    match val {
        serde_yaml_ng::Value::String(s) => s.clone(),
        serde_yaml_ng::Value::Number(n) => n.to_string(),
        serde_yaml_ng::Value::Bool(b) => b.to_string(),
        other => format!("{other:?}"),
    }
}

/// Log a warning if a file is world-readable (Unix only).
#[cfg(unix)]
pub(super) fn warn_if_world_readable(path: &Path, label: &str) {
    use std::os::unix::fs::PermissionsExt;
    if let Ok(metadata) = std::fs::metadata(path) {
        let mode = metadata.permissions().mode();
        if mode & 0o004 != 0 {
            warn!(
                path = %path.display(),
                mode = format!("{mode:04o}"),
                "{label} is world-readable, consider chmod 640 or stricter",
            );
        }
    }
}

#[cfg(not(unix))]
pub(super) fn warn_if_world_readable(_path: &Path, _label: &str) {}

/// Enforce a maximum count on a config collection.
pub(super) fn check_limit(field: &str, count: usize, max: usize) -> Result<(), ConfigError> {
    if count > max {
        return Err(ConfigError::Validation {
            field: field.to_string(),
            message: format!("count {count} exceeds maximum {max}"),
        });
    }
    Ok(())
}

/// Reject zero for numeric limits.
pub(super) fn check_positive(field: &str, value: u64) -> Result<(), ConfigError> {
    if value == 0 {
        return Err(ConfigError::Validation {
            field: field.to_string(),
            message: "must be > 0".to_string(),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn check_limit_boundary() {
        assert!(check_limit("aliases", MAX_ALIASES, MAX_ALIASES).is_ok());
        let err = check_limit("aliases", MAX_ALIASES + 1, MAX_ALIASES).unwrap_err();
        assert!(err.to_string().contains("exceeds maximum"));
    }

    #[test]
    fn check_positive_rejects_zero() {
        assert!(check_positive("resolver.max_parallel_aliases", 1).is_ok());
        assert!(matches!(
            check_positive("resolver.max_parallel_aliases", 0),
            Err(ConfigError::Validation { ref field, .. }) if field == "resolver.max_parallel_aliases"
        ));
    }

    #[test]
    fn yaml_scalars_render_as_text() {
        assert_eq!(
            yaml_value_to_string(&serde_yaml_ng::Value::Number(300.into())),
            "300"
        );
        assert_eq!(
            yaml_value_to_string(&serde_yaml_ng::Value::String("300.0".into())),
            "300.0"
        );
    }

    #[cfg(unix)]
    #[test]
    fn warn_if_world_readable_tolerates_missing_file() {
        warn_if_world_readable(Path::new("/nonexistent/aliastables.yaml"), "config file");
    }
}
