use thiserror::Error;

#[derive(Debug, Error)]
pub enum AliasError {
    #[error("alias not found: {name}")]
    NotFound { name: String },

    #[error("duplicate alias: {name}")]
    Duplicate { name: String },

    #[error("invalid alias: {reason}")]
    Invalid { reason: String },

    /// Remote list or firewall table could not be read.
    #[error("fetch failed for {source_name}: {reason}")]
    Fetch { source_name: String, reason: String },

    /// The batched hostname lookup failed as a whole.
    #[error("DNS resolution failed: {reason}")]
    Resolution { reason: String },

    /// A cache artifact could not be read or written.
    #[error("cache artifact error for alias '{name}': {reason}")]
    Cache { name: String, reason: String },
}

impl AliasError {
    /// Shorthand for a [`AliasError::Fetch`] from any displayable cause.
    pub fn fetch(source_name: impl Into<String>, reason: impl std::fmt::Display) -> Self {
        Self::Fetch {
            source_name: source_name.into(),
            reason: reason.to_string(),
        }
    }

    /// Shorthand for a [`AliasError::Cache`] from any displayable cause.
    pub fn cache(name: impl Into<String>, reason: impl std::fmt::Display) -> Self {
        Self::Cache {
            name: name.into(),
            reason: reason.to_string(),
        }
    }
}
