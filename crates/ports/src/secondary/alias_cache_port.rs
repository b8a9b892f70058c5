use std::time::Duration;

use domain::alias::error::AliasError;

/// Persistent per-alias cache: the last resolved content and the
/// fingerprint of the input that produced it.
///
/// Both artifacts are keyed by alias name. Callers guarantee a single
/// writer per name; implementations do not lock.
pub trait AliasCachePort: Send + Sync {
    /// Raw bytes of the content artifact, `None` if it does not exist.
    fn read_content(&self, name: &str) -> Result<Option<Vec<u8>>, AliasError>;

    /// Replace the content artifact.
    fn write_content(&self, name: &str, content: &[u8]) -> Result<(), AliasError>;

    /// Persisted fingerprint, `None` if it does not exist.
    fn read_fingerprint(&self, name: &str) -> Result<Option<String>, AliasError>;

    /// Replace the fingerprint artifact. Also resets its age.
    fn write_fingerprint(&self, name: &str, fingerprint: &str) -> Result<(), AliasError>;

    /// Time since the fingerprint artifact was last written.
    fn fingerprint_age(&self, name: &str) -> Result<Option<Duration>, AliasError>;

    /// Whether a content artifact exists.
    fn content_exists(&self, name: &str) -> bool;
}
