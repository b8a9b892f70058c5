use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::time::Duration;

use domain::alias::error::AliasError;
use ports::secondary::alias_cache_port::AliasCachePort;

const CONTENT_SUFFIX: &str = "self.txt";
const FINGERPRINT_SUFFIX: &str = "md5.txt";

/// Alias artifacts stored as plain files in one directory.
///
/// Layout per alias `name`:
/// - `<dir>/<name>.self.txt`: resolved entries, one per line
/// - `<dir>/<name>.md5.txt`: identity fingerprint, hex, no newline
///
/// The fingerprint age is the file's modification time.
///
/// I/O is blocking `std::fs`. Artifacts are a few small files per alias
/// resolution, read and written once each, so callers on the tokio runtime
/// use it directly.
pub struct FsAliasCache {
    dir: PathBuf,
}

impl FsAliasCache {
    /// Open the cache rooted at `dir`, creating the directory if needed.
    pub fn open(dir: impl Into<PathBuf>) -> Result<Self, AliasError> {
        let dir = dir.into();
        std::fs::create_dir_all(&dir)
            .map_err(|e| AliasError::cache(dir.display().to_string(), e))?;
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn content_path(&self, name: &str) -> PathBuf {
        self.dir.join(format!("{name}.{CONTENT_SUFFIX}"))
    }

    pub fn fingerprint_path(&self, name: &str) -> PathBuf {
        self.dir.join(format!("{name}.{FINGERPRINT_SUFFIX}"))
    }
}

fn read_optional(path: &Path, name: &str) -> Result<Option<Vec<u8>>, AliasError> {
    match std::fs::read(path) {
        Ok(bytes) => Ok(Some(bytes)),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
        Err(e) => Err(AliasError::cache(name, format!("{}: {e}", path.display()))),
    }
}

impl AliasCachePort for FsAliasCache {
    fn read_content(&self, name: &str) -> Result<Option<Vec<u8>>, AliasError> {
        read_optional(&self.content_path(name), name)
    }

    fn write_content(&self, name: &str, content: &[u8]) -> Result<(), AliasError> {
        let path = self.content_path(name);
        std::fs::write(&path, content)
            .map_err(|e| AliasError::cache(name, format!("{}: {e}", path.display())))
    }

    fn read_fingerprint(&self, name: &str) -> Result<Option<String>, AliasError> {
        Ok(read_optional(&self.fingerprint_path(name), name)?
            .map(|bytes| String::from_utf8_lossy(&bytes).trim().to_string()))
    }

    fn write_fingerprint(&self, name: &str, fingerprint: &str) -> Result<(), AliasError> {
        let path = self.fingerprint_path(name);
        std::fs::write(&path, fingerprint)
            .map_err(|e| AliasError::cache(name, format!("{}: {e}", path.display())))
    }

    fn fingerprint_age(&self, name: &str) -> Result<Option<Duration>, AliasError> {
        let path = self.fingerprint_path(name);
        let meta = match std::fs::metadata(&path) {
            Ok(meta) => meta,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(AliasError::cache(name, format!("{}: {e}", path.display()))),
        };
        let modified = meta
            .modified()
            .map_err(|e| AliasError::cache(name, format!("{}: {e}", path.display())))?;
        // A timestamp in the future counts as freshly written.
        Ok(Some(modified.elapsed().unwrap_or_default()))
    }

    fn content_exists(&self, name: &str) -> bool {
        self.content_path(name).is_file()
    }
}
