use std::future::Future;
use std::io::ErrorKind;
use std::path::PathBuf;
use std::pin::Pin;
use std::time::Duration;

use domain::alias::entity::GeoIpRefreshStats;
use domain::alias::error::AliasError;
use domain::common::entity::AddressFamily;
use ports::secondary::geoip_dataset_port::GeoIpDatasetPort;
use tokio::sync::Mutex;
use tracing::{info, warn};

use super::command;

/// File whose age decides whether the dataset is stale.
pub const FRESHNESS_SENTINEL: &str = "NL-IPv4";

/// Default maximum sentinel age: one day minus a 90 second margin.
pub const DEFAULT_MAX_AGE: Duration = Duration::from_secs(86_400 - 90);

/// Per-country GeoIP files in one directory, named `<CC>-<IPv4|IPv6>`.
///
/// A stale or missing dataset is refreshed by running an external command
/// which is expected to rewrite the directory. Concurrent callers share
/// one refresh: the staleness check is repeated under `refresh_lock`.
pub struct GeoIpDirectory {
    dir: PathBuf,
    max_age: Duration,
    refresh_command: Vec<String>,
    refresh_lock: Mutex<()>,
}

impl GeoIpDirectory {
    pub fn new(dir: impl Into<PathBuf>, max_age: Duration, refresh_command: Vec<String>) -> Self {
        Self {
            dir: dir.into(),
            max_age,
            refresh_command,
            refresh_lock: Mutex::new(()),
        }
    }

    async fn is_stale(&self) -> bool {
        let sentinel = self.dir.join(FRESHNESS_SENTINEL);
        match tokio::fs::metadata(&sentinel).await.and_then(|m| m.modified()) {
            Ok(modified) => modified.elapsed().unwrap_or_default() > self.max_age,
            Err(_) => true,
        }
    }

    async fn do_ensure_fresh(&self) -> Result<Option<GeoIpRefreshStats>, AliasError> {
        if !self.is_stale().await {
            return Ok(None);
        }

        let _guard = self.refresh_lock.lock().await;
        if !self.is_stale().await {
            return Ok(None);
        }

        let Some((program, args)) = self.refresh_command.split_first() else {
            warn!(dir = %self.dir.display(), "GeoIP dataset is stale and no refresh command is configured");
            return Ok(None);
        };

        let args: Vec<&str> = args.iter().map(String::as_str).collect();
        command::run(program, &args).await?;

        let stats = self.collect_stats().await?;
        info!(
            file_count = stats.file_count,
            address_count = stats.address_count,
            "GeoIP dataset updated"
        );
        Ok(Some(stats))
    }

    async fn collect_stats(&self) -> Result<GeoIpRefreshStats, AliasError> {
        let source = self.dir.display().to_string();
        let mut stats = GeoIpRefreshStats::default();
        let mut entries = tokio::fs::read_dir(&self.dir)
            .await
            .map_err(|e| AliasError::fetch(&source, e))?;
        while let Some(entry) = entries
            .next_entry()
            .await
            .map_err(|e| AliasError::fetch(&source, e))?
        {
            if !entry.file_type().await.is_ok_and(|t| t.is_file()) {
                continue;
            }
            let content = tokio::fs::read(entry.path())
                .await
                .map_err(|e| AliasError::fetch(&source, e))?;
            stats.file_count += 1;
            stats.address_count += String::from_utf8_lossy(&content)
                .lines()
                .filter(|l| !l.trim().is_empty())
                .count();
        }
        Ok(stats)
    }

    async fn do_read(
        &self,
        country: &str,
        family: AddressFamily,
    ) -> Result<Option<Vec<String>>, AliasError> {
        let path = self.dataset_path(country, family);
        match tokio::fs::read(&path).await {
            Ok(bytes) => Ok(Some(
                String::from_utf8_lossy(&bytes)
                    .lines()
                    .map(str::to_string)
                    .collect(),
            )),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(AliasError::fetch(path.display().to_string(), e)),
        }
    }
}

impl GeoIpDatasetPort for GeoIpDirectory {
    fn ensure_fresh(
        &self,
    ) -> Pin<Box<dyn Future<Output = Result<Option<GeoIpRefreshStats>, AliasError>> + Send + '_>>
    {
        Box::pin(self.do_ensure_fresh())
    }

    fn dataset_path(&self, country: &str, family: AddressFamily) -> PathBuf {
        self.dir.join(format!("{country}-{family}"))
    }

    fn read_dataset<'a>(
        &'a self,
        country: &'a str,
        family: AddressFamily,
    ) -> Pin<Box<dyn Future<Output = Result<Option<Vec<String>>, AliasError>> + Send + 'a>> {
        Box::pin(self.do_read(country, family))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dataset_path_uses_country_and_family() {
        let geo = GeoIpDirectory::new("/usr/local/share/GeoIP/alias", DEFAULT_MAX_AGE, vec![]);
        assert_eq!(
            geo.dataset_path("NL", AddressFamily::Ipv6),
            PathBuf::from("/usr/local/share/GeoIP/alias/NL-IPv6")
        );
    }

    #[tokio::test]
    async fn fresh_dataset_is_not_refreshed() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(FRESHNESS_SENTINEL), "1.0.0.0/8\n").unwrap();
        let geo = GeoIpDirectory::new(
            dir.path(),
            DEFAULT_MAX_AGE,
            vec!["/nonexistent/refresh".to_string()],
        );
        assert!(geo.ensure_fresh().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn missing_sentinel_runs_refresh_and_reports_stats() {
        let dir = tempfile::tempdir().unwrap();
        let script = format!(
            "printf '1.0.0.0/8\\n2.0.0.0/8\\n' > {0}/NL-IPv4; printf '2001:db8::/32\\n' > {0}/NL-IPv6",
            dir.path().display()
        );
        let geo = GeoIpDirectory::new(
            dir.path(),
            DEFAULT_MAX_AGE,
            vec!["sh".to_string(), "-c".to_string(), script],
        );
        let stats = geo.ensure_fresh().await.unwrap().unwrap();
        assert_eq!(stats.file_count, 2);
        assert_eq!(stats.address_count, 3);
    }

    #[tokio::test]
    async fn concurrent_callers_share_one_refresh() {
        let dir = tempfile::tempdir().unwrap();
        let log = tempfile::tempdir().unwrap();
        let runs = log.path().join("runs");
        let script = format!(
            "echo run >> {}; sleep 0.2; printf '1.0.0.0/8\\n' > {}/NL-IPv4",
            runs.display(),
            dir.path().display()
        );
        let geo = GeoIpDirectory::new(
            dir.path(),
            DEFAULT_MAX_AGE,
            vec!["sh".to_string(), "-c".to_string(), script],
        );

        let (a, b, c, d) = tokio::join!(
            geo.ensure_fresh(),
            geo.ensure_fresh(),
            geo.ensure_fresh(),
            geo.ensure_fresh()
        );
        let refreshed = [a, b, c, d]
            .into_iter()
            .map(Result::unwrap)
            .filter(Option::is_some)
            .count();
        assert_eq!(refreshed, 1);
        assert_eq!(std::fs::read_to_string(&runs).unwrap().lines().count(), 1);
    }

    #[tokio::test]
    async fn stale_without_command_is_tolerated() {
        let dir = tempfile::tempdir().unwrap();
        let geo = GeoIpDirectory::new(dir.path(), DEFAULT_MAX_AGE, vec![]);
        assert!(geo.ensure_fresh().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn failing_refresh_is_fetch_error() {
        let dir = tempfile::tempdir().unwrap();
        let geo = GeoIpDirectory::new(
            dir.path(),
            DEFAULT_MAX_AGE,
            vec!["sh".to_string(), "-c".to_string(), "exit 1".to_string()],
        );
        assert!(matches!(
            geo.ensure_fresh().await.unwrap_err(),
            AliasError::Fetch { .. }
        ));
    }

    #[tokio::test]
    async fn missing_country_file_reads_as_none() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("DE-IPv4"), "5.0.0.0/8\n").unwrap();
        let geo = GeoIpDirectory::new(dir.path(), DEFAULT_MAX_AGE, vec![]);
        assert_eq!(
            geo.read_dataset("DE", AddressFamily::Ipv4).await.unwrap(),
            Some(vec!["5.0.0.0/8".to_string()])
        );
        assert!(geo.read_dataset("DE", AddressFamily::Ipv6).await.unwrap().is_none());
    }
}
