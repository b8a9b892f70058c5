use std::future::Future;
use std::path::PathBuf;
use std::pin::Pin;

use domain::alias::entity::GeoIpRefreshStats;
use domain::alias::error::AliasError;
use domain::common::entity::AddressFamily;

/// Secondary port over the per-country GeoIP address files.
///
/// The dataset is shared by every geoip alias. Refreshing must be
/// idempotent: concurrent callers may both refresh, readers see whatever is
/// on disk.
pub trait GeoIpDatasetPort: Send + Sync {
    /// Refresh the dataset when missing or stale. Returns the refresh
    /// statistics, or `None` when the dataset was already fresh.
    fn ensure_fresh(
        &self,
    ) -> Pin<Box<dyn Future<Output = Result<Option<GeoIpRefreshStats>, AliasError>> + Send + '_>>;

    /// Location of the file for one country and family.
    fn dataset_path(&self, country: &str, family: AddressFamily) -> PathBuf;

    /// Lines of the file for one country and family, `None` if absent.
    fn read_dataset<'a>(
        &'a self,
        country: &'a str,
        family: AddressFamily,
    ) -> Pin<Box<dyn Future<Output = Result<Option<Vec<String>>, AliasError>> + Send + 'a>>;
}
