use std::future::Future;
use std::pin::Pin;

use domain::alias::error::AliasError;

/// Secondary port over the neighbour tables (ARP and NDP).
pub trait ArpTablePort: Send + Sync {
    /// Addresses currently bound to `mac` (case-insensitive match).
    fn addresses_for<'a>(
        &'a self,
        mac: &'a str,
    ) -> Pin<Box<dyn Future<Output = Result<Vec<String>, AliasError>> + Send + 'a>>;
}
