use std::collections::BTreeSet;
use std::future::Future;
use std::pin::Pin;

use domain::alias::error::AliasError;

/// Secondary port resolving a batch of hostnames in one call.
///
/// Names without records are skipped. An error means the batch as a whole
/// could not be answered (resolver unavailable, timeouts) and the caller
/// must not trust a partial result.
pub trait DnsResolverPort: Send + Sync {
    /// Resolve every hostname to its A and AAAA addresses.
    fn resolve_batch<'a>(
        &'a self,
        hostnames: &'a BTreeSet<String>,
    ) -> Pin<Box<dyn Future<Output = Result<BTreeSet<String>, AliasError>> + Send + 'a>>;
}
