use std::future::Future;
use std::pin::Pin;

use domain::alias::entity::FetchedList;
use domain::alias::error::AliasError;

/// Secondary port for downloading hosted address lists.
///
/// Timeout and TLS verification are fixed when the adapter is built.
/// Transport failures are errors; HTTP error statuses are reported through
/// [`FetchedList::status`] so the caller decides what counts as failure.
pub trait UrlFetchPort: Send + Sync {
    fn fetch<'a>(
        &'a self,
        url: &'a str,
    ) -> Pin<Box<dyn Future<Output = Result<FetchedList, AliasError>> + Send + 'a>>;
}
