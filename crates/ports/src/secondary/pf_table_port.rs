use std::future::Future;
use std::pin::Pin;

use domain::alias::error::AliasError;

/// Secondary port onto the live packet-filter tables.
pub trait PfTablePort: Send + Sync {
    /// Replace the contents of `table` with `address` (e.g. `em0:network`).
    fn replace_table<'a>(
        &'a self,
        table: &'a str,
        address: &'a str,
    ) -> Pin<Box<dyn Future<Output = Result<(), AliasError>> + Send + 'a>>;

    /// Current entries of `table`, one per element, trimmed.
    fn show_table<'a>(
        &'a self,
        table: &'a str,
    ) -> Pin<Box<dyn Future<Output = Result<Vec<String>, AliasError>> + Send + 'a>>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pf_table_port_is_object_safe() {
        fn _check(_port: &dyn PfTablePort) {}
    }
}
