use std::future::Future;
use std::pin::Pin;

use domain::alias::error::AliasError;

/// Secondary port deriving addresses from an interface's current prefixes.
pub trait InterfaceAddressPort: Send + Sync {
    /// Combine each global IPv6 prefix of `interface` with the host bits of
    /// `host_part` (e.g. `::1:2`).
    fn dynamic_ipv6<'a>(
        &'a self,
        interface: &'a str,
        host_part: &'a str,
    ) -> Pin<Box<dyn Future<Output = Result<Vec<String>, AliasError>> + Send + 'a>>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn interface_address_port_is_object_safe() {
        fn _check(_port: &dyn InterfaceAddressPort) {}
    }
}
