use std::collections::BTreeSet;
use std::future::Future;
use std::net::IpAddr;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;

use domain::alias::error::AliasError;
use hickory_resolver::TokioAsyncResolver;
use hickory_resolver::config::LookupIpStrategy;
use hickory_resolver::error::{ResolveError, ResolveErrorKind};
use ports::secondary::dns_resolver_port::DnsResolverPort;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{debug, warn};

/// Batched hostname resolution over hickory.
///
/// Every hostname of a batch is looked up concurrently (A and AAAA), with
/// at most `max_concurrent` queries in flight. A name without records is
/// skipped; any other failure fails the whole batch.
pub struct HickoryDnsResolver {
    resolver: TokioAsyncResolver,
    limiter: Arc<Semaphore>,
}

impl HickoryDnsResolver {
    /// Build from the host's resolver configuration (`/etc/resolv.conf`).
    pub fn from_system_conf(
        max_concurrent: usize,
        query_timeout: Duration,
    ) -> Result<Self, AliasError> {
        let (config, mut opts) = hickory_resolver::system_conf::read_system_conf()
            .map_err(|e| AliasError::Resolution {
                reason: format!("cannot read system resolver config: {e}"),
            })?;
        opts.timeout = query_timeout;
        opts.ip_strategy = LookupIpStrategy::Ipv4AndIpv6;
        Ok(Self::with_resolver(
            TokioAsyncResolver::tokio(config, opts),
            max_concurrent,
        ))
    }

    pub fn with_resolver(resolver: TokioAsyncResolver, max_concurrent: usize) -> Self {
        Self {
            resolver,
            limiter: Arc::new(Semaphore::new(max_concurrent.max(1))),
        }
    }

    async fn do_resolve(&self, hostnames: &BTreeSet<String>) -> Result<BTreeSet<String>, AliasError> {
        let mut tasks = JoinSet::new();
        for hostname in hostnames {
            let resolver = self.resolver.clone();
            let limiter = Arc::clone(&self.limiter);
            let hostname = hostname.clone();
            tasks.spawn(async move {
                let _permit = limiter.acquire_owned().await;
                let result = resolver.lookup_ip(hostname.as_str()).await;
                (hostname, result.map(|lookup| lookup.iter().collect::<Vec<IpAddr>>()))
            });
        }

        let mut addresses = BTreeSet::new();
        while let Some(joined) = tasks.join_next().await {
            let (hostname, result) = joined.map_err(|e| AliasError::Resolution {
                reason: format!("lookup task failed: {e}"),
            })?;
            match result {
                Ok(ips) => {
                    debug!(hostname, count = ips.len(), "hostname resolved");
                    addresses.extend(ips.iter().map(ToString::to_string));
                }
                Err(e) if is_missing_record(&e) => {
                    debug!(hostname, "no address records");
                }
                Err(e) => {
                    warn!(hostname, error = %e, "hostname lookup failed");
                    return Err(AliasError::Resolution {
                        reason: format!("{hostname}: {e}"),
                    });
                }
            }
        }

        Ok(addresses)
    }
}

fn is_missing_record(err: &ResolveError) -> bool {
    matches!(err.kind(), ResolveErrorKind::NoRecordsFound { .. })
}

impl DnsResolverPort for HickoryDnsResolver {
    fn resolve_batch<'a>(
        &'a self,
        hostnames: &'a BTreeSet<String>,
    ) -> Pin<Box<dyn Future<Output = Result<BTreeSet<String>, AliasError>> + Send + 'a>> {
        Box::pin(self.do_resolve(hostnames))
    }
}
