use std::collections::BTreeSet;
use std::sync::Arc;

use domain::alias::error::AliasError;
use ports::secondary::dns_resolver_port::DnsResolverPort;
use tracing::debug;

/// Two-phase hostname lookup for one alias.
///
/// Hostnames are buffered (deduplicated) while sources are walked, then
/// looked up together in a single batch.
pub struct DnsCollector {
    alias: String,
    pending: BTreeSet<String>,
    resolver: Arc<dyn DnsResolverPort>,
}

impl DnsCollector {
    pub fn new(alias: impl Into<String>, resolver: Arc<dyn DnsResolverPort>) -> Self {
        Self {
            alias: alias.into(),
            pending: BTreeSet::new(),
            resolver,
        }
    }

    /// Queue a hostname. No lookup happens here.
    pub fn enqueue(&mut self, hostname: impl Into<String>) {
        self.pending.insert(hostname.into());
    }

    pub fn pending(&self) -> usize {
        self.pending.len()
    }

    /// Resolve everything queued so far in one batch and clear the queue.
    /// An empty queue completes without touching the resolver.
    pub async fn collect_all(&mut self) -> Result<BTreeSet<String>, AliasError> {
        if self.pending.is_empty() {
            return Ok(BTreeSet::new());
        }
        let hostnames = std::mem::take(&mut self.pending);
        let addresses = self.resolver.resolve_batch(&hostnames).await?;
        debug!(
            alias = %self.alias,
            hostnames = hostnames.len(),
            addresses = addresses.len(),
            "hostnames resolved"
        );
        Ok(addresses)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ports::test_utils::StaticDnsResolver;

    #[tokio::test]
    async fn enqueue_deduplicates_and_collects_in_one_batch() {
        let dns = Arc::new(
            StaticDnsResolver::new()
                .with_record("a.example.com", &["192.0.2.1"])
                .with_record("b.example.com", &["192.0.2.2", "2001:db8::2"]),
        );
        let mut collector = DnsCollector::new("web", dns.clone());
        collector.enqueue("a.example.com");
        collector.enqueue("b.example.com");
        collector.enqueue("a.example.com");
        assert_eq!(collector.pending(), 2);

        let out = collector.collect_all().await.unwrap();
        assert_eq!(out.len(), 3);
        assert!(out.contains("2001:db8::2"));
        assert_eq!(dns.batch_count(), 1);
        assert_eq!(collector.pending(), 0);
    }

    #[tokio::test]
    async fn empty_queue_skips_resolver() {
        let dns = Arc::new(StaticDnsResolver::new());
        let mut collector = DnsCollector::new("web", dns.clone());
        assert!(collector.collect_all().await.unwrap().is_empty());
        assert_eq!(dns.batch_count(), 0);
    }

    #[tokio::test]
    async fn resolver_failure_propagates() {
        let dns = Arc::new(StaticDnsResolver::new());
        dns.set_failing(true);
        let mut collector = DnsCollector::new("web", dns);
        collector.enqueue("a.example.com");
        assert!(matches!(
            collector.collect_all().await,
            Err(AliasError::Resolution { .. })
        ));
    }

    #[tokio::test]
    async fn unknown_hosts_resolve_to_nothing() {
        let dns = Arc::new(StaticDnsResolver::new());
        let mut collector = DnsCollector::new("web", dns);
        collector.enqueue("nxdomain.example.com");
        assert!(collector.collect_all().await.unwrap().is_empty());
    }
}
