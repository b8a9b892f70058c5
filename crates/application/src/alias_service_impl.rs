use std::collections::BTreeSet;
use std::sync::Arc;

use domain::alias::entity::{AliasDefinition, AliasKind, ResolutionState, SourceStrategy};
use domain::alias::error::AliasError;
use domain::alias::fingerprint::{fingerprint, is_expired};
use domain::alias::normalizer::{Normalized, normalize};
use domain::alias::parser::{country_code, list_entry};
use ports::secondary::alias_cache_port::AliasCachePort;
use ports::secondary::arp_table_port::ArpTablePort;
use ports::secondary::dns_resolver_port::DnsResolverPort;
use ports::secondary::geoip_dataset_port::GeoIpDatasetPort;
use ports::secondary::interface_address_port::InterfaceAddressPort;
use ports::secondary::pf_table_port::PfTablePort;
use ports::secondary::url_fetch_port::UrlFetchPort;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{debug, error, info, warn};

use crate::dns_collector::DnsCollector;

/// Every collaborator an alias may need while resolving.
#[derive(Clone)]
pub struct AliasPorts {
    pub cache: Arc<dyn AliasCachePort>,
    pub url_fetch: Arc<dyn UrlFetchPort>,
    pub dns: Arc<dyn DnsResolverPort>,
    pub arp: Arc<dyn ArpTablePort>,
    pub interfaces: Arc<dyn InterfaceAddressPort>,
    pub pf_table: Arc<dyn PfTablePort>,
    pub geoip: Arc<dyn GeoIpDatasetPort>,
}

/// One alias being resolved into its flat address set.
///
/// Content is computed at most once per object unless `resolve(true)` is
/// called. Change and expiry decisions are evaluated lazily and cached.
///
/// Callers must not resolve the same alias name from two objects at the
/// same time: artifacts are written without locking.
pub struct AliasResolution {
    definition: AliasDefinition,
    known_aliases: Arc<BTreeSet<String>>,
    ports: AliasPorts,
    changed: Option<bool>,
    expired: Option<bool>,
    state: ResolutionState,
    content: BTreeSet<String>,
}

impl AliasResolution {
    pub fn new(
        definition: AliasDefinition,
        known_aliases: Arc<BTreeSet<String>>,
        ports: AliasPorts,
    ) -> Self {
        Self {
            definition,
            known_aliases,
            ports,
            changed: None,
            expired: None,
            state: ResolutionState::Unresolved,
            content: BTreeSet::new(),
        }
    }

    pub fn name(&self) -> &str {
        self.definition.name.as_str()
    }

    pub fn kind(&self) -> &AliasKind {
        &self.definition.kind
    }

    pub fn state(&self) -> ResolutionState {
        self.state
    }

    pub fn definition(&self) -> &AliasDefinition {
        &self.definition
    }

    /// Raw items resolved by this alias itself. References to other known
    /// aliases are left out; a reference to its own name is kept.
    pub fn items(&self) -> impl Iterator<Item = &str> {
        self.definition
            .items
            .iter()
            .map(String::as_str)
            .filter(|item| !self.known_aliases.contains(*item) || *item == self.name())
    }

    /// Raw items naming other known aliases.
    pub fn dependencies(&self) -> impl Iterator<Item = &str> {
        self.definition
            .items
            .iter()
            .map(String::as_str)
            .filter(|item| self.known_aliases.contains(*item) && *item != self.name())
    }

    pub fn identity_fingerprint(&self) -> String {
        fingerprint(
            self.definition.items.iter().map(String::as_str),
            &self.definition.protocols,
        )
    }

    /// True when either artifact is missing or the persisted fingerprint
    /// differs from the current input.
    pub fn has_changed(&mut self) -> bool {
        if let Some(changed) = self.changed {
            return changed;
        }
        let name = self.name();
        let changed = if self.ports.cache.content_exists(name) {
            match self.ports.cache.read_fingerprint(name) {
                Ok(Some(persisted)) => persisted.trim() != self.identity_fingerprint(),
                Ok(None) => true,
                Err(e) => {
                    warn!(alias = %name, error = %e, "fingerprint unreadable, treating alias as changed");
                    true
                }
            }
        } else {
            true
        };
        self.changed = Some(changed);
        changed
    }

    /// True only for a positive TTL whose fingerprint artifact is older
    /// than the TTL.
    pub fn is_expired(&mut self) -> bool {
        if let Some(expired) = self.expired {
            return expired;
        }
        let expired = if self.definition.ttl_secs > 0 {
            match self.ports.cache.fingerprint_age(self.name()) {
                Ok(age) => is_expired(self.definition.ttl_secs, age),
                Err(e) => {
                    warn!(alias = %self.name(), error = %e, "fingerprint age unknown");
                    false
                }
            }
        } else {
            false
        };
        self.expired = Some(expired);
        expired
    }

    /// Resolve the alias and return its sorted entries.
    ///
    /// Never fails: a source error restores the previous content artifact
    /// and yields its entries instead.
    pub async fn resolve(&mut self, force: bool) -> Vec<String> {
        if self.state.is_terminal() && !force {
            return self.entries();
        }

        if self.is_expired() || self.has_changed() || force {
            self.recompute().await;
        } else {
            self.content = match self.ports.cache.read_content(self.name()) {
                Ok(Some(bytes)) => String::from_utf8_lossy(&bytes)
                    .split_whitespace()
                    .map(str::to_string)
                    .collect(),
                Ok(None) => BTreeSet::new(),
                Err(e) => {
                    warn!(alias = %self.name(), error = %e, "cached content unreadable");
                    BTreeSet::new()
                }
            };
            self.state = ResolutionState::Resolved;
            debug!(alias = %self.name(), count = self.content.len(), "alias unchanged, using cached content");
        }

        self.entries()
    }

    fn entries(&self) -> Vec<String> {
        self.content.iter().cloned().collect()
    }

    async fn recompute(&mut self) {
        self.state = ResolutionState::Resolving;
        let name = self.name().to_string();

        let rollback = match self.ports.cache.read_content(&name) {
            Ok(content) => content.unwrap_or_default(),
            Err(e) => {
                warn!(alias = %name, error = %e, "previous content unreadable, rollback buffer empty");
                Vec::new()
            }
        };

        match self.collect().await.and_then(|entries| self.persist(entries)) {
            Ok(entries) => {
                info!(alias = %name, count = entries.len(), "alias resolved");
                self.content = entries;
                self.state = ResolutionState::Resolved;
            }
            Err(e) => {
                error!(alias = %name, error = %e, "alias resolve error, keeping previous content");
                if let Err(e) = self.ports.cache.write_content(&name, &rollback) {
                    error!(alias = %name, error = %e, "failed to restore previous content");
                }
                self.content = decode_rollback(&rollback);
                self.state = ResolutionState::RolledBack;
            }
        }

        // Written on failure too, so a failing input is not retried until
        // it changes or expires.
        match self
            .ports
            .cache
            .write_fingerprint(&name, &self.identity_fingerprint())
        {
            Ok(()) => {
                self.changed = Some(false);
                self.expired = Some(false);
            }
            Err(e) => {
                error!(alias = %name, error = %e, "failed to persist fingerprint");
                self.changed = None;
                self.expired = None;
            }
        }
    }

    fn persist(&self, entries: BTreeSet<String>) -> Result<BTreeSet<String>, AliasError> {
        let body = entries
            .iter()
            .map(String::as_str)
            .collect::<Vec<_>>()
            .join("\n");
        self.ports.cache.write_content(self.name(), body.as_bytes())?;
        Ok(entries)
    }

    async fn collect(&self) -> Result<BTreeSet<String>, AliasError> {
        let mut entries = self.table_seed().await?;
        let mut dns = DnsCollector::new(self.name(), Arc::clone(&self.ports.dns));
        let items: Vec<String> = self.items().map(str::to_string).collect();

        if let Some(strategy) = self.definition.kind.strategy() {
            if strategy == SourceStrategy::GeoIp && !items.is_empty() {
                self.ports.geoip.ensure_fresh().await?;
            }
            for item in &items {
                match strategy {
                    SourceStrategy::Literal => self.absorb(normalize(item), &mut entries, &mut dns),
                    SourceStrategy::RemoteList => {
                        self.fetch_list(item, &mut entries, &mut dns).await?;
                    }
                    SourceStrategy::GeoIp => {
                        self.read_country(item, &mut entries, &mut dns).await?;
                    }
                    SourceStrategy::DynamicIpv6 => {
                        let interface = self.interface()?;
                        entries.extend(self.ports.interfaces.dynamic_ipv6(interface, item).await?);
                    }
                    SourceStrategy::MacTable => {
                        entries.extend(self.ports.arp.addresses_for(item).await?);
                    }
                }
            }
        }

        entries.extend(dns.collect_all().await?);
        Ok(entries)
    }

    /// Live table contents for kinds that extend an existing table.
    async fn table_seed(&self) -> Result<BTreeSet<String>, AliasError> {
        let mut seed = BTreeSet::new();
        if !self.definition.kind.seeds_from_table() {
            return Ok(seed);
        }
        if self.definition.kind == AliasKind::InterfaceNet {
            let address = format!("{}:network", self.interface()?);
            self.ports.pf_table.replace_table(self.name(), &address).await?;
        }
        for line in self.ports.pf_table.show_table(self.name()).await? {
            let line = line.trim();
            if !line.is_empty() {
                seed.insert(line.to_string());
            }
        }
        debug!(alias = %self.name(), count = seed.len(), "seeded from packet-filter table");
        Ok(seed)
    }

    async fn fetch_list(
        &self,
        url: &str,
        entries: &mut BTreeSet<String>,
        dns: &mut DnsCollector,
    ) -> Result<(), AliasError> {
        let list = self.ports.url_fetch.fetch(url).await?;
        if !list.is_success() {
            error!(alias = %self.name(), url, http_code = list.status, "error fetching alias url");
            return Err(AliasError::fetch(url, format!("HTTP {}", list.status)));
        }
        info!(alias = %self.name(), url, lines = list.lines.len(), "fetched alias url");
        for line in &list.lines {
            if let Some(token) = list_entry(line) {
                self.absorb(normalize(token), entries, dns);
            }
        }
        Ok(())
    }

    async fn read_country(
        &self,
        country: &str,
        entries: &mut BTreeSet<String>,
        dns: &mut DnsCollector,
    ) -> Result<(), AliasError> {
        let Some(code) = country_code(country) else {
            warn!(alias = %self.name(), item = country, "invalid GeoIP country code, skipped");
            return Ok(());
        };
        let country = code.as_str();
        for family in &self.definition.protocols {
            match self.ports.geoip.read_dataset(country, *family).await? {
                Some(lines) => {
                    for line in &lines {
                        self.absorb(normalize(line), entries, dns);
                    }
                }
                None => debug!(
                    alias = %self.name(),
                    path = %self.ports.geoip.dataset_path(country, *family).display(),
                    "no GeoIP data for country"
                ),
            }
        }
        Ok(())
    }

    fn absorb(&self, normalized: Normalized, entries: &mut BTreeSet<String>, dns: &mut DnsCollector) {
        match normalized {
            Normalized::Entries(found) => entries.extend(found),
            Normalized::Overflow(found) => {
                error!(alias = %self.name(), kept = found.len(), "alias table overflow");
                entries.extend(found);
            }
            Normalized::Hostname(hostname) => dns.enqueue(hostname),
            Normalized::Invalid => {}
        }
    }

    fn interface(&self) -> Result<&str, AliasError> {
        self.definition
            .interface
            .as_deref()
            .filter(|i| !i.is_empty())
            .ok_or_else(|| AliasError::Invalid {
                reason: format!("{}: {} alias requires an interface", self.name(), self.kind()),
            })
    }
}

/// In-memory view of a rollback buffer. Undecodable content counts as
/// empty; the bytes themselves are restored unchanged.
fn decode_rollback(buffer: &[u8]) -> BTreeSet<String> {
    std::str::from_utf8(buffer)
        .map(|text| {
            text.split('\n')
                .filter(|line| !line.is_empty())
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default()
}

/// Result of resolving one alias through [`AliasAppService`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AliasOutcome {
    pub name: String,
    pub kind: String,
    pub state: ResolutionState,
    pub entries: Vec<String>,
    pub dependencies: Vec<String>,
}

/// Application-level alias service.
///
/// Holds the validated alias set and resolves aliases concurrently, at most
/// `max_parallel` at a time.
pub struct AliasAppService {
    definitions: Vec<AliasDefinition>,
    known_aliases: Arc<BTreeSet<String>>,
    ports: AliasPorts,
    max_parallel: usize,
}

impl AliasAppService {
    pub fn new(
        definitions: Vec<AliasDefinition>,
        ports: AliasPorts,
        max_parallel: usize,
    ) -> Result<Self, AliasError> {
        let mut known = BTreeSet::new();
        for definition in &definitions {
            definition.validate()?;
            if !known.insert(definition.name.as_str().to_string()) {
                return Err(AliasError::Duplicate {
                    name: definition.name.as_str().to_string(),
                });
            }
        }
        Ok(Self {
            definitions,
            known_aliases: Arc::new(known),
            ports,
            max_parallel: max_parallel.max(1),
        })
    }

    pub fn alias_count(&self) -> usize {
        self.definitions.len()
    }

    pub fn definitions(&self) -> &[AliasDefinition] {
        &self.definitions
    }

    /// Fresh resolution object for `name`.
    pub fn resolution(&self, name: &str) -> Result<AliasResolution, AliasError> {
        let definition = self
            .definitions
            .iter()
            .find(|d| d.name.as_str() == name)
            .cloned()
            .ok_or_else(|| AliasError::NotFound {
                name: name.to_string(),
            })?;
        Ok(AliasResolution::new(
            definition,
            Arc::clone(&self.known_aliases),
            self.ports.clone(),
        ))
    }

    /// Dependencies of every alias, in definition order.
    pub fn dependencies(&self) -> Vec<(String, Vec<String>)> {
        self.definitions
            .iter()
            .map(|d| {
                let resolution = AliasResolution::new(
                    d.clone(),
                    Arc::clone(&self.known_aliases),
                    self.ports.clone(),
                );
                let deps = resolution.dependencies().map(str::to_string).collect();
                (d.name.as_str().to_string(), deps)
            })
            .collect()
    }

    /// Persisted content of `name`, one entry per line.
    pub fn cached_content(&self, name: &str) -> Result<Vec<String>, AliasError> {
        if !self.known_aliases.contains(name) {
            return Err(AliasError::NotFound {
                name: name.to_string(),
            });
        }
        Ok(self
            .ports
            .cache
            .read_content(name)?
            .map(|bytes| {
                String::from_utf8_lossy(&bytes)
                    .split_whitespace()
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default())
    }

    /// Resolve the named aliases, or all of them when `names` is empty.
    /// Outcomes are sorted by alias name.
    pub async fn resolve_all(
        &self,
        names: &[String],
        force: bool,
    ) -> Result<Vec<AliasOutcome>, AliasError> {
        // One resolution per name, so each alias has a single writer.
        let selected: BTreeSet<String> = if names.is_empty() {
            self.definitions
                .iter()
                .map(|d| d.name.as_str().to_string())
                .collect()
        } else {
            names.iter().cloned().collect()
        };

        let mut resolutions = Vec::with_capacity(selected.len());
        for name in &selected {
            resolutions.push(self.resolution(name)?);
        }

        let limiter = Arc::new(Semaphore::new(self.max_parallel));
        let mut tasks = JoinSet::new();
        for mut resolution in resolutions {
            let limiter = Arc::clone(&limiter);
            tasks.spawn(async move {
                let _permit = limiter.acquire_owned().await;
                let entries = resolution.resolve(force).await;
                AliasOutcome {
                    name: resolution.name().to_string(),
                    kind: resolution.kind().to_string(),
                    state: resolution.state(),
                    dependencies: resolution.dependencies().map(str::to_string).collect(),
                    entries,
                }
            });
        }

        let mut outcomes = Vec::with_capacity(selected.len());
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok(outcome) => outcomes.push(outcome),
                Err(e) => error!(error = %e, "alias resolution task failed"),
            }
        }
        outcomes.sort_by(|a, b| a.name.cmp(&b.name));

        let rolled_back = outcomes
            .iter()
            .filter(|o| o.state == ResolutionState::RolledBack)
            .count();
        info!(
            aliases = outcomes.len(),
            rolled_back, "alias resolution cycle complete"
        );
        Ok(outcomes)
    }
}
