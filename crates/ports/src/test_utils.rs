//! In-memory implementations of the alias ports for use in tests.

use std::collections::{BTreeSet, HashMap};
use std::future::Future;
use std::path::PathBuf;
use std::pin::Pin;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::{Duration, SystemTime};

use domain::alias::entity::{FetchedList, GeoIpRefreshStats};
use domain::alias::error::AliasError;
use domain::common::entity::AddressFamily;

use crate::secondary::alias_cache_port::AliasCachePort;
use crate::secondary::arp_table_port::ArpTablePort;
use crate::secondary::dns_resolver_port::DnsResolverPort;
use crate::secondary::geoip_dataset_port::GeoIpDatasetPort;
use crate::secondary::interface_address_port::InterfaceAddressPort;
use crate::secondary::pf_table_port::PfTablePort;
use crate::secondary::url_fetch_port::UrlFetchPort;

// ── Cache ──────────────────────────────────────────────────────────

#[derive(Default)]
struct CacheEntry {
    content: Option<Vec<u8>>,
    fingerprint: Option<(String, SystemTime)>,
}

/// Alias cache held in memory. Fingerprint ages can be forged.
#[derive(Default)]
pub struct MemoryAliasCache {
    entries: Mutex<HashMap<String, CacheEntry>>,
    fail_content_writes: AtomicBool,
}

impl MemoryAliasCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pretend the fingerprint artifact was written `age` ago.
    pub fn set_fingerprint_age(&self, name: &str, age: Duration) {
        let mut entries = self.entries.lock().unwrap();
        if let Some((_, written)) = entries
            .entry(name.to_string())
            .or_default()
            .fingerprint
            .as_mut()
        {
            *written = SystemTime::now() - age;
        }
    }

    /// Make every subsequent content write fail.
    pub fn fail_content_writes(&self, fail: bool) {
        self.fail_content_writes.store(fail, Ordering::Relaxed);
    }

    pub fn content_string(&self, name: &str) -> Option<String> {
        self.entries
            .lock()
            .unwrap()
            .get(name)
            .and_then(|e| e.content.clone())
            .map(|c| String::from_utf8_lossy(&c).into_owned())
    }

    pub fn fingerprint(&self, name: &str) -> Option<String> {
        self.entries
            .lock()
            .unwrap()
            .get(name)
            .and_then(|e| e.fingerprint.as_ref().map(|(fp, _)| fp.clone()))
    }
}

impl AliasCachePort for MemoryAliasCache {
    fn read_content(&self, name: &str) -> Result<Option<Vec<u8>>, AliasError> {
        Ok(self
            .entries
            .lock()
            .unwrap()
            .get(name)
            .and_then(|e| e.content.clone()))
    }

    fn write_content(&self, name: &str, content: &[u8]) -> Result<(), AliasError> {
        if self.fail_content_writes.load(Ordering::Relaxed) {
            return Err(AliasError::cache(name, "write refused"));
        }
        self.entries
            .lock()
            .unwrap()
            .entry(name.to_string())
            .or_default()
            .content = Some(content.to_vec());
        Ok(())
    }

    fn read_fingerprint(&self, name: &str) -> Result<Option<String>, AliasError> {
        Ok(self.fingerprint(name))
    }

    fn write_fingerprint(&self, name: &str, fingerprint: &str) -> Result<(), AliasError> {
        self.entries
            .lock()
            .unwrap()
            .entry(name.to_string())
            .or_default()
            .fingerprint = Some((fingerprint.to_string(), SystemTime::now()));
        Ok(())
    }

    fn fingerprint_age(&self, name: &str) -> Result<Option<Duration>, AliasError> {
        Ok(self
            .entries
            .lock()
            .unwrap()
            .get(name)
            .and_then(|e| e.fingerprint.as_ref())
            .map(|(_, written)| written.elapsed().unwrap_or_default()))
    }

    fn content_exists(&self, name: &str) -> bool {
        self.entries
            .lock()
            .unwrap()
            .get(name)
            .is_some_and(|e| e.content.is_some())
    }
}

// ── URL fetch ──────────────────────────────────────────────────────

/// Serves canned list bodies by URL. Unknown URLs fail like a transport
/// error.
#[derive(Default)]
pub struct StaticUrlFetch {
    responses: Mutex<HashMap<String, FetchedList>>,
    pub calls: AtomicUsize,
}

impl StaticUrlFetch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn respond(&self, url: &str, status: u16, lines: &[&str]) {
        self.responses.lock().unwrap().insert(
            url.to_string(),
            FetchedList {
                status,
                lines: lines.iter().map(ToString::to_string).collect(),
            },
        );
    }

    pub fn forget(&self, url: &str) {
        self.responses.lock().unwrap().remove(url);
    }
}

impl UrlFetchPort for StaticUrlFetch {
    fn fetch<'a>(
        &'a self,
        url: &'a str,
    ) -> Pin<Box<dyn Future<Output = Result<FetchedList, AliasError>> + Send + 'a>> {
        self.calls.fetch_add(1, Ordering::Relaxed);
        let response = self.responses.lock().unwrap().get(url).cloned();
        Box::pin(async move { response.ok_or_else(|| AliasError::fetch(url, "connection refused")) })
    }
}

// ── DNS ────────────────────────────────────────────────────────────

/// Resolves from a fixed host table. Records every batch it receives.
#[derive(Default)]
pub struct StaticDnsResolver {
    records: HashMap<String, Vec<String>>,
    fail: AtomicBool,
    pub batches: Mutex<Vec<BTreeSet<String>>>,
}

impl StaticDnsResolver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_record(mut self, hostname: &str, addresses: &[&str]) -> Self {
        self.records.insert(
            hostname.to_string(),
            addresses.iter().map(ToString::to_string).collect(),
        );
        self
    }

    pub fn set_failing(&self, fail: bool) {
        self.fail.store(fail, Ordering::Relaxed);
    }

    pub fn batch_count(&self) -> usize {
        self.batches.lock().unwrap().len()
    }
}

impl DnsResolverPort for StaticDnsResolver {
    fn resolve_batch<'a>(
        &'a self,
        hostnames: &'a BTreeSet<String>,
    ) -> Pin<Box<dyn Future<Output = Result<BTreeSet<String>, AliasError>> + Send + 'a>> {
        self.batches.lock().unwrap().push(hostnames.clone());
        let fail = self.fail.load(Ordering::Relaxed);
        Box::pin(async move {
            if fail {
                return Err(AliasError::Resolution {
                    reason: "resolver timed out".to_string(),
                });
            }
            Ok(hostnames
                .iter()
                .filter_map(|h| self.records.get(h))
                .flatten()
                .cloned()
                .collect())
        })
    }
}

// ── Neighbour and interface tables ─────────────────────────────────

/// MAC to address table.
#[derive(Default)]
pub struct StaticArpTable {
    entries: HashMap<String, Vec<String>>,
}

impl StaticArpTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_entry(mut self, mac: &str, addresses: &[&str]) -> Self {
        self.entries.insert(
            mac.to_ascii_lowercase(),
            addresses.iter().map(ToString::to_string).collect(),
        );
        self
    }
}

impl ArpTablePort for StaticArpTable {
    fn addresses_for<'a>(
        &'a self,
        mac: &'a str,
    ) -> Pin<Box<dyn Future<Output = Result<Vec<String>, AliasError>> + Send + 'a>> {
        let found = self
            .entries
            .get(&mac.to_ascii_lowercase())
            .cloned()
            .unwrap_or_default();
        Box::pin(async move { Ok(found) })
    }
}

/// Interface to IPv6 prefix table; combines by simple string concatenation
/// of `<prefix>|<host_part>` so tests can assert what was asked.
#[derive(Default)]
pub struct StaticInterfaceAddresses {
    prefixes: HashMap<String, Vec<String>>,
}

impl StaticInterfaceAddresses {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_prefix(mut self, interface: &str, prefix: &str) -> Self {
        self.prefixes
            .entry(interface.to_string())
            .or_default()
            .push(prefix.to_string());
        self
    }
}

impl InterfaceAddressPort for StaticInterfaceAddresses {
    fn dynamic_ipv6<'a>(
        &'a self,
        interface: &'a str,
        host_part: &'a str,
    ) -> Pin<Box<dyn Future<Output = Result<Vec<String>, AliasError>> + Send + 'a>> {
        let result = match self.prefixes.get(interface) {
            Some(prefixes) => Ok(prefixes
                .iter()
                .map(|p| format!("{}{}", p.trim_end_matches(':'), host_part))
                .collect()),
            None => Err(AliasError::fetch(interface, "no such interface")),
        };
        Box::pin(async move { result })
    }
}

// ── Packet-filter tables ───────────────────────────────────────────

/// In-memory packet-filter tables recording every replace call.
#[derive(Default)]
pub struct RecordingPfTable {
    tables: Mutex<HashMap<String, Vec<String>>>,
    pub replaced: Mutex<Vec<(String, String)>>,
    fail_show: AtomicBool,
}

impl RecordingPfTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_table(self, table: &str, entries: &[&str]) -> Self {
        self.tables.lock().unwrap().insert(
            table.to_string(),
            entries.iter().map(ToString::to_string).collect(),
        );
        self
    }

    pub fn set_show_failing(&self, fail: bool) {
        self.fail_show.store(fail, Ordering::Relaxed);
    }
}

impl PfTablePort for RecordingPfTable {
    fn replace_table<'a>(
        &'a self,
        table: &'a str,
        address: &'a str,
    ) -> Pin<Box<dyn Future<Output = Result<(), AliasError>> + Send + 'a>> {
        self.replaced
            .lock()
            .unwrap()
            .push((table.to_string(), address.to_string()));
        Box::pin(async { Ok(()) })
    }

    fn show_table<'a>(
        &'a self,
        table: &'a str,
    ) -> Pin<Box<dyn Future<Output = Result<Vec<String>, AliasError>> + Send + 'a>> {
        let result = if self.fail_show.load(Ordering::Relaxed) {
            Err(AliasError::fetch(table, "pfctl exited with status 1"))
        } else {
            Ok(self
                .tables
                .lock()
                .unwrap()
                .get(table)
                .cloned()
                .unwrap_or_default())
        };
        Box::pin(async move { result })
    }
}

// ── GeoIP ──────────────────────────────────────────────────────────

/// GeoIP dataset held in memory, counting refresh requests.
#[derive(Default)]
pub struct StaticGeoIpDataset {
    files: HashMap<(String, AddressFamily), Vec<String>>,
    pub refreshes: AtomicUsize,
}

impl StaticGeoIpDataset {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_file(mut self, country: &str, family: AddressFamily, lines: &[&str]) -> Self {
        self.files.insert(
            (country.to_string(), family),
            lines.iter().map(ToString::to_string).collect(),
        );
        self
    }
}

impl GeoIpDatasetPort for StaticGeoIpDataset {
    fn ensure_fresh(
        &self,
    ) -> Pin<Box<dyn Future<Output = Result<Option<GeoIpRefreshStats>, AliasError>> + Send + '_>>
    {
        self.refreshes.fetch_add(1, Ordering::Relaxed);
        Box::pin(async { Ok(None) })
    }

    fn dataset_path(&self, country: &str, family: AddressFamily) -> PathBuf {
        PathBuf::from(format!("/geoip/{country}-{family}"))
    }

    fn read_dataset<'a>(
        &'a self,
        country: &'a str,
        family: AddressFamily,
    ) -> Pin<Box<dyn Future<Output = Result<Option<Vec<String>>, AliasError>> + Send + 'a>> {
        let lines = self.files.get(&(country.to_string(), family)).cloned();
        Box::pin(async move { Ok(lines) })
    }
}
