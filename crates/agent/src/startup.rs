use std::path::Path;
use std::sync::Arc;

use adapters::alias::arp_table::SystemArpTable;
use adapters::alias::fs_alias_cache::FsAliasCache;
use adapters::alias::geoip_directory::GeoIpDirectory;
use adapters::alias::hickory_dns_resolver::HickoryDnsResolver;
use adapters::alias::http_list_fetcher::HttpListFetcher;
use adapters::alias::interface_addresses::IfconfigInterfaceAddresses;
use adapters::alias::pfctl_table::PfctlTable;
use application::alias_service_impl::{AliasAppService, AliasPorts};
use infrastructure::config::{AgentConfig, ResolverConfig};
use infrastructure::logging::init_logging;
use tracing::info;

use crate::cli::Cli;

/// Load config and install logging. CLI flags take precedence over the
/// config file.
pub fn init(cli: &Cli) -> anyhow::Result<AgentConfig> {
    let config = AgentConfig::load(Path::new(&cli.config))?;

    let log_level = cli.log_level.unwrap_or(config.agent.log_level);
    let log_format = cli.log_format.unwrap_or(config.agent.log_format);
    init_logging(log_level, log_format)?;

    info!(
        config_path = %cli.config,
        log_level = log_level.as_str(),
        log_format = log_format.as_str(),
        aliases = config.aliases.len(),
        "configuration loaded"
    );
    Ok(config)
}

/// Wire the production adapters into the alias service.
pub fn build_service(config: &AgentConfig) -> anyhow::Result<AliasAppService> {
    let ports = build_ports(&config.resolver)?;
    let definitions = config.to_definitions()?;
    let service =
        AliasAppService::new(definitions, ports, config.resolver.max_parallel_aliases)?;
    info!(
        alias_count = service.alias_count(),
        cache_dir = %config.resolver.cache_dir.display(),
        "alias service initialized"
    );
    Ok(service)
}

fn build_ports(resolver: &ResolverConfig) -> anyhow::Result<AliasPorts> {
    let cache = FsAliasCache::open(&resolver.cache_dir)?;
    let url_fetch = HttpListFetcher::new(resolver.fetch_timeout(), resolver.ssl_no_verify)?;
    let dns = HickoryDnsResolver::from_system_conf(
        resolver.dns.max_concurrent_queries,
        resolver.dns.query_timeout(),
    )?;
    let geoip = GeoIpDirectory::new(
        &resolver.geoip.dataset_dir,
        resolver.geoip.max_age(),
        resolver.geoip.refresh_command.clone(),
    );

    Ok(AliasPorts {
        cache: Arc::new(cache),
        url_fetch: Arc::new(url_fetch),
        dns: Arc::new(dns),
        arp: Arc::new(SystemArpTable::new()),
        interfaces: Arc::new(IfconfigInterfaceAddresses::new()),
        pf_table: Arc::new(PfctlTable::new(resolver.pfctl_path.clone())),
        geoip: Arc::new(geoip),
    })
}
