pub mod alias_cache_port;
pub mod arp_table_port;
pub mod dns_resolver_port;
pub mod geoip_dataset_port;
pub mod interface_address_port;
pub mod pf_table_port;
pub mod url_fetch_port;
