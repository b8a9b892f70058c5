pub mod arp_table;
pub mod command;
pub mod fs_alias_cache;
pub mod geoip_directory;
pub mod hickory_dns_resolver;
pub mod http_list_fetcher;
pub mod interface_addresses;
pub mod pfctl_table;
