#![forbid(unsafe_code)]

pub mod alias_service_impl;
pub mod dns_collector;
