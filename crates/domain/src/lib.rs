#![forbid(unsafe_code)]

pub mod alias;
pub mod common;
