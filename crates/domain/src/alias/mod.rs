pub mod entity;
pub mod error;
pub mod fingerprint;
pub mod normalizer;
pub mod parser;
