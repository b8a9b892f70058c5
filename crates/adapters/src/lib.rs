#![deny(unsafe_code)]

pub mod alias;
