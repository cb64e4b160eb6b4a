pub mod cli;
pub mod config;
pub mod crypto;
pub mod device;
pub mod envelope;
pub mod errors;
pub mod query;
pub mod region;
pub mod transport;
