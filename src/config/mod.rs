//! Configuration loaded from `.otacheck.toml`.

pub mod settings;

pub use settings::Settings;
