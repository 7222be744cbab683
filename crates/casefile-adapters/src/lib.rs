pub mod config;
pub mod eip1193;

pub use config::{ConfigError, RuntimeProfile, WalletAdapterConfig};
pub use eip1193::Eip1193Adapter;
