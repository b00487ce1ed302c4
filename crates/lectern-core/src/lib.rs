//! Configuration loading and credential resolution for lectern.

pub mod config;
pub mod vault;

pub use config::Config;
pub use vault::{DotenvVaultProvider, Secret, VaultProvider};
