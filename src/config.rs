//! Server configuration from environment variables.
//!
//! - `TAVERN_DATA_ROOT`: user data directory (default: `./data/default-user`)
//! - `TAVERN_GROUP_FILES_ROOT`: secondary asset root for group images
//! - `HOST`: bind address (default: `0.0.0.0`)
//! - `PORT`: HTTP port (default: `3000`)

use std::env;
use std::path::PathBuf;

use crate::assets::AssetResolver;

pub const DEFAULT_DATA_ROOT: &str = "./data/default-user";
pub const DEFAULT_HOST: &str = "0.0.0.0";
pub const DEFAULT_PORT: u16 = 3000;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    pub data_root: PathBuf,
    pub group_files_root: Option<PathBuf>,
    pub host: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            data_root: PathBuf::from(DEFAULT_DATA_ROOT),
            group_files_root: None,
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
        }
    }
}

impl ServerConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build from an arbitrary variable lookup. Unparseable ports fall back
    /// to the default.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let port = match non_empty("PORT") {
            Some(raw) => raw.trim().parse().unwrap_or_else(|_| {
                log::warn!("Ignoring invalid PORT {:?}, using {}", raw, DEFAULT_PORT);
                DEFAULT_PORT
            }),
            None => defaults.port,
        };

        Self {
            data_root: non_empty("TAVERN_DATA_ROOT")
                .map(PathBuf::from)
                .unwrap_or(defaults.data_root),
            group_files_root: non_empty("TAVERN_GROUP_FILES_ROOT").map(PathBuf::from),
            host: non_empty("HOST").unwrap_or(defaults.host),
            port,
        }
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Asset resolver over the configured roots.
    pub fn asset_resolver(&self) -> AssetResolver {
        let resolver = AssetResolver::new(&self.data_root);
        match &self.group_files_root {
            Some(root) => resolver.with_secondary_root(root),
            None => resolver,
        }
    }
}
