use std::net::SocketAddr;
use std::path::PathBuf;

use crate::error::{Error, Result};

pub const DEFAULT_PORT: u16 = 8000;

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// SQLite connection string, e.g. "sqlite://data/segmenter.db" or a bare path.
    pub database_url: String,
}

impl ServerConfig {
    pub fn socket_addr(&self) -> std::result::Result<SocketAddr, std::net::AddrParseError> {
        format!("{}:{}", self.host, self.port).parse()
    }

    pub fn db_path(&self) -> Result<PathBuf> {
        parse_database_url(&self.database_url)
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: DEFAULT_PORT,
            database_url: "sqlite://segmenter.db".to_string(),
        }
    }
}

/// Turns a connection string into the database file path SQLite should open.
/// Accepts `sqlite://path`, `sqlite:path`, a bare path, or `:memory:`.
pub fn parse_database_url(url: &str) -> Result<PathBuf> {
    let url = url.trim();
    let path = url
        .strip_prefix("sqlite://")
        .or_else(|| url.strip_prefix("sqlite:"))
        .unwrap_or(url);

    if path.is_empty() {
        return Err(Error::Config("database url is empty".to_string()));
    }
    if path.contains("://") {
        return Err(Error::Config(format!(
            "unsupported database url scheme: {url}"
        )));
    }

    // Query parameters such as "?mode=rwc" are not meaningful here.
    let path = path.split('?').next().unwrap_or(path);
    Ok(PathBuf::from(path))
}
