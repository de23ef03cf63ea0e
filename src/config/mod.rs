mod server;

pub use server::{DEFAULT_PORT, ServerConfig, parse_database_url};
