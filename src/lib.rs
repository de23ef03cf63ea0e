//! # Segmenter
//!
//! A REST service that manages users, segments and the memberships between
//! them, usable both as a standalone binary and as a library.
//!
//! ## Library Usage
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use segmenter::server::{AppState, create_router};
//! use segmenter::store::{SqliteStore, Store};
//!
//! let store = SqliteStore::new("./segmenter.db").unwrap();
//! store.initialize().unwrap();
//!
//! let state = Arc::new(AppState::new(Arc::new(store)));
//! let router = create_router(state);
//! // Serve with axum...
//! ```
//!
//! ## Feature Flags
//!
//! - `cli` (default): Builds the `segmenter` binary. Disable with `default-features = false`.

pub mod config;
pub mod error;
pub mod membership;
pub mod server;
pub mod store;
pub mod types;
