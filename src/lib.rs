//! # Rolekeeper
//!
//! A multi-tenant authentication and authorization server, usable both as a
//! standalone binary and as a library.
//!
//! Users hold roles inside companies. Roles may include other roles, possibly
//! from other applications, and a user's effective permissions are reported as
//! `application -> company -> [{role, permissions}]`.
//!
//! ## Library Usage
//!
//! ```toml
//! [dependencies]
//! rolekeeper = { version = "0.0.1", default-features = false }
//! ```
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use rolekeeper::config::ServerConfig;
//! use rolekeeper::server::{AppState, create_router};
//! use rolekeeper::store::{SqliteStore, Store};
//!
//! let config = ServerConfig { jwt_secret: "change-me-please-0123".into(), ..Default::default() };
//! let store = SqliteStore::new(config.db_path()).unwrap();
//! store.initialize().unwrap();
//! rolekeeper::seed::seed_all(&store);
//!
//! let state = Arc::new(AppState::new(Arc::new(store), config));
//! let router = create_router(state);
//! // Serve with axum...
//! ```
//!
//! ## Feature Flags
//!
//! - `cli` (default): Builds the `rolekeeper` binary. Disable with `default-features = false`.

pub mod auth;
pub mod config;
pub mod error;
pub mod rbac;
pub mod seed;
pub mod server;
pub mod store;
pub mod types;
