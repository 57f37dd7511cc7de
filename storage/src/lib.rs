//! Storage crate: bounded connection pool and store client.
//!
//! ## Modules
//!
//! - [`connection`] – `Connector` / `Session` traits the pool is written against
//! - [`pool`] – `ConnectionPool`, `PooledConnection`, exhaustion policy
//! - [`client`] – `StoreClient` (query / query_one / exec / close)
//! - [`models`] – `Query`, `Value`, `Row`
//! - [`sql_connector`] – sqlx `Any` connector (PostgreSQL, SQLite)
//! - [`settings`] – `StoreSettings` loaded from env

pub mod client;
pub mod connection;
mod error;
pub mod models;
pub mod pool;
pub mod settings;
pub mod sql_connector;

pub use client::StoreClient;
pub use connection::{Connector, Session};
pub use error::StoreError;
pub use models::{BindError, Query, ResultSet, Row, Value};
pub use pool::{ConnectionPool, ExhaustionPolicy, PoolOptions, PoolStatus, PooledConnection};
pub use settings::StoreSettings;
pub use sql_connector::SqlConnector;
