//! Database connectors and utilities.
//!
//! The service keeps a single PostgreSQL pool (SeaORM over sqlx) for its
//! whole lifetime. This crate owns how that pool is configured, opened with
//! retry, migrated, health-checked and closed.
//!
//! # Features
//!
//! - `postgres` (default) - PostgreSQL support with SeaORM
//! - `config` - `core_config::FromEnv` implementations
//!
//! # Example
//!
//! ```ignore
//! use database::postgres::{self, PostgresConfig};
//! use migration::Migrator;
//!
//! let db = postgres::connect_from_config_with_retry(PostgresConfig::from_env()?, None).await?;
//! postgres::run_migrations::<Migrator>(&db, "products_service").await?;
//! // ...
//! postgres::close(db).await?;
//! ```

pub mod common;

#[cfg(feature = "postgres")]
pub mod postgres;

pub use common::{DatabaseError, DatabaseResult, RetryConfig};
