//! Configuration for the products service

use core_config::{env_parse, FromEnv};
use database::postgres::PostgresConfig;
use messaging::NatsConfig;

pub use core_config::Environment;

/// Application configuration
#[derive(Clone, Debug)]
pub struct Config {
    pub environment: Environment,
    pub postgres: PostgresConfig,
    pub nats: NatsConfig,
    /// Apply pending migrations before serving (`RUN_MIGRATIONS`, default true)
    pub run_migrations: bool,
}

impl Config {
    pub fn from_env() -> eyre::Result<Self> {
        Ok(Self {
            environment: Environment::from_env(),
            postgres: PostgresConfig::from_env()?,
            nats: NatsConfig::from_env()?,
            run_migrations: env_parse("RUN_MIGRATIONS", "true")?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_from_env_defaults() {
        temp_env::with_vars(
            [
                ("DATABASE_URL", Some("postgres://localhost/products")),
                ("APP_ENV", None),
                ("NATS_URL", None),
                ("RUN_MIGRATIONS", None),
            ],
            || {
                let config = Config::from_env().unwrap();
                assert_eq!(config.environment, Environment::Development);
                assert_eq!(config.postgres.url(), "postgres://localhost/products");
                assert_eq!(config.nats.url, "nats://localhost:4222");
                assert!(config.run_migrations);
            },
        );
    }

    #[test]
    fn test_config_from_env_overrides() {
        temp_env::with_vars(
            [
                ("DATABASE_URL", Some("postgres://db/products")),
                ("APP_ENV", Some("production")),
                ("NATS_URL", Some("nats://nats:4222")),
                ("NATS_QUEUE_GROUP", Some("products-blue")),
                ("RUN_MIGRATIONS", Some("false")),
            ],
            || {
                let config = Config::from_env().unwrap();
                assert!(config.environment.is_production());
                assert_eq!(config.nats.url, "nats://nats:4222");
                assert_eq!(config.nats.queue_group, "products-blue");
                assert!(!config.run_migrations);
            },
        );
    }

    #[test]
    fn test_config_requires_database_url() {
        temp_env::with_var_unset("DATABASE_URL", || {
            let err = Config::from_env().unwrap_err();
            assert!(err.to_string().contains("DATABASE_URL"));
        });
    }

    #[test]
    fn test_config_rejects_bad_migration_flag() {
        temp_env::with_vars(
            [
                ("DATABASE_URL", Some("postgres://localhost/products")),
                ("RUN_MIGRATIONS", Some("sometimes")),
            ],
            || {
                let err = Config::from_env().unwrap_err();
                assert!(err.to_string().contains("RUN_MIGRATIONS"));
            },
        );
    }
}
