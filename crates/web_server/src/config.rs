//! Server settings read from the environment.

use postgres::database::DEFAULT_DATABASE_URL;

/// Settings for the HTTP server and its database pool
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    /// Interface to bind
    pub host: String,
    /// Port to bind
    pub port: u16,
    /// Postgres connection string
    pub database_url: String,
    /// Upper bound on pooled connections
    pub max_connections: u32,
    /// Whether the server runs in production (`APP_ENV=production`)
    pub production: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
            database_url: DEFAULT_DATABASE_URL.to_string(),
            max_connections: 10,
            production: false,
        }
    }
}

impl ServerConfig {
    /// Reads `HOST`, `PORT`, `DATABASE_URL`, `DATABASE_MAX_CONNECTIONS` and `APP_ENV`
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let port = match lookup("PORT") {
            Some(raw) => raw.parse().unwrap_or_else(|_| {
                log::warn!("Ignoring invalid PORT '{}'", raw);
                defaults.port
            }),
            None => defaults.port,
        };

        let database_url = lookup("DATABASE_URL").unwrap_or_else(|| {
            log::warn!("DATABASE_URL is not set, using {}", DEFAULT_DATABASE_URL);
            defaults.database_url.clone()
        });

        Self {
            host: lookup("HOST").unwrap_or(defaults.host),
            port,
            database_url,
            max_connections: lookup("DATABASE_MAX_CONNECTIONS")
                .and_then(|raw| raw.parse().ok())
                .filter(|n| *n > 0)
                .unwrap_or(defaults.max_connections),
            production: lookup("APP_ENV").is_some_and(|env| env.eq_ignore_ascii_case("production")),
        }
    }

    /// Address to bind, as `host:port`
    pub fn bind_address(&self) -> (String, u16) {
        (self.host.clone(), self.port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config_from(vars: &[(&str, &str)]) -> ServerConfig {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        ServerConfig::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_defaults() {
        assert_eq!(config_from(&[]), ServerConfig::default());
        assert_eq!(
            ServerConfig::default().bind_address(),
            ("0.0.0.0".to_string(), 8080)
        );
    }

    #[test]
    fn test_reads_variables() {
        let config = config_from(&[
            ("HOST", "127.0.0.1"),
            ("PORT", "5000"),
            ("DATABASE_URL", "postgres://db/campgrounds"),
            ("DATABASE_MAX_CONNECTIONS", "4"),
            ("APP_ENV", "production"),
        ]);

        assert_eq!(
            config,
            ServerConfig {
                host: "127.0.0.1".to_string(),
                port: 5000,
                database_url: "postgres://db/campgrounds".to_string(),
                max_connections: 4,
                production: true,
            }
        );
    }

    #[test]
    fn test_invalid_values_fall_back() {
        let config = config_from(&[
            ("PORT", "eighty"),
            ("DATABASE_MAX_CONNECTIONS", "0"),
            ("APP_ENV", "development"),
        ]);

        assert_eq!(config.port, 8080);
        assert_eq!(config.max_connections, 10);
        assert!(!config.production);
    }
}
