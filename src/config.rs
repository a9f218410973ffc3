use std::{env, fmt::Display, net::SocketAddr, str::FromStr};

use anyhow::{anyhow, Context, Result};
use tracing::info;

#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub database_url: String,
    pub jwt_secret: String,
    /// Usernames that are flagged as staff when they sign up.
    pub staff_usernames: Vec<String>,
}

impl Config {
    pub fn load() -> Result<Self> {
        Ok(Self {
            host: try_load("HOST", "127.0.0.1")?,
            port: try_load("PORT", "3001")?,
            database_url: try_load("DATABASE_URL", "sqlite://board.db")?,
            jwt_secret: env::var("JWT_SECRET").context("JWT_SECRET must be set")?,
            staff_usernames: parse_list(&env::var("STAFF_USERNAMES").unwrap_or_default()),
        })
    }

    pub fn address(&self) -> Result<SocketAddr> {
        format!("{}:{}", self.host, self.port)
            .parse()
            .with_context(|| format!("Invalid listen address {}:{}", self.host, self.port))
    }

    pub fn is_staff_username(&self, username: &str) -> bool {
        self.staff_usernames.iter().any(|name| name == username)
    }
}

fn try_load<T: FromStr>(key: &str, default: &str) -> Result<T>
where
    T::Err: Display,
{
    env::var(key)
        .unwrap_or_else(|_| {
            info!("{key} not set, using default: {default}");
            default.to_string()
        })
        .parse()
        .map_err(|e| anyhow!("Invalid {key} value: {e}"))
}

fn parse_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .map(str::to_owned)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn staff_list_ignores_blanks() {
        assert_eq!(parse_list(" park, ,lee,"), vec!["park", "lee"]);
        assert!(parse_list("").is_empty());
    }

    #[test]
    fn address_is_parsed_from_host_and_port() {
        let config = Config {
            host: "127.0.0.1".to_owned(),
            port: 8080,
            database_url: "sqlite::memory:".to_owned(),
            jwt_secret: "secret".to_owned(),
            staff_usernames: vec!["park".to_owned()],
        };
        assert_eq!(config.address().unwrap().port(), 8080);
        assert!(config.is_staff_username("park"));
        assert!(!config.is_staff_username("Park"));
    }
}
