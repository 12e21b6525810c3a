use std::net::{AddrParseError, IpAddr, SocketAddr};
use std::str::FromStr;

use crate::auth::jwt::JwtConfig;

/// Process configuration for the catalog API, read once at startup.
///
/// | Env Var                 | Default                  |
/// |-------------------------|--------------------------|
/// | `DATABASE_URL`          | required                 |
/// | `DB_MAX_CONNECTIONS`    | `20`                     |
/// | `HOST`                  | `0.0.0.0`                |
/// | `PORT`                  | `3000`                   |
/// | `CORS_ORIGINS`          | `http://localhost:5173`  |
/// | `REQUEST_TIMEOUT_SECS`  | `30`                     |
/// | `SHUTDOWN_TIMEOUT_SECS` | `30`                     |
///
/// Token settings come from [`JwtConfig::from_env`].
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub database_url: String,
    pub db_max_connections: u32,
    pub host: String,
    pub port: u16,
    /// Storefront frontends allowed to call the API from a browser.
    pub cors_origins: Vec<String>,
    pub request_timeout_secs: u64,
    /// Upper bound on draining in-flight requests after SIGINT/SIGTERM.
    pub shutdown_timeout_secs: u64,
    pub jwt: JwtConfig,
}

impl ServerConfig {
    /// # Panics
    ///
    /// Panics when `DATABASE_URL` or `JWT_SECRET` is missing, or a numeric
    /// variable does not parse.
    pub fn from_env() -> Self {
        Self {
            database_url: std::env::var("DATABASE_URL").expect("DATABASE_URL must be set"),
            db_max_connections: env_or(
                "DB_MAX_CONNECTIONS",
                storefront_db::DEFAULT_MAX_CONNECTIONS,
            ),
            host: std::env::var("HOST").unwrap_or_else(|_| "0.0.0.0".into()),
            port: env_or("PORT", 3000),
            cors_origins: parse_origins(
                &std::env::var("CORS_ORIGINS").unwrap_or_else(|_| "http://localhost:5173".into()),
            ),
            request_timeout_secs: env_or("REQUEST_TIMEOUT_SECS", 30),
            shutdown_timeout_secs: env_or("SHUTDOWN_TIMEOUT_SECS", 30),
            jwt: JwtConfig::from_env(),
        }
    }

    /// Socket address the listener binds to.
    pub fn bind_addr(&self) -> Result<SocketAddr, AddrParseError> {
        let ip: IpAddr = self.host.parse()?;
        Ok(SocketAddr::new(ip, self.port))
    }
}

fn env_or<T>(name: &str, default: T) -> T
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match std::env::var(name) {
        Ok(raw) => raw
            .trim()
            .parse()
            .unwrap_or_else(|e| panic!("{name} is not valid ({raw:?}): {e}")),
        Err(_) => default,
    }
}

/// Split a comma-separated origin list, dropping blanks.
fn parse_origins(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(host: &str) -> ServerConfig {
        ServerConfig {
            database_url: "postgres://localhost/storefront".into(),
            db_max_connections: 5,
            host: host.into(),
            port: 8080,
            cors_origins: vec![],
            request_timeout_secs: 30,
            shutdown_timeout_secs: 30,
            jwt: JwtConfig {
                secret: "secret".into(),
                access_token_expiry_mins: 15,
                refresh_token_expiry_days: 7,
            },
        }
    }

    #[test]
    fn origins_are_trimmed_and_blanks_dropped() {
        assert_eq!(
            parse_origins(" http://a.test , ,http://b.test,"),
            vec!["http://a.test".to_string(), "http://b.test".to_string()]
        );
    }

    #[test]
    fn bind_addr_combines_host_and_port() {
        assert_eq!(
            config("127.0.0.1").bind_addr().unwrap(),
            "127.0.0.1:8080".parse::<SocketAddr>().unwrap()
        );
        assert!(config("localhost").bind_addr().is_err());
    }
}
