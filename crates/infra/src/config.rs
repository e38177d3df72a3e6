//! Process configuration, read from environment variables.

use std::net::SocketAddr;

use thiserror::Error;

use cowork_reservations::DEFAULT_HORIZON_DAYS;

pub const DEFAULT_BIND_ADDR: &str = "0.0.0.0:8080";
pub const DEFAULT_JWT_SECRET: &str = "dev-secret";
pub const DEFAULT_JWT_TTL_MINUTES: i64 = 60;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{var} has an invalid value '{value}': {reason}")]
    Invalid {
        var: &'static str,
        value: String,
        reason: String,
    },
}

#[derive(Clone, PartialEq, Eq)]
pub struct AppConfig {
    pub bind_addr: SocketAddr,
    pub jwt_secret: String,
    pub jwt_ttl: chrono::Duration,
    /// `None` runs against the in-memory store.
    pub database_url: Option<String>,
    pub reservation_horizon_days: u32,
}

impl core::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("AppConfig")
            .field("bind_addr", &self.bind_addr)
            .field("jwt_secret", &"***")
            .field("jwt_ttl", &self.jwt_ttl)
            .field("database_url", &self.database_url.as_ref().map(|_| "***"))
            .field("reservation_horizon_days", &self.reservation_horizon_days)
            .finish()
    }
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    /// Build from an arbitrary variable source. Empty values count as unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let get = |var: &str| lookup(var).filter(|v| !v.trim().is_empty());

        let bind_addr = parse_or("COWORK_BIND_ADDR", get("COWORK_BIND_ADDR"), DEFAULT_BIND_ADDR)?;

        let jwt_secret = get("JWT_SECRET").unwrap_or_else(|| {
            tracing::warn!("JWT_SECRET not set; using insecure dev default");
            DEFAULT_JWT_SECRET.to_string()
        });

        let ttl_minutes: i64 = parse_or(
            "JWT_TTL_MINUTES",
            get("JWT_TTL_MINUTES"),
            &DEFAULT_JWT_TTL_MINUTES.to_string(),
        )?;
        if ttl_minutes <= 0 {
            return Err(ConfigError::Invalid {
                var: "JWT_TTL_MINUTES",
                value: ttl_minutes.to_string(),
                reason: "must be positive".to_string(),
            });
        }

        let reservation_horizon_days = parse_or(
            "RESERVATION_HORIZON_DAYS",
            get("RESERVATION_HORIZON_DAYS"),
            &DEFAULT_HORIZON_DAYS.to_string(),
        )?;

        Ok(Self {
            bind_addr,
            jwt_secret,
            jwt_ttl: chrono::Duration::minutes(ttl_minutes),
            database_url: get("DATABASE_URL"),
            reservation_horizon_days,
        })
    }
}

fn parse_or<T>(var: &'static str, raw: Option<String>, default: &str) -> Result<T, ConfigError>
where
    T: core::str::FromStr,
    T::Err: core::fmt::Display,
{
    let value = raw.unwrap_or_else(|| default.to_string());
    let parsed = value.trim().parse::<T>();
    parsed.map_err(|e| ConfigError::Invalid {
        var,
        reason: e.to_string(),
        value,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config(vars: &[(&str, &str)]) -> Result<AppConfig, ConfigError> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        AppConfig::from_lookup(|k| map.get(k).cloned())
    }

    #[test]
    fn defaults_apply_when_unset() {
        let cfg = config(&[]).unwrap();
        assert_eq!(cfg.bind_addr, DEFAULT_BIND_ADDR.parse::<SocketAddr>().unwrap());
        assert_eq!(cfg.jwt_secret, DEFAULT_JWT_SECRET);
        assert_eq!(cfg.jwt_ttl, chrono::Duration::minutes(60));
        assert_eq!(cfg.database_url, None);
        assert_eq!(cfg.reservation_horizon_days, DEFAULT_HORIZON_DAYS);
    }

    #[test]
    fn values_are_read() {
        let cfg = config(&[
            ("COWORK_BIND_ADDR", "127.0.0.1:9000"),
            ("JWT_SECRET", "s3cret"),
            ("JWT_TTL_MINUTES", "15"),
            ("DATABASE_URL", "postgres://localhost/cowork"),
            ("RESERVATION_HORIZON_DAYS", "30"),
        ])
        .unwrap();
        assert_eq!(cfg.bind_addr.port(), 9000);
        assert_eq!(cfg.jwt_secret, "s3cret");
        assert_eq!(cfg.jwt_ttl, chrono::Duration::minutes(15));
        assert_eq!(cfg.database_url.as_deref(), Some("postgres://localhost/cowork"));
        assert_eq!(cfg.reservation_horizon_days, 30);
    }

    #[test]
    fn blank_database_url_means_in_memory() {
        assert_eq!(config(&[("DATABASE_URL", "  ")]).unwrap().database_url, None);
    }

    #[test]
    fn malformed_values_name_the_variable() {
        let err = config(&[("RESERVATION_HORIZON_DAYS", "soon")]).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { var: "RESERVATION_HORIZON_DAYS", .. }));

        let err = config(&[("JWT_TTL_MINUTES", "0")]).unwrap_err();
        assert!(err.to_string().starts_with("JWT_TTL_MINUTES"));

        assert!(config(&[("COWORK_BIND_ADDR", "localhost")]).is_err());
    }

    #[test]
    fn debug_hides_secrets() {
        let cfg = config(&[("JWT_SECRET", "s3cret")]).unwrap();
        assert!(!format!("{cfg:?}").contains("s3cret"));
    }
}
