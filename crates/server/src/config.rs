use std::{net::SocketAddr, str::FromStr};

use anyhow::{anyhow, Context, Result};
use api::AuthConfig;
use chrono::NaiveTime;
use products_hr::WorkPolicy;
use rust_decimal::Decimal;

pub const DEFAULT_BIND: &str = "127.0.0.1:8080";

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub bind: SocketAddr,
    pub cors_allowed_origins: Vec<String>,
    pub auth: AuthConfig,
    pub policy: WorkPolicy,
}

impl AppConfig {
    pub fn load() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let bind = lookup("BIND").unwrap_or_else(|| DEFAULT_BIND.into());
        let bind = bind
            .trim()
            .parse()
            .with_context(|| format!("invalid BIND address `{}`", bind))?;

        let cors_allowed_origins = lookup("CORS_ALLOWED_ORIGINS")
            .unwrap_or_default()
            .split(',')
            .map(str::trim)
            .filter(|origin| !origin.is_empty())
            .map(str::to_string)
            .collect();

        let defaults = AuthConfig::default();
        let auth = AuthConfig {
            jwt_secret: lookup("AUTH_SECRET")
                .filter(|s| !s.is_empty())
                .unwrap_or(defaults.jwt_secret),
            local_auth_enabled: lookup("LOCAL_AUTH_ENABLED")
                .map(|v| env_bool(&v))
                .unwrap_or(defaults.local_auth_enabled),
            session_ttl_minutes: parse_or(&lookup, "SESSION_TTL_MINUTES", defaults.session_ttl_minutes)?,
        };

        let policy = WorkPolicy::new(
            parse_or(&lookup, "WORKDAY_UTC_OFFSET_HOURS", 9)?,
            parse_time(&lookup, "WORKDAY_START", "09:00")?,
            parse_time(&lookup, "WORKDAY_END", "18:00")?,
            parse_or(&lookup, "STANDARD_DAILY_HOURS", Decimal::from(8))?,
        )
        .map_err(|err| anyhow!("invalid work policy: {}", err))?;

        Ok(Self {
            bind,
            cors_allowed_origins,
            auth,
            policy,
        })
    }
}

fn env_bool(value: &str) -> bool {
    matches!(value.trim().to_lowercase().as_str(), "1" | "true" | "yes")
}

fn parse_or<T>(lookup: &impl Fn(&str) -> Option<String>, key: &str, default: T) -> Result<T>
where
    T: FromStr,
{
    match lookup(key) {
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|_| anyhow!("invalid value `{}` for {}", raw, key)),
        None => Ok(default),
    }
}

fn parse_time(lookup: &impl Fn(&str) -> Option<String>, key: &str, default: &str) -> Result<NaiveTime> {
    let raw = lookup(key).unwrap_or_else(|| default.to_string());
    NaiveTime::parse_from_str(raw.trim(), "%H:%M")
        .with_context(|| format!("invalid value `{}` for {} (expected HH:MM)", raw, key))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults_cover_a_seoul_office() {
        let config = AppConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config.bind.to_string(), DEFAULT_BIND);
        assert!(config.cors_allowed_origins.is_empty());
        assert_eq!(config.auth.session_ttl_minutes, 60);
        assert_eq!(config.policy, WorkPolicy::default());
    }

    #[test]
    fn overrides_are_read() {
        let config = AppConfig::from_lookup(lookup(&[
            ("BIND", "0.0.0.0:9000"),
            ("CORS_ALLOWED_ORIGINS", "http://a.test, ,http://b.test"),
            ("AUTH_SECRET", "s3cret"),
            ("LOCAL_AUTH_ENABLED", "no"),
            ("SESSION_TTL_MINUTES", "15"),
            ("WORKDAY_START", "08:30"),
            ("STANDARD_DAILY_HOURS", "7.5"),
        ]))
        .unwrap();
        assert_eq!(config.bind.port(), 9000);
        assert_eq!(config.cors_allowed_origins, vec!["http://a.test", "http://b.test"]);
        assert_eq!(config.auth.jwt_secret, "s3cret");
        assert!(!config.auth.local_auth_enabled);
        assert_eq!(config.auth.session_ttl_minutes, 15);
        assert_eq!(config.policy.day_start, NaiveTime::from_hms_opt(8, 30, 0).unwrap());
        assert_eq!(config.policy.standard_hours, Decimal::new(75, 1));
    }

    #[test]
    fn inverted_workdays_are_rejected() {
        let err = AppConfig::from_lookup(lookup(&[("WORKDAY_START", "19:00")])).unwrap_err();
        assert!(err.to_string().contains("work policy"), "{err}");
        assert!(AppConfig::from_lookup(lookup(&[("SESSION_TTL_MINUTES", "soon")])).is_err());
    }
}
