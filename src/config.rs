use std::env;
use std::path::PathBuf;
use std::str::FromStr;

use anyhow::{anyhow, Context};
use dotenvy::dotenv;

#[derive(Clone, Debug)]
pub struct Config {
    pub database_url: String,
    pub jwt_secret: String,
    pub jwt_audience: String,
    pub stripe_secret_key: String,
    pub stripe_api_base: String,
    pub stripe_api_version: String,
    pub host: String,
    pub port: u16,
    pub database_max_connections: u32,
    pub request_timeout_secs: u64,
    pub gateway_timeout_secs: u64,
    pub log_level: String,
    /// Daily rolling log files go here when set; stdout otherwise.
    pub log_dir: Option<PathBuf>,
}

impl Config {
    /// Loads `.env` (if any) and reads the process environment.
    pub fn from_env() -> anyhow::Result<Self> {
        dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        let required = |key: &str| {
            lookup(key)
                .filter(|value| !value.trim().is_empty())
                .ok_or_else(|| anyhow!("{key} must be set"))
        };
        let or_default = |key: &str, default: &str| lookup(key).unwrap_or_else(|| default.to_string());

        Ok(Self {
            database_url: required("DATABASE_URL")?,
            jwt_secret: required("AUTH_JWT_SECRET")?,
            jwt_audience: or_default("AUTH_JWT_AUDIENCE", "authenticated"),
            stripe_secret_key: required("STRIPE_SECRET_KEY")?,
            stripe_api_base: or_default("STRIPE_API_BASE", "https://api.stripe.com"),
            stripe_api_version: or_default("STRIPE_API_VERSION", "2020-08-27"),
            host: or_default("HOST", "0.0.0.0"),
            port: parsed(&lookup, "PORT", 5000)?,
            database_max_connections: parsed(&lookup, "DATABASE_MAX_CONNECTIONS", 10)?,
            request_timeout_secs: parsed(&lookup, "REQUEST_TIMEOUT_SECS", 30)?,
            gateway_timeout_secs: parsed(&lookup, "GATEWAY_TIMEOUT_SECS", 15)?,
            log_level: or_default("LOG_LEVEL", "info"),
            log_dir: lookup("LOG_DIR").filter(|dir| !dir.is_empty()).map(PathBuf::from),
        })
    }

    pub fn listen_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

fn parsed<T>(lookup: &impl Fn(&str) -> Option<String>, key: &str, default: T) -> anyhow::Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match lookup(key) {
        Some(raw) => raw.trim().parse().with_context(|| format!("{key} has an invalid value `{raw}`")),
        None => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> =
            pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
        move |key| vars.get(key).cloned()
    }

    const REQUIRED: [(&str, &str); 3] = [
        ("DATABASE_URL", "postgres://localhost/procurement"),
        ("AUTH_JWT_SECRET", "secret"),
        ("STRIPE_SECRET_KEY", "sk_test_1"),
    ];

    #[test]
    fn defaults_apply() {
        let config = Config::from_lookup(lookup(&REQUIRED)).unwrap();
        assert_eq!(config.port, 5000);
        assert_eq!(config.jwt_audience, "authenticated");
        assert_eq!(config.stripe_api_version, "2020-08-27");
        assert_eq!(config.request_timeout_secs, 30);
        assert_eq!(config.listen_addr(), "0.0.0.0:5000");
        assert!(config.log_dir.is_none());
    }

    #[test]
    fn missing_secret_names_the_variable() {
        let err = Config::from_lookup(lookup(&REQUIRED[..2])).unwrap_err();
        assert!(err.to_string().contains("STRIPE_SECRET_KEY"));
    }

    #[test]
    fn bad_number_names_the_variable() {
        let mut vars = REQUIRED.to_vec();
        vars.push(("PORT", "http"));
        let err = Config::from_lookup(lookup(&vars)).unwrap_err();
        assert!(err.to_string().contains("PORT"));
    }
}
