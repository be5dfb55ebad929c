use serde::Deserialize;
use std::env;

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub redis: RedisConfig,
    pub auth: AuthConfig,
    pub smtp: SmtpConfig,
    #[serde(default)]
    pub business_rules: BusinessRules,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub port: u16,
}

#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum StoreMode {
    #[default]
    Postgres,
    Memory,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DatabaseConfig {
    #[serde(default)]
    pub mode: StoreMode,
    pub url: String,
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
}

fn default_max_connections() -> u32 { 5 }

#[derive(Debug, Deserialize, Clone)]
pub struct RedisConfig {
    /// Rate limiting is disabled when unset.
    pub url: Option<String>,
    #[serde(default = "default_requests_per_minute")]
    pub requests_per_minute: i64,
}

fn default_requests_per_minute() -> i64 { 120 }

#[derive(Debug, Deserialize, Clone)]
pub struct AuthConfig {
    pub jwt_secret: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct SmtpConfig {
    pub host: String,
    pub port: u16,
    pub username: Option<String>,
    pub password: Option<String>,
    pub from_email: String,
    pub from_name: String,
}

impl SmtpConfig {
    /// Both credentials present; otherwise mail is only logged.
    pub fn credentials(&self) -> Option<(String, String)> {
        match (&self.username, &self.password) {
            (Some(u), Some(p)) if !u.is_empty() && !p.is_empty() => Some((u.clone(), p.clone())),
            _ => None,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct BusinessRules {
    #[serde(default = "default_side_effect_timeout")]
    pub side_effect_timeout_seconds: u64,
    #[serde(default = "default_search_radius")]
    pub default_search_radius_km: f64,
    #[serde(default = "default_currency")]
    pub currency: String,
    #[serde(default = "default_max_bulk_slots")]
    pub max_bulk_slots: u32,
    /// Shortest duration ever billed.
    #[serde(default = "default_min_billable_hours")]
    pub min_billable_hours: f64,
}

fn default_side_effect_timeout() -> u64 { 30 }
fn default_search_radius() -> f64 { 10.0 }
fn default_currency() -> String { "INR".to_string() }
fn default_max_bulk_slots() -> u32 { 100 }
fn default_min_billable_hours() -> f64 { 1.0 }

impl Default for BusinessRules {
    fn default() -> Self {
        Self {
            side_effect_timeout_seconds: default_side_effect_timeout(),
            default_search_radius_km: default_search_radius(),
            currency: default_currency(),
            max_bulk_slots: default_max_bulk_slots(),
            min_billable_hours: default_min_billable_hours(),
        }
    }
}

impl Config {
    pub fn load() -> Result<Self, config::ConfigError> {
        let run_mode = env::var("RUN_MODE").unwrap_or_else(|_| "development".into());

        let s = config::Config::builder()
            .add_source(config::File::with_name("config/default"))
            // Optional per-environment overrides
            .add_source(config::File::with_name(&format!("config/{}", run_mode)).required(false))
            // Not checked in
            .add_source(config::File::with_name("config/local").required(false))
            // Eg. `PARKEASY__SERVER__PORT=9000`
            .add_source(config::Environment::with_prefix("PARKEASY").separator("__"))
            .build()?;

        s.try_deserialize()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(toml: &str) -> Config {
        config::Config::builder()
            .add_source(config::File::from_str(toml, config::FileFormat::Toml))
            .build()
            .unwrap()
            .try_deserialize()
            .unwrap()
    }

    const MINIMAL: &str = r#"
        [server]
        port = 8080
        [database]
        url = "postgres://localhost/parkeasy"
        [redis]
        [auth]
        jwt_secret = "secret"
        [smtp]
        host = "smtp.example.com"
        port = 587
        from_email = "noreply@parkeasy.test"
        from_name = "ParkEasy"
    "#;

    #[test]
    fn test_defaults_apply() {
        let config = parse(MINIMAL);
        assert_eq!(config.database.mode, StoreMode::Postgres);
        assert_eq!(config.database.max_connections, 5);
        assert!(config.redis.url.is_none());
        assert_eq!(config.business_rules.side_effect_timeout_seconds, 30);
        assert_eq!(config.business_rules.currency, "INR");
        assert_eq!(config.business_rules.min_billable_hours, 1.0);
        assert!(config.smtp.credentials().is_none());
    }

    #[test]
    fn test_memory_mode_and_overrides() {
        let toml = MINIMAL.replace(
            "[database]",
            "[business_rules]\nmax_bulk_slots = 20\nmin_billable_hours = 0.5\n[database]\nmode = \"memory\"",
        );
        let config = parse(&toml);
        assert_eq!(config.database.mode, StoreMode::Memory);
        assert_eq!(config.business_rules.max_bulk_slots, 20);
        assert_eq!(config.business_rules.min_billable_hours, 0.5);
        assert_eq!(config.business_rules.default_search_radius_km, 10.0);
    }
}
