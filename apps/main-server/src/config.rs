//! Server configuration.

use std::env;

use auth::AdminAllowList;

/// Salt used when `CARDEALS_GUEST_IP_SALT` is not set.
const DEFAULT_GUEST_IP_SALT: &str = "cardeals-guest-ip";

/// Deployment environment.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Environment {
    #[default]
    Development,
    Production,
}

impl Environment {
    fn parse(value: &str) -> Self {
        if value.eq_ignore_ascii_case("production") {
            Self::Production
        } else {
            Self::Development
        }
    }
}

/// Server configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    /// Server host address.
    pub host: String,
    /// Server port.
    pub port: u16,
    /// PostgreSQL URL. The in-memory store is used when absent.
    pub database_url: Option<String>,
    /// Maximum pooled database connections.
    pub db_max_connections: u32,
    /// Session token secret. Every request is anonymous when absent.
    pub session_secret: Option<String>,
    /// Session token lifetime in hours.
    pub session_expiration_hours: u64,
    /// Google OAuth client ID.
    pub google_client_id: Option<String>,
    /// Google OAuth client secret.
    pub google_client_secret: Option<String>,
    /// Emails allowed to use admin endpoints.
    pub admin_emails: AdminAllowList,
    /// Token guarding the seed endpoints in production.
    pub seed_token: Option<String>,
    /// Salt for guest address hashing.
    pub guest_ip_salt: String,
    /// Deployment environment.
    pub environment: Environment,
    /// Log level.
    pub log_level: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3000,
            database_url: None,
            db_max_connections: 5,
            session_secret: None,
            session_expiration_hours: auth::DEFAULT_JWT_EXPIRATION_HOURS,
            google_client_id: None,
            google_client_secret: None,
            admin_emails: AdminAllowList::default(),
            seed_token: None,
            guest_ip_salt: DEFAULT_GUEST_IP_SALT.to_string(),
            environment: Environment::Development,
            log_level: "info".to_string(),
        }
    }
}

impl Config {
    /// Loads configuration from environment variables.
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Loads configuration from an arbitrary variable source.
    pub fn from_lookup(get: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        let defaults = Self::default();
        let non_empty = |key: &str| get(key).filter(|value| !value.trim().is_empty());

        let port = match non_empty("CARDEALS_SERVER_PORT") {
            Some(value) => value
                .parse()
                .map_err(|_| anyhow::anyhow!("CARDEALS_SERVER_PORT is not a valid port: {value}"))?,
            None => defaults.port,
        };

        Ok(Self {
            host: non_empty("CARDEALS_SERVER_HOST").unwrap_or(defaults.host),
            port,
            database_url: non_empty("DATABASE_URL"),
            db_max_connections: non_empty("CARDEALS_DB_MAX_CONNECTIONS")
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.db_max_connections),
            session_secret: non_empty("CARDEALS_SESSION_SECRET"),
            session_expiration_hours: non_empty("CARDEALS_SESSION_EXPIRATION_HOURS")
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.session_expiration_hours),
            google_client_id: non_empty("GOOGLE_CLIENT_ID"),
            google_client_secret: non_empty("GOOGLE_CLIENT_SECRET"),
            admin_emails: non_empty("CARDEALS_ADMIN_EMAILS")
                .map(|v| AdminAllowList::parse(&v))
                .unwrap_or_default(),
            seed_token: non_empty("CARDEALS_SEED_TOKEN"),
            guest_ip_salt: non_empty("CARDEALS_GUEST_IP_SALT").unwrap_or(defaults.guest_ip_salt),
            environment: non_empty("CARDEALS_ENV")
                .map(|v| Environment::parse(&v))
                .unwrap_or_default(),
            log_level: non_empty("CARDEALS_LOG_LEVEL").unwrap_or(defaults.log_level),
        })
    }

    /// Returns the server address.
    pub fn server_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Returns true if session tokens are accepted.
    pub fn auth_enabled(&self) -> bool {
        self.session_secret.is_some()
    }

    /// Returns true if Google sign-in is configured.
    pub fn google_configured(&self) -> bool {
        self.google_client_id.is_some() && self.google_client_secret.is_some()
    }

    pub fn is_production(&self) -> bool {
        self.environment == Environment::Production
    }

    /// Returns true when the built-in guest salt is in use.
    pub fn uses_default_guest_salt(&self) -> bool {
        self.guest_ip_salt == DEFAULT_GUEST_IP_SALT
    }
}
