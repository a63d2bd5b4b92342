use rocket::figment::{
    Figment,
    providers::{Env, Format, Toml},
};
use serde::{Deserialize, Serialize};

pub const DEFAULT_API_BASE_PATH: &str = "/api/v1";

/// Name of the private session cookie. Pinned, not configurable: the
/// out-of-process page router matches on this exact name.
pub const SESSION_COOKIE: &str = "app_session";

#[derive(Debug, Deserialize, Serialize, Clone, Default)]
pub struct Config {
    pub database: DatabaseConfig,
    pub server: ServerConfig,
    pub api: ApiConfig,
    pub cors: CorsConfig,
    pub logging: LoggingConfig,
    pub rate_limit: RateLimitConfig,
    pub session: SessionConfig,
    pub fraud: FraudConfig,
    pub password_reset: PasswordResetConfig,
    pub email: EmailConfig,
    pub cron: CronConfig,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
    pub min_connections: u32,
    pub connection_timeout: u64,
    pub acquire_timeout: u64,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ServerConfig {
    pub port: u16,
    pub address: String,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ApiConfig {
    pub base_path: String,
    pub additional_base_paths: Vec<String>,
    pub enable_swagger: bool,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct CorsConfig {
    pub allowed_origins: Vec<String>,
    pub allow_credentials: bool,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct LoggingConfig {
    pub level: String,
    pub json_format: bool,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct RateLimitConfig {
    pub read_limit: u32,
    pub mutation_limit: u32,
    pub auth_limit: u32,
    pub window_seconds: u64,
    pub cleanup_interval_seconds: u64,
    pub require_client_ip: bool,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct SessionConfig {
    /// Session lifetime in days. Cookie expiry matches the row's expiry.
    pub ttl_days: i64,
    /// Set the `Secure` attribute on the session cookie. Disable for
    /// plain-HTTP local development only.
    pub cookie_secure: bool,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct FraudConfig {
    /// Risk scores at or above this value deny the attempt.
    pub deny_threshold: u8,
    /// Window for the free-plan signup velocity signal.
    pub velocity_window_hours: i64,
    /// Also run the risk scorer on registration when a fingerprint is
    /// supplied. The shipped default matches the source behavior: only
    /// login is gated.
    pub gate_registration: bool,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct PasswordResetConfig {
    pub token_ttl_seconds: i64,
    pub max_attempts_per_hour: u32,
    pub frontend_reset_url: String,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct EmailConfig {
    pub enabled: bool,
    pub smtp_host: String,
    pub smtp_port: u16,
    pub smtp_username: String,
    pub smtp_password: String,
    pub from_address: String,
    pub from_name: String,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct CronConfig {
    /// Shared secret for the cron endpoints, sent as `x-cron-token`.
    /// Empty disables the endpoints.
    pub auth_token: String,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: "postgres://localhost/sketchport_db".to_string(),
            max_connections: 16,
            min_connections: 4,
            connection_timeout: 5,
            acquire_timeout: 5,
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: 8000,
            address: "127.0.0.1".to_string(),
        }
    }
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_path: DEFAULT_API_BASE_PATH.to_string(),
            additional_base_paths: Vec::new(),
            enable_swagger: false,
        }
    }
}

impl Default for CorsConfig {
    fn default() -> Self {
        Self {
            allowed_origins: vec!["http://localhost:3000".to_string()],
            allow_credentials: true,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json_format: false,
        }
    }
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            read_limit: 300,
            mutation_limit: 60,
            auth_limit: 10,
            window_seconds: 60,
            cleanup_interval_seconds: 300,
            require_client_ip: false,
        }
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            ttl_days: 30,
            cookie_secure: true,
        }
    }
}

impl Default for FraudConfig {
    fn default() -> Self {
        Self {
            deny_threshold: 70,
            velocity_window_hours: 24,
            gate_registration: false,
        }
    }
}

impl Default for PasswordResetConfig {
    fn default() -> Self {
        Self {
            token_ttl_seconds: 3600,
            max_attempts_per_hour: 3,
            frontend_reset_url: "http://localhost:3000/auth/reset-password".to_string(),
        }
    }
}

impl Default for EmailConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            smtp_host: "localhost".to_string(),
            smtp_port: 587,
            smtp_username: String::new(),
            smtp_password: String::new(),
            from_address: "no-reply@sketchport.app".to_string(),
            from_name: "Sketchport".to_string(),
        }
    }
}

impl Default for CronConfig {
    fn default() -> Self {
        Self { auth_token: String::new() }
    }
}

impl Config {
    /// Load configuration from multiple sources in priority order:
    /// 1. Sketchport.toml (base configuration file)
    /// 2. Environment variables (prefixed with SKETCHPORT_)
    /// 3. DATABASE_URL environment variable (for backwards compatibility)
    pub fn load() -> Result<Self, figment::Error> {
        let figment = Figment::new()
            // Start with defaults
            .merge(Toml::string(&toml::to_string(&Config::default()).unwrap()).nested())
            // Layer on Sketchport.toml if it exists
            .merge(Toml::file("Sketchport.toml").nested())
            // Layer on environment variables (e.g., SKETCHPORT_DATABASE_URL)
            .merge(Env::prefixed("SKETCHPORT_").split("_"))
            // Special case: DATABASE_URL for backwards compatibility
            .merge(Env::raw().only(&["DATABASE_URL"]).map(|_| "database.url".into()));

        figment.extract()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_documented_policy() {
        let config = Config::default();
        assert_eq!(config.session.ttl_days, 30);
        assert!(config.session.cookie_secure);
        assert_eq!(config.fraud.deny_threshold, 70);
        assert_eq!(config.fraud.velocity_window_hours, 24);
        assert!(!config.fraud.gate_registration);
        assert_eq!(config.api.base_path, DEFAULT_API_BASE_PATH);
    }

    #[test]
    fn defaults_serialize_to_toml() {
        // Config::load seeds Figment with the serialized defaults; if this
        // stops round-tripping, load() panics at startup.
        let serialized = toml::to_string(&Config::default()).unwrap();
        assert!(serialized.contains("deny_threshold"));
        assert!(serialized.contains("ttl_days"));
    }
}
