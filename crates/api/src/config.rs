use serde::Deserialize;
use std::net::SocketAddr;
use std::time::Duration;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub server: ServerConfig,
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub booking: BookingConfig,
    #[serde(default)]
    pub cache: CacheConfig,
    pub logging: LoggingConfig,
    #[serde(default)]
    pub security: SecurityConfig,
    /// JWT authentication configuration
    pub jwt: JwtAuthConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,

    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    #[serde(default)]
    pub url: String,

    #[serde(default = "default_max_connections")]
    pub max_connections: u32,

    #[serde(default = "default_min_connections")]
    pub min_connections: u32,

    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_secs: u64,

    #[serde(default = "default_idle_timeout")]
    pub idle_timeout_secs: u64,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: String::new(),
            max_connections: default_max_connections(),
            min_connections: default_min_connections(),
            connect_timeout_secs: default_connect_timeout(),
            idle_timeout_secs: default_idle_timeout(),
        }
    }
}

impl From<&DatabaseConfig> for persistence::db::DatabaseConfig {
    fn from(config: &DatabaseConfig) -> Self {
        Self {
            url: config.url.clone(),
            max_connections: config.max_connections,
            min_connections: config.min_connections,
            connect_timeout_secs: config.connect_timeout_secs,
            idle_timeout_secs: config.idle_timeout_secs,
        }
    }
}

/// Which store backs the service.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    #[default]
    Postgres,
    /// Single-process store, for development only
    Memory,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct StorageConfig {
    #[serde(default)]
    pub backend: StorageBackend,
}

#[derive(Debug, Clone, Deserialize)]
pub struct BookingConfig {
    /// Bounded wait for an event row lock, in milliseconds
    #[serde(default = "default_lock_timeout_ms")]
    pub lock_timeout_ms: u64,
}

impl Default for BookingConfig {
    fn default() -> Self {
        Self {
            lock_timeout_ms: default_lock_timeout_ms(),
        }
    }
}

impl BookingConfig {
    pub fn lock_timeout(&self) -> Duration {
        Duration::from_millis(self.lock_timeout_ms)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct CacheConfig {
    /// Lifetime of cached anonymous event listings; 0 disables the cache
    #[serde(default = "default_event_list_ttl")]
    pub event_list_ttl_secs: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            event_list_ttl_secs: default_event_list_ttl(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,

    #[serde(default = "default_log_format")]
    pub format: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SecurityConfig {
    /// Allowed CORS origins; empty means any origin
    #[serde(default)]
    pub cors_origins: Vec<String>,

    /// Send Strict-Transport-Security; enable only behind TLS
    #[serde(default)]
    pub hsts_enabled: bool,
}

// Default value functions
fn default_host() -> String {
    "0.0.0.0".to_string()
}
fn default_port() -> u16 {
    8080
}
fn default_request_timeout() -> u64 {
    30
}
fn default_max_connections() -> u32 {
    20
}
fn default_min_connections() -> u32 {
    5
}
fn default_connect_timeout() -> u64 {
    10
}
fn default_idle_timeout() -> u64 {
    600
}
fn default_lock_timeout_ms() -> u64 {
    5000
}
fn default_event_list_ttl() -> u64 {
    30
}
fn default_log_level() -> String {
    "info".to_string()
}
fn default_log_format() -> String {
    "json".to_string()
}

#[derive(Debug, Clone, Deserialize)]
pub struct JwtAuthConfig {
    /// Shared HS256 secret; takes precedence over the RSA keys when set
    #[serde(default)]
    pub secret: String,

    /// RSA private key in PEM format, only needed to mint tokens
    #[serde(default)]
    pub private_key: String,

    /// RSA public key in PEM format for verifying tokens
    #[serde(default)]
    pub public_key: String,

    /// Access token expiration in seconds (default: 3600 = 1 hour)
    #[serde(default = "default_access_token_expiry")]
    pub access_token_expiry_secs: i64,

    /// Leeway in seconds for clock skew tolerance (default: 30)
    #[serde(default = "default_jwt_leeway")]
    pub leeway_secs: u64,
}

fn default_access_token_expiry() -> i64 {
    3600 // 1 hour
}

fn default_jwt_leeway() -> u64 {
    30 // 30 seconds for clock skew tolerance
}

impl JwtAuthConfig {
    /// Builds the token validator from the configured keys.
    pub fn build(&self) -> Result<shared::jwt::JwtConfig, shared::jwt::JwtError> {
        if !self.secret.is_empty() {
            return Ok(shared::jwt::JwtConfig::from_secret(
                &self.secret,
                self.access_token_expiry_secs,
                self.leeway_secs,
            ));
        }
        shared::jwt::JwtConfig::from_rsa_pem(
            Some(self.private_key.as_str()),
            &self.public_key,
            self.access_token_expiry_secs,
            self.leeway_secs,
        )
    }
}

/// Configuration validation error
#[derive(Debug, thiserror::Error)]
pub enum ConfigValidationError {
    #[error("Missing required configuration: {0}")]
    MissingRequired(String),

    #[error("Invalid configuration value: {0}")]
    InvalidValue(String),
}

impl Config {
    /// Load configuration from files and environment variables.
    ///
    /// Loading order (later sources override earlier):
    /// 1. config/default.toml - base configuration with defaults
    /// 2. config/local.toml - local overrides (optional, not in git)
    /// 3. Environment variables with TK__ prefix
    pub fn load() -> Result<Self, config::ConfigError> {
        let config = config::Config::builder()
            .add_source(config::File::with_name("config/default"))
            .add_source(config::File::with_name("config/local").required(false))
            .add_source(
                config::Environment::with_prefix("TK")
                    .separator("__")
                    .list_separator(",")
                    .with_list_parse_key("security.cors_origins")
                    .try_parsing(true),
            )
            .build()?;

        let cfg: Self = config.try_deserialize()?;
        cfg.validate()
            .map_err(|e| config::ConfigError::Message(e.to_string()))?;
        Ok(cfg)
    }

    /// Load configuration for testing with custom overrides.
    ///
    /// This method creates a config entirely from defaults and overrides,
    /// without relying on config files (which may not be accessible during tests).
    #[cfg(test)]
    pub fn load_for_test(overrides: &[(&str, &str)]) -> Result<Self, config::ConfigError> {
        // Embed defaults directly to avoid file system dependency in tests
        let defaults = r#"
            [server]
            host = "0.0.0.0"
            port = 8080
            request_timeout_secs = 30

            [database]
            url = ""
            max_connections = 20
            min_connections = 5
            connect_timeout_secs = 10
            idle_timeout_secs = 600

            [storage]
            backend = "postgres"

            [booking]
            lock_timeout_ms = 5000

            [cache]
            event_list_ttl_secs = 30

            [logging]
            level = "info"
            format = "json"

            [security]
            cors_origins = []
            hsts_enabled = false

            [jwt]
            secret = ""
            public_key = "test-public-key"
            access_token_expiry_secs = 3600
            leeway_secs = 30
        "#;

        let mut builder = config::Config::builder()
            .add_source(config::File::from_str(defaults, config::FileFormat::Toml));

        for (key, value) in overrides {
            builder = builder.set_override(*key, *value)?;
        }

        let cfg: Self = builder.build()?.try_deserialize()?;
        // Skip validation in tests to allow partial configs
        Ok(cfg)
    }

    /// Validate configuration values.
    fn validate(&self) -> Result<(), ConfigValidationError> {
        // Database URL is required unless running on the memory store
        if self.storage.backend == StorageBackend::Postgres && self.database.url.is_empty() {
            return Err(ConfigValidationError::MissingRequired(
                "TK__DATABASE__URL environment variable must be set".to_string(),
            ));
        }

        // Validate port range
        if self.server.port == 0 {
            return Err(ConfigValidationError::InvalidValue(
                "Server port cannot be 0".to_string(),
            ));
        }

        // Validate connection pool settings
        if self.database.min_connections > self.database.max_connections {
            return Err(ConfigValidationError::InvalidValue(
                "min_connections cannot exceed max_connections".to_string(),
            ));
        }

        if self.booking.lock_timeout_ms == 0 {
            return Err(ConfigValidationError::InvalidValue(
                "booking.lock_timeout_ms must be positive".to_string(),
            ));
        }

        if self.jwt.secret.is_empty() && self.jwt.public_key.is_empty() {
            return Err(ConfigValidationError::MissingRequired(
                "jwt.secret or jwt.public_key must be set".to_string(),
            ));
        }

        if self.server.host.parse::<std::net::IpAddr>().is_err() {
            return Err(ConfigValidationError::InvalidValue(format!(
                "server.host is not an IP address: {}",
                self.server.host
            )));
        }

        Ok(())
    }

    pub fn socket_addr(&self) -> SocketAddr {
        // Host is validated as an IP address on load.
        let ip = self
            .server
            .host
            .parse()
            .unwrap_or(std::net::IpAddr::from([0, 0, 0, 0]));
        SocketAddr::new(ip, self.server.port)
    }
}
