//! Board Server
//!
//! A board and todo REST backend with:
//! - Stateless HS256 JWT authentication
//! - Token revocation on sign-out, swept once tokens expire
//! - Posts with comments and likes, and a shared todo list
//! - Localized response messages

pub mod api;
pub mod auth;
pub mod messages;
pub mod store;

#[cfg(test)]
pub(crate) mod test_helpers;

use anyhow::{bail, Context, Result};
use api::{BoardState, ServerState};
use auth::{IdentityResolver, MemoryRevocationStore, RevocationStore, SigningKey, TokenCodec};
use messages::{Locale, Messages};
use serde::Deserialize;
use std::fmt;
use std::path::Path;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;
use store::MemoryStore;
use tracing::info;

// ============================================================================
// YAML config structs (deserialization targets)
// ============================================================================

/// Top-level YAML configuration file structure
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct YamlConfig {
    pub server: ServerYamlConfig,
    pub auth: AuthYamlConfig,
    pub messages: MessagesYamlConfig,
}

/// Server configuration section
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerYamlConfig {
    pub port: u16,
    pub cors_origins: Vec<String>,
}

impl Default for ServerYamlConfig {
    fn default() -> Self {
        Self {
            port: 8080,
            cors_origins: api::routes::DEFAULT_CORS_ORIGINS
                .iter()
                .map(|o| o.to_string())
                .collect(),
        }
    }
}

/// Auth configuration section
#[derive(Clone, Deserialize)]
#[serde(default)]
pub struct AuthYamlConfig {
    /// HS256 secret, at least 32 bytes
    pub jwt_secret: String,
    pub jwt_expiration_millis: u64,
    pub bcrypt_cost: u32,
    /// How often expired revocations are swept
    pub revocation_sweep_secs: u64,
}

impl Default for AuthYamlConfig {
    fn default() -> Self {
        Self {
            jwt_secret: String::new(),
            jwt_expiration_millis: 3_600_000, // 1 hour
            bcrypt_cost: bcrypt::DEFAULT_COST,
            revocation_sweep_secs: 300,
        }
    }
}

impl fmt::Debug for AuthYamlConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthYamlConfig")
            .field("jwt_secret", &"<redacted>")
            .field("jwt_expiration_millis", &self.jwt_expiration_millis)
            .field("bcrypt_cost", &self.bcrypt_cost)
            .field("revocation_sweep_secs", &self.revocation_sweep_secs)
            .finish()
    }
}

/// Messages configuration section
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct MessagesYamlConfig {
    pub locale: String,
}

impl Default for MessagesYamlConfig {
    fn default() -> Self {
        Self {
            locale: Locale::default().to_string(),
        }
    }
}

// ============================================================================
// Runtime config (what the application actually uses)
// ============================================================================

/// Application configuration
#[derive(Clone)]
pub struct Config {
    pub server_port: u16,
    pub cors_origins: Vec<String>,
    pub jwt_secret: String,
    pub jwt_expiration_millis: u64,
    pub bcrypt_cost: u32,
    pub revocation_sweep_secs: u64,
    pub locale: Locale,
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("server_port", &self.server_port)
            .field("cors_origins", &self.cors_origins)
            .field("jwt_secret", &"<redacted>")
            .field("jwt_expiration_millis", &self.jwt_expiration_millis)
            .field("bcrypt_cost", &self.bcrypt_cost)
            .field("revocation_sweep_secs", &self.revocation_sweep_secs)
            .field("locale", &self.locale)
            .finish()
    }
}

/// Read and parse an env var, `None` when unset.
fn env_parse<T>(var: &str) -> Result<Option<T>>
where
    T: FromStr,
    T::Err: fmt::Display,
{
    match std::env::var(var) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map(Some)
            .map_err(|e| anyhow::anyhow!("invalid {}: {}", var, e)),
        Err(_) => Ok(None),
    }
}

impl Config {
    /// Load configuration from an optional YAML file, then override with env vars.
    ///
    /// Priority: env var > YAML > default
    ///
    /// If `yaml_path` is None, tries "config.yaml" in CWD. A missing file means
    /// env vars / defaults; a file that exists but does not parse is an error.
    pub fn from_yaml_and_env(yaml_path: Option<&Path>) -> Result<Self> {
        // 1. Load YAML config (or defaults if file not found)
        let yaml = Self::load_yaml(yaml_path)?;

        // 2. Build Config with env var overrides
        let locale = std::env::var("MESSAGES_LOCALE").unwrap_or(yaml.messages.locale);
        let config = Self {
            server_port: env_parse("SERVER_PORT")?.unwrap_or(yaml.server.port),
            cors_origins: yaml.server.cors_origins,
            jwt_secret: std::env::var("JWT_SECRET").unwrap_or(yaml.auth.jwt_secret),
            jwt_expiration_millis: env_parse("JWT_EXPIRATION_MILLIS")?
                .unwrap_or(yaml.auth.jwt_expiration_millis),
            bcrypt_cost: env_parse("BCRYPT_COST")?.unwrap_or(yaml.auth.bcrypt_cost),
            revocation_sweep_secs: yaml.auth.revocation_sweep_secs,
            locale: locale.parse().map_err(anyhow::Error::msg)?,
        };
        config.validate()?;
        Ok(config)
    }

    fn load_yaml(yaml_path: Option<&Path>) -> Result<YamlConfig> {
        let default_path = Path::new("config.yaml");
        let path = yaml_path.unwrap_or(default_path);

        match std::fs::read_to_string(path) {
            Ok(contents) => {
                let config = serde_yaml::from_str(&contents)
                    .with_context(|| format!("failed to parse {}", path.display()))?;
                tracing::info!("Loaded config from {}", path.display());
                Ok(config)
            }
            Err(_) => {
                tracing::debug!(
                    "No config file at {}, using env vars / defaults",
                    path.display()
                );
                Ok(YamlConfig::default())
            }
        }
    }

    /// Startup checks. Any failure stops the process before it binds a socket.
    pub fn validate(&self) -> Result<()> {
        if self.jwt_secret.len() < auth::jwt::MIN_SECRET_BYTES {
            bail!(
                "JWT secret must be at least {} bytes (got {})",
                auth::jwt::MIN_SECRET_BYTES,
                self.jwt_secret.len()
            );
        }
        if !(auth::jwt::MIN_TTL_MILLIS..=auth::jwt::MAX_TTL_MILLIS)
            .contains(&self.jwt_expiration_millis)
        {
            bail!(
                "jwt_expiration_millis must be between {} and {} (got {})",
                auth::jwt::MIN_TTL_MILLIS,
                auth::jwt::MAX_TTL_MILLIS,
                self.jwt_expiration_millis
            );
        }
        if !(4..=31).contains(&self.bcrypt_cost) {
            bail!("bcrypt_cost must be between 4 and 31 (got {})", self.bcrypt_cost);
        }
        if self.revocation_sweep_secs == 0 {
            bail!("revocation_sweep_secs must be positive");
        }
        api::cors_layer(&self.cors_origins)?;
        Ok(())
    }
}

// ============================================================================
// Bootstrap
// ============================================================================

/// Build the shared state: stores, token codec, revocation set and messages.
pub fn build_state(config: &Config) -> Result<BoardState> {
    config.validate()?;

    let key = SigningKey::new(&config.jwt_secret)?;
    let tokens = Arc::new(TokenCodec::new(key, config.jwt_expiration_millis)?);
    let store = Arc::new(MemoryStore::new());

    Ok(Arc::new(ServerState {
        members: store.clone(),
        board: store.clone(),
        tokens,
        revocations: Arc::new(MemoryRevocationStore::new()),
        identity: IdentityResolver::new(store, config.bcrypt_cost),
        messages: Arc::new(Messages::new(config.locale)),
    }))
}

/// Build the state and the router serving it.
pub fn build_app(config: &Config) -> Result<(BoardState, axum::Router)> {
    let state = build_state(config)?;
    let router = api::create_router(state.clone(), api::cors_layer(&config.cors_origins)?);
    Ok((state, router))
}

/// Serve until Ctrl+C or SIGTERM.
pub async fn start_server(config: Config) -> Result<()> {
    let (state, app) = build_app(&config)?;

    let revocations: Arc<dyn RevocationStore> = state.revocations.clone();
    let sweeper = auth::blacklist::spawn_sweeper(
        revocations,
        Duration::from_secs(config.revocation_sweep_secs),
    );

    let addr = std::net::SocketAddr::from(([0, 0, 0, 0], config.server_port));
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {}", addr))?;
    info!(
        "Board server listening on {} (token TTL {} ms, locale {})",
        addr, config.jwt_expiration_millis, config.locale
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    sweeper.abort();
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }

    info!("Shutdown signal received, starting graceful shutdown");
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod config_tests {
    use super::*;
    use std::io::Write;

    const SECRET: &str = "yaml-secret-key-at-least-32-bytes-long";

    #[test]
    fn test_yaml_config_loading() {
        let yaml = r#"
server:
  port: 9090
  cors_origins:
    - https://board.example
auth:
  jwt_secret: "yaml-secret-key-at-least-32-bytes-long"
  jwt_expiration_millis: 60000
  bcrypt_cost: 10
  revocation_sweep_secs: 30
messages:
  locale: ko
"#;

        let config: YamlConfig = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(config.server.port, 9090);
        assert_eq!(config.server.cors_origins, vec!["https://board.example"]);
        assert_eq!(config.auth.jwt_secret, SECRET);
        assert_eq!(config.auth.jwt_expiration_millis, 60000);
        assert_eq!(config.auth.bcrypt_cost, 10);
        assert_eq!(config.auth.revocation_sweep_secs, 30);
        assert_eq!(config.messages.locale, "ko");
    }

    #[test]
    fn test_yaml_defaults() {
        let config = YamlConfig::default();
        assert_eq!(config.server.port, 8080);
        assert_eq!(
            config.server.cors_origins,
            vec!["http://localhost:5173", "http://localhost:8080"]
        );
        assert!(config.auth.jwt_secret.is_empty());
        assert_eq!(config.auth.jwt_expiration_millis, 3_600_000);
        assert_eq!(config.auth.bcrypt_cost, 12);
        assert_eq!(config.auth.revocation_sweep_secs, 300);
        assert_eq!(config.messages.locale, "en");
    }

    #[test]
    fn test_secret_is_redacted() {
        let mut yaml = YamlConfig::default();
        yaml.auth.jwt_secret = SECRET.to_string();
        assert!(!format!("{:?}", yaml).contains(SECRET));
    }

    fn valid_config() -> Config {
        Config {
            server_port: 0,
            cors_origins: vec!["http://localhost:5173".to_string()],
            jwt_secret: SECRET.to_string(),
            jwt_expiration_millis: 60_000,
            bcrypt_cost: 4,
            revocation_sweep_secs: 60,
            locale: Locale::En,
        }
    }

    #[test]
    fn test_validate_fails_fast() {
        assert!(valid_config().validate().is_ok());
        assert!(!format!("{:?}", valid_config()).contains(SECRET));

        let mut c = valid_config();
        c.jwt_secret = "x".repeat(31);
        assert!(c.validate().is_err());
        assert!(build_state(&c).is_err());

        let mut c = valid_config();
        c.jwt_expiration_millis = 999;
        assert!(c.validate().is_err());

        let mut c = valid_config();
        c.jwt_expiration_millis = 9_000_000_000_000_000_000;
        assert!(c.validate().is_err());
        assert!(build_state(&c).is_err());

        let mut c = valid_config();
        c.bcrypt_cost = 3;
        assert!(c.validate().is_err());

        let mut c = valid_config();
        c.cors_origins = vec!["bad\norigin".to_string()];
        assert!(c.validate().is_err());
    }

    #[test]
    fn test_build_state() {
        let state = build_state(&valid_config()).unwrap();
        assert!(state.revocations.is_empty());
        assert_eq!(state.messages.locale(), Locale::En);
    }

    /// Combined test for YAML file loading and env var overrides.
    /// Runs as a single test to avoid parallel env var race conditions.
    #[test]
    fn test_yaml_and_env_lifecycle() {
        fn clear_env() {
            for var in &[
                "SERVER_PORT",
                "JWT_SECRET",
                "JWT_EXPIRATION_MILLIS",
                "BCRYPT_COST",
                "MESSAGES_LOCALE",
            ] {
                std::env::remove_var(var);
            }
        }

        // --- Phase 1: YAML values loaded correctly ---
        let yaml = r#"
server:
  port: 9999
auth:
  jwt_secret: "yaml-secret-key-at-least-32-bytes-long"
  jwt_expiration_millis: 120000
"#;
        let dir = tempfile::tempdir().unwrap();
        let file_path = dir.path().join("config.yaml");
        let mut file = std::fs::File::create(&file_path).unwrap();
        file.write_all(yaml.as_bytes()).unwrap();

        clear_env();

        let config = Config::from_yaml_and_env(Some(&file_path)).unwrap();
        assert_eq!(config.server_port, 9999);
        assert_eq!(config.jwt_secret, SECRET);
        assert_eq!(config.jwt_expiration_millis, 120000);
        assert_eq!(config.bcrypt_cost, 12);
        assert_eq!(config.locale, Locale::En);

        // --- Phase 2: Env vars override YAML ---
        std::env::set_var("SERVER_PORT", "7777");
        std::env::set_var("JWT_EXPIRATION_MILLIS", "5000");
        std::env::set_var("MESSAGES_LOCALE", "ko");

        let config = Config::from_yaml_and_env(Some(&file_path)).unwrap();
        assert_eq!(config.server_port, 7777);
        assert_eq!(config.jwt_expiration_millis, 5000);
        assert_eq!(config.locale, Locale::Ko);
        // YAML value still used where no env override
        assert_eq!(config.jwt_secret, SECRET);

        // --- Phase 3: Bad env values and short secrets stop startup ---
        std::env::set_var("BCRYPT_COST", "lots");
        assert!(Config::from_yaml_and_env(Some(&file_path)).is_err());
        std::env::remove_var("BCRYPT_COST");

        std::env::set_var("JWT_SECRET", "too-short");
        assert!(Config::from_yaml_and_env(Some(&file_path)).is_err());

        std::env::set_var("JWT_SECRET", SECRET);
        std::env::set_var("MESSAGES_LOCALE", "fr");
        assert!(Config::from_yaml_and_env(Some(&file_path)).is_err());

        clear_env();

        // --- Phase 4: No YAML file → defaults, which lack a secret ---
        let nonexistent = Path::new("/tmp/nonexistent-board-config-12345.yaml");
        assert!(Config::from_yaml_and_env(Some(nonexistent)).is_err());
        std::env::set_var("JWT_SECRET", SECRET);
        let config = Config::from_yaml_and_env(Some(nonexistent)).unwrap();
        assert_eq!(config.server_port, 8080);
        assert_eq!(config.jwt_expiration_millis, 3_600_000);

        // --- Phase 5: Unparseable YAML is an error ---
        let broken = dir.path().join("broken.yaml");
        std::fs::write(&broken, "server: [not, a, map").unwrap();
        assert!(Config::from_yaml_and_env(Some(&broken)).is_err());

        clear_env();
    }
}
