use std::io::ErrorKind;

use anyhow::{anyhow, Context, Result};
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub auth: AuthConfig,
    #[serde(default)]
    pub listing: ListingConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    #[serde(default)]
    pub worker_threads: Option<usize>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self { host: "127.0.0.1".into(), port: 5000, worker_threads: Some(4) }
    }
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
    #[serde(default = "default_max_lifetime")]
    pub max_lifetime_secs: u64,
    #[serde(default = "default_acquire_timeout")]
    pub acquire_timeout_secs: u64,
    #[serde(default)]
    pub sqlx_logging: bool,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: String::new(),
            max_connections: default_max_connections(),
            min_connections: default_min_connections(),
            connect_timeout_secs: default_connect_timeout(),
            idle_timeout_secs: default_idle_timeout(),
            max_lifetime_secs: default_max_lifetime(),
            acquire_timeout_secs: default_acquire_timeout(),
            sqlx_logging: false,
        }
    }
}

fn default_max_connections() -> u32 { 10 }
fn default_min_connections() -> u32 { 2 }
fn default_connect_timeout() -> u64 { 30 }
fn default_idle_timeout() -> u64 { 600 }
fn default_max_lifetime() -> u64 { 3600 }
fn default_acquire_timeout() -> u64 { 30 }

/// Token signing settings for the bearer-token extractor and login.
#[derive(Debug, Clone, Deserialize)]
pub struct AuthConfig {
    #[serde(default)]
    pub jwt_secret: String,
    #[serde(default = "default_token_ttl_hours")]
    pub token_ttl_hours: i64,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self { jwt_secret: String::new(), token_ttl_hours: default_token_ttl_hours() }
    }
}

fn default_token_ttl_hours() -> i64 { 720 }

/// Page sizes used by the post listing endpoints.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct ListingConfig {
    #[serde(default = "default_page_size")]
    pub default_page_size: u64,
    #[serde(default = "default_max_page_size")]
    pub max_page_size: u64,
}

impl Default for ListingConfig {
    fn default() -> Self {
        Self { default_page_size: default_page_size(), max_page_size: default_max_page_size() }
    }
}

fn default_page_size() -> u64 { 10 }
fn default_max_page_size() -> u64 { 100 }

fn config_path() -> String {
    std::env::var("CONFIG_PATH").unwrap_or_else(|_| "config.toml".to_string())
}

/// Read a config file. `Ok(None)` only when the file does not exist;
/// a file that exists but does not parse is an error.
pub fn load_optional(path: &str) -> Result<Option<AppConfig>> {
    match std::fs::read_to_string(path) {
        Ok(content) => {
            let cfg: AppConfig = toml::from_str(&content).with_context(|| format!("parsing {path}"))?;
            Ok(Some(cfg))
        }
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
        Err(e) => Err(anyhow::Error::new(e).context(format!("reading {path}"))),
    }
}

impl AppConfig {
    /// `CONFIG_PATH` (default `config.toml`) when present, otherwise defaults
    /// filled from the environment.
    pub fn load_or_env() -> Result<Self> {
        Self::load_or_env_from(&config_path())
    }

    pub fn load_or_env_from(path: &str) -> Result<Self> {
        let mut cfg = load_optional(path)?.unwrap_or_default();
        if let Ok(host) = std::env::var("SERVER_HOST") {
            cfg.server.host = host;
        }
        if let Some(port) = std::env::var("SERVER_PORT").ok().and_then(|p| p.parse::<u16>().ok()) {
            cfg.server.port = port;
        }
        cfg.normalize_and_validate()?;
        Ok(cfg)
    }

    pub fn normalize_and_validate(&mut self) -> Result<()> {
        self.server.normalize()?;
        self.database.normalize_from_env();
        self.database.validate()?;
        self.auth.normalize_from_env();
        self.auth.validate()?;
        self.listing.validate()?;
        Ok(())
    }
}

impl ServerConfig {
    fn normalize(&mut self) -> Result<()> {
        self.normalize_with(std::env::var("TOKIO_WORKER_THREADS").ok().as_deref())
    }

    /// `worker_env` (from `TOKIO_WORKER_THREADS`) overrides the file when it is a positive count.
    fn normalize_with(&mut self, worker_env: Option<&str>) -> Result<()> {
        if self.host.trim().is_empty() {
            self.host = "127.0.0.1".to_string();
        }
        if self.port == 0 {
            return Err(anyhow!("server.port must be in 1..=65535"));
        }
        if let Some(raw) = worker_env {
            match raw.trim().parse::<usize>() {
                Ok(n) if n > 0 => self.worker_threads = Some(n),
                _ => return Err(anyhow!("TOKIO_WORKER_THREADS must be a positive integer, got '{raw}'")),
            }
        }
        match self.worker_threads {
            Some(0) | None => self.worker_threads = Some(4),
            Some(_) => {}
        }
        Ok(())
    }
}

impl DatabaseConfig {
    pub fn normalize_from_env(&mut self) {
        if self.url.trim().is_empty() {
            if let Ok(url) = std::env::var("DATABASE_URL") {
                self.url = url;
            }
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.url.trim().is_empty() {
            return Err(anyhow!("database.url is empty; set it in config.toml or DATABASE_URL"));
        }
        let lower = self.url.to_lowercase();
        if !(lower.starts_with("postgresql://") || lower.starts_with("postgres://") || lower.starts_with("sqlite:")) {
            return Err(anyhow!("database.url must start with postgres://, postgresql:// or sqlite:"));
        }
        if self.min_connections == 0 {
            return Err(anyhow!("database.min_connections must be >= 1"));
        }
        if self.max_connections < self.min_connections {
            return Err(anyhow!("database.max_connections must be >= min_connections"));
        }
        if self.connect_timeout_secs == 0 || self.acquire_timeout_secs == 0 {
            return Err(anyhow!("database timeouts must be positive seconds"));
        }
        Ok(())
    }
}

impl AuthConfig {
    pub fn normalize_from_env(&mut self) {
        if self.jwt_secret.trim().is_empty() {
            if let Ok(secret) = std::env::var("JWT_SECRET") {
                self.jwt_secret = secret;
            }
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.jwt_secret.trim().is_empty() {
            return Err(anyhow!("auth.jwt_secret is empty; set it in config.toml or JWT_SECRET"));
        }
        if self.token_ttl_hours <= 0 {
            return Err(anyhow!("auth.token_ttl_hours must be positive"));
        }
        Ok(())
    }
}

impl ListingConfig {
    pub fn validate(&self) -> Result<()> {
        if self.default_page_size == 0 || self.max_page_size == 0 {
            return Err(anyhow!("listing page sizes must be positive"));
        }
        if self.default_page_size > self.max_page_size {
            return Err(anyhow!("listing.default_page_size must be <= max_page_size"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_partial_toml_with_defaults() {
        let cfg: AppConfig = toml::from_str(
            r#"
            [database]
            url = "sqlite::memory:"

            [auth]
            jwt_secret = "s3cret"
            "#,
        )
        .unwrap();
        assert_eq!(cfg.server.port, 5000);
        assert_eq!(cfg.database.max_connections, 10);
        assert_eq!(cfg.auth.token_ttl_hours, 720);
        assert_eq!(cfg.listing.default_page_size, 10);
        assert_eq!(cfg.listing.max_page_size, 100);
    }

    #[test]
    fn rejects_unknown_database_scheme() {
        let db = DatabaseConfig { url: "mysql://localhost/board".into(), ..Default::default() };
        assert!(db.validate().is_err());
    }

    #[test]
    fn rejects_default_page_size_above_max() {
        let listing = ListingConfig { default_page_size: 50, max_page_size: 20 };
        assert!(listing.validate().is_err());
    }

    #[test]
    fn zero_worker_threads_normalizes() {
        let mut s = ServerConfig { host: " ".into(), port: 8080, worker_threads: Some(0) };
        s.normalize_with(None).unwrap();
        assert_eq!(s.host, "127.0.0.1");
        assert_eq!(s.worker_threads, Some(4));
    }

    #[test]
    fn worker_threads_env_overrides_file() {
        let mut s = ServerConfig { worker_threads: Some(2), ..Default::default() };
        s.normalize_with(Some("8")).unwrap();
        assert_eq!(s.worker_threads, Some(8));

        let mut s = ServerConfig::default();
        assert!(s.normalize_with(Some("many")).is_err());
        assert!(s.normalize_with(Some("0")).is_err());
    }

    fn temp_config(name: &str, body: &str) -> std::path::PathBuf {
        let path = std::env::temp_dir().join(format!("hill_board_{}_{name}.toml", std::process::id()));
        std::fs::write(&path, body).unwrap();
        path
    }

    #[test]
    fn missing_file_is_not_an_error() {
        let path = std::env::temp_dir().join(format!("hill_board_{}_absent.toml", std::process::id()));
        assert!(load_optional(path.to_str().unwrap()).unwrap().is_none());
    }

    #[test]
    fn malformed_file_is_reported() {
        let path = temp_config("malformed", "[listing]\nmax_page_size = \"lots\"\n\n[auth]\njwt_secret = 5\n");
        let path_str = path.to_str().unwrap();
        let err = load_optional(path_str).unwrap_err();
        assert!(format!("{err:#}").contains("parsing"), "{err:#}");
        assert!(AppConfig::load_or_env_from(path_str).is_err());
        std::fs::remove_file(&path).unwrap();
    }

    #[test]
    fn valid_file_is_loaded() {
        let path = temp_config("valid", "[database]\nurl = \"sqlite::memory:\"\n\n[auth]\njwt_secret = \"s\"\n\n[listing]\nmax_page_size = 50\n");
        let cfg = load_optional(path.to_str().unwrap()).unwrap().unwrap();
        assert_eq!(cfg.listing.max_page_size, 50);
        std::fs::remove_file(&path).unwrap();
    }
}
