use config::{Config as ConfigBuilder, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

use crate::Result;

/// Application configuration
///
/// Built once at startup and shared read-only afterwards.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub server: ServerConfig,
    pub auth: AuthConfig,
    pub jwt: JwtConfig,
    pub statics: StaticsConfig,
    pub relay: RelayConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Listen address of the HTTP control surface
    pub api_addr: String,
    /// RTMP listen address of the local engine, in `host:port` or `:port` form
    pub rtmp_addr: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            api_addr: "0.0.0.0:8090".to_string(),
            rtmp_addr: ":1935".to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AuthConfig {
    /// Shared secret compared verbatim against the `authorization` header
    pub api_key: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct JwtConfig {
    /// HMAC secret; an empty secret disables bearer-token validation
    pub secret: String,
    pub algorithm: String,
}

impl Default for JwtConfig {
    fn default() -> Self {
        Self {
            secret: String::new(),
            algorithm: "HS256".to_string(),
        }
    }
}

impl JwtConfig {
    #[must_use]
    pub fn enabled(&self) -> bool {
        !self.secret.is_empty()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StaticsConfig {
    pub dir: String,
}

impl Default for StaticsConfig {
    fn default() -> Self {
        Self {
            dir: "statics".to_string(),
        }
    }
}

/// External relay program settings
///
/// `args` is a template: `{source}` and `{target}` are replaced by the
/// relay endpoints of each session.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RelayConfig {
    pub program: String,
    pub args: Vec<String>,
    pub startup_grace_ms: u64,
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            program: "ffmpeg".to_string(),
            args: [
                "-nostdin",
                "-loglevel",
                "error",
                "-i",
                "{source}",
                "-c",
                "copy",
                "-f",
                "flv",
                "{target}",
            ]
            .iter()
            .map(|s| (*s).to_string())
            .collect(),
            startup_grace_ms: 300,
        }
    }
}

impl RelayConfig {
    #[must_use]
    pub const fn startup_grace(&self) -> Duration {
        Duration::from_millis(self.startup_grace_ms)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    pub format: String, // "json" or "pretty"
    pub file_path: Option<String>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "pretty".to_string(),
            file_path: None,
        }
    }
}

impl Config {
    /// Load configuration with the following priority:
    /// 1. Environment variables (highest priority)
    /// 2. Config file (if provided and present)
    /// 3. Default values
    pub fn load(config_file: Option<&str>) -> Result<Self> {
        let mut builder = ConfigBuilder::builder();

        if let Some(path) = config_file {
            if Path::new(path).exists() {
                builder = builder.add_source(File::with_name(path));
            }
        }

        // LIVEGATE_SERVER__API_ADDR, LIVEGATE_JWT__SECRET, ...
        builder = builder.add_source(
            Environment::with_prefix("LIVEGATE")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

        let config = builder.build()?;
        Ok(config.try_deserialize()?)
    }

    /// Load from environment variables only
    pub fn from_env() -> Result<Self> {
        Self::load(None)
    }

    pub fn from_file(path: &str) -> Result<Self> {
        Self::load(Some(path))
    }

    #[must_use]
    pub fn api_address(&self) -> &str {
        &self.server.api_addr
    }

    /// URL of `app/name` on the local RTMP engine
    #[must_use]
    pub fn local_rtmp_url(&self, app: &str, name: &str) -> String {
        local_rtmp_url(&self.server.rtmp_addr, app, name)
    }
}

/// `rtmp://127.0.0.1<rtmp_addr>/<app>/<name>`
///
/// `rtmp_addr` is appended verbatim, so `":1935"` yields
/// `rtmp://127.0.0.1:1935/app/name`.
#[must_use]
pub fn local_rtmp_url(rtmp_addr: &str, app: &str, name: &str) -> String {
    format!("rtmp://127.0.0.1{rtmp_addr}/{app}/{name}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.server.api_addr, "0.0.0.0:8090");
        assert_eq!(config.server.rtmp_addr, ":1935");
        assert!(config.auth.api_key.is_empty());
        assert!(!config.jwt.enabled());
        assert_eq!(config.jwt.algorithm, "HS256");
        assert_eq!(config.relay.program, "ffmpeg");
        assert_eq!(config.relay.startup_grace(), Duration::from_millis(300));
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn test_local_rtmp_url() {
        let config = Config::default();
        assert_eq!(
            config.local_rtmp_url("live", "room1"),
            "rtmp://127.0.0.1:1935/live/room1"
        );
        assert_eq!(
            local_rtmp_url(":19350", "app", "a/b"),
            "rtmp://127.0.0.1:19350/app/a/b"
        );
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("livegate.toml");
        let mut file = std::fs::File::create(&path).unwrap();
        writeln!(
            file,
            r#"
[server]
rtmp_addr = ":2935"

[auth]
api_key = "secret-key"

[jwt]
secret = "hmac"
algorithm = "HS512"
"#
        )
        .unwrap();

        let config = Config::from_file(path.to_str().unwrap()).unwrap();
        assert_eq!(config.server.rtmp_addr, ":2935");
        // untouched sections keep their defaults
        assert_eq!(config.server.api_addr, "0.0.0.0:8090");
        assert_eq!(config.auth.api_key, "secret-key");
        assert!(config.jwt.enabled());
        assert_eq!(config.jwt.algorithm, "HS512");
        assert_eq!(config.statics.dir, "statics");
    }

    #[test]
    fn test_missing_file_falls_back_to_defaults() {
        let config = Config::load(Some("/nonexistent/livegate.toml")).unwrap();
        assert_eq!(config.server.rtmp_addr, ":1935");
    }

    #[test]
    fn test_env_overrides_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("livegate.toml");
        std::fs::write(&path, "[relay]\nprogram = \"gst-relay\"\nstartup_grace_ms = 100\n").unwrap();

        // only relay.startup_grace_ms is overridden; no other test reads it after a load
        std::env::set_var("LIVEGATE_RELAY__STARTUP_GRACE_MS", "750");
        let loaded = Config::from_file(path.to_str().unwrap());
        std::env::remove_var("LIVEGATE_RELAY__STARTUP_GRACE_MS");

        let config = loaded.unwrap();
        assert_eq!(config.relay.startup_grace(), Duration::from_millis(750));
        assert_eq!(config.relay.program, "gst-relay");
    }
}
