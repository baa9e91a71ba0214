use clap::Parser;
use config::{Config, Environment, File, FileFormat};
use serde::Deserialize;
use std::path::Path;

/// Prefix for layered environment overrides, e.g. `REPLAY_SERVER__PORT=8080`.
pub const ENV_PREFIX: &str = "REPLAY";

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Config file path
    #[arg(short, long, env = "CONFIG_FILE")]
    pub config: Option<String>,

    /// Address to bind
    #[arg(long, env = "BIND_HOST")]
    pub host: Option<String>,

    /// Port to listen on
    #[arg(long, env = "PORT")]
    pub port: Option<u16>,

    /// Session store backend (memory | postgres)
    #[arg(long, env = "STORE_PROVIDER")]
    pub provider: Option<String>,

    /// Connection string for the session store
    #[arg(long, env = "DATABASE_URL")]
    pub database_url: Option<String>,

    /// Disable timeout middleware
    #[arg(long, env = "TIMEOUT_DISABLED")]
    pub timeout_disabled: Option<bool>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub persistence: PersistenceConfig,
    pub resilience: ResilienceConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub port: u16,
    pub host: String,
}

#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum StoreProvider {
    Memory,
    Postgres,
}

#[derive(Debug, Deserialize, Clone)]
pub struct PersistenceConfig {
    pub provider: StoreProvider,
    #[serde(default)]
    pub database_url: Option<String>,
    pub max_connections: u32,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ResilienceConfig {
    pub timeout_disabled: bool,
    pub request_timeout_secs: u64,
    pub body_limit_bytes: usize,
}

impl Default for ResilienceConfig {
    fn default() -> Self {
        Self {
            timeout_disabled: false,
            request_timeout_secs: 30,
            body_limit_bytes: 10 * 1024 * 1024,
        }
    }
}

impl AppConfig {
    pub fn load() -> Result<Self, config::ConfigError> {
        Self::load_from_args(std::env::args())
    }

    /// Layering, lowest to highest: defaults, config file, `REPLAY_*`
    /// environment, CLI flags (and the plain env vars clap maps onto them).
    pub fn load_from_args<I, T>(args: I) -> Result<Self, config::ConfigError>
    where
        I: IntoIterator<Item = T>,
        T: Into<std::ffi::OsString> + Clone,
    {
        let cli =
            Cli::try_parse_from(args).map_err(|e| config::ConfigError::Message(e.to_string()))?;

        let resilience = ResilienceConfig::default();
        let mut builder = Config::builder()
            .set_default("server.port", 5000)?
            .set_default("server.host", "0.0.0.0")?
            .set_default("persistence.provider", "postgres")?
            .set_default("persistence.max_connections", 5)?
            .set_default("resilience.timeout_disabled", resilience.timeout_disabled)?
            .set_default(
                "resilience.request_timeout_secs",
                i64::try_from(resilience.request_timeout_secs).unwrap_or(i64::MAX),
            )?
            .set_default(
                "resilience.body_limit_bytes",
                i64::try_from(resilience.body_limit_bytes).unwrap_or(i64::MAX),
            )?;

        // An explicit file must exist; ./config.yaml is picked up when present.
        builder = match &cli.config {
            Some(path) => builder.add_source(File::from(Path::new(path)).required(true)),
            None => builder.add_source(File::new("config.yaml", FileFormat::Yaml).required(false)),
        };

        builder = builder.add_source(
            Environment::with_prefix(ENV_PREFIX)
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

        if let Some(host) = cli.host {
            builder = builder.set_override("server.host", host)?;
        }
        if let Some(port) = cli.port {
            builder = builder.set_override("server.port", i64::from(port))?;
        }
        if let Some(provider) = cli.provider {
            builder = builder.set_override("persistence.provider", provider.to_lowercase())?;
        }
        if let Some(url) = cli.database_url {
            builder = builder.set_override("persistence.database_url", url)?;
        }
        if let Some(td) = cli.timeout_disabled {
            builder = builder.set_override("resilience.timeout_disabled", td)?;
        }

        let cfg = builder.build()?;
        cfg.try_deserialize()
    }
}
