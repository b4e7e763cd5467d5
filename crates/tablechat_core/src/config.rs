//! Layered configuration for the gateway, tool server and client.

use config::builder::DefaultState;
use config::{Config, ConfigBuilder, Environment, File, FileFormat, Map};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tablechat_error::{ConfigError, TablechatResult};
use tracing::{debug, instrument};

/// Bundled default configuration.
const DEFAULT_CONFIG: &str = include_str!("../../../tablechat.toml");

/// Inference gateway settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, derive_getters::Getters)]
pub struct GatewaySettings {
    /// Interface to bind
    host: String,
    /// Port to listen on
    port: u16,
    /// The single browser origin allowed to make credentialed calls
    cors_origin: String,
    /// Base URL of an externally managed llama.cpp server
    engine_url: String,
    /// GGUF model to load; when set the gateway owns the engine process
    #[serde(default)]
    model_path: Option<PathBuf>,
    /// Engine executable
    engine_binary: String,
    /// Port for a gateway-owned engine process
    engine_port: u16,
    /// Context window size
    n_ctx: u32,
    /// Inference threads
    n_threads: u32,
    /// How long to wait for a spawned engine to report healthy
    startup_timeout_secs: u64,
}

impl GatewaySettings {
    /// `host:port` to bind, with `port` replacing the configured one when given.
    pub fn bind_addr(&self, port: Option<u16>) -> String {
        format!("{}:{}", self.host, port.unwrap_or(self.port))
    }
}

/// Tool execution server settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, derive_getters::Getters)]
pub struct McpSettings {
    /// Interface to bind
    host: String,
    /// Port to listen on (`PORT` overrides)
    port: u16,
    /// Table every tool reads from
    table: String,
}

impl McpSettings {
    /// `host:port` to bind, with `port` replacing the configured one when given.
    pub fn bind_addr(&self, port: Option<u16>) -> String {
        format!("{}:{}", self.host, port.unwrap_or(self.port))
    }
}

/// Client/orchestrator settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, derive_getters::Getters)]
pub struct ClientSettings {
    /// Base URL of the inference gateway
    gateway_url: String,
    /// Base URL of the tool execution server
    mcp_url: String,
    /// Model name sent with chat completions
    model: String,
    /// Maximum tokens per completion
    max_tokens: u32,
    /// Sampling temperature
    temperature: f32,
}

/// Log output settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, derive_getters::Getters)]
pub struct LoggingSettings {
    /// Default filter directive when `RUST_LOG` is unset
    level: String,
    /// Emit JSON lines instead of human-readable output
    json: bool,
}

/// Complete tablechat configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, derive_getters::Getters)]
pub struct Settings {
    /// `[gateway]`
    gateway: GatewaySettings,
    /// `[mcp]`
    mcp: McpSettings,
    /// `[client]`
    client: ClientSettings,
    /// `[logging]`
    logging: LoggingSettings,
}

impl Settings {
    /// Load configuration with precedence: environment > current dir > home dir > bundled defaults.
    ///
    /// Environment variables use the `TABLECHAT` prefix and `__` as the
    /// section separator (`TABLECHAT__MCP__PORT=4000`). The tool server's
    /// port additionally honours plain `PORT`.
    #[instrument]
    pub fn load() -> TablechatResult<Self> {
        debug!("Loading configuration with precedence: env > current dir > home dir > bundled defaults");

        let mut builder =
            Config::builder().add_source(File::from_str(DEFAULT_CONFIG, FileFormat::Toml));

        if let Some(home) = dirs::home_dir() {
            let home_config = home.join(".config/tablechat/tablechat.toml");
            builder = builder.add_source(File::from(home_config).required(false));
        }

        builder = builder.add_source(File::with_name("tablechat").required(false));

        Self::finish(Self::with_environment(builder, None)?)
    }

    /// Load bundled defaults overlaid with a specific file.
    ///
    /// Environment variables and `PORT` still take precedence over the file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    #[instrument(skip(path), fields(path = %path.as_ref().display()))]
    pub fn from_file(path: impl AsRef<Path>) -> TablechatResult<Self> {
        Self::from_file_with_env(path, None)
    }

    fn from_file_with_env(
        path: impl AsRef<Path>,
        vars: Option<Map<String, String>>,
    ) -> TablechatResult<Self> {
        debug!("Loading configuration from file");

        let builder = Config::builder()
            .add_source(File::from_str(DEFAULT_CONFIG, FileFormat::Toml))
            .add_source(File::from(path.as_ref()));

        Self::finish(Self::with_environment(builder, vars)?)
    }

    /// Bundled defaults only.
    pub fn bundled() -> TablechatResult<Self> {
        Self::finish(Config::builder().add_source(File::from_str(DEFAULT_CONFIG, FileFormat::Toml)))
    }

    /// `TABLECHAT__*` variables, then `PORT` for the tool server.
    ///
    /// `vars` replaces the process environment when given.
    fn with_environment(
        builder: ConfigBuilder<DefaultState>,
        vars: Option<Map<String, String>>,
    ) -> TablechatResult<ConfigBuilder<DefaultState>> {
        let port = match &vars {
            Some(vars) => vars.get("PORT").cloned(),
            None => std::env::var("PORT").ok(),
        };

        let mut builder = builder.add_source(
            Environment::with_prefix("TABLECHAT")
                .separator("__")
                .source(vars),
        );

        if let Some(port) = port {
            builder = builder
                .set_override("mcp.port", port)
                .map_err(|e| ConfigError::new(format!("Invalid PORT override: {}", e)))?;
        }
        Ok(builder)
    }

    fn finish(builder: ConfigBuilder<DefaultState>) -> TablechatResult<Self> {
        let settings = builder
            .build()
            .map_err(|e| ConfigError::new(format!("Failed to build configuration: {}", e)))?
            .try_deserialize()
            .map_err(|e| ConfigError::new(format!("Failed to parse configuration: {}", e)))?;
        Ok(settings)
    }
}
