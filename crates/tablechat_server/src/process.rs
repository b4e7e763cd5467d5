//! Lifecycle of a gateway-owned `llama-server` process.

use derive_getters::Getters;
use std::path::PathBuf;
use std::process::{Child, Command, Stdio};
use std::time::Duration;
use tablechat_core::GatewaySettings;
use tablechat_error::{GatewayError, GatewayErrorKind};
use tokio::time::sleep;
use tracing::{debug, info, instrument, warn};

/// How to launch the engine process.
#[derive(Debug, Clone, PartialEq, Eq, Getters, derive_builder::Builder)]
#[builder(setter(into))]
pub struct LlamaLaunch {
    /// Executable to run
    #[builder(default = "\"llama-server\".to_string()")]
    binary: String,

    /// GGUF model file
    model_path: PathBuf,

    /// Context window size
    #[builder(default = "2048")]
    n_ctx: u32,

    /// Inference threads
    #[builder(default = "8")]
    n_threads: u32,

    /// Loopback port to serve on
    #[builder(default = "8081")]
    port: u16,
}

impl LlamaLaunch {
    /// Launch settings from `[gateway]`, if a model is configured.
    pub fn from_settings(settings: &GatewaySettings) -> Option<Self> {
        settings.model_path().as_ref().map(|model_path| Self {
            binary: settings.engine_binary().clone(),
            model_path: model_path.clone(),
            n_ctx: *settings.n_ctx(),
            n_threads: *settings.n_threads(),
            port: *settings.engine_port(),
        })
    }

    /// Command-line arguments passed to the engine.
    pub fn args(&self) -> Vec<String> {
        vec![
            "--model".to_string(),
            self.model_path.to_string_lossy().to_string(),
            "--ctx-size".to_string(),
            self.n_ctx.to_string(),
            "--threads".to_string(),
            self.n_threads.to_string(),
            "--host".to_string(),
            "127.0.0.1".to_string(),
            "--port".to_string(),
            self.port.to_string(),
        ]
    }

    /// Base URL the engine will answer on.
    pub fn base_url(&self) -> String {
        format!("http://127.0.0.1:{}", self.port)
    }
}

/// Handle for a running engine process. The process is killed on drop.
pub struct LlamaProcess {
    process: Child,
    launch: LlamaLaunch,
}

impl LlamaProcess {
    /// Spawn the engine.
    #[instrument(skip_all, fields(binary = %launch.binary, port = launch.port))]
    pub fn start(launch: LlamaLaunch) -> Result<Self, GatewayError> {
        info!(model = %launch.model_path.display(), "Starting inference engine");

        let process = Command::new(&launch.binary)
            .args(launch.args())
            .stdin(Stdio::null())
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit())
            .spawn()
            .map_err(|e| {
                GatewayError::new(GatewayErrorKind::ServerStartFailed(format!(
                    "Failed to spawn {}: {}. Make sure it's installed.",
                    launch.binary, e
                )))
            })?;

        debug!("Engine process spawned with PID: {:?}", process.id());
        Ok(Self { process, launch })
    }

    /// Poll `/health` until the engine has loaded its model.
    #[instrument(skip(self))]
    pub async fn wait_until_ready(&self, timeout: Duration) -> Result<(), GatewayError> {
        info!("Waiting for engine to be ready (timeout: {:?})", timeout);

        let start = std::time::Instant::now();
        let client = reqwest::Client::new();
        let health_url = format!("{}/health", self.launch.base_url());

        loop {
            if start.elapsed() > timeout {
                return Err(GatewayError::new(GatewayErrorKind::ServerStartFailed(
                    format!("Engine did not become ready within {:?}", timeout),
                )));
            }

            match client.get(&health_url).send().await {
                Ok(response) if response.status().is_success() => {
                    info!("Engine is ready");
                    return Ok(());
                }
                Ok(response) => {
                    debug!("Engine health check returned status: {}", response.status());
                }
                Err(e) => {
                    debug!("Engine not ready yet: {}", e);
                }
            }

            sleep(Duration::from_millis(500)).await;
        }
    }

    /// Launch settings this process was started with.
    pub fn launch(&self) -> &LlamaLaunch {
        &self.launch
    }

    /// Kill the engine and reap it.
    #[instrument(skip(self))]
    pub fn stop(mut self) -> Result<(), GatewayError> {
        info!("Stopping inference engine");

        self.process.kill().map_err(|e| {
            GatewayError::new(GatewayErrorKind::ServerStopFailed(format!(
                "Failed to stop engine: {}",
                e
            )))
        })?;

        self.process.wait().map_err(|e| {
            GatewayError::new(GatewayErrorKind::ServerStopFailed(format!(
                "Failed to wait for engine shutdown: {}",
                e
            )))
        })?;

        info!("Engine stopped");
        Ok(())
    }
}

impl Drop for LlamaProcess {
    fn drop(&mut self) {
        if let Ok(None) = self.process.try_wait() {
            warn!("LlamaProcess dropped, killing engine process");
            let _ = self.process.kill();
            let _ = self.process.wait();
        }
    }
}
