//! Server engine: delegates rendering to a local HTTP service.
//!
//! The engine POSTs the source text to `<endpoint>/render/<flag>` and treats
//! the response body as the artifact. It can optionally own the server
//! process: given a launch command, `render` starts the server on first use,
//! and `start`/`stop` manage its lifetime. Both lifecycle calls are
//! idempotent, so tearing down an engine that never started is safe.

use std::net::TcpStream;
use std::process::{Child, Command, Stdio};
use std::sync::Mutex;
use std::time::{Duration, Instant};

use tracing::{debug, warn};
use url::Url;

use crate::engine::command::CommandLine;
use crate::engine::{Engine, RenderRequest, Rendered};
use crate::error::{Error, Result};

const DEFAULT_READY_TIMEOUT: Duration = Duration::from_secs(10);
const READY_POLL_INTERVAL: Duration = Duration::from_millis(50);

#[derive(Debug)]
pub struct ServerEngine {
    endpoint: Url,
    launch: Option<CommandLine>,
    ready_timeout: Duration,
    child: Mutex<Option<Child>>,
}

impl ServerEngine {
    /// Engine talking to an already running server at `endpoint`.
    pub fn new(endpoint: Url) -> Self {
        Self {
            endpoint,
            launch: None,
            ready_timeout: DEFAULT_READY_TIMEOUT,
            child: Mutex::new(None),
        }
    }

    /// Parses `endpoint` and builds an engine for it.
    pub fn connect(endpoint: &str) -> Result<Self> {
        let url = Url::parse(endpoint).map_err(|e| Error::Server {
            message: format!("invalid server endpoint `{endpoint}`: {e}"),
        })?;
        Ok(Self::new(url))
    }

    /// Command used to spawn the server process when the engine manages it.
    pub fn with_launch_command(mut self, command: CommandLine) -> Self {
        self.launch = Some(command);
        self
    }

    /// How long `start` waits for the endpoint to accept TCP connections.
    ///
    /// A zero timeout disables the readiness wait entirely.
    pub fn with_ready_timeout(mut self, timeout: Duration) -> Self {
        self.ready_timeout = timeout;
        self
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    /// Starts the managed server process. No-op when already running.
    pub fn start(&self) -> Result<()> {
        {
            let mut slot = self.lock_child();
            if slot.is_some() {
                return Ok(());
            }
            let Some(launch) = &self.launch else {
                return Err(Error::Server {
                    message: "no launch command configured for this server engine".to_string(),
                });
            };
            debug!(command = %launch, "starting render server");
            let child = Command::new(&launch.program)
                .args(&launch.args)
                .stdin(Stdio::null())
                .stdout(Stdio::null())
                .stderr(Stdio::null())
                .spawn()?;
            *slot = Some(child);
        }
        // Lock released: the readiness probe may call stop() on failure.
        self.wait_ready()
    }

    /// Stops the managed server process. No-op when not running.
    pub fn stop(&self) -> Result<()> {
        let mut slot = self.lock_child();
        let Some(mut child) = slot.take() else {
            return Ok(());
        };
        debug!("stopping render server");
        if let Err(e) = child.kill() {
            warn!(error = %e, "failed to kill render server process");
        }
        // Reap so the child and its listening socket are fully released.
        let _ = child.wait();
        Ok(())
    }

    fn lock_child(&self) -> std::sync::MutexGuard<'_, Option<Child>> {
        self.child
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn wait_ready(&self) -> Result<()> {
        if self.ready_timeout.is_zero() {
            return Ok(());
        }
        let host = self.endpoint.host_str().unwrap_or("127.0.0.1").to_string();
        let port = self.endpoint.port_or_known_default().unwrap_or(80);
        let deadline = Instant::now() + self.ready_timeout;
        loop {
            match TcpStream::connect((host.as_str(), port)) {
                Ok(_) => return Ok(()),
                Err(e) => {
                    if Instant::now() >= deadline {
                        let _ = self.stop();
                        return Err(Error::Server {
                            message: format!(
                                "server at {} did not accept connections within {:?}: {e}",
                                self.endpoint, self.ready_timeout
                            ),
                        });
                    }
                    std::thread::sleep(READY_POLL_INTERVAL);
                }
            }
        }
    }

    fn render_url(&self, flag: &str) -> Result<Url> {
        self.endpoint
            .join(&format!("render/{flag}"))
            .map_err(|e| Error::Server {
                message: format!("cannot build render URL from {}: {e}", self.endpoint),
            })
    }
}

impl Engine for ServerEngine {
    fn render(&self, request: &RenderRequest) -> Result<Rendered> {
        if self.launch.is_some() {
            self.start()?;
        }
        let url = self.render_url(request.format.flag())?;
        let response = ureq::post(url.as_str())
            .header("Content-Type", "text/plain")
            .send(request.source.as_bytes())
            .map_err(|e| Error::Server {
                message: format!("POST {url} failed: {e}"),
            })?;
        let bytes = response
            .into_body()
            .read_to_vec()
            .map_err(|e| Error::Server {
                message: format!("reading response from {url} failed: {e}"),
            })?;
        Ok(Rendered::new(request.format, bytes))
    }
}

impl Drop for ServerEngine {
    fn drop(&mut self) {
        let _ = self.stop();
    }
}
