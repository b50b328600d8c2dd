use shared::ipc::{Command, Response};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::UnixListener;
use tokio::sync::{watch, Mutex};
use tracing::{debug, error, info, warn};

use crate::rate_limit::CommandRateLimiter;
use crate::state::DaemonState;

const MAX_REQUEST_BYTES: usize = 4096;

pub struct DaemonServer {
    socket_path: PathBuf,
    state: Arc<Mutex<DaemonState>>,
    limiter: Arc<CommandRateLimiter>,
}

impl DaemonServer {
    pub fn new(
        socket_path: PathBuf,
        state: Arc<Mutex<DaemonState>>,
        limiter: CommandRateLimiter,
    ) -> Self {
        Self {
            socket_path,
            state,
            limiter: Arc::new(limiter),
        }
    }

    /// Serve until a quit utterance is routed or `shutdown` fires.
    pub async fn run(&self, mut shutdown: watch::Receiver<bool>) -> anyhow::Result<()> {
        let socket_path = self.socket_path.clone();

        if socket_path.exists() {
            std::fs::remove_file(&socket_path)?;
        }

        info!("Starting socket server at {}", socket_path.display());

        let listener = UnixListener::bind(&socket_path)?;
        debug!("Listener bound successfully");

        let (quit_tx, mut quit_rx) = watch::channel(false);

        loop {
            tokio::select! {
                accepted = listener.accept() => match accepted {
                    Ok((stream, _addr)) => {
                        debug!("Connection accepted");
                        let state = Arc::clone(&self.state);
                        let limiter = Arc::clone(&self.limiter);
                        let quit_tx = quit_tx.clone();
                        tokio::spawn(async move {
                            if let Err(e) = Self::handle_connection(state, limiter, quit_tx, stream).await {
                                error!("Error handling connection: {}", e);
                            }
                        });
                    }
                    Err(e) => {
                        error!("Error accepting connection: {}", e);
                    }
                },
                _ = quit_rx.changed() => {
                    info!("Quit command routed, stopping server");
                    break;
                }
                _ = shutdown.changed() => {
                    info!("Shutdown requested, stopping server");
                    break;
                }
            }
        }

        self.state.lock().await.shutdown();
        Ok(())
    }

    async fn handle_connection(
        state: Arc<Mutex<DaemonState>>,
        limiter: Arc<CommandRateLimiter>,
        quit_tx: watch::Sender<bool>,
        mut stream: tokio::net::UnixStream,
    ) -> anyhow::Result<()> {
        let mut buffer = vec![0u8; MAX_REQUEST_BYTES];
        let n = stream.read(&mut buffer).await?;

        if n == 0 {
            return Ok(());
        }

        buffer.truncate(n);

        let response = match serde_json::from_slice::<Command>(&buffer) {
            Ok(command) if limiter.check() => {
                debug!("Received command: {:?}", command);
                let response = Self::execute(&state, command).await;
                if response == Response::Continue(false) {
                    let _ = quit_tx.send(true);
                }
                response
            }
            Ok(command) => {
                warn!("Rate limited command: {:?}", command);
                Response::Error("Too many commands, slow down".to_string())
            }
            Err(e) => Response::Error(format!("Invalid command: {}", e)),
        };

        let response_json = serde_json::to_vec(&response)?;
        stream.write_all(&response_json).await?;

        debug!("Sent response: {:?}", response);

        Ok(())
    }

    /// Run one command against the shared state. The state lock is held for
    /// the whole command, so utterances are routed strictly one at a time.
    pub async fn execute(state: &Mutex<DaemonState>, command: Command) -> Response {
        let mut state = state.lock().await;

        match command {
            Command::Process(text) => Response::Continue(state.process(&text).await),
            Command::Status => Response::Status(state.get_status()),
            Command::SetGameMode(enabled) => {
                state.set_game_mode(enabled);
                Response::Ok
            }
            Command::Train { expected, heard } => {
                if state.train(&expected, &heard) {
                    Response::Ok
                } else {
                    Response::Error(format!(
                        "No correction found between '{}' and '{}'",
                        expected, heard
                    ))
                }
            }
            Command::Forget(token) => {
                if state.forget(&token) {
                    Response::Ok
                } else {
                    Response::Error(format!("No pattern for '{}'", token))
                }
            }
            Command::ListPatterns => Response::Patterns(state.patterns()),
            Command::Corrections(text) => Response::Corrections(state.corrections(&text)),
            Command::ClearCache => {
                state.clear_cache();
                Response::Ok
            }
        }
    }
}

impl Drop for DaemonServer {
    fn drop(&mut self) {
        if self.socket_path.exists() {
            let _ = std::fs::remove_file(&self.socket_path);
        }
    }
}
