use shared::ipc::{Command, IpcError, Response};
use std::path::PathBuf;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::UnixStream;
use tokio::time::{timeout, Duration};
use tracing::warn;

/// Timeout for connecting and writing.
const SOCKET_TIMEOUT: Duration = Duration::from_secs(5);

/// Routing an utterance may wait on the semantic service, so replies get longer.
const RESPONSE_TIMEOUT: Duration = Duration::from_secs(15);

/// Default daemon socket: XDG runtime directory, or /tmp/voxrouted.sock.
pub fn default_socket_path() -> PathBuf {
    match dirs::runtime_dir() {
        Some(runtime_dir) => runtime_dir.join("voxrouted.sock"),
        None => PathBuf::from("/tmp/voxrouted.sock"),
    }
}

pub struct DaemonClient {
    socket_path: PathBuf,
    response_timeout: Duration,
}

impl DaemonClient {
    pub fn new(socket_path: Option<PathBuf>) -> Self {
        Self {
            socket_path: socket_path.unwrap_or_else(default_socket_path),
            response_timeout: RESPONSE_TIMEOUT,
        }
    }

    pub fn with_response_timeout(mut self, response_timeout: Duration) -> Self {
        self.response_timeout = response_timeout;
        self
    }

    pub async fn send_command(&self, cmd: Command) -> Result<Response, IpcError> {
        let mut stream = match timeout(SOCKET_TIMEOUT, UnixStream::connect(&self.socket_path)).await {
            Ok(Ok(stream)) => stream,
            Ok(Err(e))
                if matches!(
                    e.kind(),
                    std::io::ErrorKind::NotFound | std::io::ErrorKind::ConnectionRefused
                ) =>
            {
                return Err(IpcError::ConnectionRefused);
            }
            Ok(Err(e)) => return Err(e.into()),
            Err(_) => {
                warn!(
                    "Connection timeout: failed to connect to daemon at {} within {:?}",
                    self.socket_path.display(),
                    SOCKET_TIMEOUT
                );
                return Err(IpcError::Timeout);
            }
        };

        let command_json = serde_json::to_vec(&cmd)?;

        match timeout(SOCKET_TIMEOUT, stream.write_all(&command_json)).await {
            Ok(result) => result?,
            Err(_) => {
                warn!("Write timeout: failed to send command to daemon within {:?}", SOCKET_TIMEOUT);
                return Err(IpcError::Timeout);
            }
        }

        // The daemon closes the connection after one response.
        let mut buffer = Vec::new();
        match timeout(self.response_timeout, stream.read_to_end(&mut buffer)).await {
            Ok(result) => {
                result?;
            }
            Err(_) => {
                warn!(
                    "Read timeout: no response from daemon within {:?}",
                    self.response_timeout
                );
                return Err(IpcError::Timeout);
            }
        }

        let response: Response = serde_json::from_slice(&buffer)?;
        Ok(response)
    }
}
