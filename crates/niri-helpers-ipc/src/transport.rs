//! Socket transport for one-shot niri requests
//!
//! Every request opens a fresh connection to `$NIRI_SOCKET`, writes one JSON
//! line, reads one reply line and drops the connection. The whole exchange is
//! bounded by a short timeout; callers treat a timeout like any other
//! transport failure.

use std::path::{Path, PathBuf};
use std::time::Duration;

use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::UnixStream;

use super::NiriError;

/// Environment variable name for the niri socket path
const NIRI_SOCKET_ENV: &str = "NIRI_SOCKET";

/// Upper bound for a single request/reply exchange
pub const REQUEST_TIMEOUT: Duration = Duration::from_millis(500);

/// Initial capacity of the reply buffer
const READ_BUFFER_SIZE: usize = 8192;

/// Discover the niri IPC socket path from the environment
///
/// Reads the `NIRI_SOCKET` environment variable and validates that
/// the path exists. This is the standard way niri exposes its socket.
///
/// # Errors
///
/// Returns `NiriError::SocketNotSet` if `$NIRI_SOCKET` is not set.
/// Returns `NiriError::SocketNotFound` if the path doesn't exist.
pub fn get_socket_path() -> Result<PathBuf, NiriError> {
    let socket_path_str = std::env::var(NIRI_SOCKET_ENV).map_err(|_| NiriError::SocketNotSet)?;

    let socket_path = PathBuf::from(&socket_path_str);

    if !socket_path.exists() {
        return Err(NiriError::SocketNotFound { path: socket_path });
    }

    Ok(socket_path)
}

/// Open a stream connection to the niri socket
pub(crate) async fn connect_socket(path: &Path) -> Result<UnixStream, NiriError> {
    UnixStream::connect(path)
        .await
        .map_err(|e| NiriError::ConnectionFailed {
            path: path.to_path_buf(),
            source: e,
        })
}

/// A way of delivering one request line to niri and getting one reply line back
///
/// The production implementation is [`SocketTransport`]. Tests substitute a
/// stub that records what would have been sent.
#[allow(async_fn_in_trait)]
pub trait Transport {
    /// Send `payload` (without trailing newline) and return the raw reply line
    async fn round_trip(&self, payload: &str) -> Result<String, NiriError>;
}

/// Transport over niri's Unix domain socket
#[derive(Debug, Clone)]
pub struct SocketTransport {
    socket_path: PathBuf,
    timeout: Duration,
}

impl SocketTransport {
    /// Create a transport for an explicit socket path
    pub fn new(socket_path: impl Into<PathBuf>) -> Self {
        Self {
            socket_path: socket_path.into(),
            timeout: REQUEST_TIMEOUT,
        }
    }

    /// Create a transport for the socket named by `$NIRI_SOCKET`
    ///
    /// # Errors
    ///
    /// Returns `NiriError::SocketNotSet` or `NiriError::SocketNotFound` from
    /// [`get_socket_path`]. No connection is attempted here.
    pub fn from_env() -> Result<Self, NiriError> {
        Ok(Self::new(get_socket_path()?))
    }

    /// Override the per-request timeout
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn socket_path(&self) -> &Path {
        &self.socket_path
    }

    async fn exchange(&self, payload: &str) -> Result<String, NiriError> {
        let mut socket = connect_socket(&self.socket_path).await?;

        socket
            .write_all(payload.as_bytes())
            .await
            .map_err(NiriError::SendFailed)?;
        socket.write_all(b"\n").await.map_err(NiriError::SendFailed)?;
        socket.flush().await.map_err(NiriError::SendFailed)?;

        let mut reader = BufReader::with_capacity(READ_BUFFER_SIZE, socket);
        let mut response_line = String::new();

        let bytes_read = reader
            .read_line(&mut response_line)
            .await
            .map_err(NiriError::ReceiveFailed)?;

        if bytes_read == 0 {
            return Err(NiriError::ConnectionClosed);
        }

        Ok(response_line)
    }
}

impl Transport for SocketTransport {
    async fn round_trip(&self, payload: &str) -> Result<String, NiriError> {
        tokio::time::timeout(self.timeout, self.exchange(payload))
            .await
            .map_err(|_| NiriError::Timeout(self.timeout))?
    }
}
