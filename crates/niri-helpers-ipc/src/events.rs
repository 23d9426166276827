//! Subscription to niri's event stream
//!
//! The stream lives on its own socket connection: the client writes the bare
//! string `"EventStream"`, closes its write half and gets `{"Ok":"Handled"}` back.
//! After that niri pushes one JSON object per line until either side hangs up.
//!
//! Events carry no tag field. Each line is an object with exactly one key
//! naming the event kind, e.g. `{"WindowClosed":{"id":7}}`. Kinds the helpers
//! do not act on decode to [`Event::Unknown`] so newer niri versions keep
//! working.

use std::path::Path;
use std::time::Duration;

use serde::Deserialize;
use serde_json::Value;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::unix::OwnedReadHalf;
use tokio::time::sleep;
use tokio_stream::wrappers::LinesStream;
use tokio_stream::StreamExt;
use tracing::{debug, info, warn};

use super::client::parse_reply;
use super::error::NiriError;
use super::transport::{connect_socket, get_socket_path};
use super::types::Window;

/// Retries used by the float daemon when niri is not up yet
pub const DEFAULT_MAX_RETRIES: u32 = 5;

const FIRST_BACKOFF: Duration = Duration::from_millis(500);
const MAX_BACKOFF: Duration = Duration::from_secs(10);

/// A decoded compositor event
#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    /// Full window list; replaces everything known so far
    WindowsChanged { windows: Vec<Window> },

    /// A window was opened or one of its properties changed
    WindowOpenedOrChanged { window: Window },

    /// A window was closed
    WindowClosed { id: u64 },

    /// Any event kind not listed above
    Unknown { kind: String },
}

#[derive(Deserialize)]
struct WindowsChanged {
    windows: Vec<Window>,
}

#[derive(Deserialize)]
struct WindowOpenedOrChanged {
    window: Window,
}

#[derive(Deserialize)]
struct WindowClosed {
    id: u64,
}

impl Event {
    /// Decode one line of the event stream
    ///
    /// # Errors
    ///
    /// Returns `NiriError::DeserializeFailed` if the line is not valid JSON or
    /// a recognised event has a malformed payload, and
    /// `NiriError::UnexpectedReply` if the line is not a JSON object.
    pub fn parse(line: &str) -> Result<Self, NiriError> {
        let value: Value = serde_json::from_str(line).map_err(NiriError::DeserializeFailed)?;
        Self::from_value(value)
    }

    /// Decode an already parsed event object by the key it carries
    pub fn from_value(value: Value) -> Result<Self, NiriError> {
        let Value::Object(mut object) = value else {
            return Err(NiriError::UnexpectedReply {
                raw: value.to_string(),
            });
        };

        if let Some(payload) = object.remove("WindowsChanged") {
            let WindowsChanged { windows } =
                serde_json::from_value(payload).map_err(NiriError::DeserializeFailed)?;
            return Ok(Event::WindowsChanged { windows });
        }

        if let Some(payload) = object.remove("WindowOpenedOrChanged") {
            let WindowOpenedOrChanged { window } =
                serde_json::from_value(payload).map_err(NiriError::DeserializeFailed)?;
            return Ok(Event::WindowOpenedOrChanged { window });
        }

        if let Some(payload) = object.remove("WindowClosed") {
            let WindowClosed { id } =
                serde_json::from_value(payload).map_err(NiriError::DeserializeFailed)?;
            return Ok(Event::WindowClosed { id });
        }

        let kind = object.keys().next().cloned().unwrap_or_default();
        Ok(Event::Unknown { kind })
    }
}

/// Event stream for receiving real-time compositor events from niri
///
/// Generic over the line source so the consumer can be driven from an
/// in-memory buffer in tests; production code uses the socket read half.
///
/// # Example
///
/// ```ignore
/// let mut stream = EventStream::connect().await?;
/// while let Some(event) = stream.next_event().await {
///     println!("{:?}", event?);
/// }
/// ```
#[derive(Debug)]
pub struct EventStream<R = BufReader<OwnedReadHalf>> {
    lines: LinesStream<R>,
}

impl EventStream {
    /// Connect to `$NIRI_SOCKET` and subscribe to events
    ///
    /// # Errors
    ///
    /// Returns `NiriError::SocketNotSet` if `$NIRI_SOCKET` is not set, and any
    /// error from [`EventStream::connect_to`].
    pub async fn connect() -> Result<Self, NiriError> {
        let socket_path = get_socket_path()?;
        Self::connect_to(&socket_path).await
    }

    /// Connect to the given socket and subscribe to events
    ///
    /// Sends `"EventStream"`, shuts down the write half (no further requests
    /// are possible on this connection) and validates niri's `Ok` reply.
    ///
    /// # Errors
    ///
    /// Returns `NiriError::ConnectionFailed` if the connection fails,
    /// `NiriError::SendFailed`/`NiriError::ReceiveFailed` on I/O errors,
    /// `NiriError::ConnectionClosed` if niri hangs up before replying, and
    /// `NiriError::NiriError` if niri refuses the subscription.
    pub async fn connect_to(socket_path: &Path) -> Result<Self, NiriError> {
        let socket = connect_socket(socket_path).await?;

        let (read_half, mut write_half) = socket.into_split();

        // The shutdown below ends the frame, no newline needed
        let request = serde_json::to_vec("EventStream").map_err(NiriError::SerializeFailed)?;
        write_half
            .write_all(&request)
            .await
            .map_err(NiriError::SendFailed)?;
        write_half.shutdown().await.map_err(NiriError::SendFailed)?;

        let mut reader = BufReader::new(read_half);
        let mut response_line = String::new();
        if reader
            .read_line(&mut response_line)
            .await
            .map_err(NiriError::ReceiveFailed)?
            == 0
        {
            return Err(NiriError::ConnectionClosed);
        }

        parse_reply(&response_line)?;
        debug!("Niri event stream connected");

        Ok(Self::from_reader(reader))
    }

    /// Subscribe, retrying with a doubling backoff
    ///
    /// The daemon may start together with the compositor, before the socket
    /// accepts connections. The wait starts at 500ms and doubles up to 10s.
    /// `max_retries` of 0 means a single attempt.
    ///
    /// # Errors
    ///
    /// Returns `NiriError::SocketNotSet` immediately if `$NIRI_SOCKET` is not
    /// set, otherwise `NiriError::MaxRetriesExceeded` once all attempts fail.
    pub async fn connect_with_retry(max_retries: u32) -> Result<Self, NiriError> {
        let attempts = max_retries.saturating_add(1);
        let mut backoff = FIRST_BACKOFF;

        for attempt in 1..=attempts {
            let error = match Self::connect().await {
                Ok(stream) => {
                    if attempt > 1 {
                        info!(attempt, "Subscribed to niri events");
                    }
                    return Ok(stream);
                }
                // No amount of waiting brings the variable back
                Err(NiriError::SocketNotSet) => return Err(NiriError::SocketNotSet),
                Err(e) => e,
            };

            if attempt == attempts {
                warn!(attempts, error = %error, "Giving up on the niri event stream");
                break;
            }

            warn!(
                attempt,
                retry_in_ms = backoff.as_millis() as u64,
                error = %error,
                "Niri event stream unavailable"
            );
            sleep(backoff).await;
            backoff = (backoff * 2).min(MAX_BACKOFF);
        }

        Err(NiriError::MaxRetriesExceeded { attempts })
    }
}

impl<R: AsyncBufRead + Unpin> EventStream<R> {
    /// Wrap an already subscribed line source
    pub fn from_reader(reader: R) -> Self {
        Self {
            lines: LinesStream::new(reader.lines()),
        }
    }

    /// Read the next raw line
    ///
    /// Returns `None` once the stream is closed.
    pub async fn next_line(&mut self) -> Option<Result<String, NiriError>> {
        self.lines
            .next()
            .await
            .map(|line| line.map_err(NiriError::ReceiveFailed))
    }

    /// Read and decode the next event
    ///
    /// Returns `None` once the stream is closed. A decode error only affects
    /// the line it came from; the stream stays usable.
    pub async fn next_event(&mut self) -> Option<Result<Event, NiriError>> {
        let line = match self.next_line().await? {
            Ok(line) => line,
            Err(e) => return Some(Err(e)),
        };
        Some(Event::parse(&line))
    }
}
