//! Length-prefixed JSON framing.
//!
//! Every message is a 10-byte ASCII decimal length, zero padded, followed
//! by exactly that many bytes of JSON. The same framing runs in both
//! directions, so [`Framed`] serves clients and plugin sessions alike.

use std::io::{self, Read, Write};
use std::sync::Arc;

use serde_json::Value;
use stormgr_types::{ErrorCode, StorageError};
use thiserror::Error;

/// Width of the decimal length header in bytes.
pub const HEADER_LEN: usize = 10;

/// Largest body accepted or produced, in bytes.
pub const MAX_FRAME_BYTES: usize = 32 * 1024 * 1024;

/// Failures while reading or writing frames.
#[derive(Debug, Clone, Error)]
pub enum FrameError {
    /// The peer closed the stream cleanly between frames.
    #[error("connection closed by peer")]
    Closed,

    /// The stream ended part-way through a frame.
    #[error("stream ended after {received} of {expected} bytes")]
    Truncated {
        /// Bytes the frame needed.
        expected: usize,
        /// Bytes actually read.
        received: usize,
    },

    /// No data arrived within the configured read timeout.
    #[error("timed out waiting for the peer")]
    TimedOut,

    /// Reading or writing the socket failed.
    #[error("socket I/O failed: {source}")]
    Io {
        /// Underlying I/O error.
        #[source]
        source: Arc<io::Error>,
    },

    /// The header was not a zero-padded decimal length.
    #[error("malformed frame header {header:?}")]
    InvalidHeader {
        /// Header bytes, lossily decoded.
        header: String,
    },

    /// The announced body exceeds [`MAX_FRAME_BYTES`].
    #[error("frame of {length} bytes exceeds the {limit} byte limit")]
    TooLarge {
        /// Announced or attempted body length.
        length: usize,
        /// Configured limit.
        limit: usize,
    },

    /// The body was not valid JSON or could not be encoded.
    #[error("frame body is not valid JSON: {source}")]
    Json {
        /// Underlying codec error.
        #[source]
        source: Arc<serde_json::Error>,
    },

    /// The JSON did not have the envelope layout.
    #[error("malformed message envelope: {message}")]
    Envelope {
        /// Description of the violation.
        message: String,
    },
}

impl FrameError {
    /// Builds an envelope violation.
    #[must_use]
    pub fn envelope(message: impl Into<String>) -> Self {
        Self::Envelope {
            message: message.into(),
        }
    }

    /// Reports whether the failure came from the byte stream rather than
    /// from what the peer sent.
    #[must_use]
    pub const fn is_transport(&self) -> bool {
        matches!(
            self,
            Self::Closed | Self::Truncated { .. } | Self::TimedOut | Self::Io { .. }
        )
    }
}

impl From<io::Error> for FrameError {
    fn from(source: io::Error) -> Self {
        match source.kind() {
            io::ErrorKind::WouldBlock | io::ErrorKind::TimedOut => Self::TimedOut,
            _ => Self::Io {
                source: Arc::new(source),
            },
        }
    }
}

impl From<serde_json::Error> for FrameError {
    fn from(source: serde_json::Error) -> Self {
        Self::Json {
            source: Arc::new(source),
        }
    }
}

impl From<FrameError> for StorageError {
    fn from(error: FrameError) -> Self {
        let code = match &error {
            FrameError::TimedOut => ErrorCode::Timeout,
            other if other.is_transport() => ErrorCode::TransportError,
            _ => ErrorCode::ProtocolError,
        };
        Self::new(code, error.to_string())
    }
}

/// Writes one frame holding `body`.
///
/// # Errors
///
/// Fails with [`FrameError::TooLarge`] for oversized bodies and with
/// [`FrameError::Io`] when the stream rejects the write.
pub fn write_frame<W: Write>(writer: &mut W, body: &[u8]) -> Result<(), FrameError> {
    if body.len() > MAX_FRAME_BYTES {
        return Err(FrameError::TooLarge {
            length: body.len(),
            limit: MAX_FRAME_BYTES,
        });
    }
    let mut frame = format!("{:0width$}", body.len(), width = HEADER_LEN).into_bytes();
    frame.extend_from_slice(body);
    writer.write_all(&frame)?;
    writer.flush()?;
    Ok(())
}

/// Reads one frame body.
///
/// # Errors
///
/// Returns [`FrameError::Closed`] when the stream ends cleanly before a
/// header, and the structured variants for every other failure.
pub fn read_frame<R: Read>(reader: &mut R) -> Result<Vec<u8>, FrameError> {
    let mut header = [0_u8; HEADER_LEN];
    let filled = fill(reader, &mut header)?;
    if filled == 0 {
        return Err(FrameError::Closed);
    }
    if filled < HEADER_LEN {
        return Err(FrameError::Truncated {
            expected: HEADER_LEN,
            received: filled,
        });
    }
    let length = parse_header(&header)?;
    let mut body = vec![0_u8; length];
    let received = fill(reader, &mut body)?;
    if received < length {
        return Err(FrameError::Truncated {
            expected: length,
            received,
        });
    }
    Ok(body)
}

fn parse_header(header: &[u8; HEADER_LEN]) -> Result<usize, FrameError> {
    let invalid = || FrameError::InvalidHeader {
        header: String::from_utf8_lossy(header).into_owned(),
    };
    if !header.iter().all(u8::is_ascii_digit) {
        return Err(invalid());
    }
    let text = std::str::from_utf8(header).map_err(|_| invalid())?;
    let length: usize = text.parse().map_err(|_| invalid())?;
    if length > MAX_FRAME_BYTES {
        return Err(FrameError::TooLarge {
            length,
            limit: MAX_FRAME_BYTES,
        });
    }
    Ok(length)
}

// Reads until `buf` is full or the stream ends; returns the bytes read.
fn fill<R: Read>(reader: &mut R, buf: &mut [u8]) -> Result<usize, FrameError> {
    let mut filled = 0;
    while let Some(rest) = buf.get_mut(filled..) {
        if rest.is_empty() {
            break;
        }
        match reader.read(rest) {
            Ok(0) => break,
            Ok(read) => filled += read,
            Err(error) if error.kind() == io::ErrorKind::Interrupted => {}
            Err(error) => return Err(error.into()),
        }
    }
    Ok(filled)
}

/// JSON message stream over any byte stream.
#[derive(Debug)]
pub struct Framed<S> {
    stream: S,
}

impl<S: Read + Write> Framed<S> {
    /// Wraps `stream`.
    #[must_use]
    pub const fn new(stream: S) -> Self {
        Self { stream }
    }

    /// Serializes `value` into one frame.
    ///
    /// # Errors
    ///
    /// Propagates encoding and write failures.
    pub fn send(&mut self, value: &Value) -> Result<(), FrameError> {
        let body = serde_json::to_vec(value)?;
        write_frame(&mut self.stream, &body)
    }

    /// Reads and decodes one frame.
    ///
    /// # Errors
    ///
    /// Propagates read failures, including [`FrameError::Closed`], and
    /// returns [`FrameError::Json`] for undecodable bodies.
    pub fn recv(&mut self) -> Result<Value, FrameError> {
        let body = read_frame(&mut self.stream)?;
        Ok(serde_json::from_slice(&body)?)
    }

    /// Borrows the underlying stream.
    pub const fn get_ref(&self) -> &S {
        &self.stream
    }

    /// Unwraps the underlying stream.
    pub fn into_inner(self) -> S {
        self.stream
    }
}
