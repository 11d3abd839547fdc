//! JSON-RPC framing codec for the stdio transport.
//!
//! LSP uses `Content-Length: N\r\n\r\n{json}` framing. [`MessageReader`]
//! and [`MessageWriter`] handle the framing; they know nothing about
//! message semantics.

use anyhow::{Context, Result, bail};
use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt, BufReader};

/// Maximum frame size (4 MiB) to prevent unbounded memory allocation.
const MAX_FRAME_BYTES: u64 = 4 * 1024 * 1024;

/// Reads framed JSON-RPC messages from an async reader.
///
/// Header names are matched case-insensitively; the only header that is
/// interpreted is `Content-Length`. Absent framing — EOF before the
/// header block completes, a missing length header, or a non-positive
/// length — yields `Ok(None)`, which the session loop treats as the
/// termination signal rather than an error.
pub struct MessageReader<R> {
    reader: BufReader<R>,
}

impl<R: AsyncRead + Unpin> MessageReader<R> {
    pub fn new(reader: R) -> Self {
        Self {
            reader: BufReader::new(reader),
        }
    }

    /// Read the next message, or `None` when the transport has nothing
    /// more to offer.
    ///
    /// `Err` is reserved for desynchronization: a body shorter than its
    /// declared length, an oversized frame, or a body that is not JSON.
    pub async fn read_message(&mut self) -> Result<Option<serde_json::Value>> {
        let Some(content_length) = self.read_headers().await? else {
            return Ok(None);
        };

        if content_length > MAX_FRAME_BYTES {
            bail!("Content-Length {content_length} exceeds maximum {MAX_FRAME_BYTES}");
        }

        let mut body = vec![0u8; content_length as usize];
        self.reader
            .read_exact(&mut body)
            .await
            .context("reading frame body")?;

        let value = serde_json::from_slice(&body).context("parsing JSON-RPC frame")?;
        Ok(Some(value))
    }

    /// Consume header lines until the empty separator line.
    ///
    /// Returns the parsed `Content-Length`, or `None` when no usable
    /// frame follows (EOF, missing header, unparseable or non-positive
    /// length).
    async fn read_headers(&mut self) -> Result<Option<u64>> {
        let mut content_length: Option<u64> = None;
        let mut line = String::new();

        loop {
            line.clear();
            let bytes_read = self
                .reader
                .read_line(&mut line)
                .await
                .context("reading header line")?;

            if bytes_read == 0 {
                // EOF before the header block completed.
                return Ok(None);
            }

            let trimmed = line.trim();
            if trimmed.is_empty() {
                break;
            }

            if let Some((name, value)) = trimmed.split_once(':')
                && name.trim().eq_ignore_ascii_case("Content-Length")
            {
                content_length = value.trim().parse::<u64>().ok();
            }
            // Other headers (e.g. Content-Type) are ignored.
        }

        match content_length {
            Some(len) if len > 0 => Ok(Some(len)),
            _ => Ok(None),
        }
    }
}

/// Writes framed JSON-RPC messages to an async writer.
pub struct MessageWriter<W> {
    writer: W,
}

impl<W: AsyncWrite + Unpin> MessageWriter<W> {
    pub fn new(writer: W) -> Self {
        Self { writer }
    }

    /// Serialize `msg` and emit it behind a `Content-Length` header.
    ///
    /// The header carries the byte length of the encoded payload, not
    /// the character count — clients misframe everything that follows
    /// if these diverge on multi-byte text.
    pub async fn write_message(&mut self, msg: &serde_json::Value) -> Result<()> {
        let body = serde_json::to_string(msg).context("serializing JSON-RPC frame")?;
        let header = format!("Content-Length: {}\r\n\r\n", body.len());

        self.writer
            .write_all(header.as_bytes())
            .await
            .context("writing frame header")?;
        self.writer
            .write_all(body.as_bytes())
            .await
            .context("writing frame body")?;
        self.writer.flush().await.context("flushing frame")?;

        Ok(())
    }
}
