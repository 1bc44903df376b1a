//! MCP stdio wire codec
//!
//! The stdio transport frames each JSON-RPC message as a single line:
//! ```text
//! {"jsonrpc":"2.0","id":1,"method":"tools/list"}\n
//! ```
//! Messages must not contain embedded newlines.

use std::io;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};

use crate::common::Error;

/// Upper bound on a single message; anything larger is treated as a broken stream
const MAX_MESSAGE_BYTES: usize = 16 * 1024 * 1024;

/// Read one MCP message from the stream
///
/// Bytes of an unfinished line are kept in `pending`, so a read that is
/// cancelled (e.g. by a request timeout) resumes mid-line on the next call.
/// Blank lines are skipped. End of stream means the server went away.
pub async fn read_message<R: AsyncBufRead + Unpin>(
    reader: &mut R,
    pending: &mut Vec<u8>,
) -> Result<String, Error> {
    loop {
        let available = reader.fill_buf().await.map_err(|e| {
            if e.kind() == io::ErrorKind::UnexpectedEof {
                Error::ServerExited
            } else {
                Error::Io(e)
            }
        })?;

        if available.is_empty() {
            return Err(Error::ServerExited);
        }

        let newline = available.iter().position(|&b| b == b'\n');
        let take = newline.map_or(available.len(), |i| i + 1);

        // Sanity check before buffering more
        if pending.len() + take > MAX_MESSAGE_BYTES {
            let size = pending.len() + take;
            pending.clear();
            return Err(Error::Protocol(format!(
                "Message too large: {} bytes without a newline (limit {})",
                size, MAX_MESSAGE_BYTES
            )));
        }

        pending.extend_from_slice(&available[..take]);
        reader.consume(take);

        if newline.is_none() {
            continue;
        }

        let line = std::mem::take(pending);
        let line = String::from_utf8(line)
            .map_err(|e| Error::Protocol(format!("Message is not valid UTF-8: {}", e)))?;

        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }

        return Ok(trimmed.to_string());
    }
}

/// Write one MCP message to the stream, terminated by a newline
pub async fn write_message<W: AsyncWrite + Unpin>(writer: &mut W, json: &str) -> Result<(), Error> {
    if json.contains('\n') {
        return Err(Error::Protocol(
            "Outgoing message contains an embedded newline".to_string(),
        ));
    }

    writer.write_all(json.as_bytes()).await?;
    writer.write_all(b"\n").await?;
    writer.flush().await?;

    Ok(())
}
