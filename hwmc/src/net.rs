//! Listener, runtime and line-reading plumbing shared by the TCP servers.
//!
//! Each server binds synchronously at construction, so a port conflict is
//! reported before any thread starts, then serves every connection from one
//! current-thread runtime on its own OS thread.

use std::io;
use std::net::{SocketAddr, TcpListener};

use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncReadExt};
use tokio::runtime::{Builder, Runtime};

use crate::error::ServerError;

/// Bind a non-blocking listener.
pub fn bind(addr: &str) -> Result<TcpListener, ServerError> {
    let listener = TcpListener::bind(addr).map_err(|source| ServerError::Bind {
        addr: addr.to_string(),
        source,
    })?;
    listener
        .set_nonblocking(true)
        .map_err(|source| ServerError::Bind {
            addr: addr.to_string(),
            source,
        })?;
    Ok(listener)
}

/// Address actually bound, or the unspecified address if unknown.
pub fn local_addr(listener: &TcpListener) -> SocketAddr {
    listener
        .local_addr()
        .unwrap_or_else(|_| SocketAddr::from(([0, 0, 0, 0], 0)))
}

/// Single-threaded runtime for one server.
pub fn runtime() -> Result<Runtime, ServerError> {
    Builder::new_current_thread()
        .enable_all()
        .build()
        .map_err(ServerError::Runtime)
}

/// Longest accepted client line, terminator included.
pub const MAX_LINE_LEN: u64 = 1024;

/// Read one newline-terminated line, without the terminator.
///
/// `Ok(None)` at end of stream. A line longer than [`MAX_LINE_LEN`] is an
/// `InvalidData` error; the caller drops the connection.
pub async fn read_line<R>(reader: &mut R) -> io::Result<Option<String>>
where
    R: AsyncBufRead + Unpin,
{
    let mut buf = Vec::new();
    let n = (&mut *reader)
        .take(MAX_LINE_LEN)
        .read_until(b'\n', &mut buf)
        .await?;
    if n == 0 {
        return Ok(None);
    }
    if buf.last() == Some(&b'\n') {
        buf.pop();
        if buf.last() == Some(&b'\r') {
            buf.pop();
        }
    } else if n as u64 == MAX_LINE_LEN {
        return Err(io::Error::new(
            io::ErrorKind::InvalidData,
            format!("line longer than {MAX_LINE_LEN} bytes"),
        ));
    }
    Ok(Some(String::from_utf8_lossy(&buf).into_owned()))
}
