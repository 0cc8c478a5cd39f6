//! # Printer Transport Layer
//!
//! Raw-9100 TCP transport for ZPL printers. Each print opens a fresh
//! connection, writes the whole payload, and closes — there is no pooled
//! or long-lived printer connection. Handlers run sends on the blocking
//! pool; the caller's timeout bounds the whole lifecycle.

use std::io::Write;
use std::net::{TcpStream, ToSocketAddrs};
use std::time::Duration;

use crate::error::ZplgridError;
use crate::printer::Printer;

/// One-shot TCP sender for a configured printer.
#[derive(Debug, Clone)]
pub struct TcpTransport {
    host: String,
    port: u16,
    timeout: Duration,
}

impl TcpTransport {
    pub fn new(host: impl Into<String>, port: u16, timeout: Duration) -> Self {
        Self { host: host.into(), port, timeout }
    }

    pub fn for_printer(printer: &Printer) -> Self {
        Self::new(
            printer.connection.host.clone(),
            printer.connection.port,
            Duration::from_millis(printer.connection.timeout_ms.max(100)),
        )
    }

    /// Connect, send the payload, close. Returns the byte count written.
    pub fn send(&self, payload: &[u8]) -> Result<usize, ZplgridError> {
        let address = format!("{}:{}", self.host, self.port);
        let resolved = address
            .to_socket_addrs()
            .map_err(|e| ZplgridError::Transport(format!("resolve {}: {}", address, e)))?
            .next()
            .ok_or_else(|| ZplgridError::Transport(format!("no address for {}", address)))?;

        let mut stream = TcpStream::connect_timeout(&resolved, self.timeout)
            .map_err(|e| ZplgridError::Transport(format!("connect {}: {}", address, e)))?;
        stream
            .set_write_timeout(Some(self.timeout))
            .map_err(|e| ZplgridError::Transport(e.to_string()))?;
        stream
            .write_all(payload)
            .map_err(|e| ZplgridError::Transport(format!("send to {}: {}", address, e)))?;
        stream
            .shutdown(std::net::Shutdown::Both)
            .map_err(|e| ZplgridError::Transport(e.to_string()))?;

        tracing::info!(printer = %address, bytes = payload.len(), "label sent");
        Ok(payload.len())
    }
}
