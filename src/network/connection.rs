//! Connection handling
//!
//! A single blocking TCP connection to the shard service.

use std::io::{BufReader, BufWriter, Read};
use std::net::{Shutdown, TcpStream, ToSocketAddrs};
use std::time::{Duration, Instant};

use crate::config::Config;
use crate::error::{CompassError, Result};
use crate::protocol::{read_frame, write_request, Frame, Request};

/// A blocking connection to the shard service
pub struct Connection {
    /// TCP stream reader (buffered for efficiency)
    reader: BufReader<TcpStream>,

    /// TCP stream writer (buffered for efficiency)
    writer: BufWriter<TcpStream>,

    /// Server address for logging
    server_addr: String,
}

impl Connection {
    /// Connect to the shard service
    ///
    /// Resolves the address, dials with the configured connect timeout,
    /// and applies read/write timeouts to the socket.
    pub fn connect(config: &Config) -> Result<Self> {
        let addr = config
            .server_addr
            .to_socket_addrs()
            .map_err(|e| {
                CompassError::Config(format!(
                    "Invalid server address {}: {}",
                    config.server_addr, e
                ))
            })?
            .next()
            .ok_or_else(|| {
                CompassError::Config(format!(
                    "Server address {} resolved to nothing",
                    config.server_addr
                ))
            })?;

        let stream = TcpStream::connect_timeout(&addr, config.connect_timeout)?;

        // Disable Nagle's algorithm for low latency
        stream.set_nodelay(true)?;

        if config.read_timeout > Duration::ZERO {
            stream.set_read_timeout(Some(config.read_timeout))?;
        }
        if config.write_timeout > Duration::ZERO {
            stream.set_write_timeout(Some(config.write_timeout))?;
        }

        // Clone stream for separate read/write handles
        let read_stream = stream.try_clone()?;
        let write_stream = stream;

        tracing::debug!("Connected to shard service at {}", config.server_addr);

        Ok(Self {
            reader: BufReader::new(read_stream),
            writer: BufWriter::new(write_stream),
            server_addr: config.server_addr.clone(),
        })
    }

    /// Send a request and read the first response frame
    pub fn call(&mut self, request: &Request) -> Result<Frame> {
        tracing::trace!("Sending {:?} to {}", request.request_type(), self.server_addr);
        write_request(&mut self.writer, request)?;
        read_frame(&mut self.reader)
    }

    /// Read the next response frame of an in-progress stream
    pub fn next_frame(&mut self) -> Result<Frame> {
        read_frame(&mut self.reader)
    }

    /// Close the connection with a bounded grace period
    ///
    /// Shuts down the write half so the server sees EOF, then drains
    /// remaining data until the server closes or the grace deadline
    /// passes. After the deadline the socket is dropped regardless.
    pub fn close(self, grace: Duration) -> Result<()> {
        let stream = self.writer.into_inner().map_err(|e| {
            CompassError::Io(std::io::Error::new(
                std::io::ErrorKind::Other,
                format!("Flush on close failed: {}", e.error()),
            ))
        })?;

        stream.shutdown(Shutdown::Write)?;

        let deadline = Instant::now() + grace;
        let mut reader = self.reader;
        let mut scratch = [0u8; 1024];

        loop {
            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                tracing::debug!(
                    "Close grace period elapsed for {}, dropping connection",
                    self.server_addr
                );
                break;
            }
            reader.get_ref().set_read_timeout(Some(remaining))?;

            match reader.read(&mut scratch) {
                // EOF: server closed its half, clean shutdown
                Ok(0) => break,
                Ok(_) => continue,
                Err(ref e)
                    if e.kind() == std::io::ErrorKind::WouldBlock
                        || e.kind() == std::io::ErrorKind::TimedOut =>
                {
                    tracing::debug!(
                        "Close grace period elapsed for {}, dropping connection",
                        self.server_addr
                    );
                    break;
                }
                Err(ref e)
                    if e.kind() == std::io::ErrorKind::ConnectionReset
                        || e.kind() == std::io::ErrorKind::ConnectionAborted =>
                {
                    break;
                }
                Err(e) => return Err(e.into()),
            }
        }

        tracing::debug!("Connection to {} closed", self.server_addr);
        Ok(())
    }

    /// Server address this connection talks to
    pub fn server_addr(&self) -> &str {
        &self.server_addr
    }
}
