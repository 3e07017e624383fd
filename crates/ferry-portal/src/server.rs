//! Single-connection portal server.
//!
//! One client at a time: accept, read the request, answer, close. Accepts
//! wait at most `accept_timeout` so the loop never blocks indefinitely; a
//! timeout is just "no client yet". A request arriving in several segments
//! is read until its announced body is in, waiting at most `accept_timeout`
//! for each further segment.

use std::io;
use std::net::SocketAddr;
use std::time::Duration;

use ferry_core::SettingsStore;
use ferry_protocol::{is_complete, HttpRequest};
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::time::{sleep, timeout};
use tracing::{debug, error, info, warn};

use crate::config::PortalConfig;
use crate::error::PortalError;
use crate::portal::{Portal, Transition};
use crate::wifi::WifiRadio;

/// The listening side of the configuration portal.
pub struct PortalServer {
    listener: TcpListener,
    config: PortalConfig,
}

impl PortalServer {
    pub async fn bind(config: PortalConfig) -> Result<Self, PortalError> {
        let listener = TcpListener::bind(config.bind_addr).await?;
        info!("Portal listening on {}", config.bind_addr);
        Ok(Self { listener, config })
    }

    pub fn local_addr(&self) -> io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    /// Serve requests until the portal reports [`Transition::Complete`].
    ///
    /// The final client is kept open for `handoff_delay` so it can finish
    /// receiving the success page, then closed.
    pub async fn serve_until_complete<S, W>(
        &self,
        portal: &mut Portal<'_, S, W>,
    ) -> Result<(), PortalError>
    where
        S: SettingsStore,
        W: WifiRadio,
    {
        loop {
            let (mut stream, addr) =
                match timeout(self.config.accept_timeout, self.listener.accept()).await {
                    Err(_) => continue,
                    Ok(Err(e)) => {
                        warn!("Accept failed: {}", e);
                        continue;
                    }
                    Ok(Ok(client)) => client,
                };
            debug!("Client connected from {}", addr);

            let transition = match self.serve_client(&mut stream, portal).await {
                Ok(transition) => transition,
                Err(e) => {
                    warn!("Error handling request from {}: {}", addr, e);
                    Transition::Stay
                }
            };

            match transition {
                Transition::Complete => {
                    info!(
                        "Setup complete, waiting {:?} for the client to finish",
                        self.config.handoff_delay
                    );
                    sleep(self.config.handoff_delay).await;
                    let _ = stream.shutdown().await;
                    return Ok(());
                }
                Transition::EnterFerryConfig => info!("Transitioning to ferry configuration"),
                Transition::Stay => {}
            }
            let _ = stream.shutdown().await;
        }
    }

    async fn serve_client<S, W>(
        &self,
        stream: &mut TcpStream,
        portal: &mut Portal<'_, S, W>,
    ) -> io::Result<Transition>
    where
        S: SettingsStore,
        W: WifiRadio,
    {
        let raw = read_request(
            stream,
            self.config.request_buffer,
            self.config.accept_timeout,
        )
        .await?;
        if raw.is_empty() {
            return Ok(Transition::Stay);
        }

        let request = match HttpRequest::parse(&raw) {
            Ok(request) => request,
            Err(e) => {
                debug!("Dropping request: {}", e);
                return Ok(Transition::Stay);
            }
        };

        let reply = portal.handle(&request).await;
        send_chunked(
            stream,
            &reply.response.to_bytes(),
            self.config.chunk_size,
            self.config.chunk_pause,
        )
        .await?;
        Ok(reply.transition)
    }
}

/// Read one request of at most `capacity` bytes.
///
/// Keeps reading while the headers or the `Content-Length` body are still
/// short. Stops early on end of stream, a full buffer, or no data within
/// `patience`; whatever arrived is returned as is.
pub async fn read_request<T>(
    stream: &mut T,
    capacity: usize,
    patience: Duration,
) -> io::Result<Vec<u8>>
where
    T: AsyncRead + Unpin,
{
    let mut buffer = vec![0u8; capacity];
    let mut filled = stream.read(&mut buffer).await?;
    while filled > 0 && filled < buffer.len() && !is_complete(&buffer[..filled]) {
        match timeout(patience, stream.read(&mut buffer[filled..])).await {
            Ok(Ok(0)) => break,
            Ok(Ok(read)) => filled += read,
            Ok(Err(e)) => return Err(e),
            Err(_) => {
                debug!("Request incomplete after {} bytes, using what arrived", filled);
                break;
            }
        }
    }
    buffer.truncate(filled);
    Ok(buffer)
}

/// Send `bytes` in `chunk_size` pieces with a pause between them.
///
/// If any piece fails, the whole response is sent once more in a single
/// write; if that fails too the error is returned and the connection should
/// be dropped.
pub async fn send_chunked<T>(
    stream: &mut T,
    bytes: &[u8],
    chunk_size: usize,
    pause: Duration,
) -> io::Result<()>
where
    T: AsyncWrite + Unpin,
{
    if let Err(e) = write_chunks(stream, bytes, chunk_size, pause).await {
        warn!("Chunked send failed ({}), retrying in one write", e);
        if let Err(e) = stream.write_all(bytes).await {
            error!("Fallback send failed: {}", e);
            return Err(e);
        }
    }
    stream.flush().await
}

async fn write_chunks<T>(
    stream: &mut T,
    bytes: &[u8],
    chunk_size: usize,
    pause: Duration,
) -> io::Result<()>
where
    T: AsyncWrite + Unpin,
{
    for chunk in bytes.chunks(chunk_size.max(1)) {
        stream.write_all(chunk).await?;
        if !pause.is_zero() {
            sleep(pause).await;
        }
    }
    Ok(())
}
