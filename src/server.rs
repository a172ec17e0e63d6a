//! TCP listener, per-connection tasks, and graceful shutdown.
//!
//! Each accepted connection gets its own task. The task parses one request
//! head, lets the [`App`] produce a response (reading the body only if the
//! route asks for it), writes the response and closes the socket. There is
//! no keep-alive, so a connection never outlives its request.
//!
//! A rejected request may leave body bytes unread. Closing a TCP socket with
//! unread input sends a reset, which can destroy the response before the
//! client reads it, so after the write side is shut down the task discards
//! up to [`LINGER_BYTES`] of input for at most [`LINGER_TIME`].
//!
//! On SIGTERM or Ctrl-C the server stops accepting, waits for every
//! in-flight connection task to finish, and returns.

use std::sync::Arc;
use std::time::Duration;

use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt, BufReader};
use tokio::net::TcpListener;
use tracing::{debug, error, info};

use crate::dispatch::App;
use crate::error::Error;
use crate::request::{HeadError, RequestHead};
use crate::response::Response;
use crate::status::Status;

/// Most request bytes discarded before closing a connection.
pub const LINGER_BYTES: u64 = 256 * 1024;

/// Longest wait for the client to finish sending before closing.
pub const LINGER_TIME: Duration = Duration::from_millis(500);

/// The HTTP server.
pub struct Server {
    addr: String,
}

impl Server {
    /// Configures the server to listen on `addr` (`host:port`) when
    /// [`serve`](Server::serve) is called.
    pub fn bind(addr: impl Into<String>) -> Self {
        Self { addr: addr.into() }
    }

    /// Accepts connections until a shutdown signal, then drains.
    pub async fn serve(self, app: App) -> Result<(), Error> {
        let listener = TcpListener::bind(&self.addr).await?;
        info!(addr = %listener.local_addr()?, "guestboard listening");
        serve_listener(listener, app, shutdown_signal()).await;
        info!("guestboard stopped");
        Ok(())
    }
}

/// Runs the accept loop on an already-bound listener until `shutdown`
/// resolves, then waits for in-flight connections.
pub async fn serve_listener<F>(listener: TcpListener, app: App, shutdown: F)
where
    F: std::future::Future<Output = ()>,
{
    let app = Arc::new(app);
    let mut tasks = tokio::task::JoinSet::new();
    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            // Check shutdown first so a signal stops accepting even when more
            // connections are queued.
            biased;

            () = &mut shutdown => {
                info!(in_flight = tasks.len(), "shutdown signal received, draining connections");
                break;
            }

            res = listener.accept() => {
                let (stream, peer) = match res {
                    Ok(v) => v,
                    Err(e) => {
                        error!("accept error: {e}");
                        continue;
                    }
                };
                let app = Arc::clone(&app);
                tasks.spawn(async move {
                    debug!(%peer, "connection accepted");
                    handle_connection(&app, stream).await;
                });
            }

            // Reap finished tasks so the set does not grow without bound.
            Some(_) = tasks.join_next(), if !tasks.is_empty() => {}
        }
    }

    while tasks.join_next().await.is_some() {}
}

/// Serves exactly one request on `io` and shuts the write side down.
///
/// Generic over the transport so tests can drive it with an in-memory
/// duplex stream.
pub async fn handle_connection<S>(app: &App, io: S)
where
    S: AsyncRead + AsyncWrite + Unpin + Send,
{
    let (read_half, mut write_half) = tokio::io::split(io);
    let mut reader = BufReader::new(read_half);

    let response = match RequestHead::read(&mut reader).await {
        Ok(Some(head)) => {
            if head.expects_continue() {
                let interim = format!(
                    "HTTP/1.1 {} {}\r\n\r\n",
                    Status::Continue.code(),
                    Status::Continue.reason(),
                );
                if let Err(e) = write_half.write_all(interim.as_bytes()).await {
                    debug!("client went away before 100 Continue: {e}");
                    return;
                }
            }
            app.dispatch(head, &mut reader).await
        }
        Ok(None) => return,
        Err(HeadError::Io(e)) => {
            debug!("connection error while reading head: {e}");
            return;
        }
        Err(e) => {
            debug!("rejecting request head: {e}");
            Response::builder().status(Status::BadRequest).text("Bad Request")
        }
    };

    if let Err(e) = response.write_to(&mut write_half).await {
        debug!("failed to write response: {e}");
        return;
    }
    if let Err(e) = write_half.shutdown().await {
        debug!("failed to close connection: {e}");
        return;
    }
    linger(&mut reader).await;
}

/// Reads and drops leftover request input until EOF, the byte cap, or the
/// time cap, whichever comes first.
async fn linger<R>(reader: &mut R)
where
    R: AsyncRead + Unpin,
{
    let mut rest = reader.take(LINGER_BYTES);
    let mut sink = tokio::io::sink();
    let drain = tokio::io::copy(&mut rest, &mut sink);
    match tokio::time::timeout(LINGER_TIME, drain).await {
        Ok(Ok(0)) => {}
        Ok(Ok(n)) => debug!(discarded = n, "drained unread request bytes"),
        Ok(Err(e)) => debug!("error while draining request: {e}"),
        Err(_) => debug!("client still sending after linger timeout"),
    }
}

/// Resolves on the first SIGTERM (Unix) or Ctrl-C.
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to install Ctrl-C handler");
    };

    #[cfg(unix)]
    let sigterm = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let sigterm = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c   => {}
        () = sigterm  => {}
    }
}
