//! HTTP server startup logic.

use std::net::{SocketAddr, TcpListener};

use axum::Router;
use axum_server::Handle;

use super::shutdown;

/// Server startup error
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    #[error("Failed to bind server: {0}")]
    Bind(#[from] std::io::Error),

    #[error("Server error: {0}")]
    Server(String),
}

/// Bind `addr` and serve `app` until a termination signal drains the server.
///
/// This function blocks until the server shuts down.
pub async fn start_server(app: Router, addr: SocketAddr) -> Result<(), ServerError> {
    let listener = TcpListener::bind(addr)?;
    let handle = Handle::new();

    shutdown::setup_shutdown_handler(handle.clone());

    serve(app, listener, handle).await
}

/// Serve `app` on an already bound listener.
///
/// Shutdown is driven entirely through `handle`; no signal handlers are
/// installed here.
pub async fn serve(app: Router, listener: TcpListener, handle: Handle) -> Result<(), ServerError> {
    listener.set_nonblocking(true)?;
    let addr = listener.local_addr()?;
    tracing::info!(%addr, "Starting HTTP server");

    axum_server::from_tcp(listener)
        .handle(handle)
        .serve(app.into_make_service())
        .await
        .map_err(|e| ServerError::Server(e.to_string()))?;

    tracing::info!("HTTP server stopped, all connections drained");
    Ok(())
}
