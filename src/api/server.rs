//! HTTP server lifecycle.
//!
//! bind → serve until the shutdown future resolves. `serve_until_ctrl_c`
//! is the variant used by the binary.

use std::future::Future;
use std::net::SocketAddr;

use tokio::net::TcpListener;

use crate::api::router::triage_router;
use crate::api::types::AppState;

/// Serve on an already-bound listener until `shutdown` resolves.
pub async fn serve(
    listener: TcpListener,
    state: AppState,
    shutdown: impl Future<Output = ()> + Send + 'static,
) -> std::io::Result<()> {
    let addr = listener.local_addr()?;
    tracing::info!(%addr, "Triage server listening");

    axum::serve(listener, triage_router(state))
        .with_graceful_shutdown(shutdown)
        .await?;

    tracing::info!(%addr, "Triage server stopped");
    Ok(())
}

/// Bind `addr` and serve in the foreground until Ctrl-C.
pub async fn serve_until_ctrl_c(state: AppState, addr: SocketAddr) -> std::io::Result<()> {
    let listener = TcpListener::bind(addr).await?;

    serve(listener, state, async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to listen for Ctrl-C: {e}");
            std::future::pending::<()>().await;
        }
        tracing::info!("Ctrl-C received, shutting down");
    })
    .await
}
