use axum::Router;
use axum_server::{
    tls_rustls::RustlsConfig,
    Handle,
};
use eyre::{
    Context as _,
    Result,
};
use sbercdn_exporter_config::ListenConfig;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;

/// How long in-flight scrapes may take to finish once shutdown starts.
const SHUTDOWN_GRACE: Duration = Duration::from_secs(10);

/// Serves `app` until `shutdown` is cancelled. TLS is terminated when both certificate and key are configured.
pub async fn serve(listen: &ListenConfig, app: Router, shutdown: CancellationToken) -> Result<()> {
    let address = listen.socket_addr()?;

    if let Some((cert_file, privkey_file)) = listen.tls_files() {
        let rustls_config = RustlsConfig::from_pem_file(cert_file, privkey_file)
            .await
            .wrap_err_with(|| format!("could not load TLS certificate {cert_file:?} and key {privkey_file:?}"))?;

        let handle = Handle::new();
        tokio::spawn({
            let handle = handle.clone();
            async move {
                shutdown.cancelled().await;
                handle.graceful_shutdown(Some(SHUTDOWN_GRACE));
            }
        });

        info!("listening on https://{address}");
        axum_server::bind_rustls(address, rustls_config)
            .handle(handle)
            .serve(app.into_make_service())
            .await
            .wrap_err("HTTPS server failed")?;
    } else {
        let listener = TcpListener::bind(address)
            .await
            .wrap_err_with(|| format!("could not listen on {address}"))?;
        info!("listening on http://{address}");
        serve_listener(listener, app, shutdown).await?;
    }

    info!("server stopped");
    Ok(())
}

pub async fn serve_listener(listener: TcpListener, app: Router, shutdown: CancellationToken) -> Result<()> {
    axum::serve(listener, app.into_make_service())
        .with_graceful_shutdown(shutdown.cancelled_owned())
        .await
        .wrap_err("HTTP server failed")
}

/// Cancels `shutdown` on SIGINT or SIGTERM.
pub fn cancel_on_signal(shutdown: CancellationToken) {
    tokio::spawn(async move {
        let ctrl_c = async {
            if let Err(err) = tokio::signal::ctrl_c().await {
                error!(error = %err, "failed to listen for ctrl-c");
                std::future::pending::<()>().await;
            }
        };

        #[cfg(unix)]
        let terminate = async {
            match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
                Ok(mut signal) => {
                    signal.recv().await;
                }
                Err(err) => {
                    error!(error = %err, "failed to listen for SIGTERM");
                    std::future::pending::<()>().await;
                }
            }
        };

        #[cfg(not(unix))]
        let terminate = std::future::pending::<()>();

        tokio::select! {
            _ = ctrl_c => info!("received SIGINT, shutting down"),
            _ = terminate => info!("received SIGTERM, shutting down"),
            _ = shutdown.cancelled() => return,
        }
        shutdown.cancel();
    });
}
