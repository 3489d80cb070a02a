//! HTTP server lifecycle (SPEC_FULL §2 "Process wiring"), grounded in
//! `oxcrypt-webdav::server::WebDavServer`: a `TcpListener` accept loop
//! with graceful shutdown via a `oneshot` channel, generalized from one
//! fixed filesystem to any `DavHandler<A>`.

use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::Arc;

use hyper::body::Incoming;
use hyper::service::service_fn;
use hyper::Request;
use hyper_util::rt::{TokioExecutor, TokioIo};
use hyper_util::server::conn::auto;
use tokio::net::TcpListener;
use tokio::sync::oneshot;
use tracing::{debug, error, info, warn};

use crate::fs::PersistenceAdapter;
use crate::handler::DavHandler;

/// A running WebDAV server instance. Dropping it aborts the accept loop.
pub struct DavServer {
    pub addr: SocketAddr,
    shutdown_tx: Option<oneshot::Sender<()>>,
    server_handle: Option<tokio::task::JoinHandle<()>>,
}

impl DavServer {
    /// Bind, run the bootstrap fabrication if the handler carries an
    /// orchestrator, then start serving connections in a background task.
    pub async fn start<A: PersistenceAdapter + 'static>(
        bind_address: std::net::IpAddr,
        port: u16,
        handler: DavHandler<A>,
    ) -> Result<DavServer, std::io::Error> {
        let addr = SocketAddr::new(bind_address, port);
        let listener = TcpListener::bind(addr).await?;
        let actual_addr = listener.local_addr()?;

        info!(addr = %actual_addr, "starting webdav server");

        handler.bootstrap().await;
        let handler = Arc::new(handler);

        let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();
        let server_handle = tokio::spawn(async move {
            tokio::select! {
                () = run_server(listener, handler) => {
                    debug!("server accept loop ended");
                }
                _ = shutdown_rx => {
                    info!("received shutdown signal");
                }
            }
        });

        Ok(DavServer { addr: actual_addr, shutdown_tx: Some(shutdown_tx), server_handle: Some(server_handle) })
    }

    pub fn url(&self) -> String {
        format!("http://{}", self.addr)
    }

    pub async fn stop(mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
        if let Some(handle) = self.server_handle.take() {
            let _ = handle.await;
        }
        info!("webdav server stopped");
    }

    fn stop_sync(&mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
        if let Some(handle) = self.server_handle.take() {
            handle.abort();
        }
    }
}

impl Drop for DavServer {
    fn drop(&mut self) {
        self.stop_sync();
    }
}

async fn run_server<A: PersistenceAdapter + 'static>(listener: TcpListener, handler: Arc<DavHandler<A>>) {
    loop {
        match listener.accept().await {
            Ok((stream, peer_addr)) => {
                let handler = handler.clone();
                tokio::spawn(async move {
                    let io = TokioIo::new(stream);
                    let service = service_fn(move |req: Request<Incoming>| {
                        let handler = handler.clone();
                        async move {
                            let resp = handler.handle(req).await;
                            Ok::<_, Infallible>(resp)
                        }
                    });

                    if let Err(e) = auto::Builder::new(TokioExecutor::new()).serve_connection(io, service).await {
                        warn!(peer = %peer_addr, error = %e, "http connection error");
                    }
                });
            }
            Err(e) => {
                error!(error = %e, "failed to accept connection");
            }
        }
    }
}
