//! Server lifecycle: start and stop of the listening socket.
//!
//! [`MediaServer`] owns the only writes to [`ServerState`]. Start resolves the
//! LAN address, binds, and spawns the serve loop; stop drains in-flight
//! responses for a grace period, then force-closes whatever is still
//! streaming.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use tokio::net::TcpListener;
use tokio::sync::{oneshot, Mutex};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::api::{create_router, AppState, ServerError};
use crate::context::{IpDetector, UrlBuilder};
use crate::media::{FileAccess, MediaCatalog};
use crate::protocol_constants::SERVE_TASK_JOIN_MS;
use crate::services::MediaService;
use crate::state::{Config, ServerState};
use crate::stream::Streamer;

/// Handles of a running server, present between start and stop.
struct RunningServer {
    local_addr: SocketAddr,
    shutdown_tx: oneshot::Sender<()>,
    serve_task: JoinHandle<()>,
    streamer: Streamer,
    cancel: CancellationToken,
}

/// The LAN media server.
///
/// Start and stop may be called repeatedly; each start gets a fresh listener
/// and a fresh stream cancellation token.
pub struct MediaServer {
    config: Config,
    media: Arc<MediaService>,
    ip_detector: Arc<dyn IpDetector>,
    state: Arc<ServerState>,
    running: Mutex<Option<RunningServer>>,
}

impl MediaServer {
    pub fn new(
        config: Config,
        catalog: Arc<dyn MediaCatalog>,
        files: Arc<dyn FileAccess>,
        ip_detector: Arc<dyn IpDetector>,
    ) -> Self {
        Self {
            config,
            media: Arc::new(MediaService::new(catalog, files)),
            ip_detector,
            state: Arc::new(ServerState::new()),
            running: Mutex::new(None),
        }
    }

    /// Read-only handle on the running flag and advertised address.
    #[must_use]
    pub fn state(&self) -> Arc<ServerState> {
        Arc::clone(&self.state)
    }

    /// Socket address the listener is bound to, while running.
    pub async fn local_addr(&self) -> Option<SocketAddr> {
        self.running.lock().await.as_ref().map(|r| r.local_addr)
    }

    /// Starts listening and returns the advertised base URL.
    ///
    /// # Errors
    ///
    /// Fails if already running, if the configuration is invalid, if no LAN
    /// IPv4 address is available, or if the port cannot be bound. On failure
    /// nothing is left bound and the state stays stopped.
    pub async fn start(&self) -> Result<String, ServerError> {
        let mut slot = self.running.lock().await;
        if slot.is_some() {
            return Err(ServerError::AlreadyRunning);
        }

        self.config.validate().map_err(ServerError::Config)?;

        let ip = self.ip_detector.detect().ok_or_else(|| {
            log::warn!("[Server] No LAN IPv4 address, not starting");
            ServerError::NoLanAddress
        })?;

        let bind_addr = SocketAddr::from(([0, 0, 0, 0], self.config.port));
        let listener = TcpListener::bind(bind_addr).await.map_err(|e| {
            log::error!("[Server] Failed to bind {}: {}", bind_addr, e);
            ServerError::Bind(e)
        })?;
        let local_addr = listener.local_addr()?;

        let cancel = CancellationToken::new();
        let streamer = Streamer::new(&self.config, cancel.clone());
        let app = create_router(AppState::new(
            Arc::clone(&self.media),
            streamer.clone(),
            Arc::clone(&self.state),
        ));

        let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();
        let serve_task = tokio::spawn(async move {
            // Connect info lets handlers log the client address
            let result = axum::serve(
                listener,
                app.into_make_service_with_connect_info::<SocketAddr>(),
            )
            .with_graceful_shutdown(async {
                let _ = shutdown_rx.await;
            })
            .await;
            if let Err(e) = result {
                log::error!("[Server] Serve loop failed: {}", e);
            }
        });

        let url = UrlBuilder::new(ip.to_string(), local_addr.port()).base_url();
        self.state.mark_started(url.clone());
        *slot = Some(RunningServer {
            local_addr,
            shutdown_tx,
            serve_task,
            streamer,
            cancel,
        });

        log::info!("[Server] Listening on {} (advertised as {})", local_addr, url);
        Ok(url)
    }

    /// Stops the server. No-op when not running.
    ///
    /// New connections are refused immediately. In-flight responses get the
    /// configured grace period; after that every remaining byte source is
    /// closed and the serve loop is torn down.
    pub async fn stop(&self) {
        let Some(running) = self.running.lock().await.take() else {
            return;
        };
        let RunningServer {
            shutdown_tx,
            mut serve_task,
            streamer,
            cancel,
            ..
        } = running;

        let _ = shutdown_tx.send(());
        self.state.mark_stopped();
        log::info!(
            "[Server] Stopping, {} stream(s) in flight",
            streamer.active_streams()
        );

        let join_wait = Duration::from_millis(SERVE_TASK_JOIN_MS);
        if tokio::time::timeout(self.config.shutdown_grace(), &mut serve_task)
            .await
            .is_err()
        {
            log::info!(
                "[Server] Grace period elapsed, closing {} stream(s)",
                streamer.active_streams()
            );
            cancel.cancel();
            if tokio::time::timeout(join_wait, &mut serve_task).await.is_err() {
                log::warn!("[Server] Serve loop did not exit, aborting");
                serve_task.abort();
            }
        }

        // Pumps whose client already disconnected but have not noticed yet.
        cancel.cancel();
        streamer.tracker().close();
        if tokio::time::timeout(join_wait, streamer.tracker().wait())
            .await
            .is_err()
        {
            log::warn!("[Server] Some stream tasks did not finish in time");
        }

        log::info!("[Server] Stopped");
    }
}

impl Drop for MediaServer {
    fn drop(&mut self) {
        if let Some(running) = self.running.get_mut().take() {
            running.cancel.cancel();
            running.serve_task.abort();
            self.state.mark_stopped();
        }
    }
}
