//! Server lifecycle: bind, serve, race the deadline against the download,
//! shut down exactly once.

use crate::config::ServeConfig;
use crate::error::StartupError;
use crate::handler::{OneShotHandler, router};
use crate::net;
use crate::presentation::entry_url;
use crate::session::ServingSession;
use crate::signal::{CompletionReason, CompletionSignal};
use anyhow::Result;
use std::net::SocketAddr;
use std::path::Path;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::sync::watch;
use tokio::task::JoinHandle;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum LifecycleState {
    Starting,
    Serving,
    ShuttingDown,
    Stopped,
}

/// How the server ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ShutdownReport {
    pub reason: CompletionReason,
    /// False if the server loop returned an error
    pub clean: bool,
}

/// A server that is accepting connections
pub struct RunningServer {
    local_addr: SocketAddr,
    entry_url: String,
    completion: CompletionSignal,
    state: watch::Receiver<LifecycleState>,
    task: JoinHandle<ShutdownReport>,
}

impl RunningServer {
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Share URL to hand out, e.g. `http://192.168.1.7:41234/<token>`
    pub fn entry_url(&self) -> &str {
        &self.entry_url
    }

    pub fn completion(&self) -> &CompletionSignal {
        &self.completion
    }

    pub fn state(&self) -> watch::Receiver<LifecycleState> {
        self.state.clone()
    }

    /// Fire the completion signal from outside. False if it already fired.
    pub fn trigger(&self, reason: CompletionReason) -> bool {
        self.completion.fire(reason)
    }

    /// Fire `Interrupted` on Ctrl+C (and SIGTERM on unix)
    pub fn shutdown_on_os_signal(&self) {
        let completion = self.completion.clone();
        tokio::spawn(async move {
            tokio::select! {
                _ = os_signal() => {
                    if completion.fire(CompletionReason::Interrupted) {
                        tracing::info!("Interrupted, shutting down");
                    }
                }
                _ = completion.fired() => {}
            }
        });
    }

    /// Wait until the server has stopped
    pub async fn wait(self) -> Result<ShutdownReport> {
        Ok(self.task.await?)
    }
}

async fn os_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to listen for SIGTERM: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}

/// Prepare the session for `path` and start serving it
pub async fn serve_file(
    path: impl AsRef<Path>,
    config: &ServeConfig,
) -> Result<RunningServer, StartupError> {
    let session = ServingSession::prepare(path).await?;
    start(config, Arc::new(session)).await
}

/// Bind the listener, arm the deadline and start serving `session`
pub async fn start(
    config: &ServeConfig,
    session: Arc<ServingSession>,
) -> Result<RunningServer, StartupError> {
    let (state_tx, state_rx) = watch::channel(LifecycleState::Starting);
    let state_tx = Arc::new(state_tx);
    let completion = CompletionSignal::new();

    let listener = TcpListener::bind(config.bind_addr)
        .await
        .map_err(|source| StartupError::Bind {
            addr: config.bind_addr,
            source,
        })?;
    let local_addr = listener
        .local_addr()
        .map_err(|source| StartupError::Bind {
            addr: config.bind_addr,
            source,
        })?;

    let host = match config.advertise_host {
        Some(ip) => ip,
        None if local_addr.ip().is_unspecified() => net::outbound_ip().await,
        None => local_addr.ip(),
    };
    let entry_url = entry_url(host, local_addr.port(), session.info_path());

    // Deadline: a fired signal makes the timer irrelevant
    let deadline_signal = completion.clone();
    let timeout = config.timeout;
    tokio::spawn(async move {
        tokio::select! {
            _ = tokio::time::sleep(timeout) => {
                if deadline_signal.fire(CompletionReason::TimedOut) {
                    tracing::info!("Shutting down automatically after configured timeout");
                }
            }
            _ = deadline_signal.fired() => {}
        }
    });

    let handler = Arc::new(OneShotHandler::new(
        session,
        completion.clone(),
        config.timeout,
    ));
    let app = router(handler);

    let shutdown_signal = completion.clone();
    let shutdown_state = state_tx.clone();
    let serve_signal = completion.clone();

    state_tx.send_replace(LifecycleState::Serving);
    tracing::info!("HTTP server listening on {}", local_addr);

    let task = tokio::spawn(async move {
        let result = axum::serve(
            listener,
            app.into_make_service_with_connect_info::<SocketAddr>(),
        )
        .with_graceful_shutdown(async move {
            let reason = shutdown_signal.fired().await;
            shutdown_state.send_replace(LifecycleState::ShuttingDown);
            tracing::info!("HTTP server shutting down gracefully ({})", reason);
        })
        .await;

        let clean = match result {
            Ok(()) => true,
            Err(e) => {
                tracing::error!("HTTP server error: {}", e);
                false
            }
        };

        // Only matters if the server loop died on its own; releases the deadline task
        serve_signal.fire(CompletionReason::Interrupted);
        let reason = serve_signal
            .reason()
            .unwrap_or(CompletionReason::Interrupted);

        state_tx.send_replace(LifecycleState::Stopped);
        tracing::info!("HTTP server stopped");
        ShutdownReport { reason, clean }
    });

    Ok(RunningServer {
        local_addr,
        entry_url,
        completion,
        state: state_rx,
        task,
    })
}
