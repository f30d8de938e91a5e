//! One-shot HTTP handler
//!
//! Routes the info page and the download URL of a single session, and fires
//! the completion signal once a download body has been streamed.

use crate::presentation::render_info_page;
use crate::session::ServingSession;
use crate::signal::{CompletionReason, CompletionSignal};
use axum::{
    Router,
    body::{Body, Bytes},
    extract::{ConnectInfo, Request, State},
    http::{HeaderValue, Method, StatusCode, header},
    middleware::{self, Next},
    response::{Html, IntoResponse, Response},
};
use futures_util::StreamExt;
use percent_encoding::percent_decode_str;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::fs::File;
use tower::ServiceExt;
use tower_http::services::ServeFile;

/// Routing decision for a request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    BadRequest,
    InfoPage,
    Download,
    NotFound,
}

pub struct OneShotHandler {
    session: Arc<ServingSession>,
    completion: CompletionSignal,
    expires_after: Duration,
}

impl OneShotHandler {
    pub fn new(
        session: Arc<ServingSession>,
        completion: CompletionSignal,
        expires_after: Duration,
    ) -> Self {
        Self {
            session,
            completion,
            expires_after,
        }
    }

    pub fn session(&self) -> &ServingSession {
        &self.session
    }

    pub fn completion(&self) -> &CompletionSignal {
        &self.completion
    }

    /// Decide what a request is. Only GET is accepted; the path is compared
    /// after percent-decoding.
    pub fn route(&self, method: &Method, path: &str) -> Route {
        if method != Method::GET {
            return Route::BadRequest;
        }
        let path = percent_decode_str(path).decode_utf8_lossy();
        if path == self.session.info_path() {
            Route::InfoPage
        } else if path == self.session.download_path() {
            Route::Download
        } else {
            Route::NotFound
        }
    }

    pub async fn handle(&self, req: Request) -> Response {
        match self.route(req.method(), req.uri().path()) {
            Route::BadRequest => (StatusCode::BAD_REQUEST, "Bad Request").into_response(),
            Route::NotFound => not_found(),
            Route::InfoPage => {
                let page = render_info_page(&self.session, self.expires_after);
                (
                    [(header::CACHE_CONTROL, HeaderValue::from_static("no-store"))],
                    Html(page),
                )
                    .into_response()
            }
            Route::Download => self.serve_download(req).await,
        }
    }

    async fn serve_download(&self, req: Request) -> Response {
        // The link is gone once consumed; transfers already streaming keep going
        if self.completion.is_fired() {
            tracing::warn!("Download requested after the link was used");
            return not_found();
        }

        let path = &self.session.file().path;
        if let Err(e) = File::open(path).await {
            tracing::error!("Cannot open {}: {}", path.display(), e);
            return internal_error();
        }

        let response = match ServeFile::new(path).oneshot(req).await {
            Ok(response) => response,
            Err(never) => match never {},
        };

        let (mut parts, body) = response.into_parts();
        // The file disappeared between the open check and ServeFile
        if parts.status == StatusCode::NOT_FOUND || parts.status.is_server_error() {
            tracing::error!(
                "Serving {} failed with {}",
                path.display(),
                parts.status
            );
            return internal_error();
        }

        parts.headers.insert(
            header::CONTENT_TYPE,
            HeaderValue::from_static("application/octet-stream"),
        );

        tracing::info!(
            "Streaming {} ({})",
            self.session.file().basename,
            parts.status
        );
        let mut guard = DownloadGuard::new(self.completion.clone());
        let stream = Body::new(body)
            .into_data_stream()
            .inspect(move |chunk| guard.observe(chunk));

        Response::from_parts(parts, Body::from_stream(stream))
    }
}

/// Lives as long as the download body. Dropping it, after the last byte or
/// because the client went away, consumes the link.
struct DownloadGuard {
    completion: CompletionSignal,
    started: Instant,
    bytes_sent: u64,
    errored: bool,
}

impl DownloadGuard {
    fn new(completion: CompletionSignal) -> Self {
        Self {
            completion,
            started: Instant::now(),
            bytes_sent: 0,
            errored: false,
        }
    }

    fn observe(&mut self, chunk: &Result<Bytes, axum::Error>) {
        match chunk {
            Ok(bytes) => self.bytes_sent += bytes.len() as u64,
            Err(_) => self.errored = true,
        }
    }
}

impl Drop for DownloadGuard {
    fn drop(&mut self) {
        if self.errored {
            tracing::warn!(
                "Download stream failed after {} bytes",
                self.bytes_sent
            );
        }
        tracing::info!(
            "Download ended: {} bytes in {:.2?}",
            self.bytes_sent,
            self.started.elapsed()
        );
        if self.completion.fire(CompletionReason::Downloaded) {
            tracing::info!("One-shot link consumed");
        }
    }
}

fn not_found() -> Response {
    (StatusCode::NOT_FOUND, "Not Found").into_response()
}

fn internal_error() -> Response {
    (StatusCode::INTERNAL_SERVER_ERROR, "Internal Server Error").into_response()
}

async fn dispatch(State(handler): State<Arc<OneShotHandler>>, req: Request) -> Response {
    handler.handle(req).await
}

/// Middleware to add security headers
async fn add_security_headers(req: Request, next: Next) -> Response {
    let mut response = next.run(req).await;
    let headers = response.headers_mut();

    headers.insert(
        header::CONTENT_SECURITY_POLICY,
        HeaderValue::from_static("default-src 'none'"),
    );
    headers.insert(
        header::X_CONTENT_TYPE_OPTIONS,
        HeaderValue::from_static("nosniff"),
    );
    headers.insert(header::X_FRAME_OPTIONS, HeaderValue::from_static("DENY"));
    // Keeps the secret URL out of Referer headers
    headers.insert(
        header::REFERRER_POLICY,
        HeaderValue::from_static("no-referrer"),
    );

    response
}

/// One access log line per request
async fn access_log(req: Request, next: Next) -> Response {
    let started = Instant::now();
    let remote = req
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|info| info.0.to_string())
        .unwrap_or_else(|| "-".to_string());
    let method = req.method().clone();
    let path = req.uri().path().to_string();

    let response = next.run(req).await;

    let length = response
        .headers()
        .get(header::CONTENT_LENGTH)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("-")
        .to_string();
    tracing::info!(
        target: "access",
        remote = %remote,
        method = %method,
        path = %path,
        status = response.status().as_u16(),
        length = %length,
        elapsed_ms = started.elapsed().as_millis() as u64,
        "request"
    );
    response
}

/// Build the router: every request goes through the one-shot dispatcher
pub fn router(handler: Arc<OneShotHandler>) -> Router {
    Router::new()
        .fallback(dispatch)
        .layer(middleware::from_fn(add_security_headers))
        .layer(middleware::from_fn(access_log))
        .with_state(handler)
}
