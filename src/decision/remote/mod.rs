//! Remote decision source: an HTTP server driven by a browser client.
//!
//! ## Endpoints
//!
//! - `GET  /exec`      - SSE stream of `invocation` and `result` events
//! - `POST /return`    - `{"exitCode": N}` releases the oldest pending call
//! - `GET  /webapp/*`  - static client assets
//! - `GET  /`          - the client page (`exec.html`)

pub mod events;
pub mod state;

use std::convert::Infallible;
use std::future::Future;
use std::path::Path;
use std::sync::Arc;

use axum::{
    body::Body,
    extract::State,
    http::StatusCode,
    response::{
        sse::{Event, KeepAlive, Sse},
        IntoResponse, Response,
    },
    routing::{get, post},
    Router,
};
use futures::stream::Stream;
use tokio::net::TcpListener;
use tokio_stream::wrappers::UnboundedReceiverStream;
use tokio_stream::StreamExt;
use tower_http::{
    services::{ServeDir, ServeFile},
    trace::TraceLayer,
};

pub use events::{EventIds, ReturnRequest, ServerEvent};
pub use state::{AttachError, RemoteState, ReturnError};

use crate::config::RemotePolicy;
use crate::intercept::{ResumeExecutor, SessionStreams};
use crate::shell::ExitStatus;

/// Largest accepted `POST /return` body.
pub const RETURN_BODY_LIMIT: usize = 1024;

/// Builds the router serving `state` and the assets under `webapp_dir`.
pub fn router(state: Arc<RemoteState>, webapp_dir: &Path) -> Router {
    Router::new()
        .route("/return", post(post_return))
        .route("/exec", get(exec_events))
        .nest_service("/webapp", ServeDir::new(webapp_dir))
        .route_service("/", ServeFile::new(webapp_dir.join("exec.html")))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Serves one script session on `listener` until it finishes or `shutdown` resolves.
///
/// Returns the script's final status, or `None` if the server stopped first.
///
/// # Errors
///
/// Returns an error if the server fails.
pub async fn serve(
    listener: TcpListener,
    session: SessionStreams,
    resume: ResumeExecutor,
    policy: RemotePolicy,
    webapp_dir: &Path,
    shutdown: impl Future<Output = ()> + Send + 'static,
) -> std::io::Result<Option<ExitStatus>> {
    let state = Arc::new(RemoteState::new(resume, policy));
    let mut finished = state.subscribe();
    let forward = {
        let state = Arc::clone(&state);
        tokio::spawn(async move { state.forward(session).await })
    };

    if let Ok(addr) = listener.local_addr() {
        tracing::info!(%addr, ?policy, "waiting for a client");
    }
    axum::serve(listener, router(Arc::clone(&state), webapp_dir))
        .with_graceful_shutdown(async move {
            tokio::select! {
                _ = finished.wait_for(|done| *done) => {}
                () = shutdown => tracing::info!("shutdown requested"),
            }
        })
        .await?;

    if !forward.is_finished() {
        tracing::warn!("server stopped before the script finished");
        forward.abort();
    }
    Ok(state.outcome())
}

/// POST /return - release the oldest pending call
async fn post_return(State(state): State<Arc<RemoteState>>, body: Body) -> Response {
    let bytes = match axum::body::to_bytes(body, RETURN_BODY_LIMIT).await {
        Ok(bytes) => bytes,
        Err(_) => return (StatusCode::BAD_REQUEST, "failed to read body").into_response(),
    };
    let code = match ReturnRequest::parse(&bytes) {
        Ok(code) => code,
        Err(message) => return (StatusCode::BAD_REQUEST, message).into_response(),
    };
    match state.release(code) {
        Ok(()) => StatusCode::ACCEPTED.into_response(),
        Err(ReturnError::NothingPending) => (StatusCode::CONFLICT, "no call is waiting").into_response(),
    }
}

/// GET /exec - SSE stream for the attached client
async fn exec_events(State(state): State<Arc<RemoteState>>) -> Response {
    match state.attach() {
        Ok(events) => event_stream(events).into_response(),
        Err(AttachError::Busy) => (StatusCode::CONFLICT, "another client is attached").into_response(),
        Err(AttachError::Finished) => (StatusCode::GONE, "session has finished").into_response(),
    }
}

fn event_stream(
    events: tokio::sync::mpsc::UnboundedReceiver<ServerEvent>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let mut ids = EventIds::new();
    let stream = UnboundedReceiverStream::new(events).map(move |event| Ok(ids.encode(&event)));
    Sse::new(stream).keep_alive(KeepAlive::default())
}
