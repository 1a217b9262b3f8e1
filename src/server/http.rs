//! HTTP server implementation
//!
//! Uses hyper http1 with TokioIo for async handling. Routing is a plain
//! method/path match; every handler produces a `Response<Full<Bytes>>`.

use bytes::Bytes;
use http_body_util::Full;
use hyper::body::Incoming;
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper::{Method, Request, Response, StatusCode};
use hyper_util::rt::TokioIo;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;
use tokio::net::TcpListener;
use tracing::{error, info, warn};

use crate::config::Args;
use crate::routes;
use crate::service::PaperService;
use crate::types::GatewayError;

/// Shared application state
pub struct AppState {
    pub args: Args,
    /// Workflow service coordinating ledger, content store and metadata
    pub papers: Arc<PaperService>,
    /// Process start, for uptime reporting
    pub started_at: Instant,
}

impl AppState {
    pub fn new(args: Args, papers: Arc<PaperService>) -> Self {
        Self {
            args,
            papers,
            started_at: Instant::now(),
        }
    }
}

/// Start the HTTP server
pub async fn run(state: Arc<AppState>) -> Result<(), GatewayError> {
    let listener = TcpListener::bind(state.args.listen)
        .await
        .map_err(|e| GatewayError::Config(format!("Failed to bind {}: {}", state.args.listen, e)))?;

    info!(
        "Papergate listening on {} as node {}",
        state.args.listen, state.args.node_id
    );

    if state.args.dev_mode {
        warn!("Development mode enabled - header identity fallback active");
    }

    loop {
        match listener.accept().await {
            Ok((stream, addr)) => {
                let state = Arc::clone(&state);
                tokio::spawn(async move {
                    let io = TokioIo::new(stream);

                    let service = service_fn(move |req| {
                        let state = Arc::clone(&state);
                        async move { handle_request(state, addr, req).await }
                    });

                    if let Err(err) = http1::Builder::new().serve_connection(io, service).await {
                        error!("Error serving connection from {}: {:?}", addr, err);
                    }
                });
            }
            Err(e) => {
                error!("Error accepting connection: {:?}", e);
            }
        }
    }
}

/// Route incoming HTTP requests
async fn handle_request(
    state: Arc<AppState>,
    addr: SocketAddr,
    req: Request<Incoming>,
) -> Result<Response<Full<Bytes>>, hyper::Error> {
    let method = req.method().clone();
    let path = req.uri().path().to_string();

    info!("[{}] {} {}", addr, method, path);

    let response = match (method, path.as_str()) {
        // Liveness probe
        (Method::GET, "/health") | (Method::GET, "/healthz") => {
            routes::health_check(Arc::clone(&state))
        }

        // Version info for deployment verification
        (Method::GET, "/version") => routes::version_info(),

        // CORS preflight
        (Method::OPTIONS, _) => preflight_response(),

        // Paper workflow
        (Method::POST, "/paper/upload/") | (Method::POST, "/paper/upload") => {
            routes::handle_upload(req, state).await
        }
        (Method::GET, "/paper/") | (Method::GET, "/paper") => {
            routes::handle_list(req, state).await
        }
        (Method::GET, p) if p.starts_with("/paper/details/") => {
            let content_id = p.trim_start_matches("/paper/details/").trim_end_matches('/');
            if content_id.is_empty() {
                not_found_response(p)
            } else {
                routes::handle_details(state, content_id).await
            }
        }
        (Method::POST, "/paper/reviewers/") | (Method::POST, "/paper/reviewers") => {
            routes::handle_add_reviewer(req, state).await
        }
        (Method::POST, "/paper/rating/") | (Method::POST, "/paper/rating") => {
            routes::handle_update_rating(req, state).await
        }

        _ => not_found_response(&path),
    };

    Ok(response)
}

/// CORS preflight response
fn preflight_response() -> Response<Full<Bytes>> {
    Response::builder()
        .status(StatusCode::NO_CONTENT)
        .header("Access-Control-Allow-Origin", "*")
        .header("Access-Control-Allow-Methods", "GET, POST, OPTIONS")
        .header("Access-Control-Allow-Headers", "Content-Type, Authorization")
        .body(Full::new(Bytes::new()))
        .unwrap()
}

/// 404 response
fn not_found_response(path: &str) -> Response<Full<Bytes>> {
    routes::json_response(
        StatusCode::NOT_FOUND,
        &serde_json::json!({ "error": format!("Not found: {}", path) }),
    )
}
