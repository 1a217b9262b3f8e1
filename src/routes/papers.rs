//! Paper workflow routes
//!
//! The response shapes here are a fixed external contract:
//!
//! - `POST /paper/upload/`  → `{code, msg}` (msg = owned-paper ids)
//! - `GET  /paper/`         → `[enrichedPaper...]` / `{error}`
//! - `GET  /paper/details/:id` → `{code, paper}` / `{code, msg}`
//! - `POST /paper/reviewers/`  → `{code, status}` / `{code, msg}`
//! - `POST /paper/rating/`     → `{code}` / `{code, msg}`
//!
//! Workflow failures are logged with their error kind, then collapsed
//! onto this legacy success/failure surface.

use bytes::Bytes;
use futures_util::StreamExt;
use http_body_util::{BodyExt, BodyStream, Full};
use hyper::body::Incoming;
use hyper::{Request, Response, StatusCode};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::Arc;
use tracing::{info, warn};

use crate::routes::{authenticate, json_response};
use crate::server::AppState;
use crate::types::{GatewayError, Result};

/// Legacy envelope for upload and review responses
#[derive(Serialize)]
struct CodeResponse<T: Serialize> {
    code: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    msg: Option<T>,
}

fn unauthorized(err: &GatewayError) -> Response<Full<Bytes>> {
    warn!(kind = err.kind(), error = %err, "Request rejected");
    json_response(
        StatusCode::UNAUTHORIZED,
        &json!({ "code": "failure", "msg": "Unauthorized." }),
    )
}

/// Fields carried by the upload multipart form
struct UploadForm {
    file: Vec<u8>,
    title: String,
    password: String,
}

/// Handle `POST /paper/upload/`
pub async fn handle_upload(req: Request<Incoming>, state: Arc<AppState>) -> Response<Full<Bytes>> {
    let claims = match authenticate(req.headers(), &state.args) {
        Ok(claims) => claims,
        Err(e) => return unauthorized(&e),
    };

    let form = match read_upload_form(req).await {
        Ok(form) => form,
        Err(e) => {
            warn!(kind = e.kind(), error = %e, "Malformed upload request");
            return upload_failure();
        }
    };

    info!(
        email = %claims.sub,
        title = %form.title,
        size = form.file.len(),
        "Paper upload received"
    );

    match state
        .papers
        .submit_paper(
            &claims.sub,
            &claims.account,
            &form.password,
            form.title,
            form.file,
        )
        .await
    {
        Ok(owned) => json_response(
            StatusCode::OK,
            &CodeResponse {
                code: "success",
                msg: Some(owned),
            },
        ),
        Err(e) => {
            warn!(kind = e.kind(), error = %e, "Paper upload failed");
            upload_failure()
        }
    }
}

fn upload_failure() -> Response<Full<Bytes>> {
    json_response(
        StatusCode::INTERNAL_SERVER_ERROR,
        &json!({ "code": "failure", "msg": "File upload failed." }),
    )
}

/// Parse the multipart form: `file`, `title`, `password`
async fn read_upload_form(req: Request<Incoming>) -> Result<UploadForm> {
    let content_type = req
        .headers()
        .get(hyper::header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("")
        .to_string();

    let boundary = multer::parse_boundary(&content_type)
        .map_err(|e| GatewayError::BadRequest(format!("not a multipart request: {}", e)))?;

    let stream = BodyStream::new(req.into_body()).filter_map(|frame| async move {
        match frame {
            Ok(frame) => frame.into_data().ok().map(Ok),
            Err(e) => Some(Err(e)),
        }
    });

    let mut multipart = multer::Multipart::new(stream, boundary);

    let mut file = None;
    let mut title = None;
    let mut password = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| GatewayError::BadRequest(format!("multipart error: {}", e)))?
    {
        match field.name() {
            Some("file") => {
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|e| GatewayError::BadRequest(format!("file field error: {}", e)))?;
                file = Some(bytes.to_vec());
            }
            Some("title") => {
                title = Some(field.text().await.map_err(|e| {
                    GatewayError::BadRequest(format!("title field error: {}", e))
                })?);
            }
            Some("password") => {
                password = Some(field.text().await.map_err(|e| {
                    GatewayError::BadRequest(format!("password field error: {}", e))
                })?);
            }
            _ => {}
        }
    }

    Ok(UploadForm {
        file: file.ok_or_else(|| GatewayError::BadRequest("missing file field".to_string()))?,
        title: title.ok_or_else(|| GatewayError::BadRequest("missing title field".to_string()))?,
        password: password
            .ok_or_else(|| GatewayError::BadRequest("missing password field".to_string()))?,
    })
}

/// Handle `GET /paper/`
pub async fn handle_list(req: Request<Incoming>, state: Arc<AppState>) -> Response<Full<Bytes>> {
    let claims = match authenticate(req.headers(), &state.args) {
        Ok(claims) => claims,
        Err(e) => return unauthorized(&e),
    };

    match state.papers.list_papers(&claims.sub).await {
        Ok(papers) if !papers.is_empty() => json_response(StatusCode::OK, &papers),
        Ok(_) => json_response(
            StatusCode::NOT_FOUND,
            &json!({ "error": "Unable to retrieve papers for given user." }),
        ),
        Err(e @ GatewayError::UserNotFound(_)) => {
            warn!(kind = e.kind(), error = %e, "Paper listing failed");
            json_response(
                StatusCode::NOT_FOUND,
                &json!({ "error": "Unable to retrieve papers for given user." }),
            )
        }
        Err(e) => {
            warn!(kind = e.kind(), error = %e, "Paper listing failed");
            json_response(
                StatusCode::INTERNAL_SERVER_ERROR,
                &json!({ "error": "Fatal error" }),
            )
        }
    }
}

/// Handle `GET /paper/details/:id`
pub async fn handle_details(state: Arc<AppState>, content_id: &str) -> Response<Full<Bytes>> {
    match state.papers.paper_details(content_id).await {
        Ok(details) => json_response(
            StatusCode::OK,
            &json!({ "code": "success", "paper": details }),
        ),
        Err(e) => {
            warn!(kind = e.kind(), cid = %content_id, error = %e, "Paper detail lookup failed");
            json_response(
                StatusCode::INTERNAL_SERVER_ERROR,
                &json!({ "code": "failure", "msg": "Failed to retrieve paper status." }),
            )
        }
    }
}

/// Request body for reviewer assignment
#[derive(Deserialize)]
struct AddReviewerRequest {
    id: String,
    password: String,
}

/// Handle `POST /paper/reviewers/`
pub async fn handle_add_reviewer(
    req: Request<Incoming>,
    state: Arc<AppState>,
) -> Response<Full<Bytes>> {
    let claims = match authenticate(req.headers(), &state.args) {
        Ok(claims) => claims,
        Err(e) => return unauthorized(&e),
    };

    let body: AddReviewerRequest = match read_json(req).await {
        Ok(body) => body,
        Err(e) => {
            warn!(kind = e.kind(), error = %e, "Malformed reviewer request");
            return review_failure("Failed to add reviewer.");
        }
    };

    match state
        .papers
        .add_reviewer(&body.id, &claims.account, &body.password)
        .await
    {
        Ok(status) => json_response(
            StatusCode::OK,
            &json!({ "code": "success", "status": status }),
        ),
        Err(e) => {
            warn!(kind = e.kind(), cid = %body.id, error = %e, "Reviewer assignment failed");
            review_failure("Failed to add reviewer.")
        }
    }
}

/// Request body for rating updates
#[derive(Deserialize)]
struct UpdateRatingRequest {
    id: String,
    rating: u64,
    password: String,
}

/// Handle `POST /paper/rating/`
pub async fn handle_update_rating(
    req: Request<Incoming>,
    state: Arc<AppState>,
) -> Response<Full<Bytes>> {
    let claims = match authenticate(req.headers(), &state.args) {
        Ok(claims) => claims,
        Err(e) => return unauthorized(&e),
    };

    let body: UpdateRatingRequest = match read_json(req).await {
        Ok(body) => body,
        Err(e) => {
            warn!(kind = e.kind(), error = %e, "Malformed rating request");
            return review_failure("Failed to update rating.");
        }
    };

    match state
        .papers
        .update_rating(&body.id, &claims.account, body.rating, &body.password)
        .await
    {
        Ok(()) => json_response(StatusCode::OK, &json!({ "code": "success" })),
        Err(e) => {
            warn!(kind = e.kind(), cid = %body.id, error = %e, "Rating update failed");
            review_failure("Failed to update rating.")
        }
    }
}

fn review_failure(msg: &str) -> Response<Full<Bytes>> {
    json_response(
        StatusCode::INTERNAL_SERVER_ERROR,
        &json!({ "code": "failure", "msg": msg }),
    )
}

/// Read and deserialize a JSON request body
async fn read_json<T: serde::de::DeserializeOwned>(req: Request<Incoming>) -> Result<T> {
    let body = req
        .collect()
        .await
        .map_err(|e| GatewayError::BadRequest(format!("failed to read body: {}", e)))?
        .to_bytes();

    serde_json::from_slice(&body)
        .map_err(|e| GatewayError::BadRequest(format!("invalid JSON body: {}", e)))
}
