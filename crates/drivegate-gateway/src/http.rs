//! HTTP surface for the gateway.
//!
//! This layer is the transport collaborator the core assumes: it parses
//! and validates requests, then hands the coordinator a validated
//! `(token, operation, payload)` tuple and maps the outcome onto a
//! response. Business rules live in [`crate::gateway`], not here.

use std::sync::Arc;

use axum::body::Body;
use axum::extract::{DefaultBodyLimit, Multipart, Path, Query, State};
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{delete, get, post};
use axum::{Json, Router};
use chrono::{DateTime, Utc};
use drivegate_catalog::FileRecord;
use drivegate_storage_core::Locator;
use serde::{Deserialize, Serialize};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::error::GatewayError;
use crate::gateway::{FileContent, Gateway};

/// Space id bounds, enforced at the edge.
const SPACE_ID_LEN: std::ops::RangeInclusive<usize> = 3..=30;
/// Minimum password length, enforced at the edge.
const MIN_PASSWORD_LEN: usize = 4;

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    pub gateway: Arc<Gateway>,
}

/// Errors surfaced to HTTP clients.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("{0}")]
    BadRequest(String),

    #[error(transparent)]
    Gateway(#[from] GatewayError),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        #[derive(Serialize)]
        struct ErrorBody {
            error: String,
            code: &'static str,
        }

        let (status, code) = match &self {
            ApiError::BadRequest(_) => (StatusCode::BAD_REQUEST, "INVALID_REQUEST"),
            ApiError::Gateway(err) => match err {
                GatewayError::AlreadyExists => (StatusCode::BAD_REQUEST, "ALREADY_EXISTS"),
                GatewayError::Unauthorized => (StatusCode::UNAUTHORIZED, "UNAUTHORIZED"),
                GatewayError::NotFound => (StatusCode::NOT_FOUND, "NOT_FOUND"),
                GatewayError::TooLarge { .. } => (StatusCode::BAD_REQUEST, "TOO_LARGE"),
                GatewayError::InvalidLocator => (StatusCode::FORBIDDEN, "INVALID_LOCATOR"),
                GatewayError::Unsupported(_) => (StatusCode::BAD_REQUEST, "UNSUPPORTED"),
                GatewayError::Backend(_) => (StatusCode::BAD_GATEWAY, "BACKEND_FAILURE"),
                GatewayError::Catalog(_) => {
                    (StatusCode::INTERNAL_SERVER_ERROR, "CATALOG_FAILURE")
                }
            },
        };

        let body = ErrorBody {
            error: self.to_string(),
            code,
        };
        (status, Json(body)).into_response()
    }
}

type ApiResult<T> = Result<T, ApiError>;

// =============================================================================
// Request / response bodies
// =============================================================================

#[derive(Deserialize)]
pub struct SpaceCredentials {
    pub space_id: String,
    pub password: String,
}

#[derive(Deserialize)]
pub struct TokenBody {
    pub token: String,
}

#[derive(Deserialize)]
pub struct TokenQuery {
    pub token: String,
}

#[derive(Deserialize)]
pub struct UploadUrlRequest {
    pub token: String,
    pub filename: String,
    pub size: i64,
}

#[derive(Deserialize)]
pub struct ConfirmUploadRequest {
    pub token: String,
    pub locator: Locator,
    pub filename: String,
    pub size: i64,
}

#[derive(Serialize)]
pub struct SpaceCreatedResponse {
    pub space_id: String,
}

#[derive(Serialize)]
pub struct LoginResponse {
    pub token: String,
    pub space_id: String,
}

#[derive(Serialize)]
pub struct OkResponse {
    pub ok: bool,
}

#[derive(Serialize)]
pub struct FileSummary {
    pub id: i64,
    pub filename: String,
    pub size: i64,
    pub uploaded_at: DateTime<Utc>,
}

impl From<FileRecord> for FileSummary {
    fn from(record: FileRecord) -> Self {
        Self {
            id: record.id,
            filename: record.filename,
            size: record.size,
            uploaded_at: record.uploaded_at,
        }
    }
}

#[derive(Serialize)]
pub struct UploadedResponse {
    pub filename: String,
}

#[derive(Serialize)]
pub struct UploadUrlResponse {
    pub upload_url: String,
    pub locator: Locator,
    pub filename: String,
    pub size: i64,
}

#[derive(Serialize)]
pub struct HealthResponse {
    pub healthy: bool,
    pub version: &'static str,
    pub backend: &'static str,
}

// =============================================================================
// Handlers
// =============================================================================

/// GET /health
async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        healthy: true,
        version: env!("CARGO_PKG_VERSION"),
        backend: state.gateway.backend_name(),
    })
}

/// POST /spaces/create
async fn create_space(
    State(state): State<AppState>,
    Json(req): Json<SpaceCredentials>,
) -> ApiResult<Json<SpaceCreatedResponse>> {
    if !SPACE_ID_LEN.contains(&req.space_id.chars().count()) {
        return Err(ApiError::BadRequest(
            "space id must be 3 to 30 characters".to_string(),
        ));
    }
    if req.password.chars().count() < MIN_PASSWORD_LEN {
        return Err(ApiError::BadRequest(
            "password must be at least 4 characters".to_string(),
        ));
    }

    let space = state
        .gateway
        .create_space(&req.space_id, &req.password)
        .await?;
    Ok(Json(SpaceCreatedResponse {
        space_id: space.space_id,
    }))
}

/// POST /spaces/login
async fn login(
    State(state): State<AppState>,
    Json(req): Json<SpaceCredentials>,
) -> ApiResult<Json<LoginResponse>> {
    let token = state.gateway.login(&req.space_id, &req.password).await?;
    Ok(Json(LoginResponse {
        token,
        space_id: req.space_id,
    }))
}

/// POST /spaces/logout
async fn logout(
    State(state): State<AppState>,
    Json(req): Json<TokenBody>,
) -> ApiResult<Json<OkResponse>> {
    state.gateway.logout(&req.token).await?;
    Ok(Json(OkResponse { ok: true }))
}

/// GET /files?token=
async fn list_files(
    State(state): State<AppState>,
    Query(query): Query<TokenQuery>,
) -> ApiResult<Json<Vec<FileSummary>>> {
    let records = state.gateway.list_files(&query.token).await?;
    Ok(Json(records.into_iter().map(FileSummary::from).collect()))
}

/// POST /files/upload, a multipart form with `token` and `file` fields.
async fn upload(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> ApiResult<Json<UploadedResponse>> {
    let mut token = None;
    let mut file = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::BadRequest(format!("malformed multipart body: {}", e)))?
    {
        let name = field.name().map(str::to_string);
        match name.as_deref() {
            Some("token") => {
                let value = field
                    .text()
                    .await
                    .map_err(|e| ApiError::BadRequest(format!("bad token field: {}", e)))?;
                token = Some(value);
            }
            Some("file") => {
                let filename = field.file_name().unwrap_or("unnamed").to_string();
                let data = field
                    .bytes()
                    .await
                    .map_err(|e| ApiError::BadRequest(format!("bad file field: {}", e)))?;
                file = Some((filename, data));
            }
            _ => {}
        }
    }

    let token = token.ok_or_else(|| ApiError::BadRequest("missing token field".to_string()))?;
    let (filename, data) =
        file.ok_or_else(|| ApiError::BadRequest("missing file field".to_string()))?;

    let record = state.gateway.upload(&token, &filename, data).await?;
    Ok(Json(UploadedResponse {
        filename: record.filename,
    }))
}

/// POST /files/get-upload-url
async fn get_upload_url(
    State(state): State<AppState>,
    Json(req): Json<UploadUrlRequest>,
) -> ApiResult<Json<UploadUrlResponse>> {
    let grant = state
        .gateway
        .request_direct_upload(&req.token, &req.filename, req.size)
        .await?;
    Ok(Json(UploadUrlResponse {
        upload_url: grant.upload_url,
        locator: grant.locator,
        filename: grant.filename,
        size: grant.size,
    }))
}

/// POST /files/confirm-upload
async fn confirm_upload(
    State(state): State<AppState>,
    Json(req): Json<ConfirmUploadRequest>,
) -> ApiResult<Json<UploadedResponse>> {
    let record = state
        .gateway
        .confirm_direct_upload(&req.token, &req.locator, &req.filename, req.size)
        .await?;
    Ok(Json(UploadedResponse {
        filename: record.filename,
    }))
}

/// GET /files/download/{id}?token=
async fn download(
    State(state): State<AppState>,
    Path(file_id): Path<i64>,
    Query(query): Query<TokenQuery>,
) -> ApiResult<Response> {
    let content = state.gateway.download(&query.token, file_id).await?;
    stream_response(content, true)
}

/// GET /files/preview/{id}?token=
async fn preview(
    State(state): State<AppState>,
    Path(file_id): Path<i64>,
    Query(query): Query<TokenQuery>,
) -> ApiResult<Response> {
    let content = state.gateway.preview(&query.token, file_id).await?;
    stream_response(content, false)
}

/// DELETE /files/{id}?token=
async fn delete_file(
    State(state): State<AppState>,
    Path(file_id): Path<i64>,
    Query(query): Query<TokenQuery>,
) -> ApiResult<Json<OkResponse>> {
    state.gateway.delete_file(&query.token, file_id).await?;
    Ok(Json(OkResponse { ok: true }))
}

/// Build a streaming response from opened file content.
fn stream_response(content: FileContent, attachment: bool) -> ApiResult<Response> {
    let disposition = if attachment {
        format!("attachment; filename=\"{}\"", escape_filename(&content.filename))
    } else {
        "inline".to_string()
    };

    Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, content.content_type)
        .header(header::CONTENT_DISPOSITION, disposition)
        .body(Body::from_stream(content.stream))
        .map_err(|e| ApiError::Gateway(GatewayError::Backend(e.to_string())))
}

/// Keep header values intact for quoting-sensitive characters.
fn escape_filename(filename: &str) -> String {
    filename.replace(['"', '\r', '\n'], "_")
}

/// Assemble the router. `max_upload_bytes` raises the body limit so the
/// coordinator's size check stays the authoritative one; the extra slack
/// covers multipart framing overhead.
pub fn router(state: AppState, max_upload_bytes: usize) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/spaces/create", post(create_space))
        .route("/spaces/login", post(login))
        .route("/spaces/logout", post(logout))
        .route("/files", get(list_files))
        .route("/files/upload", post(upload))
        .route("/files/get-upload-url", post(get_upload_url))
        .route("/files/confirm-upload", post(confirm_upload))
        .route("/files/download/{id}", get(download))
        .route("/files/preview/{id}", get(preview))
        .route("/files/{id}", delete(delete_file))
        .layer(DefaultBodyLimit::max(max_upload_bytes + 64 * 1024))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
