//! Request handlers.
//!
//! - `POST /send_photo`: stage upload, run the job, return the verdict
//! - `GET /photo/{name}`: stream a processed photo back
//! - `GET /health`: liveness

use std::path::{Path as FsPath, PathBuf};
use std::time::Instant;

use axum::{
    body::Body,
    extract::{
        multipart::{Field, MultipartError},
        Multipart, Path, State,
    },
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use mime::Mime;
use tokio_util::io::ReaderStream;

use crate::error::GatewayError;
use crate::http::request::RequestIdExt;
use crate::http::response::{HealthStatus, PhotoResult};
use crate::http::server::AppState;
use crate::job::staging::remove_staged;
use crate::job::{Job, StagedFile};
use crate::observability::metrics;

/// Multipart field carrying the image.
pub const PHOTO_FIELD: &str = "photo";
/// Multipart field carrying the processing mode.
pub const MODE_FIELD: &str = "type";

/// Upload a photo and wait for the worker's verdict.
pub async fn send_photo(
    State(state): State<AppState>,
    headers: HeaderMap,
    multipart: Multipart,
) -> Result<Json<PhotoResult>, GatewayError> {
    let started = Instant::now();
    let request_id = headers.request_id();

    let outcome = run_upload(&state, request_id, multipart).await;

    metrics::record_job(
        outcome.as_ref().map_or_else(GatewayError::kind, |_| "ok"),
        started,
    );
    outcome.map(Json)
}

async fn run_upload(
    state: &AppState,
    request_id: &str,
    mut multipart: Multipart,
) -> Result<PhotoResult, GatewayError> {
    let mut input_path = None;
    let mut mode = None;

    if let Err(e) = read_fields(state, &mut multipart, &mut input_path, &mut mode).await {
        if let Some(path) = input_path.take() {
            remove_staged(&path).await;
        }
        return Err(e);
    }

    let input_path = input_path
        .ok_or_else(|| GatewayError::InvalidUpload(format!("missing '{}' file field", PHOTO_FIELD)))?;
    let mode = mode.unwrap_or_else(|| {
        tracing::warn!(request_id, "Upload without a mode; forwarding an empty one");
        String::new()
    });

    let job = Job::new(&state.layout, input_path, mode);
    tracing::info!(
        request_id,
        output = %job.output_name(),
        mode = %job.mode(),
        worker = %state.bridge.address(),
        "Dispatching job to worker"
    );

    let reply = job.process(&state.bridge).await?;

    tracing::info!(
        request_id,
        output = %job.output_name(),
        status = reply.status,
        "Worker finished job"
    );
    Ok(PhotoResult::new(&reply, job.output_name()))
}

/// Stage the photo field and read the mode; other fields are skipped.
async fn read_fields(
    state: &AppState,
    multipart: &mut Multipart,
    input_path: &mut Option<PathBuf>,
    mode: &mut Option<String>,
) -> Result<(), GatewayError> {
    while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
        let field_name = field.name().map(str::to_owned);
        match field_name.as_deref() {
            Some(PHOTO_FIELD) if input_path.is_none() => {
                *input_path = Some(stage_field(state.layout.upload_dir(), field).await?);
            }
            Some(MODE_FIELD) => {
                *mode = Some(field.text().await.map_err(multipart_error)?);
            }
            // Anything else is drained by the next `next_field` call.
            _ => {}
        }
    }
    Ok(())
}

/// Stream one multipart field into a staging file.
async fn stage_field(dir: &FsPath, mut field: Field<'_>) -> Result<PathBuf, GatewayError> {
    let mut staged = StagedFile::create(dir).await.map_err(GatewayError::Staging)?;

    loop {
        match field.chunk().await {
            Ok(Some(chunk)) => {
                if let Err(e) = staged.write_chunk(&chunk).await {
                    staged.discard().await;
                    return Err(GatewayError::Staging(e));
                }
            }
            Ok(None) => break,
            Err(e) => {
                staged.discard().await;
                return Err(multipart_error(e));
            }
        }
    }

    staged.finish().await.map_err(GatewayError::Staging)
}

fn multipart_error(err: MultipartError) -> GatewayError {
    if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
        GatewayError::PayloadTooLarge
    } else {
        GatewayError::InvalidUpload(err.body_text())
    }
}

/// Stream a processed photo by its output name.
pub async fn get_photo(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> Result<Response, GatewayError> {
    let Some(path) = state.layout.resolve_output(&name).await else {
        metrics::record_retrieval("not_found");
        return Err(GatewayError::RetrievalNotFound(name));
    };

    let file = match tokio::fs::File::open(&path).await {
        Ok(file) => file,
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "Output exists but cannot be opened");
            metrics::record_retrieval("not_found");
            return Err(GatewayError::RetrievalNotFound(name));
        }
    };

    metrics::record_retrieval("ok");
    let content_type = content_type_for(&path).to_string();
    Ok((
        [(header::CONTENT_TYPE, content_type)],
        Body::from_stream(ReaderStream::new(file)),
    )
        .into_response())
}

/// Content type from the file extension.
pub fn content_type_for(path: &FsPath) -> Mime {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase);
    match ext.as_deref() {
        Some("png") => mime::IMAGE_PNG,
        Some("jpg" | "jpeg") => mime::IMAGE_JPEG,
        Some("gif") => mime::IMAGE_GIF,
        Some("bmp") => mime::IMAGE_BMP,
        _ => mime::APPLICATION_OCTET_STREAM,
    }
}

pub async fn health() -> Json<HealthStatus> {
    Json(HealthStatus::ok())
}
