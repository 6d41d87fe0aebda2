// POST /process — upload a corpus and train a new model.
//
// Expects a multipart form with a "file" field holding UTF-8 text, one
// document per line. On success the new model replaces the current one and
// the response lists every axis with its top positive and negative terms.
// On failure the current model is left untouched.

use axum::body::Bytes;
use axum::extract::multipart::{MultipartError, MultipartRejection};
use axum::extract::{Multipart, State};
use axum::response::{IntoResponse, Response};
use axum::Json;

use crate::error::AxisError;
use crate::web::{api_error, AppState};

/// Multipart field carrying the corpus file.
const FILE_FIELD: &str = "file";

/// Error kind for a multipart body that cannot be read.
pub const MALFORMED_UPLOAD: &str = "malformed_upload";

/// POST /process — validate the upload and train on it.
pub async fn process(
    State(state): State<AppState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Response {
    let Ok(mut multipart) = multipart else {
        return AxisError::MissingInput.into_response();
    };

    let payload = match read_file_field(&mut multipart).await {
        Ok(Some(bytes)) => bytes,
        Ok(None) => return AxisError::MissingInput.into_response(),
        Err(e) => {
            tracing::warn!(error = %e, "Malformed multipart upload");
            return api_error(e.status(), MALFORMED_UPLOAD, &e.body_text());
        }
    };

    match state.session.train(state.engine.as_ref(), &payload).await {
        Ok(report) => Json(report).into_response(),
        Err(e) => e.into_response(),
    }
}

/// Find the "file" field. A field without a filename counts as no file.
async fn read_file_field(multipart: &mut Multipart) -> Result<Option<Bytes>, MultipartError> {
    while let Some(field) = multipart.next_field().await? {
        if field.name() != Some(FILE_FIELD) {
            continue;
        }
        if field.file_name().is_none_or(str::is_empty) {
            return Ok(None);
        }
        return field.bytes().await.map(Some);
    }
    Ok(None)
}
