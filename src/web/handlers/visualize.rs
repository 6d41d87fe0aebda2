// POST /visualize — scatter dataset for two axes of the current model.
//
// Body: optional JSON {"axis_x": int, "axis_y": int}; missing fields (or an
// empty body) default to axes 0 and 1. Integers sent as strings ("3") are
// accepted.

use axum::body::Bytes;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Deserializer};

use crate::web::{api_error, AppState};

pub const DEFAULT_AXIS_X: i64 = 0;
pub const DEFAULT_AXIS_Y: i64 = 1;

/// Error kind for a body that is not a valid visualize request.
pub const INVALID_REQUEST: &str = "invalid_request";

#[derive(Deserialize, Default, Debug, PartialEq)]
pub struct VisualizeRequest {
    #[serde(default, deserialize_with = "lenient_index")]
    pub axis_x: Option<i64>,
    #[serde(default, deserialize_with = "lenient_index")]
    pub axis_y: Option<i64>,
}

impl VisualizeRequest {
    /// Parse a request body. Empty or whitespace-only bodies use the defaults.
    pub fn from_body(body: &[u8]) -> Result<Self, serde_json::Error> {
        if body.iter().all(u8::is_ascii_whitespace) {
            return Ok(Self::default());
        }
        serde_json::from_slice(body)
    }
}

/// Accept an axis index as a JSON integer or a string holding one.
fn lenient_index<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Int(i64),
        Text(String),
    }

    match Option::<Raw>::deserialize(deserializer)? {
        None => Ok(None),
        Some(Raw::Int(i)) => Ok(Some(i)),
        Some(Raw::Text(s)) => s
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| serde::de::Error::custom(format!("axis index must be an integer, got {s:?}"))),
    }
}

/// POST /visualize — reduce the current model to a plottable term set.
///
/// An untrained session is reported before the body is looked at.
pub async fn visualize(State(state): State<AppState>, body: Bytes) -> Response {
    if let Err(e) = state.session.current().await {
        return e.into_response();
    }

    let request = match VisualizeRequest::from_body(&body) {
        Ok(r) => r,
        Err(e) => {
            return api_error(
                StatusCode::BAD_REQUEST,
                INVALID_REQUEST,
                &format!("Invalid request body: {e}"),
            );
        }
    };

    let axis_x = request.axis_x.unwrap_or(DEFAULT_AXIS_X);
    let axis_y = request.axis_y.unwrap_or(DEFAULT_AXIS_Y);

    match state.session.visualize(axis_x, axis_y).await {
        Ok(plot) => Json(plot).into_response(),
        Err(e) => e.into_response(),
    }
}
