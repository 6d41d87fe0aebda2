// GET /status — whether a model is trained, and what it was trained on.

use axum::extract::State;
use axum::response::IntoResponse;
use axum::Json;

use crate::web::AppState;

pub async fn get_status(State(state): State<AppState>) -> impl IntoResponse {
    let status = state.session.status().await;
    let params = state.session.params();

    Json(serde_json::json!({
        "trained": status.trained,
        "engine": status.engine,
        "trained_at": status.trained_at,
        "n_documents": status.n_documents,
        "vocabulary_size": status.vocabulary_size,
        "axis_count": status.axis_count,
        "configured_engine": state.engine.name(),
        "max_iter": params.max_iter,
        "feature_importance": params.feature_importance.as_str(),
    }))
}
