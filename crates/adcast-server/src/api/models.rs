use std::sync::Arc;

use adcast_model::ModelBundle;
use axum::{extract::State, Extension, Json};
use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::middleware::RequestId;

use super::{ApiError, ApiResponse, AppState, ResponseMeta};

#[derive(Debug, Serialize)]
pub(super) struct ModelInfo {
    features: usize,
    schema_fingerprint: String,
    columns: Vec<String>,
    targets: Vec<String>,
    loaded_at: DateTime<Utc>,
}

impl From<&ModelBundle> for ModelInfo {
    fn from(bundle: &ModelBundle) -> Self {
        Self {
            features: bundle.schema().len(),
            schema_fingerprint: bundle.schema().fingerprint().to_string(),
            columns: bundle.schema().columns().to_vec(),
            targets: bundle.targets().map(ToOwned::to_owned).collect(),
            loaded_at: bundle.loaded_at(),
        }
    }
}

pub(super) async fn model_info(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
) -> Json<ApiResponse<ModelInfo>> {
    let bundle = state.registry.current().await;
    Json(ApiResponse {
        data: ModelInfo::from(bundle.as_ref()),
        meta: ResponseMeta::new(req_id.0),
    })
}

/// Re-read the artifact directory and swap the live bundle.
///
/// On any failure the previous bundle stays in service.
pub(super) async fn reload_models(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
) -> Result<Json<ApiResponse<ModelInfo>>, ApiError> {
    let store = state.store.clone();
    let targets = Arc::clone(&state.targets);

    let loaded = tokio::task::spawn_blocking(move || store.load_bundle(&targets))
        .await
        .map_err(|e| {
            tracing::error!(error = %e, "model reload task failed");
            ApiError::new(req_id.0.clone(), "internal_error", "model reload failed")
        })?
        .map_err(|e| {
            tracing::error!(error = %e, "model reload failed; keeping current models");
            ApiError::new(
                req_id.0.clone(),
                "internal_error",
                format!("model reload failed: {e}"),
            )
        })?;

    let info = ModelInfo::from(&loaded);
    let previous = state.registry.swap(loaded).await;
    tracing::info!(
        previous = previous.schema().fingerprint(),
        current = %info.schema_fingerprint,
        features = info.features,
        "models reloaded"
    );

    Ok(Json(ApiResponse {
        data: info,
        meta: ResponseMeta::new(req_id.0),
    }))
}
