use adcast_model::{Prediction, Record};
use axum::{body::Bytes, extract::State, Extension, Json};

use crate::middleware::RequestId;

use super::{map_model_error, ApiError, AppState};

/// `POST /predict`: one prediction per loaded model, keyed `predicted_<target>`.
///
/// The body is parsed as JSON whatever the declared content type.
pub(super) async fn predict(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    body: Bytes,
) -> Result<Json<Prediction>, ApiError> {
    let payload: serde_json::Value = serde_json::from_slice(&body).map_err(|e| {
        ApiError::new(
            req_id.0.clone(),
            "validation_error",
            format!("request body is not valid JSON: {e}"),
        )
    })?;
    let record = Record::from_json(&payload)
        .map_err(|e| ApiError::new(req_id.0.clone(), "validation_error", e.to_string()))?;

    let bundle = state.registry.current().await;
    let prediction = bundle
        .predict_record(&record)
        .map_err(|e| map_model_error(req_id.0.clone(), &e))?;

    tracing::debug!(
        request_id = %req_id.0,
        fields = record.len(),
        targets = prediction.len(),
        "prediction served"
    );
    Ok(Json(prediction))
}
