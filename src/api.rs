use axum::{
    body::Bytes,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde_json::{json, Map, Value};
use std::sync::Arc;

use crate::features::{self, CodecError, FEATURE_COUNT, FEATURE_NAMES};
use crate::model::ArtifactStore;
use crate::predict::{self, PredictError};
use crate::types::{FeaturesOut, HealthOut, PredictionOut, RootOut, SERVICE_NAME, VERSION};

// ---------- Server state ----------

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<ArtifactStore>,
    pub log_pred: bool,
}

impl AppState {
    pub fn new(store: ArtifactStore) -> Self {
        Self {
            store: Arc::new(store),
            log_pred: false,
        }
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(root))
        .route("/health", get(health))
        .route("/features", get(list_features))
        .route("/predict", post(predict_recession))
        .with_state(state)
}

// ---------- Errors ----------

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error(transparent)]
    Validation(#[from] CodecError),
    #[error("{0}")]
    MalformedBody(String),
    #[error(transparent)]
    Predict(#[from] PredictError),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, detail) = match &self {
            ApiError::Validation(CodecError(fields)) => {
                let detail: Vec<Value> = fields
                    .iter()
                    .map(|f| json!({ "loc": ["body", f.field], "msg": f.msg, "type": "value_error" }))
                    .collect();
                (StatusCode::UNPROCESSABLE_ENTITY, Value::from(detail))
            }
            ApiError::MalformedBody(msg) => (StatusCode::UNPROCESSABLE_ENTITY, json!(msg)),
            ApiError::Predict(e) => (StatusCode::INTERNAL_SERVER_ERROR, json!(e.to_string())),
        };
        (status, Json(json!({ "detail": detail }))).into_response()
    }
}

// ---------- Handlers ----------

async fn root(State(state): State<AppState>) -> Json<RootOut> {
    Json(RootOut {
        message: SERVICE_NAME,
        status: "healthy",
        model_loaded: state.store.is_loaded(),
        version: VERSION,
    })
}

async fn health(State(state): State<AppState>) -> Json<HealthOut> {
    Json(HealthOut {
        status: "healthy",
        model_status: if state.store.is_loaded() { "loaded" } else { "not_loaded" },
        features_count: FEATURE_COUNT,
        features: FEATURE_NAMES[..5].to_vec(),
    })
}

async fn list_features() -> Json<FeaturesOut> {
    Json(FeaturesOut {
        features: FEATURE_NAMES.to_vec(),
        required_inputs: FEATURE_NAMES.to_vec(),
    })
}

async fn predict_recession(
    State(state): State<AppState>,
    payload: Bytes,
) -> Result<Json<PredictionOut>, ApiError> {
    // parsed regardless of content-type, clients often omit the header
    let body: Value = serde_json::from_slice(&payload)
        .map_err(|e| ApiError::MalformedBody(format!("invalid JSON body: {}", e)))?;
    let record: Map<String, Value> = match body {
        Value::Object(m) => m,
        other => {
            return Err(ApiError::MalformedBody(format!(
                "expected a JSON object of features, got {}",
                json_kind(&other)
            )))
        }
    };

    // Map incoming flat record -> ordered vector
    let vec = features::order_from_record(&record)?;

    if state.log_pred {
        log_vector(&vec);
    }

    let pred = predict::predict(&state.store, &vec)?;
    tracing::debug!(
        "predicted p={:.4} likelihood={} confidence={:.2}",
        pred.raw,
        pred.likelihood.as_str(),
        pred.confidence
    );
    Ok(Json(pred.into()))
}

fn json_kind(v: &Value) -> &'static str {
    match v {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

/// Summary line so we can confirm callers aren't sending all-zeros.
fn log_vector(vec: &[f64]) {
    let n = vec.len() as f64;
    let nz = vec.iter().filter(|x| **x != 0.0).count();
    let mean = if vec.is_empty() { 0.0 } else { vec.iter().sum::<f64>() / n };
    let std = if vec.len() < 2 {
        0.0
    } else {
        (vec.iter().map(|x| (x - mean) * (x - mean)).sum::<f64>() / n).sqrt()
    };
    let sample: Vec<String> = FEATURE_NAMES
        .iter()
        .zip(vec)
        .take(6)
        .map(|(name, x)| format!("{}={:.3}", name, x))
        .collect();
    tracing::info!(
        "recv in_dim={} nonzero={} mean={:.3} std={:.3} sample=[{}]",
        vec.len(),
        nz,
        mean,
        std,
        sample.join(", ")
    );
}
