use crate::model::ArtifactStore;

// ---------- Likelihood bands ----------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Likelihood {
    High,
    Moderate,
    Low,
    VeryLow,
}

impl Likelihood {
    /// Thresholds on the raw score, checked top-down.
    pub fn classify(p: f64) -> Self {
        if p < -1.0 {
            Likelihood::High
        } else if p < 0.0 {
            Likelihood::Moderate
        } else if p < 1.0 {
            Likelihood::Low
        } else {
            Likelihood::VeryLow
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Likelihood::High => "High",
            Likelihood::Moderate => "Moderate",
            Likelihood::Low => "Low",
            Likelihood::VeryLow => "Very Low",
        }
    }

    pub fn interpretation(&self) -> &'static str {
        match self {
            Likelihood::High => "Strong indicators suggest high recession risk.",
            Likelihood::Moderate => "Some indicators suggest moderate recession risk.",
            Likelihood::Low => "Economic indicators show low recession risk.",
            Likelihood::VeryLow => "Strong economic performance, very low recession risk.",
        }
    }
}

/// `min(|p| * 0.3, 1.0)` rounded to two decimals.
///
/// A fixed heuristic on the distance from zero, not a calibrated
/// probability. Kept as-is so existing clients see the same numbers.
pub fn confidence(p: f64) -> f64 {
    let c = (p.abs() * 0.3).min(1.0);
    // round the stored binary value; `c * 100.0` can land on an exact .5
    format!("{:.2}", c).parse().unwrap_or(c)
}

// ---------- Service ----------

pub const NOT_LOADED: &str = "Model or scaler not loaded.";

#[derive(Debug, thiserror::Error)]
pub enum PredictError {
    #[error("{}", NOT_LOADED)]
    ServiceUnavailable,
    #[error("{0}")]
    Inference(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Prediction {
    pub raw: f64,
    pub likelihood: Likelihood,
    pub confidence: f64,
}

impl Prediction {
    pub fn from_raw(raw: f64) -> Self {
        Self {
            raw,
            likelihood: Likelihood::classify(raw),
            confidence: confidence(raw),
        }
    }
}

/// Scale one ordered feature row, run the model, band the score.
pub fn predict(store: &ArtifactStore, x: &[f64]) -> Result<Prediction, PredictError> {
    let (scaler, model) = match store {
        ArtifactStore::Loaded { scaler, model } => (scaler, model),
        ArtifactStore::Unloaded { .. } => return Err(PredictError::ServiceUnavailable),
    };

    let raw = scaler
        .transform(x)
        .and_then(|row| model.predict_row(&row))
        .map_err(|e| {
            tracing::error!("Prediction error: {:#}", e);
            PredictError::Inference(format!("{:#}", e))
        })?;

    if !raw.is_finite() {
        tracing::error!("Prediction error: non-finite model output {}", raw);
        return Err(PredictError::Inference(format!(
            "model produced a non-finite prediction ({})",
            raw
        )));
    }

    Ok(Prediction::from_raw(raw))
}
