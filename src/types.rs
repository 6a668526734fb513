use serde::Serialize;

use crate::predict::Prediction;

pub const SERVICE_NAME: &str = "African Recession Prediction API";
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[derive(Debug, Serialize)]
pub struct RootOut {
    pub message: &'static str,
    pub status: &'static str,
    pub model_loaded: bool,
    pub version: &'static str,
}

#[derive(Debug, Serialize)]
pub struct HealthOut {
    pub status: &'static str,
    pub model_status: &'static str, // "loaded" | "not_loaded"
    pub features_count: usize,
    pub features: Vec<&'static str>,
}

#[derive(Debug, Serialize)]
pub struct FeaturesOut {
    pub features: Vec<&'static str>,
    pub required_inputs: Vec<&'static str>,
}

#[derive(Debug, Serialize)]
pub struct PredictionOut {
    pub prediction: f64,
    pub recession_likelihood: &'static str,
    pub confidence: f64,
    pub interpretation: &'static str,
}

impl From<Prediction> for PredictionOut {
    fn from(p: Prediction) -> Self {
        Self {
            prediction: p.raw,
            recession_likelihood: p.likelihood.as_str(),
            confidence: p.confidence,
            interpretation: p.likelihood.interpretation(),
        }
    }
}
