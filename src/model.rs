use anyhow::{bail, Context, Result};
use serde::Deserialize;
use std::{fs, path::Path, path::PathBuf};

use crate::features::{FEATURE_COUNT, FEATURE_NAMES};

// ---------- Artifact files ----------

#[derive(Deserialize)]
struct MetaJson {
    feat_list: Vec<String>,
    in_dim: Option<usize>,
}

#[derive(Debug, Clone)]
pub struct ArtifactPaths {
    pub model: PathBuf,
    pub scaler: PathBuf,
    pub meta: PathBuf,
}

fn read_json<T: serde::de::DeserializeOwned>(path: &Path, what: &str) -> Result<T> {
    let txt = fs::read_to_string(path)
        .with_context(|| format!("failed to read {} at {}", what, path.display()))?;
    serde_json::from_str(&txt).with_context(|| format!("failed to parse {}", path.display()))
}

// ---------- Scaler ----------

/// Per-column standardization `(x - mean) / scale`, fit offline.
#[derive(Debug, Clone)]
pub struct StandardScaler {
    mean: Vec<f64>,
    scale: Vec<f64>,
}

#[derive(Deserialize)]
struct ScalerJson {
    mean: Vec<f64>,
    scale: Vec<f64>,
}

impl StandardScaler {
    pub fn new(mean: Vec<f64>, scale: Vec<f64>) -> Result<Self> {
        if mean.len() != scale.len() {
            bail!(
                "scaler mean/scale length mismatch: {} vs {}",
                mean.len(),
                scale.len()
            );
        }
        // constant columns were fit with scale 0; the toolkit divides by 1 instead
        let scale = scale
            .into_iter()
            .map(|s| if s == 0.0 { 1.0 } else { s })
            .collect();
        Ok(Self { mean, scale })
    }

    pub fn load(path: &Path) -> Result<Self> {
        let raw: ScalerJson = read_json(path, "scaler")?;
        Self::new(raw.mean, raw.scale)
    }

    pub fn width(&self) -> usize {
        self.mean.len()
    }

    /// Transform a single row.
    pub fn transform(&self, x: &[f64]) -> Result<Vec<f64>> {
        if x.len() != self.width() {
            bail!(
                "feature length mismatch: got {}, expected {}",
                x.len(),
                self.width()
            );
        }
        Ok(x
            .iter()
            .zip(self.mean.iter().zip(&self.scale))
            .map(|(x, (m, s))| (x - m) / s)
            .collect())
    }
}

// ---------- Regression model ----------

/// Anything that maps one normalized row to a single score.
pub trait Regressor: Send + Sync {
    fn n_features(&self) -> usize;
    fn predict_row(&self, x: &[f64]) -> Result<f64>;
}

/// Ordinary linear regression exported as coefficients + intercept.
#[derive(Debug, Clone, Deserialize)]
pub struct LinearModel {
    pub coefficients: Vec<f64>,
    pub intercept: f64,
}

impl LinearModel {
    pub fn load(path: &Path) -> Result<Self> {
        read_json(path, "model")
    }
}

impl Regressor for LinearModel {
    fn n_features(&self) -> usize {
        self.coefficients.len()
    }

    fn predict_row(&self, x: &[f64]) -> Result<f64> {
        if x.len() != self.coefficients.len() {
            bail!(
                "model expects {} features, got {}",
                self.coefficients.len(),
                x.len()
            );
        }
        let dot: f64 = x.iter().zip(&self.coefficients).map(|(a, b)| a * b).sum();
        Ok(dot + self.intercept)
    }
}

fn load_regressor(path: &Path, in_dim: usize) -> Result<Box<dyn Regressor>> {
    let is_torchscript = matches!(
        path.extension().and_then(|e| e.to_str()),
        Some("pt") | Some("ts")
    );
    if is_torchscript {
        #[cfg(feature = "torchscript")]
        {
            let m = crate::torchscript::TorchScriptModel::load(path, in_dim)?;
            return Ok(Box::new(m));
        }
        #[cfg(not(feature = "torchscript"))]
        {
            let _ = in_dim;
            bail!(
                "{} is a TorchScript module; rebuild with the `torchscript` feature",
                path.display()
            );
        }
    }
    Ok(Box::new(LinearModel::load(path)?))
}

// ---------- Store ----------

/// Loaded once at startup, read-only afterwards.
pub enum ArtifactStore {
    Loaded {
        scaler: StandardScaler,
        model: Box<dyn Regressor>,
    },
    Unloaded {
        reason: String,
    },
}

impl std::fmt::Debug for ArtifactStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ArtifactStore::Loaded { scaler, model } => f
                .debug_struct("Loaded")
                .field("scaler_width", &scaler.width())
                .field("model_features", &model.n_features())
                .finish(),
            ArtifactStore::Unloaded { reason } => {
                f.debug_struct("Unloaded").field("reason", reason).finish()
            }
        }
    }
}

impl ArtifactStore {
    /// Never fails: a broken artifact set yields `Unloaded` and the reason is logged.
    pub fn load(paths: &ArtifactPaths) -> Self {
        match Self::try_load(paths) {
            Ok(store) => {
                tracing::info!("Model and preprocessing objects loaded successfully");
                store
            }
            Err(e) => {
                tracing::error!("Error loading model or scaler: {:#}", e);
                ArtifactStore::Unloaded {
                    reason: format!("{:#}", e),
                }
            }
        }
    }

    fn try_load(paths: &ArtifactPaths) -> Result<Self> {
        let meta: MetaJson = read_json(&paths.meta, "meta")?;
        check_feature_order(&meta.feat_list)?;
        if let Some(in_dim) = meta.in_dim {
            if in_dim != FEATURE_COUNT {
                bail!("meta.in_dim ({}) != schema width ({})", in_dim, FEATURE_COUNT);
            }
        }

        let scaler = StandardScaler::load(&paths.scaler)?;
        let model = load_regressor(&paths.model, FEATURE_COUNT)?;
        Self::from_parts(scaler, model)
    }

    /// Checks widths and runs one all-zero warmup row.
    pub fn from_parts(scaler: StandardScaler, model: Box<dyn Regressor>) -> Result<Self> {
        if scaler.width() != FEATURE_COUNT {
            bail!(
                "scaler width ({}) != schema width ({})",
                scaler.width(),
                FEATURE_COUNT
            );
        }
        if model.n_features() != FEATURE_COUNT {
            bail!(
                "model width ({}) != schema width ({})",
                model.n_features(),
                FEATURE_COUNT
            );
        }

        let row = scaler.transform(&[0.0; FEATURE_COUNT])?;
        let p = model.predict_row(&row).context("warmup forward failed")?;
        tracing::info!("warmup forward ok (p={:.4})", p);

        Ok(ArtifactStore::Loaded { scaler, model })
    }

    pub fn unloaded(reason: impl Into<String>) -> Self {
        ArtifactStore::Unloaded {
            reason: reason.into(),
        }
    }

    pub fn is_loaded(&self) -> bool {
        matches!(self, ArtifactStore::Loaded { .. })
    }
}

fn check_feature_order(feat_list: &[String]) -> Result<()> {
    if feat_list.len() != FEATURE_COUNT {
        bail!(
            "artifact feat_list has {} columns, schema has {}",
            feat_list.len(),
            FEATURE_COUNT
        );
    }
    if let Some((i, (got, want))) = feat_list
        .iter()
        .zip(FEATURE_NAMES)
        .enumerate()
        .find(|(_, (got, want))| got.as_str() != *want)
    {
        bail!(
            "feature order mismatch at column {}: artifacts have {:?}, schema has {:?}",
            i,
            got,
            want
        );
    }
    Ok(())
}
