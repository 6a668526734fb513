use std::{env, net::IpAddr, path::PathBuf};

use crate::model::ArtifactPaths;

const DEFAULT_ARTIFACT_DIR: &str = "../summative/linear_regression";

#[derive(Debug, Clone)]
pub struct Config {
    pub artifacts: ArtifactPaths,
    pub host: IpAddr,
    pub port: u16,
    /// Log a summary of every incoming feature vector.
    pub log_pred: bool,
}

impl Config {
    pub fn from_env() -> Self {
        Self::from_lookup(|k| env::var(k).ok())
    }

    /// Same as `from_env` but with an injectable source, for tests.
    pub fn from_lookup(get: impl Fn(&str) -> Option<String>) -> Self {
        let dir = PathBuf::from(get("ARTIFACT_DIR").unwrap_or_else(|| DEFAULT_ARTIFACT_DIR.to_string()));
        let path_or = |key: &str, file: &str| get(key).map(PathBuf::from).unwrap_or_else(|| dir.join(file));

        let artifacts = ArtifactPaths {
            model: path_or("MODEL_PATH", "model.json"),
            scaler: path_or("SCALER_PATH", "scaler.json"),
            meta: path_or("META_PATH", "meta.json"),
        };

        Self {
            artifacts,
            host: parse_or(&get, "BIND_ADDR", IpAddr::from([0, 0, 0, 0])),
            port: parse_or(&get, "PORT", 8000),
            log_pred: get("LOG_PRED").as_deref() == Some("1"),
        }
    }
}

fn parse_or<T: std::str::FromStr + std::fmt::Display>(
    get: &impl Fn(&str) -> Option<String>,
    key: &str,
    default: T,
) -> T {
    match get(key) {
        None => default,
        Some(raw) => raw.parse().unwrap_or_else(|_| {
            tracing::warn!("{}={:?} is not valid; using {}", key, raw, default);
            default
        }),
    }
}
