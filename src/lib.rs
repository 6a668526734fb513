//! HTTP service scoring recession risk from a fixed set of macroeconomic
//! indicators with a pre-fitted scaler and regression model.

pub mod api;
pub mod config;
pub mod features;
pub mod model;
pub mod predict;
#[cfg(feature = "torchscript")]
pub mod torchscript;
pub mod types;
