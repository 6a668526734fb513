use anyhow::{bail, Context, Result};
use std::path::Path;
use tch::{kind::Kind, CModule, Device, Tensor};

use crate::model::Regressor;

/// Regression head exported with `torch.jit.script`; `[1, in_dim] -> one scalar`.
pub struct TorchScriptModel {
    model: CModule,
    device: Device,
    in_dim: usize,
}

impl TorchScriptModel {
    pub fn load(path: &Path, in_dim: usize) -> Result<Self> {
        let device = Device::Cpu;
        let model = CModule::load_on_device(path, device)
            .with_context(|| format!("failed to load TorchScript {}", path.display()))?;

        // Probe output shape with a dummy forward
        let dummy = Tensor::zeros([1, in_dim as i64], (Kind::Float, device));
        let t = model.forward_ts(&[dummy])?;
        if t.numel() != 1 {
            bail!("unexpected model output size: {:?}", t.size());
        }

        Ok(Self {
            model,
            device,
            in_dim,
        })
    }
}

impl Regressor for TorchScriptModel {
    fn n_features(&self) -> usize {
        self.in_dim
    }

    fn predict_row(&self, x: &[f64]) -> Result<f64> {
        if x.len() != self.in_dim {
            bail!(
                "feature length mismatch: got {}, expected {}",
                x.len(),
                self.in_dim
            );
        }
        let row: Vec<f32> = x.iter().map(|v| *v as f32).collect();
        let input = Tensor::from_slice(&row)
            .reshape([1, self.in_dim as i64])
            .to_device(self.device);

        let t = self.model.forward_ts(&[input])?;
        if t.numel() != 1 {
            bail!("unexpected model output size: {:?}", t.size());
        }
        Ok(t.reshape([1]).to_kind(Kind::Double).double_value(&[0]))
    }
}
