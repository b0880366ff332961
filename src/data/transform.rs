/// Per-sample image transforms
use ndarray::Array3;

/// A pure image -> image function applied to each `1×28×28` sample
pub trait ImageTransform: Send + Sync {
    fn apply(&self, image: Array3<f32>) -> crate::Result<Array3<f32>>;
}

/// Standardize pixels with a fixed mean and standard deviation
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Normalize {
    pub mean: f32,
    pub std: f32,
}

impl Normalize {
    pub fn new(mean: f32, std: f32) -> crate::Result<Self> {
        if !(std.is_finite() && std > 0.0) || !mean.is_finite() {
            return Err(crate::MnistError::Config(format!(
                "Normalize needs a finite mean and a positive std, got mean={} std={}",
                mean, std
            )));
        }
        Ok(Self { mean, std })
    }

    /// Mean and std of the MNIST training pixels (scaled to [0, 1])
    pub fn mnist() -> Self {
        Self {
            mean: 0.1307,
            std: 0.3081,
        }
    }
}

impl ImageTransform for Normalize {
    fn apply(&self, image: Array3<f32>) -> crate::Result<Array3<f32>> {
        Ok(image.mapv_into(|x| (x - self.mean) / self.std))
    }
}
