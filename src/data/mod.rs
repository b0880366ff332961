/// Data preparation for Kaggle MNIST
pub mod convert;
pub mod loader;
pub mod numpy_dataset;
pub mod prepare;
pub mod split;
pub mod transform;

pub use convert::{convert_csv, process_csv, CacheFile, ConvertOutcome};
pub use loader::SubsetLoader;
pub use numpy_dataset::{KaggleMnist, Sample};
pub use prepare::{prepare_data, prepare_data_with_rng, PreparedLoaders};
pub use split::{split_indices, IndexSplit};
pub use transform::{ImageTransform, Normalize};

use candle_core::{Device, Tensor};

/// Images are square, single channel
pub const IMAGE_SIDE: usize = 28;
pub const IMAGE_PIXELS: usize = IMAGE_SIDE * IMAGE_SIDE;

/// Label column followed by the pixels
pub const LABELED_COLUMNS: usize = IMAGE_PIXELS + 1;
pub const UNLABELED_COLUMNS: usize = IMAGE_PIXELS;

/// Label reported for rows without one
pub const UNLABELED: i64 = -1;

/// Generic data loader trait
pub trait BatchDataLoader {
    /// Get next batch of (features, labels) tensors
    fn next_batch(&mut self, device: &Device) -> crate::Result<Option<(Tensor, Tensor)>>;

    /// Reset loader for new epoch
    fn reset(&mut self);

    /// Get total number of batches
    fn num_batches(&self) -> usize;
}
