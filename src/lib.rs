//! Kaggle MNIST data preparation
//!
//! Turns the Kaggle digit-recognizer CSV export into cached `.npy` arrays and
//! serves shuffled mini-batches over train/validation/test index subsets.
//!
//! # Pipeline
//!
//! - **Convert**: `train.csv`/`test.csv` are parsed once and cached as `train.npy`/`test.npy`
//! - **Load**: a cached array becomes a read-only [`KaggleMnist`] handle
//! - **Split**: row indices are partitioned with independent per-row draws
//! - **Batch**: each subset gets its own shuffled [`SubsetLoader`]
//!
//! # Example
//!
//! ```ignore
//! use kaggle_mnist::{prepare_data, DataConfig};
//!
//! let config = DataConfig::default();
//! let loaders = prepare_data(&config)?;
//! if loaders.validation.is_none() {
//!     // every non-test row went to train
//! }
//! ```

use std::path::PathBuf;

pub mod config;
pub mod data;

// Re-export commonly used items
pub use config::DataConfig;
pub use data::{
    prepare_data, prepare_data_with_rng, process_csv, split_indices, IndexSplit, KaggleMnist,
    Normalize, PreparedLoaders, Sample, SubsetLoader, UNLABELED,
};

/// Library error types
#[derive(Debug, thiserror::Error)]
pub enum MnistError {
    #[error("Candle error: {0}")]
    Candle(#[from] candle_core::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Source file not found: {0:?}")]
    SourceMissing(PathBuf),

    #[error("Parse error in {path:?} at line {line}: {message}")]
    Parse {
        path: PathBuf,
        line: u64,
        message: String,
    },

    #[error("Index {index} out of range for dataset of size {len}")]
    IndexOutOfRange { index: usize, len: usize },

    #[error("Shape error: {0}")]
    Shape(#[from] ndarray::ShapeError),

    #[error("Failed to read .npy: {0}")]
    ReadNpy(#[from] ndarray_npy::ReadNpyError),

    #[error("Failed to write .npy: {0}")]
    WriteNpy(#[from] ndarray_npy::WriteNpyError),

    #[error("Worker pool error: {0}")]
    WorkerPool(#[from] rayon::ThreadPoolBuildError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, MnistError>;
