/// Configuration for dataset preparation
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

/// Where the files live, how to split them and how to batch them
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct DataConfig {
    /// Directory holding train.csv/test.csv and their .npy caches
    pub data_folder: PathBuf,

    /// Probability that a row lands in the test subset
    pub test_split: f64,

    /// Probability that a non-test row lands in train (otherwise validation)
    pub train_split: f64,

    /// Batch size for the train loader
    pub batch_size: usize,

    /// Batch size for the validation and test loaders
    pub test_batch_size: usize,

    /// Worker threads used to fetch samples (0 = fetch on the caller thread)
    pub num_workers: usize,

    /// Whether batches are headed for a CUDA device
    pub use_cuda: bool,

    /// Seed for the split and shuffles; `None` draws from the thread RNG
    pub seed: Option<u64>,
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            data_folder: PathBuf::from("./data/"),
            test_split: 0.1,
            train_split: 0.9,
            batch_size: 64,
            test_batch_size: 1000,
            num_workers: 2,
            use_cuda: false,
            seed: None,
        }
    }
}

impl DataConfig {
    /// Load configuration from a JSON file; absent fields keep their defaults
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> crate::Result<Self> {
        let file = File::open(path.as_ref())?;
        let config: Self = serde_json::from_reader(BufReader::new(file))?;
        config.validate()?;
        Ok(config)
    }

    /// Validate configuration
    pub fn validate(&self) -> crate::Result<()> {
        if self.data_folder.as_os_str().is_empty() {
            return Err(crate::MnistError::Config(
                "data_folder must not be empty".to_string(),
            ));
        }

        for (name, value) in [("test_split", self.test_split), ("train_split", self.train_split)] {
            if !(0.0..=1.0).contains(&value) {
                return Err(crate::MnistError::Config(format!(
                    "{} must be within [0, 1], got {}",
                    name, value
                )));
            }
        }

        if self.batch_size == 0 || self.test_batch_size == 0 {
            return Err(crate::MnistError::Config(
                "batch_size and test_batch_size must be > 0".to_string(),
            ));
        }

        Ok(())
    }

    /// Pinned host memory only pays off when batches go to a GPU
    pub fn pin_memory(&self) -> bool {
        self.use_cuda
    }
}
