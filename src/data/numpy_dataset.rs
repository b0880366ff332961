/// Kaggle MNIST dataset backed by a cached .npy array
use ndarray::{s, Array2, ArrayView1, Ix3};
use ndarray_npy::ReadNpyExt;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use std::sync::Arc;

use super::convert::CacheFile;
use super::transform::ImageTransform;
use super::{IMAGE_PIXELS, IMAGE_SIDE, LABELED_COLUMNS, UNLABELED, UNLABELED_COLUMNS};

/// One example: a flat 784-pixel image and its label (`UNLABELED` if unknown)
#[derive(Debug, Clone, PartialEq)]
pub struct Sample {
    pub features: Vec<f32>,
    pub label: i64,
}

/// Read-only dataset handle
///
/// Cloning is cheap: the array and transform are shared, so train, validation
/// and test loaders can all point at the same storage.
#[derive(Clone)]
pub struct KaggleMnist {
    data: Arc<Array2<f64>>,
    labeled: bool,
    transform: Option<Arc<dyn ImageTransform>>,
}

impl std::fmt::Debug for KaggleMnist {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KaggleMnist")
            .field("shape", &self.data.shape())
            .field("labeled", &self.labeled)
            .field("transform", &self.transform.is_some())
            .finish()
    }
}

impl KaggleMnist {
    /// Load `train.npy` (labeled) or `test.npy` (unlabeled) from `root`
    pub fn from_directory<P: AsRef<Path>>(
        root: P,
        train: bool,
        transform: Option<Arc<dyn ImageTransform>>,
    ) -> crate::Result<Self> {
        let file = if train { CacheFile::Train } else { CacheFile::Test };
        let path = file.npy_path(root.as_ref());

        log::info!("Loading Kaggle MNIST array from: {:?}", path);

        let reader = BufReader::new(File::open(&path)?);
        let data = <Array2<f64> as ReadNpyExt>::read_npy(reader)?;

        log::info!("Loaded array: shape {:?}", data.shape());

        Ok(Self::from_array(data, train)?.with_transform(transform))
    }

    /// Wrap an in-memory array; labeled rows have 785 columns, unlabeled 784
    pub fn from_array(data: Array2<f64>, labeled: bool) -> crate::Result<Self> {
        let expected = if labeled { LABELED_COLUMNS } else { UNLABELED_COLUMNS };
        if data.ncols() != expected {
            return Err(crate::MnistError::Config(format!(
                "Expected {} columns for {} data, found {}",
                expected,
                if labeled { "labeled" } else { "unlabeled" },
                data.ncols()
            )));
        }

        Ok(Self {
            data: Arc::new(data),
            labeled,
            transform: None,
        })
    }

    /// Same storage, different transform
    pub fn with_transform(mut self, transform: Option<Arc<dyn ImageTransform>>) -> Self {
        self.transform = transform;
        self
    }

    /// Get number of examples
    pub fn len(&self) -> usize {
        self.data.nrows()
    }

    /// Check if empty
    pub fn is_empty(&self) -> bool {
        self.data.nrows() == 0
    }

    /// Whether column 0 holds the label
    pub fn is_labeled(&self) -> bool {
        self.labeled
    }

    /// Get the raw row at index
    pub fn row(&self, idx: usize) -> crate::Result<ArrayView1<'_, f64>> {
        self.check_index(idx)?;
        Ok(self.data.row(idx))
    }

    /// Get the sample at index
    ///
    /// Pixels go through three shapes: the raw 784 values become a `1×28×28`
    /// image, the transform (if any) sees that image, and the result is
    /// flattened back to 784 values.
    pub fn get(&self, idx: usize) -> crate::Result<Sample> {
        self.check_index(idx)?;

        let (pixels, label) = if self.labeled {
            (self.data.slice(s![idx, 1..]), self.data[[idx, 0]] as i64)
        } else {
            (self.data.slice(s![idx, ..]), UNLABELED)
        };

        let mut image = pixels
            .mapv(|x| x as f32)
            .into_shape((1, IMAGE_SIDE, IMAGE_SIDE))?;

        if let Some(transform) = &self.transform {
            image = transform.apply(image)?;
            if image.shape() != [1, IMAGE_SIDE, IMAGE_SIDE] {
                return Err(crate::MnistError::Config(format!(
                    "Transform changed image shape to {:?}",
                    image.shape()
                )));
            }
        }

        let features = flatten(image)?;

        Ok(Sample { features, label })
    }

    fn check_index(&self, idx: usize) -> crate::Result<()> {
        if idx >= self.len() {
            return Err(crate::MnistError::IndexOutOfRange {
                index: idx,
                len: self.len(),
            });
        }
        Ok(())
    }
}

fn flatten(image: ndarray::Array<f32, Ix3>) -> crate::Result<Vec<f32>> {
    let image = if image.is_standard_layout() {
        image
    } else {
        image.as_standard_layout().into_owned()
    };
    Ok(image.into_shape(IMAGE_PIXELS)?.to_vec())
}
