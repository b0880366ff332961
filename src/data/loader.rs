/// Shuffled mini-batch loader over one index subset
use candle_core::{Device, Tensor};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rayon::prelude::*;
use rayon::ThreadPool;
use std::sync::Arc;

use super::{KaggleMnist, Sample, IMAGE_PIXELS};

/// Batch iterator over a subset of a [`KaggleMnist`] dataset
///
/// The visiting order is a fresh permutation of the subset, drawn when the
/// loader is built and again on every [`reset`](SubsetLoader::reset).
pub struct SubsetLoader {
    dataset: KaggleMnist,
    indices: Vec<usize>,
    order: Vec<usize>,
    batch_size: usize,
    current_idx: usize,
    rng: StdRng,
    pool: Option<Arc<ThreadPool>>,
    pin_memory: bool,
}

impl std::fmt::Debug for SubsetLoader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SubsetLoader")
            .field("dataset", &self.dataset)
            .field("len", &self.indices.len())
            .field("batch_size", &self.batch_size)
            .field("current_idx", &self.current_idx)
            .field("workers", &self.num_workers())
            .field("pin_memory", &self.pin_memory)
            .finish()
    }
}

impl SubsetLoader {
    /// Create new loader over `indices` of `dataset`
    pub fn new(
        dataset: KaggleMnist,
        indices: Vec<usize>,
        batch_size: usize,
        mut rng: StdRng,
    ) -> crate::Result<Self> {
        if batch_size == 0 {
            return Err(crate::MnistError::Config(
                "batch_size must be > 0".to_string(),
            ));
        }

        let mut order = indices.clone();
        order.shuffle(&mut rng);

        Ok(Self {
            dataset,
            indices,
            order,
            batch_size,
            current_idx: 0,
            rng,
            pool: None,
            pin_memory: false,
        })
    }

    /// Fetch samples on a shared worker pool instead of the caller thread
    pub fn with_workers(mut self, pool: Option<Arc<ThreadPool>>) -> Self {
        self.pool = pool;
        self
    }

    /// Record that batches are headed for an accelerator
    ///
    /// Advisory only: candle has no page-locked host allocator, so batches are
    /// built on the target device the same way with or without the flag.
    pub fn with_pin_memory(mut self, pin_memory: bool) -> Self {
        self.pin_memory = pin_memory;
        self
    }

    /// Get next batch (features `[b, 784]` f32, labels `[b]` i64)
    pub fn next_batch(&mut self, device: &Device) -> crate::Result<Option<(Tensor, Tensor)>> {
        if self.current_idx >= self.order.len() {
            return Ok(None);
        }

        let end_idx = (self.current_idx + self.batch_size).min(self.order.len());
        let samples = self.fetch(&self.order[self.current_idx..end_idx])?;
        let actual_batch_size = samples.len();

        let mut feature_data = Vec::with_capacity(actual_batch_size * IMAGE_PIXELS);
        let mut label_data = Vec::with_capacity(actual_batch_size);
        for sample in samples {
            feature_data.extend_from_slice(&sample.features);
            label_data.push(sample.label);
        }

        self.current_idx = end_idx;

        let features = Tensor::from_vec(feature_data, (actual_batch_size, IMAGE_PIXELS), device)?;
        let labels = Tensor::from_vec(label_data, actual_batch_size, device)?;

        Ok(Some((features, labels)))
    }

    fn fetch(&self, batch_indices: &[usize]) -> crate::Result<Vec<Sample>> {
        match &self.pool {
            Some(pool) if batch_indices.len() > 1 => pool.install(|| {
                batch_indices
                    .par_iter()
                    .map(|&idx| self.dataset.get(idx))
                    .collect()
            }),
            _ => batch_indices
                .iter()
                .map(|&idx| self.dataset.get(idx))
                .collect(),
        }
    }

    /// Reset loader for new epoch, with a newly drawn order
    pub fn reset(&mut self) {
        self.current_idx = 0;
        self.order.copy_from_slice(&self.indices);
        self.order.shuffle(&mut self.rng);
    }

    /// Get number of batches
    pub fn num_batches(&self) -> usize {
        (self.indices.len() + self.batch_size - 1) / self.batch_size
    }

    /// Number of samples in the subset
    pub fn len(&self) -> usize {
        self.indices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }

    pub fn batch_size(&self) -> usize {
        self.batch_size
    }

    pub fn num_workers(&self) -> usize {
        self.pool.as_ref().map_or(0, |p| p.current_num_threads())
    }

    pub fn pin_memory(&self) -> bool {
        self.pin_memory
    }

    /// The subset's indices, in split order
    pub fn indices(&self) -> &[usize] {
        &self.indices
    }

    /// Get dataset reference
    pub fn dataset(&self) -> &KaggleMnist {
        &self.dataset
    }
}

impl super::BatchDataLoader for SubsetLoader {
    fn next_batch(&mut self, device: &Device) -> crate::Result<Option<(Tensor, Tensor)>> {
        SubsetLoader::next_batch(self, device)
    }

    fn reset(&mut self) {
        SubsetLoader::reset(self)
    }

    fn num_batches(&self) -> usize {
        SubsetLoader::num_batches(self)
    }
}
