/// End-to-end preparation: convert, load, split, batch
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::sync::Arc;

use super::{process_csv, split_indices, KaggleMnist, Normalize, SubsetLoader};
use crate::DataConfig;

/// Loaders handed to the training loop
#[derive(Debug)]
pub struct PreparedLoaders {
    pub train: SubsetLoader,
    /// `None` when every non-test row was assigned to train
    pub validation: Option<SubsetLoader>,
    pub test: SubsetLoader,
}

/// Prepare loaders, seeding from `config.seed` or the thread RNG
pub fn prepare_data(config: &DataConfig) -> crate::Result<PreparedLoaders> {
    match config.seed {
        Some(seed) => prepare_data_with_rng(config, &mut StdRng::seed_from_u64(seed)),
        None => prepare_data_with_rng(config, &mut rand::thread_rng()),
    }
}

/// Prepare loaders using `rng` for the split and for every loader's shuffle
///
/// All three loaders read the labeled `train.npy` storage; the test loader
/// uses the test-split indices of that array, not `test.npy`.
pub fn prepare_data_with_rng<R: Rng + ?Sized>(
    config: &DataConfig,
    rng: &mut R,
) -> crate::Result<PreparedLoaders> {
    config.validate()?;

    for (file, outcome) in process_csv(&config.data_folder)? {
        log::info!("{}: {:?}", file.stem(), outcome);
    }

    let transform: Arc<dyn super::ImageTransform> = Arc::new(Normalize::mnist());
    let dataset = KaggleMnist::from_directory(&config.data_folder, true, Some(transform))?;

    let split = split_indices(dataset.len(), config.test_split, config.train_split, rng)?;
    let (n_train, n_val, n_test) = split.sizes();
    log::info!(
        "Split {} rows: train={}, validation={}, test={}",
        dataset.len(),
        n_train,
        n_val,
        n_test
    );

    let pool = if config.num_workers > 0 {
        Some(Arc::new(
            rayon::ThreadPoolBuilder::new()
                .num_threads(config.num_workers)
                .thread_name(|i| format!("mnist-loader-{}", i))
                .build()?,
        ))
    } else {
        None
    };
    let pin_memory = config.pin_memory();

    let mut make_loader = |indices: Vec<usize>, batch_size: usize| {
        SubsetLoader::new(
            dataset.clone(),
            indices,
            batch_size,
            StdRng::seed_from_u64(rng.gen()),
        )
        .map(|loader| loader.with_workers(pool.clone()).with_pin_memory(pin_memory))
    };

    let train = make_loader(split.train, config.batch_size)?;
    let validation = match split.validation {
        Some(indices) => Some(make_loader(indices, config.test_batch_size)?),
        None => {
            log::warn!("No rows left for validation; validation loader is absent");
            None
        }
    };
    let test = make_loader(split.test, config.test_batch_size)?;

    Ok(PreparedLoaders {
        train,
        validation,
        test,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::test_support::{labeled_row, scratch_dir, unlabeled_row, write_csv};
    use crate::data::{LABELED_COLUMNS, UNLABELED_COLUMNS};
    use candle_core::Device;
    use std::collections::HashSet;

    fn fixture(name: &str, rows: usize) -> DataConfig {
        let dir = scratch_dir(name);
        let train: Vec<Vec<String>> = (0..rows).map(|r| labeled_row((r % 10) as i64, 0.0)).collect();
        write_csv(&dir.join("train.csv"), LABELED_COLUMNS, &train);
        write_csv(&dir.join("test.csv"), UNLABELED_COLUMNS, &[unlabeled_row(0.0)]);

        DataConfig {
            data_folder: dir,
            batch_size: 8,
            test_batch_size: 16,
            num_workers: 2,
            seed: Some(3),
            ..DataConfig::default()
        }
    }

    #[test]
    fn test_prepare_end_to_end() -> crate::Result<()> {
        let config = DataConfig {
            test_split: 0.3,
            train_split: 0.6,
            ..fixture("prepare_e2e", 60)
        };
        let mut loaders = prepare_data(&config)?;

        assert!(config.data_folder.join("train.npy").is_file());
        assert!(config.data_folder.join("test.npy").is_file());

        let validation = loaders.validation.as_ref().expect("validation expected at n=60");
        let mut all = HashSet::new();
        for idx in loaders
            .train
            .indices()
            .iter()
            .chain(validation.indices())
            .chain(loaders.test.indices())
        {
            assert!(all.insert(*idx));
        }
        assert_eq!(all.len(), 60);

        assert_eq!(loaders.train.batch_size(), 8);
        assert_eq!(validation.batch_size(), 16);
        assert_eq!(loaders.test.batch_size(), 16);
        assert_eq!(loaders.train.num_workers(), 2);
        assert!(!loaders.train.pin_memory());
        assert!(loaders.test.dataset().is_labeled());

        // Normalized zero pixels
        let (features, _) = loaders.train.next_batch(&Device::Cpu)?.expect("train batch");
        let first = features.get(0)?.get(0)?.to_scalar::<f32>()?;
        assert!((first - (-0.1307 / 0.3081)).abs() < 1e-5);

        std::fs::remove_dir_all(&config.data_folder).ok();
        Ok(())
    }

    #[test]
    fn test_no_validation_when_all_train() -> crate::Result<()> {
        let config = DataConfig {
            test_split: 0.0,
            train_split: 1.0,
            num_workers: 0,
            ..fixture("prepare_no_val", 12)
        };
        let loaders = prepare_data(&config)?;

        assert!(loaders.validation.is_none());
        assert_eq!(loaders.train.len(), 12);
        assert!(loaders.test.is_empty());
        assert_eq!(loaders.train.num_workers(), 0);

        std::fs::remove_dir_all(&config.data_folder).ok();
        Ok(())
    }

    #[test]
    fn test_seed_reproduces_split() -> crate::Result<()> {
        let config = fixture("prepare_seed", 40);

        let a = prepare_data(&config)?;
        let b = prepare_data(&config)?;
        assert_eq!(a.train.indices(), b.train.indices());
        assert_eq!(a.test.indices(), b.test.indices());

        std::fs::remove_dir_all(&config.data_folder).ok();
        Ok(())
    }

    #[test]
    fn test_invalid_config_rejected() {
        let config = DataConfig {
            batch_size: 0,
            ..DataConfig::default()
        };
        assert!(matches!(prepare_data(&config), Err(crate::MnistError::Config(_))));
    }
}
