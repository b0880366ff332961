/// Kaggle MNIST preparation - convert, split and walk one epoch of each loader
use candle_core::Device;
use kaggle_mnist::data::BatchDataLoader;
use kaggle_mnist::{prepare_data, DataConfig};

fn main() -> anyhow::Result<()> {
    // Initialize logger
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    log::info!("=== Kaggle MNIST - Data Preparation ===");

    // Optional JSON config as the first argument
    let mut config = match std::env::args().nth(1) {
        Some(path) => {
            log::info!("Loading config from: {}", path);
            DataConfig::from_json_file(path)?
        }
        None => DataConfig::default(),
    };

    // Device setup - Try CUDA first, fallback to CPU
    let device = if candle_core::utils::cuda_is_available() {
        Device::new_cuda(0)?
    } else {
        Device::Cpu
    };
    config.use_cuda = device.is_cuda();
    log::info!("Using device: {:?}", device);
    log::info!("Data configuration: {:#?}", config);

    let loaders = prepare_data(&config)?;

    let mut named: Vec<(&str, Box<dyn BatchDataLoader>)> = Vec::new();
    named.push(("train", Box::new(loaders.train) as Box<dyn BatchDataLoader>));
    match loaders.validation {
        Some(validation) => named.push(("validation", Box::new(validation) as Box<dyn BatchDataLoader>)),
        None => log::info!("validation: absent"),
    }
    named.push(("test", Box::new(loaders.test) as Box<dyn BatchDataLoader>));

    for (name, loader) in named.iter_mut() {
        let mut batches = 0;
        let mut samples = 0;
        while let Some((features, _labels)) = loader.next_batch(&device)? {
            batches += 1;
            samples += features.dims()[0];
        }
        log::info!(
            "{}: {} batches ({} expected), {} samples",
            name,
            batches,
            loader.num_batches(),
            samples
        );
    }

    Ok(())
}
