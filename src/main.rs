use anyhow::{ensure, Context, Result};
use clap::Parser;
use rayon::ThreadPoolBuilder;
use tracing::Level;

use deeplab_seg_rs::{Config, ImageProcessor};

fn init_logging(verbose: bool) {
    let level = if verbose { Level::DEBUG } else { Level::INFO };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> Result<()> {
    let config = Config::parse();
    init_logging(config.verbose);

    ensure!(
        config.model_path.exists(),
        "Model path does not exist: {}",
        config.model_path.display()
    );
    ensure!(
        config.input_dir.is_dir(),
        "Input directory does not exist: {}",
        config.input_dir.display()
    );

    if config.num_threads > 0 {
        ThreadPoolBuilder::new()
            .num_threads(config.num_threads)
            .build_global()?;
    }

    let processor = ImageProcessor::with_onnx_model(config)
        .context("Failed to initialize segmentation model")?;
    let summary = processor.process_directory()?;

    ensure!(
        summary.failed == 0,
        "{} of {} images failed",
        summary.failed,
        summary.processed + summary.failed
    );
    Ok(())
}
