pub mod colorize;
pub mod config;
pub mod errors;
pub mod imageops;
pub mod model;
pub mod palette;
pub mod segmentation;
pub mod traits;

pub mod mocks;

use image::{DynamicImage, ImageFormat};
use indicatif::{ParallelProgressIterator, ProgressBar, ProgressStyle};
use rayon::prelude::*;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use tracing::{debug, info, warn};
use walkdir::WalkDir;

pub use colorize::{argmax_classes, colorize, colorize_array};
pub use config::Config;
pub use errors::{Result, SegError};
pub use model::Model;
pub use palette::ClassColorTable;
pub use segmentation::Segmentation;
pub use traits::*;

#[cfg(test)]
pub use mocks::*;

/// Outcome of a directory run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ProcessingSummary {
    pub processed: usize,
    pub failed: usize,
}

pub struct ImageProcessor<M: SegmentationModel> {
    model: M,
    config: Config,
    table: ClassColorTable,
}

impl<M: SegmentationModel> ImageProcessor<M> {
    pub fn new(model: M, config: Config) -> Self {
        let table = config.color_table();
        Self {
            model,
            config,
            table,
        }
    }

    /// Segments every supported image under the input directory, mirroring
    /// the directory layout into the output directory. A failing image is
    /// logged and counted; it does not stop the run.
    pub fn process_directory(&self) -> Result<ProcessingSummary> {
        let input_path = &self.config.input_dir;
        let output_path = &self.config.output_dir;

        if !input_path.is_dir() {
            return Err(SegError::FileSystem {
                path: input_path.clone(),
                operation: "checking input directory".to_string(),
                source: std::io::Error::new(
                    std::io::ErrorKind::NotFound,
                    "input directory does not exist",
                ),
            });
        }

        fs::create_dir_all(output_path).map_err(|e| SegError::FileSystem {
            path: output_path.clone(),
            operation: "creating output directory".to_string(),
            source: e,
        })?;

        let image_files = self.collect_image_files(input_path);

        if image_files.is_empty() {
            warn!(path = %input_path.display(), "no images to process");
            return Ok(ProcessingSummary::default());
        }
        info!(count = image_files.len(), "processing images");

        let pb = ProgressBar::new(image_files.len() as u64);
        pb.set_style(
            ProgressStyle::default_bar()
                .template(
                    "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({eta})",
                )
                .map_err(|e| SegError::Configuration {
                    message: e.to_string(),
                })?
                .progress_chars("#>-"),
        );

        let failed = AtomicUsize::new(0);
        image_files
            .par_iter()
            .progress_with(pb.clone())
            .for_each(|input_file| {
                if let Err(e) = self.process_single_image(input_file, output_path) {
                    failed.fetch_add(1, Ordering::Relaxed);
                    warn!(path = %input_file.display(), error = %e, "image failed");
                }
            });

        let failed = failed.into_inner();
        let summary = ProcessingSummary {
            processed: image_files.len() - failed,
            failed,
        };
        pb.finish_and_clear();
        info!(
            processed = summary.processed,
            failed = summary.failed,
            "all images processed"
        );
        Ok(summary)
    }

    fn collect_image_files(&self, input_path: &Path) -> Vec<PathBuf> {
        let mut image_files = WalkDir::new(input_path)
            .into_iter()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_type().is_file() && self.is_supported_image_format(e.path()))
            .map(|e| e.into_path())
            .collect::<Vec<_>>();
        image_files.sort();
        image_files
    }

    pub fn is_supported_image_format(&self, path: &Path) -> bool {
        if let Some(extension) = path.extension().and_then(|ext| ext.to_str()) {
            matches!(
                extension.to_lowercase().as_str(),
                "jpg" | "jpeg" | "png" | "webp" | "bmp" | "gif" | "tiff"
            )
        } else {
            false
        }
    }

    /// Segments one image and writes the result below `output_dir`,
    /// returning the written path.
    pub fn process_single_image(&self, input_file: &Path, output_dir: &Path) -> Result<PathBuf> {
        let img = image::open(input_file).map_err(|e| SegError::ImageProcessing {
            path: input_file.display().to_string(),
            operation: "decoding image".to_string(),
            source: Box::new(e),
        })?;

        let rendered = self.render(&img).map_err(|e| match e {
            SegError::InvalidArgument { .. } | SegError::Model { .. } => e,
            other => SegError::ImageProcessing {
                path: input_file.display().to_string(),
                operation: "rendering segmentation".to_string(),
                source: Box::new(other),
            },
        })?;

        let relative_path = self.get_relative_path(input_file)?;
        let output_file = output_dir
            .join(relative_path)
            .with_extension(&self.config.format);

        if let Some(parent) = output_file.parent() {
            fs::create_dir_all(parent).map_err(|e| SegError::FileSystem {
                path: parent.to_path_buf(),
                operation: "creating output directory".to_string(),
                source: e,
            })?;
        }

        let output_format =
            ImageFormat::from_extension(&self.config.format).unwrap_or(ImageFormat::Png);
        let rendered = match output_format {
            // no alpha channel
            ImageFormat::Jpeg => DynamicImage::ImageRgb8(rendered.to_rgb8()),
            _ => rendered,
        };

        rendered
            .save_with_format(&output_file, output_format)
            .map_err(|e| SegError::ImageProcessing {
                path: output_file.display().to_string(),
                operation: "saving image".to_string(),
                source: Box::new(e),
            })?;

        debug!(
            input = %input_file.display(),
            output = %output_file.display(),
            "image written"
        );
        Ok(output_file)
    }

    /// Colorized segmentation at the size of `img`, optionally composited
    /// over it.
    pub fn render(&self, img: &DynamicImage) -> Result<DynamicImage> {
        let segmentation = self.model.segment_image(img, &self.table)?;
        for (class, label, count) in segmentation.summary() {
            debug!(class, label = label.unwrap_or("-"), pixels = count, "class coverage");
        }

        let overlay = imageops::resize_classes(
            &segmentation.to_image()?,
            img.width(),
            img.height(),
        );

        let rendered = match self.config.blend {
            Some(opacity) => imageops::blend(&img.to_rgba8(), &overlay, opacity)?,
            None => overlay,
        };
        Ok(DynamicImage::ImageRgba8(rendered))
    }

    pub fn get_relative_path(&self, input_file: &Path) -> Result<PathBuf> {
        let input_dir = &self.config.input_dir;
        input_file
            .strip_prefix(input_dir)
            .map(|p| p.to_path_buf())
            .map_err(|_| SegError::FileSystem {
                path: input_file.to_path_buf(),
                operation: "resolving relative path".to_string(),
                source: std::io::Error::new(
                    std::io::ErrorKind::InvalidInput,
                    "input file is not inside the input directory",
                ),
            })
    }
}

impl ImageProcessor<Model> {
    pub fn with_onnx_model(config: Config) -> Result<Self> {
        let model = Model::new(&config.model_path, config.device_id, config.image_size)?;
        Ok(Self::new(model, config))
    }
}
