use std::time::Instant;

use image::DynamicImage;
use ndarray::prelude::*;
use tracing::debug;

use crate::errors::{Result, SegError};
use crate::imageops::to_input_tensor;
use crate::palette::ClassColorTable;
use crate::segmentation::Segmentation;

/// A semantic segmentation network behind an inference runtime.
///
/// Implementors only provide the forward pass; decoding into a normalized
/// tensor and colorizing the scores are shared.
pub trait SegmentationModel: Send + Sync {
    /// Side length of the square input the model expects.
    fn image_size(&self) -> u32;

    /// Forward pass: `[N, 3, S, S]` normalized RGB in, `[N, classes, H, W]`
    /// scores out.
    fn predict(&self, tensor: ArrayView4<f32>) -> Result<Array4<f32>>;

    /// Runs the model on `img` and colors each cell of the output grid.
    fn segment_image(&self, img: &DynamicImage, table: &ClassColorTable) -> Result<Segmentation> {
        let tensor = to_input_tensor(&img.to_rgb8(), self.image_size());

        let start = Instant::now();
        let scores = self.predict(tensor.view())?;
        debug!(
            elapsed_ms = start.elapsed().as_millis() as u64,
            shape = ?scores.shape(),
            "inference finished"
        );

        let (batch, _, height, width) = scores.dim();
        let size = self.image_size() as usize;
        if batch != 1 || height != size || width != size {
            return Err(SegError::model(
                "inference",
                format!(
                    "expected output [1, classes, {size}, {size}], got {:?}",
                    scores.shape()
                ),
            ));
        }
        Segmentation::from_scores(scores.index_axis(Axis(0), 0), table)
    }
}
