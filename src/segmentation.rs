use image::RgbaImage;
use ndarray::ArrayView3;

use crate::colorize::{argmax_classes, class_histogram, paint_classes};
use crate::errors::{Result, SegError};
use crate::imageops::pixels_to_image;
use crate::palette::{voc_label, ClassColorTable};

/// Result of one colorization pass: the winning class per cell and the
/// colors painted for them, both row-major over `width * height`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Segmentation {
    pub width: usize,
    pub height: usize,
    pub num_classes: usize,
    pub classes: Vec<usize>,
    pub pixels: Vec<u32>,
}

impl Segmentation {
    /// Builds a segmentation from one `(classes, height, width)` score map.
    pub fn from_scores(scores: ArrayView3<f32>, table: &ClassColorTable) -> Result<Self> {
        let (num_classes, height, width) = scores.dim();
        let scores = scores.as_standard_layout();
        let flat = scores
            .as_slice()
            .ok_or_else(|| SegError::invalid_argument("scores", "is not contiguous"))?;

        let classes = argmax_classes(flat, width, height, num_classes)?;
        let pixels = paint_classes(&classes, table);

        Ok(Self {
            width,
            height,
            num_classes,
            classes,
            pixels,
        })
    }

    pub fn to_image(&self) -> Result<RgbaImage> {
        let width = u32::try_from(self.width)
            .map_err(|_| SegError::invalid_argument("width", "does not fit in u32"))?;
        let height = u32::try_from(self.height)
            .map_err(|_| SegError::invalid_argument("height", "does not fit in u32"))?;
        pixels_to_image(&self.pixels, width, height)
    }

    pub fn histogram(&self) -> Vec<usize> {
        class_histogram(&self.classes, self.num_classes)
    }

    /// Classes present in the map, most frequent first, with their labels
    /// when they are Pascal VOC classes.
    pub fn summary(&self) -> Vec<(usize, Option<&'static str>, usize)> {
        let mut present = self
            .histogram()
            .into_iter()
            .enumerate()
            .filter(|&(_, count)| count > 0)
            .map(|(class, count)| (class, voc_label(class), count))
            .collect::<Vec<_>>();
        present.sort_by(|a, b| b.2.cmp(&a.2).then(a.0.cmp(&b.0)));
        present
    }
}
