use crate::errors::Result;
use crate::palette::{PERSON, VOC_NUM_CLASSES};
use crate::traits::SegmentationModel;
use ndarray::prelude::*;

/// Mock model for tests: a cell is `PERSON` when its normalized red channel
/// is positive, background otherwise.
#[derive(Debug, Clone)]
pub struct MockSegmentationModel {
    pub image_size: u32,
    pub num_classes: usize,
}

impl MockSegmentationModel {
    pub const fn new(image_size: u32) -> Self {
        Self {
            image_size,
            num_classes: VOC_NUM_CLASSES,
        }
    }
}

impl SegmentationModel for MockSegmentationModel {
    fn image_size(&self) -> u32 {
        self.image_size
    }

    fn predict(&self, tensor: ArrayView4<f32>) -> Result<Array4<f32>> {
        let (batch, _, height, width) = tensor.dim();
        Ok(Array4::from_shape_fn(
            (batch, self.num_classes, height, width),
            |(n, c, y, x)| {
                let red = tensor[[n, 0, y, x]];
                match c {
                    0 => 0.0,
                    PERSON => red,
                    _ => -1.0,
                }
            },
        ))
    }
}

pub const fn create_mock_model() -> MockSegmentationModel {
    MockSegmentationModel::new(224)
}
