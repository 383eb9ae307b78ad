use std::path::Path;

use crate::{
    errors::{Result, SegError},
    traits::SegmentationModel,
};
use ndarray::prelude::*;
use ort::value::TensorRef;
use ort::{
    execution_providers::{
        CUDAExecutionProvider, TensorRTExecutionProvider, XNNPACKExecutionProvider,
    },
    session::{builder::SessionBuilder, Session},
};
use parking_lot::Mutex;
use tracing::{debug, info};

/// Input side length of the DeepLabV3 export when the model leaves it
/// dynamic.
pub const DEFAULT_IMAGE_SIZE: u32 = 224;

/// ONNX Runtime session of a pre-exported segmentation model.
pub struct Model {
    pub image_size: u32,
    input_name: String,
    output_name: String,
    session: Mutex<Session>,
}

fn model_error(operation: impl Into<String>) -> impl FnOnce(ort::Error) -> SegError {
    let operation = operation.into();
    move |e| SegError::Model {
        operation,
        source: Box::new(e),
    }
}

impl Model {
    /// Loads the model and runs it once on a zero tensor.
    ///
    /// `image_size` overrides the input size read from the model; it is
    /// required when the model's spatial dimensions are dynamic and no
    /// fallback to [`DEFAULT_IMAGE_SIZE`] is wanted.
    pub fn new(model_path: &Path, device_id: i32, image_size: Option<u32>) -> Result<Self> {
        let session = SessionBuilder::new()
            .map_err(model_error("session builder initialization"))?
            .with_execution_providers([
                TensorRTExecutionProvider::default()
                    .with_device_id(device_id)
                    .build(),
                CUDAExecutionProvider::default()
                    .with_device_id(device_id)
                    .build(),
                XNNPACKExecutionProvider::default().build(),
            ])
            .map_err(model_error("execution provider registration"))?
            .with_memory_pattern(true)
            .map_err(model_error("memory pattern setup"))?
            .commit_from_file(model_path)
            .map_err(model_error(format!(
                "loading model file {}",
                model_path.display()
            )))?;

        let input = session
            .inputs
            .first()
            .ok_or_else(|| SegError::model("reading model inputs", "model has no inputs"))?;
        let output = session
            .outputs
            .first()
            .ok_or_else(|| SegError::model("reading model outputs", "model has no outputs"))?;

        let declared_size = input
            .input_type
            .tensor_shape()
            .and_then(|shape| shape.get(2).copied())
            .and_then(|dim| u32::try_from(dim).ok())
            .filter(|&dim| dim > 0);
        let image_size = image_size.or(declared_size).unwrap_or(DEFAULT_IMAGE_SIZE);

        let input_name = input.name.clone();
        let output_name = output.name.clone();
        info!(
            path = %model_path.display(),
            input = %input_name,
            output = %output_name,
            image_size,
            "model loaded"
        );

        let model = Self {
            image_size,
            input_name,
            output_name,
            session: Mutex::new(session),
        };

        // initialize model
        let data = Array4::<f32>::zeros((1, 3, image_size as usize, image_size as usize));
        let warmup = model.predict(data.view())?;
        debug!(shape = ?warmup.shape(), "warm-up run finished");

        Ok(model)
    }
}

impl SegmentationModel for Model {
    fn image_size(&self) -> u32 {
        self.image_size
    }

    fn predict(&self, tensor: ArrayView4<f32>) -> Result<Array4<f32>> {
        let tensor = tensor.as_standard_layout();
        let mut binding = self.session.lock();
        let outputs = binding.run(
            ort::inputs![self.input_name.as_str() => TensorRef::from_array_view(&tensor)?],
        )?;
        Ok(outputs[self.output_name.as_str()]
            .try_extract_array::<f32>()?
            .into_dimensionality::<Ix4>()?
            .to_owned())
    }
}
