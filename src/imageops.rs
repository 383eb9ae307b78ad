pub mod overlay;
pub mod tensor;

pub use overlay::{blend, pixels_to_image, resize_classes};
pub use tensor::{to_input_tensor, TORCHVISION_MEAN_RGB, TORCHVISION_STD_RGB};
