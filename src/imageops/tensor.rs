use image::{imageops, imageops::FilterType, RgbImage};
use ndarray::prelude::*;
use nshare::AsNdarray3;

pub const TORCHVISION_MEAN_RGB: [f32; 3] = [0.485, 0.456, 0.406];
pub const TORCHVISION_STD_RGB: [f32; 3] = [0.229, 0.224, 0.225];

/// Resizes to `size x size` and converts to a `[1, 3, size, size]` RGB tensor
/// scaled to `[0, 1]` and normalized per channel with `mean` and `std`.
pub fn to_input_tensor_with(
    image: &RgbImage,
    size: u32,
    mean: [f32; 3],
    std: [f32; 3],
) -> Array4<f32> {
    let resized = imageops::resize(image, size, size, FilterType::Triangle);
    let mut tensor = resized.as_ndarray3().mapv(|v| f32::from(v) / 255.0);

    for ((mut channel, mean), std) in tensor.axis_iter_mut(Axis(0)).zip(mean).zip(std) {
        channel.mapv_inplace(|v| (v - mean) / std);
    }

    tensor.insert_axis(Axis(0))
}

/// [`to_input_tensor_with`] using the torchvision ImageNet statistics the
/// DeepLabV3 export expects.
pub fn to_input_tensor(image: &RgbImage, size: u32) -> Array4<f32> {
    to_input_tensor_with(image, size, TORCHVISION_MEAN_RGB, TORCHVISION_STD_RGB)
}
