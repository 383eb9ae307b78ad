use image::{imageops, imageops::FilterType, ImageBuffer, RgbaImage};
use num_traits::AsPrimitive;

use crate::errors::{Result, SegError};
use crate::palette::argb_to_rgba;

/// Turns a row-major buffer of packed `0xAARRGGBB` colors into an image.
pub fn pixels_to_image(pixels: &[u32], width: u32, height: u32) -> Result<RgbaImage> {
    let mismatch = || {
        SegError::invalid_argument(
            "pixels",
            format!("has {} values, expected {width} * {height}", pixels.len()),
        )
    };
    if pixels.len() as u64 != u64::from(width) * u64::from(height) {
        return Err(mismatch());
    }

    let raw = pixels
        .iter()
        .flat_map(|&color| argb_to_rgba(color).0)
        .collect::<Vec<u8>>();

    ImageBuffer::from_raw(width, height, raw).ok_or_else(mismatch)
}

/// Scales a colorized class map without mixing neighbouring class colors.
pub fn resize_classes(image: &RgbaImage, width: u32, height: u32) -> RgbaImage {
    if image.dimensions() == (width, height) {
        return image.clone();
    }
    imageops::resize(image, width, height, FilterType::Nearest)
}

/// Composites `overlay` on top of `base`. `opacity` in `[0, 1]` scales the
/// overlay's own alpha; the result keeps the base image's alpha.
pub fn blend(base: &RgbaImage, overlay: &RgbaImage, opacity: f32) -> Result<RgbaImage> {
    if base.dimensions() != overlay.dimensions() {
        let (bw, bh) = base.dimensions();
        let (ow, oh) = overlay.dimensions();
        return Err(SegError::invalid_argument(
            "overlay",
            format!("is {ow}x{oh}, expected {bw}x{bh}"),
        ));
    }
    if !(0.0..=1.0).contains(&opacity) {
        return Err(SegError::invalid_argument(
            "opacity",
            format!("{opacity} is outside [0, 1]"),
        ));
    }

    let mut out = base.clone();
    for (pixel, over) in out.pixels_mut().zip(overlay.pixels()) {
        let over_alpha: f32 = over[3].as_();
        let weight = opacity * over_alpha / 255.0;
        for channel in 0..3 {
            let b: f32 = pixel[channel].as_();
            let o: f32 = over[channel].as_();
            pixel[channel] = (b * (1.0 - weight) + o * weight).round().as_();
        }
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;

    #[test]
    fn test_pixels_to_image() -> Result<()> {
        let image = pixels_to_image(&[0xFFFF_0000, 0xFF00_FF00, 0x0000_00FF, 0xFF00_0000], 2, 2)?;
        assert_eq!(image.get_pixel(0, 0), &Rgba([255, 0, 0, 255]));
        assert_eq!(image.get_pixel(1, 0), &Rgba([0, 255, 0, 255]));
        assert_eq!(image.get_pixel(0, 1), &Rgba([0, 0, 255, 0]));
        assert_eq!(image.get_pixel(1, 1), &Rgba([0, 0, 0, 255]));

        assert!(pixels_to_image(&[0; 3], 2, 2).is_err());
        Ok(())
    }

    #[test]
    fn test_resize_classes_keeps_palette() -> Result<()> {
        let image = pixels_to_image(&[0xFFFF_0000, 0xFF00_00FF], 2, 1)?;
        let resized = resize_classes(&image, 7, 5);
        assert_eq!(resized.dimensions(), (7, 5));
        assert!(resized
            .pixels()
            .all(|p| *p == Rgba([255, 0, 0, 255]) || *p == Rgba([0, 0, 255, 255])));
        Ok(())
    }

    #[test]
    fn test_blend() -> Result<()> {
        let base = RgbaImage::from_pixel(2, 1, Rgba([100, 100, 100, 200]));
        let mut overlay = RgbaImage::from_pixel(2, 1, Rgba([200, 0, 100, 255]));
        overlay.put_pixel(1, 0, Rgba([255, 255, 255, 0]));

        let out = blend(&base, &overlay, 0.5)?;
        assert_eq!(out.get_pixel(0, 0), &Rgba([150, 50, 100, 200]));
        assert_eq!(out.get_pixel(1, 0), &Rgba([100, 100, 100, 200]));

        assert!(blend(&base, &RgbaImage::new(1, 1), 0.5).is_err());
        assert!(blend(&base, &overlay, 1.5).is_err());
        Ok(())
    }
}
