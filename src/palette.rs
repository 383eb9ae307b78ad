use std::collections::BTreeMap;

use image::Rgba;

use crate::errors::{Result, SegError};

/// Pascal VOC 2012 segmentation labels, indexed by class.
pub const VOC_CLASSES: [&str; 21] = [
    "background",
    "aeroplane",
    "bicycle",
    "bird",
    "boat",
    "bottle",
    "bus",
    "car",
    "cat",
    "chair",
    "cow",
    "diningtable",
    "dog",
    "horse",
    "motorbike",
    "person",
    "pottedplant",
    "sheep",
    "sofa",
    "train",
    "tvmonitor",
];

pub const VOC_NUM_CLASSES: usize = VOC_CLASSES.len();

pub const DOG: usize = 12;
pub const PERSON: usize = 15;
pub const SHEEP: usize = 17;

pub const RED: u32 = 0xFFFF_0000;
pub const GREEN: u32 = 0xFF00_FF00;
pub const BLUE: u32 = 0xFF00_00FF;
pub const BLACK: u32 = 0xFF00_0000;

/// Class index to packed `0xAARRGGBB` color, with a fallback for every class
/// that has no entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassColorTable {
    colors: BTreeMap<usize, u32>,
    default_color: u32,
}

impl Default for ClassColorTable {
    fn default() -> Self {
        Self::pascal_voc()
    }
}

impl ClassColorTable {
    pub const fn new(default_color: u32) -> Self {
        Self {
            colors: BTreeMap::new(),
            default_color,
        }
    }

    /// person red, dog green, sheep blue, everything else black.
    pub fn pascal_voc() -> Self {
        Self::new(BLACK)
            .with_class(PERSON, RED)
            .with_class(DOG, GREEN)
            .with_class(SHEEP, BLUE)
    }

    pub fn with_class(mut self, class_index: usize, color: u32) -> Self {
        self.colors.insert(class_index, color);
        self
    }

    pub const fn with_default_color(mut self, color: u32) -> Self {
        self.default_color = color;
        self
    }

    #[inline]
    pub fn color_for(&self, class_index: usize) -> u32 {
        self.colors
            .get(&class_index)
            .copied()
            .unwrap_or(self.default_color)
    }

    pub const fn default_color(&self) -> u32 {
        self.default_color
    }

    pub fn entries(&self) -> impl Iterator<Item = (usize, u32)> + '_ {
        self.colors.iter().map(|(&class, &color)| (class, color))
    }
}

/// Unpacks `0xAARRGGBB` into an RGBA pixel.
#[inline]
pub const fn argb_to_rgba(color: u32) -> Rgba<u8> {
    let [a, r, g, b] = color.to_be_bytes();
    Rgba([r, g, b, a])
}

/// Parses a packed color: `0xAARRGGBB`, `#AARRGGBB`, `#RRGGBB` (opaque) or a
/// decimal integer.
pub fn parse_color(s: &str) -> Result<u32> {
    let s = s.trim();
    let invalid = || SegError::invalid_argument("color", format!("`{s}` is not a valid color"));

    if let Some(hex) = s
        .strip_prefix("0x")
        .or_else(|| s.strip_prefix("0X"))
        .or_else(|| s.strip_prefix('#'))
    {
        let value = u32::from_str_radix(hex, 16).map_err(|_| invalid())?;
        return match hex.len() {
            6 => Ok(0xFF00_0000 | value),
            8 => Ok(value),
            _ => Err(invalid()),
        };
    }

    s.parse::<u32>().map_err(|_| invalid())
}

/// Parses `CLASS=COLOR`, where `CLASS` is an index or a Pascal VOC label.
pub fn parse_class_color(s: &str) -> Result<(usize, u32)> {
    let (class, color) = s.split_once('=').ok_or_else(|| {
        SegError::invalid_argument("class color", format!("`{s}` is not of the form CLASS=COLOR"))
    })?;
    let class = class.trim();

    let class_index = match class.parse::<usize>() {
        Ok(index) => index,
        Err(_) => VOC_CLASSES
            .iter()
            .position(|label| label.eq_ignore_ascii_case(class))
            .ok_or_else(|| {
                SegError::invalid_argument("class", format!("`{class}` is not a known class"))
            })?,
    };

    Ok((class_index, parse_color(color)?))
}

/// Label for a class index, if it is a Pascal VOC class.
pub fn voc_label(class_index: usize) -> Option<&'static str> {
    VOC_CLASSES.get(class_index).copied()
}
