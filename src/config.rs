use clap::Parser;
use image::ImageFormat;
use std::path::PathBuf;

use crate::palette::{parse_class_color, parse_color, ClassColorTable, BLACK};

#[derive(Parser, Clone, Debug)]
#[command(version, about, long_about = None)]
pub struct Config {
    pub input_dir: PathBuf,

    #[arg(default_value = "output")]
    pub output_dir: PathBuf,

    #[arg(short, long)]
    pub model_path: PathBuf,

    #[arg(short, long, default_value = "png", value_parser = check_format)]
    pub format: String,

    #[arg(short, long, default_value_t = 0)]
    pub device_id: i32,

    /// Model input size; read from the model when omitted
    #[arg(long, value_parser = check_image_size)]
    pub image_size: Option<u32>,

    /// Color of a class, as CLASS=COLOR (e.g. `person=0xFFFF0000`).
    /// Repeatable. Without it the Pascal VOC preset is used.
    #[arg(short = 'c', long = "class-color", value_parser = check_class_color)]
    pub class_colors: Vec<(usize, u32)>,

    /// Color of every class without an explicit entry
    #[arg(long, default_value = "0xFF000000", value_parser = check_color)]
    pub default_color: u32,

    /// Draw the class colors over the input image with this opacity
    #[arg(long, value_parser = check_opacity)]
    pub blend: Option<f32>,

    /// Worker threads; 0 uses one per core
    #[arg(short, long, default_value_t = 0)]
    pub num_threads: usize,

    #[arg(short, long)]
    pub verbose: bool,
}

impl Config {
    pub fn color_table(&self) -> ClassColorTable {
        if self.class_colors.is_empty() {
            return ClassColorTable::pascal_voc().with_default_color(self.default_color);
        }
        self.class_colors
            .iter()
            .fold(ClassColorTable::new(self.default_color), |table, &(class, color)| {
                table.with_class(class, color)
            })
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            input_dir: PathBuf::from("input"),
            output_dir: PathBuf::from("output"),
            model_path: PathBuf::from("dl3.onnx"),
            format: "png".to_string(),
            device_id: 0,
            image_size: None,
            class_colors: Vec::new(),
            default_color: BLACK,
            blend: None,
            num_threads: 0,
            verbose: false,
        }
    }
}

fn check_format(s: &str) -> Result<String, String> {
    let supported: Vec<_> = ImageFormat::all()
        .filter(|f| f.writing_enabled())
        .flat_map(|f| f.extensions_str())
        .map(|s| format!("`{}`", s))
        .collect();
    let supported_message = format!("Supported formats: {}", supported.join(", "));

    let format = ImageFormat::from_extension(s)
        .ok_or(format!("{} is not supported. {}", s, supported_message))?;
    if !format.writing_enabled() {
        return Err(format!("{} is not supported. {}", s, supported_message));
    }

    Ok(s.to_string())
}

fn check_class_color(s: &str) -> Result<(usize, u32), String> {
    parse_class_color(s).map_err(|e| e.to_string())
}

fn check_color(s: &str) -> Result<u32, String> {
    parse_color(s).map_err(|e| e.to_string())
}

fn check_image_size(s: &str) -> Result<u32, String> {
    match s.parse::<u32>() {
        Ok(0) => Err("image size must be positive".to_string()),
        Ok(size) => Ok(size),
        Err(_) => Err(format!("`{s}` is not a positive integer")),
    }
}

fn check_opacity(s: &str) -> Result<f32, String> {
    let opacity = s
        .parse::<f32>()
        .map_err(|_| format!("`{s}` is not a number"))?;
    if !(0.0..=1.0).contains(&opacity) {
        return Err(format!("{opacity} is outside [0, 1]"));
    }
    Ok(opacity)
}
