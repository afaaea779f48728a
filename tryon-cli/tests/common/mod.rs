/// Common test utilities for CLI integration tests
use std::{
    path::Path,
    process::{Command, Output},
};

use image::{Rgba, RgbaImage};

pub const SKIN: Rgba<u8> = Rgba([210, 150, 120, 255]);
pub const GARMENT: Rgba<u8> = Rgba([20, 90, 200, 255]);

/// 320x240 model with a skin-toned block centred at (160, 120).
pub fn write_model(path: &Path) {
    let mut model = RgbaImage::from_pixel(320, 240, Rgba([30, 40, 60, 255]));
    for y in 80..160 {
        for x in 120..200 {
            model.put_pixel(x, y, SKIN);
        }
    }
    model.save(path).expect("save model");
}

/// Model with no skin-coloured pixels at all.
pub fn write_blank_model(path: &Path, width: u32, height: u32) {
    RgbaImage::from_pixel(width, height, Rgba([240, 240, 240, 255]))
        .save(path)
        .expect("save blank model");
}

/// Opaque 100x200 garment.
pub fn write_product(path: &Path) {
    RgbaImage::from_pixel(100, 200, GARMENT)
        .save(path)
        .expect("save product");
}

/// Landmark JSON in the 33-point pose layout with only the torso joints set.
pub fn write_landmarks(path: &Path) {
    let mut entries = vec!["null".to_string(); 33];
    entries[11] = r#"{"x":0.4,"y":0.3,"visibility":0.98}"#.to_string();
    entries[12] = r#"{"x":0.6,"y":0.3,"visibility":0.97}"#.to_string();
    entries[23] = r#"{"x":0.4,"y":0.7,"visibility":0.9}"#.to_string();
    std::fs::write(path, format!("[{}]", entries.join(","))).expect("write landmarks");
}

/// Run the CLI from `cwd` with `args`.
pub fn run_cli(cwd: &Path, args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_tryon-cli"))
        .current_dir(cwd)
        .env("RUST_LOG", "warn")
        .args(args)
        .output()
        .expect("execute CLI")
}

#[allow(dead_code)]
pub fn assert_success(output: &Output) {
    if !output.status.success() {
        eprintln!("CLI stderr: {}", String::from_utf8_lossy(&output.stderr));
        panic!("CLI failed with status: {}", output.status);
    }
}
