mod common;

use std::fs;

use image::GenericImageView;
use serde_json::Value;
use tempfile::TempDir;

use common::{
    GARMENT, assert_success, run_cli, write_blank_model, write_landmarks, write_model,
    write_product,
};

fn read_report(path: &std::path::Path) -> Value {
    let text = fs::read_to_string(path).expect("read report");
    serde_json::from_str(&text).expect("parse report")
}

#[test]
fn writes_default_output_file() {
    let temp_dir = TempDir::new().expect("create temp dir");
    let dir = temp_dir.path();
    write_model(&dir.join("model.png"));
    write_product(&dir.join("product.png"));

    let output = run_cli(dir, &["--model", "model.png", "--product", "product.png"]);
    assert_success(&output);

    let result = image::open(dir.join("virtual-try-on-result.png")).expect("decode result");
    assert_eq!(result.dimensions(), (320, 240));
}

#[test]
fn skin_run_reports_region_and_shadow() {
    let temp_dir = TempDir::new().expect("create temp dir");
    let dir = temp_dir.path();
    write_model(&dir.join("model.png"));
    write_product(&dir.join("product.png"));

    let output = run_cli(
        dir,
        &[
            "--model",
            "model.png",
            "--product",
            "product.png",
            "--output",
            "out/result.png",
            "--json",
            "out/report.json",
        ],
    );
    assert_success(&output);

    let report = read_report(&dir.join("out/report.json"));
    assert_eq!(report["strategy"], "auto");
    assert_eq!(report["estimator"], "skin_heuristic");
    assert_eq!(report["fallback"], false);
    assert_eq!(report["shadow"], true);
    assert_eq!(report["canvas"], serde_json::json!([320, 240]));
    assert_eq!(report["overlay"], serde_json::json!([100, 200]));

    // Region is 0.3W x 0.4H around the skin centroid.
    let region = &report["region"];
    assert!((region["width"].as_f64().expect("width") - 96.0).abs() < 1e-3);
    assert!((region["height"].as_f64().expect("height") - 96.0).abs() < 1e-3);

    let placement = &report["placement"];
    let width = placement["width"].as_f64().expect("width");
    let height = placement["height"].as_f64().expect("height");
    assert!((height / width - 2.0).abs() < 1e-4);

    let rect = &report["pixel_rect"];
    let cx = rect["x"].as_i64().expect("x") + rect["width"].as_i64().expect("w") / 2;
    let cy = (rect["y"].as_i64().expect("y") + rect["height"].as_i64().expect("h") / 2).min(239);
    let result = image::open(dir.join("out/result.png"))
        .expect("decode result")
        .to_rgba8();
    assert_eq!(*result.get_pixel(cx as u32, cy as u32), GARMENT);
}

#[test]
fn landmarks_file_drives_placement() {
    let temp_dir = TempDir::new().expect("create temp dir");
    let dir = temp_dir.path();
    write_model(&dir.join("model.png"));
    write_product(&dir.join("product.png"));
    write_landmarks(&dir.join("pose.json"));

    let output = run_cli(
        dir,
        &[
            "--model",
            "model.png",
            "--product",
            "product.png",
            "--landmarks",
            "pose.json",
            "--json",
            "report.json",
        ],
    );
    assert_success(&output);

    let report = read_report(&dir.join("report.json"));
    assert_eq!(report["estimator"], "landmarks");
    assert_eq!(report["shadow"], false);
    // Shoulders at 0.4..0.6 of 320px -> 64px, plus 10% either side.
    let rect = &report["pixel_rect"];
    assert_eq!(rect["x"], 122);
    assert_eq!(rect["y"], 72);
    assert_eq!(rect["width"], 77);
}

#[test]
fn landmarks_strategy_without_file_fails() {
    let temp_dir = TempDir::new().expect("create temp dir");
    let dir = temp_dir.path();
    write_model(&dir.join("model.png"));
    write_product(&dir.join("product.png"));

    let output = run_cli(
        dir,
        &[
            "--model",
            "model.png",
            "--product",
            "product.png",
            "--strategy",
            "landmarks",
        ],
    );
    assert!(!output.status.success(), "expected failure");
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(
        stderr.contains("dependency unavailable"),
        "unexpected stderr: {stderr}"
    );
    assert!(!dir.join("virtual-try-on-result.png").exists());
}

#[test]
fn blank_model_falls_back_to_centre() {
    let temp_dir = TempDir::new().expect("create temp dir");
    let dir = temp_dir.path();
    write_blank_model(&dir.join("model.png"), 512, 512);
    write_product(&dir.join("product.png"));

    let output = run_cli(
        dir,
        &[
            "--model",
            "model.png",
            "--product",
            "product.png",
            "--json",
            "report.json",
            "--annotate",
            "debug/annotated.png",
        ],
    );
    assert_success(&output);

    let report = read_report(&dir.join("report.json"));
    assert_eq!(report["fallback"], true);
    assert!(report.get("estimator").is_none());
    assert!(
        report["fallback_reason"]
            .as_str()
            .expect("reason")
            .contains("skin samples")
    );
    assert_eq!(
        report["pixel_rect"],
        serde_json::json!({ "x": 102, "y": -51, "width": 307, "height": 614 })
    );
    assert!(dir.join("debug/annotated.png").exists());
}

#[test]
fn max_size_and_output_format_are_honoured() {
    let temp_dir = TempDir::new().expect("create temp dir");
    let dir = temp_dir.path();
    write_model(&dir.join("model.png"));
    write_product(&dir.join("product.png"));

    let output = run_cli(
        dir,
        &[
            "--model",
            "model.png",
            "--product",
            "product.png",
            "--max-size",
            "160",
            "--strategy",
            "center",
            "--no-shadow",
            "--output",
            "result.img",
            "--output-format",
            "jpeg",
        ],
    );
    assert_success(&output);

    let bytes = fs::read(dir.join("result.img")).expect("read result");
    assert_eq!(&bytes[..2], &[0xFF, 0xD8], "expected a JPEG stream");
    let decoded = image::load_from_memory(&bytes).expect("decode");
    assert_eq!(decoded.dimensions(), (160, 120));
}

#[test]
fn settings_file_is_applied() {
    let temp_dir = TempDir::new().expect("create temp dir");
    let dir = temp_dir.path();
    write_model(&dir.join("model.png"));
    write_product(&dir.join("product.png"));
    fs::write(
        dir.join("settings.json"),
        r#"{ "estimator": { "strategy": "center" }, "placement": { "center_width_fraction": 0.5 } }"#,
    )
    .expect("write settings");

    let output = run_cli(
        dir,
        &[
            "--model",
            "model.png",
            "--product",
            "product.png",
            "--config",
            "settings.json",
            "--json",
            "report.json",
        ],
    );
    assert_success(&output);

    let report = read_report(&dir.join("report.json"));
    assert_eq!(report["strategy"], "center");
    assert_eq!(report["fallback"], true);
    assert_eq!(report["pixel_rect"]["width"], 160);
}
