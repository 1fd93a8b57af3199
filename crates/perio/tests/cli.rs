use assert_cmd::Command;
use image::{GrayImage, ImageBuffer, Luma};
use predicates::prelude::*;
use serde_json::Value;
use std::path::Path;

const MANUAL: &str = "Could not detect valid landmarks. Please mark them manually.";

fn bar_png(path: &Path) {
    let (w, h) = (200u32, 256u32);
    let img: GrayImage = ImageBuffer::from_fn(w, h, |x, y| {
        let inside = (90..110).contains(&x) && (h / 5..h * 4 / 5).contains(&y);
        Luma([if inside { 200 } else { 40 }])
    });
    img.save(path).expect("write png");
}

fn blank_png(path: &Path) {
    let img: GrayImage = ImageBuffer::from_pixel(96, 96, Luma([60]));
    img.save(path).expect("write png");
}

fn perio() -> Command {
    let mut cmd = Command::cargo_bin("perio").expect("binary");
    cmd.args(["--log-level", "off"]);
    cmd
}

fn read_json(path: &Path) -> Value {
    let raw = std::fs::read_to_string(path).expect("read report");
    serde_json::from_str(&raw).expect("parse report")
}

#[test]
fn default_config_prints_parameters() {
    perio()
        .arg("default-config")
        .assert()
        .success()
        .stdout(predicate::str::contains("\"max_edge_points\": 60000"))
        .stdout(predicate::str::contains("\"strong_threshold\""));
}

#[test]
fn detect_writes_report_and_overlay() {
    let dir = tempfile::tempdir().expect("tempdir");
    let image = dir.path().join("tooth.png");
    let report = dir.path().join("report.json");
    let overlays = dir.path().join("overlays");
    bar_png(&image);

    perio()
        .arg("detect")
        .arg(&image)
        .arg("--output")
        .arg(&report)
        .arg("--overlay-dir")
        .arg(&overlays)
        .args(["--debug", "--mm-per-pixel", "0.05"])
        .assert()
        .success();

    let json = read_json(&report);
    let entry = &json[0];
    assert_eq!(entry["width"], 200);
    assert!(entry["landmarks"]["cej"]["y"].as_i64() < entry["landmarks"]["bone"]["y"].as_i64());
    assert!(entry["warnings"].as_array().is_some_and(|w| w.is_empty()));
    assert!(entry["bone_loss"]["percent"].is_number());
    assert!(entry["bone_loss"]["root_length_mm"].is_number());
    assert!(entry["debug"]["edges"].is_array());
    assert!(overlays.join("tooth_overlay.png").exists());
}

#[test]
fn blank_and_missing_images_report_manual_marking() {
    let dir = tempfile::tempdir().expect("tempdir");
    let blank = dir.path().join("blank.png");
    blank_png(&blank);
    let missing = dir.path().join("missing.png");

    let out = perio()
        .arg("detect")
        .arg(&blank)
        .arg(&missing)
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();
    let json: Value = serde_json::from_slice(&out).expect("stdout json");
    let entries = json.as_array().expect("array");
    assert_eq!(entries.len(), 2);
    for entry in entries {
        assert!(entry["landmarks"].is_null());
        let warnings = entry["warnings"].as_array().expect("warnings");
        assert_eq!(warnings.last().and_then(Value::as_str), Some(MANUAL));
    }
    assert_eq!(entries[0]["warnings"][0], "no edges found");
}

#[test]
fn run_uses_config_file() {
    let dir = tempfile::tempdir().expect("tempdir");
    let image = dir.path().join("tooth.png");
    let report = dir.path().join("out.json");
    let overlay = dir.path().join("overlay.png");
    let config = dir.path().join("config.json");
    bar_png(&image);

    let cfg = serde_json::json!({
        "image_path": image,
        "output_path": report,
        "overlay_path": overlay,
        "params": { "collect_debug": true }
    });
    std::fs::write(&config, cfg.to_string()).expect("write config");

    perio().arg("run").arg(&config).assert().success();

    let json = read_json(&report);
    assert!(json["landmarks"]["apex"].is_object());
    assert!(overlay.exists());
}

#[test]
fn detect_requires_an_image() {
    perio()
        .arg("detect")
        .assert()
        .failure()
        .stderr(predicate::str::contains("required"));
}

#[test]
fn bad_config_fails() {
    let dir = tempfile::tempdir().expect("tempdir");
    let config = dir.path().join("broken.json");
    std::fs::write(&config, "{ not json").expect("write");
    perio().arg("run").arg(&config).assert().failure();
}

#[test]
fn diagnostics_level_surfaces_stage_events_only() {
    let dir = tempfile::tempdir().expect("tempdir");
    let image = dir.path().join("blank.png");
    blank_png(&image);

    perio()
        .args(["--diagnostics-level", "warn", "detect"])
        .arg(&image)
        .assert()
        .success()
        .stderr(predicate::str::contains("perio_landmarks] edge points: 0"))
        .stderr(predicate::str::contains("detected landmarks in").not());
}
