use assert_cmd::prelude::*;
use predicates::prelude::*;
use std::fs;
use std::path::Path;
use std::process::Command;
use tempfile::TempDir;

fn situatie_cmd() -> Command {
    Command::new(assert_cmd::cargo::cargo_bin!("situatie"))
}

fn init_config(temp_dir: &TempDir) -> std::path::PathBuf {
    let config_path = temp_dir.path().join("situatie-config");
    situatie_cmd()
        .args(["-C", config_path.to_str().unwrap(), "init"])
        .assert()
        .success();
    config_path
}

fn run_ok(config_path: &Path, args: &[&str]) {
    situatie_cmd()
        .args(["-C", config_path.to_str().unwrap()])
        .args(args)
        .assert()
        .success();
}

fn fill_header(config_path: &Path) {
    run_ok(
        config_path,
        &[
            "header",
            "--beneficiary",
            "SC Alfa SRL",
            "--site",
            "Bloc C3",
            "--month",
            "1-31.05",
            "--year",
            "2026",
        ],
    );
}

/// Row 1 worth 1000.00 RON: 10 x 5 x 20 with every factor counted.
fn fill_first_row(config_path: &Path) {
    run_ok(
        config_path,
        &[
            "edit-row",
            "1",
            "--name",
            "Zidarie",
            "--unit",
            "mc",
            "--total-qty",
            "10",
            "--month-qty",
            "5",
            "--rate",
            "20",
        ],
    );
    for factor in ["total-qty", "month-qty", "rate"] {
        run_ok(config_path, &["toggle", "1", factor]);
    }
}

fn png_1x1() -> Vec<u8> {
    let mut img = image::RgbaImage::new(1, 1);
    img.put_pixel(0, 0, image::Rgba([0, 0, 255, 255]));

    let mut buf = Vec::new();
    let encoder = image::codecs::png::PngEncoder::new(&mut buf);
    image::ImageEncoder::write_image(encoder, img.as_raw(), 1, 1, image::ColorType::Rgba8)
        .unwrap();
    buf
}

#[test]
fn test_help() {
    situatie_cmd()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("Monthly work situation reports"));
}

#[test]
fn test_version() {
    situatie_cmd()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("situatie"));
}

#[test]
fn test_init_creates_config() {
    let temp_dir = TempDir::new().unwrap();
    let config_path = temp_dir.path().join("situatie-config");

    situatie_cmd()
        .args(["-C", config_path.to_str().unwrap(), "init"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Initialized situatie config"));

    // Check files were created
    assert!(config_path.join("config.toml").exists());
    assert!(config_path.join("form.toml").exists());
    assert!(config_path.join("output").is_dir());
}

#[test]
fn test_init_fails_if_exists() {
    let temp_dir = TempDir::new().unwrap();
    let config_path = init_config(&temp_dir);

    // Second init should fail
    situatie_cmd()
        .args(["-C", config_path.to_str().unwrap(), "init"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("already exists"));
}

#[test]
fn test_show_without_init() {
    let temp_dir = TempDir::new().unwrap();
    let config_path = temp_dir.path().join("nonexistent");

    situatie_cmd()
        .args(["-C", config_path.to_str().unwrap(), "show"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("not found"));
}

#[test]
fn test_fresh_row_is_worth_nothing() {
    let temp_dir = TempDir::new().unwrap();
    let config_path = init_config(&temp_dir);

    situatie_cmd()
        .args(["-C", config_path.to_str().unwrap()])
        .args(["edit-row", "1", "--total-qty", "10", "--month-qty", "5", "--rate", "20"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Row 1: 0.00 RON"));
}

#[test]
fn test_show_totals_after_edits() {
    let temp_dir = TempDir::new().unwrap();
    let config_path = init_config(&temp_dir);
    fill_header(&config_path);
    fill_first_row(&config_path);

    situatie_cmd()
        .args(["-C", config_path.to_str().unwrap(), "show"])
        .assert()
        .success()
        .stdout(predicate::str::contains("SC Alfa SRL"))
        .stdout(predicate::str::contains("Zidarie"))
        .stdout(predicate::str::contains("1000.00"))
        .stdout(predicate::str::contains("210.00"))
        .stdout(predicate::str::contains("1210.00"));
}

#[test]
fn test_toggle_off_uses_identity() {
    let temp_dir = TempDir::new().unwrap();
    let config_path = init_config(&temp_dir);
    fill_first_row(&config_path);

    // 5 x 20 once total quantity stops counting
    situatie_cmd()
        .args(["-C", config_path.to_str().unwrap(), "toggle", "1", "total-qty"])
        .assert()
        .success()
        .stdout(predicate::str::contains("not counted, value 100.00 RON"));
}

#[test]
fn test_toggle_unknown_factor() {
    let temp_dir = TempDir::new().unwrap();
    let config_path = init_config(&temp_dir);

    situatie_cmd()
        .args(["-C", config_path.to_str().unwrap(), "toggle", "1", "weight"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Unknown factor 'weight'"));
}

#[test]
fn test_non_numeric_figure_counts_as_zero() {
    let temp_dir = TempDir::new().unwrap();
    let config_path = init_config(&temp_dir);
    fill_first_row(&config_path);

    situatie_cmd()
        .args(["-C", config_path.to_str().unwrap()])
        .args(["edit-row", "1", "--rate", "abc"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Row 1: 0.00 RON"));
}

#[test]
fn test_add_and_delete_rows_renumber() {
    let temp_dir = TempDir::new().unwrap();
    let config_path = init_config(&temp_dir);

    situatie_cmd()
        .args(["-C", config_path.to_str().unwrap(), "add-row", "--name", "Tencuieli"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Added row 2"));
    run_ok(&config_path, &["add-row"]);

    situatie_cmd()
        .args(["-C", config_path.to_str().unwrap(), "delete-row", "1"])
        .assert()
        .success();

    // Three rows became two, numbered 1 and 2
    let form = fs::read_to_string(config_path.join("form.toml")).unwrap();
    assert_eq!(form.matches("[[items]]").count(), 2);

    situatie_cmd()
        .args(["-C", config_path.to_str().unwrap(), "delete-row", "3"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Row 3 not found"));

    situatie_cmd()
        .args(["-C", config_path.to_str().unwrap(), "show"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Tencuieli"));
}

#[test]
fn test_cannot_delete_last_row() {
    let temp_dir = TempDir::new().unwrap();
    let config_path = init_config(&temp_dir);

    situatie_cmd()
        .args(["-C", config_path.to_str().unwrap(), "delete-row", "1"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("at least one row"));
}

#[test]
fn test_subcontractor_can_be_removed() {
    let temp_dir = TempDir::new().unwrap();
    let config_path = init_config(&temp_dir);

    run_ok(&config_path, &["header", "--subcontractor", "SC Beta SRL"]);
    situatie_cmd()
        .args(["-C", config_path.to_str().unwrap(), "show"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Subcontractor: SC Beta SRL"));

    run_ok(&config_path, &["header", "--no-subcontractor"]);
    situatie_cmd()
        .args(["-C", config_path.to_str().unwrap(), "show"])
        .assert()
        .success()
        .stdout(predicate::str::contains("SC Beta SRL").not());
}

#[test]
fn test_image_load_and_exclude() {
    let temp_dir = TempDir::new().unwrap();
    let config_path = init_config(&temp_dir);
    let image_path = temp_dir.path().join("stamp.png");
    fs::write(&image_path, png_1x1()).unwrap();

    run_ok(&config_path, &["image", image_path.to_str().unwrap()]);
    situatie_cmd()
        .args(["-C", config_path.to_str().unwrap(), "show"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Footer image:  included"));

    run_ok(&config_path, &["image", "--exclude"]);
    situatie_cmd()
        .args(["-C", config_path.to_str().unwrap(), "show"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Footer image:  loaded, excluded"));
}

#[test]
fn test_image_rejects_unknown_format() {
    let temp_dir = TempDir::new().unwrap();
    let config_path = init_config(&temp_dir);
    let image_path = temp_dir.path().join("stamp.gif");
    fs::write(&image_path, b"GIF89a").unwrap();

    situatie_cmd()
        .args(["-C", config_path.to_str().unwrap(), "image"])
        .arg(&image_path)
        .assert()
        .failure()
        .stderr(predicate::str::contains("unsupported image format"));
}

#[test]
fn test_image_rejects_corrupt_png() {
    let temp_dir = TempDir::new().unwrap();
    let config_path = init_config(&temp_dir);
    let image_path = temp_dir.path().join("stamp.png");
    let mut data = vec![0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A];
    data.extend_from_slice(b"garbage");
    fs::write(&image_path, data).unwrap();

    situatie_cmd()
        .args(["-C", config_path.to_str().unwrap(), "image"])
        .arg(&image_path)
        .assert()
        .failure()
        .stderr(predicate::str::contains("corrupt png image"));

    situatie_cmd()
        .args(["-C", config_path.to_str().unwrap(), "show"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Footer image:  none"));
}

#[test]
fn test_file_name_with_slash_in_beneficiary() {
    let temp_dir = TempDir::new().unwrap();
    let config_path = init_config(&temp_dir);
    fill_header(&config_path);
    fill_first_row(&config_path);
    run_ok(&config_path, &["header", "--beneficiary", "SC A/B SRL"]);

    situatie_cmd()
        .args(["-C", config_path.to_str().unwrap(), "inspect"])
        .assert()
        .success()
        .stdout(predicate::str::contains(
            "Situatie_lucrari_SC A_B SRL_1-31.05_2026.pdf",
        ));
}

#[test]
fn test_include_without_image() {
    let temp_dir = TempDir::new().unwrap();
    let config_path = init_config(&temp_dir);

    situatie_cmd()
        .args(["-C", config_path.to_str().unwrap(), "image", "--include"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("No footer image loaded"));
}

#[test]
fn test_generate_requires_beneficiary() {
    let temp_dir = TempDir::new().unwrap();
    let config_path = init_config(&temp_dir);
    fill_first_row(&config_path);

    situatie_cmd()
        .args(["-C", config_path.to_str().unwrap(), "generate"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Required field 'beneficiary'"));
}

#[test]
fn test_generate_without_typst() {
    let temp_dir = TempDir::new().unwrap();
    let config_path = init_config(&temp_dir);
    fill_header(&config_path);
    fill_first_row(&config_path);

    situatie_cmd()
        .args(["-C", config_path.to_str().unwrap(), "generate"])
        .env("PATH", "")
        .assert()
        .failure()
        .stderr(predicate::str::contains("Typst not found"));
}

#[test]
fn test_inspect_reports_placement() {
    let temp_dir = TempDir::new().unwrap();
    let config_path = init_config(&temp_dir);
    fill_header(&config_path);
    fill_first_row(&config_path);

    situatie_cmd()
        .args(["-C", config_path.to_str().unwrap(), "inspect"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Signature block:  same page"))
        .stdout(predicate::str::contains("Pages:            1"))
        .stdout(predicate::str::contains(
            "Situatie_lucrari_SC Alfa SRL_1-31.05_2026.pdf",
        ));
}

#[test]
fn test_inspect_json() {
    let temp_dir = TempDir::new().unwrap();
    let config_path = init_config(&temp_dir);
    fill_header(&config_path);
    fill_first_row(&config_path);

    let output = situatie_cmd()
        .args(["-C", config_path.to_str().unwrap(), "inspect", "--json"])
        .output()
        .unwrap();
    assert!(output.status.success());

    let value: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(value["summary"]["placement"], "same_page");
    assert_eq!(value["document"]["pages"].as_array().unwrap().len(), 1);
}

#[test]
fn test_invalid_theme_color() {
    let temp_dir = TempDir::new().unwrap();
    let config_path = init_config(&temp_dir);
    fill_header(&config_path);
    fill_first_row(&config_path);

    let config = fs::read_to_string(config_path.join("config.toml")).unwrap();
    fs::write(
        config_path.join("config.toml"),
        config.replace("\"#1abd9c\"", "\"green\""),
    )
    .unwrap();

    situatie_cmd()
        .args(["-C", config_path.to_str().unwrap(), "inspect"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Invalid color 'green'"));
}
