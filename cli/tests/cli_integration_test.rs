use std::fs;
use std::path::PathBuf;
use std::process::{Command, Output};

fn tmp_path(name: &str) -> PathBuf {
    let dir = PathBuf::from(env!("CARGO_TARGET_TMPDIR")).join("fskmodem-cli");
    fs::create_dir_all(&dir).ok();
    dir.join(name)
}

fn create_test_file(name: &str, content: &[u8]) -> PathBuf {
    let path = tmp_path(name);
    fs::write(&path, content).expect("Failed to write test file");
    path
}

fn run_fskmodem(args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_fskmodem"))
        .args(args)
        .output()
        .expect("Failed to execute fskmodem")
}

fn combined_output(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).to_string() + &String::from_utf8_lossy(&output.stdout)
}

#[test]
fn test_encode_creates_wav() {
    let output = tmp_path("test_encode.wav");

    let result = run_fskmodem(&[
        "encode",
        output.to_str().unwrap(),
        "Test message",
        "--preamble",
        "0.3",
        "--tail",
        "0.2",
    ]);
    assert!(result.status.success(), "{}", combined_output(&result));
    assert!(combined_output(&result).contains("Encoded 1 messages"));

    // 0.5 s of hold plus 12 bytes at 300 baud, 16-bit mono at 48 kHz
    let samples = 24000 + 12 * 10 * 160;
    let metadata = fs::metadata(&output).expect("Output file not created");
    let data_bytes = 2 * samples as u64;
    assert!(metadata.len() > data_bytes, "File too small: {} bytes", metadata.len());
    assert!(metadata.len() < data_bytes + 100, "File too large: {} bytes", metadata.len());
}

#[test]
fn test_roundtrip_text() {
    let encoded = tmp_path("test_roundtrip.wav");

    let result = run_fskmodem(&[
        "encode",
        encoded.to_str().unwrap(),
        "Hello, World!",
        "second line",
        "--sender",
        "Test",
        "--sample-rate",
        "22050",
        "--preamble",
        "0.3",
        "--tail",
        "0.2",
    ]);
    assert!(result.status.success(), "{}", combined_output(&result));

    let result = run_fskmodem(&["decode", encoded.to_str().unwrap()]);
    let text = combined_output(&result);
    assert!(result.status.success(), "{}", text);
    assert!(text.contains("Decoded 2 messages"), "{}", text);
    assert!(text.contains("<Test> Hello, World!"), "{}", text);
    assert!(text.contains("<Test> second line"), "{}", text);
}

#[test]
fn test_roundtrip_binary_file_json() {
    let data: Vec<u8> = (0..=255).collect();
    let input = create_test_file("test_binary.bin", &data);
    let encoded = tmp_path("test_binary.wav");

    let result = run_fskmodem(&[
        "encode",
        encoded.to_str().unwrap(),
        "--input",
        input.to_str().unwrap(),
        "--preamble",
        "0.3",
        "--tail",
        "0.2",
    ]);
    assert!(result.status.success(), "{}", combined_output(&result));

    let result = run_fskmodem(&["decode", encoded.to_str().unwrap(), "--json"]);
    assert!(result.status.success(), "{}", combined_output(&result));

    let reports: serde_json::Value = serde_json::from_slice(&result.stdout).unwrap();
    let reports = reports.as_array().expect("JSON array");
    assert_eq!(reports.len(), 1);
    assert_eq!(
        reports[0]["data_base64"],
        "AAECAwQFBgcICQoLDA0ODxAREhMUFRYXGBkaGxwdHh8gISIjJCUmJygpKissLS4vMDEyMzQ1Njc4OTo7PD0+P0BBQkNERUZHSElKS0xNTk9QUVJTVFVWV1hZWltcXV5fYGFiY2RlZmdoaWprbG1ub3BxcnN0dXZ3eHl6e3x9fn+AgYKDhIWGh4iJiouMjY6PkJGSk5SVlpeYmZqbnJ2en6ChoqOkpaanqKmqq6ytrq+wsbKztLW2t7i5uru8vb6/wMHCw8TFxsfIycrLzM3Oz9DR0tPU1dbX2Nna29zd3t/g4eLj5OXm5+jp6uvs7e7v8PHy8/T19vf4+fr7/P3+/w=="
    );
    assert!(reports[0]["start_seconds"].as_f64().unwrap() > 0.3);
}

#[test]
fn test_bell202_roundtrip() {
    let encoded = tmp_path("test_bell202.wav");

    let result = run_fskmodem(&[
        "encode",
        encoded.to_str().unwrap(),
        "twelve hundred baud",
        "--mode",
        "bell202",
        "--sample-rate",
        "44100",
    ]);
    assert!(result.status.success(), "{}", combined_output(&result));

    let result = run_fskmodem(&["decode", encoded.to_str().unwrap(), "--mode", "bell202"]);
    let text = combined_output(&result);
    assert!(result.status.success(), "{}", text);
    assert!(text.contains("twelve hundred baud"), "{}", text);
}

#[test]
fn test_unknown_mode_fails() {
    let output = tmp_path("test_unknown_mode.wav");
    let result = run_fskmodem(&["encode", output.to_str().unwrap(), "hi", "--mode", "bell212"]);
    assert!(!result.status.success());
    assert!(combined_output(&result).contains("bell212"));
}

#[test]
fn test_encode_requires_input() {
    let output = tmp_path("test_nothing.wav");
    let result = run_fskmodem(&["encode", output.to_str().unwrap()]);
    assert!(!result.status.success());
    assert!(combined_output(&result).contains("nothing to send"));
}

#[test]
fn test_modes_lists_presets() {
    let result = run_fskmodem(&["modes"]);
    let text = combined_output(&result);
    assert!(result.status.success());
    assert!(text.contains("bell103"));
    assert!(text.contains("bell202"));
    assert!(text.contains("0.002351515183"));
}

#[test]
fn test_optimize_delay_matches_preset() {
    let result = run_fskmodem(&["optimize-delay", "300", "1270", "1070"]);
    let text = combined_output(&result);
    assert!(result.status.success(), "{}", text);
    assert!(text.contains("delay: 0.0023515151"), "{}", text);
}
