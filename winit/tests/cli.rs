use std::io::Write;
use std::process::Command;

fn bin() -> Command {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_framerush"));
    // 避免从工作目录读到本地配置
    cmd.current_dir(std::env::temp_dir());
    cmd.env("RUST_LOG", "off");
    cmd
}

#[test]
fn missing_input_prints_usage_and_exits_one() {
    let out = bin().output().unwrap();
    assert_eq!(out.status.code(), Some(1));
    let stderr = String::from_utf8_lossy(&out.stderr);
    assert!(stderr.contains("Usage"), "stderr: {stderr}");
    assert!(out.stdout.is_empty());
}

#[test]
fn help_exits_zero() {
    let out = bin().arg("--help").output().unwrap();
    assert_eq!(out.status.code(), Some(0));
    assert!(String::from_utf8_lossy(&out.stdout).contains("--probe"));
}

#[test]
fn unopenable_input_fails_without_window() {
    let dir = tempfile::tempdir().unwrap();
    let missing = dir.path().join("no-such-clip.mp4");
    let out = bin().arg(&missing).output().unwrap();
    let code = out.status.code().unwrap();
    assert_ne!(code, 0);
    assert_ne!(code, 1);
    let stderr = String::from_utf8_lossy(&out.stderr);
    assert!(stderr.contains("no-such-clip.mp4"), "stderr: {stderr}");
}

#[test]
fn probe_of_garbage_file_fails() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(b"definitely not a media container").unwrap();
    let out = bin().arg("--probe").arg(file.path()).output().unwrap();
    assert!(!out.status.success());
    assert!(out.stdout.is_empty());
}

#[test]
fn listing_y4m_streams_prints_the_video_stream() {
    let mut file = tempfile::Builder::new().suffix(".y4m").tempfile().unwrap();
    file.write_all(b"YUV4MPEG2 W8 H4 F25:1 Ip A1:1 C420jpeg\n").unwrap();
    for luma in [16u8, 128] {
        file.write_all(b"FRAME\n").unwrap();
        file.write_all(&[luma; 32]).unwrap();
        file.write_all(&[128; 16]).unwrap();
    }
    file.flush().unwrap();

    let out = bin().arg("--probe").arg(file.path()).output().unwrap();
    assert_eq!(out.status.code(), Some(0));
    let stdout = String::from_utf8_lossy(&out.stdout);
    assert_eq!(stdout.lines().count(), 1, "stdout: {stdout}");
    assert!(
        stdout.contains("#0 video rawvideo 8x4 yuv420p"),
        "stdout: {stdout}"
    );
}

#[test]
fn invalid_config_exits_one() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(file, "[pacing]\nmode = \"warp\"").unwrap();
    let out = bin()
        .arg("--config")
        .arg(file.path())
        .arg("clip.mp4")
        .output()
        .unwrap();
    assert_eq!(out.status.code(), Some(1));
}

#[test]
fn delay_and_no_pacing_conflict() {
    let out = bin()
        .args(["--delay-ms", "5", "--no-pacing", "clip.mp4"])
        .output()
        .unwrap();
    assert_eq!(out.status.code(), Some(1));
}
