//! CLI end-to-end tests
//!
//! Tests for the renderforge command-line interface.

use assert_cmd::prelude::*;
use predicates::prelude::*;
use std::fs;
use std::path::Path;
use std::process::Command;
use tempfile::tempdir;

/// Get a command for the renderforge binary
#[allow(deprecated)]
fn renderforge_cmd() -> Command {
    Command::cargo_bin("renderforge").unwrap()
}

#[test]
fn test_cli_no_args_shows_help() {
    let mut cmd = renderforge_cmd();
    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("Usage"));
}

#[test]
fn test_cli_help_flag() {
    let mut cmd = renderforge_cmd();
    cmd.arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("renderforge"))
        .stdout(predicate::str::contains("Usage"));
}

#[test]
fn test_cli_version_command() {
    let mut cmd = renderforge_cmd();
    cmd.arg("version")
        .assert()
        .success()
        .stdout(predicate::str::contains("renderforge"));
}

#[test]
fn test_cli_check_tools_command() {
    let mut cmd = renderforge_cmd();
    cmd.arg("check-tools").assert().success().stdout(
        predicate::str::contains("ffmpeg")
            .and(predicate::str::contains("ffprobe"))
            .and(predicate::str::contains("AtomicParsley")),
    );
}

#[test]
fn test_cli_render_help() {
    let mut cmd = renderforge_cmd();
    cmd.args(["render", "--help"])
        .assert()
        .success()
        .stdout(predicate::str::contains("patch metadata"));
}

#[test]
fn test_cli_probe_nonexistent_file() {
    let mut cmd = renderforge_cmd();
    cmd.args(["probe", "/nonexistent/path/song.mp3"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("not exist"));
}

#[test]
fn test_cli_metadata_unknown_field() {
    let temp = tempdir().unwrap();
    let file = temp.path().join("song.mp3");
    fs::write(&file, "x").unwrap();

    let mut cmd = renderforge_cmd();
    cmd.args(["metadata", file.to_str().unwrap(), "title", "bogus"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Unknown metadata field: bogus"));
}

#[cfg(unix)]
#[test]
fn test_cli_render_generic_command() {
    let temp = tempdir().unwrap();
    let input = temp.path().join("in.txt");
    let output = temp.path().join("out.txt");
    fs::write(&input, "payload").unwrap();

    let mut cmd = renderforge_cmd();
    cmd.args(["render", "-i"])
        .arg(&input)
        .arg("-o")
        .arg(&output)
        .arg("--")
        .arg("cp")
        .arg(&input)
        .arg(&output)
        .assert()
        .success();

    assert_eq!(fs::read_to_string(&output).unwrap(), "payload");
}

#[cfg(unix)]
#[test]
fn test_cli_render_refuses_existing_output() {
    let temp = tempdir().unwrap();
    let input = temp.path().join("in.txt");
    let output = temp.path().join("out.txt");
    fs::write(&input, "payload").unwrap();
    fs::write(&output, "keep").unwrap();

    let mut cmd = renderforge_cmd();
    cmd.args(["render", "-i"])
        .arg(&input)
        .arg("-o")
        .arg(&output)
        .arg("--")
        .arg("cp")
        .arg(&input)
        .arg(&output)
        .assert()
        .failure()
        .stderr(predicate::str::contains("already exists"));

    assert_eq!(fs::read_to_string(&output).unwrap(), "keep");
}

#[cfg(unix)]
#[test]
fn test_cli_render_failure_is_reported() {
    let temp = tempdir().unwrap();
    let output = temp.path().join("out.txt");

    let mut cmd = renderforge_cmd();
    cmd.args(["render", "-o"])
        .arg(&output)
        .args(["--", "false"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Render failed"));
}

#[cfg(unix)]
fn script(dir: &Path, name: &str, body: &str) -> std::path::PathBuf {
    use std::os::unix::fs::PermissionsExt;

    let path = dir.join(name);
    fs::write(&path, body).unwrap();
    fs::set_permissions(&path, fs::Permissions::from_mode(0o755)).unwrap();
    path
}

#[cfg(unix)]
#[test]
fn test_cli_metadata_with_configured_tools() {
    let temp = tempdir().unwrap();
    let ffmpeg = script(
        temp.path(),
        "fake-ffmpeg",
        "#!/bin/sh\necho '  Duration: 00:01:30.25, start: 0.000000, bitrate: 128 kb/s' >&2\n",
    );
    let ffprobe = script(
        temp.path(),
        "fake-ffprobe",
        "#!/bin/sh\ncase \"$4\" in\nformat_tags=title) echo 'Song Name' ;;\nesac\n",
    );
    let config_file = temp.path().join("renderforge.toml");
    fs::write(
        &config_file,
        format!(
            "[tools]\nffmpeg_path = {:?}\nffprobe_path = {:?}\n",
            ffmpeg, ffprobe
        ),
    )
    .unwrap();
    let file = temp.path().join("song.mp3");
    fs::write(&file, "x").unwrap();

    let mut cmd = renderforge_cmd();
    cmd.arg("--config")
        .arg(&config_file)
        .args(["metadata", file.to_str().unwrap(), "title", "duration", "genre", "--json"])
        .assert()
        .success()
        .stdout(predicate::str::contains(r#""title": "Song Name""#))
        .stdout(predicate::str::contains(r#""Duration": 90.25"#))
        .stdout(predicate::str::contains(r#""genre": null"#));
}

#[test]
fn test_cli_validate_valid_config() {
    let temp = tempdir().unwrap();
    let config_file = temp.path().join("config.toml");
    fs::write(&config_file, "[render]\nfaststart = false\n").unwrap();

    let mut cmd = renderforge_cmd();
    cmd.args(["validate", config_file.to_str().unwrap()])
        .assert()
        .success()
        .stdout(predicate::str::contains("Configuration is valid"))
        .stdout(predicate::str::contains("Faststart: false"));
}

#[test]
fn test_cli_validate_rejects_directory_tool_path() {
    let temp = tempdir().unwrap();
    let config_file = temp.path().join("config.toml");
    fs::write(
        &config_file,
        format!("[tools]\nffmpeg_path = {:?}\n", temp.path()),
    )
    .unwrap();

    let mut cmd = renderforge_cmd();
    cmd.args(["validate", config_file.to_str().unwrap()])
        .assert()
        .failure()
        .stderr(predicate::str::contains("directory"));
}

#[test]
fn test_cli_validate_malformed_config() {
    let temp = tempdir().unwrap();
    let config_file = temp.path().join("config.toml");
    fs::write(&config_file, "[render\nfaststart = ").unwrap();

    let mut cmd = renderforge_cmd();
    cmd.args(["validate", config_file.to_str().unwrap()])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Failed to parse config file"));
}
