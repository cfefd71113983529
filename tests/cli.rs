use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

const TINY_PNG: &[u8] = b"\x89PNG\r\n\x1a\n\0\0\0\rIHDR";

fn setup(extra: &str) -> (TempDir, PathBuf) {
    let dir = tempfile::tempdir().unwrap();
    let config_path = dir.path().join("config.toml");
    let storage = dir.path().join("storage");
    fs::write(
        &config_path,
        format!(
            "[storage]\npath = {:?}\n\n[publisher]\nbackend = \"log\"\n\n{extra}",
            storage.display().to_string()
        ),
    )
    .unwrap();
    (dir, config_path)
}

fn nowplaying(config_path: &Path) -> Command {
    let mut cmd = Command::cargo_bin("nowplaying").unwrap();
    cmd.env("NOWPLAYING_CONFIG", config_path).env_remove("RUST_LOG");
    cmd
}

#[test]
fn inspect_prints_only_supplied_fields() {
    let (_dir, config) = setup("");

    nowplaying(&config)
        .args(["inspect", "--title", "Song A", "--artist", "Artist X", "-d", "180"])
        .assert()
        .success()
        .stdout(predicate::str::contains("title: Song A"))
        .stdout(predicate::str::contains("artist: Artist X"))
        .stdout(predicate::str::contains("playbackDuration: 180"))
        .stdout(predicate::str::contains("albumTrackNumber: 0"))
        .stdout(predicate::str::contains("albumTitle").not())
        .stdout(predicate::str::contains("artwork").not());
}

#[test]
fn inspect_includes_artwork() {
    let (dir, config) = setup("");
    let cover = dir.path().join("cover.png");
    fs::write(&cover, TINY_PNG).unwrap();

    nowplaying(&config)
        .args(["inspect", "--title", "Song A", "--artwork"])
        .arg(&cover)
        .assert()
        .success()
        .stdout(predicate::str::contains(format!(
            "artwork: <image/png, {} bytes>",
            TINY_PNG.len()
        )));
}

#[test]
fn inspect_rejects_unreadable_artwork() {
    let (dir, config) = setup("");
    let cover = dir.path().join("cover.txt");
    fs::write(&cover, "definitely not an image").unwrap();

    nowplaying(&config)
        .args(["inspect", "--artwork"])
        .arg(&cover)
        .assert()
        .failure()
        .stderr(predicate::str::contains("Failed to load artwork"));
}

#[test]
fn inspect_rejects_bad_duration() {
    let (_dir, config) = setup("");

    nowplaying(&config)
        .args(["inspect", "--duration", "soon"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Invalid time format"));
}

#[test]
fn status_without_daemon() {
    let (_dir, config) = setup("");

    nowplaying(&config)
        .arg("status")
        .assert()
        .success()
        .stdout(predicate::str::contains("Daemon is not running."));
}

#[test]
fn publish_without_daemon_and_no_auto_start_fails() {
    let (_dir, config) = setup("[daemon]\nauto_start = false\n");

    nowplaying(&config)
        .args(["publish", "--title", "Song A"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Daemon is not running"));
}

#[test]
fn daemon_round_trip() {
    let (_dir, config) = setup("");

    nowplaying(&config)
        .args(["daemon", "start"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Daemon started."));

    nowplaying(&config)
        .args(["publish", "--title", "Song A", "--artist", "Artist X", "-d", "3:00"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Now playing: Song A - Artist X (3:00)"));

    nowplaying(&config)
        .arg("clear")
        .assert()
        .success()
        .stdout(predicate::str::contains("Now playing cleared"));

    nowplaying(&config)
        .arg("status")
        .assert()
        .success()
        .stdout(predicate::str::contains("Backend: log"))
        .stdout(predicate::str::contains("Updates published: 2"));

    nowplaying(&config)
        .args(["daemon", "stop"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Daemon stopped."));
}
