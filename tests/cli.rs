use assert_cmd::prelude::*;
use predicates::str::contains;
use std::process::Command;

#[test]
fn headless_run_prints_scene_and_final_state() {
    let mut cmd = Command::cargo_bin("turntable").expect("binary exists");
    cmd.arg("--headless").arg("5").arg("--size").arg("800x600");
    cmd.assert()
        .success()
        .stdout(contains("Running headless for 5 frame(s) at 800x600"))
        .stdout(contains("Loaded scene with 4 nodes (2 lights, 2 meshes)"))
        .stdout(contains(" - Ambient (ambient light)"))
        .stdout(contains(" - Sun (directional light)"))
        .stdout(contains(" - Cube (cube)"))
        .stdout(contains(" - Ground (plane)"))
        .stdout(contains("Rendered 5 frame(s), camera at (2.00, 2.00, 5.00)"))
        .stdout(contains(" - Cube pos=(0.00, 0.00, 0.00) rot=(0.05, 0.05, 0.00)"))
        .stdout(contains(" - Ground pos=(0.00, -1.00, 0.00) rot=(-1.57, 0.00, 0.00)"))
        .stdout(contains("Disposed scene controller"));
}

#[test]
fn headless_zero_frames_still_runs_the_lifecycle() {
    let mut cmd = Command::cargo_bin("turntable").expect("binary exists");
    cmd.arg("--headless").arg("0");
    cmd.assert()
        .success()
        .stdout(contains("Rendered 0 frame(s)"))
        .stdout(contains(" - Cube pos=(0.00, 0.00, 0.00) rot=(0.00, 0.00, 0.00)"))
        .stdout(contains("Disposed scene controller"));
}

#[test]
fn unknown_argument_is_rejected() {
    let mut cmd = Command::cargo_bin("turntable").expect("binary exists");
    cmd.arg("--bogus");
    cmd.assert()
        .failure()
        .stderr(contains("Unknown argument: --bogus"));
}

#[test]
fn malformed_size_is_rejected() {
    let mut cmd = Command::cargo_bin("turntable").expect("binary exists");
    cmd.arg("--headless").arg("1").arg("--size").arg("800");
    cmd.assert()
        .failure()
        .stderr(contains("--size expects WIDTHxHEIGHT"));
}
