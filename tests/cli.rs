//! The binary on its built-in demo game
//!
//! Runs are headless so no terminal is needed.

use std::process::Command;

fn agos(args: &[&str]) -> std::process::Output {
    Command::new(env!("CARGO_BIN_EXE_agos"))
        .args(args)
        .output()
        .expect("Failed to run agos")
}

#[test]
fn test_demo_runs_headless_for_a_frame_budget() {
    let output = agos(&["--demo", "--headless", "--frames", "60"]);
    assert!(
        output.status.success(),
        "stderr: {}",
        String::from_utf8_lossy(&output.stderr)
    );
}

#[test]
fn test_dump_vga_lists_the_demo_animation() {
    let output = agos(&["--demo", "--dump-vga", "1"]);
    assert!(output.status.success());
    let text = String::from_utf8_lossy(&output.stdout);
    assert!(text.contains("zone 1"), "{}", text);
    assert!(text.contains("animation 101"), "{}", text);
    assert!(text.contains("setSpriteXY"), "{}", text);
}

#[test]
fn test_dump_subroutines_lists_the_demo_script() {
    let output = agos(&["--demo", "--dump-subroutines"]);
    assert!(output.status.success());
    let text = String::from_utf8_lossy(&output.stdout);
    assert!(text.contains("subroutine 1"), "{}", text);
    assert!(text.contains("animate"), "{}", text);
}

#[test]
fn test_missing_game_dir_is_a_usage_error() {
    let output = agos(&["--headless"]);
    assert_eq!(output.status.code(), Some(2));
    assert!(String::from_utf8_lossy(&output.stderr).contains("no game directory"));
}
