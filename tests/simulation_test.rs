//! Full simulation runs and settings loading.

#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]
#![allow(clippy::indexing_slicing)]
#![allow(clippy::arithmetic_side_effects)]

use std::io::Write;

use botline::botline_core::Error;
use botline::cli::Cli;
use botline::simulation::{self, Drain, Settings};
use clap::Parser;
use tempfile::NamedTempFile;

fn config_file(contents: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().expect("create temp file");
    file.write_all(contents.as_bytes()).expect("write config");
    file
}

#[test]
fn test_load_full_settings() {
    let file = config_file(
        r"
[dispatch]
processing_ms = 250

[simulation]
initial_bots = 2
max_hires = 3
max_retires = 4
max_normal_orders = 5
max_vip_orders = 6
",
    );

    let settings = Settings::load(file.path()).unwrap();
    assert_eq!(settings.dispatch.processing_ms, 250);
    assert_eq!(settings.simulation.initial_bots, 2);
    assert_eq!(settings.simulation.max_hires, 3);
    assert_eq!(settings.simulation.max_vip_orders, 6);
}

#[test]
fn test_missing_sections_take_defaults() {
    let file = config_file("[simulation]\ninitial_bots = 1\n");
    let settings = Settings::load(file.path()).unwrap();
    assert_eq!(settings.dispatch.processing_ms, 10_000);
    assert_eq!(settings.simulation.initial_bots, 1);
    assert_eq!(settings.simulation.max_normal_orders, 15);
}

#[test]
fn test_load_errors() {
    let missing = Settings::load(std::path::Path::new("/nonexistent/botline.toml"));
    assert!(matches!(missing, Err(Error::FileReadFailed { .. })));

    let file = config_file("[dispatch\nprocessing_ms = ");
    assert!(matches!(
        Settings::load(file.path()),
        Err(Error::TomlParseFailed { .. })
    ));

    let file = config_file("[dispatch]\nprocessing_ms = 0\n");
    assert!(matches!(
        Settings::load(file.path()),
        Err(Error::InvalidConfig { .. })
    ));
}

#[test]
fn test_flags_override_file() {
    let file = config_file("[dispatch]\nprocessing_ms = 250\n[simulation]\ninitial_bots = 9\n");
    let path = file.path().to_string_lossy().into_owned();

    let cli = Cli::try_parse_from(["botline", "--config", &path, "--initial-bots", "3"]).unwrap();
    let settings = cli.settings().unwrap();
    assert_eq!(settings.simulation.initial_bots, 3);
    assert_eq!(settings.dispatch.processing_ms, 250);
}

#[tokio::test]
async fn test_fast_run_completes_every_order() {
    let settings = Settings::default();
    let summary = simulation::run(&settings, Some(42), Drain::Instant)
        .await
        .unwrap();

    assert!(summary.bots_deleted <= 10);
    assert!(summary.bots_remaining <= 5 + 10);
    // With a bot left, every submitted order (at least one of each class)
    // was eventually served.
    if summary.bots_remaining > 0 {
        assert!(summary.normal_completed >= 1);
        assert!(summary.vip_completed >= 1);
    }
}

#[tokio::test]
async fn test_seeded_runs_are_reproducible() {
    let settings = Settings::default();
    let a = simulation::run(&settings, Some(7), Drain::Instant)
        .await
        .unwrap();
    let b = simulation::run(&settings, Some(7), Drain::Instant)
        .await
        .unwrap();
    assert_eq!(a, b);
}

#[tokio::test(start_paused = true)]
async fn test_realtime_run_matches_fast_run() {
    let mut settings = Settings::default();
    settings.dispatch.processing_ms = 1_000;

    let fast = simulation::run(&settings, Some(11), Drain::Instant)
        .await
        .unwrap();
    let realtime = simulation::run(&settings, Some(11), Drain::Realtime)
        .await
        .unwrap();
    assert_eq!(fast, realtime);
}

#[test]
fn test_summary_serialises_to_json() {
    let summary = simulation::Summary {
        bots_remaining: 1,
        bots_deleted: 2,
        normal_completed: 3,
        vip_completed: 4,
    };
    let json = serde_json::to_value(summary).unwrap();
    assert_eq!(json["bots_remaining"], 1);
    assert_eq!(json["vip_completed"], 4);
}
