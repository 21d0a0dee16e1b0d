use anyhow::Result;
use circus_autopilot::benchmark::{run_benchmark, BenchmarkConfig, Objective};
use circus_autopilot::drivers::driver_ids;
use circus_autopilot::runner::{
    capture_frame, read_artifact, run_driver, verify_artifact, write_artifact,
};
use circus_core::{DrawCommand, RaceConfig, RaceSetup, Track, Viewport};

#[test]
fn every_driver_produces_a_verified_run() -> Result<()> {
    let setup = RaceSetup::default();
    for driver in driver_ids() {
        let artifact = run_driver(driver, 0xDEAD_BEEF, &setup, 300)?;
        assert_eq!(artifact.metrics.driver_id, driver);
        assert_eq!(artifact.metrics.ticks, 300, "driver={driver}");
        assert_eq!(artifact.inputs.len(), 300, "driver={driver}");
    }
    Ok(())
}

#[test]
fn full_race_always_has_a_winner() -> Result<()> {
    let setup = RaceSetup::default();
    for driver in ["idle", "line-keeper", "late-braker"] {
        let artifact = run_driver(driver, 0xC0FF_EE11, &setup, 36_000)?;
        let metrics = &artifact.metrics;
        assert!(metrics.finished, "driver={driver}");
        assert!(!metrics.winner.is_empty(), "driver={driver}");
        assert_eq!(artifact.inputs.len() as u32, metrics.ticks);
    }
    Ok(())
}

#[test]
fn idle_driver_never_touches_the_controls() -> Result<()> {
    let artifact = run_driver("idle", 7, &RaceSetup::default(), 36_000)?;
    assert!(artifact.inputs.iter().all(|byte| *byte == 0));
    assert!(!artifact.metrics.victory);
    assert_eq!(artifact.metrics.completed_laps, 0);
    assert_eq!(artifact.metrics.throttle_ticks, 0);
    Ok(())
}

#[test]
fn saved_run_verifies_and_tampering_is_caught() -> Result<()> {
    let setup = RaceSetup::default();
    let tmp = tempfile::tempdir()?;
    let path = tmp.path().join("runs/line-keeper.json");

    let artifact = run_driver("line-keeper", 0x1234_5678, &setup, 2_400)?;
    write_artifact(&path, &artifact)?;
    let loaded = read_artifact(&path)?;
    verify_artifact(&loaded, &setup)?;

    let mut tampered = loaded.clone();
    tampered.metrics.completed_laps += 1;
    assert!(verify_artifact(&tampered, &setup).is_err());

    let mut truncated = loaded;
    truncated.inputs.truncate(100);
    assert!(verify_artifact(&truncated, &setup).is_err());
    Ok(())
}

#[test]
fn custom_setup_is_honoured() -> Result<()> {
    let config = RaceConfig {
        total_laps: 1,
        ..RaceConfig::default()
    };
    let track = Track::default_circuit(config.segment_length);
    let setup = RaceSetup::new(config, track)?.with_roster(Vec::new());

    let artifact = run_driver("line-keeper", 3, &setup, 36_000)?;
    assert!(artifact.metrics.victory);
    assert_eq!(artifact.metrics.winner, "You");
    assert_eq!(artifact.metrics.completed_laps, 1);
    assert_eq!(artifact.metrics.final_rank, 1);
    Ok(())
}

#[test]
fn frame_capture_ends_with_the_chariot() -> Result<()> {
    let setup = RaceSetup::default();
    let dump = capture_frame("line-keeper", 5, &setup, 120, Viewport::new(640.0, 360.0))?;
    assert_eq!(dump.tick, 120);
    assert!(dump.commands.len() > 10);
    assert!(matches!(
        dump.commands.last(),
        Some(DrawCommand::LinePair { .. })
    ));
    assert!(capture_frame("nobody", 5, &setup, 1, Viewport::new(1.0, 1.0)).is_err());
    Ok(())
}

#[test]
fn benchmark_smoke_outputs_expected_files() -> Result<()> {
    let tmp = tempfile::tempdir()?;
    let report = run_benchmark(BenchmarkConfig {
        drivers: vec!["idle".to_string(), "line-keeper".to_string()],
        seeds: vec![1, 2],
        max_ticks: 600,
        objective: Objective::Hybrid,
        out_dir: tmp.path().to_path_buf(),
        save_top: 1,
        jobs: Some(2),
        setup: RaceSetup::default(),
    })?;

    assert_eq!(report.run_count, 4);
    assert_eq!(report.driver_rankings.len(), 2);
    assert_eq!(report.saved_runs.len(), 1);
    assert!(report
        .driver_rankings
        .iter()
        .all(|driver| driver.runs == 2));
    for file in ["summary.json", "runs.csv", "rankings.csv"] {
        assert!(tmp.path().join(file).exists(), "missing {file}");
    }
    let rankings = std::fs::read_to_string(tmp.path().join("rankings.csv"))?;
    assert_eq!(rankings.lines().count(), 3);
    assert!(report.saved_runs.iter().all(|saved| std::path::Path::new(&saved.path).exists()));
    Ok(())
}

#[test]
fn benchmark_rejects_zero_jobs() {
    let tmp = tempfile::tempdir().expect("tempdir");
    let result = run_benchmark(BenchmarkConfig {
        drivers: vec!["idle".to_string()],
        seeds: vec![1],
        max_ticks: 10,
        objective: Objective::Wins,
        out_dir: tmp.path().to_path_buf(),
        save_top: 0,
        jobs: Some(0),
        setup: RaceSetup::default(),
    });
    assert!(result.is_err());
}
