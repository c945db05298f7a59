//! End-to-end runs of the `relay-sim` binary.

use std::process::{Command, Output};

#[derive(Debug)]
struct Switching {
    simple: usize,
    advanced: usize,
}

fn run(args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_relay-sim"))
        .args(args)
        .output()
        .expect("relay-sim process should run")
}

fn run_ok(args: &[&str]) -> String {
    let output = run(args);
    assert!(
        output.status.success(),
        "run failed for {args:?}: stderr={}",
        String::from_utf8_lossy(&output.stderr)
    );
    String::from_utf8(output.stdout).expect("stdout should be valid UTF-8")
}

fn parse_switches(stdout: &str, label: &str) -> usize {
    let line = stdout
        .lines()
        .find(|line| line.starts_with(label))
        .unwrap_or_else(|| panic!("missing line `{label}` in output: {stdout}"));
    line.split_once(':')
        .and_then(|(_, right)| right.split_whitespace().next())
        .and_then(|n| n.parse().ok())
        .unwrap_or_else(|| panic!("invalid switch count in `{line}`"))
}

fn parse_switching(stdout: &str, channel: &str) -> Switching {
    Switching {
        simple: parse_switches(stdout, &format!("{channel} Simple Control:")),
        advanced: parse_switches(stdout, &format!("{channel} Advanced Control:")),
    }
}

#[test]
fn scenario_files_run_and_report() {
    for path in [
        "scenarios/baseline.toml",
        "scenarios/cloudy.toml",
        "scenarios/wide_band.toml",
    ] {
        let stdout = run_ok(&["--scenario", path]);
        assert_eq!(
            stdout.lines().filter(|l| l.starts_with("t=")).count(),
            100,
            "{path}"
        );
        assert!(stdout.contains("==== CONTROLLER EFFICIENCY COMPARISON ===="));
        assert!(stdout.contains("Advanced control reduces relay switching by"));

        for channel in ["MPPT", "PWM"] {
            let s = parse_switching(&stdout, channel);
            assert!(s.advanced <= s.simple, "{path} {channel}: {s:?}");
        }
    }
}

#[test]
fn baseline_file_matches_baseline_preset() {
    let from_file = run_ok(&["--scenario", "scenarios/baseline.toml"]);
    let from_preset = run_ok(&["--preset", "baseline"]);
    let default = run_ok(&[]);
    assert_eq!(from_file, from_preset);
    assert_eq!(from_file, default);
}

#[test]
fn seed_override_changes_the_run() {
    let a = run_ok(&["--seed", "1"]);
    let b = run_ok(&["--seed", "2"]);
    assert_ne!(a, b);
    assert_eq!(a, run_ok(&["--seed", "1"]));
}

#[test]
fn telemetry_out_writes_csv() {
    let path = std::env::temp_dir().join("relay_sim_cli_telemetry.csv");
    let path_str = path.to_string_lossy().to_string();
    run_ok(&["--preset", "cloudy", "--telemetry-out", &path_str]);

    let csv = std::fs::read_to_string(&path).expect("telemetry file should exist");
    let mut lines = csv.lines();
    assert_eq!(
        lines.next(),
        Some("time_s,solar_w,mppt_w,pwm_w,mppt_simple,mppt_relay,pwm_simple,pwm_relay")
    );
    assert_eq!(lines.count(), 100);
    let _ = std::fs::remove_file(&path);
}

#[test]
fn unknown_preset_fails() {
    let output = run(&["--preset", "nope"]);
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("unknown preset"));
}

#[test]
fn invalid_scenario_reports_every_field() {
    let path = std::env::temp_dir().join("relay_sim_cli_invalid.toml");
    std::fs::write(&path, "[simulation]\nsteps = 1\n\n[live]\nspeed = 0.0\n")
        .expect("temp file should be writable");
    let output = run(&["--scenario", &path.to_string_lossy()]);
    let _ = std::fs::remove_file(&path);

    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("simulation.steps"), "{stderr}");
    assert!(stderr.contains("live.speed"), "{stderr}");
}

#[test]
fn live_run_prints_summary() {
    let stdout = run_ok(&["--live", "0.3"]);
    assert!(stdout.contains("==== LIVE RUN SUMMARY ===="));
    assert!(stdout.contains("Power source:"));
}

#[test]
fn bad_live_duration_fails() {
    assert!(!run(&["--live", "-1"]).status.success());
    assert!(!run(&["--live"]).status.success());
}
