//! relay-sim entry point: CLI wiring and config-driven engine construction.

use std::path::Path;
use std::process;
use std::thread;
use std::time::{Duration, Instant};

use tracing::Level;

use relay_sim::config::ScenarioConfig;
use relay_sim::io::export::export_csv;
use relay_sim::sim::live::LiveSnapshot;

/// Interval between status lines of a headless live run.
const LIVE_REPORT_INTERVAL: Duration = Duration::from_secs(1);

/// Parsed CLI arguments.
struct CliArgs {
    scenario_path: Option<String>,
    preset: Option<String>,
    seed_override: Option<u64>,
    telemetry_out: Option<String>,
    live_secs: Option<f64>,
    verbose: bool,
    #[cfg(feature = "tui")]
    tui: bool,
}

fn print_help() {
    eprintln!("relay-sim: debounced relay and battery/inverter switching simulator");
    eprintln!();
    eprintln!("Usage: relay-sim [OPTIONS]");
    eprintln!();
    eprintln!("Options:");
    eprintln!("  --scenario <path>        Load scenario from TOML config file");
    eprintln!(
        "  --preset <name>          Use a built-in preset ({})",
        ScenarioConfig::PRESETS.join(", ")
    );
    eprintln!("  --seed <u64>             Override random seed");
    eprintln!("  --telemetry-out <path>   Export step results to CSV");
    eprintln!("  --live <seconds>         Run the battery/inverter switch in real time");
    #[cfg(feature = "tui")]
    eprintln!("  --tui                    Open the live dashboard");
    eprintln!("  --verbose                Log controller transitions to stderr");
    eprintln!("  --help                   Show this help message");
    eprintln!();
    eprintln!("If no --scenario or --preset is given, the baseline preset is used.");
}

fn next_value<'a>(args: &'a [String], i: &mut usize, flag: &str, what: &str) -> &'a str {
    *i += 1;
    if *i >= args.len() {
        eprintln!("error: {flag} requires a {what} argument");
        process::exit(1);
    }
    &args[*i]
}

fn parse_args() -> CliArgs {
    let args: Vec<String> = std::env::args().collect();
    let mut cli = CliArgs {
        scenario_path: None,
        preset: None,
        seed_override: None,
        telemetry_out: None,
        live_secs: None,
        verbose: false,
        #[cfg(feature = "tui")]
        tui: false,
    };

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--help" | "-h" => {
                print_help();
                process::exit(0);
            }
            "--scenario" => {
                cli.scenario_path = Some(next_value(&args, &mut i, "--scenario", "path").into());
            }
            "--preset" => {
                cli.preset = Some(next_value(&args, &mut i, "--preset", "name").into());
            }
            "--seed" => {
                let v = next_value(&args, &mut i, "--seed", "u64");
                if let Ok(s) = v.parse::<u64>() {
                    cli.seed_override = Some(s);
                } else {
                    eprintln!("error: --seed value \"{v}\" is not a valid u64");
                    process::exit(1);
                }
            }
            "--telemetry-out" => {
                cli.telemetry_out =
                    Some(next_value(&args, &mut i, "--telemetry-out", "path").into());
            }
            "--live" => {
                let v = next_value(&args, &mut i, "--live", "seconds");
                match v.parse::<f64>() {
                    Ok(s) if s > 0.0 && s.is_finite() => cli.live_secs = Some(s),
                    _ => {
                        eprintln!("error: --live value \"{v}\" is not a positive number");
                        process::exit(1);
                    }
                }
            }
            "--verbose" | "-v" => cli.verbose = true,
            #[cfg(feature = "tui")]
            "--tui" => cli.tui = true,
            other => {
                eprintln!("error: unknown argument \"{other}\"");
                print_help();
                process::exit(1);
            }
        }
        i += 1;
    }

    cli
}

fn init_logging(verbose: bool) {
    let level = if verbose { Level::DEBUG } else { Level::WARN };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .init();
}

fn print_live_status(snap: &LiveSnapshot) {
    println!(
        "t={:>8.2}s  soc={:>6.2}%  {:.2} V  solar={:>7.1} W  load={:>6.1} W  source={}",
        snap.time_s, snap.soc_pct, snap.voltage, snap.solar_w, snap.load_w, snap.source,
    );
}

/// Runs the live switch loop headless for `secs` real seconds.
fn run_live(scenario: &ScenarioConfig, secs: f64) {
    let mut live = scenario.build_live();
    if let Err(e) = live.start() {
        eprintln!("error: {e}");
        process::exit(1);
    }

    let deadline = Instant::now() + Duration::from_secs_f64(secs);
    loop {
        let now = Instant::now();
        if now >= deadline {
            break;
        }
        thread::sleep(LIVE_REPORT_INTERVAL.min(deadline - now));
        print_live_status(&live.snapshot());
    }
    live.stop();

    let snap = live.snapshot();
    let switches = snap
        .history
        .windows(2)
        .filter(|w| w[0].source != w[1].source)
        .count();
    println!();
    println!("==== LIVE RUN SUMMARY ====");
    println!("Simulated time: {:.2} s", snap.time_s);
    println!("Final SOC: {:.2}%", snap.soc_pct);
    println!("Power source: {}", snap.source);
    println!("Source switches in history: {switches}");
}

fn main() {
    let cli = parse_args();
    init_logging(cli.verbose);

    // --scenario takes priority, then --preset, then baseline default
    let mut scenario = if let Some(ref path) = cli.scenario_path {
        match ScenarioConfig::from_toml_file(Path::new(path)) {
            Ok(cfg) => cfg,
            Err(e) => {
                eprintln!("{e}");
                process::exit(1);
            }
        }
    } else if let Some(ref name) = cli.preset {
        match ScenarioConfig::from_preset(name) {
            Ok(cfg) => cfg,
            Err(e) => {
                eprintln!("{e}");
                process::exit(1);
            }
        }
    } else {
        ScenarioConfig::baseline()
    };

    if let Some(seed) = cli.seed_override {
        scenario.simulation.seed = seed;
    }

    let errors = scenario.validate();
    if !errors.is_empty() {
        for e in &errors {
            eprintln!("{e}");
        }
        process::exit(1);
    }

    #[cfg(feature = "tui")]
    if cli.tui {
        relay_sim::tui::run(&scenario);
        return;
    }

    if let Some(secs) = cli.live_secs {
        run_live(&scenario, secs);
        return;
    }

    let run = scenario.build_engine().run();

    for r in &run.results {
        println!("{r}");
    }
    println!("\n{}", run.report);

    if let Some(ref path) = cli.telemetry_out {
        if let Err(e) = export_csv(&run.results, Path::new(path)) {
            eprintln!("error: failed to write CSV: {e}");
            process::exit(1);
        }
        eprintln!("Telemetry written to {path}");
    }
}
