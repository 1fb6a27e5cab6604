//! Solar ATAP estimator entry point: CLI wiring and config-driven evaluation.

use std::path::Path;
use std::process;

use solar_atap::config::ScenarioConfig;
use solar_atap::io::export::export_csv;
use solar_atap::runner::run_scenario;
use tracing_subscriber::EnvFilter;

/// Parsed CLI arguments.
struct CliArgs {
    scenario_path: Option<String>,
    preset: Option<String>,
    usage_override: Option<f64>,
    bill_override: Option<f64>,
    afa_override: Option<f64>,
    export_out: Option<String>,
    #[cfg(feature = "api")]
    serve: bool,
    #[cfg(feature = "api")]
    port: u16,
}

fn print_help() {
    eprintln!("solar-atap: tiered tariff bill and ATAP solar savings estimator");
    eprintln!();
    eprintln!("Usage: solar-atap [OPTIONS]");
    eprintln!();
    eprintln!("Options:");
    eprintln!("  --scenario <path>        Load scenario from TOML config file");
    eprintln!(
        "  --preset <name>          Use a built-in preset (baseline, high_usage, bill_target)"
    );
    eprintln!("  --usage <kWh>            Override monthly usage");
    eprintln!("  --bill <RM>              Solve usage from a monthly bill");
    eprintln!("  --afa <sen/kWh>          Override fuel surcharge");
    eprintln!("  --export <path>          Export bill breakdown and savings to CSV");
    #[cfg(feature = "api")]
    {
        eprintln!("  --serve                  Start REST API server after the report");
        eprintln!("  --port <u16>             API server port (default: 3000)");
    }
    eprintln!("  --help                   Show this help message");
    eprintln!();
    eprintln!("If no --scenario or --preset is given, the baseline preset is used.");
}

/// Returns the value following a flag, or exits with a usage error.
fn flag_value<'a>(args: &'a [String], i: usize, flag: &str, what: &str) -> &'a str {
    match args.get(i) {
        Some(v) => v.as_str(),
        None => {
            eprintln!("error: {flag} requires {what} argument");
            process::exit(1);
        }
    }
}

fn parse_number(args: &[String], i: usize, flag: &str) -> f64 {
    let raw = flag_value(args, i, flag, "a numeric");
    match raw.parse::<f64>() {
        Ok(v) if v.is_finite() => v,
        _ => {
            eprintln!("error: {flag} value \"{raw}\" is not a valid number");
            process::exit(1);
        }
    }
}

fn parse_args() -> CliArgs {
    let args: Vec<String> = std::env::args().collect();
    let mut cli = CliArgs {
        scenario_path: None,
        preset: None,
        usage_override: None,
        bill_override: None,
        afa_override: None,
        export_out: None,
        #[cfg(feature = "api")]
        serve: false,
        #[cfg(feature = "api")]
        port: 3000,
    };

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--help" | "-h" => {
                print_help();
                process::exit(0);
            }
            "--scenario" => {
                i += 1;
                cli.scenario_path =
                    Some(flag_value(&args, i, "--scenario", "a path").to_string());
            }
            "--preset" => {
                i += 1;
                cli.preset = Some(flag_value(&args, i, "--preset", "a name").to_string());
            }
            "--usage" => {
                i += 1;
                cli.usage_override = Some(parse_number(&args, i, "--usage"));
            }
            "--bill" => {
                i += 1;
                cli.bill_override = Some(parse_number(&args, i, "--bill"));
            }
            "--afa" => {
                i += 1;
                cli.afa_override = Some(parse_number(&args, i, "--afa"));
            }
            "--export" => {
                i += 1;
                cli.export_out = Some(flag_value(&args, i, "--export", "a path").to_string());
            }
            #[cfg(feature = "api")]
            "--serve" => {
                cli.serve = true;
            }
            #[cfg(feature = "api")]
            "--port" => {
                i += 1;
                let raw = flag_value(&args, i, "--port", "a u16");
                if let Ok(p) = raw.parse::<u16>() {
                    cli.port = p;
                } else {
                    eprintln!("error: --port value \"{raw}\" is not a valid u16");
                    process::exit(1);
                }
            }
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

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .without_time()
        .compact()
        .init();

    let cli = parse_args();

    // Load config: --scenario takes priority, then --preset, then baseline default
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

    // Apply overrides; --bill switches the customer to bill mode
    if let Some(usage) = cli.usage_override {
        scenario.customer.mode = "kwh".to_string();
        scenario.customer.monthly_usage_kwh = usage;
    }
    if let Some(bill) = cli.bill_override {
        scenario.customer.mode = "rm".to_string();
        scenario.customer.monthly_bill_rm = bill;
    }
    if let Some(afa) = cli.afa_override {
        scenario.customer.afa_sen = afa;
    }

    let errors = scenario.validate();
    if !errors.is_empty() {
        for e in &errors {
            eprintln!("{e}");
        }
        process::exit(1);
    }

    let outcome = run_scenario(&scenario);
    println!("{outcome}");

    if let Some(ref path) = cli.export_out {
        if let Err(e) = export_csv(&outcome.savings, Path::new(path)) {
            eprintln!("error: failed to write CSV: {e}");
            process::exit(1);
        }
        eprintln!("Breakdown written to {path}");
    }

    #[cfg(feature = "api")]
    if cli.serve {
        use std::net::SocketAddr;
        use std::sync::Arc;

        let state = Arc::new(solar_atap::api::AppState {
            rates: scenario.tariff,
        });
        let addr = SocketAddr::from(([0, 0, 0, 0], cli.port));
        let rt = tokio::runtime::Runtime::new().unwrap_or_else(|e| {
            eprintln!("error: failed to create tokio runtime: {e}");
            process::exit(1);
        });
        if let Err(e) = rt.block_on(solar_atap::api::serve(state, addr)) {
            eprintln!("error: API server failed: {e}");
            process::exit(1);
        }
    }
}
