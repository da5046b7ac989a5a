use bastion_clock::ManualClock;
use bastion_runner::{ExecutionGovernor, GovernorConfig, Session, replay};
use log::info;

fn print_help() {
    eprintln!(
        r#"Bastion - risk-adaptive execution governor dry run

USAGE:
    bastion --session <PATH> [OPTIONS]

OPTIONS:
    --session <PATH>    Scripted session to replay (JSON)
    --config <PATH>     Load governor configuration from JSON file
    --help              Print this help message

ENVIRONMENT VARIABLES:
    RUST_LOG            Log level filter (default: info)

EXAMPLES:
    bastion --session demos/session.json
    RUST_LOG=debug bastion --session demos/session.json --config demos/config.json
"#
    );
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args: Vec<String> = std::env::args().collect();
    let mut config_path: Option<String> = None;
    let mut session_path: Option<String> = None;

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--help" | "-h" => {
                print_help();
                return Ok(());
            }
            "--config" | "-c" => {
                i += 1;
                if i >= args.len() {
                    eprintln!("Error: --config requires a path argument");
                    std::process::exit(1);
                }
                config_path = Some(args[i].clone());
            }
            "--session" | "-s" => {
                i += 1;
                if i >= args.len() {
                    eprintln!("Error: --session requires a path argument");
                    std::process::exit(1);
                }
                session_path = Some(args[i].clone());
            }
            arg => {
                eprintln!("Unknown argument: {}", arg);
                print_help();
                std::process::exit(1);
            }
        }
        i += 1;
    }

    let Some(session_path) = session_path else {
        eprintln!("Error: --session is required");
        print_help();
        std::process::exit(1);
    };

    let config = match config_path {
        Some(path) => {
            info!("Loading configuration from: {}", path);
            GovernorConfig::load(&path)?
        }
        None => GovernorConfig::default(),
    };
    let session = Session::load(&session_path)?;
    info!("Replaying {} steps from {}", session.steps.len(), session_path);

    let clock = ManualClock::new(session.start);
    let governor = ExecutionGovernor::with_clock(config, clock.clone());
    governor.start();

    for (n, outcome) in replay(&governor, &clock, &session).await.iter().enumerate() {
        println!("{:>3} {}", n + 1, serde_json::to_string(outcome)?);
    }
    println!("{}", serde_json::to_string_pretty(&governor.status())?);

    governor.shutdown();
    Ok(())
}
