//! CLI entry point. Loads a flow file, runs it to completion against an
//! in-memory repository, and prints step-by-step progress followed by a
//! summary. This engine only ever runs sequentially — there is no
//! `--parallel` flag.

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use tracing::Level;

use flow_engine::domain::{RunStatus, StepStatus};
use flow_engine::http_requester::HttpRequester;
use flow_engine::loader::load_flow_from_file;
use flow_engine::orchestrator::RunService;
use flow_engine::repository::{MemoryRepository, Repository};
use flow_engine::step_executor::HttpStepExecutor;
use flow_engine::telemetry::{init_telemetry, shutdown_telemetry, TelemetryConfig};

#[derive(Parser)]
#[command(name = "flow-engine")]
#[command(about = "Executes HTTP test flows and streams step-by-step progress", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Runs a flow file to completion.
    Run {
        /// Path to the flow definition (JSON: flow + steps + edges).
        #[arg(long)]
        flow: PathBuf,

        /// Prepended to every step URL that isn't already absolute.
        #[arg(long, default_value = "")]
        base_url: String,

        /// Debug-level logging, including interpolation and request bodies.
        #[arg(long, short = 'v', default_value = "false")]
        verbose: bool,

        /// Error-level logging only.
        #[arg(long, short = 's', default_value = "false")]
        silent: bool,

        /// OTLP gRPC endpoint to export traces to.
        #[arg(long)]
        otel_endpoint: Option<String>,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    match cli.command {
        Commands::Run {
            flow,
            base_url,
            verbose,
            silent,
            otel_endpoint,
        } => {
            let mut telemetry_config = TelemetryConfig::from_env();
            telemetry_config.log_level = if silent {
                Level::ERROR
            } else if verbose {
                Level::DEBUG
            } else {
                Level::INFO
            };
            if let Some(endpoint) = otel_endpoint {
                telemetry_config.otlp_endpoint = Some(endpoint);
            }

            if let Err(err) = init_telemetry(telemetry_config) {
                eprintln!("failed to initialize telemetry: {err}");
                return ExitCode::FAILURE;
            }

            let exit = run_flow_command(&flow, &base_url, silent).await;
            shutdown_telemetry();
            exit
        }
    }
}

async fn run_flow_command(flow_path: &PathBuf, base_url: &str, silent: bool) -> ExitCode {
    let definition = match load_flow_from_file(flow_path) {
        Ok(def) => def,
        Err(err) => {
            eprintln!("failed to load flow: {err:#}");
            return ExitCode::FAILURE;
        }
    };

    let repo = MemoryRepository::shared();
    repo.seed_flow(definition.flow.id, definition.steps, definition.edges).await;

    let step_executor: Arc<dyn flow_engine::step_executor::StepExecutor> =
        Arc::new(HttpStepExecutor::new(HttpRequester::new(base_url)));
    let service = RunService::new(repo.clone(), step_executor);

    let (run, mut events, _cancel) = match service.start_run(definition.flow.id).await {
        Ok(started) => started,
        Err(err) => {
            eprintln!("failed to start run: {err}");
            return ExitCode::FAILURE;
        }
    };

    if !silent {
        println!("run {} started for flow \"{}\"", run.id, definition.flow.name);
    }

    let (mut passed, mut failed) = (0u32, 0u32);

    while let Some(event) = events.recv().await {
        match event.status {
            StepStatus::Passed => passed += 1,
            StepStatus::Failed => failed += 1,
            StepStatus::Pending | StepStatus::Running => {}
        }
        if silent || event.status == StepStatus::Running {
            continue;
        }
        match event.status {
            StepStatus::Passed => println!("  [pass] {}", event.step_name),
            StepStatus::Failed => println!(
                "  [fail] {} - {}",
                event.step_name,
                event
                    .data
                    .as_ref()
                    .and_then(|d| d.error_message.as_deref())
                    .unwrap_or("unknown error")
            ),
            StepStatus::Pending | StepStatus::Running => {}
        }
    }

    let final_run = match repo.get_run(run.id).await {
        Ok(r) => r,
        Err(err) => {
            eprintln!("failed to read final run state: {err}");
            return ExitCode::FAILURE;
        }
    };

    // Steps never reached by the orchestrator keep their pre-created
    // `pending` row — that's the visible marker of "not run", not a failure.
    let not_reached = match repo.list_step_results_by_run(run.id).await {
        Ok(results) => results.iter().filter(|r| r.status == StepStatus::Pending).count(),
        Err(_) => 0,
    };

    if !silent {
        let duration_ms = match (final_run.started_at, final_run.finished_at) {
            (Some(start), Some(end)) => (end - start).num_milliseconds().max(0),
            _ => 0,
        };
        println!(
            "run {} finished: {:?} ({passed} passed, {failed} failed, {not_reached} not reached, {duration_ms}ms)",
            final_run.id, final_run.status
        );
    }

    match final_run.status {
        RunStatus::Passed => ExitCode::SUCCESS,
        _ => ExitCode::FAILURE,
    }
}
