// small-talk command line entry point.
// Runs a single invocation, or serves newline-delimited invocations on stdin.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use serde_json::{Value, json};
use tracing::{error, info};

use small_talk::{App, Config, Function};

/// Hacker News top stories and current weather, cached.
#[derive(Parser)]
#[command(name = "small-talk", version, about)]
struct Cli {
    /// Read environment variables from this file before loading config.
    #[arg(long, global = true)]
    env_file: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Fetch the top Hacker News stories.
    News,
    /// Fetch current weather for a location.
    Weather {
        #[arg(long)]
        location: String,
    },
    /// Read `{"function": ..., "event": ...}` lines from stdin, write one response per line.
    Serve,
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "small_talk=info".into()),
        )
        .with_writer(std::io::stderr)
        .with_target(true)
        .init();

    let cli = Cli::parse();

    let config = match Config::load(cli.env_file.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            error!("Failed to load configuration: {e}");
            return ExitCode::FAILURE;
        }
    };

    let app = match App::new(config) {
        Ok(app) => app,
        Err(e) => {
            error!("Failed to start: {e}");
            return ExitCode::FAILURE;
        }
    };

    match cli.command {
        Command::News => print_response(app.invoke(Function::News, json!({})).await),
        Command::Weather { location } => print_response(
            app.invoke(Function::Weather, json!({ "body": { "location": location } }))
                .await,
        ),
        Command::Serve => {
            info!("Serving invocations from stdin");
            let stdin = tokio::io::BufReader::new(tokio::io::stdin());
            match app.serve(stdin, tokio::io::stdout()).await {
                Ok(()) => ExitCode::SUCCESS,
                Err(e) => {
                    error!("Serve loop stopped: {e}");
                    ExitCode::FAILURE
                }
            }
        }
    }
}

fn print_response(response: Value) -> ExitCode {
    match serde_json::to_string_pretty(&response) {
        Ok(text) => println!("{text}"),
        Err(e) => {
            error!("Could not print response: {e}");
            return ExitCode::FAILURE;
        }
    }

    if response["statusCode"] == 200 {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}
