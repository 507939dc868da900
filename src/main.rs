//! Fingerbank CLI - identify devices from their network fingerprints
//!
//! Thin command-line front end over the library client. Responses are cached
//! on disk unless `--no-cache` is given.

use std::process::ExitCode;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use fingerbank::api::{ApiError, Fetched, FingerbankClient, Interrogation};
use fingerbank::cli::{Cli, Command, StartupConfig};

/// Sets up logging to stderr, filtered by `RUST_LOG` (default: warn)
fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();
}

/// Runs the selected API operation
async fn run(client: &FingerbankClient, command: &Command) -> Result<Fetched, ApiError> {
    match command {
        Command::Interrogate { .. } => {
            let params = command.interrogate_params().unwrap_or_default();
            client.fetch(&client.interrogate_request(&params)?).await
        }
        Command::Device { id } => client.fetch(&client.device_request(*id)).await,
        Command::BaseInfo { fields } => {
            let fields: Vec<&str> = fields.iter().map(String::as_str).collect();
            client
                .fetch(&client.devices_base_info_request(&fields))
                .await
        }
        Command::Account => client.account_info().await.map(Fetched::live),
    }
}

/// Prints a response with a short summary ahead of the body
fn print_response(fetched: &Fetched, command: &Command) {
    let response = &fetched.response;
    println!("status: {}", response.status_code);

    if fetched.is_from_cache() {
        println!("(from cache)");
    }

    if matches!(command, Command::Interrogate { .. }) && response.is_success() {
        match response.json::<Interrogation>() {
            Ok(Interrogation {
                device: Some(device),
                score,
                ..
            }) => match score {
                Some(score) => println!("device: {} (score {})", device.name, score),
                None => println!("device: {}", device.name),
            },
            Ok(_) => {}
            Err(e) => tracing::debug!(error = %e, "response is not an interrogation result"),
        }
    }

    println!("{}", response.body);
}

#[tokio::main]
async fn main() -> ExitCode {
    init_tracing();

    let cli = Cli::parse();
    let startup = match StartupConfig::from_cli(&cli) {
        Ok(startup) => startup,
        Err(e) => {
            eprintln!("error: {}", e);
            return ExitCode::from(2);
        }
    };

    let client = FingerbankClient::new(startup.client);

    match run(&client, &startup.command).await {
        Ok(fetched) => {
            print_response(&fetched, &startup.command);
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("error: {}", e);
            ExitCode::FAILURE
        }
    }
}
