use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::Context;
use clap::Parser;
use reqkit_core::{RequestParameters, UreqTransport};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "reqkit", version, about = "Send an HTTP request described by a JSON parameter file")]
struct Cli {
    /// Path to the JSON file holding the request parameters
    params: PathBuf,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    match run(&cli.params) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            tracing::error!("{err:#}");
            ExitCode::FAILURE
        }
    }
}

fn run(path: &Path) -> anyhow::Result<()> {
    let raw = std::fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    let params: RequestParameters =
        serde_json::from_str(&raw).with_context(|| format!("parsing {}", path.display()))?;

    let response = reqkit_core::send(&params, &UreqTransport)?;

    println!("Status: {}", response.status);
    for (name, value) in &response.headers {
        println!("{name}: {value}");
    }
    for cookie in response.cookies() {
        println!("Cookie {}={}", cookie.name, cookie.value);
    }
    println!();

    let mut stdout = std::io::stdout().lock();
    stdout.write_all(&response.body).context("writing response body")?;
    stdout.flush()?;
    Ok(())
}
