use clap::Parser;
use hybridtrader::cli::{Cli, run};
use std::process::ExitCode;

fn init_tracing(log_level: &str) -> Result<(), String> {
    let filter = std::env::var("HYBRIDTRADER_LOG").unwrap_or_else(|_| log_level.to_string());
    let env_filter = tracing_subscriber::EnvFilter::try_new(filter)
        .map_err(|err| format!("invalid log filter: {err}"))?;
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .init();
    Ok(())
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    if let Err(e) = init_tracing(&cli.log_level) {
        eprintln!("error: {e}");
        return ExitCode::from(2);
    }
    run(cli)
}
