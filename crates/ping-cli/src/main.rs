//! PING CLI entry point

use clap::Parser;
use ping_cli::{Cli, Config, ExitCode, OutputFormat, OutputFormatter};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[tokio::main]
async fn main() -> std::process::ExitCode {
    let cli = Cli::parse();

    // Load config from custom path or default
    let config = match Config::load_from(cli.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Warning: Config error: {e}");
            eprintln!("Using default configuration.");
            Config::default()
        }
    };

    // Command-line flags and environment take precedence over the file
    let config = config.with_overrides(&cli.overrides());

    let filter = if cli.debug {
        EnvFilter::new("debug")
    } else if cli.verbose {
        EnvFilter::new("info")
    } else {
        EnvFilter::try_new(&config.logging.level).unwrap_or_else(|_| EnvFilter::new("warn"))
    };

    // Logs go to stderr so JSON output on stdout stays parseable
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();

    let formatter = OutputFormatter::new(
        config.output.format.parse().unwrap_or_default(),
        config.output.verbose,
    );

    match cli.execute_with_config(config).await {
        Ok(code) => code.to_exit_code(),
        Err(e) => {
            let code = ExitCode::from_error(&e);
            tracing::debug!(
                exit_code = code.name(),
                meaning = code.description(),
                error = ?e,
                "command failed"
            );
            if !formatter.is_quiet() {
                let rendered = formatter.format_error_with_code(&format!("{e:#}"), code);
                match formatter.format() {
                    OutputFormat::Json => println!("{rendered}"),
                    _ => eprintln!("{rendered}"),
                }
            }
            code.to_exit_code()
        }
    }
}
