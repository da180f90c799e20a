mod analyze;
mod client;
mod config;
mod serve;

use std::path::PathBuf;
use std::process;

use clap::{Parser, Subcommand, ValueEnum};
use tracing_subscriber::EnvFilter;

/// Output format for CLI responses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub(crate) enum OutputFormat {
    Text,
    Json,
}

/// Log filter for `serve` when `RUST_LOG` is unset.
const SERVE_LOG_FILTER: &str = "nerlens=info,nerlens_core=info,tower_http=info";

/// Log filter for `analyze` when `RUST_LOG` is unset.
const CLIENT_LOG_FILTER: &str = "warn";

/// Named-entity recognition relay and viewer.
#[derive(Parser)]
#[command(
    name = "nerlens",
    version,
    about = "Named-entity recognition relay and viewer"
)]
struct Cli {
    /// Output format (text or json)
    #[arg(long, global = true, default_value = "text", value_enum)]
    output: OutputFormat,

    /// Suppress non-essential output
    #[arg(long, global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the web front end and the /api/analyze relay
    Serve {
        /// Port to listen on
        #[arg(long, default_value_t = config::DEFAULT_PORT)]
        port: u16,
        /// Backend base URL (overrides BACKEND_URL)
        #[arg(long)]
        backend_url: Option<String>,
        /// JSON file with light/dark color overrides
        #[arg(long)]
        theme: Option<PathBuf>,
        /// Replace backend error bodies with a generic message
        #[arg(long)]
        redact_backend_errors: bool,
        /// Path to TLS certificate PEM file (requires --tls-key)
        #[arg(long)]
        tls_cert: Option<PathBuf>,
        /// Path to TLS private key PEM file (requires --tls-cert)
        #[arg(long)]
        tls_key: Option<PathBuf>,
    },

    /// Analyze a text file through a running relay and print the entities
    Analyze {
        /// Path to the .txt file
        file: PathBuf,
        /// Base URL of the relay (default: NERLENS_RELAY_URL or http://localhost:3000)
        #[arg(long)]
        relay_url: Option<String>,
        /// Content type to send instead of the one guessed from the extension
        #[arg(long)]
        content_type: Option<String>,
    },
}

fn main() {
    let cli = Cli::parse();

    // A missing .env is fine; the environment may already be set.
    let dotenv = dotenvy::dotenv();

    match cli.command {
        Commands::Serve {
            port,
            backend_url,
            theme,
            redact_backend_errors,
            tls_cert,
            tls_key,
        } => {
            init_tracing(SERVE_LOG_FILTER);
            if let Ok(path) = &dotenv {
                tracing::info!("loaded environment from {}", path.display());
            }

            // Validate TLS flags: both must be provided or neither
            if tls_cert.is_some() != tls_key.is_some() {
                report_error(
                    "error: --tls-cert and --tls-key must both be provided",
                    cli.output,
                    cli.quiet,
                );
                process::exit(1);
            }
            #[cfg(not(feature = "tls"))]
            if tls_cert.is_some() {
                report_error(
                    "error: --tls-cert/--tls-key require a build with the `tls` feature",
                    cli.output,
                    cli.quiet,
                );
                process::exit(1);
            }

            let args = config::ServeArgs {
                port,
                backend_url,
                theme,
                redact_backend_errors,
                tls_cert,
                tls_key,
            };
            let config = match config::ServeConfig::resolve(args) {
                Ok(c) => c,
                Err(e) => {
                    report_error(&e, cli.output, cli.quiet);
                    process::exit(1);
                }
            };

            let rt = match tokio::runtime::Runtime::new() {
                Ok(rt) => rt,
                Err(e) => {
                    report_error(
                        &format!("failed to create tokio runtime: {}", e),
                        cli.output,
                        cli.quiet,
                    );
                    process::exit(1);
                }
            };
            if let Err(e) = rt.block_on(serve::start_server(config)) {
                report_error(&format!("Server error: {}", e), cli.output, cli.quiet);
                process::exit(1);
            }
        }
        Commands::Analyze {
            file,
            relay_url,
            content_type,
        } => {
            init_tracing(CLIENT_LOG_FILTER);
            let relay_url = config::resolve_relay_url(
                relay_url,
                std::env::var(config::RELAY_URL_ENV).ok(),
            );
            analyze::cmd_analyze(analyze::AnalyzeOptions {
                file: &file,
                relay_url: &relay_url,
                content_type: content_type.as_deref(),
                output: cli.output,
                quiet: cli.quiet,
            });
        }
    }
}

/// Install the stderr log subscriber. `RUST_LOG` wins over `default_filter`.
fn init_tracing(default_filter: &str) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

pub(crate) fn report_error(msg: &str, output: OutputFormat, quiet: bool) {
    if quiet {
        return;
    }
    match output {
        OutputFormat::Text => eprintln!("{}", msg),
        OutputFormat::Json => eprintln!("{}", serde_json::json!({ "error": msg })),
    }
}
