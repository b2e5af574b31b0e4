//! Conduit - RealWorld backend binary.

use std::path::PathBuf;
use std::process::ExitCode;

use conduit_config::{ConduitConfig, ConfigError, ConfigLoader};

const ENV_PREFIX: &str = "CONDUIT";
const DEFAULT_CONFIG_FILE: &str = "conduit.toml";

/// Command-line arguments.
struct Args {
    /// Configuration file; a missing default file is not an error.
    config: Option<PathBuf>,
}

impl Args {
    fn parse() -> Result<Self, String> {
        let mut args = std::env::args().skip(1);
        let mut config = std::env::var_os("CONDUIT_CONFIG").map(PathBuf::from);

        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--config" | "-c" => {
                    config = Some(args.next().map(PathBuf::from).ok_or("--config needs a path")?);
                }
                "--help" | "-h" => {
                    print_help();
                    std::process::exit(0);
                }
                "--version" | "-v" => {
                    println!("conduit {}", conduit::VERSION);
                    std::process::exit(0);
                }
                other => return Err(format!("unknown argument: {other}")),
            }
        }

        Ok(Self { config })
    }
}

fn print_help() {
    println!(
        r"Conduit - RealWorld backend

USAGE:
    conduit [OPTIONS]

OPTIONS:
    -c, --config <PATH>    Configuration file (TOML or JSON, default: ./conduit.toml if present)
    -h, --help             Print help information
    -v, --version          Print version information

ENVIRONMENT VARIABLES:
    CONDUIT_CONFIG                          Configuration file, same as --config
    CONDUIT__SERVER__HTTP_ADDR              Listen address (default: 0.0.0.0:8000)
    CONDUIT__SERVER__REQUEST_TIMEOUT_MS     Per-request deadline, 0 disables (default: 0)
    CONDUIT__SERVER__MAX_BODY_BYTES         Request body cap, larger bodies get 413 (default: 1048576)
    CONDUIT__AUTH__JWT_SECRET               Token signing secret
    CONDUIT__AUTH__TOKEN_TTL_SECS           Token lifetime; unset issues tokens without expiry
    CONDUIT__TELEMETRY__LOGGING__LEVEL      Log filter (default: info)
    CONDUIT__TELEMETRY__METRICS__ENABLED    Serve Prometheus metrics (default: false)
"
    );
}

fn load_config(args: &Args) -> Result<ConduitConfig, ConfigError> {
    let loader = ConfigLoader::new().with_defaults();
    let loader = match &args.config {
        Some(path) => loader.with_file(path)?,
        None => loader.with_optional_file(DEFAULT_CONFIG_FILE)?,
    };
    loader.with_dotenv()?.with_env_prefix(ENV_PREFIX).load()
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = match Args::parse() {
        Ok(args) => args,
        Err(message) => {
            eprintln!("{message}");
            eprintln!("Use --help for usage information");
            return ExitCode::from(2);
        }
    };

    let config = match load_config(&args) {
        Ok(config) => config,
        Err(err) => {
            eprintln!("invalid configuration: {err}");
            return ExitCode::FAILURE;
        }
    };

    if let Err(err) = conduit_telemetry::init_telemetry(&config.telemetry.to_telemetry_config()) {
        eprintln!("failed to initialize telemetry: {err}");
        return ExitCode::FAILURE;
    }

    tracing::info!(version = conduit::VERSION, http.addr = %config.server.http_addr, "starting conduit");
    if config.auth.jwt_secret == conduit_config::AuthSettings::default().jwt_secret {
        tracing::warn!("using the built-in demo signing secret; set CONDUIT__AUTH__JWT_SECRET");
    }

    let server = match conduit::app::server(&config) {
        Ok(server) => server,
        Err(err) => {
            tracing::error!(error = %err, "failed to build service");
            return ExitCode::FAILURE;
        }
    };

    match server.run().await {
        Ok(()) => {
            tracing::info!("conduit stopped");
            ExitCode::SUCCESS
        }
        Err(err) => {
            tracing::error!(error = %err, "server error");
            ExitCode::FAILURE
        }
    }
}
