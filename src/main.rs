use oak::cli::output::Output;
use oak::cli::{commands, Cli};
use oak::utils::config::{LogFormat, LoggingConfig};
use oak::{AppState, OakConfig};
use std::process::ExitCode;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

fn init_tracing(logging: &LoggingConfig) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&logging.level));

    let registry = tracing_subscriber::registry().with(filter);
    match logging.format {
        LogFormat::Json => registry
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .init(),
        LogFormat::Pretty => registry
            .with(fmt::layer().with_target(false).with_writer(std::io::stderr))
            .init(),
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse_args();
    let output = if cli.no_color {
        Output::no_color()
    } else {
        Output::new()
    };

    // Startup: any failure here is fatal.
    let mut config = match OakConfig::load(cli.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            output.error(&e.to_string());
            return ExitCode::FAILURE;
        }
    };
    cli.apply_overrides(&mut config);
    init_tracing(&config.logging);

    if let Err(e) = config.validate() {
        output.error(&e.to_string());
        return ExitCode::FAILURE;
    }

    let state = match AppState::build(config, cli.no_cache) {
        Ok(state) => state,
        Err(e) => {
            output.error(&format!("Startup failed: {}", e));
            return ExitCode::FAILURE;
        }
    };

    match commands::dispatch(cli.command, &state, &output).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            output.error(&e.to_string());
            ExitCode::FAILURE
        }
    }
}
