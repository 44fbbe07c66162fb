pub mod commands;
pub mod plugins;
pub mod services;

pub use commands::{Cli, Commands};

/// Install the process-wide subscriber. `RUST_LOG` wins over the default
/// filter; `log` records from the library are bridged in.
pub fn init_logging() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn,legal_assistant_lib=info"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();
}

pub async fn run(cli: Cli) -> anyhow::Result<()> {
    commands::dispatch(cli).await
}
