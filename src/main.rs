use clap::Parser;

use legal_assistant_lib::{Cli, init_logging, run};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_logging();
    let cli = Cli::parse();
    run(cli).await
}
