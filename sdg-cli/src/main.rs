//! SDG CLI - explore rainfall measurements on the Tunisian administrative map.

use clap::Parser;

#[derive(Parser)]
#[command(
    name = "sdg-cli",
    version,
    about = "Rainfall dashboard toolkit for Tunisian governorates and delegations"
)]
struct Cli {
    #[command(subcommand)]
    command: sdg_cmd::Command,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    env_logger::init();
    let cli = Cli::parse();
    sdg_cmd::run(cli.command).await
}
