mod cli;
mod runner;

use clap::Parser;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    runner::run_from_cli(cli::Cli::parse()).await
}
