use anyhow::Result;
use clap::Parser;
use ftpr::cli::Cli;
use ftpr::output;
use log::info;

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::init();

    output::print_banner();

    let cli = Cli::parse();
    info!("Starting ftpr - First-Time Pass Rate");
    cli.execute().await?;

    Ok(())
}
