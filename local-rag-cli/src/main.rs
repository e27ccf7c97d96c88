use clap::Parser;
use local_rag_cli::{Cli, commands, logging};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    logging::init(cli.verbose);

    commands::run(&cli.settings, cli.command).await
}
