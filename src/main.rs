use anyhow::Result;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use qt_pairs::cli::Cli;

fn main() -> Result<()> {
    let filter = EnvFilter::builder()
        .with_default_directive("qt_pairs=info".parse()?)
        .from_env_lossy();
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let cli = Cli::parse();
    cli.run()
}
