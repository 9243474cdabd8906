use clap::Parser;
use eyre::Result;

use eclink::cli::Cli;

fn main() -> Result<()> {
    let cli = Cli::parse();

    eclink::cli::init(cli.verbose)?;
    eclink::cli::run(cli)
}
