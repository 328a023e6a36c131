#![deny(warnings)]

use std::io::Write;

use clap::Parser;
use color_eyre::eyre::Result;

use jobscroll::{
    infrastructure::{cli::Cli, config::Config},
    integration::app_runner::AppRunner,
    utils::{initialize_logging, initialize_panic_handler},
};

async fn tokio_main() -> Result<()> {
    initialize_logging()?;

    initialize_panic_handler()?;

    let args = <Cli as Parser>::parse();

    // Load configuration (file-based)
    let config = Config::new()?;

    let mut runner = AppRunner::from_cli(&args, config)?;
    let mut stdout = std::io::stdout().lock();
    runner.run(&args.command, &mut stdout).await?;
    stdout.flush()?;

    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    if let Err(e) = tokio_main().await {
        eprintln!("{} error: Something went wrong", env!("CARGO_PKG_NAME"));
        Err(e)
    } else {
        Ok(())
    }
}
