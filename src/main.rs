mod bus;
mod cli;
mod hooks;
mod node;
mod paths;
mod render;
mod restart;
mod runner;
mod system;
mod ui;

use anyhow::Result;
use clap::Parser;
use cli::Cli;
use hooks::Event;

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging based on verbosity
    let log_level = match cli.verbose {
        0 => log::LevelFilter::Warn,
        1 => log::LevelFilter::Info,
        2 => log::LevelFilter::Debug,
        _ => log::LevelFilter::Trace,
    };

    env_logger::Builder::new()
        .filter_level(if cli.quiet {
            log::LevelFilter::Error
        } else {
            log_level
        })
        .format_timestamp(None)
        .init();

    hooks::dispatch(Event::from_name(&cli.event))
}
