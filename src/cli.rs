use clap::Parser;

#[derive(Parser)]
#[command(name = "vedge")]
#[command(version)]
#[command(about = "Lifecycle agent for a network-virtualization fabric edge node", long_about = None)]
pub struct Cli {
    /// Lifecycle event delivered by the bus (install, config-changed,
    /// director-relation-joined, plugin-relation-joined, stop)
    pub event: String,

    /// Verbosity level
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Suppress non-essential output
    #[arg(short, long)]
    pub quiet: bool,
}
