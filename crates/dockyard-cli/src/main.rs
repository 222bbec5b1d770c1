mod cmd;
mod output;

use clap::{Parser, Subcommand};
use cmd::{entry::EntrySubcommand, orders::OrdersSubcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "dockyard",
    about = "Freight yard gate and dispatch engine — vehicle journeys, docks, load plans",
    version,
    propagate_version = true
)]
struct Cli {
    /// Path to the yard store file
    #[arg(long, global = true, env = "DOCKYARD_STORE", default_value = "dockyard.json")]
    store: PathBuf,

    /// Output as JSON
    #[arg(long, global = true, short = 'j')]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Manage vehicle entries through the gate-to-gate journey
    Entry {
        #[command(subcommand)]
        subcommand: EntrySubcommand,
    },

    /// Split, club, and check dispatch orders
    Orders {
        #[command(subcommand)]
        subcommand: OrdersSubcommand,
    },

    /// Show dock occupancy derived from the current entries
    Docks,

    /// List the vehicle type catalog
    Types,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let default_level = match &cli.command {
        Commands::Entry {
            subcommand: EntrySubcommand::Watch,
        } => tracing::Level::INFO,
        _ => tracing::Level::WARN,
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env().add_directive(default_level.into()),
        )
        .with_target(false)
        .init();

    let result = match cli.command {
        Commands::Entry { subcommand } => cmd::entry::run(&cli.store, subcommand, cli.json).await,
        Commands::Orders { subcommand } => cmd::orders::run(subcommand, cli.json),
        Commands::Docks => cmd::docks::run(&cli.store, cli.json),
        Commands::Types => cmd::docks::run_types(cli.json),
    };

    if let Err(e) = result {
        // Print the full error chain (anyhow's alternate Display)
        eprintln!("error: {e:#}");
        std::process::exit(1);
    }
}
