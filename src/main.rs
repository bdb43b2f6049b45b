mod commands;
mod render;
mod utils;

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use tripcal_core::config::TripCalConfig;
use tripcal_core::travel::TravelMode;

use crate::commands::EventFields;

#[derive(Parser)]
#[command(name = "tripcal")]
#[command(about = "View and edit a trip itinerary, shared through a realtime database or kept locally")]
struct Cli {
    /// More log output (-v info, -vv debug). RUST_LOG takes precedence.
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List all events in start order
    List,
    /// Show one event with directions to the next stop
    Show {
        id: String,

        /// Open directions to the next stop in the browser (driving, walking, transit)
        #[arg(long)]
        open: Option<TravelMode>,
    },
    /// Add an event (prompts for anything missing)
    Add {
        #[command(flatten)]
        fields: EventFields,
    },
    /// Change fields of an event (prompts for every field if none are given)
    Edit {
        id: String,

        #[command(flatten)]
        fields: EventFields,
    },
    /// Delete an event after confirmation
    Delete {
        id: String,

        /// Skip the confirmation prompt
        #[arg(short, long)]
        yes: bool,
    },
    /// Replace the whole itinerary with an exported file
    Import {
        file: PathBuf,

        /// Skip the confirmation prompt
        #[arg(short, long)]
        yes: bool,
    },
    /// Write the itinerary as JSON (to calendar-events-<date>.json by default)
    Export {
        /// Output file, or "-" for stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Replace the shared itinerary with the bundled defaults
    Reset {
        /// Skip the confirmation prompt
        #[arg(short, long)]
        yes: bool,
    },
    /// Stay connected and print every change to the itinerary
    Watch,
    /// Show where the itinerary is stored
    Status,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let config = TripCalConfig::load()?;

    match cli.command {
        Commands::List => commands::list::run(&config).await,
        Commands::Show { id, open } => commands::show::run(&config, &id, open).await,
        Commands::Add { fields } => commands::add::run(&config, fields).await,
        Commands::Edit { id, fields } => commands::edit::run(&config, &id, fields).await,
        Commands::Delete { id, yes } => commands::delete::run(&config, &id, yes).await,
        Commands::Import { file, yes } => commands::import::run(&config, &file, yes).await,
        Commands::Export { output } => commands::export::run(&config, output).await,
        Commands::Reset { yes } => commands::reset::run(&config, yes).await,
        Commands::Watch => commands::watch::run(&config).await,
        Commands::Status => commands::status::run(&config).await,
    }
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level)),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}
