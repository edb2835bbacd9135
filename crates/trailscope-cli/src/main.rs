//! Trailscope CLI - build trail databases and query their events.

use clap::{Parser, Subcommand};

mod commands;
mod error;
mod logging;
mod output;

use commands::{build, get, info, list};

#[derive(Parser)]
#[command(name = "trailscope")]
#[command(about = "Build and query trail databases")]
struct Cli {
    /// Log filter when RUST_LOG is unset (e.g. "debug", "trailscope_store=trace")
    #[arg(long, global = true, default_value = "warn")]
    log_level: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show store statistics
    Info {
        /// Path to trail database
        db: String,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// List events of every trail
    List {
        /// Path to trail database
        db: String,
        /// Filter conditions: inline JSON array or path to a JSON file
        #[arg(long)]
        filter: Option<String>,
        /// Key values by field name
        #[arg(long)]
        map: bool,
        /// Stop after printing N events (default: unlimited)
        #[arg(long)]
        max_events: Option<u64>,
        /// Output one JSON object per event
        #[arg(long)]
        json: bool,
    },
    /// Print the events of one trail
    Get {
        /// Path to trail database
        db: String,
        /// Trail UUID
        uuid: String,
    },
    /// Build a trail database from JSON lines
    Build {
        /// Output database path
        output: String,
        /// Comma-separated field names
        #[arg(long, value_delimiter = ',', required = true)]
        fields: Vec<String>,
        /// Input file, one {"uuid", "timestamp", "values"} object per line
        input: String,
    },
}

fn main() {
    let cli = Cli::parse();
    logging::init_subscriber(&cli.log_level);

    let result = match cli.command {
        Commands::Info { db, json } => info::run(db, json),
        Commands::List {
            db,
            filter,
            map,
            max_events,
            json,
        } => list::run(db, filter, map, max_events, json),
        Commands::Get { db, uuid } => get::run(db, uuid),
        Commands::Build {
            output,
            fields,
            input,
        } => build::run(output, fields, input),
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
