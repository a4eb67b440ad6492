//! docqueue CLI
//!
//! Command-line access to a document managed by docqueue.
//!
//! # Commands
//!
//! - `init` - Create the document file if it is missing
//! - `get` - Print the document, or one dotted key of a JSON document
//! - `set` - Set one dotted key of a JSON document in a transaction
//! - `put` - Replace the whole document

mod commands;

use clap::{Parser, Subcommand};
use commands::DocFormat;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// docqueue command-line document tools.
#[derive(Parser)]
#[command(name = "docqueue")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to the document file
    #[arg(global = true, short, long)]
    path: Option<PathBuf>,

    /// Document format (json, text, binary)
    #[arg(global = true, short, long, default_value = "json")]
    format: String,

    /// Enable verbose output
    #[arg(global = true, short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create the document file if it is missing
    Init,

    /// Print the document
    Get {
        /// Dotted path into a JSON document, e.g. `LoginDetails.Token`
        #[arg(short, long)]
        key: Option<String>,
    },

    /// Set one dotted key of a JSON document
    Set {
        /// Dotted path to set; missing objects along it are created
        key: String,

        /// New value as JSON; anything that does not parse is stored as a string
        value: String,
    },

    /// Replace the whole document
    Put {
        /// New document contents
        value: String,
    },

    /// Show version information
    Version,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Initialize logging; stdout is reserved for documents.
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        if cli.verbose {
            EnvFilter::new("debug")
        } else {
            EnvFilter::new("warn")
        }
    });
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let Cli {
        path,
        format,
        command,
        ..
    } = cli;

    match command {
        Commands::Init => {
            let path = path.ok_or("Document path required for init")?;
            commands::init::run(&path, format.parse::<DocFormat>()?)?;
        }
        Commands::Get { key } => {
            let path = path.ok_or("Document path required for get")?;
            commands::get::run(&path, format.parse::<DocFormat>()?, key.as_deref())?;
        }
        Commands::Set { key, value } => {
            let path = path.ok_or("Document path required for set")?;
            commands::set::run(&path, format.parse::<DocFormat>()?, &key, &value)?;
        }
        Commands::Put { value } => {
            let path = path.ok_or("Document path required for put")?;
            commands::put::run(&path, format.parse::<DocFormat>()?, &value)?;
        }
        Commands::Version => {
            println!("docqueue CLI v{}", env!("CARGO_PKG_VERSION"));
            println!("docqueue Core v{}", docqueue_core::VERSION);
        }
    }

    Ok(())
}
