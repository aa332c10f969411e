use std::path::PathBuf;

use clap::{Parser, Subcommand};

mod commands;

/// Environment variable naming the blob store account endpoint.
const STORAGE_ACCOUNT_URL_VAR: &str = "TALLY_STORAGE_ACCOUNT_URL";
/// Optional pre-signed token appended to download URLs.
const STORAGE_SAS_TOKEN_VAR: &str = "TALLY_STORAGE_SAS_TOKEN";

#[derive(Parser)]
#[command(name = "tally", version, about = "Categorise bank statement exports")]
struct Cli {
    /// Category rules file (defaults to categories.json in the user data dir).
    #[arg(long, global = true, value_name = "PATH")]
    rules: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Categorise an export and print per-category totals.
    Report {
        /// Local CSV export. Omit to download from the configured blob store.
        file: Option<PathBuf>,

        /// Blob container holding the export.
        #[arg(long, default_value = "bankstatements")]
        container: String,

        /// Export object name within the container.
        #[arg(long, default_value = "Data_export.csv")]
        blob: String,
    },

    /// Manage spending categories.
    Categories {
        #[command(subcommand)]
        action: CategoriesAction,
    },

    /// Record a manual correction as a keyword rule.
    Learn {
        /// Category the transaction belongs to (must already exist).
        category: String,
        /// The transaction narrative to learn.
        narrative: String,
    },
}

#[derive(Subcommand)]
enum CategoriesAction {
    /// Create a new empty category.
    Add { name: String },
    /// List categories and their keyword rules.
    List,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();
    let rules_path = match cli.rules {
        Some(path) => path,
        None => commands::default_rules_path()?,
    };

    match cli.command {
        Command::Report {
            file,
            container,
            blob,
        } => commands::report(&rules_path, file, &container, &blob).await,
        Command::Categories { action } => match action {
            CategoriesAction::Add { name } => commands::add_category(&rules_path, &name),
            CategoriesAction::List => commands::list_categories(&rules_path),
        },
        Command::Learn {
            category,
            narrative,
        } => commands::learn(&rules_path, &category, &narrative),
    }
}
