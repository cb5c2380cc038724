// Command-line flags. Every connection setting can also come from the
// environment (or a `.env` file loaded before parsing).

use std::path::PathBuf;

use clap::{Parser, ValueEnum};

use crate::app::Task;
use crate::collection::title_case;

#[derive(Debug, Parser)]
#[command(name = "koi-import", version)]
#[command(about = "Import scraped item directories into a Koillection server", long_about = None)]
pub struct Cli {
    /// Base URL of the server
    #[arg(long, env = "KOI_URL", default_value = "http://localhost")]
    pub url: String,

    /// Account to log in with
    #[arg(short, long, env = "KOI_USER")]
    pub user: String,

    /// Password; prompted for when not given
    #[arg(short, long, env = "KOI_PASSWORD", hide_env_values = true)]
    pub password: Option<String>,

    /// Directory holding one subdirectory per item
    #[arg(short, long)]
    pub items_dir: Option<PathBuf>,

    /// Collection to put items in (matched case-insensitively)
    #[arg(short, long, default_value = "Maps")]
    pub collection: String,

    /// Delete all data from the server instead of importing
    #[arg(long, conflicts_with_all = ["items_dir", "list"])]
    pub delete: bool,

    /// Do not ask before deleting
    #[arg(short, long, requires = "delete")]
    pub yes: bool,

    /// List every item on the server instead of importing
    #[arg(long)]
    pub list: bool,

    /// What to do when an item fails to import
    #[arg(long, value_enum, default_value_t = FailurePolicy::Continue)]
    pub on_error: FailurePolicy,

    /// Request timeout in seconds
    #[arg(long, default_value_t = 30)]
    pub timeout: u64,

    /// Debug logging
    #[arg(short, long)]
    pub verbose: bool,
}

/// Whether a failed item stops the batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum FailurePolicy {
    /// Log the failure and move on to the next item
    #[default]
    Continue,
    /// Stop after the first failed item
    Halt,
}

impl Cli {
    pub fn task(&self) -> Task {
        if self.delete {
            Task::DeleteAll
        } else if self.list {
            Task::ListItems
        } else {
            Task::Import {
                collection: title_case(&self.collection),
                items_dir: self.items_dir.clone(),
                policy: self.on_error,
            }
        }
    }
}
