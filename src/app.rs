// One run of the importer: log in, then delete everything, list items, or
// import the items directory into a collection.

use std::path::{Path, PathBuf};

use indicatif::ProgressBar;
use tracing::{debug, info, warn};

use crate::api::{all_pages, KoiApi};
use crate::cli::FailurePolicy;
use crate::collection::find_or_create_collection;
use crate::error::{ImportError, RunError};
use crate::importer::{import_item, ImportedItem};
use crate::models::{Collection, Item};
use crate::record::load_records;

pub struct Credentials {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Task {
    DeleteAll,
    ListItems,
    Import {
        collection: String,
        items_dir: Option<PathBuf>,
        policy: FailurePolicy,
    },
}

#[derive(Debug)]
pub enum Outcome {
    Deleted,
    Listed(Vec<Item>),
    Imported(Summary),
}

#[derive(Debug)]
pub enum ItemStatus {
    Imported(ImportedItem),
    /// The record asked to be skipped.
    Skipped,
    Failed(ImportError),
}

#[derive(Debug)]
pub struct ItemResult {
    pub id: String,
    pub name: String,
    pub status: ItemStatus,
}

/// Per-item results of an import run.
#[derive(Debug)]
pub struct Summary {
    pub collection: Collection,
    /// Records loaded from disk, including ones never attempted after a halt.
    pub total: usize,
    pub results: Vec<ItemResult>,
}

impl Summary {
    pub fn imported(&self) -> usize {
        self.count(|s| matches!(s, ItemStatus::Imported(_)))
    }

    pub fn skipped(&self) -> usize {
        self.count(|s| matches!(s, ItemStatus::Skipped))
    }

    pub fn failed(&self) -> usize {
        self.count(|s| matches!(s, ItemStatus::Failed(_)))
    }

    /// Records left untouched because the run halted early.
    pub fn not_attempted(&self) -> usize {
        self.total - self.results.len()
    }

    fn count(&self, pred: impl Fn(&ItemStatus) -> bool) -> usize {
        self.results.iter().filter(|r| pred(&r.status)).count()
    }

    /// `Err` when any item failed.
    pub fn check(&self) -> Result<(), RunError> {
        match self.failed() {
            0 => Ok(()),
            failed => Err(RunError::ItemsFailed {
                failed,
                total: self.total,
            }),
        }
    }
}

/// Authenticate, then carry out `task`.
pub fn run<A: KoiApi>(
    api: &mut A,
    credentials: &Credentials,
    task: &Task,
    progress: &ProgressBar,
) -> Result<Outcome, RunError> {
    let token = api
        .authenticate(&credentials.username, &credentials.password)
        .map_err(RunError::Auth)?;
    debug!("logged in as {}, token of {} bytes", credentials.username, token.len());

    match task {
        Task::DeleteAll => {
            api.delete_all_data().map_err(RunError::Delete)?;
            info!("All data deleted successfully");
            Ok(Outcome::Deleted)
        }
        Task::ListItems => {
            let items = all_pages(|page| api.list_items(page)).map_err(RunError::List)?;
            Ok(Outcome::Listed(items))
        }
        Task::Import {
            collection,
            items_dir,
            policy,
        } => import_all(&*api, collection, items_dir.as_deref(), *policy, progress)
            .map(Outcome::Imported),
    }
}

fn import_all<A: KoiApi + ?Sized>(
    api: &A,
    collection_name: &str,
    items_dir: Option<&Path>,
    policy: FailurePolicy,
    progress: &ProgressBar,
) -> Result<Summary, RunError> {
    let collection =
        find_or_create_collection(api, collection_name).map_err(|source| RunError::Collection {
            name: collection_name.to_owned(),
            source,
        })?;
    info!("Using collection: {} (ID: {})", collection.title, collection.id);

    let Some(dir) = items_dir else {
        info!("No items directory provided, skipping item processing");
        return Ok(Summary {
            collection,
            total: 0,
            results: Vec::new(),
        });
    };

    let records = load_records(dir).map_err(|source| RunError::Load {
        dir: dir.to_path_buf(),
        source,
    })?;
    info!("Total items decoded from {}: {}", dir.display(), records.len());

    progress.set_length(records.len() as u64);
    let mut results = Vec::with_capacity(records.len());
    for record in &records {
        let id = record.display_id().to_owned();
        progress.set_message(id.clone());

        let status = if record.skip {
            info!("Skipping item {id}: marked skip in its record");
            ItemStatus::Skipped
        } else {
            match import_item(api, &collection, record) {
                Ok(imported) => {
                    info!("Successfully processed item {id} with ID {}", imported.item.id);
                    ItemStatus::Imported(imported)
                }
                Err(e) => {
                    match e.orphan() {
                        Some(orphan) => warn!(
                            "Error processing item {id}: {e} (partial item {orphan} left on server)"
                        ),
                        None => warn!("Error processing item {id}: {e}"),
                    }
                    ItemStatus::Failed(e)
                }
            }
        };
        progress.inc(1);

        let failed = matches!(status, ItemStatus::Failed(_));
        results.push(ItemResult {
            id,
            name: record.name.clone(),
            status,
        });
        if failed && policy == FailurePolicy::Halt {
            warn!("Stopping after first failed item");
            break;
        }
    }

    Ok(Summary {
        collection,
        total: records.len(),
        results,
    })
}
