// Library root
// -----------
// Imports scraped item directories into a Koillection-style collection
// service. The binary (`main.rs`) wires these modules together.
//
// Module responsibilities:
// - `api` / `models`: HTTP client and resource shapes for the service.
// - `record`: reads item records and marker files from disk.
// - `datum`: which datum each record field becomes.
// - `collection`: finds or creates the target collection.
// - `importer`: publishes one record as an item with its data.
// - `app`: a whole run, including the failure policy.
// - `cli` / `ui`: flags, prompts, progress and reports.
pub mod api;
pub mod app;
pub mod cli;
pub mod collection;
pub mod datum;
pub mod error;
pub mod importer;
pub mod models;
pub mod record;
pub mod ui;

#[cfg(test)]
mod testing;
