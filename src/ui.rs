// UI layer: prompts via `dialoguer`, progress via `indicatif`, and the
// plain-text reports printed at the end of a run.

use std::time::Duration;

use anyhow::Result;
use dialoguer::{Confirm, Password};
use indicatif::{ProgressBar, ProgressStyle};

use crate::app::{ItemStatus, Summary};
use crate::models::Item;

/// Ask for the password without echoing it.
pub fn prompt_password(user: &str) -> Result<String> {
    let password = Password::new()
        .with_prompt(format!("Password for {user}"))
        .interact()?;
    Ok(password)
}

/// Last chance before wiping the server.
pub fn confirm_delete(url: &str) -> Result<bool> {
    let confirmed = Confirm::new()
        .with_prompt(format!("Delete ALL collections and templates on {url}?"))
        .default(false)
        .interact()?;
    Ok(confirmed)
}

/// Spinner shown while a single long call is in flight.
pub fn spinner(msg: &'static str) -> ProgressBar {
    let spinner = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::with_template("{spinner} {msg}") {
        spinner.set_style(style);
    }
    spinner.set_message(msg);
    spinner.enable_steady_tick(Duration::from_millis(100));
    spinner
}

/// Bar advanced once per item; its length is set once records are loaded.
pub fn item_progress() -> ProgressBar {
    let bar = ProgressBar::new(0);
    if let Ok(style) = ProgressStyle::with_template("{bar:30} {pos}/{len} {msg}") {
        bar.set_style(style);
    }
    bar
}

pub fn print_summary(summary: &Summary) {
    println!(
        "Using collection: {} (ID: {})",
        summary.collection.title, summary.collection.id
    );
    for result in &summary.results {
        match &result.status {
            ItemStatus::Imported(imported) => println!(
                "  ok      {:<16} {} ({} data, ID {})",
                result.id, result.name, imported.datums, imported.item.id
            ),
            ItemStatus::Skipped => println!("  skipped {:<16} {}", result.id, result.name),
            ItemStatus::Failed(e) => {
                println!("  FAILED  {:<16} {}: {e}", result.id, result.name);
                if let Some(orphan) = e.orphan() {
                    println!("          partial item {orphan} left on server");
                }
            }
        }
    }
    println!(
        "\n{} imported, {} skipped, {} failed, {} not attempted",
        summary.imported(),
        summary.skipped(),
        summary.failed(),
        summary.not_attempted()
    );
}

pub fn print_items(items: &[Item]) {
    println!("{:<5} {:<40} {:<36}", "", "Name", "ID");
    println!("{}", "-".repeat(82));
    for (i, item) in items.iter().enumerate() {
        println!("[{:>3}] {}", i + 1, item.summary());
    }
    let suffix = if items.len() == 1 { "" } else { "s" };
    println!("\n{} item{suffix}\n", items.len());
}
