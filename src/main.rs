// Entrypoint for the importer.
// - Keeps `main` small: parse flags, set up logging, build the client and
//   hand it to `app::run`.
// - Fatal errors map to distinct exit codes (see `RunError::exit_code`).

use std::process::ExitCode;
use std::time::Duration;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use koi_import::api::KoiClient;
use koi_import::app::{self, Credentials, Outcome, Task};
use koi_import::cli::Cli;
use koi_import::error::RunError;
use koi_import::ui;

fn main() -> ExitCode {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match try_main(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("Error: {err:#}");
            let code = err.downcast_ref::<RunError>().map_or(1, RunError::exit_code);
            ExitCode::from(code)
        }
    }
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "koi_import=debug,info" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn try_main(cli: Cli) -> anyhow::Result<()> {
    let task = cli.task();
    if task == Task::DeleteAll && !cli.yes && !ui::confirm_delete(&cli.url)? {
        println!("Nothing deleted");
        return Ok(());
    }

    let password = match &cli.password {
        Some(p) => p.clone(),
        None => ui::prompt_password(&cli.user)?,
    };
    let credentials = Credentials {
        username: cli.user.clone(),
        password,
    };

    let mut api = KoiClient::new(&cli.url, Duration::from_secs(cli.timeout))?;
    let progress = match task {
        Task::DeleteAll => ui::spinner("Deleting all data..."),
        Task::ListItems => ui::spinner("Listing items..."),
        Task::Import { .. } => ui::item_progress(),
    };
    let outcome = app::run(&mut api, &credentials, &task, &progress);
    progress.finish_and_clear();

    match outcome? {
        Outcome::Deleted => println!("All data deleted successfully"),
        Outcome::Listed(items) => ui::print_items(&items),
        Outcome::Imported(summary) => {
            ui::print_summary(&summary);
            summary.check()?;
        }
    }
    Ok(())
}
