mod app;
mod export;
mod state;

use crate::app::App;
use crate::state::app_settings::AppSettings;
use log::{debug, error, info};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    if handle_cli_args() {
        return Ok(());
    }

    better_panic::install();
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    info!("Welcome to Premier League Player Stats Scraper!");

    let settings = AppSettings::load();
    debug!("settings: {settings:?}");

    let app = App::new(settings.api(), settings.exporter());
    match app.run().await {
        Ok(summary) => {
            info!(
                "Exported {} players and {} nationalities",
                summary.players, summary.nationalities
            );
            Ok(())
        }
        Err(e) => {
            error!("Stage {} failed: {e}", e.stage());
            Err(e.into())
        }
    }
}

fn handle_cli_args() -> bool {
    let mut args = std::env::args().skip(1);
    let Some(arg) = args.next() else {
        return false;
    };

    match arg.as_str() {
        "-h" | "--help" => {
            println!("{}", usage_text());
            true
        }
        "-V" | "--version" => {
            println!("premier-stats {}", env!("CARGO_PKG_VERSION"));
            true
        }
        _ => {
            eprintln!("Unknown argument: {arg}\n\n{}", usage_text());
            std::process::exit(2);
        }
    }
}

fn usage_text() -> &'static str {
    "premier-stats - Premier League all-time goal rankings export

Usage:
  premier-stats
  premier-stats --help
  premier-stats --version

Environment:
  PREMIER_STATS_BASE_URL          API origin (default https://footballapi.pulselive.com)
  PREMIER_STATS_PAGE_SIZE         Records per page (default 500)
  PREMIER_STATS_OUTPUT_DIR        Report directory (default .)
  PREMIER_STATS_FORMAT            csv, json or xlsx (default csv)
  PREMIER_STATS_CONCURRENT_PAGES  Fetch pages after the first concurrently (default false)
  RUST_LOG                        Log filter (default info)"
}
