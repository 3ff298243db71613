mod api;
mod app;
mod error;
mod events;
mod filter;
mod listing;
mod logging;
mod model;
mod scheduler;
mod selection;
mod state;
mod ui;

use anyhow::Result;
use clap::{Parser, Subcommand};
use crossterm::{
    event::{DisableMouseCapture, EnableMouseCapture},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};
use std::io;
use std::path::PathBuf;

use api::{FeedClient, USGS_ALL_DAY_URL};
use app::App;
use filter::{SortKey, ViewFilter};
use logging::LogTarget;

#[derive(Parser, Debug)]
#[command(name = "quakewatch")]
#[command(about = "Terminal map and list of the past day's earthquakes from the USGS feed", long_about = None)]
struct Args {
    /// GeoJSON feed URL
    #[arg(long, default_value = USGS_ALL_DAY_URL, global = true)]
    feed_url: String,

    /// Request timeout in seconds
    #[arg(long, default_value = "10", global = true)]
    timeout: u64,

    /// Log file for dashboard mode (defaults to quakewatch.log in the temp dir)
    #[arg(long, global = true)]
    log_file: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Launch the interactive map and list dashboard
    #[command(name = "dashboard", alias = "tui")]
    Dashboard,

    /// Fetch the feed once and print the list
    #[command(name = "list")]
    List {
        /// Hide events below this magnitude (0-8, snapped to 0.5)
        #[arg(short, long, default_value = "0")]
        min_magnitude: f64,

        /// Sort order
        #[arg(short, long, value_enum, default_value_t = SortKey::Time)]
        sort: SortKey,

        /// Number of events to print
        #[arg(short, long, default_value = "20")]
        limit: usize,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let feed = FeedClient::new(args.feed_url.clone(), args.timeout)?;

    match args.command {
        Some(Commands::List {
            min_magnitude,
            sort,
            limit,
        }) => {
            logging::init(args.verbose, &LogTarget::Stderr)?;
            let filter = ViewFilter::default()
                .with_min_magnitude(min_magnitude)
                .with_sort_key(sort);
            listing::print_list(&feed, filter, limit).await?;
        }

        // Dashboard/TUI mode (default)
        Some(Commands::Dashboard) | None => {
            let log_file = args.log_file.unwrap_or_else(logging::default_log_file);
            logging::init(args.verbose, &LogTarget::File(log_file))?;
            tracing::info!(feed_url = feed.feed_url(), "starting dashboard");
            run_tui(feed).await?;
        }
    }

    Ok(())
}

async fn run_tui(feed: FeedClient) -> Result<()> {
    // Initialize terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let mut app = App::new(feed);
    let res = app.run(&mut terminal).await;

    // Restore terminal
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen, DisableMouseCapture)?;
    terminal.show_cursor()?;

    if let Err(err) = res {
        tracing::error!(error = ?err, "dashboard exited with error");
        eprintln!("Error: {:?}", err);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_valid() {
        Args::command().debug_assert();
    }

    #[test]
    fn dashboard_is_the_default() {
        let args = Args::try_parse_from(["quakewatch"]).unwrap();
        assert!(args.command.is_none());
        assert_eq!(args.feed_url, USGS_ALL_DAY_URL);
        assert_eq!(args.timeout, 10);

        let args = Args::try_parse_from(["quakewatch", "tui"]).unwrap();
        assert!(matches!(args.command, Some(Commands::Dashboard)));
    }

    #[test]
    fn list_takes_filter_options() {
        let args = Args::try_parse_from([
            "quakewatch",
            "list",
            "--min-magnitude",
            "4.5",
            "--sort",
            "magnitude",
            "--limit",
            "5",
            "--feed-url",
            "http://localhost:9000/feed.geojson",
        ])
        .unwrap();

        assert_eq!(args.feed_url, "http://localhost:9000/feed.geojson");
        match args.command {
            Some(Commands::List {
                min_magnitude,
                sort,
                limit,
            }) => {
                assert_eq!(min_magnitude, 4.5);
                assert_eq!(sort, SortKey::Magnitude);
                assert_eq!(limit, 5);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }
}
