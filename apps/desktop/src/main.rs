use std::{sync::Arc, time::Duration};

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use client_core::{
    MovieViewModel, RequestOutcome, SearchCoordinator, TmdbClient, NO_RESULTS_MESSAGE,
};
use shared::domain::TimeWindow;
use tracing::info;
use tracing_subscriber::EnvFilter;

mod config;
mod interactive;
mod render;

use config::{load_settings, Settings};
use interactive::Screen;
use render::GRID_COLUMNS;

#[derive(Parser, Debug)]
#[command(name = "movies", about = "Browse trending movies and search the movie database")]
struct Args {
    #[arg(long)]
    api_key: Option<String>,
    #[arg(long)]
    base_url: Option<String>,
    #[arg(long)]
    image_base_url: Option<String>,
    /// Trending window: day or week.
    #[arg(long)]
    window: Option<TimeWindow>,
    #[arg(long)]
    debounce_ms: Option<u64>,
    /// Log filter used when RUST_LOG is unset.
    #[arg(long, default_value = "info")]
    log_level: String,
    /// Print results as JSON instead of a grid.
    #[arg(long)]
    json: bool,
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List trending movies.
    Trending,
    /// Search movies by title.
    Search {
        #[arg(required = true)]
        query: Vec<String>,
    },
    /// Show one result in detail.
    Detail {
        index: usize,
        /// Pick from these search results instead of trending.
        #[arg(long)]
        query: Option<String>,
    },
    /// Type-as-you-search session (default).
    Interactive,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&args.log_level))
        .context("invalid log filter")?;
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let settings = apply_args(load_settings()?, &args);
    let client = TmdbClient::new(settings.tmdb_config()?).context("failed to build API client")?;
    let view_model = MovieViewModel::new(Arc::new(client), settings.time_window);
    info!(
        base_url = %settings.base_url,
        time_window = %settings.time_window,
        "movie client ready"
    );

    match args.command.unwrap_or(Command::Interactive) {
        Command::Trending => {
            let outcome = view_model.fetch_trending().await;
            print_results(&view_model, outcome, &settings, args.json).await
        }
        Command::Search { query } => {
            let outcome = view_model.search_movies(&query.join(" ")).await;
            print_results(&view_model, outcome, &settings, args.json).await
        }
        Command::Detail { index, query } => {
            let outcome = match query.as_deref().map(str::trim) {
                Some(query) if !query.is_empty() => view_model.search_movies(query).await,
                _ => view_model.fetch_trending().await,
            };
            ensure_applied(&view_model, outcome).await?;
            let Some(movie) = view_model.movie_at(index).await else {
                bail!("no result #{index}");
            };
            if args.json {
                println!("{}", serde_json::to_string_pretty(&movie)?);
            } else {
                print!("{}", render::render_detail(&movie, &settings.image_base_url));
            }
            Ok(())
        }
        Command::Interactive => {
            let coordinator =
                SearchCoordinator::with_delay(view_model.clone(), settings.search_debounce);
            Screen::new(view_model, coordinator, settings.image_base_url.clone())
                .run()
                .await
        }
    }
}

fn apply_args(mut settings: Settings, args: &Args) -> Settings {
    if let Some(v) = &args.api_key {
        settings.api_key = Some(v.clone());
    }
    if let Some(v) = &args.base_url {
        settings.base_url = v.clone();
    }
    if let Some(v) = &args.image_base_url {
        settings.image_base_url = v.clone();
    }
    if let Some(v) = args.window {
        settings.time_window = v;
    }
    if let Some(v) = args.debounce_ms {
        settings.search_debounce = Duration::from_millis(v);
    }
    settings
}

async fn ensure_applied(view_model: &MovieViewModel, outcome: RequestOutcome) -> Result<()> {
    if outcome == RequestOutcome::Applied {
        return Ok(());
    }
    let message = view_model
        .take_error()
        .await
        .unwrap_or_else(|| "request did not complete".to_string());
    bail!(message)
}

async fn print_results(
    view_model: &MovieViewModel,
    outcome: RequestOutcome,
    settings: &Settings,
    json: bool,
) -> Result<()> {
    ensure_applied(view_model, outcome).await?;
    let movies = view_model.results().await;

    if json {
        println!("{}", serde_json::to_string_pretty(&movies)?);
        return Ok(());
    }

    if let Some(origin) = view_model.origin().await {
        println!("{}", render::heading(&origin));
    }
    if movies.is_empty() {
        println!("{NO_RESULTS_MESSAGE}");
    } else {
        print!(
            "{}",
            render::render_grid(&movies, &settings.image_base_url, GRID_COLUMNS)
        );
    }
    Ok(())
}
