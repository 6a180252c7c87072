use std::sync::Arc;

use anyhow::Result;
use client_core::{
    MovieEvent, MovieViewModel, RequestOutcome, SearchAction, SearchCoordinator,
    NO_RESULTS_MESSAGE,
};
use tokio::{
    io::{AsyncBufReadExt, BufReader},
    sync::broadcast::{self, error::RecvError},
    task::JoinHandle,
};
use tracing::{debug, info};

use crate::render::{self, GRID_COLUMNS};

const HELP: &str = "\
Type to search (empty line shows trending).
  :go <text>    search for text (same debounce as typing)
  :open <n>     show details for result n
  :trending     back to trending
  :help         this message
  :quit         exit";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Input(String),
    Submit(String),
    Open(usize),
    Trending,
    Help,
    Quit,
    Unknown(String),
}

pub fn parse_command(line: &str) -> Command {
    let Some(rest) = line.trim_start().strip_prefix(':') else {
        return Command::Input(line.to_string());
    };

    let (name, arg) = match rest.split_once(char::is_whitespace) {
        Some((name, arg)) => (name, arg.trim()),
        None => (rest.trim(), ""),
    };

    match name {
        "q" | "quit" | "exit" => Command::Quit,
        "h" | "help" => Command::Help,
        "t" | "trending" => Command::Trending,
        "go" | "search" => Command::Submit(arg.to_string()),
        "o" | "open" => match arg.parse::<usize>() {
            Ok(index) => Command::Open(index),
            Err(_) => Command::Unknown(line.trim().to_string()),
        },
        _ => Command::Unknown(line.trim().to_string()),
    }
}

pub struct Screen {
    view_model: Arc<MovieViewModel>,
    coordinator: SearchCoordinator,
    image_base: String,
}

impl Screen {
    pub fn new(
        view_model: Arc<MovieViewModel>,
        coordinator: SearchCoordinator,
        image_base: String,
    ) -> Self {
        Self {
            view_model,
            coordinator,
            image_base,
        }
    }

    /// Initial load: fetches trending once, before any input is read.
    pub fn start(&self) -> JoinHandle<RequestOutcome> {
        self.view_model.spawn_action(SearchAction::FetchTrending)
    }

    pub async fn run(self) -> Result<()> {
        let printer = tokio::spawn(print_events(
            Arc::clone(&self.view_model),
            self.view_model.subscribe(),
            self.image_base.clone(),
        ));

        println!("{HELP}\n");
        drop(self.start());

        let mut lines = BufReader::new(tokio::io::stdin()).lines();
        loop {
            let line = tokio::select! {
                line = lines.next_line() => line?,
                _ = tokio::signal::ctrl_c() => {
                    info!("interrupted");
                    None
                }
            };
            let Some(line) = line else {
                break;
            };

            if !self.handle(parse_command(&line)).await {
                break;
            }
        }

        self.coordinator.cancel();
        printer.abort();
        Ok(())
    }

    /// Returns `false` when the screen should close.
    async fn handle(&self, command: Command) -> bool {
        debug!(command = ?command, "handling command");
        match command {
            Command::Input(text) => self.coordinator.on_input(&text),
            Command::Submit(text) => {
                if !self.coordinator.submit(&text) {
                    println!("nothing to search for");
                }
            }
            Command::Trending => self.coordinator.on_input(""),
            Command::Open(index) => match self.view_model.movie_at(index).await {
                Some(movie) => println!("\n{}", render::render_detail(&movie, &self.image_base)),
                None => println!("no result #{index}"),
            },
            Command::Help => println!("{HELP}"),
            Command::Unknown(raw) => println!("unknown command '{raw}' (try :help)"),
            Command::Quit => return false,
        }
        true
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Output {
    Stdout(String),
    Stderr(String),
}

async fn print_events(
    view_model: Arc<MovieViewModel>,
    mut events: broadcast::Receiver<MovieEvent>,
    image_base: String,
) {
    loop {
        match events.recv().await {
            Ok(event) => match handle_event(&view_model, event, &image_base).await {
                Output::Stdout(text) => print!("{text}"),
                Output::Stderr(text) => eprint!("{text}"),
            },
            Err(RecvError::Lagged(skipped)) => debug!(skipped, "event printer lagged"),
            Err(RecvError::Closed) => break,
        }
    }
}

/// Formats one view model event. An error event carries its own message; the
/// error slot is only cleared here so it is not shown a second time.
pub async fn handle_event(
    view_model: &MovieViewModel,
    event: MovieEvent,
    image_base: &str,
) -> Output {
    match event {
        MovieEvent::ResultsUpdated { origin, movies } => Output::Stdout(format!(
            "\n{}\n{}",
            render::heading(&origin),
            render::render_grid(&movies, image_base, GRID_COLUMNS)
        )),
        MovieEvent::NoResults { .. } => Output::Stdout(format!("{NO_RESULTS_MESSAGE}\n")),
        MovieEvent::Error(message) => {
            let _ = view_model.take_error().await;
            Output::Stderr(format!("{message}\n"))
        }
    }
}

#[cfg(test)]
#[path = "tests/interactive_tests.rs"]
mod tests;
