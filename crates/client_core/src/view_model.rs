use std::sync::{
    atomic::{AtomicU64, Ordering},
    Arc,
};

use shared::{
    domain::{ResultOrigin, TimeWindow},
    protocol::{Movie, MoviePage},
};
use tokio::{
    sync::{broadcast, Mutex},
    task::JoinHandle,
};
use tracing::{debug, info, warn};

use crate::{
    search::{SearchAction, SearchDispatch},
    MovieApiError, MovieRepository,
};

pub const NO_RESULTS_MESSAGE: &str = "No results found";

#[derive(Debug, Clone)]
pub enum MovieEvent {
    ResultsUpdated {
        origin: ResultOrigin,
        movies: Vec<Movie>,
    },
    NoResults {
        origin: ResultOrigin,
    },
    Error(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestOutcome {
    Applied,
    /// A newer request was issued before this one completed.
    Stale,
    Failed,
}

#[derive(Default)]
struct ViewState {
    origin: Option<ResultOrigin>,
    movies: Vec<Movie>,
    error: Option<String>,
}

/// Owns the "current results" and "current error" slots shown by a screen.
///
/// Every request gets a sequence number when it is issued; a response is only
/// applied if no newer request was issued in the meantime.
pub struct MovieViewModel {
    repository: Arc<dyn MovieRepository>,
    time_window: TimeWindow,
    state: Mutex<ViewState>,
    latest_request: AtomicU64,
    events: broadcast::Sender<MovieEvent>,
}

impl MovieViewModel {
    pub fn new(repository: Arc<dyn MovieRepository>, time_window: TimeWindow) -> Arc<Self> {
        let (events, _) = broadcast::channel(64);
        Arc::new(Self {
            repository,
            time_window,
            state: Mutex::new(ViewState::default()),
            latest_request: AtomicU64::new(0),
            events,
        })
    }

    pub fn time_window(&self) -> TimeWindow {
        self.time_window
    }

    pub fn subscribe(&self) -> broadcast::Receiver<MovieEvent> {
        self.events.subscribe()
    }

    pub async fn fetch_trending(&self) -> RequestOutcome {
        let seq = self.next_sequence();
        self.execute(seq, SearchAction::FetchTrending).await
    }

    pub async fn search_movies(&self, query: &str) -> RequestOutcome {
        let seq = self.next_sequence();
        self.execute(seq, SearchAction::Search(query.to_string()))
            .await
    }

    /// Issues `action` now and runs it on a separate task. The sequence number
    /// is taken before this returns, so call order decides which response wins.
    pub fn spawn_action(self: &Arc<Self>, action: SearchAction) -> JoinHandle<RequestOutcome> {
        let seq = self.next_sequence();
        let view_model = Arc::clone(self);
        tokio::spawn(async move { view_model.execute(seq, action).await })
    }

    pub async fn results(&self) -> Vec<Movie> {
        self.state.lock().await.movies.clone()
    }

    pub async fn origin(&self) -> Option<ResultOrigin> {
        self.state.lock().await.origin.clone()
    }

    pub async fn movie_at(&self, index: usize) -> Option<Movie> {
        self.state.lock().await.movies.get(index).cloned()
    }

    /// Returns the current error and clears the slot, so each error is shown
    /// once.
    pub async fn take_error(&self) -> Option<String> {
        self.state.lock().await.error.take()
    }

    pub async fn peek_error(&self) -> Option<String> {
        self.state.lock().await.error.clone()
    }

    fn next_sequence(&self) -> u64 {
        self.latest_request.fetch_add(1, Ordering::SeqCst) + 1
    }

    fn is_latest(&self, seq: u64) -> bool {
        self.latest_request.load(Ordering::SeqCst) == seq
    }

    async fn execute(&self, seq: u64, action: SearchAction) -> RequestOutcome {
        let (origin, response) = match action {
            SearchAction::FetchTrending => {
                info!(seq, time_window = %self.time_window, "fetching trending movies");
                (
                    ResultOrigin::Trending(self.time_window),
                    self.repository.trending_movies(self.time_window).await,
                )
            }
            SearchAction::Search(query) => {
                info!(seq, query = %query, "searching movies");
                let response = self.repository.search_movies(&query).await;
                (ResultOrigin::Search(query), response)
            }
        };

        let mut state = self.state.lock().await;
        // Checked under the lock so two completions cannot both pass as latest.
        if !self.is_latest(seq) {
            debug!(seq, origin = ?origin, "discarding stale response");
            return RequestOutcome::Stale;
        }

        match response {
            Ok(page) => {
                self.apply_page(&mut state, origin, page);
                RequestOutcome::Applied
            }
            Err(err) => {
                self.apply_error(&mut state, &origin, err);
                RequestOutcome::Failed
            }
        }
    }

    fn apply_page(&self, state: &mut ViewState, origin: ResultOrigin, page: MoviePage) {
        let empty = page.is_empty();
        debug!(
            origin = ?origin,
            count = page.results.len(),
            total = page.total_results,
            "applying movie page"
        );

        state.origin = Some(origin.clone());
        state.movies = page.results.clone();

        let _ = self.events.send(MovieEvent::ResultsUpdated {
            origin: origin.clone(),
            movies: page.results,
        });
        if empty {
            let _ = self.events.send(MovieEvent::NoResults { origin });
        }
    }

    fn apply_error(&self, state: &mut ViewState, origin: &ResultOrigin, err: MovieApiError) {
        let message = err.to_string();
        warn!(origin = ?origin, error = %message, "movie request failed");
        state.error = Some(message.clone());
        let _ = self.events.send(MovieEvent::Error(message));
    }
}

impl SearchDispatch for MovieViewModel {
    fn dispatch(self: Arc<Self>, action: SearchAction) {
        drop(self.spawn_action(action));
    }
}

#[cfg(test)]
#[path = "tests/view_model_tests.rs"]
mod tests;
