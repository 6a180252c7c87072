use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;
use shared::{
    domain::TimeWindow,
    error::ApiError,
    protocol::MoviePage,
};
use tracing::{debug, warn};
use url::Url;

pub mod error;
pub mod search;
pub mod view_model;

pub use error::MovieApiError;
pub use search::{
    CoordinatorState, SearchAction, SearchCoordinator, SearchDispatch, DEFAULT_SEARCH_DEBOUNCE,
};
pub use view_model::{MovieEvent, MovieViewModel, RequestOutcome, NO_RESULTS_MESSAGE};

pub type Result<T, E = MovieApiError> = std::result::Result<T, E>;

pub const DEFAULT_API_BASE_URL: &str = "https://api.themoviedb.org/3/";
pub const DEFAULT_IMAGE_BASE_URL: &str = "https://image.tmdb.org/t/p/w500";
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(15);

/// Data access for the two list endpoints the app uses.
#[async_trait]
pub trait MovieRepository: Send + Sync {
    async fn trending_movies(&self, time_window: TimeWindow) -> Result<MoviePage>;
    async fn search_movies(&self, query: &str) -> Result<MoviePage>;
}

#[derive(Debug, Clone)]
pub struct TmdbConfig {
    pub base_url: String,
    pub api_key: String,
    pub request_timeout: Duration,
}

impl TmdbConfig {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            base_url: DEFAULT_API_BASE_URL.to_string(),
            api_key: api_key.into(),
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
        }
    }
}

#[derive(Serialize)]
struct TrendingQuery<'a> {
    api_key: &'a str,
}

#[derive(Serialize)]
struct SearchQuery<'a> {
    query: &'a str,
    api_key: &'a str,
}

/// REST client for the TMDB v3 API, authenticated with the `api_key` query
/// parameter.
pub struct TmdbClient {
    http: Client,
    base_url: Url,
    api_key: String,
}

impl TmdbClient {
    pub fn new(config: TmdbConfig) -> Result<Self> {
        let http = Client::builder()
            .timeout(config.request_timeout)
            .build()
            .map_err(|err| MovieApiError::InvalidConfig(err.to_string()))?;
        Self::with_http_client(http, &config.base_url, config.api_key)
    }

    pub fn with_http_client(
        http: Client,
        base_url: &str,
        api_key: impl Into<String>,
    ) -> Result<Self> {
        let api_key = api_key.into();
        if api_key.trim().is_empty() {
            return Err(MovieApiError::InvalidConfig(
                "api key must not be empty".to_string(),
            ));
        }

        Ok(Self {
            http,
            base_url: normalize_base_url(base_url)?,
            api_key,
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn endpoint(&self, path: &str) -> Result<Url> {
        Ok(self.base_url.join(path.trim_start_matches('/'))?)
    }

    async fn get_page<Q: Serialize + ?Sized>(&self, url: Url, query: &Q) -> Result<MoviePage> {
        debug!(path = url.path(), "requesting movie page");
        let res = self.http.get(url.clone()).query(query).send().await?;

        let status = res.status();
        if !status.is_success() {
            let body = res.text().await.unwrap_or_default();
            let api_error = ApiError::from_response(status.as_u16(), &body);
            warn!(
                path = url.path(),
                status = status.as_u16(),
                message = %api_error.message,
                "movie api returned an error status"
            );
            return Err(api_error.into());
        }

        let bytes = res.bytes().await?;
        Ok(serde_json::from_slice(&bytes)?)
    }
}

#[async_trait]
impl MovieRepository for TmdbClient {
    async fn trending_movies(&self, time_window: TimeWindow) -> Result<MoviePage> {
        let url = self.endpoint(&format!("trending/movie/{}", time_window.as_str()))?;
        self.get_page(
            url,
            &TrendingQuery {
                api_key: &self.api_key,
            },
        )
        .await
    }

    async fn search_movies(&self, query: &str) -> Result<MoviePage> {
        let url = self.endpoint("search/movie")?;
        self.get_page(
            url,
            &SearchQuery {
                query,
                api_key: &self.api_key,
            },
        )
        .await
    }
}

/// `Url::join` drops the last path segment unless the base ends with `/`.
fn normalize_base_url(raw: &str) -> Result<Url> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Err(MovieApiError::InvalidConfig(
            "base url must not be empty".to_string(),
        ));
    }
    let mut url = Url::parse(raw)?;
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    Ok(url)
}

#[cfg(test)]
#[path = "tests/lib_tests.rs"]
mod tests;
