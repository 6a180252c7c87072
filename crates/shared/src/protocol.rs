use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::domain::{GenreId, MovieId};

/// One movie record as returned by the trending and search endpoints.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Movie {
    pub id: MovieId,
    #[serde(default)]
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub original_title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub original_language: Option<String>,
    #[serde(default)]
    pub overview: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub poster_path: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub backdrop_path: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub release_date: Option<String>,
    #[serde(default)]
    pub vote_average: f64,
    #[serde(default)]
    pub popularity: f64,
    #[serde(default)]
    pub genre_ids: Vec<GenreId>,
    #[serde(default)]
    pub adult: bool,
}

impl Movie {
    pub fn poster_url(&self, image_base: &str) -> Option<String> {
        self.poster_path
            .as_deref()
            .map(|path| join_image_path(image_base, path))
    }

    pub fn backdrop_url(&self, image_base: &str) -> Option<String> {
        self.backdrop_path
            .as_deref()
            .map(|path| join_image_path(image_base, path))
    }

    /// Release date parsed from the API's `YYYY-MM-DD` string. The API sends
    /// an empty string for unreleased titles.
    pub fn release(&self) -> Option<NaiveDate> {
        self.release_date
            .as_deref()
            .filter(|raw| !raw.is_empty())
            .and_then(|raw| NaiveDate::parse_from_str(raw, "%Y-%m-%d").ok())
    }
}

fn join_image_path(image_base: &str, path: &str) -> String {
    format!(
        "{}/{}",
        image_base.trim_end_matches('/'),
        path.trim_start_matches('/')
    )
}

/// Paged envelope shared by the list endpoints.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MoviePage {
    #[serde(default = "first_page")]
    pub page: u32,
    #[serde(default)]
    pub results: Vec<Movie>,
    #[serde(default)]
    pub total_pages: u32,
    #[serde(default)]
    pub total_results: u32,
}

fn first_page() -> u32 {
    1
}

impl MoviePage {
    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TRENDING_BODY: &str = r#"{
        "page": 1,
        "results": [
            {
                "adult": false,
                "backdrop_path": "/back.jpg",
                "id": 603,
                "title": "The Matrix",
                "original_language": "en",
                "original_title": "The Matrix",
                "overview": "Set in the 22nd century...",
                "poster_path": "/poster.jpg",
                "media_type": "movie",
                "genre_ids": [28, 878],
                "popularity": 80.5,
                "release_date": "1999-03-30",
                "video": false,
                "vote_average": 8.2,
                "vote_count": 24000
            },
            { "id": 7, "title": "Untitled", "release_date": "" }
        ],
        "total_pages": 500,
        "total_results": 10000
    }"#;

    #[test]
    fn decodes_trending_page_ignoring_unknown_fields() {
        let page: MoviePage = serde_json::from_str(TRENDING_BODY).expect("decode");
        assert_eq!(page.results.len(), 2);
        assert_eq!(page.total_results, 10000);

        let matrix = &page.results[0];
        assert_eq!(matrix.id, MovieId(603));
        assert_eq!(matrix.genre_ids, vec![GenreId(28), GenreId(878)]);
        assert_eq!(
            matrix.release(),
            NaiveDate::from_ymd_opt(1999, 3, 30)
        );

        let untitled = &page.results[1];
        assert!(untitled.poster_path.is_none());
        assert!(untitled.release().is_none());
        assert!(untitled.overview.is_empty());
    }

    #[test]
    fn builds_image_urls_without_doubled_slashes() {
        let page: MoviePage = serde_json::from_str(TRENDING_BODY).expect("decode");
        let matrix = &page.results[0];
        assert_eq!(
            matrix.poster_url("https://image.tmdb.org/t/p/w500/").as_deref(),
            Some("https://image.tmdb.org/t/p/w500/poster.jpg")
        );
        assert_eq!(
            matrix.backdrop_url("https://image.tmdb.org/t/p/w500").as_deref(),
            Some("https://image.tmdb.org/t/p/w500/back.jpg")
        );
        assert!(page.results[1].poster_url("https://x").is_none());
    }

    #[test]
    fn missing_page_defaults_to_first() {
        let page: MoviePage = serde_json::from_str(r#"{"results": []}"#).expect("decode");
        assert_eq!(page.page, 1);
        assert!(page.is_empty());
    }
}
