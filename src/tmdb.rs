use reqwest::Client;
use serde::Deserialize;
use thiserror::Error;
use tracing::debug;

use crate::media::{MediaKind, MediaRef};

// Embedded API key for flickstream - this is allowed per TMDB terms for open source projects
// Users can override with their own key in config if needed
// At compile time, set TMDB_API_KEY env var to embed it, otherwise users must provide in config
const EMBEDDED_API_KEY: Option<&str> = option_env!("TMDB_API_KEY");

#[derive(Error, Debug)]
pub enum TmdbError {
    #[error("request failed: {0}")]
    RequestError(#[from] reqwest::Error),
    #[error("no results found")]
    NotFound,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SearchResult {
    pub id: u64,
    pub title: Option<String>, // Movies
    pub name: Option<String>,  // TV shows
    pub overview: Option<String>,
    pub release_date: Option<String>,   // Movies
    pub first_air_date: Option<String>, // TV shows
    pub vote_average: Option<f64>,
    pub poster_path: Option<String>,
    pub backdrop_path: Option<String>,
    pub media_type: Option<String>,
}

impl SearchResult {
    pub fn display_title(&self) -> &str {
        self.title
            .as_deref()
            .or(self.name.as_deref())
            .unwrap_or("Unknown")
    }

    pub fn year(&self) -> Option<u16> {
        let date = self
            .release_date
            .as_deref()
            .or(self.first_air_date.as_deref())?;
        date.split('-').next()?.parse().ok()
    }

    pub fn poster_url(&self, size: &str) -> Option<String> {
        self.poster_path
            .as_ref()
            .map(|p| format!("https://image.tmdb.org/t/p/{}{}", size, p))
    }

    pub fn kind(&self) -> MediaKind {
        match self.media_type.as_deref() {
            Some("tv") => MediaKind::Series,
            _ => MediaKind::Movie,
        }
    }

    /// Build the playback reference for this result. Series start at S01E01,
    /// matching where a fresh watch begins.
    pub fn media_ref(&self) -> MediaRef {
        let kind = self.kind();
        MediaRef {
            id: self.id,
            kind,
            season: (kind == MediaKind::Series).then_some(1),
            episode: (kind == MediaKind::Series).then_some(1),
            title: self.display_title().to_string(),
            overview: self.overview.clone(),
            poster_path: self.poster_path.clone(),
            backdrop_path: self.backdrop_path.clone(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    results: Vec<SearchResult>,
}

/// Item details with the attached videos metadata, from
/// `append_to_response=videos`.
#[derive(Debug, Clone, Deserialize)]
pub struct Details {
    pub id: u64,
    pub title: Option<String>, // Movies
    pub name: Option<String>,  // TV shows
    pub overview: Option<String>,
    #[serde(default)]
    pub videos: VideosResponse,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct VideosResponse {
    #[serde(default)]
    pub results: Vec<Video>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Video {
    pub key: String,
    pub site: String,
    #[serde(rename = "type")]
    pub video_type: String,
    #[serde(default)]
    pub official: bool,
}

/// Pick the YouTube key to embed for a trailer: official trailers first,
/// then any trailer, then a teaser.
pub fn extract_trailer_key(videos: &VideosResponse) -> Option<&str> {
    let youtube = |v: &&Video| v.site == "YouTube";

    videos
        .results
        .iter()
        .filter(youtube)
        .find(|v| v.video_type == "Trailer" && v.official)
        .or_else(|| {
            videos
                .results
                .iter()
                .filter(youtube)
                .find(|v| v.video_type == "Trailer")
        })
        .or_else(|| {
            videos
                .results
                .iter()
                .filter(youtube)
                .find(|v| v.video_type == "Teaser")
        })
        .map(|v| v.key.as_str())
}

/// The URL the "more info" surface embeds for a trailer key.
pub fn trailer_embed_url(key: &str) -> String {
    format!("https://www.youtube.com/embed/{}?autoplay=1&mute=1", key)
}

pub struct TmdbClient {
    client: Client,
    api_key: String,
    base_url: String,
}

impl TmdbClient {
    /// Create a new TMDB client. Uses custom key if provided, otherwise tries embedded key.
    /// Returns None if no API key is available.
    pub fn new(custom_api_key: Option<&str>) -> Option<Self> {
        Self::with_base_url(custom_api_key, "https://api.themoviedb.org")
    }

    /// Create a client with a custom base URL (for testing)
    pub fn with_base_url(custom_api_key: Option<&str>, base_url: &str) -> Option<Self> {
        let api_key = custom_api_key
            .map(String::from)
            .or_else(|| EMBEDDED_API_KEY.map(String::from))?;

        Some(Self {
            client: Client::new(),
            api_key,
            base_url: base_url.to_string(),
        })
    }

    /// Search for movies and TV shows
    pub async fn search_multi(&self, query: &str) -> Result<Vec<SearchResult>, TmdbError> {
        let url = format!(
            "{}/3/search/multi?api_key={}&query={}&include_adult=false",
            self.base_url,
            self.api_key,
            urlencoding::encode(query)
        );

        debug!(query, "searching TMDB");

        let response: SearchResponse = self.client.get(&url).send().await?.json().await?;

        Ok(response.results)
    }

    /// Get trending content (movies + TV)
    pub async fn get_trending(
        &self,
        media_type: &str,
        time_window: &str,
    ) -> Result<Vec<SearchResult>, TmdbError> {
        let url = format!(
            "{}/3/trending/{}/{}?api_key={}",
            self.base_url, media_type, time_window, self.api_key
        );

        debug!(media_type, time_window, "fetching trending content");

        let response: SearchResponse = self.client.get(&url).send().await?.json().await?;

        Ok(response.results)
    }

    /// Get popular movies
    pub async fn get_popular_movies(&self) -> Result<Vec<SearchResult>, TmdbError> {
        let url = format!("{}/3/movie/popular?api_key={}", self.base_url, self.api_key);

        debug!("fetching popular movies");

        let response: SearchResponse = self.client.get(&url).send().await?.json().await?;

        Ok(response.results)
    }

    /// Get popular TV shows
    pub async fn get_popular_tv(&self) -> Result<Vec<SearchResult>, TmdbError> {
        let url = format!("{}/3/tv/popular?api_key={}", self.base_url, self.api_key);

        debug!("fetching popular TV shows");

        let mut response: SearchResponse = self.client.get(&url).send().await?.json().await?;
        response
            .results
            .iter_mut()
            .for_each(|r| r.media_type = Some("tv".to_string()));

        Ok(response.results)
    }

    /// Get details for one item, with its videos metadata attached
    pub async fn get_details(&self, id: u64, kind: MediaKind) -> Result<Details, TmdbError> {
        let path = match kind {
            MediaKind::Movie => "movie",
            MediaKind::Series => "tv",
        };
        let url = format!(
            "{}/3/{}/{}?api_key={}&append_to_response=videos",
            self.base_url, path, id, self.api_key
        );

        debug!(id, kind = kind.label(), "fetching details");

        let response = self.client.get(&url).send().await?;
        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Err(TmdbError::NotFound);
        }

        let details: Details = response.json().await?;
        Ok(details)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn video(site: &str, video_type: &str, key: &str, official: bool) -> Video {
        Video {
            key: key.to_string(),
            site: site.to_string(),
            video_type: video_type.to_string(),
            official,
        }
    }

    #[test]
    fn test_extract_trailer_key_prefers_official_trailers() {
        let videos = VideosResponse {
            results: vec![
                video("YouTube", "Teaser", "teaser", true),
                video("YouTube", "Trailer", "fanmade", false),
                video("YouTube", "Trailer", "official", true),
            ],
        };
        assert_eq!(extract_trailer_key(&videos), Some("official"));
    }

    #[test]
    fn test_extract_trailer_key_falls_back_to_teaser() {
        let videos = VideosResponse {
            results: vec![
                video("Vimeo", "Trailer", "wrong-site", true),
                video("YouTube", "Teaser", "teaser", false),
            ],
        };
        assert_eq!(extract_trailer_key(&videos), Some("teaser"));
    }

    #[test]
    fn test_extract_trailer_key_absent() {
        assert_eq!(extract_trailer_key(&VideosResponse::default()), None);
        let videos = VideosResponse {
            results: vec![video("YouTube", "Featurette", "clip", true)],
        };
        assert_eq!(extract_trailer_key(&videos), None);
    }

    #[test]
    fn test_trailer_embed_url() {
        assert_eq!(
            trailer_embed_url("dQw4w9WgXcQ"),
            "https://www.youtube.com/embed/dQw4w9WgXcQ?autoplay=1&mute=1"
        );
    }

    fn result(media_type: Option<&str>) -> SearchResult {
        SearchResult {
            id: 603,
            title: Some("The Matrix".to_string()),
            name: None,
            overview: Some("A hacker learns the truth.".to_string()),
            release_date: Some("1999-03-30".to_string()),
            first_air_date: None,
            vote_average: Some(8.1),
            poster_path: Some("/poster.jpg".to_string()),
            backdrop_path: Some("/backdrop.jpg".to_string()),
            media_type: media_type.map(String::from),
        }
    }

    #[test]
    fn test_media_ref_for_movie() {
        let media = result(Some("movie")).media_ref();
        assert_eq!(media.id, 603);
        assert_eq!(media.kind, MediaKind::Movie);
        assert_eq!(media.season, None);
        assert_eq!(media.episode, None);
        assert_eq!(media.title, "The Matrix");
    }

    #[test]
    fn test_media_ref_for_series_starts_at_s01e01() {
        let mut tv = result(Some("tv"));
        tv.title = None;
        tv.name = Some("Breaking Bad".to_string());

        let media = tv.media_ref();
        assert_eq!(media.kind, MediaKind::Series);
        assert_eq!(media.season, Some(1));
        assert_eq!(media.episode, Some(1));
        assert_eq!(media.title, "Breaking Bad");
    }

    #[test]
    fn test_media_ref_defaults_to_movie_without_media_type() {
        assert_eq!(result(None).media_ref().kind, MediaKind::Movie);
    }

    #[test]
    fn test_search_result_display_title_and_year() {
        let movie = result(Some("movie"));
        assert_eq!(movie.display_title(), "The Matrix");
        assert_eq!(movie.year(), Some(1999));

        let mut unknown = result(None);
        unknown.title = None;
        unknown.release_date = None;
        assert_eq!(unknown.display_title(), "Unknown");
        assert_eq!(unknown.year(), None);
    }

    #[test]
    fn test_search_result_poster_url() {
        let movie = result(Some("movie"));
        assert_eq!(
            movie.poster_url("w500"),
            Some("https://image.tmdb.org/t/p/w500/poster.jpg".to_string())
        );

        let mut bare = result(None);
        bare.poster_path = None;
        assert_eq!(bare.poster_url("w500"), None);
    }
}
