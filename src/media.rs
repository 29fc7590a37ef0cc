use serde::{Deserialize, Serialize};

/// What kind of content a reference points at. Series references carry a
/// season/episode position, movies don't.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaKind {
    Movie,
    Series,
}

impl MediaKind {
    pub fn label(&self) -> &'static str {
        match self {
            MediaKind::Movie => "movie",
            MediaKind::Series => "series",
        }
    }
}

/// Identity and display metadata for one playable item.
///
/// A new value is built whenever the user selects a different item; views
/// pass it by value into the playback session and the watchlist, neither of
/// which mutates it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MediaRef {
    pub id: u64,
    pub kind: MediaKind,
    pub season: Option<u32>,
    pub episode: Option<u32>,
    pub title: String,
    pub overview: Option<String>,
    pub poster_path: Option<String>,
    pub backdrop_path: Option<String>,
}

impl MediaRef {
    pub fn movie(id: u64, title: impl Into<String>) -> Self {
        Self {
            id,
            kind: MediaKind::Movie,
            season: None,
            episode: None,
            title: title.into(),
            overview: None,
            poster_path: None,
            backdrop_path: None,
        }
    }

    pub fn series(id: u64, title: impl Into<String>, season: u32, episode: u32) -> Self {
        Self {
            id,
            kind: MediaKind::Series,
            season: Some(season),
            episode: Some(episode),
            title: title.into(),
            overview: None,
            poster_path: None,
            backdrop_path: None,
        }
    }

    /// Whether two references point at the same playable item, episode
    /// position included. Opening the same item twice is a no-op; opening
    /// the next episode is not.
    pub fn same_item(&self, other: &MediaRef) -> bool {
        self.id == other.id
            && self.kind == other.kind
            && self.season == other.season
            && self.episode == other.episode
    }

    /// The successor episode of a series reference. Movies have no next
    /// episode, nor does a series reference without a position.
    pub fn next_episode(&self) -> Option<MediaRef> {
        if self.kind != MediaKind::Series {
            return None;
        }
        let episode = self.episode?;
        Some(MediaRef {
            episode: Some(episode + 1),
            ..self.clone()
        })
    }

    pub fn poster_url(&self, size: &str) -> Option<String> {
        self.poster_path
            .as_ref()
            .map(|p| format!("https://image.tmdb.org/t/p/{}{}", size, p))
    }

    /// Display string including episode position for series, e.g.
    /// "Severance S01E03".
    pub fn display_title(&self) -> String {
        match (self.kind, self.season, self.episode) {
            (MediaKind::Series, Some(s), Some(e)) => {
                format!("{} S{:02}E{:02}", self.title, s, e)
            }
            _ => self.title.clone(),
        }
    }
}
