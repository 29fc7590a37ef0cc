use thiserror::Error;
use url::Url;

use crate::media::{MediaKind, MediaRef};

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProviderError {
    #[error("invalid media reference: {0}")]
    InvalidReference(String),
}

/// One of the fixed set of interchangeable upstream embed sources.
///
/// The declaration order is load-bearing: it is the cycling order and
/// `ALL[0]` is the provider every fresh playback starts on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Provider {
    EmbedSu,
    MultiEmbed,
    VidSrc,
}

impl Provider {
    pub const ALL: &'static [Provider] = &[
        Provider::EmbedSu,
        Provider::MultiEmbed,
        Provider::VidSrc,
    ];

    /// The next provider in cycling order, wrapping at the end.
    pub fn next(self) -> Self {
        match self {
            Provider::EmbedSu => Provider::MultiEmbed,
            Provider::MultiEmbed => Provider::VidSrc,
            Provider::VidSrc => Provider::EmbedSu,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Provider::EmbedSu => "embed.su",
            Provider::MultiEmbed => "multiembed",
            Provider::VidSrc => "vidsrc",
        }
    }

    fn movie_url(&self, id: u64) -> String {
        match self {
            Provider::EmbedSu => format!("https://embed.su/embed/movie/{}", id),
            Provider::MultiEmbed => {
                format!("https://multiembed.mov/?video_id={}&tmdb=1", id)
            }
            Provider::VidSrc => format!("https://vidsrc.to/embed/movie/{}", id),
        }
    }

    fn series_url(&self, id: u64, season: u32, episode: u32) -> String {
        match self {
            Provider::EmbedSu => {
                format!("https://embed.su/embed/tv/{}/{}/{}", id, season, episode)
            }
            Provider::MultiEmbed => format!(
                "https://multiembed.mov/?video_id={}&tmdb=1&s={}&e={}",
                id, season, episode
            ),
            Provider::VidSrc => {
                format!("https://vidsrc.to/embed/tv/{}/{}/{}", id, season, episode)
            }
        }
    }
}

/// A resolved playback source: which provider it came from and the embed URL
/// to hand to the rendering surface.
#[derive(Debug, Clone, PartialEq)]
pub struct Candidate {
    pub provider: Provider,
    pub url: Url,
}

/// Resolve the full candidate list for a reference, one entry per provider,
/// always in `Provider::ALL` order.
///
/// Pure: no I/O, identical input gives identical output. Series references
/// must carry a season and episode >= 1, anything else is a caller error.
pub fn resolve_candidates(media: &MediaRef) -> Result<Vec<Candidate>, ProviderError> {
    let urls: Vec<String> = match media.kind {
        MediaKind::Movie => Provider::ALL.iter().map(|p| p.movie_url(media.id)).collect(),
        MediaKind::Series => {
            let season = media.season.ok_or_else(|| {
                ProviderError::InvalidReference("series reference is missing a season".to_string())
            })?;
            let episode = media.episode.ok_or_else(|| {
                ProviderError::InvalidReference("series reference is missing an episode".to_string())
            })?;
            if season == 0 || episode == 0 {
                return Err(ProviderError::InvalidReference(format!(
                    "season and episode are 1-based, got S{:02}E{:02}",
                    season, episode
                )));
            }
            Provider::ALL
                .iter()
                .map(|p| p.series_url(media.id, season, episode))
                .collect()
        }
    };

    Ok(Provider::ALL
        .iter()
        .zip(urls)
        .map(|(provider, url)| Candidate {
            provider: *provider,
            // Templates are static and ids are numeric, parsing can't fail
            url: Url::parse(&url).unwrap(),
        })
        .collect())
}
