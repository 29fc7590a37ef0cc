use std::sync::Arc;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::media::MediaRef;
use crate::tmdb::{self, TmdbClient};

/// What the "more info" view needs from a completed fetch. `details` is
/// `None` when the fetch failed, the view degrades to "no extra detail".
#[derive(Debug, Clone)]
pub struct DetailsUpdate {
    pub media_id: u64,
    pub generation: u64,
    pub details: Option<FetchedDetails>,
}

#[derive(Debug, Clone)]
pub struct FetchedDetails {
    pub overview: Option<String>,
    pub trailer_key: Option<String>,
}

/// A detail fetch in flight, scoped to the detail view that requested it.
///
/// Cancelling (or dropping) the handle guarantees the task delivers nothing:
/// the token is checked again between fetch completion and delivery, so a
/// result that races the cancel is discarded rather than sent. The
/// generation number lets the receiver drop messages from an older view even
/// if one slipped out before the cancel.
pub struct DetailFetch {
    media_id: u64,
    generation: u64,
    token: CancellationToken,
    handle: JoinHandle<()>,
}

impl DetailFetch {
    pub fn spawn(
        client: Arc<TmdbClient>,
        media: &MediaRef,
        generation: u64,
        tx: mpsc::Sender<DetailsUpdate>,
    ) -> Self {
        let token = CancellationToken::new();
        let task_token = token.clone();
        let id = media.id;
        let kind = media.kind;

        let handle = tokio::spawn(async move {
            let result = tokio::select! {
                _ = task_token.cancelled() => {
                    debug!(id, "detail fetch cancelled");
                    return;
                }
                result = client.get_details(id, kind) => result,
            };

            // The view may have closed while the response was in flight
            if task_token.is_cancelled() {
                debug!(id, "detail fetch cancelled, discarding result");
                return;
            }

            let details = match result {
                Ok(details) => Some(FetchedDetails {
                    trailer_key: tmdb::extract_trailer_key(&details.videos).map(String::from),
                    overview: details.overview,
                }),
                Err(e) => {
                    debug!(id, error = %e, "detail fetch failed");
                    None
                }
            };

            let _ = tx
                .send(DetailsUpdate {
                    media_id: id,
                    generation,
                    details,
                })
                .await;
        });

        Self {
            media_id: id,
            generation,
            token,
            handle,
        }
    }

    pub fn media_id(&self) -> u64 {
        self.media_id
    }

    pub fn cancel(&self) {
        self.token.cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }

    /// Whether an incoming update belongs to this fetch and is still wanted.
    pub fn accepts(&self, update: &DetailsUpdate) -> bool {
        !self.is_cancelled()
            && update.generation == self.generation
            && update.media_id == self.media_id
    }
}

impl Drop for DetailFetch {
    fn drop(&mut self) {
        self.token.cancel();
        self.handle.abort();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::media::MediaRef;
    use std::time::Duration;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const DETAILS_BODY: &str = r#"{
        "id": 603,
        "title": "The Matrix",
        "overview": "A hacker learns the truth.",
        "videos": {
            "results": [
                {"key": "trailer-key", "site": "YouTube", "type": "Trailer", "official": true}
            ]
        }
    }"#;

    async fn mock_details_server(delay_ms: u64) -> MockServer {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/3/movie/603"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_string(DETAILS_BODY)
                    .set_delay(Duration::from_millis(delay_ms)),
            )
            .mount(&server)
            .await;
        server
    }

    #[tokio::test]
    async fn test_fetch_delivers_trailer_key() {
        let server = mock_details_server(0).await;
        let client = Arc::new(TmdbClient::with_base_url(Some("test-key"), &server.uri()).unwrap());
        let (tx, mut rx) = mpsc::channel(4);

        let fetch = DetailFetch::spawn(client, &MediaRef::movie(603, "The Matrix"), 1, tx);

        let update = rx.recv().await.unwrap();
        assert!(fetch.accepts(&update));
        let details = update.details.unwrap();
        assert_eq!(details.trailer_key.as_deref(), Some("trailer-key"));
        assert_eq!(details.overview.as_deref(), Some("A hacker learns the truth."));
    }

    #[tokio::test]
    async fn test_cancelled_fetch_delivers_nothing() {
        let server = mock_details_server(200).await;
        let client = Arc::new(TmdbClient::with_base_url(Some("test-key"), &server.uri()).unwrap());
        let (tx, mut rx) = mpsc::channel(4);

        let fetch = DetailFetch::spawn(client, &MediaRef::movie(603, "The Matrix"), 1, tx);
        fetch.cancel();
        assert!(fetch.is_cancelled());

        // The sender is dropped without sending, recv resolves to None
        assert!(rx.recv().await.is_none());
    }

    #[tokio::test]
    async fn test_failed_fetch_degrades_to_no_detail() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/3/movie/603"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;
        let client = Arc::new(TmdbClient::with_base_url(Some("test-key"), &server.uri()).unwrap());
        let (tx, mut rx) = mpsc::channel(4);

        let _fetch = DetailFetch::spawn(client, &MediaRef::movie(603, "The Matrix"), 1, tx);

        let update = rx.recv().await.unwrap();
        assert!(update.details.is_none());
    }

    #[tokio::test]
    async fn test_stale_generation_is_rejected() {
        let server = mock_details_server(0).await;
        let client = Arc::new(TmdbClient::with_base_url(Some("test-key"), &server.uri()).unwrap());
        let (tx, mut rx) = mpsc::channel(4);

        let _old = DetailFetch::spawn(
            client.clone(),
            &MediaRef::movie(603, "The Matrix"),
            1,
            tx.clone(),
        );
        let new = DetailFetch::spawn(client, &MediaRef::movie(603, "The Matrix"), 2, tx);

        // Whichever update arrives, the new fetch only accepts its own
        let update = rx.recv().await.unwrap();
        if update.generation == 1 {
            assert!(!new.accepts(&update));
        } else {
            assert!(new.accepts(&update));
        }
    }
}
