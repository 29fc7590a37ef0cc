use tracing::{debug, info};
use url::Url;

use crate::media::MediaRef;
use crate::providers::{self, Candidate, Provider, ProviderError};

/// Playback lifecycle event, broadcast to observers on every genuine state
/// transition. No-op calls (idempotent open, switch/close while closed)
/// emit nothing.
#[derive(Debug, Clone)]
pub enum SessionEvent {
    /// Playback started for an item, on the given provider.
    Opened {
        media: MediaRef,
        provider: Provider,
    },
    /// The user cycled to the next provider for the open item.
    ProviderSwitched { provider: Provider },
    /// Playback ended for an item.
    Closed { media: MediaRef },
}

/// Observers are called on the event loop thread, synchronously with the
/// transition, so keep handlers fast.
pub trait SessionObserver: Send + Sync {
    fn on_event(&self, event: &SessionEvent);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Closed,
    Open { index: usize },
}

/// Coordinates which provider's URL is currently rendered for an open
/// playback request.
///
/// The active index is only ever produced by `(i + 1) % N` over the resolved
/// candidate list, so an out-of-range index is unreachable. Closing is
/// terminal for the open item: reopening resolves afresh and starts from the
/// first provider again.
pub struct PlaybackSession {
    state: State,
    media: Option<MediaRef>,
    candidates: Vec<Candidate>,
    observers: Vec<Box<dyn SessionObserver>>,
}

impl PlaybackSession {
    pub fn new() -> Self {
        Self {
            state: State::Closed,
            media: None,
            candidates: Vec::new(),
            observers: Vec::new(),
        }
    }

    /// Register an observer for session transitions.
    pub fn register_observer(&mut self, observer: Box<dyn SessionObserver>) {
        self.observers.push(observer);
    }

    fn broadcast(&self, event: SessionEvent) {
        for observer in &self.observers {
            observer.on_event(&event);
        }
    }

    pub fn is_open(&self) -> bool {
        matches!(self.state, State::Open { .. })
    }

    /// The item playback is open for, if any.
    pub fn media(&self) -> Option<&MediaRef> {
        self.media.as_ref()
    }

    /// Open playback for an item, starting on the first provider.
    ///
    /// Re-opening the item that is already open is a no-op. Opening a
    /// different item while open closes the old one first (its `Closed`
    /// event fires once) and resets to the first provider. If the reference
    /// doesn't resolve, the session is left exactly as it was.
    pub fn open(&mut self, media: MediaRef) -> Result<(), ProviderError> {
        if self.is_open()
            && let Some(current) = &self.media
            && current.same_item(&media)
        {
            debug!(title = %media.title, "playback already open for item");
            return Ok(());
        }

        // Resolve before touching any state so a bad reference can't leave
        // a partially opened session behind.
        let candidates = providers::resolve_candidates(&media)?;

        if self.is_open() {
            self.close();
        }

        info!(title = %media.title, id = media.id, "opening playback");
        self.state = State::Open { index: 0 };
        self.candidates = candidates;
        self.media = Some(media.clone());
        self.broadcast(SessionEvent::Opened {
            media,
            provider: Provider::ALL[0],
        });
        Ok(())
    }

    /// Advance to the next provider, wrapping at the end of the list.
    /// Returns the new active candidate, or `None` when closed (stray
    /// switch events after close are ignored).
    pub fn switch_provider(&mut self) -> Option<&Candidate> {
        let State::Open { index } = self.state else {
            debug!("ignoring provider switch, no playback open");
            return None;
        };

        let next = (index + 1) % self.candidates.len();
        self.state = State::Open { index: next };

        let candidate = &self.candidates[next];
        info!(provider = candidate.provider.label(), "switched provider");
        self.broadcast(SessionEvent::ProviderSwitched {
            provider: candidate.provider,
        });
        self.current()
    }

    /// Close playback. No-op when already closed; otherwise the `Closed`
    /// event fires exactly once, synchronously with the transition.
    pub fn close(&mut self) {
        if !self.is_open() {
            return;
        }

        self.state = State::Closed;
        self.candidates.clear();
        let media = self.media.take();

        if let Some(media) = media {
            info!(title = %media.title, "playback closed");
            self.broadcast(SessionEvent::Closed { media });
        }
    }

    /// The active candidate, `None` when closed.
    pub fn current(&self) -> Option<&Candidate> {
        match self.state {
            State::Open { index } => self.candidates.get(index),
            State::Closed => None,
        }
    }

    /// The URL the embed surface should be rendering right now.
    pub fn current_url(&self) -> Option<&Url> {
        self.current().map(|c| &c.url)
    }

    pub fn active_provider(&self) -> Option<Provider> {
        self.current().map(|c| c.provider)
    }
}

impl Default for PlaybackSession {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    #[derive(Clone, Default)]
    struct RecordingObserver {
        events: Arc<Mutex<Vec<String>>>,
    }

    impl SessionObserver for RecordingObserver {
        fn on_event(&self, event: &SessionEvent) {
            let tag = match event {
                SessionEvent::Opened { .. } => "opened",
                SessionEvent::ProviderSwitched { .. } => "switched",
                SessionEvent::Closed { .. } => "closed",
            };
            self.events.lock().unwrap().push(tag.to_string());
        }
    }

    fn observed_session() -> (PlaybackSession, Arc<Mutex<Vec<String>>>) {
        let mut session = PlaybackSession::new();
        let observer = RecordingObserver::default();
        let events = observer.events.clone();
        session.register_observer(Box::new(observer));
        (session, events)
    }

    #[test]
    fn test_open_starts_on_first_provider() {
        let mut session = PlaybackSession::new();
        session.open(MediaRef::movie(42, "Movie")).unwrap();

        assert!(session.is_open());
        assert_eq!(session.active_provider(), Some(Provider::ALL[0]));
        assert_eq!(
            session.current_url().unwrap().as_str(),
            "https://embed.su/embed/movie/42"
        );
    }

    #[test]
    fn test_switch_advances_and_wraps() {
        let mut session = PlaybackSession::new();
        session.open(MediaRef::movie(42, "Movie")).unwrap();

        session.switch_provider();
        assert_eq!(
            session.current_url().unwrap().as_str(),
            "https://multiembed.mov/?video_id=42&tmdb=1"
        );

        // Full cycle lands back on the first provider
        for _ in 1..Provider::ALL.len() {
            session.switch_provider();
        }
        assert_eq!(session.active_provider(), Some(Provider::ALL[0]));
    }

    #[test]
    fn test_series_cycle_preserves_episode_context() {
        let mut session = PlaybackSession::new();
        session.open(MediaRef::series(7, "Show", 1, 3)).unwrap();

        for _ in 0..Provider::ALL.len() {
            session.switch_provider();
        }

        assert_eq!(
            session.current_url().unwrap().as_str(),
            "https://embed.su/embed/tv/7/1/3"
        );
        assert_eq!(session.media().unwrap().episode, Some(3));
    }

    #[test]
    fn test_switch_while_closed_is_a_noop() {
        let (mut session, events) = observed_session();
        assert!(session.switch_provider().is_none());
        assert!(events.lock().unwrap().is_empty());
    }

    #[test]
    fn test_reopen_resets_to_first_provider() {
        let mut session = PlaybackSession::new();
        let movie = MediaRef::movie(42, "Movie");

        session.open(movie.clone()).unwrap();
        session.switch_provider();
        session.close();
        assert!(session.current_url().is_none());

        session.open(movie).unwrap();
        assert_eq!(session.active_provider(), Some(Provider::ALL[0]));
    }

    #[test]
    fn test_open_same_item_is_idempotent() {
        let (mut session, events) = observed_session();
        let movie = MediaRef::movie(42, "Movie");

        session.open(movie.clone()).unwrap();
        session.switch_provider();
        session.open(movie).unwrap();

        // No reset, no second Opened event
        assert_eq!(session.active_provider(), Some(Provider::ALL[1]));
        assert_eq!(*events.lock().unwrap(), vec!["opened", "switched"]);
    }

    #[test]
    fn test_open_different_item_closes_the_old_one() {
        let (mut session, events) = observed_session();

        session.open(MediaRef::movie(42, "Movie")).unwrap();
        session.switch_provider();
        session.open(MediaRef::movie(43, "Other")).unwrap();

        assert_eq!(session.media().unwrap().id, 43);
        assert_eq!(session.active_provider(), Some(Provider::ALL[0]));
        assert_eq!(
            *events.lock().unwrap(),
            vec!["opened", "switched", "closed", "opened"]
        );
    }

    #[test]
    fn test_invalid_series_reference_leaves_session_closed() {
        let (mut session, events) = observed_session();
        let mut media = MediaRef::series(7, "Show", 1, 1);
        media.episode = None;

        assert!(matches!(
            session.open(media),
            Err(ProviderError::InvalidReference(_))
        ));
        assert!(!session.is_open());
        assert!(session.current_url().is_none());
        assert!(events.lock().unwrap().is_empty());
    }

    #[test]
    fn test_close_fires_exactly_once() {
        let (mut session, events) = observed_session();

        session.open(MediaRef::movie(42, "Movie")).unwrap();
        session.close();
        session.close();
        session.close();

        let closed = events
            .lock()
            .unwrap()
            .iter()
            .filter(|e| *e == "closed")
            .count();
        assert_eq!(closed, 1);
    }
}
