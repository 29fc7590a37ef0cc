mod app;
mod ui;

pub use app::{App, BrowseRow, View};

use std::io;
use std::sync::Arc;
use std::time::Duration;

use crossterm::{
    event::{self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};
use tokio::sync::mpsc;
use tracing::{debug, error, info};

use crate::config::Config;
use crate::details::{DetailFetch, DetailsUpdate};
use crate::embed;
use crate::media::{MediaKind, MediaRef};
use crate::session::{PlaybackSession, SessionEvent, SessionObserver};
use crate::tmdb::{SearchResult, TmdbClient};
use crate::watchlist::{Watchlist, WatchlistEvent, WatchlistObserver};

/// Messages sent from background tasks to the UI
pub enum UiMessage {
    BrowseLoaded(Vec<BrowseRow>),
    BrowseError(String),
    SearchComplete { id: u64, results: Vec<SearchResult> },
    SearchError(String),
}

/// Logs core transitions; stands where surrounding views hook in their own
/// bookkeeping (pausing a carousel and the like).
struct TransitionLogger;

impl SessionObserver for TransitionLogger {
    fn on_event(&self, event: &SessionEvent) {
        match event {
            SessionEvent::Opened { media, provider } => {
                info!(title = %media.display_title(), provider = provider.label(), "playback opened");
            }
            SessionEvent::ProviderSwitched { provider } => {
                info!(provider = provider.label(), "playback provider switched");
            }
            SessionEvent::Closed { media } => {
                info!(title = %media.display_title(), "playback closed");
            }
        }
    }
}

impl WatchlistObserver for TransitionLogger {
    fn on_event(&self, event: &WatchlistEvent) {
        match event {
            WatchlistEvent::Added { media } => {
                debug!(id = media.id, "watchlist entry added");
            }
            WatchlistEvent::Removed { id } => {
                debug!(id, "watchlist entry removed");
            }
        }
    }
}

fn restore_terminal() {
    let _ = disable_raw_mode();
    let _ = execute!(io::stdout(), LeaveAlternateScreen, DisableMouseCapture);
}

pub async fn run(config: Config, tmdb: TmdbClient) -> io::Result<()> {
    // Set up panic hook to restore terminal
    let original_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |panic_info| {
        restore_terminal();
        original_hook(panic_info);
    }));

    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    // Core services, one instance each for the whole app lifetime
    let mut app = App::new();
    let mut session = PlaybackSession::new();
    let mut watchlist = Watchlist::load();
    session.register_observer(Box::new(TransitionLogger));
    watchlist.register_observer(Box::new(TransitionLogger));

    let tmdb = Arc::new(tmdb);
    let (tx, mut rx) = mpsc::channel::<UiMessage>(32);
    let (details_tx, mut details_rx) = mpsc::channel::<DetailsUpdate>(8);

    spawn_browse_load(tmdb.clone(), tx.clone());

    let result = run_app(
        &mut terminal,
        &mut app,
        &mut session,
        &mut watchlist,
        &config,
        tmdb,
        tx,
        &mut rx,
        details_tx,
        &mut details_rx,
    )
    .await;

    // Restore terminal
    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;

    result
}

/// Fetch the browse rows in the background and hand them to the UI loop.
fn spawn_browse_load(tmdb: Arc<TmdbClient>, tx: mpsc::Sender<UiMessage>) {
    tokio::spawn(async move {
        let mut rows = Vec::new();
        let mut last_error = None;

        match tmdb.get_trending("all", "week").await {
            Ok(items) if !items.is_empty() => rows.push(BrowseRow {
                title: "Trending This Week".to_string(),
                items,
            }),
            Ok(_) => {}
            Err(e) => {
                error!(error = %e, "failed to fetch trending");
                last_error = Some(e.to_string());
            }
        }

        match tmdb.get_popular_movies().await {
            Ok(items) if !items.is_empty() => rows.push(BrowseRow {
                title: "Popular Movies".to_string(),
                items,
            }),
            Ok(_) => {}
            Err(e) => {
                error!(error = %e, "failed to fetch popular movies");
                last_error = Some(e.to_string());
            }
        }

        match tmdb.get_popular_tv().await {
            Ok(items) if !items.is_empty() => rows.push(BrowseRow {
                title: "Popular Shows".to_string(),
                items,
            }),
            Ok(_) => {}
            Err(e) => {
                error!(error = %e, "failed to fetch popular shows");
                last_error = Some(e.to_string());
            }
        }

        if rows.is_empty() {
            let message = last_error.unwrap_or_else(|| "no content available".to_string());
            let _ = tx.send(UiMessage::BrowseError(message)).await;
        } else {
            info!(rows = rows.len(), "browse content loaded");
            let _ = tx.send(UiMessage::BrowseLoaded(rows)).await;
        }
    });
}

/// Open playback for an item and hand the first provider's URL to the embed
/// surface.
fn open_playback(
    app: &mut App,
    session: &mut PlaybackSession,
    config: &Config,
    media: MediaRef,
    return_view: View,
) {
    match session.open(media) {
        Ok(()) => {
            app.player_error = None;
            if let Some(url) = session.current_url()
                && let Err(e) = embed::open_embed(&config.browser.command, &config.browser.args, url)
            {
                error!(error = %e, "failed to open embed surface");
                app.player_error = Some(e.to_string());
            }
            app.player_return_view = return_view;
            app.view = View::Player;
        }
        Err(e) => {
            error!(error = %e, "refusing to open playback");
            app.set_status(format!("Can't play this item: {}", e));
        }
    }
}

/// Re-render the embed surface after a provider change.
fn reopen_embed(app: &mut App, session: &PlaybackSession, config: &Config) {
    if let Some(url) = session.current_url()
        && let Err(e) = embed::open_embed(&config.browser.command, &config.browser.args, url)
    {
        error!(error = %e, "failed to reopen embed surface");
        app.player_error = Some(e.to_string());
    }
}

/// Flip watchlist membership and surface the post-mutation state to the
/// user. The store notifies its observers before this returns, so the
/// message can never disagree with what other views show.
fn toggle_watchlist(app: &mut App, watchlist: &mut Watchlist, media: MediaRef) {
    let title = media.title.clone();
    if watchlist.toggle(media) {
        app.set_status(format!("Added \"{}\" to watchlist", title));
    } else {
        app.set_status(format!("Removed \"{}\" from watchlist", title));
    }
}

fn open_detail(
    app: &mut App,
    detail_fetch: &mut Option<DetailFetch>,
    tmdb: &Arc<TmdbClient>,
    details_tx: &mpsc::Sender<DetailsUpdate>,
    media: MediaRef,
    return_view: View,
) {
    let generation = app.open_detail(media.clone(), return_view);
    *detail_fetch = Some(DetailFetch::spawn(
        tmdb.clone(),
        &media,
        generation,
        details_tx.clone(),
    ));
}

/// Close the detail view, cancelling its fetch so a late result can't
/// mutate anything.
fn close_detail(app: &mut App, detail_fetch: &mut Option<DetailFetch>) {
    if let Some(fetch) = detail_fetch.take() {
        fetch.cancel();
    }
    app.close_detail();
}

#[allow(clippy::too_many_arguments)]
async fn run_app(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    app: &mut App,
    session: &mut PlaybackSession,
    watchlist: &mut Watchlist,
    config: &Config,
    tmdb: Arc<TmdbClient>,
    tx: mpsc::Sender<UiMessage>,
    rx: &mut mpsc::Receiver<UiMessage>,
    details_tx: mpsc::Sender<DetailsUpdate>,
    details_rx: &mut mpsc::Receiver<DetailsUpdate>,
) -> io::Result<()> {
    // The fetch feeding the open detail view, if any
    let mut detail_fetch: Option<DetailFetch> = None;

    loop {
        // Draw UI
        terminal.draw(|f| ui::draw(f, app, session, watchlist))?;

        // Handle messages from background tasks
        while let Ok(msg) = rx.try_recv() {
            match msg {
                UiMessage::BrowseLoaded(rows) => {
                    app.is_loading_browse = false;
                    app.browse_error = None;
                    app.browse_rows = rows;
                    app.selected_row_index = 0;
                    app.selected_item_index = 0;
                }
                UiMessage::BrowseError(e) => {
                    app.is_loading_browse = false;
                    app.browse_error = Some(e);
                }
                UiMessage::SearchComplete { id, results } => {
                    if id != app.search_id {
                        debug!(id, "dropping stale search results");
                        continue;
                    }
                    app.is_searching = false;
                    app.search_results = results;
                    app.selected_search_index = 0;
                    if app.search_results.is_empty() {
                        app.search_error = Some("No results found".to_string());
                    } else {
                        app.search_error = None;
                        app.view = View::SearchResults;
                    }
                }
                UiMessage::SearchError(e) => {
                    app.is_searching = false;
                    app.search_error = Some(e);
                }
            }
        }

        // Detail fetch results; anything from a cancelled or stale fetch is
        // dropped on the floor
        while let Ok(update) = details_rx.try_recv() {
            let accepted = detail_fetch.as_ref().is_some_and(|f| f.accepts(&update));
            if accepted {
                app.is_fetching_details = false;
                app.details = update.details;
                detail_fetch = None;
            } else {
                debug!(media_id = update.media_id, "discarding stale detail result");
            }
        }

        // Handle input with timeout
        if event::poll(Duration::from_millis(100))? {
            if let Event::Key(key) = event::read()? {
                // Global quit
                if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
                    app.should_quit = true;
                }

                match app.view {
                    View::Browse => match key.code {
                        KeyCode::Char('q') | KeyCode::Esc => {
                            app.should_quit = true;
                        }
                        KeyCode::Char('/') => {
                            app.view = View::Search;
                            app.search_input.clear();
                            app.search_error = None;
                        }
                        KeyCode::Char('W') => {
                            app.selected_watchlist_index = 0;
                            app.view = View::Watchlist;
                        }
                        KeyCode::Char('r') if !app.is_loading_browse => {
                            app.is_loading_browse = true;
                            app.browse_error = None;
                            spawn_browse_load(tmdb.clone(), tx.clone());
                        }
                        KeyCode::Up | KeyCode::Char('k') => app.select_previous_row(),
                        KeyCode::Down | KeyCode::Char('j') => app.select_next_row(),
                        KeyCode::Left | KeyCode::Char('h') => app.select_previous_item(),
                        KeyCode::Right | KeyCode::Char('l') => app.select_next_item(),
                        KeyCode::Enter => {
                            if let Some(media) = app.selected_media() {
                                open_playback(app, session, config, media, View::Browse);
                            }
                        }
                        KeyCode::Char('i') => {
                            if let Some(media) = app.selected_media() {
                                open_detail(
                                    app,
                                    &mut detail_fetch,
                                    &tmdb,
                                    &details_tx,
                                    media,
                                    View::Browse,
                                );
                            }
                        }
                        KeyCode::Char('w') => {
                            if let Some(media) = app.selected_media() {
                                toggle_watchlist(app, watchlist, media);
                            }
                        }
                        _ => {}
                    },

                    View::Search => match key.code {
                        KeyCode::Esc | KeyCode::Char('q') if app.search_input.is_empty() => {
                            app.view = View::Browse;
                        }
                        KeyCode::Esc => {
                            app.search_input.clear();
                        }
                        KeyCode::Enter if !app.search_input.is_empty() && !app.is_searching => {
                            info!(query = %app.search_input, "starting search");
                            app.is_searching = true;
                            app.search_error = None;
                            app.search_id += 1;

                            let id = app.search_id;
                            let query = app.search_input.clone();
                            let tmdb = tmdb.clone();
                            let tx = tx.clone();
                            tokio::spawn(async move {
                                match tmdb.search_multi(&query).await {
                                    Ok(results) => {
                                        let _ = tx
                                            .send(UiMessage::SearchComplete { id, results })
                                            .await;
                                    }
                                    Err(e) => {
                                        error!(error = %e, "search failed");
                                        let _ =
                                            tx.send(UiMessage::SearchError(e.to_string())).await;
                                    }
                                }
                            });
                        }
                        KeyCode::Char(c) if !app.is_searching => {
                            app.search_input.push(c);
                        }
                        KeyCode::Backspace if !app.is_searching => {
                            app.search_input.pop();
                        }
                        _ => {}
                    },

                    View::SearchResults => match key.code {
                        KeyCode::Char('q') | KeyCode::Esc => {
                            app.view = View::Search;
                        }
                        KeyCode::Char('/') => {
                            app.view = View::Search;
                            app.search_input.clear();
                        }
                        KeyCode::Char('W') => {
                            app.selected_watchlist_index = 0;
                            app.view = View::Watchlist;
                        }
                        KeyCode::Up | KeyCode::Char('k') => app.select_previous_result(),
                        KeyCode::Down | KeyCode::Char('j') => app.select_next_result(),
                        KeyCode::Enter => {
                            if let Some(media) = app.selected_media() {
                                open_playback(app, session, config, media, View::SearchResults);
                            }
                        }
                        KeyCode::Char('i') => {
                            if let Some(media) = app.selected_media() {
                                open_detail(
                                    app,
                                    &mut detail_fetch,
                                    &tmdb,
                                    &details_tx,
                                    media,
                                    View::SearchResults,
                                );
                            }
                        }
                        KeyCode::Char('w') => {
                            if let Some(media) = app.selected_media() {
                                toggle_watchlist(app, watchlist, media);
                            }
                        }
                        _ => {}
                    },

                    View::Watchlist => match key.code {
                        KeyCode::Char('q') | KeyCode::Esc => {
                            app.view = View::Browse;
                        }
                        KeyCode::Up | KeyCode::Char('k') => {
                            if app.selected_watchlist_index > 0 {
                                app.selected_watchlist_index -= 1;
                            }
                        }
                        KeyCode::Down | KeyCode::Char('j') => {
                            if !watchlist.is_empty() {
                                app.selected_watchlist_index =
                                    (app.selected_watchlist_index + 1).min(watchlist.len() - 1);
                            }
                        }
                        KeyCode::Enter => {
                            let media = watchlist
                                .entries()
                                .get(app.selected_watchlist_index)
                                .cloned();
                            if let Some(media) = media {
                                open_playback(app, session, config, media, View::Watchlist);
                            }
                        }
                        KeyCode::Char('i') => {
                            let media = watchlist
                                .entries()
                                .get(app.selected_watchlist_index)
                                .cloned();
                            if let Some(media) = media {
                                open_detail(
                                    app,
                                    &mut detail_fetch,
                                    &tmdb,
                                    &details_tx,
                                    media,
                                    View::Watchlist,
                                );
                            }
                        }
                        KeyCode::Char('w') | KeyCode::Delete => {
                            let media = watchlist
                                .entries()
                                .get(app.selected_watchlist_index)
                                .cloned();
                            if let Some(media) = media {
                                toggle_watchlist(app, watchlist, media);
                                // Keep the cursor on the list
                                if app.selected_watchlist_index >= watchlist.len() {
                                    app.selected_watchlist_index =
                                        watchlist.len().saturating_sub(1);
                                }
                            }
                        }
                        _ => {}
                    },

                    View::Detail => match key.code {
                        KeyCode::Char('q') | KeyCode::Esc => {
                            close_detail(app, &mut detail_fetch);
                        }
                        KeyCode::Enter | KeyCode::Char('p') => {
                            if let Some(media) = app.detail_media.clone() {
                                let return_view = app.detail_return_view;
                                close_detail(app, &mut detail_fetch);
                                open_playback(app, session, config, media, return_view);
                            }
                        }
                        KeyCode::Char('w') => {
                            if let Some(media) = app.detail_media.clone() {
                                toggle_watchlist(app, watchlist, media);
                            }
                        }
                        KeyCode::Char('t') => {
                            let key = app
                                .details
                                .as_ref()
                                .and_then(|d| d.trailer_key.clone());
                            if let Some(key) = key {
                                let url = crate::tmdb::trailer_embed_url(&key);
                                match url::Url::parse(&url) {
                                    Ok(url) => {
                                        if let Err(e) = embed::open_embed(
                                            &config.browser.command,
                                            &config.browser.args,
                                            &url,
                                        ) {
                                            app.set_status(format!("Can't open trailer: {}", e));
                                        }
                                    }
                                    Err(e) => {
                                        error!(error = %e, "bad trailer URL");
                                    }
                                }
                            } else {
                                app.set_status("No trailer available");
                            }
                        }
                        _ => {}
                    },

                    View::Player => match key.code {
                        KeyCode::Char('q') | KeyCode::Esc => {
                            session.close();
                            app.view = app.player_return_view;
                        }
                        KeyCode::Char('s') => {
                            if session.switch_provider().is_some() {
                                reopen_embed(app, session, config);
                            }
                        }
                        KeyCode::Char('n') => {
                            // Only meaningful for series; movies have no successor
                            let next = session
                                .media()
                                .filter(|m| m.kind == MediaKind::Series)
                                .and_then(|m| m.next_episode());
                            if let Some(next) = next {
                                let label = next.display_title();
                                match session.open(next) {
                                    Ok(()) => {
                                        reopen_embed(app, session, config);
                                        app.set_status(format!("Now playing {}", label));
                                    }
                                    Err(e) => {
                                        error!(error = %e, "failed to open next episode");
                                        app.set_status(format!("Can't play next episode: {}", e));
                                    }
                                }
                            }
                        }
                        KeyCode::Char('w') => {
                            if let Some(media) = session.media().cloned() {
                                toggle_watchlist(app, watchlist, media);
                            }
                        }
                        _ => {}
                    },
                }
            }
        }

        if app.should_quit {
            session.close();
            break;
        }
    }

    Ok(())
}
