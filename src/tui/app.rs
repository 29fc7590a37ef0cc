use crate::details::FetchedDetails;
use crate::media::MediaRef;
use crate::tmdb::SearchResult;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum View {
    /// Browse page with content rows (trending, popular)
    Browse,
    /// Search input
    Search,
    /// Search results list
    SearchResults,
    /// Saved items
    Watchlist,
    /// "More info" page for one item
    Detail,
    /// Playback open in the external surface
    Player,
}

/// One horizontal row on the browse page
#[derive(Debug, Clone)]
pub struct BrowseRow {
    pub title: String,
    pub items: Vec<SearchResult>,
}

pub struct App {
    pub view: View,
    pub should_quit: bool,

    // Browse
    pub browse_rows: Vec<BrowseRow>,
    pub selected_row_index: usize,
    pub selected_item_index: usize,
    pub is_loading_browse: bool,
    pub browse_error: Option<String>,

    // Search
    pub search_input: String,
    pub is_searching: bool,
    pub search_error: Option<String>,
    pub search_id: u64, // Incremented for each search to ignore stale results
    pub search_results: Vec<SearchResult>,
    pub selected_search_index: usize,

    // Watchlist view
    pub selected_watchlist_index: usize,

    // Detail ("more info")
    pub detail_media: Option<MediaRef>,
    pub detail_generation: u64, // Incremented per detail view open, stale fetches are dropped
    pub is_fetching_details: bool,
    pub details: Option<FetchedDetails>,
    pub detail_return_view: View,

    // Player
    pub player_return_view: View,
    pub player_error: Option<String>,

    // One-line feedback after an action ("Added to watchlist", ...)
    pub status_message: Option<String>,
}

impl App {
    pub fn new() -> Self {
        Self {
            view: View::Browse,
            should_quit: false,
            browse_rows: Vec::new(),
            selected_row_index: 0,
            selected_item_index: 0,
            is_loading_browse: true,
            browse_error: None,
            search_input: String::new(),
            is_searching: false,
            search_error: None,
            search_id: 0,
            search_results: Vec::new(),
            selected_search_index: 0,
            selected_watchlist_index: 0,
            detail_media: None,
            detail_generation: 0,
            is_fetching_details: false,
            details: None,
            detail_return_view: View::Browse,
            player_return_view: View::Browse,
            player_error: None,
            status_message: None,
        }
    }

    // Browse navigation helpers
    pub fn select_next_row(&mut self) {
        if !self.browse_rows.is_empty() {
            self.selected_row_index = (self.selected_row_index + 1).min(self.browse_rows.len() - 1);
            self.selected_item_index = 0;
        }
    }

    pub fn select_previous_row(&mut self) {
        if self.selected_row_index > 0 {
            self.selected_row_index -= 1;
            self.selected_item_index = 0;
        }
    }

    pub fn select_next_item(&mut self) {
        if let Some(row) = self.browse_rows.get(self.selected_row_index)
            && !row.items.is_empty()
        {
            self.selected_item_index = (self.selected_item_index + 1).min(row.items.len() - 1);
        }
    }

    pub fn select_previous_item(&mut self) {
        if self.selected_item_index > 0 {
            self.selected_item_index -= 1;
        }
    }

    pub fn selected_browse_item(&self) -> Option<&SearchResult> {
        self.browse_rows
            .get(self.selected_row_index)
            .and_then(|row| row.items.get(self.selected_item_index))
    }

    // Search results navigation
    pub fn select_next_result(&mut self) {
        if !self.search_results.is_empty() {
            self.selected_search_index =
                (self.selected_search_index + 1).min(self.search_results.len() - 1);
        }
    }

    pub fn select_previous_result(&mut self) {
        if self.selected_search_index > 0 {
            self.selected_search_index -= 1;
        }
    }

    pub fn selected_search_result(&self) -> Option<&SearchResult> {
        self.search_results.get(self.selected_search_index)
    }

    /// The item the current view's cursor is on, as a playback reference.
    /// The watchlist view resolves through the store instead, which owns its
    /// own ordering.
    pub fn selected_media(&self) -> Option<MediaRef> {
        match self.view {
            View::Browse => self.selected_browse_item().map(|r| r.media_ref()),
            View::SearchResults => self.selected_search_result().map(|r| r.media_ref()),
            View::Detail => self.detail_media.clone(),
            _ => None,
        }
    }

    /// Open the detail view for an item, resetting any previous detail
    /// state. Returns the generation the caller should tag the fetch with.
    pub fn open_detail(&mut self, media: MediaRef, return_view: View) -> u64 {
        self.detail_generation += 1;
        self.detail_media = Some(media);
        self.details = None;
        self.is_fetching_details = true;
        self.detail_return_view = return_view;
        self.view = View::Detail;
        self.detail_generation
    }

    pub fn close_detail(&mut self) {
        self.detail_media = None;
        self.details = None;
        self.is_fetching_details = false;
        self.view = self.detail_return_view;
    }

    pub fn set_status(&mut self, message: impl Into<String>) {
        self.status_message = Some(message.into());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(titles: &[&str]) -> BrowseRow {
        BrowseRow {
            title: "Row".to_string(),
            items: titles
                .iter()
                .enumerate()
                .map(|(i, t)| SearchResult {
                    id: i as u64 + 1,
                    title: Some(t.to_string()),
                    name: None,
                    overview: None,
                    release_date: None,
                    first_air_date: None,
                    vote_average: None,
                    poster_path: None,
                    backdrop_path: None,
                    media_type: Some("movie".to_string()),
                })
                .collect(),
        }
    }

    #[test]
    fn test_browse_navigation_stays_in_bounds() {
        let mut app = App::new();
        app.browse_rows = vec![row(&["a", "b"]), row(&["c"])];

        app.select_previous_item();
        assert_eq!(app.selected_item_index, 0);

        app.select_next_item();
        app.select_next_item();
        app.select_next_item();
        assert_eq!(app.selected_item_index, 1);

        app.select_next_row();
        assert_eq!(app.selected_row_index, 1);
        // Moving rows resets the column
        assert_eq!(app.selected_item_index, 0);

        app.select_next_row();
        assert_eq!(app.selected_row_index, 1);
    }

    #[test]
    fn test_open_detail_bumps_generation() {
        let mut app = App::new();
        let first = app.open_detail(MediaRef::movie(1, "One"), View::Browse);
        app.close_detail();
        let second = app.open_detail(MediaRef::movie(2, "Two"), View::Browse);

        assert!(second > first);
        assert_eq!(app.view, View::Detail);
        assert!(app.is_fetching_details);
    }

    #[test]
    fn test_close_detail_returns_to_origin_view() {
        let mut app = App::new();
        app.open_detail(MediaRef::movie(1, "One"), View::SearchResults);
        app.close_detail();
        assert_eq!(app.view, View::SearchResults);
        assert!(app.detail_media.is_none());
    }
}
