use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem, Paragraph, Wrap},
    Frame,
};
use unicode_truncate::UnicodeTruncateStr;

use crate::session::PlaybackSession;
use crate::tmdb::SearchResult;
use crate::watchlist::Watchlist;

use super::app::{App, View};

pub fn draw(frame: &mut Frame, app: &App, session: &PlaybackSession, watchlist: &Watchlist) {
    match app.view {
        View::Browse => draw_browse(frame, app, watchlist),
        View::Search => draw_search(frame, app),
        View::SearchResults => draw_search_results(frame, app, watchlist),
        View::Watchlist => draw_watchlist(frame, app, watchlist),
        View::Detail => draw_detail(frame, app, watchlist),
        View::Player => draw_player(frame, app, session, watchlist),
    }
}

fn base_layout(frame: &Frame) -> std::rc::Rc<[Rect]> {
    Layout::default()
        .direction(Direction::Vertical)
        .margin(1)
        .constraints([
            Constraint::Length(2), // Title
            Constraint::Min(0),    // Content
            Constraint::Length(2), // Status + help
        ])
        .split(frame.area())
}

fn draw_title(frame: &mut Frame, area: Rect, subtitle: &str) {
    let title = Line::from(vec![
        Span::styled(
            "flickstream",
            Style::default()
                .fg(Color::Cyan)
                .add_modifier(Modifier::BOLD),
        ),
        Span::styled(format!("  {}", subtitle), Style::default().fg(Color::DarkGray)),
    ]);
    frame.render_widget(
        Paragraph::new(title).block(Block::default().borders(Borders::BOTTOM)),
        area,
    );
}

fn draw_footer(frame: &mut Frame, area: Rect, app: &App, help: &str) {
    let mut lines = Vec::new();
    if let Some(status) = &app.status_message {
        lines.push(Line::from(Span::styled(
            status.clone(),
            Style::default().fg(Color::Yellow),
        )));
    } else {
        lines.push(Line::from(""));
    }
    lines.push(Line::from(Span::styled(
        help.to_string(),
        Style::default().fg(Color::DarkGray),
    )));
    frame.render_widget(Paragraph::new(lines), area);
}

fn item_label(item: &SearchResult, watchlist: &Watchlist) -> String {
    let marker = if watchlist.contains(item.id) { "+" } else { " " };
    let year = item
        .year()
        .map(|y| format!(" ({})", y))
        .unwrap_or_default();
    format!("{}{}{}", marker, item.display_title(), year)
}

fn draw_browse(frame: &mut Frame, app: &App, watchlist: &Watchlist) {
    let chunks = base_layout(frame);
    draw_title(frame, chunks[0], "browse");

    if app.is_loading_browse {
        let loading = Paragraph::new("Loading content...")
            .style(Style::default().fg(Color::Yellow))
            .block(Block::default().borders(Borders::ALL));
        frame.render_widget(loading, chunks[1]);
    } else if let Some(error) = &app.browse_error {
        let error = Paragraph::new(format!("Failed to load content: {}", error))
            .style(Style::default().fg(Color::Red))
            .wrap(Wrap { trim: true })
            .block(Block::default().borders(Borders::ALL));
        frame.render_widget(error, chunks[1]);
    } else {
        let width = chunks[1].width.saturating_sub(4) as usize;
        let mut lines = Vec::new();

        for (row_index, row) in app.browse_rows.iter().enumerate() {
            let is_current_row = row_index == app.selected_row_index;
            lines.push(Line::from(Span::styled(
                row.title.clone(),
                if is_current_row {
                    Style::default()
                        .fg(Color::Yellow)
                        .add_modifier(Modifier::BOLD)
                } else {
                    Style::default().add_modifier(Modifier::BOLD)
                },
            )));

            // One line of cards per row, scrolled so the cursor stays visible
            let start = if is_current_row {
                app.selected_item_index.saturating_sub(2)
            } else {
                0
            };
            let mut spans = Vec::new();
            let mut used = 0usize;
            for (item_index, item) in row.items.iter().enumerate().skip(start) {
                let label = item_label(item, watchlist);
                let (truncated, cell_width) = label.unicode_truncate(28);
                if used + cell_width + 3 > width {
                    break;
                }
                used += cell_width + 3;

                let style = if is_current_row && item_index == app.selected_item_index {
                    Style::default().fg(Color::Black).bg(Color::Cyan)
                } else {
                    Style::default()
                };
                spans.push(Span::styled(format!(" {} ", truncated), style));
                spans.push(Span::raw(" "));
            }
            lines.push(Line::from(spans));
            lines.push(Line::from(""));
        }

        let content =
            Paragraph::new(lines).block(Block::default().borders(Borders::ALL).title("Browse"));
        frame.render_widget(content, chunks[1]);
    }

    draw_footer(
        frame,
        chunks[2],
        app,
        "Enter: play | i: info | w: watchlist | W: saved | /: search | r: reload | q: quit",
    );
}

fn draw_search(frame: &mut Frame, app: &App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .margin(1)
        .constraints([
            Constraint::Length(2), // Title
            Constraint::Length(3), // Input
            Constraint::Min(0),    // Hint / error
            Constraint::Length(2), // Help
        ])
        .split(frame.area());

    draw_title(frame, chunks[0], "search");

    let input = Paragraph::new(format!("{}▌", app.search_input))
        .block(Block::default().borders(Borders::ALL).title("Search"));
    frame.render_widget(input, chunks[1]);

    let hint = if app.is_searching {
        Line::from(Span::styled(
            "Searching...",
            Style::default().fg(Color::Yellow),
        ))
    } else if let Some(error) = &app.search_error {
        Line::from(Span::styled(error.clone(), Style::default().fg(Color::Red)))
    } else {
        Line::from(Span::styled(
            "Type a movie or show name and press Enter",
            Style::default().fg(Color::DarkGray),
        ))
    };
    frame.render_widget(Paragraph::new(hint), chunks[2]);

    draw_footer(frame, chunks[3], app, "Enter: search | Esc: back");
}

fn draw_search_results(frame: &mut Frame, app: &App, watchlist: &Watchlist) {
    let chunks = base_layout(frame);
    draw_title(frame, chunks[0], "results");

    let items: Vec<ListItem> = app
        .search_results
        .iter()
        .enumerate()
        .map(|(index, result)| {
            let kind = result.kind().label();
            let label = format!("{}  [{}]", item_label(result, watchlist), kind);
            let style = if index == app.selected_search_index {
                Style::default().fg(Color::Black).bg(Color::Cyan)
            } else {
                Style::default()
            };
            ListItem::new(label).style(style)
        })
        .collect();

    let list = List::new(items).block(
        Block::default()
            .borders(Borders::ALL)
            .title(format!("Results for \"{}\"", app.search_input)),
    );
    frame.render_widget(list, chunks[1]);

    draw_footer(
        frame,
        chunks[2],
        app,
        "Enter: play | i: info | w: watchlist | /: new search | Esc: back",
    );
}

fn draw_watchlist(frame: &mut Frame, app: &App, watchlist: &Watchlist) {
    let chunks = base_layout(frame);
    draw_title(frame, chunks[0], "watchlist");

    if watchlist.is_empty() {
        let empty = Paragraph::new("Nothing saved yet. Press 'w' on any item to add it.")
            .style(Style::default().fg(Color::DarkGray))
            .block(Block::default().borders(Borders::ALL).title("Watchlist"));
        frame.render_widget(empty, chunks[1]);
    } else {
        let items: Vec<ListItem> = watchlist
            .entries()
            .iter()
            .enumerate()
            .map(|(index, media)| {
                let label = format!("{}  [{}]", media.display_title(), media.kind.label());
                let style = if index == app.selected_watchlist_index {
                    Style::default().fg(Color::Black).bg(Color::Cyan)
                } else {
                    Style::default()
                };
                ListItem::new(label).style(style)
            })
            .collect();

        let list = List::new(items).block(
            Block::default()
                .borders(Borders::ALL)
                .title(format!("Watchlist ({})", watchlist.len())),
        );
        frame.render_widget(list, chunks[1]);
    }

    draw_footer(
        frame,
        chunks[2],
        app,
        "Enter: play | i: info | w: remove | Esc: back",
    );
}

fn draw_detail(frame: &mut Frame, app: &App, watchlist: &Watchlist) {
    let chunks = base_layout(frame);
    draw_title(frame, chunks[0], "more info");

    let Some(media) = &app.detail_media else {
        return;
    };

    let mut lines = vec![
        Line::from(Span::styled(
            media.display_title(),
            Style::default().add_modifier(Modifier::BOLD),
        )),
        Line::from(""),
    ];

    // Prefer the freshly fetched overview, fall back to what the list row
    // already had
    let overview = app
        .details
        .as_ref()
        .and_then(|d| d.overview.clone())
        .or_else(|| media.overview.clone());
    match overview {
        Some(text) if !text.is_empty() => {
            lines.push(Line::from(text));
        }
        _ => lines.push(Line::from(Span::styled(
            "No overview available.",
            Style::default().fg(Color::DarkGray),
        ))),
    }
    lines.push(Line::from(""));

    if app.is_fetching_details {
        lines.push(Line::from(Span::styled(
            "Loading details...",
            Style::default().fg(Color::Yellow),
        )));
    } else {
        let trailer = app.details.as_ref().and_then(|d| d.trailer_key.as_deref());
        match trailer {
            Some(_) => lines.push(Line::from(Span::styled(
                "Trailer available - press t to watch",
                Style::default().fg(Color::Green),
            ))),
            None => lines.push(Line::from(Span::styled(
                "No trailer available",
                Style::default().fg(Color::DarkGray),
            ))),
        }
    }

    if let Some(poster) = media.poster_url("w500") {
        lines.push(Line::from(Span::styled(
            format!("Poster: {}", poster),
            Style::default().fg(Color::DarkGray),
        )));
    }

    lines.push(Line::from(""));
    if watchlist.contains(media.id) {
        lines.push(Line::from(Span::styled(
            "✓ In your watchlist",
            Style::default().fg(Color::Green),
        )));
    }

    let content = Paragraph::new(lines)
        .wrap(Wrap { trim: true })
        .block(Block::default().borders(Borders::ALL).title("Details"));
    frame.render_widget(content, chunks[1]);

    draw_footer(
        frame,
        chunks[2],
        app,
        "Enter: play | t: trailer | w: watchlist | Esc: back",
    );
}

fn draw_player(frame: &mut Frame, app: &App, session: &PlaybackSession, watchlist: &Watchlist) {
    let chunks = base_layout(frame);
    draw_title(frame, chunks[0], "now playing");

    let mut lines = Vec::new();

    if let Some(media) = session.media() {
        lines.push(Line::from(vec![
            Span::raw("Now playing: "),
            Span::styled(
                media.display_title(),
                Style::default().add_modifier(Modifier::BOLD),
            ),
        ]));
        lines.push(Line::from(""));

        if let Some(candidate) = session.current() {
            lines.push(Line::from(vec![
                Span::raw("Provider: "),
                Span::styled(
                    candidate.provider.label(),
                    Style::default().fg(Color::Cyan),
                ),
            ]));
            lines.push(Line::from(Span::styled(
                candidate.url.to_string(),
                Style::default().fg(Color::DarkGray),
            )));
        }

        lines.push(Line::from(""));
        lines.push(Line::from(Span::styled(
            "Playback runs in your browser. If this provider doesn't work,",
            Style::default().fg(Color::DarkGray),
        )));
        lines.push(Line::from(Span::styled(
            "press 's' to try the next one.",
            Style::default().fg(Color::DarkGray),
        )));

        if watchlist.contains(media.id) {
            lines.push(Line::from(""));
            lines.push(Line::from(Span::styled(
                "✓ In your watchlist",
                Style::default().fg(Color::Green),
            )));
        }
    }

    if let Some(error) = &app.player_error {
        lines.push(Line::from(""));
        lines.push(Line::from(Span::styled(
            error.clone(),
            Style::default().fg(Color::Red),
        )));
    }

    let content = Paragraph::new(lines)
        .wrap(Wrap { trim: true })
        .block(Block::default().borders(Borders::ALL).title("Player"));
    frame.render_widget(content, chunks[1]);

    let is_series = session
        .media()
        .is_some_and(|m| m.kind == crate::media::MediaKind::Series);
    let help = if is_series {
        "s: switch provider | n: next episode | w: watchlist | Esc: stop"
    } else {
        "s: switch provider | w: watchlist | Esc: stop"
    };
    draw_footer(frame, chunks[2], app, help);
}
