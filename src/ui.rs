//! UI rendering helpers for the terminal user interface.
//!
//! This module contains functions to render the TUI using `ratatui`: a header,
//! the paged artwork carousel, now-playing details with a progress bar, the
//! transport row and a bottom bar.

use ratatui::{
    Frame,
    buffer::Buffer,
    layout::{Alignment, Constraint, Direction, Layout, Margin, Rect},
    style::{Color, Modifier, Style, Stylize},
    text::{Line, Span},
    widgets::{Block, Borders, Gauge, Padding, Paragraph, Widget, Wrap},
};
use std::{collections::BTreeMap, sync::LazyLock, time::Duration};

use crate::app::App;
use crate::artwork::ArtworkWidget;
use crate::audio::{LoopMode, PlaybackInfo};
use crate::config::{ControlsSettings, UiSettings};
use crate::library::Track;

static CONTROLS_MAP: LazyLock<BTreeMap<String, String>> = LazyLock::new(|| {
    let mut map: BTreeMap<String, String> = BTreeMap::new();
    map.insert("h/l".to_string(), "prev/next song".to_string());
    map.insert("space/p".to_string(), "play/pause".to_string());
    // H/L is filled dynamically from config.
    map.insert("f".to_string(), "like".to_string());
    map.insert("r".to_string(), "repeat mode".to_string());
    map.insert("drag".to_string(), "flip covers".to_string());
    map.insert("q".to_string(), "quit".to_string());
    map
});

/// Dimmest a neighbouring card gets, as a fraction of full brightness.
const MIN_CARD_BRIGHTNESS: f32 = 0.35;

/// Screen regions, also used by the event loop for mouse hit-testing.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ScreenLayout {
    pub header: Rect,
    pub carousel: Rect,
    pub details: Rect,
    pub progress: Rect,
    pub times: Rect,
    pub transport: Rect,
    pub bottom_bar: Rect,
    pub help: Rect,
}

impl ScreenLayout {
    /// Split the full terminal `area`.
    pub fn new(area: Rect) -> Self {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(3),
                Constraint::Min(6),
                Constraint::Length(2),
                Constraint::Length(1),
                Constraint::Length(1),
                Constraint::Length(1),
                Constraint::Length(1),
                Constraint::Length(3),
            ])
            .split(area);

        // Leave a margin around the progress bar so its ends stay clickable.
        let progress = chunks[3].inner(Margin {
            horizontal: 2,
            vertical: 0,
        });
        let times = chunks[4].inner(Margin {
            horizontal: 2,
            vertical: 0,
        });

        Self {
            header: chunks[0],
            carousel: chunks[1],
            details: chunks[2],
            progress,
            times,
            transport: chunks[5],
            bottom_bar: chunks[6],
            help: chunks[7],
        }
    }

    /// Fraction of the progress bar under `column`, if the click hit it.
    pub fn seek_fraction(&self, column: u16, row: u16) -> Option<f64> {
        let bar = self.progress;
        if bar.width == 0 || row != bar.y || column < bar.x || column >= bar.x + bar.width {
            return None;
        }
        let span = f64::from(bar.width.saturating_sub(1).max(1));
        Some((f64::from(column - bar.x) / span).clamp(0.0, 1.0))
    }

    pub fn in_carousel(&self, column: u16, row: u16) -> bool {
        let c = self.carousel;
        column >= c.x && column < c.x + c.width && row >= c.y && row < c.y + c.height
    }
}

/// Render the controls help text, incorporating scrub seconds.
fn controls_text(scrub_seconds: u64) -> String {
    // Keep the rendered order stable and human-friendly.
    let order = ["h/l", "space/p", "H/L", "drag", "f", "r", "q"];
    order
        .iter()
        .filter_map(|k| {
            if *k == "H/L" {
                Some(format!("[H/L] scrub -/+{}s", scrub_seconds))
            } else {
                CONTROLS_MAP.get(*k).map(|v| format!("[{}] {}", k, v))
            }
        })
        .collect::<Vec<String>>()
        .join(" | ")
}

/// Format a `Duration` as `MM:SS`.
fn format_mmss(d: Duration) -> String {
    let secs = d.as_secs();
    format!("{:02}:{:02}", secs / 60, secs % 60)
}

/// Filled fraction of the progress bar.
fn progress_ratio(info: &PlaybackInfo) -> f64 {
    match info.duration {
        Some(total) if !total.is_zero() => {
            (info.position.as_secs_f64() / total.as_secs_f64()).clamp(0.0, 1.0)
        }
        _ => 0.0,
    }
}

fn loop_label(mode: LoopMode) -> &'static str {
    match mode {
        LoopMode::NoLoop => "repeat off",
        LoopMode::LoopAll => "repeat all",
        LoopMode::LoopOne => "repeat one",
    }
}

/// Pages intersecting the viewport, with their left edge relative to it.
fn visible_pages(offset: f64, width: f64, count: usize) -> Vec<(usize, i32)> {
    if count == 0 || width <= 0.0 {
        return Vec::new();
    }
    let first = (offset / width).floor().max(0.0) as usize;
    let w = width.round() as i32;
    (first..=first + 1)
        .filter(|&i| i < count)
        .map(|i| (i, (i as f64 * width - offset).round() as i32))
        .filter(|&(_, left)| left > -w && left < w)
        .collect()
}

/// Cards fade as they move away from the centre of the viewport.
fn card_brightness(left: i32, width: f64) -> f32 {
    if width <= 0.0 {
        return 1.0;
    }
    let distance = (f64::from(left).abs() / width).min(1.0) as f32;
    1.0 - (1.0 - MIN_CARD_BRIGHTNESS) * distance
}

fn accent(ui: &UiSettings) -> Color {
    ui.accent_color.parse().unwrap_or(Color::Yellow)
}

/// Render one page into its own buffer so it can be clipped while it slides.
fn render_page(app: &mut App, index: usize, page: Rect, brightness: f32) -> Buffer {
    let mut buf = Buffer::empty(page);
    let Some(track) = app.tracks.get(index) else {
        return buf;
    };

    // Terminal cells are about twice as tall as wide.
    let rows = page.height;
    let cols = page.width.saturating_sub(4).min(rows.saturating_mul(2));
    let card = Rect {
        x: page.x + (page.width.saturating_sub(cols)) / 2,
        y: page.y,
        width: cols,
        height: rows,
    };

    match app.artwork.get_or_load(track.id, track.artwork.as_deref(), cols, rows) {
        Some(pixels) => ArtworkWidget::new(pixels)
            .brightness(brightness)
            .render(card, &mut buf),
        None => placeholder_card(track, brightness).render(card, &mut buf),
    }
    buf
}

fn placeholder_card(track: &Track, brightness: f32) -> Paragraph<'_> {
    let shade = (255.0 * brightness) as u8;
    let fg = Color::Rgb(shade, shade, shade);
    Paragraph::new(vec![
        Line::from(""),
        Line::from("♪").bold(),
        Line::from(""),
        Line::from(track.title.as_str()),
    ])
    .alignment(Alignment::Center)
    .wrap(Wrap { trim: true })
    .style(Style::default().fg(fg))
    .block(Block::default().borders(Borders::ALL).border_style(Style::default().fg(fg)))
}

fn draw_carousel(frame: &mut Frame, app: &mut App, area: Rect) {
    if area.width == 0 || area.height == 0 {
        return;
    }
    let width = app.carousel.viewport_width();
    let offset = app.carousel.offset();

    for (index, left) in visible_pages(offset, width, app.tracks.len()) {
        let page = Rect::new(0, 0, area.width, area.height);
        let tile = render_page(app, index, page, card_brightness(left, width));

        let out = frame.buffer_mut();
        for row in 0..area.height {
            for col in 0..area.width {
                let x = left + i32::from(col);
                if x < 0 || x >= i32::from(area.width) {
                    continue;
                }
                out[(area.x + x as u16, area.y + row)] = tile[(col, row)].clone();
            }
        }
    }
}

fn draw_details(frame: &mut Frame, app: &App, area: Rect) {
    let lines = match app.current_track() {
        Some(track) => vec![
            Line::from(track.title.as_str()).bold(),
            Line::from(track.artist.as_str()).fg(Color::Gray),
        ],
        None => vec![Line::from("No tracks").italic()],
    };
    frame.render_widget(Paragraph::new(lines).alignment(Alignment::Center), area);
}

fn draw_progress(frame: &mut Frame, app: &App, layout: &ScreenLayout, accent: Color) {
    let info = app.playback();
    let gauge = Gauge::default()
        .gauge_style(Style::default().fg(accent).bg(Color::DarkGray))
        .ratio(progress_ratio(info))
        .label("");
    frame.render_widget(gauge, layout.progress);

    let halves = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
        .split(layout.times);
    let elapsed = format_mmss(info.position);
    let total = format_mmss(info.duration.unwrap_or_default());
    frame.render_widget(Paragraph::new(elapsed).alignment(Alignment::Left), halves[0]);
    frame.render_widget(Paragraph::new(total).alignment(Alignment::Right), halves[1]);
}

fn draw_transport(frame: &mut Frame, app: &App, area: Rect, accent: Color) {
    let main = if app.transport_state().is_active() {
        "⏸"
    } else {
        "▶"
    };
    let line = Line::from(vec![
        Span::raw("⏮"),
        Span::raw("     "),
        Span::styled(main, Style::default().fg(accent).add_modifier(Modifier::BOLD)),
        Span::raw("     "),
        Span::raw("⏭"),
        Span::raw(format!("   {}", app.transport_state().label())).dim(),
    ]);
    frame.render_widget(Paragraph::new(line).alignment(Alignment::Center), area);
}

fn draw_bottom_bar(frame: &mut Frame, app: &App, area: Rect, accent: Color) {
    let liked = app.current_track().is_some_and(|t| app.is_liked(t.id));
    let heart = if liked {
        Span::styled("♥ like", Style::default().fg(Color::Red))
    } else {
        Span::raw("♡ like")
    };
    let repeat_style = if app.loop_mode == LoopMode::NoLoop {
        Style::default()
    } else {
        Style::default().fg(accent)
    };

    let line = Line::from(vec![
        heart,
        Span::raw("    "),
        Span::styled(format!("⟳ {}", loop_label(app.loop_mode)), repeat_style),
        Span::raw("    "),
        Span::raw("↗ share").dim(),
        Span::raw("    "),
        Span::raw("… more").dim(),
    ]);
    frame.render_widget(Paragraph::new(line).alignment(Alignment::Center), area);
}

/// Render the entire UI into the provided `frame` using `app` state and settings.
///
/// Returns the layout used, for mouse hit-testing.
pub fn draw(
    frame: &mut Frame,
    app: &mut App,
    ui_settings: &UiSettings,
    controls_settings: &ControlsSettings,
) -> ScreenLayout {
    let layout = ScreenLayout::new(frame.area());
    let accent = accent(ui_settings);

    // Header
    let header = Paragraph::new(ui_settings.header_text.as_str())
        .alignment(Alignment::Center)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(" coverflow ")
                .title_alignment(Alignment::Center),
        );
    frame.render_widget(header, layout.header);

    draw_carousel(frame, app, layout.carousel);
    draw_details(frame, app, layout.details);
    draw_progress(frame, app, &layout, accent);
    draw_transport(frame, app, layout.transport, accent);
    draw_bottom_bar(frame, app, layout.bottom_bar, accent);

    let footer = Paragraph::new(controls_text(controls_settings.scrub_seconds))
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(" controls ")
                .padding(Padding {
                    left: 1,
                    right: 0,
                    top: 0,
                    bottom: 0,
                }),
        )
        .wrap(Wrap { trim: true });
    frame.render_widget(footer, layout.help);

    layout
}
