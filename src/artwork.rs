//! Artwork decoding and half-block rendering for carousel cards.

use std::collections::HashMap;
use std::path::Path;

use image::imageops::FilterType;
use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::Color,
    widgets::Widget,
};
use tracing::debug;

/// Rows of RGB pixels; two pixel rows make one terminal row.
pub type ArtPixels = Vec<Vec<(u8, u8, u8)>>;

/// Decode `path` and resize it to `cols` x `rows` terminal cells.
pub fn load_pixels(path: &Path, cols: u16, rows: u16) -> Option<ArtPixels> {
    if cols == 0 || rows == 0 {
        return None;
    }
    let img = match image::open(path) {
        Ok(img) => img,
        Err(e) => {
            debug!(path = %path.display(), "artwork not decodable: {e}");
            return None;
        }
    };

    let px_w = u32::from(cols);
    let px_h = u32::from(rows) * 2; // half-block = 2 pixels per row
    let rgb = img.resize_exact(px_w, px_h, FilterType::Triangle).to_rgb8();

    let pixels = (0..px_h)
        .map(|y| {
            (0..px_w)
                .map(|x| {
                    let p = rgb.get_pixel(x, y);
                    (p[0], p[1], p[2])
                })
                .collect()
        })
        .collect();
    Some(pixels)
}

/// Decoded artwork keyed by track id and card size.
///
/// Failed decodes are cached too, so a broken file is only read once per size.
#[derive(Default)]
pub struct ArtworkCache {
    entries: HashMap<(u32, u16, u16), Option<ArtPixels>>,
}

impl ArtworkCache {
    pub fn get_or_load(
        &mut self,
        track_id: u32,
        path: Option<&Path>,
        cols: u16,
        rows: u16,
    ) -> Option<&ArtPixels> {
        let path = path?;
        self.entries
            .entry((track_id, cols, rows))
            .or_insert_with(|| load_pixels(path, cols, rows))
            .as_ref()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Drop every entry; card sizes change on resize.
    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

/// Draws `ArtPixels` with `▀`, optionally dimmed towards black.
pub struct ArtworkWidget<'a> {
    pixels: &'a ArtPixels,
    brightness: f32,
}

impl<'a> ArtworkWidget<'a> {
    pub fn new(pixels: &'a ArtPixels) -> Self {
        Self {
            pixels,
            brightness: 1.0,
        }
    }

    /// 1.0 is full color, 0.0 is black.
    pub fn brightness(mut self, brightness: f32) -> Self {
        self.brightness = brightness.clamp(0.0, 1.0);
        self
    }

    fn shade(&self, (r, g, b): (u8, u8, u8)) -> Color {
        let k = self.brightness;
        Color::Rgb(
            (f32::from(r) * k) as u8,
            (f32::from(g) * k) as u8,
            (f32::from(b) * k) as u8,
        )
    }
}

impl Widget for ArtworkWidget<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let art_rows = self.pixels.len() / 2;
        let art_cols = self.pixels.first().map(|r| r.len()).unwrap_or(0);
        let rows = usize::from(area.height).min(art_rows);
        let cols = usize::from(area.width).min(art_cols);

        for cy in 0..rows {
            let top_row = &self.pixels[cy * 2];
            let bottom_row = self.pixels.get(cy * 2 + 1).unwrap_or(top_row);
            for cx in 0..cols {
                let x = area.x + cx as u16;
                let y = area.y + cy as u16;
                buf[(x, y)]
                    .set_char('▀')
                    .set_fg(self.shade(top_row[cx]))
                    .set_bg(self.shade(bottom_row[cx]));
            }
        }
    }
}
