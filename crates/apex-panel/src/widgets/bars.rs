//! Visualizer bars: vertical columns with 1/8-cell precision and a peak tick.
//!
//! Bar heights arrive in eighths of a cell (the engine renders with
//! `pixel_height = rows * 8`), so one "pixel" is one eighth block.

use ratatui::{
    layout::Rect,
    style::{Color, Style},
    text::{Line, Span},
    widgets::Paragraph,
    Frame,
};

use apex_core::render::BarSpec;

use crate::theme::rgb;

pub const EIGHTHS_PER_ROW: u16 = 8;

const LOWER: [char; 8] = [' ', '▁', '▂', '▃', '▄', '▅', '▆', '▇'];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cell {
    Empty,
    Body(char),
    Peak(char),
}

/// What to draw at `row` (0 = bottom) for a bar of `height` eighths with an
/// optional peak tick at `peak` eighths.
///
/// A cell holds one glyph, so a peak that falls inside the body's partial
/// top cell is drawn as a low tick in the row above it.
pub fn cell(row: u32, height: u32, peak: Option<u32>) -> Cell {
    let base = row * 8;
    if height >= base + 8 {
        return Cell::Body('█');
    }
    if height > base {
        return Cell::Body(LOWER[(height - base) as usize]);
    }
    let Some(p) = peak.filter(|&p| p > height) else {
        return Cell::Empty;
    };
    let peak_row = (p - 1) / 8;
    if height > 0 && peak_row == (height - 1) / 8 {
        return if row == peak_row + 1 {
            Cell::Peak('▁')
        } else {
            Cell::Empty
        };
    }
    if row != peak_row {
        Cell::Empty
    } else if p - base > 4 {
        Cell::Peak('▔')
    } else {
        Cell::Peak('▁')
    }
}

/// Column width and gap so `count` bars fit in `width` cells.
pub fn column_layout(width: u16, count: usize) -> (u16, u16) {
    if count == 0 {
        return (0, 0);
    }
    let count = u16::try_from(count).unwrap_or(u16::MAX);
    let gap = if u32::from(width) >= u32::from(count) * 2 { 1 } else { 0 };
    let bar_w = (width.saturating_add(gap) / count).saturating_sub(gap).max(1);
    (bar_w, gap)
}

pub fn draw(frame: &mut Frame, area: Rect, bars: &[BarSpec], peak_color: Color) {
    if area.width == 0 || area.height == 0 || bars.is_empty() {
        return;
    }
    let (bar_w, gap) = column_layout(area.width, bars.len());
    let fits = ((area.width + gap) / (bar_w + gap)) as usize;
    let shown = &bars[..bars.len().min(fits)];
    let used = shown.len() as u16 * (bar_w + gap) - gap;
    let pad = " ".repeat(((area.width - used) / 2) as usize);

    let quantised: Vec<(u32, Option<u32>)> = shown
        .iter()
        .map(|b| {
            (
                b.height.round().max(0.0) as u32,
                b.peak_height.map(|p| p.round().max(0.0) as u32),
            )
        })
        .collect();

    let lines: Vec<Line> = (0..area.height as u32)
        .rev()
        .map(|row| {
            let mut spans = Vec::with_capacity(shown.len() * 2 + 1);
            spans.push(Span::raw(pad.clone()));
            for (i, (bar, &(h, p))) in shown.iter().zip(&quantised).enumerate() {
                let (glyph, style) = match cell(row, h, p) {
                    Cell::Empty => (' ', Style::default()),
                    Cell::Body(c) => (c, Style::default().fg(rgb(bar.color))),
                    Cell::Peak(c) => (c, Style::default().fg(peak_color)),
                };
                spans.push(Span::styled(
                    glyph.to_string().repeat(bar_w as usize),
                    style,
                ));
                if gap > 0 && i + 1 < shown.len() {
                    spans.push(Span::raw(" "));
                }
            }
            Line::from(spans)
        })
        .collect();

    frame.render_widget(Paragraph::new(lines), area);
}
