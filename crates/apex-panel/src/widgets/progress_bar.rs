//! Seekable progress bar with eighth-block precision.

use ratatui::{
    layout::Rect,
    style::Style,
    text::{Line, Span},
    widgets::Paragraph,
    Frame,
};

use crate::theme::{C_ACCENT, C_TRACK};

const PARTIAL: [char; 8] = [' ', '▏', '▎', '▍', '▌', '▋', '▊', '▉'];

/// Filled part and empty track for a bar `width` cells wide.
pub fn bar_cells(progress: f64, width: usize) -> (String, String) {
    let eighths = (progress.clamp(0.0, 1.0) * width as f64 * 8.0).round() as usize;
    let full = (eighths / 8).min(width);
    let mut filled = "█".repeat(full);
    let mut used = full;
    if full < width && eighths % 8 > 0 {
        filled.push(PARTIAL[eighths % 8]);
        used += 1;
    }
    (filled, "─".repeat(width - used))
}

/// Draw the bar. `handle` shows a knob at the fill edge (hover or drag).
pub fn draw(frame: &mut Frame, area: Rect, progress: f64, handle: bool) {
    if area.width == 0 || area.height == 0 {
        return;
    }
    let (mut filled, mut rest) = bar_cells(progress, area.width as usize);
    let mut spans = Vec::with_capacity(3);
    if handle {
        // The knob takes over the last filled cell, or the first track cell.
        if filled.pop().is_none() {
            rest.pop();
        }
        spans.push(Span::styled(filled, Style::default().fg(C_ACCENT)));
        spans.push(Span::styled("●", Style::default().fg(C_ACCENT)));
    } else {
        spans.push(Span::styled(filled, Style::default().fg(C_ACCENT)));
    }
    spans.push(Span::styled(rest, Style::default().fg(C_TRACK)));
    frame.render_widget(Paragraph::new(Line::from(spans)), area);
}

/// Fraction of the bar under column `col`, or `None` when the point is
/// outside `area`. Columns map to their centre so the last cell reaches 1.0.
pub fn fraction_at(area: Rect, col: u16, row: u16) -> Option<f64> {
    if area.width == 0
        || col < area.x
        || col >= area.x + area.width
        || row < area.y
        || row >= area.y + area.height
    {
        return None;
    }
    if area.width == 1 {
        return Some(0.0);
    }
    Some((col - area.x) as f64 / (area.width - 1) as f64)
}

/// Column fraction for a drag that may wander off the bar horizontally.
pub fn drag_fraction(area: Rect, col: u16) -> f64 {
    if area.width <= 1 {
        return 0.0;
    }
    let offset = col.saturating_sub(area.x).min(area.width - 1);
    offset as f64 / (area.width - 1) as f64
}
