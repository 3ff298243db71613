pub mod list;
pub mod map;

pub use list::ListView;
pub use map::{CanvasSurface, MapView};

use ratatui::{
    layout::{Alignment, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Wrap},
    Frame,
};

use crate::model::EventRecord;

const SPINNER_FRAMES: [&str; 4] = ["◐", "◓", "◑", "◒"];

pub fn spinner_frame(tick: u64) -> &'static str {
    SPINNER_FRAMES[(tick / 4) as usize % SPINNER_FRAMES.len()]
}

/// `M4.5` style badge colored by magnitude band.
pub fn magnitude_badge(record: &EventRecord) -> Span<'static> {
    let category = record.category();
    Span::styled(
        format!("M{}", record.magnitude_label()),
        Style::default()
            .fg(Color::Black)
            .bg(category.color())
            .add_modifier(Modifier::BOLD),
    )
}

/// Bordered panel with `lines` centered both ways. Used for the loading,
/// error and empty states of both surfaces.
pub fn render_placeholder(frame: &mut Frame, area: Rect, title: &str, lines: Vec<Line<'_>>) {
    let block = Block::default()
        .borders(Borders::ALL)
        .title(format!(" {} ", title));
    let inner = block.inner(area);

    let padding = (inner.height as usize).saturating_sub(lines.len()) / 2;
    let mut text: Vec<Line> = Vec::with_capacity(padding + lines.len());
    text.extend(std::iter::repeat(Line::from("")).take(padding));
    text.extend(lines);

    let paragraph = Paragraph::new(text)
        .block(block)
        .alignment(Alignment::Center)
        .wrap(Wrap { trim: true });

    frame.render_widget(paragraph, area);
}

/// Largest rectangle of at most `width` x `height` anchored to the bottom
/// left corner of `area`'s inner region.
pub fn bottom_left(area: Rect, width: u16, height: u16) -> Rect {
    let width = width.min(area.width.saturating_sub(2));
    let height = height.min(area.height.saturating_sub(2));
    Rect {
        x: area.x + 1,
        y: (area.y + area.height).saturating_sub(height + 1),
        width,
        height,
    }
}

pub fn bottom_right(area: Rect, width: u16, height: u16) -> Rect {
    let width = width.min(area.width.saturating_sub(2));
    let height = height.min(area.height.saturating_sub(2));
    Rect {
        x: (area.x + area.width).saturating_sub(width + 1),
        y: (area.y + area.height).saturating_sub(height + 1),
        width,
        height,
    }
}

#[cfg(test)]
pub(crate) fn buffer_text(buffer: &ratatui::buffer::Buffer) -> String {
    buffer.content.iter().map(|cell| cell.symbol()).collect()
}
