use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::Style,
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem, Widget},
};
use unicode_width::UnicodeWidthChar;

use super::{excluded_style, region_style};
use crate::overlay::{HighlightState, Region, RegionRegistry};
use crate::structure::ChunkId;
use crate::theme::Base16Palette;

/// Text view: every chunk of the page, including those without a region
pub struct ChunkListView<'a> {
    registry: &'a RegionRegistry,
    state: &'a HighlightState,
    focused: Option<&'a ChunkId>,
    palette: &'a Base16Palette,
    offset: usize,
    title: Option<String>,
}

impl<'a> ChunkListView<'a> {
    pub fn new(
        registry: &'a RegionRegistry,
        state: &'a HighlightState,
        palette: &'a Base16Palette,
    ) -> Self {
        Self {
            registry,
            state,
            focused: None,
            palette,
            offset: 0,
            title: None,
        }
    }

    #[must_use]
    pub fn focused(mut self, focused: Option<&'a ChunkId>) -> Self {
        self.focused = focused;
        self
    }

    /// First chunk shown
    #[must_use]
    pub fn offset(mut self, offset: usize) -> Self {
        self.offset = offset;
        self
    }

    #[must_use]
    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    /// Offset that keeps `index` visible in a list of `height` rows
    pub fn scroll_to(current: usize, index: usize, height: usize) -> usize {
        if height == 0 {
            return current;
        }
        if index < current {
            index
        } else if index >= current + height {
            index + 1 - height
        } else {
            current
        }
    }

    fn line_for(&self, region: &Region, width: usize) -> Line<'static> {
        let visual = self.state.visual_state(region.chunk_id());
        let focused = self.focused == Some(region.chunk_id());
        let style = region_style(visual, focused, self.palette);

        let marker = match (visual.active, visual.hovered) {
            (true, _) => '▶',
            (false, true) => '•',
            (false, false) => ' ',
        };
        let head = format!("{marker}[{}] {}", region.kind().tag(), region.chunk_id());

        let mut used = text_width(&head);
        let mut spans = vec![Span::styled(head, style)];

        if !region.in_overlay() {
            let note = " (no region)";
            spans.push(Span::styled(note, excluded_style(self.palette)));
            used += note.len();
        }

        if let Some(text) = region.element.metadata.display_text() {
            let room = width.saturating_sub(used + 2);
            if room > 0 {
                let text = text.split_whitespace().collect::<Vec<_>>().join(" ");
                spans.push(Span::raw("  "));
                spans.push(Span::styled(
                    fit_width(&text, room),
                    Style::default().fg(self.palette.base_05),
                ));
            }
        }

        Line::from(spans)
    }
}

impl Widget for ChunkListView<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let (text_color, border_color, _) = self.palette.get_panel_colors(true);
        let title = self
            .title
            .clone()
            .unwrap_or_else(|| format!(" Chunks ({}) ", self.registry.len()));
        let block = Block::default()
            .borders(Borders::ALL)
            .title(title)
            .border_style(Style::default().fg(border_color))
            .style(Style::default().fg(text_color));

        let inner_width = usize::from(area.width.saturating_sub(2));
        let items: Vec<ListItem> = self
            .registry
            .regions()
            .iter()
            .skip(self.offset)
            .map(|region| ListItem::new(self.line_for(region, inner_width)))
            .collect();

        Widget::render(List::new(items).block(block), area, buf);
    }
}

fn text_width(text: &str) -> usize {
    text.chars().map(|c| c.width().unwrap_or(0)).sum()
}

/// Cut `text` to at most `max` columns, ending with an ellipsis when cut
fn fit_width(text: &str, max: usize) -> String {
    if text_width(text) <= max {
        return text.to_string();
    }
    let mut out = String::new();
    let mut used = 0;
    for c in text.chars() {
        let w = c.width().unwrap_or(0);
        if used + w + 1 > max {
            break;
        }
        out.push(c);
        used += w;
    }
    out.push('…');
    out
}
