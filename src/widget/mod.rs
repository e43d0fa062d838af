//! Terminal renderers for the page overlay and the chunk list
//!
//! Both read hover/active from the same
//! [`HighlightState`](crate::overlay::HighlightState) and style through
//! [`region_style`], so a region and its chunk always look alike.

mod chunk_list;
mod overlay_view;

pub use chunk_list::ChunkListView;
pub use overlay_view::{CellSize, OverlayView};

use ratatui::style::{Modifier, Style};

use crate::overlay::VisualState;
use crate::theme::Base16Palette;

/// Style for a region outline or chunk line
pub fn region_style(visual: VisualState, focused: bool, palette: &Base16Palette) -> Style {
    let mut style = match (visual.active, visual.hovered) {
        (true, true) => Style::default()
            .fg(palette.base_09)
            .add_modifier(Modifier::BOLD),
        (true, false) => Style::default()
            .fg(palette.base_0a)
            .add_modifier(Modifier::BOLD),
        (false, true) => Style::default().fg(palette.base_0c),
        (false, false) => Style::default().fg(palette.base_04),
    };
    if focused {
        style = style.bg(palette.base_02).add_modifier(Modifier::UNDERLINED);
    }
    style
}

/// Style for chunks that have no region on the page
pub fn excluded_style(palette: &Base16Palette) -> Style {
    Style::default()
        .fg(palette.base_03)
        .add_modifier(Modifier::ITALIC)
}
