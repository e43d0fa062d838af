//! Region outlines drawn over the page area

use ratatui::{
    buffer::Buffer,
    layout::{Position, Rect},
    style::Style,
    widgets::Widget,
};

use super::region_style;
use crate::geometry::{Dimensions, Point, ScaledBBox};
use crate::overlay::{HighlightState, Region, RegionRegistry};
use crate::structure::ChunkId;
use crate::theme::Base16Palette;

/// Size of one terminal cell in display pixels
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CellSize {
    pub width: u16,
    pub height: u16,
}

impl Default for CellSize {
    fn default() -> Self {
        Self::new(8, 16)
    }
}

impl CellSize {
    #[must_use]
    pub const fn new(width: u16, height: u16) -> Self {
        Self { width, height }
    }

    pub fn is_valid(&self) -> bool {
        self.width > 0 && self.height > 0
    }

    /// Display size in pixels of a page drawn into `area`
    pub fn displayed_for(&self, area: Rect) -> Dimensions {
        Dimensions::new(
            f64::from(area.width) * f64::from(self.width),
            f64::from(area.height) * f64::from(self.height),
        )
    }

    /// Pixel at the centre of the cell at (`column`, `row`), relative to `area`
    pub fn point_at(&self, area: Rect, column: u16, row: u16) -> Option<Point> {
        if !self.is_valid() || !area.contains(Position::new(column, row)) {
            return None;
        }
        let (w, h) = (f64::from(self.width), f64::from(self.height));
        Some(Point::new(
            f64::from(column - area.x) * w + w / 2.0,
            f64::from(row - area.y) * h + h / 2.0,
        ))
    }

    /// Cells covered by `bbox`, clipped to `area`
    pub fn cell_rect(&self, bbox: &ScaledBBox, area: Rect) -> Option<Rect> {
        if !self.is_valid() {
            return None;
        }
        let (w, h) = (f64::from(self.width), f64::from(self.height));
        let left = (bbox.x1 / w).floor();
        let top = (bbox.y1 / h).floor();
        let right = (bbox.x2 / w).ceil().max(left + 1.0);
        let bottom = (bbox.y2 / h).ceil().max(top + 1.0);
        if ![left, top, right, bottom].iter().all(|v| v.is_finite()) {
            return None;
        }

        let x0 = (f64::from(area.x) + left).max(f64::from(area.left()));
        let y0 = (f64::from(area.y) + top).max(f64::from(area.top()));
        let x1 = (f64::from(area.x) + right).min(f64::from(area.right()));
        let y1 = (f64::from(area.y) + bottom).min(f64::from(area.bottom()));
        if x1 <= x0 || y1 <= y0 {
            return None;
        }

        Some(Rect::new(
            x0 as u16,
            y0 as u16,
            (x1 - x0) as u16,
            (y1 - y0) as u16,
        ))
    }
}

/// Draws an outline for every region of the page
pub struct OverlayView<'a> {
    registry: &'a RegionRegistry,
    state: &'a HighlightState,
    focused: Option<&'a ChunkId>,
    cell_size: CellSize,
    palette: &'a Base16Palette,
}

impl<'a> OverlayView<'a> {
    pub fn new(
        registry: &'a RegionRegistry,
        state: &'a HighlightState,
        palette: &'a Base16Palette,
    ) -> Self {
        Self {
            registry,
            state,
            focused: None,
            cell_size: CellSize::default(),
            palette,
        }
    }

    #[must_use]
    pub fn focused(mut self, focused: Option<&'a ChunkId>) -> Self {
        self.focused = focused;
        self
    }

    #[must_use]
    pub fn cell_size(mut self, cell_size: CellSize) -> Self {
        self.cell_size = cell_size;
        self
    }

    fn style_for(&self, region: &Region) -> (Style, bool) {
        let visual = self.state.visual_state(region.chunk_id());
        let focused = self.focused == Some(region.chunk_id());
        let emphasised = visual.active || visual.hovered || focused;
        (region_style(visual, focused, self.palette), emphasised)
    }
}

impl Widget for OverlayView<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let area = area.intersection(buf.area);
        if area.is_empty() {
            return;
        }

        let mut outlines: Vec<(Rect, Style, bool, char)> = self
            .registry
            .overlay_regions()
            .filter_map(|region| {
                let bbox = region.scaled.as_ref()?;
                let rect = self.cell_size.cell_rect(bbox, area)?;
                let (style, emphasised) = self.style_for(region);
                Some((rect, style, emphasised, region.kind().tag()))
            })
            .collect();

        // Highlighted outlines go last so they are not painted over
        outlines.sort_by_key(|(_, _, emphasised, _)| *emphasised);

        for (rect, style, _, tag) in outlines {
            draw_outline(buf, rect, style);
            if rect.width >= 3 {
                buf[(rect.x + 1, rect.y)].set_char(tag).set_style(style);
            }
        }
    }
}

fn draw_outline(buf: &mut Buffer, rect: Rect, style: Style) {
    let (left, top) = (rect.left(), rect.top());
    let (right, bottom) = (rect.right() - 1, rect.bottom() - 1);

    if rect.width == 1 && rect.height == 1 {
        buf[(left, top)].set_symbol("□").set_style(style);
        return;
    }
    if rect.height == 1 {
        for x in left..=right {
            buf[(x, top)].set_symbol("─").set_style(style);
        }
        return;
    }
    if rect.width == 1 {
        for y in top..=bottom {
            buf[(left, y)].set_symbol("│").set_style(style);
        }
        return;
    }

    for x in left + 1..right {
        buf[(x, top)].set_symbol("─").set_style(style);
        buf[(x, bottom)].set_symbol("─").set_style(style);
    }
    for y in top + 1..bottom {
        buf[(left, y)].set_symbol("│").set_style(style);
        buf[(right, y)].set_symbol("│").set_style(style);
    }
    buf[(left, top)].set_symbol("┌").set_style(style);
    buf[(right, top)].set_symbol("┐").set_style(style);
    buf[(left, bottom)].set_symbol("└").set_style(style);
    buf[(right, bottom)].set_symbol("┘").set_style(style);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pixels_map_to_covering_cells() {
        let cell = CellSize::new(10, 20);
        let area = Rect::new(2, 1, 40, 20);

        let rect = cell
            .cell_rect(&ScaledBBox::from_corners(15.0, 30.0, 41.0, 60.0), area)
            .unwrap();
        assert_eq!(rect, Rect::new(3, 2, 4, 2));
    }

    #[test]
    fn boxes_are_clipped_to_area() {
        let cell = CellSize::new(10, 20);
        let area = Rect::new(0, 0, 5, 5);
        let rect = cell
            .cell_rect(&ScaledBBox::from_corners(30.0, 0.0, 90.0, 20.0), area)
            .unwrap();
        assert_eq!(rect, Rect::new(3, 0, 2, 1));

        let outside = ScaledBBox::from_corners(100.0, 0.0, 120.0, 20.0);
        assert!(cell.cell_rect(&outside, area).is_none());
    }

    #[test]
    fn thin_boxes_cover_at_least_one_cell() {
        let cell = CellSize::new(10, 20);
        let rect = cell
            .cell_rect(
                &ScaledBBox::from_corners(10.0, 20.0, 10.0, 20.0),
                Rect::new(0, 0, 10, 10),
            )
            .unwrap();
        assert_eq!((rect.width, rect.height), (1, 1));
    }

    #[test]
    fn point_at_cell_centre() {
        let cell = CellSize::new(10, 20);
        let area = Rect::new(2, 1, 10, 10);
        assert_eq!(cell.point_at(area, 3, 2), Some(Point::new(15.0, 30.0)));
        assert_eq!(cell.point_at(area, 0, 0), None);
        assert_eq!(
            cell.displayed_for(area),
            Dimensions::new(100.0, 200.0)
        );
    }
}
