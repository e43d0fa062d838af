//! Interactive terminal viewer: page overlay on the left, chunk list on the right

use std::time::{Duration, Instant};

use anyhow::Result;
use crossterm::event::{Event, MouseButton, MouseEventKind};
use log::{debug, info};
use ratatui::{
    Frame, Terminal,
    backend::Backend,
    layout::{Constraint, Direction, Layout, Position, Rect},
    style::Style,
    text::Line,
    widgets::{Block, Borders, Paragraph},
};

use crate::event_source::EventSource;
use crate::geometry::{Dimensions, Point, calculate_bbox_area};
use crate::inputs::{AppKey, app_key_for, nav_key_for};
use crate::overlay::{DeepLink, ImageDimensions};
use crate::page_view::{DocumentSession, OpenOutcome, PageView, PageViewConfig, ViewEffect};
use crate::structure::{ChunkId, PageKey, StructureCache, StructureSource};
use crate::theme::{Base16Palette, current_theme};
use crate::widget::{CellSize, ChunkListView, OverlayView};

/// What the viewer starts with
#[derive(Clone, Debug)]
pub struct ViewerOptions {
    pub document: String,
    pub page_count: u32,
    /// Natural pixel size of the rendered page image
    pub natural: Dimensions,
    pub cell_size: CellSize,
    pub deep_link: DeepLink,
}

pub struct Viewer<S: StructureSource> {
    source: S,
    session: DocumentSession,
    page: u32,
    page_count: u32,
    natural: Dimensions,
    cell_size: CellSize,
    deep_link: DeepLink,
    page_area: Rect,
    list_area: Rect,
    list_offset: usize,
    list_hover: Option<ChunkId>,
    status: Option<String>,
    palette: &'static Base16Palette,
    first_render: bool,
    should_quit: bool,
}

impl<S: StructureSource> Viewer<S> {
    pub fn new(
        source: S,
        options: ViewerOptions,
        config: PageViewConfig,
        cache: StructureCache,
    ) -> Self {
        let page = options.deep_link.page.unwrap_or(1).clamp(1, options.page_count.max(1));
        let mut viewer = Self {
            source,
            session: DocumentSession::new(options.document, config, cache),
            page,
            page_count: options.page_count.max(1),
            natural: options.natural,
            cell_size: options.cell_size,
            deep_link: options.deep_link,
            page_area: Rect::default(),
            list_area: Rect::default(),
            list_offset: 0,
            list_hover: None,
            status: None,
            palette: current_theme(),
            first_render: true,
            should_quit: false,
        };
        viewer.open_page(page);
        viewer
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    pub fn page(&self) -> u32 {
        self.page
    }

    pub fn view(&self) -> Option<&PageView> {
        self.session.view()
    }

    pub fn status(&self) -> Option<&str> {
        self.status.as_deref()
    }

    pub fn should_quit(&self) -> bool {
        self.should_quit
    }

    pub fn list_offset(&self) -> usize {
        self.list_offset
    }

    /// The addressable location, resolved again each time its page mounts
    pub fn deep_link(&self) -> &DeepLink {
        &self.deep_link
    }

    fn link_for(&self, page: u32) -> DeepLink {
        match self.deep_link.page {
            Some(linked) if linked != page => DeepLink::none(),
            _ => self.deep_link.clone(),
        }
    }

    fn open_page(&mut self, page: u32) {
        info!("Opening page {page} of {}", self.session.document());
        self.page = page;
        self.list_offset = 0;
        self.list_hover = None;

        let now = Instant::now();
        let deep_link = self.link_for(page);
        if let OpenOutcome::Pending(id) = self.session.open_page(page, deep_link, now) {
            let key = PageKey::new(self.session.document(), page);
            let result = self.source.fetch(&key);
            self.session.complete_fetch(id, result, now);
        }

        // The new view needs the current image size
        if !self.page_area.is_empty() {
            self.push_image_dimensions();
        }
    }

    fn change_page(&mut self, delta: i64) {
        let target = i64::from(self.page) + delta;
        if target < 1 || target > i64::from(self.page_count) {
            return;
        }
        self.open_page(target as u32);
    }

    fn push_image_dimensions(&mut self) {
        let available = self.cell_size.displayed_for(self.page_area);
        let displayed = fit_within(self.natural, available);
        if let Some(view) = self.session.view_mut() {
            view.set_image_dimensions(ImageDimensions::new(self.natural, displayed));
            view.flush();
        }
    }

    pub fn handle_event(&mut self, event: Event) {
        match event {
            Event::Key(key) => {
                if let Some(app_key) = app_key_for(&key) {
                    self.handle_app_key(app_key);
                } else if let Some(nav_key) = nav_key_for(&key) {
                    if let Some(view) = self.session.view_mut() {
                        view.handle_key(nav_key);
                    }
                }
            }
            Event::Mouse(mouse) => {
                let position = Position::new(mouse.column, mouse.row);
                match mouse.kind {
                    MouseEventKind::Moved => self.pointer_at(position),
                    MouseEventKind::Down(MouseButton::Left) => self.click_at(position),
                    _ => {}
                }
            }
            Event::Resize(_, _) => self.first_render = true,
            _ => {}
        }
    }

    fn handle_app_key(&mut self, key: AppKey) {
        match key {
            AppKey::Quit => self.should_quit = true,
            AppKey::NextPage => self.change_page(1),
            AppKey::PreviousPage => self.change_page(-1),
            AppKey::ShareLink => {
                let active = self.session.view().and_then(|v| v.coordinator().active());
                self.status = Some(match active {
                    Some(chunk_id) => {
                        let link = DeepLink {
                            chunk_id: Some(chunk_id),
                            page: Some(self.page),
                        };
                        format!("Link: {}", link.to_query())
                    }
                    None => "Nothing selected".to_string(),
                });
            }
        }
    }

    /// Pixel point for a cell over the page.
    ///
    /// A cell is coarser than most regions, so a cell inside a drawn outline
    /// maps to the centre of the smallest such region; otherwise to the
    /// cell's own centre.
    fn page_point(&self, position: Position) -> Option<Point> {
        let center = self
            .cell_size
            .point_at(self.page_area, position.x, position.y)?;
        let snapped = self.session.view().and_then(|view| {
            view.registry()
                .overlay_regions()
                .filter_map(|r| r.scaled)
                .filter(|b| {
                    self.cell_size
                        .cell_rect(b, self.page_area)
                        .is_some_and(|rect| rect.contains(position))
                })
                .min_by(|a, b| calculate_bbox_area(a).total_cmp(&calculate_bbox_area(b)))
                .map(|b| b.center())
        });
        Some(snapped.unwrap_or(center))
    }

    fn pointer_at(&mut self, position: Position) {
        let page_point = self.page_point(position);
        let list_chunk = self.chunk_at(position);
        let Some(view) = self.session.view_mut() else {
            return;
        };

        match page_point {
            Some(point) => view.pointer_moved(point),
            None => view.pointer_left(),
        }

        if list_chunk != self.list_hover {
            if let Some(previous) = self.list_hover.take() {
                view.chunk_pointer_leave(&previous);
            }
            if let Some(chunk_id) = &list_chunk {
                view.chunk_pointer_enter(chunk_id);
            }
            self.list_hover = list_chunk;
        }
    }

    fn click_at(&mut self, position: Position) {
        let page_point = self.page_point(position);
        let list_chunk = self.chunk_at(position);
        let Some(view) = self.session.view_mut() else {
            return;
        };

        if let Some(point) = page_point {
            view.click_at(point);
        } else if let Some(chunk_id) = list_chunk {
            view.click_chunk(&chunk_id);
        }
    }

    /// Chunk listed at a screen position in the chunk list
    fn chunk_at(&self, position: Position) -> Option<ChunkId> {
        let inner = Block::default().borders(Borders::ALL).inner(self.list_area);
        if !inner.contains(position) {
            return None;
        }
        let index = self.list_offset + usize::from(position.y - inner.y);
        self.session
            .view()?
            .registry()
            .regions()
            .get(index)
            .map(|r| r.chunk_id().clone())
    }

    /// Run coalesced input and carry out effects. Returns true if a redraw is due.
    pub fn tick(&mut self, now: Instant) -> bool {
        let Some(view) = self.session.view_mut() else {
            return std::mem::take(&mut self.first_render);
        };
        view.frame(now);
        let effects = view.drain_effects();
        let redraw = view.take_redraw();

        for effect in effects {
            self.apply_effect(effect);
        }
        redraw || std::mem::take(&mut self.first_render)
    }

    fn apply_effect(&mut self, effect: ViewEffect) {
        match effect {
            ViewEffect::ScrollTextIntoView { chunk_id, .. } => {
                let index = self
                    .session
                    .view()
                    .and_then(|v| v.registry().position(chunk_id.as_str()));
                if let Some(index) = index {
                    let height = usize::from(self.list_area.height.saturating_sub(2));
                    self.list_offset = ChunkListView::scroll_to(self.list_offset, index, height);
                }
            }
            ViewEffect::ScrollRegionIntoView { chunk_id, .. } => {
                // The whole page is always on screen
                debug!("Region {chunk_id} already visible");
            }
            ViewEffect::Announce { message, .. } => {
                self.status = Some(message);
            }
        }
    }

    pub fn draw(&mut self, f: &mut Frame) {
        let rows = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Min(3), Constraint::Length(1)])
            .split(f.area());
        let columns = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(60), Constraint::Percentage(40)])
            .split(rows[0]);

        let (_, border_color, _) = self.palette.get_panel_colors(true);
        let page_block = Block::default()
            .borders(Borders::ALL)
            .title(format!(" Page {}/{} ", self.page, self.page_count))
            .border_style(Style::default().fg(border_color));
        let page_area = page_block.inner(columns[0]);
        f.render_widget(page_block, columns[0]);

        self.list_area = columns[1];
        if page_area != self.page_area {
            self.page_area = page_area;
            self.push_image_dimensions();
            // Resolving a deep link on first layout may have queued effects
            self.tick(Instant::now());
        }

        if let Some(view) = self.session.view() {
            let state = view.coordinator().state();
            let focused = view.navigation().focused().map(|item| &item.chunk_id);

            f.render_widget(
                OverlayView::new(view.registry(), &state, self.palette)
                    .focused(focused)
                    .cell_size(self.cell_size),
                page_area,
            );
            f.render_widget(
                ChunkListView::new(view.registry(), &state, self.palette)
                    .focused(focused)
                    .offset(self.list_offset),
                columns[1],
            );
        }

        let help = "Tab/j/k: Move | Enter: Select | Esc: Clear | n/p: Page | y: Link | q: Quit";
        let status = self.status.as_deref().unwrap_or(help);
        f.render_widget(
            Paragraph::new(Line::from(status)).style(Style::default().fg(self.palette.base_04)),
            rows[1],
        );
    }
}

/// Largest size with the aspect ratio of `natural` that fits in `available`
fn fit_within(natural: Dimensions, available: Dimensions) -> Dimensions {
    if !natural.is_valid() || !available.is_valid() {
        return available;
    }
    let scale = (available.width / natural.width).min(available.height / natural.height);
    Dimensions::new(natural.width * scale, natural.height * scale)
}

pub fn run_viewer_with_event_source<B: Backend, S: StructureSource>(
    terminal: &mut Terminal<B>,
    viewer: &mut Viewer<S>,
    event_source: &mut dyn EventSource,
) -> Result<()>
where
    B::Error: Send + Sync + 'static,
{
    let idle_timeout = Duration::from_millis(50);
    loop {
        // Always draws on the first pass, so input lands on a laid-out page
        if viewer.tick(Instant::now()) {
            terminal.draw(|f| viewer.draw(f))?;
        }

        if viewer.should_quit() {
            info!("Viewer closed on page {}", viewer.page());
            return Ok(());
        }

        if !event_source.poll(idle_timeout)? {
            continue;
        }

        let mut events_processed = 0;
        while events_processed < 50 && event_source.poll(Duration::ZERO)? {
            let event = event_source.read()?;
            events_processed += 1;
            viewer.handle_event(event);
            if viewer.should_quit() {
                break;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fit_keeps_aspect_ratio() {
        let fitted = fit_within(Dimensions::new(1224.0, 1584.0), Dimensions::new(400.0, 400.0));
        assert!((fitted.height - 400.0).abs() < 1e-9);
        assert!((fitted.width - 400.0 * 1224.0 / 1584.0).abs() < 1e-9);
    }

    #[test]
    fn fit_falls_back_for_unknown_natural_size() {
        let available = Dimensions::new(320.0, 200.0);
        assert_eq!(fit_within(Dimensions::default(), available), available);
    }
}
