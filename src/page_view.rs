//! One page on screen: structure, regions, highlight and keyboard focus
//!
//! A [`PageView`] lives exactly as long as its page is displayed. Opening a
//! different page builds a new one, so highlight state, subscriptions and
//! pending input never leak across pages. [`DocumentSession`] does that
//! swap and keeps the structure cache that outlives individual views.

use std::cell::Cell;
use std::rc::Rc;
use std::sync::Arc;
use std::time::{Duration, Instant};

use log::{debug, info, warn};

use crate::geometry::{Point, ScaledBBox};
use crate::overlay::{
    ActivationSource, Announcer, Coalesced, Command, DeepLink, Effect, FrameClock,
    HighlightCoordinator, ImageDimensions, NavAction, NavKey, NavigationConfig,
    NavigationController, Politeness, RegionRegistry, RegistryOptions, Resolution, Subscription,
};
use crate::settings::Settings;
use crate::structure::{
    ChunkId, FetchTracker, PageKey, PageStructure, RequestId, StructureCache, StructureError,
};

/// Everything a page view needs from settings
#[derive(Clone, Debug, PartialEq)]
pub struct PageViewConfig {
    pub registry: RegistryOptions,
    pub navigation: NavigationConfig,
    pub header_offset_px: f64,
    pub announcement_ttl: Duration,
    pub frame_interval: Duration,
}

impl Default for PageViewConfig {
    fn default() -> Self {
        Self::from_settings(&Settings::default())
    }
}

impl PageViewConfig {
    pub fn from_settings(settings: &Settings) -> Self {
        Self {
            registry: settings.registry_options(),
            navigation: settings.navigation_config(),
            header_offset_px: f64::from(settings.header_offset_px),
            announcement_ttl: settings.announcement_ttl(),
            frame_interval: settings.frame_interval(),
        }
    }
}

/// Work the host has to carry out on behalf of the view
#[derive(Clone, Debug, PartialEq)]
pub enum ViewEffect {
    ScrollTextIntoView {
        chunk_id: ChunkId,
        offset_px: f64,
    },
    ScrollRegionIntoView {
        chunk_id: ChunkId,
        bbox: ScaledBBox,
        offset_px: f64,
    },
    Announce {
        message: String,
        politeness: Politeness,
    },
}

#[derive(Clone, Copy, Debug, PartialEq)]
enum PointerInput {
    Moved(Point),
    Left,
}

pub struct PageView {
    key: PageKey,
    config: PageViewConfig,
    structure: Option<Arc<PageStructure>>,
    registry: RegionRegistry,
    image: Option<ImageDimensions>,
    coordinator: HighlightCoordinator,
    navigation: NavigationController,
    tracker: FetchTracker,
    pointer: Coalesced<PointerInput>,
    resize: Coalesced<ImageDimensions>,
    frame_clock: FrameClock,
    /// Hover that came from the overlay pointer, as opposed to the text view
    pointer_hover: Option<ChunkId>,
    deep_link: DeepLink,
    deep_link_resolved: bool,
    effects: Vec<ViewEffect>,
    last_announced: u64,
    needs_redraw: Rc<Cell<bool>>,
    redraw_subscription: Option<Subscription>,
}

impl PageView {
    pub fn new(
        key: PageKey,
        config: PageViewConfig,
        deep_link: DeepLink,
        tracker: FetchTracker,
    ) -> Self {
        let coordinator = HighlightCoordinator::new(config.header_offset_px);
        let needs_redraw = Rc::new(Cell::new(true));
        let flag = needs_redraw.clone();
        let redraw_subscription = coordinator.subscribe(move |_| flag.set(true));

        let navigation = NavigationController::new(config.navigation)
            .with_announcer(Announcer::with_default_duration(config.announcement_ttl));

        Self {
            key,
            frame_clock: FrameClock::new(config.frame_interval),
            config,
            structure: None,
            registry: RegionRegistry::empty(),
            image: None,
            coordinator,
            navigation,
            tracker,
            pointer: Coalesced::new(),
            resize: Coalesced::new(),
            pointer_hover: None,
            deep_link,
            deep_link_resolved: false,
            effects: Vec::new(),
            last_announced: 0,
            needs_redraw,
            redraw_subscription: Some(redraw_subscription),
        }
    }

    pub fn key(&self) -> &PageKey {
        &self.key
    }

    pub fn registry(&self) -> &RegionRegistry {
        &self.registry
    }

    /// Handle for renderers; both views read hover/active from here
    pub fn coordinator(&self) -> &HighlightCoordinator {
        &self.coordinator
    }

    pub fn navigation(&self) -> &NavigationController {
        &self.navigation
    }

    pub fn navigation_mut(&mut self) -> &mut NavigationController {
        &mut self.navigation
    }

    pub fn structure(&self) -> Option<&Arc<PageStructure>> {
        self.structure.as_ref()
    }

    pub fn deep_link(&self) -> &DeepLink {
        &self.deep_link
    }

    pub fn is_loading(&self) -> bool {
        self.tracker.pending().is_some()
    }

    /// Start fetching this page's structure; any earlier request is superseded
    pub fn begin_fetch(&mut self) -> RequestId {
        self.tracker.begin(self.key.clone())
    }

    /// Claim a finished request. False when it is stale or not ours.
    pub fn claim_fetch(&mut self, id: RequestId) -> bool {
        match self.tracker.complete(id) {
            Some(key) if key == self.key => true,
            Some(key) => {
                debug!("Dropping structure for {key}, view shows {}", self.key);
                false
            }
            None => false,
        }
    }

    pub fn apply_structure(&mut self, structure: Arc<PageStructure>) {
        debug!(
            "Structure for {}: {} elements",
            self.key,
            structure.elements.len()
        );
        self.structure = Some(structure);
        self.rebuild();
    }

    /// Latest page image size; applied on the next frame
    pub fn set_image_dimensions(&mut self, image: ImageDimensions) {
        self.resize.queue(image);
    }

    /// Pointer position over the page image, in display pixels
    pub fn pointer_moved(&mut self, point: Point) {
        self.pointer.queue(PointerInput::Moved(point));
    }

    pub fn pointer_left(&mut self) {
        self.pointer.queue(PointerInput::Left);
    }

    /// Process coalesced input if a frame is due. Returns true if it ran.
    pub fn frame(&mut self, now: Instant) -> bool {
        if !self.frame_clock.tick(now) {
            return false;
        }
        self.flush();
        true
    }

    /// Process coalesced input now, ignoring the frame clock
    pub fn flush(&mut self) {
        if let Some(image) = self.resize.take() {
            if self.registry.needs_rebuild(image) {
                self.image = Some(image);
                self.rebuild();
            }
        }

        match self.pointer.take() {
            Some(PointerInput::Moved(point)) => {
                let target = self.registry.region_at(point).map(|r| r.chunk_id().clone());
                self.set_pointer_hover(target);
            }
            Some(PointerInput::Left) => self.set_pointer_hover(None),
            None => {}
        }

        if self.navigation.announcer_mut().update() {
            self.needs_redraw.set(true);
        }
    }

    /// Pointer entered a chunk in the text view
    pub fn chunk_pointer_enter(&mut self, chunk_id: &ChunkId) {
        if self.registry.contains(chunk_id.as_str()) {
            self.apply(Command::PointerEnter(chunk_id.clone()));
        }
    }

    pub fn chunk_pointer_leave(&mut self, chunk_id: &ChunkId) {
        self.apply(Command::PointerLeave(chunk_id.clone()));
    }

    /// Click on the page image. Returns the activated chunk, if any.
    pub fn click_at(&mut self, point: Point) -> Option<ChunkId> {
        let chunk_id = self.registry.region_at(point)?.chunk_id().clone();
        self.navigation.focus_chunk(&chunk_id);
        self.collect_announcements();
        self.activate(chunk_id.clone(), ActivationSource::Overlay);
        Some(chunk_id)
    }

    /// Click on a chunk in the text view
    pub fn click_chunk(&mut self, chunk_id: &ChunkId) -> bool {
        if !self.registry.contains(chunk_id.as_str()) {
            return false;
        }
        self.activate(chunk_id.clone(), ActivationSource::TextView);
        true
    }

    pub fn handle_key(&mut self, key: NavKey) -> Option<NavAction> {
        let action = self.navigation.handle_key(key);
        match &action {
            Some(NavAction::Focused(_)) => self.needs_redraw.set(true),
            Some(NavAction::Activate(chunk_id)) => {
                self.activate(chunk_id.clone(), ActivationSource::Keyboard);
            }
            Some(NavAction::Cleared) => {
                self.apply(Command::ClearActive);
                self.needs_redraw.set(true);
            }
            None => {}
        }
        self.collect_announcements();
        action
    }

    pub fn drain_effects(&mut self) -> Vec<ViewEffect> {
        std::mem::take(&mut self.effects)
    }

    /// True once after any visible change
    pub fn take_redraw(&self) -> bool {
        self.needs_redraw.replace(false)
    }

    /// Tear the view down, handing back its fetch tracker with nothing in
    /// flight
    pub fn unmount(mut self) -> FetchTracker {
        debug!("Unmounting view for {}", self.key);
        self.redraw_subscription = None;
        self.pointer.clear();
        self.resize.clear();
        self.tracker.cancel();
        self.tracker
    }

    fn rebuild(&mut self) {
        let (Some(structure), Some(image)) = (self.structure.as_ref(), self.image) else {
            return;
        };
        let placed = match RegionRegistry::build(structure, image, &self.config.registry) {
            Ok(registry) => {
                self.registry = registry;
                true
            }
            Err(e) => {
                warn!("Cannot place regions for {}: {e}", self.key);
                self.registry = RegionRegistry::empty();
                false
            }
        };
        self.navigation.set_regions(self.registry.interactable());

        // The next pointer move re-hits; a hover whose region is gone ends now
        if let Some(hovered) = self.pointer_hover.clone() {
            if !self.registry.get(hovered.as_str()).is_some_and(|r| r.in_overlay()) {
                self.set_pointer_hover(None);
            }
        }

        self.needs_redraw.set(true);
        // A link waits for a registry that was actually placed
        if placed {
            self.resolve_deep_link();
        }
    }

    fn resolve_deep_link(&mut self) {
        if self.deep_link_resolved {
            return;
        }
        self.deep_link_resolved = true;

        match self.deep_link.resolve(&self.registry) {
            Resolution::Matched(chunk_id) => {
                info!("Deep link selects {chunk_id} on {}", self.key);
                self.navigation.focus_chunk(&chunk_id);
                self.collect_announcements();
                self.activate(chunk_id, ActivationSource::DeepLink);
            }
            Resolution::Unmatched(_) | Resolution::NoTarget => {}
        }
    }

    fn set_pointer_hover(&mut self, target: Option<ChunkId>) {
        if self.pointer_hover == target {
            return;
        }
        if let Some(previous) = self.pointer_hover.take() {
            self.apply(Command::PointerLeave(previous));
        }
        if let Some(chunk_id) = &target {
            self.apply(Command::PointerEnter(chunk_id.clone()));
        }
        self.pointer_hover = target;
    }

    fn activate(&mut self, chunk_id: ChunkId, source: ActivationSource) {
        self.apply(Command::Activate {
            chunk_id: chunk_id.clone(),
            source,
        });

        if matches!(source, ActivationSource::Keyboard | ActivationSource::DeepLink) {
            if let Some(bbox) = self.registry.get(chunk_id.as_str()).and_then(|r| r.scaled) {
                self.effects.push(ViewEffect::ScrollRegionIntoView {
                    chunk_id,
                    bbox,
                    offset_px: self.config.header_offset_px,
                });
            }
        }
    }

    fn apply(&mut self, command: Command) {
        for effect in self.coordinator.apply(command) {
            match effect {
                Effect::ScrollTextIntoView {
                    chunk_id,
                    offset_px,
                } => self.effects.push(ViewEffect::ScrollTextIntoView {
                    chunk_id,
                    offset_px,
                }),
            }
        }
    }

    fn collect_announcements(&mut self) {
        let Some(current) = self.navigation.announcer().current() else {
            return;
        };
        if current.sequence == self.last_announced {
            return;
        }
        self.last_announced = current.sequence;
        self.effects.push(ViewEffect::Announce {
            message: current.message.clone(),
            politeness: current.politeness,
        });
    }
}

/// Outcome of opening a page
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum OpenOutcome {
    /// Structure came from the cache and is applied
    Ready,
    /// The host must fetch and call [`DocumentSession::complete_fetch`]
    Pending(RequestId),
}

/// A document being viewed: the structure cache plus the page on screen
pub struct DocumentSession {
    document: String,
    config: PageViewConfig,
    cache: StructureCache,
    view: Option<PageView>,
}

impl DocumentSession {
    pub fn new(document: impl Into<String>, config: PageViewConfig, cache: StructureCache) -> Self {
        Self {
            document: document.into(),
            config,
            cache,
            view: None,
        }
    }

    pub fn document(&self) -> &str {
        &self.document
    }

    pub fn view(&self) -> Option<&PageView> {
        self.view.as_ref()
    }

    pub fn view_mut(&mut self) -> Option<&mut PageView> {
        self.view.as_mut()
    }

    pub fn cache(&self) -> &StructureCache {
        &self.cache
    }

    /// Show `page`, replacing the current view. Carries `deep_link` into
    /// the new view, which resolves it once its structure is in.
    pub fn open_page(&mut self, page: u32, deep_link: DeepLink, now: Instant) -> OpenOutcome {
        let tracker = self
            .view
            .take()
            .map(PageView::unmount)
            .unwrap_or_default();

        let key = PageKey::new(self.document.clone(), page);
        let mut view = PageView::new(key.clone(), self.config.clone(), deep_link, tracker);

        let outcome = match self.cache.get(&key, now) {
            Some(structure) => {
                view.apply_structure(structure);
                OpenOutcome::Ready
            }
            None => OpenOutcome::Pending(view.begin_fetch()),
        };
        self.view = Some(view);
        outcome
    }

    /// Hand in a fetch result. Returns false when it was stale and dropped.
    pub fn complete_fetch(
        &mut self,
        id: RequestId,
        result: Result<PageStructure, StructureError>,
        now: Instant,
    ) -> bool {
        let Some(view) = self.view.as_mut() else {
            debug!("Discarding structure result {:?}, no page open", id);
            return false;
        };
        if !view.claim_fetch(id) {
            return false;
        }

        let structure = match result {
            Ok(structure) => self.cache.insert(view.key().clone(), structure, now),
            Err(e) => {
                warn!("No structure for {}: {e}", view.key());
                Arc::new(PageStructure::empty())
            }
        };
        view.apply_structure(structure);
        true
    }

    /// Close the current page
    pub fn close(&mut self) {
        if let Some(view) = self.view.take() {
            view.unmount();
        }
    }
}
