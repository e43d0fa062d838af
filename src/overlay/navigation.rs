//! Keyboard traversal over the page's interactable regions

use std::fmt;

use log::debug;

use super::announce::Announcer;
use super::registry::Region;
use crate::structure::{ChunkId, ElementKind};

const EXCERPT_MAX_CHARS: usize = 80;

/// Abstract navigation keys; concrete bindings live in `inputs::keymap`
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NavKey {
    Next,
    Previous,
    First,
    Last,
    Activate,
    Clear,
}

/// What the host should do after a key was handled
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum NavAction {
    Focused(ChunkId),
    Activate(ChunkId),
    Cleared,
}

/// One focusable entry
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NavItem {
    pub chunk_id: ChunkId,
    pub kind: ElementKind,
    pub excerpt: Option<String>,
}

impl NavItem {
    pub fn from_region(region: &Region) -> Self {
        Self {
            chunk_id: region.chunk_id().clone(),
            kind: region.kind(),
            excerpt: region
                .element
                .metadata
                .display_text()
                .map(|text| excerpt(text, EXCERPT_MAX_CHARS)),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct NavigationConfig {
    /// Moving past either end wraps around
    pub wrap: bool,
    /// Keyboard handling and announcements; programmatic calls always work
    pub enabled: bool,
    /// Announce each focus change
    pub announce: bool,
}

impl Default for NavigationConfig {
    fn default() -> Self {
        Self {
            wrap: true,
            enabled: true,
            announce: true,
        }
    }
}

/// Builds the announcement for `item` at `index` out of `count`
pub type DescribeFn = Box<dyn Fn(&NavItem, usize, usize) -> String>;

/// Called with the new cursor after every change
pub type FocusCallback = Box<dyn FnMut(Option<usize>)>;

/// "Heading 2 of 5: Results"
pub fn describe_item(item: &NavItem, index: usize, count: usize) -> String {
    let position = format!("{} {} of {}", item.kind.label(), index + 1, count);
    match &item.excerpt {
        Some(text) => format!("{position}: {text}"),
        None => position,
    }
}

fn excerpt(text: &str, max_chars: usize) -> String {
    let collapsed = text.split_whitespace().collect::<Vec<_>>().join(" ");
    match collapsed.char_indices().nth(max_chars) {
        Some((cut, _)) => format!("{}…", collapsed[..cut].trim_end()),
        None => collapsed,
    }
}

/// Focus cursor over the interactable regions, in document order
pub struct NavigationController {
    items: Vec<NavItem>,
    cursor: Option<usize>,
    config: NavigationConfig,
    describe: DescribeFn,
    announcer: Announcer,
    on_focus_change: Option<FocusCallback>,
}

impl fmt::Debug for NavigationController {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NavigationController")
            .field("items", &self.items.len())
            .field("cursor", &self.cursor)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl Default for NavigationController {
    fn default() -> Self {
        Self::new(NavigationConfig::default())
    }
}

impl NavigationController {
    pub fn new(config: NavigationConfig) -> Self {
        let mut announcer = Announcer::new();
        announcer.set_enabled(config.enabled && config.announce);
        Self {
            items: Vec::new(),
            cursor: None,
            config,
            describe: Box::new(describe_item),
            announcer,
            on_focus_change: None,
        }
    }

    /// Replace the announcement text generator
    #[must_use]
    pub fn with_describe(
        mut self,
        describe: impl Fn(&NavItem, usize, usize) -> String + 'static,
    ) -> Self {
        self.describe = Box::new(describe);
        self
    }

    #[must_use]
    pub fn with_announcer(mut self, mut announcer: Announcer) -> Self {
        announcer.set_enabled(self.config.enabled && self.config.announce);
        self.announcer = announcer;
        self
    }

    pub fn set_on_focus_change(&mut self, callback: impl FnMut(Option<usize>) + 'static) {
        self.on_focus_change = Some(Box::new(callback));
    }

    /// Replace the focusable items. Focus follows its chunk if it is still
    /// present, otherwise it is cleared.
    pub fn set_items(&mut self, items: Vec<NavItem>) {
        let focused = self.focused().map(|item| item.chunk_id.clone());
        self.items = items;
        let cursor = focused.and_then(|id| self.index_of(&id));
        if cursor != self.cursor {
            self.cursor = cursor;
            self.fire_focus_change();
        }
    }

    /// Items from the interactable regions of a registry
    pub fn set_regions<'a>(&mut self, regions: impl IntoIterator<Item = &'a Region>) {
        self.set_items(regions.into_iter().map(NavItem::from_region).collect());
    }

    pub fn items(&self) -> &[NavItem] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn cursor(&self) -> Option<usize> {
        self.cursor
    }

    pub fn focused(&self) -> Option<&NavItem> {
        self.cursor.and_then(|i| self.items.get(i))
    }

    pub fn index_of(&self, chunk_id: &ChunkId) -> Option<usize> {
        self.items.iter().position(|item| &item.chunk_id == chunk_id)
    }

    pub fn config(&self) -> NavigationConfig {
        self.config
    }

    pub fn is_enabled(&self) -> bool {
        self.config.enabled
    }

    pub fn set_enabled(&mut self, enabled: bool) {
        self.config.enabled = enabled;
        self.announcer
            .set_enabled(self.config.enabled && self.config.announce);
    }

    pub fn set_wrap(&mut self, wrap: bool) {
        self.config.wrap = wrap;
    }

    pub fn announcer(&self) -> &Announcer {
        &self.announcer
    }

    pub fn announcer_mut(&mut self) -> &mut Announcer {
        &mut self.announcer
    }

    /// Move to the next item. Returns the new index, `None` when nothing changed.
    pub fn navigate_next(&mut self) -> Option<usize> {
        let count = self.items.len();
        if count == 0 {
            return None;
        }
        let target = match self.cursor {
            None => 0,
            Some(i) if i + 1 < count => i + 1,
            Some(_) if self.config.wrap => 0,
            Some(_) => return None,
        };
        self.move_to(target)
    }

    pub fn navigate_previous(&mut self) -> Option<usize> {
        let count = self.items.len();
        if count == 0 {
            return None;
        }
        let target = match self.cursor {
            None => count - 1,
            Some(i) if i > 0 => i - 1,
            Some(_) if self.config.wrap => count - 1,
            Some(_) => return None,
        };
        self.move_to(target)
    }

    pub fn navigate_first(&mut self) -> Option<usize> {
        if self.items.is_empty() {
            return None;
        }
        self.move_to(0)
    }

    pub fn navigate_last(&mut self) -> Option<usize> {
        let last = self.items.len().checked_sub(1)?;
        self.move_to(last)
    }

    /// Focus a specific index; out-of-range indexes are ignored
    pub fn focus_element(&mut self, index: usize) -> Option<usize> {
        if index >= self.items.len() {
            debug!(
                "Ignoring focus request for index {index}, only {} items",
                self.items.len()
            );
            return None;
        }
        self.move_to(index)
    }

    /// Focus the item for `chunk_id`, if it is focusable
    pub fn focus_chunk(&mut self, chunk_id: &ChunkId) -> Option<usize> {
        let index = self.index_of(chunk_id)?;
        self.move_to(index)
    }

    /// Drop focus. Returns true if something was focused.
    pub fn clear_focus(&mut self) -> bool {
        if self.cursor.take().is_some() {
            self.fire_focus_change();
            true
        } else {
            false
        }
    }

    /// Handle an abstract key. Ignored entirely while disabled.
    pub fn handle_key(&mut self, key: NavKey) -> Option<NavAction> {
        if !self.config.enabled {
            return None;
        }

        match key {
            NavKey::Next => self.navigate_next().and_then(|_| self.focused_action()),
            NavKey::Previous => self.navigate_previous().and_then(|_| self.focused_action()),
            NavKey::First => self.navigate_first().and_then(|_| self.focused_action()),
            NavKey::Last => self.navigate_last().and_then(|_| self.focused_action()),
            NavKey::Activate => self
                .focused()
                .map(|item| NavAction::Activate(item.chunk_id.clone())),
            NavKey::Clear => {
                self.clear_focus();
                Some(NavAction::Cleared)
            }
        }
    }

    fn focused_action(&self) -> Option<NavAction> {
        self.focused()
            .map(|item| NavAction::Focused(item.chunk_id.clone()))
    }

    fn move_to(&mut self, index: usize) -> Option<usize> {
        if self.cursor == Some(index) {
            return None;
        }
        self.cursor = Some(index);
        self.announce_focus(index);
        self.fire_focus_change();
        Some(index)
    }

    fn announce_focus(&mut self, index: usize) {
        if !(self.config.enabled && self.config.announce) {
            return;
        }
        if let Some(item) = self.items.get(index) {
            let message = (self.describe)(item, index, self.items.len());
            self.announcer.polite(message);
        }
    }

    fn fire_focus_change(&mut self) {
        let cursor = self.cursor;
        if let Some(callback) = self.on_focus_change.as_mut() {
            callback(cursor);
        }
    }
}
