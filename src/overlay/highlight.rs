//! Hover/active state shared by the page overlay and the text view
//!
//! Both views read from the same [`HighlightCoordinator`]; neither keeps a
//! copy. State changes go through [`HighlightCoordinator::apply`], which
//! returns the side effects the host has to carry out (scrolling) and
//! notifies subscribers when the state actually changed.

use std::cell::RefCell;
use std::fmt;
use std::rc::{Rc, Weak};

use log::debug;

use crate::structure::ChunkId;

/// Which chunk is hovered and which is active. The two are independent.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct HighlightState {
    pub hovered: Option<ChunkId>,
    pub active: Option<ChunkId>,
}

impl HighlightState {
    pub fn visual_state(&self, chunk_id: &ChunkId) -> VisualState {
        VisualState {
            hovered: self.hovered.as_ref() == Some(chunk_id),
            active: self.active.as_ref() == Some(chunk_id),
        }
    }
}

/// How one chunk should look, identical for its region and its text
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct VisualState {
    pub hovered: bool,
    pub active: bool,
}

/// Where an activation came from
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ActivationSource {
    Overlay,
    TextView,
    Keyboard,
    DeepLink,
}

/// Commands that modify highlight state
#[derive(Clone, Debug, PartialEq)]
pub enum Command {
    /// Pointer entered a region or its text chunk
    PointerEnter(ChunkId),
    /// Pointer left a region or its text chunk
    PointerLeave(ChunkId),
    /// Click, activation key or deep link
    Activate {
        chunk_id: ChunkId,
        source: ActivationSource,
    },
    /// Escape: drop the active chunk, hover untouched
    ClearActive,
    /// Page or document change
    Reset,
}

/// Effects produced by state changes
#[derive(Clone, Debug, PartialEq)]
pub enum Effect {
    /// Bring a text chunk into view, leaving `offset_px` above it for a fixed header
    ScrollTextIntoView { chunk_id: ChunkId, offset_px: f64 },
}

type Listener = dyn Fn(&HighlightState);

struct Inner {
    state: HighlightState,
    version: u64,
    listeners: Vec<Weak<Listener>>,
    scroll_offset_px: f64,
}

/// Keeps a listener registered; dropping it unsubscribes
#[must_use = "dropping a Subscription unsubscribes immediately"]
pub struct Subscription {
    _guard: Rc<Listener>,
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription").finish_non_exhaustive()
    }
}

/// Single source of truth for hover/active state on one page.
///
/// Cloning hands out another handle to the same state.
#[derive(Clone)]
pub struct HighlightCoordinator {
    inner: Rc<RefCell<Inner>>,
}

impl Default for HighlightCoordinator {
    fn default() -> Self {
        Self::new(0.0)
    }
}

impl fmt::Debug for HighlightCoordinator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let inner = self.inner.borrow();
        f.debug_struct("HighlightCoordinator")
            .field("state", &inner.state)
            .field("version", &inner.version)
            .field("listeners", &inner.listeners.len())
            .finish()
    }
}

impl HighlightCoordinator {
    /// `scroll_offset_px` is the space kept clear above scrolled-to chunks
    #[must_use]
    pub fn new(scroll_offset_px: f64) -> Self {
        Self {
            inner: Rc::new(RefCell::new(Inner {
                state: HighlightState::default(),
                version: 0,
                listeners: Vec::new(),
                scroll_offset_px,
            })),
        }
    }

    /// Snapshot of the current state
    #[must_use]
    pub fn state(&self) -> HighlightState {
        self.inner.borrow().state.clone()
    }

    #[must_use]
    pub fn hovered(&self) -> Option<ChunkId> {
        self.inner.borrow().state.hovered.clone()
    }

    #[must_use]
    pub fn active(&self) -> Option<ChunkId> {
        self.inner.borrow().state.active.clone()
    }

    #[must_use]
    pub fn visual_state(&self, chunk_id: &ChunkId) -> VisualState {
        self.inner.borrow().state.visual_state(chunk_id)
    }

    /// Increments by one on every state change
    #[must_use]
    pub fn version(&self) -> u64 {
        self.inner.borrow().version
    }

    /// Register a listener called after each state change
    pub fn subscribe(&self, listener: impl Fn(&HighlightState) + 'static) -> Subscription {
        let strong: Rc<Listener> = Rc::new(listener);
        self.inner
            .borrow_mut()
            .listeners
            .push(Rc::downgrade(&strong));
        Subscription { _guard: strong }
    }

    /// Live listeners
    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.inner
            .borrow()
            .listeners
            .iter()
            .filter(|l| l.strong_count() > 0)
            .count()
    }

    /// Apply a command and return resulting effects
    pub fn apply(&self, cmd: Command) -> Vec<Effect> {
        let (changed, effects) = {
            let mut inner = self.inner.borrow_mut();
            let before = inner.state.clone();
            let effects = Self::transition(&mut inner, cmd);
            let changed = inner.state != before;
            if changed {
                inner.version += 1;
            }
            (changed, effects)
        };

        if changed {
            self.notify();
        }
        effects
    }

    fn transition(inner: &mut Inner, cmd: Command) -> Vec<Effect> {
        let state = &mut inner.state;
        match cmd {
            Command::PointerEnter(chunk_id) => {
                state.hovered = Some(chunk_id);
                vec![]
            }

            Command::PointerLeave(chunk_id) => {
                // A late leave for an id that is no longer hovered must not
                // clear the newer hover
                if state.hovered.as_ref() == Some(&chunk_id) {
                    state.hovered = None;
                }
                vec![]
            }

            Command::Activate { chunk_id, source } => {
                debug!("Activating {chunk_id} from {source:?}");
                state.active = Some(chunk_id.clone());
                if source == ActivationSource::TextView {
                    vec![]
                } else {
                    vec![Effect::ScrollTextIntoView {
                        chunk_id,
                        offset_px: inner.scroll_offset_px,
                    }]
                }
            }

            Command::ClearActive => {
                state.active = None;
                vec![]
            }

            Command::Reset => {
                *state = HighlightState::default();
                vec![]
            }
        }
    }

    fn notify(&self) {
        // Collect first so listeners may read the coordinator
        let (state, listeners): (HighlightState, Vec<Rc<Listener>>) = {
            let mut inner = self.inner.borrow_mut();
            inner.listeners.retain(|l| l.strong_count() > 0);
            let live = inner.listeners.iter().filter_map(Weak::upgrade).collect();
            (inner.state.clone(), live)
        };

        for listener in listeners {
            listener(&state);
        }
    }
}
