//! Interactive regions drawn over a page image and kept in sync with the text view

mod announce;
mod deep_link;
mod highlight;
mod navigation;
mod registry;
mod throttle;

pub use announce::{Announcement, Announcer, Politeness};
pub use deep_link::{CHUNK_PARAM, DeepLink, PAGE_PARAM, Resolution};
pub use highlight::{
    ActivationSource, Command, Effect, HighlightCoordinator, HighlightState, Subscription,
    VisualState,
};
pub use navigation::{
    DescribeFn, FocusCallback, NavAction, NavItem, NavKey, NavigationConfig,
    NavigationController, describe_item,
};
pub use registry::{ExclusionReason, ImageDimensions, Region, RegionRegistry, RegistryOptions};
pub use throttle::{Coalesced, FrameClock};
