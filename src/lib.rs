// Export modules for use in tests
pub mod event_source;
pub mod geometry;
pub mod inputs;
pub mod overlay;
pub mod page_view;
pub mod panic_handler;
pub mod settings;
pub mod structure;
pub mod theme;
pub mod viewer;
pub mod widget;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;

// Re-export the main entry points
pub use page_view::{DocumentSession, OpenOutcome, PageView, PageViewConfig, ViewEffect};
pub use viewer::{Viewer, ViewerOptions, run_viewer_with_event_source};
