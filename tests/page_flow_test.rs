use std::sync::Arc;
use std::time::{Duration, Instant};

use pagelens::geometry::{Dimensions, Point, ScaledBBox};
use pagelens::overlay::{
    DeepLink, ExclusionReason, HighlightState, ImageDimensions, NavAction, NavKey, Politeness,
};
use pagelens::structure::{
    ChunkId, FetchTracker, PageKey, PageStructure, StructureCache, StructureError,
};
use pagelens::test_utils::{PageBuilder, SAMPLE_PAGE_JSON, letter_image};
use pagelens::{DocumentSession, OpenOutcome, PageView, PageViewConfig, ViewEffect};

fn config() -> PageViewConfig {
    PageViewConfig {
        frame_interval: Duration::ZERO,
        ..PageViewConfig::default()
    }
}

fn sample() -> PageStructure {
    PageStructure::from_json(SAMPLE_PAGE_JSON).unwrap()
}

fn id(s: &str) -> ChunkId {
    ChunkId::new(s)
}

fn center_of(view: &PageView, chunk_id: &str) -> Point {
    view.registry()
        .get(chunk_id)
        .and_then(|r| r.scaled)
        .unwrap()
        .center()
}

/// Sample page shown at its declared size, so display pixels equal points
fn mounted(deep_link: DeepLink) -> PageView {
    let mut view = PageView::new(
        PageKey::new("paper", 1),
        config(),
        deep_link,
        FetchTracker::new(),
    );
    view.apply_structure(Arc::new(sample()));
    view.set_image_dimensions(letter_image(1.0));
    view.flush();
    view
}

fn session() -> DocumentSession {
    DocumentSession::new(
        "paper",
        config(),
        StructureCache::new(8, Duration::from_secs(300)),
    )
}

#[test]
fn sample_page_builds_one_region_per_element() {
    let view = mounted(DeepLink::none());

    assert_eq!(view.registry().len(), 4);
    assert_eq!(view.registry().overlay_len(), 4);
    let order: Vec<&str> = view
        .navigation()
        .items()
        .iter()
        .map(|item| item.chunk_id.as_str())
        .collect();
    assert_eq!(
        order,
        vec![
            "chunk-0-page-1",
            "chunk-1-page-1",
            "chunk-2-page-1",
            "chunk-3-page-1"
        ]
    );
    assert_eq!(
        view.registry().get("chunk-0-page-1").unwrap().scaled,
        Some(ScaledBBox::from_corners(72.0, 68.0, 400.0, 92.0))
    );
}

#[test]
fn element_without_box_stays_in_text_view_only() {
    let structure = PageBuilder::letter()
        .heading("a", [72.0, 700.0, 400.0, 724.0])
        .picture("b", None)
        .heading("c", [72.0, 500.0, 300.0, 520.0])
        .heading("d", [72.0, 150.0, 300.0, 170.0])
        .build();
    let mut view = PageView::new(
        PageKey::new("paper", 1),
        config(),
        DeepLink::none(),
        FetchTracker::new(),
    );
    view.apply_structure(Arc::new(structure));
    view.set_image_dimensions(letter_image(1.0));
    view.flush();

    assert_eq!(view.registry().len(), 4);
    assert_eq!(view.registry().overlay_len(), 3);
    assert_eq!(view.navigation().len(), 3);
    assert_eq!(
        view.registry().get("b").unwrap().exclusion,
        Some(ExclusionReason::MissingBbox)
    );
    assert!(!view.click_chunk(&id("missing")));
    assert!(view.click_chunk(&id("b")));
    assert_eq!(view.coordinator().active(), Some(id("b")));
}

#[test]
fn regions_wait_for_both_structure_and_image() {
    let mut view = PageView::new(
        PageKey::new("paper", 1),
        config(),
        DeepLink::none(),
        FetchTracker::new(),
    );
    view.set_image_dimensions(letter_image(1.0));
    view.flush();
    assert!(view.registry().is_empty());

    view.apply_structure(Arc::new(sample()));
    assert_eq!(view.registry().len(), 4);
}

#[test]
fn activating_another_region_moves_active() {
    let mut view = mounted(DeepLink::none());

    let first = center_of(&view, "chunk-0-page-1");
    assert_eq!(view.click_at(first), Some(id("chunk-0-page-1")));
    assert_eq!(view.coordinator().active(), Some(id("chunk-0-page-1")));

    view.drain_effects();
    let second = center_of(&view, "chunk-2-page-1");
    assert_eq!(view.click_at(second), Some(id("chunk-2-page-1")));
    assert_eq!(view.coordinator().active(), Some(id("chunk-2-page-1")));

    let effects = view.drain_effects();
    assert!(effects.contains(&ViewEffect::ScrollTextIntoView {
        chunk_id: id("chunk-2-page-1"),
        offset_px: 80.0,
    }));
    // The region was clicked, so it is already in view
    assert!(
        !effects
            .iter()
            .any(|e| matches!(e, ViewEffect::ScrollRegionIntoView { .. }))
    );
}

#[test]
fn click_outside_every_region_does_nothing() {
    let mut view = mounted(DeepLink::none());
    assert_eq!(view.click_at(Point::new(5.0, 5.0)), None);
    assert_eq!(view.coordinator().state(), HighlightState::default());
}

#[test]
fn hover_and_leave_keep_active() {
    let mut view = mounted(DeepLink::none());
    view.click_at(center_of(&view, "chunk-0-page-1"));

    view.pointer_moved(center_of(&view, "chunk-2-page-1"));
    view.flush();
    let state = view.coordinator().state();
    assert_eq!(state.hovered, Some(id("chunk-2-page-1")));
    assert_eq!(state.active, Some(id("chunk-0-page-1")));

    view.pointer_left();
    view.flush();
    let state = view.coordinator().state();
    assert_eq!(state.hovered, None);
    assert_eq!(state.active, Some(id("chunk-0-page-1")));
}

#[test]
fn pointer_moves_within_a_frame_are_coalesced() {
    let mut view = mounted(DeepLink::none());
    let before = view.coordinator().version();

    view.pointer_moved(center_of(&view, "chunk-0-page-1"));
    view.pointer_moved(center_of(&view, "chunk-1-page-1"));
    view.pointer_moved(center_of(&view, "chunk-2-page-1"));
    view.flush();

    assert_eq!(view.coordinator().version(), before + 1);
    assert_eq!(view.coordinator().hovered(), Some(id("chunk-2-page-1")));
}

#[test]
fn input_waits_for_the_next_frame() {
    let mut view = PageView::new(
        PageKey::new("paper", 1),
        PageViewConfig {
            frame_interval: Duration::from_millis(16),
            ..PageViewConfig::default()
        },
        DeepLink::none(),
        FetchTracker::new(),
    );
    view.apply_structure(Arc::new(sample()));
    view.set_image_dimensions(letter_image(1.0));

    let t0 = Instant::now();
    assert!(view.frame(t0));
    assert_eq!(view.registry().len(), 4);

    view.pointer_moved(center_of(&view, "chunk-1-page-1"));
    assert!(!view.frame(t0 + Duration::from_millis(5)));
    assert_eq!(view.coordinator().hovered(), None);

    assert!(view.frame(t0 + Duration::from_millis(20)));
    assert_eq!(view.coordinator().hovered(), Some(id("chunk-1-page-1")));
}

#[test]
fn text_view_hover_mirrors_on_overlay() {
    let mut view = mounted(DeepLink::none());

    view.chunk_pointer_enter(&id("chunk-1-page-1"));
    assert!(
        view.coordinator()
            .visual_state(&id("chunk-1-page-1"))
            .hovered
    );

    // A late leave for a chunk that is no longer hovered changes nothing
    view.chunk_pointer_enter(&id("chunk-3-page-1"));
    view.chunk_pointer_leave(&id("chunk-1-page-1"));
    assert_eq!(view.coordinator().hovered(), Some(id("chunk-3-page-1")));

    view.chunk_pointer_enter(&id("not-on-page"));
    assert_eq!(view.coordinator().hovered(), Some(id("chunk-3-page-1")));
}

#[test]
fn text_view_click_does_not_scroll() {
    let mut view = mounted(DeepLink::none());
    assert!(view.click_chunk(&id("chunk-1-page-1")));
    assert_eq!(view.coordinator().active(), Some(id("chunk-1-page-1")));
    assert!(view.drain_effects().is_empty());
}

#[test]
fn keyboard_focus_announces_and_enter_activates() {
    let mut view = mounted(DeepLink::none());

    assert_eq!(
        view.handle_key(NavKey::Next),
        Some(NavAction::Focused(id("chunk-0-page-1")))
    );
    assert_eq!(
        view.drain_effects(),
        vec![ViewEffect::Announce {
            message: "Heading 1 of 4: Introduction".to_string(),
            politeness: Politeness::Polite,
        }]
    );
    // Focus alone does not activate
    assert_eq!(view.coordinator().active(), None);

    assert_eq!(
        view.handle_key(NavKey::Activate),
        Some(NavAction::Activate(id("chunk-0-page-1")))
    );
    let bbox = view
        .registry()
        .get("chunk-0-page-1")
        .and_then(|r| r.scaled)
        .unwrap();
    assert_eq!(
        view.drain_effects(),
        vec![
            ViewEffect::ScrollTextIntoView {
                chunk_id: id("chunk-0-page-1"),
                offset_px: 80.0,
            },
            ViewEffect::ScrollRegionIntoView {
                chunk_id: id("chunk-0-page-1"),
                bbox,
                offset_px: 80.0,
            },
        ]
    );
    assert_eq!(view.coordinator().active(), Some(id("chunk-0-page-1")));
}

#[test]
fn keyboard_traversal_wraps_and_escape_clears() {
    let mut view = mounted(DeepLink::none());

    view.handle_key(NavKey::Last);
    assert_eq!(
        view.navigation().focused().map(|item| item.chunk_id.clone()),
        Some(id("chunk-3-page-1"))
    );
    assert_eq!(
        view.handle_key(NavKey::Next),
        Some(NavAction::Focused(id("chunk-0-page-1")))
    );
    view.handle_key(NavKey::Previous);
    view.handle_key(NavKey::Previous);
    let effects = view.drain_effects();
    assert_eq!(
        effects.last(),
        Some(&ViewEffect::Announce {
            message: "Picture 3 of 4: Figure 1: Pipeline".to_string(),
            politeness: Politeness::Polite,
        })
    );

    view.handle_key(NavKey::Activate);
    assert_eq!(view.coordinator().active(), Some(id("chunk-2-page-1")));
    assert_eq!(view.handle_key(NavKey::Clear), Some(NavAction::Cleared));
    assert_eq!(view.coordinator().active(), None);
    assert!(view.navigation().focused().is_none());
}

#[test]
fn deep_link_activates_and_scrolls_both_views() {
    let view_link = DeepLink::parse("https://viewer.example/doc?chunk=chunk-0-page-1&page=1");
    let mut view = mounted(view_link);

    let state = view.coordinator().state();
    assert_eq!(state.active, Some(id("chunk-0-page-1")));
    assert_eq!(state.hovered, None);

    let effects = view.drain_effects();
    assert!(effects.contains(&ViewEffect::ScrollTextIntoView {
        chunk_id: id("chunk-0-page-1"),
        offset_px: 80.0,
    }));
    assert!(effects.contains(&ViewEffect::ScrollRegionIntoView {
        chunk_id: id("chunk-0-page-1"),
        bbox: ScaledBBox::from_corners(72.0, 68.0, 400.0, 92.0),
        offset_px: 80.0,
    }));
    assert_eq!(
        view.navigation().focused().map(|item| item.chunk_id.clone()),
        Some(id("chunk-0-page-1"))
    );

    // Resolved once; a resize rebuilds regions without re-activating
    view.set_image_dimensions(letter_image(0.5));
    view.flush();
    assert!(view.drain_effects().is_empty());
}

#[test]
fn deep_link_waits_for_a_placeable_image() {
    let mut view = PageView::new(
        PageKey::new("paper", 1),
        config(),
        DeepLink::to_chunk("chunk-2-page-1"),
        FetchTracker::new(),
    );
    view.apply_structure(Arc::new(sample()));

    // A collapsed image cannot be placed; the link stays pending
    let natural = letter_image(1.0).natural;
    view.set_image_dimensions(ImageDimensions::new(natural, Dimensions::new(0.0, 0.0)));
    view.flush();
    assert!(view.registry().is_empty());
    assert_eq!(view.coordinator().active(), None);

    view.set_image_dimensions(letter_image(1.0));
    view.flush();
    assert_eq!(view.coordinator().active(), Some(id("chunk-2-page-1")));
}

#[test]
fn deep_link_to_unknown_chunk_is_ignored() {
    let mut view = mounted(DeepLink::to_chunk("chunk-9-page-7"));
    assert_eq!(view.coordinator().state(), HighlightState::default());
    assert!(view.drain_effects().is_empty());
}

#[test]
fn cached_page_opens_ready() {
    let mut session = session();
    let now = Instant::now();

    let OpenOutcome::Pending(request) = session.open_page(1, DeepLink::none(), now) else {
        panic!("first open must fetch");
    };
    assert!(session.view().unwrap().is_loading());
    assert!(session.complete_fetch(request, Ok(sample()), now));
    assert_eq!(session.cache().len(), 1);

    assert!(matches!(
        session.open_page(2, DeepLink::none(), now),
        OpenOutcome::Pending(_)
    ));
    assert_eq!(
        session.open_page(1, DeepLink::none(), now),
        OpenOutcome::Ready
    );
    let view = session.view().unwrap();
    assert!(!view.is_loading());
    assert_eq!(view.structure().unwrap().elements.len(), 4);
}

#[test]
fn stale_fetch_result_is_dropped() {
    let mut session = session();
    let now = Instant::now();

    let OpenOutcome::Pending(first) = session.open_page(1, DeepLink::none(), now) else {
        panic!("expected a fetch");
    };
    let OpenOutcome::Pending(second) = session.open_page(2, DeepLink::none(), now) else {
        panic!("expected a fetch");
    };
    assert_ne!(first, second);

    assert!(!session.complete_fetch(first, Ok(sample()), now));
    assert!(session.view().unwrap().structure().is_none());
    assert!(session.cache().is_empty());

    assert!(session.complete_fetch(second, Ok(PageStructure::empty()), now));
    assert_eq!(session.view().unwrap().key(), &PageKey::new("paper", 2));
}

#[test]
fn failed_fetch_shows_empty_page_and_is_not_cached() {
    let mut session = session();
    let now = Instant::now();

    let OpenOutcome::Pending(request) = session.open_page(1, DeepLink::none(), now) else {
        panic!("expected a fetch");
    };
    assert!(session.complete_fetch(request, Err(StructureError::fetch("offline")), now));

    let view = session.view_mut().unwrap();
    view.set_image_dimensions(letter_image(1.0));
    view.flush();
    assert!(view.structure().unwrap().is_empty());
    assert!(view.registry().is_empty());
    assert!(session.cache().is_empty());

    assert!(matches!(
        session.open_page(1, DeepLink::none(), now),
        OpenOutcome::Pending(_)
    ));
}

#[test]
fn switching_pages_resets_highlight() {
    let mut session = session();
    let now = Instant::now();

    let OpenOutcome::Pending(request) = session.open_page(1, DeepLink::none(), now) else {
        panic!("expected a fetch");
    };
    session.complete_fetch(request, Ok(sample()), now);
    let view = session.view_mut().unwrap();
    view.set_image_dimensions(letter_image(1.0));
    view.flush();
    let target = center_of(view, "chunk-1-page-1");
    view.click_at(target);
    view.pointer_moved(target);
    view.flush();
    assert_eq!(view.coordinator().active(), Some(id("chunk-1-page-1")));

    session.open_page(2, DeepLink::none(), now);
    let view = session.view().unwrap();
    assert_eq!(view.coordinator().state(), HighlightState::default());
    assert!(view.navigation().focused().is_none());
    assert!(view.registry().is_empty());
}

#[test]
fn deep_link_through_session_resolves_after_fetch() {
    let mut session = session();
    let now = Instant::now();

    let OpenOutcome::Pending(request) =
        session.open_page(1, DeepLink::parse("?chunk=chunk-3-page-1"), now)
    else {
        panic!("expected a fetch");
    };
    session.complete_fetch(request, Ok(sample()), now);

    let view = session.view_mut().unwrap();
    assert_eq!(view.coordinator().active(), None);
    view.set_image_dimensions(letter_image(1.0));
    view.flush();
    assert_eq!(view.coordinator().active(), Some(id("chunk-3-page-1")));
}
