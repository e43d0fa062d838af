//! Fixtures shared by unit and integration tests

use std::cell::Cell;
use std::collections::HashMap;

use crate::event_source::{Event, KeyCode, KeyModifiers, SimulatedEventSource};
use crate::geometry::Dimensions;
use crate::overlay::ImageDimensions;
use crate::structure::{
    CoordinateSystem, ElementKind, ElementMetadata, PageKey, PageStructure, StructuralElement,
    StructureError, StructureSource,
};

/// US Letter in points, the usual declared page size
pub const LETTER: Dimensions = Dimensions::new(612.0, 792.0);

/// Page image rendered at 2x and shown at `scale` times the page size
pub fn letter_image(scale: f64) -> ImageDimensions {
    ImageDimensions::new(
        Dimensions::new(LETTER.width * 2.0, LETTER.height * 2.0),
        Dimensions::new(LETTER.width * scale, LETTER.height * scale),
    )
}

/// Three headings and a picture on page 1, bottom-left origin
pub const SAMPLE_PAGE_JSON: &str = r#"{
    "has_structure": true,
    "coordinate_system": {"origin": "BOTTOMLEFT", "page_width": 612, "page_height": 792, "units": "pt"},
    "headings": [
        {"chunk_id": "chunk-0-page-1", "text": "Introduction", "level": 1, "bbox": [72, 700, 400, 724], "order": 0},
        {"chunk_id": "chunk-1-page-1", "text": "Method", "level": 2, "bbox": [72, 500, 300, 520], "order": 1},
        {"chunk_id": "chunk-3-page-1", "text": "Results", "level": 2, "bbox": [72, 150, 300, 170], "order": 3}
    ],
    "pictures": [
        {"chunk_id": "chunk-2-page-1", "caption": "Figure 1: Pipeline", "bbox": [100, 220, 500, 480], "order": 2}
    ]
}"#;

/// Builds page structure in wire coordinates (`[left, bottom, right, top]`)
pub struct PageBuilder {
    coordinate_system: CoordinateSystem,
    elements: Vec<StructuralElement>,
}

impl Default for PageBuilder {
    fn default() -> Self {
        Self::letter()
    }
}

impl PageBuilder {
    /// Letter page with bottom-left origin
    pub fn letter() -> Self {
        Self {
            coordinate_system: CoordinateSystem {
                page_width: LETTER.width,
                page_height: LETTER.height,
                ..CoordinateSystem::default()
            },
            elements: Vec::new(),
        }
    }

    pub fn element(mut self, kind: ElementKind, chunk_id: &str, bbox: Option<[f64; 4]>) -> Self {
        let bbox = bbox.map(|raw| self.coordinate_system.to_bbox(raw));
        self.elements.push(StructuralElement {
            kind,
            chunk_id: chunk_id.into(),
            bbox,
            metadata: ElementMetadata::default(),
        });
        self
    }

    pub fn heading(self, chunk_id: &str, bbox: [f64; 4]) -> Self {
        self.element(ElementKind::Heading, chunk_id, Some(bbox))
    }

    pub fn picture(self, chunk_id: &str, bbox: Option<[f64; 4]>) -> Self {
        self.element(ElementKind::Picture, chunk_id, bbox)
    }

    /// Set the text of the last element added
    pub fn text(mut self, text: &str) -> Self {
        if let Some(last) = self.elements.last_mut() {
            last.metadata.text = Some(text.to_string());
        }
        self
    }

    pub fn build(self) -> PageStructure {
        PageStructure {
            has_structure: true,
            elements: self.elements,
            coordinate_system: self.coordinate_system,
        }
    }
}

/// Structure source serving JSON payloads from memory
#[derive(Default)]
pub struct MemorySource {
    pages: HashMap<PageKey, String>,
    fetches: Cell<usize>,
}

impl MemorySource {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_page(mut self, document: &str, page: u32, json: &str) -> Self {
        self.pages
            .insert(PageKey::new(document, page), json.to_string());
        self
    }

    /// Number of fetches served so far
    pub fn fetches(&self) -> usize {
        self.fetches.get()
    }
}

impl StructureSource for MemorySource {
    fn fetch(&self, key: &PageKey) -> Result<PageStructure, StructureError> {
        self.fetches.set(self.fetches.get() + 1);
        match self.pages.get(key) {
            Some(json) => PageStructure::from_json(json),
            None => Err(StructureError::fetch(format!("no structure for {key}"))),
        }
    }
}

/// Builder for creating test scenarios with simulated user input
#[derive(Default)]
pub struct TestScenarioBuilder {
    events: Vec<Event>,
}

impl TestScenarioBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn press(mut self, code: KeyCode) -> Self {
        self.events
            .push(SimulatedEventSource::key_event(code, KeyModifiers::empty()));
        self
    }

    /// Add a character key press
    pub fn press_char(mut self, c: char) -> Self {
        self.events.push(SimulatedEventSource::char_key(c));
        self
    }

    /// Press Tab `n` times
    pub fn tab_times(mut self, n: usize) -> Self {
        for _ in 0..n {
            self = self.press(KeyCode::Tab);
        }
        self
    }

    pub fn move_mouse(mut self, column: u16, row: u16) -> Self {
        self.events
            .push(SimulatedEventSource::mouse_moved(column, row));
        self
    }

    pub fn click(mut self, column: u16, row: u16) -> Self {
        self.events
            .push(SimulatedEventSource::left_click(column, row));
        self
    }

    pub fn quit(self) -> Self {
        self.press_char('q')
    }

    pub fn build(self) -> SimulatedEventSource {
        SimulatedEventSource::new(self.events)
    }
}
