//! Structural elements and the wire format they arrive in

use std::borrow::Borrow;
use std::fmt;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::geometry::{BBox, Dimensions};

/// Stable identifier pairing a page region with its text chunk
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ChunkId(String);

impl ChunkId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ChunkId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl Borrow<str> for ChunkId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl From<&str> for ChunkId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for ChunkId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

/// Kind of structural element found by document analysis
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ElementKind {
    Heading,
    Table,
    Picture,
    CodeBlock,
    Formula,
    Text,
}

impl ElementKind {
    pub fn label(&self) -> &'static str {
        match self {
            ElementKind::Heading => "Heading",
            ElementKind::Table => "Table",
            ElementKind::Picture => "Picture",
            ElementKind::CodeBlock => "Code block",
            ElementKind::Formula => "Formula",
            ElementKind::Text => "Text",
        }
    }

    /// Single-character tag for compact views
    pub fn tag(&self) -> char {
        match self {
            ElementKind::Heading => 'H',
            ElementKind::Table => 'T',
            ElementKind::Picture => 'P',
            ElementKind::CodeBlock => 'C',
            ElementKind::Formula => 'F',
            ElementKind::Text => 'X',
        }
    }
}

/// Descriptive data carried alongside an element
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ElementMetadata {
    /// Heading level, 1-based
    pub level: Option<u8>,
    /// Titles of the enclosing sections, outermost first
    pub section_path: Vec<String>,
    pub text: Option<String>,
    pub caption: Option<String>,
}

impl ElementMetadata {
    /// Best available human-readable text for the element
    pub fn display_text(&self) -> Option<&str> {
        [self.text.as_deref(), self.caption.as_deref()]
            .into_iter()
            .flatten()
            .map(str::trim)
            .find(|t| !t.is_empty())
    }
}

/// One element of a page, with its native box when analysis could place it
#[derive(Clone, Debug, PartialEq)]
pub struct StructuralElement {
    pub kind: ElementKind,
    pub chunk_id: ChunkId,
    pub bbox: Option<BBox>,
    pub metadata: ElementMetadata,
}

impl StructuralElement {
    pub fn new(kind: ElementKind, chunk_id: impl Into<ChunkId>, bbox: Option<BBox>) -> Self {
        Self {
            kind,
            chunk_id: chunk_id.into(),
            bbox,
            metadata: ElementMetadata::default(),
        }
    }

    #[must_use]
    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.metadata.text = Some(text.into());
        self
    }
}

/// Where the declared coordinate space puts its origin
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum CoordOrigin {
    #[default]
    #[serde(rename = "BOTTOMLEFT", alias = "bottom_left", alias = "bottomleft")]
    BottomLeft,
    #[serde(rename = "TOPLEFT", alias = "top_left", alias = "topleft")]
    TopLeft,
}

/// Coordinate space declared by the structure payload
#[derive(Clone, Debug, PartialEq, Default, Serialize, Deserialize)]
pub struct CoordinateSystem {
    #[serde(default)]
    pub origin: CoordOrigin,
    #[serde(default)]
    pub page_width: f64,
    #[serde(default)]
    pub page_height: f64,
    #[serde(default = "default_units")]
    pub units: String,
}

fn default_units() -> String {
    "pt".to_string()
}

impl CoordinateSystem {
    /// Declared page size, if the payload gave a usable one
    pub fn page_dimensions(&self) -> Option<Dimensions> {
        let dims = Dimensions::new(self.page_width, self.page_height);
        dims.is_valid().then_some(dims)
    }

    /// Convert a wire box `[left, bottom, right, top]` to a top-left-origin box.
    ///
    /// No reordering happens here: an inverted wire box stays inverted and is
    /// rejected later by validation.
    pub fn to_bbox(&self, raw: [f64; 4]) -> BBox {
        let [left, bottom, right, top] = raw;
        match self.origin {
            CoordOrigin::BottomLeft => BBox::new(
                left,
                self.page_height - top,
                right,
                self.page_height - bottom,
            ),
            CoordOrigin::TopLeft => BBox::new(left, top, right, bottom),
        }
    }
}

/// Structure of one page in document order
#[derive(Clone, Debug, Default, PartialEq)]
pub struct PageStructure {
    pub has_structure: bool,
    pub elements: Vec<StructuralElement>,
    pub coordinate_system: CoordinateSystem,
}

impl PageStructure {
    /// No structure available; renders no overlay
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn from_json(payload: &str) -> Result<Self, StructureError> {
        let wire: WirePage = serde_json::from_str(payload)?;
        Ok(wire.into_structure())
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }
}

/// Errors while obtaining or decoding page structure
#[derive(Debug, thiserror::Error)]
pub enum StructureError {
    #[error("malformed structure payload: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("failed to read {path:?}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("{detail}")]
    Fetch { detail: String },
}

impl StructureError {
    pub fn fetch(msg: impl Into<String>) -> Self {
        Self::Fetch { detail: msg.into() }
    }
}

#[derive(Debug, Deserialize)]
struct WireElement {
    chunk_id: String,
    #[serde(default)]
    bbox: Option<[f64; 4]>,
    #[serde(default)]
    level: Option<u8>,
    #[serde(default)]
    text: Option<String>,
    #[serde(default)]
    caption: Option<String>,
    #[serde(default)]
    section_path: Vec<String>,
    #[serde(default)]
    order: Option<usize>,
}

#[derive(Debug, Deserialize)]
struct WirePage {
    #[serde(default)]
    has_structure: bool,
    #[serde(default)]
    headings: Vec<WireElement>,
    #[serde(default)]
    tables: Vec<WireElement>,
    #[serde(default)]
    pictures: Vec<WireElement>,
    #[serde(default)]
    code_blocks: Vec<WireElement>,
    #[serde(default)]
    formulas: Vec<WireElement>,
    #[serde(default)]
    texts: Vec<WireElement>,
    #[serde(default)]
    coordinate_system: CoordinateSystem,
}

impl WirePage {
    fn into_structure(self) -> PageStructure {
        let coords = self.coordinate_system;
        if !self.has_structure {
            return PageStructure {
                has_structure: false,
                elements: Vec::new(),
                coordinate_system: coords,
            };
        }

        let groups = [
            (ElementKind::Heading, self.headings),
            (ElementKind::Table, self.tables),
            (ElementKind::Picture, self.pictures),
            (ElementKind::CodeBlock, self.code_blocks),
            (ElementKind::Formula, self.formulas),
            (ElementKind::Text, self.texts),
        ];

        // (explicit order, arrival sequence, element)
        let mut ordered: Vec<(Option<usize>, usize, StructuralElement)> = Vec::new();
        for (kind, items) in groups {
            for item in items {
                let seq = ordered.len();
                let element = StructuralElement {
                    kind,
                    chunk_id: ChunkId::new(item.chunk_id),
                    bbox: item.bbox.map(|raw| coords.to_bbox(raw)),
                    metadata: ElementMetadata {
                        level: item.level,
                        section_path: item.section_path,
                        text: item.text,
                        caption: item.caption,
                    },
                };
                ordered.push((item.order, seq, element));
            }
        }

        // Explicitly ordered elements first by their index, the rest keep arrival order
        ordered.sort_by_key(|(order, seq, _)| (order.is_none(), order.unwrap_or(0), *seq));

        PageStructure {
            has_structure: true,
            elements: ordered.into_iter().map(|(_, _, el)| el).collect(),
            coordinate_system: coords,
        }
    }
}
