//! Per-page mapping from chunk id to displayed region

use std::cmp::Ordering;
use std::collections::HashMap;

use log::{debug, warn};

use crate::geometry::{
    BboxError, Dimensions, GeometryError, Point, ScaleOptions, ScaledBBox, calculate_bbox_area,
    check_dimensions, is_point_in_bbox, scale_bbox_for_display, validate_bbox,
};
use crate::structure::{ChunkId, ElementKind, PageStructure, StructuralElement};

/// Natural and on-screen size of the rendered page image, in pixels
#[derive(Clone, Copy, Debug, PartialEq, Default)]
pub struct ImageDimensions {
    pub natural: Dimensions,
    pub displayed: Dimensions,
}

impl ImageDimensions {
    #[must_use]
    pub const fn new(natural: Dimensions, displayed: Dimensions) -> Self {
        Self { natural, displayed }
    }
}

/// Why an element has no region in the overlay
#[derive(Clone, Debug, PartialEq)]
pub enum ExclusionReason {
    MissingBbox,
    InvalidNative(BboxError),
    InvalidScaled(BboxError),
}

/// A structural element paired with where it sits on screen
#[derive(Clone, Debug, PartialEq)]
pub struct Region {
    pub element: StructuralElement,
    /// Display box, `None` when the element is text-only
    pub scaled: Option<ScaledBBox>,
    pub exclusion: Option<ExclusionReason>,
    /// Drawn but skipped by keyboard traversal
    pub disabled: bool,
}

impl Region {
    pub fn chunk_id(&self) -> &ChunkId {
        &self.element.chunk_id
    }

    pub fn kind(&self) -> ElementKind {
        self.element.kind
    }

    /// Whether the region is drawn on the page overlay
    pub fn in_overlay(&self) -> bool {
        self.scaled.is_some()
    }

    /// Focusable by keyboard navigation: enabled and with a non-empty box
    pub fn is_interactable(&self) -> bool {
        !self.disabled
            && self
                .scaled
                .is_some_and(|b| b.width > 0.0 && b.height > 0.0)
    }
}

/// Options used when building a registry
#[derive(Clone, Debug, Default, PartialEq)]
pub struct RegistryOptions {
    pub scale: ScaleOptions,
    /// Kinds rendered but excluded from keyboard traversal
    pub hidden_kinds: Vec<ElementKind>,
}

/// All regions of the current page, in document order
#[derive(Clone, Debug, Default)]
pub struct RegionRegistry {
    regions: Vec<Region>,
    index: HashMap<ChunkId, usize>,
    image: Option<ImageDimensions>,
    native: Option<Dimensions>,
    duplicates: usize,
}

impl RegionRegistry {
    /// Registry with no regions; what a page without structure shows
    pub fn empty() -> Self {
        Self::default()
    }

    /// Build the registry for one page at the given image size.
    ///
    /// Fails only when the page or image dimensions are unusable. Bad
    /// per-element boxes never fail the build; those elements stay in the
    /// text view with an [`ExclusionReason`].
    pub fn build(
        structure: &PageStructure,
        image: ImageDimensions,
        options: &RegistryOptions,
    ) -> Result<Self, GeometryError> {
        let native = structure
            .coordinate_system
            .page_dimensions()
            .unwrap_or(image.natural);
        check_dimensions(native, image.displayed)?;

        let mut registry = Self {
            regions: Vec::with_capacity(structure.elements.len()),
            index: HashMap::with_capacity(structure.elements.len()),
            image: Some(image),
            native: Some(native),
            duplicates: 0,
        };

        for element in &structure.elements {
            if registry.index.contains_key(&element.chunk_id) {
                warn!(
                    "Duplicate chunk id {} on page, keeping the first occurrence",
                    element.chunk_id
                );
                registry.duplicates += 1;
                continue;
            }

            let (scaled, exclusion) = place_element(element, native, image.displayed, options)?;
            if let Some(reason) = &exclusion {
                debug!("Element {} left out of overlay: {:?}", element.chunk_id, reason);
            }

            registry
                .index
                .insert(element.chunk_id.clone(), registry.regions.len());
            registry.regions.push(Region {
                element: element.clone(),
                scaled,
                exclusion,
                disabled: options.hidden_kinds.contains(&element.kind),
            });
        }

        debug!(
            "Built region registry: {} elements, {} in overlay",
            registry.len(),
            registry.overlay_len()
        );
        Ok(registry)
    }

    /// True when `image` differs from the size this registry was built for
    #[must_use]
    pub fn needs_rebuild(&self, image: ImageDimensions) -> bool {
        self.image != Some(image)
    }

    pub fn get(&self, chunk_id: &str) -> Option<&Region> {
        self.index.get(chunk_id).map(|&i| &self.regions[i])
    }

    pub fn contains(&self, chunk_id: &str) -> bool {
        self.index.contains_key(chunk_id)
    }

    /// Position in document order
    pub fn position(&self, chunk_id: &str) -> Option<usize> {
        self.index.get(chunk_id).copied()
    }

    /// Every element of the page, including those without a region
    pub fn regions(&self) -> &[Region] {
        &self.regions
    }

    /// Regions drawn on the page overlay
    pub fn overlay_regions(&self) -> impl Iterator<Item = &Region> {
        self.regions.iter().filter(|r| r.in_overlay())
    }

    /// Regions reachable by keyboard navigation, in document order
    pub fn interactable(&self) -> impl Iterator<Item = &Region> {
        self.regions.iter().filter(|r| r.is_interactable())
    }

    /// Elements left out of the overlay, with the reason
    pub fn excluded(&self) -> impl Iterator<Item = (&ChunkId, &ExclusionReason)> {
        self.regions
            .iter()
            .filter_map(|r| r.exclusion.as_ref().map(|reason| (r.chunk_id(), reason)))
    }

    /// Innermost overlay region under `point`.
    ///
    /// Nested elements (a formula inside a table) overlap; the one with the
    /// smallest area wins, ties go to the later element in document order.
    pub fn region_at(&self, point: Point) -> Option<&Region> {
        self.overlay_regions()
            .filter_map(|r| r.scaled.as_ref().map(|b| (r, b)))
            .filter(|(_, b)| is_point_in_bbox(point, *b))
            .min_by(|(_, a), (_, b)| {
                calculate_bbox_area(*a)
                    .total_cmp(&calculate_bbox_area(*b))
                    .then(Ordering::Greater)
            })
            .map(|(r, _)| r)
    }

    pub fn len(&self) -> usize {
        self.regions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.regions.is_empty()
    }

    pub fn overlay_len(&self) -> usize {
        self.overlay_regions().count()
    }

    /// Elements dropped because their chunk id was already taken
    pub fn duplicate_count(&self) -> usize {
        self.duplicates
    }

    pub fn image_dimensions(&self) -> Option<ImageDimensions> {
        self.image
    }

    /// Page size in native units used for scaling
    pub fn native_dimensions(&self) -> Option<Dimensions> {
        self.native
    }
}

fn place_element(
    element: &StructuralElement,
    native: Dimensions,
    displayed: Dimensions,
    options: &RegistryOptions,
) -> Result<(Option<ScaledBBox>, Option<ExclusionReason>), GeometryError> {
    let Some(bbox) = element.bbox.as_ref() else {
        return Ok((None, Some(ExclusionReason::MissingBbox)));
    };

    if let Err(err) = validate_bbox(Some(bbox), native.width, native.height).into_result() {
        return Ok((None, Some(ExclusionReason::InvalidNative(err))));
    }

    let scaled = scale_bbox_for_display(bbox, native, displayed, &options.scale)?;

    if let Err(err) = validate_bbox(Some(&scaled), displayed.width, displayed.height).into_result()
    {
        return Ok((None, Some(ExclusionReason::InvalidScaled(err))));
    }

    Ok((Some(scaled), None))
}
