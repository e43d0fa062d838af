//! Geometry for placing document regions on a displayed page image
//!
//! Native boxes come from the structure service in the document's own unit
//! space (page points, top-left origin once decoded). Everything here is a
//! pure function: scale into display pixels, enforce a clickable minimum,
//! clamp to the canvas, and a handful of overlap helpers used for hit testing.

use serde::{Deserialize, Serialize};

/// Default minimum edge length of a displayed region, in display pixels
pub const DEFAULT_MIN_SIZE: f64 = 10.0;

/// A point in display pixel space
#[derive(Clone, Copy, Debug, PartialEq, Default)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    #[must_use]
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// Width/height pair for a page in some unit space
#[derive(Clone, Copy, Debug, PartialEq, Default, Serialize, Deserialize)]
pub struct Dimensions {
    pub width: f64,
    pub height: f64,
}

impl Dimensions {
    #[must_use]
    pub const fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }

    /// True when both sides are finite and strictly positive
    #[must_use]
    pub fn is_valid(&self) -> bool {
        is_positive_finite(self.width) && is_positive_finite(self.height)
    }
}

/// Rectangle in native document units, top-left origin
#[derive(Clone, Copy, Debug, PartialEq, Default, Serialize, Deserialize)]
pub struct BBox {
    pub x1: f64,
    pub y1: f64,
    pub x2: f64,
    pub y2: f64,
}

impl BBox {
    #[must_use]
    pub const fn new(x1: f64, y1: f64, x2: f64, y2: f64) -> Self {
        Self { x1, y1, x2, y2 }
    }

    #[must_use]
    pub fn width(&self) -> f64 {
        self.x2 - self.x1
    }

    #[must_use]
    pub fn height(&self) -> f64 {
        self.y2 - self.y1
    }
}

/// Rectangle in display pixels, produced by [`scale_bbox_for_display`]
///
/// `width` and `height` always equal `x2 - x1` and `y2 - y1`.
#[derive(Clone, Copy, Debug, PartialEq, Default)]
pub struct ScaledBBox {
    pub x1: f64,
    pub y1: f64,
    pub x2: f64,
    pub y2: f64,
    pub width: f64,
    pub height: f64,
}

impl ScaledBBox {
    #[must_use]
    pub fn from_corners(x1: f64, y1: f64, x2: f64, y2: f64) -> Self {
        Self {
            x1,
            y1,
            x2,
            y2,
            width: x2 - x1,
            height: y2 - y1,
        }
    }

    #[must_use]
    pub fn center(&self) -> Point {
        Point::new((self.x1 + self.x2) / 2.0, (self.y1 + self.y2) / 2.0)
    }
}

/// Read access to the four corners of a rectangle
///
/// Lets validation and the overlap helpers work on both native and scaled boxes.
pub trait Corners {
    fn corners(&self) -> (f64, f64, f64, f64);
}

impl Corners for BBox {
    fn corners(&self) -> (f64, f64, f64, f64) {
        (self.x1, self.y1, self.x2, self.y2)
    }
}

impl Corners for ScaledBBox {
    fn corners(&self) -> (f64, f64, f64, f64) {
        (self.x1, self.y1, self.x2, self.y2)
    }
}

/// Errors from the scaling pipeline. These indicate a caller bug.
#[derive(Debug, Clone, Copy, PartialEq, thiserror::Error)]
pub enum GeometryError {
    #[error("invalid {name}: {value} (dimensions must be positive and finite)")]
    InvalidDimension { name: &'static str, value: f64 },
}

/// Why a box was rejected by [`validate_bbox`]
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum BboxError {
    #[error("Missing bounding box")]
    Missing,
    #[error("Invalid image dimensions: {width}x{height}")]
    InvalidImageDimensions { width: f64, height: f64 },
    #[error("Non-finite coordinate in bounding box")]
    NonFinite,
    #[error("Negative origin: ({x1}, {y1})")]
    NegativeOrigin { x1: f64, y1: f64 },
    #[error("Invalid width: x2 ({x2}) must be greater than x1 ({x1})")]
    InvalidWidth { x1: f64, x2: f64 },
    #[error("Invalid height: y2 ({y2}) must be greater than y1 ({y1})")]
    InvalidHeight { y1: f64, y2: f64 },
    #[error("Out of bounds: box extends past {width}x{height}")]
    OutOfBounds { width: f64, height: f64 },
}

/// Validation verdict, `error` is set exactly when `valid` is false
#[derive(Debug, Clone, PartialEq)]
pub struct BboxValidation {
    pub valid: bool,
    pub error: Option<BboxError>,
}

impl BboxValidation {
    #[must_use]
    pub fn ok() -> Self {
        Self {
            valid: true,
            error: None,
        }
    }

    #[must_use]
    pub fn invalid(error: BboxError) -> Self {
        Self {
            valid: false,
            error: Some(error),
        }
    }

    pub fn into_result(self) -> Result<(), BboxError> {
        match self.error {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}

/// Knobs for [`scale_bbox_for_display`]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScaleOptions {
    /// Grow boxes smaller than `min_size` about their center
    pub enforce_minimum: bool,
    /// Minimum edge length in display pixels
    pub min_size: f64,
    /// Clamp the result into the displayed canvas
    pub clamp_to_bounds: bool,
}

impl Default for ScaleOptions {
    fn default() -> Self {
        Self {
            enforce_minimum: true,
            min_size: DEFAULT_MIN_SIZE,
            clamp_to_bounds: true,
        }
    }
}

impl ScaleOptions {
    /// Pure linear transform: no minimum, no clamping
    #[must_use]
    pub fn linear() -> Self {
        Self {
            enforce_minimum: false,
            min_size: DEFAULT_MIN_SIZE,
            clamp_to_bounds: false,
        }
    }
}

fn is_positive_finite(value: f64) -> bool {
    value.is_finite() && value > 0.0
}

fn check_dimension(name: &'static str, value: f64) -> Result<(), GeometryError> {
    if is_positive_finite(value) {
        Ok(())
    } else {
        Err(GeometryError::InvalidDimension { name, value })
    }
}

/// Check both coordinate spaces before any scaling happens
pub fn check_dimensions(original: Dimensions, displayed: Dimensions) -> Result<(), GeometryError> {
    check_dimension("originalWidth", original.width)?;
    check_dimension("originalHeight", original.height)?;
    check_dimension("displayedWidth", displayed.width)?;
    check_dimension("displayedHeight", displayed.height)?;
    Ok(())
}

/// Map a native box into display pixels.
///
/// Horizontal and vertical factors are independent, so a page rendered at a
/// slightly different aspect ratio still lines up. After the linear map the
/// box is optionally grown to `min_size` and clamped to the canvas, in that
/// order.
pub fn scale_bbox_for_display(
    bbox: &BBox,
    original: Dimensions,
    displayed: Dimensions,
    options: &ScaleOptions,
) -> Result<ScaledBBox, GeometryError> {
    check_dimensions(original, displayed)?;

    let sx = displayed.width / original.width;
    let sy = displayed.height / original.height;

    let mut scaled = ScaledBBox::from_corners(bbox.x1 * sx, bbox.y1 * sy, bbox.x2 * sx, bbox.y2 * sy);

    if options.enforce_minimum {
        scaled = ensure_minimum_size(scaled, options.min_size);
    }

    if options.clamp_to_bounds {
        scaled = ScaledBBox::from_corners(
            scaled.x1.clamp(0.0, displayed.width),
            scaled.y1.clamp(0.0, displayed.height),
            scaled.x2.clamp(0.0, displayed.width),
            scaled.y2.clamp(0.0, displayed.height),
        );
    }

    Ok(scaled)
}

/// Grow a box about its own center until both sides reach `min_size`.
///
/// Axes already at or above the minimum are left untouched.
#[must_use]
pub fn ensure_minimum_size(bbox: ScaledBBox, min_size: f64) -> ScaledBBox {
    if !is_positive_finite(min_size) {
        return bbox;
    }

    let (mut x1, mut y1, mut x2, mut y2) = bbox.corners();
    let center = bbox.center();
    let half = min_size / 2.0;

    if bbox.width < min_size {
        x1 = center.x - half;
        x2 = center.x + half;
    }
    if bbox.height < min_size {
        y1 = center.y - half;
        y2 = center.y + half;
    }

    if (x1, y1, x2, y2) == bbox.corners() {
        bbox
    } else {
        ScaledBBox::from_corners(x1, y1, x2, y2)
    }
}

/// Check a box against an image of the given size.
///
/// Tiny boxes are valid; sizing is handled by [`ensure_minimum_size`].
#[must_use]
pub fn validate_bbox<B: Corners>(
    bbox: Option<&B>,
    image_width: f64,
    image_height: f64,
) -> BboxValidation {
    let Some(bbox) = bbox else {
        return BboxValidation::invalid(BboxError::Missing);
    };

    if !is_positive_finite(image_width) || !is_positive_finite(image_height) {
        return BboxValidation::invalid(BboxError::InvalidImageDimensions {
            width: image_width,
            height: image_height,
        });
    }

    let (x1, y1, x2, y2) = bbox.corners();

    if ![x1, y1, x2, y2].iter().all(|v| v.is_finite()) {
        return BboxValidation::invalid(BboxError::NonFinite);
    }
    if x1 < 0.0 || y1 < 0.0 {
        return BboxValidation::invalid(BboxError::NegativeOrigin { x1, y1 });
    }
    if x2 <= x1 {
        return BboxValidation::invalid(BboxError::InvalidWidth { x1, x2 });
    }
    if y2 <= y1 {
        return BboxValidation::invalid(BboxError::InvalidHeight { y1, y2 });
    }
    if x1 > image_width || y1 > image_height || x2 > image_width || y2 > image_height {
        return BboxValidation::invalid(BboxError::OutOfBounds {
            width: image_width,
            height: image_height,
        });
    }

    BboxValidation::ok()
}

/// Area of a box, zero for inverted boxes
#[must_use]
pub fn calculate_bbox_area<B: Corners>(bbox: &B) -> f64 {
    let (x1, y1, x2, y2) = bbox.corners();
    let width = x2 - x1;
    let height = y2 - y1;
    if width <= 0.0 || height <= 0.0 {
        0.0
    } else {
        width * height
    }
}

/// Point containment, inclusive of every edge
#[must_use]
pub fn is_point_in_bbox<B: Corners>(point: Point, bbox: &B) -> bool {
    let (x1, y1, x2, y2) = bbox.corners();
    point.x >= x1 && point.x <= x2 && point.y >= y1 && point.y <= y2
}

/// Overlapping area of two boxes; boxes that only share an edge overlap by zero
#[must_use]
pub fn calculate_intersection_area<A: Corners, B: Corners>(a: &A, b: &B) -> f64 {
    let (ax1, ay1, ax2, ay2) = a.corners();
    let (bx1, by1, bx2, by2) = b.corners();

    let width = ax2.min(bx2) - ax1.max(bx1);
    let height = ay2.min(by2) - ay1.max(by1);

    if width <= 0.0 || height <= 0.0 {
        0.0
    } else {
        width * height
    }
}

/// Intersection over union in `[0, 1]`
#[must_use]
pub fn calculate_iou<A: Corners, B: Corners>(a: &A, b: &B) -> f64 {
    let intersection = calculate_intersection_area(a, b);
    if intersection == 0.0 {
        return 0.0;
    }
    let union = calculate_bbox_area(a) + calculate_bbox_area(b) - intersection;
    if union <= 0.0 {
        0.0
    } else {
        intersection / union
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const LETTER: Dimensions = Dimensions::new(612.0, 792.0);

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn scaling_to_same_size_is_identity() {
        let bbox = BBox::new(72.0, 100.0, 300.0, 140.0);
        let scaled = scale_bbox_for_display(&bbox, LETTER, LETTER, &ScaleOptions::default()).unwrap();
        assert_eq!(scaled, ScaledBBox::from_corners(72.0, 100.0, 300.0, 140.0));
    }

    #[test]
    fn scaling_is_anisotropic() {
        let bbox = BBox::new(100.0, 100.0, 200.0, 200.0);
        let displayed = Dimensions::new(1224.0, 396.0);
        let scaled =
            scale_bbox_for_display(&bbox, LETTER, displayed, &ScaleOptions::linear()).unwrap();
        assert!(approx(scaled.x1, 200.0));
        assert!(approx(scaled.x2, 400.0));
        assert!(approx(scaled.y1, 50.0));
        assert!(approx(scaled.y2, 100.0));
        assert!(approx(scaled.width, 200.0));
        assert!(approx(scaled.height, 50.0));
    }

    #[test]
    fn scaling_rejects_bad_dimensions() {
        let bbox = BBox::new(0.0, 0.0, 10.0, 10.0);
        let opts = ScaleOptions::default();

        let err = scale_bbox_for_display(&bbox, Dimensions::new(0.0, 792.0), LETTER, &opts);
        assert_eq!(
            err,
            Err(GeometryError::InvalidDimension {
                name: "originalWidth",
                value: 0.0
            })
        );

        assert!(scale_bbox_for_display(&bbox, LETTER, Dimensions::new(612.0, -1.0), &opts).is_err());
        assert!(
            scale_bbox_for_display(&bbox, LETTER, Dimensions::new(f64::NAN, 10.0), &opts).is_err()
        );
        assert!(
            scale_bbox_for_display(&bbox, Dimensions::new(612.0, f64::INFINITY), LETTER, &opts)
                .is_err()
        );
    }

    #[test]
    fn thin_rule_line_is_grown_on_deficient_axis_only() {
        // A horizontal rule: wide but almost no height
        let bbox = BBox::new(100.0, 400.0, 500.0, 400.5);
        let scaled =
            scale_bbox_for_display(&bbox, LETTER, LETTER, &ScaleOptions::default()).unwrap();

        assert!(approx(scaled.x1, 100.0));
        assert!(approx(scaled.x2, 500.0));
        assert!(approx(scaled.height, 10.0));
        assert!(approx(scaled.center().y, 400.25));
    }

    #[test]
    fn clamping_keeps_grown_box_on_canvas() {
        let bbox = BBox::new(0.0, 0.0, 1.0, 1.0);
        let scaled =
            scale_bbox_for_display(&bbox, LETTER, LETTER, &ScaleOptions::default()).unwrap();
        assert_eq!(scaled.x1, 0.0);
        assert_eq!(scaled.y1, 0.0);
        assert!(approx(scaled.x2, 5.5));
        assert!(approx(scaled.y2, 5.5));

        let unclamped = ScaleOptions {
            clamp_to_bounds: false,
            ..ScaleOptions::default()
        };
        let scaled = scale_bbox_for_display(&bbox, LETTER, LETTER, &unclamped).unwrap();
        assert!(approx(scaled.x1, -4.5));
        assert!(approx(scaled.width, 10.0));
    }

    #[test]
    fn ensure_minimum_size_noops() {
        let bbox = ScaledBBox::from_corners(10.0, 10.0, 12.0, 12.0);
        assert_eq!(ensure_minimum_size(bbox, 0.0), bbox);
        assert_eq!(ensure_minimum_size(bbox, -5.0), bbox);

        let big = ScaledBBox::from_corners(10.0, 10.0, 40.0, 40.0);
        assert_eq!(ensure_minimum_size(big, 10.0), big);
    }

    #[test]
    fn ensure_minimum_size_preserves_center() {
        let bbox = ScaledBBox::from_corners(10.0, 20.0, 12.0, 50.0);
        let grown = ensure_minimum_size(bbox, 10.0);
        assert_eq!(grown.center(), bbox.center());
        assert!(approx(grown.width, 10.0));
        assert!(approx(grown.height, 30.0));
    }

    #[test]
    fn validation_accepts_tiny_box() {
        let bbox = BBox::new(50.0, 50.0, 51.0, 51.0);
        let verdict = validate_bbox(Some(&bbox), 612.0, 792.0);
        assert!(verdict.valid);
        assert!(verdict.error.is_none());
    }

    #[test]
    fn validation_reports_invalid_width() {
        let bbox = BBox::new(100.0, 20.0, 50.0, 200.0);
        let verdict = validate_bbox(Some(&bbox), 612.0, 792.0);
        assert!(!verdict.valid);
        let message = verdict.error.unwrap().to_string();
        assert!(message.starts_with("Invalid width"), "{message}");
    }

    #[test]
    fn validation_rejections() {
        let cases = [
            (None, 612.0, 792.0, BboxError::Missing),
            (
                Some(BBox::new(0.0, 0.0, 1.0, 1.0)),
                0.0,
                792.0,
                BboxError::InvalidImageDimensions {
                    width: 0.0,
                    height: 792.0,
                },
            ),
            (
                Some(BBox::new(0.0, f64::NAN, 1.0, 1.0)),
                612.0,
                792.0,
                BboxError::NonFinite,
            ),
            (
                Some(BBox::new(-1.0, 0.0, 1.0, 1.0)),
                612.0,
                792.0,
                BboxError::NegativeOrigin { x1: -1.0, y1: 0.0 },
            ),
            (
                Some(BBox::new(0.0, 10.0, 5.0, 10.0)),
                612.0,
                792.0,
                BboxError::InvalidHeight { y1: 10.0, y2: 10.0 },
            ),
            (
                Some(BBox::new(600.0, 10.0, 613.0, 20.0)),
                612.0,
                792.0,
                BboxError::OutOfBounds {
                    width: 612.0,
                    height: 792.0,
                },
            ),
        ];

        for (bbox, w, h, expected) in cases {
            let verdict = validate_bbox(bbox.as_ref(), w, h);
            assert_eq!(verdict, BboxValidation::invalid(expected));
        }
    }

    #[test]
    fn validation_accepts_box_touching_far_edge() {
        let bbox = BBox::new(0.0, 0.0, 612.0, 792.0);
        assert!(validate_bbox(Some(&bbox), 612.0, 792.0).valid);
    }

    #[test]
    fn overlap_helpers() {
        let a = BBox::new(0.0, 0.0, 10.0, 10.0);
        let b = BBox::new(5.0, 5.0, 15.0, 15.0);
        let touching = BBox::new(10.0, 0.0, 20.0, 10.0);
        let far = BBox::new(100.0, 100.0, 110.0, 110.0);

        assert_eq!(calculate_bbox_area(&a), 100.0);
        assert_eq!(calculate_intersection_area(&a, &b), 25.0);
        assert_eq!(calculate_intersection_area(&a, &touching), 0.0);
        assert_eq!(calculate_intersection_area(&a, &far), 0.0);

        assert_eq!(calculate_iou(&a, &a), 1.0);
        assert_eq!(calculate_iou(&a, &far), 0.0);
        assert!(approx(calculate_iou(&a, &b), 25.0 / 175.0));
    }

    #[test]
    fn point_containment_includes_edges() {
        let bbox = ScaledBBox::from_corners(10.0, 10.0, 20.0, 20.0);
        assert!(is_point_in_bbox(Point::new(10.0, 10.0), &bbox));
        assert!(is_point_in_bbox(Point::new(20.0, 20.0), &bbox));
        assert!(is_point_in_bbox(Point::new(15.0, 20.0), &bbox));
        assert!(!is_point_in_bbox(Point::new(20.01, 15.0), &bbox));
        assert!(!is_point_in_bbox(Point::new(9.99, 15.0), &bbox));
    }
}
