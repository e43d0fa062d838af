//! Property tests for the scaling pipeline and the overlap helpers.
//!
//! 1. Same-size scaling is the identity.
//! 2. Scaling there and back recovers the native box.
//! 3. Growing to the minimum keeps the center and reaches the minimum.
//! 4. Clamped boxes stay inside the displayed canvas.
//! 5. IoU of a box with itself is 1 and IoU is symmetric.
//! 6. A box's own center hits it.

use pagelens::geometry::{
    BBox, Dimensions, Point, ScaleOptions, ScaledBBox, calculate_bbox_area, calculate_iou,
    ensure_minimum_size, is_point_in_bbox, scale_bbox_for_display, validate_bbox,
};
use proptest::prelude::*;

const EPS: f64 = 1e-6;

fn page_strategy() -> impl Strategy<Value = Dimensions> {
    (100.0f64..2000.0, 100.0f64..2000.0).prop_map(|(w, h)| Dimensions::new(w, h))
}

/// A page with a box that validates against it
fn page_and_box() -> impl Strategy<Value = (Dimensions, BBox)> {
    page_strategy().prop_flat_map(|page| {
        (
            Just(page),
            0.0..page.width * 0.9,
            0.0..page.height * 0.9,
            0.01f64..1.0,
            0.01f64..1.0,
        )
            .prop_map(|(page, x1, y1, fw, fh)| {
                let x2 = x1 + (page.width - x1) * fw;
                let y2 = y1 + (page.height - y1) * fh;
                (page, BBox::new(x1, y1, x2, y2))
            })
    })
}

fn scaled_strategy() -> impl Strategy<Value = ScaledBBox> {
    (0.0f64..1000.0, 0.0f64..1000.0, 0.5f64..500.0, 0.5f64..500.0)
        .prop_map(|(x, y, w, h)| ScaledBBox::from_corners(x, y, x + w, y + h))
}

fn close(a: f64, b: f64) -> bool {
    (a - b).abs() <= EPS * a.abs().max(b.abs()).max(1.0)
}

proptest! {
    #[test]
    fn same_size_scaling_is_identity((page, bbox) in page_and_box()) {
        let scaled = scale_bbox_for_display(&bbox, page, page, &ScaleOptions::linear()).unwrap();
        prop_assert_eq!(
            (scaled.x1, scaled.y1, scaled.x2, scaled.y2),
            (bbox.x1, bbox.y1, bbox.x2, bbox.y2)
        );
    }
}

proptest! {
    #[test]
    fn scaling_round_trips((page, bbox) in page_and_box(), displayed in page_strategy()) {
        let there = scale_bbox_for_display(&bbox, page, displayed, &ScaleOptions::linear()).unwrap();
        let back = scale_bbox_for_display(
            &BBox::new(there.x1, there.y1, there.x2, there.y2),
            displayed,
            page,
            &ScaleOptions::linear(),
        )
        .unwrap();
        prop_assert!(close(back.x1, bbox.x1), "x1 {} vs {}", back.x1, bbox.x1);
        prop_assert!(close(back.y1, bbox.y1), "y1 {} vs {}", back.y1, bbox.y1);
        prop_assert!(close(back.x2, bbox.x2), "x2 {} vs {}", back.x2, bbox.x2);
        prop_assert!(close(back.y2, bbox.y2), "y2 {} vs {}", back.y2, bbox.y2);
    }
}

proptest! {
    #[test]
    fn minimum_size_keeps_center(bbox in scaled_strategy(), min_size in 1.0f64..50.0) {
        let grown = ensure_minimum_size(bbox, min_size);
        let (before, after) = (bbox.center(), grown.center());
        prop_assert!(close(before.x, after.x));
        prop_assert!(close(before.y, after.y));
        prop_assert!(grown.width + EPS >= min_size);
        prop_assert!(grown.height + EPS >= min_size);
        prop_assert!(grown.width + EPS >= bbox.width);
        prop_assert!(close(grown.width, grown.x2 - grown.x1));
    }
}

proptest! {
    #[test]
    fn clamped_boxes_stay_on_canvas(
        (page, bbox) in page_and_box(),
        displayed in page_strategy(),
        min_size in 1.0f64..80.0,
    ) {
        let options = ScaleOptions { enforce_minimum: true, min_size, clamp_to_bounds: true };
        let scaled = scale_bbox_for_display(&bbox, page, displayed, &options).unwrap();
        prop_assert!(scaled.x1 >= 0.0 && scaled.y1 >= 0.0);
        prop_assert!(scaled.x2 <= displayed.width && scaled.y2 <= displayed.height);
        prop_assert!(
            validate_bbox(Some(&scaled), displayed.width, displayed.height).valid,
            "{:?} invalid on {:?}",
            scaled,
            displayed
        );
    }
}

proptest! {
    #[test]
    fn iou_is_one_with_itself_and_symmetric(a in scaled_strategy(), b in scaled_strategy()) {
        prop_assert!(close(calculate_iou(&a, &a), 1.0));
        let ab = calculate_iou(&a, &b);
        prop_assert!(close(ab, calculate_iou(&b, &a)));
        prop_assert!((0.0..=1.0 + EPS).contains(&ab));
        prop_assert!(calculate_bbox_area(&a) > 0.0);
    }
}

proptest! {
    #[test]
    fn center_hits_its_box(bbox in scaled_strategy()) {
        prop_assert!(is_point_in_bbox(bbox.center(), &bbox));
        let outside = Point::new(bbox.x2 + 1.0, bbox.y1);
        prop_assert!(!is_point_in_bbox(outside, &bbox));
    }
}
