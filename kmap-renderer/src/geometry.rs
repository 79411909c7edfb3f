//! Plane geometry shared by every placed shape.
//!
//! All functions return finite values for finite input. Degenerate input
//! (zero-length segments, a point at a box center) resolves to a fixed
//! fallback instead of propagating `NaN` into drawing calls.

use serde::{Deserialize, Serialize};

/// A point in graph coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    /// X coordinate.
    pub x: f64,
    /// Y coordinate.
    pub y: f64,
}

impl Point {
    /// Create a point.
    #[must_use]
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

impl From<(f64, f64)> for Point {
    fn from((x, y): (f64, f64)) -> Self {
        Self { x, y }
    }
}

/// An axis-aligned box.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct BoundingBox {
    /// Left edge.
    pub min_x: f64,
    /// Top edge.
    pub min_y: f64,
    /// Right edge.
    pub max_x: f64,
    /// Bottom edge.
    pub max_y: f64,
}

impl BoundingBox {
    /// Create a box from its edges.
    #[must_use]
    pub const fn new(min_x: f64, min_y: f64, max_x: f64, max_y: f64) -> Self {
        Self {
            min_x,
            min_y,
            max_x,
            max_y,
        }
    }

    /// Create a box of the given size centered on `(x, y)`.
    #[must_use]
    pub fn from_center(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self::new(x - width / 2.0, y - height / 2.0, x + width / 2.0, y + height / 2.0)
    }

    /// Smallest box containing every point, or `None` for no points.
    #[must_use]
    pub fn from_points(points: impl IntoIterator<Item = Point>) -> Option<Self> {
        points.into_iter().fold(None, |acc, p| {
            let point_box = Self::new(p.x, p.y, p.x, p.y);
            Some(acc.map_or(point_box, |b: Self| b.union(&point_box)))
        })
    }

    /// Width of the box.
    #[must_use]
    pub fn width(&self) -> f64 {
        self.max_x - self.min_x
    }

    /// Height of the box.
    #[must_use]
    pub fn height(&self) -> f64 {
        self.max_y - self.min_y
    }

    /// Center of the box.
    #[must_use]
    pub fn center(&self) -> Point {
        Point::new(
            (self.min_x + self.max_x) / 2.0,
            (self.min_y + self.max_y) / 2.0,
        )
    }

    /// Whether the point lies inside or on the border.
    #[must_use]
    pub fn contains(&self, x: f64, y: f64) -> bool {
        x >= self.min_x && x <= self.max_x && y >= self.min_y && y <= self.max_y
    }

    /// Whether `other` lies completely inside this box (borders included).
    #[must_use]
    pub fn encloses(&self, other: &Self) -> bool {
        self.min_x <= other.min_x
            && self.min_y <= other.min_y
            && self.max_x >= other.max_x
            && self.max_y >= other.max_y
    }

    /// Smallest box containing both boxes.
    #[must_use]
    pub fn union(&self, other: &Self) -> Self {
        Self::new(
            self.min_x.min(other.min_x),
            self.min_y.min(other.min_y),
            self.max_x.max(other.max_x),
            self.max_y.max(other.max_y),
        )
    }

    /// Grow the box by `amount` on every side.
    #[must_use]
    pub fn expand(&self, amount: f64) -> Self {
        Self::new(
            self.min_x - amount,
            self.min_y - amount,
            self.max_x + amount,
            self.max_y + amount,
        )
    }

    /// Build a normalized box from two arbitrary corners.
    #[must_use]
    pub fn from_corners(a: Point, b: Point) -> Self {
        Self::new(a.x.min(b.x), a.y.min(b.y), a.x.max(b.x), a.y.max(b.y))
    }
}

/// Find where the ray from the center of `bbox` through `(x, y)` crosses the
/// box border.
///
/// With `validate`, a point strictly inside the box is returned unchanged.
/// A point at the exact center is also returned unchanged.
#[must_use]
pub fn point_on_rect(x: f64, y: f64, bbox: &BoundingBox, validate: bool) -> Point {
    let BoundingBox {
        min_x,
        min_y,
        max_x,
        max_y,
    } = *bbox;

    if validate && (min_x < x && x < max_x) && (min_y < y && y < max_y) {
        return Point::new(x, y);
    }

    let mid_x = (min_x + max_x) / 2.0;
    let mid_y = (min_y + max_y) / 2.0;
    // Vertical rays give an infinite slope; the divisions below then yield x.
    let m = (mid_y - y) / (mid_x - x);

    if x <= mid_x {
        let min_xy = m * (min_x - x) + y;
        if min_y <= min_xy && min_xy <= max_y {
            return Point::new(min_x, min_xy);
        }
    }

    if x >= mid_x {
        let max_xy = m * (max_x - x) + y;
        if min_y <= max_xy && max_xy <= max_y {
            return Point::new(max_x, max_xy);
        }
    }

    if y <= mid_y {
        let min_yx = (min_y - y) / m + x;
        if min_x <= min_yx && min_yx <= max_x {
            return Point::new(min_yx, min_y);
        }
    }

    if y >= mid_y {
        let max_yx = (max_y - y) / m + x;
        if min_x <= max_yx && max_yx <= max_x {
            return Point::new(max_yx, max_y);
        }
    }

    // Only reached at the exact center, where the slope is 0/0.
    Point::new(x, y)
}

/// Rotation of the segment `start -> end` as `(sin, cos)`.
///
/// A zero-length segment is treated as pointing along +x.
fn segment_rotation(start: Point, end: Point) -> (f64, f64) {
    let dx = end.x - start.x;
    let dy = end.y - start.y;
    let len = dx.hypot(dy);
    if len == 0.0 || !len.is_finite() {
        (0.0, 1.0)
    } else {
        (dy / len, dx / len)
    }
}

/// Map a control point defined relative to a line pointing along +x and
/// ending at the origin onto the real segment `start -> end`.
///
/// The result is the point rotated by the segment's angle and translated to
/// `end`.
#[must_use]
pub fn transform_control_point(start: Point, end: Point, local: Point) -> Point {
    let (sin, cos) = segment_rotation(start, end);
    Point::new(
        local.x * cos - local.y * sin + end.x,
        local.x * sin + local.y * cos + end.y,
    )
}

/// [`transform_control_point`] for a list of points, computing the rotation
/// once.
pub fn transform_control_points<'a>(
    start: Point,
    end: Point,
    points: &'a [Point],
) -> impl Iterator<Item = Point> + 'a {
    let (sin, cos) = segment_rotation(start, end);
    points.iter().map(move |p| {
        Point::new(
            p.x * cos - p.y * sin + end.x,
            p.x * sin + p.y * cos + end.y,
        )
    })
}

/// Squared distance between two points.
#[must_use]
pub fn distance_unsq(x0: f64, y0: f64, x1: f64, y1: f64) -> f64 {
    let dx = x1 - x0;
    let dy = y1 - y0;
    dx * dx + dy * dy
}

/// Distance between two points.
#[must_use]
pub fn distance(x0: f64, y0: f64, x1: f64, y1: f64) -> f64 {
    distance_unsq(x0, y0, x1, y1).sqrt()
}

/// Squared distance from `(x, y)` to the closest point of the segment.
#[must_use]
pub fn segment_distance_unsq(x: f64, y: f64, start: Point, end: Point) -> f64 {
    let dx = end.x - start.x;
    let dy = end.y - start.y;
    let l2 = dx * dx + dy * dy;

    if l2 == 0.0 {
        return distance_unsq(x, y, start.x, start.y);
    }

    let t = (((x - start.x) * dx + (y - start.y) * dy) / l2).clamp(0.0, 1.0);
    distance_unsq(x, y, start.x + t * dx, start.y + t * dy)
}

/// How far `(x, y)` lies off the segment, for cheap "on the line" tests.
///
/// Returns `f64::INFINITY` when the point's projection falls outside the
/// segment, otherwise the perpendicular distance. A zero-length segment only
/// matches its own point.
#[must_use]
pub fn line_point_intersection_distance(x: f64, y: f64, start: Point, end: Point) -> f64 {
    let dx = end.x - start.x;
    let dy = end.y - start.y;
    let l2 = dx * dx + dy * dy;

    if l2 == 0.0 {
        return if x == start.x && y == start.y {
            0.0
        } else {
            f64::INFINITY
        };
    }

    let t = ((x - start.x) * dx + (y - start.y) * dy) / l2;
    if !(0.0..=1.0).contains(&t) {
        return f64::INFINITY;
    }

    ((x - start.x) * dy - (y - start.y) * dx).abs() / l2.sqrt()
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;

    const EPSILON: f64 = 1e-9;

    fn approx_eq(a: f64, b: f64) -> bool {
        (a - b).abs() < EPSILON
    }

    fn unit_box() -> BoundingBox {
        BoundingBox::new(-50.0, -20.0, 50.0, 20.0)
    }

    #[test]
    fn test_point_on_rect_sides() {
        let b = unit_box();
        assert_eq!(point_on_rect(200.0, 0.0, &b, false), Point::new(50.0, 0.0));
        assert_eq!(point_on_rect(-200.0, 0.0, &b, false), Point::new(-50.0, 0.0));
        assert_eq!(point_on_rect(0.0, 300.0, &b, false), Point::new(0.0, 20.0));
        assert_eq!(point_on_rect(0.0, -300.0, &b, false), Point::new(0.0, -20.0));
    }

    #[test]
    fn test_point_on_rect_diagonal() {
        let b = BoundingBox::new(-10.0, -10.0, 10.0, 10.0);
        let p = point_on_rect(100.0, 50.0, &b, false);
        assert!(approx_eq(p.x, 10.0));
        assert!(approx_eq(p.y, 5.0));
    }

    #[test]
    fn test_point_on_rect_center_and_validate() {
        let b = unit_box();
        assert_eq!(point_on_rect(0.0, 0.0, &b, false), Point::new(0.0, 0.0));
        assert_eq!(point_on_rect(10.0, 5.0, &b, true), Point::new(10.0, 5.0));
        let outside = point_on_rect(10.0, 5.0, &b, false);
        assert!(approx_eq(outside.x, 40.0));
    }

    #[test]
    fn test_transform_control_point_rotates_about_end() {
        let start = Point::new(0.0, 0.0);
        let end = Point::new(0.0, 100.0);
        let p = transform_control_point(start, end, Point::new(-10.0, 0.0));
        assert!(approx_eq(p.x, 0.0));
        assert!(approx_eq(p.y, 90.0));
    }

    #[test]
    fn test_transform_zero_length_segment() {
        let p = Point::new(5.0, 5.0);
        let q = transform_control_point(p, p, Point::new(-3.0, 1.0));
        assert_eq!(q, Point::new(2.0, 6.0));
    }

    #[test]
    fn test_segment_distance() {
        let a = Point::new(0.0, 0.0);
        let b = Point::new(10.0, 0.0);
        assert!(approx_eq(segment_distance_unsq(5.0, 3.0, a, b), 9.0));
        assert!(approx_eq(segment_distance_unsq(-3.0, 4.0, a, b), 25.0));
        assert!(approx_eq(segment_distance_unsq(1.0, 1.0, a, a), 2.0));
    }

    #[test]
    fn test_line_point_distance() {
        let a = Point::new(0.0, 0.0);
        let b = Point::new(0.0, 10.0);
        assert!(approx_eq(line_point_intersection_distance(1.0, 5.0, a, b), 1.0));
        assert!(line_point_intersection_distance(0.0, 11.0, a, b).is_infinite());
        assert!(approx_eq(line_point_intersection_distance(0.0, 0.0, a, a), 0.0));
        assert!(line_point_intersection_distance(1.0, 0.0, a, a).is_infinite());
    }

    #[test]
    fn test_bounding_box_ops() {
        let a = BoundingBox::from_center(0.0, 0.0, 10.0, 4.0);
        assert!(approx_eq(a.width(), 10.0));
        assert!(a.contains(5.0, 2.0));
        assert!(!a.contains(5.1, 0.0));
        let u = a.union(&BoundingBox::new(20.0, 20.0, 30.0, 30.0));
        assert!(u.encloses(&a));
        assert_eq!(
            BoundingBox::from_points([Point::new(3.0, 1.0), Point::new(-1.0, 4.0)]),
            Some(BoundingBox::new(-1.0, 1.0, 3.0, 4.0))
        );
        assert_eq!(BoundingBox::from_points(std::iter::empty()), None);
    }

    proptest! {
        #[test]
        fn prop_point_on_rect_is_finite_and_on_border(
            x in -1000.0f64..1000.0,
            y in -1000.0f64..1000.0,
        ) {
            let b = unit_box();
            let p = point_on_rect(x, y, &b, false);
            prop_assert!(p.x.is_finite() && p.y.is_finite());
            if !(x == 0.0 && y == 0.0) {
                let on_vertical = approx_eq(p.x, b.min_x) || approx_eq(p.x, b.max_x);
                let on_horizontal = approx_eq(p.y, b.min_y) || approx_eq(p.y, b.max_y);
                prop_assert!(on_vertical || on_horizontal);
            }
        }

        #[test]
        fn prop_transform_preserves_distance_to_end(
            sx in -100.0f64..100.0, sy in -100.0f64..100.0,
            ex in -100.0f64..100.0, ey in -100.0f64..100.0,
            lx in -20.0f64..20.0, ly in -20.0f64..20.0,
        ) {
            let end = Point::new(ex, ey);
            let p = transform_control_point(Point::new(sx, sy), end, Point::new(lx, ly));
            let expected = lx.hypot(ly);
            prop_assert!((distance(p.x, p.y, ex, ey) - expected).abs() < 1e-6);
        }
    }
}
