use serde::{Deserialize, Serialize};

use crate::LayerId;

/// Tolerance used when comparing coordinates and areas.
pub const GEOM_EPSILON: f64 = 1e-9;

/// A 2D point in layout coordinates (nanometers).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn distance_to(&self, other: &Point) -> f64 {
        ((self.x - other.x).powi(2) + (self.y - other.y).powi(2)).sqrt()
    }

    pub fn translate(&self, dx: f64, dy: f64) -> Self {
        Self {
            x: self.x + dx,
            y: self.y + dy,
        }
    }

    /// True if both coordinates agree within `eps`.
    pub fn approx_eq(&self, other: &Point, eps: f64) -> bool {
        (self.x - other.x).abs() <= eps && (self.y - other.y).abs() <= eps
    }
}

/// An axis-aligned bounding box.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BBox {
    pub min: Point,
    pub max: Point,
}

impl BBox {
    pub fn new(min: Point, max: Point) -> Self {
        Self { min, max }
    }

    /// Build a box from two opposite corners in any order.
    pub fn from_corners(x1: f64, y1: f64, x2: f64, y2: f64) -> Self {
        Self {
            min: Point::new(x1.min(x2), y1.min(y2)),
            max: Point::new(x1.max(x2), y1.max(y2)),
        }
    }

    pub fn from_points(points: &[Point]) -> Option<Self> {
        if points.is_empty() {
            return None;
        }
        let mut min_x = f64::MAX;
        let mut min_y = f64::MAX;
        let mut max_x = f64::MIN;
        let mut max_y = f64::MIN;
        for p in points {
            min_x = min_x.min(p.x);
            min_y = min_y.min(p.y);
            max_x = max_x.max(p.x);
            max_y = max_y.max(p.y);
        }
        Some(Self {
            min: Point::new(min_x, min_y),
            max: Point::new(max_x, max_y),
        })
    }

    pub fn width(&self) -> f64 {
        self.max.x - self.min.x
    }

    pub fn height(&self) -> f64 {
        self.max.y - self.min.y
    }

    pub fn area(&self) -> f64 {
        self.width() * self.height()
    }

    pub fn center(&self) -> Point {
        Point::new(
            (self.min.x + self.max.x) / 2.0,
            (self.min.y + self.max.y) / 2.0,
        )
    }

    /// The four corners, counter-clockwise from the lower-left.
    pub fn corners(&self) -> [Point; 4] {
        [
            self.min,
            Point::new(self.max.x, self.min.y),
            self.max,
            Point::new(self.min.x, self.max.y),
        ]
    }

    pub fn contains_point(&self, p: &Point) -> bool {
        p.x >= self.min.x && p.x <= self.max.x && p.y >= self.min.y && p.y <= self.max.y
    }

    /// True if `other` lies entirely inside this box (shared edges allowed).
    pub fn contains(&self, other: &BBox) -> bool {
        other.min.x >= self.min.x
            && other.max.x <= self.max.x
            && other.min.y >= self.min.y
            && other.max.y <= self.max.y
    }

    /// Inclusive intersection: boxes sharing only an edge or corner intersect.
    pub fn intersects(&self, other: &BBox) -> bool {
        self.min.x <= other.max.x
            && self.max.x >= other.min.x
            && self.min.y <= other.max.y
            && self.max.y >= other.min.y
    }

    /// Strict intersection: the interiors share a region of positive area.
    pub fn overlaps(&self, other: &BBox) -> bool {
        self.min.x < other.max.x
            && self.max.x > other.min.x
            && self.min.y < other.max.y
            && self.max.y > other.min.y
    }

    pub fn union(&self, other: &BBox) -> Self {
        Self {
            min: Point::new(self.min.x.min(other.min.x), self.min.y.min(other.min.y)),
            max: Point::new(self.max.x.max(other.max.x), self.max.y.max(other.max.y)),
        }
    }
}

/// How a technology polygon is drawn. Only filled shapes carry material.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PolyStyle {
    Filled,
    Closed,
    Opened,
    Cross,
}

/// A placed technology polygon produced for a node or arc instance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Poly {
    pub layer_id: LayerId,
    pub style: PolyStyle,
    pub points: Vec<Point>,
}

impl Poly {
    pub fn new(layer_id: LayerId, style: PolyStyle, points: Vec<Point>) -> Self {
        Self {
            layer_id,
            style,
            points,
        }
    }

    pub fn bbox(&self) -> Option<BBox> {
        BBox::from_points(&self.points)
    }

    /// Unsigned shoelace area.
    pub fn area(&self) -> f64 {
        polygon_area(&self.points).abs()
    }

    /// The polygon as an axis-aligned rectangle, if it fills its bounding box exactly.
    pub fn as_rect(&self) -> Option<BBox> {
        if self.points.len() < 4 {
            return None;
        }
        let bbox = self.bbox()?;
        if bbox.area() <= 0.0 {
            return None;
        }
        if (self.area() - bbox.area()).abs() <= GEOM_EPSILON * bbox.area().max(1.0) {
            Some(bbox)
        } else {
            None
        }
    }

    /// True if every edge is horizontal or vertical.
    pub fn is_manhattan(&self) -> bool {
        first_diagonal_edge(&self.points).is_none()
    }
}

/// Signed shoelace area of a ring (positive when counter-clockwise).
pub fn polygon_area(points: &[Point]) -> f64 {
    if points.len() < 3 {
        return 0.0;
    }
    let mut sum = 0.0;
    for i in 0..points.len() {
        let a = points[i];
        let b = points[(i + 1) % points.len()];
        sum += a.x * b.y - b.x * a.y;
    }
    sum / 2.0
}

/// The first edge of a closed ring that is neither horizontal nor vertical.
pub fn first_diagonal_edge(points: &[Point]) -> Option<(Point, Point)> {
    (0..points.len())
        .map(|i| (points[i], points[(i + 1) % points.len()]))
        .find(|(a, b)| (a.x - b.x).abs() > GEOM_EPSILON && (a.y - b.y).abs() > GEOM_EPSILON)
}

/// An affine placement: `x' = a*x + c*y + tx`, `y' = b*x + d*y + ty`.
///
/// Instances are placed by a translation, a rotation in degrees and an optional
/// mirror about the X axis. Quarter-turn rotations are exact.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Transform {
    pub a: f64,
    pub b: f64,
    pub c: f64,
    pub d: f64,
    pub tx: f64,
    pub ty: f64,
}

impl Default for Transform {
    fn default() -> Self {
        Self::identity()
    }
}

impl Transform {
    pub fn identity() -> Self {
        Self {
            a: 1.0,
            b: 0.0,
            c: 0.0,
            d: 1.0,
            tx: 0.0,
            ty: 0.0,
        }
    }

    pub fn translate(x: f64, y: f64) -> Self {
        Self {
            tx: x,
            ty: y,
            ..Self::identity()
        }
    }

    /// Mirror about X (if requested), then rotate, then translate to `offset`.
    pub fn placement(offset: Point, rotation: f64, mirror_x: bool) -> Self {
        let (cos_r, sin_r) = exact_cos_sin(rotation);
        let flip = if mirror_x { -1.0 } else { 1.0 };
        Self {
            a: cos_r,
            b: sin_r,
            c: -sin_r * flip,
            d: cos_r * flip,
            tx: offset.x,
            ty: offset.y,
        }
    }

    pub fn apply(&self, point: &Point) -> Point {
        Point::new(
            self.a * point.x + self.c * point.y + self.tx,
            self.b * point.x + self.d * point.y + self.ty,
        )
    }

    /// The transform that applies `self` first and then `outer`.
    pub fn then(&self, outer: &Transform) -> Transform {
        Transform {
            a: outer.a * self.a + outer.c * self.b,
            b: outer.b * self.a + outer.d * self.b,
            c: outer.a * self.c + outer.c * self.d,
            d: outer.b * self.c + outer.d * self.d,
            tx: outer.a * self.tx + outer.c * self.ty + outer.tx,
            ty: outer.b * self.tx + outer.d * self.ty + outer.ty,
        }
    }

    pub fn apply_all(&self, points: &[Point]) -> Vec<Point> {
        points.iter().map(|p| self.apply(p)).collect()
    }
}

fn exact_cos_sin(degrees: f64) -> (f64, f64) {
    let normalized = degrees.rem_euclid(360.0);
    if normalized == 0.0 {
        (1.0, 0.0)
    } else if normalized == 90.0 {
        (0.0, 1.0)
    } else if normalized == 180.0 {
        (-1.0, 0.0)
    } else if normalized == 270.0 {
        (0.0, -1.0)
    } else {
        let rad = normalized.to_radians();
        (rad.cos(), rad.sin())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_point_distance() {
        let a = Point::new(0.0, 0.0);
        let b = Point::new(3.0, 4.0);
        assert!((a.distance_to(&b) - 5.0).abs() < 1e-10);
    }

    #[test]
    fn test_bbox_intersection() {
        let a = BBox::from_corners(0.0, 0.0, 10.0, 10.0);
        let b = BBox::from_corners(5.0, 5.0, 15.0, 15.0);
        let c = BBox::from_corners(20.0, 20.0, 30.0, 30.0);
        let edge = BBox::from_corners(10.0, 0.0, 20.0, 10.0);
        assert!(a.intersects(&b));
        assert!(!a.intersects(&c));
        assert!(a.intersects(&edge));
        assert!(!a.overlaps(&edge));
        assert!(a.overlaps(&b));
    }

    #[test]
    fn test_bbox_contains() {
        let outer = BBox::from_corners(0.0, 0.0, 10.0, 10.0);
        let inner = BBox::from_corners(2.0, 2.0, 10.0, 4.0);
        assert!(outer.contains(&inner));
        assert!(!inner.contains(&outer));
        assert!(outer.contains(&outer));
    }

    #[test]
    fn test_poly_as_rect() {
        let rect = Poly::new(
            1,
            PolyStyle::Filled,
            vec![
                Point::new(0.0, 0.0),
                Point::new(4.0, 0.0),
                Point::new(4.0, 2.0),
                Point::new(0.0, 2.0),
            ],
        );
        let bb = rect.as_rect().unwrap();
        assert!((bb.width() - 4.0).abs() < 1e-10);
        assert!(rect.is_manhattan());

        let tri = Poly::new(
            1,
            PolyStyle::Filled,
            vec![Point::new(0.0, 0.0), Point::new(4.0, 0.0), Point::new(0.0, 4.0)],
        );
        assert!(tri.as_rect().is_none());
        assert!(!tri.is_manhattan());

        let ell = Poly::new(
            1,
            PolyStyle::Filled,
            vec![
                Point::new(0.0, 0.0),
                Point::new(4.0, 0.0),
                Point::new(4.0, 2.0),
                Point::new(2.0, 2.0),
                Point::new(2.0, 4.0),
                Point::new(0.0, 4.0),
            ],
        );
        assert!(ell.as_rect().is_none());
        assert!(ell.is_manhattan());
    }

    #[test]
    fn test_transform_translate() {
        let t = Transform::translate(10.0, 20.0);
        let result = t.apply(&Point::new(5.0, 5.0));
        assert!((result.x - 15.0).abs() < 1e-10);
        assert!((result.y - 25.0).abs() < 1e-10);
    }

    #[test]
    fn test_transform_quarter_turn_is_exact() {
        let t = Transform::placement(Point::new(0.0, 0.0), 90.0, false);
        assert_eq!(t.apply(&Point::new(1.0, 0.0)), Point::new(0.0, 1.0));
        let m = Transform::placement(Point::new(0.0, 0.0), 0.0, true);
        assert_eq!(m.apply(&Point::new(1.0, 2.0)), Point::new(1.0, -2.0));
    }

    #[test]
    fn test_transform_compose() {
        let inner = Transform::placement(Point::new(1.0, 0.0), 90.0, false);
        let outer = Transform::translate(10.0, 10.0);
        let composed = inner.then(&outer);
        let p = Point::new(2.0, 0.0);
        assert_eq!(composed.apply(&p), outer.apply(&inner.apply(&p)));
        assert_eq!(composed.apply(&p), Point::new(11.0, 12.0));
    }
}
