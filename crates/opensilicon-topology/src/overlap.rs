use geo::{Coord, LineString, Polygon};
use opensilicon_core::geometry::{BBox, Point};

const EPS: f64 = 1e-9;

pub fn polygon_bbox(polygon: &Polygon<f64>) -> Option<BBox> {
    let points = ring_points(polygon.exterior());
    if points.len() < 3 {
        return None;
    }
    BBox::from_points(&points)
}

/// Vertices of a ring without the closing duplicate.
pub fn ring_points(ring: &LineString<f64>) -> Vec<Point> {
    let mut points: Vec<Point> = ring.0.iter().map(|c| Point::new(c.x, c.y)).collect();
    if points.len() > 1 && points.first() == points.last() {
        points.pop();
    }
    points
}

fn rings(polygon: &Polygon<f64>) -> Vec<Vec<Point>> {
    std::iter::once(polygon.exterior())
        .chain(polygon.interiors())
        .map(ring_points)
        .filter(|r| r.len() >= 2)
        .collect()
}

fn edges(ring: &[Point]) -> impl Iterator<Item = (Point, Point)> + '_ {
    (0..ring.len()).map(move |i| (ring[i], ring[(i + 1) % ring.len()]))
}

/// True if any pair of boundary edges intersects (shared endpoints and
/// collinear overlaps included) or one region lies wholly inside the other.
/// A region sitting inside another's hole does not touch it.
pub fn regions_touch(a: &Polygon<f64>, b: &Polygon<f64>) -> bool {
    let rings_a = rings(a);
    let rings_b = rings(b);

    for ra in &rings_a {
        for (p1, p2) in edges(ra) {
            for rb in &rings_b {
                if edges(rb).any(|(q1, q2)| segments_intersect(&p1, &p2, &q1, &q2)) {
                    return true;
                }
            }
        }
    }

    // no crossing edges: either nested or apart
    let inside = |outer: &Polygon<f64>, inner: &[Vec<Point>]| {
        inner
            .first()
            .and_then(|ring| ring.first())
            .is_some_and(|p| region_contains_point(outer, p))
    };
    inside(a, rings_b.as_slice()) || inside(b, rings_a.as_slice())
}

/// True if `p` is inside the polygon's material or on its boundary.
pub fn region_contains_point(polygon: &Polygon<f64>, p: &Point) -> bool {
    let exterior = ring_points(polygon.exterior());
    if !ring_contains_point(&exterior, p) {
        return false;
    }
    polygon.interiors().iter().all(|hole| {
        let hole = ring_points(hole);
        on_ring_boundary(&hole, p) || !ring_contains_point(&hole, p)
    })
}

/// Ray-casting containment test; boundary points count as inside.
fn ring_contains_point(ring: &[Point], p: &Point) -> bool {
    if ring.len() < 3 {
        return false;
    }
    if on_ring_boundary(ring, p) {
        return true;
    }
    let mut inside = false;
    for (a, b) in edges(ring) {
        if (a.y > p.y) != (b.y > p.y) {
            let x_cross = a.x + (p.y - a.y) * (b.x - a.x) / (b.y - a.y);
            if p.x < x_cross {
                inside = !inside;
            }
        }
    }
    inside
}

fn on_ring_boundary(ring: &[Point], p: &Point) -> bool {
    edges(ring).any(|(a, b)| orientation(&a, &b, p) == 0 && on_segment(&a, &b, p))
}

/// -1, 0 or 1 for clockwise, collinear, counter-clockwise.
fn orientation(a: &Point, b: &Point, c: &Point) -> i8 {
    let cross = (b.x - a.x) * (c.y - a.y) - (b.y - a.y) * (c.x - a.x);
    let scale = (b.x - a.x).abs().max((b.y - a.y).abs()).max(1.0);
    if cross.abs() <= EPS * scale {
        0
    } else if cross > 0.0 {
        1
    } else {
        -1
    }
}

/// For collinear `p`, whether it falls within the segment's extent.
fn on_segment(a: &Point, b: &Point, p: &Point) -> bool {
    p.x >= a.x.min(b.x) - EPS
        && p.x <= a.x.max(b.x) + EPS
        && p.y >= a.y.min(b.y) - EPS
        && p.y <= a.y.max(b.y) + EPS
}

pub fn segments_intersect(p1: &Point, p2: &Point, q1: &Point, q2: &Point) -> bool {
    let o1 = orientation(p1, p2, q1);
    let o2 = orientation(p1, p2, q2);
    let o3 = orientation(q1, q2, p1);
    let o4 = orientation(q1, q2, p2);

    if o1 != o2 && o3 != o4 {
        return true;
    }
    (o1 == 0 && on_segment(p1, p2, q1))
        || (o2 == 0 && on_segment(p1, p2, q2))
        || (o3 == 0 && on_segment(q1, q2, p1))
        || (o4 == 0 && on_segment(q1, q2, p2))
}

pub fn to_polygon(points: &[Point]) -> Polygon<f64> {
    let ring: Vec<Coord<f64>> = points.iter().map(|p| Coord { x: p.x, y: p.y }).collect();
    Polygon::new(LineString::from(ring), vec![])
}
