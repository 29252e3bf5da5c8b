use std::ops::{Index, IndexMut};

use geo::{Coord, LineString};
use opensilicon_core::geometry::{BBox, Point};
use rstar::{RTree, RTreeObject, AABB};

use crate::netid::NetId;
use crate::overlap;

/// Largest distance at which two via centers count as the same via.
pub const VIA_CENTER_EPSILON: f64 = 1e-6;

/// Handle of a leaf in a [`Leaves`] arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct LeafKey(pub usize);

/// Index into the table of top-level objects that own leaves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ObjectId(pub usize);

/// A piece of collected geometry.
#[derive(Debug, Clone)]
pub struct Leaf {
    pub bbox: BBox,
    /// Exact outline; `None` when the leaf is its bounding rectangle.
    pub exact: Option<geo::Polygon<f64>>,
    pub net: Option<NetId>,
    /// Top-level node or arc this leaf came from.
    pub origin: Option<ObjectId>,
}

impl Leaf {
    pub fn rect(bbox: BBox, origin: Option<ObjectId>) -> Self {
        Self {
            bbox,
            exact: None,
            net: None,
            origin,
        }
    }

    /// A leaf with an exact outline. Returns `None` for empty polygons.
    pub fn polygon(polygon: geo::Polygon<f64>, origin: Option<ObjectId>) -> Option<Self> {
        let bbox = overlap::polygon_bbox(&polygon)?;
        Some(Self {
            bbox,
            exact: Some(polygon),
            net: None,
            origin,
        })
    }

    pub fn is_polygon(&self) -> bool {
        self.exact.is_some()
    }

    /// The leaf's region as a geo polygon.
    pub fn to_polygon(&self) -> geo::Polygon<f64> {
        match &self.exact {
            Some(poly) => poly.clone(),
            None => bbox_polygon(&self.bbox),
        }
    }

    /// True if the two leaves share at least one point.
    pub fn touches(&self, other: &Leaf) -> bool {
        if !self.bbox.intersects(&other.bbox) {
            return false;
        }
        match (&self.exact, &other.exact) {
            (None, None) => true,
            _ => overlap::regions_touch(&self.to_polygon(), &other.to_polygon()),
        }
    }

    pub fn contains_point(&self, p: &Point) -> bool {
        if !self.bbox.contains_point(p) {
            return false;
        }
        match &self.exact {
            None => true,
            Some(poly) => overlap::region_contains_point(poly, p),
        }
    }
}

pub fn bbox_polygon(bbox: &BBox) -> geo::Polygon<f64> {
    let ring: Vec<Coord<f64>> = bbox
        .corners()
        .iter()
        .map(|p| Coord { x: p.x, y: p.y })
        .collect();
    geo::Polygon::new(LineString::from(ring), vec![])
}

/// Arena owning every leaf of one extraction.
#[derive(Debug, Default)]
pub struct Leaves {
    items: Vec<Leaf>,
}

impl Leaves {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, leaf: Leaf) -> LeafKey {
        self.items.push(leaf);
        LeafKey(self.items.len() - 1)
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

impl Index<LeafKey> for Leaves {
    type Output = Leaf;

    fn index(&self, key: LeafKey) -> &Leaf {
        &self.items[key.0]
    }
}

impl IndexMut<LeafKey> for Leaves {
    fn index_mut(&mut self, key: LeafKey) -> &mut Leaf {
        &mut self.items[key.0]
    }
}

/// An entry in the R-tree, referencing a leaf by its key.
#[derive(Debug, Clone, PartialEq)]
struct TreeEntry {
    key: LeafKey,
    bbox: BBox,
    exact: bool,
}

impl RTreeObject for TreeEntry {
    type Envelope = AABB<[f64; 2]>;

    fn envelope(&self) -> Self::Envelope {
        to_envelope(&self.bbox)
    }
}

fn to_envelope(bbox: &BBox) -> AABB<[f64; 2]> {
    AABB::from_corners([bbox.min.x, bbox.min.y], [bbox.max.x, bbox.max.y])
}

/// Dynamic R-tree over leaf bounding boxes. The tree owns its nodes; linking
/// and unlinking rebalance it internally.
#[derive(Default)]
pub struct GeometryTree {
    tree: RTree<TreeEntry>,
}

impl GeometryTree {
    pub fn new() -> Self {
        Self { tree: RTree::new() }
    }

    /// Keys of all leaves whose bounds intersect `window`, edges included.
    pub fn search(&self, window: &BBox) -> impl Iterator<Item = LeafKey> + '_ {
        self.tree
            .locate_in_envelope_intersecting(&to_envelope(window))
            .map(|e| e.key)
    }

    /// Keys of every linked leaf, in key order.
    pub fn keys(&self) -> Vec<LeafKey> {
        let mut keys: Vec<LeafKey> = self.tree.iter().map(|e| e.key).collect();
        keys.sort_unstable();
        keys
    }

    pub fn link(&mut self, key: LeafKey, leaf: &Leaf) {
        self.tree.insert(TreeEntry {
            key,
            bbox: leaf.bbox,
            exact: leaf.is_polygon(),
        });
    }

    pub fn unlink(&mut self, key: LeafKey, leaf: &Leaf) -> bool {
        self.tree
            .remove(&TreeEntry {
                key,
                bbox: leaf.bbox,
                exact: leaf.is_polygon(),
            })
            .is_some()
    }

    pub fn len(&self) -> usize {
        self.tree.size()
    }

    pub fn is_empty(&self) -> bool {
        self.tree.size() == 0
    }

    /// Insert a rectangle unless a linked rectangle already covers it. Linked
    /// rectangles covered by the new one are removed. Polygon leaves are left alone.
    pub fn insert_rect(
        &mut self,
        leaves: &mut Leaves,
        bbox: BBox,
        origin: Option<ObjectId>,
    ) -> Option<LeafKey> {
        let nearby: Vec<TreeEntry> = self
            .tree
            .locate_in_envelope_intersecting(&to_envelope(&bbox))
            .filter(|e| !e.exact)
            .cloned()
            .collect();
        if nearby.iter().any(|e| e.bbox.contains(&bbox)) {
            return None;
        }
        for covered in nearby.iter().filter(|e| bbox.contains(&e.bbox)) {
            self.tree.remove(covered);
        }
        let leaf = Leaf::rect(bbox, origin);
        let key = leaves.push(leaf);
        self.link(key, &leaves[key]);
        Some(key)
    }

    /// Insert an exact polygon. Never deduplicated.
    pub fn insert_polygon(
        &mut self,
        leaves: &mut Leaves,
        polygon: geo::Polygon<f64>,
        origin: Option<ObjectId>,
    ) -> Option<LeafKey> {
        let leaf = Leaf::polygon(polygon, origin)?;
        let key = leaves.push(leaf);
        self.link(key, &leaves[key]);
        Some(key)
    }

    /// Insert a via footprint unless a via with the same center is already linked.
    pub fn insert_via(&mut self, leaves: &mut Leaves, bbox: BBox) -> Option<LeafKey> {
        let center = bbox.center();
        let window = BBox::from_corners(
            center.x - VIA_CENTER_EPSILON,
            center.y - VIA_CENTER_EPSILON,
            center.x + VIA_CENTER_EPSILON,
            center.y + VIA_CENTER_EPSILON,
        );
        let duplicate = self
            .tree
            .locate_in_envelope_intersecting(&to_envelope(&window))
            .any(|e| e.bbox.center().approx_eq(&center, VIA_CENTER_EPSILON));
        if duplicate {
            return None;
        }
        let key = leaves.push(Leaf::rect(bbox, None));
        self.link(key, &leaves[key]);
        Some(key)
    }
}
