use std::collections::BTreeMap;

use opensilicon_core::geometry::{first_diagonal_edge, BBox, Poly, PolyStyle, Transform};
use opensilicon_core::{CellId, LayerId};

use crate::error::{Result, TopologyError};
use crate::hierarchy;
use crate::overlap;
use crate::resolver::ConnectivityConfig;
use crate::source::{CellGeometrySource, LayerShapeProvider};
use crate::tree::{GeometryTree, Leaves, ObjectId};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ObjectKind {
    Node,
    Arc,
}

/// A top-level node or arc that contributed geometry.
#[derive(Debug, Clone)]
pub struct ObjectRef {
    pub kind: ObjectKind,
    pub name: String,
    /// Union of all the object's placed polygons.
    pub bounds: BBox,
}

impl ObjectRef {
    pub fn token(&self) -> String {
        match self.kind {
            ObjectKind::Node => format!("N{}", self.name),
            ObjectKind::Arc => format!("A{}", self.name),
        }
    }
}

/// Everything gathered from one hierarchy walk.
pub struct Collection {
    pub leaves: Leaves,
    /// One tree per connecting layer, indexed like `ConnectivityConfig::layers`.
    pub layer_trees: Vec<GeometryTree>,
    /// One tree per connecting via, indexed like `ConnectivityConfig::vias`.
    pub via_trees: Vec<GeometryTree>,
    pub objects: Vec<ObjectRef>,
    /// Cut rectangles waiting to be subtracted, by cut layer.
    pub pending_cuts: BTreeMap<LayerId, Vec<BBox>>,
    pub non_manhattan: bool,
}

impl Collection {
    fn new(config: &ConnectivityConfig) -> Self {
        Self {
            leaves: Leaves::new(),
            layer_trees: config.layers.iter().map(|_| GeometryTree::new()).collect(),
            via_trees: config.vias.iter().map(|_| GeometryTree::new()).collect(),
            objects: Vec::new(),
            pending_cuts: BTreeMap::new(),
            non_manhattan: false,
        }
    }

    pub fn object(&self, id: ObjectId) -> &ObjectRef {
        &self.objects[id.0]
    }

    fn register(&mut self, kind: ObjectKind, name: &str, polys: &[Poly]) -> Option<ObjectId> {
        let bounds = polys
            .iter()
            .filter_map(|p| p.bbox())
            .reduce(|a, b| a.union(&b))?;
        self.objects.push(ObjectRef {
            kind,
            name: name.to_string(),
            bounds,
        });
        Some(ObjectId(self.objects.len() - 1))
    }

    fn add_poly(&mut self, config: &ConnectivityConfig, poly: &Poly, origin: Option<ObjectId>) {
        if config.is_cut(poly.layer_id) {
            match poly.bbox() {
                Some(bbox) => self.pending_cuts.entry(poly.layer_id).or_default().push(bbox),
                None => log::warn!("empty cut polygon on layer {}", poly.layer_id),
            }
        } else if let Some(layer) = config.layer_of(poly.layer_id) {
            if poly.style != PolyStyle::Filled {
                return;
            }
            let tree = &mut self.layer_trees[layer];
            if let Some(rect) = poly.as_rect() {
                tree.insert_rect(&mut self.leaves, rect, origin);
                return;
            }
            if poly.points.len() < 3 {
                log::warn!("degenerate polygon on layer {} skipped", poly.layer_id);
                return;
            }
            if let Some((a, b)) = first_diagonal_edge(&poly.points) {
                log::debug!(
                    "non-Manhattan edge ({}, {})-({}, {}) on layer {}",
                    a.x,
                    a.y,
                    b.x,
                    b.y,
                    poly.layer_id
                );
                self.non_manhattan = true;
            }
            tree.insert_polygon(&mut self.leaves, overlap::to_polygon(&poly.points), origin);
        } else if let Some(via) = config.via_of(poly.layer_id) {
            match poly.bbox() {
                Some(bbox) if bbox.area() > 0.0 => {
                    self.via_trees[via].insert_via(&mut self.leaves, bbox);
                }
                _ => log::warn!("malformed via shape on layer {} skipped", poly.layer_id),
            }
        }
    }
}

struct Frame {
    cell: CellId,
    transform: Transform,
    top_level: bool,
}

/// Collect the geometry of `root` and everything below it.
pub fn collect<S>(source: &S, config: &ConnectivityConfig, root: &CellId) -> Result<Collection>
where
    S: CellGeometrySource + LayerShapeProvider + ?Sized,
{
    hierarchy::cells_under(source, root)?;

    let mut collection = Collection::new(config);
    let mut stack = vec![Frame {
        cell: *root,
        transform: Transform::identity(),
        top_level: true,
    }];

    while let Some(frame) = stack.pop() {
        let nodes = source
            .node_insts(&frame.cell)
            .ok_or(TopologyError::UnknownCell(frame.cell))?;
        for node in nodes {
            if let Some(child) = node.subcell() {
                stack.push(Frame {
                    cell: child,
                    transform: node.transform.then(&frame.transform),
                    top_level: false,
                });
                continue;
            }
            if source.is_pin(node) {
                continue;
            }
            let polys = source.node_shapes(node, &frame.transform);
            let origin = if frame.top_level {
                collection.register(ObjectKind::Node, &node.name, &polys)
            } else {
                None
            };
            for poly in &polys {
                collection.add_poly(config, poly, origin);
            }
        }

        let arcs = source
            .arc_insts(&frame.cell)
            .ok_or(TopologyError::UnknownCell(frame.cell))?;
        for arc in arcs {
            let polys = source.arc_shapes(arc, &frame.transform);
            let origin = if frame.top_level {
                collection.register(ObjectKind::Arc, &arc.name, &polys)
            } else {
                None
            };
            for poly in &polys {
                collection.add_poly(config, poly, origin);
            }
        }
    }

    log::debug!(
        "collected {} leaves from {} top-level objects",
        collection.leaves.len(),
        collection.objects.len()
    );
    Ok(collection)
}
