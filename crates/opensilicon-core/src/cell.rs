use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::geometry::{Point, Transform};

/// Unique cell identifier.
pub type CellId = Uuid;

/// A tick of the database revision clock. Later edits carry larger revisions.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Revision(pub u64);

/// What a node instance places: a technology primitive or another cell.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum NodeProtoRef {
    Primitive(String),
    Cell(CellId),
}

/// A placed node: either a primitive (contact, pin, pure-layer shape) or a subcell instance.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NodeInst {
    pub name: String,
    pub proto: NodeProtoRef,
    /// Placement of the node's local origin in the parent cell.
    pub transform: Transform,
    pub width: f64,
    pub height: f64,
    /// Explicit outline in local coordinates, used by trace-shaped layers.
    pub trace: Option<Vec<Point>>,
}

impl NodeInst {
    pub fn primitive(name: &str, proto: &str, center: Point, width: f64, height: f64) -> Self {
        Self {
            name: name.to_string(),
            proto: NodeProtoRef::Primitive(proto.to_string()),
            transform: Transform::translate(center.x, center.y),
            width,
            height,
            trace: None,
        }
    }

    /// A pure-layer node whose outline is given in absolute cell coordinates.
    pub fn traced(name: &str, proto: &str, outline: Vec<Point>) -> Self {
        Self {
            name: name.to_string(),
            proto: NodeProtoRef::Primitive(proto.to_string()),
            transform: Transform::identity(),
            width: 0.0,
            height: 0.0,
            trace: Some(outline),
        }
    }

    pub fn instance(name: &str, cell_id: CellId, transform: Transform) -> Self {
        Self {
            name: name.to_string(),
            proto: NodeProtoRef::Cell(cell_id),
            transform,
            width: 0.0,
            height: 0.0,
            trace: None,
        }
    }

    pub fn primitive_name(&self) -> Option<&str> {
        match &self.proto {
            NodeProtoRef::Primitive(name) => Some(name),
            NodeProtoRef::Cell(_) => None,
        }
    }

    pub fn subcell(&self) -> Option<CellId> {
        match &self.proto {
            NodeProtoRef::Cell(id) => Some(*id),
            NodeProtoRef::Primitive(_) => None,
        }
    }
}

/// A straight wire between two points.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArcInst {
    pub name: String,
    pub proto: String,
    pub head: Point,
    pub tail: Point,
    pub width: f64,
}

impl ArcInst {
    pub fn new(name: &str, proto: &str, head: Point, tail: Point, width: f64) -> Self {
        Self {
            name: name.to_string(),
            proto: proto.to_string(),
            head,
            tail,
            width,
        }
    }
}

/// A named value attached to a cell.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum MetaValue {
    Text(String),
    Strings(Vec<String>),
    Revision(Revision),
}

/// A layout cell containing nodes, arcs and subcell instances.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Cell {
    pub id: CellId,
    pub name: String,
    pub nodes: Vec<NodeInst>,
    pub arcs: Vec<ArcInst>,
    /// Revision of the last content change.
    pub revision: Revision,
    pub metadata: BTreeMap<String, MetaValue>,
}

impl Cell {
    pub fn new(name: &str) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.to_string(),
            nodes: Vec::new(),
            arcs: Vec::new(),
            revision: Revision::default(),
            metadata: BTreeMap::new(),
        }
    }

    pub fn add_node(&mut self, node: NodeInst) {
        self.nodes.push(node);
    }

    pub fn add_arc(&mut self, arc: ArcInst) {
        self.arcs.push(arc);
    }

    pub fn find_node(&self, name: &str) -> Option<&NodeInst> {
        self.nodes.iter().find(|n| n.name == name)
    }

    /// Ids of the cells instantiated directly by this cell.
    pub fn subcells(&self) -> impl Iterator<Item = CellId> + '_ {
        self.nodes.iter().filter_map(|n| n.subcell())
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn arc_count(&self) -> usize {
        self.arcs.len()
    }
}
