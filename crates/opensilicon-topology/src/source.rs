use opensilicon_core::cell::{ArcInst, CellId, MetaValue, NodeInst, Revision};
use opensilicon_core::geometry::{Poly, Transform};
use opensilicon_core::technology::{ArcProto, Layer, NodeFunction, NodeProto, Technology};
use opensilicon_core::LayoutDatabase;

/// Enumerates the contents of cells.
pub trait CellGeometrySource {
    fn cell_name(&self, cell: &CellId) -> Option<&str>;
    /// Node instances of a cell, including subcell instances.
    fn node_insts(&self, cell: &CellId) -> Option<&[NodeInst]>;
    fn arc_insts(&self, cell: &CellId) -> Option<&[ArcInst]>;
}

/// Produces the technology polygons of placed nodes and arcs.
pub trait LayerShapeProvider {
    /// Polygons of a primitive node, placed by `placement` after the node's own transform.
    fn node_shapes(&self, node: &NodeInst, placement: &Transform) -> Vec<Poly>;
    fn arc_shapes(&self, arc: &ArcInst, placement: &Transform) -> Vec<Poly>;
    /// True if the node is a pure pin that carries no material.
    fn is_pin(&self, node: &NodeInst) -> bool;
}

/// Describes the layers, wires and contacts of a technology.
pub trait TechnologyDescriptor {
    fn layers(&self) -> &[Layer];
    fn arc_types(&self) -> &[ArcProto];
    fn contact_types(&self) -> Vec<&NodeProto>;
}

/// Named per-cell values plus the revision clock used to validate them.
pub trait CellMetadataStore {
    fn get_meta(&self, cell: &CellId, key: &str) -> Option<&MetaValue>;
    fn set_meta(&mut self, cell: &CellId, key: &str, value: MetaValue);
    /// Revision of the cell's last content change.
    fn revision(&self, cell: &CellId) -> Option<Revision>;
    fn set_revision(&mut self, cell: &CellId, revision: Revision);
    /// A fresh clock tick, later than every revision issued so far.
    fn timestamp(&mut self) -> Revision;
}

impl TechnologyDescriptor for Technology {
    fn layers(&self) -> &[Layer] {
        Technology::layers(self)
    }

    fn arc_types(&self) -> &[ArcProto] {
        self.arcs()
    }

    fn contact_types(&self) -> Vec<&NodeProto> {
        self.nodes().iter().filter(|n| n.is_contact()).collect()
    }
}

impl LayerShapeProvider for Technology {
    fn node_shapes(&self, node: &NodeInst, placement: &Transform) -> Vec<Poly> {
        self.node_polys(node, placement)
    }

    fn arc_shapes(&self, arc: &ArcInst, placement: &Transform) -> Vec<Poly> {
        self.arc_polys(arc, placement)
    }

    fn is_pin(&self, node: &NodeInst) -> bool {
        node.primitive_name()
            .and_then(|name| self.find_node(name))
            .is_some_and(|proto| proto.function == NodeFunction::Pin)
    }
}

impl CellGeometrySource for LayoutDatabase {
    fn cell_name(&self, cell: &CellId) -> Option<&str> {
        self.get_cell(cell).map(|c| c.name.as_str())
    }

    fn node_insts(&self, cell: &CellId) -> Option<&[NodeInst]> {
        self.get_cell(cell).map(|c| c.nodes.as_slice())
    }

    fn arc_insts(&self, cell: &CellId) -> Option<&[ArcInst]> {
        self.get_cell(cell).map(|c| c.arcs.as_slice())
    }
}

impl TechnologyDescriptor for LayoutDatabase {
    fn layers(&self) -> &[Layer] {
        self.technology.layers()
    }

    fn arc_types(&self) -> &[ArcProto] {
        self.technology.arcs()
    }

    fn contact_types(&self) -> Vec<&NodeProto> {
        TechnologyDescriptor::contact_types(&self.technology)
    }
}

impl LayerShapeProvider for LayoutDatabase {
    fn node_shapes(&self, node: &NodeInst, placement: &Transform) -> Vec<Poly> {
        self.technology.node_shapes(node, placement)
    }

    fn arc_shapes(&self, arc: &ArcInst, placement: &Transform) -> Vec<Poly> {
        self.technology.arc_shapes(arc, placement)
    }

    fn is_pin(&self, node: &NodeInst) -> bool {
        self.technology.is_pin(node)
    }
}

impl CellMetadataStore for LayoutDatabase {
    fn get_meta(&self, cell: &CellId, key: &str) -> Option<&MetaValue> {
        LayoutDatabase::get_meta(self, cell, key)
    }

    fn set_meta(&mut self, cell: &CellId, key: &str, value: MetaValue) {
        if !LayoutDatabase::set_meta(self, cell, key, value) {
            log::warn!("cannot store {key} on missing cell {cell}");
        }
    }

    fn revision(&self, cell: &CellId) -> Option<Revision> {
        LayoutDatabase::revision(self, cell)
    }

    fn set_revision(&mut self, cell: &CellId, revision: Revision) {
        LayoutDatabase::set_revision(self, cell, revision);
    }

    fn timestamp(&mut self) -> Revision {
        self.tick()
    }
}
