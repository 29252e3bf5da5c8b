use serde::{Deserialize, Serialize};

use crate::cell::{ArcInst, NodeInst};
use crate::geometry::{BBox, Point, Poly, PolyStyle, Transform, GEOM_EPSILON};

/// A unique layer identifier (typically GDS layer number).
pub type LayerId = u32;

/// The material a layer represents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LayerFunction {
    /// Routing metal at the given level (1 = metal1).
    Metal(u32),
    /// Polysilicon at the given level.
    Poly(u32),
    /// Contact or via cut joining two conducting layers.
    Contact(u32),
    /// Anything that carries no connectivity (wells, implants, text).
    Other,
}

/// A technology layer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Layer {
    pub id: LayerId,
    pub name: String,
    pub function: LayerFunction,
    /// A cut layer removes material from the same-level conducting layer.
    pub cut: bool,
    /// Multi-patterning mask color; 0 is the uncolored/primary mask.
    pub mask_color: u8,
    pub description: String,
}

impl Layer {
    pub fn new(id: LayerId, name: &str, function: LayerFunction) -> Self {
        Self {
            id,
            name: name.to_string(),
            function,
            cut: false,
            mask_color: 0,
            description: String::new(),
        }
    }

    pub fn as_cut(mut self) -> Self {
        self.cut = true;
        self
    }

    pub fn with_mask_color(mut self, color: u8) -> Self {
        self.mask_color = color;
        self
    }

    pub fn is_metal(&self) -> bool {
        matches!(self.function, LayerFunction::Metal(_))
    }

    pub fn is_poly(&self) -> bool {
        matches!(self.function, LayerFunction::Poly(_))
    }

    pub fn is_contact(&self) -> bool {
        matches!(self.function, LayerFunction::Contact(_))
    }
}

/// One layer of an arc prototype. The drawn width is the arc width minus `width_offset`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArcLayer {
    pub layer_id: LayerId,
    pub width_offset: f64,
    pub style: PolyStyle,
}

/// A wire type.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArcProto {
    pub name: String,
    pub layers: Vec<ArcLayer>,
}

impl ArcProto {
    /// An arc drawn as one filled layer at full width.
    pub fn simple(name: &str, layer_id: LayerId) -> Self {
        Self {
            name: name.to_string(),
            layers: vec![ArcLayer {
                layer_id,
                width_offset: 0.0,
                style: PolyStyle::Filled,
            }],
        }
    }

    pub fn uses_layer(&self, layer_id: LayerId) -> bool {
        self.layers.iter().any(|l| l.layer_id == layer_id)
    }
}

/// What a primitive node does electrically.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum NodeFunction {
    /// Arc junction with no material of its own.
    Pin,
    /// Contact/via between two conducting layers.
    Contact,
    /// Generic primitive (transistor, resistor, ...).
    Node,
    /// A single-layer shape, usually drawn with an explicit trace.
    PureLayer,
}

/// How a node layer is sized relative to the node instance.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum LayerShape {
    /// The node box shrunk by `dx` on the left/right and `dy` on the bottom/top.
    Inset { dx: f64, dy: f64 },
    /// The node's trace outline, or the full node box when it has none.
    Trace,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NodeLayer {
    pub layer_id: LayerId,
    pub style: PolyStyle,
    pub shape: LayerShape,
}

/// A primitive node type.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NodeProto {
    pub name: String,
    pub function: NodeFunction,
    pub layers: Vec<NodeLayer>,
    /// Arc types that may connect to this node's port.
    pub connects: Vec<String>,
}

impl NodeProto {
    pub fn new(name: &str, function: NodeFunction) -> Self {
        Self {
            name: name.to_string(),
            function,
            layers: Vec::new(),
            connects: Vec::new(),
        }
    }

    pub fn with_layer(mut self, layer_id: LayerId, shape: LayerShape) -> Self {
        self.layers.push(NodeLayer {
            layer_id,
            style: PolyStyle::Filled,
            shape,
        });
        self
    }

    pub fn connecting(mut self, arcs: &[&str]) -> Self {
        self.connects.extend(arcs.iter().map(|a| a.to_string()));
        self
    }

    pub fn is_contact(&self) -> bool {
        self.function == NodeFunction::Contact
    }
}

/// A process technology: layers, wire types and primitive nodes.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Technology {
    pub name: String,
    layers: Vec<Layer>,
    arcs: Vec<ArcProto>,
    nodes: Vec<NodeProto>,
}

impl Technology {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            ..Default::default()
        }
    }

    pub fn add_layer(&mut self, layer: Layer) {
        self.layers.push(layer);
    }

    pub fn add_arc(&mut self, arc: ArcProto) {
        self.arcs.push(arc);
    }

    pub fn add_node(&mut self, node: NodeProto) {
        self.nodes.push(node);
    }

    pub fn get_layer(&self, id: LayerId) -> Option<&Layer> {
        self.layers.iter().find(|l| l.id == id)
    }

    pub fn find_arc(&self, name: &str) -> Option<&ArcProto> {
        self.arcs.iter().find(|a| a.name == name)
    }

    pub fn find_node(&self, name: &str) -> Option<&NodeProto> {
        self.nodes.iter().find(|n| n.name == name)
    }

    pub fn layers(&self) -> &[Layer] {
        &self.layers
    }

    pub fn arcs(&self) -> &[ArcProto] {
        &self.arcs
    }

    pub fn nodes(&self) -> &[NodeProto] {
        &self.nodes
    }

    /// Polygons of a primitive node instance, placed by `placement` after the
    /// instance's own transform. Cell instances and unknown primitives yield nothing.
    pub fn node_polys(&self, node: &NodeInst, placement: &Transform) -> Vec<Poly> {
        let Some(proto_name) = node.primitive_name() else {
            return Vec::new();
        };
        let Some(proto) = self.find_node(proto_name) else {
            log::warn!("node {} uses unknown primitive {}", node.name, proto_name);
            return Vec::new();
        };
        let xform = node.transform.then(placement);
        let (hw, hh) = (node.width / 2.0, node.height / 2.0);

        proto
            .layers
            .iter()
            .filter_map(|nl| {
                let local = match &nl.shape {
                    LayerShape::Inset { dx, dy } => {
                        if node.width - 2.0 * dx <= 0.0 || node.height - 2.0 * dy <= 0.0 {
                            return None;
                        }
                        BBox::from_corners(-hw + dx, -hh + dy, hw - dx, hh - dy)
                            .corners()
                            .to_vec()
                    }
                    LayerShape::Trace => match &node.trace {
                        Some(trace) if trace.len() >= 3 => trace.clone(),
                        _ => BBox::from_corners(-hw, -hh, hw, hh).corners().to_vec(),
                    },
                };
                Some(Poly::new(nl.layer_id, nl.style, xform.apply_all(&local)))
            })
            .collect()
    }

    /// Polygons of an arc instance, one per arc layer, extended by half the
    /// drawn width past each end.
    pub fn arc_polys(&self, arc: &ArcInst, placement: &Transform) -> Vec<Poly> {
        let Some(proto) = self.find_arc(&arc.proto) else {
            log::warn!("arc {} uses unknown arc type {}", arc.name, arc.proto);
            return Vec::new();
        };
        proto
            .layers
            .iter()
            .filter_map(|al| {
                let width = arc.width - al.width_offset;
                if width <= 0.0 {
                    return None;
                }
                let outline = wire_outline(&arc.head, &arc.tail, width);
                Some(Poly::new(al.layer_id, al.style, placement.apply_all(&outline)))
            })
            .collect()
    }
}

/// Outline of a straight wire of `width` from `head` to `tail`, with square ends
/// extended by half the width.
fn wire_outline(head: &Point, tail: &Point, width: f64) -> Vec<Point> {
    let half = width / 2.0;
    let len = head.distance_to(tail);
    if len <= GEOM_EPSILON {
        return BBox::from_corners(head.x - half, head.y - half, head.x + half, head.y + half)
            .corners()
            .to_vec();
    }
    // unit direction and normal
    let (ux, uy) = ((tail.x - head.x) / len, (tail.y - head.y) / len);
    let (nx, ny) = (-uy * half, ux * half);
    let start = Point::new(head.x - ux * half, head.y - uy * half);
    let end = Point::new(tail.x + ux * half, tail.y + uy * half);
    vec![
        start.translate(-nx, -ny),
        end.translate(-nx, -ny),
        end.translate(nx, ny),
        start.translate(nx, ny),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cell::{ArcInst, NodeInst};

    fn tech() -> Technology {
        let mut tech = Technology::new("test");
        tech.add_layer(Layer::new(1, "metal1", LayerFunction::Metal(1)));
        tech.add_layer(Layer::new(2, "via1", LayerFunction::Contact(1)));
        tech.add_layer(Layer::new(3, "metal2", LayerFunction::Metal(2)));
        tech.add_arc(ArcProto::simple("m1", 1));
        tech.add_node(
            NodeProto::new("m1m2", NodeFunction::Contact)
                .with_layer(1, LayerShape::Inset { dx: 0.0, dy: 0.0 })
                .with_layer(2, LayerShape::Inset { dx: 1.0, dy: 1.0 })
                .with_layer(3, LayerShape::Inset { dx: 0.0, dy: 0.0 })
                .connecting(&["m1", "m2"]),
        );
        tech
    }

    #[test]
    fn test_layer_lookup() {
        let tech = tech();
        assert!(tech.get_layer(1).unwrap().is_metal());
        assert!(tech.get_layer(2).unwrap().is_contact());
        assert!(tech.get_layer(9).is_none());
        assert!(tech.find_arc("m1").unwrap().uses_layer(1));
    }

    #[test]
    fn test_node_polys_placed() {
        let tech = tech();
        let node = NodeInst::primitive("c0", "m1m2", Point::new(10.0, 10.0), 4.0, 4.0);
        let polys = tech.node_polys(&node, &Transform::translate(100.0, 0.0));
        assert_eq!(polys.len(), 3);
        let cut = polys[1].as_rect().unwrap();
        assert_eq!(cut, BBox::from_corners(109.0, 9.0, 111.0, 11.0));
    }

    #[test]
    fn test_arc_polys_extend_ends() {
        let tech = tech();
        let arc = ArcInst::new("a0", "m1", Point::new(0.0, 0.0), Point::new(10.0, 0.0), 2.0);
        let polys = tech.arc_polys(&arc, &Transform::identity());
        assert_eq!(polys.len(), 1);
        let bb = polys[0].as_rect().unwrap();
        assert!((bb.min.x + 1.0).abs() < 1e-10);
        assert!((bb.max.x - 11.0).abs() < 1e-10);
        assert!((bb.height() - 2.0).abs() < 1e-10);
    }

    #[test]
    fn test_diagonal_arc_is_not_manhattan() {
        let tech = tech();
        let arc = ArcInst::new("a1", "m1", Point::new(0.0, 0.0), Point::new(10.0, 10.0), 2.0);
        let polys = tech.arc_polys(&arc, &Transform::identity());
        assert!(!polys[0].is_manhattan());
        assert!(polys[0].as_rect().is_none());
    }
}
