use opensilicon_core::geometry::Point;
use opensilicon_core::technology::{
    ArcProto, Layer, LayerFunction, LayerId, LayerShape, NodeFunction, NodeProto, Technology,
};
use opensilicon_core::{ArcInst, NodeInst};

pub const METAL1: LayerId = 1;
pub const METAL1_CUT: LayerId = 2;
pub const VIA1: LayerId = 3;
pub const METAL2: LayerId = 4;
pub const POLY: LayerId = 5;
pub const POLY_CONTACT: LayerId = 6;
pub const METAL1_B: LayerId = 7;

pub fn two_metal() -> Technology {
    let mut tech = Technology::new("two-metal");
    tech.add_layer(Layer::new(METAL1, "metal1", LayerFunction::Metal(1)));
    tech.add_layer(Layer::new(METAL1_CUT, "metal1-cut", LayerFunction::Metal(1)).as_cut());
    tech.add_layer(Layer::new(VIA1, "via1", LayerFunction::Contact(1)));
    tech.add_layer(Layer::new(METAL2, "metal2", LayerFunction::Metal(2)));
    tech.add_layer(Layer::new(POLY, "poly", LayerFunction::Poly(1)));
    tech.add_layer(Layer::new(POLY_CONTACT, "polycont", LayerFunction::Contact(0)));
    tech.add_layer(Layer::new(METAL1_B, "metal1-b", LayerFunction::Metal(1)).with_mask_color(1));

    tech.add_arc(ArcProto::simple("m1", METAL1));
    tech.add_arc(ArcProto::simple("m2", METAL2));
    tech.add_arc(ArcProto::simple("poly", POLY));

    let full = || LayerShape::Inset { dx: 0.0, dy: 0.0 };
    tech.add_node(
        NodeProto::new("m1m2", NodeFunction::Contact)
            .with_layer(METAL1, full())
            .with_layer(VIA1, LayerShape::Inset { dx: 0.5, dy: 0.5 })
            .with_layer(METAL2, full())
            .connecting(&["m1", "m2"]),
    );
    tech.add_node(
        NodeProto::new("polym1", NodeFunction::Contact)
            .with_layer(POLY, full())
            .with_layer(POLY_CONTACT, LayerShape::Inset { dx: 0.5, dy: 0.5 })
            .with_layer(METAL1, full())
            .connecting(&["poly", "m1"]),
    );
    tech.add_node(NodeProto::new("m1pin", NodeFunction::Pin).connecting(&["m1"]));
    tech.add_node(NodeProto::new("m1node", NodeFunction::PureLayer).with_layer(METAL1, LayerShape::Trace));
    tech.add_node(NodeProto::new("m2node", NodeFunction::PureLayer).with_layer(METAL2, LayerShape::Trace));
    tech.add_node(
        NodeProto::new("m1cut", NodeFunction::PureLayer).with_layer(METAL1_CUT, LayerShape::Trace),
    );
    tech
}

/// A pure-layer rectangle node spanning the two corners.
pub fn rect_node(name: &str, proto: &str, x1: f64, y1: f64, x2: f64, y2: f64) -> NodeInst {
    NodeInst::primitive(
        name,
        proto,
        Point::new((x1 + x2) / 2.0, (y1 + y2) / 2.0),
        (x2 - x1).abs(),
        (y2 - y1).abs(),
    )
}

pub fn outline_node(name: &str, proto: &str, points: &[(f64, f64)]) -> NodeInst {
    NodeInst::traced(
        name,
        proto,
        points.iter().map(|&(x, y)| Point::new(x, y)).collect(),
    )
}

pub fn wire(name: &str, proto: &str, head: (f64, f64), tail: (f64, f64), width: f64) -> ArcInst {
    ArcInst::new(
        name,
        proto,
        Point::new(head.0, head.1),
        Point::new(tail.0, tail.1),
        width,
    )
}
