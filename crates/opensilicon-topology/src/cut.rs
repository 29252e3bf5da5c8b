use geo::{Area, BooleanOps};
use opensilicon_core::geometry::BBox;

use crate::collector::Collection;
use crate::overlap;
use crate::resolver::ConnectivityConfig;
use crate::tree::{bbox_polygon, Leaf, LeafKey};

const AREA_EPSILON: f64 = 1e-9;

/// Apply every pending cut. Leaves overlapping a cut are replaced by the
/// fragments of their region outside it.
pub fn apply_cuts(collection: &mut Collection, config: &ConnectivityConfig) {
    let pending = std::mem::take(&mut collection.pending_cuts);
    for (cut_layer, rects) in pending {
        let Some(target) = config.cut_target(cut_layer) else {
            log::warn!("cut layer {cut_layer} has no target layer; cuts ignored");
            continue;
        };
        for rect in &rects {
            subtract(collection, target, rect);
        }
    }
}

/// Subtract one rectangle from the leaves of one connecting layer.
fn subtract(collection: &mut Collection, layer: usize, cut: &BBox) {
    let hits: Vec<LeafKey> = collection.layer_trees[layer]
        .search(cut)
        .filter(|k| collection.leaves[*k].bbox.overlaps(cut))
        .collect();
    let cut_region = bbox_polygon(cut);

    for key in hits {
        let leaf = &collection.leaves[key];
        let region = leaf.to_polygon();
        let remaining = region.difference(&cut_region);
        if (remaining.unsigned_area() - region.unsigned_area()).abs() <= AREA_EPSILON {
            // bounding boxes overlap but the shape does not
            continue;
        }
        let origin = leaf.origin;
        let old = leaf.clone();
        collection.layer_trees[layer].unlink(key, &old);

        for fragment in remaining {
            if fragment.unsigned_area() <= AREA_EPSILON {
                continue;
            }
            let Some(bbox) = overlap::polygon_bbox(&fragment) else {
                continue;
            };
            let fills_box = fragment.interiors().is_empty()
                && (fragment.unsigned_area() - bbox.area()).abs() <= AREA_EPSILON * bbox.area().max(1.0);
            let piece = if fills_box {
                Some(Leaf::rect(bbox, origin))
            } else {
                Leaf::polygon(fragment, origin)
            };
            if let Some(piece) = piece {
                let new_key = collection.leaves.push(piece);
                collection.layer_trees[layer].link(new_key, &collection.leaves[new_key]);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collector::collect;
    use crate::fixtures::{self, outline_node, rect_node};
    use crate::propagate::{network_names, propagate};
    use opensilicon_core::{Cell, LayoutDatabase};

    fn collected(cell: Cell) -> (Collection, ConnectivityConfig) {
        let tech = fixtures::two_metal();
        let config = ConnectivityConfig::resolve(&tech);
        let mut db = LayoutDatabase::new("cut", tech);
        let id = db.add_cell(cell);
        (collect(&db, &config, &id).unwrap(), config)
    }

    fn metal1_region(c: &Collection, config: &ConnectivityConfig) -> Vec<(BBox, f64)> {
        let m1 = config.layer_of(fixtures::METAL1).unwrap();
        let mut out: Vec<(BBox, f64)> = c.layer_trees[m1]
            .keys()
            .into_iter()
            .map(|k| {
                let leaf = &c.leaves[k];
                (leaf.bbox, leaf.to_polygon().unsigned_area())
            })
            .collect();
        out.sort_by(|a, b| {
            (a.0.min.x, a.0.min.y, a.0.max.x, a.0.max.y)
                .partial_cmp(&(b.0.min.x, b.0.min.y, b.0.max.x, b.0.max.y))
                .unwrap()
        });
        out
    }

    #[test]
    fn test_full_cover_removes_leaf() {
        let mut cell = Cell::new("top");
        cell.add_node(rect_node("m", "m1node", 0.0, 0.0, 4.0, 4.0));
        cell.add_node(rect_node("x", "m1cut", -1.0, -1.0, 5.0, 5.0));
        let (mut c, config) = collected(cell);
        apply_cuts(&mut c, &config);
        assert!(metal1_region(&c, &config).is_empty());
        assert!(c.pending_cuts.is_empty());
    }

    #[test]
    fn test_partial_cover_splits_leaf() {
        let mut cell = Cell::new("top");
        cell.add_node(rect_node("m", "m1node", 0.0, 0.0, 10.0, 2.0));
        cell.add_node(rect_node("x", "m1cut", 4.0, -1.0, 6.0, 3.0));
        let (mut c, config) = collected(cell);
        apply_cuts(&mut c, &config);
        let region = metal1_region(&c, &config);
        assert_eq!(region.len(), 2);
        assert_eq!(region[0].0, BBox::from_corners(0.0, 0.0, 4.0, 2.0));
        assert_eq!(region[1].0, BBox::from_corners(6.0, 0.0, 10.0, 2.0));
        let total: f64 = region.iter().map(|r| r.1).sum();
        assert!((total - 16.0).abs() < 1e-10);

        let m1 = config.layer_of(fixtures::METAL1).unwrap();
        for k in c.layer_trees[m1].keys() {
            assert!(!c.leaves[k].is_polygon());
            assert_eq!(c.leaves[k].origin.map(|o| c.object(o).name.clone()), Some("m".to_string()));
            assert!(c.leaves[k].net.is_none());
        }
    }

    #[test]
    fn test_touching_cut_leaves_leaf_alone() {
        let mut cell = Cell::new("top");
        cell.add_node(rect_node("m", "m1node", 0.0, 0.0, 4.0, 4.0));
        cell.add_node(rect_node("x", "m1cut", 4.0, 0.0, 6.0, 4.0));
        let (mut c, config) = collected(cell);
        let before = metal1_region(&c, &config);
        apply_cuts(&mut c, &config);
        assert_eq!(metal1_region(&c, &config), before);
    }

    #[test]
    fn test_interior_cut_leaves_ring() {
        let mut cell = Cell::new("top");
        cell.add_node(rect_node("m", "m1node", 0.0, 0.0, 10.0, 10.0));
        cell.add_node(rect_node("x", "m1cut", 4.0, 4.0, 6.0, 6.0));
        let (mut c, config) = collected(cell);
        apply_cuts(&mut c, &config);
        let region = metal1_region(&c, &config);
        assert_eq!(region.len(), 1);
        assert!((region[0].1 - 96.0).abs() < 1e-10);
        let m1 = config.layer_of(fixtures::METAL1).unwrap();
        let key = c.layer_trees[m1].keys()[0];
        assert!(c.leaves[key].is_polygon());
    }

    #[test]
    fn test_cut_misses_triangle_inside_bbox() {
        let mut cell = Cell::new("top");
        cell.add_node(outline_node("tri", "m1node", &[(0.0, 0.0), (4.0, 0.0), (0.0, 4.0)]));
        cell.add_node(rect_node("x", "m1cut", 3.0, 3.0, 5.0, 5.0));
        let (mut c, config) = collected(cell);
        let m1 = config.layer_of(fixtures::METAL1).unwrap();
        let before = c.layer_trees[m1].keys();
        apply_cuts(&mut c, &config);
        assert_eq!(c.layer_trees[m1].keys(), before);
    }

    #[test]
    fn test_disjoint_cuts_commute() {
        let build = |first: (f64, f64), second: (f64, f64)| {
            let mut cell = Cell::new("top");
            cell.add_node(rect_node("m", "m1node", 0.0, 0.0, 20.0, 4.0));
            cell.add_node(rect_node("x0", "m1cut", first.0, -1.0, first.1, 5.0));
            cell.add_node(rect_node("x1", "m1cut", second.0, 1.0, second.1, 3.0));
            let (mut c, config) = collected(cell);
            apply_cuts(&mut c, &config);
            metal1_region(&c, &config)
        };
        let forward = build((4.0, 6.0), (12.0, 14.0));
        let reverse = build((12.0, 14.0), (4.0, 6.0));
        assert_eq!(forward.len(), 2);
        assert_eq!(forward.len(), reverse.len());
        for (a, b) in forward.iter().zip(&reverse) {
            assert_eq!(a.0, b.0);
            assert!((a.1 - b.1).abs() < 1e-10);
        }
    }

    #[test]
    fn test_overlapping_cuts_commute() {
        let build = |first: (f64, f64, f64, f64), second: (f64, f64, f64, f64)| {
            let mut cell = Cell::new("top");
            cell.add_node(rect_node("m", "m1node", 0.0, 0.0, 20.0, 10.0));
            cell.add_node(rect_node("x0", "m1cut", first.0, first.1, first.2, first.3));
            cell.add_node(rect_node("x1", "m1cut", second.0, second.1, second.2, second.3));
            let (mut c, config) = collected(cell);
            apply_cuts(&mut c, &config);
            let region = metal1_region(&c, &config);
            let ids = propagate(&mut c, &config);
            let mut names = network_names(&c, &ids);
            names.sort();
            (region, names)
        };
        let low = (4.0, -1.0, 10.0, 6.0);
        let high = (8.0, 4.0, 14.0, 11.0);
        let (forward, forward_names) = build(low, high);
        let (reverse, reverse_names) = build(high, low);

        assert_eq!(forward.len(), 2);
        assert_eq!(forward.len(), reverse.len());
        for (a, b) in forward.iter().zip(&reverse) {
            assert_eq!(a.0, b.0);
            assert!((a.1 - b.1).abs() < 1e-10);
        }
        let total: f64 = forward.iter().map(|r| r.1).sum();
        assert!((total - 132.0).abs() < 1e-10);
        assert_eq!(forward[0].0, BBox::from_corners(0.0, 0.0, 8.0, 10.0));
        assert_eq!(forward[1].0, BBox::from_corners(10.0, 0.0, 20.0, 10.0));

        assert_eq!(forward_names, reverse_names);
        assert_eq!(
            forward_names,
            vec!["Nm[0;0;8;10]".to_string(), "Nm[10;0;10;10]".to_string()]
        );
    }
}
