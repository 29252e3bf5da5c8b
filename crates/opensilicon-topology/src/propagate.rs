use std::collections::BTreeSet;

use opensilicon_core::geometry::{BBox, GEOM_EPSILON};

use crate::collector::Collection;
use crate::netid::{NetId, NetworkIds};
use crate::resolver::ConnectivityConfig;
use crate::tree::LeafKey;

/// Assign a network identity to every leaf reachable through touching geometry.
pub fn propagate(collection: &mut Collection, config: &ConnectivityConfig) -> NetworkIds {
    let mut ids = NetworkIds::new();
    for layer in 0..config.layers.len() {
        for key in collection.layer_trees[layer].keys() {
            if collection.leaves[key].net.is_some() {
                continue;
            }
            let id = ids.allocate();
            claim(collection, &mut ids, key, id);
            grow(collection, config, &mut ids, key, layer, id);
        }
    }
    ids
}

fn claim(collection: &mut Collection, ids: &mut NetworkIds, key: LeafKey, id: NetId) {
    collection.leaves[key].net = Some(id);
    ids.assign(id, key);
}

/// Give `key` the identity `id` if it has none (returning true so the caller
/// keeps growing from it), or merge its existing network into `id`'s.
fn join(collection: &mut Collection, ids: &mut NetworkIds, key: LeafKey, id: NetId) -> bool {
    match collection.leaves[key].net {
        None => {
            claim(collection, ids, key, id);
            true
        }
        Some(existing) => {
            if !ids.same(existing, id) {
                ids.merge(id, existing);
            }
            false
        }
    }
}

fn grow(
    collection: &mut Collection,
    config: &ConnectivityConfig,
    ids: &mut NetworkIds,
    start: LeafKey,
    start_layer: usize,
    id: NetId,
) {
    let mut work = vec![(start, start_layer)];
    while let Some((key, layer)) = work.pop() {
        let bbox = collection.leaves[key].bbox;

        let neighbors: Vec<LeafKey> = collection.layer_trees[layer]
            .search(&bbox)
            .filter(|c| *c != key)
            .filter(|c| collection.leaves[key].touches(&collection.leaves[*c]))
            .collect();
        for candidate in neighbors {
            if join(collection, ids, candidate, id) {
                work.push((candidate, layer));
            }
        }

        for (via, other) in config.vias_touching(layer) {
            let vias: Vec<LeafKey> = collection.via_trees[via]
                .search(&bbox)
                .filter(|v| collection.leaves[key].touches(&collection.leaves[*v]))
                .collect();
            for via_key in vias {
                if !join(collection, ids, via_key, id) {
                    continue;
                }
                let center = collection.leaves[via_key].bbox.center();
                let landing: Vec<LeafKey> = collection.layer_trees[other]
                    .search(&BBox::new(center, center))
                    .filter(|c| collection.leaves[*c].contains_point(&center))
                    .collect();
                for target in landing {
                    if join(collection, ids, target, id) {
                        work.push((target, other));
                    }
                }
            }
        }
    }
}

/// One `/`-joined string per network that has top-level members, in the order
/// the networks were first discovered.
pub fn network_names(collection: &Collection, ids: &NetworkIds) -> Vec<String> {
    let mut networks: Vec<(LeafKey, String)> = ids
        .networks()
        .filter_map(|(_, holders)| {
            let first = *holders.iter().min()?;
            let tokens: BTreeSet<String> = holders
                .iter()
                .filter_map(|k| leaf_token(collection, *k))
                .collect();
            if tokens.is_empty() {
                return None;
            }
            Some((first, tokens.into_iter().collect::<Vec<_>>().join("/")))
        })
        .collect();
    networks.sort_by_key(|(first, _)| *first);
    networks.into_iter().map(|(_, name)| name).collect()
}

fn leaf_token(collection: &Collection, key: LeafKey) -> Option<String> {
    let leaf = &collection.leaves[key];
    let object = collection.object(leaf.origin?);
    let mut token = object.token();
    let partial = leaf.bbox.width() < object.bounds.width() - GEOM_EPSILON
        || leaf.bbox.height() < object.bounds.height() - GEOM_EPSILON;
    if partial {
        token.push_str(&format!(
            "[{};{};{};{}]",
            grid_coord(leaf.bbox.min.x),
            grid_coord(leaf.bbox.min.y),
            grid_coord(leaf.bbox.width()),
            grid_coord(leaf.bbox.height())
        ));
    }
    Some(token)
}

/// Decimal places kept in bracket coordinates.
const TOKEN_DECIMALS: usize = 6;

/// A coordinate rounded to the token grid, without trailing zeros.
fn grid_coord(value: f64) -> String {
    let text = format!("{:.*}", TOKEN_DECIMALS, value);
    let text = text.trim_end_matches('0').trim_end_matches('.');
    match text {
        "-0" | "" => "0".to_string(),
        _ => text.to_string(),
    }
}
