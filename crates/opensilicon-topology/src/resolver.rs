use std::collections::{BTreeMap, HashMap};

use opensilicon_core::technology::{Layer, LayerFunction, LayerId};

use crate::source::TechnologyDescriptor;

/// Same-level conducting layers treated as one electrical plane.
#[derive(Debug, Clone)]
pub struct ConnectingLayer {
    /// Layer used to name the plane.
    pub primary: LayerId,
    pub name: String,
    pub members: Vec<LayerId>,
    /// Arc types that route on any member layer.
    pub arcs: Vec<String>,
}

/// A contact layer bridging exactly two connecting layers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectingVia {
    pub via_layer: LayerId,
    /// Indices into [`ConnectivityConfig::layers`].
    pub layers: [usize; 2],
}

impl ConnectingVia {
    /// The connecting layer on the far side from `layer`, if this via touches it.
    pub fn other(&self, layer: usize) -> Option<usize> {
        if self.layers[0] == layer {
            Some(self.layers[1])
        } else if self.layers[1] == layer {
            Some(self.layers[0])
        } else {
            None
        }
    }
}

/// The connectivity model of a technology. Built once, read-only afterwards.
#[derive(Debug, Clone, Default)]
pub struct ConnectivityConfig {
    pub layers: Vec<ConnectingLayer>,
    pub vias: Vec<ConnectingVia>,
    /// Cut layer → primary layer of the group it removes material from.
    pub cut_map: BTreeMap<LayerId, LayerId>,
    member_index: HashMap<LayerId, usize>,
    via_index: HashMap<LayerId, usize>,
}

impl ConnectivityConfig {
    pub fn resolve<T: TechnologyDescriptor + ?Sized>(tech: &T) -> Self {
        let mut config = ConnectivityConfig::default();

        // metal groups, one per level
        let mut metals: BTreeMap<u32, Vec<&Layer>> = BTreeMap::new();
        for layer in tech.layers() {
            if let LayerFunction::Metal(level) = layer.function {
                if !layer.cut {
                    metals.entry(level).or_default().push(layer);
                }
            }
        }
        let mut metal_primary: BTreeMap<u32, LayerId> = BTreeMap::new();
        for (level, group) in &metals {
            let primary = group
                .iter()
                .find(|l| l.mask_color == 0)
                .unwrap_or(&group[0]);
            metal_primary.insert(*level, primary.id);
            config.push_layer(primary, group.iter().map(|l| l.id).collect());
        }

        // one plane per poly layer
        let mut poly_primary: BTreeMap<u32, LayerId> = BTreeMap::new();
        for layer in tech.layers() {
            if let LayerFunction::Poly(level) = layer.function {
                if !layer.cut {
                    poly_primary.entry(level).or_insert(layer.id);
                    config.push_layer(layer, vec![layer.id]);
                }
            }
        }

        for arc in tech.arc_types() {
            for plane in &mut config.layers {
                if plane.members.iter().any(|m| arc.uses_layer(*m)) {
                    plane.arcs.push(arc.name.clone());
                }
            }
        }

        for contact in tech.contact_types() {
            let via_layer = contact.layers.iter().find_map(|nl| {
                tech.layers()
                    .iter()
                    .find(|l| l.id == nl.layer_id && l.is_contact())
                    .map(|l| l.id)
            });
            let Some(via_layer) = via_layer else {
                log::warn!("contact {} has no via layer; not modeled", contact.name);
                continue;
            };

            let mut planes: Vec<usize> = Vec::new();
            for arc in &contact.connects {
                for (idx, plane) in config.layers.iter().enumerate() {
                    if plane.arcs.contains(arc) && !planes.contains(&idx) {
                        planes.push(idx);
                    }
                }
            }
            if planes.len() != 2 {
                log::warn!(
                    "contact {} connects {} layers instead of 2; not modeled",
                    contact.name,
                    planes.len()
                );
                continue;
            }
            planes.sort_unstable();
            let pair = [planes[0], planes[1]];

            match config.via_index.get(&via_layer) {
                Some(&existing) => {
                    if config.vias[existing].layers != pair {
                        log::warn!(
                            "contact {} joins {} and {} through a via layer already joining {} and {}",
                            contact.name,
                            config.layers[pair[0]].name,
                            config.layers[pair[1]].name,
                            config.layers[config.vias[existing].layers[0]].name,
                            config.layers[config.vias[existing].layers[1]].name,
                        );
                    }
                }
                None => {
                    config.via_index.insert(via_layer, config.vias.len());
                    config.vias.push(ConnectingVia {
                        via_layer,
                        layers: pair,
                    });
                }
            }
        }

        for layer in tech.layers().iter().filter(|l| l.cut) {
            let target = match layer.function {
                LayerFunction::Metal(level) => metal_primary.get(&level),
                LayerFunction::Poly(level) => poly_primary.get(&level),
                _ => None,
            };
            match target {
                Some(primary) => {
                    config.cut_map.insert(layer.id, *primary);
                }
                None => log::warn!("cut layer {} has no conducting layer to cut", layer.name),
            }
        }

        log::debug!(
            "connectivity: {} layers, {} vias, {} cut layers",
            config.layers.len(),
            config.vias.len(),
            config.cut_map.len()
        );
        config
    }

    fn push_layer(&mut self, primary: &Layer, members: Vec<LayerId>) {
        let idx = self.layers.len();
        for m in &members {
            self.member_index.insert(*m, idx);
        }
        self.layers.push(ConnectingLayer {
            primary: primary.id,
            name: primary.name.clone(),
            members,
            arcs: Vec::new(),
        });
    }

    /// Connecting layer containing `layer`.
    pub fn layer_of(&self, layer: LayerId) -> Option<usize> {
        self.member_index.get(&layer).copied()
    }

    /// Connecting via whose via layer is `layer`.
    pub fn via_of(&self, layer: LayerId) -> Option<usize> {
        self.via_index.get(&layer).copied()
    }

    pub fn is_cut(&self, layer: LayerId) -> bool {
        self.cut_map.contains_key(&layer)
    }

    /// Connecting layer a cut layer removes material from.
    pub fn cut_target(&self, cut_layer: LayerId) -> Option<usize> {
        self.cut_map
            .get(&cut_layer)
            .and_then(|primary| self.layer_of(*primary))
    }

    /// Vias touching `layer`, with the connecting layer on their other side.
    pub fn vias_touching(&self, layer: usize) -> impl Iterator<Item = (usize, usize)> + '_ {
        self.vias
            .iter()
            .enumerate()
            .filter_map(move |(idx, via)| via.other(layer).map(|other| (idx, other)))
    }
}
