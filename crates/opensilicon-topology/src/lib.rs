//! # OpenSilicon Topology
//!
//! Fast connectivity extraction over the layout database. Shapes on the
//! conducting layers of a cell hierarchy are loaded into per-layer R-trees,
//! cut layers are subtracted, and touching shapes are flood-filled into
//! networks across layers through vias. Results are cached on the cell
//! against its revision.
//!
//! This does not netlist, check design rules or route; it only answers which
//! shapes touch, directly or through vias.

pub mod cache;
pub mod collector;
pub mod cut;
pub mod error;
pub mod hierarchy;
pub mod netid;
pub mod overlap;
pub mod propagate;
pub mod resolver;
pub mod source;
pub mod tree;

#[cfg(test)]
mod fixtures;

pub use cache::{
    cached_topology, get_topology, Extraction, TopologyExtractor, TOPOLOGY_DATE_KEY, TOPOLOGY_KEY,
};
pub use error::{Result, TopologyError};
pub use resolver::{ConnectingLayer, ConnectingVia, ConnectivityConfig};
pub use source::{CellGeometrySource, CellMetadataStore, LayerShapeProvider, TechnologyDescriptor};
