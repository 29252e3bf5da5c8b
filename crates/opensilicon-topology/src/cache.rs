use opensilicon_core::{CellId, MetaValue, Revision};
use serde::Serialize;

use crate::collector;
use crate::cut;
use crate::error::{Result, TopologyError};
use crate::hierarchy;
use crate::propagate;
use crate::resolver::ConnectivityConfig;
use crate::source::{CellGeometrySource, CellMetadataStore, LayerShapeProvider, TechnologyDescriptor};

/// Metadata key holding the cached network strings.
pub const TOPOLOGY_KEY: &str = "topology";
/// Metadata key holding the revision at which the cache was written.
pub const TOPOLOGY_DATE_KEY: &str = "topology-date";

/// Result of one uncached extraction.
#[derive(Debug, Clone, Serialize)]
pub struct Extraction {
    pub networks: Vec<String>,
    /// Linked leaves per connecting layer.
    pub layer_leaves: Vec<usize>,
    /// Linked leaves per connecting via.
    pub via_leaves: Vec<usize>,
    pub non_manhattan: bool,
}

/// Connectivity extractor for one technology.
pub struct TopologyExtractor {
    config: ConnectivityConfig,
    rebuilds: usize,
}

impl TopologyExtractor {
    pub fn new<T: TechnologyDescriptor + ?Sized>(technology: &T) -> Self {
        Self {
            config: ConnectivityConfig::resolve(technology),
            rebuilds: 0,
        }
    }

    pub fn config(&self) -> &ConnectivityConfig {
        &self.config
    }

    /// Number of full extractions run by [`get_topology`](Self::get_topology).
    pub fn rebuilds(&self) -> usize {
        self.rebuilds
    }

    /// Run the whole pipeline on `cell`, ignoring any cached result.
    pub fn extract<S>(&self, source: &S, cell: &CellId) -> Result<Extraction>
    where
        S: CellGeometrySource + LayerShapeProvider + ?Sized,
    {
        let mut collection = collector::collect(source, &self.config, cell)?;
        cut::apply_cuts(&mut collection, &self.config);
        let ids = propagate::propagate(&mut collection, &self.config);
        let networks = propagate::network_names(&collection, &ids);

        log::debug!(
            "extracted {} networks from {} identities",
            networks.len(),
            ids.allocated()
        );
        Ok(Extraction {
            networks,
            layer_leaves: collection.layer_trees.iter().map(|t| t.len()).collect(),
            via_leaves: collection.via_trees.iter().map(|t| t.len()).collect(),
            non_manhattan: collection.non_manhattan,
        })
    }

    /// The networks of `cell`, served from the cache when it is still valid.
    /// A fresh result is stored on the cell without counting as a modification.
    pub fn get_topology<D>(&mut self, db: &mut D, cell: &CellId) -> Result<Vec<String>>
    where
        D: CellGeometrySource + LayerShapeProvider + CellMetadataStore + ?Sized,
    {
        if let Some(networks) = cached_topology(&*db, cell)? {
            log::info!("topology of {} served from cache", display_name(&*db, cell));
            return Ok(networks);
        }

        let extraction = self.extract(&*db, cell)?;
        self.rebuilds += 1;
        log::info!(
            "topology of {} rebuilt: {} networks",
            display_name(&*db, cell),
            extraction.networks.len()
        );

        let prior = db.revision(cell).ok_or(TopologyError::UnknownCell(*cell))?;
        let stamp = db.timestamp();
        db.set_meta(cell, TOPOLOGY_KEY, MetaValue::Strings(extraction.networks.clone()));
        db.set_meta(cell, TOPOLOGY_DATE_KEY, MetaValue::Revision(stamp));
        db.set_revision(cell, prior);
        Ok(extraction.networks)
    }
}

/// The cached networks of `cell`, if the cache postdates every content
/// change in the cell and the cells below it. Reads metadata only.
pub fn cached_topology<D>(db: &D, cell: &CellId) -> Result<Option<Vec<String>>>
where
    D: CellGeometrySource + CellMetadataStore + ?Sized,
{
    let stamp = match db.get_meta(cell, TOPOLOGY_DATE_KEY) {
        Some(MetaValue::Revision(rev)) => *rev,
        _ => return Ok(None),
    };
    let networks = match db.get_meta(cell, TOPOLOGY_KEY) {
        Some(MetaValue::Strings(networks)) => networks,
        _ => return Ok(None),
    };
    let latest = latest_revision(db, cell)?;
    if stamp > latest {
        Ok(Some(networks.clone()))
    } else {
        Ok(None)
    }
}

/// Networks of `cell`, one `/`-joined string each. The technology is only
/// resolved when the cache is missing or stale.
pub fn get_topology<D>(db: &mut D, cell: &CellId) -> Result<Vec<String>>
where
    D: CellGeometrySource
        + LayerShapeProvider
        + CellMetadataStore
        + TechnologyDescriptor
        + ?Sized,
{
    if let Some(networks) = cached_topology(&*db, cell)? {
        log::info!("topology of {} served from cache", display_name(&*db, cell));
        return Ok(networks);
    }
    let mut extractor = TopologyExtractor::new(&*db);
    extractor.get_topology(db, cell)
}

/// Latest content revision of `cell` and everything it instantiates.
fn latest_revision<D>(db: &D, cell: &CellId) -> Result<Revision>
where
    D: CellGeometrySource + CellMetadataStore + ?Sized,
{
    hierarchy::cells_under(db, cell)?
        .iter()
        .map(|c| db.revision(c).ok_or(TopologyError::UnknownCell(*c)))
        .try_fold(Revision::default(), |latest, rev| Ok(latest.max(rev?)))
}

fn display_name<D: CellGeometrySource + ?Sized>(db: &D, cell: &CellId) -> String {
    db.cell_name(cell)
        .map(str::to_string)
        .unwrap_or_else(|| cell.to_string())
}
