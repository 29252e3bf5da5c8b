use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::cell::{Cell, CellId, MetaValue, Revision};
use crate::technology::Technology;

/// The central layout database that holds all cells and the technology.
#[derive(Debug, Serialize, Deserialize)]
pub struct LayoutDatabase {
    /// Database identifier.
    pub id: Uuid,
    /// Project name.
    pub name: String,
    pub technology: Technology,
    /// All cells indexed by ID.
    cells: HashMap<CellId, Cell>,
    /// Top-level cell (entry point for hierarchy).
    pub top_cell: Option<CellId>,
    /// Revision clock; advanced by every modification.
    clock: u64,
}

impl LayoutDatabase {
    pub fn new(name: &str, technology: Technology) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.to_string(),
            technology,
            cells: HashMap::new(),
            top_cell: None,
            clock: 0,
        }
    }

    // ── Cell management ──────────────────────────────────────────────

    pub fn add_cell(&mut self, mut cell: Cell) -> CellId {
        let id = cell.id;
        cell.revision = self.tick();
        self.cells.insert(id, cell);
        if self.top_cell.is_none() {
            self.top_cell = Some(id);
        }
        id
    }

    pub fn get_cell(&self, id: &CellId) -> Option<&Cell> {
        self.cells.get(id)
    }

    pub fn find_cell_by_name(&self, name: &str) -> Option<&Cell> {
        self.cells.values().find(|c| c.name == name)
    }

    pub fn cell_count(&self) -> usize {
        self.cells.len()
    }

    /// Modify a cell's contents. The cell's revision advances to a fresh tick.
    pub fn edit_cell<R>(&mut self, id: &CellId, edit: impl FnOnce(&mut Cell) -> R) -> Option<R> {
        let rev = self.tick();
        let cell = self.cells.get_mut(id)?;
        let result = edit(cell);
        cell.revision = rev;
        Some(result)
    }

    // ── Revisions and metadata ───────────────────────────────────────

    /// Current clock value, without advancing it.
    pub fn now(&self) -> Revision {
        Revision(self.clock)
    }

    /// Advance the clock and return the new tick.
    pub fn tick(&mut self) -> Revision {
        self.clock += 1;
        Revision(self.clock)
    }

    pub fn revision(&self, id: &CellId) -> Option<Revision> {
        self.cells.get(id).map(|c| c.revision)
    }

    /// Overwrite a cell's revision without touching the clock.
    pub fn set_revision(&mut self, id: &CellId, revision: Revision) -> bool {
        match self.cells.get_mut(id) {
            Some(cell) => {
                cell.revision = revision;
                true
            }
            None => false,
        }
    }

    pub fn get_meta(&self, id: &CellId, key: &str) -> Option<&MetaValue> {
        self.cells.get(id)?.metadata.get(key)
    }

    /// Attach a named value to a cell. Like any edit, this advances the cell's revision.
    pub fn set_meta(&mut self, id: &CellId, key: &str, value: MetaValue) -> bool {
        self.edit_cell(id, |cell| {
            cell.metadata.insert(key.to_string(), value);
        })
        .is_some()
    }

    // ── Serialization ────────────────────────────────────────────────

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cell::NodeInst;
    use crate::geometry::Point;

    fn db() -> LayoutDatabase {
        LayoutDatabase::new("test", Technology::new("empty"))
    }

    #[test]
    fn test_database_create() {
        let db = LayoutDatabase::new("test_project", Technology::new("empty"));
        assert_eq!(db.name, "test_project");
        assert_eq!(db.cell_count(), 0);
        assert!(db.top_cell.is_none());
    }

    #[test]
    fn test_add_and_find_cell() {
        let mut db = db();
        let id = db.add_cell(Cell::new("inverter"));
        assert_eq!(db.cell_count(), 1);
        assert!(db.get_cell(&id).is_some());
        assert_eq!(db.find_cell_by_name("inverter").unwrap().name, "inverter");
        assert_eq!(db.top_cell, Some(id));
    }

    #[test]
    fn test_edit_advances_revision() {
        let mut db = db();
        let id = db.add_cell(Cell::new("top"));
        let before = db.revision(&id).unwrap();
        db.edit_cell(&id, |c| {
            c.add_node(NodeInst::primitive("p", "pin", Point::new(0.0, 0.0), 1.0, 1.0))
        });
        let after = db.revision(&id).unwrap();
        assert!(after > before);
        assert_eq!(after, db.now());
    }

    #[test]
    fn test_meta_write_is_a_modification() {
        let mut db = db();
        let id = db.add_cell(Cell::new("top"));
        let before = db.revision(&id).unwrap();
        assert!(db.set_meta(&id, "note", MetaValue::Text("hi".into())));
        assert!(db.revision(&id).unwrap() > before);
        assert!(db.set_revision(&id, before));
        assert_eq!(db.revision(&id), Some(before));
        assert_eq!(db.get_meta(&id, "note"), Some(&MetaValue::Text("hi".into())));
    }

    #[test]
    fn test_json_round_trip_keeps_clock() {
        let mut db = db();
        let id = db.add_cell(Cell::new("top"));
        let json = db.to_json().unwrap();
        let loaded = LayoutDatabase::from_json(&json).unwrap();
        assert_eq!(loaded.now(), db.now());
        assert_eq!(loaded.get_cell(&id).unwrap().name, "top");
    }
}
