use std::collections::HashMap;

use opensilicon_core::CellId;

use crate::error::{Result, TopologyError};
use crate::source::CellGeometrySource;

#[derive(Clone, Copy, PartialEq, Eq)]
enum Visit {
    Open,
    Done,
}

/// Every cell reachable from `root` (root included), children before parents.
/// Fails if a cell is missing or instantiates one of its ancestors.
pub fn cells_under<S>(source: &S, root: &CellId) -> Result<Vec<CellId>>
where
    S: CellGeometrySource + ?Sized,
{
    let mut state: HashMap<CellId, Visit> = HashMap::new();
    let mut order = Vec::new();
    // (cell, index of the next node to look at)
    let mut stack: Vec<(CellId, usize)> = vec![(*root, 0)];
    state.insert(*root, Visit::Open);

    while let Some((cell, next)) = stack.pop() {
        let nodes = source
            .node_insts(&cell)
            .ok_or(TopologyError::UnknownCell(cell))?;
        let child = nodes[next.min(nodes.len())..]
            .iter()
            .enumerate()
            .find_map(|(i, n)| n.subcell().map(|id| (next + i, id)));

        match child {
            Some((idx, child)) => {
                stack.push((cell, idx + 1));
                match state.get(&child) {
                    Some(Visit::Open) => {
                        let name = source.cell_name(&child).unwrap_or("?").to_string();
                        return Err(TopologyError::CyclicHierarchy { cell: name });
                    }
                    Some(Visit::Done) => {}
                    None => {
                        state.insert(child, Visit::Open);
                        stack.push((child, 0));
                    }
                }
            }
            None => {
                state.insert(cell, Visit::Done);
                order.push(cell);
            }
        }
    }
    Ok(order)
}
