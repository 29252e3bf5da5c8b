use opensilicon_core::CellId;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum TopologyError {
    #[error("Cell {0} is not in the database")]
    UnknownCell(CellId),

    #[error("Cell '{cell}' instantiates itself through its hierarchy")]
    CyclicHierarchy { cell: String },

    #[error("Cannot load design database: {0}")]
    Database(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, TopologyError>;
