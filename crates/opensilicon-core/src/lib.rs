//! # OpenSilicon Core
//!
//! Core layout database with hierarchical cell management, technology
//! description, geometric primitives and a revision clock used to stamp
//! cell content changes.
//!
//! This crate is the heart of the OpenSilicon EDA kernel.

pub mod geometry;
pub mod cell;
pub mod database;
pub mod technology;

pub use database::LayoutDatabase;
pub use cell::{ArcInst, Cell, CellId, MetaValue, NodeInst, NodeProtoRef, Revision};
pub use technology::{Layer, LayerFunction, LayerId, Technology};
pub use geometry::{BBox, Point, Poly, PolyStyle, Transform};
