//! Spatial partitioning for neighbor queries

pub mod grid;
pub mod index;

pub use grid::Grid;
pub use index::{SpatialIndex, SpatialRef};
