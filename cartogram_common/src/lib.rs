//! Geometry primitives, grid storage, and spectral kernels shared by the
//! cartogram engine, split out from the engine crate the same way a
//! reusable primitives crate is split from a tool-specific application
//! crate: this crate knows nothing about regions, insets, or targets, only
//! about points, polygons, dense grids, and the transforms that operate on
//! them.

pub mod algorithms;
pub mod geometry;
pub mod grid;
pub mod spectral;

pub use grid::{Grid, PointGrid};
