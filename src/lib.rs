//!
//! Adaptive grid quadrature. A function of N parameters is integrated on a
//! uniform (linear or log-e spaced) grid whose density is doubled until two
//! successive estimates agree within a relative tolerance. Function values
//! are cached per grid point, so every point is evaluated once.
//!
pub mod algorithms;
pub mod config;
pub mod errors;
pub mod function;
pub mod grids;
pub mod integrators;
pub mod iterators;
pub mod serialization;
pub mod storage;
