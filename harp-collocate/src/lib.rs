//! Multi-criterion collocation: a time-sweep matchup between two datasets
//! of products, keeping sample pairs that satisfy every declared
//! criterion, with optional nearest-neighbour reduction on either side.
//!
//! Product loading and persistence (netCDF/HDF5, CSV files on disk) sit
//! outside this crate's scope — callers supply a [`ProductLoader`] and
//! read/write a [`CollocationResult`] through its own CSV methods.

mod criterion;
mod dataset;
mod engine;
mod error;
mod loader;
mod result;

pub use criterion::{
    AreaIntersectsCriterion, Criterion, NearestNeighbour, NearestNeighbourSide, PointDistanceCriterion, PointInAreaCriterion, PointInAreaDirection, ValueCriterion,
};
pub use dataset::{Dataset, ProductMetadata};
pub use engine::run;
pub use error::{CollocationError, Result};
pub use loader::{CancellationToken, ProductLoader};
pub use result::{CollocationResult, DifferenceHeader, Pair};
