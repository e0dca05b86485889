//! Geometry primitives shared by the action executor and the collocation
//! engine: great-circle distance, point-in-polygon, and polygon overlap.
//!
//! Polygons here are always given in plain (latitude, longitude) degrees.
//! True spherical polygon clipping is not attempted; overlap and
//! containment are computed on a local equirectangular projection
//! centred on the subject polygon, which is accurate enough for the
//! footprint-sized polygons (`latitude_bounds`/`longitude_bounds`
//! corners) this crate is built to compare. See [`polygon::overlap_fraction`]
//! for the antimeridian handling this implies.

mod distance;
mod point;
mod polygon;

pub use distance::great_circle_distance_m;
pub use point::Point;
pub use polygon::{overlap_fraction, point_in_polygon, polygons_intersect, Polygon};

/// Mean Earth radius, metres. Matches the value HARP's geometry helpers use
/// for great-circle and area computations.
pub const EARTH_RADIUS_M: f64 = 6_371_000.0;
