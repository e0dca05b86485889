//! Matchup criteria (§4.8) and nearest-neighbour reduction directives.
//!
//! `ValueCriterion`/`PointDistanceCriterion` each contribute one entry to
//! a pair's `differences` vector and the result's header; `AreaIntersects`/
//! `PointInArea` are pure pass/fail gates over `latitude_bounds`/
//! `longitude_bounds` and never appear in the header — the same split the
//! original C draws between its `collocation_criterium` array and its
//! standalone `filter_area_intersects`/`filter_point_in_area_xy`/`_yx` flags.

use harp_units::UnitError;

/// Angle criteria wrap at 360 degrees expressed in the criterion's own
/// unit, folded onto `[0, modulo/2]` — see [`crate::engine::fold_modulo`].
const ANGLE_MODULO_DEG: f64 = 360.0;

/// Absolute difference of a named variable between the two products,
/// optionally reduced modulo a wraparound (for longitudes, wind
/// directions, azimuth angles, ...). `var_name == "datetime"` is the one
/// name the sweep treats specially: it drives the time-window pre-filter
/// (§4.8 "Sweep" step 2) in addition to being an ordinary criterion.
#[derive(Debug, Clone, PartialEq)]
pub struct ValueCriterion {
    pub var_name: String,
    pub threshold: f64,
    pub unit: Option<String>,
    pub use_modulo: bool,
}

impl ValueCriterion {
    pub fn new(var_name: impl Into<String>, threshold: f64, unit: Option<String>) -> Self {
        ValueCriterion { var_name: var_name.into(), threshold, unit, use_modulo: false }
    }

    /// A criterion on an angular quantity, wrapped modulo 360 degrees
    /// (converted into this criterion's own unit).
    pub fn angular(var_name: impl Into<String>, threshold: f64, unit: Option<String>) -> Self {
        ValueCriterion { var_name: var_name.into(), threshold, unit, use_modulo: true }
    }

    /// 360 degrees expressed in this criterion's unit (§9 "Supplemental
    /// features": the modulus is always a quarter-turn-times-four, never a
    /// caller-supplied value).
    pub fn modulo_in_own_unit(&self) -> Result<f64, UnitError> {
        harp_units::factor("deg", self.unit.as_deref().unwrap_or("deg")).map(|f| ANGLE_MODULO_DEG * f)
    }
}

/// Great-circle distance between `latitude`/`longitude` of the two
/// products.
#[derive(Debug, Clone, PartialEq)]
pub struct PointDistanceCriterion {
    pub threshold: f64,
    pub unit: Option<String>,
}

impl PointDistanceCriterion {
    pub fn new(threshold: f64, unit: Option<String>) -> Self {
        PointDistanceCriterion { threshold, unit }
    }
}

/// Which side's point must fall inside the other side's footprint
/// polygon.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointInAreaDirection {
    /// A's point must lie inside B's `latitude_bounds`/`longitude_bounds`.
    AInB,
    /// B's point must lie inside A's `latitude_bounds`/`longitude_bounds`.
    BInA,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AreaIntersectsCriterion;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PointInAreaCriterion {
    pub direction: PointInAreaDirection,
}

/// One matchup criterion, in the caller's declared order. The sweep
/// reorders its own working copy (`datetime` first, `point_distance`
/// last) but the result header always reflects this declared order.
#[derive(Debug, Clone, PartialEq)]
pub enum Criterion {
    Value(ValueCriterion),
    PointDistance(PointDistanceCriterion),
    AreaIntersects(AreaIntersectsCriterion),
    PointInArea(PointInAreaCriterion),
}

impl Criterion {
    /// The header name this criterion contributes, or `None` for the
    /// boolean-only polygon predicates.
    pub fn header_name(&self) -> Option<&str> {
        match self {
            Criterion::Value(v) => Some(&v.var_name),
            Criterion::PointDistance(_) => Some("point_distance"),
            Criterion::AreaIntersects(_) | Criterion::PointInArea(_) => None,
        }
    }
}

/// Which side of the matchup a nearest-neighbour directive reduces:
/// `X` keeps at most one partner per sample of dataset A, `Y` keeps at
/// most one partner per sample of dataset B (§4.8).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NearestNeighbourSide {
    X,
    Y,
}

/// A nearest-neighbour reduction directive. At most one per side; when
/// both are supplied to [`crate::engine::run`], the first in declaration
/// order is applied online during the sweep and the second as a
/// post-filter (§4.8).
#[derive(Debug, Clone, PartialEq)]
pub struct NearestNeighbour {
    pub variable_name: String,
    pub side: NearestNeighbourSide,
}

impl NearestNeighbour {
    pub fn new(variable_name: impl Into<String>, side: NearestNeighbourSide) -> Self {
        NearestNeighbour { variable_name: variable_name.into(), side }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn angular_modulo_is_360_degrees_in_radians() {
        let c = ValueCriterion::angular("wind_direction", 5.0, Some("rad".to_string()));
        let modulo = c.modulo_in_own_unit().unwrap();
        assert!((modulo - std::f64::consts::TAU).abs() < 1e-9);
    }

    #[test]
    fn point_distance_has_no_header_modulo() {
        let c = Criterion::PointDistance(PointDistanceCriterion::new(1000.0, Some("m".to_string())));
        assert_eq!(c.header_name(), Some("point_distance"));
    }

    #[test]
    fn area_predicates_contribute_no_header_column() {
        assert_eq!(Criterion::AreaIntersects(AreaIntersectsCriterion).header_name(), None);
        assert_eq!(Criterion::PointInArea(PointInAreaCriterion { direction: PointInAreaDirection::AInB }).header_name(), None);
    }
}
