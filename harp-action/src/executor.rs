//! Applies an [`ActionList`] to a [`Product`] left-to-right (§4.7).
//!
//! Each action is evaluated against a clone of the product and only
//! committed back on success, giving the all-or-nothing-per-action
//! transaction discipline §5 asks for without needing a separate undo
//! log: a failed action simply discards its snapshot.

use std::collections::{HashMap, HashSet};

use harp_product::{DimensionType, Product, ScalarValue, Variable, VariableError};

use crate::action::*;
use crate::error::{ActionError, Result};

/// An external collaborator answering the three area-mask predicates
/// §4.7 and §6.3 describe, keyed internally by `(source_product, index)`.
/// The core never parses the mask file itself; something upstream builds
/// this and hands it to the executor through an [`ExecutionContext`].
pub trait AreaMaskProvider {
    fn point_covered(&self, source_product: &str, index: i64) -> bool;
    fn area_covered(&self, source_product: &str, index: i64) -> bool;
    /// Fraction of the sample's area covered by the target area, in `[0, 1]`.
    fn area_intersects_fraction(&self, source_product: &str, index: i64) -> f64;
}

/// The `(source_product, index)` membership of each side of a persisted
/// collocation result, as consumed by `CollocationFilter` (§4.7, §6.2).
#[derive(Debug, Clone, Default)]
pub struct CollocationIndex {
    left: HashSet<(String, i64)>,
    right: HashSet<(String, i64)>,
}

impl CollocationIndex {
    pub fn from_pairs(pairs: impl IntoIterator<Item = (String, i64, String, i64)>) -> Self {
        let mut left = HashSet::new();
        let mut right = HashSet::new();
        for (product_a, index_a, product_b, index_b) in pairs {
            left.insert((product_a, index_a));
            right.insert((product_b, index_b));
        }
        CollocationIndex { left, right }
    }

    pub fn contains(&self, side: Side, source_product: &str, index: i64) -> bool {
        let set = match side {
            Side::Left => &self.left,
            Side::Right => &self.right,
        };
        set.contains(&(source_product.to_string(), index))
    }
}

/// Pre-loaded external collaborator data the executor needs for actions
/// it cannot resolve from the product alone. Empty by default: an
/// action list with no `AreaMask*`/`CollocationFilter` actions never
/// touches this.
#[derive(Default)]
pub struct ExecutionContext<'a> {
    area_masks: HashMap<String, &'a dyn AreaMaskProvider>,
    collocation_indices: HashMap<String, &'a CollocationIndex>,
}

impl<'a> ExecutionContext<'a> {
    pub fn new() -> Self {
        ExecutionContext::default()
    }

    pub fn with_area_mask(mut self, filename: impl Into<String>, provider: &'a dyn AreaMaskProvider) -> Self {
        self.area_masks.insert(filename.into(), provider);
        self
    }

    pub fn with_collocation_index(mut self, filename: impl Into<String>, index: &'a CollocationIndex) -> Self {
        self.collocation_indices.insert(filename.into(), index);
        self
    }
}

pub fn apply(product: &mut Product, actions: &ActionList, ctx: &ExecutionContext) -> Result<()> {
    for action in actions.iter() {
        let mut snapshot = product.clone();
        apply_one(&mut snapshot, action, ctx)?;
        *product = snapshot;
    }
    Ok(())
}

fn apply_one(product: &mut Product, action: &Action, ctx: &ExecutionContext) -> Result<()> {
    match action {
        Action::ComparisonFilter { var, op, value, unit } => apply_comparison_filter(product, var, *op, *value, unit.as_deref()),
        Action::StringComparisonFilter { var, op, string } => apply_string_comparison_filter(product, var, *op, string),
        Action::BitMaskFilter { var, op, mask } => apply_bit_mask_filter(product, var, *op, *mask),
        Action::MembershipFilter { var, op, values, unit } => apply_membership_filter(product, var, *op, values, unit.as_deref()),
        Action::StringMembershipFilter { var, op, strings } => apply_string_membership_filter(product, var, *op, strings),
        Action::ValidRangeFilter { var } => apply_valid_range_filter(product, var),
        Action::LongitudeRangeFilter { min, min_unit, max, max_unit } => {
            apply_longitude_range_filter(product, *min, min_unit.as_deref(), *max, max_unit.as_deref())
        }
        Action::PointDistanceFilter { lon, lon_unit, lat, lat_unit, distance, distance_unit } => {
            apply_point_distance_filter(product, *lon, lon_unit.as_deref(), *lat, lat_unit.as_deref(), *distance, distance_unit.as_deref())
        }
        Action::AreaMaskCoversPointFilter { filename } => apply_area_mask_filter(product, filename, ctx, AreaPredicate::Point),
        Action::AreaMaskCoversAreaFilter { filename } => apply_area_mask_filter(product, filename, ctx, AreaPredicate::Covers),
        Action::AreaMaskIntersectsAreaFilter { filename, min_fraction_pct } => {
            apply_area_mask_filter(product, filename, ctx, AreaPredicate::Intersects(*min_fraction_pct))
        }
        Action::CollocationFilter { filename, side } => apply_collocation_filter(product, filename, *side, ctx),
        Action::VariableDerivation { var, dims, unit } => apply_variable_derivation(product, var, dims, unit.as_deref()),
        Action::VariableInclusion { names } => apply_variable_inclusion(product, names),
        Action::VariableExclusion { names } => apply_variable_exclusion(product, names),
    }
}

fn time_len(product: &Product) -> usize {
    product.dimension_extent(DimensionType::Time).unwrap_or(1)
}

fn non_time_stride(variable: &Variable) -> usize {
    variable
        .dimensions()
        .iter()
        .filter(|(d, _)| *d != DimensionType::Time)
        .map(|(_, e)| *e)
        .product::<usize>()
        .max(1)
}

/// Evaluate a per-element numeric predicate and reduce it to one boolean
/// per time-row: every non-time element of the row must pass (and not be
/// the fill value) for the row to survive. A variable carrying no time
/// axis is evaluated once and the result broadcast uniformly to every row.
fn numeric_row_mask(product: &Product, var_name: &str, rows: usize, pred: impl Fn(f64) -> bool) -> Result<Vec<bool>> {
    let variable = product.get(var_name).ok_or_else(|| VariableError::NotFound(var_name.to_string()))?;
    let has_time = variable.has_dimension(DimensionType::Time);
    let stride = non_time_stride(variable);
    let row_passes = |row: usize| -> bool {
        (0..stride).all(|j| {
            let idx = row * stride + j;
            match variable.data().get_f64(idx) {
                Some(v) => !variable.is_fill(v) && pred(v),
                None => false,
            }
        })
    };
    if has_time {
        Ok((0..rows).map(row_passes).collect())
    } else {
        Ok(vec![row_passes(0); rows])
    }
}

fn string_row_mask(product: &Product, var_name: &str, rows: usize, pred: impl Fn(&str) -> bool) -> Result<Vec<bool>> {
    let variable = product.get(var_name).ok_or_else(|| VariableError::NotFound(var_name.to_string()))?;
    let has_time = variable.has_dimension(DimensionType::Time);
    let stride = non_time_stride(variable);
    let row_passes = |row: usize| -> bool {
        (0..stride).all(|j| {
            let idx = row * stride + j;
            variable.data().get_string(idx).map(&pred).unwrap_or(false)
        })
    };
    if has_time {
        Ok((0..rows).map(row_passes).collect())
    } else {
        Ok(vec![row_passes(0); rows])
    }
}

fn convert_to_variable_unit(value: f64, filter_unit: Option<&str>, variable: &Variable) -> Result<f64> {
    match filter_unit {
        Some(u) => {
            let factor = harp_units::factor(u, variable.unit().unwrap_or(""))?;
            Ok(value * factor)
        }
        None => Ok(value),
    }
}

fn compare(op: ComparisonOp, lhs: f64, rhs: f64) -> bool {
    match op {
        ComparisonOp::Eq => lhs == rhs,
        ComparisonOp::Ne => lhs != rhs,
        ComparisonOp::Lt => lhs < rhs,
        ComparisonOp::Le => lhs <= rhs,
        ComparisonOp::Gt => lhs > rhs,
        ComparisonOp::Ge => lhs >= rhs,
    }
}

fn apply_comparison_filter(product: &mut Product, var: &str, op: ComparisonOp, value: f64, unit: Option<&str>) -> Result<()> {
    let rows = time_len(product);
    let variable = product.get(var).ok_or_else(|| VariableError::NotFound(var.to_string()))?;
    let threshold = convert_to_variable_unit(value, unit, variable)?;
    let mask = numeric_row_mask(product, var, rows, |v| compare(op, v, threshold))?;
    product.filter_time_mask(&mask)?;
    Ok(())
}

fn apply_string_comparison_filter(product: &mut Product, var: &str, op: EqualityOp, string: &str) -> Result<()> {
    let rows = time_len(product);
    let mask = string_row_mask(product, var, rows, |v| match op {
        EqualityOp::Eq => v == string,
        EqualityOp::Ne => v != string,
    })?;
    product.filter_time_mask(&mask)?;
    Ok(())
}

fn apply_bit_mask_filter(product: &mut Product, var: &str, op: BitMaskOp, mask: u32) -> Result<()> {
    let rows = time_len(product);
    let row_mask = numeric_row_mask(product, var, rows, |v| {
        let bits = v as i64 as u32;
        match op {
            BitMaskOp::AllBitsSet => (bits & mask) == mask,
            BitMaskOp::NoBitSet => (bits & mask) == 0,
        }
    })?;
    product.filter_time_mask(&row_mask)?;
    Ok(())
}

/// The period (in `unit`) a quantity repeats over, or `None` if `unit`
/// isn't angular. Longitudes, wind directions, and azimuth angles all wrap
/// at a full turn, so e.g. `370 [deg]` and `10 [deg]` name the same
/// direction for membership purposes even though they differ as plain
/// numbers (§4.1: the unit engine leaves angular moduli to the caller).
fn angular_period(unit: Option<&str>) -> Result<Option<f64>> {
    let unit = unit.unwrap_or("");
    if !unit.is_empty() && harp_units::is_compatible(unit, "deg")? {
        Ok(Some(harp_units::factor("deg", unit)? * 360.0))
    } else {
        Ok(None)
    }
}

/// Fold both sides into `[0, period)` before comparing, matching
/// `apply_longitude_range_filter`'s antimeridian handling; outside any
/// angular period this is plain equality.
fn equal_modulo(a: f64, b: f64, period: Option<f64>) -> bool {
    match period {
        Some(p) if p > 0.0 => {
            let folded = (a - b).rem_euclid(p);
            folded.min(p - folded) <= 1e-9 * p
        }
        _ => a == b,
    }
}

fn apply_membership_filter(product: &mut Product, var: &str, op: MembershipOp, values: &[f64], unit: Option<&str>) -> Result<()> {
    let rows = time_len(product);
    let variable = product.get(var).ok_or_else(|| VariableError::NotFound(var.to_string()))?;
    let mut converted = Vec::with_capacity(values.len());
    for v in values {
        converted.push(convert_to_variable_unit(*v, unit, variable)?);
    }
    let period = angular_period(variable.unit())?;
    let mask = numeric_row_mask(product, var, rows, |v| {
        let is_member = converted.iter().any(|c| equal_modulo(*c, v, period));
        match op {
            MembershipOp::In => is_member,
            MembershipOp::NotIn => !is_member,
        }
    })?;
    product.filter_time_mask(&mask)?;
    Ok(())
}

fn apply_string_membership_filter(product: &mut Product, var: &str, op: MembershipOp, strings: &[String]) -> Result<()> {
    let rows = time_len(product);
    let mask = string_row_mask(product, var, rows, |v| {
        let is_member = strings.iter().any(|s| s == v);
        match op {
            MembershipOp::In => is_member,
            MembershipOp::NotIn => !is_member,
        }
    })?;
    product.filter_time_mask(&mask)?;
    Ok(())
}

fn apply_valid_range_filter(product: &mut Product, var: &str) -> Result<()> {
    let rows = time_len(product);
    let variable = product.get(var).ok_or_else(|| VariableError::NotFound(var.to_string()))?;
    let (min, max) = variable
        .valid_range()
        .ok_or_else(|| ActionError::Execution(format!("variable '{var}' has no declared valid_range")))?;
    let (min, max) = (
        min.as_f64().ok_or_else(|| ActionError::Execution(format!("variable '{var}' has a non-numeric valid_range")))?,
        max.as_f64().ok_or_else(|| ActionError::Execution(format!("variable '{var}' has a non-numeric valid_range")))?,
    );
    let mask = numeric_row_mask(product, var, rows, |v| v >= min && v <= max)?;
    product.filter_time_mask(&mask)?;
    Ok(())
}

/// Normalise `lon` relative to `min`, wrapping into `[0, 360)`. Used by
/// both the longitude range filter below and its collocation-engine
/// counterpart.
fn longitude_offset_deg(lon_deg: f64, min_deg: f64) -> f64 {
    let raw = (lon_deg - min_deg) % 360.0;
    if raw < 0.0 {
        raw + 360.0
    } else {
        raw
    }
}

fn apply_longitude_range_filter(product: &mut Product, min: f64, min_unit: Option<&str>, max: f64, max_unit: Option<&str>) -> Result<()> {
    let rows = time_len(product);
    let min_deg = min * harp_units::factor(min_unit.unwrap_or("deg"), "deg")?;
    let max_deg = max * harp_units::factor(max_unit.unwrap_or("deg"), "deg")?;
    let width_deg = longitude_offset_deg(max_deg, min_deg);
    let variable = product.get("longitude").ok_or_else(|| VariableError::NotFound("longitude".to_string()))?;
    let to_deg = harp_units::factor(variable.unit().unwrap_or("deg"), "deg")?;
    let mask = numeric_row_mask(product, "longitude", rows, |v| {
        let offset = longitude_offset_deg(v * to_deg, min_deg);
        offset <= width_deg
    })?;
    product.filter_time_mask(&mask)?;
    Ok(())
}

fn apply_point_distance_filter(
    product: &mut Product,
    lon: f64,
    lon_unit: Option<&str>,
    lat: f64,
    lat_unit: Option<&str>,
    distance: f64,
    distance_unit: Option<&str>,
) -> Result<()> {
    let rows = time_len(product);
    let lon_deg = lon * harp_units::factor(lon_unit.unwrap_or("deg"), "deg")?;
    let lat_deg = lat * harp_units::factor(lat_unit.unwrap_or("deg"), "deg")?;
    let threshold_m = distance * harp_units::factor(distance_unit.unwrap_or("m"), "m")?;
    let centre = harp_geometry::Point::from_degrees(lat_deg, lon_deg);

    let lon_var = product.get("longitude").ok_or_else(|| VariableError::NotFound("longitude".to_string()))?;
    let lat_var = product.get("latitude").ok_or_else(|| VariableError::NotFound("latitude".to_string()))?;
    let lon_to_deg = harp_units::factor(lon_var.unit().unwrap_or("deg"), "deg")?;
    let lat_to_deg = harp_units::factor(lat_var.unit().unwrap_or("deg"), "deg")?;

    let mut mask = Vec::with_capacity(rows);
    for row in 0..rows {
        let lon_v = lon_var.data().get_f64(row).unwrap_or(f64::NAN) * lon_to_deg;
        let lat_v = lat_var.data().get_f64(row).unwrap_or(f64::NAN) * lat_to_deg;
        let point = harp_geometry::Point::from_degrees(lat_v, lon_v);
        let distance_m = harp_geometry::great_circle_distance_m(centre, point);
        mask.push(distance_m <= threshold_m);
    }
    product.filter_time_mask(&mask)?;
    Ok(())
}

enum AreaPredicate {
    Point,
    Covers,
    Intersects(f64),
}

fn apply_area_mask_filter(product: &mut Product, filename: &str, ctx: &ExecutionContext, predicate: AreaPredicate) -> Result<()> {
    let provider = *ctx
        .area_masks
        .get(filename)
        .ok_or_else(|| ActionError::Execution(format!("no area mask loaded for '{filename}'")))?;
    let rows = time_len(product);
    let index_var = product.get("index").ok_or_else(|| VariableError::NotFound("index".to_string()))?;
    let source_product = product.source_product().to_string();
    let mut mask = Vec::with_capacity(rows);
    for row in 0..rows {
        let index = index_var.data().get_f64(row).unwrap_or(f64::NAN) as i64;
        let keep = match &predicate {
            AreaPredicate::Point => provider.point_covered(&source_product, index),
            AreaPredicate::Covers => provider.area_covered(&source_product, index),
            AreaPredicate::Intersects(min_fraction_pct) => {
                provider.area_intersects_fraction(&source_product, index) * 100.0 >= *min_fraction_pct
            }
        };
        mask.push(keep);
    }
    product.filter_time_mask(&mask)?;
    Ok(())
}

fn apply_collocation_filter(product: &mut Product, filename: &str, side: Side, ctx: &ExecutionContext) -> Result<()> {
    let index = *ctx
        .collocation_indices
        .get(filename)
        .ok_or_else(|| ActionError::Execution(format!("no collocation result loaded for '{filename}'")))?;
    let rows = time_len(product);
    let index_var = product.get("index").ok_or_else(|| VariableError::NotFound("index".to_string()))?;
    let source_product = product.source_product().to_string();
    let mut mask = Vec::with_capacity(rows);
    for row in 0..rows {
        let sample_index = index_var.data().get_f64(row).unwrap_or(f64::NAN) as i64;
        mask.push(index.contains(side, &source_product, sample_index));
    }
    product.filter_time_mask(&mask)?;
    Ok(())
}

fn apply_variable_derivation(product: &mut Product, var: &str, dims: &[DimensionType], unit: Option<&str>) -> Result<()> {
    let resolved_unit = match unit {
        Some(u) => u.to_string(),
        None => resolve_natural_unit(product, var, dims),
    };
    harp_derive::derive(product, var, dims, &resolved_unit)?;
    Ok(())
}

fn resolve_natural_unit(product: &Product, var: &str, dims: &[DimensionType]) -> String {
    if let Some(existing) = product.get(var) {
        if existing.dimensions().iter().map(|(d, _)| *d).eq(dims.iter().copied()) {
            return existing.unit().unwrap_or("").to_string();
        }
    }
    harp_derive::RULES
        .iter()
        .find(|r| r.output_name == var && r.output_dims.iter().copied().eq(dims.iter().copied()))
        .map(|r| r.output_unit.to_string())
        .unwrap_or_default()
}

fn apply_variable_inclusion(product: &mut Product, names: &[String]) -> Result<()> {
    let mut keep: HashSet<&str> = names.iter().map(|s| s.as_str()).collect();
    keep.insert("index");
    let to_remove: Vec<String> = product.names().filter(|n| !keep.contains(n)).map(|s| s.to_string()).collect();
    for name in to_remove {
        product.remove_variable(&name)?;
    }
    Ok(())
}

fn apply_variable_exclusion(product: &mut Product, names: &[String]) -> Result<()> {
    for name in names {
        if product.contains(name) {
            product.remove_variable(name)?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use harp_product::{DimensionType::Time, VariableData};

    fn scenario_s1_product() -> Product {
        let mut p = Product::new("TEST001");
        p.add_variable(Variable::new("index", VariableData::Int32(vec![0, 1, 2, 3, 4]), vec![(Time, 5)]).unwrap()).unwrap();
        p.add_variable(
            Variable::new("temperature", VariableData::Float64(vec![250.0, 260.0, 270.0, 280.0, 290.0]), vec![(Time, 5)])
                .unwrap()
                .with_unit("K"),
        )
        .unwrap();
        p.add_variable(
            Variable::new("pressure", VariableData::Float64(vec![10.0, 20.0, 30.0, 40.0, 50.0]), vec![(Time, 5)])
                .unwrap()
                .with_unit("hPa"),
        )
        .unwrap();
        p
    }

    #[test]
    fn scenario_s1_comparison_and_inclusion() {
        let mut p = scenario_s1_product();
        let ast = crate::parser::parse("temperature >= 265 [K]; keep(pressure, temperature)").unwrap();
        let actions = crate::analyzer::analyze(&ast).unwrap();
        apply(&mut p, &actions, &ExecutionContext::new()).unwrap();

        assert_eq!(p.get("index").unwrap().data(), &VariableData::Int32(vec![2, 3, 4]));
        assert_eq!(p.get("temperature").unwrap().data(), &VariableData::Float64(vec![270.0, 280.0, 290.0]));
        assert_eq!(p.get("pressure").unwrap().data(), &VariableData::Float64(vec![30.0, 40.0, 50.0]));
        assert_eq!(p.len(), 3);
    }

    #[test]
    fn membership_filter_matches_exact_values_after_unit_conversion() {
        let mut p = Product::new("TEST002");
        p.add_variable(Variable::new("index", VariableData::Int32(vec![0, 1, 2]), vec![(Time, 3)]).unwrap()).unwrap();
        p.add_variable(
            Variable::new("wind_direction", VariableData::Float64(vec![10.0, 190.0, 370.0]), vec![(Time, 3)])
                .unwrap()
                .with_unit("deg"),
        )
        .unwrap();
        let ast = crate::parser::parse("wind_direction in (370) [deg]").unwrap();
        let actions = crate::analyzer::analyze(&ast).unwrap();
        apply(&mut p, &actions, &ExecutionContext::new()).unwrap();
        assert_eq!(p.get("index").unwrap().data(), &VariableData::Int32(vec![2]));
    }

    #[test]
    fn membership_filter_folds_angular_values_onto_a_common_turn() {
        // 370 deg and 10 deg name the same direction; a candidate of 10
        // must match a stored value of 370 even though they differ as
        // plain numbers.
        let mut p = Product::new("TEST002B");
        p.add_variable(Variable::new("index", VariableData::Int32(vec![0, 1, 2]), vec![(Time, 3)]).unwrap()).unwrap();
        p.add_variable(
            Variable::new("wind_direction", VariableData::Float64(vec![10.0, 190.0, 370.0]), vec![(Time, 3)])
                .unwrap()
                .with_unit("deg"),
        )
        .unwrap();
        let ast = crate::parser::parse("wind_direction in (10) [deg]").unwrap();
        let actions = crate::analyzer::analyze(&ast).unwrap();
        apply(&mut p, &actions, &ExecutionContext::new()).unwrap();
        assert_eq!(p.get("index").unwrap().data(), &VariableData::Int32(vec![0, 2]));
    }

    #[test]
    fn scenario_s6_longitude_antimeridian() {
        let mut p = Product::new("TEST006");
        p.add_variable(Variable::new("index", VariableData::Int32(vec![0, 1, 2]), vec![(Time, 3)]).unwrap()).unwrap();
        p.add_variable(
            Variable::new("longitude", VariableData::Float64(vec![-179.0, 179.0, 0.0]), vec![(Time, 3)])
                .unwrap()
                .with_unit("deg"),
        )
        .unwrap();
        let ast = crate::parser::parse("longitude-range(170 [deg], -170 [deg])").unwrap();
        let actions = crate::analyzer::analyze(&ast).unwrap();
        apply(&mut p, &actions, &ExecutionContext::new()).unwrap();
        assert_eq!(p.get("index").unwrap().data(), &VariableData::Int32(vec![0, 1]));
    }

    #[test]
    fn valid_range_filter_drops_rows_outside_the_declared_range() {
        let mut p = Product::new("TEST001");
        p.add_variable(Variable::new("index", VariableData::Int32(vec![0, 1, 2, 3, 4]), vec![(Time, 5)]).unwrap()).unwrap();
        p.add_variable(
            Variable::new("temperature", VariableData::Float64(vec![250.0, 260.0, 270.0, 280.0, 290.0]), vec![(Time, 5)])
                .unwrap()
                .with_unit("K")
                .with_valid_range(ScalarValue::Float64(260.0), ScalarValue::Float64(280.0)),
        )
        .unwrap();
        let ast = crate::parser::parse("valid(temperature)").unwrap();
        let actions = crate::analyzer::analyze(&ast).unwrap();
        apply(&mut p, &actions, &ExecutionContext::new()).unwrap();
        assert_eq!(p.get("temperature").unwrap().data(), &VariableData::Float64(vec![260.0, 270.0, 280.0]));
    }

    #[test]
    fn exclusion_is_idempotent() {
        let mut p = scenario_s1_product();
        let ast = crate::parser::parse("exclude(pressure); exclude(pressure)").unwrap();
        let actions = crate::analyzer::analyze(&ast).unwrap();
        apply(&mut p, &actions, &ExecutionContext::new()).unwrap();
        assert!(!p.contains("pressure"));
    }

    #[test]
    fn inclusion_chain_converges_to_smaller_set() {
        let mut p = scenario_s1_product();
        let ast = crate::parser::parse("keep(pressure, temperature); keep(pressure)").unwrap();
        let actions = crate::analyzer::analyze(&ast).unwrap();
        apply(&mut p, &actions, &ExecutionContext::new()).unwrap();
        assert!(p.contains("pressure"));
        assert!(!p.contains("temperature"));
        assert!(p.contains("index"));
    }

    #[test]
    fn failing_action_leaves_product_unchanged() {
        let mut p = scenario_s1_product();
        let before = p.clone();
        let ast = crate::parser::parse("nonexistent >= 1").unwrap();
        let actions = crate::analyzer::analyze(&ast).unwrap();
        let err = apply(&mut p, &actions, &ExecutionContext::new());
        assert!(err.is_err());
        assert_eq!(p.names().collect::<Vec<_>>(), before.names().collect::<Vec<_>>());
    }
}
