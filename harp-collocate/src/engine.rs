//! The matchup sweep (§4.8): time-sweep product loading, per-criterion
//! unit-normalised difference computation, and two-stage nearest-neighbour
//! reduction.

use std::collections::{HashMap, HashSet};

use harp_geometry::{great_circle_distance_m, point_in_polygon, polygons_intersect, Point, Polygon};
use harp_product::{DimensionType, Product};

use crate::criterion::{Criterion, NearestNeighbour, NearestNeighbourSide, PointInAreaDirection, ValueCriterion};
use crate::dataset::{Dataset, ProductMetadata};
use crate::error::{CollocationError, Result};
use crate::loader::{CancellationToken, ProductLoader};
use crate::result::{CollocationResult, DifferenceHeader, Pair};

/// Run the full matchup described in §4.8 between `dataset_a` and
/// `dataset_b`, loading products on demand through `loader_a`/`loader_b`.
///
/// `criteria` are evaluated in declaration order with `datetime` moved
/// first and `point_distance` moved last whenever both are present (§4.8
/// step 3); the result header preserves the caller's original declared
/// order regardless. `nearest_neighbour` holds zero to two directives: the
/// first is applied online during the sweep, the second (if any) as a
/// post-filter over the finished pair list (§4.8).
pub fn run(
    dataset_a: &Dataset,
    dataset_b: &Dataset,
    loader_a: &dyn ProductLoader,
    loader_b: &dyn ProductLoader,
    criteria: &[Criterion],
    nearest_neighbour: &[NearestNeighbour],
    cancellation: &CancellationToken,
) -> Result<CollocationResult> {
    let sorted_a = dataset_a.sorted();
    let sorted_b = dataset_b.sorted();

    let value_criteria = effective_value_criteria(criteria, nearest_neighbour);
    let eval_order = evaluation_order(&value_criteria);
    let mut resolved_units: Vec<Option<String>> = value_criteria.iter().map(default_unit).collect();

    let delta_time_s = datetime_threshold_seconds(&value_criteria)?;

    let online_nn = nearest_neighbour.first();
    let post_nn = nearest_neighbour.get(1);
    let online_nn_index = online_nn.map(|nn| nn_header_index(&value_criteria, nn)).transpose()?;

    let required_a = required_variables(criteria, nearest_neighbour, Side::A);
    let required_b = required_variables(criteria, nearest_neighbour, Side::B);

    let mut result = CollocationResult::new(Vec::new()); // header finalised once units are resolved
    let mut cache_b: HashMap<String, (ProductMetadata, Product)> = HashMap::new();
    // Side-A-keyed index into `result`'s pair list, maintained only while
    // the online nearest-neighbour directive reduces side A.
    let mut online_key_index: HashMap<(String, i32), usize> = HashMap::new();

    for meta_a in sorted_a.iter() {
        if cancellation.is_cancelled() {
            return Err(CollocationError::Cancelled);
        }

        let mut product_a = match loader_a.load(meta_a) {
            Ok(p) => p,
            Err(reason) => {
                log::warn!("skipping product '{}' ({}): {reason}", meta_a.source_product, meta_a.filename);
                continue;
            }
        };
        if product_a.dimension_extent(DimensionType::Time).map(|n| n == 0).unwrap_or(true) {
            continue;
        }
        trim_to_required(&mut product_a, &required_a);

        for (i, criterion) in value_criteria.iter().enumerate() {
            if resolved_units[i].is_none() {
                if let Criterion::Value(v) = criterion {
                    if let Some(var) = product_a.get(&v.var_name) {
                        resolved_units[i] = var.unit().map(|u| u.to_string()).or(Some(String::new()));
                    }
                }
            }
        }

        let window_lo = meta_a.datetime_start;
        let window_hi = meta_a.datetime_stop;

        // Evict cached B-products whose window no longer overlaps A's.
        cache_b.retain(|_, (meta_b, _)| window_overlaps(window_lo, window_hi, meta_b.datetime_start, meta_b.datetime_stop, delta_time_s));

        let overlapping: Vec<&ProductMetadata> =
            sorted_b.iter().filter(|meta_b| window_overlaps(window_lo, window_hi, meta_b.datetime_start, meta_b.datetime_stop, delta_time_s)).collect();

        for meta_b in &overlapping {
            if cancellation.is_cancelled() {
                return Err(CollocationError::Cancelled);
            }
            if cache_b.contains_key(&meta_b.source_product) {
                continue;
            }
            match loader_b.load(meta_b) {
                Ok(mut product_b) => {
                    trim_to_required(&mut product_b, &required_b);
                    cache_b.insert(meta_b.source_product.clone(), ((*meta_b).clone(), product_b));
                }
                Err(reason) => {
                    log::warn!("skipping product '{}' ({}): {reason}", meta_b.source_product, meta_b.filename);
                }
            }
        }

        let time_len_a = product_a.dimension_extent(DimensionType::Time).unwrap_or(1);

        for meta_b in &overlapping {
            if cancellation.is_cancelled() {
                return Err(CollocationError::Cancelled);
            }
            let Some((_, product_b)) = cache_b.get(&meta_b.source_product) else { continue };
            let time_len_b = product_b.dimension_extent(DimensionType::Time).unwrap_or(1);

            for i_a in 0..time_len_a {
                for i_b in 0..time_len_b {
                    let Some(differences) = evaluate_value_criteria(&value_criteria, &eval_order, &resolved_units, &product_a, i_a, product_b, i_b)? else {
                        continue;
                    };
                    if !evaluate_area_criteria(criteria, &product_a, i_a, product_b, i_b)? {
                        continue;
                    }

                    let sample_a = sample_index(&product_a, i_a)?;
                    let sample_b = sample_index(product_b, i_b)?;

                    if let (Some(nn), Some(diff_index)) = (online_nn, online_nn_index) {
                        let difference = differences[diff_index];
                        let replaced = online_replace(&mut result, &mut online_key_index, nn, diff_index, product_a.source_product(), sample_a, product_b.source_product(), sample_b, difference);
                        if !replaced {
                            continue;
                        }
                    }

                    let collocation_index = result.next_collocation_index();
                    result.push(Pair {
                        collocation_index,
                        product_a: product_a.source_product().to_string(),
                        sample_a,
                        product_b: product_b.source_product().to_string(),
                        sample_b,
                        differences,
                    })?;
                    if let Some(nn) = online_nn {
                        let key = online_index_key(nn, product_a.source_product(), sample_a, product_b.source_product(), sample_b);
                        online_key_index.insert(key, result.len() - 1);
                    }
                }
            }
        }
    }

    finalize_header(&mut result, &value_criteria, &resolved_units);

    if let Some(nn) = post_nn {
        let diff_index = nn_header_index(&value_criteria, nn)?;
        post_filter(&mut result, nn, diff_index);
    }

    Ok(result)
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Side {
    A,
    B,
}

/// A value-bearing criterion whose variable isn't already present among
/// `criteria` is added implicitly, with an unbounded threshold, purely so
/// its difference is computed for nearest-neighbour comparison (mirrors
/// `harpcollocate-matchup.c`'s handling of a nearest-neighbour variable
/// that wasn't also declared as a criterion).
fn effective_value_criteria(criteria: &[Criterion], nearest_neighbour: &[NearestNeighbour]) -> Vec<Criterion> {
    let mut value_criteria: Vec<Criterion> = criteria.iter().filter(|c| matches!(c, Criterion::Value(_) | Criterion::PointDistance(_))).cloned().collect();
    for nn in nearest_neighbour {
        let already_present = value_criteria.iter().any(|c| c.header_name() == Some(nn.variable_name.as_str()));
        if !already_present {
            if nn.variable_name == "point_distance" {
                value_criteria.push(Criterion::PointDistance(crate::criterion::PointDistanceCriterion::new(f64::INFINITY, None)));
            } else {
                value_criteria.push(Criterion::Value(ValueCriterion::new(nn.variable_name.clone(), f64::INFINITY, None)));
            }
        }
    }
    value_criteria
}

fn default_unit(criterion: &Criterion) -> Option<String> {
    match criterion {
        Criterion::Value(v) => v.unit.clone(),
        Criterion::PointDistance(p) => p.unit.clone().or_else(|| Some("m".to_string())),
        _ => None,
    }
}

/// Evaluation order within `value_criteria`: `datetime` first, then the
/// remainder in declared order, with `point_distance` moved last (§4.8
/// step 3).
fn evaluation_order(value_criteria: &[Criterion]) -> Vec<usize> {
    let mut order: Vec<usize> = (0..value_criteria.len()).collect();
    order.sort_by_key(|&i| match value_criteria[i].header_name() {
        Some("datetime") => 0,
        Some("point_distance") => 2,
        _ => 1,
    });
    order
}

fn datetime_threshold_seconds(value_criteria: &[Criterion]) -> Result<f64> {
    for criterion in value_criteria {
        if let Criterion::Value(v) = criterion {
            if v.var_name == "datetime" {
                let factor = harp_units::factor(v.unit.as_deref().unwrap_or("s"), "s").map_err(|e| CollocationError::Unit { var: "datetime".to_string(), source: e })?;
                return Ok(v.threshold * factor);
            }
        }
    }
    Ok(f64::INFINITY)
}

/// `datetime_start_a <= datetime_stop_b + delta && datetime_start_b - delta <= datetime_stop_a`
/// (`perform_matchup`'s window predicate, reproduced exactly per §9).
fn window_overlaps(start_a: f64, stop_a: f64, start_b: f64, stop_b: f64, delta: f64) -> bool {
    start_a <= stop_b + delta && start_b - delta <= stop_a
}

fn nn_header_index(value_criteria: &[Criterion], nn: &NearestNeighbour) -> Result<usize> {
    value_criteria
        .iter()
        .position(|c| c.header_name() == Some(nn.variable_name.as_str()))
        .ok_or_else(|| CollocationError::InvalidCriterion(format!("nearest-neighbour variable '{}' has no matching criterion", nn.variable_name)))
}

fn required_variables(criteria: &[Criterion], nearest_neighbour: &[NearestNeighbour], side: Side) -> HashSet<String> {
    let mut vars: HashSet<String> = HashSet::new();
    vars.insert("index".to_string());
    for criterion in criteria {
        match criterion {
            Criterion::Value(v) => {
                vars.insert(v.var_name.clone());
            }
            Criterion::PointDistance(_) => {
                vars.insert("latitude".to_string());
                vars.insert("longitude".to_string());
            }
            Criterion::AreaIntersects(_) => {
                vars.insert("latitude_bounds".to_string());
                vars.insert("longitude_bounds".to_string());
            }
            Criterion::PointInArea(p) => {
                let point_side = match p.direction {
                    PointInAreaDirection::AInB => Side::A,
                    PointInAreaDirection::BInA => Side::B,
                };
                if side == point_side {
                    vars.insert("latitude".to_string());
                    vars.insert("longitude".to_string());
                } else {
                    vars.insert("latitude_bounds".to_string());
                    vars.insert("longitude_bounds".to_string());
                }
            }
        }
    }
    for nn in nearest_neighbour {
        vars.insert(nn.variable_name.clone());
        if nn.variable_name == "point_distance" {
            vars.insert("latitude".to_string());
            vars.insert("longitude".to_string());
        }
    }
    vars
}

fn trim_to_required(product: &mut Product, required: &HashSet<String>) {
    let to_remove: Vec<String> = product.names().filter(|n| !required.contains(*n)).map(|s| s.to_string()).collect();
    for name in to_remove {
        let _ = product.remove_variable(&name);
    }
}

fn sample_index(product: &Product, row: usize) -> Result<i32> {
    let index_var = product.get("index").ok_or_else(|| CollocationError::MissingVariable { source_product: product.source_product().to_string(), var: "index".to_string() })?;
    Ok(index_var.data().get_f64(row).unwrap_or(f64::NAN) as i32)
}

/// Fold a difference onto `[0, modulo/2]` by repeated subtraction of the
/// modulus, matching `harpcollocate-matchup.c`'s `while` loop rather than
/// a single `%` operation (§9).
fn fold_modulo(mut difference: f64, modulo: f64) -> f64 {
    while difference > modulo {
        difference -= modulo;
    }
    if difference > modulo / 2.0 {
        difference = modulo - difference;
    }
    difference
}

fn variable_value_deg(product: &Product, name: &str, row: usize) -> Result<f64> {
    let variable = product.get(name).ok_or_else(|| CollocationError::MissingVariable { source_product: product.source_product().to_string(), var: name.to_string() })?;
    let raw = variable.data().get_f64(row).unwrap_or(f64::NAN);
    let factor = harp_units::factor(variable.unit().unwrap_or("deg"), "deg").map_err(|e| CollocationError::Unit { var: name.to_string(), source: e })?;
    Ok(raw * factor)
}

fn point_of(product: &Product, row: usize) -> Result<Point> {
    let lat = variable_value_deg(product, "latitude", row)?;
    let lon = variable_value_deg(product, "longitude", row)?;
    Ok(Point::from_degrees(lat, lon))
}

fn polygon_of(product: &Product, row: usize) -> Result<Polygon> {
    let lat_var = product.get("latitude_bounds").ok_or_else(|| CollocationError::MissingVariable { source_product: product.source_product().to_string(), var: "latitude_bounds".to_string() })?;
    let lon_var = product.get("longitude_bounds").ok_or_else(|| CollocationError::MissingVariable { source_product: product.source_product().to_string(), var: "longitude_bounds".to_string() })?;
    let lat_factor = harp_units::factor(lat_var.unit().unwrap_or("deg"), "deg").map_err(|e| CollocationError::Unit { var: "latitude_bounds".to_string(), source: e })?;
    let lon_factor = harp_units::factor(lon_var.unit().unwrap_or("deg"), "deg").map_err(|e| CollocationError::Unit { var: "longitude_bounds".to_string(), source: e })?;
    let vertices_per_row = lat_var.dimensions().iter().filter(|(d, _)| *d == DimensionType::Independent).map(|(_, e)| *e).next().unwrap_or(lat_var.data().len());
    let start = row * vertices_per_row;
    let mut corners = Vec::with_capacity(vertices_per_row);
    for k in 0..vertices_per_row {
        let lat = lat_var.data().get_f64(start + k).unwrap_or(f64::NAN) * lat_factor;
        let lon = lon_var.data().get_f64(start + k).unwrap_or(f64::NAN) * lon_factor;
        corners.push((lat, lon));
    }
    Ok(Polygon::from_degrees(&corners))
}

/// Evaluate every value-bearing criterion in `eval_order` (§4.8 step 3),
/// short-circuiting on the first mismatch. Returns the differences in
/// `value_criteria`'s *declared* order (matching the result header),
/// or `None` if any criterion failed.
fn evaluate_value_criteria(
    value_criteria: &[Criterion],
    eval_order: &[usize],
    resolved_units: &[Option<String>],
    product_a: &Product,
    i_a: usize,
    product_b: &Product,
    i_b: usize,
) -> Result<Option<Vec<f64>>> {
    let mut differences = vec![0.0; value_criteria.len()];
    for &i in eval_order {
        let unit = resolved_units[i].as_deref().unwrap_or("");
        let (difference, threshold, use_modulo) = match &value_criteria[i] {
            Criterion::Value(v) => {
                let a = variable_value_in_unit(product_a, &v.var_name, i_a, unit)?;
                let b = variable_value_in_unit(product_b, &v.var_name, i_b, unit)?;
                (( a - b ).abs(), v.threshold, v.use_modulo)
            }
            Criterion::PointDistance(p) => {
                let point_a = point_of(product_a, i_a)?;
                let point_b = point_of(product_b, i_b)?;
                let distance_m = great_circle_distance_m(point_a, point_b);
                let factor = harp_units::factor("m", unit).map_err(|e| CollocationError::Unit { var: "point_distance".to_string(), source: e })?;
                (distance_m * factor, p.threshold, false)
            }
            _ => unreachable!("value_criteria only holds Value/PointDistance variants"),
        };
        let difference = if use_modulo {
            let modulo_factor = harp_units::factor("deg", if unit.is_empty() { "deg" } else { unit })
                .map_err(|e| CollocationError::Unit { var: value_criteria[i].header_name().unwrap_or("?").to_string(), source: e })?;
            fold_modulo(difference, 360.0 * modulo_factor)
        } else {
            difference
        };
        differences[i] = difference;
        // `!(x <= y)` instead of `x > y` so a NaN difference also mismatches (§9).
        if !(difference <= threshold) {
            return Ok(None);
        }
    }
    Ok(Some(differences))
}

fn variable_value_in_unit(product: &Product, name: &str, row: usize, unit: &str) -> Result<f64> {
    let variable = product.get(name).ok_or_else(|| CollocationError::MissingVariable { source_product: product.source_product().to_string(), var: name.to_string() })?;
    let raw = variable.data().get_f64(row).unwrap_or(f64::NAN);
    if unit.is_empty() {
        return Ok(raw);
    }
    let factor = harp_units::factor(variable.unit().unwrap_or(""), unit).map_err(|e| CollocationError::Unit { var: name.to_string(), source: e })?;
    Ok(raw * factor)
}

fn evaluate_area_criteria(criteria: &[Criterion], product_a: &Product, i_a: usize, product_b: &Product, i_b: usize) -> Result<bool> {
    for criterion in criteria {
        let passes = match criterion {
            Criterion::AreaIntersects(_) => {
                let poly_a = polygon_of(product_a, i_a)?;
                let poly_b = polygon_of(product_b, i_b)?;
                polygons_intersect(&poly_a, &poly_b)
            }
            Criterion::PointInArea(p) => match p.direction {
                PointInAreaDirection::AInB => {
                    let point = point_of(product_a, i_a)?;
                    let poly = polygon_of(product_b, i_b)?;
                    point_in_polygon(point, &poly)
                }
                PointInAreaDirection::BInA => {
                    let point = point_of(product_b, i_b)?;
                    let poly = polygon_of(product_a, i_a)?;
                    point_in_polygon(point, &poly)
                }
            },
            Criterion::Value(_) | Criterion::PointDistance(_) => true,
        };
        if !passes {
            return Ok(false);
        }
    }
    Ok(true)
}

fn online_index_key(nn: &NearestNeighbour, source_product_a: &str, sample_a: i32, source_product_b: &str, sample_b: i32) -> (String, i32) {
    match nn.side {
        NearestNeighbourSide::X => (source_product_a.to_string(), sample_a),
        NearestNeighbourSide::Y => (source_product_b.to_string(), sample_b),
    }
}

/// Online nearest-neighbour replacement (§4.8): if a pair already exists
/// for the designated side's `(product, sample)` key, keep whichever of
/// the two has the smaller designated-criterion difference. Returns
/// `true` if the new candidate should be added to the result (nothing
/// existed yet, or the new candidate replaced a farther one), `false` if
/// the existing pair is kept and the candidate discarded.
fn online_replace(
    result: &mut CollocationResult,
    key_index: &mut HashMap<(String, i32), usize>,
    nn: &NearestNeighbour,
    diff_index: usize,
    source_product_a: &str,
    sample_a: i32,
    source_product_b: &str,
    sample_b: i32,
    new_difference: f64,
) -> bool {
    let key = online_index_key(nn, source_product_a, sample_a, source_product_b, sample_b);
    if let Some(&idx) = key_index.get(&key) {
        let existing_difference = result.pairs()[idx].differences[diff_index];
        if existing_difference <= new_difference {
            return false;
        }
        result.remove_at(idx);
        key_index.remove(&key);
        for v in key_index.values_mut() {
            if *v > idx {
                *v -= 1;
            }
        }
    }
    true
}

/// Keep, for each `(product, sample)` on `nn.side`, only the pair with the
/// smallest designated-criterion difference. Stable on ties: the
/// earlier-encountered (lower `collocation_index`) pair wins.
fn post_filter(result: &mut CollocationResult, nn: &NearestNeighbour, diff_index: usize) {
    let mut best: HashMap<(String, i32), usize> = HashMap::new();
    for (i, pair) in result.pairs().iter().enumerate() {
        let key = match nn.side {
            NearestNeighbourSide::X => (pair.product_a.clone(), pair.sample_a),
            NearestNeighbourSide::Y => (pair.product_b.clone(), pair.sample_b),
        };
        match best.get(&key) {
            Some(&current) if result.pairs()[current].differences[diff_index] <= pair.differences[diff_index] => {}
            _ => {
                best.insert(key, i);
            }
        }
    }
    let mut keep: Vec<bool> = vec![false; result.pairs().len()];
    for &i in best.values() {
        keep[i] = true;
    }
    let surviving: Vec<Pair> = result.pairs().iter().zip(keep).filter_map(|(p, k)| k.then(|| p.clone())).collect();
    let header = result.header().to_vec();
    *result = CollocationResult::new(header);
    for pair in surviving {
        result.push(pair).expect("arity unchanged by the post-filter");
    }
}

fn finalize_header(result: &mut CollocationResult, value_criteria: &[Criterion], resolved_units: &[Option<String>]) {
    let header: Vec<DifferenceHeader> = value_criteria
        .iter()
        .zip(resolved_units)
        .map(|(c, unit)| DifferenceHeader {
            name: c.header_name().unwrap_or("?").to_string(),
            unit: unit.clone().unwrap_or_else(|| if c.header_name() == Some("point_distance") { "m".to_string() } else { "s".to_string() }),
        })
        .collect();
    let pairs = result.pairs().to_vec();
    *result = CollocationResult::new(header);
    for pair in pairs {
        result.push(pair).expect("arity unchanged by header finalisation");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use harp_product::{DimensionType::Time, Variable, VariableData};

    struct MapLoader(HashMap<String, Product>);

    impl ProductLoader for MapLoader {
        fn load(&self, metadata: &ProductMetadata) -> std::result::Result<Product, String> {
            self.0.get(&metadata.source_product).cloned().ok_or_else(|| "not found".to_string())
        }
    }

    fn point_product(name: &str, lats: Vec<f64>, lons: Vec<f64>) -> Product {
        let n = lats.len();
        let mut p = Product::new(name);
        p.add_variable(Variable::new("index", VariableData::Int32((0..n as i32).collect()), vec![(Time, n)]).unwrap()).unwrap();
        p.add_variable(Variable::new("latitude", VariableData::Float64(lats), vec![(Time, n)]).unwrap().with_unit("deg")).unwrap();
        p.add_variable(Variable::new("longitude", VariableData::Float64(lons), vec![(Time, n)]).unwrap().with_unit("deg")).unwrap();
        p
    }

    fn timed_point_product(name: &str, datetime_s: f64, lat: f64, lon: f64) -> Product {
        let mut p = point_product(name, vec![lat], vec![lon]);
        p.add_variable(Variable::new("datetime", VariableData::Float64(vec![datetime_s]), vec![(Time, 1)]).unwrap().with_unit("s")).unwrap();
        p
    }

    fn dataset_for(products: &[&Product]) -> (Dataset, MapLoader) {
        let mut dataset = Dataset::default();
        let mut map = HashMap::new();
        for (i, p) in products.iter().enumerate() {
            dataset.push(ProductMetadata::new(p.source_product(), format!("{}.nc", p.source_product()), i as f64, i as f64));
            map.insert(p.source_product().to_string(), (*p).clone());
        }
        (dataset, MapLoader(map))
    }

    #[test]
    fn scenario_s4_point_distance_single_pair() {
        let a = point_product("A001", vec![0.0], vec![0.0]);
        let b = point_product("B001", vec![0.001, 1.0], vec![0.0, 0.0]);
        let (dataset_a, loader_a) = dataset_for(&[&a]);
        let (dataset_b, loader_b) = dataset_for(&[&b]);

        let criteria = vec![Criterion::PointDistance(crate::criterion::PointDistanceCriterion::new(1000.0, Some("m".to_string())))];
        let result = run(&dataset_a, &dataset_b, &loader_a, &loader_b, &criteria, &[], &CancellationToken::new()).unwrap();

        assert_eq!(result.len(), 1);
        let pair = &result.pairs()[0];
        assert_eq!(pair.collocation_index, 0);
        assert_eq!(pair.sample_a, 0);
        assert_eq!(pair.sample_b, 0);
        assert!((pair.differences[0] - 111.0).abs() < 5.0, "distance was {}", pair.differences[0]);
    }

    #[test]
    fn scenario_s5_nearest_neighbour_reduces_to_one_pair() {
        let a = point_product("A001", vec![0.0], vec![0.0]);
        // ~100m, ~200m, ~500m north of A:0.
        let b = point_product("B001", vec![0.0009, 0.0018, 0.0045], vec![0.0, 0.0, 0.0]);
        let (dataset_a, loader_a) = dataset_for(&[&a]);
        let (dataset_b, loader_b) = dataset_for(&[&b]);

        let criteria = vec![Criterion::PointDistance(crate::criterion::PointDistanceCriterion::new(1000.0, Some("m".to_string())))];

        let without_nn = run(&dataset_a, &dataset_b, &loader_a, &loader_b, &criteria, &[], &CancellationToken::new()).unwrap();
        assert_eq!(without_nn.len(), 3);

        let nn = vec![NearestNeighbour::new("point_distance", NearestNeighbourSide::X)];
        let with_nn = run(&dataset_a, &dataset_b, &loader_a, &loader_b, &criteria, &nn, &CancellationToken::new()).unwrap();
        assert_eq!(with_nn.len(), 1);
        assert_eq!(with_nn.pairs()[0].sample_b, 0);
    }

    struct CountingLoader {
        inner: MapLoader,
        loaded: std::cell::RefCell<Vec<String>>,
    }

    impl ProductLoader for CountingLoader {
        fn load(&self, metadata: &ProductMetadata) -> std::result::Result<Product, String> {
            self.loaded.borrow_mut().push(metadata.source_product.clone());
            self.inner.load(metadata)
        }
    }

    #[test]
    fn datetime_window_prefilter_skips_non_overlapping_products() {
        let a = timed_point_product("A001", 0.0, 0.0, 0.0);
        let b_near = timed_point_product("B_NEAR", 1.0, 0.0, 0.0);
        let b_far = timed_point_product("B_FAR", 1000.0, 0.0, 0.0);

        let mut dataset_a = Dataset::default();
        dataset_a.push(ProductMetadata::new("A001", "a.nc", 0.0, 0.0));
        let mut dataset_b = Dataset::default();
        dataset_b.push(ProductMetadata::new("B_NEAR", "bn.nc", 1.0, 1.0));
        dataset_b.push(ProductMetadata::new("B_FAR", "bf.nc", 1000.0, 1000.0));

        let mut map_a = HashMap::new();
        map_a.insert("A001".to_string(), a);
        let loader_a = MapLoader(map_a);
        let mut map_b = HashMap::new();
        map_b.insert("B_NEAR".to_string(), b_near);
        map_b.insert("B_FAR".to_string(), b_far);
        let loader_b = CountingLoader { inner: MapLoader(map_b), loaded: std::cell::RefCell::new(Vec::new()) };

        let criteria = vec![Criterion::Value(ValueCriterion::new("datetime", 5.0, Some("s".to_string())))];
        run(&dataset_a, &dataset_b, &loader_a, &loader_b, &criteria, &[], &CancellationToken::new()).unwrap();

        let loaded = loader_b.loaded.borrow();
        assert!(loaded.contains(&"B_NEAR".to_string()));
        assert!(!loaded.contains(&"B_FAR".to_string()), "B_FAR's window never overlaps A001's and should never be loaded");
    }

    #[test]
    fn cancellation_aborts_the_sweep() {
        let a = point_product("A001", vec![0.0], vec![0.0]);
        let b = point_product("B001", vec![0.0], vec![0.0]);
        let (dataset_a, loader_a) = dataset_for(&[&a]);
        let (dataset_b, loader_b) = dataset_for(&[&b]);
        let token = CancellationToken::new();
        token.cancel();
        let criteria = vec![Criterion::PointDistance(crate::criterion::PointDistanceCriterion::new(1000.0, Some("m".to_string())))];
        let err = run(&dataset_a, &dataset_b, &loader_a, &loader_b, &criteria, &[], &token);
        assert!(matches!(err, Err(CollocationError::Cancelled)));
    }
}
