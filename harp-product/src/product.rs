use std::collections::HashMap;

use slotmap::{new_key_type, SlotMap};

use crate::dimension::DimensionType;
use crate::error::{Result, VariableError};
use crate::variable::{Variable, VariableData};

new_key_type! {
    /// Stable, generational reference to a variable slot inside a
    /// [`Product`]. Kept distinct from the name so a derived variable can
    /// be recomputed and re-inserted without anyone else holding a stale
    /// pointer into the old allocation.
    pub struct VariableId;
}

/// An ordered bundle of co-dimensioned variables from a single observation
/// run.
///
/// Variables are stored in a [`SlotMap`] arena; a `Vec<VariableId>` records
/// insertion order (the "ordered mapping from variable name to `Variable`"
/// of the data model) and a `HashMap<String, VariableId>` gives O(1)
/// name lookup. This mirrors the arena-indexed, back-pointer-free layout
/// used for the ECS `World` in the parsing stack this model was adapted
/// from: no variable ever holds a reference to another, only a `VariableId`
/// that can be looked up afresh after a mutation.
#[derive(Debug, Clone)]
pub struct Product {
    source_product: String,
    history: Option<String>,
    variables: SlotMap<VariableId, Variable>,
    order: Vec<VariableId>,
    index: HashMap<String, VariableId>,
}

impl Product {
    pub fn new(source_product: impl Into<String>) -> Self {
        Product {
            source_product: source_product.into(),
            history: None,
            variables: SlotMap::with_key(),
            order: Vec::new(),
            index: HashMap::new(),
        }
    }

    pub fn source_product(&self) -> &str {
        &self.source_product
    }

    pub fn history(&self) -> Option<&str> {
        self.history.as_deref()
    }

    pub fn set_history(&mut self, history: Option<String>) {
        self.history = history;
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    pub fn get(&self, name: &str) -> Option<&Variable> {
        self.index.get(name).and_then(|id| self.variables.get(*id))
    }

    pub fn get_mut(&mut self, name: &str) -> Option<&mut Variable> {
        match self.index.get(name) {
            Some(id) => self.variables.get_mut(*id),
            None => None,
        }
    }

    pub fn id_of(&self, name: &str) -> Option<VariableId> {
        self.index.get(name).copied()
    }

    /// Variables in insertion order.
    pub fn variables(&self) -> impl Iterator<Item = &Variable> {
        self.order.iter().filter_map(move |id| self.variables.get(*id))
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.variables().map(|v| v.name())
    }

    /// Extent recorded for `dim` across whatever variables carry it, or
    /// `None` if no variable in the product has that dimension.
    pub fn dimension_extent(&self, dim: DimensionType) -> Option<usize> {
        self.variables().find_map(|v| v.extent_of(dim))
    }

    /// Add a variable, enforcing the same-dimension rule: every dimension
    /// tag the new variable carries must agree in extent with any
    /// variable already in the product that carries the same tag.
    pub fn add_variable(&mut self, variable: Variable) -> Result<VariableId> {
        if self.index.contains_key(variable.name()) {
            return Err(VariableError::AlreadyExists(variable.name().to_string()));
        }
        self.check_shared_dimensions(&variable)?;

        let name = variable.name().to_string();
        let id = self.variables.insert(variable);
        self.order.push(id);
        self.index.insert(name, id);
        Ok(id)
    }

    fn check_shared_dimensions(&self, variable: &Variable) -> Result<()> {
        for (dim, extent) in variable.dimensions() {
            if let Some(existing) = self.dimension_extent(*dim) {
                if existing != *extent {
                    return Err(VariableError::DimensionMismatch {
                        name: variable.name().to_string(),
                        dimension: dim.name().to_string(),
                        expected: existing,
                        found: *extent,
                    });
                }
            }
        }
        Ok(())
    }

    pub fn remove_variable(&mut self, name: &str) -> Result<Variable> {
        let id = self
            .index
            .remove(name)
            .ok_or_else(|| VariableError::NotFound(name.to_string()))?;
        self.order.retain(|&other| other != id);
        Ok(self.variables.remove(id).expect("index and arena in sync"))
    }

    pub fn rename_variable(&mut self, old_name: &str, new_name: &str) -> Result<()> {
        if !crate::variable::is_valid_name(new_name) {
            return Err(VariableError::InvalidName(new_name.to_string()));
        }
        if self.index.contains_key(new_name) {
            return Err(VariableError::AlreadyExists(new_name.to_string()));
        }
        let id = self
            .index
            .remove(old_name)
            .ok_or_else(|| VariableError::NotFound(old_name.to_string()))?;
        // SlotMap has no in-place rename; rebuild the Variable with its new name.
        let old = self.variables.remove(id).expect("index and arena in sync");
        let mut rebuilt = Variable::new(new_name, old.data().clone(), old.dimensions().to_vec())
            .expect("dimensions/data already validated on the old variable");
        if let Some(u) = old.unit() {
            rebuilt = rebuilt.with_unit(u.to_string());
        }
        if let Some(d) = old.description() {
            rebuilt = rebuilt.with_description(d.to_string());
        }
        if let Some((min, max)) = old.valid_range() {
            rebuilt = rebuilt.with_valid_range(min.clone(), max.clone());
        }
        if let Some(f) = old.fill_value() {
            rebuilt = rebuilt.with_fill_value(f.clone());
        }
        if let Some(labels) = old.enum_labels() {
            rebuilt = rebuilt.with_enum_labels(labels.to_vec());
        }
        let new_id = self.variables.insert(rebuilt);
        for slot in self.order.iter_mut() {
            if *slot == id {
                *slot = new_id;
            }
        }
        self.index.insert(new_name.to_string(), new_id);
        Ok(())
    }

    /// Append `count` rows along the time axis to every time-dimensioned
    /// variable, atomically: either every variable gets its extra rows or
    /// none does.
    pub fn append_time_rows(&mut self, rows: &HashMap<String, VariableData>) -> Result<()> {
        // Validate shapes before mutating anything.
        let mut new_time_len = None;
        for name in self.names_with_time() {
            let addition = rows
                .get(&name)
                .ok_or_else(|| VariableError::NotFound(name.clone()))?;
            let existing = self.get(&name).expect("name came from this product");
            let existing_len = existing.extent_of(DimensionType::Time).unwrap();
            let non_time_extent: usize = existing
                .dimensions()
                .iter()
                .filter(|(d, _)| *d != DimensionType::Time)
                .map(|(_, e)| *e)
                .product::<usize>()
                .max(1);
            if addition.len() % non_time_extent.max(1) != 0 {
                return Err(VariableError::InvalidShape {
                    name: name.clone(),
                    reason: "appended data length is not a multiple of the non-time extent".into(),
                });
            }
            let added_rows = addition.len() / non_time_extent.max(1);
            match new_time_len {
                None => new_time_len = Some(existing_len + added_rows),
                Some(expected) => {
                    if expected != existing_len + added_rows {
                        return Err(VariableError::DimensionMismatch {
                            name: name.clone(),
                            dimension: "time".into(),
                            expected,
                            found: existing_len + added_rows,
                        });
                    }
                }
            }
        }

        for name in self.names_with_time() {
            let addition = rows.get(&name).expect("validated above").clone();
            let id = self.index[&name];
            let variable = self.variables.get_mut(id).expect("validated above");
            concat_variable_data(variable.data_mut(), addition);
            bump_time_extent(variable);
        }
        Ok(())
    }

    /// Drop rows along the time axis wherever `mask[i]` is `false`, applied
    /// atomically across every time-dimensioned variable.
    pub fn filter_time_mask(&mut self, mask: &[bool]) -> Result<()> {
        let time_len = self.dimension_extent(DimensionType::Time);
        if let Some(time_len) = time_len {
            if mask.len() != time_len {
                return Err(VariableError::InvalidShape {
                    name: "<time axis>".into(),
                    reason: format!("mask length {} does not match time extent {}", mask.len(), time_len),
                });
            }
        }

        let names: Vec<String> = self.names_with_time().collect();
        for name in names {
            let id = self.index[&name];
            let variable = self.variables.get_mut(id).expect("name came from this product");
            let non_time_extent: usize = variable
                .dimensions()
                .iter()
                .filter(|(d, _)| *d != DimensionType::Time)
                .map(|(_, e)| *e)
                .product::<usize>()
                .max(1);
            filter_variable_rows(variable.data_mut(), mask, non_time_extent);
            set_time_extent(variable, mask.iter().filter(|keep| **keep).count());
        }
        Ok(())
    }

    fn names_with_time(&self) -> impl Iterator<Item = String> + '_ {
        self.variables()
            .filter(|v| v.has_dimension(DimensionType::Time))
            .map(|v| v.name().to_string())
    }

    /// Re-check every invariant the model promises: unique names, shared
    /// dimension agreement, and data-length/extent consistency.
    pub fn assert_invariants(&self) -> Result<()> {
        let mut seen_dims: HashMap<DimensionType, usize> = HashMap::new();
        for variable in self.variables() {
            let expected: usize = if variable.dimensions().is_empty() {
                1
            } else {
                variable.dimensions().iter().map(|(_, e)| *e).product()
            };
            if variable.data().len() != expected {
                return Err(VariableError::InvalidShape {
                    name: variable.name().to_string(),
                    reason: "stored data length no longer matches declared extents".into(),
                });
            }
            for (dim, extent) in variable.dimensions() {
                match seen_dims.get(dim) {
                    Some(existing) if *existing != *extent => {
                        return Err(VariableError::DimensionMismatch {
                            name: variable.name().to_string(),
                            dimension: dim.name().to_string(),
                            expected: *existing,
                            found: *extent,
                        });
                    }
                    _ => {
                        seen_dims.insert(*dim, *extent);
                    }
                }
            }
        }
        Ok(())
    }
}

fn concat_variable_data(existing: &mut VariableData, addition: VariableData) {
    match (existing, addition) {
        (VariableData::Int8(a), VariableData::Int8(b)) => a.extend(b),
        (VariableData::Int16(a), VariableData::Int16(b)) => a.extend(b),
        (VariableData::Int32(a), VariableData::Int32(b)) => a.extend(b),
        (VariableData::Float32(a), VariableData::Float32(b)) => a.extend(b),
        (VariableData::Float64(a), VariableData::Float64(b)) => a.extend(b),
        (VariableData::String(a), VariableData::String(b)) => a.extend(b),
        _ => panic!("appended data element type does not match existing variable"),
    }
}

fn filter_variable_rows(data: &mut VariableData, mask: &[bool], stride: usize) {
    macro_rules! keep_rows {
        ($v:expr) => {{
            let mut kept = Vec::with_capacity($v.len());
            for (row, keep) in mask.iter().enumerate() {
                if *keep {
                    kept.extend_from_slice(&$v[row * stride..(row + 1) * stride]);
                }
            }
            *$v = kept;
        }};
    }
    match data {
        VariableData::Int8(v) => keep_rows!(v),
        VariableData::Int16(v) => keep_rows!(v),
        VariableData::Int32(v) => keep_rows!(v),
        VariableData::Float32(v) => keep_rows!(v),
        VariableData::Float64(v) => keep_rows!(v),
        VariableData::String(v) => keep_rows!(v),
    }
}

fn bump_time_extent(variable: &mut Variable) {
    let new_len = variable.data().len();
    let non_time: usize = variable
        .dimensions()
        .iter()
        .filter(|(d, _)| *d != DimensionType::Time)
        .map(|(_, e)| *e)
        .product::<usize>()
        .max(1);
    set_time_extent(variable, new_len / non_time);
}

fn set_time_extent(variable: &mut Variable, new_time_len: usize) {
    for (dim, extent) in variable.dimensions_mut() {
        if *dim == DimensionType::Time {
            *extent = new_time_len;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::variable::ScalarValue;

    fn sample_product() -> Product {
        let mut p = Product::new("TEST001");
        let index = Variable::new(
            "index",
            VariableData::Int32(vec![0, 1, 2, 3, 4]),
            vec![(DimensionType::Time, 5)],
        )
        .unwrap();
        let temperature = Variable::new(
            "temperature",
            VariableData::Float64(vec![250.0, 260.0, 270.0, 280.0, 290.0]),
            vec![(DimensionType::Time, 5)],
        )
        .unwrap()
        .with_unit("K");
        p.add_variable(index).unwrap();
        p.add_variable(temperature).unwrap();
        p
    }

    #[test]
    fn rejects_duplicate_names() {
        let mut p = sample_product();
        let dup = Variable::new("index", VariableData::Int32(vec![0; 5]), vec![(DimensionType::Time, 5)]).unwrap();
        assert!(matches!(p.add_variable(dup), Err(VariableError::AlreadyExists(_))));
    }

    #[test]
    fn rejects_mismatched_shared_dimension() {
        let mut p = sample_product();
        let bad = Variable::new(
            "pressure",
            VariableData::Float64(vec![1.0, 2.0, 3.0]),
            vec![(DimensionType::Time, 3)],
        )
        .unwrap();
        assert!(matches!(p.add_variable(bad), Err(VariableError::DimensionMismatch { .. })));
    }

    #[test]
    fn filter_time_mask_drops_rows_atomically() {
        let mut p = sample_product();
        p.filter_time_mask(&[false, false, true, true, true]).unwrap();
        assert_eq!(p.dimension_extent(DimensionType::Time), Some(3));
        let temperature = p.get("temperature").unwrap();
        assert_eq!(temperature.data(), &VariableData::Float64(vec![270.0, 280.0, 290.0]));
        let index = p.get("index").unwrap();
        assert_eq!(index.data(), &VariableData::Int32(vec![2, 3, 4]));
        p.assert_invariants().unwrap();
    }

    #[test]
    fn append_time_rows_grows_all_variables() {
        let mut p = sample_product();
        let mut rows = HashMap::new();
        rows.insert("index".to_string(), VariableData::Int32(vec![5]));
        rows.insert("temperature".to_string(), VariableData::Float64(vec![300.0]));
        p.append_time_rows(&rows).unwrap();
        assert_eq!(p.dimension_extent(DimensionType::Time), Some(6));
        p.assert_invariants().unwrap();
    }

    #[test]
    fn rename_preserves_metadata() {
        let mut p = sample_product();
        p.rename_variable("temperature", "air_temperature").unwrap();
        let renamed = p.get("air_temperature").unwrap();
        assert_eq!(renamed.unit(), Some("K"));
        assert!(p.get("temperature").is_none());
    }

    #[test]
    fn scalar_value_fill_detection() {
        let v = Variable::new("flag", VariableData::Int32(vec![0, -999, 2]), vec![(DimensionType::Time, 3)])
            .unwrap()
            .with_fill_value(ScalarValue::Int32(-999));
        assert!(v.is_fill(-999.0));
        assert!(!v.is_fill(0.0));
    }
}
