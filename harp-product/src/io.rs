//! Serializable snapshots of a [`Variable`]'s attribute set, gated behind
//! the `serde` feature.
//!
//! A variable's backing [`VariableData`] array can be large enough that
//! blindly deriving `Serialize`/`Deserialize` on [`Variable`] itself is the
//! wrong default; [`VariableAttributes`] captures just the metadata a
//! catalogue or manifest needs (name, unit, description, dimensions,
//! fill/valid-range, enum labels) the way `nav-solutions-sp3` derives
//! serde only on its small header/entry structs rather than its bulk
//! record arrays.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::dimension::DimensionType;
use crate::variable::{ScalarValue, Variable};

/// A serializable snapshot of everything about a [`Variable`] except its
/// data array.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct VariableAttributes {
    pub name: String,
    pub dimensions: Vec<(DimensionType, usize)>,
    pub unit: Option<String>,
    pub description: Option<String>,
    pub valid_range: Option<(ScalarValue, ScalarValue)>,
    pub fill_value: Option<ScalarValue>,
    pub enum_labels: Option<Vec<String>>,
}

impl VariableAttributes {
    /// Lift a variable's metadata out, leaving its data array behind.
    pub fn from_variable(variable: &Variable) -> Self {
        VariableAttributes {
            name: variable.name().to_string(),
            dimensions: variable.dimensions().to_vec(),
            unit: variable.unit().map(|u| u.to_string()),
            description: variable.description().map(|d| d.to_string()),
            valid_range: variable.valid_range().cloned(),
            fill_value: variable.fill_value().cloned(),
            enum_labels: variable.enum_labels().map(|l| l.to_vec()),
        }
    }

    /// Re-apply this attribute set onto a variable carrying the same
    /// name, dimensions, and data. Returns the variable unchanged if
    /// `variable.name()` or `variable.dimensions()` disagree with what
    /// was recorded.
    pub fn apply_to(&self, mut variable: Variable) -> Variable {
        if variable.name() != self.name || variable.dimensions() != self.dimensions.as_slice() {
            return variable;
        }
        if let Some(unit) = &self.unit {
            variable = variable.with_unit(unit.clone());
        }
        if let Some(description) = &self.description {
            variable = variable.with_description(description.clone());
        }
        if let Some((min, max)) = &self.valid_range {
            variable = variable.with_valid_range(min.clone(), max.clone());
        }
        if let Some(fill) = &self.fill_value {
            variable = variable.with_fill_value(fill.clone());
        }
        if let Some(labels) = &self.enum_labels {
            variable = variable.with_enum_labels(labels.clone());
        }
        variable
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::variable::VariableData;

    fn sample_variable() -> Variable {
        Variable::new("temperature", VariableData::Float64(vec![250.0, 260.0]), vec![(DimensionType::Time, 2)])
            .unwrap()
            .with_unit("K")
            .with_description("air temperature")
    }

    #[test]
    fn round_trips_through_json() {
        let attrs = VariableAttributes::from_variable(&sample_variable());

        let json = serde_json::to_string(&attrs).unwrap();
        let back: VariableAttributes = serde_json::from_str(&json).unwrap();
        assert_eq!(back, attrs);
    }

    #[test]
    fn attributes_are_lifted_and_reapplied() {
        let attrs = VariableAttributes::from_variable(&sample_variable());
        assert_eq!(attrs.unit.as_deref(), Some("K"));

        let bare = Variable::new("temperature", VariableData::Float64(vec![0.0, 0.0]), vec![(DimensionType::Time, 2)]).unwrap();
        let restored = attrs.apply_to(bare);
        assert_eq!(restored.unit(), Some("K"));
    }
}
