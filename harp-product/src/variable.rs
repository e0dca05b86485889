use crate::dimension::DimensionType;
use crate::error::{Result, VariableError};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// The scalar element types a variable's data array may hold.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ElementType {
    Int8,
    Int16,
    Int32,
    Float32,
    Float64,
    String,
}

/// A single value of one of the scalar element types, used for
/// `valid_range` bounds and `fill_value`.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum ScalarValue {
    Int8(i8),
    Int16(i16),
    Int32(i32),
    Float32(f32),
    Float64(f64),
    String(String),
}

impl ScalarValue {
    pub fn element_type(&self) -> ElementType {
        match self {
            ScalarValue::Int8(_) => ElementType::Int8,
            ScalarValue::Int16(_) => ElementType::Int16,
            ScalarValue::Int32(_) => ElementType::Int32,
            ScalarValue::Float32(_) => ElementType::Float32,
            ScalarValue::Float64(_) => ElementType::Float64,
            ScalarValue::String(_) => ElementType::String,
        }
    }

    /// Numeric value as `f64`, or `None` for string scalars.
    pub fn as_f64(&self) -> Option<f64> {
        Some(match self {
            ScalarValue::Int8(v) => *v as f64,
            ScalarValue::Int16(v) => *v as f64,
            ScalarValue::Int32(v) => *v as f64,
            ScalarValue::Float32(v) => *v as f64,
            ScalarValue::Float64(v) => *v,
            ScalarValue::String(_) => return None,
        })
    }
}

/// The variable's backing data array, stored column-major flattened with
/// the variable's own dimension order (row = time axis index when a time
/// dimension is present).
#[derive(Debug, Clone, PartialEq)]
pub enum VariableData {
    Int8(Vec<i8>),
    Int16(Vec<i16>),
    Int32(Vec<i32>),
    Float32(Vec<f32>),
    Float64(Vec<f64>),
    String(Vec<String>),
}

impl VariableData {
    pub fn element_type(&self) -> ElementType {
        match self {
            VariableData::Int8(_) => ElementType::Int8,
            VariableData::Int16(_) => ElementType::Int16,
            VariableData::Int32(_) => ElementType::Int32,
            VariableData::Float32(_) => ElementType::Float32,
            VariableData::Float64(_) => ElementType::Float64,
            VariableData::String(_) => ElementType::String,
        }
    }

    pub fn len(&self) -> usize {
        match self {
            VariableData::Int8(v) => v.len(),
            VariableData::Int16(v) => v.len(),
            VariableData::Int32(v) => v.len(),
            VariableData::Float32(v) => v.len(),
            VariableData::Float64(v) => v.len(),
            VariableData::String(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Element `i` as `f64`; `None` for string data.
    pub fn get_f64(&self, i: usize) -> Option<f64> {
        match self {
            VariableData::Int8(v) => v.get(i).map(|x| *x as f64),
            VariableData::Int16(v) => v.get(i).map(|x| *x as f64),
            VariableData::Int32(v) => v.get(i).map(|x| *x as f64),
            VariableData::Float32(v) => v.get(i).map(|x| *x as f64),
            VariableData::Float64(v) => v.get(i).copied(),
            VariableData::String(_) => None,
        }
    }

    pub fn get_string(&self, i: usize) -> Option<&str> {
        match self {
            VariableData::String(v) => v.get(i).map(|s| s.as_str()),
            _ => None,
        }
    }
}

/// Named, typed, N-dimensional array plus the metadata attached to it.
#[derive(Debug, Clone, PartialEq)]
pub struct Variable {
    name: String,
    data: VariableData,
    dimensions: Vec<(DimensionType, usize)>,
    unit: Option<String>,
    description: Option<String>,
    valid_range: Option<(ScalarValue, ScalarValue)>,
    fill_value: Option<ScalarValue>,
    enum_labels: Option<Vec<String>>,
}

pub fn is_valid_name(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

impl Variable {
    pub fn new(
        name: impl Into<String>,
        data: VariableData,
        dimensions: Vec<(DimensionType, usize)>,
    ) -> Result<Self> {
        let name = name.into();
        if !is_valid_name(&name) {
            return Err(VariableError::InvalidName(name));
        }
        let expected: usize = if dimensions.is_empty() {
            1
        } else {
            dimensions.iter().map(|(_, e)| *e).product()
        };
        if data.len() != expected {
            return Err(VariableError::InvalidShape {
                name,
                reason: format!(
                    "data length {} does not match product of extents {}",
                    data.len(),
                    expected
                ),
            });
        }
        Ok(Variable {
            name,
            data,
            dimensions,
            unit: None,
            description: None,
            valid_range: None,
            fill_value: None,
            enum_labels: None,
        })
    }

    pub fn with_unit(mut self, unit: impl Into<String>) -> Self {
        self.unit = Some(unit.into());
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_valid_range(mut self, min: ScalarValue, max: ScalarValue) -> Self {
        self.valid_range = Some((min, max));
        self
    }

    pub fn with_fill_value(mut self, fill: ScalarValue) -> Self {
        self.fill_value = Some(fill);
        self
    }

    pub fn with_enum_labels(mut self, labels: Vec<String>) -> Self {
        self.enum_labels = Some(labels);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn data(&self) -> &VariableData {
        &self.data
    }

    pub fn data_mut(&mut self) -> &mut VariableData {
        &mut self.data
    }

    pub fn set_data(&mut self, data: VariableData) {
        self.data = data;
    }

    pub fn dimensions(&self) -> &[(DimensionType, usize)] {
        &self.dimensions
    }

    pub fn dimensions_mut(&mut self) -> impl Iterator<Item = &mut (DimensionType, usize)> {
        self.dimensions.iter_mut()
    }

    pub fn rank(&self) -> usize {
        self.dimensions.len()
    }

    pub fn element_type(&self) -> ElementType {
        self.data.element_type()
    }

    pub fn unit(&self) -> Option<&str> {
        self.unit.as_deref()
    }

    pub fn set_unit(&mut self, unit: Option<String>) {
        self.unit = unit;
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    pub fn valid_range(&self) -> Option<&(ScalarValue, ScalarValue)> {
        self.valid_range.as_ref()
    }

    pub fn fill_value(&self) -> Option<&ScalarValue> {
        self.fill_value.as_ref()
    }

    pub fn enum_labels(&self) -> Option<&[String]> {
        self.enum_labels.as_deref()
    }

    /// Extent along `dim`, if the variable carries that dimension.
    pub fn extent_of(&self, dim: DimensionType) -> Option<usize> {
        self.dimensions.iter().find(|(d, _)| *d == dim).map(|(_, e)| *e)
    }

    pub fn has_dimension(&self, dim: DimensionType) -> bool {
        self.extent_of(dim).is_some()
    }

    /// Is `value` the fill value for this variable?
    pub fn is_fill(&self, value: f64) -> bool {
        match &self.fill_value {
            Some(fill) => fill.as_f64().map(|f| f == value).unwrap_or(false),
            None => false,
        }
    }
}
