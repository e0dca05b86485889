//! Typed `Action` records — the output of analysis (§4.6) and the input
//! to execution (§4.7). Each variant owns its arguments outright; there is
//! no lifetime tie back to the AST they were lowered from.

use harp_product::DimensionType;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    Left,
    Right,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ComparisonOp {
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EqualityOp {
    Eq,
    Ne,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BitMaskOp {
    AllBitsSet,
    NoBitSet,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MembershipOp {
    In,
    NotIn,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    CollocationFilter { filename: String, side: Side },
    ComparisonFilter { var: String, op: ComparisonOp, value: f64, unit: Option<String> },
    StringComparisonFilter { var: String, op: EqualityOp, string: String },
    BitMaskFilter { var: String, op: BitMaskOp, mask: u32 },
    MembershipFilter { var: String, op: MembershipOp, values: Vec<f64>, unit: Option<String> },
    StringMembershipFilter { var: String, op: MembershipOp, strings: Vec<String> },
    ValidRangeFilter { var: String },
    LongitudeRangeFilter { min: f64, min_unit: Option<String>, max: f64, max_unit: Option<String> },
    PointDistanceFilter {
        lon: f64,
        lon_unit: Option<String>,
        lat: f64,
        lat_unit: Option<String>,
        distance: f64,
        distance_unit: Option<String>,
    },
    AreaMaskCoversPointFilter { filename: String },
    AreaMaskCoversAreaFilter { filename: String },
    AreaMaskIntersectsAreaFilter { filename: String, min_fraction_pct: f64 },
    VariableDerivation { var: String, dims: Vec<DimensionType>, unit: Option<String> },
    VariableInclusion { names: Vec<String> },
    VariableExclusion { names: Vec<String> },
}

/// Ordered sequence of [`Action`]s, applied left-to-right (§4.7).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ActionList {
    pub actions: Vec<Action>,
}

impl ActionList {
    pub fn new(actions: Vec<Action>) -> Self {
        ActionList { actions }
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Action> {
        self.actions.iter()
    }
}
