use harp_product::DimensionType;

/// One input a [`Rule`] needs, named the way it would appear inside a
/// product (a fixed physical quantity, not a free variable).
pub struct InputSpec {
    pub name: &'static str,
    pub unit: &'static str,
    pub dims: &'static [DimensionType],
}

/// An algebraic identity between variables: `output = func(inputs)`.
///
/// The rule database this type populates stands in for HARP's per-species
/// derivation table (out of scope per the specification); the handful of
/// rules defined in [`crate::registry`] are real atmospheric identities
/// used to exercise the walking algorithm end to end.
pub struct Rule {
    pub output_name: &'static str,
    /// Unit the rule's `func` natively computes in. The engine converts
    /// this to whatever unit the caller requested.
    pub output_unit: &'static str,
    pub output_dims: &'static [DimensionType],
    pub inputs: &'static [InputSpec],
    /// Elementwise kernel: one input slice per `inputs` entry (same
    /// broadcast length), producing one output element per call.
    pub func: fn(&[f64]) -> f64,
}
