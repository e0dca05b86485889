use crate::error::UnitError;
use crate::parser::{self, ParsedUnit};

/// Answers compatibility and conversion-factor questions over UDUNITS-style
/// unit strings.
///
/// The engine treats the empty string and the literal `1` as the same
/// dimensionless unit, and never interprets the modulus of an angular
/// quantity (longitudes, wind directions, ...) — that remains the caller's
/// concern (see the `use_modulo` handling in `harp-collocate`).
#[derive(Debug, Clone)]
pub struct Unit {
    spec: String,
    parsed: ParsedUnit,
}

impl Unit {
    pub fn parse(spec: &str) -> Result<Self, UnitError> {
        let parsed = parser::parse(spec)?;
        Ok(Unit { spec: spec.trim().to_string(), parsed })
    }

    pub fn as_str(&self) -> &str {
        &self.spec
    }

    pub fn is_compatible_with(&self, other: &Unit) -> bool {
        self.parsed.dims == other.parsed.dims
    }

    /// Factor `f` such that `x_in_self * f == x_in_other`.
    pub fn factor_to(&self, other: &Unit) -> Result<f64, UnitError> {
        if !self.is_compatible_with(other) {
            return Err(UnitError::Incompatible {
                from: self.spec.clone(),
                to: other.spec.clone(),
            });
        }
        Ok(self.parsed.factor / other.parsed.factor)
    }
}

/// `is_compatible(a, b)` per the component design (§4.1): syntactic errors
/// propagate, but two syntactically valid units are simply compared for
/// dimensional equality.
pub fn is_compatible(a: &str, b: &str) -> Result<bool, UnitError> {
    let ua = Unit::parse(a)?;
    let ub = Unit::parse(b)?;
    Ok(ua.is_compatible_with(&ub))
}

/// Factor such that `x * factor(from, to)` is the same physical quantity
/// expressed in `to`.
pub fn factor(from: &str, to: &str) -> Result<f64, UnitError> {
    let ufrom = Unit::parse(from)?;
    let uto = Unit::parse(to)?;
    ufrom.factor_to(&uto)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn factor_identity() {
        for u in ["K", "hPa", "deg", "m", "molec/cm3", "s", ""] {
            let f = factor(u, u).unwrap();
            assert!((f - 1.0).abs() < 1e-12, "unit {u} factor {f}");
        }
    }

    #[test]
    fn factor_round_trip() {
        let a = factor("hPa", "Pa").unwrap();
        let b = factor("Pa", "hPa").unwrap();
        assert!((a * b - 1.0).abs() < 1e-12);
    }

    #[test]
    fn is_compatible_reflexive_and_symmetric() {
        assert!(is_compatible("deg", "rad").unwrap());
        assert!(is_compatible("rad", "deg").unwrap());
        assert!(!is_compatible("deg", "m").unwrap());
    }

    #[test]
    fn empty_and_one_are_equivalent() {
        assert!(is_compatible("", "1").unwrap());
        assert_eq!(factor("", "1").unwrap(), 1.0);
    }

    #[test]
    fn incompatible_conversion_errors() {
        assert!(factor("K", "m").is_err());
    }
}
