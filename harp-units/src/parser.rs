//! Compound unit string parsing.
//!
//! Grammar (informal): a unit expression is a `.`-separated (multiply) or
//! `/`-separated (divide) sequence of terms, each term a unit name
//! optionally followed by a signed integer exponent with no separator
//! (`m2`, `s-1`, `cm3`). The empty string and the literal `1` both denote
//! the dimensionless unit.

use crate::dimension::{self, DimVec};
use crate::error::UnitError;
use crate::registry;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ParsedUnit {
    pub dims: DimVec,
    pub factor: f64,
}

enum Op {
    Mul,
    Div,
}

pub fn parse(spec: &str) -> Result<ParsedUnit, UnitError> {
    let spec = spec.trim();
    if spec.is_empty() {
        return Ok(ParsedUnit { dims: dimension::DIMENSIONLESS, factor: 1.0 });
    }

    let mut terms: Vec<(Op, &str)> = Vec::new();
    let mut op = Op::Mul;
    let mut start = 0usize;
    let bytes = spec.as_bytes();
    for (i, &b) in bytes.iter().enumerate() {
        if b == b'.' || b == b'/' {
            let term = &spec[start..i];
            if term.is_empty() {
                return Err(UnitError::InvalidSyntax(spec.to_string()));
            }
            terms.push((op, term));
            op = if b == b'.' { Op::Mul } else { Op::Div };
            start = i + 1;
        }
    }
    let last = &spec[start..];
    if last.is_empty() {
        return Err(UnitError::InvalidSyntax(spec.to_string()));
    }
    terms.push((op, last));

    let mut dims = dimension::DIMENSIONLESS;
    let mut factor = 1.0;
    for (op, term) in terms {
        let (term_dims, term_factor, exponent) = parse_term(term, spec)?;
        let term_dims = dimension::scale(term_dims, exponent);
        let term_factor = term_factor.powi(exponent as i32);
        match op {
            Op::Mul => {
                dims = dimension::add(dims, term_dims);
                factor *= term_factor;
            }
            Op::Div => {
                dims = dimension::add(dims, dimension::negate(term_dims));
                factor /= term_factor;
            }
        }
    }

    Ok(ParsedUnit { dims, factor })
}

/// Split a term into its unit name and trailing signed exponent, then
/// resolve the name against the atom tables.
fn parse_term(term: &str, whole: &str) -> Result<(DimVec, f64, i8), UnitError> {
    if term == "1" {
        return Ok((dimension::DIMENSIONLESS, 1.0, 1));
    }

    let digits_start = term
        .char_indices()
        .rev()
        .take_while(|(_, c)| c.is_ascii_digit())
        .last()
        .map(|(i, _)| i);
    let (name, exponent) = match digits_start {
        None => (term, 1i8),
        Some(digit_start) => {
            let sign_start = if digit_start > 0 && term.as_bytes()[digit_start - 1] == b'-' {
                digit_start - 1
            } else {
                digit_start
            };
            let name = &term[..sign_start];
            if name.is_empty() {
                (term, 1i8)
            } else {
                match term[sign_start..].parse::<i8>() {
                    Ok(e) if e != 0 => (name, e),
                    _ => return Err(UnitError::InvalidSyntax(whole.to_string())),
                }
            }
        }
    };

    if let Some(atom) = registry::lookup_named(name) {
        return Ok((atom.dims, atom.scale, exponent));
    }
    if let Some((dims, factor)) = registry::lookup_prefixed(name) {
        return Ok((dims, factor, exponent));
    }

    Err(UnitError::InvalidSyntax(whole.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dimensionless_forms_are_equal() {
        let empty = parse("").unwrap();
        let one = parse("1").unwrap();
        assert_eq!(empty, one);
    }

    #[test]
    fn hecto_pascal_resolves() {
        let u = parse("hPa").unwrap();
        assert_eq!(u.factor, 100.0);
    }

    #[test]
    fn compound_division_and_exponent() {
        let u = parse("molec/cm3").unwrap();
        assert_eq!(u.dims[dimension::LENGTH], -3);
        assert_eq!(u.dims[dimension::SUBSTANCE], 0);
        assert!(u.factor > 0.0);
    }

    #[test]
    fn invalid_syntax_is_rejected() {
        assert!(parse("bogus_unit").is_err());
    }
}
