//! Walks the AST and lowers each [`Statement`] to a typed [`Action`]
//! (§4.6). Function calls are dispatched through a closed registry of
//! built-ins, each with a fixed (or "one or more") arity and an expected
//! argument kind per position.

use harp_product::DimensionType;

use crate::action::*;
use crate::ast::*;
use crate::error::ScriptError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ArgKind {
    String,
    Quantity,
    QualifiedNameBare,
    QualifiedNameWithDims,
}

#[derive(Debug, Clone, Copy)]
enum Arity {
    Exact(usize),
    OneOrMore,
}

struct FunctionSpec {
    name: &'static str,
    arity: Arity,
    /// Kind expected at each position for `Exact`; the single repeated
    /// kind for `OneOrMore`.
    arg_kinds: &'static [ArgKind],
}

const FUNCTIONS: &[FunctionSpec] = &[
    FunctionSpec { name: "collocation-left", arity: Arity::Exact(1), arg_kinds: &[ArgKind::String] },
    FunctionSpec { name: "collocation-right", arity: Arity::Exact(1), arg_kinds: &[ArgKind::String] },
    FunctionSpec { name: "valid", arity: Arity::Exact(1), arg_kinds: &[ArgKind::QualifiedNameBare] },
    FunctionSpec {
        name: "longitude-range",
        arity: Arity::Exact(2),
        arg_kinds: &[ArgKind::Quantity, ArgKind::Quantity],
    },
    FunctionSpec {
        name: "point-distance",
        arity: Arity::Exact(3),
        arg_kinds: &[ArgKind::Quantity, ArgKind::Quantity, ArgKind::Quantity],
    },
    FunctionSpec { name: "area-mask-covers-point", arity: Arity::Exact(1), arg_kinds: &[ArgKind::String] },
    FunctionSpec { name: "area-mask-covers-area", arity: Arity::Exact(1), arg_kinds: &[ArgKind::String] },
    FunctionSpec {
        name: "area-mask-intersects-area",
        arity: Arity::Exact(2),
        arg_kinds: &[ArgKind::String, ArgKind::Quantity],
    },
    FunctionSpec { name: "derive", arity: Arity::Exact(1), arg_kinds: &[ArgKind::QualifiedNameWithDims] },
    FunctionSpec { name: "keep", arity: Arity::OneOrMore, arg_kinds: &[ArgKind::QualifiedNameBare] },
    FunctionSpec { name: "exclude", arity: Arity::OneOrMore, arg_kinds: &[ArgKind::QualifiedNameBare] },
];

pub fn analyze(ast: &ActionAst) -> Result<ActionList, ScriptError> {
    let mut actions = Vec::with_capacity(ast.statements.len());
    for statement in &ast.statements {
        actions.push(lower_statement(statement)?);
    }
    Ok(ActionList::new(actions))
}

fn lower_statement(statement: &Statement) -> Result<Action, ScriptError> {
    match statement {
        Statement::FunctionCall { name, args } => lower_function_call(name, args),
        Statement::MembershipTest { var, op, literals, unit } => lower_membership(var, *op, literals, unit),
        Statement::BitMaskTest { var, op, mask } => lower_bit_mask(var, *op, mask),
        Statement::Comparison { var, op, rhs } => lower_comparison(var, *op, rhs),
    }
}

fn lower_function_call(name: &NameLit, args: &[Argument]) -> Result<Action, ScriptError> {
    let spec = FUNCTIONS
        .iter()
        .find(|f| f.name == name.text)
        .ok_or_else(|| ScriptError::new(name.offset, format!("unknown function '{}'", name.text)))?;

    match spec.arity {
        Arity::Exact(n) => {
            if args.len() != n {
                return Err(ScriptError::new(
                    name.offset,
                    format!("'{}' expects {n} argument(s), found {}", name.text, args.len()),
                ));
            }
        }
        Arity::OneOrMore => {
            if args.is_empty() {
                return Err(ScriptError::new(name.offset, format!("'{}' expects one or more arguments", name.text)));
            }
        }
    }
    for (i, arg) in args.iter().enumerate() {
        let expected = match spec.arity {
            Arity::Exact(_) => spec.arg_kinds[i],
            Arity::OneOrMore => spec.arg_kinds[0],
        };
        check_arg_kind(name.text.as_str(), arg, expected)?;
    }

    match name.text.as_str() {
        "collocation-left" => Ok(Action::CollocationFilter { filename: expect_string(&args[0])?, side: Side::Left }),
        "collocation-right" => Ok(Action::CollocationFilter { filename: expect_string(&args[0])?, side: Side::Right }),
        "valid" => Ok(Action::ValidRangeFilter { var: expect_bare_name(&args[0])?.name.text.clone() }),
        "longitude-range" => {
            let (min, min_unit) = expect_quantity(&args[0])?;
            let (max, max_unit) = expect_quantity(&args[1])?;
            Ok(Action::LongitudeRangeFilter { min, min_unit, max, max_unit })
        }
        "point-distance" => {
            let (lon, lon_unit) = expect_quantity(&args[0])?;
            let (lat, lat_unit) = expect_quantity(&args[1])?;
            let (distance, distance_unit) = expect_quantity(&args[2])?;
            Ok(Action::PointDistanceFilter { lon, lon_unit, lat, lat_unit, distance, distance_unit })
        }
        "area-mask-covers-point" => Ok(Action::AreaMaskCoversPointFilter { filename: expect_string(&args[0])? }),
        "area-mask-covers-area" => Ok(Action::AreaMaskCoversAreaFilter { filename: expect_string(&args[0])? }),
        "area-mask-intersects-area" => {
            let filename = expect_string(&args[0])?;
            let (min_fraction_pct, _unit) = expect_quantity(&args[1])?;
            Ok(Action::AreaMaskIntersectsAreaFilter { filename, min_fraction_pct })
        }
        "derive" => {
            let q = expect_qualified_name(&args[0])?;
            let dim_names = q.dims.as_ref().ok_or_else(|| {
                ScriptError::new(q.name.offset, "derive(...) requires a dimension list, e.g. {time, vertical}".to_string())
            })?;
            let mut dims = Vec::with_capacity(dim_names.len());
            for d in dim_names {
                let parsed = DimensionType::from_name(&d.text)
                    .ok_or_else(|| ScriptError::new(d.offset, format!("unknown dimension '{}'", d.text)))?;
                dims.push(parsed);
            }
            Ok(Action::VariableDerivation {
                var: q.name.text.clone(),
                dims,
                unit: q.unit.as_ref().map(|u| u.text.clone()),
            })
        }
        "keep" => Ok(Action::VariableInclusion { names: bare_names(args)? }),
        "exclude" => Ok(Action::VariableExclusion { names: bare_names(args)? }),
        _ => unreachable!("dispatch covers every entry in FUNCTIONS"),
    }
}

fn check_arg_kind(fn_name: &str, arg: &Argument, expected: ArgKind) -> Result<(), ScriptError> {
    let (ok, offset) = match (arg, expected) {
        (Argument::String(s), ArgKind::String) => (true, s.offset),
        (Argument::Quantity(n, _), ArgKind::Quantity) => (true, n.offset),
        (Argument::QualifiedName(q), ArgKind::QualifiedNameBare) => (q.dims.is_none() && q.unit.is_none(), q.name.offset),
        (Argument::QualifiedName(q), ArgKind::QualifiedNameWithDims) => (true, q.name.offset),
        (other, _) => (false, arg_offset(other)),
    };
    if ok {
        Ok(())
    } else {
        Err(ScriptError::new(offset, format!("'{fn_name}' received an argument of the wrong type")))
    }
}

fn arg_offset(arg: &Argument) -> usize {
    match arg {
        Argument::String(s) => s.offset,
        Argument::QualifiedName(q) => q.name.offset,
        Argument::Quantity(n, _) => n.offset,
    }
}

fn expect_string(arg: &Argument) -> Result<String, ScriptError> {
    match arg {
        Argument::String(s) => Ok(s.value.clone()),
        _ => Err(ScriptError::new(arg_offset(arg), "expected a string literal".to_string())),
    }
}

fn expect_quantity(arg: &Argument) -> Result<(f64, Option<String>), ScriptError> {
    match arg {
        Argument::Quantity(n, unit) => Ok((n.value, unit.as_ref().map(|u| u.text.clone()))),
        _ => Err(ScriptError::new(arg_offset(arg), "expected a number".to_string())),
    }
}

fn expect_qualified_name(arg: &Argument) -> Result<&QualifiedName, ScriptError> {
    match arg {
        Argument::QualifiedName(q) => Ok(q),
        _ => Err(ScriptError::new(arg_offset(arg), "expected an identifier".to_string())),
    }
}

fn expect_bare_name(arg: &Argument) -> Result<&QualifiedName, ScriptError> {
    expect_qualified_name(arg)
}

fn bare_names(args: &[Argument]) -> Result<Vec<String>, ScriptError> {
    args.iter().map(|a| Ok(expect_bare_name(a)?.name.text.clone())).collect()
}

fn lower_membership(
    var: &NameLit,
    op: MembershipOpAst,
    literals: &[Literal],
    unit: &Option<UnitLit>,
) -> Result<Action, ScriptError> {
    let op = match op {
        MembershipOpAst::In => MembershipOp::In,
        MembershipOpAst::NotIn => MembershipOp::NotIn,
    };
    let all_numbers = literals.iter().all(|l| matches!(l, Literal::Number(_)));
    let all_strings = literals.iter().all(|l| matches!(l, Literal::String(_)));

    if all_numbers {
        let values = literals
            .iter()
            .map(|l| match l {
                Literal::Number(n) => n.value,
                _ => unreachable!(),
            })
            .collect();
        Ok(Action::MembershipFilter { var: var.text.clone(), op, values, unit: unit.as_ref().map(|u| u.text.clone()) })
    } else if all_strings {
        if unit.is_some() {
            return Err(ScriptError::new(var.offset, "a string membership list cannot carry a unit".to_string()));
        }
        let strings = literals
            .iter()
            .map(|l| match l {
                Literal::String(s) => s.value.clone(),
                _ => unreachable!(),
            })
            .collect();
        Ok(Action::StringMembershipFilter { var: var.text.clone(), op, strings })
    } else {
        Err(ScriptError::new(var.offset, "membership list members must all be numbers or all be strings".to_string()))
    }
}

fn lower_bit_mask(var: &NameLit, op: BitMaskOpAst, mask: &NumberLit) -> Result<Action, ScriptError> {
    let op = match op {
        BitMaskOpAst::AllBitsSet => BitMaskOp::AllBitsSet,
        BitMaskOpAst::NoBitSet => BitMaskOp::NoBitSet,
    };
    if mask.value < 0.0 || mask.value.fract() != 0.0 || mask.value > u32::MAX as f64 {
        return Err(ScriptError::new(mask.offset, "bit mask must be a non-negative integer that fits in 32 bits".to_string()));
    }
    Ok(Action::BitMaskFilter { var: var.text.clone(), op, mask: mask.value as u32 })
}

fn lower_comparison(var: &NameLit, op: CompareOpAst, rhs: &ComparisonRhs) -> Result<Action, ScriptError> {
    match rhs {
        ComparisonRhs::String(s) => {
            let op = match op {
                CompareOpAst::Eq => EqualityOp::Eq,
                CompareOpAst::Ne => EqualityOp::Ne,
                _ => {
                    return Err(ScriptError::new(
                        var.offset,
                        "string operands only support '=' and '!=' comparisons".to_string(),
                    ))
                }
            };
            Ok(Action::StringComparisonFilter { var: var.text.clone(), op, string: s.value.clone() })
        }
        ComparisonRhs::QualifiedName(q) => Err(ScriptError::new(
            q.name.offset,
            "comparisons against another variable are not supported".to_string(),
        )),
        ComparisonRhs::Quantity(n, unit) => {
            let op = match op {
                CompareOpAst::Eq => ComparisonOp::Eq,
                CompareOpAst::Ne => ComparisonOp::Ne,
                CompareOpAst::Lt => ComparisonOp::Lt,
                CompareOpAst::Le => ComparisonOp::Le,
                CompareOpAst::Gt => ComparisonOp::Gt,
                CompareOpAst::Ge => ComparisonOp::Ge,
            };
            Ok(Action::ComparisonFilter { var: var.text.clone(), op, value: n.value, unit: unit.as_ref().map(|u| u.text.clone()) })
        }
    }
}

// Re-exported under local names to keep the match arms above readable
// without qualifying every variant with `crate::ast::`.
use crate::ast::BitMaskOp as BitMaskOpAst;
use crate::ast::CompareOp as CompareOpAst;
use crate::ast::MembershipOp as MembershipOpAst;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser;

    fn lower(src: &str) -> Action {
        let ast = parser::parse(src).unwrap();
        analyze(&ast).unwrap().actions.into_iter().next().unwrap()
    }

    #[test]
    fn lowers_comparison_filter() {
        let action = lower("temperature >= 265 [K]");
        assert!(matches!(action, Action::ComparisonFilter { op: ComparisonOp::Ge, value, .. } if value == 265.0));
    }

    #[test]
    fn lowers_string_comparison() {
        let action = lower(r#"source_product = "TEST001""#);
        assert!(matches!(action, Action::StringComparisonFilter { op: EqualityOp::Eq, .. }));
    }

    #[test]
    fn rejects_ordering_comparison_on_string() {
        let ast = parser::parse(r#"source_product < "TEST001""#).unwrap();
        assert!(analyze(&ast).is_err());
    }

    #[test]
    fn lowers_membership_filter_with_unit() {
        let action = lower("wind_direction in (350, 15) [deg]");
        assert!(matches!(action, Action::MembershipFilter { op: MembershipOp::In, .. }));
    }

    #[test]
    fn rejects_unit_on_string_membership_list() {
        let ast = parser::parse(r#"flag in ("a", "b") [K]"#).unwrap();
        assert!(analyze(&ast).is_err());
    }

    #[test]
    fn rejects_mixed_membership_list() {
        let ast = parser::parse(r#"flag in (1, "b")"#).unwrap();
        assert!(analyze(&ast).is_err());
    }

    #[test]
    fn lowers_derive_call() {
        let action = lower("derive(number_density {time, vertical} [molec/cm3])");
        assert!(matches!(action, Action::VariableDerivation { unit: Some(u), .. } if u == "molec/cm3"));
    }

    #[test]
    fn rejects_derive_without_dims() {
        let ast = parser::parse("derive(number_density [molec/cm3])").unwrap();
        assert!(analyze(&ast).is_err());
    }

    #[test]
    fn lowers_keep_and_exclude() {
        assert!(matches!(lower("keep(pressure, temperature)"), Action::VariableInclusion { names } if names.len() == 2));
        assert!(matches!(lower("exclude(flag)"), Action::VariableExclusion { names } if names.len() == 1));
    }

    #[test]
    fn rejects_unknown_function() {
        let ast = parser::parse("bogus(1, 2)").unwrap();
        assert!(analyze(&ast).is_err());
    }

    #[test]
    fn rejects_wrong_arity() {
        let ast = parser::parse("valid(a, b)").unwrap();
        assert!(analyze(&ast).is_err());
    }

    #[test]
    fn lowers_longitude_range() {
        let action = lower("longitude-range(170 [deg], -170 [deg])");
        assert!(matches!(action, Action::LongitudeRangeFilter { min, max, .. } if min == 170.0 && max == -170.0));
    }
}
