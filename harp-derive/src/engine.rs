use std::collections::HashMap;
use std::fmt::Write as _;

use harp_product::{DimensionType, Product, Variable, VariableData};
use harp_units::Unit;

use crate::error::{DerivationError, Result};
use crate::registry::RULES;
use crate::rule::Rule;

/// Maximum recursion depth for rule-graph traversal, mirroring the
/// depth guard used for recursive geometry resolution elsewhere in this
/// codebase: a derivation chain this deep is certainly a cycle the rule
/// author didn't intend, not a legitimate dependency tower.
const MAX_DEPTH: usize = 32;

type MemoKey = (String, Vec<DimensionType>, String);

struct Resolver<'p> {
    product: &'p mut Product,
    memo: HashMap<MemoKey, Variable>,
    chain: Vec<String>,
    depth: usize,
}

/// Synthesise a `(name, dims, unit)` variable, consulting the product
/// first and otherwise walking the rule database depth-first.
///
/// See the component design (§4.3): memoisation is per-call (scoped to one
/// `derive` invocation), ties between equally-ranked candidate rules are
/// broken by declaration order, and the engine never mutates an input it
/// did not itself derive and attach.
pub fn derive(product: &mut Product, name: &str, dims: &[DimensionType], unit: &str) -> Result<Variable> {
    let mut resolver = Resolver {
        product,
        memo: HashMap::new(),
        chain: Vec::new(),
        depth: 0,
    };
    resolver.resolve(name, dims, unit)
}

impl<'p> Resolver<'p> {
    fn resolve(&mut self, name: &str, dims: &[DimensionType], unit: &str) -> Result<Variable> {
        let key: MemoKey = (name.to_string(), dims.to_vec(), unit.to_string());
        if let Some(cached) = self.memo.get(&key) {
            return Ok(cached.clone());
        }

        if let Some(existing) = self.product.get(name) {
            if existing.dimensions().iter().map(|(d, _)| *d).eq(dims.iter().copied()) {
                if let Ok(converted) = convert_unit(existing, unit) {
                    self.memo.insert(key, converted.clone());
                    return Ok(converted);
                }
            }
        }

        if self.chain.iter().any(|n| n == name) {
            return Err(self.fail(name, dims, unit, format!("cycle detected: {} -> {name}", self.chain.join(" -> "))));
        }
        if self.depth >= MAX_DEPTH {
            return Err(self.fail(name, dims, unit, format!("maximum derivation depth {MAX_DEPTH} exceeded")));
        }

        let mut candidates: Vec<&Rule> = RULES
            .iter()
            .filter(|r| r.output_name == name && r.output_dims.iter().copied().eq(dims.iter().copied()))
            .collect();
        if candidates.is_empty() {
            return Err(self.fail(name, dims, unit, "no rule in the database produces this (name, dims)".to_string()));
        }
        // Prefer rules whose inputs are already present in the product;
        // a stable sort preserves declaration order among ties.
        candidates.sort_by_key(|r| std::cmp::Reverse(r.inputs.iter().filter(|i| self.product.contains(i.name)).count()));

        let mut trace = String::new();
        self.chain.push(name.to_string());
        self.depth += 1;
        for rule in candidates {
            match self.try_rule(rule) {
                Ok(resolved_inputs) => {
                    let variable = evaluate_rule(rule, &resolved_inputs, name, unit)?;
                    self.depth -= 1;
                    self.chain.pop();
                    if !self.product.contains(name) {
                        self.product
                            .add_variable(variable.clone())
                            .expect("name/dims checked unique by resolve() entry above");
                    }
                    self.memo.insert(key, variable.clone());
                    return Ok(variable);
                }
                Err(e) => {
                    let _ = writeln!(trace, "rule '{}' <- {:?} failed: {e}", rule.output_name, rule.inputs.iter().map(|i| i.name).collect::<Vec<_>>());
                }
            }
        }
        self.depth -= 1;
        self.chain.pop();
        Err(self.fail(name, dims, unit, trace))
    }

    fn try_rule(&mut self, rule: &Rule) -> Result<Vec<Variable>> {
        let mut resolved = Vec::with_capacity(rule.inputs.len());
        for input in rule.inputs {
            resolved.push(self.resolve(input.name, input.dims, input.unit)?);
        }
        Ok(resolved)
    }

    fn fail(&self, name: &str, dims: &[DimensionType], unit: &str, trace: String) -> DerivationError {
        DerivationError {
            name: name.to_string(),
            dims: dims.to_vec(),
            unit: unit.to_string(),
            trace,
        }
    }
}

fn evaluate_rule(rule: &Rule, inputs: &[Variable], name: &str, requested_unit: &str) -> Result<Variable> {
    let len = inputs.first().map(|v| v.data().len()).unwrap_or(0);
    let mut out = Vec::with_capacity(len);
    for i in 0..len {
        let mut row = Vec::with_capacity(inputs.len());
        for input in inputs {
            row.push(input.data().get_f64(i).ok_or_else(|| DerivationError {
                name: name.to_string(),
                dims: rule.output_dims.to_vec(),
                unit: requested_unit.to_string(),
                trace: format!("input '{}' is not numeric", input.name()),
            })?);
        }
        out.push((rule.func)(&row));
    }

    let dimensions = rule
        .output_dims
        .iter()
        .map(|dim| {
            let extent = inputs
                .iter()
                .find_map(|v| v.extent_of(*dim))
                .unwrap_or(if rule.output_dims.len() == 1 { len } else { 1 });
            (*dim, extent)
        })
        .collect();

    let variable = Variable::new(name, VariableData::Float64(out), dimensions).map_err(|e| DerivationError {
        name: name.to_string(),
        dims: rule.output_dims.to_vec(),
        unit: requested_unit.to_string(),
        trace: e.to_string(),
    })?
    .with_unit(rule.output_unit);

    convert_unit(&variable, requested_unit).map_err(|e| DerivationError {
        name: name.to_string(),
        dims: rule.output_dims.to_vec(),
        unit: requested_unit.to_string(),
        trace: e.to_string(),
    })
}

fn convert_unit(variable: &Variable, requested_unit: &str) -> std::result::Result<Variable, harp_units::UnitError> {
    let current_unit = variable.unit().unwrap_or("");
    if current_unit == requested_unit {
        return Ok(variable.clone());
    }
    let from = Unit::parse(current_unit)?;
    let to = Unit::parse(requested_unit)?;
    let factor = from.factor_to(&to)?;

    let converted_data = match variable.data() {
        VariableData::Float64(v) => VariableData::Float64(v.iter().map(|x| x * factor).collect()),
        VariableData::Float32(v) => VariableData::Float32(v.iter().map(|x| (*x as f64 * factor) as f32).collect()),
        other => other.clone(),
    };
    let mut converted = variable.clone();
    converted.set_data(converted_data);
    converted.set_unit(Some(requested_unit.to_string()));
    Ok(converted)
}

#[cfg(test)]
mod tests {
    use super::*;
    use harp_product::DimensionType::{Time, Vertical};

    fn number_density_product() -> Product {
        let mut p = Product::new("TEST");
        p.add_variable(
            Variable::new(
                "pressure",
                VariableData::Float64(vec![100000.0, 90000.0, 50000.0, 45000.0]),
                vec![(Time, 2), (Vertical, 2)],
            )
            .unwrap()
            .with_unit("Pa"),
        )
        .unwrap();
        p.add_variable(
            Variable::new(
                "temperature",
                VariableData::Float64(vec![250.0, 255.0, 260.0, 265.0]),
                vec![(Time, 2), (Vertical, 2)],
            )
            .unwrap()
            .with_unit("K"),
        )
        .unwrap();
        p
    }

    #[test]
    fn derives_number_density_from_ideal_gas_law() {
        let mut p = number_density_product();
        let result = derive(&mut p, "number_density", &[Time, Vertical], "molec/cm3").unwrap();
        assert_eq!(result.data().len(), 4);
        assert!(p.contains("number_density"));
    }

    #[test]
    fn second_derivation_is_a_no_op() {
        let mut p = number_density_product();
        let first = derive(&mut p, "number_density", &[Time, Vertical], "molec/cm3").unwrap();
        let second = derive(&mut p, "number_density", &[Time, Vertical], "molec/cm3").unwrap();
        assert_eq!(first.data(), second.data());
    }

    #[test]
    fn unit_agnostic_within_a_ulp() {
        let mut p1 = number_density_product();
        let mut p2 = number_density_product();
        let direct = derive(&mut p1, "number_density", &[Time, Vertical], "m-3").unwrap();
        let via_other = derive(&mut p2, "number_density", &[Time, Vertical], "molec/cm3").unwrap();
        let factor = harp_units::factor("molec/cm3", "m-3").unwrap();
        if let (VariableData::Float64(a), VariableData::Float64(b)) = (direct.data(), via_other.data()) {
            for (x, y) in a.iter().zip(b.iter()) {
                assert!((x - y * factor).abs() / x.abs() < 1e-9);
            }
        } else {
            panic!("expected float64 data");
        }
    }

    #[test]
    fn missing_inputs_fail_with_trace() {
        let mut p = Product::new("EMPTY");
        let err = derive(&mut p, "number_density", &[Time, Vertical], "m-3").unwrap_err();
        assert!(err.trace.contains("pressure") || err.trace.contains("temperature"));
    }

    #[test]
    fn chained_derivation_prefers_available_inputs() {
        let mut p = number_density_product();
        let mass_density = derive(&mut p, "mass_density", &[Time, Vertical], "kg.m-3").unwrap();
        assert_eq!(mass_density.data().len(), 4);
        assert!(p.contains("number_density"), "intermediate derivation should be attached");
    }
}
