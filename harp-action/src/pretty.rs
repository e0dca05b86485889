//! Pretty-printer from [`ActionAst`] back to source text.
//!
//! Used by the round-trip property in §8: `parse(s) -> ast -> print(ast) ->
//! s'` must parse back to an AST equal to `ast` (equality ignoring byte
//! offsets, per [`crate::ast`]).

use crate::ast::*;

pub fn print(ast: &ActionAst) -> String {
    ast.statements.iter().map(print_statement).collect::<Vec<_>>().join("; ")
}

fn print_statement(statement: &Statement) -> String {
    match statement {
        Statement::FunctionCall { name, args } => {
            format!("{}({})", name.text, args.iter().map(print_argument).collect::<Vec<_>>().join(", "))
        }
        Statement::MembershipTest { var, op, literals, unit } => {
            let keyword = match op {
                MembershipOp::In => "in",
                MembershipOp::NotIn => "not in",
            };
            let list = literals.iter().map(print_literal).collect::<Vec<_>>().join(", ");
            format!("{} {keyword} ({list}){}", var.text, print_unit_suffix(unit))
        }
        Statement::BitMaskTest { var, op, mask } => {
            let keyword = match op {
                BitMaskOp::AllBitsSet => "all-bits-in-mask-set",
                BitMaskOp::NoBitSet => "no-bit-in-mask-set",
            };
            format!("{} {keyword} {}", var.text, print_number(mask.value))
        }
        Statement::Comparison { var, op, rhs } => {
            format!("{} {} {}", var.text, print_compare_op(*op), print_comparison_rhs(rhs))
        }
    }
}

fn print_compare_op(op: CompareOp) -> &'static str {
    match op {
        CompareOp::Eq => "=",
        CompareOp::Ne => "!=",
        CompareOp::Lt => "<",
        CompareOp::Le => "<=",
        CompareOp::Gt => ">",
        CompareOp::Ge => ">=",
    }
}

fn print_argument(arg: &Argument) -> String {
    match arg {
        Argument::String(s) => print_string(&s.value),
        Argument::QualifiedName(q) => print_qualified_name(q),
        Argument::Quantity(n, unit) => format!("{}{}", print_number(n.value), print_unit_suffix(unit)),
    }
}

fn print_comparison_rhs(rhs: &ComparisonRhs) -> String {
    match rhs {
        ComparisonRhs::String(s) => print_string(&s.value),
        ComparisonRhs::QualifiedName(q) => print_qualified_name(q),
        ComparisonRhs::Quantity(n, unit) => format!("{}{}", print_number(n.value), print_unit_suffix(unit)),
    }
}

fn print_qualified_name(q: &QualifiedName) -> String {
    let mut out = q.name.text.clone();
    if let Some(dims) = &q.dims {
        out.push_str(&format!("{{{}}}", dims.iter().map(|d| d.text.as_str()).collect::<Vec<_>>().join(", ")));
    }
    out.push_str(&print_unit_suffix(&q.unit));
    out
}

fn print_unit_suffix(unit: &Option<UnitLit>) -> String {
    match unit {
        Some(u) => format!(" [{}]", u.text),
        None => String::new(),
    }
}

fn print_literal(literal: &Literal) -> String {
    match literal {
        Literal::Number(n) => print_number(n.value),
        Literal::String(s) => print_string(&s.value),
    }
}

fn print_number(value: f64) -> String {
    format!("{value}")
}

fn print_string(value: &str) -> String {
    let mut out = String::with_capacity(value.len() + 2);
    out.push('"');
    for ch in value.chars() {
        match ch {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\t' => out.push_str("\\t"),
            '\r' => out.push_str("\\r"),
            other => out.push(other),
        }
    }
    out.push('"');
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser;

    fn round_trips(src: &str) {
        let ast = parser::parse(src).unwrap();
        let printed = parser::parse(&print(&ast)).unwrap();
        assert_eq!(ast, printed, "original: {src:?}, printed: {:?}", print(&ast));
    }

    #[test]
    fn round_trips_comparison() {
        round_trips("temperature >= 265 [K]");
    }

    #[test]
    fn round_trips_membership_with_unit() {
        round_trips("wind_direction not in (350, 15) [deg]");
    }

    #[test]
    fn round_trips_bit_mask_test() {
        round_trips("flags all-bits-in-mask-set 3");
    }

    #[test]
    fn round_trips_derive_call() {
        round_trips("derive(number_density {time, vertical} [molec/cm3])");
    }

    #[test]
    fn round_trips_multi_statement_list() {
        round_trips("temperature >= 265 [K]; include(pressure, temperature)");
    }

    #[test]
    fn round_trips_string_with_escapes() {
        round_trips(r#"source_product = "a\tb\"c""#);
    }
}
