//! The HARP action DSL: a small filter/transform language that operates
//! on an in-memory [`harp_product::Product`].
//!
//! The pipeline mirrors a classic compiler front end — [`lexer`] produces
//! an offset-tagged token stream, [`parser`] builds an [`ast::ActionAst`],
//! [`analyzer`] lowers that AST to a closed set of typed [`action::Action`]
//! records, and [`executor`] applies those records to a product. [`pretty`]
//! inverts the parser for the round-trip property tests rely on.
//!
//! ```
//! use harp_action::{analyze, execute, parse, ExecutionContext};
//! use harp_product::{DimensionType::Time, Product, Variable, VariableData};
//!
//! let mut product = Product::new("TEST001");
//! product
//!     .add_variable(
//!         Variable::new("temperature", VariableData::Float64(vec![250.0, 290.0]), vec![(Time, 2)])
//!             .unwrap()
//!             .with_unit("K"),
//!     )
//!     .unwrap();
//!
//! let ast = parse("temperature >= 260 [K]").unwrap();
//! let actions = analyze(&ast).unwrap();
//! execute(&mut product, &actions, &ExecutionContext::new()).unwrap();
//! assert_eq!(product.get("temperature").unwrap().data(), &VariableData::Float64(vec![290.0]));
//! ```

mod action;
mod analyzer;
mod ast;
mod error;
mod executor;
mod lexer;
mod parser;
mod pretty;

pub use action::{Action, ActionList, BitMaskOp, ComparisonOp, EqualityOp, MembershipOp, Side};
pub use analyzer::analyze;
pub use ast::ActionAst;
pub use error::{ActionError, Result, ScriptError, SyntaxError};
pub use executor::{apply as execute, AreaMaskProvider, CollocationIndex, ExecutionContext};
pub use parser::parse;
pub use pretty::print;
