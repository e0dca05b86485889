//! Parse tree for the action DSL (§4.5 of the grammar).
//!
//! Every leaf that can appear in a diagnostic or needs reproducing by the
//! pretty-printer carries the byte offset it was lexed at. `PartialEq` is
//! implemented by hand to ignore those offsets, since the round-trip
//! property (§8) only promises the *re-parsed* AST is equal "up to
//! whitespace" — and whitespace is exactly what shifts offsets.

#[derive(Debug, Clone)]
pub struct NumberLit {
    pub value: f64,
    pub offset: usize,
}

impl PartialEq for NumberLit {
    fn eq(&self, other: &Self) -> bool {
        self.value == other.value
    }
}

#[derive(Debug, Clone)]
pub struct StringLit {
    pub value: String,
    pub offset: usize,
}

impl PartialEq for StringLit {
    fn eq(&self, other: &Self) -> bool {
        self.value == other.value
    }
}

#[derive(Debug, Clone)]
pub struct UnitLit {
    pub text: String,
    pub offset: usize,
}

impl PartialEq for UnitLit {
    fn eq(&self, other: &Self) -> bool {
        self.text == other.text
    }
}

#[derive(Debug, Clone)]
pub struct NameLit {
    pub text: String,
    pub offset: usize,
}

impl PartialEq for NameLit {
    fn eq(&self, other: &Self) -> bool {
        self.text == other.text
    }
}

/// `Name (`{` dim_list `}`)? Unit?`
#[derive(Debug, Clone, PartialEq)]
pub struct QualifiedName {
    pub name: NameLit,
    pub dims: Option<Vec<NameLit>>,
    pub unit: Option<UnitLit>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Literal {
    Number(NumberLit),
    String(StringLit),
}

#[derive(Debug, Clone, PartialEq)]
pub enum Argument {
    String(StringLit),
    QualifiedName(QualifiedName),
    Quantity(NumberLit, Option<UnitLit>),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompareOp {
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MembershipOp {
    In,
    NotIn,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BitMaskOp {
    AllBitsSet,
    NoBitSet,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ComparisonRhs {
    String(StringLit),
    QualifiedName(QualifiedName),
    Quantity(NumberLit, Option<UnitLit>),
}

#[derive(Debug, Clone, PartialEq)]
pub enum Statement {
    FunctionCall {
        name: NameLit,
        args: Vec<Argument>,
    },
    MembershipTest {
        var: NameLit,
        op: MembershipOp,
        literals: Vec<Literal>,
        unit: Option<UnitLit>,
    },
    BitMaskTest {
        var: NameLit,
        op: BitMaskOp,
        mask: NumberLit,
    },
    Comparison {
        var: NameLit,
        op: CompareOp,
        rhs: ComparisonRhs,
    },
}

/// A full parsed action list: an ordered sequence of statements.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ActionAst {
    pub statements: Vec<Statement>,
}
