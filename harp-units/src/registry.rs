//! Static tables of recognised unit atoms.
//!
//! Two kinds of entry exist: fully-named atoms that never take a metric
//! prefix (`deg`, `atm`, `molec`, ...) and prefixable roots (`m`, `g`, `s`,
//! `Pa`, ...) that combine with an SI prefix (`k`, `h`, `m`, `u`, ...).
//! A bare numeral string is matched against the full-name table first so
//! that e.g. `mol` is never mistaken for the prefix `m` applied to `ol`.

use crate::dimension::*;

pub struct Atom {
    pub name: &'static str,
    pub dims: DimVec,
    pub scale: f64,
}

// Named atoms, matched verbatim before prefix decomposition is attempted.
pub const NAMED_ATOMS: &[Atom] = &[
    Atom { name: "1", dims: DIMENSIONLESS, scale: 1.0 },
    Atom { name: "%", dims: DIMENSIONLESS, scale: 1e-2 },
    Atom { name: "ppmv", dims: DIMENSIONLESS, scale: 1e-6 },
    Atom { name: "ppbv", dims: DIMENSIONLESS, scale: 1e-9 },
    Atom { name: "pptv", dims: DIMENSIONLESS, scale: 1e-12 },
    Atom { name: "rad", dims: [0, 0, 0, 0, 0, 1], scale: 1.0 },
    Atom { name: "deg", dims: [0, 0, 0, 0, 0, 1], scale: std::f64::consts::PI / 180.0 },
    Atom { name: "K", dims: [0, 0, 0, 1, 0, 0], scale: 1.0 },
    Atom { name: "mol", dims: [0, 0, 0, 0, 1, 0], scale: 1.0 },
    // A bare dimensionless count, not a substance amount: "molec/cm3" must
    // convert to "m-3" directly, the way number-density variables carry it.
    Atom { name: "molec", dims: DIMENSIONLESS, scale: 1.0 },
    Atom { name: "atm", dims: [-1, 1, -2, 0, 0, 0], scale: 101_325.0 },
    Atom { name: "bar", dims: [-1, 1, -2, 0, 0, 0], scale: 100_000.0 },
    Atom { name: "mbar", dims: [-1, 1, -2, 0, 0, 0], scale: 100.0 },
    Atom { name: "Pa", dims: [-1, 1, -2, 0, 0, 0], scale: 1.0 },
    Atom { name: "Hz", dims: [0, 0, -1, 0, 0, 0], scale: 1.0 },
    Atom { name: "N", dims: [1, 1, -2, 0, 0, 0], scale: 1.0 },
    Atom { name: "J", dims: [2, 1, -2, 0, 0, 0], scale: 1.0 },
    Atom { name: "W", dims: [2, 1, -3, 0, 0, 0], scale: 1.0 },
    Atom { name: "sr", dims: DIMENSIONLESS, scale: 1.0 },
    Atom { name: "s", dims: [0, 0, 1, 0, 0, 0], scale: 1.0 },
    Atom { name: "min", dims: [0, 0, 1, 0, 0, 0], scale: 60.0 },
    Atom { name: "hour", dims: [0, 0, 1, 0, 0, 0], scale: 3_600.0 },
    Atom { name: "day", dims: [0, 0, 1, 0, 0, 0], scale: 86_400.0 },
    Atom { name: "m", dims: [1, 0, 0, 0, 0, 0], scale: 1.0 },
    Atom { name: "g", dims: [0, 1, 0, 0, 0, 0], scale: 1e-3 },
];

// Roots that additionally combine with a metric prefix (`km`, `hPa`, `ug`, ...).
pub const PREFIXABLE_ROOTS: &[Atom] = &[
    Atom { name: "m", dims: [1, 0, 0, 0, 0, 0], scale: 1.0 },
    Atom { name: "g", dims: [0, 1, 0, 0, 0, 0], scale: 1e-3 },
    Atom { name: "s", dims: [0, 0, 1, 0, 0, 0], scale: 1.0 },
    Atom { name: "Pa", dims: [-1, 1, -2, 0, 0, 0], scale: 1.0 },
    Atom { name: "Hz", dims: [0, 0, -1, 0, 0, 0], scale: 1.0 },
    Atom { name: "mol", dims: [0, 0, 0, 0, 1, 0], scale: 1.0 },
    Atom { name: "J", dims: [2, 1, -2, 0, 0, 0], scale: 1.0 },
    Atom { name: "W", dims: [2, 1, -3, 0, 0, 0], scale: 1.0 },
    Atom { name: "N", dims: [1, 1, -2, 0, 0, 0], scale: 1.0 },
];

pub struct Prefix {
    pub symbol: &'static str,
    pub factor: f64,
}

// Longest symbol first so "da" is tried before "d".
pub const PREFIXES: &[Prefix] = &[
    Prefix { symbol: "da", factor: 1e1 },
    Prefix { symbol: "k", factor: 1e3 },
    Prefix { symbol: "M", factor: 1e6 },
    Prefix { symbol: "G", factor: 1e9 },
    Prefix { symbol: "T", factor: 1e12 },
    Prefix { symbol: "h", factor: 1e2 },
    Prefix { symbol: "d", factor: 1e-1 },
    Prefix { symbol: "c", factor: 1e-2 },
    Prefix { symbol: "m", factor: 1e-3 },
    Prefix { symbol: "u", factor: 1e-6 },
    Prefix { symbol: "n", factor: 1e-9 },
    Prefix { symbol: "p", factor: 1e-12 },
];

pub fn lookup_named(name: &str) -> Option<&'static Atom> {
    NAMED_ATOMS.iter().find(|a| a.name == name)
}

/// Try every prefix/root split, longest prefix first, and return the
/// combined (dims, scale) for the root scaled by the prefix factor.
pub fn lookup_prefixed(token: &str) -> Option<(DimVec, f64)> {
    for prefix in PREFIXES {
        if let Some(root_name) = token.strip_prefix(prefix.symbol) {
            if root_name.is_empty() {
                continue;
            }
            if let Some(root) = PREFIXABLE_ROOTS.iter().find(|a| a.name == root_name) {
                return Some((root.dims, root.scale * prefix.factor));
            }
        }
    }
    None
}
