/// Exponents of the base physical dimensions tracked by the unit engine.
///
/// Order: length, mass, time, temperature, amount-of-substance, angle.
/// Angle is kept as its own base dimension (rather than folded into
/// dimensionless) so that `deg`/`rad` never silently compare compatible
/// with a plain ratio unit such as `1` or `ppmv` — mirroring the way the
/// source groups units into named categories (`HARP_UNIT_ANGLE`,
/// `HARP_UNIT_DIMENSIONLESS`, ...) instead of doing blind dimensional
/// analysis.
pub type DimVec = [i8; 6];

pub const LENGTH: usize = 0;
pub const MASS: usize = 1;
pub const TIME: usize = 2;
pub const TEMPERATURE: usize = 3;
pub const SUBSTANCE: usize = 4;
pub const ANGLE: usize = 5;

pub const DIMENSIONLESS: DimVec = [0; 6];

pub fn add(a: DimVec, b: DimVec) -> DimVec {
    let mut out = [0i8; 6];
    for i in 0..6 {
        out[i] = a[i] + b[i];
    }
    out
}

pub fn scale(a: DimVec, n: i8) -> DimVec {
    let mut out = [0i8; 6];
    for i in 0..6 {
        out[i] = a[i] * n;
    }
    out
}

pub fn negate(a: DimVec) -> DimVec {
    scale(a, -1)
}
