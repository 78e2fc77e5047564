//! Arbitrary-precision decimal value and its shared context (spec §3, §5).
//!
//! Backed by `rust_decimal` (see `DESIGN.md` for the dependency note).
//! `DecimalCtx` plays the role of the `decimal_ctx` spec §5 says belongs to
//! `EvalContext`: a single configuration (rounding/precision) every decimal
//! operation reads from, never shared across threads without an external
//! mutex.

use rust_decimal::Decimal as RdDecimal;
use rust_decimal::RoundingStrategy;
use std::rc::Rc;

/// Rounding/precision policy shared by every decimal operation run against
/// one [`EvalContext`](crate::context::EvalContext).
#[derive(Debug, Clone, Copy)]
pub struct DecimalCtx {
    pub scale: u32,
    pub rounding: RoundingStrategy,
}

impl Default for DecimalCtx {
    fn default() -> Self {
        DecimalCtx {
            scale: 28,
            rounding: RoundingStrategy::MidpointNearestEven,
        }
    }
}

/// A heap-owned, ref-counted decimal value.
///
/// `Rc` gives the ref-count spec §3 requires directly; decimals carry no
/// interior mutability so sharing the `Rc` is always sound.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct LambdaDecimal(Rc<RdDecimal>);

impl LambdaDecimal {
    pub fn new(value: RdDecimal) -> Self {
        LambdaDecimal(Rc::new(value))
    }

    pub fn inner(&self) -> RdDecimal {
        *self.0
    }

    pub fn ref_count(&self) -> usize {
        Rc::strong_count(&self.0)
    }

    /// Parses a decimal from its canonical string form, as used by the
    /// FLOAT→DECIMAL promotion path (spec §4.4.3: "via string round-trip").
    pub fn parse(s: &str) -> Option<Self> {
        RdDecimal::from_str_exact(s).ok().map(Self::new)
    }

    /// FLOAT/DECIMAL round-trip conversion (spec §4.4.3, §8 round-trip law).
    pub fn from_f64(ctx: &DecimalCtx, v: f64) -> Option<Self> {
        if !v.is_finite() {
            return None;
        }
        let raw = RdDecimal::from_str_exact(&format!("{v}")).ok()?;
        Some(Self::new(clamp_scale(raw, ctx)))
    }

    pub fn to_f64(&self) -> Option<f64> {
        use rust_decimal::prelude::ToPrimitive;
        self.0.to_f64()
    }

    pub fn add(&self, other: &Self, ctx: &DecimalCtx) -> Option<Self> {
        self.checked_op(other, ctx, |a, b| a.checked_add(b))
    }

    pub fn sub(&self, other: &Self, ctx: &DecimalCtx) -> Option<Self> {
        self.checked_op(other, ctx, |a, b| a.checked_sub(b))
    }

    pub fn mul(&self, other: &Self, ctx: &DecimalCtx) -> Option<Self> {
        self.checked_op(other, ctx, |a, b| a.checked_mul(b))
    }

    pub fn div(&self, other: &Self, ctx: &DecimalCtx) -> Option<Self> {
        if other.0.is_zero() {
            return None;
        }
        self.checked_op(other, ctx, |a, b| a.checked_div(b))
    }

    fn checked_op(
        &self,
        other: &Self,
        ctx: &DecimalCtx,
        f: impl Fn(RdDecimal, RdDecimal) -> Option<RdDecimal>,
    ) -> Option<Self> {
        let raw = f(*self.0, *other.0)?;
        Some(Self::new(clamp_scale(raw, ctx)))
    }
}

/// Caps a result's scale at `ctx.scale`, rounding with `ctx.rounding` only
/// when the natural result is *more* precise than the cap. `round_dp` always
/// normalizes to exactly its target scale (zero-padding a less precise value
/// rather than leaving it alone), so a result already within the cap must be
/// returned untouched or every sum would sprout trailing zeros out to
/// `ctx.scale` places.
fn clamp_scale(raw: RdDecimal, ctx: &DecimalCtx) -> RdDecimal {
    if raw.scale() > ctx.scale {
        raw.round_dp_with_strategy(ctx.scale, ctx.rounding)
    } else {
        raw
    }
}

impl std::fmt::Display for LambdaDecimal {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_and_display_round_trip() {
        let d = LambdaDecimal::parse("3.1400").unwrap();
        assert_eq!(d.to_string(), "3.1400");
    }

    #[test]
    fn arithmetic_uses_shared_ctx() {
        let ctx = DecimalCtx::default();
        let a = LambdaDecimal::parse("1.5").unwrap();
        let b = LambdaDecimal::parse("2.25").unwrap();
        let sum = a.add(&b, &ctx).unwrap();
        assert_eq!(sum.to_string(), "3.75");
    }

    #[test]
    fn divide_by_zero_is_none() {
        let ctx = DecimalCtx::default();
        let a = LambdaDecimal::parse("1").unwrap();
        let zero = LambdaDecimal::parse("0").unwrap();
        assert!(a.div(&zero, &ctx).is_none());
    }

    #[test]
    fn float_round_trip_within_precision() {
        let ctx = DecimalCtx::default();
        let d = LambdaDecimal::from_f64(&ctx, 2.5).unwrap();
        assert_eq!(d.to_f64(), Some(2.5));
    }

    #[test]
    fn ref_count_tracks_clones() {
        let d = LambdaDecimal::parse("1").unwrap();
        let d2 = d.clone();
        assert_eq!(d.ref_count(), 2);
        drop(d2);
        assert_eq!(d.ref_count(), 1);
    }
}
