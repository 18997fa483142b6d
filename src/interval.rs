//! Interval abstract domain.
//!
//! An [`Interval`] `[lo, hi]` over arbitrary-precision integers, where either end may be
//! infinite. Empty ranges are normalized to a single canonical Bottom element.

use std::cmp::{max, min};
use std::fmt;
use std::ops::Neg;

use num_bigint::BigInt;
use num_traits::{Signed, Zero};

use crate::error::{AnalysisError, Result};
use crate::expr::{BinaryArithmeticOp, Expression, UnaryArithmeticOp, Variable};
use crate::lattice::Lattice;

/// An interval bound: a finite integer or one of the two infinities.
///
/// The derived order is `-∞ < Finite(_) < +∞`, with finite bounds ordered by value.
#[derive(Debug, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub enum Bound {
    NegInf,
    Finite(BigInt),
    PosInf,
}

impl Bound {
    pub fn finite(value: impl Into<BigInt>) -> Self {
        Bound::Finite(value.into())
    }

    pub fn zero() -> Self {
        Bound::Finite(BigInt::zero())
    }

    pub fn is_finite(&self) -> bool {
        matches!(self, Bound::Finite(_))
    }

    pub fn as_finite(&self) -> Option<&BigInt> {
        match self {
            Bound::Finite(v) => Some(v),
            _ => None,
        }
    }

    /// Sum of two bounds, with `-∞ + +∞` resolved to `mixed`.
    fn add_resolving(&self, other: &Bound, mixed: Bound) -> Bound {
        match (self, other) {
            (Bound::Finite(a), Bound::Finite(b)) => Bound::Finite(a + b),
            (Bound::NegInf, Bound::PosInf) | (Bound::PosInf, Bound::NegInf) => mixed,
            (Bound::NegInf, _) | (_, Bound::NegInf) => Bound::NegInf,
            _ => Bound::PosInf,
        }
    }

    /// Sum rounded towards `-∞`, suitable for lower bounds.
    pub fn add_lower(&self, other: &Bound) -> Bound {
        self.add_resolving(other, Bound::NegInf)
    }

    /// Sum rounded towards `+∞`, suitable for upper bounds.
    pub fn add_upper(&self, other: &Bound) -> Bound {
        self.add_resolving(other, Bound::PosInf)
    }

    fn signum(&self) -> i8 {
        match self {
            Bound::NegInf => -1,
            Bound::PosInf => 1,
            Bound::Finite(v) if v.is_zero() => 0,
            Bound::Finite(v) if v.is_negative() => -1,
            Bound::Finite(_) => 1,
        }
    }

    /// Product of two bounds, with `0 · ∞ = 0`.
    pub fn mul(&self, other: &Bound) -> Bound {
        match (self, other) {
            (Bound::Finite(a), Bound::Finite(b)) => Bound::Finite(a * b),
            _ => match self.signum() * other.signum() {
                0 => Bound::zero(),
                s if s > 0 => Bound::PosInf,
                _ => Bound::NegInf,
            },
        }
    }
}

impl Neg for Bound {
    type Output = Bound;

    fn neg(self) -> Self::Output {
        match self {
            Bound::NegInf => Bound::PosInf,
            Bound::Finite(v) => Bound::Finite(-v),
            Bound::PosInf => Bound::NegInf,
        }
    }
}

impl From<i64> for Bound {
    fn from(value: i64) -> Self {
        Bound::finite(value)
    }
}

impl fmt::Display for Bound {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Bound::NegInf => write!(f, "-∞"),
            Bound::Finite(v) => write!(f, "{}", v),
            Bound::PosInf => write!(f, "+∞"),
        }
    }
}

/// A (possibly unbounded) integer range.
///
/// # Invariants
///
/// Either `lower <= upper`, or the interval is the canonical empty interval
/// (`lower = +∞`, `upper = -∞`), which is the Bottom element.
#[derive(Debug, Clone, Eq, PartialEq, Hash)]
pub struct Interval {
    lower: Bound,
    upper: Bound,
}

impl Default for Interval {
    fn default() -> Self {
        Interval::full()
    }
}

impl Interval {
    /// Creates the interval `[lower, upper]`, or Bottom when `lower > upper`.
    pub fn new(lower: Bound, upper: Bound) -> Self {
        if lower > upper || lower == Bound::PosInf || upper == Bound::NegInf {
            Interval::empty()
        } else {
            Interval { lower, upper }
        }
    }

    pub fn range(lower: impl Into<BigInt>, upper: impl Into<BigInt>) -> Self {
        Interval::new(Bound::finite(lower), Bound::finite(upper))
    }

    pub fn constant(value: impl Into<BigInt>) -> Self {
        let value = value.into();
        Interval::new(Bound::Finite(value.clone()), Bound::Finite(value))
    }

    pub fn at_least(lower: impl Into<BigInt>) -> Self {
        Interval::new(Bound::finite(lower), Bound::PosInf)
    }

    pub fn at_most(upper: impl Into<BigInt>) -> Self {
        Interval::new(Bound::NegInf, Bound::finite(upper))
    }

    /// The Bottom element.
    pub fn empty() -> Self {
        Interval {
            lower: Bound::PosInf,
            upper: Bound::NegInf,
        }
    }

    /// The Top element `[-∞, +∞]`.
    pub fn full() -> Self {
        Interval {
            lower: Bound::NegInf,
            upper: Bound::PosInf,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.lower > self.upper
    }

    /// Lower bound, or `None` for the empty interval.
    pub fn lower(&self) -> Option<&Bound> {
        if self.is_empty() {
            None
        } else {
            Some(&self.lower)
        }
    }

    /// Upper bound, or `None` for the empty interval.
    pub fn upper(&self) -> Option<&Bound> {
        if self.is_empty() {
            None
        } else {
            Some(&self.upper)
        }
    }

    /// The single value of a singleton interval.
    pub fn as_constant(&self) -> Option<&BigInt> {
        match (&self.lower, &self.upper) {
            (Bound::Finite(a), Bound::Finite(b)) if a == b => Some(a),
            _ => None,
        }
    }

    pub fn contains(&self, value: &BigInt) -> bool {
        let value = Bound::Finite(value.clone());
        self.lower <= value && value <= self.upper
    }

    pub fn add(&self, other: &Interval) -> Interval {
        if self.is_empty() || other.is_empty() {
            return Interval::empty();
        }
        Interval::new(
            self.lower.add_lower(&other.lower),
            self.upper.add_upper(&other.upper),
        )
    }

    pub fn sub(&self, other: &Interval) -> Interval {
        self.add(&other.negate())
    }

    pub fn mult(&self, other: &Interval) -> Interval {
        if self.is_empty() || other.is_empty() {
            return Interval::empty();
        }
        let corners = [
            self.lower.mul(&other.lower),
            self.lower.mul(&other.upper),
            self.upper.mul(&other.lower),
            self.upper.mul(&other.upper),
        ];
        let lower = corners.iter().min().cloned().unwrap_or(Bound::NegInf);
        let upper = corners.iter().max().cloned().unwrap_or(Bound::PosInf);
        Interval::new(lower, upper)
    }

    pub fn negate(&self) -> Interval {
        if self.is_empty() {
            return Interval::empty();
        }
        Interval::new(-self.upper.clone(), -self.lower.clone())
    }

    fn comparable(&self, other: &Interval) -> Result<()> {
        if self.is_empty() || other.is_empty() {
            Err(AnalysisError::EmptyInterval)
        } else {
            Ok(())
        }
    }

    /// Every value of `self` is strictly smaller than every value of `other`.
    pub fn lt(&self, other: &Interval) -> Result<bool> {
        self.comparable(other)?;
        Ok(self.upper < other.lower)
    }

    /// Every value of `self` is smaller than or equal to every value of `other`.
    pub fn le(&self, other: &Interval) -> Result<bool> {
        self.comparable(other)?;
        Ok(self.upper <= other.lower)
    }

    /// Every value of `self` is strictly greater than every value of `other`.
    pub fn gt(&self, other: &Interval) -> Result<bool> {
        other.lt(self)
    }

    /// Every value of `self` is greater than or equal to every value of `other`.
    pub fn ge(&self, other: &Interval) -> Result<bool> {
        other.le(self)
    }

    /// Evaluates an arithmetic expression without free variables.
    pub fn evaluate(expr: &Expression) -> Result<Interval> {
        Interval::evaluate_with(expr, &|_: &Variable| Err(unsupported(expr)))
    }

    /// Evaluates an arithmetic expression, resolving variables through `lookup`.
    ///
    /// `input()` evaluates to Top. Division, comparisons and boolean operators
    /// are rejected with [`AnalysisError::UnsupportedExpression`].
    pub fn evaluate_with<F>(expr: &Expression, lookup: &F) -> Result<Interval>
    where
        F: Fn(&Variable) -> Result<Interval>,
    {
        match expr {
            Expression::Literal(value) => Ok(Interval::constant(value.clone())),
            Expression::Input => Ok(Interval::full()),
            Expression::Variable(v) => lookup(v),
            Expression::UnaryArithmetic(op, e) => {
                let e = Interval::evaluate_with(e, lookup)?;
                Ok(match op {
                    UnaryArithmeticOp::Plus => e,
                    UnaryArithmeticOp::Minus => e.negate(),
                })
            }
            Expression::BinaryArithmetic(l, op, r) => {
                let l = Interval::evaluate_with(l, lookup)?;
                let r = Interval::evaluate_with(r, lookup)?;
                match op {
                    BinaryArithmeticOp::Add => Ok(l.add(&r)),
                    BinaryArithmeticOp::Sub => Ok(l.sub(&r)),
                    BinaryArithmeticOp::Mult => Ok(l.mult(&r)),
                    BinaryArithmeticOp::Div => Err(unsupported(expr)),
                }
            }
            Expression::BinaryComparison(..) | Expression::Not(_) | Expression::BinaryBoolean(..) => {
                Err(unsupported(expr))
            }
        }
    }
}

fn unsupported(expr: &Expression) -> AnalysisError {
    AnalysisError::UnsupportedExpression {
        domain: "interval",
        expression: expr.to_string(),
    }
}

impl Lattice for Interval {
    fn bottom(&self) -> Self {
        Interval::empty()
    }

    fn top(&self) -> Self {
        Interval::full()
    }

    fn is_bottom(&self) -> bool {
        self.is_empty()
    }

    fn is_top(&self) -> bool {
        self.lower == Bound::NegInf && self.upper == Bound::PosInf
    }

    fn less_equal_default(&self, other: &Self) -> bool {
        other.lower <= self.lower && self.upper <= other.upper
    }

    fn join_default(self, other: Self) -> Self {
        Interval::new(min(self.lower, other.lower), max(self.upper, other.upper))
    }

    fn meet_default(self, other: Self) -> Self {
        Interval::new(max(self.lower, other.lower), min(self.upper, other.upper))
    }

    fn widening_default(self, other: Self) -> Self {
        let lower = if other.lower < self.lower {
            Bound::NegInf
        } else {
            self.lower
        };
        let upper = if other.upper > self.upper {
            Bound::PosInf
        } else {
            self.upper
        };
        Interval::new(lower, upper)
    }
}

impl fmt::Display for Interval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_empty() {
            write!(f, "⊥")
        } else {
            write!(f, "[{}, {}]", self.lower, self.upper)
        }
    }
}

#[cfg(test)]
mod tests {
    use test_log::test;

    use super::*;
    use crate::lattice::tests::check_lattice_axioms;

    fn lit(v: i64) -> Expression {
        Expression::literal(v)
    }

    #[test]
    fn test_empty_is_canonical() {
        assert_eq!(Interval::range(3, 1), Interval::empty());
        assert_eq!(Interval::range(0, 1).meet(Interval::range(5, 6)), Interval::empty());
        assert!(Interval::range(3, 1).is_bottom());
        assert_eq!(Interval::range(3, 1).lower(), None);
    }

    #[test]
    fn test_arithmetic() {
        let a = Interval::range(1, 3);
        let b = Interval::range(-2, 5);
        assert_eq!(a.add(&b), Interval::range(-1, 8));
        assert_eq!(a.sub(&b), Interval::range(-4, 5));
        assert_eq!(a.mult(&b), Interval::range(-6, 15));
        assert_eq!(b.negate(), Interval::range(-5, 2));
        assert!(a.add(&Interval::empty()).is_bottom());
    }

    #[test]
    fn test_arithmetic_unbounded() {
        let pos = Interval::at_least(1);
        let neg = Interval::at_most(-1);
        assert_eq!(pos.mult(&neg), Interval::at_most(-1));
        assert_eq!(Interval::constant(0).mult(&Interval::full()), Interval::constant(0));
        assert_eq!(pos.add(&neg), Interval::full());
        assert_eq!(pos.negate(), Interval::at_most(-1));
    }

    #[test]
    fn test_lattice_operations() {
        let a = Interval::range(0, 2);
        let b = Interval::range(1, 5);
        assert_eq!(a.clone().join(b.clone()), Interval::range(0, 5));
        assert_eq!(a.clone().meet(b.clone()), Interval::range(1, 2));
        assert!(a.less_equal(&Interval::range(-1, 2)));
        assert!(!a.less_equal(&b));
        assert!(Interval::empty().less_equal(&a));
        assert!(Interval::full().is_top());
    }

    #[test]
    fn test_widening() {
        let old = Interval::range(0, 1);
        assert_eq!(old.clone().widening(Interval::range(0, 2)), Interval::at_least(0));
        assert_eq!(old.clone().widening(Interval::range(-1, 1)), Interval::at_most(1));
        assert_eq!(old.clone().widening(Interval::range(0, 1)), old);
        assert_eq!(old.clone().widening(Interval::range(-3, 3)), Interval::full());
    }

    #[test]
    fn test_lattice_axioms() {
        check_lattice_axioms(&[
            Interval::empty(),
            Interval::full(),
            Interval::constant(0),
            Interval::range(-3, 2),
            Interval::range(1, 4),
            Interval::at_least(2),
            Interval::at_most(-1),
        ]);
    }

    #[test]
    fn test_comparisons() {
        assert_eq!(Interval::range(0, 2).lt(&Interval::range(3, 4)), Ok(true));
        assert_eq!(Interval::range(0, 2).lt(&Interval::range(2, 4)), Ok(false));
        assert_eq!(Interval::range(0, 2).le(&Interval::range(2, 4)), Ok(true));
        assert_eq!(Interval::range(3, 4).gt(&Interval::range(0, 2)), Ok(true));
        assert_eq!(Interval::range(2, 4).ge(&Interval::range(0, 2)), Ok(true));
        assert_eq!(
            Interval::range(0, 2).lt(&Interval::empty()),
            Err(AnalysisError::EmptyInterval)
        );
        assert_eq!(
            Interval::empty().ge(&Interval::range(0, 2)),
            Err(AnalysisError::EmptyInterval)
        );
    }

    #[test]
    fn test_evaluate_constant_expressions() {
        let e = lit(3) * (lit(2) + lit(5));
        assert_eq!(Interval::evaluate(&e), Ok(Interval::constant(21)));
        let e = (lit(3) + lit(3)) * (lit(2) + lit(5));
        assert_eq!(Interval::evaluate(&e), Ok(Interval::constant(42)));
        let e = lit(3) - (lit(2) + lit(5));
        assert_eq!(Interval::evaluate(&e), Ok(Interval::constant(-4)));
        assert_eq!(Interval::evaluate(&-lit(7)), Ok(Interval::constant(-7)));
        assert_eq!(Interval::evaluate(&Expression::Input), Ok(Interval::full()));
    }

    #[test]
    fn test_evaluate_unsupported() {
        let div = Expression::arith(lit(4), BinaryArithmeticOp::Div, lit(2));
        assert!(matches!(
            Interval::evaluate(&div),
            Err(AnalysisError::UnsupportedExpression { domain: "interval", .. })
        ));
        assert!(Interval::evaluate(&Expression::var("x")).is_err());
        assert!(Interval::evaluate(&Expression::and(lit(1), lit(0))).is_err());
    }

    #[test]
    fn test_evaluate_with_lookup() {
        let lookup = |v: &Variable| -> Result<Interval> {
            match v.name() {
                "x" => Ok(Interval::range(1, 2)),
                _ => Ok(Interval::full()),
            }
        };
        let e = Expression::var("x") * lit(10) + lit(1);
        assert_eq!(Interval::evaluate_with(&e, &lookup), Ok(Interval::range(11, 21)));
    }

    #[test]
    fn test_display() {
        assert_eq!(Interval::range(-1, 3).to_string(), "[-1, 3]");
        assert_eq!(Interval::at_least(0).to_string(), "[0, +∞]");
        assert_eq!(Interval::empty().to_string(), "⊥");
    }
}
