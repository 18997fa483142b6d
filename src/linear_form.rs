//! Linear forms `±v1 ± v2 ± ... + [lo, hi]` over unit coefficients.
//!
//! Relational domains only reason about expressions of this shape. Anything else
//! (products of variables, division, a variable with coefficient other than `±1`)
//! is reported as [`AnalysisError::NotLinear`].

use std::collections::BTreeMap;
use std::fmt;
use std::ops::Neg;

use num_bigint::BigInt;
use num_traits::{One, Signed, Zero};

use crate::error::{AnalysisError, Result};
use crate::expr::{BinaryArithmeticOp, ComparisonOp, Expression, UnaryArithmeticOp, Variable};
use crate::interval::Interval;

/// Coefficient of a variable in a [`LinearForm`].
#[derive(Debug, Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub enum Sign {
    Plus,
    Minus,
}

impl Neg for Sign {
    type Output = Sign;

    fn neg(self) -> Self::Output {
        match self {
            Sign::Plus => Sign::Minus,
            Sign::Minus => Sign::Plus,
        }
    }
}

#[derive(Debug, Clone, Eq, PartialEq)]
pub struct LinearForm {
    terms: BTreeMap<Variable, Sign>,
    constant: Interval,
}

impl LinearForm {
    pub fn constant(value: Interval) -> Self {
        LinearForm {
            terms: BTreeMap::new(),
            constant: value,
        }
    }

    pub fn variable(variable: Variable) -> Self {
        LinearForm {
            terms: BTreeMap::from([(variable, Sign::Plus)]),
            constant: Interval::constant(0),
        }
    }

    /// Extracts the linear form of an arithmetic expression. `input()` becomes the constant `[-∞, +∞]`.
    pub fn from_expression(expr: &Expression) -> Result<Self> {
        let not_linear = || AnalysisError::NotLinear {
            expression: expr.to_string(),
        };
        match expr {
            Expression::Literal(value) => Ok(LinearForm::constant(Interval::constant(value.clone()))),
            Expression::Input => Ok(LinearForm::constant(Interval::full())),
            Expression::Variable(v) => Ok(LinearForm::variable(v.clone())),
            Expression::UnaryArithmetic(UnaryArithmeticOp::Plus, e) => LinearForm::from_expression(e),
            Expression::UnaryArithmetic(UnaryArithmeticOp::Minus, e) => Ok(-LinearForm::from_expression(e)?),
            Expression::BinaryArithmetic(l, op, r) => {
                let l = LinearForm::from_expression(l)?;
                let r = LinearForm::from_expression(r)?;
                match op {
                    BinaryArithmeticOp::Add => l.add(r).ok_or_else(not_linear),
                    BinaryArithmeticOp::Sub => l.add(-r).ok_or_else(not_linear),
                    BinaryArithmeticOp::Mult => {
                        if l.is_constant() {
                            r.scale(&l.constant).ok_or_else(not_linear)
                        } else if r.is_constant() {
                            l.scale(&r.constant).ok_or_else(not_linear)
                        } else {
                            Err(not_linear())
                        }
                    }
                    BinaryArithmeticOp::Div => Err(not_linear()),
                }
            }
            Expression::BinaryComparison(..) | Expression::Not(_) | Expression::BinaryBoolean(..) => Err(not_linear()),
        }
    }

    /// Translates `left op right` into forms that must all be `<= 0`.
    ///
    /// Strict comparisons are tightened by one. A disequality yields no constraint unless
    /// both sides are the same constant, in which case the unsatisfiable `1 <= 0` is returned.
    pub fn comparison(left: &Expression, op: ComparisonOp, right: &Expression) -> Result<Vec<LinearForm>> {
        let left = LinearForm::from_expression(left)?;
        let right = LinearForm::from_expression(right)?;
        let not_linear = || AnalysisError::NotLinear {
            expression: format!("{} - ({})", left, right),
        };
        let difference = left.clone().add(-right.clone()).ok_or_else(not_linear)?;
        let one = Interval::constant(1);
        Ok(match op {
            ComparisonOp::Lt => vec![difference.offset(&one)],
            ComparisonOp::LtE => vec![difference],
            ComparisonOp::Gt => vec![(-difference).offset(&one)],
            ComparisonOp::GtE => vec![-difference],
            ComparisonOp::Eq => vec![difference.clone(), -difference],
            ComparisonOp::NotEq => {
                let zero = BigInt::zero();
                if difference.is_constant() && difference.constant.as_constant() == Some(&zero) {
                    vec![LinearForm::constant(one)]
                } else {
                    vec![]
                }
            }
        })
    }

    /// Adds `value` to the constant part.
    pub fn offset(mut self, value: &Interval) -> LinearForm {
        self.constant = self.constant.add(value);
        self
    }

    pub fn terms(&self) -> impl Iterator<Item = (&Variable, Sign)> {
        self.terms.iter().map(|(v, &s)| (v, s))
    }

    pub fn num_terms(&self) -> usize {
        self.terms.len()
    }

    pub fn is_constant(&self) -> bool {
        self.terms.is_empty()
    }

    pub fn constant_part(&self) -> &Interval {
        &self.constant
    }

    /// Sum of two forms, or `None` if a variable would end up with coefficient `±2`.
    pub fn add(mut self, other: LinearForm) -> Option<LinearForm> {
        for (variable, sign) in other.terms {
            match self.terms.get(&variable) {
                None => {
                    self.terms.insert(variable, sign);
                }
                Some(&existing) if existing != sign => {
                    self.terms.remove(&variable);
                }
                Some(_) => return None,
            }
        }
        self.constant = self.constant.add(&other.constant);
        Some(self)
    }

    /// Product with a constant. Only `0` and `±1` keep variables linear.
    fn scale(self, factor: &Interval) -> Option<LinearForm> {
        if self.is_constant() {
            return Some(LinearForm::constant(self.constant.mult(factor)));
        }
        let value = factor.as_constant()?;
        if value.is_zero() {
            Some(LinearForm::constant(Interval::constant(0)))
        } else if value.abs().is_one() {
            Some(if value.is_negative() { -self } else { self })
        } else {
            None
        }
    }

    /// Upper bound of the constant part, when finite.
    pub fn constant_upper(&self) -> Option<&BigInt> {
        self.constant.upper().and_then(|b| b.as_finite())
    }

    /// Lower bound of the constant part, when finite.
    pub fn constant_lower(&self) -> Option<&BigInt> {
        self.constant.lower().and_then(|b| b.as_finite())
    }
}

impl Neg for LinearForm {
    type Output = LinearForm;

    fn neg(self) -> Self::Output {
        LinearForm {
            terms: self.terms.into_iter().map(|(v, s)| (v, -s)).collect(),
            constant: self.constant.negate(),
        }
    }
}

impl fmt::Display for LinearForm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, (variable, sign)) in self.terms().enumerate() {
            match (i, sign) {
                (0, Sign::Plus) => write!(f, "{}", variable)?,
                (0, Sign::Minus) => write!(f, "-{}", variable)?,
                (_, Sign::Plus) => write!(f, " + {}", variable)?,
                (_, Sign::Minus) => write!(f, " - {}", variable)?,
            }
        }
        if self.is_constant() {
            write!(f, "{}", self.constant)
        } else {
            write!(f, " + {}", self.constant)
        }
    }
}

#[cfg(test)]
mod tests {
    use test_log::test;

    use super::*;

    fn x() -> Expression {
        Expression::var("x")
    }

    fn y() -> Expression {
        Expression::var("y")
    }

    #[test]
    fn test_difference() {
        let form = LinearForm::from_expression(&(x() - y() + Expression::literal(3))).unwrap();
        let terms: Vec<_> = form.terms().map(|(v, s)| (v.name().to_string(), s)).collect();
        assert_eq!(terms, vec![("x".to_string(), Sign::Plus), ("y".to_string(), Sign::Minus)]);
        assert_eq!(form.constant_part(), &Interval::constant(3));
        assert_eq!(form.to_string(), "x - y + [3, 3]");
    }

    #[test]
    fn test_unit_products() {
        let form = LinearForm::from_expression(&(Expression::literal(-1) * x())).unwrap();
        assert_eq!(form, -LinearForm::variable(Variable::from("x")));

        let form = LinearForm::from_expression(&(Expression::literal(2) * Expression::literal(3) + x())).unwrap();
        assert_eq!(form.constant_part(), &Interval::constant(6));

        let form = LinearForm::from_expression(&(Expression::literal(0) * x())).unwrap();
        assert!(form.is_constant());
    }

    #[test]
    fn test_cancellation() {
        let form = LinearForm::from_expression(&(x() - x() + y())).unwrap();
        assert_eq!(form.num_terms(), 1);
    }

    #[test]
    fn test_not_linear() {
        for expr in [
            x() + x(),
            Expression::literal(2) * x(),
            x() * y(),
            Expression::arith(x(), BinaryArithmeticOp::Div, Expression::literal(2)),
        ] {
            assert!(matches!(
                LinearForm::from_expression(&expr),
                Err(AnalysisError::NotLinear { .. })
            ));
        }
    }

    #[test]
    fn test_comparisons() {
        let forms = LinearForm::comparison(&x(), ComparisonOp::Lt, &Expression::literal(10)).unwrap();
        assert_eq!(forms.len(), 1);
        assert_eq!(forms[0].to_string(), "x + [-9, -9]");

        let forms = LinearForm::comparison(&x(), ComparisonOp::GtE, &y()).unwrap();
        assert_eq!(forms[0].to_string(), "-x + y + [0, 0]");

        let forms = LinearForm::comparison(&x(), ComparisonOp::Eq, &y()).unwrap();
        assert_eq!(forms.len(), 2);

        assert!(LinearForm::comparison(&x(), ComparisonOp::NotEq, &y()).unwrap().is_empty());
        let forms = LinearForm::comparison(&Expression::literal(2), ComparisonOp::NotEq, &Expression::literal(2)).unwrap();
        assert_eq!(forms, vec![LinearForm::constant(Interval::constant(1))]);
    }

    #[test]
    fn test_input_is_unbounded() {
        let form = LinearForm::from_expression(&(x() + Expression::Input)).unwrap();
        assert_eq!(form.constant_part(), &Interval::full());
        assert_eq!(form.constant_upper(), None);
    }
}
