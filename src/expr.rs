//! Program expressions.
//!
//! Expressions are produced by the statement semantics (see [`semantics`][crate::semantics])
//! and consumed by the abstract domains, which interpret them in their own way.

use std::collections::BTreeSet;
use std::fmt;
use std::ops::{Add, Mul, Neg, Not, Sub};

use num_bigint::BigInt;

/// A program variable, identified by its name.
#[derive(Debug, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct Variable(String);

impl Variable {
    pub fn new(name: impl Into<String>) -> Self {
        Variable(name.into())
    }

    pub fn name(&self) -> &str {
        &self.0
    }
}

impl From<&str> for Variable {
    fn from(name: &str) -> Self {
        Variable::new(name)
    }
}

impl fmt::Display for Variable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub enum UnaryArithmeticOp {
    Plus,
    Minus,
}

#[derive(Debug, Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub enum BinaryArithmeticOp {
    Add,
    Sub,
    Mult,
    Div,
}

#[derive(Debug, Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub enum ComparisonOp {
    Eq,
    NotEq,
    Lt,
    LtE,
    Gt,
    GtE,
}

impl ComparisonOp {
    /// The operator `op'` such that `!(a op b)` is `a op' b`.
    pub fn negate(self) -> Self {
        match self {
            ComparisonOp::Eq => ComparisonOp::NotEq,
            ComparisonOp::NotEq => ComparisonOp::Eq,
            ComparisonOp::Lt => ComparisonOp::GtE,
            ComparisonOp::LtE => ComparisonOp::Gt,
            ComparisonOp::Gt => ComparisonOp::LtE,
            ComparisonOp::GtE => ComparisonOp::Lt,
        }
    }
}

#[derive(Debug, Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub enum BooleanOp {
    And,
    Or,
}

#[derive(Debug, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub enum Expression {
    Literal(BigInt),
    /// A value read from the program input, unknown at analysis time.
    Input,
    Variable(Variable),
    UnaryArithmetic(UnaryArithmeticOp, Box<Expression>),
    BinaryArithmetic(Box<Expression>, BinaryArithmeticOp, Box<Expression>),
    BinaryComparison(Box<Expression>, ComparisonOp, Box<Expression>),
    Not(Box<Expression>),
    BinaryBoolean(Box<Expression>, BooleanOp, Box<Expression>),
}

impl Expression {
    pub fn literal(value: impl Into<BigInt>) -> Self {
        Expression::Literal(value.into())
    }

    pub fn var(name: &str) -> Self {
        Expression::Variable(Variable::new(name))
    }

    pub fn arith(left: Expression, op: BinaryArithmeticOp, right: Expression) -> Self {
        Expression::BinaryArithmetic(Box::new(left), op, Box::new(right))
    }

    pub fn compare(left: Expression, op: ComparisonOp, right: Expression) -> Self {
        Expression::BinaryComparison(Box::new(left), op, Box::new(right))
    }

    pub fn and(left: Expression, right: Expression) -> Self {
        Expression::BinaryBoolean(Box::new(left), BooleanOp::And, Box::new(right))
    }

    pub fn or(left: Expression, right: Expression) -> Self {
        Expression::BinaryBoolean(Box::new(left), BooleanOp::Or, Box::new(right))
    }

    pub fn as_variable(&self) -> Option<&Variable> {
        match self {
            Expression::Variable(v) => Some(v),
            _ => None,
        }
    }

    /// The logical negation of a condition, pushed through comparisons and boolean operators.
    pub fn negated(&self) -> Expression {
        match self {
            Expression::BinaryComparison(l, op, r) => Expression::BinaryComparison(l.clone(), op.negate(), r.clone()),
            Expression::Not(e) => (**e).clone(),
            Expression::BinaryBoolean(l, BooleanOp::And, r) => Expression::or(l.negated(), r.negated()),
            Expression::BinaryBoolean(l, BooleanOp::Or, r) => Expression::and(l.negated(), r.negated()),
            other => !other.clone(),
        }
    }

    /// All variables occurring in the expression.
    pub fn ids(&self) -> BTreeSet<Variable> {
        let mut ids = BTreeSet::new();
        self.collect_ids(&mut ids);
        ids
    }

    fn collect_ids(&self, ids: &mut BTreeSet<Variable>) {
        match self {
            Expression::Literal(_) | Expression::Input => {}
            Expression::Variable(v) => {
                ids.insert(v.clone());
            }
            Expression::UnaryArithmetic(_, e) | Expression::Not(e) => e.collect_ids(ids),
            Expression::BinaryArithmetic(l, _, r)
            | Expression::BinaryComparison(l, _, r)
            | Expression::BinaryBoolean(l, _, r) => {
                l.collect_ids(ids);
                r.collect_ids(ids);
            }
        }
    }
}

impl Add for Expression {
    type Output = Self;

    fn add(self, rhs: Self) -> Self::Output {
        Expression::arith(self, BinaryArithmeticOp::Add, rhs)
    }
}

impl Sub for Expression {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self::Output {
        Expression::arith(self, BinaryArithmeticOp::Sub, rhs)
    }
}

impl Mul for Expression {
    type Output = Self;

    fn mul(self, rhs: Self) -> Self::Output {
        Expression::arith(self, BinaryArithmeticOp::Mult, rhs)
    }
}

impl Neg for Expression {
    type Output = Self;

    fn neg(self) -> Self::Output {
        Expression::UnaryArithmetic(UnaryArithmeticOp::Minus, Box::new(self))
    }
}

impl Not for Expression {
    type Output = Self;

    fn not(self) -> Self::Output {
        Expression::Not(Box::new(self))
    }
}

impl fmt::Display for UnaryArithmeticOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UnaryArithmeticOp::Plus => write!(f, "+"),
            UnaryArithmeticOp::Minus => write!(f, "-"),
        }
    }
}

impl fmt::Display for BinaryArithmeticOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BinaryArithmeticOp::Add => write!(f, "+"),
            BinaryArithmeticOp::Sub => write!(f, "-"),
            BinaryArithmeticOp::Mult => write!(f, "*"),
            BinaryArithmeticOp::Div => write!(f, "/"),
        }
    }
}

impl fmt::Display for ComparisonOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ComparisonOp::Eq => "==",
            ComparisonOp::NotEq => "!=",
            ComparisonOp::Lt => "<",
            ComparisonOp::LtE => "<=",
            ComparisonOp::Gt => ">",
            ComparisonOp::GtE => ">=",
        };
        write!(f, "{}", s)
    }
}

impl fmt::Display for BooleanOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BooleanOp::And => write!(f, "and"),
            BooleanOp::Or => write!(f, "or"),
        }
    }
}

impl fmt::Display for Expression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expression::Literal(value) => write!(f, "{}", value),
            Expression::Input => write!(f, "input()"),
            Expression::Variable(v) => write!(f, "{}", v),
            Expression::UnaryArithmetic(op, e) => write!(f, "{}{}", op, e),
            Expression::BinaryArithmetic(l, op, r) => write!(f, "({} {} {})", l, op, r),
            Expression::BinaryComparison(l, op, r) => write!(f, "{} {} {}", l, op, r),
            Expression::Not(e) => write!(f, "not {}", e),
            Expression::BinaryBoolean(l, op, r) => write!(f, "({} {} {})", l, op, r),
        }
    }
}

#[cfg(test)]
mod tests {
    use test_log::test;

    use super::*;

    #[test]
    fn test_ids() {
        let e = Expression::var("x") + Expression::var("y") * Expression::var("x");
        let ids: Vec<_> = e.ids().into_iter().map(|v| v.name().to_string()).collect();
        assert_eq!(ids, vec!["x", "y"]);
        assert!(Expression::literal(3).ids().is_empty());
        assert!(Expression::Input.ids().is_empty());
    }

    #[test]
    fn test_display() {
        let e = Expression::compare(
            Expression::var("x") - Expression::literal(1),
            ComparisonOp::LtE,
            -Expression::var("y"),
        );
        assert_eq!(e.to_string(), "(x - 1) <= -y");
        let e = !Expression::and(Expression::var("a"), Expression::var("b"));
        assert_eq!(e.to_string(), "not (a and b)");
    }

    #[test]
    fn test_negated_condition() {
        let lt = Expression::compare(Expression::var("x"), ComparisonOp::Lt, Expression::literal(3));
        let ge = Expression::compare(Expression::var("x"), ComparisonOp::GtE, Expression::literal(3));
        assert_eq!(lt.negated(), ge);
        assert_eq!((!lt.clone()).negated(), lt);
        let both = Expression::and(lt.clone(), Expression::var("b"));
        assert_eq!(both.negated(), Expression::or(ge, !Expression::var("b")));
    }

    #[test]
    fn test_negate_comparison() {
        for op in [
            ComparisonOp::Eq,
            ComparisonOp::NotEq,
            ComparisonOp::Lt,
            ComparisonOp::LtE,
            ComparisonOp::Gt,
            ComparisonOp::GtE,
        ] {
            assert_ne!(op.negate(), op);
            assert_eq!(op.negate().negate(), op);
        }
    }
}
