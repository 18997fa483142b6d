//! The octagon abstract domain.
//!
//! An [`Octagon`] tracks constraints `±x ± y <= c` between pairs of integer variables (and
//! `±x <= c` on single ones) in a coherent difference-bound matrix, see [`crate::dbm`].
//! Most operations need the matrix in closed form, which is computed lazily.

use std::fmt;

use log::trace;
use num_bigint::BigInt;

use crate::dbm::{self, Dbm};
use crate::error::{AnalysisError, Result};
use crate::expr::{Expression, Variable};
use crate::interval::{Bound, Interval};
use crate::lattice::Lattice;
use crate::linear_form::{LinearForm, Sign};
use crate::numerical::NumericalDomain;
use crate::state::State;

/// Octagonal constraints over a fixed, ordered set of variables.
///
/// # Invariants
///
/// - `closed` implies the matrix is tightly closed.
/// - A `bottom` octagon keeps its variable set; its matrix is irrelevant.
#[derive(Debug, Clone)]
pub struct Octagon {
    variables: Vec<Variable>,
    matrix: Dbm,
    bottom: bool,
    closed: bool,
}

fn positive(sign: Sign) -> bool {
    sign == Sign::Plus
}

impl Octagon {
    /// The unconstrained octagon over `variables`.
    pub fn new<I>(variables: I) -> Self
    where
        I: IntoIterator<Item = Variable>,
    {
        let mut variables: Vec<Variable> = variables.into_iter().collect();
        variables.sort();
        variables.dedup();
        let matrix = Dbm::new(variables.len());
        Octagon {
            variables,
            matrix,
            bottom: false,
            closed: true,
        }
    }

    pub fn variables(&self) -> &[Variable] {
        &self.variables
    }

    /// Position of `variable`.
    ///
    /// # Panics
    ///
    /// Panics if `variable` is not tracked.
    fn position(&self, variable: &Variable) -> usize {
        match self.variables.binary_search(variable) {
            Ok(k) => k,
            Err(_) => panic!("variable `{}` is not tracked by the octagon", variable),
        }
    }

    fn assert_same_variables(&self, other: &Self) {
        assert_eq!(
            self.variables, other.variables,
            "octagons are defined over different variables"
        );
    }

    /// Brings the matrix into tightly closed form, detecting emptiness.
    pub fn close(&mut self) {
        if self.bottom || self.closed {
            return;
        }
        if self.matrix.close() {
            self.closed = true;
        } else {
            trace!("closure found an empty octagon");
            self.bottom = true;
            self.closed = true;
            self.matrix = Dbm::new(self.variables.len());
        }
    }

    fn to_closed(&self) -> Octagon {
        let mut closed = self.clone();
        closed.close();
        closed
    }

    fn set_bottom(&mut self) {
        self.bottom = true;
        self.closed = true;
        self.matrix = Dbm::new(self.variables.len());
    }

    /// Adds `m[i][j] <= value`.
    fn add(&mut self, i: usize, j: usize, value: Bound) {
        if self.bottom {
            return;
        }
        if value < *self.matrix.get(i, j) {
            self.matrix.set(i, j, value);
            self.closed = false;
        }
    }

    /// Adds `s1·x + s2·y <= value` for two distinct variable positions.
    fn add_binary(&mut self, x: usize, s1: Sign, y: usize, s2: Sign, value: &BigInt) {
        let j = dbm::index(x, positive(s1));
        let i = dbm::index(y, !positive(s2));
        self.add(i, j, Bound::Finite(value.clone()));
    }

    /// Adds `s·x <= value`.
    fn add_unary(&mut self, x: usize, s: Sign, value: &BigInt) {
        let j = dbm::index(x, positive(s));
        self.add(j ^ 1, j, dbm::double(value));
    }

    fn bounds_at(&self, k: usize) -> Interval {
        let upper = dbm::halve(self.matrix.get(2 * k + 1, 2 * k));
        let lower = -dbm::halve(self.matrix.get(2 * k, 2 * k + 1));
        Interval::new(lower, upper)
    }

    /// Assigns `±y + constant` to `x` by way of a temporary variable `t`: constrain
    /// `t - (±y)` to `constant`, close, forget `x`, then rename `t` to `x`.
    fn assign_linear(&mut self, x: usize, form: &LinearForm) {
        let n = self.variables.len();
        self.matrix.resize(n + 1);
        let t = n;
        match form.terms().next() {
            Some((variable, sign)) => {
                let y = self.position(variable);
                let sy = dbm::index(y, positive(sign));
                if let Some(upper) = form.constant_upper() {
                    self.matrix.tighten(sy, 2 * t, Bound::Finite(upper.clone()));
                }
                if let Some(lower) = form.constant_lower() {
                    self.matrix.tighten(2 * t, sy, Bound::Finite(-lower));
                }
            }
            None => {
                if let Some(upper) = form.constant_upper() {
                    self.matrix.tighten(2 * t + 1, 2 * t, dbm::double(upper));
                }
                if let Some(lower) = form.constant_lower() {
                    self.matrix.tighten(2 * t, 2 * t + 1, dbm::double(&-lower));
                }
            }
        }
        self.closed = false;
        if !self.matrix.close() {
            self.matrix.resize(n);
            self.set_bottom();
            return;
        }
        self.matrix.forget(x);
        for j in 0..2 * n {
            if j / 2 == x {
                continue;
            }
            let positive = self.matrix.get(2 * t, j).clone();
            let negative = self.matrix.get(2 * t + 1, j).clone();
            self.matrix.set(2 * x, j, positive);
            self.matrix.set(2 * x + 1, j, negative);
        }
        let up = self.matrix.get(2 * t + 1, 2 * t).clone();
        let down = self.matrix.get(2 * t, 2 * t + 1).clone();
        self.matrix.set(2 * x + 1, 2 * x, up);
        self.matrix.set(2 * x, 2 * x + 1, down);
        self.matrix.resize(n);
        self.closed = true;
    }
}

impl PartialEq for Octagon {
    /// Octagons are equal when they denote the same set of points.
    fn eq(&self, other: &Self) -> bool {
        if self.variables != other.variables {
            return false;
        }
        let a = self.to_closed();
        let b = other.to_closed();
        a.bottom == b.bottom && (a.bottom || a.matrix == b.matrix)
    }
}

impl Eq for Octagon {}

impl Lattice for Octagon {
    fn bottom(&self) -> Self {
        let mut bottom = Octagon::new(self.variables.iter().cloned());
        bottom.set_bottom();
        bottom
    }

    fn top(&self) -> Self {
        Octagon::new(self.variables.iter().cloned())
    }

    fn is_bottom(&self) -> bool {
        self.bottom || (!self.closed && self.to_closed().bottom)
    }

    fn is_top(&self) -> bool {
        !self.is_bottom() && self.matrix.entries().all(|(i, j, b)| i == j || dbm::is_unbounded(b))
    }

    fn less_equal_default(&self, other: &Self) -> bool {
        self.assert_same_variables(other);
        let closed = self.to_closed();
        let result = closed.matrix.entries().all(|(i, j, b)| *b <= *other.matrix.get(i, j));
        result
    }

    fn join_default(self, other: Self) -> Self {
        self.assert_same_variables(&other);
        let a = self.to_closed();
        let b = other.to_closed();
        let matrix = a.matrix.zip_with(&b.matrix, |x, y| x.clone().max(y.clone()));
        Octagon {
            matrix,
            closed: true,
            ..a
        }
    }

    fn meet_default(self, other: Self) -> Self {
        self.assert_same_variables(&other);
        let matrix = self.matrix.zip_with(&other.matrix, |x, y| x.clone().min(y.clone()));
        Octagon {
            matrix,
            closed: false,
            ..self
        }
    }

    /// Drops every constraint of `self` that `other` does not satisfy.
    fn widening_default(self, other: Self) -> Self {
        self.assert_same_variables(&other);
        let b = other.to_closed();
        let matrix = self
            .matrix
            .zip_with(&b.matrix, |x, y| if y <= x { x.clone() } else { Bound::PosInf });
        Octagon {
            matrix,
            closed: false,
            ..self
        }
    }
}

impl NumericalDomain for Octagon {
    const NAME: &'static str = "octagon";

    fn tracks(&self, variable: &Variable) -> bool {
        self.variables.binary_search(variable).is_ok()
    }

    fn forget(&mut self, variable: &Variable) {
        let k = self.position(variable);
        self.close();
        if !self.bottom {
            self.matrix.forget(k);
        }
    }

    fn bounds(&self, variable: &Variable) -> Interval {
        let k = self.position(variable);
        let closed = self.to_closed();
        if closed.bottom {
            Interval::empty()
        } else {
            closed.bounds_at(k)
        }
    }

    fn add_lower_bound(&mut self, variable: &Variable, value: &BigInt) {
        let k = self.position(variable);
        self.add_unary(k, Sign::Minus, &-value);
    }

    fn add_upper_bound(&mut self, variable: &Variable, value: &BigInt) {
        let k = self.position(variable);
        self.add_unary(k, Sign::Plus, value);
    }

    fn add_difference_upper_bound(&mut self, left: &Variable, right: &Variable, value: &BigInt) {
        let x = self.position(left);
        let y = self.position(right);
        if x == y {
            if *value < BigInt::from(0) {
                self.set_bottom();
            }
        } else {
            self.add_binary(x, Sign::Plus, y, Sign::Minus, value);
        }
    }

    /// Forms over one or two variables become octagonal constraints. Longer forms are
    /// propagated to single-variable bounds through the current ranges of the others.
    fn constrain(&mut self, form: &LinearForm) {
        if self.is_bottom() {
            return;
        }
        let Some(lower) = form.constant_part().lower().cloned() else {
            self.set_bottom();
            return;
        };
        let Bound::Finite(lower) = lower else {
            return;
        };
        let bound = -lower;
        let terms: Vec<(usize, Sign)> = form.terms().map(|(v, s)| (self.position(v), s)).collect();
        match terms.as_slice() {
            [] => {
                if bound < BigInt::from(0) {
                    self.set_bottom();
                }
            }
            [(x, s)] => self.add_unary(*x, *s, &bound),
            [(x, s1), (y, s2)] => self.add_binary(*x, *s1, *y, *s2, &bound),
            _ => {
                let closed = self.to_closed();
                let lowest: Vec<Bound> = terms
                    .iter()
                    .map(|&(k, s)| {
                        let range = closed.bounds_at(k);
                        match s {
                            Sign::Plus => range.lower().cloned().unwrap_or(Bound::PosInf),
                            Sign::Minus => range.upper().cloned().map(|b| -b).unwrap_or(Bound::PosInf),
                        }
                    })
                    .collect();
                for (i, &(k, s)) in terms.iter().enumerate() {
                    let mut rest = Bound::Finite(bound.clone());
                    for (j, low) in lowest.iter().enumerate() {
                        if i != j {
                            rest = rest.add_upper(&-low.clone());
                        }
                    }
                    if let Bound::Finite(rest) = rest {
                        self.add_unary(k, s, &rest);
                    }
                }
            }
        }
    }
}

impl State for Octagon {
    /// Linear right-hand sides `±y + [a, b]` are assigned exactly. Anything else is
    /// evaluated in the interval abstraction of the octagon.
    fn assign_variable(mut self, left: &Variable, right: &Expression) -> Result<Self> {
        self.check_tracked(&Expression::Variable(left.clone()))?;
        self.check_tracked(right)?;
        self.close();
        if self.bottom {
            return Ok(self);
        }
        let x = self.position(left);
        match LinearForm::from_expression(right) {
            Ok(form) if form.num_terms() <= 1 => {
                self.assign_linear(x, &form);
            }
            _ => {
                let range = Interval::evaluate_with(right, &|v: &Variable| Ok(self.bounds(v)))?;
                self.set_bounds(left, &range);
            }
        }
        Ok(self)
    }

    fn substitute_variable(self, _left: &Variable, _right: &Expression) -> Result<Self> {
        Err(AnalysisError::UnsupportedOperation {
            domain: "octagon",
            operation: "backward substitution",
        })
    }

    fn assume_condition(self, condition: &Expression) -> Result<Self> {
        self.refine(condition)
    }
}

/// Lists the range of every variable, then the binary constraints that are not
/// implied by those ranges.
impl fmt::Display for Octagon {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let closed = self.to_closed();
        if closed.bottom {
            return write!(f, "⊥");
        }
        let mut parts = Vec::new();
        for (k, variable) in closed.variables.iter().enumerate() {
            parts.push(format!("{} -> {}", variable, closed.bounds_at(k)));
        }
        let mut relations = Vec::new();
        for (a, x) in closed.variables.iter().enumerate() {
            for (b, y) in closed.variables.iter().enumerate().skip(a + 1) {
                let implied = |i: usize, j: usize| {
                    let unary = dbm::halve(&closed.matrix.get(i, i ^ 1).add_upper(closed.matrix.get(j ^ 1, j)));
                    *closed.matrix.get(i, j) >= unary
                };
                let candidates = [
                    (2 * b, 2 * a, format!("{} - {}", x, y)),
                    (2 * a, 2 * b, format!("{} - {}", y, x)),
                    (2 * b + 1, 2 * a, format!("{} + {}", x, y)),
                    (2 * b, 2 * a + 1, format!("-{} - {}", x, y)),
                ];
                for (i, j, text) in candidates {
                    let bound = closed.matrix.get(i, j);
                    if bound.is_finite() && !implied(i, j) {
                        relations.push(format!("{} <= {}", text, bound));
                    }
                }
            }
        }
        write!(f, "{}", parts.join(", "))?;
        if !relations.is_empty() {
            write!(f, " | {}", relations.join(", "))?;
        }
        Ok(())
    }
}
