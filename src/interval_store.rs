//! Non-relational numerical analysis: one [`Interval`] per variable.

use std::fmt;

use num_bigint::BigInt;

use crate::error::{AnalysisError, Result};
use crate::expr::{Expression, Variable};
use crate::interval::{Bound, Interval};
use crate::lattice::Lattice;
use crate::linear_form::{LinearForm, Sign};
use crate::numerical::NumericalDomain;
use crate::state::State;
use crate::store::Store;

/// A store of intervals.
///
/// # Invariants
///
/// If any variable is mapped to the empty interval, every variable is: the whole
/// store is Bottom.
#[derive(Debug, Clone, Eq, PartialEq, Hash)]
pub struct IntervalStore {
    store: Store<Interval>,
}

impl IntervalStore {
    /// A store mapping every variable to `[-∞, +∞]`.
    pub fn new<I>(variables: I) -> Self
    where
        I: IntoIterator<Item = Variable>,
    {
        IntervalStore {
            store: Store::new(variables, Interval::full()),
        }
    }

    pub fn store(&self) -> &Store<Interval> {
        &self.store
    }

    /// The interval of `variable`.
    ///
    /// # Panics
    ///
    /// Panics if `variable` is not tracked.
    pub fn get(&self, variable: &Variable) -> Interval {
        self.store[variable].clone()
    }

    /// Replaces the interval of `variable`. An empty interval makes the whole store Bottom.
    pub fn set(&mut self, variable: &Variable, interval: Interval) {
        if interval.is_empty() {
            *self = self.bottom();
        } else {
            self.store.set(variable, interval);
        }
    }

    /// Evaluates `expr` with variables bound to their intervals.
    pub fn evaluate(&self, expr: &Expression) -> Result<Interval> {
        Interval::evaluate_with(expr, &|v: &Variable| {
            self.store.get(v).cloned().ok_or_else(|| AnalysisError::UnsupportedExpression {
                domain: "interval store",
                expression: v.to_string(),
            })
        })
    }

    fn meet_variable(&mut self, variable: &Variable, interval: Interval) {
        let current = self.get(variable);
        self.set(variable, current.meet(interval));
    }
}

impl Lattice for IntervalStore {
    fn bottom(&self) -> Self {
        IntervalStore {
            store: self.store.bottom(),
        }
    }

    fn top(&self) -> Self {
        IntervalStore { store: self.store.top() }
    }

    fn is_bottom(&self) -> bool {
        self.store.is_bottom()
    }

    fn is_top(&self) -> bool {
        self.store.is_top()
    }

    fn less_equal_default(&self, other: &Self) -> bool {
        self.store.less_equal(&other.store)
    }

    fn join_default(self, other: Self) -> Self {
        IntervalStore {
            store: self.store.join(other.store),
        }
    }

    fn meet_default(self, other: Self) -> Self {
        let store = self.store.meet(other.store);
        if store.iter().any(|(_, i)| i.is_empty()) {
            IntervalStore { store: store.bottom() }
        } else {
            IntervalStore { store }
        }
    }

    fn widening_default(self, other: Self) -> Self {
        IntervalStore {
            store: self.store.widening(other.store),
        }
    }
}

impl NumericalDomain for IntervalStore {
    const NAME: &'static str = "interval store";

    fn tracks(&self, variable: &Variable) -> bool {
        self.store.get(variable).is_some()
    }

    fn forget(&mut self, variable: &Variable) {
        if !self.is_bottom() {
            self.store.set(variable, Interval::full());
        }
    }

    fn bounds(&self, variable: &Variable) -> Interval {
        self.get(variable)
    }

    fn add_lower_bound(&mut self, variable: &Variable, value: &BigInt) {
        self.meet_variable(variable, Interval::at_least(value.clone()));
    }

    fn add_upper_bound(&mut self, variable: &Variable, value: &BigInt) {
        self.meet_variable(variable, Interval::at_most(value.clone()));
    }

    fn add_difference_upper_bound(&mut self, left: &Variable, right: &Variable, value: &BigInt) {
        let form = LinearForm::variable(left.clone())
            .add(-LinearForm::variable(right.clone()))
            .map(|f| f.offset(&Interval::constant(-value)));
        if let Some(form) = form {
            self.constrain(&form);
        }
    }

    /// Propagates `Σ sᵢ·vᵢ + c <= 0` to every variable:
    /// `sᵢ·vᵢ <= -(min c + Σ_{j≠i} min(sⱼ·vⱼ))`.
    fn constrain(&mut self, form: &LinearForm) {
        if self.is_bottom() {
            return;
        }
        let Some(constant) = form.constant_part().lower().cloned() else {
            *self = self.bottom();
            return;
        };
        if form.is_constant() {
            if constant > Bound::zero() {
                *self = self.bottom();
            }
            return;
        }
        let terms: Vec<(Variable, Sign)> = form.terms().map(|(v, s)| (v.clone(), s)).collect();
        for (i, (variable, sign)) in terms.iter().enumerate() {
            let mut rest = constant.clone();
            for (j, (other, other_sign)) in terms.iter().enumerate() {
                if i != j {
                    let range = self.get(other);
                    let lowest = match other_sign {
                        Sign::Plus => range.lower().cloned(),
                        Sign::Minus => range.upper().cloned().map(|b| -b),
                    };
                    rest = rest.add_lower(&lowest.unwrap_or(Bound::PosInf));
                }
            }
            let refined = match sign {
                Sign::Plus => Interval::new(Bound::NegInf, -rest),
                Sign::Minus => Interval::new(rest, Bound::PosInf),
            };
            self.meet_variable(variable, refined);
            if self.is_bottom() {
                return;
            }
        }
    }
}

impl State for IntervalStore {
    fn assign_variable(mut self, left: &Variable, right: &Expression) -> Result<Self> {
        self.check_tracked(&Expression::Variable(left.clone()))?;
        if self.is_bottom() {
            return Ok(self);
        }
        let value = self.evaluate(right)?;
        self.set(left, value);
        Ok(self)
    }

    /// Forgets `left`, then requires `right` to lie in the range `left` had afterwards.
    fn substitute_variable(mut self, left: &Variable, right: &Expression) -> Result<Self> {
        self.check_tracked(&Expression::Variable(left.clone()))?;
        self.check_tracked(right)?;
        if self.is_bottom() {
            return Ok(self);
        }
        let target = self.get(left);
        self.forget(left);
        match LinearForm::from_expression(right) {
            Ok(form) => {
                if let Some(Bound::Finite(upper)) = target.upper() {
                    self.constrain(&form.clone().offset(&Interval::constant(-upper)));
                }
                if let Some(Bound::Finite(lower)) = target.lower() {
                    self.constrain(&(-form).offset(&Interval::constant(lower.clone())));
                }
            }
            Err(_) => {
                if self.evaluate(right)?.meet(target).is_empty() {
                    self = self.bottom();
                }
            }
        }
        Ok(self)
    }

    fn assume_condition(self, condition: &Expression) -> Result<Self> {
        self.refine(condition)
    }
}

impl fmt::Display for IntervalStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.store)
    }
}
