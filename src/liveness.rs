//! Live variable analysis.
//!
//! A variable is *live* at a program point if its current value may be read before it is
//! overwritten. The analysis runs backward: an assignment kills its target and makes the
//! variables of its right-hand side live.

use std::fmt;

use crate::error::{AnalysisError, Result};
use crate::expr::{Expression, Variable};
use crate::lattice::Lattice;
use crate::state::State;
use crate::store::Store;

/// The two-point lattice `Dead ⊑ Live`.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub enum Liveness {
    Dead,
    Live,
}

impl Lattice for Liveness {
    fn bottom(&self) -> Self {
        Liveness::Dead
    }

    fn top(&self) -> Self {
        Liveness::Live
    }

    fn is_bottom(&self) -> bool {
        *self == Liveness::Dead
    }

    fn is_top(&self) -> bool {
        *self == Liveness::Live
    }

    fn less_equal_default(&self, other: &Self) -> bool {
        self <= other
    }

    fn join_default(self, other: Self) -> Self {
        self.max(other)
    }

    fn meet_default(self, other: Self) -> Self {
        self.min(other)
    }

    fn widening_default(self, other: Self) -> Self {
        self.join_default(other)
    }
}

impl fmt::Display for Liveness {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Liveness::Dead => write!(f, "Dead"),
            Liveness::Live => write!(f, "Live"),
        }
    }
}

/// Liveness of every program variable. Variables start out dead.
pub type LivenessState = Store<Liveness>;

impl LivenessState {
    /// A state in which every variable is dead.
    pub fn all_dead<I>(variables: I) -> Self
    where
        I: IntoIterator<Item = Variable>,
    {
        Store::new(variables, Liveness::Dead)
    }

    fn make_live(&mut self, expr: &Expression) {
        for variable in expr.ids() {
            self.set(&variable, Liveness::Live);
        }
    }
}

impl State for LivenessState {
    fn assign_variable(self, _left: &Variable, _right: &Expression) -> Result<Self> {
        Err(AnalysisError::UnsupportedOperation {
            domain: "liveness",
            operation: "forward assignment",
        })
    }

    fn substitute_variable(mut self, left: &Variable, right: &Expression) -> Result<Self> {
        self.set(left, Liveness::Dead);
        self.make_live(right);
        Ok(self)
    }

    fn assume_condition(mut self, condition: &Expression) -> Result<Self> {
        self.make_live(condition);
        Ok(self)
    }

    /// Printed values are read.
    fn output(mut self, output: &Expression) -> Result<Self> {
        self.make_live(output);
        Ok(self)
    }
}
