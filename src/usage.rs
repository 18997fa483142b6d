//! Variable usage analysis.
//!
//! Backward analysis deciding, for every variable, whether its value may reach a use. Scopes
//! (`if` branches and loop bodies) are tracked with a stack of stores: entering a scope pushes
//! a *descended* copy of the current store, leaving it pops the top and *combines* it into the
//! store below.

use std::fmt;

use crate::error::{AnalysisError, Result};
use crate::expr::{Expression, Variable};
use crate::lattice::{Lattice, Lifted, Payload};
use crate::state::State;
use crate::store::Store;

/// Usage of a variable.
///
/// The discriminants are chosen so that join and meet are bitwise `|` and `&`.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum Used {
    /// Not used.
    N = 0,
    /// Used in an outer scope and overwritten in this one.
    O = 1,
    /// Used in an outer scope.
    S = 2,
    /// Used in this scope or a nested one.
    U = 3,
}

impl Used {
    fn from_bits(bits: u8) -> Used {
        match bits & 3 {
            0 => Used::N,
            1 => Used::O,
            2 => Used::S,
            _ => Used::U,
        }
    }

    /// The usage as seen from a nested scope.
    pub fn descend(self) -> Used {
        match self {
            Used::U | Used::S => Used::S,
            Used::O | Used::N => Used::N,
        }
    }

    /// Merges the usage `inner` found in a nested scope into `self`.
    pub fn combine(self, inner: Used) -> Used {
        match (self, inner) {
            (_, Used::U) => Used::U,
            (_, Used::O) => Used::O,
            (Used::U, _) => Used::U,
            (Used::N, Used::N) => Used::N,
            (Used::O, Used::N) => Used::O,
            _ => Used::S,
        }
    }
}

impl Lattice for Used {
    fn bottom(&self) -> Self {
        Used::N
    }

    fn top(&self) -> Self {
        Used::U
    }

    fn is_bottom(&self) -> bool {
        *self == Used::N
    }

    fn is_top(&self) -> bool {
        *self == Used::U
    }

    /// `O` and `S` are incomparable.
    fn less_equal_default(&self, other: &Self) -> bool {
        self == other
    }

    fn join_default(self, other: Self) -> Self {
        Used::from_bits(self as u8 | other as u8)
    }

    fn meet_default(self, other: Self) -> Self {
        Used::from_bits(self as u8 & other as u8)
    }

    fn widening_default(self, other: Self) -> Self {
        self.join_default(other)
    }
}

impl fmt::Display for Used {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Used::N => "N",
            Used::O => "O",
            Used::S => "S",
            Used::U => "U",
        };
        write!(f, "{}", name)
    }
}

/// Usage of every variable within one scope.
pub type UsedStore = Store<Used>;

impl UsedStore {
    /// A store in which no variable is used.
    pub fn unused<I>(variables: I) -> Self
    where
        I: IntoIterator<Item = Variable>,
    {
        Store::new(variables, Used::N)
    }

    pub fn descend(self) -> Self {
        self.map(Used::descend)
    }

    /// Combines the store of a nested scope into `self`, variable by variable.
    pub fn combine(mut self, inner: &UsedStore) -> Self {
        for (variable, &used) in inner.iter() {
            let outer = self[variable];
            self.set(variable, outer.combine(used));
        }
        self
    }

    fn mark_used(&mut self, expr: &Expression) {
        for variable in expr.ids() {
            self.set(&variable, Used::U);
        }
    }
}

impl State for UsedStore {
    fn assign_variable(self, _left: &Variable, _right: &Expression) -> Result<Self> {
        Err(AnalysisError::UnsupportedOperation {
            domain: "usage",
            operation: "forward assignment",
        })
    }

    /// If `left` is used, the right-hand side is used too, and `left` itself becomes
    /// overwritten unless the right-hand side reads it.
    fn substitute_variable(mut self, left: &Variable, right: &Expression) -> Result<Self> {
        if matches!(self[left], Used::U | Used::S) {
            let ids = right.ids();
            for variable in &ids {
                self.set(variable, Used::U);
            }
            let killed = if ids.contains(left) { Used::U } else { Used::O };
            self.set(left, killed);
        }
        Ok(self)
    }

    /// A condition matters only if some variable is used in this scope or overwritten in it.
    fn assume_condition(mut self, condition: &Expression) -> Result<Self> {
        if self.iter().any(|(_, used)| matches!(used, Used::U | Used::O)) {
            self.mark_used(condition);
        }
        Ok(self)
    }

    fn output(mut self, output: &Expression) -> Result<Self> {
        self.mark_used(output);
        Ok(self)
    }
}

/// The scope stack of a [`UsedStack`], innermost store last.
///
/// # Invariants
///
/// Never empty. Stacks compared or combined must have the same depth.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct Frames(Vec<UsedStore>);

impl Frames {
    pub fn depth(&self) -> usize {
        self.0.len()
    }

    /// The store of the innermost scope.
    pub fn top_frame(&self) -> &UsedStore {
        &self.0[self.0.len() - 1]
    }

    fn update_top<F>(mut self, f: F) -> Result<Self>
    where
        F: FnOnce(UsedStore) -> Result<UsedStore>,
    {
        if let Some(top) = self.0.pop() {
            self.0.push(f(top)?);
        }
        Ok(self)
    }

    fn zip_with<F>(self, other: Frames, f: F) -> Frames
    where
        F: Fn(UsedStore, UsedStore) -> UsedStore,
    {
        assert_eq!(self.depth(), other.depth(), "stacks must be equally deep");
        Frames(self.0.into_iter().zip(other.0).map(|(a, b)| f(a, b)).collect())
    }

    fn push(mut self) -> Self {
        let descended = self.top_frame().clone().descend();
        self.0.push(descended);
        self
    }

    fn pop(mut self) -> Self {
        assert!(self.depth() > 1, "cannot leave the outermost scope");
        if let Some(inner) = self.0.pop() {
            if let Some(outer) = self.0.pop() {
                self.0.push(outer.combine(&inner));
            }
        }
        self
    }
}

impl Payload for Frames {
    fn less_equal(&self, other: &Self) -> bool {
        assert_eq!(self.depth(), other.depth(), "stacks must be equally deep");
        self.0.iter().zip(&other.0).all(|(a, b)| a.less_equal(b))
    }

    fn join(self, other: Self) -> Lifted<Self> {
        Lifted::Element(self.zip_with(other, Lattice::join))
    }

    fn meet(self, other: Self) -> Lifted<Self> {
        Lifted::Element(self.zip_with(other, Lattice::meet))
    }
}

impl fmt::Display for Frames {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let frames: Vec<String> = self.0.iter().map(|s| s.to_string()).collect();
        write!(f, "{}", frames.join(" | "))
    }
}

/// Usage analysis state: a stack of [`UsedStore`]s, or Top/Bottom.
pub type UsedStack = Lifted<Frames>;

impl UsedStack {
    /// A single scope in which no variable is used.
    pub fn new<I>(variables: I) -> Self
    where
        I: IntoIterator<Item = Variable>,
    {
        Lifted::Element(Frames(vec![UsedStore::unused(variables)]))
    }

    fn on_top<F>(self, f: F) -> Result<Self>
    where
        F: FnOnce(UsedStore) -> Result<UsedStore>,
    {
        match self {
            Lifted::Element(frames) => Ok(Lifted::Element(frames.update_top(f)?)),
            other => Ok(other),
        }
    }

    fn map_frames<F>(self, f: F) -> Self
    where
        F: FnOnce(Frames) -> Frames,
    {
        match self {
            Lifted::Element(frames) => Lifted::Element(f(frames)),
            other => other,
        }
    }
}

impl State for UsedStack {
    fn assign_variable(self, left: &Variable, right: &Expression) -> Result<Self> {
        self.on_top(|store| store.assign_variable(left, right))
    }

    fn substitute_variable(self, left: &Variable, right: &Expression) -> Result<Self> {
        self.on_top(|store| store.substitute_variable(left, right))
    }

    fn assume_condition(self, condition: &Expression) -> Result<Self> {
        self.on_top(|store| store.assume_condition(condition))
    }

    fn output(self, output: &Expression) -> Result<Self> {
        self.on_top(|store| store.output(output))
    }

    fn enter_if(self) -> Self {
        self.map_frames(Frames::push)
    }

    fn exit_if(self) -> Self {
        self.map_frames(Frames::pop)
    }

    fn enter_loop(self) -> Self {
        self.enter_if()
    }

    fn exit_loop(self) -> Self {
        self.exit_if()
    }
}

#[cfg(test)]
mod tests {
    use test_log::test;

    use super::*;
    use crate::lattice::tests::check_lattice_axioms;

    const ALL: [Used; 4] = [Used::N, Used::O, Used::S, Used::U];

    fn x() -> Variable {
        Variable::from("x")
    }

    fn y() -> Variable {
        Variable::from("y")
    }

    fn z() -> Variable {
        Variable::from("z")
    }

    fn store(x_used: Used, y_used: Used, z_used: Used) -> UsedStore {
        let mut s = UsedStore::unused([x(), y(), z()]);
        s.set(&x(), x_used);
        s.set(&y(), y_used);
        s.set(&z(), z_used);
        s
    }

    #[test]
    fn test_used_lattice() {
        check_lattice_axioms(&ALL);
        assert_eq!(Used::S.join(Used::O), Used::U);
        assert_eq!(Used::S.meet(Used::O), Used::N);
        assert!(!Used::S.less_equal(&Used::O));
        assert!(!Used::O.less_equal(&Used::S));
        assert!(Used::O.less_equal(&Used::U));
    }

    #[test]
    fn test_descend() {
        let descended: Vec<_> = ALL.iter().map(|u| u.descend()).collect();
        assert_eq!(descended, vec![Used::N, Used::N, Used::S, Used::S]);
    }

    #[test]
    fn test_combine_table() {
        use Used::*;
        let table = [
            [N, O, S, U], // N
            [O, O, S, U], // O
            [S, O, S, U], // S
            [U, O, U, U], // U
        ];
        for (i, outer) in ALL.iter().enumerate() {
            for (j, inner) in ALL.iter().enumerate() {
                assert_eq!(outer.combine(*inner), table[i][j], "combine({}, {})", outer, inner);
            }
        }
    }

    #[test]
    fn test_substitute() {
        // z is used after `z = y`
        let s = store(Used::N, Used::N, Used::U).substitute_variable(&z(), &Expression::var("y")).unwrap();
        assert_eq!(s.to_string(), "x -> N, y -> U, z -> O");

        // x is not used after `x = y`
        let s = store(Used::N, Used::N, Used::U).substitute_variable(&x(), &Expression::var("y")).unwrap();
        assert_eq!(s.to_string(), "x -> N, y -> N, z -> U");

        // z = z + y keeps z used
        let rhs = Expression::var("z") + Expression::var("y");
        let s = store(Used::N, Used::N, Used::S).substitute_variable(&z(), &rhs).unwrap();
        assert_eq!(s.to_string(), "x -> N, y -> U, z -> U");
    }

    #[test]
    fn test_assume() {
        let cond = Expression::compare(Expression::var("y"), crate::expr::ComparisonOp::Gt, Expression::var("x"));
        let s = store(Used::N, Used::N, Used::S).assume_condition(&cond).unwrap();
        assert_eq!(s.to_string(), "x -> N, y -> N, z -> S");
        let s = store(Used::N, Used::N, Used::O).assume_condition(&cond).unwrap();
        assert_eq!(s.to_string(), "x -> U, y -> U, z -> O");
    }

    #[test]
    fn test_stack_scopes() {
        let stack = UsedStack::new([x(), y(), z()]).output(&Expression::var("z")).unwrap();
        let inner = stack.enter_if();
        let Lifted::Element(frames) = &inner else {
            panic!("expected a stack");
        };
        assert_eq!(frames.depth(), 2);
        assert_eq!(frames.top_frame().to_string(), "x -> N, y -> N, z -> S");

        let inner = inner.substitute_variable(&z(), &Expression::var("y")).unwrap();
        let outer = inner.exit_if();
        assert_eq!(outer.to_string(), "x -> N, y -> U, z -> O");
    }

    #[test]
    fn test_stack_bottom_and_top_are_inert() {
        let bottom = UsedStack::Bottom;
        assert_eq!(bottom.clone().enter_if(), UsedStack::Bottom);
        assert_eq!(bottom.output(&Expression::var("x")).unwrap(), UsedStack::Bottom);
        assert_eq!(UsedStack::Top.exit_loop(), UsedStack::Top);
    }

    #[test]
    #[should_panic(expected = "stacks must be equally deep")]
    fn test_stack_depth_mismatch() {
        let a = UsedStack::new([x()]);
        let b = a.clone().enter_loop();
        let _ = a.join(b);
    }

    #[test]
    fn test_store_lattice_axioms() {
        check_lattice_axioms(&[
            store(Used::N, Used::N, Used::N),
            store(Used::U, Used::U, Used::U),
            store(Used::O, Used::S, Used::N),
            store(Used::S, Used::O, Used::U),
            store(Used::U, Used::N, Used::S),
        ]);
    }
}
