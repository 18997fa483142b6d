//! Stores: per-variable lattices lifted to a lattice of maps.

use std::collections::BTreeMap;
use std::fmt;
use std::ops::Index;

use crate::expr::Variable;
use crate::lattice::Lattice;

/// A map from every tracked variable to a lattice element, ordered pointwise.
///
/// # Invariants
///
/// The variable set is fixed at construction. Combining two stores over
/// different variable sets is a programming error and panics.
#[derive(Debug, Clone, Eq, PartialEq, Hash)]
pub struct Store<L> {
    store: BTreeMap<Variable, L>,
}

impl<L: Lattice> Store<L> {
    /// Creates a store mapping each of `variables` to `element`.
    pub fn new<I>(variables: I, element: L) -> Self
    where
        I: IntoIterator<Item = Variable>,
    {
        let store = variables.into_iter().map(|v| (v, element.clone())).collect();
        Store { store }
    }

    pub fn get(&self, variable: &Variable) -> Option<&L> {
        self.store.get(variable)
    }

    /// Replaces the element of `variable`.
    ///
    /// # Panics
    ///
    /// Panics if `variable` is not tracked by the store.
    pub fn set(&mut self, variable: &Variable, element: L) {
        match self.store.get_mut(variable) {
            Some(slot) => *slot = element,
            None => panic!("variable `{}` is not tracked by the store", variable),
        }
    }

    pub fn variables(&self) -> impl Iterator<Item = &Variable> {
        self.store.keys()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Variable, &L)> {
        self.store.iter()
    }

    pub fn map<F>(self, mut f: F) -> Self
    where
        F: FnMut(L) -> L,
    {
        let store = self.store.into_iter().map(|(v, e)| (v, f(e))).collect();
        Store { store }
    }

    fn assert_same_variables(&self, other: &Self) {
        assert!(
            self.store.keys().eq(other.store.keys()),
            "stores are defined over different variables"
        );
    }

    fn zip_with<F>(self, other: Self, f: F) -> Self
    where
        F: Fn(L, L) -> L,
    {
        self.assert_same_variables(&other);
        let store = self
            .store
            .into_iter()
            .zip(other.store.into_values())
            .map(|((v, a), b)| (v, f(a, b)))
            .collect();
        Store { store }
    }
}

impl<L: Lattice> Index<&Variable> for Store<L> {
    type Output = L;

    fn index(&self, variable: &Variable) -> &Self::Output {
        match self.store.get(variable) {
            Some(element) => element,
            None => panic!("variable `{}` is not tracked by the store", variable),
        }
    }
}

impl<L: Lattice> Lattice for Store<L> {
    fn bottom(&self) -> Self {
        self.clone().map(|e| e.bottom())
    }

    fn top(&self) -> Self {
        self.clone().map(|e| e.top())
    }

    /// A store is Bottom only when every variable is Bottom.
    fn is_bottom(&self) -> bool {
        self.store.values().all(|e| e.is_bottom())
    }

    fn is_top(&self) -> bool {
        self.store.values().all(|e| e.is_top())
    }

    fn less_equal_default(&self, other: &Self) -> bool {
        self.assert_same_variables(other);
        self.store
            .values()
            .zip(other.store.values())
            .all(|(a, b)| a.less_equal(b))
    }

    fn join_default(self, other: Self) -> Self {
        self.zip_with(other, L::join)
    }

    fn meet_default(self, other: Self) -> Self {
        self.zip_with(other, L::meet)
    }

    fn widening_default(self, other: Self) -> Self {
        self.zip_with(other, L::widening)
    }
}

impl<L: fmt::Display> fmt::Display for Store<L> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, (variable, element)) in self.store.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{} -> {}", variable, element)?;
        }
        Ok(())
    }
}
