//! Lattice abstraction shared by every abstract domain.
//!
//! The [`Lattice`] trait is split in two layers:
//!
//! - the *provided* operations [`less_equal`][Lattice::less_equal], [`join`][Lattice::join],
//!   [`meet`][Lattice::meet] and [`widening`][Lattice::widening] handle the Top/Bottom cases,
//! - the *required* `*_default` operations handle two ordinary elements.
//!
//! A domain therefore only implements the interesting case and gets the
//! absorption laws (`⊥ ⊔ x = x`, `⊤ ⊓ x = x`, ...) for free.
//!
//! Operations consume their operands and return a new value.

use std::fmt;

/// A lattice with designated Top (`⊤`) and Bottom (`⊥`) elements.
///
/// # Laws
///
/// - `⊑` is a partial order: reflexive, antisymmetric, transitive.
/// - `join` is the least upper bound, `meet` the greatest lower bound.
/// - `widening` is an upper bound of both operands, and any increasing chain
///   `x0, x0 ∇ x1, (x0 ∇ x1) ∇ x2, ...` stabilizes after finitely many steps.
pub trait Lattice: Clone + fmt::Debug + PartialEq {
    /// The least element of the same shape as `self`.
    ///
    /// Variable-indexed lattices (stores, octagons) keep their variable set.
    fn bottom(&self) -> Self;

    /// The greatest element of the same shape as `self`.
    fn top(&self) -> Self;

    fn is_bottom(&self) -> bool;

    fn is_top(&self) -> bool;

    /// Partial order on two ordinary (neither Top nor Bottom) elements.
    fn less_equal_default(&self, other: &Self) -> bool;

    /// Least upper bound of two ordinary elements.
    fn join_default(self, other: Self) -> Self;

    /// Greatest lower bound of two ordinary elements.
    fn meet_default(self, other: Self) -> Self;

    /// Widening of two ordinary elements.
    fn widening_default(self, other: Self) -> Self;

    /// Partial order `self ⊑ other`.
    fn less_equal(&self, other: &Self) -> bool {
        if self.is_bottom() || other.is_top() {
            true
        } else if other.is_bottom() || self.is_top() {
            false
        } else {
            self.less_equal_default(other)
        }
    }

    /// Least upper bound `self ⊔ other`.
    fn join(self, other: Self) -> Self {
        if self.is_bottom() || other.is_top() {
            other
        } else if other.is_bottom() || self.is_top() {
            self
        } else {
            self.join_default(other)
        }
    }

    /// Greatest lower bound `self ⊓ other`.
    fn meet(self, other: Self) -> Self {
        if self.is_top() || other.is_bottom() {
            other
        } else if other.is_top() || self.is_bottom() {
            self
        } else {
            self.meet_default(other)
        }
    }

    /// Widening `self ∇ other`, where `self` is the previous iterate.
    fn widening(self, other: Self) -> Self {
        if self.is_bottom() || other.is_top() {
            other
        } else if other.is_bottom() || self.is_top() {
            self
        } else {
            self.widening_default(other)
        }
    }

    /// Join of all `elements`, starting from Bottom.
    fn big_join<I>(&self, elements: I) -> Self
    where
        I: IntoIterator<Item = Self>,
    {
        elements.into_iter().fold(self.bottom(), |acc, e| acc.join(e))
    }

    /// Meet of all `elements`, starting from Top.
    fn big_meet<I>(&self, elements: I) -> Self
    where
        I: IntoIterator<Item = Self>,
    {
        elements.into_iter().fold(self.top(), |acc, e| acc.meet(e))
    }
}

/// Payload of a [`Lifted`] lattice: knows how to combine two ordinary elements,
/// and may collapse the result to Top or Bottom.
pub trait Payload: Clone + fmt::Debug + PartialEq {
    fn less_equal(&self, other: &Self) -> bool;

    fn join(self, other: Self) -> Lifted<Self>;

    fn meet(self, other: Self) -> Lifted<Self>;

    fn widening(self, other: Self) -> Lifted<Self> {
        Payload::join(self, other)
    }
}

/// A payload type lifted with explicit Bottom and Top elements.
///
/// # Invariants
///
/// The tag and the payload are mutually exclusive: only `Element` carries a payload.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Lifted<T> {
    Bottom,
    Top,
    Element(T),
}

impl<T> Lifted<T> {
    pub fn element(&self) -> Option<&T> {
        match self {
            Lifted::Element(e) => Some(e),
            _ => None,
        }
    }

    pub fn into_element(self) -> Option<T> {
        match self {
            Lifted::Element(e) => Some(e),
            _ => None,
        }
    }
}

impl<T: Payload> Lattice for Lifted<T> {
    fn bottom(&self) -> Self {
        Lifted::Bottom
    }

    fn top(&self) -> Self {
        Lifted::Top
    }

    fn is_bottom(&self) -> bool {
        matches!(self, Lifted::Bottom)
    }

    fn is_top(&self) -> bool {
        matches!(self, Lifted::Top)
    }

    fn less_equal_default(&self, other: &Self) -> bool {
        match (self, other) {
            (Lifted::Element(a), Lifted::Element(b)) => a.less_equal(b),
            _ => unreachable!("Top and Bottom are handled by `less_equal`"),
        }
    }

    fn join_default(self, other: Self) -> Self {
        match (self, other) {
            (Lifted::Element(a), Lifted::Element(b)) => Payload::join(a, b),
            _ => unreachable!("Top and Bottom are handled by `join`"),
        }
    }

    fn meet_default(self, other: Self) -> Self {
        match (self, other) {
            (Lifted::Element(a), Lifted::Element(b)) => Payload::meet(a, b),
            _ => unreachable!("Top and Bottom are handled by `meet`"),
        }
    }

    fn widening_default(self, other: Self) -> Self {
        match (self, other) {
            (Lifted::Element(a), Lifted::Element(b)) => Payload::widening(a, b),
            _ => unreachable!("Top and Bottom are handled by `widening`"),
        }
    }
}

impl<T: fmt::Display> fmt::Display for Lifted<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Lifted::Bottom => write!(f, "⊥"),
            Lifted::Top => write!(f, "⊤"),
            Lifted::Element(e) => write!(f, "{}", e),
        }
    }
}
