//! Trace-based analysis of boolean programs.
//!
//! A [`Trace`] is the sequence of valuations a run goes through, most recent first. Running
//! backward from the end of a program, substitution extends every trace by the valuations
//! that could have preceded it. Variables hold truth values: two-valued `bool`, or
//! three-valued [`Kleene`] where a literal other than `0` and `1` is unknown.
//!
//! In *hyper* mode, the state keeps one set of traces per subset of the initial valuations.
//! Printing a value that is not the same across a set removes that set, so the sets that
//! survive back to the program entry are the groups of runs that cannot be told apart by
//! their output. Reading `x = input()` marks `x` as an input: the number of values an input
//! takes within a surviving set (its *variety*) is the number of input values the output
//! does not distinguish.

use std::collections::BTreeSet;
use std::fmt;
use std::hash::Hash;

use num_bigint::BigInt;
use num_traits::{One, Zero};

use crate::error::{AnalysisError, Result};
use crate::expr::{BooleanOp, Expression, Variable};
use crate::lattice::{Lifted, Payload};
use crate::state::State;

/// Hyper mode enumerates every subset of the initial traces, so their number is capped.
pub const MAX_HYPER_TRACES: usize = 16;

/// The values a variable can hold in a trace.
pub trait TruthValue: Copy + Ord + Hash + fmt::Debug + 'static {
    /// Every value.
    const ALL: &'static [Self];

    fn from_literal(literal: &BigInt) -> Self;

    fn holds(self) -> bool;

    fn not(self) -> Self;

    fn and(self, other: Self) -> Self;

    fn or(self, other: Self) -> Self;

    fn symbol(self) -> char;
}

/// Any non-zero literal is true.
impl TruthValue for bool {
    const ALL: &'static [Self] = &[true, false];

    fn from_literal(literal: &BigInt) -> Self {
        !literal.is_zero()
    }

    fn holds(self) -> bool {
        self
    }

    fn not(self) -> Self {
        !self
    }

    fn and(self, other: Self) -> Self {
        self && other
    }

    fn or(self, other: Self) -> Self {
        self || other
    }

    fn symbol(self) -> char {
        if self {
            'T'
        } else {
            'F'
        }
    }
}

/// Three-valued logic with an unknown value.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub enum Kleene {
    True,
    Unknown,
    False,
}

impl TruthValue for Kleene {
    const ALL: &'static [Self] = &[Kleene::True, Kleene::Unknown, Kleene::False];

    fn from_literal(literal: &BigInt) -> Self {
        if literal.is_one() {
            Kleene::True
        } else if literal.is_zero() {
            Kleene::False
        } else {
            Kleene::Unknown
        }
    }

    fn holds(self) -> bool {
        self == Kleene::True
    }

    fn not(self) -> Self {
        match self {
            Kleene::True => Kleene::False,
            Kleene::Unknown => Kleene::Unknown,
            Kleene::False => Kleene::True,
        }
    }

    fn and(self, other: Self) -> Self {
        match (self, other) {
            (Kleene::True, Kleene::True) => Kleene::True,
            (Kleene::Unknown, _) | (_, Kleene::Unknown) => Kleene::Unknown,
            _ => Kleene::False,
        }
    }

    fn or(self, other: Self) -> Self {
        match (self, other) {
            (Kleene::True, _) | (_, Kleene::True) => Kleene::True,
            (Kleene::Unknown, _) | (_, Kleene::Unknown) => Kleene::Unknown,
            _ => Kleene::False,
        }
    }

    fn symbol(self) -> char {
        match self {
            Kleene::True => 'T',
            Kleene::Unknown => '?',
            Kleene::False => 'F',
        }
    }
}

fn unsupported(expr: &Expression) -> AnalysisError {
    AnalysisError::UnsupportedExpression {
        domain: "traces",
        expression: expr.to_string(),
    }
}

/// Position of `variable` in the sorted `variables`.
fn position(variables: &[Variable], variable: &Variable) -> Result<usize> {
    variables
        .binary_search(variable)
        .map_err(|_| unsupported(&Expression::Variable(variable.clone())))
}

/// A sequence of valuations, most recent first.
///
/// # Invariants
///
/// Never empty, and every valuation has one value per variable of the owning state.
#[derive(Debug, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct Trace<V> {
    valuations: Vec<Vec<V>>,
}

impl<V: TruthValue> Trace<V> {
    fn new(valuation: Vec<V>) -> Self {
        Trace {
            valuations: vec![valuation],
        }
    }

    /// The most recent valuation.
    pub fn current(&self) -> &[V] {
        &self.valuations[0]
    }

    /// Number of valuations, the current one included.
    pub fn length(&self) -> usize {
        self.valuations.len()
    }

    /// The trace extended by the current valuation with position `k` set to `value`.
    fn extended(&self, k: usize, value: V) -> Trace<V> {
        let mut head = self.current().to_vec();
        head[k] = value;
        let mut valuations = Vec::with_capacity(self.valuations.len() + 1);
        valuations.push(head);
        valuations.extend(self.valuations.iter().cloned());
        Trace { valuations }
    }

    /// Evaluates a boolean expression in the current valuation.
    pub fn evaluate(&self, variables: &[Variable], expr: &Expression) -> Result<V> {
        match expr {
            Expression::Literal(value) => Ok(V::from_literal(value)),
            Expression::Variable(v) => Ok(self.current()[position(variables, v)?]),
            Expression::Not(e) => Ok(self.evaluate(variables, e)?.not()),
            Expression::BinaryBoolean(l, op, r) => {
                let l = self.evaluate(variables, l)?;
                let r = self.evaluate(variables, r)?;
                Ok(match op {
                    BooleanOp::And => l.and(r),
                    BooleanOp::Or => l.or(r),
                })
            }
            _ => Err(unsupported(expr)),
        }
    }
}

impl<V: TruthValue> fmt::Display for Trace<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for valuation in &self.valuations {
            let symbols: String = valuation.iter().map(|v| v.symbol()).collect();
            write!(f, "({})", symbols)?;
        }
        Ok(())
    }
}

type TraceSet<V> = BTreeSet<Trace<V>>;

/// Current valuations of a set of traces. States are compared on these; histories only
/// record how a valuation was reached.
fn valuations<V: TruthValue>(set: &TraceSet<V>) -> BTreeSet<&[V]> {
    set.iter().map(|t| t.current()).collect()
}

/// Sets of traces over a fixed, ordered set of variables.
///
/// # Invariants
///
/// Sets compared or combined must be over the same variables and in the same mode.
#[derive(Debug, Clone)]
pub struct TraceSets<V> {
    variables: Vec<Variable>,
    sets: Vec<TraceSet<V>>,
    inputs: BTreeSet<Variable>,
    hyper: bool,
}

impl<V: TruthValue> TraceSets<V> {
    fn build<I>(variables: I, hyper: bool) -> Self
    where
        I: IntoIterator<Item = Variable>,
    {
        let mut variables: Vec<Variable> = variables.into_iter().collect();
        variables.sort();
        variables.dedup();

        let mut initial: Vec<Vec<V>> = vec![Vec::new()];
        for _ in &variables {
            initial = initial
                .into_iter()
                .flat_map(|prefix| {
                    V::ALL.iter().map(move |&v| {
                        let mut valuation = prefix.clone();
                        valuation.push(v);
                        valuation
                    })
                })
                .collect();
        }
        let traces: Vec<Trace<V>> = initial.into_iter().map(Trace::new).collect();

        let sets = if hyper {
            assert!(
                traces.len() <= MAX_HYPER_TRACES,
                "{} traces are too many for a hyper analysis",
                traces.len()
            );
            (0..1usize << traces.len())
                .map(|mask| {
                    traces
                        .iter()
                        .enumerate()
                        .filter(|(i, _)| mask & (1 << i) != 0)
                        .map(|(_, t)| t.clone())
                        .collect()
                })
                .collect()
        } else {
            vec![traces.into_iter().collect()]
        };

        TraceSets {
            variables,
            sets,
            inputs: BTreeSet::new(),
            hyper,
        }
    }

    pub fn variables(&self) -> &[Variable] {
        &self.variables
    }

    pub fn inputs(&self) -> &BTreeSet<Variable> {
        &self.inputs
    }

    pub fn is_hyper(&self) -> bool {
        self.hyper
    }

    /// All traces, over every set.
    pub fn traces(&self) -> BTreeSet<&Trace<V>> {
        self.sets.iter().flatten().collect()
    }

    /// Number of distinct values `expr` takes over `set`.
    fn variety_in(&self, set: &TraceSet<V>, expr: &Expression) -> Result<usize> {
        let mut values = BTreeSet::new();
        for trace in set {
            values.insert(trace.evaluate(&self.variables, expr)?);
        }
        Ok(values.len())
    }

    /// The largest variety of `variable` over the sets of the state.
    pub fn variety(&self, variable: &Variable) -> Result<usize> {
        let expr = Expression::Variable(variable.clone());
        let mut largest = 0;
        for set in &self.sets {
            largest = largest.max(self.variety_in(set, &expr)?);
        }
        Ok(largest)
    }

    fn assert_compatible(&self, other: &Self) {
        assert!(
            self.variables == other.variables && self.hyper == other.hyper,
            "trace sets are defined over different variables"
        );
    }

    fn zip_with<F>(mut self, other: Self, f: F) -> Self
    where
        F: Fn(TraceSet<V>, TraceSet<V>) -> TraceSet<V>,
    {
        self.assert_compatible(&other);
        self.sets = self.sets.into_iter().zip(other.sets).map(|(a, b)| f(a, b)).collect();
        self
    }

    fn try_map_sets<F>(mut self, f: F) -> Result<Self>
    where
        F: Fn(&Self, &TraceSet<V>) -> Result<TraceSet<V>>,
    {
        let mut sets = Vec::with_capacity(self.sets.len());
        for set in &self.sets {
            sets.push(f(&self, set)?);
        }
        self.sets = sets;
        Ok(self)
    }

    /// Keeps the traces whose current valuation satisfies `condition`. Under `not`, a trace
    /// is kept when the inner condition does not definitely hold.
    fn assume(self, condition: &Expression) -> Result<Self> {
        let (inner, expected) = match condition {
            Expression::Not(inner) => (&**inner, false),
            other => (other, true),
        };
        self.try_map_sets(|state, set| {
            let mut kept = TraceSet::new();
            for trace in set {
                if trace.evaluate(&state.variables, inner)?.holds() == expected {
                    kept.insert(trace.clone());
                }
            }
            Ok(kept)
        })
    }

    /// Extends every trace by the valuations from which `left = right` leads to it.
    fn substitute(mut self, left: &Variable, right: &Expression) -> Result<Self> {
        let k = position(&self.variables, left)?;
        if *right == Expression::Input {
            self.inputs.insert(left.clone());
            return Ok(self);
        }
        self.try_map_sets(|state, set| {
            let mut extended = TraceSet::new();
            for trace in set {
                for &value in V::ALL {
                    let candidate = trace.extended(k, value);
                    if candidate.evaluate(&state.variables, right)? == trace.current()[k] {
                        extended.insert(candidate);
                    }
                }
            }
            Ok(extended)
        })
    }

    /// Drops every set in which some variable of `output` takes more than one value.
    fn output(self, output: &Expression) -> Result<Self> {
        if !self.hyper {
            return Ok(self);
        }
        let ids: Vec<Expression> = output.ids().into_iter().map(Expression::Variable).collect();
        self.try_map_sets(|state, set| {
            for id in &ids {
                if state.variety_in(set, id)? != 1 {
                    return Ok(TraceSet::new());
                }
            }
            Ok(set.clone())
        })
    }

    fn describe(&self, set: &TraceSet<V>) -> String {
        let traces: Vec<String> = set.iter().map(|t| t.to_string()).collect();
        let mut text = traces.join(", ");
        if self.inputs.is_empty() || set.is_empty() {
            return text;
        }
        for input in &self.inputs {
            let variety = self
                .variety_in(set, &Expression::Variable(input.clone()))
                .unwrap_or_default();
            text.push_str(&format!(" {}={}", input, variety));
        }
        let mut indices = Vec::new();
        for input in &self.inputs {
            if let Ok(k) = position(&self.variables, input) {
                indices.push(k);
            }
        }
        let combinations: BTreeSet<Vec<V>> = set
            .iter()
            .map(|t| indices.iter().map(|&k| t.current()[k]).collect())
            .collect();
        text.push_str(&format!(" count={}", combinations.len()));
        text
    }
}

impl<V: TruthValue> PartialEq for TraceSets<V> {
    fn eq(&self, other: &Self) -> bool {
        self.variables == other.variables
            && self.hyper == other.hyper
            && self.inputs == other.inputs
            && self.sets.len() == other.sets.len()
            && self.sets.iter().zip(&other.sets).all(|(a, b)| valuations(a) == valuations(b))
    }
}

impl<V: TruthValue> Eq for TraceSets<V> {}

impl<V: TruthValue> Payload for TraceSets<V> {
    fn less_equal(&self, other: &Self) -> bool {
        self.assert_compatible(other);
        self.inputs.is_subset(&other.inputs)
            && self
                .sets
                .iter()
                .zip(&other.sets)
                .all(|(a, b)| valuations(a).is_subset(&valuations(b)))
    }

    fn join(mut self, other: Self) -> Lifted<Self> {
        self.inputs.extend(other.inputs.iter().cloned());
        Lifted::Element(self.zip_with(other, |mut a, b| {
            a.extend(b);
            a
        }))
    }

    fn meet(mut self, other: Self) -> Lifted<Self> {
        self.inputs.retain(|v| other.inputs.contains(v));
        Lifted::Element(self.zip_with(other, |a, b| {
            let current: BTreeSet<Vec<V>> = b.iter().map(|t| t.current().to_vec()).collect();
            a.into_iter().filter(|t| current.contains(t.current())).collect()
        }))
    }
}

/// Non-hyper states list their traces. Hyper states list the variables, then every maximal
/// non-empty set with the variety of each input and the number of input combinations.
impl<V: TruthValue> fmt::Display for TraceSets<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if !self.hyper {
            return match self.sets.first() {
                Some(set) if !set.is_empty() => write!(f, "{}", self.describe(set)),
                _ => write!(f, "∅"),
            };
        }
        let names: Vec<String> = self.variables.iter().map(|v| v.to_string()).collect();
        write!(f, "{}", names.join(", "))?;

        let mut candidates: Vec<&TraceSet<V>> = self.sets.iter().filter(|s| !s.is_empty()).collect();
        candidates.sort_by(|a, b| b.len().cmp(&a.len()));
        let mut maximal: Vec<&TraceSet<V>> = Vec::new();
        for set in candidates {
            let current = valuations(set);
            if !maximal.iter().any(|m| current.is_subset(&valuations(m))) {
                maximal.push(set);
            }
        }
        if maximal.is_empty() {
            return write!(f, " ∅");
        }
        for set in maximal {
            write!(f, " {{{}}}", self.describe(set))?;
        }
        Ok(())
    }
}

/// Trace analysis state: sets of traces, or Top/Bottom.
pub type Traces<V> = Lifted<TraceSets<V>>;

/// Traces over two-valued variables.
pub type BoolTraces = Traces<bool>;

/// Traces over three-valued variables.
pub type TvlTraces = Traces<Kleene>;

impl<V: TruthValue> Traces<V> {
    /// One set holding a trace for every valuation of `variables`.
    pub fn new<I>(variables: I) -> Self
    where
        I: IntoIterator<Item = Variable>,
    {
        Lifted::Element(TraceSets::build(variables, false))
    }

    /// One set for every subset of the valuations of `variables`.
    ///
    /// # Panics
    ///
    /// Panics if there are more than [`MAX_HYPER_TRACES`] valuations.
    pub fn hyper<I>(variables: I) -> Self
    where
        I: IntoIterator<Item = Variable>,
    {
        Lifted::Element(TraceSets::build(variables, true))
    }

    fn try_map<F>(self, f: F) -> Result<Self>
    where
        F: FnOnce(TraceSets<V>) -> Result<TraceSets<V>>,
    {
        match self {
            Lifted::Element(sets) => Ok(Lifted::Element(f(sets)?)),
            other => Ok(other),
        }
    }
}

impl<V: TruthValue> State for Traces<V> {
    fn assign_variable(self, _left: &Variable, _right: &Expression) -> Result<Self> {
        Err(AnalysisError::UnsupportedOperation {
            domain: "traces",
            operation: "forward assignment",
        })
    }

    fn substitute_variable(self, left: &Variable, right: &Expression) -> Result<Self> {
        self.try_map(|sets| sets.substitute(left, right))
    }

    fn assume_condition(self, condition: &Expression) -> Result<Self> {
        self.try_map(|sets| sets.assume(condition))
    }

    fn output(self, output: &Expression) -> Result<Self> {
        self.try_map(|sets| sets.output(output))
    }
}

#[cfg(test)]
mod tests {
    use test_log::test;

    use super::*;
    use crate::lattice::tests::check_lattice_axioms;
    use crate::lattice::Lattice;

    fn a() -> Variable {
        Variable::from("a")
    }

    fn b() -> Variable {
        Variable::from("b")
    }

    fn var(name: &str) -> Expression {
        Expression::var(name)
    }

    fn sets<V: TruthValue>(state: &Traces<V>) -> &TraceSets<V> {
        state.element().unwrap()
    }

    fn currents(state: &BoolTraces) -> Vec<String> {
        let mut shown: Vec<String> = sets(state)
            .traces()
            .into_iter()
            .map(|t| Trace::new(t.current().to_vec()).to_string())
            .collect();
        shown.dedup();
        shown
    }

    #[test]
    fn test_initial_traces() {
        let state = BoolTraces::new([b(), a()]);
        assert_eq!(sets(&state).variables(), &[a(), b()]);
        assert_eq!(state.to_string(), "(FF), (FT), (TF), (TT)");

        let state = TvlTraces::new([a()]);
        assert_eq!(state.to_string(), "(T), (?), (F)");
    }

    #[test]
    fn test_hyper_enumerates_subsets() {
        let state = BoolTraces::hyper([a(), b()]);
        assert_eq!(sets(&state).sets.len(), 16);
        assert!(sets(&state).sets.iter().any(|s| s.is_empty()));
        assert_eq!(state.to_string(), "a, b {(FF), (FT), (TF), (TT)}");
    }

    #[test]
    #[should_panic(expected = "too many for a hyper analysis")]
    fn test_hyper_is_capped() {
        let _ = TvlTraces::hyper([a(), b(), Variable::from("c")]);
    }

    #[test]
    fn test_assume() {
        let state = BoolTraces::new([a(), b()]);
        let kept = state.clone().assume_condition(&var("a")).unwrap();
        assert_eq!(kept.to_string(), "(TF), (TT)");
        let kept = state.clone().assume_condition(&!var("a")).unwrap();
        assert_eq!(kept.to_string(), "(FF), (FT)");
        let kept = state.assume_condition(&Expression::or(var("a"), var("b"))).unwrap();
        assert_eq!(kept.to_string(), "(FT), (TF), (TT)");

        let state = TvlTraces::new([a()]);
        assert_eq!(state.clone().assume_condition(&var("a")).unwrap().to_string(), "(T)");
        assert_eq!(state.assume_condition(&!var("a")).unwrap().to_string(), "(?), (F)");
    }

    #[test]
    fn test_substitute_extends_traces() {
        // a = not b, with a true afterwards
        let state = BoolTraces::new([a(), b()])
            .assume_condition(&var("a"))
            .unwrap()
            .substitute_variable(&a(), &!var("b"))
            .unwrap();
        assert_eq!(state.to_string(), "(FF)(TF), (TF)(TF)");
        assert_eq!(currents(&state), vec!["(FF)", "(TF)"]);
    }

    #[test]
    fn test_substitute_literal() {
        // a = 1 cannot lead to a false `a`
        let state = BoolTraces::new([a()])
            .assume_condition(&!var("a"))
            .unwrap()
            .substitute_variable(&a(), &Expression::literal(1))
            .unwrap();
        assert_eq!(state.to_string(), "∅");

        let state = TvlTraces::new([a()])
            .assume_condition(&!var("a"))
            .unwrap()
            .substitute_variable(&a(), &Expression::literal(2))
            .unwrap();
        assert_eq!(state.to_string(), "(T)(?), (?)(?), (F)(?)");
    }

    #[test]
    fn test_input_is_recorded() {
        let state = BoolTraces::new([a(), b()]);
        let after = state.clone().substitute_variable(&a(), &Expression::Input).unwrap();
        assert_eq!(sets(&after).inputs(), &BTreeSet::from([a()]));
        assert_eq!(after.to_string(), "(FF), (FT), (TF), (TT) a=2 count=2");
        assert!(state.less_equal(&after));
        assert!(!after.less_equal(&state));
    }

    #[test]
    fn test_output_keeps_uniform_sets() {
        let state = BoolTraces::hyper([a(), b()]).output(&var("a")).unwrap();
        for set in &sets(&state).sets {
            let values: BTreeSet<bool> = set.iter().map(|t| t.current()[0]).collect();
            assert!(values.len() <= 1);
        }
        assert_eq!(sets(&state).variety(&a()).unwrap(), 1);
        assert_eq!(sets(&state).variety(&b()).unwrap(), 2);
        assert_eq!(state.to_string(), "a, b {(TF), (TT)} {(FF), (FT)}");

        // Outside hyper mode, output changes nothing.
        let plain = BoolTraces::new([a(), b()]);
        assert_eq!(plain.clone().output(&var("a")).unwrap(), plain);
    }

    #[test]
    fn test_unsupported() {
        let state = BoolTraces::new([a()]);
        assert!(matches!(
            state.clone().assign_variable(&a(), &var("a")),
            Err(AnalysisError::UnsupportedOperation { .. })
        ));
        let comparison = Expression::compare(var("a"), crate::expr::ComparisonOp::Lt, Expression::literal(1));
        assert!(matches!(
            state.clone().assume_condition(&comparison),
            Err(AnalysisError::UnsupportedExpression { domain: "traces", .. })
        ));
        assert!(matches!(
            state.clone().substitute_variable(&b(), &var("a")),
            Err(AnalysisError::UnsupportedExpression { .. })
        ));
        assert!(matches!(
            state.substitute_variable(&a(), &var("b")),
            Err(AnalysisError::UnsupportedExpression { .. })
        ));
    }

    #[test]
    fn test_histories_do_not_affect_order() {
        let state = BoolTraces::new([a()]);
        let longer = state.clone().substitute_variable(&a(), &var("a")).unwrap();
        assert_eq!(longer.to_string(), "(F)(F), (T)(T)");
        assert!(sets(&longer).traces().iter().all(|t| t.length() == 2));
        assert_eq!(longer, state);
        assert!(longer.less_equal(&state) && state.less_equal(&longer));
    }

    #[test]
    fn test_lattice_axioms() {
        let top = BoolTraces::new([a(), b()]);
        let only_a = top.clone().assume_condition(&var("a")).unwrap();
        let only_b = top.clone().assume_condition(&var("b")).unwrap();
        let with_input = only_a.clone().substitute_variable(&b(), &Expression::Input).unwrap();
        check_lattice_axioms(&[top.bottom(), top.top(), top, only_a, only_b, with_input]);
    }
}
