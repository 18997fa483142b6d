//! Coherent difference-bound matrices in half-matrix storage.
//!
//! A matrix over `n` variables has `2n` indices: `2k` stands for `+v_k` and `2k + 1` for
//! `-v_k`. Entry `m[i][j]` bounds `V_j - V_i`, where `V` is the signed variable of the index.
//! Coherence `m[i][j] = m[j^1][i^1]` means only the lower half (row `i` up to column `i | 1`)
//! needs to be stored; accesses above it are redirected to the twin entry.

use std::fmt;

use num_bigint::BigInt;

use crate::interval::Bound;

#[derive(Debug, Clone, Eq, PartialEq, Hash)]
pub struct Dbm {
    rows: Vec<Vec<Bound>>,
}

/// Index of the positive (`+v`) or negative (`-v`) form of variable `k`.
pub fn index(k: usize, positive: bool) -> usize {
    if positive {
        2 * k
    } else {
        2 * k + 1
    }
}

/// `floor(b / 2)` on finite bounds.
pub fn halve(bound: &Bound) -> Bound {
    match bound {
        Bound::Finite(v) => Bound::Finite(v >> 1u32),
        other => other.clone(),
    }
}

fn row_len(i: usize) -> usize {
    (i / 2 + 1) * 2
}

impl Dbm {
    /// The unconstrained matrix over `variables` variables.
    pub fn new(variables: usize) -> Self {
        let mut dbm = Dbm { rows: Vec::new() };
        dbm.resize(variables);
        dbm
    }

    /// Number of indices (twice the number of variables).
    pub fn dim(&self) -> usize {
        self.rows.len()
    }

    pub fn variables(&self) -> usize {
        self.rows.len() / 2
    }

    /// Grows with unconstrained variables or drops trailing ones.
    pub fn resize(&mut self, variables: usize) {
        let dim = 2 * variables;
        self.rows.truncate(dim);
        for i in self.rows.len()..dim {
            let mut row = vec![Bound::PosInf; row_len(i)];
            row[i] = Bound::zero();
            self.rows.push(row);
        }
    }

    fn position(i: usize, j: usize) -> (usize, usize) {
        if j > (i | 1) {
            (j ^ 1, i ^ 1)
        } else {
            (i, j)
        }
    }

    pub fn get(&self, i: usize, j: usize) -> &Bound {
        let (i, j) = Dbm::position(i, j);
        &self.rows[i][j]
    }

    /// Sets `m[i][j]` (and, implicitly, its coherent twin).
    pub fn set(&mut self, i: usize, j: usize, value: Bound) {
        let (i, j) = Dbm::position(i, j);
        self.rows[i][j] = value;
    }

    /// Lowers `m[i][j]` to `value` if that is tighter.
    pub fn tighten(&mut self, i: usize, j: usize, value: Bound) {
        if value < *self.get(i, j) {
            self.set(i, j, value);
        }
    }

    /// Every stored entry, row by row.
    pub fn entries(&self) -> impl Iterator<Item = (usize, usize, &Bound)> {
        self.rows
            .iter()
            .enumerate()
            .flat_map(|(i, row)| row.iter().enumerate().map(move |(j, b)| (i, j, b)))
    }

    /// Combines two matrices of the same dimension entry by entry.
    pub fn zip_with<F>(&self, other: &Dbm, mut f: F) -> Dbm
    where
        F: FnMut(&Bound, &Bound) -> Bound,
    {
        assert_eq!(self.dim(), other.dim(), "matrices have different dimensions");
        let rows = self
            .rows
            .iter()
            .zip(&other.rows)
            .map(|(a, b)| a.iter().zip(b).map(|(x, y)| f(x, y)).collect())
            .collect();
        Dbm { rows }
    }

    /// Removes every constraint involving variable `k`.
    pub fn forget(&mut self, k: usize) {
        for i in [2 * k, 2 * k + 1] {
            for j in 0..self.dim() {
                if i != j {
                    self.set(i, j, Bound::PosInf);
                    self.set(j, i, Bound::PosInf);
                }
            }
        }
    }

    /// Tight integer closure. Returns `false` if the constraints are unsatisfiable,
    /// in which case the matrix is left in an unspecified state.
    pub fn close(&mut self) -> bool {
        let dim = self.dim();

        // Shortest paths.
        for k in 0..dim {
            for i in 0..dim {
                let ik = self.get(i, k).clone();
                if ik == Bound::PosInf {
                    continue;
                }
                for j in 0..dim {
                    let via = ik.add_upper(self.get(k, j));
                    self.tighten(i, j, via);
                }
            }
        }
        for i in 0..dim {
            if *self.get(i, i) < Bound::zero() {
                return false;
            }
            self.set(i, i, Bound::zero());
        }

        // Unary bounds on integers are even.
        for i in 0..dim {
            if let Bound::Finite(v) = self.get(i, i ^ 1) {
                let even = (v >> 1u32) << 1u32;
                self.set(i, i ^ 1, Bound::Finite(even));
            }
        }
        for i in (0..dim).step_by(2) {
            let sum = self.get(i, i + 1).add_upper(self.get(i + 1, i));
            if sum < Bound::zero() {
                return false;
            }
        }

        // Strong coherence.
        for i in 0..dim {
            for j in 0..dim {
                if i == j {
                    continue;
                }
                let via = halve(&self.get(i, i ^ 1).add_upper(self.get(j ^ 1, j)));
                self.tighten(i, j, via);
            }
        }
        true
    }
}

impl fmt::Display for Dbm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for i in 0..self.dim() {
            let row: Vec<String> = (0..self.dim()).map(|j| self.get(i, j).to_string()).collect();
            writeln!(f, "{}", row.join("\t"))?;
        }
        Ok(())
    }
}

/// `2 · value` as a bound.
pub fn double(value: &BigInt) -> Bound {
    Bound::Finite(value * 2)
}

/// Whether `bound` carries no constraint.
pub fn is_unbounded(bound: &Bound) -> bool {
    *bound == Bound::PosInf
}
