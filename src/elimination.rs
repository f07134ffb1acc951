use rayon::prelude::*;

/// Dense square matrix of transition rates between teams, row-major.
///
/// Column `j` holds the flow out of (diagonal) and into (off-diagonal) team
/// `j`, so every column sums to zero. Its transpose is the walker's generator.
#[derive(Debug, Clone, PartialEq)]
pub struct RateMatrix {
    n: usize,
    data: Vec<f64>,
}

/// Result of back substitution on a reduced matrix.
#[derive(Debug, Clone, PartialEq)]
pub struct NullVector {
    pub values: Vec<f64>,
    /// Rows that reduced to an empty equation and were given a base value.
    pub free_rows: usize,
}

impl RateMatrix {
    pub fn zeros(n: usize) -> Self {
        Self {
            n,
            data: vec![0.0; n * n],
        }
    }

    pub fn size(&self) -> usize {
        self.n
    }

    pub fn get(&self, i: usize, j: usize) -> f64 {
        self.data[i * self.n + j]
    }

    pub fn add(&mut self, i: usize, j: usize, v: f64) {
        self.data[i * self.n + j] += v;
    }

    pub fn row(&self, i: usize) -> &[f64] {
        &self.data[i * self.n..(i + 1) * self.n]
    }

    fn row_mut(&mut self, i: usize) -> &mut [f64] {
        &mut self.data[i * self.n..(i + 1) * self.n]
    }

    /// Record one game: `to_home` of the visitor's walkers move to the home
    /// side and `1 - to_home` of the home side's walkers move the other way.
    pub fn add_game(&mut self, home: usize, visitor: usize, to_home: f64) {
        let to_visitor = 1.0 - to_home;
        self.add(home, home, -to_visitor);
        self.add(home, visitor, to_home);
        self.add(visitor, visitor, -to_home);
        self.add(visitor, home, to_visitor);
    }

    /// Row sums of the generator (the transpose), i.e. column sums here.
    pub fn generator_row_sums(&self) -> Vec<f64> {
        (0..self.n)
            .map(|j| (0..self.n).map(|i| self.get(i, j)).sum())
            .collect()
    }

    pub fn mul_vec(&self, v: &[f64]) -> Vec<f64> {
        (0..self.n)
            .map(|i| self.row(i).iter().zip(v).map(|(a, b)| a * b).sum())
            .collect()
    }

    /// Forward row elimination. Each pivot row is scaled so its pivot is 1
    /// and cleared from every row below; pivots at or under `tolerance` are
    /// zeroed and their row left as is.
    pub fn reduce(&self, tolerance: f64) -> RateMatrix {
        let n = self.n;
        let mut y = self.clone();
        for i in 0..n {
            let pivot = y.get(i, i);
            if pivot.abs() <= tolerance {
                y.data[i * n + i] = 0.0;
                continue;
            }
            for v in y.row_mut(i) {
                *v /= pivot;
            }
            let (head, below) = y.data.split_at_mut((i + 1) * n);
            let pivot_row = &head[i * n..];
            below.par_chunks_mut(n).for_each(|row| {
                let factor = row[i];
                if factor == 0.0 {
                    return;
                }
                for (dst, src) in row[i..].iter_mut().zip(&pivot_row[i..]) {
                    *dst -= factor * src;
                }
            });
        }
        y
    }

    /// Back substitution on a reduced matrix, last row first. A row whose
    /// value comes out exactly zero starts a new free block with value 1.
    pub fn back_substitute(&self) -> NullVector {
        let n = self.n;
        let mut values = vec![0.0; n];
        let mut free_rows = 0;
        for i in (0..n).rev() {
            let row = self.row(i);
            let v: f64 = -(i + 1..n).map(|j| row[j] * values[j]).sum::<f64>();
            values[i] = if v == 0.0 {
                free_rows += 1;
                1.0
            } else {
                v
            };
        }
        NullVector { values, free_rows }
    }
}

/// Euclidean norm.
pub fn norm(v: &[f64]) -> f64 {
    v.iter().map(|x| x * x).sum::<f64>().sqrt()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn games_conserve_walkers() {
        let mut d = RateMatrix::zeros(3);
        d.add_game(0, 1, 0.8);
        d.add_game(1, 2, 0.3);
        d.add_game(2, 0, 0.55);
        for s in d.generator_row_sums() {
            assert!(s.abs() < 1e-12);
        }
    }

    #[test]
    fn two_team_equilibrium_matches_the_split() {
        let mut d = RateMatrix::zeros(2);
        d.add_game(0, 1, 0.75);
        let reduced = d.reduce(1e-12);
        let null = reduced.back_substitute();
        assert_eq!(null.free_rows, 1);
        // home keeps 3 walkers for every 1 the visitor keeps
        assert!((null.values[0] / null.values[1] - 3.0).abs() < 1e-12);
        assert!(norm(&d.mul_vec(&null.values)) < 1e-12);
    }

    #[test]
    fn tiny_pivots_are_skipped() {
        let mut d = RateMatrix::zeros(2);
        d.add(0, 0, 1e-14);
        d.add(1, 1, 2.0);
        let reduced = d.reduce(1e-12);
        assert_eq!(reduced.get(0, 0), 0.0);
        assert_eq!(reduced.get(1, 1), 1.0);
    }

    #[test]
    fn disjoint_blocks_count_as_free_rows() {
        let mut d = RateMatrix::zeros(4);
        d.add_game(0, 1, 0.6);
        d.add_game(2, 3, 0.4);
        let null = d.reduce(1e-12).back_substitute();
        assert_eq!(null.free_rows, 2);
        assert!(norm(&d.mul_vec(&null.values)) < 1e-12);
    }
}
