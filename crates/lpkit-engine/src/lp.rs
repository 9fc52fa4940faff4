//! Solver-facing view of a problem and its reduction to standard form.
//!
//! Every structural column `x_j` with bounds `[l, u]` is rewritten over
//! non-negative variables `v`:
//!
//! * free: `x = v+ - v-`
//! * lower: `x = l + v`
//! * upper: `x = u - v`
//! * double: `x = l + v` with the extra row `v <= u - l`
//! * fixed: `x = l`, no variable
//!
//! Rows become `<=`, `>=` or `=` constraints over `v`; free rows are dropped.

use crate::consts::*;
use crate::prob::Bnds;

#[derive(Debug, Clone)]
pub(crate) struct LpData {
    pub maximize: bool,
    pub obj_const: f64,
    pub cost: Vec<f64>,
    pub rows: Vec<Bnds>,
    pub cols: Vec<Bnds>,
    /// Row-wise coefficients, 0-based column positions.
    pub matrix: Vec<Vec<(usize, f64)>>,
}

impl LpData {
    /// Whether every double-bounded row and column has `lb < ub`.
    pub fn bounds_consistent(&self) -> bool {
        self.rows.iter().chain(self.cols.iter()).all(Bnds::is_consistent)
    }

    pub fn objective(&self, x: &[f64]) -> f64 {
        self.obj_const + self.cost.iter().zip(x).map(|(c, v)| c * v).sum::<f64>()
    }

    pub fn row_activity(&self, x: &[f64]) -> Vec<f64> {
        self.matrix
            .iter()
            .map(|row| row.iter().map(|&(j, a)| a * x[j]).sum())
            .collect()
    }
}

/// Primal and dual values in terms of the original rows and columns.
#[derive(Debug, Clone)]
pub(crate) struct LpPoint {
    pub obj: f64,
    pub row_prim: Vec<f64>,
    pub row_dual: Vec<f64>,
    pub col_prim: Vec<f64>,
    pub col_dual: Vec<f64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Op {
    Le,
    Ge,
    Eq,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Origin {
    Row(usize),
    ColRange,
}

#[derive(Debug, Clone)]
pub(crate) struct StdRow {
    pub coefs: Vec<(usize, f64)>,
    pub op: Op,
    pub rhs: f64,
    origin: Origin,
}

#[derive(Debug, Clone)]
struct ColMap {
    offset: f64,
    terms: Vec<(usize, f64)>,
}

/// `max cost' v` subject to `rows`, `v >= 0`.
#[derive(Debug, Clone)]
pub(crate) struct StandardForm {
    pub n_vars: usize,
    pub rows: Vec<StdRow>,
    pub cost: Vec<f64>,
    maps: Vec<ColMap>,
}

impl StandardForm {
    pub fn build(lp: &LpData) -> Self {
        let mut n_vars = 0;
        let mut maps = Vec::with_capacity(lp.cols.len());
        let mut range_rows = Vec::new();

        for bnds in &lp.cols {
            let map = match bnds.kind {
                FR => {
                    n_vars += 2;
                    ColMap {
                        offset: 0.0,
                        terms: vec![(n_vars - 2, 1.0), (n_vars - 1, -1.0)],
                    }
                }
                LO => {
                    n_vars += 1;
                    ColMap {
                        offset: bnds.lb,
                        terms: vec![(n_vars - 1, 1.0)],
                    }
                }
                UP => {
                    n_vars += 1;
                    ColMap {
                        offset: bnds.ub,
                        terms: vec![(n_vars - 1, -1.0)],
                    }
                }
                DB => {
                    n_vars += 1;
                    range_rows.push(StdRow {
                        coefs: vec![(n_vars - 1, 1.0)],
                        op: Op::Le,
                        rhs: bnds.ub - bnds.lb,
                        origin: Origin::ColRange,
                    });
                    ColMap {
                        offset: bnds.lb,
                        terms: vec![(n_vars - 1, 1.0)],
                    }
                }
                _ => ColMap {
                    offset: bnds.lb,
                    terms: Vec::new(),
                },
            };
            maps.push(map);
        }

        let sense = if lp.maximize { 1.0 } else { -1.0 };
        let mut cost = vec![0.0; n_vars];
        for (map, &c) in maps.iter().zip(&lp.cost) {
            for &(v, coef) in &map.terms {
                cost[v] += sense * c * coef;
            }
        }

        let mut rows = Vec::new();
        for (i, (bnds, entries)) in lp.rows.iter().zip(&lp.matrix).enumerate() {
            if bnds.kind == FR {
                continue;
            }
            let mut shift = 0.0;
            let mut dense: Vec<(usize, f64)> = Vec::new();
            for &(j, a) in entries {
                let map = &maps[j];
                shift += a * map.offset;
                for &(v, coef) in &map.terms {
                    dense.push((v, a * coef));
                }
            }
            let mut push = |op, bound: f64| {
                rows.push(StdRow {
                    coefs: dense.clone(),
                    op,
                    rhs: bound - shift,
                    origin: Origin::Row(i),
                });
            };
            match bnds.kind {
                LO => push(Op::Ge, bnds.lb),
                UP => push(Op::Le, bnds.ub),
                DB => {
                    push(Op::Ge, bnds.lb);
                    push(Op::Le, bnds.ub);
                }
                _ => push(Op::Eq, bnds.lb),
            }
        }
        rows.extend(range_rows);

        Self {
            n_vars,
            rows,
            cost,
            maps,
        }
    }

    /// Structural column values for a point `v`.
    pub fn columns(&self, v: &[f64]) -> Vec<f64> {
        self.maps
            .iter()
            .map(|map| map.offset + map.terms.iter().map(|&(k, coef)| coef * v[k]).sum::<f64>())
            .collect()
    }

    /// Maps a standard-form primal point and the multipliers `y` of the
    /// standard-form rows (in the maximization sense) back onto `lp`.
    pub fn recover(&self, lp: &LpData, v: &[f64], y: &[f64]) -> LpPoint {
        let col_prim = self.columns(v);
        let row_prim = lp.row_activity(&col_prim);
        let sense = if lp.maximize { 1.0 } else { -1.0 };

        let mut row_dual = vec![0.0; lp.rows.len()];
        for (std_row, &yk) in self.rows.iter().zip(y) {
            if let Origin::Row(i) = std_row.origin {
                row_dual[i] += sense * yk;
            }
        }

        let mut col_dual = lp.cost.clone();
        for (entries, &pi) in lp.matrix.iter().zip(&row_dual) {
            for &(j, a) in entries {
                col_dual[j] -= a * pi;
            }
        }

        LpPoint {
            obj: lp.objective(&col_prim),
            row_prim,
            row_dual,
            col_prim,
            col_dual,
        }
    }
}
