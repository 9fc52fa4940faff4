//! Mehrotra predictor-corrector interior-point method on dense normal equations.
//!
//! Works on `min c'z  s.t.  Az = b, z >= 0`, built from the standard form by
//! adding one slack (or surplus) column per inequality row.

use std::ffi::c_int;

use tracing::{debug, info, warn};

use crate::consts::*;
use crate::lp::{LpData, LpPoint, Op, StandardForm};
use crate::params::Iptcp;
use crate::simplex::LpOutcome;

const MAX_ITERATIONS: usize = 100;
const STALL_ITERATIONS: usize = 30;
const TOLERANCE: f64 = 1e-9;
const DIVERGENCE: f64 = 1e12;
const STEP_DAMPING: f64 = 0.99;

type Matrix = Vec<Vec<f64>>;

fn dot(a: &[f64], b: &[f64]) -> f64 {
    a.iter().zip(b).map(|(x, y)| x * y).sum()
}

fn norm_inf(a: &[f64]) -> f64 {
    a.iter().fold(0.0, |acc: f64, x| acc.max(x.abs()))
}

/// `A x`
fn mul(a: &Matrix, x: &[f64]) -> Vec<f64> {
    a.iter().map(|row| dot(row, x)).collect()
}

/// `A' y`
fn mul_t(a: &Matrix, y: &[f64], n: usize) -> Vec<f64> {
    let mut out = vec![0.0; n];
    for (row, &yi) in a.iter().zip(y) {
        for (o, &aij) in out.iter_mut().zip(row) {
            *o += aij * yi;
        }
    }
    out
}

/// `A diag(d) A'`
fn normal_matrix(a: &Matrix, d: &[f64]) -> Matrix {
    let m = a.len();
    let mut out = vec![vec![0.0; m]; m];
    for i in 0..m {
        for k in 0..=i {
            let v: f64 = a[i].iter().zip(&a[k]).zip(d).map(|((x, y), w)| x * y * w).sum();
            out[i][k] = v;
            out[k][i] = v;
        }
    }
    out
}

/// Lower Cholesky factor. Pivots that vanish (dependent rows) are replaced by
/// a huge value so the corresponding direction is effectively dropped.
fn cholesky(a: &Matrix) -> Option<Matrix> {
    let n = a.len();
    let max_diag = (0..n).map(|i| a[i][i].abs()).fold(0.0, f64::max).max(1.0);
    let mut l = vec![vec![0.0; n]; n];
    for j in 0..n {
        let mut d = a[j][j] - (0..j).map(|k| l[j][k] * l[j][k]).sum::<f64>();
        if !d.is_finite() {
            return None;
        }
        if d <= 1e-30 * max_diag {
            d = 1e128;
        }
        l[j][j] = d.sqrt();
        for i in (j + 1)..n {
            let s = a[i][j] - (0..j).map(|k| l[i][k] * l[j][k]).sum::<f64>();
            l[i][j] = s / l[j][j];
        }
    }
    Some(l)
}

/// Solves `L L' x = r`.
fn cholesky_solve(l: &Matrix, r: &[f64]) -> Vec<f64> {
    let n = l.len();
    let mut y = r.to_vec();
    for i in 0..n {
        let s: f64 = (0..i).map(|k| l[i][k] * y[k]).sum();
        y[i] = (y[i] - s) / l[i][i];
    }
    for i in (0..n).rev() {
        let s: f64 = ((i + 1)..n).map(|k| l[k][i] * y[k]).sum();
        y[i] = (y[i] - s) / l[i][i];
    }
    y
}

/// Largest `alpha <= 1` keeping `x + alpha * dx >= 0`.
fn max_step(x: &[f64], dx: &[f64]) -> f64 {
    x.iter()
        .zip(dx)
        .filter(|&(_, &d)| d < 0.0)
        .map(|(&xi, &d)| -xi / d)
        .fold(1.0, f64::min)
}

struct EqualityForm {
    a: Matrix,
    b: Vec<f64>,
    c: Vec<f64>,
    n: usize,
}

impl EqualityForm {
    fn build(sf: &StandardForm) -> Self {
        let n_slack = sf.rows.iter().filter(|row| row.op != Op::Eq).count();
        let n = sf.n_vars + n_slack;
        let mut a = vec![vec![0.0; n]; sf.rows.len()];
        let mut b = Vec::with_capacity(sf.rows.len());
        let mut slack = sf.n_vars;
        for (i, row) in sf.rows.iter().enumerate() {
            for &(j, coef) in &row.coefs {
                a[i][j] += coef;
            }
            match row.op {
                Op::Le => {
                    a[i][slack] = 1.0;
                    slack += 1;
                }
                Op::Ge => {
                    a[i][slack] = -1.0;
                    slack += 1;
                }
                Op::Eq => {}
            }
            b.push(row.rhs);
        }
        let mut c: Vec<f64> = sf.cost.iter().map(|&cj| -cj).collect();
        c.resize(n, 0.0);
        Self { a, b, c, n }
    }
}

struct Iterate {
    x: Vec<f64>,
    lambda: Vec<f64>,
    s: Vec<f64>,
}

/// Interior-point driver holding the control parameters of one call.
pub(crate) struct Interior<'a> {
    parm: &'a Iptcp,
}

impl<'a> Interior<'a> {
    pub fn new(parm: &'a Iptcp) -> Self {
        Self { parm }
    }

    pub fn solve(self, lp: &LpData) -> LpOutcome {
        if lp.rows.is_empty() || lp.cols.is_empty() {
            if self.parm.msg_lev >= MSG_ERR {
                warn!(component = "engine", operation = "interior", "problem has no rows/columns");
            }
            return outcome(EFAIL, UNDEF, None, 0);
        }
        if !lp.bounds_consistent() {
            if self.parm.msg_lev >= MSG_ERR {
                warn!(component = "engine", operation = "interior", "incorrect bounds");
            }
            return outcome(EFAIL, UNDEF, None, 0);
        }

        let sf = StandardForm::build(lp);
        let eq = EqualityForm::build(&sf);
        if self.parm.msg_lev >= MSG_ON {
            info!(
                component = "engine",
                operation = "interior",
                rows = eq.a.len(),
                columns = eq.n,
                ordering = self.parm.ord_alg,
                "starting interior-point method"
            );
        }

        if eq.a.is_empty() {
            // Only sign constraints remain: bounded iff no cost pulls a variable up.
            if eq.c.iter().any(|&cj| cj < -TOLERANCE) {
                return outcome(ENOFEAS, UNBND, None, 0);
            }
            let point = sf.recover(lp, &vec![0.0; sf.n_vars], &[]);
            return outcome(OK, OPT, Some(point), 0);
        }

        let Some(mut it) = self.start(&eq) else {
            return outcome(EINSTAB, UNDEF, None, 0);
        };

        let b_norm = 1.0 + norm_inf(&eq.b);
        let c_norm = 1.0 + norm_inf(&eq.c);
        let mut best_merit = f64::INFINITY;
        let mut stalled = 0;

        for iteration in 0..MAX_ITERATIONS {
            let r_b: Vec<f64> = mul(&eq.a, &it.x).iter().zip(&eq.b).map(|(ax, b)| ax - b).collect();
            let r_c: Vec<f64> = mul_t(&eq.a, &it.lambda, eq.n)
                .iter()
                .zip(&it.s)
                .zip(&eq.c)
                .map(|((aty, s), c)| aty + s - c)
                .collect();
            let pobj = dot(&eq.c, &it.x);
            let dobj = dot(&eq.b, &it.lambda);
            let merit = (norm_inf(&r_b) / b_norm)
                .max(norm_inf(&r_c) / c_norm)
                .max((pobj - dobj).abs() / (1.0 + pobj.abs()));

            if !merit.is_finite() {
                return outcome(EINSTAB, UNDEF, None, iteration as u64);
            }
            if self.parm.msg_lev >= MSG_ALL {
                debug!(
                    component = "engine",
                    operation = "interior",
                    iteration,
                    primal_objective = pobj,
                    dual_objective = dobj,
                    merit,
                    "iterate"
                );
            }
            if merit < TOLERANCE {
                let point = self.recover(lp, &sf, &it);
                if self.parm.msg_lev >= MSG_ON {
                    info!(component = "engine", operation = "interior", iteration, objective = point.obj, "optimal solution found");
                }
                return outcome(OK, OPT, Some(point), iteration as u64);
            }
            let (x_growth, lambda_growth) = (norm_inf(&it.x) / b_norm, norm_inf(&it.lambda) / c_norm);
            if x_growth > DIVERGENCE || lambda_growth > DIVERGENCE {
                // Diverging primal iterates mean an unbounded primal; diverging
                // multipliers mean an unbounded dual, so no primal point exists.
                let status = if x_growth > lambda_growth { UNBND } else { NOFEAS };
                if self.parm.msg_lev >= MSG_ERR {
                    warn!(
                        component = "engine",
                        operation = "interior",
                        iteration,
                        unbounded = status == UNBND,
                        "iterates diverge"
                    );
                }
                return outcome(ENOFEAS, status, None, iteration as u64);
            }
            if merit < 0.5 * best_merit {
                best_merit = merit;
                stalled = 0;
            } else {
                stalled += 1;
                if stalled >= STALL_ITERATIONS {
                    return outcome(ENOCVG, UNDEF, None, iteration as u64);
                }
            }

            let d: Vec<f64> = it.x.iter().zip(&it.s).map(|(x, s)| x / s).collect();
            let Some(l) = cholesky(&normal_matrix(&eq.a, &d)) else {
                return outcome(EINSTAB, UNDEF, None, iteration as u64);
            };
            let newton = |rxs: &[f64]| -> (Vec<f64>, Vec<f64>, Vec<f64>) {
                let t: Vec<f64> = rxs
                    .iter()
                    .zip(&it.s)
                    .zip(d.iter().zip(&r_c))
                    .map(|((r, s), (di, rc))| r / s + di * rc)
                    .collect();
                let rhs: Vec<f64> = mul(&eq.a, &t).iter().zip(&r_b).map(|(at, rb)| -rb - at).collect();
                let dl = cholesky_solve(&l, &rhs);
                let ds: Vec<f64> = mul_t(&eq.a, &dl, eq.n)
                    .iter()
                    .zip(&r_c)
                    .map(|(atdl, rc)| -rc - atdl)
                    .collect();
                let dx: Vec<f64> = rxs
                    .iter()
                    .zip(it.x.iter().zip(&it.s))
                    .zip(&ds)
                    .map(|((r, (x, s)), dsi)| (r - x * dsi) / s)
                    .collect();
                (dx, dl, ds)
            };

            let mu = dot(&it.x, &it.s) / eq.n as f64;
            let rxs_aff: Vec<f64> = it.x.iter().zip(&it.s).map(|(x, s)| -x * s).collect();
            let (dx_aff, _, ds_aff) = newton(&rxs_aff);
            let ap = max_step(&it.x, &dx_aff);
            let ad = max_step(&it.s, &ds_aff);
            let mu_aff = it
                .x
                .iter()
                .zip(&dx_aff)
                .zip(it.s.iter().zip(&ds_aff))
                .map(|((x, dx), (s, ds))| (x + ap * dx) * (s + ad * ds))
                .sum::<f64>()
                / eq.n as f64;
            let sigma = (mu_aff / mu).powi(3);

            let rxs: Vec<f64> = rxs_aff
                .iter()
                .zip(dx_aff.iter().zip(&ds_aff))
                .map(|(r, (dx, ds))| r - dx * ds + sigma * mu)
                .collect();
            let (dx, dl, ds) = newton(&rxs);
            let ap = (STEP_DAMPING * max_step(&it.x, &dx)).min(1.0);
            let ad = (STEP_DAMPING * max_step(&it.s, &ds)).min(1.0);

            for (x, dxi) in it.x.iter_mut().zip(&dx) {
                *x += ap * dxi;
            }
            for (y, dyi) in it.lambda.iter_mut().zip(&dl) {
                *y += ad * dyi;
            }
            for (s, dsi) in it.s.iter_mut().zip(&ds) {
                *s += ad * dsi;
            }
        }

        if self.parm.msg_lev >= MSG_ERR {
            warn!(component = "engine", operation = "interior", "iteration limit exceeded");
        }
        outcome(EITLIM, UNDEF, Some(self.recover(lp, &sf, &it)), MAX_ITERATIONS as u64)
    }

    /// Mehrotra's starting point heuristic.
    fn start(&self, eq: &EqualityForm) -> Option<Iterate> {
        let aat = normal_matrix(&eq.a, &vec![1.0; eq.n]);
        let l = cholesky(&aat)?;
        let mut x = mul_t(&eq.a, &cholesky_solve(&l, &eq.b), eq.n);
        let lambda = cholesky_solve(&l, &mul(&eq.a, &eq.c));
        let aty = mul_t(&eq.a, &lambda, eq.n);
        let mut s: Vec<f64> = eq.c.iter().zip(&aty).map(|(c, a)| c - a).collect();

        let shift_x = (-1.5 * x.iter().copied().fold(f64::INFINITY, f64::min)).max(0.0);
        let shift_s = (-1.5 * s.iter().copied().fold(f64::INFINITY, f64::min)).max(0.0);
        x.iter_mut().for_each(|v| *v += shift_x);
        s.iter_mut().for_each(|v| *v += shift_s);

        let xs = dot(&x, &s);
        let sum_x: f64 = x.iter().sum();
        let sum_s: f64 = s.iter().sum();
        let dx = if sum_s > 0.0 { 0.5 * xs / sum_s } else { 0.0 };
        let ds = if sum_x > 0.0 { 0.5 * xs / sum_x } else { 0.0 };
        for v in &mut x {
            *v += dx;
            if !(*v > 1e-8) {
                *v = 1.0;
            }
        }
        for v in &mut s {
            *v += ds;
            if !(*v > 1e-8) {
                *v = 1.0;
            }
        }
        Some(Iterate { x, lambda, s })
    }

    fn recover(&self, lp: &LpData, sf: &StandardForm, it: &Iterate) -> LpPoint {
        let y: Vec<f64> = it.lambda.iter().map(|l| -l).collect();
        sf.recover(lp, &it.x[..sf.n_vars], &y)
    }
}

fn outcome(ret: c_int, status: c_int, point: Option<LpPoint>, iterations: u64) -> LpOutcome {
    LpOutcome {
        ret,
        status,
        point,
        iterations,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lp::tests::production_lp;
    use crate::prob::Bnds;
    use approx::assert_abs_diff_eq;

    fn quiet() -> Iptcp {
        Iptcp {
            msg_lev: MSG_OFF,
            ..Iptcp::default()
        }
    }

    #[test]
    fn test_cholesky_solves_spd_system() {
        let a = vec![vec![4.0, 2.0], vec![2.0, 3.0]];
        let l = cholesky(&a).unwrap();
        let x = cholesky_solve(&l, &[2.0, 1.0]);
        assert_abs_diff_eq!(x[0], 0.5, epsilon = 1e-12);
        assert_abs_diff_eq!(x[1], 0.0, epsilon = 1e-12);
    }

    #[test]
    fn test_production_problem() {
        let out = Interior::new(&quiet()).solve(&production_lp());
        assert_eq!(out.ret, OK);
        assert_eq!(out.status, OPT);
        let point = out.point.unwrap();
        assert_abs_diff_eq!(point.obj, 135.0, epsilon = 1e-5);
        assert_abs_diff_eq!(point.col_prim[0], 20.0, epsilon = 1e-5);
        assert_abs_diff_eq!(point.col_prim[1], 15.0, epsilon = 1e-5);
        assert_abs_diff_eq!(point.row_dual[0], 1.125, epsilon = 1e-5);
        assert_abs_diff_eq!(point.row_dual[1], 0.25, epsilon = 1e-5);
    }

    #[test]
    fn test_minimization_with_equality() {
        // min x + 2y s.t. x + y = 3, x <= 2, x, y >= 0
        let lp = LpData {
            maximize: false,
            obj_const: 0.0,
            cost: vec![1.0, 2.0],
            rows: vec![Bnds::new(FX, 3.0, 3.0)],
            cols: vec![Bnds::new(DB, 0.0, 2.0), Bnds::new(LO, 0.0, 0.0)],
            matrix: vec![vec![(0, 1.0), (1, 1.0)]],
        };
        let out = Interior::new(&quiet()).solve(&lp);
        assert_eq!(out.status, OPT);
        let point = out.point.unwrap();
        assert_abs_diff_eq!(point.col_prim[0], 2.0, epsilon = 1e-5);
        assert_abs_diff_eq!(point.col_prim[1], 1.0, epsilon = 1e-5);
        assert_abs_diff_eq!(point.obj, 4.0, epsilon = 1e-5);
    }

    #[test]
    fn test_unbounded_primal_is_reported_unbounded() {
        // max x + y s.t. x - y <= 1, x, y >= 0
        let lp = LpData {
            maximize: true,
            obj_const: 0.0,
            cost: vec![1.0, 1.0],
            rows: vec![Bnds::new(UP, 0.0, 1.0)],
            cols: vec![Bnds::new(LO, 0.0, 0.0), Bnds::new(LO, 0.0, 0.0)],
            matrix: vec![vec![(0, 1.0), (1, -1.0)]],
        };
        let out = Interior::new(&quiet()).solve(&lp);
        assert_eq!(out.ret, ENOFEAS);
        assert_eq!(out.status, UNBND);
        assert!(out.point.is_none());
    }

    #[test]
    fn test_requires_rows_and_columns() {
        let mut lp = production_lp();
        lp.rows.clear();
        lp.matrix.clear();
        assert_eq!(Interior::new(&quiet()).solve(&lp).ret, EFAIL);
    }
}
