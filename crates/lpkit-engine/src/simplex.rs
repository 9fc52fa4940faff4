//! Two-phase primal simplex over a dense tableau.

use std::ffi::c_int;
use std::time::Instant;

use tracing::{debug, info, warn};

use crate::consts::*;
use crate::lp::{LpData, LpPoint, Op, StandardForm};
use crate::params::Smcp;

/// Consecutive degenerate pivots tolerated before switching to Bland's rule.
const DEGENERATE_STREAK: usize = 50;

/// Result of one simplex run.
#[derive(Debug, Clone)]
pub(crate) struct LpOutcome {
    /// Return code of the entry point.
    pub ret: c_int,
    /// Status of the basic solution.
    pub status: c_int,
    pub point: Option<LpPoint>,
    pub iterations: u64,
}

impl LpOutcome {
    fn failed(ret: c_int) -> Self {
        Self {
            ret,
            status: UNDEF,
            point: None,
            iterations: 0,
        }
    }
}

enum Phase {
    Optimal,
    Unbounded,
    Limit(c_int),
}

struct Tableau {
    /// Constraint rows followed by the objective row; the last column is the rhs.
    data: Vec<Vec<f64>>,
    basic: Vec<usize>,
    n_vars: usize,
    n_slack: usize,
    n_artificial: usize,
    /// Per constraint row: the column holding its identity entry and that entry's sign.
    unit: Vec<(usize, f64)>,
    /// Rows multiplied by -1 to make the rhs non-negative.
    flipped: Vec<bool>,
}

impl Tableau {
    fn build(sf: &StandardForm) -> Self {
        let m = sf.rows.len();
        let mut n_slack = 0;
        let mut n_artificial = 0;
        let mut ops = Vec::with_capacity(m);
        for row in &sf.rows {
            let op = if row.rhs < 0.0 {
                match row.op {
                    Op::Le => Op::Ge,
                    Op::Ge => Op::Le,
                    Op::Eq => Op::Eq,
                }
            } else {
                row.op
            };
            match op {
                Op::Le => n_slack += 1,
                Op::Ge => {
                    n_slack += 1;
                    n_artificial += 1;
                }
                Op::Eq => n_artificial += 1,
            }
            ops.push(op);
        }

        let n_vars = sf.n_vars;
        let total_cols = n_vars + n_slack + n_artificial + 1;
        let mut tableau = Tableau {
            data: vec![vec![0.0; total_cols]; m + 1],
            basic: vec![0; m],
            n_vars,
            n_slack,
            n_artificial,
            unit: Vec::with_capacity(m),
            flipped: Vec::with_capacity(m),
        };

        let mut slack_idx = n_vars;
        let mut artificial_idx = n_vars + n_slack;
        for (i, (row, op)) in sf.rows.iter().zip(ops).enumerate() {
            let flip = row.rhs < 0.0;
            let sign = if flip { -1.0 } else { 1.0 };
            for &(j, a) in &row.coefs {
                tableau.data[i][j] += sign * a;
            }
            tableau.data[i][total_cols - 1] = sign * row.rhs;
            tableau.flipped.push(flip);

            match op {
                Op::Le => {
                    tableau.data[i][slack_idx] = 1.0;
                    tableau.basic[i] = slack_idx;
                    tableau.unit.push((slack_idx, 1.0));
                    slack_idx += 1;
                }
                Op::Ge => {
                    tableau.data[i][slack_idx] = -1.0;
                    tableau.unit.push((slack_idx, -1.0));
                    slack_idx += 1;
                    tableau.data[i][artificial_idx] = 1.0;
                    tableau.basic[i] = artificial_idx;
                    artificial_idx += 1;
                }
                Op::Eq => {
                    tableau.data[i][artificial_idx] = 1.0;
                    tableau.basic[i] = artificial_idx;
                    tableau.unit.push((artificial_idx, 1.0));
                    artificial_idx += 1;
                }
            }
        }

        let obj_row = m;
        for (j, &c) in sf.cost.iter().enumerate() {
            tableau.data[obj_row][j] = c;
        }
        tableau
    }

    fn m(&self) -> usize {
        self.data.len() - 1
    }

    fn rhs_col(&self) -> usize {
        self.data[0].len() - 1
    }

    fn artificial_start(&self) -> usize {
        self.n_vars + self.n_slack
    }

    fn pivot(&mut self, row: usize, col: usize) {
        self.basic[row] = col;
        let pivot_val = self.data[row][col];
        for value in &mut self.data[row] {
            *value /= pivot_val;
        }
        let pivot_row = self.data[row].clone();
        for (i, current) in self.data.iter_mut().enumerate() {
            if i == row {
                continue;
            }
            let factor = current[col];
            if factor != 0.0 {
                for (value, &p) in current.iter_mut().zip(&pivot_row) {
                    *value -= factor * p;
                }
            }
        }
    }

    /// Current values of the standard-form variables.
    fn values(&self) -> Vec<f64> {
        let rhs = self.rhs_col();
        let mut v = vec![0.0; self.n_vars];
        for (i, &b) in self.basic.iter().enumerate() {
            if b < self.n_vars {
                v[b] = self.data[i][rhs].max(0.0);
            }
        }
        v
    }

    /// Row multipliers in the maximization sense, one per standard-form row.
    fn multipliers(&self) -> Vec<f64> {
        let obj_row = self.m();
        self.unit
            .iter()
            .zip(&self.flipped)
            .map(|(&(col, sign), &flip)| {
                let y = -self.data[obj_row][col] * sign;
                if flip { -y } else { y }
            })
            .collect()
    }
}

/// Primal simplex driver holding the control parameters of one call.
pub(crate) struct Simplex<'a> {
    parm: &'a Smcp,
    started: Instant,
    iterations: u64,
    degenerate: usize,
}

impl<'a> Simplex<'a> {
    pub fn new(parm: &'a Smcp) -> Self {
        Self {
            parm,
            started: Instant::now(),
            iterations: 0,
            degenerate: 0,
        }
    }

    /// Solves `lp`, reporting results the way the `simplex` entry point does.
    pub fn solve(mut self, lp: &LpData) -> LpOutcome {
        if lp.cols.is_empty() {
            if self.parm.msg_lev >= MSG_ERR {
                warn!(component = "engine", operation = "simplex", "problem has no columns");
            }
            return LpOutcome::failed(EFAIL);
        }
        if !lp.bounds_consistent() {
            if self.parm.msg_lev >= MSG_ERR {
                warn!(component = "engine", operation = "simplex", "incorrect bounds");
            }
            return LpOutcome::failed(EBOUND);
        }

        let sf = StandardForm::build(lp);
        let mut tableau = Tableau::build(&sf);
        if self.parm.msg_lev >= MSG_ON {
            info!(
                component = "engine",
                operation = "simplex",
                rows = lp.rows.len(),
                columns = lp.cols.len(),
                tableau_rows = tableau.m(),
                "starting primal simplex"
            );
        }

        if tableau.n_artificial > 0 {
            match self.phase1(&mut tableau) {
                Phase::Optimal => {}
                Phase::Unbounded => {
                    return self.finish(lp, &sf, &tableau, OK, NOFEAS);
                }
                Phase::Limit(code) => {
                    return self.finish(lp, &sf, &tableau, code, INFEAS);
                }
            }
        }

        let (ret, status) = match self.phase2(lp, &sf, &mut tableau) {
            Phase::Optimal => (OK, OPT),
            Phase::Unbounded => (OK, UNBND),
            Phase::Limit(code) => (code, FEAS),
        };
        self.finish(lp, &sf, &tableau, ret, status)
    }

    fn finish(
        &self,
        lp: &LpData,
        sf: &StandardForm,
        tableau: &Tableau,
        ret: c_int,
        status: c_int,
    ) -> LpOutcome {
        let point = sf.recover(lp, &tableau.values(), &tableau.multipliers());
        let (ret, status) = match (self.parm.presolve == ON, ret, status) {
            (true, OK, NOFEAS) => (ENOPFS, UNDEF),
            (true, OK, UNBND) => (ENODFS, UNDEF),
            other => (other.1, other.2),
        };
        if self.parm.msg_lev >= MSG_ON {
            info!(
                component = "engine",
                operation = "simplex",
                ret,
                status,
                iterations = self.iterations,
                objective = point.obj,
                "simplex finished"
            );
        }
        LpOutcome {
            ret,
            status,
            point: Some(point),
            iterations: self.iterations,
        }
    }

    fn limit_reached(&self) -> Option<c_int> {
        if self.iterations >= self.parm.it_lim.max(0) as u64 {
            return Some(EITLIM);
        }
        if self.started.elapsed().as_millis() >= self.parm.tm_lim.max(0) as u128 {
            return Some(ETMLIM);
        }
        None
    }

    /// Drives the artificial variables to zero. `Unbounded` here means the
    /// original problem has no feasible point.
    fn phase1(&mut self, tableau: &mut Tableau) -> Phase {
        let m = tableau.m();
        let n_cols = tableau.data[0].len();
        let art_start = tableau.artificial_start();

        let orig_obj = tableau.data[m].clone();
        for value in &mut tableau.data[m] {
            *value = 0.0;
        }
        for j in art_start..(art_start + tableau.n_artificial) {
            tableau.data[m][j] = -1.0;
        }
        for i in 0..m {
            if tableau.basic[i] >= art_start {
                for j in 0..n_cols {
                    tableau.data[m][j] += tableau.data[i][j];
                }
            }
        }

        loop {
            if let Some(code) = self.limit_reached() {
                tableau.data[m] = orig_obj;
                return Phase::Limit(code);
            }
            let Some(col) = self.choose_column(tableau, n_cols - 1) else {
                break;
            };
            let Some(row) = self.choose_row(tableau, col) else {
                break;
            };
            self.step(tableau, row, col, "phase1");
        }

        let rhs = n_cols - 1;
        let infeasible = (0..m)
            .any(|i| tableau.basic[i] >= art_start && tableau.data[i][rhs] > self.parm.tol_bnd);

        // Pivot zero-valued artificials out of the basis where possible; rows
        // where that fails are redundant.
        for i in 0..m {
            if tableau.basic[i] < art_start || infeasible {
                continue;
            }
            if let Some(j) = (0..art_start).find(|&j| tableau.data[i][j].abs() > self.parm.tol_piv) {
                tableau.pivot(i, j);
            }
        }

        tableau.data[m] = orig_obj;
        for i in 0..m {
            let basic = tableau.basic[i];
            let ratio = tableau.data[m][basic];
            if ratio != 0.0 {
                for j in 0..n_cols {
                    tableau.data[m][j] -= ratio * tableau.data[i][j];
                }
            }
        }

        if infeasible { Phase::Unbounded } else { Phase::Optimal }
    }

    fn phase2(&mut self, lp: &LpData, sf: &StandardForm, tableau: &mut Tableau) -> Phase {
        let exclude_from = tableau.artificial_start();
        let check_objective = self.parm.obj_ll > -f64::MAX || self.parm.obj_ul < f64::MAX;

        loop {
            if let Some(code) = self.limit_reached() {
                return Phase::Limit(code);
            }
            let Some(col) = self.choose_column(tableau, exclude_from) else {
                return Phase::Optimal;
            };
            let Some(row) = self.choose_row(tableau, col) else {
                return Phase::Unbounded;
            };
            self.step(tableau, row, col, "phase2");

            if check_objective {
                let obj = lp.objective(&sf.columns(&tableau.values()));
                if !lp.maximize && obj < self.parm.obj_ll {
                    return Phase::Limit(EOBJLL);
                }
                if lp.maximize && obj > self.parm.obj_ul {
                    return Phase::Limit(EOBJUL);
                }
            }
        }
    }

    fn step(&mut self, tableau: &mut Tableau, row: usize, col: usize, phase: &'static str) {
        let rhs = tableau.rhs_col();
        if tableau.data[row][rhs].abs() <= self.parm.tol_bnd {
            self.degenerate += 1;
        } else {
            self.degenerate = 0;
        }
        tableau.pivot(row, col);
        self.iterations += 1;

        let out_frq = self.parm.out_frq.max(1) as u64;
        if self.parm.msg_lev >= MSG_ALL && self.iterations % out_frq == 0 {
            let m = tableau.m();
            debug!(
                component = "engine",
                operation = "simplex",
                phase,
                iteration = self.iterations,
                objective = -tableau.data[m][rhs],
                "pivot"
            );
        }
    }

    fn bland(&self) -> bool {
        self.degenerate >= DEGENERATE_STREAK
    }

    /// Entering column among `0..limit` with a positive reduced cost.
    fn choose_column(&self, tableau: &Tableau, limit: usize) -> Option<usize> {
        let obj_row = tableau.m();
        let tol = self.parm.tol_dj;

        if self.bland() {
            return (0..limit).find(|&j| tableau.data[obj_row][j] > tol);
        }

        let mut best_score = 0.0;
        let mut best_col = None;
        for j in 0..limit {
            let dj = tableau.data[obj_row][j];
            if dj <= tol {
                continue;
            }
            let score = if self.parm.pricing == PT_PSE {
                let norm: f64 = (0..obj_row).map(|i| tableau.data[i][j].powi(2)).sum();
                dj * dj / (1.0 + norm)
            } else {
                dj
            };
            if score > best_score {
                best_score = score;
                best_col = Some(j);
            }
        }
        best_col
    }

    /// Leaving row for entering column `col`, or `None` if the column is unbounded.
    fn choose_row(&self, tableau: &Tableau, col: usize) -> Option<usize> {
        let m = tableau.m();
        let rhs = tableau.rhs_col();
        let tol_piv = self.parm.tol_piv;
        let eligible = || (0..m).filter(move |&i| tableau.data[i][col] > tol_piv);

        if self.parm.r_test == RT_HAR && !self.bland() {
            // Harris two-pass: relax the bounds to find the step limit, then
            // take the largest pivot among rows within it.
            let theta = eligible()
                .map(|i| (tableau.data[i][rhs].max(0.0) + self.parm.tol_bnd) / tableau.data[i][col])
                .fold(f64::INFINITY, f64::min);
            if theta.is_infinite() {
                return None;
            }
            return eligible()
                .filter(|&i| tableau.data[i][rhs].max(0.0) / tableau.data[i][col] <= theta)
                .max_by(|&a, &b| tableau.data[a][col].total_cmp(&tableau.data[b][col]));
        }

        let mut min_ratio = f64::INFINITY;
        let mut min_row: Option<usize> = None;
        for i in eligible() {
            let ratio = tableau.data[i][rhs].max(0.0) / tableau.data[i][col];
            let better = ratio < min_ratio
                || (ratio == min_ratio
                    && min_row.is_some_and(|r| tableau.basic[i] < tableau.basic[r]));
            if better {
                min_ratio = ratio;
                min_row = Some(i);
            }
        }
        min_row
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lp::tests::production_lp;
    use crate::prob::Bnds;
    use approx::assert_abs_diff_eq;

    fn quiet() -> Smcp {
        Smcp {
            msg_lev: MSG_OFF,
            ..Smcp::default()
        }
    }

    #[test]
    fn test_simple_maximization() {
        let out = Simplex::new(&quiet()).solve(&production_lp());
        assert_eq!(out.ret, OK);
        assert_eq!(out.status, OPT);
        let point = out.point.unwrap();
        assert_abs_diff_eq!(point.obj, 135.0, epsilon = 1e-9);
        assert_abs_diff_eq!(point.col_prim[0], 20.0, epsilon = 1e-9);
        assert_abs_diff_eq!(point.col_prim[1], 15.0, epsilon = 1e-9);
        assert_abs_diff_eq!(point.row_prim[2], 35.0, epsilon = 1e-9);
    }

    #[test]
    fn test_duals_of_binding_rows() {
        let point = Simplex::new(&quiet()).solve(&production_lp()).point.unwrap();
        // binding rows 1 and 2: 2a + 3b = 3, 4a + 2b = 5
        assert_abs_diff_eq!(point.row_dual[0], 1.125, epsilon = 1e-9);
        assert_abs_diff_eq!(point.row_dual[1], 0.25, epsilon = 1e-9);
        assert_abs_diff_eq!(point.row_dual[2], 0.0, epsilon = 1e-9);
        assert_abs_diff_eq!(point.col_dual[0], 0.0, epsilon = 1e-9);
        assert_abs_diff_eq!(point.col_dual[1], 0.0, epsilon = 1e-9);
    }

    #[test]
    fn test_minimization_with_ge() {
        // min 2x + 3y s.t. x + y >= 4, 0 <= x <= 3, 0 <= y <= 3
        let lp = LpData {
            maximize: false,
            obj_const: 1.0,
            cost: vec![2.0, 3.0],
            rows: vec![Bnds::new(LO, 4.0, 0.0)],
            cols: vec![Bnds::new(DB, 0.0, 3.0), Bnds::new(DB, 0.0, 3.0)],
            matrix: vec![vec![(0, 1.0), (1, 1.0)]],
        };
        let out = Simplex::new(&quiet()).solve(&lp);
        assert_eq!(out.status, OPT);
        let point = out.point.unwrap();
        assert_abs_diff_eq!(point.col_prim[0], 3.0, epsilon = 1e-9);
        assert_abs_diff_eq!(point.col_prim[1], 1.0, epsilon = 1e-9);
        assert_abs_diff_eq!(point.obj, 10.0, epsilon = 1e-9);
        assert_abs_diff_eq!(point.row_dual[0], 3.0, epsilon = 1e-9);
        assert_abs_diff_eq!(point.col_dual[0], -1.0, epsilon = 1e-9);
    }

    #[test]
    fn test_infeasible() {
        let lp = LpData {
            maximize: false,
            obj_const: 0.0,
            cost: vec![1.0, 1.0],
            rows: vec![Bnds::new(UP, 0.0, 1.0), Bnds::new(LO, 2.0, 0.0)],
            cols: vec![Bnds::new(LO, 0.0, 0.0), Bnds::new(LO, 0.0, 0.0)],
            matrix: vec![vec![(0, 1.0), (1, 1.0)], vec![(0, 1.0), (1, 1.0)]],
        };
        let out = Simplex::new(&quiet()).solve(&lp);
        assert_eq!(out.ret, OK);
        assert_eq!(out.status, NOFEAS);

        let presolved = Smcp {
            presolve: ON,
            ..quiet()
        };
        assert_eq!(Simplex::new(&presolved).solve(&lp).ret, ENOPFS);
    }

    #[test]
    fn test_unbounded() {
        let mut lp = production_lp();
        lp.rows.truncate(0);
        lp.matrix.truncate(0);
        let out = Simplex::new(&quiet()).solve(&lp);
        assert_eq!(out.ret, OK);
        assert_eq!(out.status, UNBND);
    }

    #[test]
    fn test_equality_and_free_column() {
        // min x s.t. x - y = -2, y in [0, 5], x free
        let lp = LpData {
            maximize: false,
            obj_const: 0.0,
            cost: vec![1.0, 0.0],
            rows: vec![Bnds::new(FX, -2.0, -2.0)],
            cols: vec![Bnds::free(), Bnds::new(DB, 0.0, 5.0)],
            matrix: vec![vec![(0, 1.0), (1, -1.0)]],
        };
        let out = Simplex::new(&quiet()).solve(&lp);
        assert_eq!(out.status, OPT);
        let point = out.point.unwrap();
        assert_abs_diff_eq!(point.col_prim[0], -2.0, epsilon = 1e-9);
        assert_abs_diff_eq!(point.col_prim[1], 0.0, epsilon = 1e-9);
        assert_abs_diff_eq!(point.row_dual[0], 1.0, epsilon = 1e-9);
    }

    #[test]
    fn test_iteration_limit_reports_feasible_basis() {
        let parm = Smcp {
            it_lim: 1,
            ..quiet()
        };
        let out = Simplex::new(&parm).solve(&production_lp());
        assert_eq!(out.ret, EITLIM);
        assert_eq!(out.status, FEAS);
    }

    #[test]
    fn test_iteration_limit_in_phase_one() {
        let lp = LpData {
            maximize: false,
            obj_const: 0.0,
            cost: vec![1.0],
            rows: vec![Bnds::new(LO, 3.0, 0.0)],
            cols: vec![Bnds::new(LO, 0.0, 0.0)],
            matrix: vec![vec![(0, 1.0)]],
        };
        let parm = Smcp {
            it_lim: 0,
            ..quiet()
        };
        let out = Simplex::new(&parm).solve(&lp);
        assert_eq!(out.ret, EITLIM);
        assert_eq!(out.status, INFEAS);
    }

    #[test]
    fn test_objective_upper_limit() {
        let parm = Smcp {
            obj_ul: 50.0,
            ..quiet()
        };
        let out = Simplex::new(&parm).solve(&production_lp());
        assert_eq!(out.ret, EOBJUL);
        assert_eq!(out.status, FEAS);
    }

    #[test]
    fn test_standard_pricing_and_ratio_test() {
        let parm = Smcp {
            pricing: PT_STD,
            r_test: RT_STD,
            ..quiet()
        };
        let out = Simplex::new(&parm).solve(&production_lp());
        assert_eq!(out.status, OPT);
        assert_abs_diff_eq!(out.point.unwrap().obj, 135.0, epsilon = 1e-9);
    }

    #[test]
    fn test_rejects_bad_bounds_and_empty_problems() {
        let mut lp = production_lp();
        lp.cols[0] = Bnds::new(DB, 2.0, 1.0);
        assert_eq!(Simplex::new(&quiet()).solve(&lp).ret, EBOUND);

        lp.cols.clear();
        lp.cost.clear();
        assert_eq!(Simplex::new(&quiet()).solve(&lp).ret, EFAIL);
    }
}
