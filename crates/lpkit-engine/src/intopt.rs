//! Branch-and-bound search over LP relaxations.

use std::collections::VecDeque;
use std::ffi::c_int;
use std::time::Instant;

use tracing::{debug, info, warn};

use crate::consts::*;
use crate::lp::LpData;
use crate::params::{Iocp, Smcp};
use crate::prob::{Bnds, Prob};
use crate::simplex::Simplex;

/// Open subproblem: column bounds plus the objective bound inherited from
/// its parent, in minimization sense.
#[derive(Debug, Clone)]
struct Node {
    cols: Vec<Bnds>,
    bound: f64,
    depth: usize,
}

struct Incumbent {
    obj: f64,
    x: Vec<f64>,
}

/// Branch-and-bound driver holding the control parameters of one call.
pub(crate) struct IntOpt<'a> {
    parm: &'a Iocp,
    started: Instant,
}

impl<'a> IntOpt<'a> {
    pub fn new(parm: &'a Iocp) -> Self {
        Self {
            parm,
            started: Instant::now(),
        }
    }

    /// Runs the search and stores the integer solution in `prob`.
    pub fn solve(self, prob: &mut Prob) -> c_int {
        prob.stats.intopt_calls += 1;
        let lp = prob.lp_data();

        if lp.cols.is_empty() {
            self.report_error("problem has no columns");
            return EFAIL;
        }
        let integral_bounds = prob.cols.iter().all(|col| {
            col.kind != IV || (is_integral(col.bnds.lb) && is_integral(col.bnds.ub))
        });
        if !lp.bounds_consistent() || !integral_bounds {
            self.report_error("incorrect bounds");
            return EBOUND;
        }

        if self.parm.presolve == ON {
            let relaxation = Simplex::new(&self.node_parm()).solve(&lp);
            match relaxation.status {
                OPT => {}
                NOFEAS => {
                    prob.mip.status = NOFEAS;
                    return ENOPFS;
                }
                UNBND => return ENODFS,
                _ => return EFAIL,
            }
        } else if prob.sim.status != OPT {
            self.report_error("optimal basis to initial LP relaxation not provided");
            return EROOT;
        }

        prob.stats.searches += 1;
        let integer: Vec<usize> = (0..lp.cols.len()).filter(|&j| prob.cols[j].kind == IV).collect();
        let search = self.search(&lp, &integer);
        prob.stats.nodes += search.nodes;

        let sense = if lp.maximize { -1.0 } else { 1.0 };
        let mip = &mut prob.mip;
        match &search.incumbent {
            Some(inc) => {
                mip.obj = lp.objective(&inc.x);
                mip.row_val = lp.row_activity(&inc.x);
                mip.col_val = inc.x.clone();
            }
            None => {
                mip.obj = 0.0;
                mip.row_val = vec![0.0; lp.rows.len()];
                mip.col_val = vec![0.0; lp.cols.len()];
            }
        }
        mip.bound = sense * search.bound;
        mip.status = match (search.ret, search.incumbent.is_some()) {
            (OK, true) => OPT,
            (OK, false) => NOFEAS,
            (_, true) => FEAS,
            (_, false) => UNDEF,
        };

        if self.parm.msg_lev >= MSG_ON {
            info!(
                component = "engine",
                operation = "intopt",
                ret = search.ret,
                status = mip.status,
                nodes = search.nodes,
                objective = mip.obj,
                bound = mip.bound,
                "integer optimization finished"
            );
        }
        search.ret
    }

    fn report_error(&self, message: &str) {
        if self.parm.msg_lev >= MSG_ERR {
            warn!(component = "engine", operation = "intopt", "{message}");
        }
    }

    /// Simplex parameters for node relaxations.
    fn node_parm(&self) -> Smcp {
        Smcp {
            msg_lev: MSG_OFF,
            tm_lim: self.parm.tm_lim,
            ..Smcp::default()
        }
    }

    fn time_left(&self) -> bool {
        self.started.elapsed().as_millis() < self.parm.tm_lim.max(0) as u128
    }

    fn search(&self, lp: &LpData, integer: &[usize]) -> Search {
        let sense = if lp.maximize { -1.0 } else { 1.0 };
        let node_parm = self.node_parm();
        let mut open: VecDeque<Node> = VecDeque::new();
        open.push_back(Node {
            cols: lp.cols.clone(),
            bound: f64::NEG_INFINITY,
            depth: 0,
        });
        let mut incumbent: Option<Incumbent> = None;
        let mut nodes = 0;
        let mut node_lp = lp.clone();

        while let Some(node) = self.select(&mut open) {
            if !self.time_left() {
                open.push_back(node);
                return Search::stopped(ETMLIM, open, incumbent, nodes);
            }
            if let Some(inc) = &incumbent {
                if self.gap(inc.obj, best_bound(&open, &node, inc.obj)) <= self.parm.mip_gap
                    && self.parm.mip_gap > 0.0
                {
                    open.push_back(node);
                    return Search::stopped(EMIPGAP, open, incumbent, nodes);
                }
                if self.pruned(node.bound, inc.obj) {
                    continue;
                }
            }

            nodes += 1;
            node_lp.cols.clone_from(&node.cols);
            let relaxed = Simplex::new(&node_parm).solve(&node_lp);
            if relaxed.ret == ETMLIM {
                open.push_back(node);
                return Search::stopped(ETMLIM, open, incumbent, nodes);
            }
            let Some(point) = relaxed.point.filter(|_| relaxed.status == OPT) else {
                continue;
            };
            let obj = sense * point.obj;
            if incumbent.as_ref().is_some_and(|inc| self.pruned(obj, inc.obj)) {
                continue;
            }

            let Some(j) = self.branching_column(integer, &point.col_prim) else {
                let mut x = point.col_prim;
                for &j in integer {
                    x[j] = x[j].round();
                }
                if self.parm.msg_lev >= MSG_ALL {
                    debug!(component = "engine", operation = "intopt", node = nodes, objective = point.obj, "new incumbent");
                }
                incumbent = Some(Incumbent { obj, x });
                continue;
            };

            let value = point.col_prim[j];
            let current = node.cols[j];
            let mut down = node.clone();
            down.cols[j] = Bnds::from_values(current.lb, value.floor());
            let mut up = node;
            up.cols[j] = Bnds::from_values(value.ceil(), current.ub);
            for child in [&mut down, &mut up] {
                child.bound = obj;
                child.depth += 1;
            }
            // Depth-first search explores the branch nearer the LP value first.
            if value - value.floor() < 0.5 {
                open.push_back(up);
                open.push_back(down);
            } else {
                open.push_back(down);
                open.push_back(up);
            }
        }

        let bound = incumbent.as_ref().map_or(f64::INFINITY, |inc| inc.obj);
        Search {
            ret: OK,
            incumbent,
            bound,
            nodes,
        }
    }

    fn select(&self, open: &mut VecDeque<Node>) -> Option<Node> {
        match self.parm.bt_tech {
            BT_DFS => open.pop_back(),
            BT_BFS => open.pop_front(),
            _ => {
                // Best local bound; ties go to the deepest node.
                let best = open
                    .iter()
                    .enumerate()
                    .min_by(|(_, a), (_, b)| a.bound.total_cmp(&b.bound).then(b.depth.cmp(&a.depth)))
                    .map(|(i, _)| i)?;
                open.remove(best)
            }
        }
    }

    /// Whether a subproblem bounded by `bound` cannot improve on `incumbent`.
    fn pruned(&self, bound: f64, incumbent: f64) -> bool {
        bound >= incumbent - self.parm.tol_obj * (1.0 + incumbent.abs())
    }

    fn gap(&self, incumbent: f64, bound: f64) -> f64 {
        (incumbent - bound).abs() / (incumbent.abs() + f64::EPSILON)
    }

    fn branching_column(&self, integer: &[usize], x: &[f64]) -> Option<usize> {
        let frac = |j: &usize| {
            let f = x[*j] - x[*j].floor();
            f.min(1.0 - f)
        };
        let mut fractional = integer.iter().filter(|j| frac(j) > self.parm.tol_int);
        match self.parm.br_tech {
            BR_FFV => fractional.next().copied(),
            BR_LFV => fractional.last().copied(),
            // Remaining rules (including the Driebeck-Tomlin and pseudocost
            // heuristics) branch on the most fractional column.
            _ => fractional.max_by(|a, b| frac(a).total_cmp(&frac(b))).copied(),
        }
    }
}

struct Search {
    ret: c_int,
    incumbent: Option<Incumbent>,
    /// Best proven bound in minimization sense.
    bound: f64,
    nodes: u64,
}

impl Search {
    fn stopped(ret: c_int, open: VecDeque<Node>, incumbent: Option<Incumbent>, nodes: u64) -> Self {
        let open_bound = open.iter().map(|node| node.bound).fold(f64::INFINITY, f64::min);
        let bound = match &incumbent {
            Some(inc) => open_bound.min(inc.obj),
            None => open_bound,
        };
        Self {
            ret,
            incumbent,
            bound,
            nodes,
        }
    }
}

fn best_bound(open: &VecDeque<Node>, current: &Node, incumbent: f64) -> f64 {
    open.iter()
        .map(|node| node.bound)
        .fold(current.bound, f64::min)
        .min(incumbent)
}

fn is_integral(value: f64) -> bool {
    !value.is_finite() || value == value.floor()
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    fn quiet() -> Iocp {
        Iocp {
            msg_lev: MSG_OFF,
            ..Iocp::default()
        }
    }

    /// max 5x + 4y s.t. 6x + 4y <= 24, x + 2y <= 6, x, y >= 0 integer.
    /// LP optimum (3, 1.5) = 21; integer optimum (4, 0) = 20.
    fn knapsack_like() -> Prob {
        let mut prob = Prob::new();
        prob.dir = MAX;
        prob.add_rows(2);
        prob.add_cols(2);
        prob.rows[0].bnds = Bnds::new(UP, 0.0, 24.0);
        prob.rows[1].bnds = Bnds::new(UP, 0.0, 6.0);
        prob.set_mat_row(0, [(0, 6.0), (1, 4.0)]);
        prob.set_mat_row(1, [(0, 1.0), (1, 2.0)]);
        for (col, obj) in prob.cols.iter_mut().zip([5.0, 4.0]) {
            col.kind = IV;
            col.bnds = Bnds::new(LO, 0.0, 0.0);
            col.obj = obj;
        }
        prob
    }

    fn solve_relaxation(prob: &mut Prob) {
        let parm = Smcp {
            msg_lev: MSG_OFF,
            ..Smcp::default()
        };
        let out = Simplex::new(&parm).solve(&prob.lp_data());
        prob.sim.status = out.status;
    }

    #[test]
    fn test_requires_root_basis() {
        let mut prob = knapsack_like();
        assert_eq!(IntOpt::new(&quiet()).solve(&mut prob), EROOT);
        assert_eq!(prob.stats.intopt_calls, 1);
        assert_eq!(prob.stats.searches, 0);
    }

    #[test]
    fn test_finds_integer_optimum() {
        for bt_tech in [BT_DFS, BT_BFS, BT_BLB] {
            for br_tech in [BR_FFV, BR_LFV, BR_MFV] {
                let mut prob = knapsack_like();
                solve_relaxation(&mut prob);
                let parm = Iocp {
                    bt_tech,
                    br_tech,
                    ..quiet()
                };
                assert_eq!(IntOpt::new(&parm).solve(&mut prob), OK);
                assert_eq!(prob.mip.status, OPT);
                assert_abs_diff_eq!(prob.mip.obj, 20.0, epsilon = 1e-9);
                assert_abs_diff_eq!(prob.mip.col_val[0], 4.0, epsilon = 1e-9);
                assert_abs_diff_eq!(prob.mip.col_val[1], 0.0, epsilon = 1e-9);
                assert_abs_diff_eq!(prob.mip.bound, 20.0, epsilon = 1e-9);
            }
        }
    }

    #[test]
    fn test_presolve_solves_relaxation_itself() {
        let mut prob = knapsack_like();
        let parm = Iocp {
            presolve: ON,
            ..quiet()
        };
        assert_eq!(IntOpt::new(&parm).solve(&mut prob), OK);
        assert_eq!(prob.mip.status, OPT);
    }

    #[test]
    fn test_integer_infeasible() {
        // 2x = 3 has no integer solution
        let mut prob = Prob::new();
        prob.add_rows(1);
        prob.add_cols(1);
        prob.rows[0].bnds = Bnds::new(FX, 3.0, 3.0);
        prob.set_mat_row(0, [(0, 2.0)]);
        prob.cols[0].kind = IV;
        prob.cols[0].bnds = Bnds::new(DB, 0.0, 5.0);
        solve_relaxation(&mut prob);
        assert_eq!(IntOpt::new(&quiet()).solve(&mut prob), OK);
        assert_eq!(prob.mip.status, NOFEAS);
    }

    #[test]
    fn test_time_limit() {
        let mut prob = knapsack_like();
        solve_relaxation(&mut prob);
        let parm = Iocp {
            tm_lim: 0,
            ..quiet()
        };
        assert_eq!(IntOpt::new(&parm).solve(&mut prob), ETMLIM);
        assert_eq!(prob.mip.status, UNDEF);
    }

    #[test]
    fn test_rejects_fractional_integer_bounds() {
        let mut prob = knapsack_like();
        prob.cols[0].bnds = Bnds::new(DB, 0.0, 2.5);
        solve_relaxation(&mut prob);
        assert_eq!(IntOpt::new(&quiet()).solve(&mut prob), EBOUND);
    }
}
