//! Parameter blocks passed to the solve entry points.

use std::ffi::c_int;

use crate::consts::*;

/// Simplex control parameters.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Smcp {
    /// Message level (`MSG_*`).
    pub msg_lev: c_int,
    /// Simplex method option (`PRIMAL`, `DUALP`, `DUAL`).
    pub meth: c_int,
    /// Pricing technique (`PT_STD`, `PT_PSE`).
    pub pricing: c_int,
    /// Ratio test technique (`RT_STD`, `RT_HAR`).
    pub r_test: c_int,
    /// Tolerance used to check primal feasibility.
    pub tol_bnd: f64,
    /// Tolerance used to check dual feasibility.
    pub tol_dj: f64,
    /// Tolerance used to choose eligible pivot elements.
    pub tol_piv: f64,
    /// Lower limit of the objective function.
    pub obj_ll: f64,
    /// Upper limit of the objective function.
    pub obj_ul: f64,
    /// Simplex iteration limit.
    pub it_lim: c_int,
    /// Time limit in milliseconds.
    pub tm_lim: c_int,
    /// Output frequency in iterations.
    pub out_frq: c_int,
    /// Output delay in milliseconds.
    pub out_dly: c_int,
    /// Run the engine-side presolver.
    pub presolve: c_int,
}

impl Default for Smcp {
    fn default() -> Self {
        Self {
            msg_lev: MSG_ALL,
            meth: PRIMAL,
            pricing: PT_PSE,
            r_test: RT_HAR,
            tol_bnd: 1e-7,
            tol_dj: 1e-7,
            tol_piv: 1e-9,
            obj_ll: -f64::MAX,
            obj_ul: f64::MAX,
            it_lim: c_int::MAX,
            tm_lim: c_int::MAX,
            out_frq: 500,
            out_dly: 0,
            presolve: OFF,
        }
    }
}

/// Interior-point control parameters.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Iptcp {
    /// Message level (`MSG_*`).
    pub msg_lev: c_int,
    /// Ordering algorithm (`ORD_*`).
    pub ord_alg: c_int,
}

impl Default for Iptcp {
    fn default() -> Self {
        Self {
            msg_lev: MSG_ALL,
            ord_alg: ORD_AMD,
        }
    }
}

/// Branch-and-cut control parameters.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Iocp {
    /// Message level (`MSG_*`).
    pub msg_lev: c_int,
    /// Branching technique (`BR_*`).
    pub br_tech: c_int,
    /// Backtracking technique (`BT_*`).
    pub bt_tech: c_int,
    /// Absolute tolerance used to check integrality.
    pub tol_int: f64,
    /// Relative tolerance used to compare objective values.
    pub tol_obj: f64,
    /// Time limit in milliseconds.
    pub tm_lim: c_int,
    /// Output frequency in milliseconds.
    pub out_frq: c_int,
    /// Output delay in milliseconds.
    pub out_dly: c_int,
    /// Preprocessing technique (`PP_*`).
    pub pp_tech: c_int,
    /// Relative MIP gap tolerance.
    pub mip_gap: f64,
    /// Mixed integer rounding cuts.
    pub mir_cuts: c_int,
    /// Gomory's mixed integer cuts.
    pub gmi_cuts: c_int,
    /// Mixed cover cuts.
    pub cov_cuts: c_int,
    /// Clique cuts.
    pub clq_cuts: c_int,
    /// Solve the LP relaxation internally instead of requiring an optimal basis.
    pub presolve: c_int,
    /// Replace general integer columns by binary ones (presolve only).
    pub binarize: c_int,
}

impl Default for Iocp {
    fn default() -> Self {
        Self {
            msg_lev: MSG_ALL,
            br_tech: BR_DTH,
            bt_tech: BT_BLB,
            tol_int: 1e-5,
            tol_obj: 1e-7,
            tm_lim: c_int::MAX,
            out_frq: 5000,
            out_dly: 10000,
            pp_tech: PP_ALL,
            mip_gap: 0.0,
            mir_cuts: OFF,
            gmi_cuts: OFF,
            cov_cuts: OFF,
            clq_cuts: OFF,
            presolve: OFF,
            binarize: OFF,
        }
    }
}

/// Per-handle call counters.
#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Stats {
    /// Calls to `simplex`.
    pub simplex_calls: u64,
    /// Calls to `interior`.
    pub interior_calls: u64,
    /// Calls to `intopt`, whether or not a search followed.
    pub intopt_calls: u64,
    /// Calls to `intopt` that entered the tree search.
    pub searches: u64,
    /// Branch-and-bound nodes solved across all searches.
    pub nodes: u64,
}
