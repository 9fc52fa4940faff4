//! Handle-based entry points.
//!
//! Every function takes a raw problem pointer obtained from [`create_prob`]
//! or [`copy_prob`]. Rows and columns are numbered from 1. Arrays of indices
//! and values follow the sentinel layout: position 0 is never read and the
//! `len` entries occupy positions `1..=len`, so every array must hold at least
//! `len + 1` elements.
//!
//! Misuse the engine can detect (row or column numbers out of range, bad
//! codes, negative counts) aborts with a panic naming the offending call.
//!
//! # Safety
//!
//! Unless stated otherwise, every function requires that `p` came from
//! [`create_prob`] or [`copy_prob`], has not been passed to [`delete_prob`],
//! and is not used concurrently from another thread.

use std::ffi::{CStr, CString, c_char, c_int};
use std::ptr;

use tracing::trace;

use crate::consts::*;
use crate::interior::Interior;
use crate::intopt::IntOpt;
use crate::params::{Iocp, Iptcp, Smcp, Stats};
use crate::prob::{Bnds, LpSol, Prob};
use crate::simplex::{LpOutcome, Simplex};

unsafe fn prob_mut<'a>(p: *mut Prob, func: &str) -> &'a mut Prob {
    assert!(!p.is_null(), "{func}: null problem pointer");
    // SAFETY: non-null and valid per the module contract.
    unsafe { &mut *p }
}

unsafe fn prob_ref<'a>(p: *const Prob, func: &str) -> &'a Prob {
    assert!(!p.is_null(), "{func}: null problem pointer");
    // SAFETY: non-null and valid per the module contract.
    unsafe { &*p }
}

fn row_pos(prob: &Prob, i: c_int, func: &str) -> usize {
    assert!(
        i >= 1 && i as usize <= prob.m(),
        "{func}: i = {i}; row number out of range"
    );
    (i - 1) as usize
}

fn col_pos(prob: &Prob, j: c_int, func: &str) -> usize {
    assert!(
        j >= 1 && j as usize <= prob.n(),
        "{func}: j = {j}; column number out of range"
    );
    (j - 1) as usize
}

fn count(len: c_int, func: &str) -> usize {
    assert!(len >= 0, "{func}: len = {len}; invalid count");
    len as usize
}

/// Data positions `1..=len` of a sentinel-layout array.
unsafe fn padded<'a, T>(ptr: *const T, len: usize, func: &str) -> &'a [T] {
    if len == 0 {
        return &[];
    }
    assert!(!ptr.is_null(), "{func}: null array with len = {len}");
    // SAFETY: the caller provides `len + 1` readable elements.
    let all = unsafe { std::slice::from_raw_parts(ptr, len + 1) };
    &all[1..]
}

/// Writable data positions `1..=len` of a sentinel-layout array.
unsafe fn padded_mut<'a, T>(ptr: *mut T, len: usize) -> Option<&'a mut [T]> {
    if ptr.is_null() {
        return None;
    }
    // SAFETY: the caller provides `len + 1` writable elements.
    let all = unsafe { std::slice::from_raw_parts_mut(ptr, len + 1) };
    Some(&mut all[1..])
}

unsafe fn copy_name(name: *const c_char) -> Option<CString> {
    if name.is_null() {
        return None;
    }
    // SAFETY: the caller passes a NUL-terminated string.
    let name = unsafe { CStr::from_ptr(name) };
    (!name.is_empty()).then(|| name.to_owned())
}

fn name_ptr(name: &Option<CString>) -> *const c_char {
    name.as_ref().map_or(ptr::null(), |s| s.as_ptr())
}

fn check_bound_kind(kind: c_int, func: &str) {
    assert!((FR..=FX).contains(&kind), "{func}: type = {kind}; invalid type");
}

/// Creates an empty problem. Returns null only if the object cannot be
/// allocated.
pub fn create_prob() -> *mut Prob {
    trace!(component = "engine", operation = "create_prob");
    Box::into_raw(Box::new(Prob::new()))
}

/// Destroys a problem object.
///
/// # Safety
///
/// `p` must be valid and is dangling afterwards; calling this twice on the
/// same pointer is undefined behavior.
pub unsafe fn delete_prob(p: *mut Prob) {
    assert!(!p.is_null(), "delete_prob: null problem pointer");
    trace!(component = "engine", operation = "delete_prob");
    // SAFETY: `p` came from `Box::into_raw` and is released exactly once.
    drop(unsafe { Box::from_raw(p) });
}

/// Copies the problem data (not solutions or statistics) into a new object.
///
/// # Safety
///
/// See the module documentation.
pub unsafe fn copy_prob(p: *const Prob) -> *mut Prob {
    let prob = unsafe { prob_ref(p, "copy_prob") };
    Box::into_raw(Box::new(prob.copy_data()))
}

/// # Safety
///
/// `name` is null or a NUL-terminated string; see the module documentation.
pub unsafe fn set_prob_name(p: *mut Prob, name: *const c_char) {
    let prob = unsafe { prob_mut(p, "set_prob_name") };
    prob.name = unsafe { copy_name(name) };
}

/// Returns the problem name or null. The pointer stays valid until the name
/// changes or the problem is deleted.
///
/// # Safety
///
/// See the module documentation.
pub unsafe fn get_prob_name(p: *const Prob) -> *const c_char {
    name_ptr(&unsafe { prob_ref(p, "get_prob_name") }.name)
}

/// # Safety
///
/// See the module documentation.
pub unsafe fn set_obj_dir(p: *mut Prob, dir: c_int) {
    let prob = unsafe { prob_mut(p, "set_obj_dir") };
    assert!(dir == MIN || dir == MAX, "set_obj_dir: dir = {dir}; invalid direction flag");
    prob.dir = dir;
    prob.invalidate();
}

/// # Safety
///
/// See the module documentation.
pub unsafe fn get_obj_dir(p: *const Prob) -> c_int {
    unsafe { prob_ref(p, "get_obj_dir") }.dir
}

/// Sets the objective coefficient of column `j`; `j = 0` sets the constant term.
///
/// # Safety
///
/// See the module documentation.
pub unsafe fn set_obj_coef(p: *mut Prob, j: c_int, coef: f64) {
    let prob = unsafe { prob_mut(p, "set_obj_coef") };
    if j == 0 {
        prob.obj_const = coef;
    } else {
        let pos = col_pos(prob, j, "set_obj_coef");
        prob.cols[pos].obj = coef;
    }
    prob.invalidate();
}

/// # Safety
///
/// See the module documentation.
pub unsafe fn get_obj_coef(p: *const Prob, j: c_int) -> f64 {
    let prob = unsafe { prob_ref(p, "get_obj_coef") };
    if j == 0 {
        prob.obj_const
    } else {
        prob.cols[col_pos(prob, j, "get_obj_coef")].obj
    }
}

/// Appends `nrs` free rows. Returns the number of the first new row, or 0 if
/// the problem cannot grow.
///
/// # Safety
///
/// See the module documentation.
pub unsafe fn add_rows(p: *mut Prob, nrs: c_int) -> c_int {
    let prob = unsafe { prob_mut(p, "add_rows") };
    if nrs < 1 || nrs > MAX_DIMENSION - prob.m() as c_int {
        return 0;
    }
    prob.add_rows(nrs as usize) as c_int + 1
}

/// Appends `ncs` free continuous columns. Returns the number of the first new
/// column, or 0 if the problem cannot grow.
///
/// # Safety
///
/// See the module documentation.
pub unsafe fn add_cols(p: *mut Prob, ncs: c_int) -> c_int {
    let prob = unsafe { prob_mut(p, "add_cols") };
    if ncs < 1 || ncs > MAX_DIMENSION - prob.n() as c_int {
        return 0;
    }
    prob.add_cols(ncs as usize) as c_int + 1
}

/// # Safety
///
/// See the module documentation.
pub unsafe fn get_num_rows(p: *const Prob) -> c_int {
    unsafe { prob_ref(p, "get_num_rows") }.m() as c_int
}

/// # Safety
///
/// See the module documentation.
pub unsafe fn get_num_cols(p: *const Prob) -> c_int {
    unsafe { prob_ref(p, "get_num_cols") }.n() as c_int
}

/// Number of integer (including binary) columns.
///
/// # Safety
///
/// See the module documentation.
pub unsafe fn get_num_int(p: *const Prob) -> c_int {
    unsafe { prob_ref(p, "get_num_int") }.num_int() as c_int
}

/// Number of stored constraint coefficients.
///
/// # Safety
///
/// See the module documentation.
pub unsafe fn get_num_nz(p: *const Prob) -> c_int {
    unsafe { prob_ref(p, "get_num_nz") }.nnz() as c_int
}

/// # Safety
///
/// `name` is null or a NUL-terminated string; see the module documentation.
pub unsafe fn set_row_name(p: *mut Prob, i: c_int, name: *const c_char) {
    let prob = unsafe { prob_mut(p, "set_row_name") };
    let pos = row_pos(prob, i, "set_row_name");
    prob.rows[pos].name = unsafe { copy_name(name) };
}

/// # Safety
///
/// See [`get_prob_name`].
pub unsafe fn get_row_name(p: *const Prob, i: c_int) -> *const c_char {
    let prob = unsafe { prob_ref(p, "get_row_name") };
    name_ptr(&prob.rows[row_pos(prob, i, "get_row_name")].name)
}

/// # Safety
///
/// `name` is null or a NUL-terminated string; see the module documentation.
pub unsafe fn set_col_name(p: *mut Prob, j: c_int, name: *const c_char) {
    let prob = unsafe { prob_mut(p, "set_col_name") };
    let pos = col_pos(prob, j, "set_col_name");
    prob.cols[pos].name = unsafe { copy_name(name) };
}

/// # Safety
///
/// See [`get_prob_name`].
pub unsafe fn get_col_name(p: *const Prob, j: c_int) -> *const c_char {
    let prob = unsafe { prob_ref(p, "get_col_name") };
    name_ptr(&prob.cols[col_pos(prob, j, "get_col_name")].name)
}

/// Sets the bounds of row `i`. Sides the kind does not use are ignored.
///
/// # Safety
///
/// See the module documentation.
pub unsafe fn set_row_bnds(p: *mut Prob, i: c_int, kind: c_int, lb: f64, ub: f64) {
    let prob = unsafe { prob_mut(p, "set_row_bnds") };
    let pos = row_pos(prob, i, "set_row_bnds");
    check_bound_kind(kind, "set_row_bnds");
    prob.rows[pos].bnds = Bnds::new(kind, lb, ub);
    prob.invalidate();
}

/// Sets the bounds of column `j`. Sides the kind does not use are ignored.
///
/// # Safety
///
/// See the module documentation.
pub unsafe fn set_col_bnds(p: *mut Prob, j: c_int, kind: c_int, lb: f64, ub: f64) {
    let prob = unsafe { prob_mut(p, "set_col_bnds") };
    let pos = col_pos(prob, j, "set_col_bnds");
    check_bound_kind(kind, "set_col_bnds");
    prob.cols[pos].bnds = Bnds::new(kind, lb, ub);
    prob.invalidate();
}

/// Bound kind of row `i`.
///
/// # Safety
///
/// See the module documentation.
pub unsafe fn get_row_type(p: *const Prob, i: c_int) -> c_int {
    let prob = unsafe { prob_ref(p, "get_row_type") };
    prob.rows[row_pos(prob, i, "get_row_type")].bnds.kind
}

/// Lower bound of row `i`; `-inf` if it has none.
///
/// # Safety
///
/// See the module documentation.
pub unsafe fn get_row_lb(p: *const Prob, i: c_int) -> f64 {
    let prob = unsafe { prob_ref(p, "get_row_lb") };
    prob.rows[row_pos(prob, i, "get_row_lb")].bnds.lb
}

/// Upper bound of row `i`; `+inf` if it has none.
///
/// # Safety
///
/// See the module documentation.
pub unsafe fn get_row_ub(p: *const Prob, i: c_int) -> f64 {
    let prob = unsafe { prob_ref(p, "get_row_ub") };
    prob.rows[row_pos(prob, i, "get_row_ub")].bnds.ub
}

/// # Safety
///
/// See the module documentation.
pub unsafe fn get_col_type(p: *const Prob, j: c_int) -> c_int {
    let prob = unsafe { prob_ref(p, "get_col_type") };
    prob.cols[col_pos(prob, j, "get_col_type")].bnds.kind
}

/// # Safety
///
/// See the module documentation.
pub unsafe fn get_col_lb(p: *const Prob, j: c_int) -> f64 {
    let prob = unsafe { prob_ref(p, "get_col_lb") };
    prob.cols[col_pos(prob, j, "get_col_lb")].bnds.lb
}

/// # Safety
///
/// See the module documentation.
pub unsafe fn get_col_ub(p: *const Prob, j: c_int) -> f64 {
    let prob = unsafe { prob_ref(p, "get_col_ub") };
    prob.cols[col_pos(prob, j, "get_col_ub")].bnds.ub
}

/// Sets the kind of column `j`. `BV` stores an integer column with bounds
/// `[0, 1]`.
///
/// # Safety
///
/// See the module documentation.
pub unsafe fn set_col_kind(p: *mut Prob, j: c_int, kind: c_int) {
    let prob = unsafe { prob_mut(p, "set_col_kind") };
    let pos = col_pos(prob, j, "set_col_kind");
    let col = &mut prob.cols[pos];
    match kind {
        CV | IV => col.kind = kind,
        BV => {
            col.kind = IV;
            col.bnds = Bnds::new(DB, 0.0, 1.0);
        }
        _ => panic!("set_col_kind: j = {j}; kind = {kind}; invalid column kind"),
    }
    prob.invalidate();
}

/// Kind of column `j`; integer columns bounded by `[0, 1]` report `BV`.
///
/// # Safety
///
/// See the module documentation.
pub unsafe fn get_col_kind(p: *const Prob, j: c_int) -> c_int {
    let prob = unsafe { prob_ref(p, "get_col_kind") };
    let col = &prob.cols[col_pos(prob, j, "get_col_kind")];
    if col.kind == IV && col.bnds.kind == DB && col.bnds.lb == 0.0 && col.bnds.ub == 1.0 {
        BV
    } else {
        col.kind
    }
}

/// Replaces row `i` with `len` coefficients read from `ind[1..=len]` (column
/// numbers) and `val[1..=len]`.
///
/// # Safety
///
/// `ind` and `val` each hold at least `len + 1` elements; see the module
/// documentation.
pub unsafe fn set_mat_row(p: *mut Prob, i: c_int, len: c_int, ind: *const c_int, val: *const f64) {
    let prob = unsafe { prob_mut(p, "set_mat_row") };
    let pos = row_pos(prob, i, "set_mat_row");
    let len = count(len, "set_mat_row");
    let ind = unsafe { padded(ind, len, "set_mat_row") };
    let val = unsafe { padded(val, len, "set_mat_row") };
    let entries: Vec<(usize, f64)> = ind
        .iter()
        .zip(val)
        .map(|(&j, &v)| (col_pos(prob, j, "set_mat_row"), v))
        .collect();
    trace!(component = "engine", operation = "set_mat_row", row = i, len);
    prob.set_mat_row(pos, entries);
}

/// Replaces column `j` with `len` coefficients read from `ind[1..=len]` (row
/// numbers) and `val[1..=len]`.
///
/// # Safety
///
/// `ind` and `val` each hold at least `len + 1` elements; see the module
/// documentation.
pub unsafe fn set_mat_col(p: *mut Prob, j: c_int, len: c_int, ind: *const c_int, val: *const f64) {
    let prob = unsafe { prob_mut(p, "set_mat_col") };
    let pos = col_pos(prob, j, "set_mat_col");
    let len = count(len, "set_mat_col");
    let ind = unsafe { padded(ind, len, "set_mat_col") };
    let val = unsafe { padded(val, len, "set_mat_col") };
    let entries: Vec<(usize, f64)> = ind
        .iter()
        .zip(val)
        .map(|(&i, &v)| (row_pos(prob, i, "set_mat_col"), v))
        .collect();
    trace!(component = "engine", operation = "set_mat_col", column = j, len);
    prob.set_mat_col(pos, entries);
}

/// Writes the coefficients of row `i` into `ind[1..]` and `val[1..]` and
/// returns their count. Either array may be null to query the count only.
///
/// # Safety
///
/// Non-null arrays hold at least `n + 1` elements where `n` is the number of
/// columns; see the module documentation.
pub unsafe fn get_mat_row(p: *const Prob, i: c_int, ind: *mut c_int, val: *mut f64) -> c_int {
    let prob = unsafe { prob_ref(p, "get_mat_row") };
    let entries = prob.mat_row(row_pos(prob, i, "get_mat_row"));
    unsafe { write_entries(&entries, ind, val) }
}

/// Writes the coefficients of column `j` into `ind[1..]` and `val[1..]` and
/// returns their count. Either array may be null to query the count only.
///
/// # Safety
///
/// Non-null arrays hold at least `m + 1` elements where `m` is the number of
/// rows; see the module documentation.
pub unsafe fn get_mat_col(p: *const Prob, j: c_int, ind: *mut c_int, val: *mut f64) -> c_int {
    let prob = unsafe { prob_ref(p, "get_mat_col") };
    let entries = prob.mat_col(col_pos(prob, j, "get_mat_col"));
    unsafe { write_entries(&entries, ind, val) }
}

unsafe fn write_entries(entries: &[(usize, f64)], ind: *mut c_int, val: *mut f64) -> c_int {
    let len = entries.len();
    if let Some(ind) = unsafe { padded_mut(ind, len) } {
        for (slot, &(k, _)) in ind.iter_mut().zip(entries) {
            *slot = k as c_int + 1;
        }
    }
    if let Some(val) = unsafe { padded_mut(val, len) } {
        for (slot, &(_, v)) in val.iter_mut().zip(entries) {
            *slot = v;
        }
    }
    len as c_int
}

/// Replaces the whole matrix with `ne` triplets from `ia[1..=ne]`,
/// `ja[1..=ne]` and `ar[1..=ne]`. Repeated cells keep the last value.
///
/// # Safety
///
/// The three arrays each hold at least `ne + 1` elements; see the module
/// documentation.
pub unsafe fn load_matrix(p: *mut Prob, ne: c_int, ia: *const c_int, ja: *const c_int, ar: *const f64) {
    let prob = unsafe { prob_mut(p, "load_matrix") };
    let ne = count(ne, "load_matrix");
    let ia = unsafe { padded(ia, ne, "load_matrix") };
    let ja = unsafe { padded(ja, ne, "load_matrix") };
    let ar = unsafe { padded(ar, ne, "load_matrix") };
    let triplets: Vec<(usize, usize, f64)> = ia
        .iter()
        .zip(ja)
        .zip(ar)
        .map(|((&i, &j), &v)| (row_pos(prob, i, "load_matrix"), col_pos(prob, j, "load_matrix"), v))
        .collect();
    trace!(component = "engine", operation = "load_matrix", ne);
    prob.load_matrix(triplets);
}

/// Deletes the `nrs` rows listed in `num[1..=nrs]`. Remaining rows are
/// renumbered contiguously.
///
/// # Safety
///
/// `num` holds at least `nrs + 1` elements; see the module documentation.
pub unsafe fn del_rows(p: *mut Prob, nrs: c_int, num: *const c_int) {
    let prob = unsafe { prob_mut(p, "del_rows") };
    let nrs = count(nrs, "del_rows");
    let num = unsafe { padded(num, nrs, "del_rows") };
    let positions = distinct_sorted(num.iter().map(|&i| row_pos(prob, i, "del_rows")), "del_rows");
    prob.del_rows(&positions);
}

/// Deletes the `ncs` columns listed in `num[1..=ncs]`. Remaining columns are
/// renumbered contiguously.
///
/// # Safety
///
/// `num` holds at least `ncs + 1` elements; see the module documentation.
pub unsafe fn del_cols(p: *mut Prob, ncs: c_int, num: *const c_int) {
    let prob = unsafe { prob_mut(p, "del_cols") };
    let ncs = count(ncs, "del_cols");
    let num = unsafe { padded(num, ncs, "del_cols") };
    let positions = distinct_sorted(num.iter().map(|&j| col_pos(prob, j, "del_cols")), "del_cols");
    prob.del_cols(&positions);
}

fn distinct_sorted(positions: impl Iterator<Item = usize>, func: &str) -> Vec<usize> {
    let mut positions: Vec<usize> = positions.collect();
    positions.sort_unstable();
    let before = positions.len();
    positions.dedup();
    assert_eq!(before, positions.len(), "{func}: duplicate numbers not allowed");
    positions
}

/// # Safety
///
/// `parm` is a valid pointer.
pub unsafe fn init_smcp(parm: *mut Smcp) {
    assert!(!parm.is_null(), "init_smcp: null parameter block");
    unsafe { parm.write(Smcp::default()) };
}

/// # Safety
///
/// `parm` is a valid pointer.
pub unsafe fn init_iptcp(parm: *mut Iptcp) {
    assert!(!parm.is_null(), "init_iptcp: null parameter block");
    unsafe { parm.write(Iptcp::default()) };
}

/// # Safety
///
/// `parm` is a valid pointer.
pub unsafe fn init_iocp(parm: *mut Iocp) {
    assert!(!parm.is_null(), "init_iocp: null parameter block");
    unsafe { parm.write(Iocp::default()) };
}

fn store(sol: &mut LpSol, out: LpOutcome) {
    sol.status = out.status;
    if let Some(point) = out.point {
        sol.obj = point.obj;
        sol.row_prim = point.row_prim;
        sol.row_dual = point.row_dual;
        sol.col_prim = point.col_prim;
        sol.col_dual = point.col_dual;
    }
}

/// Solves the LP relaxation with the primal simplex method and stores the
/// basic solution.
///
/// # Safety
///
/// `parm` is null (defaults) or valid; see the module documentation.
pub unsafe fn simplex(p: *mut Prob, parm: *const Smcp) -> c_int {
    let prob = unsafe { prob_mut(p, "simplex") };
    let parm = if parm.is_null() { Smcp::default() } else { unsafe { *parm } };
    prob.stats.simplex_calls += 1;
    let out = Simplex::new(&parm).solve(&prob.lp_data());
    trace!(component = "engine", operation = "simplex", ret = out.ret, iterations = out.iterations);
    let ret = out.ret;
    store(&mut prob.sim, out);
    ret
}

/// Solves the LP relaxation with the interior-point method and stores the
/// interior-point solution.
///
/// # Safety
///
/// `parm` is null (defaults) or valid; see the module documentation.
pub unsafe fn interior(p: *mut Prob, parm: *const Iptcp) -> c_int {
    let prob = unsafe { prob_mut(p, "interior") };
    let parm = if parm.is_null() { Iptcp::default() } else { unsafe { *parm } };
    prob.stats.interior_calls += 1;
    let out = Interior::new(&parm).solve(&prob.lp_data());
    trace!(component = "engine", operation = "interior", ret = out.ret, iterations = out.iterations);
    let ret = out.ret;
    store(&mut prob.ipt, out);
    ret
}

/// Runs the branch-and-bound search. Unless `parm.presolve` is on, the
/// current basic solution must be optimal, otherwise `EROOT` is returned.
///
/// # Safety
///
/// `parm` is null (defaults) or valid; see the module documentation.
pub unsafe fn intopt(p: *mut Prob, parm: *const Iocp) -> c_int {
    let prob = unsafe { prob_mut(p, "intopt") };
    let parm = if parm.is_null() { Iocp::default() } else { unsafe { *parm } };
    IntOpt::new(&parm).solve(prob)
}

/// Call counters of this problem object.
///
/// # Safety
///
/// See the module documentation.
pub unsafe fn get_stats(p: *const Prob) -> Stats {
    unsafe { prob_ref(p, "get_stats") }.stats
}

macro_rules! lp_accessors {
    ($field:ident, $status:ident, $obj:ident, $row_prim:ident, $row_dual:ident, $col_prim:ident, $col_dual:ident) => {
        /// Status of the stored solution.
        ///
        /// # Safety
        ///
        /// See the module documentation.
        pub unsafe fn $status(p: *const Prob) -> c_int {
            unsafe { prob_ref(p, stringify!($status)) }.$field.status
        }

        /// Objective value of the stored solution.
        ///
        /// # Safety
        ///
        /// See the module documentation.
        pub unsafe fn $obj(p: *const Prob) -> f64 {
            unsafe { prob_ref(p, stringify!($obj)) }.$field.obj
        }

        /// Primal value (activity) of row `i`.
        ///
        /// # Safety
        ///
        /// See the module documentation.
        pub unsafe fn $row_prim(p: *const Prob, i: c_int) -> f64 {
            let prob = unsafe { prob_ref(p, stringify!($row_prim)) };
            prob.$field.row_prim[row_pos(prob, i, stringify!($row_prim))]
        }

        /// Dual value of row `i`.
        ///
        /// # Safety
        ///
        /// See the module documentation.
        pub unsafe fn $row_dual(p: *const Prob, i: c_int) -> f64 {
            let prob = unsafe { prob_ref(p, stringify!($row_dual)) };
            prob.$field.row_dual[row_pos(prob, i, stringify!($row_dual))]
        }

        /// Primal value of column `j`.
        ///
        /// # Safety
        ///
        /// See the module documentation.
        pub unsafe fn $col_prim(p: *const Prob, j: c_int) -> f64 {
            let prob = unsafe { prob_ref(p, stringify!($col_prim)) };
            prob.$field.col_prim[col_pos(prob, j, stringify!($col_prim))]
        }

        /// Dual value (reduced cost) of column `j`.
        ///
        /// # Safety
        ///
        /// See the module documentation.
        pub unsafe fn $col_dual(p: *const Prob, j: c_int) -> f64 {
            let prob = unsafe { prob_ref(p, stringify!($col_dual)) };
            prob.$field.col_dual[col_pos(prob, j, stringify!($col_dual))]
        }
    };
}

lp_accessors!(sim, get_status, get_obj_val, get_row_prim, get_row_dual, get_col_prim, get_col_dual);
lp_accessors!(ipt, ipt_status, ipt_obj_val, ipt_row_prim, ipt_row_dual, ipt_col_prim, ipt_col_dual);

/// Status of the integer solution.
///
/// # Safety
///
/// See the module documentation.
pub unsafe fn mip_status(p: *const Prob) -> c_int {
    unsafe { prob_ref(p, "mip_status") }.mip.status
}

/// Objective value of the best integer solution found.
///
/// # Safety
///
/// See the module documentation.
pub unsafe fn mip_obj_val(p: *const Prob) -> f64 {
    unsafe { prob_ref(p, "mip_obj_val") }.mip.obj
}

/// Best proven bound on the integer optimum from the last search.
///
/// # Safety
///
/// See the module documentation.
pub unsafe fn mip_obj_bound(p: *const Prob) -> f64 {
    unsafe { prob_ref(p, "mip_obj_bound") }.mip.bound
}

/// # Safety
///
/// See the module documentation.
pub unsafe fn mip_row_val(p: *const Prob, i: c_int) -> f64 {
    let prob = unsafe { prob_ref(p, "mip_row_val") };
    prob.mip.row_val[row_pos(prob, i, "mip_row_val")]
}

/// # Safety
///
/// See the module documentation.
pub unsafe fn mip_col_val(p: *const Prob, j: c_int) -> f64 {
    let prob = unsafe { prob_ref(p, "mip_col_val") };
    prob.mip.col_val[col_pos(prob, j, "mip_col_val")]
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    struct Guard(*mut Prob);

    impl Drop for Guard {
        fn drop(&mut self) {
            unsafe { delete_prob(self.0) };
        }
    }

    #[test]
    fn test_sentinel_slot_is_never_read() {
        let guard = Guard(create_prob());
        let p = guard.0;
        unsafe {
            add_rows(p, 1);
            add_cols(p, 3);
            // garbage in slot 0 must not matter
            let ind = [99, 3, 1];
            let val = [f64::NAN, 2.0, 5.0];
            set_mat_row(p, 1, 2, ind.as_ptr(), val.as_ptr());

            let mut out_ind = [0; 4];
            let mut out_val = [0.0; 4];
            let len = get_mat_row(p, 1, out_ind.as_mut_ptr(), out_val.as_mut_ptr());
            assert_eq!(len, 2);
            assert_eq!(&out_ind[1..=2], &[1, 3]);
            assert_eq!(&out_val[1..=2], &[5.0, 2.0]);
            assert_eq!(get_mat_col(p, 2, ptr::null_mut(), ptr::null_mut()), 0);
        }
    }

    #[test]
    #[should_panic(expected = "row number out of range")]
    fn test_out_of_range_row_aborts() {
        let guard = Guard(create_prob());
        unsafe {
            add_rows(guard.0, 2);
            set_row_bnds(guard.0, 3, UP, 0.0, 1.0);
        }
    }

    #[test]
    fn test_add_rows_rejects_non_positive_counts() {
        let guard = Guard(create_prob());
        unsafe {
            assert_eq!(add_rows(guard.0, 0), 0);
            assert_eq!(add_rows(guard.0, 2), 1);
            assert_eq!(add_rows(guard.0, 3), 3);
            assert_eq!(get_num_rows(guard.0), 5);
        }
    }

    #[test]
    fn test_binary_kind_round_trip() {
        let guard = Guard(create_prob());
        unsafe {
            add_cols(guard.0, 1);
            set_col_kind(guard.0, 1, BV);
            assert_eq!(get_col_kind(guard.0, 1), BV);
            assert_eq!(get_col_type(guard.0, 1), DB);
            set_col_bnds(guard.0, 1, DB, 0.0, 3.0);
            assert_eq!(get_col_kind(guard.0, 1), IV);
            assert_eq!(get_num_int(guard.0), 1);
        }
    }

    #[test]
    fn test_copy_prob_is_independent() {
        let original = Guard(create_prob());
        unsafe {
            add_cols(original.0, 2);
            set_obj_coef(original.0, 2, 7.0);
            let copy = Guard(copy_prob(original.0));
            set_obj_coef(original.0, 2, 1.0);
            assert_eq!(get_obj_coef(copy.0, 2), 7.0);
            assert_eq!(get_num_cols(copy.0), 2);
        }
    }

    #[test]
    fn test_solve_through_handle() {
        let guard = Guard(create_prob());
        let p = guard.0;
        unsafe {
            set_obj_dir(p, MAX);
            add_rows(p, 3);
            add_cols(p, 2);
            for (i, ub) in [(1, 100.0), (2, 90.0), (3, 40.0)] {
                set_row_bnds(p, i, UP, 0.0, ub);
            }
            for j in 1..=2 {
                set_col_bnds(p, j, LO, 0.0, 0.0);
            }
            set_obj_coef(p, 1, 3.0);
            set_obj_coef(p, 2, 5.0);
            let ia = [0, 1, 1, 2, 2, 3, 3];
            let ja = [0, 1, 2, 1, 2, 1, 2];
            let ar = [0.0, 2.0, 4.0, 3.0, 2.0, 1.0, 1.0];
            load_matrix(p, 6, ia.as_ptr(), ja.as_ptr(), ar.as_ptr());

            let parm = Smcp {
                msg_lev: MSG_OFF,
                ..Smcp::default()
            };
            assert_eq!(simplex(p, &parm), OK);
            assert_eq!(get_status(p), OPT);
            assert_abs_diff_eq!(get_obj_val(p), 135.0, epsilon = 1e-9);
            assert_abs_diff_eq!(get_col_prim(p, 1), 20.0, epsilon = 1e-9);
            assert_eq!(get_stats(p).simplex_calls, 1);

            let num = [0, 2];
            del_rows(p, 1, num.as_ptr());
            assert_eq!(get_num_rows(p), 2);
            assert_eq!(get_status(p), UNDEF);
            assert_eq!(get_row_ub(p, 2), 40.0);
        }
    }
}
