//! The problem model.
//!
//! A [`Problem`] owns one engine handle; the handle holds the authoritative
//! data. Every operation validates indices, lengths and bounds before calling
//! the engine, since the engine aborts on misuse. Arrays only reach the engine
//! through [`crate::buffer`].
//!
//! All `unsafe` blocks below call into the engine with `self.raw()`, which is
//! live for as long as `self`, and with indices that were checked against the
//! current row and column counts.

use std::ffi::{CStr, CString, c_char, c_int};
use std::ptr;

use lpkit_engine::{self as engine, Stats};
use tracing::{debug, trace};

use crate::buffer;
use crate::error::{Error, Result};
use crate::handle::Handle;
use crate::solution::Solution;
use crate::types::{Algorithm, Bound, BoundKind, Direction, SolutionStatus, VarKind};

/// Matrix given as parallel `(row, column, value)` triplets with 1-based
/// indices.
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SparseMatrix {
    rows: Vec<usize>,
    columns: Vec<usize>,
    values: Vec<f64>,
}

impl SparseMatrix {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_triplets(rows: Vec<usize>, columns: Vec<usize>, values: Vec<f64>) -> Result<Self> {
        buffer::ensure_same_length(rows.len(), values.len())?;
        buffer::ensure_same_length(columns.len(), values.len())?;
        Ok(Self { rows, columns, values })
    }

    pub fn push(&mut self, row: usize, column: usize, value: f64) {
        self.rows.push(row);
        self.columns.push(column);
        self.values.push(value);
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn iter(&self) -> impl DoubleEndedIterator<Item = (usize, usize, f64)> + '_ {
        self.rows
            .iter()
            .zip(&self.columns)
            .zip(&self.values)
            .map(|((&i, &j), &v)| (i, j, v))
    }

    /// Same matrix with each cell present once, holding its last value.
    fn resolved(&self) -> Self {
        let mut seen = std::collections::HashSet::with_capacity(self.len());
        let mut keep: Vec<(usize, usize, f64)> = self
            .iter()
            .rev()
            .filter(|&(i, j, _)| seen.insert((i, j)))
            .collect();
        keep.reverse();
        let mut out = Self::new();
        for (i, j, v) in keep {
            out.push(i, j, v);
        }
        out
    }
}

impl FromIterator<(usize, usize, f64)> for SparseMatrix {
    fn from_iter<I: IntoIterator<Item = (usize, usize, f64)>>(iter: I) -> Self {
        let mut matrix = Self::new();
        for (i, j, v) in iter {
            matrix.push(i, j, v);
        }
        matrix
    }
}

/// Where a problem stands with respect to solving.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum SolveState {
    Unsolved,
    Solving,
    Solved(SolutionStatus),
}

/// What happened when an algorithm last ran on an unchanged problem.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct SolveRecord {
    pub status: SolutionStatus,
    pub limit: Option<crate::solver::LimitReached>,
}

/// Per-call engine counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct EngineStats {
    pub simplex_calls: u64,
    pub interior_calls: u64,
    /// Branch-and-cut entry calls, whether or not a search followed.
    pub intopt_calls: u64,
    pub searches: u64,
    pub nodes: u64,
}

impl From<Stats> for EngineStats {
    fn from(stats: Stats) -> Self {
        Self {
            simplex_calls: stats.simplex_calls,
            interior_calls: stats.interior_calls,
            intopt_calls: stats.intopt_calls,
            searches: stats.searches,
            nodes: stats.nodes,
        }
    }
}

/// An LP/MIP problem backed by an engine handle.
///
/// Rows and columns are numbered from 1. Deleting rows or columns renumbers
/// the remaining ones contiguously, so indices must not be kept across a
/// delete.
#[derive(Debug)]
pub struct Problem {
    handle: Handle,
    state: SolveState,
    records: [Option<SolveRecord>; 3],
}

fn to_cstring(name: Option<&str>) -> Result<Option<CString>> {
    name.filter(|name| !name.is_empty())
        .map(|name| CString::new(name).map_err(|_| Error::InvalidName(name.to_owned())))
        .transpose()
}

fn from_cstr(raw: *const c_char) -> Option<String> {
    // SAFETY: the engine returns null or a NUL-terminated string that stays
    // valid until the next mutation, and it is copied out immediately.
    (!raw.is_null()).then(|| unsafe { CStr::from_ptr(raw) }.to_string_lossy().into_owned())
}

fn as_ptr(name: &Option<CString>) -> *const c_char {
    name.as_ref().map_or(ptr::null(), |name| name.as_ptr())
}

/// Validates the sides `kind` uses and folds infinite ones into the kind:
/// a lower side of `-inf` or an upper side of `+inf` is absent, so
/// `Double(-inf, u)` is stored as `Upper(u)` and `Lower(-inf)` as `Free`.
fn check_bound(kind: BoundKind, lower: f64, upper: f64) -> Result<Bound> {
    let inconsistent = Error::InconsistentBounds { kind, lower, upper };
    let (lo, up) = match kind {
        BoundKind::Free => (None, None),
        BoundKind::Lower => (Some(lower), None),
        BoundKind::Upper => (None, Some(upper)),
        BoundKind::Double => (Some(lower), Some(upper)),
        BoundKind::Fixed if lower.is_finite() && lower <= upper => return Ok(Bound::fixed(lower)),
        BoundKind::Fixed => return Err(inconsistent),
    };
    let lo = lo.filter(|&l| l != f64::NEG_INFINITY);
    let up = up.filter(|&u| u != f64::INFINITY);
    // NaN, a lower side of +inf, an upper side of -inf
    if lo.is_some_and(|l| !l.is_finite()) || up.is_some_and(|u| !u.is_finite()) {
        return Err(inconsistent);
    }
    match (lo, up) {
        (None, None) => Ok(Bound::free()),
        (Some(l), None) => Ok(Bound::lower(l)),
        (None, Some(u)) => Ok(Bound::upper(u)),
        (Some(l), Some(u)) if l == u => Ok(Bound::fixed(l)),
        (Some(l), Some(u)) if l < u => Ok(Bound::double(l, u)),
        _ => Err(inconsistent),
    }
}

/// Keeps the last value for each repeated index, in first-seen order.
fn last_write_wins(indices: &[usize], values: &[f64]) -> (Vec<usize>, Vec<f64>) {
    let mut slot = std::collections::HashMap::with_capacity(indices.len());
    let mut out_indices = Vec::with_capacity(indices.len());
    let mut out_values = Vec::with_capacity(values.len());
    for (&index, &value) in indices.iter().zip(values) {
        match slot.get(&index) {
            Some(&k) => out_values[k] = value,
            None => {
                slot.insert(index, out_indices.len());
                out_indices.push(index);
                out_values.push(value);
            }
        }
    }
    (out_indices, out_values)
}

impl Problem {
    pub fn new() -> Result<Self> {
        let problem = Self {
            handle: Handle::new()?,
            state: SolveState::Unsolved,
            records: [None; 3],
        };
        debug!(component = "problem", operation = "create");
        Ok(problem)
    }

    pub(crate) fn raw(&self) -> *mut engine::Prob {
        self.handle.as_ptr()
    }

    /// Deep copy through the engine. The copy starts unsolved.
    pub fn try_clone(&self) -> Result<Self> {
        debug!(component = "problem", operation = "clone", rows = self.row_count(), columns = self.column_count());
        Ok(Self {
            handle: self.handle.try_clone()?,
            state: SolveState::Unsolved,
            records: [None; 3],
        })
    }

    pub fn row_count(&self) -> usize {
        unsafe { engine::get_num_rows(self.raw()) as usize }
    }

    pub fn column_count(&self) -> usize {
        unsafe { engine::get_num_cols(self.raw()) as usize }
    }

    /// Number of stored constraint coefficients.
    pub fn nonzero_count(&self) -> usize {
        unsafe { engine::get_num_nz(self.raw()) as usize }
    }

    /// Number of integer and binary columns.
    pub fn integer_column_count(&self) -> usize {
        unsafe { engine::get_num_int(self.raw()) as usize }
    }

    /// Engine call counters for this problem.
    pub fn engine_stats(&self) -> EngineStats {
        unsafe { engine::get_stats(self.raw()) }.into()
    }

    fn check_row(&self, row: usize) -> Result<()> {
        let count = self.row_count();
        if (1..=count).contains(&row) {
            Ok(())
        } else {
            Err(Error::InvalidRowIndex { index: row, count })
        }
    }

    fn check_column(&self, column: usize) -> Result<()> {
        let count = self.column_count();
        if (1..=count).contains(&column) {
            Ok(())
        } else {
            Err(Error::InvalidColumnIndex { index: column, count })
        }
    }

    pub fn solve_state(&self) -> SolveState {
        self.state
    }

    /// Drops every solve record. Called by all data mutations.
    fn touch(&mut self) {
        self.state = SolveState::Unsolved;
        self.records = [None; 3];
    }

    pub(crate) fn begin_solve(&mut self) {
        self.state = SolveState::Solving;
        self.records = [None; 3];
    }

    pub(crate) fn abort_solve(&mut self) {
        self.touch();
    }

    pub(crate) fn record(&mut self, algorithm: Algorithm, record: SolveRecord) {
        self.records[algorithm.slot()] = Some(record);
    }

    pub(crate) fn finish_solve(&mut self, status: SolutionStatus) {
        self.state = SolveState::Solved(status);
    }

    pub(crate) fn solve_record(&self, algorithm: Algorithm) -> Option<SolveRecord> {
        self.records[algorithm.slot()]
    }

    /// Snapshot of the last `algorithm` solve. Shorthand for
    /// [`Solution::extract`].
    pub fn solution(&self, algorithm: Algorithm) -> Result<Solution> {
        Solution::extract(self, algorithm)
    }

    pub fn set_name(&mut self, name: Option<&str>) -> Result<()> {
        let name = to_cstring(name)?;
        unsafe { engine::set_prob_name(self.raw(), as_ptr(&name)) };
        Ok(())
    }

    pub fn name(&self) -> Option<String> {
        from_cstr(unsafe { engine::get_prob_name(self.raw()) })
    }

    pub fn set_row_name(&mut self, row: usize, name: Option<&str>) -> Result<()> {
        self.check_row(row)?;
        let name = to_cstring(name)?;
        unsafe { engine::set_row_name(self.raw(), row as _, as_ptr(&name)) };
        Ok(())
    }

    pub fn row_name(&self, row: usize) -> Result<Option<String>> {
        self.check_row(row)?;
        Ok(from_cstr(unsafe { engine::get_row_name(self.raw(), row as _) }))
    }

    pub fn set_column_name(&mut self, column: usize, name: Option<&str>) -> Result<()> {
        self.check_column(column)?;
        let name = to_cstring(name)?;
        unsafe { engine::set_col_name(self.raw(), column as _, as_ptr(&name)) };
        Ok(())
    }

    pub fn column_name(&self, column: usize) -> Result<Option<String>> {
        self.check_column(column)?;
        Ok(from_cstr(unsafe { engine::get_col_name(self.raw(), column as _) }))
    }

    pub fn set_direction(&mut self, direction: Direction) {
        unsafe { engine::set_obj_dir(self.raw(), direction.to_native()) };
        self.touch();
    }

    pub fn direction(&self) -> Result<Direction> {
        Ok(Direction::from_native(unsafe { engine::get_obj_dir(self.raw()) })?)
    }

    pub fn set_objective_coefficient(&mut self, column: usize, coef: f64) -> Result<()> {
        self.check_column(column)?;
        unsafe { engine::set_obj_coef(self.raw(), column as _, coef) };
        self.touch();
        Ok(())
    }

    pub fn objective_coefficient(&self, column: usize) -> Result<f64> {
        self.check_column(column)?;
        Ok(unsafe { engine::get_obj_coef(self.raw(), column as _) })
    }

    pub fn set_objective_constant(&mut self, constant: f64) {
        unsafe { engine::set_obj_coef(self.raw(), 0, constant) };
        self.touch();
    }

    pub fn objective_constant(&self) -> f64 {
        unsafe { engine::get_obj_coef(self.raw(), 0) }
    }

    /// Appends `count` free rows and returns the index of the first one.
    pub fn add_rows(&mut self, count: usize) -> Result<usize> {
        let first = self.row_count() + 1;
        if count == 0 {
            return Ok(first);
        }
        let requested = c_int::try_from(count).map_err(|_| Error::AllocationFailed { target: "rows" })?;
        match unsafe { engine::add_rows(self.raw(), requested) } {
            0 => Err(Error::AllocationFailed { target: "rows" }),
            index => {
                trace!(component = "problem", operation = "add_rows", count, first = index);
                self.touch();
                Ok(index as usize)
            }
        }
    }

    /// Appends `count` free continuous columns and returns the index of the
    /// first one.
    pub fn add_columns(&mut self, count: usize) -> Result<usize> {
        let first = self.column_count() + 1;
        if count == 0 {
            return Ok(first);
        }
        let requested = c_int::try_from(count).map_err(|_| Error::AllocationFailed { target: "columns" })?;
        match unsafe { engine::add_cols(self.raw(), requested) } {
            0 => Err(Error::AllocationFailed { target: "columns" }),
            index => {
                trace!(component = "problem", operation = "add_columns", count, first = index);
                self.touch();
                Ok(index as usize)
            }
        }
    }

    /// Sets the bound of `row`. A double bound with equal sides is stored as
    /// fixed.
    pub fn set_row_bounds(&mut self, row: usize, kind: BoundKind, lower: f64, upper: f64) -> Result<()> {
        self.check_row(row)?;
        let bound = check_bound(kind, lower, upper)?;
        unsafe { engine::set_row_bnds(self.raw(), row as _, bound.kind.to_native(), bound.lower, bound.upper) };
        trace!(component = "problem", operation = "set_row_bounds", row, kind = ?bound.kind);
        self.touch();
        Ok(())
    }

    pub fn row_bounds(&self, row: usize) -> Result<Bound> {
        self.check_row(row)?;
        let raw = self.raw();
        let kind = BoundKind::from_native(unsafe { engine::get_row_type(raw, row as _) })?;
        let (lower, upper) = unsafe { (engine::get_row_lb(raw, row as _), engine::get_row_ub(raw, row as _)) };
        Ok(Bound { kind, lower, upper })
    }

    /// Sets the bound of `column`. A double bound with equal sides is stored
    /// as fixed.
    pub fn set_column_bounds(&mut self, column: usize, kind: BoundKind, lower: f64, upper: f64) -> Result<()> {
        self.check_column(column)?;
        let bound = check_bound(kind, lower, upper)?;
        unsafe { engine::set_col_bnds(self.raw(), column as _, bound.kind.to_native(), bound.lower, bound.upper) };
        trace!(component = "problem", operation = "set_column_bounds", column, kind = ?bound.kind);
        self.touch();
        Ok(())
    }

    pub fn column_bounds(&self, column: usize) -> Result<Bound> {
        self.check_column(column)?;
        let raw = self.raw();
        let kind = BoundKind::from_native(unsafe { engine::get_col_type(raw, column as _) })?;
        let (lower, upper) = unsafe { (engine::get_col_lb(raw, column as _), engine::get_col_ub(raw, column as _)) };
        Ok(Bound { kind, lower, upper })
    }

    /// Sets the kind of `column`. `Binary` also replaces its bound with
    /// `[0, 1]`.
    pub fn set_column_kind(&mut self, column: usize, kind: VarKind) -> Result<()> {
        self.check_column(column)?;
        unsafe { engine::set_col_kind(self.raw(), column as _, kind.to_native()) };
        self.touch();
        Ok(())
    }

    pub fn column_kind(&self, column: usize) -> Result<VarKind> {
        self.check_column(column)?;
        Ok(VarKind::from_native(unsafe { engine::get_col_kind(self.raw(), column as _) })?)
    }

    /// Replaces the coefficients of `row`. `columns` and `values` are
    /// parallel; a repeated column keeps its last value.
    pub fn set_row_coefficients(&mut self, row: usize, columns: &[usize], values: &[f64]) -> Result<()> {
        buffer::ensure_same_length(columns.len(), values.len())?;
        self.check_row(row)?;
        for &column in columns {
            self.check_column(column)?;
        }
        let (columns, values) = last_write_wins(columns, values);
        let raw = self.raw();
        buffer::with_pairs(&columns, &values, |len, ind, val| unsafe {
            engine::set_mat_row(raw, row as _, len, ind, val)
        })?;
        trace!(component = "problem", operation = "set_row_coefficients", row, len = columns.len());
        self.touch();
        Ok(())
    }

    /// Replaces the coefficients of `column`. `rows` and `values` are
    /// parallel; a repeated row keeps its last value.
    pub fn set_column_coefficients(&mut self, column: usize, rows: &[usize], values: &[f64]) -> Result<()> {
        buffer::ensure_same_length(rows.len(), values.len())?;
        self.check_column(column)?;
        for &row in rows {
            self.check_row(row)?;
        }
        let (rows, values) = last_write_wins(rows, values);
        let raw = self.raw();
        buffer::with_pairs(&rows, &values, |len, ind, val| unsafe {
            engine::set_mat_col(raw, column as _, len, ind, val)
        })?;
        trace!(component = "problem", operation = "set_column_coefficients", column, len = rows.len());
        self.touch();
        Ok(())
    }

    /// `(column, value)` pairs of `row`, ordered by column.
    pub fn row_coefficients(&self, row: usize) -> Result<Vec<(usize, f64)>> {
        self.check_row(row)?;
        let raw = self.raw();
        Ok(buffer::read_pairs(self.column_count(), |ind, val| unsafe {
            engine::get_mat_row(raw, row as _, ind, val)
        }))
    }

    /// `(row, value)` pairs of `column`, ordered by row.
    pub fn column_coefficients(&self, column: usize) -> Result<Vec<(usize, f64)>> {
        self.check_column(column)?;
        let raw = self.raw();
        Ok(buffer::read_pairs(self.row_count(), |ind, val| unsafe {
            engine::get_mat_col(raw, column as _, ind, val)
        }))
    }

    /// Replaces the whole constraint matrix.
    pub fn load_matrix(&mut self, matrix: &SparseMatrix) -> Result<()> {
        for (i, j, _) in matrix.iter() {
            self.check_row(i)?;
            self.check_column(j)?;
        }
        let matrix = matrix.resolved();
        let raw = self.raw();
        buffer::with_triplets(&matrix.rows, &matrix.columns, &matrix.values, |ne, ia, ja, ar| unsafe {
            engine::load_matrix(raw, ne, ia, ja, ar)
        })?;
        debug!(component = "problem", operation = "load_matrix", nonzeros = matrix.len());
        self.touch();
        Ok(())
    }

    fn check_distinct(indices: &[usize]) -> Result<()> {
        let mut seen = std::collections::HashSet::with_capacity(indices.len());
        match indices.iter().find(|&&index| !seen.insert(index)) {
            Some(&index) => Err(Error::DuplicateIndex(index)),
            None => Ok(()),
        }
    }

    /// Deletes the listed rows. The remaining rows are renumbered 1, 2, ...
    /// in their previous order.
    pub fn delete_rows(&mut self, rows: &[usize]) -> Result<()> {
        for &row in rows {
            self.check_row(row)?;
        }
        Self::check_distinct(rows)?;
        if rows.is_empty() {
            return Ok(());
        }
        let raw = self.raw();
        buffer::with_indices(rows, |len, num| unsafe { engine::del_rows(raw, len, num) });
        debug!(component = "problem", operation = "delete_rows", count = rows.len());
        self.touch();
        Ok(())
    }

    /// Deletes the listed columns. The remaining columns are renumbered
    /// 1, 2, ... in their previous order.
    pub fn delete_columns(&mut self, columns: &[usize]) -> Result<()> {
        for &column in columns {
            self.check_column(column)?;
        }
        Self::check_distinct(columns)?;
        if columns.is_empty() {
            return Ok(());
        }
        let raw = self.raw();
        buffer::with_indices(columns, |len, num| unsafe { engine::del_cols(raw, len, num) });
        debug!(component = "problem", operation = "delete_columns", count = columns.len());
        self.touch();
        Ok(())
    }
}

impl Clone for Problem {
    /// # Panics
    ///
    /// Panics if the engine cannot allocate the copy; see
    /// [`Problem::try_clone`] for the fallible form.
    fn clone(&self) -> Self {
        match self.try_clone() {
            Ok(copy) => copy,
            Err(err) => panic!("failed to clone problem: {err}"),
        }
    }
}

impl Drop for Problem {
    fn drop(&mut self) {
        debug!(component = "problem", operation = "drop");
    }
}
