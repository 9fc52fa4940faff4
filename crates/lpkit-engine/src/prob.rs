//! In-memory problem object behind the engine handle.

use std::collections::BTreeMap;
use std::ffi::{CString, c_int};

use crate::consts::*;
use crate::lp::LpData;
use crate::params::Stats;

/// Bounds of a row or column.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct Bnds {
    pub kind: c_int,
    pub lb: f64,
    pub ub: f64,
}

impl Bnds {
    pub fn free() -> Self {
        Self {
            kind: FR,
            lb: f64::NEG_INFINITY,
            ub: f64::INFINITY,
        }
    }

    /// Normalizes the unused sides of `kind` to infinities.
    pub fn new(kind: c_int, lb: f64, ub: f64) -> Self {
        match kind {
            LO => Self { kind, lb, ub: f64::INFINITY },
            UP => Self { kind, lb: f64::NEG_INFINITY, ub },
            DB => Self { kind, lb, ub },
            FX => Self { kind, lb, ub: lb },
            _ => Self::free(),
        }
    }

    /// Derives the kind from which sides are finite.
    pub fn from_values(lb: f64, ub: f64) -> Self {
        match (lb.is_finite(), ub.is_finite()) {
            (false, false) => Self::free(),
            (true, false) => Self::new(LO, lb, ub),
            (false, true) => Self::new(UP, lb, ub),
            (true, true) if lb == ub => Self::new(FX, lb, ub),
            (true, true) => Self::new(DB, lb, ub),
        }
    }

    pub fn is_consistent(&self) -> bool {
        match self.kind {
            LO => !self.lb.is_nan(),
            UP => !self.ub.is_nan(),
            DB => self.lb < self.ub,
            FX => !self.lb.is_nan(),
            _ => true,
        }
    }
}

#[derive(Debug, Clone)]
pub(crate) struct Row {
    pub name: Option<CString>,
    pub bnds: Bnds,
    /// Coefficients keyed by 0-based column position.
    pub coefs: BTreeMap<usize, f64>,
}

#[derive(Debug, Clone)]
pub(crate) struct Col {
    pub name: Option<CString>,
    pub kind: c_int,
    pub bnds: Bnds,
    pub obj: f64,
}

/// Stored basic or interior-point solution.
#[derive(Debug, Clone)]
pub(crate) struct LpSol {
    pub status: c_int,
    pub obj: f64,
    pub row_prim: Vec<f64>,
    pub row_dual: Vec<f64>,
    pub col_prim: Vec<f64>,
    pub col_dual: Vec<f64>,
}

impl LpSol {
    fn undefined(m: usize, n: usize) -> Self {
        Self {
            status: UNDEF,
            obj: 0.0,
            row_prim: vec![0.0; m],
            row_dual: vec![0.0; m],
            col_prim: vec![0.0; n],
            col_dual: vec![0.0; n],
        }
    }
}

/// Stored integer solution.
#[derive(Debug, Clone)]
pub(crate) struct MipSol {
    pub status: c_int,
    pub obj: f64,
    pub bound: f64,
    pub row_val: Vec<f64>,
    pub col_val: Vec<f64>,
}

impl MipSol {
    fn undefined(m: usize, n: usize) -> Self {
        Self {
            status: UNDEF,
            obj: 0.0,
            bound: 0.0,
            row_val: vec![0.0; m],
            col_val: vec![0.0; n],
        }
    }
}

/// Opaque problem object. Only ever reached through the handle API.
#[derive(Debug, Clone)]
pub struct Prob {
    pub(crate) name: Option<CString>,
    pub(crate) dir: c_int,
    pub(crate) obj_const: f64,
    pub(crate) rows: Vec<Row>,
    pub(crate) cols: Vec<Col>,
    pub(crate) sim: LpSol,
    pub(crate) ipt: LpSol,
    pub(crate) mip: MipSol,
    pub(crate) stats: Stats,
}

impl Prob {
    pub(crate) fn new() -> Self {
        Self {
            name: None,
            dir: MIN,
            obj_const: 0.0,
            rows: Vec::new(),
            cols: Vec::new(),
            sim: LpSol::undefined(0, 0),
            ipt: LpSol::undefined(0, 0),
            mip: MipSol::undefined(0, 0),
            stats: Stats::default(),
        }
    }

    /// Copies problem data only; solutions and statistics start fresh.
    pub(crate) fn copy_data(&self) -> Self {
        let mut copy = Self::new();
        copy.name = self.name.clone();
        copy.dir = self.dir;
        copy.obj_const = self.obj_const;
        copy.rows = self.rows.clone();
        copy.cols = self.cols.clone();
        copy.invalidate();
        copy
    }

    pub(crate) fn m(&self) -> usize {
        self.rows.len()
    }

    pub(crate) fn n(&self) -> usize {
        self.cols.len()
    }

    /// Discards every stored solution after a change to the problem data.
    pub(crate) fn invalidate(&mut self) {
        let (m, n) = (self.m(), self.n());
        self.sim = LpSol::undefined(m, n);
        self.ipt = LpSol::undefined(m, n);
        self.mip = MipSol::undefined(m, n);
    }

    /// Appends `count` free rows and returns the 0-based position of the first.
    pub(crate) fn add_rows(&mut self, count: usize) -> usize {
        let first = self.rows.len();
        self.rows.extend((0..count).map(|_| Row {
            name: None,
            bnds: Bnds::free(),
            coefs: BTreeMap::new(),
        }));
        self.invalidate();
        first
    }

    /// Appends `count` free continuous columns.
    pub(crate) fn add_cols(&mut self, count: usize) -> usize {
        let first = self.cols.len();
        self.cols.extend((0..count).map(|_| Col {
            name: None,
            kind: CV,
            bnds: Bnds::free(),
            obj: 0.0,
        }));
        self.invalidate();
        first
    }

    /// Replaces row `i` with the given entries; repeated columns keep the last value.
    pub(crate) fn set_mat_row(&mut self, i: usize, entries: impl IntoIterator<Item = (usize, f64)>) {
        let row = &mut self.rows[i];
        row.coefs.clear();
        for (j, val) in entries {
            row.coefs.insert(j, val);
        }
        self.invalidate();
    }

    /// Replaces column `j` with the given entries; repeated rows keep the last value.
    pub(crate) fn set_mat_col(&mut self, j: usize, entries: impl IntoIterator<Item = (usize, f64)>) {
        for row in &mut self.rows {
            row.coefs.remove(&j);
        }
        for (i, val) in entries {
            self.rows[i].coefs.insert(j, val);
        }
        self.invalidate();
    }

    pub(crate) fn mat_row(&self, i: usize) -> Vec<(usize, f64)> {
        self.rows[i].coefs.iter().map(|(&j, &v)| (j, v)).collect()
    }

    pub(crate) fn mat_col(&self, j: usize) -> Vec<(usize, f64)> {
        self.rows
            .iter()
            .enumerate()
            .filter_map(|(i, row)| row.coefs.get(&j).map(|&v| (i, v)))
            .collect()
    }

    /// Replaces the whole constraint matrix.
    pub(crate) fn load_matrix(&mut self, triplets: impl IntoIterator<Item = (usize, usize, f64)>) {
        for row in &mut self.rows {
            row.coefs.clear();
        }
        for (i, j, val) in triplets {
            self.rows[i].coefs.insert(j, val);
        }
        self.invalidate();
    }

    /// Removes the rows at the given sorted, distinct 0-based positions.
    pub(crate) fn del_rows(&mut self, positions: &[usize]) {
        let mut doomed = positions.iter().peekable();
        let mut pos = 0;
        self.rows.retain(|_| {
            let drop = doomed.next_if_eq(&&pos).is_some();
            pos += 1;
            !drop
        });
        self.invalidate();
    }

    /// Removes the columns at the given sorted, distinct 0-based positions and
    /// renumbers the remaining matrix entries.
    pub(crate) fn del_cols(&mut self, positions: &[usize]) {
        let n = self.cols.len();
        let mut remap: Vec<Option<usize>> = vec![None; n];
        let mut next = 0;
        let mut doomed = positions.iter().peekable();
        for (j, slot) in remap.iter_mut().enumerate() {
            if doomed.next_if_eq(&&j).is_none() {
                *slot = Some(next);
                next += 1;
            }
        }

        let mut pos = 0;
        self.cols.retain(|_| {
            let keep = remap[pos].is_some();
            pos += 1;
            keep
        });
        for row in &mut self.rows {
            row.coefs = row
                .coefs
                .iter()
                .filter_map(|(&j, &v)| remap[j].map(|k| (k, v)))
                .collect();
        }
        self.invalidate();
    }

    pub(crate) fn nnz(&self) -> usize {
        self.rows.iter().map(|row| row.coefs.len()).sum()
    }

    pub(crate) fn num_int(&self) -> usize {
        self.cols.iter().filter(|col| col.kind == IV).count()
    }

    /// Snapshot of the data the solvers need.
    pub(crate) fn lp_data(&self) -> LpData {
        LpData {
            maximize: self.dir == MAX,
            obj_const: self.obj_const,
            cost: self.cols.iter().map(|col| col.obj).collect(),
            rows: self.rows.iter().map(|row| row.bnds).collect(),
            cols: self.cols.iter().map(|col| col.bnds).collect(),
            matrix: self
                .rows
                .iter()
                .map(|row| row.coefs.iter().map(|(&j, &v)| (j, v)).collect())
                .collect(),
        }
    }
}
