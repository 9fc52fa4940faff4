use thiserror::Error;

use crate::config::ConfigError;
use crate::types::{Algorithm, BoundKind, InvalidCodeError, NativeCode};

pub type Result<T> = std::result::Result<T, Error>;

/// Broad classes of failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Bad indices, array lengths, bounds or names. Always caught before the
    /// engine is called.
    Structural,
    /// The engine could not grow or copy a problem.
    Allocation,
    /// The engine hit a numerical failure. Retrying with a fresh basis or
    /// rescaled data may help.
    Numerical,
    /// The requested operation does not apply in the current state.
    Precondition,
    /// Solver options failed validation.
    Configuration,
    /// The engine failed in a way the other kinds do not cover.
    Engine,
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum Error {
    #[error("row index {index} out of range 1..={count}")]
    InvalidRowIndex { index: usize, count: usize },

    #[error("column index {index} out of range 1..={count}")]
    InvalidColumnIndex { index: usize, count: usize },

    #[error("index and value arrays differ in length ({indices} vs {values})")]
    MismatchedLength { indices: usize, values: usize },

    #[error("inconsistent {kind:?} bound: lower {lower} > upper {upper}")]
    InconsistentBounds { kind: BoundKind, lower: f64, upper: f64 },

    #[error("index {0} listed more than once")]
    DuplicateIndex(usize),

    #[error("name contains an interior NUL byte: {0:?}")]
    InvalidName(String),

    #[error("engine could not allocate {target}")]
    AllocationFailed { target: &'static str },

    #[error("{algorithm}: invalid initial basis")]
    BadBasis { algorithm: Algorithm },

    #[error("{algorithm}: basis matrix is singular")]
    SingularMatrix { algorithm: Algorithm },

    #[error("{algorithm}: basis matrix is ill-conditioned")]
    IllConditioned { algorithm: Algorithm },

    #[error("{algorithm}: no convergence")]
    NoConvergence { algorithm: Algorithm },

    #[error("{algorithm}: numerical instability")]
    NumericalInstability { algorithm: Algorithm },

    #[error("no {0} solution available; solve the problem first")]
    SolverNotRun(Algorithm),

    #[error("branch-and-cut requires at least one integer or binary column")]
    NoIntegerColumns,

    #[error("{algorithm}: engine rejected the variable bounds")]
    IncorrectBounds { algorithm: Algorithm },

    #[error("branch-and-cut: relaxation has no optimal basis")]
    NoRootBasis,

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    InvalidCode(#[from] InvalidCodeError),

    #[error("{algorithm}: engine failed with return code {code:#x}")]
    Engine { algorithm: Algorithm, code: NativeCode },
}

impl Error {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::InvalidRowIndex { .. }
            | Self::InvalidColumnIndex { .. }
            | Self::MismatchedLength { .. }
            | Self::InconsistentBounds { .. }
            | Self::DuplicateIndex(_)
            | Self::InvalidName(_) => ErrorKind::Structural,
            Self::AllocationFailed { .. } => ErrorKind::Allocation,
            Self::BadBasis { .. }
            | Self::SingularMatrix { .. }
            | Self::IllConditioned { .. }
            | Self::NoConvergence { .. }
            | Self::NumericalInstability { .. } => ErrorKind::Numerical,
            Self::SolverNotRun(_) | Self::NoIntegerColumns | Self::IncorrectBounds { .. } | Self::NoRootBasis => {
                ErrorKind::Precondition
            }
            Self::Config(_) => ErrorKind::Configuration,
            Self::InvalidCode(_) | Self::Engine { .. } => ErrorKind::Engine,
        }
    }

    /// Stable machine-readable identifier.
    pub fn code(&self) -> &'static str {
        match self {
            Self::InvalidRowIndex { .. } => "invalid_row_index",
            Self::InvalidColumnIndex { .. } => "invalid_column_index",
            Self::MismatchedLength { .. } => "mismatched_length",
            Self::InconsistentBounds { .. } => "inconsistent_bounds",
            Self::DuplicateIndex(_) => "duplicate_index",
            Self::InvalidName(_) => "invalid_name",
            Self::AllocationFailed { .. } => "allocation_failed",
            Self::BadBasis { .. } => "bad_basis",
            Self::SingularMatrix { .. } => "singular_matrix",
            Self::IllConditioned { .. } => "ill_conditioned",
            Self::NoConvergence { .. } => "no_convergence",
            Self::NumericalInstability { .. } => "numerical_instability",
            Self::SolverNotRun(_) => "solver_not_run",
            Self::NoIntegerColumns => "no_integer_columns",
            Self::IncorrectBounds { .. } => "incorrect_bounds",
            Self::NoRootBasis => "no_root_basis",
            Self::Config(_) => "invalid_config",
            Self::InvalidCode(_) => "invalid_native_code",
            Self::Engine { .. } => "engine_failure",
        }
    }
}
