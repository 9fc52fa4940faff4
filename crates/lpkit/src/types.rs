//! Closed value types and their engine codes.

use std::fmt;

use lpkit_engine::consts;
use thiserror::Error;

/// Integer code as understood by the engine.
pub type NativeCode = std::ffi::c_int;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("invalid {type_name} code: {code}")]
pub struct InvalidCodeError {
    pub type_name: &'static str,
    pub code: NativeCode,
}

/// Declares an enum with a one-to-one mapping onto engine codes.
macro_rules! native_codes {
    (
        $(#[$meta:meta])*
        $vis:vis enum $name:ident {
            $(
                $(#[$vmeta:meta])*
                $variant:ident = $code:expr
            ),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        $vis enum $name {
            $(
                $(#[$vmeta])*
                $variant,
            )+
        }

        impl $name {
            /// Every value, in declaration order.
            pub const ALL: &'static [Self] = &[$(Self::$variant),+];

            pub fn to_native(self) -> $crate::types::NativeCode {
                match self {
                    $(Self::$variant => $code,)+
                }
            }

            pub fn from_native(
                code: $crate::types::NativeCode,
            ) -> ::std::result::Result<Self, $crate::types::InvalidCodeError> {
                $(
                    if code == $code {
                        return Ok(Self::$variant);
                    }
                )+
                Err($crate::types::InvalidCodeError {
                    type_name: stringify!($name),
                    code,
                })
            }
        }
    };
}

pub(crate) use native_codes;

native_codes! {
    /// Optimization direction.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    #[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
    pub enum Direction {
        #[default]
        Minimize = consts::MIN,
        Maximize = consts::MAX,
    }
}

native_codes! {
    /// Which sides of a row or column are bounded.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    #[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
    pub enum BoundKind {
        /// `-inf < x < +inf`
        Free = consts::FR,
        /// `lower <= x < +inf`
        Lower = consts::LO,
        /// `-inf < x <= upper`
        Upper = consts::UP,
        /// `lower <= x <= upper`
        Double = consts::DB,
        /// `x = lower`
        Fixed = consts::FX,
    }
}

native_codes! {
    /// Column kind. `Binary` is an integer column bounded by `[0, 1]`.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    #[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
    pub enum VarKind {
        #[default]
        Continuous = consts::CV,
        Integer = consts::IV,
        Binary = consts::BV,
    }
}

impl VarKind {
    pub fn is_integral(self) -> bool {
        !matches!(self, Self::Continuous)
    }
}

/// Normalized outcome of a solve.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum SolutionStatus {
    /// Proven optimal.
    Optimal,
    /// Feasible, optimality not proven.
    Feasible,
    /// No feasible solution exists.
    Infeasible,
    /// The objective is unbounded.
    Unbounded,
    /// Nothing usable is known.
    Undefined,
}

impl SolutionStatus {
    pub const ALL: &'static [Self] = &[
        Self::Optimal,
        Self::Feasible,
        Self::Infeasible,
        Self::Unbounded,
        Self::Undefined,
    ];

    pub fn to_native(self) -> NativeCode {
        match self {
            Self::Optimal => consts::OPT,
            Self::Feasible => consts::FEAS,
            Self::Infeasible => consts::NOFEAS,
            Self::Unbounded => consts::UNBND,
            Self::Undefined => consts::UNDEF,
        }
    }

    /// An infeasible *current* solution says nothing about the problem, so it
    /// normalizes to `Undefined`. Only "no feasible solution" is `Infeasible`.
    pub fn from_native(code: NativeCode) -> Result<Self, InvalidCodeError> {
        match code {
            consts::OPT => Ok(Self::Optimal),
            consts::FEAS => Ok(Self::Feasible),
            consts::NOFEAS => Ok(Self::Infeasible),
            consts::UNBND => Ok(Self::Unbounded),
            consts::UNDEF | consts::INFEAS => Ok(Self::Undefined),
            _ => Err(InvalidCodeError {
                type_name: "SolutionStatus",
                code,
            }),
        }
    }

    /// Whether primal values describe a feasible point.
    pub fn has_solution(self) -> bool {
        matches!(self, Self::Optimal | Self::Feasible)
    }
}

/// Solver family.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Algorithm {
    Simplex,
    InteriorPoint,
    BranchCut,
}

impl Algorithm {
    pub const ALL: &'static [Self] = &[Self::Simplex, Self::InteriorPoint, Self::BranchCut];

    pub(crate) fn slot(self) -> usize {
        match self {
            Self::Simplex => 0,
            Self::InteriorPoint => 1,
            Self::BranchCut => 2,
        }
    }
}

impl fmt::Display for Algorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Simplex => "simplex",
            Self::InteriorPoint => "interior-point",
            Self::BranchCut => "branch-and-cut",
        })
    }
}

/// Bound of a row or column. Sides the kind leaves open read as infinite.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Bound {
    pub kind: BoundKind,
    pub lower: f64,
    pub upper: f64,
}

impl Bound {
    /// Builds a bound, replacing the sides `kind` does not use with infinities.
    pub fn new(kind: BoundKind, lower: f64, upper: f64) -> Self {
        let (lower, upper) = match kind {
            BoundKind::Free => (f64::NEG_INFINITY, f64::INFINITY),
            BoundKind::Lower => (lower, f64::INFINITY),
            BoundKind::Upper => (f64::NEG_INFINITY, upper),
            BoundKind::Double => (lower, upper),
            BoundKind::Fixed => (lower, lower),
        };
        Self { kind, lower, upper }
    }

    pub fn free() -> Self {
        Self::new(BoundKind::Free, 0.0, 0.0)
    }

    pub fn lower(lower: f64) -> Self {
        Self::new(BoundKind::Lower, lower, 0.0)
    }

    pub fn upper(upper: f64) -> Self {
        Self::new(BoundKind::Upper, 0.0, upper)
    }

    pub fn double(lower: f64, upper: f64) -> Self {
        Self::new(BoundKind::Double, lower, upper)
    }

    pub fn fixed(value: f64) -> Self {
        Self::new(BoundKind::Fixed, value, value)
    }

    pub fn contains(&self, value: f64) -> bool {
        self.lower <= value && value <= self.upper
    }
}

impl Default for Bound {
    fn default() -> Self {
        Self::free()
    }
}
