//! Option bundles for the three solver families.
//!
//! Each bundle is a plain value with engine defaults, `with_*` builders,
//! `validate()` and a translation into the engine's parameter block. Solvers
//! always validate before the engine is touched.

use std::ffi::c_int;
use std::time::Duration;

use lpkit_engine::consts;
use lpkit_engine::{Iocp, Iptcp, Smcp};
use thiserror::Error;

use crate::types::{Algorithm, native_codes};

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigError {
    #[error("{name} must be a non-negative number, got {value}")]
    InvalidTolerance { name: &'static str, value: f64 },

    #[error("time limit must be positive")]
    NonPositiveTimeLimit,

    #[error("iteration limit must be positive")]
    ZeroIterationLimit,

    #[error("mip gap must be in [0, 1), got {0}")]
    GapOutOfRange(f64),

    #[error("objective limits must not be NaN")]
    InvalidObjectiveLimit,

    #[error("objective lower limit {lower} exceeds upper limit {upper}")]
    ObjectiveLimitsCrossed { lower: f64, upper: f64 },
}

native_codes! {
    /// How much the engine reports about a solve. Reports go to `tracing`.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    #[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
    pub enum Verbosity {
        Off = consts::MSG_OFF,
        Errors = consts::MSG_ERR,
        Normal = consts::MSG_ON,
        #[default]
        All = consts::MSG_ALL,
    }
}

native_codes! {
    /// Simplex variant to run. The bundled engine always runs the primal
    /// method and accepts the others as hints.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    #[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
    pub enum SimplexMethod {
        #[default]
        Primal = consts::PRIMAL,
        DualPrimal = consts::DUALP,
        Dual = consts::DUAL,
    }
}

native_codes! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    #[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
    pub enum Pricing {
        Standard = consts::PT_STD,
        /// Projected steepest edge.
        #[default]
        SteepestEdge = consts::PT_PSE,
    }
}

native_codes! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    #[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
    pub enum RatioTest {
        Standard = consts::RT_STD,
        /// Harris two-pass ratio test.
        #[default]
        Harris = consts::RT_HAR,
    }
}

native_codes! {
    /// Ordering applied to the normal equations before factorization. The
    /// bundled engine factors dense matrices and only logs this choice.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    #[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
    pub enum Ordering {
        Natural = consts::ORD_NONE,
        QuotientMinimumDegree = consts::ORD_QMD,
        #[default]
        ApproximateMinimumDegree = consts::ORD_AMD,
        SymmetricApproximateMinimumDegree = consts::ORD_SYMAMD,
    }
}

native_codes! {
    /// Branching variable selection.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    #[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
    pub enum Branching {
        FirstFractional = consts::BR_FFV,
        LastFractional = consts::BR_LFV,
        MostFractional = consts::BR_MFV,
        #[default]
        DriebeckTomlin = consts::BR_DTH,
        PseudoCost = consts::BR_PCH,
    }
}

native_codes! {
    /// Order in which open nodes are explored.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    #[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
    pub enum Backtracking {
        DepthFirst = consts::BT_DFS,
        BreadthFirst = consts::BT_BFS,
        #[default]
        BestLocalBound = consts::BT_BLB,
        BestProjection = consts::BT_BPH,
    }
}

native_codes! {
    /// MIP preprocessing level. Passed through; the bundled engine does no
    /// preprocessing.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    #[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
    pub enum Preprocessing {
        None = consts::PP_NONE,
        Root = consts::PP_ROOT,
        #[default]
        All = consts::PP_ALL,
    }
}

fn switch(on: bool) -> c_int {
    if on { consts::ON } else { consts::OFF }
}

fn check_tolerance(name: &'static str, value: f64) -> Result<(), ConfigError> {
    if value >= 0.0 && value.is_finite() {
        Ok(())
    } else {
        Err(ConfigError::InvalidTolerance { name, value })
    }
}

fn check_time_limit(limit: Option<Duration>) -> Result<(), ConfigError> {
    match limit {
        Some(limit) if limit.is_zero() => Err(ConfigError::NonPositiveTimeLimit),
        _ => Ok(()),
    }
}

/// Milliseconds, rounded up so that a positive limit never becomes zero.
fn native_millis(limit: Option<Duration>) -> c_int {
    match limit {
        Some(limit) => {
            let millis = limit.as_nanos().div_ceil(1_000_000);
            c_int::try_from(millis).unwrap_or(c_int::MAX)
        }
        None => c_int::MAX,
    }
}

/// Options for the primal simplex method.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SimplexConfig {
    pub verbosity: Verbosity,
    pub method: SimplexMethod,
    pub pricing: Pricing,
    pub ratio_test: RatioTest,
    /// Primal feasibility tolerance.
    pub primal_tolerance: f64,
    /// Dual feasibility tolerance.
    pub dual_tolerance: f64,
    /// Smallest acceptable pivot magnitude.
    pub pivot_tolerance: f64,
    /// Minimization stops once the objective falls below this value.
    pub objective_lower_limit: Option<f64>,
    /// Maximization stops once the objective rises above this value.
    pub objective_upper_limit: Option<f64>,
    pub iteration_limit: Option<u32>,
    pub time_limit: Option<Duration>,
    /// Let the engine decide infeasibility or unboundedness without a basis.
    pub presolve: bool,
}

impl Default for SimplexConfig {
    fn default() -> Self {
        Self::from_params(&Smcp::default())
    }
}

impl SimplexConfig {
    fn from_params(parm: &Smcp) -> Self {
        let limit = |value: f64| (value.abs() != f64::MAX).then_some(value);
        Self {
            verbosity: Verbosity::from_native(parm.msg_lev).unwrap_or_default(),
            method: SimplexMethod::from_native(parm.meth).unwrap_or_default(),
            pricing: Pricing::from_native(parm.pricing).unwrap_or_default(),
            ratio_test: RatioTest::from_native(parm.r_test).unwrap_or_default(),
            primal_tolerance: parm.tol_bnd,
            dual_tolerance: parm.tol_dj,
            pivot_tolerance: parm.tol_piv,
            objective_lower_limit: limit(parm.obj_ll),
            objective_upper_limit: limit(parm.obj_ul),
            iteration_limit: None,
            time_limit: None,
            presolve: parm.presolve == consts::ON,
        }
    }

    pub fn with_verbosity(mut self, verbosity: Verbosity) -> Self {
        self.verbosity = verbosity;
        self
    }

    pub fn with_method(mut self, method: SimplexMethod) -> Self {
        self.method = method;
        self
    }

    pub fn with_pricing(mut self, pricing: Pricing) -> Self {
        self.pricing = pricing;
        self
    }

    pub fn with_ratio_test(mut self, ratio_test: RatioTest) -> Self {
        self.ratio_test = ratio_test;
        self
    }

    pub fn with_tolerances(mut self, primal: f64, dual: f64, pivot: f64) -> Self {
        self.primal_tolerance = primal;
        self.dual_tolerance = dual;
        self.pivot_tolerance = pivot;
        self
    }

    pub fn with_objective_limits(mut self, lower: Option<f64>, upper: Option<f64>) -> Self {
        self.objective_lower_limit = lower;
        self.objective_upper_limit = upper;
        self
    }

    pub fn with_iteration_limit(mut self, limit: u32) -> Self {
        self.iteration_limit = Some(limit);
        self
    }

    pub fn with_time_limit(mut self, limit: Duration) -> Self {
        self.time_limit = Some(limit);
        self
    }

    pub fn with_presolve(mut self, presolve: bool) -> Self {
        self.presolve = presolve;
        self
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        check_tolerance("primal tolerance", self.primal_tolerance)?;
        check_tolerance("dual tolerance", self.dual_tolerance)?;
        check_tolerance("pivot tolerance", self.pivot_tolerance)?;
        if self.iteration_limit == Some(0) {
            return Err(ConfigError::ZeroIterationLimit);
        }
        check_time_limit(self.time_limit)?;
        let lower = self.objective_lower_limit.unwrap_or(f64::NEG_INFINITY);
        let upper = self.objective_upper_limit.unwrap_or(f64::INFINITY);
        if lower.is_nan() || upper.is_nan() {
            return Err(ConfigError::InvalidObjectiveLimit);
        }
        if lower > upper {
            return Err(ConfigError::ObjectiveLimitsCrossed { lower, upper });
        }
        Ok(())
    }

    pub fn to_native(&self) -> Smcp {
        Smcp {
            msg_lev: self.verbosity.to_native(),
            meth: self.method.to_native(),
            pricing: self.pricing.to_native(),
            r_test: self.ratio_test.to_native(),
            tol_bnd: self.primal_tolerance,
            tol_dj: self.dual_tolerance,
            tol_piv: self.pivot_tolerance,
            obj_ll: self.objective_lower_limit.map_or(-f64::MAX, |v| v.max(-f64::MAX)),
            obj_ul: self.objective_upper_limit.map_or(f64::MAX, |v| v.min(f64::MAX)),
            it_lim: self
                .iteration_limit
                .map_or(c_int::MAX, |limit| c_int::try_from(limit).unwrap_or(c_int::MAX)),
            tm_lim: native_millis(self.time_limit),
            presolve: switch(self.presolve),
            ..Smcp::default()
        }
    }
}

/// Options for the interior-point method.
#[derive(Debug, Clone, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct InteriorConfig {
    pub verbosity: Verbosity,
    pub ordering: Ordering,
}

impl InteriorConfig {
    pub fn with_verbosity(mut self, verbosity: Verbosity) -> Self {
        self.verbosity = verbosity;
        self
    }

    pub fn with_ordering(mut self, ordering: Ordering) -> Self {
        self.ordering = ordering;
        self
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        Ok(())
    }

    pub fn to_native(&self) -> Iptcp {
        Iptcp {
            msg_lev: self.verbosity.to_native(),
            ord_alg: self.ordering.to_native(),
        }
    }
}

/// Options for branch-and-cut, including the simplex run on the relaxation.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct BranchCutConfig {
    pub verbosity: Verbosity,
    pub relaxation: SimplexConfig,
    pub branching: Branching,
    pub backtracking: Backtracking,
    pub preprocessing: Preprocessing,
    /// Tolerance for deciding that a value is integral.
    pub integer_tolerance: f64,
    /// Relative tolerance for pruning nodes against the incumbent.
    pub objective_tolerance: f64,
    pub time_limit: Option<Duration>,
    /// Stop once the relative gap falls to this value. Zero searches to
    /// optimality.
    pub mip_gap: f64,
    pub mir_cuts: bool,
    pub gomory_cuts: bool,
    pub cover_cuts: bool,
    pub clique_cuts: bool,
    /// Let the engine solve the relaxation itself before searching.
    pub presolve: bool,
}

impl Default for BranchCutConfig {
    fn default() -> Self {
        let parm = Iocp::default();
        Self {
            verbosity: Verbosity::from_native(parm.msg_lev).unwrap_or_default(),
            relaxation: SimplexConfig::default(),
            branching: Branching::from_native(parm.br_tech).unwrap_or_default(),
            backtracking: Backtracking::from_native(parm.bt_tech).unwrap_or_default(),
            preprocessing: Preprocessing::from_native(parm.pp_tech).unwrap_or_default(),
            integer_tolerance: parm.tol_int,
            objective_tolerance: parm.tol_obj,
            time_limit: None,
            mip_gap: parm.mip_gap,
            mir_cuts: parm.mir_cuts == consts::ON,
            gomory_cuts: parm.gmi_cuts == consts::ON,
            cover_cuts: parm.cov_cuts == consts::ON,
            clique_cuts: parm.clq_cuts == consts::ON,
            presolve: parm.presolve == consts::ON,
        }
    }
}

impl BranchCutConfig {
    pub fn with_verbosity(mut self, verbosity: Verbosity) -> Self {
        self.verbosity = verbosity;
        self
    }

    pub fn with_relaxation(mut self, relaxation: SimplexConfig) -> Self {
        self.relaxation = relaxation;
        self
    }

    pub fn with_branching(mut self, branching: Branching) -> Self {
        self.branching = branching;
        self
    }

    pub fn with_backtracking(mut self, backtracking: Backtracking) -> Self {
        self.backtracking = backtracking;
        self
    }

    pub fn with_preprocessing(mut self, preprocessing: Preprocessing) -> Self {
        self.preprocessing = preprocessing;
        self
    }

    pub fn with_tolerances(mut self, integer: f64, objective: f64) -> Self {
        self.integer_tolerance = integer;
        self.objective_tolerance = objective;
        self
    }

    pub fn with_time_limit(mut self, limit: Duration) -> Self {
        self.time_limit = Some(limit);
        self
    }

    pub fn with_mip_gap(mut self, gap: f64) -> Self {
        self.mip_gap = gap;
        self
    }

    pub fn with_cuts(mut self, mir: bool, gomory: bool, cover: bool, clique: bool) -> Self {
        self.mir_cuts = mir;
        self.gomory_cuts = gomory;
        self.cover_cuts = cover;
        self.clique_cuts = clique;
        self
    }

    pub fn with_presolve(mut self, presolve: bool) -> Self {
        self.presolve = presolve;
        self
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.relaxation.validate()?;
        check_tolerance("integer tolerance", self.integer_tolerance)?;
        check_tolerance("objective tolerance", self.objective_tolerance)?;
        check_time_limit(self.time_limit)?;
        if !(0.0..1.0).contains(&self.mip_gap) {
            return Err(ConfigError::GapOutOfRange(self.mip_gap));
        }
        Ok(())
    }

    pub fn to_native(&self) -> Iocp {
        Iocp {
            msg_lev: self.verbosity.to_native(),
            br_tech: self.branching.to_native(),
            bt_tech: self.backtracking.to_native(),
            tol_int: self.integer_tolerance,
            tol_obj: self.objective_tolerance,
            tm_lim: native_millis(self.time_limit),
            pp_tech: self.preprocessing.to_native(),
            mip_gap: self.mip_gap,
            mir_cuts: switch(self.mir_cuts),
            gmi_cuts: switch(self.gomory_cuts),
            cov_cuts: switch(self.cover_cuts),
            clq_cuts: switch(self.clique_cuts),
            presolve: switch(self.presolve),
            ..Iocp::default()
        }
    }
}

/// Options for any one solver family.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum SolverConfig {
    Simplex(SimplexConfig),
    Interior(InteriorConfig),
    BranchCut(BranchCutConfig),
}

impl SolverConfig {
    pub fn algorithm(&self) -> Algorithm {
        match self {
            Self::Simplex(_) => Algorithm::Simplex,
            Self::Interior(_) => Algorithm::InteriorPoint,
            Self::BranchCut(_) => Algorithm::BranchCut,
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        match self {
            Self::Simplex(config) => config.validate(),
            Self::Interior(config) => config.validate(),
            Self::BranchCut(config) => config.validate(),
        }
    }
}

impl From<SimplexConfig> for SolverConfig {
    fn from(config: SimplexConfig) -> Self {
        Self::Simplex(config)
    }
}

impl From<InteriorConfig> for SolverConfig {
    fn from(config: InteriorConfig) -> Self {
        Self::Interior(config)
    }
}

impl From<BranchCutConfig> for SolverConfig {
    fn from(config: BranchCutConfig) -> Self {
        Self::BranchCut(config)
    }
}
