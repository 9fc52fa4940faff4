//! Native integer codes understood by the engine API.

use std::ffi::c_int;

// Optimization direction
pub const MIN: c_int = 1;
pub const MAX: c_int = 2;

// Row/column bound kinds
pub const FR: c_int = 1;
pub const LO: c_int = 2;
pub const UP: c_int = 3;
pub const DB: c_int = 4;
pub const FX: c_int = 5;

// Column kinds. `BV` is accepted by `set_col_kind` and stored as `IV` with
// bounds [0, 1].
pub const CV: c_int = 1;
pub const IV: c_int = 2;
pub const BV: c_int = 3;

// Solution status
pub const UNDEF: c_int = 1;
pub const FEAS: c_int = 2;
pub const INFEAS: c_int = 3;
pub const NOFEAS: c_int = 4;
pub const OPT: c_int = 5;
pub const UNBND: c_int = 6;

// Return codes of the solve entry points
pub const OK: c_int = 0;
pub const EBADB: c_int = 0x01;
pub const ESING: c_int = 0x02;
pub const ECOND: c_int = 0x03;
pub const EBOUND: c_int = 0x04;
pub const EFAIL: c_int = 0x05;
pub const EOBJLL: c_int = 0x06;
pub const EOBJUL: c_int = 0x07;
pub const EITLIM: c_int = 0x08;
pub const ETMLIM: c_int = 0x09;
pub const ENOPFS: c_int = 0x0A;
pub const ENODFS: c_int = 0x0B;
pub const EROOT: c_int = 0x0C;
pub const ESTOP: c_int = 0x0D;
pub const EMIPGAP: c_int = 0x0E;
pub const ENOFEAS: c_int = 0x0F;
pub const ENOCVG: c_int = 0x10;
pub const EINSTAB: c_int = 0x11;

// Message levels
pub const MSG_OFF: c_int = 0;
pub const MSG_ERR: c_int = 1;
pub const MSG_ON: c_int = 2;
pub const MSG_ALL: c_int = 3;

// Simplex method
pub const PRIMAL: c_int = 1;
pub const DUALP: c_int = 2;
pub const DUAL: c_int = 3;

// Pricing
pub const PT_STD: c_int = 0x11;
pub const PT_PSE: c_int = 0x22;

// Ratio test
pub const RT_STD: c_int = 0x11;
pub const RT_HAR: c_int = 0x22;

// Interior-point ordering
pub const ORD_NONE: c_int = 0;
pub const ORD_QMD: c_int = 1;
pub const ORD_AMD: c_int = 2;
pub const ORD_SYMAMD: c_int = 3;

// Branching technique
pub const BR_FFV: c_int = 1;
pub const BR_LFV: c_int = 2;
pub const BR_MFV: c_int = 3;
pub const BR_DTH: c_int = 4;
pub const BR_PCH: c_int = 5;

// Backtracking technique
pub const BT_DFS: c_int = 1;
pub const BT_BFS: c_int = 2;
pub const BT_BLB: c_int = 3;
pub const BT_BPH: c_int = 4;

// Preprocessing technique
pub const PP_NONE: c_int = 0;
pub const PP_ROOT: c_int = 1;
pub const PP_ALL: c_int = 2;

// Switches
pub const OFF: c_int = 0;
pub const ON: c_int = 1;

/// Largest row or column count a single problem may hold.
pub const MAX_DIMENSION: c_int = 100_000_000;
