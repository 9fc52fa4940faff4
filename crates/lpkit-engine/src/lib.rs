//! In-process LP/MIP engine behind an opaque handle.
//!
//! The surface mirrors a classic C solver library: a problem object is
//! created with [`create_prob`], populated row by row and column by column
//! through 1-based indices and sentinel-padded arrays, solved with
//! [`simplex`], [`interior`] or [`intopt`], and queried through plain
//! accessor functions. Status and return codes are the integers in
//! [`consts`].

mod api;
pub mod consts;
mod interior;
mod intopt;
mod lp;
pub mod params;
mod prob;
mod simplex;

pub use api::*;
pub use params::{Iocp, Iptcp, Smcp, Stats};
pub use prob::Prob;
