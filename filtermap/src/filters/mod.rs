//! Form field kinds and the normalizers that clean raw parameter values.

pub mod normalizers;

pub use normalizers::*;
