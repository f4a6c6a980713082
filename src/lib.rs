//! Single-server private information retrieval from LWE, with a reusable
//! client-side hint.

pub mod arith;
pub mod error;
pub mod matrix;
pub mod params;
pub mod pir;
pub mod prg;

pub use error::{Error, Result};
