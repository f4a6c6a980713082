mod arith;

pub use arith::*;
