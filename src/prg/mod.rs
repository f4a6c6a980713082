mod prg;
mod source;

pub use prg::*;
pub use source::*;
