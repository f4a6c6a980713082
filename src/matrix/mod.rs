mod elem;
mod gaussian;
mod indexing;
mod kernels;
mod matrix;
mod ops;
mod squish;
mod transpose;

pub use elem::*;
pub use gaussian::*;
pub use indexing::*;
pub use kernels::*;
pub use matrix::*;
pub use squish::*;
pub use transpose::*;
