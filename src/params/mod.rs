mod params;

pub use params::*;
