//! The PIR protocol: the server preprocesses a database into a hint, the
//! client turns an index into a masked query, and decodes the server's answer
//! with its secret and the hint.

mod client;
mod lhe;
mod messages;
mod server;

pub use client::*;
pub use messages::*;
pub use server::*;
