//! C text assembly.
//!
//! `signature` builds function declarators and the external root wrapper;
//! `emit` walks the result tree of each function in execution order.

mod emit;
pub mod signature;

pub use signature::{NoOffload, OffloadDecorator, RootArrayParam, Signature};
