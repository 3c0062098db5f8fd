//! arrc IR - input contract for the array-to-C translator
//!
//! This crate contains the data the code generator consumes:
//! - Names for interned identifiers
//! - A host type pool (`TypeId` handles into `TypePool`)
//! - A flat AST arena addressed by `NodeId`
//! - Function definitions and the `VarResolver` collaborator trait
//!
//! # Design Philosophy
//!
//! - **Intern Everything**: Strings → Name(u32), Types → TypeId(u32)
//! - **Flatten Everything**: No Box<Node>, use NodeId(u32) indices
//! - **Closed node set**: every node kind is a `NodeKind` variant, matched
//!   exhaustively by the lowering passes
//!
//! Types that contain floats store them as bits for Hash compatibility.
//! The arena never deduplicates: two structurally equal types or nodes get
//! distinct handles, and it is the code generator's job to reconcile them.

/// Compile-time assertion that a type has a specific size.
///
/// Used to prevent accidental size regressions in frequently-allocated types.
#[macro_export]
macro_rules! static_assert_size {
    ($ty:ty, $size:expr) => {
        const _: [(); $size] = [(); ::std::mem::size_of::<$ty>()];
    };
}

pub mod ast;
mod ids;
mod interner;
mod name;
mod resolver;
pub mod types;

pub use ast::{
    AstArena, BinaryOp, Callee, CheckedOp, FunctionDef, Literal, Node, NodeKind, Param, UnaryOp,
};
pub use ids::{NodeId, NodeRange, TypeId};
pub use interner::{InternError, StringInterner};
pub use name::Name;
pub use resolver::{FunctionScope, VarKind, VarResolver};
pub use types::{TypeData, TypePool};

static_assert_size!(NodeId, 4);
static_assert_size!(TypeId, 4);
static_assert_size!(Name, 4);
