//! Single-pass lowering of array-oriented ASTs to C source text.
//!
//! # Architecture
//!
//! ```text
//! FunctionDef + AstArena + TypePool
//!        ↓
//!   FunctionLowerer    (pre-order walk: one ResultNode per AST node)
//!        ↓
//!   ResultTree         (prologs, epilogs, hoisted children, renames)
//!        ↓
//!   AliasInfo          (which local arrays escape through a return)
//!        ↓
//!   emit               (DFS over the tree, frees before returns)
//!        ↓
//!   CodegenOutput      (C translation unit + advisories)
//! ```
//!
//! All generated text lives in the session's [`TextArena`]; identifiers
//! come from an [`IdentSanitizer`] with its own arena; C types come from
//! the session-wide [`TypeCatalog`], which merges structurally equal types.
//!
//! # Tracing
//!
//! Set `RUST_LOG=arrc_codegen=debug` and call [`init_tracing`] to see per
//! function progress; `trace` adds one event per lowered node.

mod analysis;
pub mod c;
mod catalog;
mod error;
mod ident;
mod lower;
mod options;
mod session;
mod stack;
mod text;
mod tree;

use std::sync::Once;

use arrc_ir::{AstArena, FunctionDef, StringInterner, TypePool, VarResolver};

pub use analysis::{compute_freeable_locals, compute_return_aliases, AliasInfo};
pub use c::{NoOffload, OffloadDecorator, RootArrayParam, Signature};
pub use catalog::{
    CatalogEntry, CatalogIdx, EntryFlags, EntrySource, TypeCatalog, MAX_STRUCT_FIELDS,
};
pub use error::{Advisory, CodegenError};
pub use ident::{sanitize_str, IdentSanitizer};
pub use options::CodegenOptions;
pub use session::{CodegenOutput, CompilationSession, FunctionRecord};
pub use text::{FragmentBuilder, TextArena, TextId};
pub use tree::{ResultId, ResultNode, ResultTree, ResultVar};

static TRACING_INIT: Once = Once::new();

/// Install a `tracing` subscriber filtered by `RUST_LOG`.
///
/// Does nothing when `RUST_LOG` is unset or a global subscriber is already
/// installed. Safe to call more than once.
pub fn init_tracing() {
    TRACING_INIT.call_once(|| {
        use tracing_subscriber::{fmt, prelude::*, EnvFilter};

        if std::env::var("RUST_LOG").is_ok() {
            let filter = EnvFilter::from_default_env();
            let _ = tracing_subscriber::registry()
                .with(fmt::layer().with_writer(std::io::stderr).with_target(true))
                .with(filter)
                .try_init();
        }
    });
}

/// Lower `functions` in order and assemble the translation unit.
pub fn generate(
    interner: &StringInterner,
    types: &TypePool,
    ast: &AstArena,
    functions: &[(&FunctionDef, &dyn VarResolver)],
    options: CodegenOptions,
) -> Result<CodegenOutput, CodegenError> {
    let mut session = CompilationSession::new(interner, types, ast, options);
    for (def, resolver) in functions {
        session.lower_function(def, *resolver)?;
    }
    session.finish()
}
