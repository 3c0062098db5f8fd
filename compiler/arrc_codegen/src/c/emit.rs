//! Function text emission.
//!
//! Each result emits, in order: its precomputed (hoisted) children, its
//! prolog, its children, its epilog and finally its return statement. The
//! frees of the function's non-returned local arrays go directly before
//! every return statement.

use crate::analysis::AliasInfo;
use crate::session::CompilationSession;
use crate::stack::ensure_sufficient_stack;
use crate::text::TextArena;
use crate::tree::{ResultId, ResultTree};
use crate::CodegenError;

impl CompilationSession<'_> {
    /// Append the definition of function `index` to `out`.
    pub(crate) fn emit_function(
        &mut self,
        index: usize,
        out: &mut String,
    ) -> Result<(), CodegenError> {
        let record = &self.functions[index];
        let root = record.root.ok_or_else(|| {
            CodegenError::internal(format!(
                "function `{}` was never lowered",
                record.signature.c_name
            ))
        })?;
        let info = AliasInfo::analyze(
            &record.return_arrays,
            &record.local_arrays,
            &record.aliased_pairs,
        );

        let mut frees = String::new();
        for &array in &info.freeable {
            frees.push_str("FREEARRAY(");
            frees.push_str(self.idents.ident(array, self.interner)?);
            frees.push_str(");\n");
        }

        let c_name = &record.signature.c_name;
        out.push_str(&record.signature.text);
        out.push_str("\n{\n");
        for &id in &record.local_declarations {
            out.push_str(self.code.get(id));
        }
        out.push_str("\n// Initializing arrays\n");
        for &id in &record.array_initializations {
            out.push_str(self.code.get(id));
        }
        if let Some(text) = self.decorator.function_prologue(c_name) {
            out.push_str(&text);
            out.push('\n');
        }

        emit_node(&self.tree, &self.code, root, &frees, out);

        if let Some(text) = self.decorator.function_epilogue(c_name) {
            out.push_str(&text);
            out.push('\n');
        }
        out.push_str("}\n\n");

        tracing::debug!(
            function = %c_name,
            return_aliases = info.return_aliases.len(),
            freed = info.freeable.len(),
            "function emitted"
        );
        Ok(())
    }
}

/// Depth-first emission of one result subtree.
pub(crate) fn emit_node(
    tree: &ResultTree,
    code: &TextArena,
    id: ResultId,
    frees: &str,
    out: &mut String,
) {
    ensure_sufficient_stack(|| {
        let node = tree.get(id);
        for &child in &node.precomputed_children {
            emit_node(tree, code, child, frees, out);
        }
        if let Some(prolog) = node.prolog {
            out.push_str(code.get(prolog));
        }
        for &child in &node.children {
            emit_node(tree, code, child, frees, out);
        }
        if let Some(epilog) = node.epilog {
            out.push_str(code.get(epilog));
        }
        if let Some(ret) = node.return_statement {
            out.push_str(frees);
            out.push_str(code.get(ret));
        }
    });
}
