//! Compilation session: owner of all state for one translation run.
//!
//! The text arena, identifier sanitizer, type catalog and result tree are
//! shared by every function lowered in the session and are never reset
//! between functions.

use arrc_ir::{AstArena, FunctionDef, Name, NodeId, StringInterner, TypePool, VarResolver};

use crate::c::signature::{NoOffload, OffloadDecorator, Signature};
use crate::catalog::TypeCatalog;
use crate::ident::IdentSanitizer;
use crate::lower::FunctionLowerer;
use crate::text::{TextArena, TextId};
use crate::tree::{ResultId, ResultTree};
use crate::{Advisory, CodegenError, CodegenOptions};

/// Per-function bookkeeping filled during lowering and consumed at
/// emission.
#[derive(Clone, Debug)]
pub struct FunctionRecord {
    pub name: Name,
    pub module: Name,
    pub is_root: bool,
    /// Result of the function body.
    pub root: Option<ResultId>,
    pub signature: Signature,
    pub local_declarations: Vec<TextId>,
    pub array_initializations: Vec<TextId>,
    /// Arrays flowing out through a return statement.
    pub return_arrays: Vec<Name>,
    /// Arrays allocated in the function.
    pub local_arrays: Vec<Name>,
    /// `(left, right)` for every array assignment `left = right`.
    pub aliased_pairs: Vec<(Name, Name)>,
    /// Results created for this function, in creation order.
    pub results: Vec<ResultId>,
}

/// Generated program text plus the advisories raised along the way.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CodegenOutput {
    pub code: String,
    pub advisories: Vec<Advisory>,
}

/// State for one compilation run.
pub struct CompilationSession<'a> {
    pub(crate) interner: &'a StringInterner,
    pub(crate) types: &'a TypePool,
    pub(crate) ast: &'a AstArena,
    pub(crate) options: CodegenOptions,
    pub(crate) code: TextArena,
    pub(crate) idents: IdentSanitizer,
    pub(crate) catalog: TypeCatalog,
    pub(crate) tree: ResultTree,
    pub(crate) functions: Vec<FunctionRecord>,
    pub(crate) current: Option<usize>,
    pub(crate) decorator: Box<dyn OffloadDecorator + 'a>,
    temp_counter: u32,
    advisories: Vec<Advisory>,
}

impl<'a> CompilationSession<'a> {
    pub fn new(
        interner: &'a StringInterner,
        types: &'a TypePool,
        ast: &'a AstArena,
        options: CodegenOptions,
    ) -> Self {
        let code = TextArena::with_capacity(options.code_capacity);
        let idents = IdentSanitizer::with_capacity(options.code_capacity / 8);
        CompilationSession {
            interner,
            types,
            ast,
            options,
            code,
            idents,
            catalog: TypeCatalog::new(),
            tree: ResultTree::new(),
            functions: Vec::new(),
            current: None,
            decorator: Box::new(NoOffload),
            temp_counter: 0,
            advisories: Vec::new(),
        }
    }

    /// Use `decorator` for offload pragmas and function hooks.
    #[must_use]
    pub fn with_decorator(mut self, decorator: Box<dyn OffloadDecorator + 'a>) -> Self {
        self.decorator = decorator;
        self
    }

    /// Lower one function into the session. Returns its index.
    pub fn lower_function(
        &mut self,
        def: &FunctionDef,
        resolver: &dyn VarResolver,
    ) -> Result<usize, CodegenError> {
        let _span = tracing::debug_span!(
            "lower_function",
            name = self.interner.lookup(def.name),
            root = def.is_root
        )
        .entered();

        let signature = Signature::build(self, def, resolver)?;
        tracing::debug!(signature = %signature.text, "built signature");

        let index = self.functions.len();
        self.functions.push(FunctionRecord {
            name: def.name,
            module: def.module,
            is_root: def.is_root,
            root: None,
            signature,
            local_declarations: Vec::new(),
            array_initializations: Vec::new(),
            return_arrays: Vec::new(),
            local_arrays: Vec::new(),
            aliased_pairs: Vec::new(),
            results: Vec::new(),
        });
        self.current = Some(index);

        let outcome = FunctionLowerer::new(self, index, resolver).run(def);
        self.current = None;
        outcome?;
        Ok(index)
    }

    /// Record of the function being lowered.
    pub fn current_function(&self) -> Result<&FunctionRecord, CodegenError> {
        self.current
            .and_then(|i| self.functions.get(i))
            .ok_or(CodegenError::NoCurrentFunction)
    }

    pub fn functions(&self) -> &[FunctionRecord] {
        &self.functions
    }

    pub fn tree(&self) -> &ResultTree {
        &self.tree
    }

    pub fn catalog(&self) -> &TypeCatalog {
        &self.catalog
    }

    pub fn code(&self) -> &TextArena {
        &self.code
    }

    pub fn options(&self) -> &CodegenOptions {
        &self.options
    }

    pub fn interner(&self) -> &'a StringInterner {
        self.interner
    }

    /// Fresh temporary name `__t<n>`, unique for the session.
    ///
    /// Spellings already in the interner belong to source symbols and are
    /// skipped, so a temporary never shares a C variable with one.
    pub fn fresh_temp(&mut self) -> Result<Name, CodegenError> {
        loop {
            let name = format!("__t{}", self.temp_counter);
            self.temp_counter += 1;
            if self.interner.get(&name).is_some() {
                tracing::debug!(%name, "temporary name taken by a source symbol");
                continue;
            }
            return self
                .interner
                .try_intern(&name)
                .map_err(|e| CodegenError::internal(e.to_string()));
        }
    }

    /// Log and record a best-effort fallback.
    pub fn warn(&mut self, node: Option<NodeId>, message: String) {
        tracing::warn!(?node, "{message}");
        self.advisories.push(Advisory { node, message });
    }

    /// All advisories raised so far, including catalog and identifier ones.
    pub fn take_advisories(&mut self) -> Vec<Advisory> {
        let mut all = std::mem::take(&mut self.advisories);
        all.extend(self.catalog.take_advisories());
        all.extend(self.idents.take_advisories());
        all
    }

    /// Assemble the whole program.
    ///
    /// Order: includes, type declarations, forward declarations, function
    /// definitions, then the external wrapper of the root function.
    pub fn finish(mut self) -> Result<CodegenOutput, CodegenError> {
        let mut out = String::new();
        for include in &self.options.includes {
            out.push_str("#include ");
            out.push_str(include);
            out.push('\n');
        }
        out.push('\n');

        let declarations = self.catalog.emit_declarations(&mut self.code)?;
        for id in declarations {
            out.push_str(self.code.get(id));
        }
        out.push('\n');

        for record in &self.functions {
            out.push_str(&record.signature.text);
            out.push_str(";\n");
        }
        out.push('\n');

        for index in 0..self.functions.len() {
            self.emit_function(index, &mut out)?;
        }

        if let Some(root) = self.functions.iter().find(|f| f.is_root) {
            out.push_str(&root.signature.root_wrapper(self.decorator.as_ref()));
        }

        tracing::debug!(
            functions = self.functions.len(),
            bytes = out.len(),
            catalog_entries = self.catalog.len(),
            "program assembled"
        );
        let advisories = self.take_advisories();
        Ok(CodegenOutput {
            code: out,
            advisories,
        })
    }
}
