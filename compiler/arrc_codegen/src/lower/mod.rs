//! Single-pass lowering of one function body into the result tree.
//!
//! The walk is pre-order: a node's result is created and linked under its
//! parent before the node's handler lowers its operands. Handlers live in
//! the sibling modules as further `impl FunctionLowerer` blocks:
//!
//! - `scalar`: literals, operators, conversions, selects
//! - `call`: function and foreign calls
//! - `data`: tuples and records
//! - `array`: allocation, element access, extents
//! - `control`: assignment, labels, branches, returns, statement bodies
//! - `decls`: local declarations collected after the walk

mod array;
mod call;
mod control;
mod data;
mod decls;
mod scalar;

use arrc_ir::{
    AstArena, FunctionDef, Literal, Name, NodeId, NodeKind, NodeRange, TypeId, VarResolver,
};
use rustc_hash::FxHashMap;

use crate::catalog::CatalogIdx;
use crate::session::{CompilationSession, FunctionRecord};
use crate::stack::ensure_sufficient_stack;
use crate::text::{FragmentBuilder, TextId};
use crate::tree::{ResultId, ResultNode, ResultVar};
use crate::CodegenError;

use control::InlineReturn;
pub(crate) use scalar::render_literal;

/// Lowers the body of one function into the session's result tree.
pub(crate) struct FunctionLowerer<'s, 'a> {
    s: &'s mut CompilationSession<'a>,
    resolver: &'s dyn VarResolver,
    func: usize,
    /// SSA slot to its shared result.
    ssa_slots: FxHashMap<u32, ResultId>,
    inline_returns: Vec<InlineReturn>,
}

impl<'s, 'a> FunctionLowerer<'s, 'a> {
    pub(crate) fn new(
        s: &'s mut CompilationSession<'a>,
        func: usize,
        resolver: &'s dyn VarResolver,
    ) -> Self {
        FunctionLowerer {
            s,
            resolver,
            func,
            ssa_slots: FxHashMap::default(),
            inline_returns: Vec::new(),
        }
    }

    /// Lower the body, then collect declarations.
    pub(crate) fn run(mut self, def: &FunctionDef) -> Result<(), CodegenError> {
        let root = self.get_or_create(def.body)?;
        self.record().root = Some(root);
        self.lower(def.body, root)?;
        self.spill_inline_returns()?;
        self.declare_locals(def)?;

        let record = self.record();
        tracing::debug!(
            results = record.results.len(),
            locals = record.local_declarations.len(),
            local_arrays = record.local_arrays.len(),
            "function lowered"
        );
        Ok(())
    }

    fn record(&mut self) -> &mut FunctionRecord {
        &mut self.s.functions[self.func]
    }

    fn ast(&self) -> &'a AstArena {
        self.s.ast
    }

    /// Create (or fetch) the result of `node`, link it under `parent` and
    /// lower it.
    fn operand(&mut self, parent: ResultId, node: NodeId) -> Result<ResultId, CodegenError> {
        let child = self.get_or_create(node)?;
        self.s.tree.link(parent, child);
        self.lower(node, child)?;
        Ok(child)
    }

    /// Run the handler for `node` unless it already ran.
    fn lower(&mut self, node: NodeId, r: ResultId) -> Result<(), CodegenError> {
        let result = self.s.tree.get_mut(r);
        if result.lowered {
            return Ok(());
        }
        result.lowered = true;
        ensure_sufficient_stack(|| self.dispatch(node, r))
    }

    fn dispatch(&mut self, node: NodeId, r: ResultId) -> Result<(), CodegenError> {
        let kind = &self.ast().get(node).kind;
        tracing::trace!(?node, ?kind, "lowering");
        match *kind {
            NodeKind::Symbol(_)
            | NodeKind::Global(_)
            | NodeKind::SsaValue(_)
            | NodeKind::Literal(_) => Ok(()),
            NodeKind::Call { callee, args } => self.lower_call(r, node, callee, args),
            NodeKind::Binary { op, left, right } => self.lower_binary(r, op, left, right),
            NodeKind::Unary { op, operand } => self.lower_unary(r, op, operand),
            NodeKind::Checked { op, left, right } => self.lower_checked(r, op, left, right),
            NodeKind::Convert { operand } => self.lower_convert(r, operand),
            NodeKind::Select {
                cond,
                then_val,
                else_val,
            } => self.lower_select(r, cond, then_val, else_val),
            NodeKind::Is { left, right } => self.lower_is(r, left, right),
            NodeKind::Assign { target, value } => self.lower_assign(r, target, value),
            NodeKind::Tuple { elems } => self.lower_tuple(r, elems),
            NodeKind::TupleRef { tuple, index } => self.lower_tuple_ref(r, tuple, index),
            NodeKind::New { fields } => self.lower_new(r, fields),
            NodeKind::GetField { object, field } => self.lower_get_field(r, object, field),
            NodeKind::ArrayAlloc { dims } => self.lower_array_alloc(r, dims),
            NodeKind::ArrayRef {
                array,
                indices,
                inbounds,
            } => self.lower_array_ref(r, array, indices, inbounds),
            NodeKind::ArraySet {
                array,
                value,
                indices,
                inbounds,
            } => self.lower_array_set(r, array, value, indices, inbounds),
            NodeKind::ArraySize { array, dim } => self.lower_array_size(r, array, dim),
            NodeKind::ArrayLen { array } => self.lower_array_len(r, array),
            NodeKind::ArrayPtr { array } => self.lower_array_ptr(r, array),
            NodeKind::Label(label) => self.lower_label(r, label),
            NodeKind::Goto(label) => self.lower_goto(r, label),
            NodeKind::GotoIfNot { cond, label } => self.lower_goto_if_not(r, cond, label),
            NodeKind::Return { value } => self.lower_return(r, value),
            NodeKind::LineNumber { line, file } => self.lower_line_number(r, line, file),
            NodeKind::Throw => self.lower_throw(r),
            NodeKind::Body { stmts } => self.lower_body(r, stmts),
            NodeKind::Other { head } => Err(CodegenError::UnsupportedNode {
                kind: self.s.interner.lookup(head).to_owned(),
                node,
            }),
        }
    }

    /// Result for `node`, creating it on first visit.
    fn get_or_create(&mut self, node: NodeId) -> Result<ResultId, CodegenError> {
        if let Some(r) = self.s.tree.memoized(node) {
            return Ok(r);
        }
        let ast_node = self.ast().get(node);
        let mut result = ResultNode::new(node, ast_node.ty, ast_node.fusion_depth);
        let mut pending_epilog = None;

        match ast_node.kind {
            NodeKind::Symbol(name) => {
                result.ty = self.resolver.var_type(name).ok_or_else(|| {
                    CodegenError::UnresolvedSymbol {
                        name: self.s.interner.lookup(name).to_owned(),
                        node,
                    }
                })?;
                result.var = ResultVar::Symbol(name);
            }
            NodeKind::Global(name) => {
                result.ty = self.resolver.var_type(name).unwrap_or(ast_node.ty);
                result.var = ResultVar::Symbol(name);
            }
            NodeKind::SsaValue(slot) => {
                if let Some(&shared) = self.ssa_slots.get(&slot) {
                    self.s.tree.memoize_as(node, shared);
                    return Ok(shared);
                }
                result.var = ResultVar::Symbol(self.s.fresh_temp()?);
                result.is_temporary = true;
            }
            NodeKind::Literal(lit) => match render_literal(&lit, self.s.interner) {
                Some(text) if self.s.options.min_temps => {
                    result.var = ResultVar::Constant(self.s.code.append(&text)?);
                    result.is_constant = true;
                }
                Some(text) => {
                    let temp = self.s.fresh_temp()?;
                    result.var = ResultVar::Symbol(temp);
                    result.is_temporary = true;
                    pending_epilog = Some((temp, text));
                }
                None => {
                    let Literal::Boxed(slot) = lit else {
                        return Err(CodegenError::internal("unrenderable literal"));
                    };
                    let temp = self.s.fresh_temp()?;
                    result.var = ResultVar::Symbol(temp);
                    result.is_temporary = true;
                    let source = self.ident(slot)?;
                    self.s.warn(
                        Some(node),
                        format!("boxed value `{source}` copied through a temporary"),
                    );
                    pending_epilog = Some((temp, source));
                }
            },
            _ => {}
        }

        self.catalog_idx(result.ty)?;
        let scalarized = ast_node.scalarized && self.s.types.is_array(result.ty);

        let r = self.s.tree.insert(result)?;
        if scalarized {
            self.s.tree.mark_scalar(r);
        }
        self.record().results.push(r);
        if let NodeKind::SsaValue(slot) = ast_node.kind {
            self.ssa_slots.insert(slot, r);
        }
        if let Some((temp, text)) = pending_epilog {
            let temp = self.ident(temp)?;
            self.add_epilog(r, &format!("{temp} = {text};\n"))?;
        }
        Ok(r)
    }

    /// Catalog entry for `ty`, registering it on first use.
    fn catalog_idx(&mut self, ty: TypeId) -> Result<CatalogIdx, CodegenError> {
        self.s.catalog.register(ty, self.s.types, self.s.interner)
    }

    /// C spelling of `ty`.
    fn c_type(&mut self, ty: TypeId) -> Result<String, CodegenError> {
        let idx = self.catalog_idx(ty)?;
        Ok(self.s.catalog.target_name(idx).to_owned())
    }

    fn is_void(&mut self, ty: TypeId) -> Result<bool, CodegenError> {
        let idx = self.catalog_idx(ty)?;
        Ok(self.s.catalog.is_void(idx))
    }

    /// Array value that is still an array in the generated code.
    fn is_array_value(&self, r: ResultId) -> bool {
        let result = self.s.tree.get(r);
        !result.made_scalar && self.s.types.is_array(result.ty)
    }

    fn ident(&mut self, name: Name) -> Result<String, CodegenError> {
        Ok(self.s.idents.ident(name, self.s.interner)?.to_owned())
    }

    fn resolve(&self, r: ResultId) -> Result<ResultId, CodegenError> {
        self.s.tree.resolve(r, self.s.options.max_alias_chain)
    }

    /// Temporary holding the value of `r`, allocated on first request.
    fn temp_var(&mut self, r: ResultId) -> Result<Name, CodegenError> {
        if let Some(name) = self.s.tree.get(r).symbol() {
            return Ok(name);
        }
        let temp = self.s.fresh_temp()?;
        let result = self.s.tree.get_mut(r);
        result.var = ResultVar::Symbol(temp);
        result.is_temporary = true;
        result.is_constant = false;
        Ok(temp)
    }

    /// Named slot behind `r` after following representatives.
    fn slot_name(&mut self, r: ResultId) -> Result<Option<Name>, CodegenError> {
        let resolved = self.resolve(r)?;
        match self.s.tree.get(resolved).var {
            ResultVar::Symbol(name) => Ok(Some(name)),
            ResultVar::Constant(_) => Ok(None),
            ResultVar::Pending => self.temp_var(resolved).map(Some),
        }
    }

    /// C expression reading the value of `r`.
    fn result_variable_string(&mut self, r: ResultId) -> Result<String, CodegenError> {
        let resolved = self.resolve(r)?;
        match self.s.tree.get(resolved).var {
            ResultVar::Symbol(name) => self.ident(name),
            ResultVar::Constant(id) => Ok(self.s.code.get(id).to_owned()),
            ResultVar::Pending => {
                let (node, ty) = {
                    let result = self.s.tree.get(resolved);
                    (result.node, result.ty)
                };
                if self.is_void(ty)? {
                    return Err(CodegenError::internal(format!(
                        "node {node:?} has no value to read"
                    )));
                }
                let temp = self.temp_var(resolved)?;
                self.ident(temp)
            }
        }
    }

    /// Give `r` the value of the C expression `expr`.
    ///
    /// Inlined as a constant expression when temporaries are minimized,
    /// otherwise assigned to a temporary in the epilog.
    fn set_value(&mut self, r: ResultId, expr: &str) -> Result<(), CodegenError> {
        if self.s.options.min_temps {
            let id = self.s.code.append(expr)?;
            let result = self.s.tree.get_mut(r);
            result.var = ResultVar::Constant(id);
            result.is_constant = true;
            return Ok(());
        }
        let temp = self.temp_var(r)?;
        let temp = self.ident(temp)?;
        self.add_epilog(r, &format!("{temp} = {expr};\n"))
    }

    fn add_prolog(&mut self, r: ResultId, text: &str) -> Result<(), CodegenError> {
        let existing = self.s.tree.get(r).prolog;
        let id = self.extend_fragment(existing, text)?;
        self.s.tree.set_prolog(r, id);
        Ok(())
    }

    fn add_epilog(&mut self, r: ResultId, text: &str) -> Result<(), CodegenError> {
        let existing = self.s.tree.get(r).epilog;
        let id = self.extend_fragment(existing, text)?;
        self.s.tree.set_epilog(r, id);
        Ok(())
    }

    /// Append `text` to a fragment, in place when it is the arena tail and
    /// through a copied builder otherwise.
    fn extend_fragment(
        &mut self,
        existing: Option<TextId>,
        text: &str,
    ) -> Result<TextId, CodegenError> {
        match existing {
            None => self.s.code.append(text),
            Some(id) if self.s.code.tail() == Some(id) => self.s.code.continue_tail(id, text),
            Some(id) => {
                let mut builder = FragmentBuilder::new();
                builder.push(self.s.code.get(id)).push(text);
                self.s.code.commit(builder)
            }
        }
    }

    /// Lower every node of `list` under `r`, returning their C expressions.
    fn operand_strings(
        &mut self,
        r: ResultId,
        list: NodeRange,
    ) -> Result<Vec<String>, CodegenError> {
        let ids = self.ast().get_list(list);
        let mut out = Vec::with_capacity(ids.len());
        for &id in ids {
            let child = self.operand(r, id)?;
            out.push(self.result_variable_string(child)?);
        }
        Ok(out)
    }
}

#[cfg(test)]
mod tests;
