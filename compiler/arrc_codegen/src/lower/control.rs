//! Assignment, control flow and statement sequences.

use arrc_ir::{Name, NodeId, NodeKind, NodeRange};

use super::FunctionLowerer;
use crate::analysis::AliasInfo;
use crate::tree::{ResultId, ResultVar};
use crate::CodegenError;

impl FunctionLowerer<'_, '_> {
    /// `target = value`.
    ///
    /// An assignment into a temporary is a rename when temporaries are
    /// minimized: the temporary's reads go to `value` and no statement is
    /// emitted. Array assignments between distinct named slots are recorded
    /// for the return-alias analysis.
    pub(super) fn lower_assign(
        &mut self,
        r: ResultId,
        target: NodeId,
        value: NodeId,
    ) -> Result<(), CodegenError> {
        let l = self.operand(r, target)?;
        let v = self.operand(r, value)?;
        if self.resolve(l)? == self.resolve(v)? {
            return Ok(());
        }

        if self.is_array_value(l) && self.is_array_value(v) {
            if let (Some(left), Some(right)) = (self.slot_name(l)?, self.slot_name(v)?) {
                if left == right {
                    return Ok(());
                }
                self.record().aliased_pairs.push((left, right));
            }
        }

        if self.s.options.min_temps && self.s.tree.get(l).is_temporary {
            tracing::trace!(target = ?l, value = ?v, "assignment folded into representative");
            self.s.tree.set_representative(l, v);
            return Ok(());
        }

        let lhs = self.result_variable_string(l)?;
        let rhs = self.result_variable_string(v)?;
        self.add_epilog(r, &format!("{lhs} = {rhs};\n"))
    }

    pub(super) fn lower_label(&mut self, r: ResultId, label: u32) -> Result<(), CodegenError> {
        self.add_prolog(r, &format!("label{label}:\n"))
    }

    pub(super) fn lower_goto(&mut self, r: ResultId, label: u32) -> Result<(), CodegenError> {
        self.add_prolog(r, &format!("goto label{label};\n"))
    }

    pub(super) fn lower_goto_if_not(
        &mut self,
        r: ResultId,
        cond: NodeId,
        label: u32,
    ) -> Result<(), CodegenError> {
        let c = self.operand(r, cond)?;
        let c = self.result_variable_string(c)?;
        self.add_epilog(r, &format!("if (!({c})) goto label{label};\n"))
    }

    pub(super) fn lower_line_number(
        &mut self,
        r: ResultId,
        line: u32,
        file: Option<Name>,
    ) -> Result<(), CodegenError> {
        if !self.s.options.line_directives {
            return Ok(());
        }
        let directive = match file {
            Some(file) => format!("\n# {line} \"{}\"\n", self.s.interner.lookup(file)),
            None => format!("\n# {line}\n"),
        };
        self.add_prolog(r, &directive)
    }

    pub(super) fn lower_throw(&mut self, r: ResultId) -> Result<(), CodegenError> {
        self.add_epilog(r, "assert(false);\n")
    }

    /// Return statement, emitted after the frees of the function.
    ///
    /// The root function returns arrays as a bare data pointer and reports
    /// the extents through `out_ret_dims`. A value that is still an inline
    /// expression is remembered so [`Self::spill_inline_returns`] can move
    /// it ahead of the frees.
    pub(super) fn lower_return(
        &mut self,
        r: ResultId,
        value: Option<NodeId>,
    ) -> Result<(), CodegenError> {
        let stmt = match value {
            None => "return;\n".to_owned(),
            Some(value) => {
                let v = self.operand(r, value)?;
                let ty = self.s.tree.get(v).ty;
                if self.is_void(ty)? {
                    "return;\n".to_owned()
                } else {
                    let is_array = self.is_array_value(v);
                    if is_array {
                        if let Some(array) = self.slot_name(v)? {
                            self.record().return_arrays.push(array);
                        }
                    }
                    let val = self.result_variable_string(v)?;
                    let root_array = is_array && self.record().is_root;
                    let resolved = self.resolve(v)?;
                    if self.is_inline_expression(resolved) {
                        self.inline_returns.push(InlineReturn {
                            ret: r,
                            value: resolved,
                            expr: val.clone(),
                            root_array,
                        });
                    }
                    return_text(&val, root_array)
                }
            }
        };
        let id = self.s.code.append(&stmt)?;
        self.s.tree.set_return(r, id);
        Ok(())
    }

    /// Inline C expression other than a plain literal.
    fn is_inline_expression(&self, r: ResultId) -> bool {
        let result = self.s.tree.get(r);
        matches!(result.var, ResultVar::Constant(_))
            && !matches!(self.ast().get(result.node).kind, NodeKind::Literal(_))
    }

    /// Evaluate inline return values into temporaries when the function
    /// frees arrays before returning.
    ///
    /// The expression may read one of the freed arrays, so it is assigned in
    /// the return's epilog, which is emitted ahead of the frees.
    pub(super) fn spill_inline_returns(&mut self) -> Result<(), CodegenError> {
        if self.inline_returns.is_empty() {
            return Ok(());
        }
        let record = self.record();
        let info = AliasInfo::analyze(
            &record.return_arrays,
            &record.local_arrays,
            &record.aliased_pairs,
        );
        if info.freeable.is_empty() {
            return Ok(());
        }

        for pending in std::mem::take(&mut self.inline_returns) {
            let temp = self.temp_var(pending.value)?;
            let temp = self.ident(temp)?;
            tracing::trace!(ret = ?pending.ret, %temp, "return value spilled before frees");
            self.add_epilog(pending.ret, &format!("{temp} = {};\n", pending.expr))?;
            let id = self.s.code.append(&return_text(&temp, pending.root_array))?;
            self.s.tree.set_return(pending.ret, id);
        }
        Ok(())
    }

    /// Statement sequence. A call used as a statement keeps its side effects
    /// even when its value was inlined.
    pub(super) fn lower_body(&mut self, r: ResultId, stmts: NodeRange) -> Result<(), CodegenError> {
        let ast = self.ast();
        for &stmt in ast.get_list(stmts) {
            let child = self.operand(r, stmt)?;
            let is_call = matches!(ast.get(stmt).kind, NodeKind::Call { .. });
            if is_call && self.s.tree.get(child).is_constant {
                let expr = self.result_variable_string(child)?;
                self.add_epilog(child, &format!("{expr};\n"))?;
            }
        }
        Ok(())
    }
}

/// Return value whose text is an inline expression.
pub(super) struct InlineReturn {
    ret: ResultId,
    value: ResultId,
    expr: String,
    root_array: bool,
}

fn return_text(val: &str, root_array: bool) -> String {
    if root_array {
        format!(
            "{{ \nint i;\nfor(i=0;i<{val}.num_dim;++i)\n\
             out_ret_dims[i] = {val}.dims[i];\n}} \nreturn {val}.data;\n"
        )
    } else {
        format!("return {val};\n")
    }
}
