//! Calls to session functions, the current function and foreign C code.

use arrc_ir::{Callee, NodeId, NodeRange};

use super::FunctionLowerer;
use crate::ident::sanitize_str;
use crate::tree::ResultId;
use crate::CodegenError;

impl FunctionLowerer<'_, '_> {
    pub(super) fn lower_call(
        &mut self,
        r: ResultId,
        node: NodeId,
        callee: Callee,
        args: NodeRange,
    ) -> Result<(), CodegenError> {
        let args = self.operand_strings(r, args)?.join(", ");
        let ty = self.s.tree.get(r).ty;
        let void = self.is_void(ty)?;

        let c_name = match callee {
            Callee::Foreign { name } => {
                let f = self.ident(name)?;
                let stmt = if void {
                    format!("{f}({args});\n")
                } else {
                    let temp = self.temp_var(r)?;
                    format!("{} = {f}({args});\n", self.ident(temp)?)
                };
                return self.add_epilog(r, &stmt);
            }
            Callee::SelfRecursive => self.record().signature.c_name.clone(),
            Callee::Function { module, name } => {
                let module = match module {
                    Some(module) => self.ident(module)?,
                    None => {
                        let fallback = sanitize_str(&self.s.options.fallback_namespace);
                        let callee_name = self.s.interner.lookup(name);
                        self.s.warn(
                            Some(node),
                            format!(
                                "module of `{callee_name}` is unknown; assuming `{fallback}`"
                            ),
                        );
                        fallback
                    }
                };
                format!("{module}_{}", self.ident(name)?)
            }
        };

        let expr = format!("{c_name}({args})");
        if void {
            self.add_epilog(r, &format!("{expr};\n"))
        } else {
            self.set_value(r, &expr)
        }
    }
}
