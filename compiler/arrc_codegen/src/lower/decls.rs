//! Local declarations and array initializations.

use arrc_ir::{FunctionDef, Name};
use rustc_hash::FxHashSet;

use super::FunctionLowerer;
use crate::CodegenError;

impl FunctionLowerer<'_, '_> {
    /// Declare every slot the body writes that is neither a parameter nor a
    /// global, in creation order.
    ///
    /// In the root function, array parameters arrive as raw pointers plus
    /// extents and are wrapped into runtime arrays first.
    pub(super) fn declare_locals(&mut self, def: &FunctionDef) -> Result<(), CodegenError> {
        let mut declared: FxHashSet<Name> = def.params.iter().map(|p| p.name).collect();

        if def.is_root {
            let wrapped = self.record().signature.root_array_params.clone();
            for param in wrapped {
                let prefix = self.array_prefix(param.ty)?;
                let name = self.ident(param.name)?;
                let mut args = vec![format!("_{name}")];
                let dims = param.first_dim..param.first_dim + param.ndims;
                args.extend(dims.map(|k| format!("__N{k}")));
                self.declare(&format!("{prefix}_array {name};\n"))?;
                self.initialize(&format!(
                    "{name} = new_{prefix}_array_{}d({});\n",
                    param.ndims,
                    args.join(", ")
                ))?;
            }
        }

        let results = self.record().results.clone();
        for r in results {
            let result = self.s.tree.get(r);
            if result.representative.is_some() || result.is_constant {
                continue;
            }
            let Some(name) = result.symbol() else {
                continue;
            };
            if declared.contains(&name) || (!result.is_temporary && !self.resolver.is_local(name))
            {
                continue;
            }
            let (ty, made_scalar) = (result.ty, result.made_scalar);
            if self.is_void(ty)? {
                continue;
            }
            declared.insert(name);

            let ident = self.ident(name)?;
            if self.s.types.is_array(ty) {
                if made_scalar {
                    let idx = self.catalog_idx(ty)?;
                    let elem = self
                        .s
                        .catalog
                        .element(idx)
                        .map(|e| self.s.catalog.target_name(e).to_owned())
                        .ok_or_else(|| CodegenError::internal("array entry without element"))?;
                    self.declare(&format!("{elem} {ident};\n"))?;
                } else {
                    let prefix = self.array_prefix(ty)?;
                    self.declare(&format!("{prefix}_array {ident};\n"))?;
                    self.initialize(&format!("INITARRAY({ident});\n"))?;
                }
            } else {
                let c_type = self.c_type(ty)?;
                self.declare(&format!("{c_type} {ident};\n"))?;
            }
        }
        Ok(())
    }

    fn declare(&mut self, text: &str) -> Result<(), CodegenError> {
        let id = self.s.code.append(text)?;
        self.record().local_declarations.push(id);
        Ok(())
    }

    fn initialize(&mut self, text: &str) -> Result<(), CodegenError> {
        let id = self.s.code.append(text)?;
        self.record().array_initializations.push(id);
        Ok(())
    }
}
