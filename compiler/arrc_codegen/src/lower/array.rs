//! Array allocation, element access and extents.

use arrc_ir::{NodeId, NodeRange, TypeId};

use super::FunctionLowerer;
use crate::tree::ResultId;
use crate::CodegenError;

impl FunctionLowerer<'_, '_> {
    /// `r = new_<prefix>_array_<n>d(NULL, dims...)`; the array is recorded as
    /// a local allocation.
    pub(super) fn lower_array_alloc(
        &mut self,
        r: ResultId,
        dims: NodeRange,
    ) -> Result<(), CodegenError> {
        let dims = self.operand_strings(r, dims)?;
        let ty = self.s.tree.get(r).ty;
        let prefix = self.array_prefix(ty)?;
        let temp = self.temp_var(r)?;
        let target = self.ident(temp)?;

        let mut args = vec!["NULL".to_owned()];
        args.extend(dims.iter().cloned());
        self.add_epilog(
            r,
            &format!(
                "{target} = new_{prefix}_array_{}d({});\n",
                dims.len(),
                args.join(", ")
            ),
        )?;
        self.record().local_arrays.push(temp);
        Ok(())
    }

    pub(super) fn lower_array_ref(
        &mut self,
        r: ResultId,
        array: NodeId,
        indices: NodeRange,
        inbounds: bool,
    ) -> Result<(), CodegenError> {
        let a = self.operand(r, array)?;
        let a = self.result_variable_string(a)?;
        let subscript = self.operand_strings(r, indices)?.join(", ");
        let elem = format!("ARRAYELEM({a}, {subscript})");

        if self.s.options.bounds_check && !inbounds {
            let temp = self.temp_var(r)?;
            let temp = self.ident(temp)?;
            self.add_epilog(
                r,
                &format!("ARRAYBOUNDSCHECK({a}, {subscript});\n{temp} = {elem};\n"),
            )
        } else {
            self.set_value(r, &elem)
        }
    }

    pub(super) fn lower_array_set(
        &mut self,
        r: ResultId,
        array: NodeId,
        value: NodeId,
        indices: NodeRange,
        inbounds: bool,
    ) -> Result<(), CodegenError> {
        let a = self.operand(r, array)?;
        let v = self.operand(r, value)?;
        let a = self.result_variable_string(a)?;
        let v = self.result_variable_string(v)?;
        let subscript = self.operand_strings(r, indices)?.join(", ");

        let mut stmt = String::new();
        if self.s.options.bounds_check && !inbounds {
            stmt.push_str(&format!("ARRAYBOUNDSCHECK({a}, {subscript});\n"));
        }
        stmt.push_str(&format!("ARRAYELEM({a}, {subscript}) = {v};\n"));
        self.add_epilog(r, &stmt)
    }

    /// Extent of dimension `dim` (one-based).
    pub(super) fn lower_array_size(
        &mut self,
        r: ResultId,
        array: NodeId,
        dim: u32,
    ) -> Result<(), CodegenError> {
        let a = self.operand(r, array)?;
        let a = self.result_variable_string(a)?;
        self.set_value(r, &format!("ARRAYSIZE({a}, {dim})"))
    }

    pub(super) fn lower_array_len(
        &mut self,
        r: ResultId,
        array: NodeId,
    ) -> Result<(), CodegenError> {
        let a = self.operand(r, array)?;
        let a = self.result_variable_string(a)?;
        self.set_value(r, &format!("ARRAYLEN({a})"))
    }

    /// Raw data pointer of an array.
    pub(super) fn lower_array_ptr(
        &mut self,
        r: ResultId,
        array: NodeId,
    ) -> Result<(), CodegenError> {
        let a = self.operand(r, array)?;
        let a = self.result_variable_string(a)?;
        self.set_value(r, &format!("({a}).data"))
    }

    /// Runtime type prefix of an array type, e.g. `double` for `double*`.
    pub(super) fn array_prefix(&mut self, ty: TypeId) -> Result<String, CodegenError> {
        let idx = self.catalog_idx(ty)?;
        self.s
            .catalog
            .array_prefix(idx)
            .map(str::to_owned)
            .ok_or_else(|| CodegenError::UnsupportedType {
                ty: self.s.types.display(ty, self.s.interner),
                reason: "expected an array type",
            })
    }
}
