//! Tuples and records.

use arrc_ir::{Name, NodeId, NodeRange, TypeData, TypeId};

use super::FunctionLowerer;
use crate::ident::sanitize_str;
use crate::tree::ResultId;
use crate::CodegenError;

impl FunctionLowerer<'_, '_> {
    /// Tuple construction into a temporary of the tuple struct.
    pub(super) fn lower_tuple(
        &mut self,
        r: ResultId,
        elems: NodeRange,
    ) -> Result<(), CodegenError> {
        let values = self.operand_strings(r, elems)?;
        let ty = self.s.tree.get(r).ty;
        if self.is_void(ty)? {
            return Ok(());
        }
        let struct_name = self.c_type(ty)?;
        let temp = self.temp_var(r)?;
        let temp = self.ident(temp)?;
        self.add_epilog(
            r,
            &format!("{temp} = ({struct_name}) {{{}}};\n", values.join(", ")),
        )
    }

    /// Tuple component `index` (zero-based) is struct field `f<index + 1>`.
    pub(super) fn lower_tuple_ref(
        &mut self,
        r: ResultId,
        tuple: NodeId,
        index: u32,
    ) -> Result<(), CodegenError> {
        let child = self.operand(r, tuple)?;
        let t = self.result_variable_string(child)?;
        self.set_value(r, &format!("{t}.f{}", index + 1))
    }

    /// Record construction as a compound literal.
    pub(super) fn lower_new(&mut self, r: ResultId, fields: NodeRange) -> Result<(), CodegenError> {
        let values = self.operand_strings(r, fields)?;
        let ty = self.s.tree.get(r).ty;
        let struct_name = self.c_type(ty)?;
        self.set_value(r, &format!("({struct_name}) {{{}}}", values.join(", ")))
    }

    pub(super) fn lower_get_field(
        &mut self,
        r: ResultId,
        object: NodeId,
        field: Name,
    ) -> Result<(), CodegenError> {
        let child = self.operand(r, object)?;
        let object_ty = self.s.tree.get(child).ty;
        let field_name = self.field_name(object_ty, field)?;
        let obj = self.result_variable_string(child)?;
        self.set_value(r, &format!("{obj}.{field_name}"))
    }

    /// C field name of `field` within `object_ty`.
    ///
    /// Structurally equal records share one C struct, so fields are matched
    /// by position against the catalog entry rather than by name.
    fn field_name(
        &mut self,
        object_ty: TypeId,
        field: Name,
    ) -> Result<String, CodegenError> {
        let position = match self.s.types.get(object_ty) {
            TypeData::Struct { fields, .. } => fields.iter().position(|(n, _)| *n == field),
            _ => None,
        };
        let idx = self.catalog_idx(object_ty)?;
        let fields = self.s.catalog.fields(idx);
        match position.and_then(|p| fields.get(p)) {
            Some((name, _)) => Ok((*name).to_owned()),
            None => Ok(sanitize_str(self.s.interner.lookup(field))),
        }
    }
}
