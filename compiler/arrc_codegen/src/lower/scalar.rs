//! Literals and scalar operators.

use arrc_ir::{BinaryOp, CheckedOp, Literal, NodeId, StringInterner, TypeData, UnaryOp};

use super::FunctionLowerer;
use crate::tree::ResultId;
use crate::CodegenError;

/// C text of a literal, or `None` for boxed host values.
pub(crate) fn render_literal(lit: &Literal, interner: &StringInterner) -> Option<String> {
    Some(match *lit {
        Literal::Int(v) => v.to_string(),
        Literal::UInt(v) => v.to_string(),
        Literal::Float32(bits) => render_float(f64::from(f32::from_bits(bits)), 6),
        Literal::Float64(bits) => render_float(f64::from_bits(bits), 15),
        Literal::Bool(v) => if v { "true" } else { "false" }.to_owned(),
        Literal::Pointer(addr) => format!("0x{addr:016x}"),
        Literal::Str(name) => quote_c_string(interner.lookup(name)),
        Literal::Nothing => String::new(),
        Literal::Boxed(_) => return None,
    })
}

fn render_float(value: f64, digits: usize) -> String {
    if value.is_nan() {
        "NAN".to_owned()
    } else if value.is_infinite() {
        if value > 0.0 { "INFINITY" } else { "-INFINITY" }.to_owned()
    } else {
        format!("{value:.digits$}")
    }
}

fn quote_c_string(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len() + 2);
    out.push('"');
    for byte in raw.bytes() {
        match byte {
            b'"' => out.push_str("\\\""),
            b'\\' => out.push_str("\\\\"),
            b'\n' => out.push_str("\\n"),
            b'\t' => out.push_str("\\t"),
            b'\r' => out.push_str("\\r"),
            0x20..=0x7e => out.push(char::from(byte)),
            _ => out.push_str(&format!("\\{byte:03o}")),
        }
    }
    out.push('"');
    out
}

impl FunctionLowerer<'_, '_> {
    pub(super) fn lower_binary(
        &mut self,
        r: ResultId,
        op: BinaryOp,
        left: NodeId,
        right: NodeId,
    ) -> Result<(), CodegenError> {
        let l = self.operand(r, left)?;
        let rhs = self.operand(r, right)?;
        let l = self.result_variable_string(l)?;
        let rhs = self.result_variable_string(rhs)?;
        self.set_value(r, &format!("({l}) {} ({rhs})", op.as_symbol()))
    }

    pub(super) fn lower_unary(
        &mut self,
        r: ResultId,
        op: UnaryOp,
        operand: NodeId,
    ) -> Result<(), CodegenError> {
        let child = self.operand(r, operand)?;
        let ty = self.s.tree.get(child).ty;
        let x = self.result_variable_string(child)?;
        let expr = match op {
            UnaryOp::Neg => format!("-({x})"),
            UnaryOp::Not if matches!(self.s.types.get(ty), TypeData::Bool) => format!("!({x})"),
            UnaryOp::Not => format!("~({x})"),
            UnaryOp::Abs if !is_float(self.s.types.get(ty)) => format!("llabs({x})"),
            UnaryOp::Abs | UnaryOp::Sqrt | UnaryOp::Floor | UnaryOp::Ceil => {
                format!("{}({x})", op.as_symbol())
            }
        };
        self.set_value(r, &expr)
    }

    pub(super) fn lower_checked(
        &mut self,
        r: ResultId,
        op: CheckedOp,
        left: NodeId,
        right: NodeId,
    ) -> Result<(), CodegenError> {
        let l = self.operand(r, left)?;
        let rhs = self.operand(r, right)?;
        let l = self.result_variable_string(l)?;
        let rhs = self.result_variable_string(rhs)?;
        self.set_value(r, &format!("{}({l}, {rhs})", op.intrinsic()))
    }

    /// Cast to the node's own type.
    pub(super) fn lower_convert(
        &mut self,
        r: ResultId,
        operand: NodeId,
    ) -> Result<(), CodegenError> {
        let child = self.operand(r, operand)?;
        let x = self.result_variable_string(child)?;
        let ty = self.s.tree.get(r).ty;
        let target = self.c_type(ty)?;
        self.set_value(r, &format!("({target})({x})"))
    }

    pub(super) fn lower_select(
        &mut self,
        r: ResultId,
        cond: NodeId,
        then_val: NodeId,
        else_val: NodeId,
    ) -> Result<(), CodegenError> {
        let c = self.operand(r, cond)?;
        let a = self.operand(r, then_val)?;
        let b = self.operand(r, else_val)?;
        let c = self.result_variable_string(c)?;
        let a = self.result_variable_string(a)?;
        let b = self.result_variable_string(b)?;
        self.set_value(r, &format!("({c}) ? ({a}) : ({b})"))
    }

    pub(super) fn lower_is(
        &mut self,
        r: ResultId,
        left: NodeId,
        right: NodeId,
    ) -> Result<(), CodegenError> {
        let l = self.operand(r, left)?;
        let rhs = self.operand(r, right)?;
        let l = self.result_variable_string(l)?;
        let rhs = self.result_variable_string(rhs)?;
        self.set_value(r, &format!("({l}) == ({rhs})"))
    }
}

fn is_float(data: &TypeData) -> bool {
    matches!(data, TypeData::Float32 | TypeData::Float64)
}
