//! Function signatures and the external root wrapper.
//!
//! Non-root functions pass arrays as runtime array structs. The root
//! function is called from the host, so its arrays cross the boundary as
//! raw data pointers plus one `int64_t __N<k>` extent per dimension, and an
//! array return hands its extents back through `out_ret_dims`.

use std::fmt::Write as _;

use arrc_ir::{FunctionDef, Name, TypeId, VarResolver};

use crate::session::CompilationSession;
use crate::CodegenError;

/// Hooks for target-specific decoration of the generated code.
///
/// Every method returns the text to insert, or `None` to insert nothing.
pub trait OffloadDecorator {
    /// Pragma placed before the offloaded call in the root wrapper.
    /// `clauses` lists the data transfers, e.g. `in(_a:length(__N1)) `.
    fn offload_pragma(&self, clauses: &str) -> Option<String> {
        let _ = clauses;
        None
    }

    /// Text placed at the top of a function body, after initializations.
    fn function_prologue(&self, c_name: &str) -> Option<String> {
        let _ = c_name;
        None
    }

    /// Text placed at the end of a function body.
    fn function_epilogue(&self, c_name: &str) -> Option<String> {
        let _ = c_name;
        None
    }
}

/// Decorator that inserts nothing.
#[derive(Copy, Clone, Debug, Default)]
pub struct NoOffload;

impl OffloadDecorator for NoOffload {}

/// Array parameter of the root function passed as pointer plus extents.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct RootArrayParam {
    pub name: Name,
    pub ty: TypeId,
    pub ndims: u32,
    /// Index `k` of the first `__N<k>` extent of this parameter.
    pub first_dim: u32,
}

/// C signature of one function.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Signature {
    /// Full declarator, without the trailing `;`.
    pub text: String,
    pub c_name: String,
    /// C return type as written in `text`.
    pub return_type: String,
    pub returns_array: bool,
    pub returns_void: bool,
    /// Parameter declarations, in order.
    pub params: Vec<String>,
    /// Argument names forwarding every parameter, in order.
    pub call_args: Vec<String>,
    /// Offload data-transfer clauses of the root function.
    pub transfer_clauses: String,
    pub root_array_params: Vec<RootArrayParam>,
}

impl Signature {
    pub(crate) fn build(
        s: &mut CompilationSession<'_>,
        def: &FunctionDef,
        resolver: &dyn VarResolver,
    ) -> Result<Signature, CodegenError> {
        let types = s.types;
        let interner = s.interner;
        let ret_idx = s.catalog.register(def.return_type, types, interner)?;
        let returns_void = s.catalog.is_void(ret_idx);
        let returns_array = types.is_array(def.return_type);

        let name = s.idents.ident(def.name, interner)?.to_owned();
        let mut params = Vec::with_capacity(def.params.len());
        let mut call_args = Vec::with_capacity(def.params.len());
        let mut transfer_clauses = String::new();
        let mut root_array_params = Vec::new();

        if !def.is_root {
            let module = s.idents.ident(def.module, interner)?.to_owned();
            let return_type = value_type(s, def.return_type)?;
            for param in &def.params {
                let ty = value_type(s, param.ty)?;
                let pname = s.idents.ident(param.name, interner)?.to_owned();
                params.push(format!("{ty} {pname}"));
                call_args.push(pname);
            }
            let c_name = format!("{module}_{name}");
            let text = format!("{return_type} {c_name}({})", params.join(", "));
            return Ok(Signature {
                text,
                c_name,
                return_type,
                returns_array,
                returns_void,
                params,
                call_args,
                transfer_clauses,
                root_array_params,
            });
        }

        let mut extents = Vec::new();
        let mut extent_args = Vec::new();
        let mut next_dim = 1;
        for param in &def.params {
            let idx = s.catalog.register(param.ty, types, interner)?;
            let c_type = s.catalog.target_name(idx).to_owned();
            let pname = s.idents.ident(param.name, interner)?.to_owned();
            if !types.is_array(param.ty) {
                params.push(format!("{c_type} {pname}"));
                call_args.push(pname);
                continue;
            }

            let ndims = types.array_ndims(param.ty).unwrap_or(1);
            let dims: Vec<String> = (next_dim..next_dim + ndims)
                .map(|k| format!("__N{k}"))
                .collect();
            let direction = if resolver.is_inout_param(param.name) {
                "inout"
            } else {
                "in"
            };
            let _ = write!(
                transfer_clauses,
                "{direction}(_{pname}:length({})) ",
                dims.join("*")
            );
            params.push(format!("{c_type} _{pname}"));
            call_args.push(format!("_{pname}"));
            for dim in dims {
                extents.push(format!("int64_t {dim}"));
                extent_args.push(dim);
            }
            root_array_params.push(RootArrayParam {
                name: param.name,
                ty: param.ty,
                ndims,
                first_dim: next_dim,
            });
            next_dim += ndims;
        }
        params.extend(extents);
        call_args.extend(extent_args);

        if returns_array {
            params.push("int32_t num_dims".to_owned());
            params.push("int32_t * out_ret_dims".to_owned());
            call_args.push("num_dims".to_owned());
            call_args.push("out_ret_dims".to_owned());
            transfer_clauses.push_str("inout(out_ret_dims:length(num_dims)) ");
        }

        let return_type = s.catalog.target_name(ret_idx).to_owned();
        let text = format!("{return_type} {name} ({})", params.join(", "));
        Ok(Signature {
            text,
            c_name: name,
            return_type,
            returns_array,
            returns_void,
            params,
            call_args,
            transfer_clauses,
            root_array_params,
        })
    }

    /// `extern "C"` entry point `<name>_` of the root function.
    ///
    /// The leading `run_where` argument selects the device: a non-negative
    /// value runs the function under the decorator's offload pragma, any
    /// other value calls it directly on the host. An offloaded array
    /// result is copied into a fresh host buffer sized from
    /// `out_ret_dims`, and the device-side buffer is released.
    pub fn root_wrapper(&self, decorator: &dyn OffloadDecorator) -> String {
        let mut params = vec!["int run_where".to_owned()];
        params.extend(self.params.iter().cloned());
        let call = format!("{}({})", self.c_name, self.call_args.join(", "));
        let pragma = decorator
            .offload_pragma(&self.transfer_clauses)
            .map(|p| format!("{p}\n"))
            .unwrap_or_default();

        let mut out = format!(
            "extern \"C\" {} {}_({}) {{\nif (run_where >= 0) {{\n",
            self.return_type,
            self.c_name,
            params.join(", ")
        );
        if self.returns_void {
            let _ = write!(out, "{pragma}{{\n{call};\n}}\nreturn;\n");
        } else if self.returns_array {
            let ret = &self.return_type;
            let _ = write!(
                out,
                "{ret} ret_temp;\n{pragma}{{\nret_temp = {call};\n}}\n\
                 int64_t ret_len = 1;\nint i;\n\
                 for(i=0;i<num_dims;++i)\nret_len *= out_ret_dims[i];\n\
                 {ret} ret_return = ({ret}) malloc(ret_len * sizeof(*ret_temp));\n\
                 memcpy(ret_return, ret_temp, ret_len * sizeof(*ret_temp));\n\
                 free(ret_temp);\nreturn ret_return;\n"
            );
        } else {
            let ret = &self.return_type;
            let _ = write!(
                out,
                "{ret} ret_return;\n{pragma}{{\nret_return = {call};\n}}\nreturn ret_return;\n"
            );
        }
        out.push_str("} else {\n");
        if self.returns_void {
            let _ = writeln!(out, "{call};");
        } else {
            let _ = writeln!(out, "return {call};");
        }
        out.push_str("}\n}\n");
        out
    }
}

/// C type of a value of `ty` inside generated code: runtime array struct
/// for arrays, the catalog name otherwise.
fn value_type(s: &mut CompilationSession<'_>, ty: TypeId) -> Result<String, CodegenError> {
    let idx = s.catalog.register(ty, s.types, s.interner)?;
    if s.types.is_array(ty) {
        if let Some(prefix) = s.catalog.array_prefix(idx) {
            return Ok(format!("{prefix}_array"));
        }
    }
    Ok(s.catalog.target_name(idx).to_owned())
}
