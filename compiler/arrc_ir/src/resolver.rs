//! Variable resolution collaborator.
//!
//! The producer of the AST owns the binding rules; the code generator only
//! asks the questions in [`VarResolver`].

use crate::{Name, TypeId};
use rustc_hash::FxHashMap;

/// Answers binding queries for one function.
pub trait VarResolver {
    /// Declared type of a symbol visible in the function.
    fn var_type(&self, name: Name) -> Option<TypeId>;

    /// Whether the symbol is function-local (including parameters) rather
    /// than module-level.
    fn is_local(&self, name: Name) -> bool;

    /// Whether a parameter both escapes and is reassigned, so array data must
    /// be copied back to the caller.
    fn is_inout_param(&self, name: Name) -> bool;
}

/// How a symbol is bound.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub enum VarKind {
    Local,
    Param { inout: bool },
    Global,
}

/// Map-backed [`VarResolver`].
#[derive(Clone, Debug, Default)]
pub struct FunctionScope {
    vars: FxHashMap<Name, (TypeId, VarKind)>,
}

impl FunctionScope {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn declare(&mut self, name: Name, ty: TypeId, kind: VarKind) -> &mut Self {
        self.vars.insert(name, (ty, kind));
        self
    }

    pub fn local(&mut self, name: Name, ty: TypeId) -> &mut Self {
        self.declare(name, ty, VarKind::Local)
    }

    pub fn param(&mut self, name: Name, ty: TypeId) -> &mut Self {
        self.declare(name, ty, VarKind::Param { inout: false })
    }

    pub fn global(&mut self, name: Name, ty: TypeId) -> &mut Self {
        self.declare(name, ty, VarKind::Global)
    }

    pub fn kind(&self, name: Name) -> Option<VarKind> {
        self.vars.get(&name).map(|(_, kind)| *kind)
    }
}

impl VarResolver for FunctionScope {
    fn var_type(&self, name: Name) -> Option<TypeId> {
        self.vars.get(&name).map(|(ty, _)| *ty)
    }

    fn is_local(&self, name: Name) -> bool {
        matches!(
            self.kind(name),
            Some(VarKind::Local | VarKind::Param { .. })
        )
    }

    fn is_inout_param(&self, name: Name) -> bool {
        matches!(self.kind(name), Some(VarKind::Param { inout: true }))
    }
}
