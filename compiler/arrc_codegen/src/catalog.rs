//! Type catalog: structural deduplication of host types into C types.
//!
//! Each distinct C type gets one [`CatalogEntry`]. Equivalence is
//! structural:
//! - arrays are equivalent when their element types are (rank is ignored),
//! - tuples (resp. records) are equivalent when they have the same number
//!   of fields and the fields are pairwise equivalent; names are ignored.
//!
//! Records and non-empty tuples are flattened. The struct entry is
//! followed by one field-count entry and then one entry per field, so a
//! struct's field metadata always occupies the next `n + 1` slots.

use std::fmt;

use arrc_ir::{Name, StringInterner, TypeData, TypeId, TypePool};
use bitflags::bitflags;
use rustc_hash::{FxHashMap, FxHashSet};

use crate::ident::sanitize_str;
use crate::text::{TextArena, TextId};
use crate::{Advisory, CodegenError};

/// Tuples and records with this many fields or more are rejected.
pub const MAX_STRUCT_FIELDS: usize = 256;

bitflags! {
    /// Role of a catalog entry.
    #[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
    pub struct EntryFlags: u8 {
        /// Bookkeeping entry describing a struct field (or field count).
        const IS_FIELD = 1 << 0;
        const IS_STRUCT = 1 << 1;
        const IS_ARRAY = 1 << 2;
        const IS_POINTER = 1 << 3;
    }
}

/// Index of an entry in the [`TypeCatalog`].
#[derive(Copy, Clone, Eq, PartialEq, Hash, PartialOrd, Ord)]
#[repr(transparent)]
pub struct CatalogIdx(u32);

impl CatalogIdx {
    #[inline]
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Debug for CatalogIdx {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "CatalogIdx({})", self.0)
    }
}

/// What an entry was created from.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum EntrySource {
    /// A real type (the first host type that produced this entry).
    Type(TypeId),
    /// Number of fields of the preceding struct entry.
    FieldCount(u32),
    /// One struct field, pointing at the field type's entry.
    Field(CatalogIdx),
}

/// One distinct C type, or struct bookkeeping.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CatalogEntry {
    pub flags: EntryFlags,
    pub declared: bool,
    pub source: EntrySource,
    /// C spelling of the type, or the field name for field entries.
    pub target_name: String,
    /// Sanitized element name selecting the array wrapper family.
    pub array_prefix: Option<String>,
    /// Element entry for arrays, pointee entry for pointers.
    pub inner: Option<CatalogIdx>,
}

impl CatalogEntry {
    pub fn is_field(&self) -> bool {
        self.flags.contains(EntryFlags::IS_FIELD)
    }

    pub fn is_struct(&self) -> bool {
        self.flags.contains(EntryFlags::IS_STRUCT)
    }

    pub fn is_array(&self) -> bool {
        self.flags.contains(EntryFlags::IS_ARRAY)
    }
}

/// Structural identity of a registered type.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
enum TypeKey {
    Builtin(&'static str),
    Array(CatalogIdx),
    Pointer(CatalogIdx),
    Tuple(Vec<CatalogIdx>),
    Record(Vec<CatalogIdx>),
    Opaque(Name),
}

/// Session-wide catalog of C types.
#[derive(Default)]
pub struct TypeCatalog {
    entries: Vec<CatalogEntry>,
    by_type: FxHashMap<TypeId, CatalogIdx>,
    by_key: FxHashMap<TypeKey, CatalogIdx>,
    in_progress: FxHashSet<TypeId>,
    tuple_count: u32,
    advisories: Vec<Advisory>,
}

fn builtin_name(data: &TypeData) -> Option<&'static str> {
    Some(match data {
        TypeData::Int8 => "int8_t",
        TypeData::Int16 => "int16_t",
        TypeData::Int32 => "int32_t",
        TypeData::Int64 => "int64_t",
        TypeData::UInt8 => "uint8_t",
        TypeData::UInt16 => "uint16_t",
        TypeData::UInt32 => "uint32_t",
        TypeData::UInt64 => "uint64_t",
        TypeData::Float32 => "float",
        TypeData::Float64 => "double",
        TypeData::Bool => "bool",
        TypeData::Nothing | TypeData::Bottom => "void",
        TypeData::Tuple(elems) if elems.is_empty() => "void",
        _ => return None,
    })
}

impl TypeCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `ty`, returning the index of its (possibly shared) entry.
    pub fn register(
        &mut self,
        ty: TypeId,
        types: &TypePool,
        interner: &StringInterner,
    ) -> Result<CatalogIdx, CodegenError> {
        if let Some(&idx) = self.by_type.get(&ty) {
            return Ok(idx);
        }
        if !self.in_progress.insert(ty) {
            return Err(CodegenError::UnsupportedType {
                ty: types.display(ty, interner),
                reason: "recursively defined types are not supported",
            });
        }
        let result = self.register_new(ty, types, interner);
        self.in_progress.remove(&ty);
        let idx = result?;
        self.by_type.insert(ty, idx);
        Ok(idx)
    }

    fn register_new(
        &mut self,
        ty: TypeId,
        types: &TypePool,
        interner: &StringInterner,
    ) -> Result<CatalogIdx, CodegenError> {
        let data = types.get(ty);
        if let Some(name) = builtin_name(data) {
            return self.intern_leaf(
                TypeKey::Builtin(name),
                ty,
                name.to_owned(),
                EntryFlags::empty(),
                None,
            );
        }

        match data {
            TypeData::Array { elem, .. } => {
                let elem_idx = self.register(*elem, types, interner)?;
                let elem_name = self.target_name(elem_idx).to_owned();
                let key = TypeKey::Array(elem_idx);
                if let Some(&idx) = self.by_key.get(&key) {
                    return Ok(idx);
                }
                let idx = self.push(CatalogEntry {
                    flags: EntryFlags::IS_ARRAY,
                    declared: false,
                    source: EntrySource::Type(ty),
                    target_name: format!("{elem_name}*"),
                    array_prefix: Some(sanitize_str(&elem_name)),
                    inner: Some(elem_idx),
                })?;
                self.by_key.insert(key, idx);
                Ok(idx)
            }
            TypeData::Pointer(pointee) => {
                let pointee_idx = self.register(*pointee, types, interner)?;
                let name = format!("{}*", self.target_name(pointee_idx));
                self.intern_leaf(
                    TypeKey::Pointer(pointee_idx),
                    ty,
                    name,
                    EntryFlags::IS_POINTER,
                    Some(pointee_idx),
                )
            }
            TypeData::Tuple(elems) => {
                let fields: Vec<(String, TypeId)> = elems
                    .iter()
                    .enumerate()
                    .map(|(i, t)| (format!("f{}", i + 1), *t))
                    .collect();
                self.register_struct(ty, None, &fields, types, interner)
            }
            TypeData::Struct { name, fields } => {
                let fields: Vec<(String, TypeId)> = fields
                    .iter()
                    .map(|(field, t)| (sanitize_str(interner.lookup(*field)), *t))
                    .collect();
                self.register_struct(ty, Some(*name), &fields, types, interner)
            }
            TypeData::Opaque(name) => {
                let raw = interner.lookup(*name);
                let message =
                    format!("datatype `{raw}` lowered without considering its parameters");
                tracing::warn!(ty = raw, "{message}");
                self.advisories.push(Advisory {
                    node: None,
                    message,
                });
                self.intern_leaf(
                    TypeKey::Opaque(*name),
                    ty,
                    sanitize_str(raw),
                    EntryFlags::empty(),
                    None,
                )
            }
            TypeData::Union(_) => Err(CodegenError::UnsupportedType {
                ty: types.display(ty, interner),
                reason: "union types are not supported",
            }),
            TypeData::TypeCtor(_) => Err(CodegenError::UnsupportedType {
                ty: types.display(ty, interner),
                reason: "uninstantiated type constructors are not supported",
            }),
            _ => Err(CodegenError::UnsupportedType {
                ty: types.display(ty, interner),
                reason: "no C lowering for this type",
            }),
        }
    }

    fn intern_leaf(
        &mut self,
        key: TypeKey,
        ty: TypeId,
        target_name: String,
        flags: EntryFlags,
        inner: Option<CatalogIdx>,
    ) -> Result<CatalogIdx, CodegenError> {
        if let Some(&idx) = self.by_key.get(&key) {
            return Ok(idx);
        }
        let idx = self.push(CatalogEntry {
            flags,
            declared: false,
            source: EntrySource::Type(ty),
            target_name,
            array_prefix: None,
            inner,
        })?;
        self.by_key.insert(key, idx);
        Ok(idx)
    }

    fn register_struct(
        &mut self,
        ty: TypeId,
        record_name: Option<Name>,
        fields: &[(String, TypeId)],
        types: &TypePool,
        interner: &StringInterner,
    ) -> Result<CatalogIdx, CodegenError> {
        if fields.len() >= MAX_STRUCT_FIELDS {
            return Err(CodegenError::TypeTooComplex {
                ty: types.display(ty, interner),
                fields: fields.len(),
                limit: MAX_STRUCT_FIELDS,
            });
        }

        let field_idxs = fields
            .iter()
            .map(|(_, t)| self.register(*t, types, interner))
            .collect::<Result<Vec<_>, _>>()?;
        let key = if record_name.is_some() {
            TypeKey::Record(field_idxs.clone())
        } else {
            TypeKey::Tuple(field_idxs.clone())
        };
        if let Some(&idx) = self.by_key.get(&key) {
            return Ok(idx);
        }

        let struct_name = match record_name {
            Some(name) => format!("struct {}", sanitize_str(interner.lookup(name))),
            None => {
                self.tuple_count += 1;
                format!("struct tuple_{}", self.tuple_count)
            }
        };
        let idx = self.push(CatalogEntry {
            flags: EntryFlags::IS_STRUCT,
            declared: false,
            source: EntrySource::Type(ty),
            target_name: struct_name,
            array_prefix: None,
            inner: None,
        })?;
        #[expect(
            clippy::cast_possible_truncation,
            reason = "field count is below MAX_STRUCT_FIELDS"
        )]
        let count = fields.len() as u32;
        self.push(CatalogEntry {
            flags: EntryFlags::IS_FIELD,
            declared: false,
            source: EntrySource::FieldCount(count),
            target_name: String::new(),
            array_prefix: None,
            inner: None,
        })?;
        for ((field_name, _), field_idx) in fields.iter().zip(field_idxs) {
            self.push(CatalogEntry {
                flags: EntryFlags::IS_FIELD,
                declared: false,
                source: EntrySource::Field(field_idx),
                target_name: field_name.clone(),
                array_prefix: None,
                inner: None,
            })?;
        }
        self.by_key.insert(key, idx);
        Ok(idx)
    }

    fn push(&mut self, entry: CatalogEntry) -> Result<CatalogIdx, CodegenError> {
        let idx = u32::try_from(self.entries.len())
            .map_err(|_| CodegenError::internal("type catalog exceeded u32::MAX entries"))?;
        tracing::trace!(idx, name = %entry.target_name, "catalog entry");
        self.entries.push(entry);
        Ok(CatalogIdx(idx))
    }

    /// Entry previously registered for `ty`.
    pub fn lookup(&self, ty: TypeId) -> Option<CatalogIdx> {
        self.by_type.get(&ty).copied()
    }

    /// # Panics
    /// Panics if `idx` was issued by another catalog.
    pub fn entry(&self, idx: CatalogIdx) -> &CatalogEntry {
        &self.entries[idx.index()]
    }

    pub fn entries(&self) -> &[CatalogEntry] {
        &self.entries
    }

    pub fn target_name(&self, idx: CatalogIdx) -> &str {
        &self.entry(idx).target_name
    }

    pub fn array_prefix(&self, idx: CatalogIdx) -> Option<&str> {
        self.entry(idx).array_prefix.as_deref()
    }

    /// Element entry of an array entry.
    pub fn element(&self, idx: CatalogIdx) -> Option<CatalogIdx> {
        let entry = self.entry(idx);
        if entry.is_array() {
            entry.inner
        } else {
            None
        }
    }

    pub fn is_void(&self, idx: CatalogIdx) -> bool {
        self.target_name(idx) == "void"
    }

    /// Field count of a struct entry.
    pub fn field_count(&self, idx: CatalogIdx) -> Option<usize> {
        if !self.entry(idx).is_struct() {
            return None;
        }
        match self.entries.get(idx.index() + 1).map(|e| e.source) {
            Some(EntrySource::FieldCount(n)) => Some(n as usize),
            _ => None,
        }
    }

    /// Fields of a struct entry as `(field name, field type entry)`.
    pub fn fields(&self, idx: CatalogIdx) -> Vec<(&str, CatalogIdx)> {
        let count = self.field_count(idx).unwrap_or(0);
        let first = idx.index() + 2;
        self.entries[first..first + count]
            .iter()
            .filter_map(|e| match e.source {
                EntrySource::Field(field_idx) => Some((e.target_name.as_str(), field_idx)),
                _ => None,
            })
            .collect()
    }

    /// Emit every struct and array wrapper declaration not yet emitted,
    /// dependencies first.
    pub fn emit_declarations(
        &mut self,
        arena: &mut TextArena,
    ) -> Result<Vec<TextId>, CodegenError> {
        let mut out = Vec::new();
        for i in 0..self.entries.len() {
            let entry = &self.entries[i];
            if entry.is_field() || !(entry.is_struct() || entry.is_array()) {
                continue;
            }
            let Ok(raw) = u32::try_from(i) else { break };
            self.declare(CatalogIdx(raw), arena, &mut out)?;
        }
        Ok(out)
    }

    fn declare(
        &mut self,
        idx: CatalogIdx,
        arena: &mut TextArena,
        out: &mut Vec<TextId>,
    ) -> Result<(), CodegenError> {
        if self.entries[idx.index()].declared {
            return Ok(());
        }
        self.entries[idx.index()].declared = true;

        let entry = self.entries[idx.index()].clone();
        if entry.is_struct() {
            let fields: Vec<(String, CatalogIdx)> = self
                .fields(idx)
                .into_iter()
                .map(|(name, field_idx)| (name.to_owned(), field_idx))
                .collect();
            for (_, field_idx) in &fields {
                self.declare(*field_idx, arena, out)?;
            }
            let text = arena.append(&format!("{} {{\n", entry.target_name))?;
            for (name, field_idx) in &fields {
                let field = self.entry(*field_idx);
                let line = match (&field.array_prefix, field.is_array()) {
                    (Some(prefix), true) => format!("{prefix}_array {name};\n"),
                    _ => format!("{} {name};\n", field.target_name),
                };
                arena.continue_tail(text, &line)?;
            }
            arena.continue_tail(text, "};\n")?;
            out.push(text);
        } else if entry.is_array() {
            let Some(elem) = entry.inner else {
                return Err(CodegenError::internal("array entry without element"));
            };
            self.declare(elem, arena, out)?;
            let elem_name = self.target_name(elem).to_owned();
            let prefix = entry.array_prefix.unwrap_or_default();
            out.push(arena.append(&format!("DECL_C_ARRAY({elem_name}, {prefix})\n"))?);
            out.push(arena.append(&format!("DEF_C_ARRAY({elem_name}, {prefix})\n"))?);
        } else if let Some(pointee) = entry.inner {
            self.declare(pointee, arena, out)?;
        }
        Ok(())
    }

    /// Drain advisories recorded while registering types.
    pub fn take_advisories(&mut self) -> Vec<Advisory> {
        std::mem::take(&mut self.advisories)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
