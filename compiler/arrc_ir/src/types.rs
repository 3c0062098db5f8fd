//! Host type pool.
//!
//! Types are stored by identity: every constructor call allocates a new
//! `TypeId`, even for a shape that already exists. Two arrays of `f64` with
//! different dimensionality, or the same tuple built twice, are different
//! handles. The code generator's type catalog is what collapses them.

use crate::{Name, StringInterner, TypeId};

/// Shape of a host type.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum TypeData {
    Int8,
    Int16,
    Int32,
    Int64,
    UInt8,
    UInt16,
    UInt32,
    UInt64,
    Float32,
    Float64,
    Bool,
    /// The type of the `nothing` value.
    Nothing,
    /// The uninhabited type.
    Bottom,
    /// Dense array with `ndims` dimensions.
    Array { elem: TypeId, ndims: u32 },
    /// Anonymous product type with positional fields.
    Tuple(Vec<TypeId>),
    /// Named record with ordered, named fields.
    Struct {
        name: Name,
        fields: Vec<(Name, TypeId)>,
    },
    /// Raw pointer to a value of the pointee type.
    Pointer(TypeId),
    /// Named datatype whose layout is not known to the translator.
    Opaque(Name),
    Union(Vec<TypeId>),
    /// A type constructor that was never instantiated.
    TypeCtor(Name),
}

impl TypeId {
    pub const INT8: TypeId = TypeId::new(0);
    pub const INT16: TypeId = TypeId::new(1);
    pub const INT32: TypeId = TypeId::new(2);
    pub const INT64: TypeId = TypeId::new(3);
    pub const UINT8: TypeId = TypeId::new(4);
    pub const UINT16: TypeId = TypeId::new(5);
    pub const UINT32: TypeId = TypeId::new(6);
    pub const UINT64: TypeId = TypeId::new(7);
    pub const FLOAT32: TypeId = TypeId::new(8);
    pub const FLOAT64: TypeId = TypeId::new(9);
    pub const BOOL: TypeId = TypeId::new(10);
    pub const NOTHING: TypeId = TypeId::new(11);
    pub const BOTTOM: TypeId = TypeId::new(12);
}

/// Storage for every host type referenced by one compilation.
pub struct TypePool {
    types: Vec<TypeData>,
}

impl TypePool {
    /// Create a pool with the primitive types at their fixed ids.
    pub fn new() -> Self {
        let types = vec![
            TypeData::Int8,
            TypeData::Int16,
            TypeData::Int32,
            TypeData::Int64,
            TypeData::UInt8,
            TypeData::UInt16,
            TypeData::UInt32,
            TypeData::UInt64,
            TypeData::Float32,
            TypeData::Float64,
            TypeData::Bool,
            TypeData::Nothing,
            TypeData::Bottom,
        ];
        TypePool { types }
    }

    /// Allocate a new type.
    pub fn alloc(&mut self, data: TypeData) -> TypeId {
        let index = u32::try_from(self.types.len())
            .unwrap_or_else(|_| panic!("type pool exceeded u32::MAX entries"));
        self.types.push(data);
        TypeId::new(index)
    }

    pub fn array(&mut self, elem: TypeId, ndims: u32) -> TypeId {
        self.alloc(TypeData::Array { elem, ndims })
    }

    pub fn tuple(&mut self, elems: &[TypeId]) -> TypeId {
        self.alloc(TypeData::Tuple(elems.to_vec()))
    }

    pub fn record(&mut self, name: Name, fields: &[(Name, TypeId)]) -> TypeId {
        self.alloc(TypeData::Struct {
            name,
            fields: fields.to_vec(),
        })
    }

    pub fn pointer(&mut self, pointee: TypeId) -> TypeId {
        self.alloc(TypeData::Pointer(pointee))
    }

    /// Reserve a record whose fields are filled in later.
    ///
    /// Lets a producer build self-referential records.
    pub fn declare_record(&mut self, name: Name) -> TypeId {
        self.record(name, &[])
    }

    /// Fill in the fields of a record created by `declare_record`.
    ///
    /// Does nothing if `id` is not a record.
    pub fn define_record_fields(&mut self, id: TypeId, new_fields: &[(Name, TypeId)]) {
        if let Some(TypeData::Struct { fields, .. }) = self.types.get_mut(id.index()) {
            *fields = new_fields.to_vec();
        }
    }

    /// Get the shape of a type.
    ///
    /// # Panics
    /// Panics if `id` was not allocated by this pool.
    #[inline]
    pub fn get(&self, id: TypeId) -> &TypeData {
        &self.types[id.index()]
    }

    pub fn is_array(&self, id: TypeId) -> bool {
        matches!(self.get(id), TypeData::Array { .. })
    }

    /// Element type of an array type.
    pub fn array_elem(&self, id: TypeId) -> Option<TypeId> {
        match self.get(id) {
            TypeData::Array { elem, .. } => Some(*elem),
            _ => None,
        }
    }

    /// Dimensionality of an array type.
    pub fn array_ndims(&self, id: TypeId) -> Option<u32> {
        match self.get(id) {
            TypeData::Array { ndims, .. } => Some(*ndims),
            _ => None,
        }
    }

    /// Types that lower to C `void`.
    pub fn is_void(&self, id: TypeId) -> bool {
        match self.get(id) {
            TypeData::Nothing | TypeData::Bottom => true,
            TypeData::Tuple(elems) => elems.is_empty(),
            _ => false,
        }
    }

    /// Human-readable rendering for diagnostics.
    pub fn display(&self, id: TypeId, interner: &StringInterner) -> String {
        let list = |ids: &[TypeId]| {
            ids.iter()
                .map(|t| self.display(*t, interner))
                .collect::<Vec<_>>()
                .join(", ")
        };
        match self.get(id) {
            TypeData::Int8 => "Int8".to_owned(),
            TypeData::Int16 => "Int16".to_owned(),
            TypeData::Int32 => "Int32".to_owned(),
            TypeData::Int64 => "Int64".to_owned(),
            TypeData::UInt8 => "UInt8".to_owned(),
            TypeData::UInt16 => "UInt16".to_owned(),
            TypeData::UInt32 => "UInt32".to_owned(),
            TypeData::UInt64 => "UInt64".to_owned(),
            TypeData::Float32 => "Float32".to_owned(),
            TypeData::Float64 => "Float64".to_owned(),
            TypeData::Bool => "Bool".to_owned(),
            TypeData::Nothing => "Nothing".to_owned(),
            TypeData::Bottom => "None".to_owned(),
            TypeData::Array { elem, ndims } => {
                format!("Array{{{}, {ndims}}}", self.display(*elem, interner))
            }
            TypeData::Tuple(elems) => format!("({})", list(elems)),
            TypeData::Struct { name, .. } | TypeData::Opaque(name) | TypeData::TypeCtor(name) => {
                interner.lookup(*name).to_owned()
            }
            TypeData::Pointer(pointee) => format!("Ptr{{{}}}", self.display(*pointee, interner)),
            TypeData::Union(members) => format!("Union{{{}}}", list(members)),
        }
    }

    pub fn len(&self) -> usize {
        self.types.len()
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }
}

impl Default for TypePool {
    fn default() -> Self {
        Self::new()
    }
}
