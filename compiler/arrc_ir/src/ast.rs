//! Flat AST consumed by the code generator.
//!
//! Nodes live in an [`AstArena`] and refer to each other by [`NodeId`].
//! Variable-length operand lists are stored once in the arena's shared list
//! and referenced through a [`NodeRange`].
//!
//! Every node carries the annotations an upstream pass has already computed:
//! its inferred type, its fusion depth, and whether an array-typed result was
//! proven to reduce to a scalar.

use crate::{Name, NodeId, NodeRange, TypeId};

/// Binary scalar operators.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    Rem,
    Eq,
    NotEq,
    Lt,
    LtEq,
    Gt,
    GtEq,
    And,
    Or,
    BitAnd,
    BitOr,
    BitXor,
    Shl,
    Shr,
}

impl BinaryOp {
    /// C spelling of the operator.
    pub const fn as_symbol(self) -> &'static str {
        match self {
            Self::Add => "+",
            Self::Sub => "-",
            Self::Mul => "*",
            Self::Div => "/",
            Self::Rem => "%",
            Self::Eq => "==",
            Self::NotEq => "!=",
            Self::Lt => "<",
            Self::LtEq => "<=",
            Self::Gt => ">",
            Self::GtEq => ">=",
            Self::And => "&&",
            Self::Or => "||",
            Self::BitAnd => "&",
            Self::BitOr => "|",
            Self::BitXor => "^",
            Self::Shl => "<<",
            Self::Shr => ">>",
        }
    }
}

/// Unary scalar operators.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub enum UnaryOp {
    Neg,
    /// Logical not on `Bool`, bitwise complement otherwise.
    Not,
    Sqrt,
    Abs,
    Floor,
    Ceil,
}

impl UnaryOp {
    /// C spelling for operators that map to a prefix token or a libm call.
    pub const fn as_symbol(self) -> &'static str {
        match self {
            Self::Neg => "-",
            Self::Not => "~",
            Self::Sqrt => "sqrt",
            Self::Abs => "fabs",
            Self::Floor => "floor",
            Self::Ceil => "ceil",
        }
    }
}

/// Overflow-checked integer arithmetic.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub enum CheckedOp {
    Add,
    Sub,
    Mul,
}

impl CheckedOp {
    /// Name of the runtime intrinsic implementing the operation.
    pub const fn intrinsic(self) -> &'static str {
        match self {
            Self::Add => "checked_sadd",
            Self::Sub => "checked_ssub",
            Self::Mul => "checked_smul",
        }
    }
}

/// Literal constant.
///
/// Floats are stored as bits so that `Literal` stays `Eq + Hash`.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub enum Literal {
    Int(i64),
    UInt(u64),
    Float32(u32),
    Float64(u64),
    Bool(bool),
    Pointer(u64),
    Str(Name),
    Nothing,
    /// A boxed host value with no C rendering; `Name` identifies its slot.
    Boxed(Name),
}

impl Literal {
    pub fn float32(value: f32) -> Self {
        Literal::Float32(value.to_bits())
    }

    pub fn float64(value: f64) -> Self {
        Literal::Float64(value.to_bits())
    }
}

/// Target of a call node.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub enum Callee {
    /// A function compiled in the same session. `module` is `None` when the
    /// producer could not resolve which module the binding belongs to.
    Function { module: Option<Name>, name: Name },
    /// A C function called by its unmangled name.
    Foreign { name: Name },
    /// The function currently being compiled.
    SelfRecursive,
}

/// Node kinds understood by the code generator.
#[derive(Clone, Eq, PartialEq, Hash, Debug)]
pub enum NodeKind {
    /// Reference to a local variable or parameter.
    Symbol(Name),
    /// Reference to a module-level binding.
    Global(Name),
    /// Compiler-generated single-assignment slot.
    SsaValue(u32),
    Literal(Literal),
    Call {
        callee: Callee,
        args: NodeRange,
    },
    Binary {
        op: BinaryOp,
        left: NodeId,
        right: NodeId,
    },
    Unary {
        op: UnaryOp,
        operand: NodeId,
    },
    Checked {
        op: CheckedOp,
        left: NodeId,
        right: NodeId,
    },
    /// Numeric conversion to the node's own type.
    Convert {
        operand: NodeId,
    },
    Select {
        cond: NodeId,
        then_val: NodeId,
        else_val: NodeId,
    },
    /// Identity comparison.
    Is {
        left: NodeId,
        right: NodeId,
    },
    Assign {
        target: NodeId,
        value: NodeId,
    },
    Tuple {
        elems: NodeRange,
    },
    /// Read of a tuple component; `index` is zero-based.
    TupleRef {
        tuple: NodeId,
        index: u32,
    },
    /// Record construction with fields in declared order.
    New {
        fields: NodeRange,
    },
    GetField {
        object: NodeId,
        field: Name,
    },
    /// Allocation of a fresh array with the node's array type.
    ArrayAlloc {
        dims: NodeRange,
    },
    ArrayRef {
        array: NodeId,
        indices: NodeRange,
        inbounds: bool,
    },
    ArraySet {
        array: NodeId,
        value: NodeId,
        indices: NodeRange,
        inbounds: bool,
    },
    /// Extent of one dimension; `dim` is one-based.
    ArraySize {
        array: NodeId,
        dim: u32,
    },
    ArrayLen {
        array: NodeId,
    },
    ArrayPtr {
        array: NodeId,
    },
    Label(u32),
    Goto(u32),
    GotoIfNot {
        cond: NodeId,
        label: u32,
    },
    Return {
        value: Option<NodeId>,
    },
    LineNumber {
        line: u32,
        file: Option<Name>,
    },
    Throw,
    /// Statement sequence.
    Body {
        stmts: NodeRange,
    },
    /// Any head the producer could not classify.
    Other {
        head: Name,
    },
}

/// One AST node with its upstream annotations.
#[derive(Clone, Eq, PartialEq, Hash, Debug)]
pub struct Node {
    pub kind: NodeKind,
    pub ty: TypeId,
    /// Number of leading loop dimensions shared with the enclosing context.
    pub fusion_depth: u32,
    /// Array-typed result proven to reduce to a scalar.
    pub scalarized: bool,
}

impl Node {
    pub fn new(kind: NodeKind, ty: TypeId) -> Self {
        Node {
            kind,
            ty,
            fusion_depth: 0,
            scalarized: false,
        }
    }

    #[must_use]
    pub fn with_fusion_depth(mut self, depth: u32) -> Self {
        self.fusion_depth = depth;
        self
    }

    #[must_use]
    pub fn scalarized(mut self) -> Self {
        self.scalarized = true;
        self
    }
}

/// Arena owning all nodes of one compilation.
#[derive(Default)]
pub struct AstArena {
    nodes: Vec<Node>,
    lists: Vec<NodeId>,
}

impl AstArena {
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocate a node.
    pub fn alloc(&mut self, node: Node) -> NodeId {
        let index = u32::try_from(self.nodes.len())
            .unwrap_or_else(|_| panic!("AST arena exceeded u32::MAX nodes"));
        self.nodes.push(node);
        NodeId::new(index)
    }

    /// Allocate a node with default annotations.
    pub fn push(&mut self, kind: NodeKind, ty: TypeId) -> NodeId {
        self.alloc(Node::new(kind, ty))
    }

    /// Store an operand list.
    pub fn alloc_list(&mut self, ids: &[NodeId]) -> NodeRange {
        let start = u32::try_from(self.lists.len())
            .unwrap_or_else(|_| panic!("AST arena exceeded u32::MAX list entries"));
        let len = u16::try_from(ids.len())
            .unwrap_or_else(|_| panic!("operand list longer than u16::MAX"));
        self.lists.extend_from_slice(ids);
        NodeRange::new(start, len)
    }

    /// # Panics
    /// Panics if `id` was not allocated by this arena.
    #[inline]
    pub fn get(&self, id: NodeId) -> &Node {
        &self.nodes[id.index()]
    }

    #[inline]
    pub fn get_list(&self, range: NodeRange) -> &[NodeId] {
        let start = range.start as usize;
        &self.lists[start..start + range.len()]
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}

/// A formal parameter.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub struct Param {
    pub name: Name,
    pub ty: TypeId,
}

/// A function to compile.
#[derive(Clone, Eq, PartialEq, Hash, Debug)]
pub struct FunctionDef {
    pub name: Name,
    pub module: Name,
    pub params: Vec<Param>,
    pub return_type: TypeId,
    /// Root statement, normally a [`NodeKind::Body`].
    pub body: NodeId,
    /// The externally callable entry function.
    pub is_root: bool,
}
