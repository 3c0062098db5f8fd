//! AST result tree.
//!
//! One [`ResultNode`] per visited AST node, memoized by `NodeId`. Results
//! form a tree through `children` and `precomputed_children`; `parent` is a
//! non-owning back-reference used only to find the hoisting point in
//! [`ResultTree::link`].

use std::fmt;

use arrc_ir::{Name, NodeId, TypeId};
use rustc_hash::FxHashMap;
use smallvec::SmallVec;

use crate::text::TextId;
use crate::CodegenError;

/// Index of a result in the [`ResultTree`].
#[derive(Copy, Clone, Eq, PartialEq, Hash, PartialOrd, Ord)]
#[repr(transparent)]
pub struct ResultId(u32);

impl ResultId {
    #[inline]
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Debug for ResultId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ResultId({})", self.0)
    }
}

/// Where a node's value lives.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum ResultVar {
    /// Named slot: a source variable or a generated temporary.
    Symbol(Name),
    /// Inline C expression or literal text.
    Constant(TextId),
    /// No slot assigned yet. Statements stay here; value nodes get a
    /// temporary or an inline expression from their handler.
    Pending,
}

/// Lowering state of one AST node.
#[derive(Clone, Debug)]
pub struct ResultNode {
    pub node: NodeId,
    pub var: ResultVar,
    pub ty: TypeId,
    pub is_temporary: bool,
    pub is_constant: bool,
    pub made_scalar: bool,
    /// Pure rename target; reads of this node go through it.
    pub representative: Option<ResultId>,
    pub prolog: Option<TextId>,
    pub epilog: Option<TextId>,
    pub return_statement: Option<TextId>,
    pub parent: Option<ResultId>,
    pub children: SmallVec<[ResultId; 4]>,
    pub precomputed_children: SmallVec<[ResultId; 2]>,
    pub fusion_depth: u32,
    /// Handler already ran for this node.
    pub lowered: bool,
}

impl ResultNode {
    pub fn new(node: NodeId, ty: TypeId, fusion_depth: u32) -> Self {
        ResultNode {
            node,
            var: ResultVar::Pending,
            ty,
            is_temporary: false,
            is_constant: false,
            made_scalar: false,
            representative: None,
            prolog: None,
            epilog: None,
            return_statement: None,
            parent: None,
            children: SmallVec::new(),
            precomputed_children: SmallVec::new(),
            fusion_depth,
            lowered: false,
        }
    }

    /// Named slot of this node, if it has one.
    pub fn symbol(&self) -> Option<Name> {
        match self.var {
            ResultVar::Symbol(name) => Some(name),
            _ => None,
        }
    }
}

/// Arena of results with the `NodeId` memo table.
#[derive(Default)]
pub struct ResultTree {
    nodes: Vec<ResultNode>,
    memo: FxHashMap<NodeId, ResultId>,
}

impl ResultTree {
    pub fn new() -> Self {
        Self::default()
    }

    /// Result already created for `node`.
    pub fn memoized(&self, node: NodeId) -> Option<ResultId> {
        self.memo.get(&node).copied()
    }

    /// Store a new result and memoize it under its AST node.
    pub fn insert(&mut self, result: ResultNode) -> Result<ResultId, CodegenError> {
        let raw = u32::try_from(self.nodes.len())
            .map_err(|_| CodegenError::internal("result tree exceeded u32::MAX nodes"))?;
        let id = ResultId(raw);
        self.memo.insert(result.node, id);
        self.nodes.push(result);
        Ok(id)
    }

    /// Memoize another AST node to an existing result.
    pub fn memoize_as(&mut self, node: NodeId, target: ResultId) {
        self.memo.insert(node, target);
    }

    /// # Panics
    /// Panics if `id` was issued by another tree.
    #[inline]
    pub fn get(&self, id: ResultId) -> &ResultNode {
        &self.nodes[id.index()]
    }

    #[inline]
    pub fn get_mut(&mut self, id: ResultId) -> &mut ResultNode {
        &mut self.nodes[id.index()]
    }

    /// Make `id` a pure rename of `target`.
    pub fn set_representative(&mut self, id: ResultId, target: ResultId) {
        self.get_mut(id).representative = Some(target);
    }

    /// Array value that the fusion pass reduced to one element.
    pub fn mark_scalar(&mut self, id: ResultId) {
        self.get_mut(id).made_scalar = true;
    }

    pub fn set_prolog(&mut self, id: ResultId, text: TextId) {
        self.get_mut(id).prolog = Some(text);
    }

    pub fn set_epilog(&mut self, id: ResultId, text: TextId) {
        self.get_mut(id).epilog = Some(text);
    }

    pub fn set_return(&mut self, id: ResultId, text: TextId) {
        self.get_mut(id).return_statement = Some(text);
    }

    /// Attach `child` under `parent`.
    ///
    /// A child with a lower fusion depth than `parent` is hoisted: it becomes
    /// a precomputed child of the nearest ancestor whose depth is no greater
    /// than the child's, or of the topmost ancestor if there is none. A
    /// child that is already attached stays where it is.
    pub fn link(&mut self, parent: ResultId, child: ResultId) {
        if parent == child || self.get(child).parent.is_some() {
            return;
        }
        let depth = self.get(child).fusion_depth;
        if depth >= self.get(parent).fusion_depth {
            self.attach(parent, child, false);
            return;
        }

        let mut prev = parent;
        let mut cursor = self.get(parent).parent;
        while let Some(ancestor) = cursor {
            if self.get(ancestor).fusion_depth <= depth {
                break;
            }
            prev = ancestor;
            cursor = self.get(ancestor).parent;
        }
        let host = cursor.unwrap_or(prev);
        tracing::trace!(?child, ?host, depth, "hoisting child");
        self.attach(host, child, true);
    }

    fn attach(&mut self, parent: ResultId, child: ResultId, precomputed: bool) {
        let node = self.get_mut(parent);
        if precomputed {
            node.precomputed_children.push(child);
        } else {
            node.children.push(child);
        }
        self.get_mut(child).parent = Some(parent);
    }

    /// Follow the representative chain to its end.
    ///
    /// Fails with `InconsistentAlias` if the chain is longer than
    /// `max_steps` or revisits a node.
    pub fn resolve(&self, id: ResultId, max_steps: usize) -> Result<ResultId, CodegenError> {
        let limit = max_steps.min(self.nodes.len());
        let mut current = id;
        let mut steps = 0;
        while let Some(next) = self.get(current).representative {
            steps += 1;
            if steps > limit || next == id {
                return Err(CodegenError::InconsistentAlias {
                    node: self.get(id).node,
                    steps,
                });
            }
            current = next;
        }
        Ok(current)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}
