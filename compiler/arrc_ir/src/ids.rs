//! Handles into the AST arena and the type pool.
//!
//! - `NodeId(u32)` instead of `Box<Node>`
//! - `TypeId(u32)` instead of `Rc<Type>`
//! - `NodeRange` for operand lists (start + len into a shared list)

use std::fmt;

/// Defines a `u32` index handle with an `INVALID` sentinel.
macro_rules! define_id {
    ($($(#[$meta:meta])* $name:ident),* $(,)?) => { $(
        $(#[$meta])*
        #[derive(Copy, Clone, Eq, PartialEq, Hash, PartialOrd, Ord)]
        #[repr(transparent)]
        pub struct $name(u32);

        impl $name {
            /// Sentinel value.
            pub const INVALID: $name = $name(u32::MAX);

            #[inline]
            pub const fn new(index: u32) -> Self {
                $name(index)
            }

            /// Get the index into the owning arena.
            #[inline]
            pub const fn index(self) -> usize {
                self.0 as usize
            }

            #[inline]
            pub const fn raw(self) -> u32 {
                self.0
            }

            #[inline]
            pub const fn is_valid(self) -> bool {
                self.0 != u32::MAX
            }
        }

        impl fmt::Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                if self.is_valid() {
                    write!(f, "{}({})", stringify!($name), self.0)
                } else {
                    write!(f, "{}::INVALID", stringify!($name))
                }
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::INVALID
            }
        }
    )* };
}

define_id!(
    /// Index of a node in an [`AstArena`](crate::AstArena).
    NodeId,
    /// Index of a type in a [`TypePool`](crate::TypePool).
    TypeId,
);

/// Range of node ids in the arena's flattened operand list.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Default)]
pub struct NodeRange {
    pub start: u32,
    pub len: u16,
}

impl NodeRange {
    pub const EMPTY: Self = Self { start: 0, len: 0 };

    #[inline]
    pub const fn new(start: u32, len: u16) -> Self {
        Self { start, len }
    }

    #[inline]
    pub const fn is_empty(&self) -> bool {
        self.len == 0
    }

    #[inline]
    pub const fn len(&self) -> usize {
        self.len as usize
    }
}

impl fmt::Debug for NodeRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "NodeRange({}..{})",
            self.start,
            self.start + u32::from(self.len)
        )
    }
}
