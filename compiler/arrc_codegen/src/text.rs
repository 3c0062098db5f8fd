//! Append-only storage for generated C fragments.
//!
//! All fragments share one `String` buffer; a [`TextId`] names a byte range
//! in it. Only the most recently written fragment may grow, through
//! [`TextArena::continue_tail`]. Multi-part fragments can instead be built in
//! an owned [`FragmentBuilder`] and committed in one step.

use std::fmt;

use crate::CodegenError;

/// Handle to an immutable fragment.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
#[repr(transparent)]
pub struct TextId(u32);

impl TextId {
    #[inline]
    pub const fn raw(self) -> u32 {
        self.0
    }

    #[inline]
    const fn index(self) -> usize {
        self.0 as usize
    }
}

#[derive(Copy, Clone, Debug)]
struct Span {
    start: u32,
    end: u32,
}

/// Fixed-capacity arena of text fragments.
pub struct TextArena {
    buf: String,
    spans: Vec<Span>,
    capacity: usize,
}

impl TextArena {
    pub fn with_capacity(capacity: usize) -> Self {
        TextArena {
            buf: String::with_capacity(capacity.min(1 << 20)),
            spans: Vec::new(),
            capacity,
        }
    }

    fn reserve(&self, extra: usize) -> Result<(), CodegenError> {
        let requested = self.buf.len() + extra;
        if requested > self.capacity || u32::try_from(requested).is_err() {
            return Err(CodegenError::ArenaExhausted {
                capacity: self.capacity,
                requested,
            });
        }
        Ok(())
    }

    #[expect(
        clippy::cast_possible_truncation,
        reason = "reserve() bounds the buffer length to u32"
    )]
    fn cursor(&self) -> u32 {
        self.buf.len() as u32
    }

    /// Store a new fragment.
    pub fn append(&mut self, text: &str) -> Result<TextId, CodegenError> {
        self.reserve(text.len())?;
        let start = self.cursor();
        self.buf.push_str(text);
        let id = TextId(u32::try_from(self.spans.len()).map_err(|_| {
            CodegenError::ArenaExhausted {
                capacity: self.capacity,
                requested: self.buf.len(),
            }
        })?);
        self.spans.push(Span {
            start,
            end: self.cursor(),
        });
        Ok(id)
    }

    /// Extend the tail fragment in place.
    ///
    /// `id` must be the most recently appended fragment.
    pub fn continue_tail(&mut self, id: TextId, more: &str) -> Result<TextId, CodegenError> {
        let tail = self.tail();
        if tail != Some(id) {
            return Err(CodegenError::InconsistentContinuation {
                fragment: id.raw(),
                tail: tail.map(TextId::raw),
            });
        }
        self.reserve(more.len())?;
        self.buf.push_str(more);
        let end = self.cursor();
        if let Some(span) = self.spans.last_mut() {
            span.end = end;
        }
        Ok(id)
    }

    /// Close an owned builder into an immutable fragment.
    pub fn commit(&mut self, builder: FragmentBuilder) -> Result<TextId, CodegenError> {
        self.append(&builder.text)
    }

    /// Most recently appended fragment.
    pub fn tail(&self) -> Option<TextId> {
        self.spans
            .len()
            .checked_sub(1)
            .and_then(|i| u32::try_from(i).ok())
            .map(TextId)
    }

    /// # Panics
    /// Panics if `id` was issued by another arena.
    pub fn get(&self, id: TextId) -> &str {
        let span = self.spans[id.index()];
        &self.buf[span.start as usize..span.end as usize]
    }

    /// Bytes stored so far.
    pub fn used(&self) -> usize {
        self.buf.len()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn fragment_count(&self) -> usize {
        self.spans.len()
    }
}

/// Owned, growable fragment under construction.
#[derive(Default, Debug, Clone)]
pub struct FragmentBuilder {
    text: String,
}

impl FragmentBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, text: &str) -> &mut Self {
        self.text.push_str(text);
        self
    }

    pub fn as_str(&self) -> &str {
        &self.text
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }
}

impl fmt::Write for FragmentBuilder {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        self.text.push_str(s);
        Ok(())
    }
}
