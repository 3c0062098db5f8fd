//! Source symbol to C identifier mapping.
//!
//! Spaces are dropped and a fixed set of punctuation is spelled out as
//! words. Everything else passes through, so two distinct symbols can still
//! land on the same identifier; such collisions are reported as advisories.

use arrc_ir::{Name, StringInterner};
use rustc_hash::FxHashMap;

use crate::text::{TextArena, TextId};
use crate::{Advisory, CodegenError};

/// Replacement for a punctuation character, if it has one.
#[inline]
fn replacement(c: char) -> Option<&'static str> {
    match c {
        '#' => Some("p"),
        '+' => Some("add"),
        '-' => Some("sub"),
        '.' => Some("dot"),
        '*' => Some("mul"),
        '/' => Some("div"),
        '!' => Some("ex"),
        _ => None,
    }
}

/// Sanitize without memoization.
///
/// Used for type-derived names that are not interned symbols.
pub fn sanitize_str(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
        if c == ' ' {
            continue;
        }
        match replacement(c) {
            Some(word) => out.push_str(word),
            None => out.push(c),
        }
    }
    out
}

/// Memoizing sanitizer with its own identifier arena.
pub struct IdentSanitizer {
    arena: TextArena,
    memo: FxHashMap<Name, TextId>,
    /// First symbol seen for each produced identifier.
    owners: FxHashMap<String, Name>,
    advisories: Vec<Advisory>,
}

impl IdentSanitizer {
    pub fn with_capacity(capacity: usize) -> Self {
        IdentSanitizer {
            arena: TextArena::with_capacity(capacity),
            memo: FxHashMap::default(),
            owners: FxHashMap::default(),
            advisories: Vec::new(),
        }
    }

    /// Identifier fragment for `name`, created on first request.
    ///
    /// Repeated calls return the same fragment.
    pub fn identifier(
        &mut self,
        name: Name,
        interner: &StringInterner,
    ) -> Result<TextId, CodegenError> {
        if let Some(&id) = self.memo.get(&name) {
            return Ok(id);
        }
        let raw = interner.lookup(name);
        let sanitized = sanitize_str(raw);
        let id = self.arena.append(&sanitized)?;
        self.memo.insert(name, id);

        match self.owners.get(&sanitized) {
            Some(&owner) if owner != name => {
                let message = format!(
                    "symbols `{}` and `{raw}` both map to C identifier `{sanitized}`",
                    interner.lookup(owner)
                );
                tracing::warn!(identifier = %sanitized, "{message}");
                self.advisories.push(Advisory {
                    node: None,
                    message,
                });
            }
            Some(_) => {}
            None => {
                self.owners.insert(sanitized, name);
            }
        }
        Ok(id)
    }

    /// Text of an identifier fragment.
    pub fn text(&self, id: TextId) -> &str {
        self.arena.get(id)
    }

    /// Identifier for `name` as a borrowed string.
    pub fn ident(&mut self, name: Name, interner: &StringInterner) -> Result<&str, CodegenError> {
        let id = self.identifier(name, interner)?;
        Ok(self.arena.get(id))
    }

    /// Drain collision advisories collected so far.
    pub fn take_advisories(&mut self) -> Vec<Advisory> {
        std::mem::take(&mut self.advisories)
    }
}

#[cfg(test)]
mod tests;
