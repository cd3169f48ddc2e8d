//! Lexical scope management for scope resolution.
//!
//! This module provides [`ScopeStack`], the stack of open frames. It handles:
//! - Frame entry and exit, one frame per nesting level
//! - Declaration and parameter offset counters, reset per frame
//! - Innermost-first lookup, so the nearest declaration shadows outer ones
//! - Class frames seeded with a virtual table

use crate::binding::{EntryId, Frame};

// ============================================================================
// Types
// ============================================================================

/// First offset handed to a declaration in a fresh frame. Slots -1 and 0
/// hold the return address and the access link.
pub const FIRST_DECL_OFFSET: i32 = -2;

/// First offset handed to a parameter.
pub const FIRST_PARAM_OFFSET: i32 = 1;

#[derive(Debug)]
struct ScopeFrame {
    symbols: Frame,
    next_decl: i32,
    next_param: i32,
}

impl ScopeFrame {
    fn new(symbols: Frame) -> Self {
        Self {
            symbols,
            next_decl: FIRST_DECL_OFFSET,
            next_param: FIRST_PARAM_OFFSET,
        }
    }
}

/// Result of a successful lookup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Lookup {
    pub entry: EntryId,
    /// Nesting level of the frame the name was found in.
    pub level: u32,
}

// ============================================================================
// ScopeStack
// ============================================================================

/// Stack of open frames, outermost first.
#[derive(Debug, Default)]
pub struct ScopeStack {
    frames: Vec<ScopeFrame>,
}

impl ScopeStack {
    pub fn new() -> Self {
        Self::default()
    }

    // ==========================================================================
    // Frame Management
    // ==========================================================================

    /// Open an empty frame.
    pub fn push_frame(&mut self) {
        self.frames.push(ScopeFrame::new(Frame::default()));
    }

    /// Open a frame pre-populated with `symbols`, as for a class body.
    pub fn push_seeded(&mut self, symbols: Frame) {
        self.frames.push(ScopeFrame::new(symbols));
    }

    /// Close the innermost frame and hand back its symbols.
    pub fn pop_frame(&mut self) -> Option<Frame> {
        self.frames.pop().map(|frame| frame.symbols)
    }

    /// Nesting level of the innermost frame (0 = global).
    pub fn nesting_level(&self) -> u32 {
        self.frames.len().saturating_sub(1) as u32
    }

    // ==========================================================================
    // Offsets
    // ==========================================================================

    /// Take the next declaration offset of the innermost frame.
    pub fn next_decl_offset(&mut self) -> i32 {
        match self.frames.last_mut() {
            Some(frame) => {
                let offset = frame.next_decl;
                frame.next_decl -= 1;
                offset
            }
            None => FIRST_DECL_OFFSET,
        }
    }

    /// Take the next parameter offset of the innermost frame.
    pub fn next_param_offset(&mut self) -> i32 {
        match self.frames.last_mut() {
            Some(frame) => {
                let offset = frame.next_param;
                frame.next_param += 1;
                offset
            }
            None => FIRST_PARAM_OFFSET,
        }
    }

    // ==========================================================================
    // Symbols
    // ==========================================================================

    /// Bind `name` in the innermost frame.
    ///
    /// Returns `false` and leaves the existing binding alone if the name is
    /// already declared in that frame.
    pub fn declare(&mut self, name: &str, entry: EntryId) -> bool {
        let Some(frame) = self.frames.last_mut() else {
            return false;
        };
        if frame.symbols.contains_key(name) {
            return false;
        }
        frame.symbols.insert(name.to_string(), entry);
        true
    }

    /// Whether `name` is declared in the innermost frame.
    pub fn is_declared_locally(&self, name: &str) -> bool {
        self.frames
            .last()
            .is_some_and(|frame| frame.symbols.contains_key(name))
    }

    /// Find `name`, innermost frame first.
    pub fn lookup(&self, name: &str) -> Option<Lookup> {
        self.frames
            .iter()
            .enumerate()
            .rev()
            .find_map(|(level, frame)| {
                frame.symbols.get(name).map(|&entry| Lookup {
                    entry,
                    level: level as u32,
                })
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn offsets_reset_per_frame() {
        let mut scopes = ScopeStack::new();
        scopes.push_frame();
        assert_eq!(scopes.next_decl_offset(), -2);
        assert_eq!(scopes.next_decl_offset(), -3);

        scopes.push_frame();
        assert_eq!(scopes.next_param_offset(), 1);
        assert_eq!(scopes.next_param_offset(), 2);
        assert_eq!(scopes.next_decl_offset(), -2);
        scopes.pop_frame();

        assert_eq!(scopes.next_decl_offset(), -4);
    }

    #[test]
    fn nearest_declaration_wins() {
        let mut scopes = ScopeStack::new();
        scopes.push_frame();
        assert!(scopes.declare("x", EntryId(0)));
        scopes.push_frame();
        assert!(scopes.declare("x", EntryId(1)));

        assert_eq!(
            scopes.lookup("x"),
            Some(Lookup {
                entry: EntryId(1),
                level: 1
            })
        );
        scopes.pop_frame();
        assert_eq!(scopes.lookup("x").map(|l| l.entry), Some(EntryId(0)));
    }

    #[test]
    fn duplicate_in_same_frame_is_rejected() {
        let mut scopes = ScopeStack::new();
        scopes.push_frame();
        assert!(scopes.declare("f", EntryId(0)));
        assert!(!scopes.declare("f", EntryId(1)));
        assert_eq!(scopes.lookup("f").map(|l| l.entry), Some(EntryId(0)));
        assert!(scopes.is_declared_locally("f"));
    }

    #[test]
    fn seeded_frame() {
        let mut scopes = ScopeStack::new();
        scopes.push_frame();

        let mut table = Frame::default();
        table.insert("size".to_string(), EntryId(7));
        scopes.push_seeded(table);
        scopes.push_frame();

        assert_eq!(scopes.nesting_level(), 2);
        assert_eq!(scopes.lookup("size").map(|l| l.level), Some(1));

        scopes.pop_frame();
        let table = scopes.pop_frame().unwrap_or_default();
        assert_eq!(table.get("size"), Some(&EntryId(7)));
    }
}
