//! Source location tracking for diagnostics.
//!
//! Provides [`Span`] to record where a node came from in the source text.

use std::fmt;

/// A source position, represented by where the construct starts.
///
/// Diagnostics only ever report the line, but the column is kept so that
/// front ends that know it can pass it through.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default, PartialOrd, Ord)]
pub struct Span {
    /// Line number (1-indexed, 0 when unknown).
    pub line: u32,
    /// Column number (1-indexed, 0 when unknown).
    pub col: u32,
}

impl Span {
    /// Create a span at a line and column.
    #[inline]
    pub fn new(line: u32, col: u32) -> Self {
        Self { line, col }
    }

    /// Create a span that only knows its line.
    #[inline]
    pub fn line(line: u32) -> Self {
        Self { line, col: 0 }
    }

    /// Whether this span carries any position information.
    #[inline]
    pub fn is_known(&self) -> bool {
        self.line != 0
    }

    /// The earlier of two spans.
    #[inline]
    pub fn merge(self, other: Span) -> Span {
        if !self.is_known() {
            return other;
        }
        if !other.is_known() {
            return self;
        }
        self.min(other)
    }
}

impl fmt::Debug for Span {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.col)
    }
}

impl fmt::Display for Span {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.col == 0 {
            write!(f, "line {}", self.line)
        } else {
            write!(f, "line {}:{}", self.line, self.col)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn span_display() {
        assert_eq!(format!("{}", Span::new(3, 15)), "line 3:15");
        assert_eq!(format!("{}", Span::line(7)), "line 7");
    }

    #[test]
    fn span_merge_picks_earlier() {
        let first = Span::new(1, 5);
        let second = Span::new(3, 1);
        assert_eq!(first.merge(second), first);
        assert_eq!(second.merge(first), first);
    }

    #[test]
    fn span_merge_ignores_unknown() {
        let known = Span::line(4);
        assert_eq!(Span::default().merge(known), known);
        assert_eq!(known.merge(Span::default()), known);
    }
}
