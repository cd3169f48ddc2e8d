//! Single-inheritance class hierarchy.
//!
//! Built by scope resolution, one entry per class that names a resolvable
//! superclass, then shared by reference with the type checker and the code
//! generator.

use rustc_hash::FxHashMap;

/// Direct superclass relation between class names.
#[derive(Debug, Clone, Default)]
pub struct ClassHierarchy {
    superclasses: FxHashMap<String, String>,
}

impl ClassHierarchy {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record that `class` directly extends `superclass`.
    pub fn set_superclass(&mut self, class: impl Into<String>, superclass: impl Into<String>) {
        self.superclasses.insert(class.into(), superclass.into());
    }

    /// The direct superclass of `class`, if it has one.
    pub fn superclass(&self, class: &str) -> Option<&str> {
        self.superclasses.get(class).map(String::as_str)
    }

    /// Proper ancestors of `class`, nearest first.
    pub fn ancestors<'h>(&'h self, class: &str) -> Ancestors<'h> {
        Ancestors {
            hierarchy: self,
            current: self.superclass(class),
            remaining: self.superclasses.len(),
        }
    }

    /// Whether `class` is `ancestor` or inherits from it.
    pub fn is_descendant(&self, class: &str, ancestor: &str) -> bool {
        class == ancestor || self.ancestors(class).any(|c| c == ancestor)
    }

    pub fn len(&self) -> usize {
        self.superclasses.len()
    }

    pub fn is_empty(&self) -> bool {
        self.superclasses.is_empty()
    }
}

/// Iterator over the superclass chain of a class.
///
/// Bounded by the number of recorded edges, so a malformed cyclic relation
/// cannot loop forever.
pub struct Ancestors<'h> {
    hierarchy: &'h ClassHierarchy,
    current: Option<&'h str>,
    remaining: usize,
}

impl<'h> Iterator for Ancestors<'h> {
    type Item = &'h str;

    fn next(&mut self) -> Option<Self::Item> {
        if self.remaining == 0 {
            return None;
        }
        let class = self.current?;
        self.remaining -= 1;
        self.current = self.hierarchy.superclass(class);
        Some(class)
    }
}
