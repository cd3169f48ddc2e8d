//! Compiler configuration.

/// Default size of the target machine's memory, in words.
pub const DEFAULT_MEMORY_SIZE: i64 = 10_000;

/// Options controlling a [`Compiler`](crate::Compiler) run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompilerOptions {
    /// Memory size of the target machine. The global frame starts at this
    /// address, which is where dispatch pointers of classes are loaded from.
    pub memory_size: i64,

    /// Run the type checker even when scope resolution reported errors.
    /// Unresolved nodes are skipped silently.
    pub typecheck_after_binding_errors: bool,
}

impl CompilerOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_memory_size(mut self, memory_size: i64) -> Self {
        self.memory_size = memory_size;
        self
    }

    pub fn with_typecheck_after_binding_errors(mut self, enabled: bool) -> Self {
        self.typecheck_after_binding_errors = enabled;
        self
    }
}

impl Default for CompilerOptions {
    fn default() -> Self {
        Self {
            memory_size: DEFAULT_MEMORY_SIZE,
            typecheck_after_binding_errors: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let options = CompilerOptions::default();
        assert_eq!(options.memory_size, 10_000);
        assert!(options.typecheck_after_binding_errors);
    }

    #[test]
    fn builder_setters() {
        let options = CompilerOptions::new()
            .with_memory_size(512)
            .with_typecheck_after_binding_errors(false);
        assert_eq!(options.memory_size, 512);
        assert!(!options.typecheck_after_binding_errors);
    }
}
