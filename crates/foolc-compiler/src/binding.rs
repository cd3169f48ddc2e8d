//! Binding entries and the side tables scope resolution produces.
//!
//! Scope resolution never writes into the tree. Everything it learns is stored
//! in [`Bindings`], keyed by [`NodeId`], and read back by the type checker and
//! the code generator.

use foolc_ast::NodeId;
use foolc_core::Type;
use rustc_hash::FxHashMap;

// ============================================================================
// Entries
// ============================================================================

/// Index of a [`BindingEntry`] in [`Bindings`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EntryId(pub u32);

/// What a declaration binds its name to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BindingEntry {
    /// Lexical depth of the frame the declaration lives in (0 = global).
    pub nesting_level: u32,
    /// Declared type.
    pub ty: Type,
    /// Frame slot. Declarations use -2, -3, ..., parameters 1, 2, ...,
    /// fields -1, -2, ... (object relative) and methods 0, 1, ... (dispatch
    /// table slot).
    pub offset: i32,
}

impl BindingEntry {
    pub fn new(nesting_level: u32, ty: Type, offset: i32) -> Self {
        Self {
            nesting_level,
            ty,
            offset,
        }
    }

    pub fn is_method(&self) -> bool {
        matches!(self.ty, Type::Method(_))
    }
}

/// Name to entry mapping of one scope frame. A class keeps its frame as its
/// virtual table.
pub type Frame = FxHashMap<String, EntryId>;

// ============================================================================
// Annotations
// ============================================================================

/// A resolved identifier, call or instantiation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Use {
    pub entry: EntryId,
    /// Nesting level at the use site.
    pub nesting_level: u32,
}

impl Use {
    /// Access-link hops from the use site to the declaring frame.
    pub fn hops(&self, entry: &BindingEntry) -> u32 {
        self.nesting_level.saturating_sub(entry.nesting_level)
    }
}

/// A resolved qualified call `receiver.method(...)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MethodCallBinding {
    pub receiver: Use,
    pub method: EntryId,
}

/// Dispatch table slot assigned to a method declaration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MethodSlot {
    pub slot: u32,
    /// The slot was inherited and is being overridden.
    pub overrides: bool,
}

/// Resolution of a class declaration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassBinding {
    pub entry: EntryId,
    /// Superclass name, present only when it was found.
    pub superclass: Option<String>,
}

/// Class table row: the class entry and its virtual table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassRecord {
    pub entry: EntryId,
    pub virtual_table: Frame,
}

// ============================================================================
// Bindings
// ============================================================================

/// Everything scope resolution recorded about a program.
#[derive(Debug, Default)]
pub struct Bindings {
    entries: Vec<BindingEntry>,
    /// Identifier uses, unqualified calls and instantiations.
    uses: FxHashMap<NodeId, Use>,
    method_calls: FxHashMap<NodeId, MethodCallBinding>,
    /// Entry created for each declaration node.
    declarations: FxHashMap<NodeId, EntryId>,
    method_slots: FxHashMap<NodeId, MethodSlot>,
    classes: FxHashMap<NodeId, ClassBinding>,
    class_table: FxHashMap<String, ClassRecord>,
}

impl Bindings {
    pub fn new() -> Self {
        Self::default()
    }

    // ==========================================================================
    // Recording
    // ==========================================================================

    pub fn add_entry(&mut self, entry: BindingEntry) -> EntryId {
        let id = EntryId(self.entries.len() as u32);
        self.entries.push(entry);
        id
    }

    pub fn record_use(&mut self, node: NodeId, resolved: Use) {
        self.uses.insert(node, resolved);
    }

    pub fn record_method_call(&mut self, node: NodeId, binding: MethodCallBinding) {
        self.method_calls.insert(node, binding);
    }

    pub fn record_declaration(&mut self, node: NodeId, entry: EntryId) {
        self.declarations.insert(node, entry);
    }

    pub fn record_method_slot(&mut self, node: NodeId, slot: MethodSlot) {
        self.method_slots.insert(node, slot);
    }

    pub fn record_class(&mut self, node: NodeId, binding: ClassBinding) {
        self.classes.insert(node, binding);
    }

    /// Register a class in the class table. The first class with a given name
    /// keeps its row; returns `false` if the name was already taken.
    pub fn register_class(&mut self, name: &str, record: ClassRecord) -> bool {
        if self.class_table.contains_key(name) {
            return false;
        }
        self.class_table.insert(name.to_string(), record);
        true
    }

    // ==========================================================================
    // Lookup
    // ==========================================================================

    /// Panics if `id` did not come from this table.
    pub fn entry(&self, id: EntryId) -> &BindingEntry {
        &self.entries[id.0 as usize]
    }

    pub fn get_entry(&self, id: EntryId) -> Option<&BindingEntry> {
        self.entries.get(id.0 as usize)
    }

    pub fn use_of(&self, node: NodeId) -> Option<&Use> {
        self.uses.get(&node)
    }

    pub fn method_call(&self, node: NodeId) -> Option<&MethodCallBinding> {
        self.method_calls.get(&node)
    }

    pub fn declaration(&self, node: NodeId) -> Option<EntryId> {
        self.declarations.get(&node).copied()
    }

    pub fn method_slot(&self, node: NodeId) -> Option<MethodSlot> {
        self.method_slots.get(&node).copied()
    }

    pub fn class(&self, node: NodeId) -> Option<&ClassBinding> {
        self.classes.get(&node)
    }

    pub fn class_record(&self, name: &str) -> Option<&ClassRecord> {
        self.class_table.get(name)
    }

    /// Member entry `member` in the virtual table of class `class`.
    pub fn member(&self, class: &str, member: &str) -> Option<&BindingEntry> {
        let record = self.class_record(class)?;
        let id = record.virtual_table.get(member)?;
        self.get_entry(*id)
    }

    pub fn entry_count(&self) -> usize {
        self.entries.len()
    }

    pub fn use_count(&self) -> usize {
        self.uses.len() + self.method_calls.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hops_count_levels() {
        let entry = BindingEntry::new(1, Type::Int, -2);
        let resolved = Use {
            entry: EntryId(0),
            nesting_level: 3,
        };
        assert_eq!(resolved.hops(&entry), 2);
    }

    #[test]
    fn first_class_registration_wins() {
        let mut bindings = Bindings::new();
        let first = bindings.add_entry(BindingEntry::new(0, Type::Int, -2));
        let second = bindings.add_entry(BindingEntry::new(0, Type::Int, -3));
        let row = |entry| ClassRecord {
            entry,
            virtual_table: Frame::default(),
        };

        assert!(bindings.register_class("A", row(first)));
        assert!(!bindings.register_class("A", row(second)));
        assert_eq!(bindings.class_record("A").map(|r| r.entry), Some(first));
    }

    #[test]
    fn member_lookup() {
        let mut bindings = Bindings::new();
        let class = bindings.add_entry(BindingEntry::new(0, Type::Int, -2));
        let field = bindings.add_entry(BindingEntry::new(1, Type::Bool, -1));
        let mut table = Frame::default();
        table.insert("flag".to_string(), field);
        bindings.register_class(
            "Box",
            ClassRecord {
                entry: class,
                virtual_table: table,
            },
        );

        assert_eq!(bindings.member("Box", "flag").map(|e| e.offset), Some(-1));
        assert!(bindings.member("Box", "other").is_none());
        assert!(bindings.member("Crate", "flag").is_none());
    }
}
