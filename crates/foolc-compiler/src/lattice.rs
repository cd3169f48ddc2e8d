//! Subtype relation and lowest common ancestors.
//!
//! The relation is:
//!
//! - `bool <: int`, and each primitive is a subtype of itself
//! - `null <: C` for every class reference `C`
//! - `C <: D` when `D` is `C` or one of its ancestors
//! - `(P1..Pn) -> R <: (Q1..Qn) -> S` when `R <: S` and `Qi <: Pi` for all `i`
//! - `method` types relate the same way as arrows, but only to each other
//! - class types relate structurally, position by position, over the
//!   supertype's fields and methods

use foolc_core::{ArrowType, ClassType, Type};

use crate::hierarchy::ClassHierarchy;

/// Answers subtyping questions against a class hierarchy.
#[derive(Debug, Clone, Copy)]
pub struct SubtypeLattice<'h> {
    hierarchy: &'h ClassHierarchy,
}

impl<'h> SubtypeLattice<'h> {
    pub fn new(hierarchy: &'h ClassHierarchy) -> Self {
        Self { hierarchy }
    }

    /// Whether `a` can be used where `b` is expected.
    pub fn is_subtype(&self, a: &Type, b: &Type) -> bool {
        match (a, b) {
            (Type::Int, Type::Int) | (Type::Bool, Type::Bool) | (Type::Bool, Type::Int) => true,
            (Type::Empty, Type::Empty) | (Type::Empty, Type::Ref(_)) => true,
            (Type::Ref(sub), Type::Ref(sup)) => self.hierarchy.is_descendant(sub, sup),
            (Type::Arrow(sub), Type::Arrow(sup)) | (Type::Method(sub), Type::Method(sup)) => {
                self.is_subtype_arrow(sub, sup)
            }
            (Type::Class(sub), Type::Class(sup)) => self.is_subtype_class(sub, sup),
            _ => false,
        }
    }

    /// Arrow subtyping: equal arity, covariant return, contravariant parameters.
    pub fn is_subtype_arrow(&self, a: &ArrowType, b: &ArrowType) -> bool {
        a.arity() == b.arity()
            && self.is_subtype(&a.ret, &b.ret)
            && a
                .params
                .iter()
                .zip(&b.params)
                .all(|(pa, pb)| self.is_subtype(pb, pa))
    }

    fn is_subtype_class(&self, a: &ClassType, b: &ClassType) -> bool {
        a.fields.len() >= b.fields.len()
            && a.methods.len() >= b.methods.len()
            && a.fields
                .iter()
                .zip(&b.fields)
                .all(|(fa, fb)| self.is_subtype(fa, fb))
            && a
                .methods
                .iter()
                .zip(&b.methods)
                .all(|(ma, mb)| self.is_subtype_arrow(ma, mb))
    }

    /// The most specific type both `a` and `b` are subtypes of.
    ///
    /// When neither is a subtype of the other, only class references have a
    /// common ancestor: the first class up `a`'s superclass chain that `b`
    /// is a subtype of. Returns `None` when there is no such type.
    pub fn lowest_common_ancestor(&self, a: &Type, b: &Type) -> Option<Type> {
        if self.is_subtype(a, b) {
            return Some(b.clone());
        }
        if self.is_subtype(b, a) {
            return Some(a.clone());
        }

        let class = a.class_name()?;
        self.hierarchy
            .ancestors(class)
            .map(Type::reference)
            .find(|ancestor| self.is_subtype(b, ancestor))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn animals() -> ClassHierarchy {
        let mut h = ClassHierarchy::new();
        h.set_superclass("Dog", "Animal");
        h.set_superclass("Puppy", "Dog");
        h.set_superclass("Cat", "Animal");
        h
    }

    fn r(name: &str) -> Type {
        Type::reference(name)
    }

    #[test]
    fn primitives() {
        let h = ClassHierarchy::new();
        let lattice = SubtypeLattice::new(&h);
        assert!(lattice.is_subtype(&Type::Bool, &Type::Int));
        assert!(!lattice.is_subtype(&Type::Int, &Type::Bool));
        assert!(!lattice.is_subtype(&Type::Int, &r("Animal")));
    }

    #[test]
    fn reflexive() {
        let h = animals();
        let lattice = SubtypeLattice::new(&h);
        let types = [
            Type::Int,
            Type::Bool,
            Type::Empty,
            r("Dog"),
            Type::arrow(vec![Type::Int, r("Cat")], Type::Bool),
            Type::method(vec![], r("Animal")),
            Type::Class(ClassType::new(vec![Type::Int], vec![ArrowType::new(vec![], Type::Int)])),
        ];
        for ty in &types {
            assert!(lattice.is_subtype(ty, ty), "{ty} should be a subtype of itself");
        }
    }

    #[test]
    fn class_references_are_transitive() {
        let h = animals();
        let lattice = SubtypeLattice::new(&h);
        assert!(lattice.is_subtype(&r("Puppy"), &r("Dog")));
        assert!(lattice.is_subtype(&r("Dog"), &r("Animal")));
        assert!(lattice.is_subtype(&r("Puppy"), &r("Animal")));
        assert!(!lattice.is_subtype(&r("Animal"), &r("Dog")));
        assert!(!lattice.is_subtype(&r("Cat"), &r("Dog")));
    }

    #[test]
    fn null_is_below_every_reference() {
        let h = animals();
        let lattice = SubtypeLattice::new(&h);
        assert!(lattice.is_subtype(&Type::Empty, &r("Cat")));
        assert!(!lattice.is_subtype(&Type::Empty, &Type::Int));
        assert!(!lattice.is_subtype(&r("Cat"), &Type::Empty));
    }

    #[test]
    fn arrows_covariant_return_contravariant_params() {
        let h = animals();
        let lattice = SubtypeLattice::new(&h);
        let base = ArrowType::new(vec![r("Dog")], r("Animal"));

        let narrower_return = ArrowType::new(vec![r("Dog")], r("Cat"));
        assert!(lattice.is_subtype_arrow(&narrower_return, &base));

        let wider_param = ArrowType::new(vec![r("Animal")], r("Animal"));
        assert!(lattice.is_subtype_arrow(&wider_param, &base));

        let narrower_param = ArrowType::new(vec![r("Puppy")], r("Animal"));
        assert!(!lattice.is_subtype_arrow(&narrower_param, &base));

        let wider_return = ArrowType::new(vec![r("Dog")], Type::Int);
        assert!(!lattice.is_subtype_arrow(&wider_return, &base));

        let other_arity = ArrowType::new(vec![r("Dog"), Type::Int], r("Animal"));
        assert!(!lattice.is_subtype_arrow(&other_arity, &base));
    }

    #[test]
    fn methods_and_arrows_do_not_mix() {
        let h = ClassHierarchy::new();
        let lattice = SubtypeLattice::new(&h);
        let arrow = Type::arrow(vec![], Type::Int);
        let method = Type::method(vec![], Type::Int);
        assert!(!lattice.is_subtype(&method, &arrow));
        assert!(!lattice.is_subtype(&arrow, &method));
    }

    #[test]
    fn lowest_common_ancestor() {
        let h = animals();
        let lattice = SubtypeLattice::new(&h);

        assert_eq!(lattice.lowest_common_ancestor(&Type::Bool, &Type::Int), Some(Type::Int));
        assert_eq!(lattice.lowest_common_ancestor(&Type::Int, &Type::Bool), Some(Type::Int));
        assert_eq!(lattice.lowest_common_ancestor(&Type::Empty, &r("Dog")), Some(r("Dog")));
        assert_eq!(lattice.lowest_common_ancestor(&r("Puppy"), &r("Cat")), Some(r("Animal")));
        assert_eq!(lattice.lowest_common_ancestor(&r("Cat"), &r("Puppy")), Some(r("Animal")));
        assert_eq!(lattice.lowest_common_ancestor(&r("Dog"), &Type::Int), None);
        assert_eq!(lattice.lowest_common_ancestor(&Type::Int, &r("Dog")), None);
    }

    #[test]
    fn unrelated_roots_have_no_ancestor() {
        let mut h = animals();
        h.set_superclass("Car", "Vehicle");
        let lattice = SubtypeLattice::new(&h);
        assert_eq!(lattice.lowest_common_ancestor(&r("Car"), &r("Dog")), None);
    }
}
