//! Semantic types.
//!
//! [`Type`] is what the analysis passes reason about. It is distinct from the
//! syntactic `TypeExpr` written in the source: annotations are lowered into
//! `Type` values when they are bound.

use std::fmt;

/// A FOOL type.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Type {
    /// Machine integer.
    Int,
    /// Boolean; coerces to `Int`.
    Bool,
    /// Type of the `null` literal; bottom of the class references.
    Empty,
    /// Nominal reference to an instance of a class.
    Ref(String),
    /// Function or closure type.
    Arrow(ArrowType),
    /// A function type that lives in a virtual table.
    Method(ArrowType),
    /// Structural type of a class declaration. Never the type of a value.
    Class(ClassType),
}

impl Type {
    /// Reference to an instance of `class`.
    pub fn reference(class: impl Into<String>) -> Self {
        Type::Ref(class.into())
    }

    /// Function type from parameter types and a return type.
    pub fn arrow(params: Vec<Type>, ret: Type) -> Self {
        Type::Arrow(ArrowType::new(params, ret))
    }

    /// Method type from parameter types and a return type.
    pub fn method(params: Vec<Type>, ret: Type) -> Self {
        Type::Method(ArrowType::new(params, ret))
    }

    /// Whether values of this type are callables (`Arrow` or `Method`).
    pub fn is_callable(&self) -> bool {
        matches!(self, Type::Arrow(_) | Type::Method(_))
    }

    /// The arrow behind a callable type, with the `Method` tag removed.
    pub fn as_arrow(&self) -> Option<&ArrowType> {
        match self {
            Type::Arrow(arrow) | Type::Method(arrow) => Some(arrow),
            _ => None,
        }
    }

    /// The class name of a `Ref` type.
    pub fn class_name(&self) -> Option<&str> {
        match self {
            Type::Ref(name) => Some(name),
            _ => None,
        }
    }

    /// The structural class type of a class declaration.
    pub fn as_class(&self) -> Option<&ClassType> {
        match self {
            Type::Class(class) => Some(class),
            _ => None,
        }
    }
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Type::Int => f.write_str("int"),
            Type::Bool => f.write_str("bool"),
            Type::Empty => f.write_str("null"),
            Type::Ref(name) => f.write_str(name),
            Type::Arrow(arrow) => write!(f, "{arrow}"),
            Type::Method(arrow) => write!(f, "method {arrow}"),
            Type::Class(class) => write!(f, "{class}"),
        }
    }
}

/// Parameter and return types of a callable.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ArrowType {
    pub params: Vec<Type>,
    pub ret: Box<Type>,
}

impl ArrowType {
    pub fn new(params: Vec<Type>, ret: Type) -> Self {
        Self {
            params,
            ret: Box::new(ret),
        }
    }

    pub fn arity(&self) -> usize {
        self.params.len()
    }
}

impl fmt::Display for ArrowType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("(")?;
        for (i, param) in self.params.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{param}")?;
        }
        write!(f, ") -> {}", self.ret)
    }
}

/// Ordered field types and method arrows of a class, inherited ones first.
///
/// A field's position is `-offset - 1`; a method's position is its slot.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct ClassType {
    pub fields: Vec<Type>,
    pub methods: Vec<ArrowType>,
}

impl ClassType {
    pub fn new(fields: Vec<Type>, methods: Vec<ArrowType>) -> Self {
        Self { fields, methods }
    }
}

impl fmt::Display for ClassType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "class({} fields, {} methods)",
            self.fields.len(),
            self.methods.len()
        )
    }
}
