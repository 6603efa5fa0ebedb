use std::fmt::{Display, Formatter};
use std::hash::{Hash, Hasher};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/***
 Runtime types.

 Every value knows its type, and dispatch is done on the type's tag only.
 Built-in types have fixed tags; every `defrecord` / `deftype` / `reify`
 mints a fresh `Declared` tag, so redefining a type under the same name
 gives a brand-new type that old implementations don't apply to.
 */

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BuiltinType {
    Str,
    Char,
    Int,
    Float,
    Bytes,
    Bool,
    Nil,
    Keyword,
    Symbol,
    List,
    Map,
    Function,
    Special,
    Capability,
    Type,
}

impl BuiltinType {
    /// The types that get a binding in the root namespace
    pub const NAMED: [BuiltinType; 11] = [
        BuiltinType::Str,
        BuiltinType::Char,
        BuiltinType::Int,
        BuiltinType::Float,
        BuiltinType::Bytes,
        BuiltinType::Bool,
        BuiltinType::Keyword,
        BuiltinType::Symbol,
        BuiltinType::List,
        BuiltinType::Map,
        BuiltinType::Function,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            BuiltinType::Str => "String",
            BuiltinType::Char => "Char",
            BuiltinType::Int => "Int",
            BuiltinType::Float => "Float",
            BuiltinType::Bytes => "Bytes",
            BuiltinType::Bool => "Bool",
            BuiltinType::Nil => "Nil",
            BuiltinType::Keyword => "Keyword",
            BuiltinType::Symbol => "Symbol",
            BuiltinType::List => "List",
            BuiltinType::Map => "Map",
            BuiltinType::Function => "Function",
            BuiltinType::Special => "SpecialForm",
            BuiltinType::Capability => "Capability",
            BuiltinType::Type => "Type",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TypeTag {
    Builtin(BuiltinType),
    Declared(usize),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TypeKind {
    Builtin,
    Record,
    Compound,
    Anonymous,
}

/// Describes a runtime type. Two `TypeInfo`s are the same type iff their
/// tags match; the name is only for humans.
#[derive(Debug)]
pub struct TypeInfo {
    pub tag: TypeTag,
    pub name: String,
    pub kind: TypeKind,
    /// declared fields, in declaration order (empty for non-records)
    pub fields: Vec<String>,
}

pub type TypeRef = Arc<TypeInfo>;

static NEXT_TYPE_ID: AtomicUsize = AtomicUsize::new(0);

impl TypeInfo {
    pub fn builtin(ty: BuiltinType) -> TypeRef {
        Arc::new(TypeInfo {
            tag: TypeTag::Builtin(ty),
            name: ty.name().to_string(),
            kind: TypeKind::Builtin,
            fields: Vec::new(),
        })
    }

    /// Mint a new, distinct type
    pub fn declare(
        name: impl Into<String>,
        kind: TypeKind,
        fields: Vec<String>,
    ) -> TypeRef {
        let id = NEXT_TYPE_ID.fetch_add(1, Ordering::Relaxed);
        Arc::new(TypeInfo {
            tag: TypeTag::Declared(id),
            name: name.into(),
            kind,
            fields,
        })
    }

    pub fn field_index(&self, field: &str) -> Option<usize> {
        self.fields.iter().position(|f| f == field)
    }
}

impl PartialEq for TypeInfo {
    fn eq(&self, other: &Self) -> bool {
        self.tag == other.tag
    }
}

impl Eq for TypeInfo {}

impl Hash for TypeInfo {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.tag.hash(state)
    }
}

impl Display for TypeInfo {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_redeclared_types_are_distinct() {
        let first = TypeInfo::declare("Person", TypeKind::Record, vec![]);
        let second = TypeInfo::declare("Person", TypeKind::Record, vec![]);
        assert_ne!(first, second);
        assert_eq!(first.name, second.name);
    }

    #[test]
    fn test_builtins_compare_by_tag() {
        assert_eq!(
            TypeInfo::builtin(BuiltinType::Str),
            TypeInfo::builtin(BuiltinType::Str)
        );
        assert_ne!(
            TypeInfo::builtin(BuiltinType::Str),
            TypeInfo::builtin(BuiltinType::Map)
        );
    }
}
