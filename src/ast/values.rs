use std::collections::hash_map::DefaultHasher;
use std::fmt::{Display, Formatter};
use std::hash::{Hash, Hasher};

use super::{BuiltinType, Expr};
use crate::InternalError;

#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Str(String),
    Char(char),
    Int(isize),
    Bytes(Vec<u8>),
    Float(f64),
    Bool(bool), // are `true` / `false` symbols or lits? Right now a lit.
    Nil,
}

impl Value {
    /// For convenience - you usually want to wrap a "bare" literal
    /// with an Expr::Value
    pub fn expr(self) -> Expr {
        Expr::Value(self)
    }

    pub fn builtin_type(&self) -> BuiltinType {
        match self {
            Value::Str(_) => BuiltinType::Str,
            Value::Char(_) => BuiltinType::Char,
            Value::Int(_) => BuiltinType::Int,
            Value::Bytes(_) => BuiltinType::Bytes,
            Value::Float(_) => BuiltinType::Float,
            Value::Bool(_) => BuiltinType::Bool,
            Value::Nil => BuiltinType::Nil,
        }
    }

    /// Content hash. Stable for the life of the process, which is all a
    /// REPL session needs.
    pub fn hash_code(&self) -> isize {
        let mut hasher = DefaultHasher::new();
        match self {
            Value::Str(s) => s.hash(&mut hasher),
            Value::Char(c) => c.hash(&mut hasher),
            Value::Int(n) => n.hash(&mut hasher),
            Value::Bytes(b) => b.hash(&mut hasher),
            Value::Float(x) => x.to_bits().hash(&mut hasher),
            Value::Bool(b) => b.hash(&mut hasher),
            Value::Nil => 0_u8.hash(&mut hasher),
        }
        hasher.finish() as isize
    }
}

impl Display for Value {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Value::Str(x) => x.fmt(f),
            Value::Char(x) => x.fmt(f),
            Value::Int(x) => x.fmt(f),
            Value::Bytes(b) => write!(f, "#bytes[{}]", b.len()),
            Value::Float(x) => x.fmt(f),
            Value::Bool(x) => x.fmt(f),
            Value::Nil => write!(f, "nil"),
        }
    }
}

/******************************\
|* Rust types <-> Value types *|
\******************************/
// These macros write out a series of TryFrom and From implementations that
// establish a mapping between certain rust values and our `Value`s.
//
// The `From<rust_type> for Value` traits can be infallibly defined, because
// each rust type is associated with at most one Value variant.
//
// However, because enum variants aren't types in themselves, we can't define
// `From<Value> for rust_type` - we can't guarantee that a given value can be
// converted into any specific rust type. Thus, we end up with
// `TryFrom<&Value> for rust_type`, which at least makes it easy to _try_ to
// do the conversion and handle errors if not possible.
macro_rules! impl_value_conversions {
    ($($t:ty, $v:ident);* $(;)?) => {
        $(
            impl TryFrom<&Value> for $t {
                type Error = InternalError;

                fn try_from(value: &Value) -> Result<Self, Self::Error> {
                    if let Value::$v(native_val) = &value {
                        Ok(native_val.clone())
                    } else {
                        Err(InternalError::Conversion{
                            builtin_type: format!("{:?}", value.builtin_type()),
                            rust_type: stringify!($t).to_string(),
                        })
                    }
                }
            }

            impl From<$t> for Value {
                fn from(val: $t) -> Self {
                    Value::$v(val)
                }
            }
        )*
    };
}

// The mappings.
// The first element is the rust type, the second is the Value variant.
impl_value_conversions! {
    String, Str;
    char, Char;
    f64, Float;
    Vec<u8>, Bytes;
    isize, Int;
    bool, Bool;
}

impl From<&str> for Value {
    fn from(val: &str) -> Self {
        Value::Str(val.to_string())
    }
}

impl<'a> TryFrom<&'a Value> for &'a str {
    type Error = InternalError;

    fn try_from(value: &'a Value) -> Result<Self, Self::Error> {
        if let Value::Str(native_s) = value {
            Ok(native_s)
        } else {
            Err(InternalError::Conversion {
                builtin_type: format!("{:?}", value.builtin_type()),
                rust_type: "&str".to_string(),
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_is_by_content() {
        assert_eq!(
            Value::from("Rich").hash_code(),
            Value::Str("Rich".to_string()).hash_code()
        );
        assert_ne!(
            Value::from("Rich").hash_code(),
            Value::from("Hickey").hash_code()
        );
    }

    #[test]
    fn test_failed_conversion() {
        let result: Result<isize, _> = (&Value::from("nope")).try_into();
        assert!(matches!(
            result,
            Err(InternalError::Conversion { .. })
        ));
    }
}
