use std::cell::RefCell;
use std::fmt::{Display, Formatter};
use std::rc::Rc;

use super::{EResult, EvalError, TypeKind, TypeRef, Var};

/// An opaque bundle of named, mutable fields.
///
/// Compounds can only be built positionally and only be read or written
/// one named field at a time; there is no mapping view of them.
/// Handles share the underlying fields, so equality is identity.
#[derive(Debug, Clone)]
pub struct Compound {
    info: TypeRef,
    fields: Rc<RefCell<Vec<Var>>>,
}

impl Compound {
    pub fn new(info: &TypeRef, values: &[Var]) -> EResult<Self> {
        if info.kind != TypeKind::Compound {
            return Err(EvalError::Type {
                expected: "compound type".to_string(),
                actual: info.name.clone(),
            });
        }
        if values.len() != info.fields.len() {
            return Err(EvalError::Arity {
                name: info.name.clone(),
                arity: info.fields.len(),
                num_args_provided: values.len(),
            });
        }

        Ok(Compound {
            info: info.clone(),
            fields: Rc::new(RefCell::new(values.to_vec())),
        })
    }

    pub fn type_info(&self) -> &TypeRef {
        &self.info
    }

    pub fn field(&self, name: &str) -> EResult<Var> {
        let idx = self.index_of(name)?;
        Ok(self.fields.borrow()[idx].clone())
    }

    /// Overwrite a field in place; every handle to this instance sees it.
    pub fn set_field(&self, name: &str, value: Var) -> EResult<()> {
        let idx = self.index_of(name)?;
        self.fields.borrow_mut()[idx] = value;
        Ok(())
    }

    /// Generic key lookup. Always fails: compounds only have named access.
    pub fn lookup(&self, _key: &str) -> EResult<Var> {
        Err(self.unsupported("generic key lookup"))
    }

    pub fn unsupported(&self, operation: &str) -> EvalError {
        EvalError::Unsupported {
            operation: operation.to_string(),
            type_name: self.info.name.clone(),
        }
    }

    fn index_of(&self, name: &str) -> EResult<usize> {
        self.info
            .field_index(name)
            .ok_or_else(|| {
                EvalError::UnknownField {
                    type_name: self.info.name.clone(),
                    field: name.to_string(),
                }
            })
    }
}

impl PartialEq for Compound {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.fields, &other.fields)
    }
}

impl Display for Compound {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "#<{}>", self.info.name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::{TypeInfo, Value};

    fn counter() -> Compound {
        let ty = TypeInfo::declare(
            "Counter",
            TypeKind::Compound,
            vec!["count".to_string()],
        );
        Compound::new(&ty, &[Value::Int(0).into()]).unwrap()
    }

    #[test]
    fn test_fields_mutate_in_place() {
        let c = counter();
        let alias = c.clone();
        c.set_field("count", Value::Int(3).into())
            .unwrap();
        assert_eq!(
            alias.field("count").unwrap(),
            Var::from(Value::Int(3))
        );
        assert_eq!(c, alias);
    }

    #[test]
    fn test_generic_lookup_unsupported() {
        assert!(matches!(
            counter().lookup("count"),
            Err(EvalError::Unsupported { .. })
        ));
    }

    #[test]
    fn test_unknown_field() {
        assert!(matches!(
            counter().field("total"),
            Err(EvalError::UnknownField { .. })
        ));
    }

    #[test]
    fn test_records_types_rejected() {
        let ty = TypeInfo::declare("Person", TypeKind::Record, vec![]);
        assert!(matches!(
            Compound::new(&ty, &[]),
            Err(EvalError::Type { .. })
        ));
    }
}
