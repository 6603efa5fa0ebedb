use std::fmt::{Display, Formatter};

use indexmap::IndexMap;
use itertools::Itertools;

use super::{EResult, EvalError, TypeKind, TypeRef, Var};

/// An untyped, ordered mapping from field name to value.
/// This is what a record turns into once it loses a field.
pub type Mapping = IndexMap<String, Var>;

/***
 Records are immutable, type-tagged mappings.

 - The declared fields are always present (defaulting to nil), in
   declaration order; extra fields can be added and keep the type tag.
 - Removing any field gives back a plain `Mapping` - the result no longer
   has the shape the type promises, so it no longer claims to be one.
 - Nothing mutates in place: every update hands back a new value.
 */
#[derive(Debug, Clone)]
pub struct Record {
    info: TypeRef,
    fields: Mapping,
}

impl Record {
    /// Bind `values` to the declared fields, in declaration order
    pub fn positional(info: &TypeRef, values: &[Var]) -> EResult<Self> {
        check_is_record(info)?;
        if values.len() != info.fields.len() {
            return Err(EvalError::Arity {
                name: info.name.clone(),
                arity: info.fields.len(),
                num_args_provided: values.len(),
            });
        }

        let fields = info
            .fields
            .iter()
            .cloned()
            .zip(values.iter().cloned())
            .collect();
        Ok(Record {
            info: info.clone(),
            fields,
        })
    }

    /// Build from a field mapping. Missing fields are nil, and keys the
    /// type doesn't declare are rejected.
    pub fn from_mapping(info: &TypeRef, mapping: &Mapping) -> EResult<Self> {
        check_is_record(info)?;
        if let Some(unknown) = mapping
            .keys()
            .find(|key| info.field_index(key).is_none())
        {
            return Err(EvalError::UnknownField {
                type_name: info.name.clone(),
                field: unknown.clone(),
            });
        }

        let fields = info
            .fields
            .iter()
            .map(|field| {
                let value = mapping
                    .get(field)
                    .cloned()
                    .unwrap_or_else(Var::nil);
                (field.clone(), value)
            })
            .collect();
        Ok(Record {
            info: info.clone(),
            fields,
        })
    }

    pub fn type_info(&self) -> &TypeRef {
        &self.info
    }

    pub fn fields(&self) -> &Mapping {
        &self.fields
    }

    pub fn get(&self, key: &str) -> Option<&Var> {
        self.fields.get(key)
    }

    /// Named field access: unlike `get`, a missing field is an error
    pub fn field(&self, key: &str) -> EResult<&Var> {
        self.fields
            .get(key)
            .ok_or_else(|| {
                EvalError::UnknownField {
                    type_name: self.info.name.clone(),
                    field: key.to_string(),
                }
            })
    }

    /// A copy with `key` set. Keeps the type, declared field or not.
    pub fn with_field(&self, key: &str, value: Var) -> Record {
        let mut fields = self.fields.clone();
        fields.insert(key.to_string(), value);
        Record {
            info: self.info.clone(),
            fields,
        }
    }

    /// A copy without `key`, demoted to a plain mapping.
    pub fn without_field(&self, key: &str) -> Mapping {
        let mut fields = self.fields.clone();
        fields.shift_remove(key);
        fields
    }
}

fn check_is_record(info: &TypeRef) -> EResult<()> {
    if info.kind == TypeKind::Record {
        Ok(())
    } else {
        Err(EvalError::Type {
            expected: "record type".to_string(),
            actual: info.name.clone(),
        })
    }
}

impl PartialEq for Record {
    fn eq(&self, other: &Self) -> bool {
        self.info == other.info && self.fields == other.fields
    }
}

impl Display for Record {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}{}", self.info.name, display_mapping(&self.fields))
    }
}

pub fn display_mapping(mapping: &Mapping) -> String {
    let items = mapping
        .iter()
        .map(|(k, v)| format!(":{k} {}", v.repr()))
        .join(", ");
    format!("{{{items}}}")
}
