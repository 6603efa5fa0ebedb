//! Functions over maps, records and compounds.
//!
//! The three shapes deliberately answer differently:
//! - maps support everything, and are what records degrade into;
//! - records support generic access, but updates always copy;
//! - compounds only allow named field access (`field` / `set-field!`).

use super::functions::BuiltinFnBuilder;
use crate::ast::{
    Arity, Compound, Expr, Mapping, OwnedSExpr, Record, SExpr, TypeKind,
    Value, Var,
};
use crate::{lookup_key, EResult, EvalError};

fn unsupported(operation: &str, target: &Var) -> EvalError {
    EvalError::Unsupported {
        operation: operation.to_string(),
        type_name: target.type_name(),
    }
}

/************\
|* Hash-map *|
\************/
/// `(hash-map :k1 v1 :k2 v2 ...)` builds a plain mapping
pub(super) struct HashMapFnBuilder {}
impl BuiltinFnBuilder for HashMapFnBuilder {
    fn names() -> Vec<&'static str> {
        vec!["hash-map"]
    }

    fn arguments() -> Vec<&'static str> {
        vec!["kv_pairs"]
    }

    fn arity() -> Arity {
        Arity::Variadic
    }

    fn eval(args: &SExpr) -> EResult<Var> {
        if args.len() % 2 != 0 {
            return Err(EvalError::Syntax {
                expected: "keyword/value pairs".to_string(),
                actual: format!("{} arguments", args.len()),
            });
        }

        args.chunks(2)
            .map(|pair| {
                Ok((
                    pair[0].expect_keyword()?.to_string(),
                    pair[1].clone(),
                ))
            })
            .collect::<EResult<Mapping>>()
            .map(Var::from)
    }
}

/*********\
|* Merge *|
\*********/
/// `(merge m1 m2 ...)`: key-overwrite merge, the later argument wins.
/// Merging into a record keeps the record's type.
pub(super) struct MergeFnBuilder {}
impl BuiltinFnBuilder for MergeFnBuilder {
    fn names() -> Vec<&'static str> {
        vec!["merge"]
    }

    fn arguments() -> Vec<&'static str> {
        vec!["maps"]
    }

    fn arity() -> Arity {
        Arity::Variadic
    }

    fn eval(args: &SExpr) -> EResult<Var> {
        let Some((base, rest)) = args.split_first() else {
            return Ok(Mapping::new().into());
        };

        let overlays = rest
            .iter()
            .map(fields_of)
            .collect::<EResult<Vec<&Mapping>>>()?;

        match base.as_ref() {
            Expr::Record(record) => {
                let merged = overlays
                    .into_iter()
                    .flatten()
                    .fold(record.clone(), |acc, (k, v)| {
                        acc.with_field(k, v.clone())
                    });
                Ok(merged.into())
            },
            _ => {
                let mut merged = fields_of(base)?.clone();
                for (k, v) in overlays.into_iter().flatten() {
                    merged.insert(k.clone(), v.clone());
                }
                Ok(merged.into())
            },
        }
    }
}

fn fields_of(var: &Var) -> EResult<&Mapping> {
    match var.as_ref() {
        Expr::Map(mapping) => Ok(mapping),
        Expr::Record(record) => Ok(record.fields()),
        _ => Err(unsupported("merge", var)),
    }
}

/*******\
|* Get *|
\*******/
pub(super) struct GetFnBuilder {}
impl BuiltinFnBuilder for GetFnBuilder {
    fn names() -> Vec<&'static str> {
        vec!["get"]
    }

    fn arguments() -> Vec<&'static str> {
        vec!["target", "key"]
    }

    fn arity() -> Arity {
        Arity::Fixed(2)
    }

    fn eval(args: &SExpr) -> EResult<Var> {
        lookup_key(&args[0], args[1].expect_keyword()?)
    }
}

/*********\
|* Assoc *|
\*********/
pub(super) struct AssocFnBuilder {}
impl BuiltinFnBuilder for AssocFnBuilder {
    fn names() -> Vec<&'static str> {
        vec!["assoc"]
    }

    fn arguments() -> Vec<&'static str> {
        vec!["target", "key", "value"]
    }

    fn arity() -> Arity {
        Arity::Fixed(3)
    }

    fn eval(args: &SExpr) -> EResult<Var> {
        let target = &args[0];
        let key = args[1].expect_keyword()?;
        let value = args[2].clone();

        match target.as_ref() {
            Expr::Record(record) => Ok(record.with_field(key, value).into()),
            Expr::Map(mapping) => {
                let mut mapping = mapping.clone();
                mapping.insert(key.to_string(), value);
                Ok(mapping.into())
            },
            _ => Err(unsupported("assoc", target)),
        }
    }
}

/**********\
|* Dissoc *|
\**********/
/// Removing a field from a record gives back a plain map
pub(super) struct DissocFnBuilder {}
impl BuiltinFnBuilder for DissocFnBuilder {
    fn names() -> Vec<&'static str> {
        vec!["dissoc"]
    }

    fn arguments() -> Vec<&'static str> {
        vec!["target", "key"]
    }

    fn arity() -> Arity {
        Arity::Fixed(2)
    }

    fn eval(args: &SExpr) -> EResult<Var> {
        let target = &args[0];
        let key = args[1].expect_keyword()?;

        match target.as_ref() {
            Expr::Record(record) => Ok(record.without_field(key).into()),
            Expr::Map(mapping) => {
                let mut mapping = mapping.clone();
                mapping.shift_remove(key);
                Ok(mapping.into())
            },
            _ => Err(unsupported("dissoc", target)),
        }
    }
}

/********\
|* Keys *|
\********/
pub(super) struct KeysFnBuilder {}
impl BuiltinFnBuilder for KeysFnBuilder {
    fn names() -> Vec<&'static str> {
        vec!["keys"]
    }

    fn arguments() -> Vec<&'static str> {
        vec!["target"]
    }

    fn arity() -> Arity {
        Arity::Fixed(1)
    }

    fn eval(args: &SExpr) -> EResult<Var> {
        let target = &args[0];
        let mapping = match target.as_ref() {
            Expr::Record(record) => record.fields(),
            Expr::Map(mapping) => mapping,
            _ => return Err(unsupported("keys", target)),
        };

        Ok(mapping
            .keys()
            .map(|k| Expr::Keyword(k.clone()).new_var())
            .collect::<OwnedSExpr>()
            .into())
    }
}

/******************\
|* Named fields   *|
\******************/
/// `(field target :name)`: direct named access, for records and compounds
pub(super) struct FieldFnBuilder {}
impl BuiltinFnBuilder for FieldFnBuilder {
    fn names() -> Vec<&'static str> {
        vec!["field"]
    }

    fn arguments() -> Vec<&'static str> {
        vec!["target", "name"]
    }

    fn arity() -> Arity {
        Arity::Fixed(2)
    }

    fn eval(args: &SExpr) -> EResult<Var> {
        let target = &args[0];
        let name = args[1].expect_keyword()?;

        match target.as_ref() {
            Expr::Record(record) => record.field(name).cloned(),
            Expr::Compound(compound) => compound.field(name),
            _ => Err(unsupported("named field access", target)),
        }
    }
}

/// `(set-field! target :name value)`: in-place update, compounds only
pub(super) struct SetFieldFnBuilder {}
impl BuiltinFnBuilder for SetFieldFnBuilder {
    fn names() -> Vec<&'static str> {
        vec!["set-field!"]
    }

    fn arguments() -> Vec<&'static str> {
        vec!["target", "name", "value"]
    }

    fn arity() -> Arity {
        Arity::Fixed(3)
    }

    fn eval(args: &SExpr) -> EResult<Var> {
        let target = &args[0];
        let name = args[1].expect_keyword()?;
        let value = args[2].clone();

        match target.as_ref() {
            Expr::Compound(compound) => {
                compound.set_field(name, value.clone())?;
                Ok(value)
            },
            _ => Err(unsupported("in-place update", target)),
        }
    }
}

/****************\
|* Construction *|
\****************/
/// `(new Type v1 v2 ...)`: positional construction of records and compounds
pub(super) struct NewFnBuilder {}
impl BuiltinFnBuilder for NewFnBuilder {
    fn names() -> Vec<&'static str> {
        vec!["new"]
    }

    fn arguments() -> Vec<&'static str> {
        vec!["type", "values"]
    }

    fn arity() -> Arity {
        Arity::Variadic
    }

    fn eval(args: &SExpr) -> EResult<Var> {
        let Some((ty, values)) = args.split_first() else {
            return Err(EvalError::Arity {
                name: "new".to_string(),
                arity: 1,
                num_args_provided: 0,
            });
        };
        let info = ty.expect_type()?;

        match info.kind {
            TypeKind::Record => Ok(Record::positional(info, values)?.into()),
            TypeKind::Compound => Ok(Compound::new(info, values)?.into()),
            _ => {
                Err(EvalError::Unsupported {
                    operation: "new".to_string(),
                    type_name: info.name.clone(),
                })
            },
        }
    }
}

/// `(from-map Type m)`: mapping construction. Records only; compounds
/// deliberately have no mapping constructor.
pub(super) struct FromMapFnBuilder {}
impl BuiltinFnBuilder for FromMapFnBuilder {
    fn names() -> Vec<&'static str> {
        vec!["from-map"]
    }

    fn arguments() -> Vec<&'static str> {
        vec!["type", "mapping"]
    }

    fn arity() -> Arity {
        Arity::Fixed(2)
    }

    fn eval(args: &SExpr) -> EResult<Var> {
        let info = args[0].expect_type()?;
        if info.kind != TypeKind::Record {
            return Err(EvalError::Unsupported {
                operation: "construction from a map".to_string(),
                type_name: info.name.clone(),
            });
        }
        let mapping = args[1].expect_map()?;
        Ok(Record::from_mapping(info, mapping)?.into())
    }
}

/*********\
|* Types *|
\*********/
pub(super) struct InstanceFnBuilder {}
impl BuiltinFnBuilder for InstanceFnBuilder {
    fn names() -> Vec<&'static str> {
        vec!["instance?"]
    }

    fn arguments() -> Vec<&'static str> {
        vec!["type", "val"]
    }

    fn arity() -> Arity {
        Arity::Fixed(2)
    }

    fn eval(args: &SExpr) -> EResult<Var> {
        let info = args[0].expect_type()?;
        Ok(Value::Bool(*info == args[1].type_info()).into())
    }
}

pub(super) struct TypeOfFnBuilder {}
impl BuiltinFnBuilder for TypeOfFnBuilder {
    fn names() -> Vec<&'static str> {
        vec!["type-of", "type"]
    }

    fn arguments() -> Vec<&'static str> {
        vec!["val"]
    }

    fn arity() -> Arity {
        Arity::Fixed(1)
    }

    fn eval(args: &SExpr) -> EResult<Var> {
        Ok(Expr::Type(args[0].type_info()).into())
    }
}
