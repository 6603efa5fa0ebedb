//! `defrecord` and `deftype`: declare a new type, bind its name, and
//! optionally implement capabilities inline.
//!
//! Inline implementations go through the same registry as `extend-type`;
//! a type gets no special treatment for having been implemented at
//! definition time.

use itertools::Itertools;

use super::capability_forms::{bind_impl_groups, build_impl_groups};
use super::special_forms::{BuiltinSpecialBuilder, LambdaFormBuilder};
use crate::ast::{Arity, Expr, SExpr, TypeInfo, TypeKind, TypeRef, Var};
use crate::{EResult, EvalError, Scope};

/// `(def<kind> Name (field ...) Capability (op (this) body) ...)`
fn define_type(
    form: &str,
    kind: TypeKind,
    args: &SExpr,
    scope: &mut Scope,
) -> EResult<Var> {
    let [name, fields, groups @ ..] = args else {
        return Err(EvalError::Arity {
            name: form.to_string(),
            arity: 2,
            num_args_provided: args.len(),
        });
    };
    let name = name.expect_symbol()?;
    let fields = LambdaFormBuilder::get_argnames(fields)?;
    if let Some(field) = fields.iter().duplicates().next() {
        return Err(EvalError::Syntax {
            expected: "distinct field names".to_string(),
            actual: format!("'{field}' declared twice"),
        });
    }

    // the type this name used to denote can no longer be named
    if let Some(previous) = declared_here(scope, name) {
        scope
            .session()
            .registry()?
            .retire(previous.tag);
    }

    let info = TypeInfo::declare(name, kind, fields);
    tracing::debug!(type_name = %info.name, ?kind, "declared type");

    // bound first, so method bodies can refer to the type
    let ty: Var = Expr::Type(info.clone()).into();
    scope.set(name, ty.clone());

    if !groups.is_empty() {
        let entries = build_impl_groups(groups, scope)?;
        scope
            .session()
            .registry()?
            .register_batch(&info, entries)?;
    }
    Ok(ty)
}

/// A record or compound type bound to `name` in this very scope
fn declared_here(scope: &Scope, name: &str) -> Option<TypeRef> {
    if !scope.has(name) {
        return None;
    }
    match scope.lookup(name)?.as_ref() {
        Expr::Type(info) if info.kind != TypeKind::Builtin => Some(info.clone()),
        _ => None,
    }
}

fn bind_type_definition(
    args: &SExpr,
    scope: &Scope,
    capture_scope: &mut Scope,
) -> EResult<()> {
    let [name, _fields, groups @ ..] = args else {
        return Ok(());
    };

    let mut child_outer = scope.child();
    let name_str = name.expect_symbol()?;
    child_outer.set(name_str, name.clone());
    bind_impl_groups(groups, &child_outer, capture_scope)?;

    if !capture_scope.has(name_str) {
        capture_scope.set(name_str, name.clone());
    }
    Ok(())
}

/******************************\
|* "defrecord" special form   *|
\******************************/
/// `(defrecord Person (name age))`: a structural record type.
/// Instances are built with `new` or `from-map`.
pub(super) struct DefRecordFormBuilder;
impl BuiltinSpecialBuilder for DefRecordFormBuilder {
    fn names() -> Vec<&'static str> {
        vec!["defrecord"]
    }

    fn arity() -> Arity {
        Arity::Variadic
    }

    fn eval(args: &SExpr, scope: &mut Scope) -> EResult<Var> {
        define_type("defrecord", TypeKind::Record, args, scope)
    }

    fn bind_outer_scope(
        args: &SExpr,
        scope: &Scope,
        capture_scope: &mut Scope,
    ) -> EResult<()> {
        bind_type_definition(args, scope, capture_scope)
    }
}

/******************************\
|* "deftype" special form     *|
\******************************/
/// `(deftype Point (x y))`: an opaque compound type.
/// Instances are built with `new` only, and fields are reached by name.
pub(super) struct DefTypeFormBuilder;
impl BuiltinSpecialBuilder for DefTypeFormBuilder {
    fn names() -> Vec<&'static str> {
        vec!["deftype"]
    }

    fn arity() -> Arity {
        Arity::Variadic
    }

    fn eval(args: &SExpr, scope: &mut Scope) -> EResult<Var> {
        define_type("deftype", TypeKind::Compound, args, scope)
    }

    fn bind_outer_scope(
        args: &SExpr,
        scope: &Scope,
        capture_scope: &mut Scope,
    ) -> EResult<()> {
        bind_type_definition(args, scope, capture_scope)
    }
}
