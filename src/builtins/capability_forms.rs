//! Special forms for capabilities: declaring them, binding implementations
//! to types after the fact, one-off anonymous implementations, and queries.
//!
//! These are special forms rather than functions because they need the
//! session's registry, which only the scope can reach.

use std::sync::Arc;

use super::special_forms::{BuiltinSpecialBuilder, LambdaFormBuilder};
use crate::ast::{
    Arity, CallForm, CapabilityError, Expr, Function, OwnedSExpr, SExpr,
    TypeInfo, Value, Var,
};
use crate::capabilities::{Capability, ImplMap, OperationSig};
use crate::{eval, EResult, EvalError, Scope};

fn eval_all(args: &SExpr, scope: &mut Scope) -> EResult<OwnedSExpr> {
    args.iter()
        .map(|arg| eval(arg, scope))
        .collect()
}

/// Plain argument capture, for forms that evaluate all their arguments
fn bind_all(
    args: &SExpr,
    scope: &Scope,
    capture_scope: &mut Scope,
) -> EResult<()> {
    for arg in args {
        eval::bind_outer_scope(arg, scope, capture_scope)?;
    }
    Ok(())
}

/// Check an implementation against the operation it claims to implement
fn check_implementation(
    capability: &Capability,
    operation: &str,
    implementation: &Var,
) -> EResult<()> {
    let sig = capability
        .operation(operation)
        .ok_or_else(|| CapabilityError::UnknownOperation {
            capability: capability.name.clone(),
            operation: operation.to_string(),
        })?;

    let func = implementation.expect_fn()?;
    match func.arity {
        Arity::Fixed(n) if n != sig.arity => {
            Err(EvalError::Arity {
                name: format!("{}/{}", capability.name, operation),
                arity: sig.arity,
                num_args_provided: n,
            })
        },
        _ => Ok(()),
    }
}

/********************************\
|* Inline implementation groups *|
\********************************/
/// Parse and build implementation groups of the form
/// `Capability (op (this ...) body) (op2 ...) OtherCapability (...)`.
///
/// Capability positions are evaluated; each method becomes a closure over
/// `scope`. The result is ready for `register_batch`.
pub(super) fn build_impl_groups(
    groups: &SExpr,
    scope: &mut Scope,
) -> EResult<Vec<(String, ImplMap<Var>)>> {
    let mut entries: Vec<(Arc<Capability>, ImplMap<Var>)> =
        Vec::new();

    for item in groups {
        match item.as_ref() {
            Expr::SExpr(method) => {
                let Some((capability, operations)) = entries.last_mut() else {
                    return Err(EvalError::Syntax {
                        expected: "a capability before its methods".to_string(),
                        actual: item.repr(),
                    });
                };
                let (name, implementation) =
                    build_method(&capability.name, method, scope)?;
                check_implementation(capability, &name, &implementation)?;
                operations.insert(name, implementation);
            },
            _ => {
                let capability = eval(item, scope)?
                    .expect_capability()?
                    .clone();
                entries.push((capability, ImplMap::new()));
            },
        }
    }

    Ok(entries
        .into_iter()
        .map(|(capability, operations)| {
            (capability.name.clone(), operations)
        })
        .collect())
}

/// `(op (this ...) body)` -> the operation name and its closure
fn build_method(
    capability: &str,
    method: &SExpr,
    scope: &Scope,
) -> EResult<(String, Var)> {
    let [name, params, body] = method else {
        return Err(EvalError::Syntax {
            expected: "(operation (args ...) body)".to_string(),
            actual: format!("{} elements", method.len()),
        });
    };
    let name = name.expect_symbol()?;
    let implementation = LambdaFormBuilder::build_function(
        format!("{capability}/{name}"),
        &[params.clone(), body.clone()],
        scope,
    )?;
    Ok((name.to_string(), implementation))
}

/// Capture counterpart of `build_impl_groups`
pub(super) fn bind_impl_groups(
    groups: &SExpr,
    scope: &Scope,
    capture_scope: &mut Scope,
) -> EResult<()> {
    for item in groups {
        match item.as_ref() {
            Expr::SExpr(method) if method.len() == 3 => {
                LambdaFormBuilder::bind_outer_scope(
                    &method[1..],
                    scope,
                    capture_scope,
                )?
            },
            Expr::SExpr(_) => {},
            _ => eval::bind_outer_scope(item, scope, capture_scope)?,
        }
    }
    Ok(())
}

/*********************************\
|* "defprotocol" special form    *|
\*********************************/
/// `(defprotocol Show (show (this)) (describe (this other)))`
///
/// Declares the capability, binds its name to it, and binds each operation
/// name to a function that dispatches on the type of its first argument.
pub(super) struct DefProtocolFormBuilder;

impl DefProtocolFormBuilder {
    fn signature(op: &Var) -> EResult<OperationSig> {
        let [name, params] = op.expect_sexp()? else {
            return Err(EvalError::Syntax {
                expected: "(operation (this ...))".to_string(),
                actual: op.repr(),
            });
        };
        let argnames = LambdaFormBuilder::get_argnames(params)?;
        if argnames.is_empty() {
            return Err(EvalError::Syntax {
                expected: "at least one argument (the receiver)".to_string(),
                actual: params.repr(),
            });
        }
        Ok(OperationSig::new(name.expect_symbol()?, argnames.len()))
    }
}

impl BuiltinSpecialBuilder for DefProtocolFormBuilder {
    fn names() -> Vec<&'static str> {
        vec!["defprotocol"]
    }

    fn arity() -> Arity {
        Arity::Variadic
    }

    fn eval(args: &SExpr, scope: &mut Scope) -> EResult<Var> {
        let Some((name, ops)) = args.split_first() else {
            return Err(EvalError::Arity {
                name: "defprotocol".to_string(),
                arity: 1,
                num_args_provided: 0,
            });
        };
        let name = name.expect_symbol()?;
        let operations = ops
            .iter()
            .map(Self::signature)
            .collect::<EResult<Vec<_>>>()?;

        let capability = scope
            .session()
            .registry()?
            .declare(Capability::new(name, operations))?;
        let session = scope.session().downgrade();

        for op in &capability.operations {
            let func = Function {
                name: op.name.clone(),
                arity: Arity::Fixed(op.arity),
                arguments: (0..op.arity)
                    .map(|i| format!("arg{i}"))
                    .collect(),
                form: CallForm::Dispatch {
                    capability: capability.name.clone(),
                    operation: op.name.clone(),
                    session: session.clone(),
                },
            };
            scope.set(&op.name, func.into());
        }

        let capability: Var = Expr::Capability(capability).into();
        scope.set(name, capability.clone());
        Ok(capability)
    }

    /// The protocol and its operations are defined in place
    fn bind_outer_scope(
        args: &SExpr,
        _scope: &Scope,
        capture_scope: &mut Scope,
    ) -> EResult<()> {
        let Some((name, ops)) = args.split_first() else {
            return Ok(());
        };
        let mut defined = vec![name];
        for op in ops {
            if let Some(op_name) = op.expect_sexp()?.first() {
                defined.push(op_name);
            }
        }
        for symbol in defined {
            let name = symbol.expect_symbol()?;
            if !capture_scope.has(name) {
                capture_scope.set(name, symbol.clone());
            }
        }
        Ok(())
    }
}

/*********************************\
|* "extend-type" special form    *|
\*********************************/
/// `(extend-type Type Capability (op (this) body) ... Capability2 ...)`
///
/// Binds implementations of one or more capabilities to an existing type,
/// built-in types included. All groups are registered together or not at all.
pub(super) struct ExtendTypeFormBuilder;
impl BuiltinSpecialBuilder for ExtendTypeFormBuilder {
    fn names() -> Vec<&'static str> {
        vec!["extend-type"]
    }

    fn arity() -> Arity {
        Arity::Variadic
    }

    fn eval(args: &SExpr, scope: &mut Scope) -> EResult<Var> {
        let Some((ty, groups)) = args.split_first() else {
            return Err(EvalError::Arity {
                name: "extend-type".to_string(),
                arity: 1,
                num_args_provided: 0,
            });
        };
        let ty = eval(ty, scope)?;
        let info = ty.expect_type()?;

        let entries = build_impl_groups(groups, scope)?;
        scope
            .session()
            .registry()?
            .register_batch(info, entries)?;
        Ok(ty)
    }

    fn bind_outer_scope(
        args: &SExpr,
        scope: &Scope,
        capture_scope: &mut Scope,
    ) -> EResult<()> {
        if let Some((ty, groups)) = args.split_first() {
            eval::bind_outer_scope(ty, scope, capture_scope)?;
            bind_impl_groups(groups, scope, capture_scope)?;
        }
        Ok(())
    }
}

/*********************************\
|* "extend" special form         *|
\*********************************/
/// `(extend Type Capability impl-map Capability2 impl-map2 ...)`
///
/// The functional counterpart of `extend-type`: every argument is evaluated,
/// and the implementation maps are plain maps from keyword to function, so
/// they can be built, shared and `merge`d like any other map.
pub(super) struct ExtendFormBuilder;
impl BuiltinSpecialBuilder for ExtendFormBuilder {
    fn names() -> Vec<&'static str> {
        vec!["extend"]
    }

    fn arity() -> Arity {
        Arity::Variadic
    }

    fn eval(args: &SExpr, scope: &mut Scope) -> EResult<Var> {
        let args = eval_all(args, scope)?;
        let Some((ty, pairs)) = args.split_first() else {
            return Err(EvalError::Arity {
                name: "extend".to_string(),
                arity: 1,
                num_args_provided: 0,
            });
        };
        let info = ty.expect_type()?;

        if pairs.len() % 2 != 0 {
            return Err(EvalError::Syntax {
                expected: "capability/implementation-map pairs".to_string(),
                actual: format!("{} arguments", pairs.len()),
            });
        }

        let entries = pairs
            .chunks(2)
            .map(|pair| -> EResult<(String, ImplMap<Var>)> {
                let capability = pair[0].expect_capability()?;
                let operations = pair[1].expect_map()?;
                for (operation, implementation) in operations {
                    check_implementation(capability, operation, implementation)?;
                }
                Ok((capability.name.clone(), operations.clone()))
            })
            .collect::<EResult<Vec<_>>>()?;

        scope
            .session()
            .registry()?
            .register_batch(info, entries)?;
        Ok(ty.clone())
    }

    fn bind_outer_scope(
        args: &SExpr,
        scope: &Scope,
        capture_scope: &mut Scope,
    ) -> EResult<()> {
        bind_all(args, scope, capture_scope)
    }
}

/*********************************\
|* "reify" special form          *|
\*********************************/
/// `(reify Capability (op (this) body) ...)`
///
/// A one-off value implementing a single capability. The implementation
/// belongs to the value alone: nothing is registered, so no other value (not
/// even another `reify` of the same capability) can see it.
pub(super) struct ReifyFormBuilder;
impl BuiltinSpecialBuilder for ReifyFormBuilder {
    fn names() -> Vec<&'static str> {
        vec!["reify"]
    }

    fn arity() -> Arity {
        Arity::Variadic
    }

    fn eval(args: &SExpr, scope: &mut Scope) -> EResult<Var> {
        let mut entries = build_impl_groups(args, scope)?;
        let (capability, operations) = match entries.len() {
            1 => entries.remove(0),
            n => {
                return Err(EvalError::Syntax {
                    expected: "exactly one capability".to_string(),
                    actual: format!("{n} capabilities"),
                })
            },
        };

        let reified = scope
            .session()
            .registry()?
            .create_anonymous(&capability, operations)?;
        Ok(Expr::Reified(reified).into())
    }

    fn bind_outer_scope(
        args: &SExpr,
        scope: &Scope,
        capture_scope: &mut Scope,
    ) -> EResult<()> {
        bind_impl_groups(args, scope, capture_scope)
    }
}

/*********************************\
|* Queries                       *|
\*********************************/
/// `(satisfies? Capability value)`: can `value` be passed to the capability's
/// operations?
pub(super) struct SatisfiesFormBuilder;
impl BuiltinSpecialBuilder for SatisfiesFormBuilder {
    fn names() -> Vec<&'static str> {
        vec!["satisfies?"]
    }

    fn arity() -> Arity {
        Arity::Fixed(2)
    }

    fn eval(args: &SExpr, scope: &mut Scope) -> EResult<Var> {
        let args = eval_all(args, scope)?;
        let capability = args[0].expect_capability()?;
        let satisfied = scope
            .session()
            .registry()?
            .satisfies(&capability.name, &args[1]);
        Ok(Value::Bool(satisfied).into())
    }

    fn bind_outer_scope(
        args: &SExpr,
        scope: &Scope,
        capture_scope: &mut Scope,
    ) -> EResult<()> {
        bind_all(args, scope, capture_scope)
    }
}

/// `(extends? Capability Type)`: has the capability been bound to the type?
pub(super) struct ExtendsFormBuilder;
impl BuiltinSpecialBuilder for ExtendsFormBuilder {
    fn names() -> Vec<&'static str> {
        vec!["extends?"]
    }

    fn arity() -> Arity {
        Arity::Fixed(2)
    }

    fn eval(args: &SExpr, scope: &mut Scope) -> EResult<Var> {
        let args = eval_all(args, scope)?;
        let capability = args[0].expect_capability()?;
        let info: &TypeInfo = args[1].expect_type()?;
        let extended = scope
            .session()
            .registry()?
            .implements(&capability.name, info.tag);
        Ok(Value::Bool(extended).into())
    }

    fn bind_outer_scope(
        args: &SExpr,
        scope: &Scope,
        capture_scope: &mut Scope,
    ) -> EResult<()> {
        bind_all(args, scope, capture_scope)
    }
}

/// `(extenders Capability)`: names of every type the capability is bound to
pub(super) struct ExtendersFormBuilder;
impl BuiltinSpecialBuilder for ExtendersFormBuilder {
    fn names() -> Vec<&'static str> {
        vec!["extenders"]
    }

    fn arity() -> Arity {
        Arity::Fixed(1)
    }

    fn eval(args: &SExpr, scope: &mut Scope) -> EResult<Var> {
        let capability = eval(&args[0], scope)?;
        let capability = capability.expect_capability()?;
        Ok(scope
            .session()
            .registry()?
            .implementors(&capability.name)
            .into_iter()
            .map(|name| Value::Str(name).into())
            .collect::<OwnedSExpr>()
            .into())
    }

    fn bind_outer_scope(
        args: &SExpr,
        scope: &Scope,
        capture_scope: &mut Scope,
    ) -> EResult<()> {
        bind_all(args, scope, capture_scope)
    }
}
