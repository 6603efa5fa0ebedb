use crate::ast::{EResult, EvalError, Expr, SExpr, TypeRef, Value, Var};
use crate::capabilities::{Anonymous, CapabilityRegistry, Receiver};
use crate::eval::call_function;

impl Receiver<Var> for Var {
    fn runtime_type(&self) -> TypeRef {
        self.as_ref().type_info()
    }

    fn as_anonymous(&self) -> Option<&Anonymous<Var>> {
        match self.as_ref() {
            Expr::Reified(reified) => Some(reified),
            _ => None,
        }
    }
}

/// Invoke a capability operation: the implementation is chosen by the
/// runtime type of the first argument, then called with all the arguments
/// (the receiver included).
#[tracing::instrument(level = "debug", skip(registry, args))]
pub fn invoke(
    registry: &CapabilityRegistry<Var>,
    capability: &str,
    operation: &str,
    args: &SExpr,
) -> EResult<Var> {
    let Some(this) = args.first() else {
        return Err(EvalError::Arity {
            name: format!("{capability}/{operation}"),
            arity: 1,
            num_args_provided: 0,
        });
    };

    let implementation = registry.dispatch(capability, operation, this)?;
    tracing::trace!(receiver = %this.type_name(), "resolved implementation");
    call_function(implementation.expect_fn()?, args)
}

/// Generic key lookup, as done by `get` and by keywords in call position.
/// Missing keys are nil; types without a mapping view refuse.
pub fn lookup_key(target: &Var, key: &str) -> EResult<Var> {
    match target.as_ref() {
        Expr::Map(mapping) => {
            Ok(mapping
                .get(key)
                .cloned()
                .unwrap_or_else(Var::nil))
        },
        Expr::Record(record) => {
            Ok(record
                .get(key)
                .cloned()
                .unwrap_or_else(Var::nil))
        },
        Expr::Compound(compound) => compound.lookup(key),
        Expr::Value(Value::Nil) => Ok(Var::nil()),
        other => {
            Err(EvalError::Unsupported {
                operation: "generic key lookup".to_string(),
                type_name: other.type_name(),
            })
        },
    }
}
