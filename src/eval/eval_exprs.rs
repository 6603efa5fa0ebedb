use crate::ast::errors::{EResult, EvalError};
use crate::ast::{CallForm, Expr, Function, OwnedSExpr, SExpr, Var};
use crate::eval::{invoke, lookup_key};
use crate::scope::Scope;

/// Evaluate an expression. Handles a few cases:
/// 1) If it's an s-expression, it's evaluated (see eval_sexpr, below);
/// 2) if it's a symbol, it's retrieved from the current scope;
/// 3) all other expression types are returned unchanged.
///
/// Note that `eval_sexpr` usually needs to evaluate its arguments,
/// which means it will need to recursively call this function.
pub fn eval(var: &Var, scope: &mut Scope) -> EResult<Var> {
    match var.as_ref() {
        Expr::SExpr(sexpr) => eval_sexpr(sexpr, scope),
        Expr::Symbol(name) => scope.lookup_or_error(name),
        _ => Ok(var.clone()), // clones the Rc, not the value
    }
}

/// Evaluate an s-expression.
/// Handles 5 cases based on evaluating the first element of the list:
/// 1) an empty s-expression is returned unchanged;
/// 2) a special form is called with all arguments as-is (unevaluated), and
///    provided with a mutable reference to the scope;
/// 3) a function is called on its evaluated arguments (see eval_function);
/// 4) a keyword looks itself up in its (evaluated) single argument;
/// 5) everything else is a runtime error
pub fn eval_sexpr(sexpr: &SExpr, scope: &mut Scope) -> EResult<Var> {
    let Some((head_expr, tail)) = sexpr.split_first() else {
        return Ok(Expr::empty().new_var());
    };

    // evaluate head
    let head = eval(head_expr, scope)?;

    // evaluate entire s-expression
    match head.as_ref() {
        Expr::Special(special) => {
            special
                .arity
                .check(&special.name, tail.len())?;
            (special.eval)(tail, scope)
        },
        Expr::Function(func) => eval_function(func, tail, scope),
        Expr::Keyword(key) => {
            let args = eval_args(tail, scope)?;
            let [target] = args.as_slice() else {
                return Err(EvalError::Arity {
                    name: format!(":{key}"),
                    arity: 1,
                    num_args_provided: args.len(),
                });
            };
            lookup_key(target, key)
        },
        _ => Err(EvalError::NotCallable(head.repr())),
    }
}

/// Evaluate a function call by first evaluating all arguments, then
/// sending the array of evaluated arguments to the function.
///
/// Note that, unlike special forms, functions don't have any access to the
/// scope. Of course scope will be accessed while evaluating the arguments,
/// including special forms that may potentially modify it.
fn eval_function(
    func: &Function,
    args: &SExpr,
    scope: &mut Scope,
) -> EResult<Var> {
    func.arity
        .check(&func.name, args.len())?;
    let eval_args = eval_args(args, scope)?;
    call_function(func, &eval_args)
}

fn eval_args(args: &SExpr, scope: &mut Scope) -> EResult<OwnedSExpr> {
    args.iter()
        .map(|e| eval(e, scope))
        .collect::<EResult<OwnedSExpr>>()
}

/// Call a function on already-evaluated arguments
pub fn call_function(func: &Function, args: &SExpr) -> EResult<Var> {
    func.arity
        .check(&func.name, args.len())?;

    match &func.form {
        CallForm::Builtin(f) => f(args),
        CallForm::Lambda { body, scope } => {
            let mut arg_scope = scope.bind_args(&func.arguments, args);
            eval(body, &mut arg_scope)
        },
        CallForm::Dispatch {
            capability,
            operation,
            session,
        } => invoke(&*session.registry()?, capability, operation, args),
    }
}
