use crate::ast::{Expr, SExpr, Var};
use crate::{EResult, Scope};

/// Lexical symbol binding for closures
/// - i.e., captures variables from the enclosing scope.
///
/// This will be kicked off by anything that defines a closure
/// (`lambda` / `define` / method bodies in `extend-type` and `reify`).
pub fn bind_outer_scope(
    var: &Var,
    outer_scope: &Scope,
    capture_scope: &mut Scope,
) -> EResult<()> {
    match var.as_ref() {
        Expr::SExpr(sexpr) => {
            bind_sexpr_outer_scope(sexpr, outer_scope, capture_scope)
        },
        Expr::Symbol(_) => {
            capture_symbol_reference(var, outer_scope, capture_scope)
        },
        _ => Ok(()),
    }
}

/// Same as `bind_outer_scope`, for an s-expression that's already unwrapped
pub fn bind_sexpr_outer_scope(
    sexpr: &SExpr,
    outer_scope: &Scope,
    capture_scope: &mut Scope,
) -> EResult<()> {
    if let Some((special_var, maybe_name)) = is_special(sexpr, outer_scope) {
        let special = special_var.expect_special()?;

        if let Some(name) = maybe_name {
            capture_scope.set(&name, special_var.clone())
        }

        // if s-expr is a special form, delegate to its bind_outer_scope method
        (special.bind_outer_scope)(&sexpr[1..], outer_scope, capture_scope)
    } else {
        // capture references for each element
        for var in sexpr.iter() {
            bind_outer_scope(var, outer_scope, capture_scope)?;
        }
        Ok(())
    }
}

/// Capture a not-yet defined symbol from the outer scope,
/// unless it will be provided as an argument.
///
/// Symbols that will be provided as arguments are marked by binding them
/// to themselves in the outer scope, so they're skipped here.
fn capture_symbol_reference(
    symbol: &Var,
    outer_scope: &Scope,
    capture_scope: &mut Scope,
) -> EResult<()> {
    let name = symbol.expect_symbol()?;
    if !capture_scope.has(name) {
        let outer_val = outer_scope.lookup_or_error(name)?;

        // don't capture it if it's tautological
        if &outer_val == symbol {
            return Ok(());
        }

        // otherwise add it to our collection of captured variables
        capture_scope.set(name, outer_val)
    }
    Ok(())
}

/// check if an s-expression is a call to a special form.
/// If so, return the form, and, if necessary, the symbol to bind the form to.
///
/// Note that this takes advantage of the syntax rule that `Expr::Special` may
/// not be aliased or shadowed, or returned from functions;
/// thus, even at this lexical analysis stage, we know what is
/// and isn't a special form.
fn is_special(sexpr: &SExpr, scope: &Scope) -> Option<(Var, Option<String>)> {
    // Get first expression in the sexpr
    let var = sexpr.first()?;

    match var.as_ref() {
        // this is an "anonymous" (for our purposes) special form, stop here
        Expr::Special(..) => Some((var.clone(), None)),
        Expr::Symbol(s) => {
            let outer_val = scope.lookup(s)?;
            if let Expr::Special(..) = outer_val.as_ref() {
                Some((outer_val, Some(s.clone())))
            } else {
                None
            }
        },
        // it's not a Special or a Symbol, so this is not a special form
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::Value;

    #[test]
    fn test_captures_free_symbols_only() {
        let mut outer = Scope::new(None);
        outer.set("x", Value::Int(1).into());
        outer.set("y", Value::Int(2).into());
        // `y` is an argument: it's bound to itself
        outer.set("y", Expr::Symbol("y".to_string()).new_var());

        let body: Var = Expr::SExpr(vec![
            Expr::Symbol("x".to_string()).new_var(),
            Expr::Symbol("y".to_string()).new_var(),
        ])
        .new_var();

        let mut capture = outer.detached();
        bind_outer_scope(&body, &outer, &mut capture).unwrap();
        assert!(capture.has("x"));
        assert!(!capture.has("y"));
    }

    #[test]
    fn test_unknown_symbols_fail_early() {
        let outer = Scope::new(None);
        let body = Expr::Symbol("nowhere".to_string()).new_var();
        let mut capture = outer.detached();
        assert!(bind_outer_scope(&body, &outer, &mut capture).is_err());
    }
}
