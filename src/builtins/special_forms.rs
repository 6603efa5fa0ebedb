use std::sync::atomic::{AtomicUsize, Ordering};

use crate::ast::{
    Arity, CallForm, Expr, Function, SExpr, SpecialForm, Value, Var,
};
use crate::{eval, EResult, EvalError, Scope};

/** See also:
  - https://clojure.org/reference/special_forms#var
  - https://docs.racket-lang.org/reference/syntax.html
  - http://www.lispworks.com/documentation/HyperSpec/Body/03_ababa.htm
**/

/// Helper trait for defining built-in special forms.
/// Note: currently we don't instantiate structs for any of these,
/// these traits are just namespaces to group the methods for each form.
pub(super) trait BuiltinSpecialBuilder {
    fn register(scope: &mut Scope) {
        let names = Self::names();
        let form: Var = Expr::Special(SpecialForm {
            name: names[0].to_string(),
            arity: Self::arity(),
            eval: Self::eval,
            bind_outer_scope: Self::bind_outer_scope,
        })
        .new_var();

        names
            .into_iter()
            .for_each(|s| scope.set(s, form.clone()))
    }

    /// the built-in names that refer to this special form
    fn names() -> Vec<&'static str>;

    /// variadic or fixed arity
    fn arity() -> Arity;

    /// called with list of arguments and enclosing scope
    fn eval(sexpr: &SExpr, scope: &mut Scope) -> EResult<Var>;

    /// Builds the scope in which to evaluated this forms' arguments,
    /// if applicable. This is *early* binding - given the outer scope,
    /// it should update the "capture scope" with any values it needs to capture.
    ///
    /// Need not be implemented if not applicable to the special form;
    /// by default is a no-op.
    ///
    ///  # Arguments
    ///  - `args` - input: the form's _un-evaluated_ arguments.
    ///  - `scope` - input: the enclosing scope.
    ///  - `capture_scope` - in/out: the captured scope for evaluating the form's
    ///    arguments
    fn bind_outer_scope(
        _args: &SExpr,
        _scope: &Scope,
        _capture_scope: &mut Scope,
    ) -> EResult<()> {
        Ok(())
    }
}

/******************************\
|* "If" special form impl     *|
\******************************/
pub(super) struct IfFormBuilder;
impl BuiltinSpecialBuilder for IfFormBuilder {
    fn names() -> Vec<&'static str> {
        vec!["if"]
    }

    fn arity() -> Arity {
        Arity::Fixed(3)
    }

    /// Evaluate 1st argument then _either_ the 2nd or 3rd argument, not both.
    /// `nil` counts as false.
    fn eval(args: &SExpr, scope: &mut Scope) -> EResult<Var> {
        let determinant = eval(&args[0], scope)?;
        let result = match determinant.as_ref() {
            Expr::Value(Value::Bool(result)) => *result,
            Expr::Value(Value::Nil) => false,
            other => {
                return Err(EvalError::Type {
                    expected: "Bool".to_string(),
                    actual: other.type_name(),
                })
            },
        };

        let idx: usize = if result { 1 } else { 2 };
        eval(&args[idx], scope)
    }

    /// capture references for all arguments
    fn bind_outer_scope(
        args: &SExpr,
        scope: &Scope,
        capture_scope: &mut Scope,
    ) -> EResult<()> {
        eval::bind_sexpr_outer_scope(args, scope, capture_scope)
    }
}

/******************************\
|* "Do" special form impl     *|
\******************************/
/// Evaluate each argument in order; the last one is the result
pub(super) struct DoFormBuilder;
impl BuiltinSpecialBuilder for DoFormBuilder {
    fn names() -> Vec<&'static str> {
        vec!["do", "progn"]
    }

    fn arity() -> Arity {
        Arity::Variadic
    }

    fn eval(args: &SExpr, scope: &mut Scope) -> EResult<Var> {
        args.iter()
            .try_fold(Var::nil(), |_, arg| eval(arg, scope))
    }

    fn bind_outer_scope(
        args: &SExpr,
        scope: &Scope,
        capture_scope: &mut Scope,
    ) -> EResult<()> {
        for arg in args {
            eval::bind_outer_scope(arg, scope, capture_scope)?;
        }
        Ok(())
    }
}

/******************************\
|* "Quote" special form impl *|
\******************************/
pub(super) struct QuoteFormBuilder;
impl BuiltinSpecialBuilder for QuoteFormBuilder {
    fn names() -> Vec<&'static str> {
        vec!["quote"]
    }

    fn arity() -> Arity {
        Arity::Variadic
    }

    fn eval(args: &SExpr, _scope: &mut Scope) -> EResult<Var> {
        Ok(Expr::SExpr(Vec::from(args)).new_var())
    }
}

/******************************\
|* "defvar" special form impl *|
\******************************/
pub(super) struct DefVarForm;
impl BuiltinSpecialBuilder for DefVarForm {
    fn names() -> Vec<&'static str> {
        vec!["defvar"]
    }

    fn arity() -> Arity {
        Arity::Fixed(2)
    }

    fn eval(args: &SExpr, scope: &mut Scope) -> EResult<Var> {
        let symbol_name = args[0].expect_symbol()?;
        let value = eval(&args[1], scope)?;
        scope.set(symbol_name, value);

        Ok(Expr::empty().new_var())
    }

    fn bind_outer_scope(
        args: &SExpr,
        scope: &Scope,
        capture_scope: &mut Scope,
    ) -> EResult<()> {
        let symbol = &args[0];
        let symbol_name = symbol.expect_symbol()?;

        // capture any variables necessary to evaluate the RHS
        eval::bind_outer_scope(&args[1], scope, capture_scope)?;

        // a name defined inside the closure is not captured from outside
        if !capture_scope.has(symbol_name) {
            capture_scope.set(symbol_name, symbol.clone());
        }
        Ok(())
    }
}

/******************************\
|* "Define" special form impl *|
\******************************/
/// Binds symbols to expressions in the current scope.
/// - If the first argument is a symbol, evaluates the second argument then binds
///   it to the symbol.
/// 2) If the second argument is an S-expr of symbols, it defines a function
///  Specifically, the following two expressions are equivalent:
///     `(define (f a1 a2 ...) (b0 b1 b2 ...))`
///     `(define f (lambda (a1 a2 ...) (b0 b1 b2 ...)))`
///  except that the first form may call itself by name.
pub(super) struct DefineFormBuilder;

impl DefineFormBuilder {
    /// Split `(f a1 a2 ...)` into `f` and the lambda's arguments
    fn split_signature(sexp: &SExpr, body: &Var) -> EResult<(String, [Var; 2])> {
        let Some((name, params)) = sexp.split_first() else {
            return Err(EvalError::Syntax {
                expected: "List of symbols".to_string(),
                actual: "Empty".to_string(),
            });
        };
        let lambda_args = [
            Expr::SExpr(params.to_vec()).new_var(),
            body.clone(),
        ];
        Ok((name.expect_symbol()?.to_string(), lambda_args))
    }
}

impl BuiltinSpecialBuilder for DefineFormBuilder {
    fn names() -> Vec<&'static str> {
        vec!["def", "define"]
    }

    fn arity() -> Arity {
        Arity::Fixed(2)
    }

    fn eval(args: &SExpr, scope: &mut Scope) -> EResult<Var> {
        let lhs = &args[0];

        match lhs.as_ref() {
            // treat as equivalent to DefVar
            Expr::Symbol(_name) => DefVarForm::eval(args, scope),

            // treat as equivalent to (defvar #0 (lambda ...))
            Expr::SExpr(sexp) => {
                let (fn_name, lambda_args) =
                    Self::split_signature(sexp, &args[1])?;
                let form = LambdaFormBuilder::build_recursive_function(
                    &fn_name,
                    &lambda_args,
                    scope,
                )?;

                scope.set(&fn_name, form);
                Ok(Expr::empty().new_var())
            },
            _other => {
                Err(EvalError::Syntax {
                    expected: "S-Expression or Symbol".to_string(),
                    actual: lhs.type_name(),
                })
            },
        }
    }

    fn bind_outer_scope(
        args: &SExpr,
        scope: &Scope,
        capture_scope: &mut Scope,
    ) -> EResult<()> {
        let lhs = &args[0];

        match lhs.as_ref() {
            Expr::Symbol(_name) => {
                DefVarForm::bind_outer_scope(args, scope, capture_scope)
            },
            Expr::SExpr(sexp) => {
                let (fn_name, lambda_args) =
                    Self::split_signature(sexp, &args[1])?;

                let mut child_outer = scope.child();
                child_outer.set(&fn_name, Expr::Symbol(fn_name.clone()).new_var());
                LambdaFormBuilder::bind_outer_scope(
                    &lambda_args,
                    &child_outer,
                    capture_scope,
                )?;

                if !capture_scope.has(&fn_name) {
                    capture_scope.set(&fn_name, Expr::Symbol(fn_name.clone()).new_var());
                }
                Ok(())
            },
            _other => {
                Err(EvalError::Syntax {
                    expected: "S-Expression or Symbol".to_string(),
                    actual: lhs.type_name(),
                })
            },
        }
    }
}

/******************************\
|* "Lambda" special form impl *|
\******************************/
pub(super) struct LambdaFormBuilder;

// a counter for generating unique names for our lambdas
static LAMBDA_COUNTER: AtomicUsize = AtomicUsize::new(0);

impl LambdaFormBuilder {
    /// Given the argument list in a function/lambda declaration,
    /// check that it is in fact a list of symbol names and return them
    pub(super) fn get_argnames(expr: &Expr) -> EResult<Vec<String>> {
        expr.expect_sexp().and_then(|sexpr| {
            sexpr
                .iter()
                .map(|expr| expr.expect_symbol().map(String::from))
                .collect()
        })
    }

    /// Build a closure from `[(args ...) body]`, capturing whatever the body
    /// references from `scope`.
    pub(super) fn build_function(
        name: String,
        sexpr: &SExpr,
        scope: &Scope,
    ) -> EResult<Var> {
        let mut capture_scope = scope.detached();
        Self::bind_outer_scope(sexpr, scope, &mut capture_scope)?;
        Self::finish_function(name, sexpr, capture_scope)
    }

    /// Like `build_function`, but the body may refer to the function itself
    /// by `name`.
    pub(super) fn build_recursive_function(
        name: &str,
        sexpr: &SExpr,
        scope: &Scope,
    ) -> EResult<Var> {
        let mut child_outer = scope.child();
        child_outer.set(name, Expr::Symbol(name.to_string()).new_var());

        let mut capture_scope = scope.detached();
        Self::bind_outer_scope(sexpr, &child_outer, &mut capture_scope)?;

        let form = Self::finish_function(name.to_string(), sexpr, capture_scope.clone())?;
        capture_scope.set(name, form.clone());
        Ok(form)
    }

    fn finish_function(
        name: String,
        sexpr: &SExpr,
        capture_scope: Scope,
    ) -> EResult<Var> {
        let argnames = Self::get_argnames(&sexpr[0])?;
        Ok(Function {
            name,
            arity: Arity::Fixed(argnames.len()),
            arguments: argnames,
            form: CallForm::Lambda {
                body: sexpr[1].clone(),
                scope: capture_scope,
            },
        }
        .into())
    }
}

impl BuiltinSpecialBuilder for LambdaFormBuilder {
    fn names() -> Vec<&'static str> {
        vec!["lambda", "λ", "fn"]
    }

    fn arity() -> Arity {
        Arity::Fixed(2)
    }

    fn eval(sexpr: &SExpr, scope: &mut Scope) -> EResult<Var> {
        let count = LAMBDA_COUNTER.fetch_add(1, Ordering::Relaxed) + 1;
        Self::build_function(format!("λ_{count}"), sexpr, scope)
    }

    /// Capture the outer variables the body needs. Arguments are bound to
    /// themselves first, so they're not looked up outside.
    fn bind_outer_scope(
        sexpr: &SExpr,
        outer_scope: &Scope,
        capture_scope: &mut Scope,
    ) -> EResult<()> {
        let argnames = Self::get_argnames(&sexpr[0])?;

        let mut child_outer = outer_scope.child();
        for name in argnames.into_iter() {
            child_outer.set(&name, Expr::Symbol(name.clone()).new_var())
        }

        eval::bind_outer_scope(&sexpr[1], &child_outer, capture_scope)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn root() -> Scope {
        let mut scope = Scope::new(None);
        LambdaFormBuilder::register(&mut scope);
        DefineFormBuilder::register(&mut scope);
        IfFormBuilder::register(&mut scope);
        DoFormBuilder::register(&mut scope);
        scope
    }

    fn sym(name: &str) -> Var {
        Expr::Symbol(name.to_string()).new_var()
    }

    #[test]
    fn test_lambda_captures_outer_value() {
        let mut scope = root();
        scope.set("x", Value::Int(7).into());

        let args = [Expr::SExpr(vec![sym("y")]).new_var(), sym("x")];
        let func = LambdaFormBuilder::eval(&args, &mut scope).unwrap();
        let func = func.expect_fn().unwrap();

        let CallForm::Lambda { scope: captured, .. } = &func.form else {
            panic!("not a lambda: {func}")
        };
        assert_eq!(captured.lookup("x"), Some(Var::from(Value::Int(7))));
        assert_eq!(captured.lookup("y"), None);
        assert_eq!(captured.session(), scope.session());
    }

    #[test]
    fn test_lambda_names_are_unique() {
        let mut scope = root();
        let args = [Expr::empty().new_var(), Value::Int(1).into()];
        let first = LambdaFormBuilder::eval(&args, &mut scope).unwrap();
        let second = LambdaFormBuilder::eval(&args, &mut scope).unwrap();
        assert_ne!(
            first.expect_fn().unwrap().name,
            second.expect_fn().unwrap().name
        );
    }

    #[test]
    fn test_do_returns_last_value() {
        let mut scope = root();
        let args: [Var; 2] = [Value::Int(1).into(), Value::Int(2).into()];
        let result = DoFormBuilder::eval(&args, &mut scope).unwrap();
        assert_eq!(result, Var::from(Value::Int(2)));

        let result = DoFormBuilder::eval(&[], &mut scope).unwrap();
        assert_eq!(result, Var::nil());
    }

    #[test]
    fn test_if_requires_a_condition() {
        let mut scope = root();
        let args: [Var; 3] = [
            Value::Int(0).into(),
            Value::Int(1).into(),
            Value::Int(2).into(),
        ];
        assert!(matches!(
            IfFormBuilder::eval(&args, &mut scope),
            Err(EvalError::Type { .. })
        ));
    }
}
