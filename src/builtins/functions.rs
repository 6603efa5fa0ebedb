use crate::ast::{
    Arity, CallForm, Expr, Function, InternalError, OwnedSExpr, SExpr, Value,
    Var,
};
use crate::{call_function, EResult, EvalError, Scope};

pub(super) trait BuiltinFnBuilder {
    fn register(scope: &mut Scope) {
        let names = Self::names();
        let form: Var = Expr::Function(Function {
            name: names[0].to_string(),
            arity: Self::arity(),
            arguments: Self::arguments()
                .into_iter()
                .map(|s| s.to_string())
                .collect(),
            form: CallForm::Builtin(Self::eval),
        })
        .into();

        names
            .into_iter()
            .for_each(|s| scope.set(s, form.clone()))
    }

    /// names to bind to this function; the first is its canonical name
    fn names() -> Vec<&'static str>;

    /// names of the function's arguments
    fn arguments() -> Vec<&'static str>;

    /// variadic or fixed function arity
    fn arity() -> Arity;

    /// Callback to evaluate a call to the function.
    /// Will be be passed an s-exp of its arguments' values.
    /// Arity has already been checked when this is called.
    fn eval(sexpr: &SExpr) -> EResult<Var>;
}

/************\
|* Identity *|
\************/

/// Note identity function is NOT the same as quote!
///  - Identity is a *function*, so the arguments are evaluated
///  - Quote is a special form, the arguments are not eval'd
pub(super) struct IdentityFnBuilder {}
impl BuiltinFnBuilder for IdentityFnBuilder {
    fn names() -> Vec<&'static str> {
        vec!["I", "echo"]
    }

    fn arguments() -> Vec<&'static str> {
        vec!["s"]
    }

    fn arity() -> Arity {
        Arity::Fixed(1)
    }

    fn eval(args: &SExpr) -> EResult<Var> {
        Ok(args[0].clone())
    }
}

/*********\
|* Print *|
\*********/
pub(super) struct PrintFnBuilder {}
impl BuiltinFnBuilder for PrintFnBuilder {
    fn names() -> Vec<&'static str> {
        vec!["print", "println"]
    }

    fn arguments() -> Vec<&'static str> {
        vec!["s"]
    }

    fn arity() -> Arity {
        Arity::Fixed(1)
    }

    fn eval(args: &SExpr) -> EResult<Var> {
        println!("{}", args[0]);
        Ok(Var::nil())
    }
}

/***********\
|* Strings *|
\***********/
/// Concatenate the display form of every argument
pub(super) struct StrFnBuilder {}
impl BuiltinFnBuilder for StrFnBuilder {
    fn names() -> Vec<&'static str> {
        vec!["str"]
    }

    fn arguments() -> Vec<&'static str> {
        vec!["vals"]
    }

    fn arity() -> Arity {
        Arity::Variadic
    }

    fn eval(args: &SExpr) -> EResult<Var> {
        let s: String = args
            .iter()
            .map(|v| v.to_string())
            .collect();
        Ok(Value::Str(s).into())
    }
}

/// Content hash of a plain value
pub(super) struct HashFnBuilder {}
impl BuiltinFnBuilder for HashFnBuilder {
    fn names() -> Vec<&'static str> {
        vec!["hash"]
    }

    fn arguments() -> Vec<&'static str> {
        vec!["val"]
    }

    fn arity() -> Arity {
        Arity::Fixed(1)
    }

    fn eval(args: &SExpr) -> EResult<Var> {
        let val: &Value = args[0].as_ref().try_into()?;
        Ok(Value::Int(val.hash_code()).into())
    }
}

/*******\
|* Len *|
\*******/
pub(super) struct LenFnBuilder {}
impl BuiltinFnBuilder for LenFnBuilder {
    fn names() -> Vec<&'static str> {
        vec!["len", "count"]
    }

    fn arguments() -> Vec<&'static str> {
        vec!["coll"]
    }

    fn arity() -> Arity {
        Arity::Fixed(1)
    }

    fn eval(args: &SExpr) -> EResult<Var> {
        let len = match args[0].as_ref() {
            Expr::SExpr(sexpr) => sexpr.len(),
            Expr::Map(mapping) => mapping.len(),
            Expr::Record(record) => record.fields().len(),
            Expr::Value(Value::Str(s)) => s.chars().count(),
            other => {
                return Err(EvalError::Type {
                    expected: "List, Map, Record or String".to_string(),
                    actual: other.type_name(),
                })
            },
        };

        // PANIC: Theoretically could panic if length is too big for isize
        Ok(Value::Int(len as isize).into())
    }
}

/*********\
|* First *|
\*********/
pub(super) struct FirstFnBuilder {}
impl BuiltinFnBuilder for FirstFnBuilder {
    fn names() -> Vec<&'static str> {
        vec!["first", "car"]
    }

    fn arguments() -> Vec<&'static str> {
        vec!["s-exp"]
    }

    fn arity() -> Arity {
        Arity::Fixed(1)
    }

    fn eval(args: &SExpr) -> EResult<Var> {
        let arg = args[0].expect_sexp()?;

        if let Some(first_el) = arg.first() {
            Ok(first_el.clone())
        } else {
            Ok(Expr::empty().into())
        }
    }
}

/*****************\
|* Concatenation *|
\*****************/
pub(super) struct ConcatFnBuilder {}
impl BuiltinFnBuilder for ConcatFnBuilder {
    fn names() -> Vec<&'static str> {
        vec!["concat"]
    }

    fn arguments() -> Vec<&'static str> {
        vec!["s-exp1", "s-exp2"]
    }

    fn arity() -> Arity {
        Arity::Fixed(2)
    }

    fn eval(args: &SExpr) -> EResult<Var> {
        let first = args[0].expect_sexp()?;
        let second = args[1].expect_sexp()?;

        Ok(Expr::SExpr(
            first
                .iter()
                .chain(second.iter())
                .map(Var::clone)
                .collect::<OwnedSExpr>(),
        )
        .into())
    }
}

/*********\
|* Rest *|
\*********/
pub(super) struct RestFnBuilder {}
impl BuiltinFnBuilder for RestFnBuilder {
    fn names() -> Vec<&'static str> {
        vec!["rest", "cdr"]
    }

    fn arguments() -> Vec<&'static str> {
        vec!["s-exp"]
    }

    fn arity() -> Arity {
        Arity::Fixed(1)
    }

    fn eval(args: &SExpr) -> EResult<Var> {
        let sexpr = args[0].expect_sexp()?;
        Ok(Expr::SExpr(
            sexpr
                .iter()
                .skip(1)
                .map(Var::clone)
                .collect(),
        )
        .into())
    }
}

/*********\
|* Add   *|
\*********/

/// Implements the '+'/'add' function.
pub(super) struct AddFnBuilder {}
impl BuiltinFnBuilder for AddFnBuilder {
    fn names() -> Vec<&'static str> {
        vec!["add", "+"]
    }

    fn arguments() -> Vec<&'static str> {
        vec!["x", "y"]
    }

    fn arity() -> Arity {
        Arity::Fixed(2)
    }

    fn eval(args: &SExpr) -> EResult<Var> {
        let values: Vec<&Value> = args
            .iter()
            .map(|expr| expr.as_ref().try_into())
            .collect::<Result<Vec<&Value>, InternalError>>()?;
        let (ct1, ct2) = (values[0], values[1]);

        let new_val = match (ct1, ct2) {
            // str | char, str | char
            (Value::Str(s1), Value::Str(s2)) => {
                Ok(Value::Str(s1.to_string() + s2))
            },
            (Value::Char(c1), Value::Char(c2)) => {
                Ok(Value::Str(c1.to_string() + &c2.to_string()))
            },
            (Value::Str(s1), Value::Char(c2)) => {
                Ok(Value::Str(s1.to_string() + &c2.to_string()))
            },
            (Value::Char(c1), Value::Str(s2)) => {
                Ok(Value::Str(c1.to_string() + s2))
            },

            // int | float, int | float
            (Value::Int(i1), Value::Int(i2)) => Ok(Value::Int(i1 + i2)),
            (Value::Float(f1), Value::Float(f2)) => Ok(Value::Float(f1 + f2)),
            (Value::Int(i1), Value::Float(f2)) => {
                Ok(Value::Float((*i1 as f64) + f2))
            },
            (Value::Float(f1), Value::Int(i2)) => {
                Ok(Value::Float(f1 + (*i2 as f64)))
            },

            // not supported
            _ => {
                Err(EvalError::Type {
                    actual: format!("{ct1:?} + {ct2:?}"),
                    expected: "Supported addition".to_string(),
                })
            },
        }?;

        Ok(Expr::Value(new_val).into())
    }
}

/***********\
|* Range   *|
\***********/
pub(super) struct RangeFnBuilder {}
impl BuiltinFnBuilder for RangeFnBuilder {
    fn names() -> Vec<&'static str> {
        vec!["range"]
    }

    fn arguments() -> Vec<&'static str> {
        vec!["start", "end"]
    }

    fn arity() -> Arity {
        Arity::Fixed(2)
    }

    fn eval(args: &SExpr) -> EResult<Var> {
        let start = var_to_int(&args[0])?;
        let end = var_to_int(&args[1])?;
        Ok(Expr::SExpr(
            (start..end)
                .map(|n| Expr::Value(Value::from(n)).into())
                .collect::<OwnedSExpr>(),
        )
        .into())
    }
}

fn var_to_int(var: &Var) -> EResult<isize> {
    let cval: &Value = var.as_ref().try_into()?;
    match cval {
        Value::Int(n) => Ok(*n),
        other => {
            Err(EvalError::Type {
                actual: format!("{other}"),
                expected: "Int".to_string(),
            })
        },
    }
}

/*********\
|* Map   *|
\*********/

/// Implements an _eager_ map over an s-expression.
pub(super) struct MapFnBuilder {}
impl BuiltinFnBuilder for MapFnBuilder {
    fn names() -> Vec<&'static str> {
        vec!["map"]
    }

    fn arguments() -> Vec<&'static str> {
        vec!["fn", "vals"]
    }

    fn arity() -> Arity {
        Arity::Fixed(2)
    }

    fn eval(args: &SExpr) -> EResult<Var> {
        let mapfn = args[0].expect_fn()?;
        let vals = args[1].expect_sexp()?;

        vals.iter()
            .map(|v| call_function(mapfn, &[v.clone()]))
            .collect::<EResult<OwnedSExpr>>()
            .map(|v| Expr::SExpr(v).into())
    }
}

/************\
|* Equality *|
\************/
pub(super) struct EqFnBuilder {}
impl BuiltinFnBuilder for EqFnBuilder {
    fn names() -> Vec<&'static str> {
        vec!["eq", "=="]
    }

    fn arguments() -> Vec<&'static str> {
        vec!["lhs", "rhs"]
    }

    fn arity() -> Arity {
        Arity::Fixed(2)
    }

    fn eval(sexpr: &SExpr) -> EResult<Var> {
        Ok(Value::Bool(sexpr[0] == sexpr[1]).into())
    }
}

pub(super) struct NeqFnBuilder {}
impl BuiltinFnBuilder for NeqFnBuilder {
    fn names() -> Vec<&'static str> {
        vec!["ne", "!="]
    }

    fn arguments() -> Vec<&'static str> {
        vec!["lhs", "rhs"]
    }

    fn arity() -> Arity {
        Arity::Fixed(2)
    }

    fn eval(sexpr: &SExpr) -> EResult<Var> {
        Ok(Value::Bool(sexpr[0] != sexpr[1]).into())
    }
}

pub(super) struct NegateFnBuilder {}
impl BuiltinFnBuilder for NegateFnBuilder {
    fn names() -> Vec<&'static str> {
        vec!["negate", "!"]
    }

    fn arguments() -> Vec<&'static str> {
        vec!["val"]
    }

    fn arity() -> Arity {
        Arity::Fixed(1)
    }

    fn eval(sexpr: &SExpr) -> EResult<Var> {
        let var = &sexpr[0];
        if let Expr::Value(Value::Bool(val)) = var.as_ref() {
            Ok(Value::Bool(!val).into())
        } else {
            Err(EvalError::Type {
                actual: format!("{var}"),
                expected: "Bool".to_string(),
            })
        }
    }
}
