use std::fmt::{Display, Formatter};
use std::iter::repeat;

use super::{EResult, EvalError, SExpr, Var};
use crate::{Scope, Session};

/*****************\
|* Special forms *|
\*****************/
#[derive(Debug, Clone, PartialEq)]
pub struct SpecialForm {
    pub name: String,
    pub arity: Arity,

    /// Evaluate the special form
    pub eval: fn(&SExpr, &mut Scope) -> EResult<Var>,

    /// given the s-expressions arguments, capture the
    /// variables that it needs from its enclosing scope.
    /// This method is, in particular, a hook for `lambda`
    /// (or anything building a closure) to call on any interior special forms.
    pub bind_outer_scope: fn(&SExpr, &Scope, &mut Scope) -> EResult<()>,
}

impl Display for SpecialForm {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "#special[{}]", self.name)
    }
}

/*************\
|* Functions *|
\*************/
#[derive(Debug, Clone, PartialEq)]
pub struct Function {
    pub name: String,
    pub arity: Arity,
    pub arguments: Vec<String>,
    pub form: CallForm,
}

impl Display for Function {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} {}[{}]",
            self.form.type_str(),
            self.name,
            self.arguments.join(",")
        )
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum CallForm {
    Lambda {
        body: Var,
        scope: Scope,
    },
    Builtin(fn(&SExpr) -> EResult<Var>),
    /// A capability operation: the implementation is looked up by the
    /// runtime type of the first argument at every call.
    Dispatch {
        capability: String,
        operation: String,
        session: Session,
    },
}

impl CallForm {
    fn type_str(&self) -> &'static str {
        match self {
            CallForm::Lambda { .. } => "λ",
            CallForm::Builtin(..) => "builtin",
            CallForm::Dispatch { .. } => "protocol",
        }
    }
}

/*********************\
|* Common components *|
\*********************/
#[derive(Debug, Clone, Eq, PartialEq)]
pub enum Arity {
    Fixed(usize),
    Variadic,
}

impl Arity {
    pub fn check(&self, name: &str, n_args: usize) -> EResult<()> {
        if let &Arity::Fixed(arity) = self {
            if n_args != arity {
                return Err(EvalError::Arity {
                    name: name.to_string(),
                    arity,
                    num_args_provided: n_args,
                });
            }
        };

        Ok(())
    }
}

impl Display for Arity {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Arity::Fixed(n) => {
                write!(
                    f,
                    "({})",
                    repeat("_")
                        .take(*n)
                        .collect::<Vec<&str>>()
                        .join(",")
                )
            },
            Arity::Variadic => {
                write!(f, "(...)")
            },
        }
    }
}
