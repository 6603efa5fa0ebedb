use std::fmt::{Display, Formatter};
use std::sync::Arc;

use itertools::Itertools;

use super::{
    display_mapping, BuiltinType, Compound, EResult, EvalError, Function,
    Mapping, Record, SpecialForm, TypeInfo, TypeRef, Value, Var,
};
use crate::capabilities::{Anonymous, Capability};

pub type SExpr = [Var];
pub type OwnedSExpr = Vec<Var>;

/// A one-off capability implementation built by `reify`
pub type Reified = Anonymous<Var>;

/// Exprs are immutable value-type building blocks
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    // recursive s-exprs
    SExpr(OwnedSExpr),

    // leaf nodes
    Symbol(String),
    Keyword(String),
    Value(Value),
    Function(Function),
    Special(SpecialForm),

    // structured data
    Map(Mapping),
    Record(Record),
    Compound(Compound),
    Reified(Reified),

    // first-class handles for the polymorphism machinery
    Capability(Arc<Capability>),
    Type(TypeRef),
}

impl Expr {
    pub fn empty() -> Self {
        Expr::SExpr(Vec::new())
    }

    pub fn new_var(self) -> Var {
        Var::new(self)
    }

    /// The runtime type of this expression; capabilities dispatch on it.
    pub fn type_info(&self) -> TypeRef {
        let builtin = match self {
            Expr::Record(record) => return record.type_info().clone(),
            Expr::Compound(compound) => return compound.type_info().clone(),
            Expr::Reified(reified) => return reified.type_info().clone(),
            Expr::Value(value) => value.builtin_type(),
            Expr::SExpr(_) => BuiltinType::List,
            Expr::Symbol(_) => BuiltinType::Symbol,
            Expr::Keyword(_) => BuiltinType::Keyword,
            Expr::Function(_) => BuiltinType::Function,
            Expr::Special(_) => BuiltinType::Special,
            Expr::Map(_) => BuiltinType::Map,
            Expr::Capability(_) => BuiltinType::Capability,
            Expr::Type(_) => BuiltinType::Type,
        };
        TypeInfo::builtin(builtin)
    }

    pub fn type_name(&self) -> String {
        self.type_info().name.clone()
    }

    /// Like Display, but strings are quoted
    pub fn repr(&self) -> String {
        match self {
            Expr::Value(Value::Str(s)) => format!("{s:?}"),
            Expr::Value(Value::Char(c)) => format!("c'{c}'"),
            other => other.to_string(),
        }
    }

    /*****************\
    |* Type checking *|
    \*****************/
    pub fn expect_sexp(&self) -> EResult<&SExpr> {
        match self {
            Expr::SExpr(sexpr) => Ok(sexpr),
            other => Err(type_error("S-Expression", other)),
        }
    }

    pub fn expect_sexp_with_len(&self, len: usize) -> EResult<&SExpr> {
        let sexpr = self.expect_sexp()?;
        if sexpr.len() == len {
            Ok(sexpr)
        } else {
            Err(EvalError::Syntax {
                expected: format!("S-Expression of length {len}"),
                actual: format!("length {}", sexpr.len()),
            })
        }
    }

    pub fn expect_symbol(&self) -> EResult<&str> {
        match self {
            Expr::Symbol(name) => Ok(name),
            other => Err(type_error("Symbol", other)),
        }
    }

    pub fn expect_keyword(&self) -> EResult<&str> {
        match self {
            Expr::Keyword(name) => Ok(name),
            other => Err(type_error("Keyword", other)),
        }
    }

    pub fn expect_fn(&self) -> EResult<&Function> {
        match self {
            Expr::Function(func) => Ok(func),
            other => Err(type_error("Function", other)),
        }
    }

    pub fn expect_special(&self) -> EResult<&SpecialForm> {
        match self {
            Expr::Special(special) => Ok(special),
            other => Err(type_error("SpecialForm", other)),
        }
    }

    pub fn expect_map(&self) -> EResult<&Mapping> {
        match self {
            Expr::Map(mapping) => Ok(mapping),
            other => Err(type_error("Map", other)),
        }
    }

    pub fn expect_type(&self) -> EResult<&TypeRef> {
        match self {
            Expr::Type(info) => Ok(info),
            other => Err(type_error("Type", other)),
        }
    }

    pub fn expect_capability(&self) -> EResult<&Arc<Capability>> {
        match self {
            Expr::Capability(capability) => Ok(capability),
            other => Err(type_error("Capability", other)),
        }
    }
}

fn type_error(expected: &str, actual: &Expr) -> EvalError {
    EvalError::Type {
        expected: expected.to_string(),
        actual: format!("{} ({})", actual.repr(), actual.type_name()),
    }
}

impl Display for Expr {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Expr::SExpr(sexp) => write!(f, "{}", display_sexp(sexp)),
            Expr::Symbol(name) => write!(f, "{}", name),
            Expr::Keyword(s) => write!(f, ":{}", s),
            Expr::Value(value) => value.fmt(f),
            Expr::Function(func) => func.fmt(f),
            Expr::Special(form) => form.fmt(f),
            Expr::Map(mapping) => write!(f, "{}", display_mapping(mapping)),
            Expr::Record(record) => record.fmt(f),
            Expr::Compound(compound) => compound.fmt(f),
            Expr::Reified(reified) => {
                write!(f, "#<reify {}>", reified.capability().name)
            },
            Expr::Capability(capability) => {
                write!(f, "#capability[{}]", capability.name)
            },
            Expr::Type(info) => write!(f, "#type[{}]", info.name),
        }
    }
}

fn display_sexp(sexp: &SExpr) -> String {
    let items = sexp
        .iter()
        .map(|e| e.repr())
        .join(" ");
    format!("({items})")
}
