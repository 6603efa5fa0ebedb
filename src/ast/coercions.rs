use super::{
    Compound, Expr, Function, InternalError, Mapping, OwnedSExpr, Record,
    SpecialForm, Value,
};

/*************************\
|* Exprs into Value types *|
\*************************/
impl<'a> TryFrom<&'a Expr> for &'a Value {
    type Error = InternalError;

    fn try_from(var: &'a Expr) -> Result<Self, InternalError> {
        if let Expr::Value(v) = var {
            Ok(v)
        } else {
            Err(InternalError::NotAValue {
                expression: format!("{}", var),
            })
        }
    }
}

/****************************\
|* Exprs from wrapped types *|
\****************************/
// Coercion sugar to make it easier to create exprs
macro_rules! impl_expr_from_type {
    ($($t:ty, $v:ident);* $(;)?) => {
        $(
            impl From<$t> for Expr {
                fn from(value: $t) -> Self {
                    Expr::$v(value)
                }
            }
        )*
    };
}

impl_expr_from_type!(
    Value, Value;
    OwnedSExpr, SExpr;
    Function, Function;
    SpecialForm, Special;
    Mapping, Map;
    Record, Record;
    Compound, Compound;
);
