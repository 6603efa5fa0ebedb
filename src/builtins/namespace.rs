use super::capability_forms::*;
use super::functions::*;
use super::record_functions::*;
use super::special_forms::*;
use super::type_forms::*;
use crate::ast::{BuiltinType, Expr, TypeInfo};
use crate::Scope;

/// A fresh root scope, with its own capability registry, holding every
/// built-in form, function and type name
pub fn builtins() -> Scope {
    let mut scope = Scope::new(None);

    // special forms
    QuoteFormBuilder::register(&mut scope);
    IfFormBuilder::register(&mut scope);
    DoFormBuilder::register(&mut scope);
    LambdaFormBuilder::register(&mut scope);
    DefVarForm::register(&mut scope);
    DefineFormBuilder::register(&mut scope);

    // capabilities
    DefProtocolFormBuilder::register(&mut scope);
    ExtendTypeFormBuilder::register(&mut scope);
    ExtendFormBuilder::register(&mut scope);
    ReifyFormBuilder::register(&mut scope);
    SatisfiesFormBuilder::register(&mut scope);
    ExtendsFormBuilder::register(&mut scope);
    ExtendersFormBuilder::register(&mut scope);

    // types
    DefRecordFormBuilder::register(&mut scope);
    DefTypeFormBuilder::register(&mut scope);

    // functions
    IdentityFnBuilder::register(&mut scope);
    PrintFnBuilder::register(&mut scope);
    StrFnBuilder::register(&mut scope);
    HashFnBuilder::register(&mut scope);
    LenFnBuilder::register(&mut scope);
    FirstFnBuilder::register(&mut scope);
    RestFnBuilder::register(&mut scope);
    ConcatFnBuilder::register(&mut scope);
    AddFnBuilder::register(&mut scope);
    RangeFnBuilder::register(&mut scope);
    MapFnBuilder::register(&mut scope);
    EqFnBuilder::register(&mut scope);
    NeqFnBuilder::register(&mut scope);
    NegateFnBuilder::register(&mut scope);

    // maps, records and compounds
    HashMapFnBuilder::register(&mut scope);
    MergeFnBuilder::register(&mut scope);
    GetFnBuilder::register(&mut scope);
    AssocFnBuilder::register(&mut scope);
    DissocFnBuilder::register(&mut scope);
    KeysFnBuilder::register(&mut scope);
    FieldFnBuilder::register(&mut scope);
    SetFieldFnBuilder::register(&mut scope);
    NewFnBuilder::register(&mut scope);
    FromMapFnBuilder::register(&mut scope);
    InstanceFnBuilder::register(&mut scope);
    TypeOfFnBuilder::register(&mut scope);

    // built-in types, so they can be extended like any other
    for ty in BuiltinType::NAMED {
        scope.set(ty.name(), Expr::Type(TypeInfo::builtin(ty)).new_var());
    }

    scope
}
