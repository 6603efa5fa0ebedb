use pretty_assertions::assert_eq;
use protocol_playground::ast::{
    CapabilityError, Expr, Mapping, Value, Var,
};
use protocol_playground::repl::{Repl, ReplError};
use protocol_playground::EvalError;

const PRELUDE: &str = "
    (defprotocol Show (pretty-print (this)))
    (defprotocol Identify (id (this)))
    (defrecord Person (name age))
    (deftype Point (x y))
";

fn repl() -> Repl {
    let mut repl = Repl::new();
    repl.eval_text(PRELUDE).unwrap();
    repl
}

fn run(repl: &mut Repl, text: &str) -> Var {
    repl.eval_text(text)
        .unwrap_or_else(|err| panic!("{text}: {err}"))
}

fn run_err(repl: &mut Repl, text: &str) -> EvalError {
    match repl.eval_text(text) {
        Err(ReplError::Eval(err)) => err,
        Err(err) => panic!("{text}: unexpected error {err}"),
        Ok(result) => panic!("{text}: expected an error, got {result}"),
    }
}

fn string(s: &str) -> Var {
    Value::Str(s.to_string()).into()
}

fn boolean(b: bool) -> Var {
    Value::Bool(b).into()
}

/**************\
|* Dispatch   *|
\**************/
#[test]
fn test_show_person() {
    let mut repl = repl();
    run(
        &mut repl,
        "(extend-type Person
            Show (pretty-print (this) (+ 'My name is ' (:name this))))",
    );
    assert_eq!(
        run(&mut repl, "(pretty-print (new Person 'Rich' 40))"),
        string("My name is Rich")
    );
}

#[test]
fn test_identify_builtin_string() {
    let mut repl = repl();
    run(&mut repl, "(extend-type String Identify (id (s) (hash s)))");
    assert_eq!(
        run(&mut repl, "(id 'Rich')"),
        run(&mut repl, "(hash 'Rich')")
    );
    assert_eq!(run(&mut repl, "(extends? Identify String)"), boolean(true));
}

#[test]
fn test_reified_implementation_is_private() {
    let mut repl = repl();
    run(
        &mut repl,
        "(defvar anon (reify Show (pretty-print (_) 'I am anonymous')))",
    );
    assert_eq!(
        run(&mut repl, "(pretty-print anon)"),
        string("I am anonymous")
    );
    assert_eq!(run(&mut repl, "(satisfies? Show anon)"), boolean(true));
    assert_eq!(
        run(&mut repl, "(satisfies? Show (new Person 'Rich' 40))"),
        boolean(false)
    );
    assert_eq!(run(&mut repl, "(extenders Show)"), Var::from(Vec::<Var>::new()));

    let err = run_err(&mut repl, "(pretty-print (new Person 'Rich' 40))");
    assert!(matches!(
        err,
        EvalError::Capability(CapabilityError::NoImplementation { .. })
    ));
}

#[test]
fn test_dispatch_is_exact_type_only() {
    let mut repl = repl();
    run(&mut repl, "(extend-type Map Show (pretty-print (m) 'a map'))");
    assert_eq!(
        run(&mut repl, "(pretty-print (hash-map :name 'Rich'))"),
        string("a map")
    );
    // a record is not a map as far as dispatch is concerned
    let err = run_err(&mut repl, "(pretty-print (new Person 'Rich' 40))");
    assert!(matches!(
        err,
        EvalError::Capability(CapabilityError::NoImplementation { .. })
    ));
}

#[test]
fn test_reregistering_replaces_operations() {
    let mut repl = Repl::new();
    run(
        &mut repl,
        "(defprotocol Greet (hello (this)) (bye (this)))
         (defrecord Person (name))
         (extend-type Person Greet (hello (p) 'hi') (bye (p) 'bye'))
         (extend-type Person Greet (hello (p) 'hey'))",
    );
    assert_eq!(run(&mut repl, "(hello (new Person 'x'))"), string("hey"));
    let err = run_err(&mut repl, "(bye (new Person 'x'))");
    assert!(matches!(
        err,
        EvalError::Capability(CapabilityError::NoImplementation { .. })
    ));
}

#[test]
fn test_extend_with_merged_maps() {
    let mut repl = Repl::new();
    run(
        &mut repl,
        "(defprotocol Greet (hello (this)) (bye (this)))
         (defrecord Person (name))
         (defvar base (hash-map :hello (lambda (p) 'hi') :bye (lambda (p) 'bye')))
         (extend Person Greet (merge base (hash-map :hello (lambda (p) 'hey'))))",
    );
    assert_eq!(run(&mut repl, "(hello (new Person 'x'))"), string("hey"));
    assert_eq!(run(&mut repl, "(bye (new Person 'x'))"), string("bye"));
}

#[test]
fn test_inline_implementations() {
    let mut repl = repl();
    run(
        &mut repl,
        "(defrecord Dog (name)
            Show (pretty-print (this) (+ 'Woof, ' (:name this))))",
    );
    assert_eq!(
        run(&mut repl, "(pretty-print (new Dog 'Rex'))"),
        string("Woof, Rex")
    );
    assert_eq!(run(&mut repl, "(extenders Show)"), Var::from(vec![string("Dog")]));
}

#[test]
fn test_redefined_type_retires_its_implementations() {
    let mut repl = repl();
    let dog = "(defrecord Dog (name)
                  Show (pretty-print (this) (+ 'Woof, ' (:name this))))";
    run(&mut repl, dog);
    run(&mut repl, "(defvar rex (new Dog 'Rex'))");
    run(&mut repl, dog);

    assert_eq!(run(&mut repl, "(extenders Show)"), Var::from(vec![string("Dog")]));
    assert_eq!(run(&mut repl, "(satisfies? Show rex)"), boolean(false));
    assert_eq!(
        run(&mut repl, "(pretty-print (new Dog 'Fido'))"),
        string("Woof, Fido")
    );
}

#[test]
fn test_operation_arity_is_checked() {
    let mut repl = repl();
    let err = run_err(
        &mut repl,
        "(extend-type Person Show (pretty-print (this extra) 'nope'))",
    );
    assert!(matches!(err, EvalError::Arity { .. }));

    let err = run_err(
        &mut repl,
        "(extend-type Person Show (no-such-op (this) 'nope'))",
    );
    assert!(matches!(
        err,
        EvalError::Capability(CapabilityError::UnknownOperation { .. })
    ));
}

#[test]
fn test_duplicate_capability() {
    let mut repl = repl();
    // same signatures: fine
    run(&mut repl, "(defprotocol Show (pretty-print (this)))");

    let err = run_err(&mut repl, "(defprotocol Show (pretty-print (this other)))");
    assert!(matches!(
        err,
        EvalError::Capability(CapabilityError::Duplicate { .. })
    ));
}

/**************\
|* Records    *|
\**************/
#[test]
fn test_positional_and_mapping_construction_agree() {
    let mut repl = repl();
    assert_eq!(
        run(
            &mut repl,
            "(== (new Person 'Rich' 40)
                 (from-map Person (hash-map :age 40 :name 'Rich')))"
        ),
        boolean(true)
    );
}

#[test]
fn test_missing_fields_default_to_nil() {
    let mut repl = repl();
    assert_eq!(
        run(&mut repl, "(get (from-map Person (hash-map :name 'Rich')) :age)"),
        Var::nil()
    );
}

#[test]
fn test_unknown_fields_are_rejected() {
    let mut repl = repl();
    let err = run_err(
        &mut repl,
        "(from-map Person (hash-map :name 'Rich' :height 180))",
    );
    assert!(matches!(err, EvalError::UnknownField { .. }));

    let err = run_err(&mut repl, "(new Person 'Rich')");
    assert!(matches!(err, EvalError::Arity { .. }));
}

#[test]
fn test_duplicate_fields_are_rejected() {
    let mut repl = repl();
    for text in ["(defrecord Pair (a a))", "(deftype Slots (a b a))"] {
        let err = run_err(&mut repl, text);
        assert!(matches!(err, EvalError::Syntax { .. }), "{text}: {err}");
    }
    // nothing was bound
    assert!(matches!(
        run_err(&mut repl, "(new Pair 1 2)"),
        EvalError::LookupError(_)
    ));
}

#[test]
fn test_dissoc_demotes_to_map() {
    let mut repl = repl();
    run(&mut repl, "(defvar p (dissoc (new Person 'Rich' 40) :age))");
    assert_eq!(run(&mut repl, "(instance? Person p)"), boolean(false));
    assert_eq!(run(&mut repl, "(instance? Map p)"), boolean(true));
    assert_eq!(run(&mut repl, "(len p)"), Var::from(Value::Int(1)));

    let mut expected = Mapping::new();
    expected.insert("name".to_string(), string("Rich"));
    assert_eq!(run(&mut repl, "p"), Var::from(expected));
}

#[test]
fn test_assoc_keeps_the_type() {
    let mut repl = repl();
    run(&mut repl, "(defvar p (assoc (new Person 'Rich' 40) :height 180))");
    assert_eq!(run(&mut repl, "(instance? Person p)"), boolean(true));
    assert_eq!(run(&mut repl, "(:height p)"), Var::from(Value::Int(180)));
    assert_eq!(
        run(&mut repl, "(keys p)"),
        Var::from(vec![
            Expr::Keyword("name".to_string()).new_var(),
            Expr::Keyword("age".to_string()).new_var(),
            Expr::Keyword("height".to_string()).new_var(),
        ])
    );
}

#[test]
fn test_records_are_values() {
    let mut repl = repl();
    run(
        &mut repl,
        "(defvar p (new Person 'Rich' 40))
         (defvar q (assoc p :age 41))",
    );
    assert_eq!(run(&mut repl, "(:age p)"), Var::from(Value::Int(40)));
    assert_eq!(run(&mut repl, "(:age q)"), Var::from(Value::Int(41)));
}

/**************\
|* Compounds  *|
\**************/
#[test]
fn test_compound_named_access() {
    let mut repl = repl();
    run(&mut repl, "(defvar pt (new Point 1 2))");
    assert_eq!(run(&mut repl, "(field pt :x)"), Var::from(Value::Int(1)));
    run(&mut repl, "(set-field! pt :x 5)");
    assert_eq!(run(&mut repl, "(field pt :x)"), Var::from(Value::Int(5)));

    let err = run_err(&mut repl, "(field pt :z)");
    assert!(matches!(err, EvalError::UnknownField { .. }));
}

#[test]
fn test_compound_refuses_generic_access() {
    let mut repl = repl();
    run(&mut repl, "(defvar pt (new Point 1 2))");
    for text in [
        "(get pt :x)",
        "(:x pt)",
        "(assoc pt :x 3)",
        "(dissoc pt :x)",
        "(keys pt)",
        "(from-map Point (hash-map :x 1 :y 2))",
    ] {
        let err = run_err(&mut repl, text);
        assert!(
            matches!(err, EvalError::Unsupported { .. }),
            "{text}: {err}"
        );
    }
}

#[test]
fn test_compounds_can_be_extended() {
    let mut repl = repl();
    run(
        &mut repl,
        "(extend-type Point
            Show (pretty-print (p) (str '<' (field p :x) ',' (field p :y) '>')))",
    );
    assert_eq!(
        run(&mut repl, "(pretty-print (new Point 1 2))"),
        string("<1,2>")
    );
}

/**************\
|* Sessions   *|
\**************/
#[test]
fn test_state_survives_errors() {
    let mut repl = repl();
    let err = repl.eval_text("(defvar a 1) (undefined-thing) (defvar b 2)");
    assert!(matches!(
        err,
        Err(ReplError::Eval(EvalError::LookupError(_)))
    ));

    assert_eq!(run(&mut repl, "a"), Var::from(Value::Int(1)));
    assert!(repl.eval_text("b").is_err());
    // declarations from before the error are still there
    assert_eq!(run(&mut repl, "(satisfies? Show 1)"), boolean(false));
}

#[test]
fn test_sessions_are_independent() {
    let mut first = repl();
    let mut second = repl();
    run(&mut first, "(extend-type Int Show (pretty-print (n) 'an int'))");
    assert_eq!(run(&mut first, "(pretty-print 1)"), string("an int"));
    assert!(second.eval_text("(pretty-print 1)").is_err());
}

#[test]
fn test_extension_inside_a_function() {
    let mut repl = repl();
    run(
        &mut repl,
        "(define (teach-show ty)
            (extend-type ty Show (pretty-print (x) 'taught')))
         (teach-show Bool)",
    );
    assert_eq!(run(&mut repl, "(pretty-print true)"), string("taught"));
}

#[test]
fn test_dropping_the_repl_releases_its_registry() {
    let mut repl = repl();
    run(
        &mut repl,
        "(extend-type Person Show (pretty-print (this) (id this)))
         (extend-type Person Identify (id (this) (:name this)))",
    );
    assert_eq!(
        run(&mut repl, "(pretty-print (new Person 'Rich' 40))"),
        string("Rich")
    );

    let session = repl.scope().session().downgrade();
    assert!(session.registry().is_ok());
    drop(repl);
    assert!(session.registry().is_err());
}
