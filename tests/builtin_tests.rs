use protocol_playground::ast::{Expr, Value, Var};
use protocol_playground::parser::parse_text;
use protocol_playground::repl::Repl;
use protocol_playground::{builtins, eval};

fn parse_and_eval(s: &str) -> Var {
    let parsed: Var = parse_text(s).unwrap().into();

    let root_scope = builtins();
    let mut eval_scope = root_scope.child();
    println!("Eval: {parsed}");
    eval(&parsed, &mut eval_scope).unwrap()
}

fn assert_expressions_equal(lhs: &str, rhs: &str) {
    let lval = parse_and_eval(lhs);
    let rval = parse_and_eval(rhs);
    assert_eq!(lval.as_ref(), rval.as_ref());
}

fn assert_true(exp: &str) {
    let result = parse_and_eval(exp);
    if let Expr::Value(Value::Bool(val)) = result.as_ref() {
        assert!(val, "{exp} is false")
    } else {
        panic!("Not a bool: {result}")
    }
}

fn assert_var_eq<T>(expected: T, actual: &Var)
where
    T: Into<Var> + PartialEq,
{
    assert_eq!(expected.into(), actual.clone());
}

//*** BASE TESTS ***//
// These are a little verbose to ensure that we can
// rely on the test evaluation machinery in later, more concise tests
#[test]
fn test_quote() {
    let result = parse_and_eval("(quote 'hello' 'world')");
    let sexp = result.expect_sexp_with_len(2).unwrap();

    assert_var_eq(Value::Str("hello".to_string()), &sexp[0]);
    assert_var_eq(Value::Str("world".to_string()), &sexp[1]);

    // meta-test sanity check
    assert_expressions_equal(
        "(quote 'hello' 'world')",
        "(quote 'hello' 'world')",
    );
}

#[test]
fn test_identity() {
    // meta-test sanity check
    assert_expressions_equal("(quote 3)", "(echo (quote 3))");
}

#[test]
fn test_first() {
    let result = parse_and_eval("(first (quote 1 2))");
    assert_var_eq(Value::Int(1), &result);
}

#[test]
fn test_rest() {
    assert_expressions_equal(
        "(rest (quote 1 2 'hi' ('yo' 'yo')))",
        "(quote 2 'hi' ('yo' 'yo'))",
    );
}

#[test]
fn test_concat() {
    assert_expressions_equal(
        "(concat (quote 1 2) (quote 3 4))",
        "(quote 1 2 3 4)",
    );
}

#[test]
fn test_len() {
    assert_expressions_equal(
        "(len (concat (quote 1 2) (quote 3 4)))",
        "(echo 4)",
    );
}

//*** FUNCTIONS AND CONTROL FLOW ***//
#[test]
fn test_add() {
    assert_var_eq(Value::Int(5), &parse_and_eval("(+ 2 3)"));
    assert_var_eq(Value::Float(2.5), &parse_and_eval("(+ 2 0.5)"));
    assert_var_eq(
        Value::Str("ab".to_string()),
        &parse_and_eval("(+ 'a' 'b')"),
    );
}

#[test]
fn test_str() {
    assert_var_eq(
        Value::Str("a1:k".to_string()),
        &parse_and_eval("(str 'a' 1 :k)"),
    );
}

#[test]
fn test_if() {
    assert_var_eq(Value::Int(1), &parse_and_eval("(if (== 1 1) 1 2)"));
    assert_var_eq(Value::Int(2), &parse_and_eval("(if nil 1 2)"));
}

#[test]
fn test_lambda_call() {
    assert_var_eq(Value::Int(3), &parse_and_eval("((lambda (x) (+ x 1)) 2)"));
}

#[test]
fn test_map() {
    assert_expressions_equal(
        "(map (lambda (x) (+ x 1)) (range 0 3))",
        "(quote 1 2 3)",
    );
}

#[test]
fn test_equality() {
    assert_true("(== (quote 1 2) (quote 1 2))");
    assert_true("(!= 1 2)");
    assert_true("(! (== 'a' 'b'))");
}

#[test]
fn test_closures_capture_definitions() {
    let mut repl = Repl::new();
    let result = repl
        .eval_text(
            "(defvar n 10)
             (define (add-n x) (+ x n))
             (defvar n 20)
             (add-n 1)",
        )
        .unwrap();
    // captured at definition time
    assert_var_eq(Value::Int(11), &result);
}

#[test]
fn test_recursive_define() {
    let mut repl = Repl::new();
    let result = repl
        .eval_text(
            "(define (sum-to n) (if (== n 0) 0 (+ n (sum-to (+ n -1)))))
             (sum-to 4)",
        )
        .unwrap();
    assert_var_eq(Value::Int(10), &result);
}

#[test]
fn test_do() {
    assert_var_eq(Value::Int(3), &parse_and_eval("(do 1 2 3)"));
}
