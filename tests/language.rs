use oklang::evaluator::Interpreter;
use oklang::value::{Value, sym, val};
use oklang::{Config, Error, ParseErrorKind};
use pretty_assertions::assert_eq;

fn interpreter() -> Interpreter {
    Interpreter::with_config(Config::default().with_seed(42))
}

/// Evaluate each source line in order on one interpreter, checking the printed result
fn check_session(lines: &[(&str, &str)]) {
    let interp = interpreter();
    for (i, (source, expected)) in lines.iter().enumerate() {
        match interp.eval(source) {
            Ok(value) => assert_eq!(value.to_string(), *expected, "#{i} {source:?}"),
            Err(e) => panic!("#{i} {source:?} failed: {e}"),
        }
    }
}

#[test]
fn test_basic_programs() {
    check_session(&[
        ("1 2 3", "1 2 3"),
        ("+/1 2 3", "6"),
        ("+\\1 2 3", "1 3 6"),
        ("{x+y}[2;3]", "5"),
        ("{x+y}", "{[x;y]x+y}"),
        ("2 3#1 2 3 4 5 6", "(1 2 3\n 4 5 6)"),
        ("`a`b!1 2", "[a:1;b:2]"),
        ("|1 2 3", "3 2 1"),
        ("<3 1 2", "1 2 0"),
        ("x:1 2 3;{x*2}'x", "2 4 6"),
        ("\"hello\"", "\"hello\""),
    ]);
}

#[test]
fn test_parse_error_names_missing_noun() {
    let err = interpreter().eval("1+").unwrap_err();
    match &err {
        Error::Parse(e) => {
            assert_eq!(e.kind, ParseErrorKind::UnexpectedToken);
            assert!(e.message.contains("noun expected"), "{err}");
        }
        other => panic!("expected a parse error, got {other:?}"),
    }
    assert!(err.to_string().starts_with("parse error."), "{err}");
}

#[test]
fn test_trap_contract() {
    check_session(&[
        (".[{x+y};1 2;:]", "0 3"),
        (".[{x+`a};,1;:]", "(1\n \"number expected, found symbol.\")"),
    ]);

    let interp = interpreter();
    let trapped = interp.eval(".[{x+`a};,1;:]").unwrap();
    let Value::List(items) = trapped else {
        panic!("trap should return a pair");
    };
    assert_eq!(items[0], val(1));
    let direct = interp.eval("{x+`a} 1").unwrap_err();
    assert_eq!(items[1].text().unwrap(), direct.to_string());
}

#[test]
fn test_amend_leaves_source_unchanged() {
    check_session(&[
        ("l:1 2 3", "1 2 3"),
        ("@[l;0;:;7]", "7 2 3"),
        ("l", "1 2 3"),
        ("@[`l;0;:;7]", "`l"),
        ("l", "7 2 3"),
        ("d:[a:1;b:2]", "[a:1;b:2]"),
        ("@[d;`a;+;10]", "[a:11;b:2]"),
        ("d", "[a:1;b:2]"),
        ("e:[a:1 2;b:3]", "[a:1 2;b:3]"),
        (".[e;(`a;1);+;5]", "[a:1 7;b:3]"),
        ("e", "[a:1 2;b:3]"),
        ("g:e", "[a:1 2;b:3]"),
        ("g[`b]:9", "[a:1 2;b:9]"),
        ("e", "[a:1 2;b:3]"),
    ]);
}

#[test]
fn test_views_follow_their_dependencies() {
    let interp = interpreter();
    interp.eval("a:1;b:2;v::a+b").unwrap();
    assert_eq!(interp.eval("v").unwrap(), val(3));
    interp.eval("a:10").unwrap();
    assert_eq!(interp.eval("v").unwrap(), val(12));
}

#[test]
fn test_list_literals_evaluate_right_to_left() {
    check_session(&[("a:5;(a:1;a)", "1 5"), ("a", "1")]);
}

#[test]
fn test_conditional_falls_through_to_last_branch() {
    check_session(&[
        ("$[0;1]", "1"),
        ("$[0;`a;0;`b]", "`b"),
        ("$[0;`a;`c]", "`c"),
        ("$[1;`a;`c]", "`a"),
    ]);
}

#[test]
fn test_deep_input_is_an_error_not_a_crash() {
    let interp = interpreter();
    let chain = format!("{}1", "1+".repeat(100_000));
    match interp.eval(&chain) {
        Err(Error::Parse(e)) => assert_eq!(e.kind, ParseErrorKind::TooDeeplyNested),
        other => panic!("expected a nesting error, got {other:?}"),
    }
    assert_eq!(interp.eval("1+1").unwrap(), val(2));
}

#[test]
fn test_oversized_counts_are_trappable() {
    let interp = interpreter();
    let err = interp.eval("#1000000000000000#1").unwrap_err();
    assert!(matches!(err, Error::Limit(_)), "{err:?}");
    check_session(&[(
        ".[{!x};,1000000000000000;:]",
        "(1\n \"list too long (max length: 67108864).\")",
    )]);
}

#[test]
fn test_interpreters_are_independent() {
    let first = interpreter();
    let second = interpreter();
    first.eval("shared:1").unwrap();
    assert_eq!(first.eval("shared").unwrap(), val(1));
    assert_eq!(
        second.eval("shared").unwrap_err(),
        Error::Undefined("shared".into())
    );
}

#[test]
fn test_seeded_interpreters_agree() {
    let a = interpreter().eval("5?100").unwrap();
    let b = interpreter().eval("5?100").unwrap();
    assert_eq!(a, b);
    assert_eq!(a.count(), 5);
}

#[test]
fn test_host_built_values() {
    let interp = interpreter();
    interp.root().define("xs", val([3, 1, 2]));
    interp.root().define("s", sym("name"));
    assert_eq!(interp.eval("xs@<xs").unwrap(), val([1, 2, 3]));
    assert_eq!(interp.eval("s").unwrap().to_string(), "`name");
    assert_eq!(oklang::eval("#!10").unwrap(), val(10));
}
