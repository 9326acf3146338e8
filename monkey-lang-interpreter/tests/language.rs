use gc::Gc;
use monkey_lang_core::lexer::Tokenizer;
use monkey_lang_core::parser::Parser;
use monkey_lang_interpreter::environment::Environment;
use monkey_lang_interpreter::evaluator::eval_program;
use monkey_lang_interpreter::object::{Object, ObjectType};
use proptest::prelude::*;

fn run(input: &str) -> Gc<Object> {
    let mut parser = Parser::new(Tokenizer::new(input));
    let program = parser.parse_program().expect("input should parse");
    eval_program(&program, &mut Environment::new())
}

fn assert_inspects(input: &str, expected: &str) {
    assert_eq!(run(input).inspect(), expected, "input: {}", input);
}

#[test]
fn truthiness() {
    assert_inspects("!true == false", "true");
    assert_inspects("!false == true", "true");
    assert_inspects("!5 == false", "true");
    assert_inspects("!!5 == true", "true");
}

#[test]
fn precedence_and_grouping() {
    assert_inspects("5 + 5 * 2 == 15", "true");
    assert_inspects("(5 + 5) * 2 == 20", "true");
}

#[test]
fn binding_and_lookup() {
    assert_inspects("let a = 5; let b = a; b;", "5");
}

#[test]
fn functions_and_closures() {
    assert_inspects("let identity = fn(x) { x; }; identity(5);", "5");
    assert_inspects(
        "let newAdder = fn(x) { fn(y) { x + y; } }; let addTwo = newAdder(2); addTwo(3);",
        "5",
    );
}

#[test]
fn errors_propagate_through_nested_evaluation() {
    let direct = run("5 + true;");
    let nested = run("if (5 + true) { 1 } else { 2 }");

    assert_eq!(direct.object_type(), ObjectType::Error);
    assert_eq!(direct.inspect(), "ERROR: type mismatch: INTEGER + BOOLEAN");
    assert_eq!(nested, direct);
}

#[test]
fn return_short_circuits_function_body() {
    assert_inspects("let f = fn() { return 10; 9; }; f();", "10");
}

#[test]
fn parse_errors_do_not_stop_the_parser() {
    let mut parser = Parser::new(Tokenizer::new("let x 5; let y = 1; let = 2;"));
    let errors = parser.parse_program().unwrap_err();

    assert_eq!(errors.len(), 2);
    assert_eq!(errors[0].to_string(), "expected `=`, got `5` at position 6");
    assert_eq!(errors[1].to_string(), "expected an identifier, got `=` at position 24");
}

#[test]
fn recursive_closures_are_collected() {
    // A function stored in the environment it captured forms a cycle that
    // only the collector can break.
    let program = "
        let countdown = fn(n) {
            let inner = fn(m) { if (m == 0) { 0 } else { inner(m - 1) } };
            inner(n)
        };
        countdown(50)";

    // Allocate the shared `true`/`false`/`null` before measuring.
    assert_inspects("!true == if (false) { 1 }", "false");
    gc::force_collect();
    let baseline = gc::stats().bytes_allocated;

    for _ in 0..200 {
        assert_inspects(program, "0");
    }
    let before_collect = gc::stats().bytes_allocated;
    gc::force_collect();
    let after_collect = gc::stats().bytes_allocated;

    assert!(
        before_collect > after_collect,
        "nothing was reclaimed: {} bytes before and after collecting",
        before_collect
    );
    assert!(
        after_collect <= baseline + 1024,
        "cycles survived collection: baseline {} bytes, {} bytes after collecting",
        baseline,
        after_collect
    );
}

proptest! {
    #[test]
    fn integer_literals_evaluate_to_themselves(n in 0..=i64::MAX) {
        let result = run(&n.to_string());
        prop_assert_eq!(result, Object::integer(n));
    }

    #[test]
    fn negated_literals_evaluate_to_their_negation(n in 0..=i64::MAX) {
        let result = run(&format!("-{}", n));
        prop_assert_eq!(result, Object::integer(-n));
    }

    #[test]
    fn inspect_is_stable(n in any::<i64>(), s in "[a-z ]{0,16}") {
        for object in [Object::integer(n), Object::string(s)] {
            prop_assert_eq!(object.inspect(), object.inspect());
        }
    }
}
