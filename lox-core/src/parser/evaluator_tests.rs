#[cfg(test)]
mod expression_tests {
    use crate::parser::{parse_expression, Interpreter, OutputBuffer};
    use crate::types::Value;

    fn eval(source: &str) -> Value {
        let expr = parse_expression(source).unwrap();
        Interpreter::new()
            .with_output(OutputBuffer::new())
            .evaluate(&expr)
            .unwrap()
    }

    fn eval_err(source: &str) -> String {
        let expr = parse_expression(source).unwrap();
        Interpreter::new()
            .with_output(OutputBuffer::new())
            .evaluate(&expr)
            .unwrap_err()
            .message
    }

    #[test]
    fn test_arithmetic() {
        assert_eq!(eval("1 + 2 * 3"), Value::Number(7.0));
        assert_eq!(eval("(1 + 2) * 3"), Value::Number(9.0));
        assert_eq!(eval("10 / 4"), Value::Number(2.5));
        assert_eq!(eval("-(3 - 5)"), Value::Number(2.0));
    }

    #[test]
    fn test_division_by_zero_is_infinite() {
        assert_eq!(eval("1 / 0"), Value::Number(f64::INFINITY));
        assert_eq!(eval("-1 / 0").to_string(), "-Infinity");
    }

    #[test]
    fn test_string_concatenation() {
        assert_eq!(eval("\"foo\" + \"bar\""), Value::string("foobar"));
    }

    #[test]
    fn test_mixed_plus_is_an_error() {
        assert_eq!(
            eval_err("\"a\" + 1"),
            "Operands must be two numbers or two strings."
        );
        assert_eq!(
            eval_err("1 + nil"),
            "Operands must be two numbers or two strings."
        );
    }

    #[test]
    fn test_arithmetic_type_errors() {
        assert_eq!(eval_err("1 - \"a\""), "Operands must be numbers.");
        assert_eq!(eval_err("true * 2"), "Operands must be numbers.");
        assert_eq!(eval_err("\"a\" < \"b\""), "Operands must be numbers.");
        assert_eq!(eval_err("-\"a\""), "Operand must be a number.");
    }

    #[test]
    fn test_comparison() {
        assert_eq!(eval("1 < 2"), Value::Bool(true));
        assert_eq!(eval("2 <= 2"), Value::Bool(true));
        assert_eq!(eval("1 > 2"), Value::Bool(false));
        assert_eq!(eval("3 >= 4"), Value::Bool(false));
    }

    #[test]
    fn test_equality_never_coerces() {
        assert_eq!(eval("nil == nil"), Value::Bool(true));
        assert_eq!(eval("nil == false"), Value::Bool(false));
        assert_eq!(eval("0 == false"), Value::Bool(false));
        assert_eq!(eval("\"1\" == 1"), Value::Bool(false));
        assert_eq!(eval("\"ab\" == \"ab\""), Value::Bool(true));
        assert_eq!(eval("1 != 2"), Value::Bool(true));
    }

    #[test]
    fn test_number_equality_is_identity() {
        assert_eq!(eval("0/0 == 0/0"), Value::Bool(true));
        assert_eq!(eval("0 == -0"), Value::Bool(false));
        assert_eq!(eval("-0 != 0"), Value::Bool(true));
    }

    #[test]
    fn test_truthiness() {
        assert_eq!(eval("!nil"), Value::Bool(true));
        assert_eq!(eval("!false"), Value::Bool(true));
        assert_eq!(eval("!0"), Value::Bool(false));
        assert_eq!(eval("!\"\""), Value::Bool(false));
    }

    #[test]
    fn test_logical_operators_return_operand() {
        assert_eq!(eval("nil or \"yes\""), Value::string("yes"));
        assert_eq!(eval("1 or 2"), Value::Number(1.0));
        assert_eq!(eval("nil and 2"), Value::Nil);
        assert_eq!(eval("1 and 2"), Value::Number(2.0));
        assert_eq!(eval("false or nil"), Value::Nil);
    }

    #[test]
    fn test_short_circuit_skips_right_operand() {
        // Evaluating the right side would fail with a type error
        assert_eq!(eval("true or -\"x\""), Value::Bool(true));
        assert_eq!(eval("false and -\"x\""), Value::Bool(false));
    }

    #[test]
    fn test_calling_non_callable() {
        assert_eq!(eval_err("\"not a function\"()"), "Can only call functions and classes.");
        assert_eq!(eval_err("nil()"), "Can only call functions and classes.");
    }

    #[test]
    fn test_native_arity() {
        assert_eq!(eval_err("clock(1)"), "Expected 0 arguments but got 1.");
    }

    #[test]
    fn test_undefined_global() {
        assert_eq!(eval_err("missing"), "Undefined variable 'missing'.");
        assert_eq!(eval_err("missing = 1"), "Undefined variable 'missing'.");
    }
}

#[cfg(test)]
mod program_tests {
    use crate::parser::{parse_statements, resolve, Interpreter, LoxError, OutputBuffer};
    use pretty_assertions::assert_eq;

    fn run(source: &str) -> (String, Result<(), LoxError>) {
        let program = parse_statements(source)
            .into_result()
            .expect("source should parse");
        let resolution = resolve(&program);
        assert!(resolution.errors.is_empty(), "{:?}", resolution.errors);

        let output = OutputBuffer::new();
        let mut interpreter = Interpreter::new().with_output(output.clone());
        interpreter.resolve(resolution.locals);
        let result = interpreter.interpret(&program);
        (output.contents(), result)
    }

    fn output_of(source: &str) -> String {
        let (output, result) = run(source);
        if let Err(err) = result {
            panic!("Unexpected runtime error: {}", err);
        }
        output
    }

    #[test]
    fn test_nan_variable_equals_itself() {
        assert_eq!(
            output_of("var n = 0/0; print n == n; print 0 == -0;"),
            "true\nfalse\n"
        );
    }

    #[test]
    fn test_closure_counter() {
        let source = r#"
            fun makeCounter() {
                var i = 0;
                fun count() {
                    i = i + 1;
                    print i;
                }
                return count;
            }
            var counter = makeCounter();
            counter();
            counter();
        "#;
        assert_eq!(output_of(source), "1\n2\n");
    }

    #[test]
    fn test_independent_closures() {
        let source = r#"
            fun makeCounter() {
                var i = 0;
                fun count() { i = i + 1; return i; }
                return count;
            }
            var a = makeCounter();
            var b = makeCounter();
            a(); a();
            print a();
            print b();
        "#;
        assert_eq!(output_of(source), "3\n1\n");
    }

    #[test]
    fn test_static_scope_ignores_later_shadowing() {
        let source = r#"
            var a = "global";
            {
                fun showA() { print a; }
                showA();
                var a = "block";
                showA();
            }
        "#;
        assert_eq!(output_of(source), "global\nglobal\n");
    }

    #[test]
    fn test_recursion() {
        let source = r#"
            fun fib(n) {
                if (n < 2) return n;
                return fib(n - 1) + fib(n - 2);
            }
            print fib(15);
        "#;
        assert_eq!(output_of(source), "610\n");
    }

    #[test]
    fn test_mutual_recursion_between_globals() {
        let source = r#"
            fun isEven(n) { if (n == 0) return true; return isOdd(n - 1); }
            fun isOdd(n) { if (n == 0) return false; return isEven(n - 1); }
            print isEven(10);
            print isOdd(7);
        "#;
        assert_eq!(output_of(source), "true\ntrue\n");
    }

    #[test]
    fn test_function_without_return_yields_nil() {
        assert_eq!(output_of("fun f() {} print f();"), "nil\n");
        assert_eq!(output_of("fun g() { return; } print g();"), "nil\n");
    }

    #[test]
    fn test_functions_are_values() {
        let source = r#"
            fun twice(f, x) { return f(f(x)); }
            fun inc(n) { return n + 1; }
            print twice(inc, 5);
            print inc;
            print clock;
        "#;
        assert_eq!(output_of(source), "7\n<fn inc>\n<native fn>\n");
    }

    #[test]
    fn test_for_loop() {
        assert_eq!(
            output_of("for (var i = 0; i < 3; i = i + 1) print i;"),
            "0\n1\n2\n"
        );
    }

    #[test]
    fn test_for_loop_variable_is_scoped() {
        let (_, result) = run("for (var i = 0; i < 1; i = i + 1) {} print i;");
        assert_eq!(result.unwrap_err().message, "Undefined variable 'i'.");
    }

    #[test]
    fn test_if_else() {
        assert_eq!(
            output_of("if (1 > 2) print \"a\"; else print \"b\";"),
            "b\n"
        );
        assert_eq!(output_of("if (nil) print \"a\";"), "");
    }

    #[test]
    fn test_arity_mismatch() {
        let (_, result) = run("fun f(a, b) {}\nf(1);");
        assert_eq!(
            result.unwrap_err().to_string(),
            "Expected 2 arguments but got 1.\n[line 2]"
        );
    }

    #[test]
    fn test_runtime_error_stops_execution() {
        let (output, result) = run("print 1;\nprint -nil;\nprint 2;");
        assert_eq!(output, "1\n");
        assert_eq!(
            result.unwrap_err().to_string(),
            "Operand must be a number.\n[line 2]"
        );
    }

    #[test]
    fn test_arguments_evaluated_left_to_right() {
        let source = r#"
            var log = "";
            fun note(tag) { log = log + tag; return tag; }
            fun three(a, b, c) { return a + b + c; }
            print three(note("a"), note("b"), note("c"));
            print log;
        "#;
        assert_eq!(output_of(source), "abc\nabc\n");
    }

    #[test]
    fn test_number_formatting() {
        assert_eq!(output_of("print 1.0; print 1.5; print 100;"), "1\n1.5\n100\n");
    }

    #[test]
    fn test_deep_recursion_reports_stack_overflow() {
        let (_, result) = run("fun f() { f(); }\nf();");
        assert_eq!(result.unwrap_err().message, "Stack overflow.");
    }
}
