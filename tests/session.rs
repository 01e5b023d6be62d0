mod common;

#[cfg(test)]
mod session_tests {
    use super::common::{run, session};
    use lox_interpreter::value::Value;
    use lox_interpreter::Outcome;

    #[test]
    fn test_syntax_error_gates_execution() {
        let (outcome, out, session) = run("print \"before\";\nvar = 1;");

        assert_eq!(outcome, Outcome::CompileError);
        assert_eq!(out, "");
        assert!(session.had_error());
        assert_eq!(
            session.reporter().errors,
            vec!["[line 2] Error at '=': Expect variable name."]
        );
    }

    #[test]
    fn test_lexical_error_gates_execution() {
        let (outcome, out, session) = run("print 1; @");

        assert_eq!(outcome, Outcome::CompileError);
        assert_eq!(out, "");
        assert_eq!(
            session.reporter().errors,
            vec!["[line 1] Error: Unexpected character."]
        );
    }

    #[test]
    fn test_lexical_and_syntax_errors_are_both_reported() {
        let (outcome, _, session) = run("var a = #;\nprint ;");

        assert_eq!(outcome, Outcome::CompileError);
        assert_eq!(
            session.reporter().errors,
            vec![
                "[line 1] Error: Unexpected character.",
                "[line 1] Error at ';': Expect expression.",
                "[line 2] Error at ';': Expect expression.",
            ]
        );
    }

    #[test]
    fn test_resolution_error_gates_execution() {
        let (outcome, out, session) = run("print \"x\";\n{ var a = a; }");

        assert_eq!(outcome, Outcome::CompileError);
        assert_eq!(out, "");
        assert_eq!(
            session.reporter().errors,
            vec!["[line 2] Error at 'a': Can't read local variable in its own initializer."]
        );
        assert!(session.reporter().runtime_errors.is_empty());
    }

    #[test]
    fn test_top_level_self_reference_is_a_runtime_matter() {
        let (outcome, _, lox) = run("var a = a;");

        assert_eq!(outcome, Outcome::RuntimeError);
        assert!(!lox.had_error());
        assert!(lox.had_runtime_error());
        assert_eq!(
            lox.reporter().runtime_errors,
            vec!["Undefined variable 'a'.\n[line 1]"]
        );

        let (mut session, buffer) = session();
        assert_eq!(session.run("var a = 1;"), Outcome::Completed);
        assert_eq!(session.run("var a = a + 1; print a;"), Outcome::Completed);
        assert_eq!(buffer.contents(), "2\n");
    }

    #[test]
    fn test_top_level_redeclaration_rebinds() {
        let (outcome, out, _) = run("var a = 1; var a = 2; print a;");

        assert_eq!(outcome, Outcome::Completed);
        assert_eq!(out, "2\n");
    }

    #[test]
    fn test_globals_persist_across_runs() {
        let (mut session, buffer) = session();

        assert_eq!(session.run("var greeting = \"hi\";"), Outcome::Completed);
        assert_eq!(session.run("print greeting;"), Outcome::Completed);
        assert_eq!(buffer.contents(), "hi\n");
    }

    #[test]
    fn test_closures_from_an_earlier_run_keep_their_bindings() {
        let (mut session, buffer) = session();

        let define = "
            fun make() {
                var i = 0;
                fun count() { i = i + 1; return i; }
                return count;
            }
            var c = make();
        ";
        assert_eq!(session.run(define), Outcome::Completed);
        assert_eq!(session.run("{ var i = 100; print c(); }"), Outcome::Completed);
        assert_eq!(session.run("print c();"), Outcome::Completed);

        assert_eq!(buffer.contents(), "1\n2\n");
    }

    #[test]
    fn test_runtime_error_leaves_session_usable() {
        let (mut session, buffer) = session();

        assert_eq!(
            session.run("var a = 1;\n{ var a = 2; fun inner() { return nope; } inner(); }"),
            Outcome::RuntimeError
        );
        assert_eq!(
            session.reporter().runtime_errors,
            vec!["Undefined variable 'nope'.\n[line 2]"]
        );

        assert_eq!(session.run("print a;"), Outcome::Completed);
        assert!(!session.had_runtime_error());
        assert_eq!(buffer.contents(), "1\n");
    }

    #[test]
    fn test_error_flag_resets_between_runs() {
        let (mut session, buffer) = session();

        assert_eq!(session.run("print ;"), Outcome::CompileError);
        assert!(session.had_error());

        assert_eq!(session.run("print 1;"), Outcome::Completed);
        assert!(!session.had_error());
        assert_eq!(buffer.contents(), "1\n");
    }

    #[test]
    fn test_evaluate_single_expression() {
        let (mut session, _) = session();

        assert_eq!(session.evaluate("1 + 2 * 3"), Ok(Value::Number(7.0)));
        assert_eq!(session.evaluate("\"a\" + \"b\""), Ok(Value::from("ab")));
        assert_eq!(session.evaluate("1 +"), Err(Outcome::CompileError));
        assert_eq!(session.evaluate("missing"), Err(Outcome::RuntimeError));

        assert_eq!(session.run("var x = 4;"), Outcome::Completed);
        assert_eq!(session.evaluate("x * x"), Ok(Value::Number(16.0)));
    }

    #[test]
    fn test_evaluated_value_type_names() {
        let (mut session, _) = session();

        let type_of = |lox: &mut lox_interpreter::Lox<_>, source: &str| {
            lox.evaluate(source).map(|value| value.type_name())
        };

        assert_eq!(type_of(&mut session, "nil"), Ok("nil"));
        assert_eq!(type_of(&mut session, "1 < 2"), Ok("boolean"));
        assert_eq!(type_of(&mut session, "-4"), Ok("number"));
        assert_eq!(type_of(&mut session, "\"s\" + \"t\""), Ok("string"));
        assert_eq!(type_of(&mut session, "clock"), Ok("function"));
    }

    #[test]
    fn test_compile_and_runtime_errors_reach_separate_channels() {
        let (outcome, _, lox) = run("print 1 +;");
        assert_eq!(outcome, Outcome::CompileError);
        assert_eq!(lox.reporter().errors.len(), 1);
        assert!(lox.reporter().runtime_errors.is_empty());

        let (outcome, _, lox) = run("print -nil;");
        assert_eq!(outcome, Outcome::RuntimeError);
        assert!(lox.reporter().errors.is_empty());
        assert_eq!(
            lox.reporter().runtime_errors,
            vec!["Operand must be a number.\n[line 1]"]
        );
    }
}
