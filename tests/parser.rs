#[cfg(test)]
mod parser_tests {
    use lox_interpreter as lox;

    use lox::ast::{Expr, Stmt};
    use lox::ast_printer::AstPrinter;
    use lox::parser::Parser;
    use lox::scanner::scan_tokens;

    fn expr(source: &str) -> String {
        let (tokens, _) = scan_tokens(source);
        let expr = Parser::new(tokens).parse_expression().expect("expression");
        AstPrinter::print(&expr)
    }

    fn program(source: &str) -> Vec<String> {
        let (tokens, _) = scan_tokens(source);
        let statements = Parser::new(tokens).parse().expect("program");
        statements.iter().map(AstPrinter::print_stmt).collect()
    }

    fn errors(source: &str) -> Vec<String> {
        let (tokens, _) = scan_tokens(source);
        Parser::new(tokens)
            .parse()
            .expect_err("should fail")
            .iter()
            .map(ToString::to_string)
            .collect()
    }

    #[test]
    fn test_precedence_and_grouping() {
        assert_eq!(expr("1 + 2 * 3"), "(+ 1.0 (* 2.0 3.0))");
        assert_eq!(expr("(1 + 2) * 3"), "(* (group (+ 1.0 2.0)) 3.0)");
        assert_eq!(expr("-a - -b"), "(- (- a) (- b))");
        assert_eq!(expr("1 < 2 == !false"), "(== (< 1.0 2.0) (! false))");
        assert_eq!(expr("8 / 4 / 2"), "(/ (/ 8.0 4.0) 2.0)");
    }

    #[test]
    fn test_logical_binds_looser_than_equality() {
        assert_eq!(
            expr("a or b and c == d"),
            "(or a (and b (== c d)))"
        );
    }

    #[test]
    fn test_assignment_is_right_associative() {
        assert_eq!(expr("a = b = 3"), "(= a (= b 3.0))");
    }

    #[test]
    fn test_chained_calls() {
        assert_eq!(expr("f(1)(2, 3)"), "(call (call f 1.0) 2.0 3.0)");
        assert_eq!(expr("f()"), "(call f)");
    }

    #[test]
    fn test_for_loop_desugars_to_block_and_while() {
        assert_eq!(
            program("for (var i = 0; i < 3; i = i + 1) print i;"),
            vec!["(block (var i 0.0) (while (< i 3.0) (block (print i) (; (= i (+ i 1.0))))))"]
        );
    }

    #[test]
    fn test_for_loop_without_clauses() {
        assert_eq!(program("for (;;) print 1;"), vec!["(while true (print 1.0))"]);
        assert_eq!(
            program("for (x = 0; x < 1;) x = 1;"),
            vec!["(block (; (= x 0.0)) (while (< x 1.0) (; (= x 1.0))))"]
        );
    }

    #[test]
    fn test_function_and_control_flow_statements() {
        assert_eq!(
            program(
                "fun add(a, b) { return a + b; }
                 if (x) print 1; else { print 2; }
                 while (y) y = nil;"
            ),
            vec![
                "(fun add (a b) (return (+ a b)))",
                "(if x (print 1.0) (block (print 2.0)))",
                "(while y (; (= y nil)))",
            ]
        );
    }

    #[test]
    fn test_invalid_assignment_target_is_reported_once() {
        assert_eq!(
            errors("1 = 2;"),
            vec!["[line 1] Error at '=': Invalid assignment target."]
        );
        assert_eq!(
            errors("a + b = c;"),
            vec!["[line 1] Error at '=': Invalid assignment target."]
        );
    }

    #[test]
    fn test_panic_mode_recovery_reports_later_errors() {
        assert_eq!(
            errors("var = 1;\nprint 2;\nvar x = ;\nprint 3;"),
            vec![
                "[line 1] Error at '=': Expect variable name.",
                "[line 3] Error at ';': Expect expression.",
            ]
        );
    }

    #[test]
    fn test_missing_semicolon_at_end() {
        assert_eq!(
            errors("print 1"),
            vec!["[line 1] Error at end: Expect ';' after value."]
        );
    }

    #[test]
    fn test_reserved_class_words_have_no_production() {
        assert_eq!(
            errors("class Foo {}"),
            vec!["[line 1] Error at 'class': Expect expression."]
        );
        assert_eq!(
            errors("print this;"),
            vec!["[line 1] Error at 'this': Expect expression."]
        );
        assert_eq!(
            errors("super.x;"),
            vec!["[line 1] Error at 'super': Expect expression."]
        );
    }

    #[test]
    fn test_argument_cap_is_reported_but_not_fatal() {
        let args = vec!["1"; 256].join(", ");
        let errs = errors(&format!("f({});", args));

        assert_eq!(
            errs,
            vec!["[line 1] Error at '1': Can't have more than 255 arguments."]
        );

        let args = vec!["1"; 255].join(", ");
        assert_eq!(program(&format!("f({});", args)).len(), 1);
    }

    #[test]
    fn test_parameter_cap_is_reported() {
        let params: Vec<String> = (0..256).map(|i| format!("p{}", i)).collect();
        let errs = errors(&format!("fun f({}) {{}}", params.join(", ")));

        assert_eq!(
            errs,
            vec!["[line 1] Error at 'p255': Can't have more than 255 parameters."]
        );
    }

    #[test]
    fn test_node_ids_start_at_offset_and_are_unique() {
        let (tokens, _) = scan_tokens("a = b; print a;");
        let mut parser = Parser::with_first_id(tokens, 10);
        let statements = parser.parse().unwrap();

        let mut ids = Vec::new();
        for stmt in &statements {
            let expr = match stmt {
                Stmt::Expression(e) | Stmt::Print(e) => e,
                other => panic!("unexpected {:?}", other),
            };
            ids.push(expr.id().unwrap());
            if let Expr::Assign { value, .. } = expr {
                ids.push(value.id().unwrap());
            }
        }

        let mut sorted: Vec<usize> = ids.iter().map(|id| id.0).collect();
        sorted.sort();
        sorted.dedup();
        assert_eq!(sorted.len(), ids.len());
        assert!(sorted.iter().all(|&id| id >= 10));
        assert_eq!(parser.next_id(), 13);
    }

    #[test]
    fn test_trailing_tokens_after_expression() {
        let (tokens, _) = scan_tokens("1 2");
        let errs = Parser::new(tokens).parse_expression().unwrap_err();

        assert_eq!(errs[0].to_string(), "[line 1] Error at '2': Expect end of expression.");
    }
}
