#[cfg(test)]
mod scanner_tests {
    use lox_interpreter as lox;

    use lox::error::LoxError;
    use lox::scanner::*;
    use lox::token::*;

    fn assert_token_sequence(source: &str, expected: &[(TokenType, &str)]) {
        let scanner = Scanner::new(source);
        let tokens: Vec<_> = scanner.filter_map(Result::ok).collect();

        assert_eq!(tokens.len(), expected.len());

        for (actual, (expected_type, expected_lexeme)) in tokens.iter().zip(expected.iter()) {
            assert_eq!(actual.token_type, *expected_type);
            assert_eq!(actual.lexeme, *expected_lexeme);
        }
    }

    #[test]
    fn test_scanner_01_symbols() {
        assert_token_sequence(
            "({*.,+*})",
            &[
                (TokenType::LEFT_PAREN, "("),
                (TokenType::LEFT_BRACE, "{"),
                (TokenType::STAR, "*"),
                (TokenType::DOT, "."),
                (TokenType::COMMA, ","),
                (TokenType::PLUS, "+"),
                (TokenType::STAR, "*"),
                (TokenType::RIGHT_BRACE, "}"),
                (TokenType::RIGHT_PAREN, ")"),
                (TokenType::EOF, ""),
            ],
        );
    }

    #[test]
    fn test_two_char_operators_use_maximal_munch() {
        assert_token_sequence(
            "!= == <= >= ! = < > ===",
            &[
                (TokenType::BANG_EQUAL, "!="),
                (TokenType::EQUAL_EQUAL, "=="),
                (TokenType::LESS_EQUAL, "<="),
                (TokenType::GREATER_EQUAL, ">="),
                (TokenType::BANG, "!"),
                (TokenType::EQUAL, "="),
                (TokenType::LESS, "<"),
                (TokenType::GREATER, ">"),
                (TokenType::EQUAL_EQUAL, "=="),
                (TokenType::EQUAL, "="),
                (TokenType::EOF, ""),
            ],
        );
    }

    #[test]
    fn test_comments_and_slash() {
        assert_token_sequence(
            "a / b // the rest / is ignored\nc",
            &[
                (TokenType::IDENTIFIER, "a"),
                (TokenType::SLASH, "/"),
                (TokenType::IDENTIFIER, "b"),
                (TokenType::IDENTIFIER, "c"),
                (TokenType::EOF, ""),
            ],
        );
    }

    #[test]
    fn test_keywords_and_identifiers() {
        assert_token_sequence(
            "and class else false for fun if nil or print return super this true var while \
             _x1 orchid",
            &[
                (TokenType::AND, "and"),
                (TokenType::CLASS, "class"),
                (TokenType::ELSE, "else"),
                (TokenType::FALSE, "false"),
                (TokenType::FOR, "for"),
                (TokenType::FUN, "fun"),
                (TokenType::IF, "if"),
                (TokenType::NIL, "nil"),
                (TokenType::OR, "or"),
                (TokenType::PRINT, "print"),
                (TokenType::RETURN, "return"),
                (TokenType::SUPER, "super"),
                (TokenType::THIS, "this"),
                (TokenType::TRUE, "true"),
                (TokenType::VAR, "var"),
                (TokenType::WHILE, "while"),
                (TokenType::IDENTIFIER, "_x1"),
                (TokenType::IDENTIFIER, "orchid"),
                (TokenType::EOF, ""),
            ],
        );
    }

    #[test]
    fn test_number_literals() {
        let (tokens, errors) = scan_tokens("123 3.25 7. .5");
        assert!(errors.is_empty());

        let kinds: Vec<_> = tokens.iter().map(|t| t.token_type.clone()).collect();
        assert_eq!(
            kinds,
            vec![
                TokenType::NUMBER(0.0),
                TokenType::NUMBER(0.0),
                TokenType::NUMBER(0.0),
                TokenType::DOT,
                TokenType::DOT,
                TokenType::NUMBER(0.0),
                TokenType::EOF,
            ]
        );

        match (&tokens[0].token_type, &tokens[1].token_type, &tokens[5].token_type) {
            (TokenType::NUMBER(a), TokenType::NUMBER(b), TokenType::NUMBER(c)) => {
                assert_eq!(*a, 123.0);
                assert_eq!(*b, 3.25);
                assert_eq!(*c, 5.0);
            }
            other => panic!("unexpected tokens {:?}", other),
        }

        assert_eq!(tokens[0].to_string(), "NUMBER 123 123.0");
        assert_eq!(tokens[1].to_string(), "NUMBER 3.25 3.25");
    }

    #[test]
    fn test_integral_literal_beyond_i64_keeps_trailing_zero() {
        let (tokens, errors) = scan_tokens("9223372036854775808 100000000000000000000000");
        assert!(errors.is_empty());

        assert_eq!(tokens[0].literal(), "9223372036854775808.0");
        assert_eq!(
            tokens[1].to_string(),
            "NUMBER 100000000000000000000000 100000000000000000000000.0"
        );
    }

    #[test]
    fn test_multiline_string_advances_line_counter() {
        let (tokens, errors) = scan_tokens("\"one\ntwo\" x");
        assert!(errors.is_empty());

        assert!(matches!(&tokens[0].token_type, TokenType::STRING(s) if s == "one\ntwo"));
        assert_eq!(tokens[0].lexeme, "\"one\ntwo\"");
        assert_eq!(tokens[1].line, 2);
        assert_eq!(tokens[0].to_string(), "STRING \"one\ntwo\" one\ntwo");
    }

    #[test]
    fn test_unterminated_string_reports_and_still_ends_with_eof() {
        let (tokens, errors) = scan_tokens("print \"abc\n");

        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].to_string(), "[line 2] Error: Unterminated string.");

        assert_eq!(tokens.len(), 2);
        assert_eq!(tokens[0].token_type, TokenType::PRINT);
        assert_eq!(tokens[1].token_type, TokenType::EOF);
        assert_eq!(tokens[1].line, 2);
    }

    #[test]
    fn test_eof_line_is_final_line_count() {
        let (tokens, _) = scan_tokens("a\nb\n\n");

        let eof = tokens.last().unwrap();
        assert_eq!(eof.token_type, TokenType::EOF);
        assert_eq!(eof.line, 4);
        assert_eq!(tokens.iter().filter(|t| t.token_type == TokenType::EOF).count(), 1);
    }

    #[test]
    fn test_unexpected_chars_token_sequence() {
        let source = ",.$(#";
        let scanner = Scanner::new(source);

        // Collect all results (both tokens and errors)
        let results: Vec<_> = scanner.collect();

        // 0: COMMA ','
        // 1: DOT '.'
        // 2: Error for '$'
        // 3: LEFT_PAREN '('
        // 4: Error for '#'
        // 5: EOF
        assert_eq!(results.len(), 6, "Expected 6 items in result");

        assert_token_matches(&results[0], TokenType::COMMA, ",");
        assert_token_matches(&results[1], TokenType::DOT, ".");
        assert_token_matches(&results[3], TokenType::LEFT_PAREN, "(");
        assert_token_matches(&results[5], TokenType::EOF, "");

        let error_count = results.iter().filter(|r| r.is_err()).count();
        assert_eq!(error_count, 2, "Expected 2 error messages");

        for err in results.iter().filter_map(|r| r.as_ref().err()) {
            assert_eq!(err.to_string(), "[line 1] Error: Unexpected character.");
        }

        fn assert_token_matches(
            result: &Result<Token, LoxError>,
            expected_type: TokenType,
            expected_lexeme: &str,
        ) {
            match result {
                Ok(token) => {
                    assert_eq!(
                        token.token_type, expected_type,
                        "Expected token type {:?}, got {:?}",
                        expected_type, token.token_type
                    );
                    assert_eq!(
                        token.lexeme, expected_lexeme,
                        "Expected lexeme '{}', got '{}'",
                        expected_lexeme, token.lexeme
                    );
                }
                Err(e) => panic!("Expected token but got error: {}", e),
            }
        }
    }

    #[test]
    fn test_non_ascii_character_is_one_error() {
        let (tokens, errors) = scan_tokens("a é b");

        assert_eq!(errors.len(), 1);
        assert_eq!(tokens.len(), 3);
        assert_eq!(tokens[1].lexeme, "b");
    }

    #[test]
    fn test_scanner_is_fused() {
        let mut scanner = Scanner::new("x");
        assert!(scanner.next().is_some());
        assert!(scanner.next().is_some());
        assert!(scanner.next().is_none());
        assert!(scanner.next().is_none());
    }
}
