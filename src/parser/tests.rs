#[cfg(test)]
mod tests {
    use crate::ast::{BinOp, BoolOp, CmpOp, Expr, Literal, Statement};
    use crate::lexer::tokenize;
    use crate::parser::parse;

    fn parse_source(source: &str) -> Vec<Statement> {
        let tokens = tokenize(source).unwrap();
        parse(&tokens).unwrap().statements
    }

    #[test]
    fn test_expression_statement() {
        let statements = parse_source("x + y\n");

        match &statements[0] {
            Statement::Expression(Expr::Binary {
                left,
                op: BinOp::Add,
                right,
            }) => {
                match &**left {
                    Expr::Name(name) => assert_eq!(name, "x"),
                    _ => panic!("Expected name x"),
                }
                match &**right {
                    Expr::Name(name) => assert_eq!(name, "y"),
                    _ => panic!("Expected name y"),
                }
            }
            _ => panic!("Expected binary expression"),
        }
    }

    #[test]
    fn test_assignment_chain() {
        let statements = parse_source("a = b = 5\n");

        match &statements[0] {
            Statement::Assign { targets, value } => {
                assert_eq!(targets.len(), 2);
                match &targets[0] {
                    Expr::Name(name) => assert_eq!(name, "a"),
                    _ => panic!("Expected name a"),
                }
                match &targets[1] {
                    Expr::Name(name) => assert_eq!(name, "b"),
                    _ => panic!("Expected name b"),
                }
                match value {
                    Expr::Literal(Literal::Int(5)) => (),
                    _ => panic!("Expected integer literal 5"),
                }
            }
            _ => panic!("Expected assignment"),
        }
    }

    #[test]
    fn test_augmented_assignment() {
        let statements = parse_source("x += 3\n");

        match &statements[0] {
            Statement::AugAssign {
                target,
                op: BinOp::Add,
                value,
            } => {
                match target {
                    Expr::Name(name) => assert_eq!(name, "x"),
                    _ => panic!("Expected name target"),
                }
                match value {
                    Expr::Literal(Literal::Int(3)) => (),
                    _ => panic!("Expected integer literal 3"),
                }
            }
            _ => panic!("Expected augmented assignment"),
        }
    }

    #[test]
    fn test_chained_comparison_is_one_node() {
        let statements = parse_source("1 < x < 3\n");

        match &statements[0] {
            Statement::Expression(Expr::Compare { first, rest }) => {
                match &**first {
                    Expr::Literal(Literal::Int(1)) => (),
                    _ => panic!("Expected integer literal 1"),
                }
                assert_eq!(rest.len(), 2);
                assert_eq!(rest[0].0, CmpOp::Lt);
                assert_eq!(rest[1].0, CmpOp::Lt);
            }
            _ => panic!("Expected comparison chain"),
        }
    }

    #[test]
    fn test_multiplication_binds_tighter_than_addition() {
        let statements = parse_source("1 + 2 * 3\n");

        match &statements[0] {
            Statement::Expression(Expr::Binary {
                op: BinOp::Add,
                right,
                ..
            }) => match &**right {
                Expr::Binary { op: BinOp::Mul, .. } => (),
                _ => panic!("Expected multiplication on the right"),
            },
            _ => panic!("Expected addition at the top"),
        }
    }

    #[test]
    fn test_boolean_operators_nest_lazily() {
        let statements = parse_source("a or b and not c\n");

        match &statements[0] {
            Statement::Expression(Expr::BoolOp {
                op: BoolOp::Or,
                right,
                ..
            }) => match &**right {
                Expr::BoolOp {
                    op: BoolOp::And, ..
                } => (),
                _ => panic!("Expected 'and' under 'or'"),
            },
            _ => panic!("Expected 'or' at the top"),
        }
    }

    #[test]
    fn test_if_elif_else() {
        let source = "\
if a:
    x = 1
elif b:
    x = 2
else:
    x = 3
";
        let statements = parse_source(source);

        match &statements[0] {
            Statement::If {
                branches,
                else_suite: Some(else_suite),
            } => {
                assert_eq!(branches.len(), 2);
                assert_eq!(branches[0].suite.len(), 1);
                assert_eq!(branches[1].suite.len(), 1);
                assert_eq!(else_suite.len(), 1);
            }
            _ => panic!("Expected if statement with else"),
        }
    }

    #[test]
    fn test_while_with_indented_suite() {
        let source = "\
while i < 3:
    i += 1
    print(i)
";
        let statements = parse_source(source);

        match &statements[0] {
            Statement::While { condition, body } => {
                match condition {
                    Expr::Compare { .. } => (),
                    _ => panic!("Expected comparison condition"),
                }
                assert_eq!(body.len(), 2);
            }
            _ => panic!("Expected while statement"),
        }
    }

    #[test]
    fn test_inline_suite_on_the_header_line() {
        let statements = parse_source("if x: y = 1\n");

        match &statements[0] {
            Statement::If { branches, .. } => {
                assert_eq!(branches[0].suite.len(), 1);
            }
            _ => panic!("Expected if statement"),
        }
    }

    #[test]
    fn test_semicolons_separate_small_statements() {
        let statements = parse_source("a = 1; b = 2\n");
        assert_eq!(statements.len(), 2);
    }

    #[test]
    fn test_print_call() {
        let statements = parse_source("print(x)\n");

        match &statements[0] {
            Statement::Expression(Expr::Call { callee, args }) => {
                match &**callee {
                    Expr::Name(name) => assert_eq!(name, "print"),
                    _ => panic!("Expected name callee"),
                }
                assert_eq!(args.len(), 1);
            }
            _ => panic!("Expected call expression"),
        }
    }

    #[test]
    fn test_nested_blocks() {
        let source = "\
while a:
    if b:
        c = 1
    d = 2
";
        let statements = parse_source(source);

        match &statements[0] {
            Statement::While { body, .. } => {
                assert_eq!(body.len(), 2);
                match &body[0] {
                    Statement::If { branches, .. } => assert_eq!(branches[0].suite.len(), 1),
                    _ => panic!("Expected nested if"),
                }
            }
            _ => panic!("Expected while statement"),
        }
    }

    #[test]
    fn test_parenthesized_grouping() {
        let statements = parse_source("(1 + 2) * 3\n");

        match &statements[0] {
            Statement::Expression(Expr::Binary {
                op: BinOp::Mul,
                left,
                ..
            }) => match &**left {
                Expr::Binary { op: BinOp::Add, .. } => (),
                _ => panic!("Expected addition inside the parentheses"),
            },
            _ => panic!("Expected multiplication at the top"),
        }
    }

    #[test]
    fn test_missing_colon_is_an_error() {
        let tokens = tokenize("if x\n    y = 1\n").unwrap();
        assert!(parse(&tokens).is_err());
    }

    #[test]
    fn test_deep_nesting_is_reported_not_crashed() {
        let source = format!("x = {}1{}\n", "(".repeat(300), ")".repeat(300));
        let tokens = tokenize(&source).unwrap();
        assert!(parse(&tokens).is_err());
    }
}
