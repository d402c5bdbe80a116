use crate::ast::*;
use crate::lexer::{Token, TokenType};

#[cfg(test)]
mod tests;

// Nested factors and parentheses recurse through the parser; cap the
// depth so pathological input reports an error instead of blowing the
// stack.
const MAX_NESTING_DEPTH: usize = 256;

#[derive(Debug)]
pub struct ParseError {
    pub message: String,
    pub line: usize,
}

impl std::fmt::Display for ParseError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Parse error on line {}: {}", self.line, self.message)
    }
}

impl std::error::Error for ParseError {}

pub fn parse(tokens: &[Token]) -> Result<Program, ParseError> {
    let mut parser = Parser::new(tokens);
    let statements = parser.parse_program()?;
    Ok(Program { statements })
}

pub struct Parser<'a> {
    tokens: &'a [Token],
    current: usize,
    depth: usize,
}

impl<'a> Parser<'a> {
    pub fn new(tokens: &'a [Token]) -> Self {
        Self {
            tokens,
            current: 0,
            depth: 0,
        }
    }

    pub fn parse_program(&mut self) -> Result<Vec<Statement>, ParseError> {
        let mut statements = Vec::new();

        while !self.is_at_end() {
            if self.match_token(&TokenType::Newline) {
                continue;
            }
            self.statement(&mut statements)?;
        }

        Ok(statements)
    }

    /// One statement: a compound statement or a logical line of one or
    /// more `;`-separated small statements, appended to `out`.
    fn statement(&mut self, out: &mut Vec<Statement>) -> Result<(), ParseError> {
        if self.match_token(&TokenType::If) {
            out.push(self.if_statement()?);
            return Ok(());
        }

        if self.match_token(&TokenType::While) {
            out.push(self.while_statement()?);
            return Ok(());
        }

        self.simple_line(out)
    }

    fn simple_line(&mut self, out: &mut Vec<Statement>) -> Result<(), ParseError> {
        out.push(self.small_statement()?);

        while self.match_token(&TokenType::Semicolon) {
            if self.check(&TokenType::Newline) || self.is_at_end() {
                break;
            }
            out.push(self.small_statement()?);
        }

        if !self.is_at_end() {
            self.consume(&TokenType::Newline, "Expected newline after statement")?;
        }
        Ok(())
    }

    /// `expr`, `t1 = ... = tn = expr` or `name op= expr`. Assignment
    /// targets parse as plain expressions; the executor rejects
    /// anything that is not a bare name.
    fn small_statement(&mut self) -> Result<Statement, ParseError> {
        let first = self.test()?;

        if let Some(op) = self.match_augmented_op() {
            let value = self.test()?;
            return Ok(Statement::AugAssign {
                target: first,
                op,
                value,
            });
        }

        let mut targets = Vec::new();
        let mut expr = first;
        while self.match_token(&TokenType::Assign) {
            targets.push(expr);
            expr = self.test()?;
        }

        if targets.is_empty() {
            Ok(Statement::Expression(expr))
        } else {
            Ok(Statement::Assign {
                targets,
                value: expr,
            })
        }
    }

    fn match_augmented_op(&mut self) -> Option<BinOp> {
        let op = match self.peek().token_type {
            TokenType::PlusAssign => BinOp::Add,
            TokenType::MinusAssign => BinOp::Sub,
            TokenType::StarAssign => BinOp::Mul,
            TokenType::SlashAssign => BinOp::Div,
            TokenType::SlashSlashAssign => BinOp::FloorDiv,
            TokenType::PercentAssign => BinOp::Mod,
            _ => return None,
        };
        self.advance();
        Some(op)
    }

    fn if_statement(&mut self) -> Result<Statement, ParseError> {
        let condition = self.test()?;
        self.consume(&TokenType::Colon, "Expected ':' after if condition")?;
        let suite = self.suite()?;

        let mut branches = vec![IfBranch { condition, suite }];
        let mut else_suite = None;

        loop {
            if self.match_token(&TokenType::Elif) {
                let condition = self.test()?;
                self.consume(&TokenType::Colon, "Expected ':' after elif condition")?;
                let suite = self.suite()?;
                branches.push(IfBranch { condition, suite });
            } else if self.match_token(&TokenType::Else) {
                self.consume(&TokenType::Colon, "Expected ':' after 'else'")?;
                else_suite = Some(self.suite()?);
                break;
            } else {
                break;
            }
        }

        Ok(Statement::If {
            branches,
            else_suite,
        })
    }

    fn while_statement(&mut self) -> Result<Statement, ParseError> {
        let condition = self.test()?;
        self.consume(&TokenType::Colon, "Expected ':' after while condition")?;
        let body = self.suite()?;

        Ok(Statement::While { condition, body })
    }

    /// Either the rest of the current line, or an indented block.
    fn suite(&mut self) -> Result<Vec<Statement>, ParseError> {
        let mut statements = Vec::new();

        if self.match_token(&TokenType::Newline) {
            self.consume(&TokenType::Indent, "Expected an indented block")?;
            while !self.check(&TokenType::Dedent) && !self.is_at_end() {
                self.statement(&mut statements)?;
            }
            self.consume(&TokenType::Dedent, "Expected dedent after block")?;
        } else {
            self.simple_line(&mut statements)?;
        }

        Ok(statements)
    }

    fn test(&mut self) -> Result<Expr, ParseError> {
        self.or_test()
    }

    fn or_test(&mut self) -> Result<Expr, ParseError> {
        let mut expr = self.and_test()?;

        while self.match_token(&TokenType::Or) {
            let right = self.and_test()?;
            expr = Expr::BoolOp {
                op: BoolOp::Or,
                left: Box::new(expr),
                right: Box::new(right),
            };
        }

        Ok(expr)
    }

    fn and_test(&mut self) -> Result<Expr, ParseError> {
        let mut expr = self.not_test()?;

        while self.match_token(&TokenType::And) {
            let right = self.not_test()?;
            expr = Expr::BoolOp {
                op: BoolOp::And,
                left: Box::new(expr),
                right: Box::new(right),
            };
        }

        Ok(expr)
    }

    fn not_test(&mut self) -> Result<Expr, ParseError> {
        if self.match_token(&TokenType::Not) {
            let operand = self.not_test()?;
            return Ok(Expr::Unary {
                op: UnaryOp::Not,
                operand: Box::new(operand),
            });
        }

        self.comparison()
    }

    /// A relational chain becomes a single Compare node holding every
    /// operand, so `a < b < c` keeps all three in evaluation order.
    fn comparison(&mut self) -> Result<Expr, ParseError> {
        let first = self.arith()?;

        let mut rest = Vec::new();
        while let Some(op) = self.match_comparison_op() {
            rest.push((op, self.arith()?));
        }

        if rest.is_empty() {
            Ok(first)
        } else {
            Ok(Expr::Compare {
                first: Box::new(first),
                rest,
            })
        }
    }

    fn match_comparison_op(&mut self) -> Option<CmpOp> {
        let op = match self.peek().token_type {
            TokenType::EqualEqual => CmpOp::Eq,
            TokenType::NotEqual => CmpOp::NotEq,
            TokenType::Less => CmpOp::Lt,
            TokenType::LessEqual => CmpOp::LtEq,
            TokenType::Greater => CmpOp::Gt,
            TokenType::GreaterEqual => CmpOp::GtEq,
            _ => return None,
        };
        self.advance();
        Some(op)
    }

    fn arith(&mut self) -> Result<Expr, ParseError> {
        let mut expr = self.term()?;

        loop {
            let op = if self.match_token(&TokenType::Plus) {
                BinOp::Add
            } else if self.match_token(&TokenType::Minus) {
                BinOp::Sub
            } else {
                break;
            };
            let right = self.term()?;
            expr = Expr::Binary {
                left: Box::new(expr),
                op,
                right: Box::new(right),
            };
        }

        Ok(expr)
    }

    fn term(&mut self) -> Result<Expr, ParseError> {
        let mut expr = self.factor()?;

        loop {
            let op = if self.match_token(&TokenType::Star) {
                BinOp::Mul
            } else if self.match_token(&TokenType::SlashSlash) {
                BinOp::FloorDiv
            } else if self.match_token(&TokenType::Slash) {
                BinOp::Div
            } else if self.match_token(&TokenType::Percent) {
                BinOp::Mod
            } else {
                break;
            };
            let right = self.factor()?;
            expr = Expr::Binary {
                left: Box::new(expr),
                op,
                right: Box::new(right),
            };
        }

        Ok(expr)
    }

    fn factor(&mut self) -> Result<Expr, ParseError> {
        if self.depth >= MAX_NESTING_DEPTH {
            return Err(ParseError {
                message: "expression is nested too deeply".to_string(),
                line: self.peek().line,
            });
        }
        self.depth += 1;

        let expr = if self.match_token(&TokenType::Plus) {
            let operand = self.factor()?;
            Expr::Unary {
                op: UnaryOp::Plus,
                operand: Box::new(operand),
            }
        } else if self.match_token(&TokenType::Minus) {
            let operand = self.factor()?;
            Expr::Unary {
                op: UnaryOp::Minus,
                operand: Box::new(operand),
            }
        } else {
            self.atom_expr()?
        };

        self.depth -= 1;
        Ok(expr)
    }

    fn atom_expr(&mut self) -> Result<Expr, ParseError> {
        let mut expr = self.atom()?;

        while self.match_token(&TokenType::LeftParen) {
            expr = self.finish_call(expr)?;
        }

        Ok(expr)
    }

    fn finish_call(&mut self, callee: Expr) -> Result<Expr, ParseError> {
        let mut args = Vec::new();

        if !self.check(&TokenType::RightParen) {
            loop {
                args.push(self.test()?);
                if !self.match_token(&TokenType::Comma) {
                    break;
                }
            }
        }

        self.consume(&TokenType::RightParen, "Expected ')' after arguments")?;

        Ok(Expr::Call {
            callee: Box::new(callee),
            args,
        })
    }

    fn atom(&mut self) -> Result<Expr, ParseError> {
        if self.match_token(&TokenType::Int(0)) {
            if let TokenType::Int(value) = self.previous().token_type {
                return Ok(Expr::Literal(Literal::Int(value)));
            }
        }

        if self.match_token(&TokenType::Float(0.0)) {
            if let TokenType::Float(value) = self.previous().token_type {
                return Ok(Expr::Literal(Literal::Float(value)));
            }
        }

        if self.match_token(&TokenType::Str(String::new())) {
            if let TokenType::Str(value) = self.previous().token_type.clone() {
                return Ok(Expr::Literal(Literal::Str(value)));
            }
        }

        if self.match_token(&TokenType::True) {
            return Ok(Expr::Literal(Literal::Bool(true)));
        }

        if self.match_token(&TokenType::False) {
            return Ok(Expr::Literal(Literal::Bool(false)));
        }

        if self.match_token(&TokenType::None) {
            return Ok(Expr::Literal(Literal::None));
        }

        if let TokenType::Identifier(name) = &self.peek().token_type {
            let name = name.clone();
            self.advance();
            return Ok(Expr::Name(name));
        }

        if self.match_token(&TokenType::LeftParen) {
            let expr = self.test()?;
            self.consume(&TokenType::RightParen, "Expected ')' after expression")?;
            return Ok(expr);
        }

        Err(ParseError {
            message: format!("Expected expression, got {:?}", self.peek().token_type),
            line: self.peek().line,
        })
    }

    fn match_token(&mut self, token_type: &TokenType) -> bool {
        if self.check(token_type) {
            self.advance();
            return true;
        }
        false
    }

    fn check(&self, token_type: &TokenType) -> bool {
        if self.is_at_end() {
            return false;
        }
        std::mem::discriminant(&self.peek().token_type) == std::mem::discriminant(token_type)
    }

    fn advance(&mut self) -> &Token {
        if !self.is_at_end() {
            self.current += 1;
        }
        self.previous()
    }

    fn is_at_end(&self) -> bool {
        self.current >= self.tokens.len() || matches!(self.peek().token_type, TokenType::Eof)
    }

    fn peek(&self) -> &Token {
        &self.tokens[self.current]
    }

    fn previous(&self) -> &Token {
        &self.tokens[self.current - 1]
    }

    fn consume(&mut self, token_type: &TokenType, message: &str) -> Result<&Token, ParseError> {
        if self.check(token_type) {
            return Ok(self.advance());
        }

        Err(ParseError {
            message: message.to_string(),
            line: self.peek().line,
        })
    }
}
