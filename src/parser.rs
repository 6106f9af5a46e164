use std::str::Chars;

use crate::ast::{ASTNode, Expression, Function, Prototype};
use crate::lexer::{Lexer, Token};
use crate::precedence::OperatorTable;

#[derive(Debug, PartialEq, Clone, thiserror::Error)]
pub enum ParseError {
    #[error("unknown token {0} when expecting an expression")]
    UnknownToken(Token),
    #[error("expected ')' but found {0}")]
    ExpectedCloseParen(Token),
    #[error("expected ')' or ',' in argument list but found {0}")]
    ExpectedArgumentDelimiter(Token),
    #[error("expected function name in prototype but found {0}")]
    ExpectedFunctionName(Token),
    #[error("expected '(' in prototype but found {0}")]
    ExpectedPrototypeOpen(Token),
    #[error("expected ')' in prototype but found {0}")]
    ExpectedPrototypeClose(Token),
    #[error("expression nested deeper than {0} levels")]
    NestingTooDeep(usize),
}

pub type PartialParseResult = Result<Expression, ParseError>;

/// how many expressions may be open inside one another (parentheses and
/// call arguments) before parsing gives up instead of exhausting the stack
pub const MAX_NESTING_DEPTH: usize = 256;

/// note the failure where it happens, then hand it back for propagation.
/// reporting it to the user is up to whoever receives the error
fn fail<T>(err: ParseError) -> Result<T, ParseError> {
    log::debug!("parse failed: {}", err);
    Err(err)
}

/// recursive descent parser with one token of lookahead
pub struct Parser<I: Iterator<Item = char>> {
    lexer: Lexer<I>,
    current: Token,
    operators: OperatorTable,
    depth: usize,
}

impl<'a> Parser<Chars<'a>> {
    pub fn from_source(source: &'a str, operators: OperatorTable) -> Self {
        Parser::new(Lexer::from_source(source), operators)
    }
}

impl<I: Iterator<Item = char>> Parser<I> {
    pub fn new(mut lexer: Lexer<I>, operators: OperatorTable) -> Self {
        let current = lexer.next_token();
        Parser {
            lexer,
            current,
            operators,
            depth: 0,
        }
    }

    pub fn current_token(&self) -> &Token {
        &self.current
    }

    /// move on to the next token, returning the one just consumed
    pub fn next_token(&mut self) -> Token {
        let next = self.lexer.next_token();
        std::mem::replace(&mut self.current, next)
    }

    fn at_char(&self, c: char) -> bool {
        self.current == Token::Char(c)
    }

    fn current_operator(&self) -> Option<(char, u32)> {
        match self.current {
            Token::Char(op) => self.operators.get(op).map(|pr| (op, pr)),
            _ => None,
        }
    }

    pub fn parse_number(&mut self) -> PartialParseResult {
        match self.current {
            Token::Number(num) => {
                self.next_token();
                Ok(Expression::Number(num))
            }
            _ => fail(ParseError::UnknownToken(self.current.clone())),
        }
    }

    pub fn parse_paren(&mut self) -> PartialParseResult {
        if !self.at_char('(') {
            return fail(ParseError::UnknownToken(self.current.clone()));
        }
        self.next_token();
        let res = self.parse_expression()?;
        if !self.at_char(')') {
            return fail(ParseError::ExpectedCloseParen(self.current.clone()));
        }
        self.next_token();
        Ok(res)
    }

    pub fn parse_identifier(&mut self) -> PartialParseResult {
        let ident = match &self.current {
            Token::Ident(ident) => ident.clone(),
            other => return fail(ParseError::UnknownToken(other.clone())),
        };
        self.next_token();

        if !self.at_char('(') {
            return Ok(Expression::Variable(ident));
        }
        self.next_token();

        let mut args = Vec::new();
        if !self.at_char(')') {
            loop {
                args.push(self.parse_expression()?);

                if self.at_char(')') {
                    break;
                }
                if !self.at_char(',') {
                    return fail(ParseError::ExpectedArgumentDelimiter(self.current.clone()));
                }
                self.next_token();
            }
        }
        self.next_token();

        Ok(Expression::Call(ident, args))
    }

    pub fn parse_primary(&mut self) -> PartialParseResult {
        match self.current {
            Token::Ident(_) => self.parse_identifier(),
            Token::Number(_) => self.parse_number(),
            Token::Char('(') => self.parse_paren(),
            _ => fail(ParseError::UnknownToken(self.current.clone())),
        }
    }

    /// precedence climbing over the operators following `lhs`
    pub fn parse_binops_right(
        &mut self,
        min_precedence: u32,
        lhs: Expression,
    ) -> PartialParseResult {
        let mut result = lhs;

        loop {
            let (operator, precedence) = match self.current_operator() {
                Some((op, pr)) if pr >= min_precedence => (op, pr),
                _ => return Ok(result),
            };
            self.next_token();

            let mut rhs = self.parse_primary()?;

            match self.current_operator() {
                Some((_, next_precedence)) if precedence < next_precedence => {
                    rhs = self.parse_binops_right(precedence + 1, rhs)?
                }
                _ => (),
            }

            result = Expression::binary(operator, result, rhs);
        }
    }

    pub fn parse_expression(&mut self) -> PartialParseResult {
        if self.depth >= MAX_NESTING_DEPTH {
            return fail(ParseError::NestingTooDeep(MAX_NESTING_DEPTH));
        }
        self.depth += 1;
        let res = self
            .parse_primary()
            .and_then(|lhs| self.parse_binops_right(0, lhs));
        self.depth -= 1;
        res
    }

    /// `name(arg arg ...)`
    pub fn parse_prototype(&mut self) -> Result<Prototype, ParseError> {
        let name = match &self.current {
            Token::Ident(name) => name.clone(),
            other => return fail(ParseError::ExpectedFunctionName(other.clone())),
        };
        self.next_token();

        if !self.at_char('(') {
            return fail(ParseError::ExpectedPrototypeOpen(self.current.clone()));
        }
        self.next_token();

        let mut args = Vec::new();
        while let Token::Ident(arg) = &self.current {
            args.push(arg.clone());
            self.next_token();
        }

        if !self.at_char(')') {
            return fail(ParseError::ExpectedPrototypeClose(self.current.clone()));
        }
        self.next_token();

        Ok(Prototype { name, args })
    }

    pub fn parse_definition(&mut self) -> Result<Function, ParseError> {
        // def
        self.next_token();
        let prototype = self.parse_prototype()?;
        let body = self.parse_expression()?;
        Ok(Function { prototype, body })
    }

    pub fn parse_extern(&mut self) -> Result<Prototype, ParseError> {
        // extern
        self.next_token();
        self.parse_prototype()
    }

    pub fn parse_top_level_expression(&mut self) -> Result<Function, ParseError> {
        let body = self.parse_expression()?;
        Ok(Function::anonymous(body))
    }

    /// next top-level item, skipping separators, or `None` at end of input
    pub fn parse_top_level(&mut self) -> Option<Result<ASTNode, ParseError>> {
        while self.at_char(';') {
            self.next_token();
        }

        let node = match self.current {
            Token::Eof => return None,
            Token::Def => self.parse_definition().map(ASTNode::Function),
            Token::Extern => self.parse_extern().map(ASTNode::Extern),
            _ => self.parse_top_level_expression().map(ASTNode::Function),
        };
        if let Ok(node) = &node {
            log::debug!("parsed top-level item: {}", node);
        }
        Some(node)
    }

    /// parse every top-level item, giving up at the first error
    pub fn parse_program(&mut self) -> Result<Vec<ASTNode>, ParseError> {
        let mut ast = Vec::new();
        while let Some(node) = self.parse_top_level() {
            ast.push(node?);
        }
        Ok(ast)
    }

    /// parse every top-level item, skipping a token after each error and
    /// carrying on from there
    pub fn parse_program_recovering(&mut self) -> (Vec<ASTNode>, Vec<ParseError>) {
        let mut ast = Vec::new();
        let mut errors = Vec::new();
        while let Some(node) = self.parse_top_level() {
            match node {
                Ok(node) => ast.push(node),
                Err(err) => {
                    let skipped = self.next_token();
                    log::debug!("skipping {} to recover", skipped);
                    errors.push(err);
                }
            }
        }
        (ast, errors)
    }
}
