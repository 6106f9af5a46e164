use std::{collections::HashMap, str::FromStr};

use lazy_static::lazy_static;
use regex::Regex;

use crate::lexer::Token;

#[derive(Debug, PartialEq, Clone, thiserror::Error)]
pub enum OperatorSpecError {
    #[error("malformed operator spec {0:?}, expected OP=PRECEDENCE")]
    Malformed(String),
    #[error("operator {0:?} needs a positive precedence")]
    ZeroPrecedence(char),
}

/// binary operator precedences, higher binds tighter
#[derive(Debug, Clone, PartialEq)]
pub struct OperatorTable {
    precedence: HashMap<char, u32>,
}

impl std::default::Default for OperatorTable {
    fn default() -> Self {
        let mut table = Self::empty();
        table.insert('<', 10);
        table.insert('+', 20);
        table.insert('-', 20);
        table.insert('*', 40);
        table.insert('/', 40);
        table
    }
}

impl OperatorTable {
    pub fn empty() -> Self {
        Self {
            precedence: HashMap::new(),
        }
    }

    /// add or replace an operator, returning the precedence it had before
    pub fn insert(&mut self, op: char, precedence: u32) -> Option<u32> {
        self.precedence.insert(op, precedence)
    }

    /// precedence of `op`, `None` if it is not a binary operator
    pub fn get(&self, op: char) -> Option<u32> {
        if !op.is_ascii() {
            return None;
        }
        self.precedence.get(&op).copied().filter(|&pr| pr > 0)
    }

    pub fn token_precedence(&self, token: &Token) -> Option<u32> {
        match token {
            Token::Char(op) => self.get(*op),
            _ => None,
        }
    }

    pub fn len(&self) -> usize {
        self.precedence.len()
    }

    pub fn is_empty(&self) -> bool {
        self.precedence.is_empty()
    }
}

lazy_static! {
    static ref OPERATOR_SPEC_RE: Regex = Regex::new(r"^\s*(\S)\s*=\s*(\d+)\s*$").unwrap();
}

/// an `OP=PRECEDENCE` pair as given on the command line
#[derive(Debug, PartialEq, Clone, Copy)]
pub struct OperatorSpec {
    pub op: char,
    pub precedence: u32,
}

impl FromStr for OperatorSpec {
    type Err = OperatorSpecError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let malformed = || OperatorSpecError::Malformed(s.to_string());
        let caps = OPERATOR_SPEC_RE.captures(s).ok_or_else(malformed)?;
        let op = caps[1].chars().next().ok_or_else(malformed)?;
        let precedence: u32 = caps[2].parse().map_err(|_| malformed())?;
        if precedence == 0 {
            return Err(OperatorSpecError::ZeroPrecedence(op));
        }
        Ok(OperatorSpec { op, precedence })
    }
}

impl Extend<OperatorSpec> for OperatorTable {
    fn extend<T: IntoIterator<Item = OperatorSpec>>(&mut self, iter: T) {
        for spec in iter {
            self.insert(spec.op, spec.precedence);
        }
    }
}
