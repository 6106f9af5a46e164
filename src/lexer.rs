use std::{fmt, str::Chars};

use lazy_static::lazy_static;
use regex::Regex;

#[derive(Debug, PartialEq, Clone)]
pub enum Token {
    Eof,
    Def,
    Extern,
    Ident(String),
    Number(f64),
    /// any other single character, operators and punctuation included
    Char(char),
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Token::Eof => write!(f, "end of input"),
            Token::Def => write!(f, "def"),
            Token::Extern => write!(f, "extern"),
            Token::Ident(ident) => write!(f, "identifier {}", ident),
            Token::Number(num) => write!(f, "number {}", num),
            Token::Char(c) => write!(f, "'{}'", c),
        }
    }
}

lazy_static! {
    // longest prefix of a digit/point run that reads as a decimal literal
    static ref NUMBER_PREFIX_RE: Regex = Regex::new(r"^(?:\d+\.?\d*|\.\d+)").unwrap();
}

/// convert a run of digits and points into a number, never failing:
/// `1.2.3` reads as 1.2 and a lone `.` reads as 0
fn parse_number(text: &str) -> f64 {
    NUMBER_PREFIX_RE
        .find(text)
        .and_then(|prefix| prefix.as_str().parse().ok())
        .unwrap_or(0.0)
}

fn is_number_char(c: char) -> bool {
    c.is_ascii_digit() || c == '.'
}

/// pull based lexer - hands out one token per call to `next_token`
pub struct Lexer<I: Iterator<Item = char>> {
    input: I,
    /// next unconsumed character, `None` at end of input
    last_char: Option<char>,
    done: bool,
}

impl<'a> Lexer<Chars<'a>> {
    pub fn from_source(source: &'a str) -> Self {
        Lexer::new(source.chars())
    }
}

impl<I: Iterator<Item = char>> Lexer<I> {
    pub fn new(input: I) -> Self {
        Lexer {
            input,
            last_char: Some(' '),
            done: false,
        }
    }

    fn advance(&mut self) {
        self.last_char = self.input.next();
    }

    /// read while `pred` holds, starting from the current character
    fn take_while(&mut self, pred: impl Fn(char) -> bool) -> String {
        let mut buf = String::new();
        while let Some(c) = self.last_char.filter(|&c| pred(c)) {
            buf.push(c);
            self.advance();
        }
        buf
    }

    pub fn next_token(&mut self) -> Token {
        let token = self.scan();
        log::trace!("lexed {:?}", token);
        token
    }

    fn scan(&mut self) -> Token {
        loop {
            while self.last_char.map_or(false, char::is_whitespace) {
                self.advance();
            }

            let c = match self.last_char {
                Some(c) => c,
                None => return Token::Eof,
            };

            if c.is_alphabetic() {
                let ident = self.take_while(char::is_alphanumeric);
                return match ident.as_str() {
                    "def" => Token::Def,
                    "extern" => Token::Extern,
                    _ => Token::Ident(ident),
                };
            }

            if is_number_char(c) {
                let text = self.take_while(is_number_char);
                return Token::Number(parse_number(&text));
            }

            if c == '#' {
                while self.last_char.map_or(false, |c| c != '\n' && c != '\r') {
                    self.advance();
                }
                // the newline (or eof) is dealt with on the next pass
                continue;
            }

            self.advance();
            return Token::Char(c);
        }
    }
}

impl<I: Iterator<Item = char>> Iterator for Lexer<I> {
    type Item = Token;

    fn next(&mut self) -> Option<Token> {
        if self.done {
            return None;
        }
        match self.next_token() {
            Token::Eof => {
                self.done = true;
                None
            }
            tok => Some(tok),
        }
    }
}

/// lex the whole input, stopping before the end-of-input token
pub fn lex(input: &str) -> Vec<Token> {
    Lexer::from_source(input).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn ident(name: &str) -> Token {
        Token::Ident(name.to_string())
    }

    #[test]
    fn lex_works() {
        let input = "def add(x y) x+1.0;";
        let tokenized = [
            Token::Def,
            ident("add"),
            Token::Char('('),
            ident("x"),
            ident("y"),
            Token::Char(')'),
            ident("x"),
            Token::Char('+'),
            Token::Number(1.0),
            Token::Char(';'),
        ];
        assert_eq!(lex(input), tokenized);
    }

    #[test]
    fn numbers_match_float_parsing() {
        for text in &["0", "7", "42", "1234567890", "3.25", "0.5", ".5", "10.", "001.100"] {
            let expected: f64 = text.parse().unwrap();
            assert_eq!(lex(text), vec![Token::Number(expected)], "lexing {}", text);
        }
    }

    #[test]
    fn malformed_numbers_are_permissive() {
        assert_eq!(lex("1.2.3"), vec![Token::Number(1.2)]);
        assert_eq!(lex("."), vec![Token::Number(0.0)]);
        assert_eq!(lex("..5"), vec![Token::Number(0.0)]);
    }

    #[test]
    fn keywords_are_not_identifiers() {
        assert_eq!(lex("def"), vec![Token::Def]);
        assert_eq!(lex("extern"), vec![Token::Extern]);
        assert_eq!(lex("define"), vec![ident("define")]);
        assert_eq!(
            lex("externs x1 Def"),
            vec![ident("externs"), ident("x1"), ident("Def")]
        );
    }

    #[test]
    fn identifier_stops_at_non_alphanumeric() {
        assert_eq!(
            lex("foo_bar"),
            vec![ident("foo"), Token::Char('_'), ident("bar")]
        );
        assert_eq!(lex("x2.5"), vec![ident("x2"), Token::Number(0.5)]);
    }

    #[test]
    fn comments_are_skipped() {
        assert_eq!(lex("# comment\n123"), vec![Token::Number(123.0)]);
        assert_eq!(
            lex("1 # trailing\r\n# another\n2"),
            vec![Token::Number(1.0), Token::Number(2.0)]
        );
        assert_eq!(lex("# only a comment"), vec![]);
    }

    #[test]
    fn eof_is_sticky() {
        let mut lexer = Lexer::from_source("  x ");
        assert_eq!(lexer.next_token(), ident("x"));
        assert_eq!(lexer.next_token(), Token::Eof);
        assert_eq!(lexer.next_token(), Token::Eof);
    }

    #[test]
    fn relexing_is_deterministic() {
        let input = "def fib(n) # naive\n  fib(n-1) + fib(n - 2) * 3.5 < x;";
        assert_eq!(lex(input), lex(input));
    }

    #[test]
    fn display_works() {
        assert_eq!(Token::Char(')').to_string(), "')'");
        assert_eq!(ident("foo").to_string(), "identifier foo");
        assert_eq!(Token::Eof.to_string(), "end of input");
    }
}
