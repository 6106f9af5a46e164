pub mod ast;
pub mod lexer;
pub mod parser;
pub mod precedence;

pub use ast::{ASTNode, Expression, Function, Prototype};
pub use lexer::{lex, Lexer, Token};
pub use parser::{ParseError, Parser};
pub use precedence::{OperatorSpec, OperatorSpecError, OperatorTable};

/// parse a whole source string into its top-level items
pub fn parse_str(source: &str, operators: &OperatorTable) -> Result<Vec<ASTNode>, ParseError> {
    Parser::from_source(source, operators.clone()).parse_program()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn parse_str_works() {
        let ast = parse_str("def sq(x) x*x; sq(3)", &OperatorTable::default()).unwrap();
        let rendered: Vec<String> = ast.iter().map(ToString::to_string).collect();
        assert_eq!(rendered, vec!["def sq(x) (* x x)", "(sq 3)"]);
    }
}
