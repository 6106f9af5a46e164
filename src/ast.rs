use std::{fmt, mem};

/// Name given to the prototype wrapping a top-level expression.
pub const ANONYMOUS_FUNCTION_NAME: &str = "__anon_expr";

#[derive(Debug, PartialEq, Clone)]
pub struct Prototype {
    pub name: String,
    pub args: Vec<String>,
}

#[derive(Debug, PartialEq, Clone)]
pub enum Expression {
    Number(f64),
    Variable(String),
    Binary(char, Box<Expression>, Box<Expression>),
    Call(String, Vec<Expression>),
}

#[derive(Debug, PartialEq, Clone)]
pub struct Function {
    pub prototype: Prototype,
    pub body: Expression,
}

#[derive(Debug, PartialEq, Clone)]
pub enum ASTNode {
    Extern(Prototype),
    Function(Function),
}

impl Expression {
    pub fn binary(op: char, lhs: Expression, rhs: Expression) -> Self {
        Expression::Binary(op, Box::new(lhs), Box::new(rhs))
    }

    /// move the children out onto `stack`, leaving leaves behind
    fn take_children(&mut self, stack: &mut Vec<Expression>) {
        match self {
            Expression::Binary(_, lhs, rhs) => {
                stack.push(mem::replace(&mut **lhs, Expression::Number(0.0)));
                stack.push(mem::replace(&mut **rhs, Expression::Number(0.0)));
            }
            Expression::Call(_, args) => stack.append(args),
            Expression::Number(_) | Expression::Variable(_) => (),
        }
    }
}

// operator chains are built left-deep in a loop, so they get torn down in a
// loop too instead of one stack frame per node
impl Drop for Expression {
    fn drop(&mut self) {
        let mut stack = Vec::new();
        self.take_children(&mut stack);
        while let Some(mut expr) = stack.pop() {
            expr.take_children(&mut stack);
        }
    }
}

impl Function {
    /// wrap a bare expression so it can be handled like any other definition
    pub fn anonymous(body: Expression) -> Self {
        Function {
            prototype: Prototype {
                name: ANONYMOUS_FUNCTION_NAME.to_string(),
                args: Vec::new(),
            },
            body,
        }
    }

    pub fn is_anonymous(&self) -> bool {
        self.prototype.name == ANONYMOUS_FUNCTION_NAME
    }
}

// s-expression rendering, mostly for the cli and for eyeballing test failures
impl fmt::Display for Expression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expression::Number(value) => write!(f, "{}", value),
            Expression::Variable(name) => write!(f, "{}", name),
            Expression::Binary(op, lhs, rhs) => write!(f, "({} {} {})", op, lhs, rhs),
            Expression::Call(callee, args) => {
                write!(f, "({}", callee)?;
                for arg in args {
                    write!(f, " {}", arg)?;
                }
                write!(f, ")")
            }
        }
    }
}

impl fmt::Display for Prototype {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}({})", self.name, self.args.join(" "))
    }
}

impl fmt::Display for ASTNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ASTNode::Extern(proto) => write!(f, "extern {}", proto),
            ASTNode::Function(func) if func.is_anonymous() => write!(f, "{}", func.body),
            ASTNode::Function(func) => write!(f, "def {} {}", func.prototype, func.body),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn display_expression_works() {
        let expr = Expression::Call(
            "foo".to_string(),
            vec![
                Expression::Number(1.5),
                Expression::binary(
                    '+',
                    Expression::Variable("x".to_string()),
                    Expression::Number(2.0),
                ),
            ],
        );
        assert_eq!(expr.to_string(), "(foo 1.5 (+ x 2))");
    }

    #[test]
    fn deep_trees_drop() {
        let mut expr = Expression::Number(0.0);
        for i in 0..200_000 {
            expr = if i % 2 == 0 {
                Expression::binary('-', Expression::Number(1.0), expr)
            } else {
                let args = vec![expr, Expression::Variable("x".to_string())];
                Expression::Call("f".to_string(), args)
            };
        }
        drop(expr);
    }

    #[test]
    fn display_nodes_works() {
        let proto = Prototype {
            name: "add".to_string(),
            args: vec!["x".to_string(), "y".to_string()],
        };
        let def = ASTNode::Function(Function {
            prototype: proto.clone(),
            body: Expression::binary(
                '+',
                Expression::Variable("x".to_string()),
                Expression::Variable("y".to_string()),
            ),
        });
        assert_eq!(def.to_string(), "def add(x y) (+ x y)");
        assert_eq!(ASTNode::Extern(proto).to_string(), "extern add(x y)");

        let anon = ASTNode::Function(Function::anonymous(Expression::Number(4.0)));
        assert_eq!(anon.to_string(), "4");
    }
}
