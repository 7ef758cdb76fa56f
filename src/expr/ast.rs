//! Expression syntax tree and parser.
//!
//! Precedence, lowest first: conditional (`a if c else b`), `or`, `and`,
//! `not`, comparisons (chained), `+ -`, `* / // %`, unary `- +`, postfix
//! (attribute, index, call), atoms.

use crate::error::EvalError;
use crate::value::Value;

use super::lexer::{tokenize, Tok, Token};

/// Nesting limit for parenthesised / bracketed sub-expressions
const MAX_DEPTH: usize = 64;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    Not,
    Neg,
    Pos,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    FloorDiv,
    Mod,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CmpOp {
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
    In,
    NotIn,
    Is,
    IsNot,
}

/// Parsed expression
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Literal(Value),
    Name(String),
    Attr(Box<Expr>, String),
    Index(Box<Expr>, Box<Expr>),
    Call {
        callee: Box<Expr>,
        args: Vec<Expr>,
        kwargs: Vec<(String, Expr)>,
    },
    List(Vec<Expr>),
    Unary(UnaryOp, Box<Expr>),
    Binary(BinaryOp, Box<Expr>, Box<Expr>),
    /// `a < b <= c` keeps every operand so each is evaluated once
    Compare(Box<Expr>, Vec<(CmpOp, Expr)>),
    And(Box<Expr>, Box<Expr>),
    Or(Box<Expr>, Box<Expr>),
    Conditional {
        cond: Box<Expr>,
        then: Box<Expr>,
        otherwise: Box<Expr>,
    },
}

/// Parse a complete expression; trailing tokens are an error
pub fn parse(src: &str) -> Result<Expr, EvalError> {
    let tokens = tokenize(src)?;
    if tokens.is_empty() {
        return Err(EvalError::syntax("empty expression", 0));
    }
    let mut parser = Parser {
        tokens,
        pos: 0,
        depth: 0,
        end: src.len(),
    };
    let expr = parser.conditional()?;
    match parser.peek() {
        None => Ok(expr),
        Some(t) => Err(EvalError::syntax(
            format!("unexpected token {:?}", t.tok),
            t.pos,
        )),
    }
}

struct Parser {
    tokens: Vec<Token>,
    pos: usize,
    depth: usize,
    end: usize,
}

impl Parser {
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn peek_tok(&self) -> Option<&Tok> {
        self.peek().map(|t| &t.tok)
    }

    fn peek_tok_at(&self, offset: usize) -> Option<&Tok> {
        self.tokens.get(self.pos + offset).map(|t| &t.tok)
    }

    fn here(&self) -> usize {
        self.peek().map_or(self.end, |t| t.pos)
    }

    fn eat(&mut self, tok: &Tok) -> bool {
        if self.peek_tok() == Some(tok) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn expect(&mut self, tok: &Tok) -> Result<(), EvalError> {
        if self.eat(tok) {
            Ok(())
        } else {
            Err(EvalError::syntax(format!("expected {tok:?}"), self.here()))
        }
    }

    fn enter(&mut self) -> Result<(), EvalError> {
        self.depth += 1;
        if self.depth > MAX_DEPTH {
            return Err(EvalError::syntax("expression nested too deeply", self.here()));
        }
        Ok(())
    }

    fn leave(&mut self) {
        self.depth -= 1;
    }

    fn conditional(&mut self) -> Result<Expr, EvalError> {
        let then = self.or()?;
        if !self.eat(&Tok::If) {
            return Ok(then);
        }
        self.enter()?;
        let cond = self.or()?;
        self.expect(&Tok::Else)?;
        let otherwise = self.conditional()?;
        self.leave();
        Ok(Expr::Conditional {
            cond: Box::new(cond),
            then: Box::new(then),
            otherwise: Box::new(otherwise),
        })
    }

    fn or(&mut self) -> Result<Expr, EvalError> {
        let mut left = self.and()?;
        while self.eat(&Tok::Or) {
            let right = self.and()?;
            left = Expr::Or(Box::new(left), Box::new(right));
        }
        Ok(left)
    }

    fn and(&mut self) -> Result<Expr, EvalError> {
        let mut left = self.not()?;
        while self.eat(&Tok::And) {
            let right = self.not()?;
            left = Expr::And(Box::new(left), Box::new(right));
        }
        Ok(left)
    }

    fn not(&mut self) -> Result<Expr, EvalError> {
        if self.eat(&Tok::Not) {
            self.enter()?;
            let operand = self.not()?;
            self.leave();
            return Ok(Expr::Unary(UnaryOp::Not, Box::new(operand)));
        }
        self.comparison()
    }

    fn comparison_op(&mut self) -> Option<CmpOp> {
        let op = match self.peek_tok()? {
            Tok::Eq => CmpOp::Eq,
            Tok::Ne => CmpOp::Ne,
            Tok::Lt => CmpOp::Lt,
            Tok::Le => CmpOp::Le,
            Tok::Gt => CmpOp::Gt,
            Tok::Ge => CmpOp::Ge,
            Tok::In => CmpOp::In,
            Tok::Is => {
                if self.peek_tok_at(1) == Some(&Tok::Not) {
                    self.pos += 2;
                    return Some(CmpOp::IsNot);
                }
                CmpOp::Is
            }
            Tok::Not if self.peek_tok_at(1) == Some(&Tok::In) => {
                self.pos += 2;
                return Some(CmpOp::NotIn);
            }
            _ => return None,
        };
        self.pos += 1;
        Some(op)
    }

    fn comparison(&mut self) -> Result<Expr, EvalError> {
        let first = self.additive()?;
        let mut rest = Vec::new();
        while let Some(op) = self.comparison_op() {
            rest.push((op, self.additive()?));
        }
        if rest.is_empty() {
            Ok(first)
        } else {
            Ok(Expr::Compare(Box::new(first), rest))
        }
    }

    fn additive(&mut self) -> Result<Expr, EvalError> {
        let mut left = self.multiplicative()?;
        loop {
            let op = match self.peek_tok() {
                Some(Tok::Plus) => BinaryOp::Add,
                Some(Tok::Minus) => BinaryOp::Sub,
                _ => return Ok(left),
            };
            self.pos += 1;
            let right = self.multiplicative()?;
            left = Expr::Binary(op, Box::new(left), Box::new(right));
        }
    }

    fn multiplicative(&mut self) -> Result<Expr, EvalError> {
        let mut left = self.unary()?;
        loop {
            let op = match self.peek_tok() {
                Some(Tok::Star) => BinaryOp::Mul,
                Some(Tok::Slash) => BinaryOp::Div,
                Some(Tok::SlashSlash) => BinaryOp::FloorDiv,
                Some(Tok::Percent) => BinaryOp::Mod,
                _ => return Ok(left),
            };
            self.pos += 1;
            let right = self.unary()?;
            left = Expr::Binary(op, Box::new(left), Box::new(right));
        }
    }

    fn unary(&mut self) -> Result<Expr, EvalError> {
        let op = match self.peek_tok() {
            Some(Tok::Minus) => UnaryOp::Neg,
            Some(Tok::Plus) => UnaryOp::Pos,
            _ => return self.postfix(),
        };
        self.pos += 1;
        self.enter()?;
        let operand = self.unary()?;
        self.leave();
        Ok(Expr::Unary(op, Box::new(operand)))
    }

    fn postfix(&mut self) -> Result<Expr, EvalError> {
        let mut expr = self.atom()?;
        loop {
            match self.peek_tok() {
                Some(Tok::Dot) => {
                    self.pos += 1;
                    match self.peek_tok() {
                        Some(Tok::Ident(name)) => {
                            let name = name.clone();
                            self.pos += 1;
                            expr = Expr::Attr(Box::new(expr), name);
                        }
                        _ => {
                            return Err(EvalError::syntax(
                                "expected attribute name",
                                self.here(),
                            ))
                        }
                    }
                }
                Some(Tok::LBracket) => {
                    self.pos += 1;
                    self.enter()?;
                    let index = self.conditional()?;
                    self.expect(&Tok::RBracket)?;
                    self.leave();
                    expr = Expr::Index(Box::new(expr), Box::new(index));
                }
                Some(Tok::LParen) => {
                    self.pos += 1;
                    self.enter()?;
                    let (args, kwargs) = self.call_args()?;
                    self.leave();
                    expr = Expr::Call {
                        callee: Box::new(expr),
                        args,
                        kwargs,
                    };
                }
                _ => return Ok(expr),
            }
        }
    }

    #[allow(clippy::type_complexity)]
    fn call_args(&mut self) -> Result<(Vec<Expr>, Vec<(String, Expr)>), EvalError> {
        let mut args = Vec::new();
        let mut kwargs: Vec<(String, Expr)> = Vec::new();
        while !self.eat(&Tok::RParen) {
            let keyword = match (self.peek_tok(), self.peek_tok_at(1)) {
                (Some(Tok::Ident(name)), Some(Tok::Assign)) => Some(name.clone()),
                _ => None,
            };
            if let Some(name) = keyword {
                self.pos += 2;
                kwargs.push((name, self.conditional()?));
            } else if kwargs.is_empty() {
                args.push(self.conditional()?);
            } else {
                return Err(EvalError::syntax(
                    "positional argument follows keyword argument",
                    self.here(),
                ));
            }
            if !self.eat(&Tok::Comma) {
                self.expect(&Tok::RParen)?;
                break;
            }
        }
        Ok((args, kwargs))
    }

    fn atom(&mut self) -> Result<Expr, EvalError> {
        let Some(token) = self.peek().cloned() else {
            return Err(EvalError::syntax("unexpected end of expression", self.end));
        };
        self.pos += 1;
        match token.tok {
            Tok::Int(i) => Ok(Expr::Literal(Value::Int(i))),
            Tok::Float(f) => Ok(Expr::Literal(Value::Float(f))),
            Tok::Str(s) => {
                // Adjacent string literals concatenate
                let mut s = s;
                while let Some(Tok::Str(next)) = self.peek_tok() {
                    s.push_str(next);
                    self.pos += 1;
                }
                Ok(Expr::Literal(Value::Str(s)))
            }
            Tok::True => Ok(Expr::Literal(Value::Bool(true))),
            Tok::False => Ok(Expr::Literal(Value::Bool(false))),
            Tok::None => Ok(Expr::Literal(Value::Null)),
            Tok::Ident(name) => Ok(Expr::Name(name)),
            Tok::LParen => {
                self.enter()?;
                let inner = self.conditional()?;
                self.expect(&Tok::RParen)?;
                self.leave();
                Ok(inner)
            }
            Tok::LBracket => {
                self.enter()?;
                let mut items = Vec::new();
                while !self.eat(&Tok::RBracket) {
                    items.push(self.conditional()?);
                    if !self.eat(&Tok::Comma) {
                        self.expect(&Tok::RBracket)?;
                        break;
                    }
                }
                self.leave();
                Ok(Expr::List(items))
            }
            other => Err(EvalError::syntax(
                format!("unexpected token {other:?}"),
                token.pos,
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn name(n: &str) -> Box<Expr> {
        Box::new(Expr::Name(n.into()))
    }

    #[test]
    fn test_precedence() {
        let expr = parse("1 + 2 * 3").unwrap();
        assert_eq!(
            expr,
            Expr::Binary(
                BinaryOp::Add,
                Box::new(Expr::Literal(Value::Int(1))),
                Box::new(Expr::Binary(
                    BinaryOp::Mul,
                    Box::new(Expr::Literal(Value::Int(2))),
                    Box::new(Expr::Literal(Value::Int(3))),
                )),
            )
        );
    }

    #[test]
    fn test_postfix_chain() {
        let expr = parse("a.b[0](x, k=1)").unwrap();
        let Expr::Call { callee, args, kwargs } = expr else {
            panic!("expected call");
        };
        assert_eq!(args, vec![Expr::Name("x".into())]);
        assert_eq!(kwargs, vec![("k".into(), Expr::Literal(Value::Int(1)))]);
        assert_eq!(
            *callee,
            Expr::Index(
                Box::new(Expr::Attr(name("a"), "b".into())),
                Box::new(Expr::Literal(Value::Int(0)))
            )
        );
    }

    #[test]
    fn test_not_in_and_is_not() {
        assert_eq!(
            parse("a not in b").unwrap(),
            Expr::Compare(name("a"), vec![(CmpOp::NotIn, Expr::Name("b".into()))])
        );
        assert_eq!(
            parse("a is not None").unwrap(),
            Expr::Compare(name("a"), vec![(CmpOp::IsNot, Expr::Literal(Value::Null))])
        );
    }

    #[test]
    fn test_conditional() {
        assert!(matches!(
            parse("'a' if x else 'b'").unwrap(),
            Expr::Conditional { .. }
        ));
    }

    #[test]
    fn test_errors() {
        assert!(parse("").is_err());
        assert!(parse("1 +").is_err());
        assert!(parse("f(k=1, 2)").is_err());
        assert!(parse("a b").is_err());
        assert!(parse(&"(".repeat(200)).is_err());
    }
}
