use super::lexer::Token;
use crate::error::ScriptError;
use std::{iter::Peekable, vec::IntoIter};

#[derive(Clone, Debug, PartialEq)]
pub enum Literal {
    Undefined,
    Boolean(bool),
    Number(f64),
    String(String),
}

#[derive(Clone, Debug, PartialEq)]
pub enum Expr {
    Literal(Literal),
    Var(String),
    New(Vec<Expr>),
    Property {
        object: Box<Expr>,
        name: String,
    },
    Call {
        object: Box<Expr>,
        method: String,
        args: Vec<Expr>,
    },
}

#[derive(Clone, Debug, PartialEq)]
pub enum Statement {
    Let { name: String, value: Expr },
    Expr(Expr),
}

type Tokens = Peekable<IntoIter<Token>>;

fn parse_error(message: impl Into<String>) -> ScriptError {
    ScriptError::Parse(message.into())
}

fn expect(tokens: &mut Tokens, wanted: Token) -> Result<(), ScriptError> {
    match tokens.next() {
        Some(t) if t == wanted => Ok(()),
        Some(t) => Err(parse_error(format!("expected {wanted:?}, found {t:?}"))),
        None => Err(parse_error(format!("expected {wanted:?}, found end of line"))),
    }
}

fn ident(tokens: &mut Tokens) -> Result<String, ScriptError> {
    match tokens.next() {
        Some(Token::Ident(name)) => Ok(name),
        Some(t) => Err(parse_error(format!("expected a name, found {t:?}"))),
        None => Err(parse_error("expected a name, found end of line")),
    }
}

/// Parses one tokenized line. Blank lines yield `None`.
pub fn parse_statement(tokens: Vec<Token>) -> Result<Option<Statement>, ScriptError> {
    if tokens.is_empty() {
        return Ok(None);
    }
    let mut tokens = tokens.into_iter().peekable();

    let statement = if tokens.peek() == Some(&Token::Ident("let".into())) {
        tokens.next();
        let name = ident(&mut tokens)?;
        expect(&mut tokens, Token::Equals)?;
        Statement::Let {
            name,
            value: expr(&mut tokens)?,
        }
    } else {
        Statement::Expr(expr(&mut tokens)?)
    };

    match tokens.next() {
        None => Ok(Some(statement)),
        Some(t) => Err(parse_error(format!("unexpected {t:?} after statement"))),
    }
}

fn expr(tokens: &mut Tokens) -> Result<Expr, ScriptError> {
    let mut object = primary(tokens)?;
    while tokens.peek() == Some(&Token::Dot) {
        tokens.next();
        let name = ident(tokens)?;
        object = if tokens.peek() == Some(&Token::LParen) {
            Expr::Call {
                object: Box::new(object),
                method: name,
                args: arguments(tokens)?,
            }
        } else {
            Expr::Property {
                object: Box::new(object),
                name,
            }
        };
    }
    Ok(object)
}

fn primary(tokens: &mut Tokens) -> Result<Expr, ScriptError> {
    match tokens.next() {
        Some(Token::Number(n)) => Ok(Expr::Literal(Literal::Number(n))),
        Some(Token::Str(s)) => Ok(Expr::Literal(Literal::String(s))),
        Some(Token::Ident(name)) => Ok(match name.as_str() {
            "true" => Expr::Literal(Literal::Boolean(true)),
            "false" => Expr::Literal(Literal::Boolean(false)),
            "undefined" => Expr::Literal(Literal::Undefined),
            "new" => {
                let class = ident(tokens)?;
                if class != "Pointer" {
                    return Err(parse_error(format!("unknown constructor {class}")));
                }
                Expr::New(arguments(tokens)?)
            }
            _ => Expr::Var(name),
        }),
        Some(t) => Err(parse_error(format!("unexpected {t:?}"))),
        None => Err(parse_error("unexpected end of line")),
    }
}

fn arguments(tokens: &mut Tokens) -> Result<Vec<Expr>, ScriptError> {
    expect(tokens, Token::LParen)?;
    let mut args = vec![];
    if tokens.peek() == Some(&Token::RParen) {
        tokens.next();
        return Ok(args);
    }
    loop {
        args.push(expr(tokens)?);
        match tokens.next() {
            Some(Token::Comma) => continue,
            Some(Token::RParen) => return Ok(args),
            Some(t) => return Err(parse_error(format!("expected ',' or ')', found {t:?}"))),
            None => return Err(parse_error("unclosed argument list")),
        }
    }
}
