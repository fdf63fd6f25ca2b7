use crate::error::ScriptError;
use std::{iter::Peekable, str::Chars};

#[derive(Clone, Debug, PartialEq)]
pub enum Token {
    Ident(String),
    Number(f64),
    Str(String),
    Dot,
    Comma,
    LParen,
    RParen,
    Equals,
}

/// Splits one source line into tokens. `#` outside a string ends the line.
pub fn tokenize(line: &str) -> Result<Vec<Token>, ScriptError> {
    let mut tokens = vec![];
    let mut chars = line.chars().peekable();

    while let Some(&c) = chars.peek() {
        match c {
            '#' => break,
            c if c.is_whitespace() => {
                chars.next();
            }
            '.' => {
                chars.next();
                tokens.push(Token::Dot);
            }
            ',' => {
                chars.next();
                tokens.push(Token::Comma);
            }
            '(' => {
                chars.next();
                tokens.push(Token::LParen);
            }
            ')' => {
                chars.next();
                tokens.push(Token::RParen);
            }
            '=' => {
                chars.next();
                tokens.push(Token::Equals);
            }
            '"' => {
                chars.next();
                tokens.push(Token::Str(string(&mut chars)?));
            }
            '-' | '0'..='9' => tokens.push(Token::Number(number(&mut chars)?)),
            c if c.is_alphabetic() || c == '_' => {
                let mut ident = String::new();
                while let Some(&c) = chars.peek() {
                    if !(c.is_alphanumeric() || c == '_') {
                        break;
                    }
                    ident.push(c);
                    chars.next();
                }
                tokens.push(Token::Ident(ident));
            }
            other => {
                return Err(ScriptError::Lex(format!("unexpected character {other:?}")));
            }
        }
    }

    Ok(tokens)
}

fn string(chars: &mut Peekable<Chars<'_>>) -> Result<String, ScriptError> {
    let mut out = String::new();
    loop {
        match chars.next() {
            None => return Err(ScriptError::Lex("unterminated string".into())),
            Some('"') => return Ok(out),
            Some('\\') => match chars.next() {
                Some('n') => out.push('\n'),
                Some('t') => out.push('\t'),
                Some('0') => out.push('\0'),
                Some('\\') => out.push('\\'),
                Some('"') => out.push('"'),
                other => {
                    return Err(ScriptError::Lex(format!("invalid escape {other:?}")));
                }
            },
            Some(c) => out.push(c),
        }
    }
}

fn number(chars: &mut Peekable<Chars<'_>>) -> Result<f64, ScriptError> {
    let mut text = String::new();
    if chars.peek() == Some(&'-') {
        text.push('-');
        chars.next();
    }

    let mut digits = chars.clone();
    if digits.next() == Some('0') && matches!(digits.next(), Some('x' | 'X')) {
        chars.next();
        chars.next();
        let mut hex = String::new();
        while let Some(&c) = chars.peek() {
            if !c.is_ascii_hexdigit() {
                break;
            }
            hex.push(c);
            chars.next();
        }
        let magnitude = u64::from_str_radix(&hex, 16)
            .map_err(|_| ScriptError::Lex(format!("invalid hex literal 0x{hex}")))?;
        let value = magnitude as f64;
        return Ok(if text.is_empty() { value } else { -value });
    }

    while let Some(&c) = chars.peek() {
        if !(c.is_ascii_digit() || c == '.') {
            break;
        }
        text.push(c);
        chars.next();
    }
    text.parse()
        .map_err(|_| ScriptError::Lex(format!("invalid number {text:?}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tokenize_call() {
        let tokens = tokenize(r#"let s = p.putCString("a\"b", true) # trailing"#).unwrap();
        assert_eq!(
            tokens,
            vec![
                Token::Ident("let".into()),
                Token::Ident("s".into()),
                Token::Equals,
                Token::Ident("p".into()),
                Token::Dot,
                Token::Ident("putCString".into()),
                Token::LParen,
                Token::Str("a\"b".into()),
                Token::Comma,
                Token::Ident("true".into()),
                Token::RParen,
            ]
        );
    }

    #[test]
    fn test_tokenize_numbers() {
        assert_eq!(
            tokenize("-4 0x1F 2.5 0").unwrap(),
            vec![
                Token::Number(-4.0),
                Token::Number(31.0),
                Token::Number(2.5),
                Token::Number(0.0),
            ]
        );
    }

    #[test]
    fn test_tokenize_errors() {
        assert!(matches!(tokenize("\"open"), Err(ScriptError::Lex(_))));
        assert!(matches!(tokenize("p.seek(4) ; x"), Err(ScriptError::Lex(_))));
        assert!(matches!(tokenize("1.2.3"), Err(ScriptError::Lex(_))));
    }
}
