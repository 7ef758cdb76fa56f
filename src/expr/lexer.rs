//! Tokenizer for embedded expressions.

use crate::error::EvalError;

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Tok {
    Int(i64),
    Float(f64),
    Str(String),
    Ident(String),
    // keywords
    And,
    Or,
    Not,
    In,
    Is,
    If,
    Else,
    True,
    False,
    None,
    // punctuation
    LParen,
    RParen,
    LBracket,
    RBracket,
    Comma,
    Dot,
    Assign,
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
    Plus,
    Minus,
    Star,
    Slash,
    SlashSlash,
    Percent,
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Token {
    pub tok: Tok,
    pub pos: usize,
}

fn keyword(ident: &str) -> Option<Tok> {
    Some(match ident {
        "and" => Tok::And,
        "or" => Tok::Or,
        "not" => Tok::Not,
        "in" => Tok::In,
        "is" => Tok::Is,
        "if" => Tok::If,
        "else" => Tok::Else,
        "True" | "true" => Tok::True,
        "False" | "false" => Tok::False,
        "None" | "null" => Tok::None,
        _ => return None,
    })
}

pub(crate) fn tokenize(src: &str) -> Result<Vec<Token>, EvalError> {
    let bytes = src.as_bytes();
    let mut tokens = Vec::new();
    let mut chars = src.char_indices().peekable();

    while let Some(&(pos, ch)) = chars.peek() {
        if ch.is_whitespace() {
            chars.next();
            continue;
        }

        if ch.is_ascii_digit() {
            let mut end = pos;
            let mut is_float = false;
            while let Some(&(i, c)) = chars.peek() {
                let next_is_digit = bytes.get(i + 1).is_some_and(u8::is_ascii_digit);
                if c.is_ascii_digit() || c == '_' {
                    end = i + 1;
                    chars.next();
                } else if c == '.' && !is_float && next_is_digit {
                    is_float = true;
                    end = i + 1;
                    chars.next();
                } else if (c == 'e' || c == 'E') && !src[pos..end].contains(['e', 'E']) {
                    is_float = true;
                    end = i + 1;
                    chars.next();
                    if let Some(&(j, sign)) = chars.peek() {
                        if sign == '+' || sign == '-' {
                            end = j + 1;
                            chars.next();
                        }
                    }
                } else {
                    break;
                }
            }
            let text = src[pos..end].replace('_', "");
            let tok = if is_float {
                text.parse::<f64>()
                    .map(Tok::Float)
                    .map_err(|_| EvalError::syntax(format!("invalid number '{text}'"), pos))?
            } else {
                text.parse::<i64>()
                    .map(Tok::Int)
                    .map_err(|_| EvalError::syntax(format!("invalid integer '{text}'"), pos))?
            };
            tokens.push(Token { tok, pos });
            continue;
        }

        if ch.is_alphabetic() || ch == '_' {
            let mut end = pos;
            while let Some(&(i, c)) = chars.peek() {
                if c.is_alphanumeric() || c == '_' {
                    end = i + c.len_utf8();
                    chars.next();
                } else {
                    break;
                }
            }
            let ident = &src[pos..end];
            let tok = keyword(ident).unwrap_or_else(|| Tok::Ident(ident.to_string()));
            tokens.push(Token { tok, pos });
            continue;
        }

        if ch == '"' || ch == '\'' {
            chars.next();
            let mut out = String::new();
            let mut closed = false;
            while let Some((_, c)) = chars.next() {
                match c {
                    '\\' => match chars.next() {
                        Some((_, 'n')) => out.push('\n'),
                        Some((_, 't')) => out.push('\t'),
                        Some((_, 'r')) => out.push('\r'),
                        Some((_, '0')) => out.push('\0'),
                        Some((_, other)) => out.push(other),
                        None => break,
                    },
                    c if c == ch => {
                        closed = true;
                        break;
                    }
                    c => out.push(c),
                }
            }
            if !closed {
                return Err(EvalError::syntax("unterminated string literal", pos));
            }
            tokens.push(Token {
                tok: Tok::Str(out),
                pos,
            });
            continue;
        }

        chars.next();
        let next = chars.peek().map(|&(_, c)| c);
        let (tok, wide) = match (ch, next) {
            ('=', Some('=')) => (Tok::Eq, true),
            ('!', Some('=')) => (Tok::Ne, true),
            ('<', Some('=')) => (Tok::Le, true),
            ('>', Some('=')) => (Tok::Ge, true),
            ('/', Some('/')) => (Tok::SlashSlash, true),
            ('=', _) => (Tok::Assign, false),
            ('<', _) => (Tok::Lt, false),
            ('>', _) => (Tok::Gt, false),
            ('/', _) => (Tok::Slash, false),
            ('(', _) => (Tok::LParen, false),
            (')', _) => (Tok::RParen, false),
            ('[', _) => (Tok::LBracket, false),
            (']', _) => (Tok::RBracket, false),
            (',', _) => (Tok::Comma, false),
            ('.', _) => (Tok::Dot, false),
            ('+', _) => (Tok::Plus, false),
            ('-', _) => (Tok::Minus, false),
            ('*', _) => (Tok::Star, false),
            ('%', _) => (Tok::Percent, false),
            (other, _) => {
                return Err(EvalError::syntax(
                    format!("unexpected character '{other}'"),
                    pos,
                ))
            }
        };
        if wide {
            chars.next();
        }
        tokens.push(Token { tok, pos });
    }

    Ok(tokens)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn toks(src: &str) -> Vec<Tok> {
        tokenize(src)
            .unwrap()
            .into_iter()
            .map(|t| t.tok)
            .collect()
    }

    #[test]
    fn test_numbers() {
        assert_eq!(toks("1 2.5 1_000 1e3"), vec![
            Tok::Int(1),
            Tok::Float(2.5),
            Tok::Int(1000),
            Tok::Float(1000.0),
        ]);
    }

    #[test]
    fn test_attribute_after_int_is_not_float() {
        assert_eq!(toks("1.x"), vec![Tok::Int(1), Tok::Dot, Tok::Ident("x".into())]);
    }

    #[test]
    fn test_strings_and_escapes() {
        assert_eq!(toks(r#"'a\'b' "c\nd""#), vec![
            Tok::Str("a'b".into()),
            Tok::Str("c\nd".into()),
        ]);
        assert!(tokenize("'open").is_err());
    }

    #[test]
    fn test_operators() {
        assert_eq!(toks("a // b != c <= d"), vec![
            Tok::Ident("a".into()),
            Tok::SlashSlash,
            Tok::Ident("b".into()),
            Tok::Ne,
            Tok::Ident("c".into()),
            Tok::Le,
            Tok::Ident("d".into()),
        ]);
    }

    #[test]
    fn test_keywords() {
        assert_eq!(toks("not x is None"), vec![
            Tok::Not,
            Tok::Ident("x".into()),
            Tok::Is,
            Tok::None,
        ]);
    }

    #[test]
    fn test_unexpected_character() {
        assert!(matches!(
            tokenize("a $ b"),
            Err(EvalError::Syntax { position: 2, .. })
        ));
    }
}
