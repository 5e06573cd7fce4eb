//! Test script language
//!
//! A deliberately tiny language for driving the engine in tests. A program is
//! a sequence of statements separated by `;` or newlines:
//!
//! ```text
//! send CH VALUE            publish VALUE on CH
//! listen CH PAT { BODY }   wait for a datum on CH matching PAT, then run BODY
//! native CH ID             wait on CH with a host handler (no term form)
//! new x                    bind $x to a fresh unforgeable name
//! copy SRC DST             republish the first datum on SRC to DST
//! mint WHO AMOUNT          credit a vault
//! transfer FROM TO AMOUNT  move funds between vaults
//! bond WHO STAKE           set a validator's stake in the bonds map
//! burn N                   consume N phlo
//! fail "msg"               user abort
//! abort "msg"              interpreter fault
//! ```
//!
//! Values are integers, `"strings"`, `0x` byte strings, `#` unforgeable
//! names (64 hex digits), `true`, `false`, `nil` and `$var` references. A
//! pattern is `_`, a bare identifier (binds `$ident` in BODY) or a literal.

use std::fmt;
use weave_core::{Pattern, Value};

/// Lexical token
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Token {
    /// Keyword or identifier
    Word(String),
    /// String literal
    Str(String),
    /// Integer literal
    Int(i64),
    /// Byte string literal
    Hex(Vec<u8>),
    /// Unforgeable name literal
    Name([u8; 32]),
    /// Variable reference
    Var(String),
    /// `{`
    Open,
    /// `}`
    Close,
    /// Statement separator
    Sep,
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Token::Word(w) => f.write_str(w),
            Token::Str(s) => write!(f, "{s:?}"),
            Token::Int(n) => write!(f, "{n}"),
            Token::Hex(bytes) => write!(f, "0x{}", hex::encode(bytes)),
            Token::Name(id) => write!(f, "#{}", hex::encode(id)),
            Token::Var(name) => write!(f, "${name}"),
            Token::Open => f.write_str("{"),
            Token::Close => f.write_str("}"),
            Token::Sep => f.write_str(";"),
        }
    }
}

/// Value position in a statement
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Expr {
    /// Literal value
    Lit(Value),
    /// `$name`
    Var(String),
}

/// One statement
#[allow(missing_docs)]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Stmt {
    Send {
        channel: Expr,
        value: Expr,
    },
    /// Body is kept as tokens and only parsed when the continuation fires
    Listen {
        channel: Expr,
        pattern: Pattern,
        body: Vec<Token>,
    },
    Native {
        channel: Expr,
        id: u64,
    },
    New(String),
    Copy {
        from: Expr,
        to: Expr,
    },
    Mint {
        to: Expr,
        amount: Expr,
    },
    Transfer {
        from: Expr,
        to: Expr,
        amount: Expr,
    },
    Bond {
        validator: Expr,
        stake: Expr,
    },
    Burn(Expr),
    Fail(String),
    Abort(String),
}

/// Syntax error with a human-readable message
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{0}")]
pub struct SyntaxError(pub String);

fn err<T>(message: impl Into<String>) -> Result<T, SyntaxError> {
    Err(SyntaxError(message.into()))
}

/// Split source into tokens
pub fn lex(source: &str) -> Result<Vec<Token>, SyntaxError> {
    let mut tokens = Vec::new();
    let mut chars = source.chars().peekable();

    while let Some(&c) = chars.peek() {
        match c {
            ' ' | '\t' | '\r' => {
                chars.next();
            }
            '\n' | ';' => {
                chars.next();
                tokens.push(Token::Sep);
            }
            '{' => {
                chars.next();
                tokens.push(Token::Open);
            }
            '}' => {
                chars.next();
                tokens.push(Token::Close);
            }
            '"' => {
                chars.next();
                tokens.push(Token::Str(lex_string(&mut chars)?));
            }
            '$' => {
                chars.next();
                let name = take_word(&mut chars);
                if name.is_empty() {
                    return err("empty variable name");
                }
                tokens.push(Token::Var(name));
            }
            '#' => {
                chars.next();
                let digits = take_word(&mut chars);
                let bytes = hex::decode(&digits)
                    .map_err(|e| SyntaxError(format!("bad name literal #{digits}: {e}")))?;
                let id: [u8; 32] = bytes
                    .try_into()
                    .map_err(|_| SyntaxError(format!("name literal #{digits} is not 32 bytes")))?;
                tokens.push(Token::Name(id));
            }
            c if c.is_ascii_digit() || c == '-' => {
                let word = take_word(&mut chars);
                if let Some(digits) = word.strip_prefix("0x") {
                    let bytes = hex::decode(digits)
                        .map_err(|e| SyntaxError(format!("bad hex literal {word}: {e}")))?;
                    tokens.push(Token::Hex(bytes));
                } else {
                    let n = word
                        .parse()
                        .map_err(|_| SyntaxError(format!("bad integer literal {word}")))?;
                    tokens.push(Token::Int(n));
                }
            }
            c if is_word_char(c) => tokens.push(Token::Word(take_word(&mut chars))),
            other => return err(format!("unexpected character {other:?}")),
        }
    }
    Ok(tokens)
}

fn is_word_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || matches!(c, '_' | ':' | '.' | '-')
}

fn take_word(chars: &mut std::iter::Peekable<std::str::Chars<'_>>) -> String {
    let mut word = String::new();
    while let Some(&c) = chars.peek() {
        if !is_word_char(c) {
            break;
        }
        word.push(c);
        chars.next();
    }
    word
}

fn lex_string(chars: &mut std::iter::Peekable<std::str::Chars<'_>>) -> Result<String, SyntaxError> {
    let mut out = String::new();
    loop {
        match chars.next() {
            None => return err("unterminated string"),
            Some('"') => return Ok(out),
            Some('\\') => match chars.next() {
                Some('n') => out.push('\n'),
                Some('t') => out.push('\t'),
                Some('r') => out.push('\r'),
                Some('0') => out.push('\0'),
                Some('\\') => out.push('\\'),
                Some('"') => out.push('"'),
                Some('\'') => out.push('\''),
                Some('u') => out.push(lex_unicode_escape(chars)?),
                other => return err(format!("bad escape {other:?}")),
            },
            Some(c) => out.push(c),
        }
    }
}

fn lex_unicode_escape(
    chars: &mut std::iter::Peekable<std::str::Chars<'_>>,
) -> Result<char, SyntaxError> {
    if chars.next() != Some('{') {
        return err("expected { after \\u");
    }
    let mut digits = String::new();
    for c in chars.by_ref() {
        if c == '}' {
            let code = u32::from_str_radix(&digits, 16)
                .map_err(|_| SyntaxError(format!("bad unicode escape {digits}")))?;
            return char::from_u32(code)
                .ok_or_else(|| SyntaxError(format!("invalid code point {digits}")));
        }
        digits.push(c);
    }
    err("unterminated unicode escape")
}

/// Parse source into statements
pub fn parse(source: &str) -> Result<Vec<Stmt>, SyntaxError> {
    let tokens = lex(source)?;
    Parser { tokens, pos: 0 }.program()
}

struct Parser {
    tokens: Vec<Token>,
    pos: usize,
}

impl Parser {
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn next(&mut self) -> Option<Token> {
        let token = self.tokens.get(self.pos).cloned();
        self.pos += 1;
        token
    }

    fn program(mut self) -> Result<Vec<Stmt>, SyntaxError> {
        let mut stmts = Vec::new();
        loop {
            while self.peek() == Some(&Token::Sep) {
                self.pos += 1;
            }
            if self.peek().is_none() {
                return Ok(stmts);
            }
            stmts.push(self.stmt()?);
            match self.next() {
                None | Some(Token::Sep) => {}
                Some(other) => return err(format!("expected end of statement, found {other}")),
            }
        }
    }

    fn stmt(&mut self) -> Result<Stmt, SyntaxError> {
        let keyword = match self.next() {
            Some(Token::Word(word)) => word,
            Some(other) => return err(format!("expected a statement, found {other}")),
            None => return err("expected a statement"),
        };
        let stmt = match keyword.as_str() {
            "send" => Stmt::Send {
                channel: self.expr()?,
                value: self.expr()?,
            },
            "listen" => Stmt::Listen {
                channel: self.expr()?,
                pattern: self.pattern()?,
                body: self.block()?,
            },
            "native" => Stmt::Native {
                channel: self.expr()?,
                id: match self.next() {
                    Some(Token::Int(n)) if n >= 0 => n as u64,
                    _ => return err("native expects a handler id"),
                },
            },
            "new" => match self.next() {
                Some(Token::Word(name)) => Stmt::New(name),
                _ => return err("new expects a name"),
            },
            "copy" => Stmt::Copy {
                from: self.expr()?,
                to: self.expr()?,
            },
            "mint" => Stmt::Mint {
                to: self.expr()?,
                amount: self.expr()?,
            },
            "transfer" => Stmt::Transfer {
                from: self.expr()?,
                to: self.expr()?,
                amount: self.expr()?,
            },
            "bond" => Stmt::Bond {
                validator: self.expr()?,
                stake: self.expr()?,
            },
            "burn" => Stmt::Burn(self.expr()?),
            "fail" => Stmt::Fail(self.message()?),
            "abort" => Stmt::Abort(self.message()?),
            other => return err(format!("unknown statement {other}")),
        };
        Ok(stmt)
    }

    fn expr(&mut self) -> Result<Expr, SyntaxError> {
        let value = match self.next() {
            Some(Token::Var(name)) => return Ok(Expr::Var(name)),
            Some(Token::Int(n)) => Value::Int(n),
            Some(Token::Str(s)) => Value::Str(s),
            Some(Token::Hex(bytes)) => Value::Bytes(bytes),
            Some(Token::Name(id)) => Value::Unforgeable(id),
            Some(Token::Word(w)) if w == "true" => Value::Bool(true),
            Some(Token::Word(w)) if w == "false" => Value::Bool(false),
            Some(Token::Word(w)) if w == "nil" => Value::Nil,
            Some(other) => return err(format!("expected a value, found {other}")),
            None => return err("expected a value"),
        };
        Ok(Expr::Lit(value))
    }

    fn pattern(&mut self) -> Result<Pattern, SyntaxError> {
        match self.peek() {
            Some(Token::Word(w)) if w == "_" => {
                self.pos += 1;
                Ok(Pattern::Wildcard)
            }
            Some(Token::Word(w)) if !matches!(w.as_str(), "true" | "false" | "nil") => {
                let name = w.clone();
                self.pos += 1;
                Ok(Pattern::Bind(name))
            }
            _ => match self.expr()? {
                Expr::Lit(value) => Ok(Pattern::Literal(value)),
                Expr::Var(name) => err(format!("${name} cannot be used as a pattern")),
            },
        }
    }

    fn block(&mut self) -> Result<Vec<Token>, SyntaxError> {
        if self.next() != Some(Token::Open) {
            return err("expected {");
        }
        let mut depth = 1usize;
        let mut body = Vec::new();
        loop {
            let Some(token) = self.next() else {
                return err("unterminated block");
            };
            match token {
                Token::Open => depth += 1,
                Token::Close => {
                    depth -= 1;
                    if depth == 0 {
                        return Ok(body);
                    }
                }
                _ => {}
            }
            body.push(token);
        }
    }

    fn message(&mut self) -> Result<String, SyntaxError> {
        match self.next() {
            Some(Token::Str(s)) => Ok(s),
            _ => err("expected a message string"),
        }
    }
}

/// Literal token for a captured value, when it has one
pub fn literal_token(value: &Value) -> Option<Token> {
    match value {
        Value::Nil => Some(Token::Word("nil".into())),
        Value::Bool(b) => Some(Token::Word(b.to_string())),
        Value::Int(n) => Some(Token::Int(*n)),
        Value::Str(s) => Some(Token::Str(s.clone())),
        Value::Bytes(bytes) => Some(Token::Hex(bytes.clone())),
        Value::Unforgeable(id) => Some(Token::Name(*id)),
        Value::List(_) | Value::Map(_) => None,
    }
}

/// Render tokens back to source
pub fn render(tokens: &[Token]) -> String {
    tokens
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_statements() {
        let stmts = parse("new x; send $x 1\nlisten \"c\" v { send \"out\" $v }").unwrap();
        assert_eq!(stmts.len(), 3);
        assert_eq!(stmts[0], Stmt::New("x".into()));
        assert!(matches!(
            &stmts[2],
            Stmt::Listen { pattern: Pattern::Bind(v), body, .. } if v == "v" && body.len() == 3
        ));
    }

    #[test]
    fn test_nested_blocks_survive_render() {
        let src = "listen \"a\" _ { listen \"b\" 7 { fail \"x\" } }";
        let stmts = parse(src).unwrap();
        let Stmt::Listen { body, pattern, .. } = &stmts[0] else {
            panic!("expected listen");
        };
        assert_eq!(*pattern, Pattern::Wildcard);
        let inner = parse(&render(body)).unwrap();
        assert!(matches!(
            &inner[0],
            Stmt::Listen { pattern: Pattern::Literal(Value::Int(7)), .. }
        ));
    }

    #[test]
    fn test_literals() {
        let tokens = lex("0xabcd -5 \"q\\\"s\" true").unwrap();
        assert_eq!(
            tokens,
            vec![
                Token::Hex(vec![0xab, 0xcd]),
                Token::Int(-5),
                Token::Str("q\"s".into()),
                Token::Word("true".into()),
            ]
        );
    }

    #[test]
    fn test_string_round_trips_through_render() {
        let original = Token::Str("tab\there \u{e9} \"quoted\"".into());
        assert_eq!(lex(&render(&[original.clone()])).unwrap(), vec![original]);
    }

    #[test]
    fn test_syntax_errors() {
        assert!(parse("send \"c\"").is_err());
        assert!(parse("frobnicate 1").is_err());
        assert!(parse("listen \"c\" x { send \"d\" 1").is_err());
        assert!(parse("send \"unterminated 1").is_err());
    }
}
