use std::{fmt::Write as _, iter::Peekable};

use tracing::debug;

use crate::token::{Span, Spanned, Token, TokenKind, KEYWORDS};

pub const SUGGESTED_TOKENS_CAPACITY: usize = 1_024;

#[derive(Copy, Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum Error {
    #[error("unexpected character {0:?}")]
    UnexpectedChar(char),
    #[error("unterminated string")]
    UnterminatedString,
}

/// Lexes the provided string, producing the tokens into the provided buffer.
///
/// The first lexical error stops the scan; the buffer then holds the tokens
/// produced up to that point, without the end-of-input sentinel.
pub fn lex(src: &str, tokens: &mut Vec<Token>) -> Result<(), Spanned<Error>> {
    Lexer::new(src, tokens).lex()
}

/// A convenience function that allocates a new buffer per lexed input and
/// returns it.
pub fn lex_in_new(src: &str) -> Result<Vec<Token>, Spanned<Error>> {
    let mut tokens = Vec::with_capacity(SUGGESTED_TOKENS_CAPACITY);
    lex(src, &mut tokens)?;
    Ok(tokens)
}

/// Renders a human readable listing of the tokens, one per line, each
/// prefixed by its line and column.
pub fn dump_tokens(src: &str, tokens: &[Token]) -> String {
    let mut out = String::with_capacity(tokens.len() * 24);
    for token in tokens {
        let pos = token.span().position(src);
        let pos = format!("{}:{}", pos.line, pos.col);
        let kind = format!("{:?}", token.kind);
        // Writing into a `String` never fails.
        _ = writeln!(out, "{pos:<9} {kind:<14} {:?}", token.lexeme(src));
    }
    out
}

/// The BASIC lexer
struct Lexer<'src, 'tok> {
    src: &'src str,
    iter: Peekable<std::str::Chars<'src>>,
    cursor: usize,
    current_lo: usize,
    tokens: &'tok mut Vec<Token>,
}

impl Lexer<'_, '_> {
    /// Scans the source string until the input is exhausted.
    ///
    /// Tokens are written into the provided tokens buffer.
    fn lex(mut self) -> Result<(), Spanned<Error>> {
        assert_eq!(self.tokens.len(), 0, "must pass clean tokens buffer");
        loop {
            let Some(next) = self.scan_token_kind()? else {
                continue;
            };
            let is_eof = next == TokenKind::Eof;
            self.produce(next);
            if is_eof {
                break;
            }
        }
        debug!(tokens = self.tokens.len(), "lexed source");
        Ok(())
    }

    /// Tries to scan the current character. Returns `None` for trivia
    /// (whitespace and comments), which produce no token.
    fn scan_token_kind(&mut self) -> Result<Option<TokenKind>, Spanned<Error>> {
        use TokenKind::*;
        if self.iter.peek().is_none() {
            self.current_lo = self.cursor;
            return Ok(Some(Eof));
        }
        let kind = match self.mark_advance() {
            ' ' | '\t' | '\r' => return Ok(None),
            '\n' | ':' => Newline,
            '\'' => return Ok(self.comment()),
            '+' => Plus,
            '-' => Minus,
            '*' => Star,
            '/' => Slash,
            '=' => Eq,
            '<' => match self.peek() {
                '=' => self.advance_with(LessEq),
                '>' => self.advance_with(NotEq),
                _ => Less,
            },
            '>' => match self.peek() {
                '=' => self.advance_with(GreaterEq),
                _ => Greater,
            },
            '(' => LParen,
            ')' => RParen,
            ',' => Comma,
            ';' => Semicolon,
            '"' => self.string()?,
            '.' if self.peek().is_ascii_digit() => self.number(),
            c if c.is_ascii_digit() => self.number(),
            c if c.is_ascii_alphabetic() => return Ok(self.identifier_or_keyword()),
            c => return Err(self.span().wrap(Error::UnexpectedChar(c))),
        };
        Ok(Some(kind))
    }

    /// Lexes a string literal. A doubled quote stands for one quote
    /// character; the unescaping is deferred to [`extract::escaped_string`],
    /// so strings without escapes never allocate a new buffer.
    fn string(&mut self) -> Result<TokenKind, Spanned<Error>> {
        let mut has_escaped = false;
        loop {
            match self.next_char() {
                Some('"') if self.peek() == '"' => {
                    self.advance();
                    has_escaped = true;
                }
                Some('"') => {
                    return Ok(if has_escaped {
                        TokenKind::EscapedString
                    } else {
                        TokenKind::String
                    });
                }
                Some('\n') => {
                    // The line break is not part of the literal.
                    let span = self.span().offset(0, -1);
                    return Err(span.wrap(Error::UnterminatedString));
                }
                None => return Err(self.span().wrap(Error::UnterminatedString)),
                Some(_) => {}
            }
        }
    }

    fn identifier_or_keyword(&mut self) -> Option<TokenKind> {
        let valid_identifier_suffix = |c: char| c.is_ascii_alphanumeric() || c == '_';

        while valid_identifier_suffix(self.peek()) {
            self.advance();
        }
        let upper = self.substr().to_ascii_uppercase();
        if upper == "REM" {
            return self.comment();
        }
        if let Some(keyword) = KEYWORDS.get(&upper).copied() {
            return Some(keyword);
        }
        if self.peek() == '$' {
            self.advance();
        }
        Some(TokenKind::Identifier)
    }

    fn number(&mut self) -> TokenKind {
        let mut seen_point = self.substr() == ".";
        loop {
            match self.peek() {
                c if c.is_ascii_digit() => {}
                '.' if !seen_point => seen_point = true,
                _ => break,
            }
            self.advance();
        }
        TokenKind::Number
    }

    /// Skips until the end of the line. The line break itself is left to
    /// separate statements.
    fn comment(&mut self) -> Option<TokenKind> {
        while !matches!(self.iter.peek(), Some('\n') | None) {
            self.advance();
        }
        None
    }
}

impl Lexer<'_, '_> {
    /// Constructs a new lexer with the default state.
    fn new<'src, 'tok>(src: &'src str, tokens: &'tok mut Vec<Token>) -> Lexer<'src, 'tok> {
        Lexer {
            src,
            iter: src.chars().peekable(),
            cursor: 0,
            current_lo: 0,
            tokens,
        }
    }

    /// Starts a new token "mark" and advances the iterator.
    fn mark_advance(&mut self) -> char {
        self.current_lo = self.cursor;
        self.advance()
    }

    /// Returns the next char and advances the iterator, or `None` once the
    /// input is exhausted.
    fn next_char(&mut self) -> Option<char> {
        self.iter.next().inspect(|c| self.cursor += c.len_utf8())
    }

    /// Like [`Self::next_char`], with `'\0'` standing for the end of input.
    fn advance(&mut self) -> char {
        self.next_char().unwrap_or('\0')
    }

    /// Advances and returns the provided value.
    fn advance_with<T>(&mut self, value: T) -> T {
        self.advance();
        value
    }

    /// Returns the next char without advancing the iterator.
    fn peek(&mut self) -> char {
        self.iter.peek().copied().unwrap_or('\0')
    }

    /// Returns the current span.
    fn span(&self) -> Span {
        Span::new_of_bounds(self.current_lo..self.cursor)
    }

    /// Returns the substring of the current marked bounds.
    fn substr(&self) -> &str {
        self.span().substr(self.src)
    }

    /// Produces a token using the marked bounds.
    fn produce(&mut self, kind: TokenKind) {
        self.tokens.push(Token::new(kind, self.span()));
    }
}

pub mod extract {
    use std::num::ParseFloatError;

    use super::*;

    pub fn number(token: Token, src: &str) -> Result<f64, ParseFloatError> {
        debug_assert_eq!(token.kind, TokenKind::Number);
        token.lexeme(src).parse()
    }

    /// Returns the upper case spelling of an identifier, including its `$`
    /// suffix, if any.
    pub fn ident(token: Token, src: &str) -> Box<str> {
        debug_assert_eq!(token.kind, TokenKind::Identifier);
        token.lexeme(src).to_ascii_uppercase().into_boxed_str()
    }

    pub fn string(token: Token, src: &str) -> Box<str> {
        debug_assert_eq!(token.kind, TokenKind::String);
        let s = token.span().offset(1, -1).substr(src);
        s.to_string().into_boxed_str()
    }

    pub fn escaped_string(token: Token, src: &str) -> Box<str> {
        debug_assert_eq!(token.kind, TokenKind::EscapedString);
        let s = token.span().offset(1, -1).substr(src);
        let buf = s.replace("\"\"", "\"");
        debug_assert!(buf.len() < s.len(), "unescaping never grows a string");
        buf.into_boxed_str()
    }
}
