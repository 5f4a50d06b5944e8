use std::{fmt, ops::Range};

#[derive(Copy, Clone, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    lo: usize,
    len: u32,
}

impl Token {
    pub fn new(kind: TokenKind, span: Span) -> Token {
        Token {
            kind,
            len: span.len,
            lo: span.lo,
        }
    }

    pub fn span(&self) -> Span {
        Span {
            len: self.len,
            lo: self.lo,
        }
    }

    /// The exact source text of this token.
    pub fn lexeme<'src>(&self, src: &'src str) -> &'src str {
        self.span().substr(src)
    }

    pub fn is_eof(&self) -> bool {
        self.kind == TokenKind::Eof
    }

    pub fn eof_for(src: &str) -> Token {
        Token::new(TokenKind::Eof, Span::new_of_length(src.len(), 0))
    }
}

impl fmt::Debug for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Token({:?}, {})", self.kind, self.span())
    }
}

#[derive(Copy, Clone, Default, PartialEq, Eq, Hash)]
pub struct Span {
    pub len: u32,
    pub lo: usize,
}

impl Span {
    pub fn new_of_bounds(Range { start: lo, end: hi }: Range<usize>) -> Span {
        debug_assert!(hi >= lo);
        Self::new_of_length(lo, u32::try_from(hi - lo).unwrap_or(u32::MAX))
    }

    pub fn new_of_length(lo: usize, len: u32) -> Span {
        Span { len, lo }
    }

    pub fn hi(self) -> usize {
        self.lo + self.len as usize
    }

    /// Returns a span covering `self` through the end of `other`.
    pub fn to(self, other: Span) -> Span {
        Span::new_of_bounds(self.lo..other.hi().max(self.hi()))
    }

    pub fn substr(self, src: &str) -> &str {
        &src[self.lo..self.hi()]
    }

    /// Shrinks (or grows) the span by the given offsets on each side.
    pub fn offset(self, lo: isize, hi: isize) -> Span {
        let lo = self.lo.saturating_add_signed(lo);
        let hi = self.hi().saturating_add_signed(hi).max(lo);
        Span::new_of_bounds(lo..hi)
    }

    /// One-based line and column of the first byte of this span.
    pub fn position(self, src: &str) -> Position {
        let before = &src[..self.lo.min(src.len())];
        let line = before.bytes().filter(|&b| b == b'\n').count() + 1;
        let line_start = before.rfind('\n').map_or(0, |i| i + 1);
        let col = before[line_start..].chars().count() + 1;
        Position { line, col }
    }

    pub fn wrap<T>(self, inner: T) -> Spanned<T> {
        Spanned { span: self, inner }
    }
}

impl fmt::Debug for Span {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Span({self}, len: {})", self.len)
    }
}

impl fmt::Display for Span {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let lo = self.lo;
        let hi = self.hi();
        write!(f, "{lo}..{hi}")
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Position {
    pub line: usize,
    pub col: usize,
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "line {}, column {}", self.line, self.col)
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Spanned<T> {
    pub span: Span,
    pub inner: T,
}

impl<T> Spanned<T> {
    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Spanned<U> {
        self.span.wrap(f(self.inner))
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum TokenKind {
    Let,
    Print,
    Input,
    If,
    Then,
    Else,
    ElseIf,
    End,
    For,
    To,
    Step,
    Next,
    While,
    Wend,
    Cls,
    Locate,
    And,
    Or,
    Not,

    Plus,
    Minus,
    Star,
    Slash,
    Eq,
    /// `<>`
    NotEq,
    Less,
    LessEq,
    Greater,
    GreaterEq,
    LParen,
    RParen,
    Comma,
    Semicolon,

    Identifier,
    Number,
    String,
    /// A string literal which contains at least one doubled quote.
    EscapedString,

    /// A line break or a `:`.
    Newline,
    Eof,
}

impl TokenKind {
    pub fn is_keyword(self) -> bool {
        use TokenKind::*;
        matches!(
            self,
            Let | Print
                | Input
                | If
                | Then
                | Else
                | ElseIf
                | End
                | For
                | To
                | Step
                | Next
                | While
                | Wend
                | Cls
                | Locate
                | And
                | Or
                | Not
        )
    }

    /// Whether this token ends a statement.
    pub fn is_terminator(self) -> bool {
        matches!(self, TokenKind::Newline | TokenKind::Eof)
    }
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        use TokenKind::*;
        let s = match self {
            Let => "LET",
            Print => "PRINT",
            Input => "INPUT",
            If => "IF",
            Then => "THEN",
            Else => "ELSE",
            ElseIf => "ELSEIF",
            End => "END",
            For => "FOR",
            To => "TO",
            Step => "STEP",
            Next => "NEXT",
            While => "WHILE",
            Wend => "WEND",
            Cls => "CLS",
            Locate => "LOCATE",
            And => "AND",
            Or => "OR",
            Not => "NOT",
            Plus => "'+'",
            Minus => "'-'",
            Star => "'*'",
            Slash => "'/'",
            Eq => "'='",
            NotEq => "'<>'",
            Less => "'<'",
            LessEq => "'<='",
            Greater => "'>'",
            GreaterEq => "'>='",
            LParen => "'('",
            RParen => "')'",
            Comma => "','",
            Semicolon => "';'",
            Identifier => "identifier",
            Number => "number",
            String | EscapedString => "string",
            Newline => "end of line",
            Eof => "end of input",
        };
        f.write_str(s)
    }
}

/// Keywords, keyed by their upper case spelling. `REM` is absent since the
/// lexer treats it as a comment.
pub static KEYWORDS: phf::Map<&'static str, TokenKind> = phf::phf_map! {
    "LET" => TokenKind::Let,
    "PRINT" => TokenKind::Print,
    "INPUT" => TokenKind::Input,
    "IF" => TokenKind::If,
    "THEN" => TokenKind::Then,
    "ELSE" => TokenKind::Else,
    "ELSEIF" => TokenKind::ElseIf,
    "END" => TokenKind::End,
    "FOR" => TokenKind::For,
    "TO" => TokenKind::To,
    "STEP" => TokenKind::Step,
    "NEXT" => TokenKind::Next,
    "WHILE" => TokenKind::While,
    "WEND" => TokenKind::Wend,
    "CLS" => TokenKind::Cls,
    "LOCATE" => TokenKind::Locate,
    "AND" => TokenKind::And,
    "OR" => TokenKind::Or,
    "NOT" => TokenKind::Not,
};
