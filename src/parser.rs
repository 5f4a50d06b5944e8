use std::fmt;

use tracing::debug;

use crate::{
    ast::{
        BinaryOperator, CondArm, Expr, ExprKind, ForLoop, Ident, PrintItem, Program, Stmt,
        StmtKind, UnaryOperator, VarType,
    },
    lexer::{self, extract},
    token::{Span, Spanned, Token, TokenKind},
    util::intern::Interner,
};

type Result<T, E = Spanned<Error>> = std::result::Result<T, E>;

/// Lexes and parses a whole program.
pub fn parse_program(
    src: &str,
    tokens: &mut Vec<Token>,
    ident_interner: &mut Interner,
) -> std::result::Result<Program, crate::Error> {
    lexer::lex(src, tokens).map_err(|e| crate::Error::lex(src, e))?;
    parse_tokens(src, tokens, ident_interner).map_err(|e| crate::Error::syntax(src, e))
}

/// Lexes and parses a single expression.
pub fn parse_expr(
    src: &str,
    tokens: &mut Vec<Token>,
    ident_interner: &mut Interner,
) -> std::result::Result<Expr, crate::Error> {
    lexer::lex(src, tokens).map_err(|e| crate::Error::lex(src, e))?;
    let mut p = Parser::new(src, tokens, ident_interner);
    let expr = p
        .parse_expr()
        .and_then(|expr| p.consume(TokenKind::Eof).map(|_| expr));
    expr.map_err(|e| crate::Error::syntax(src, e))
}

/// Parses an already lexed token sequence, which must end with
/// [`TokenKind::Eof`].
pub fn parse_tokens(
    src: &str,
    tokens: &[Token],
    ident_interner: &mut Interner,
) -> Result<Program> {
    let program = Parser::new(src, tokens, ident_interner).parse_program()?;
    debug!(
        statements = program.body.len(),
        identifiers = ident_interner.len(),
        "parsed program"
    );
    Ok(program)
}

struct Parser<'src, 'tok, 'ident> {
    src: &'src str,
    tokens: &'tok [Token],
    ident_interner: &'ident mut Interner,
    cursor: usize,
    /// Span of the most recently consumed token.
    last: Span,
}

impl Parser<'_, '_, '_> {
    fn parse_program(&mut self) -> Result<Program> {
        let body = self.parse_block(&[])?;
        self.consume(TokenKind::Eof)?;
        Ok(Program { body })
    }

    /// Parses statements, each followed by a separator, until one of the
    /// provided terminators (or the end of input) is found. Does **NOT**
    /// consume the terminator.
    fn parse_block(&mut self, terminators: &[TokenKind]) -> Result<Vec<Stmt>> {
        let mut body = Vec::new();
        loop {
            while self.take(TokenKind::Newline) {}
            let c = self.peek().kind;
            if c == TokenKind::Eof || terminators.contains(&c) {
                break;
            }
            body.push(self.parse_statement()?);
            self.end_statement()?;
        }
        Ok(body)
    }

    fn end_statement(&mut self) -> Result<()> {
        if self.take(TokenKind::Newline) || self.is(TokenKind::Eof) {
            return Ok(());
        }
        Err(self.unexpected_construct(Construct::EndOfStatement))
    }

    fn parse_statement(&mut self) -> Result<Stmt> {
        let start = self.peek();
        let kind = match start.kind {
            TokenKind::Let => {
                self.advance();
                self.parse_assignment()?
            }
            TokenKind::Identifier => self.parse_assignment()?,
            TokenKind::Print => {
                self.advance();
                self.parse_print()?
            }
            TokenKind::Input => {
                self.advance();
                self.parse_input()?
            }
            TokenKind::If => {
                self.advance();
                self.parse_conditional()?
            }
            TokenKind::For => {
                self.advance();
                self.parse_for()?
            }
            TokenKind::While => {
                self.advance();
                let predicate = self.parse_expr()?;
                self.consume(TokenKind::Newline)?;
                let body = self.parse_block(&[TokenKind::Wend])?;
                self.consume(TokenKind::Wend)?;
                StmtKind::While { predicate, body }
            }
            TokenKind::Cls => {
                self.advance();
                StmtKind::Cls
            }
            TokenKind::Locate => {
                self.advance();
                let row = self.parse_expr()?;
                self.consume(TokenKind::Comma)?;
                let col = self.parse_expr()?;
                StmtKind::Locate { row, col }
            }
            _ => return Err(self.unexpected_construct(Construct::Statement)),
        };
        Ok(Stmt {
            kind,
            span: start.span().to(self.last),
        })
    }

    fn parse_assignment(&mut self) -> Result<StmtKind> {
        let target = self.parse_ident()?;
        self.consume(TokenKind::Eq)?;
        let value = self.parse_expr()?;
        Ok(StmtKind::Assignment { target, value })
    }

    fn parse_print(&mut self) -> Result<StmtKind> {
        let mut items = Vec::new();
        let mut newline = true;
        while !self.at_statement_end() {
            items.push(PrintItem::Expr(self.parse_expr()?));
            newline = true;
            match self.peek().kind {
                TokenKind::Semicolon => {}
                TokenKind::Comma => items.push(PrintItem::Tab),
                _ => break,
            }
            self.advance();
            newline = false;
        }
        Ok(StmtKind::Print { items, newline })
    }

    fn parse_input(&mut self) -> Result<StmtKind> {
        let token = self.peek();
        let prompt = match token.kind {
            TokenKind::String => Some(extract::string(token, self.src)),
            TokenKind::EscapedString => Some(extract::escaped_string(token, self.src)),
            _ => None,
        };
        if prompt.is_some() {
            self.advance();
            self.consume_any(&[TokenKind::Semicolon, TokenKind::Comma])?;
        }
        let target = self.parse_ident()?;
        Ok(StmtKind::Input { prompt, target })
    }

    fn parse_conditional(&mut self) -> Result<StmtKind> {
        const ARM_END: &[TokenKind] = &[TokenKind::ElseIf, TokenKind::Else, TokenKind::End];

        let predicate = self.parse_expr()?;
        self.consume(TokenKind::Then)?;

        if !self.is(TokenKind::Newline) {
            // Single line form: IF expr THEN statement [ELSE statement]
            let then_stmt = self.parse_statement()?;
            let else_arm = if self.take(TokenKind::Else) {
                Some(vec![self.parse_statement()?])
            } else {
                None
            };
            let arms = vec![CondArm {
                predicate,
                body: vec![then_stmt],
            }];
            return Ok(StmtKind::Conditional { arms, else_arm });
        }

        let body = self.parse_block(ARM_END)?;
        let mut arms = vec![CondArm { predicate, body }];
        while self.take(TokenKind::ElseIf) {
            let predicate = self.parse_expr()?;
            self.consume(TokenKind::Then)?;
            self.consume(TokenKind::Newline)?;
            let body = self.parse_block(ARM_END)?;
            arms.push(CondArm { predicate, body });
        }
        let else_arm = if self.take(TokenKind::Else) {
            self.consume(TokenKind::Newline)?;
            Some(self.parse_block(&[TokenKind::End])?)
        } else {
            None
        };
        self.consume(TokenKind::End)?;
        self.consume(TokenKind::If)?;
        Ok(StmtKind::Conditional { arms, else_arm })
    }

    fn parse_for(&mut self) -> Result<StmtKind> {
        let var = self.parse_ident()?;
        self.consume(TokenKind::Eq)?;
        let start = self.parse_expr()?;
        self.consume(TokenKind::To)?;
        let end = self.parse_expr()?;
        let step = if self.take(TokenKind::Step) {
            Some(self.parse_expr()?)
        } else {
            None
        };
        self.consume(TokenKind::Newline)?;
        let body = self.parse_block(&[TokenKind::Next])?;
        self.consume(TokenKind::Next)?;

        if self.is(TokenKind::Identifier) {
            let next_var = self.parse_ident()?;
            if next_var.name != var.name {
                let error = Error::MismatchedNext {
                    actual: self.ident_interner.get(next_var).into(),
                    expected: self.ident_interner.get(var).into(),
                };
                return Err(next_var.span.wrap(error));
            }
        }

        Ok(StmtKind::For(Box::new(ForLoop {
            var,
            start,
            end,
            step,
            body,
        })))
    }

    fn parse_ident(&mut self) -> Result<Ident> {
        let token = self.consume(TokenKind::Identifier)?;
        let name = extract::ident(token, self.src);
        let ty = if name.ends_with('$') {
            VarType::String
        } else {
            VarType::Number
        };
        Ok(Ident {
            name: self.ident_interner.intern(&name),
            ty,
            span: token.span(),
        })
    }

    fn parse_expr(&mut self) -> Result<Expr> {
        self.parse_expr_bp(0)
    }

    fn parse_expr_bp(&mut self, min_bp: u8) -> Result<Expr> {
        let mut lhs = self.parse_nud()?;

        loop {
            let op_token = self.peek();

            if let Some((lbp, rbp)) = Self::infix_binding_power(op_token.kind) {
                if lbp < min_bp {
                    // Operator binds less tightly than the minimum required
                    break;
                }

                self.advance(); // Operator
                lhs = self.parse_led(op_token, lhs, rbp)?;
            } else {
                // Not an infix operator
                break;
            }
        }

        Ok(lhs)
    }

    /// nud: Parses tokens that start an expression
    /// (prefix operators, literals, grouping, calls)
    fn parse_nud(&mut self) -> Result<Expr> {
        let token = self.peek();
        let (kind, span) = match token.kind {
            TokenKind::Number => {
                self.advance();
                let Ok(parsed) = extract::number(token, self.src) else {
                    return Err(token.span().wrap(Error::InvalidNumber));
                };
                (ExprKind::Number(parsed), token.span())
            }
            TokenKind::String => {
                self.advance();
                let s = extract::string(token, self.src);
                (ExprKind::String(s), token.span())
            }
            TokenKind::EscapedString => {
                self.advance();
                let s = extract::escaped_string(token, self.src);
                (ExprKind::String(s), token.span())
            }

            // Variable reference, or call: ID ( [expr [, expr]*] )
            TokenKind::Identifier => {
                let ident = self.parse_ident()?;
                if self.take(TokenKind::LParen) {
                    let args = self.parse_list(TokenKind::RParen, TokenKind::Comma, |p| {
                        p.parse_expr()
                    })?;
                    let end = self.consume(TokenKind::RParen)?;
                    let span = ident.span.to(end.span());
                    (ExprKind::Call { callee: ident, args }, span)
                } else {
                    (ExprKind::Var(ident), ident.span)
                }
            }

            // Grouping: ( expr )
            TokenKind::LParen => {
                self.advance();
                let expr = self.parse_expr()?;
                let end = self.consume(TokenKind::RParen)?;
                (expr.kind, token.span().to(end.span()))
            }

            // Prefix operators: -, +, NOT
            kind @ (TokenKind::Minus | TokenKind::Plus | TokenKind::Not) => {
                self.advance();
                let op = match kind {
                    TokenKind::Minus => UnaryOperator::Neg,
                    TokenKind::Plus => UnaryOperator::Plus,
                    _ => UnaryOperator::Not,
                };
                let expr = self.parse_expr_bp(Self::PREFIX_BINDING_POWER)?;

                let span = token.span().to(expr.span);
                let unary = ExprKind::Unary {
                    op,
                    expr: Box::new(expr),
                };
                (unary, span)
            }

            _ => return Err(self.unexpected_construct(Construct::Expression)),
        };

        Ok(Expr { kind, span })
    }

    /// led: Parses tokens that follow a left-hand-side expression
    /// (infix operators)
    fn parse_led(&mut self, op_token: Token, lhs: Expr, rbp: u8) -> Result<Expr> {
        let op = match op_token.kind {
            TokenKind::Plus => BinaryOperator::Add,
            TokenKind::Minus => BinaryOperator::Sub,
            TokenKind::Star => BinaryOperator::Mul,
            TokenKind::Slash => BinaryOperator::Div,
            TokenKind::Eq => BinaryOperator::Eq,
            TokenKind::NotEq => BinaryOperator::NotEq,
            TokenKind::Less => BinaryOperator::Less,
            TokenKind::LessEq => BinaryOperator::LessEq,
            TokenKind::Greater => BinaryOperator::Greater,
            TokenKind::GreaterEq => BinaryOperator::GreaterEq,
            TokenKind::And => BinaryOperator::And,
            TokenKind::Or => BinaryOperator::Or,
            other => unreachable!("{other:?} has no infix binding power"),
        };
        // Parse right operand with correct precedence
        let rhs = self.parse_expr_bp(rbp)?;

        let span = lhs.span.to(rhs.span);
        let kind = ExprKind::Binary {
            op,
            lhs: Box::new(lhs),
            rhs: Box::new(rhs),
        };
        Ok(Expr { kind, span })
    }

    /// Parses `item (separator item)*` until `end_delim` is found. Does
    /// **NOT** consume the end delimiter.
    fn parse_list<T>(
        &mut self,
        end_delim: TokenKind,
        separator: TokenKind,
        parse_item: impl Fn(&mut Self) -> Result<T>,
    ) -> Result<Vec<T>> {
        debug_assert_ne!(end_delim, separator);

        let mut items = Vec::new();
        if self.is(end_delim) {
            return Ok(items);
        }
        loop {
            items.push(parse_item(self)?);
            if !self.take(separator) {
                break;
            }
        }
        Ok(items)
    }

    // Left binding power is checked against the caller's minimum; all
    // operators are left-associative, hence `rbp = lbp + 1`.
    fn infix_binding_power(kind: TokenKind) -> Option<(u8, u8)> {
        let bp = match kind {
            // Level 4: Logical
            TokenKind::And | TokenKind::Or => (1, 2),

            // Level 3: Comparisons
            TokenKind::Eq
            | TokenKind::NotEq
            | TokenKind::Less
            | TokenKind::LessEq
            | TokenKind::Greater
            | TokenKind::GreaterEq => (3, 4),

            // Level 2: Addition/Subtraction
            TokenKind::Plus | TokenKind::Minus => (5, 6),

            // Level 1: Multiplication/Division
            TokenKind::Star | TokenKind::Slash => (7, 8),

            _ => return None,
        };
        Some(bp)
    }

    // Prefix operators bind tighter than any infix operator.
    const PREFIX_BINDING_POWER: u8 = 9;
}

impl Parser<'_, '_, '_> {
    fn new<'src, 'tok, 'ident>(
        src: &'src str,
        tokens: &'tok [Token],
        ident_interner: &'ident mut Interner,
    ) -> Parser<'src, 'tok, 'ident> {
        Parser {
            src,
            tokens,
            ident_interner,
            cursor: 0,
            last: Span::new_of_length(0, 0),
        }
    }

    /// Returns the current token.
    #[inline]
    fn peek(&self) -> Token {
        match self.tokens.get(self.cursor) {
            Some(token) => *token,
            None => Token::eof_for(self.src),
        }
    }

    /// Returns the current token and advances.
    fn advance(&mut self) -> Token {
        let c = self.peek();
        if !c.is_eof() {
            self.cursor += 1;
        }
        self.last = c.span();
        c
    }

    /// Checks whether the current token matches the given one.
    fn is(&self, expect: TokenKind) -> bool {
        self.peek().kind == expect
    }

    /// Whether the current token ends a (possibly single line) statement.
    fn at_statement_end(&self) -> bool {
        matches!(
            self.peek().kind,
            TokenKind::Newline | TokenKind::Eof | TokenKind::Else
        )
    }

    /// Advances if the current token matches the provided one, returning true.
    /// If not, returns false and doesn't advance.
    fn take(&mut self, expect: TokenKind) -> bool {
        if self.is(expect) {
            self.advance();
            true
        } else {
            false
        }
    }

    /// Advances if the current token matches the provided one, returning it.
    /// If not, returns an error.
    fn consume(&mut self, expect: TokenKind) -> Result<Token> {
        let c = self.peek();
        if self.is(expect) {
            self.advance();
            Ok(c)
        } else {
            Err(c.span().wrap(Error::Unexpected {
                actual: c.kind,
                expected: expect,
            }))
        }
    }

    /// Advances if the current token matches any of the provided tokens,
    /// returning it. If not, returns an error.
    fn consume_any(&mut self, expect: &'static [TokenKind]) -> Result<Token> {
        for t in expect {
            if self.is(*t) {
                return Ok(self.advance());
            }
        }
        let c = self.peek();
        Err(c.span().wrap(Error::UnexpectedAny {
            actual: c.kind,
            expected: expect,
        }))
    }

    fn unexpected_construct(&self, expected: Construct) -> Spanned<Error> {
        let c = self.peek();
        c.span().wrap(Error::ExpectedConstruct {
            actual: c.kind,
            expected,
        })
    }
}

#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum Error {
    #[error("expected {expected}, but got {actual}")]
    Unexpected {
        actual: TokenKind,
        expected: TokenKind,
    },
    #[error("expected one of {}, but got {actual}", fmt_list(.expected))]
    UnexpectedAny {
        actual: TokenKind,
        expected: &'static [TokenKind],
    },
    #[error("expected {expected}, but got {actual}")]
    ExpectedConstruct {
        actual: TokenKind,
        expected: Construct,
    },
    #[error("NEXT {actual} does not match FOR {expected}")]
    MismatchedNext { actual: Box<str>, expected: Box<str> },
    #[error("invalid number literal")]
    InvalidNumber,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Construct {
    Statement,
    Expression,
    EndOfStatement,
}

impl fmt::Display for Construct {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Construct::Statement => "a statement",
            Construct::Expression => "an expression",
            Construct::EndOfStatement => "end of statement",
        })
    }
}

fn fmt_list(kinds: &[TokenKind]) -> String {
    kinds
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

#[cfg(test)]
pub(crate) mod test_utils {
    use super::*;

    pub fn parse_program(src: &str) -> (Interner, Program) {
        let mut i = Interner::with_capacity(32);
        let prog = super::parse_program(src, &mut Vec::with_capacity(512), &mut i)
            .expect("failed to parse");
        (i, prog)
    }
}

#[cfg(test)]
mod tests {
    use crate::util::test_utils::tree_tests;

    tree_tests!(
        use parser;

        fn test_simple_expression() {
            let expr = "(1 * 2 + 3) - (1 + 2 * 3)";
            let tree_ok = "
                binary Sub (0..25)
                  binary Add (0..11)
                    binary Mul (1..6)
                      number 1 (1..2)
                      number 2 (5..6)
                    number 3 (9..10)
                  binary Add (14..25)
                    number 1 (15..16)
                    binary Mul (19..24)
                      number 2 (19..20)
                      number 3 (23..24)
            ";
        }

        fn test_variable_expr() {
            let expr = "myVar + name$";
            let tree_ok = "
                binary Add (0..13)
                  var MYVAR (0..5)
                  var NAME$ (8..13)
            ";
        }

        fn test_number_literal_expr() {
            let expr = ".25";
            let tree_ok = "number 0.25 (0..3)";
        }

        fn test_string_literal_expr() {
            let expr = r#""say ""hi""""#;
            let tree_ok = r#"string "say \"hi\"" (0..12)"#;
        }

        fn test_unary_expr() {
            let expr = "-x * +2";
            let tree_ok = "
                binary Mul (0..7)
                  unary Neg (0..2)
                    var X (1..2)
                  unary Plus (5..7)
                    number 2 (6..7)
            ";
        }

        fn test_not_binds_tighter_than_comparison() {
            let expr = "NOT a = b";
            let tree_ok = "
                binary Eq (0..9)
                  unary Not (0..5)
                    var A (4..5)
                  var B (8..9)
            ";
        }

        fn test_precedence_arith_compare_logical() {
            let expr = "a + 1 < b * 2 AND c <> d OR e";
            let tree_ok = "
                binary Or (0..29)
                  binary And (0..24)
                    binary Less (0..13)
                      binary Add (0..5)
                        var A (0..1)
                        number 1 (4..5)
                      binary Mul (8..13)
                        var B (8..9)
                        number 2 (12..13)
                    binary NotEq (18..24)
                      var C (18..19)
                      var D (23..24)
                  var E (28..29)
            ";
        }

        fn test_left_associativity() {
            let expr = "8 - 4 - 2";
            let tree_ok = "
                binary Sub (0..9)
                  binary Sub (0..5)
                    number 8 (0..1)
                    number 4 (4..5)
                  number 2 (8..9)
            ";
        }

        fn test_call_expr() {
            let expr = "abs(x - 1) + pos()";
            let tree_ok = "
                binary Add (0..18)
                  call ABS (0..10)
                    binary Sub (4..9)
                      var X (4..5)
                      number 1 (8..9)
                  call POS (13..18)
            ";
        }

        fn test_call_multiple_args() {
            let expr = "f(1, \"a\", g(x))";
            let tree_ok = "
                call F (0..15)
                  number 1 (2..3)
                  string \"a\" (5..8)
                  call G (10..14)
                    var X (12..13)
            ";
        }

        fn test_assignment() {
            let program = "let x = 1\ny$ = \"hi\"";
            let tree_ok = "
                assignment X (0..9)
                  number 1 (8..9)
                assignment Y$ (10..19)
                  string \"hi\" (15..19)
            ";
        }

        fn test_print_separators() {
            let program = "print 1; 2, x\nprint \"a\";\nprint";
            let tree_ok = "
                print (0..13)
                  number 1 (6..7)
                  number 2 (9..10)
                  tab
                  var X (12..13)
                print no-newline (14..24)
                  string \"a\" (20..23)
                print (25..30)
            ";
        }

        fn test_input() {
            let program = "input \"Name\"; n$\nINPUT age";
            let tree_ok = "
                input N$ (0..16)
                  prompt \"Name\"
                input AGE (17..26)
            ";
        }

        fn test_block_conditional() {
            let program = "
                if x < 1 then
                    print 1
                elseif x < 2 then
                    print 2
                else
                    print 3
                end if
            ";
            let tree_ok = "
                conditional (17..192)
                  arm
                    binary Less (20..25)
                      var X (20..21)
                      number 1 (24..25)
                    then
                      print (51..58)
                        number 1 (57..58)
                  arm
                    binary Less (82..87)
                      var X (82..83)
                      number 2 (86..87)
                    then
                      print (113..120)
                        number 2 (119..120)
                  else
                    print (162..169)
                      number 3 (168..169)
            ";
        }

        fn test_single_line_conditional() {
            let program = "IF a THEN b = 1 ELSE PRINT 2";
            let tree_ok = "
                conditional (0..28)
                  arm
                    var A (3..4)
                    then
                      assignment B (10..15)
                        number 1 (14..15)
                  else
                    print (21..28)
                      number 2 (27..28)
            ";
        }

        fn test_for_loop() {
            let program = "for i = 1 to 10 step 2: print i: next i";
            let tree_ok = "
                for I (0..39)
                  from
                    number 1 (8..9)
                  to
                    number 10 (13..15)
                  step
                    number 2 (21..22)
                  body
                    print (24..31)
                      var I (30..31)
            ";
        }

        fn test_while_cls_locate() {
            let program = "while n > 0\ncls\nlocate n, 2\nn = n - 1\nwend";
            let tree_ok = "
                while (0..42)
                  binary Greater (6..11)
                    var N (6..7)
                    number 0 (10..11)
                  body
                    cls (12..15)
                    locate (16..27)
                      var N (23..24)
                      number 2 (26..27)
                    assignment N (28..37)
                      binary Sub (32..37)
                        var N (32..33)
                        number 1 (36..37)
            ";
        }

        fn test_empty_program() {
            let program = "\n\n  ' nothing here\n";
            let tree_ok = "";
        }

        fn test_error_unexpected_token_in_expr() {
            let expr = "1 + ;";
            let expected_errors = &["4..5: expected an expression, but got ';'"];
        }

        fn test_error_unmatched_paren() {
            let expr = "(1 + 2";
            let expected_errors = &["6..6: expected ')', but got end of input"];
        }

        fn test_error_trailing_garbage() {
            let program = "print 1 2";
            let expected_errors = &["8..9: expected end of statement, but got number"];
        }

        fn test_error_stray_block_end() {
            let program = "x = 1\nwend";
            let expected_errors = &["6..10: expected a statement, but got WEND"];
        }

        fn test_error_missing_end_if() {
            let program = "if 1 then\nprint 1\n";
            let expected_errors = &["18..18: expected END, but got end of input"];
        }

        fn test_error_missing_then() {
            let program = "if 1 print 1";
            let expected_errors = &["5..10: expected THEN, but got PRINT"];
        }

        fn test_error_input_prompt_separator() {
            let program = "input \"n\" x";
            let expected_errors = &["10..11: expected one of ';', ',', but got identifier"];
        }

        fn test_error_mismatched_next() {
            let program = "for i = 1 to 2\nnext j";
            let expected_errors = &["20..21: NEXT J does not match FOR I"];
        }

        fn test_error_lexer() {
            let program = "x = 1 # 2";
            let expected_errors = &["6..7: unexpected character '#'"];
        }
    );
}
