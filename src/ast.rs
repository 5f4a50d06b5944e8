// program    ::= [sep] { statement (sep | EOF) } EOF
// block      ::= [sep] { statement sep }
// statement  ::= [LET] ID '=' expr
//              | PRINT [ item { (';' | ',') item } [';' | ','] ]
//              | INPUT [ string (';' | ',') ] ID
//              | IF expr THEN sep block { ELSEIF expr THEN sep block } [ ELSE sep block ] END IF
//              | IF expr THEN statement [ ELSE statement ]
//              | FOR ID '=' expr TO expr [ STEP expr ] sep block NEXT [ID]
//              | WHILE expr sep block WEND
//              | CLS
//              | LOCATE expr ',' expr
// expr       ::= expr (AND | OR) expr
//              | expr ('=' | '<>' | '<' | '<=' | '>' | '>=') expr
//              | expr ('+' | '-') expr
//              | expr ('*' | '/') expr
//              | ('-' | '+' | NOT) expr
//              | ID [ '(' [expr (',' expr)*] ')' ]
//              | number
//              | string
//              | '(' expr ')'

// Precedence (all binary operators are left-associative)
//
// - + NOT (prefix)
// * /
// + -
// = <> < <= > >=
// AND OR

use crate::{token::Span, util::intern::Symbol};

#[derive(Debug, PartialEq, Default)]
pub struct Program {
    pub body: Vec<Stmt>,
}

impl Program {
    /// Runs the visitor over every top level statement, in order, stopping at
    /// the first error.
    pub fn accept<V: Visitor + ?Sized>(&self, visitor: &mut V) -> Result<(), V::Error> {
        visitor.visit_block(&self.body)
    }
}

#[derive(Debug, PartialEq)]
pub struct Stmt {
    pub kind: StmtKind,
    pub span: Span,
}

#[derive(Debug, PartialEq)]
pub enum StmtKind {
    Assignment {
        target: Ident,
        value: Expr,
    },
    Print {
        items: Vec<PrintItem>,
        /// False when the statement ends with a separator.
        newline: bool,
    },
    Input {
        prompt: Option<Box<str>>,
        target: Ident,
    },
    Conditional {
        /// Non empty list of arms: the `IF` arm followed by every `ELSEIF`.
        arms: Vec<CondArm>,
        else_arm: Option<Vec<Stmt>>,
    },
    For(Box<ForLoop>),
    While {
        predicate: Expr,
        body: Vec<Stmt>,
    },
    Cls,
    Locate {
        row: Expr,
        col: Expr,
    },
}

#[derive(Debug, PartialEq)]
pub struct CondArm {
    pub predicate: Expr,
    pub body: Vec<Stmt>,
}

#[derive(Debug, PartialEq)]
pub struct ForLoop {
    pub var: Ident,
    pub start: Expr,
    pub end: Expr,
    pub step: Option<Expr>,
    pub body: Vec<Stmt>,
}

#[derive(Debug, PartialEq)]
pub enum PrintItem {
    Expr(Expr),
    /// Written for each `,` separator.
    Tab,
}

#[derive(Debug, PartialEq)]
pub struct Expr {
    pub kind: ExprKind,
    pub span: Span,
}

#[derive(Debug, PartialEq)]
pub enum ExprKind {
    Number(f64),
    String(Box<str>),
    Var(Ident),
    Unary {
        op: UnaryOperator,
        expr: Box<Expr>,
    },
    Binary {
        op: BinaryOperator,
        lhs: Box<Expr>,
        rhs: Box<Expr>,
    },
    Call {
        callee: Ident,
        args: Vec<Expr>,
    },
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum UnaryOperator {
    Neg,
    Plus,
    Not,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum BinaryOperator {
    Add,
    Sub,
    Mul,
    Div,
    Eq,
    NotEq,
    Less,
    LessEq,
    Greater,
    GreaterEq,
    And,
    Or,
}

impl BinaryOperator {
    pub fn is_relational(self) -> bool {
        use BinaryOperator::*;
        matches!(self, Eq | NotEq | Less | LessEq | Greater | GreaterEq)
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum VarType {
    Number,
    /// Names ending in `$`.
    String,
}

impl std::fmt::Display for VarType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            VarType::Number => "number",
            VarType::String => "string",
        })
    }
}

#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Ident {
    pub name: Symbol,
    pub ty: VarType,
    pub span: Span,
}

impl From<Ident> for Symbol {
    fn from(value: Ident) -> Self {
        value.name
    }
}

impl From<&Ident> for Symbol {
    fn from(value: &Ident) -> Self {
        value.name
    }
}

/// The built-in functions.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Builtin {
    Abs,
    Int,
    Sqr,
    Len,
    Val,
    Pos,
    CsrLin,
    Cols,
    Rows,
}

impl Builtin {
    pub fn from_name(name: &str) -> Option<Builtin> {
        let builtin = match name {
            "ABS" => Builtin::Abs,
            "INT" => Builtin::Int,
            "SQR" => Builtin::Sqr,
            "LEN" => Builtin::Len,
            "VAL" => Builtin::Val,
            "POS" => Builtin::Pos,
            "CSRLIN" => Builtin::CsrLin,
            "COLS" => Builtin::Cols,
            "ROWS" => Builtin::Rows,
            _ => return None,
        };
        Some(builtin)
    }

    pub fn arity(self) -> usize {
        match self {
            Builtin::Abs | Builtin::Int | Builtin::Sqr | Builtin::Len | Builtin::Val => 1,
            Builtin::Pos | Builtin::CsrLin | Builtin::Cols | Builtin::Rows => 0,
        }
    }
}

/// A backend which processes the AST, one method per node kind.
///
/// Statements produce effects; expressions produce a [`Visitor::Value`]. The
/// nodes dispatch to these methods through `accept`, so a backend never
/// matches on the node kinds itself.
pub trait Visitor {
    type Value;
    type Error;

    fn visit_assignment(&mut self, target: &Ident, value: &Expr) -> Result<(), Self::Error>;

    fn visit_print(&mut self, items: &[PrintItem], newline: bool) -> Result<(), Self::Error>;

    fn visit_input(&mut self, prompt: Option<&str>, target: &Ident) -> Result<(), Self::Error>;

    fn visit_conditional(
        &mut self,
        arms: &[CondArm],
        else_arm: Option<&[Stmt]>,
    ) -> Result<(), Self::Error>;

    fn visit_for(&mut self, for_loop: &ForLoop) -> Result<(), Self::Error>;

    fn visit_while(&mut self, predicate: &Expr, body: &[Stmt]) -> Result<(), Self::Error>;

    fn visit_cls(&mut self) -> Result<(), Self::Error>;

    fn visit_locate(&mut self, row: &Expr, col: &Expr) -> Result<(), Self::Error>;

    fn visit_number(&mut self, value: f64, span: Span) -> Result<Self::Value, Self::Error>;

    fn visit_string(&mut self, value: &str, span: Span) -> Result<Self::Value, Self::Error>;

    fn visit_var(&mut self, ident: &Ident) -> Result<Self::Value, Self::Error>;

    fn visit_unary(
        &mut self,
        op: UnaryOperator,
        expr: &Expr,
        span: Span,
    ) -> Result<Self::Value, Self::Error>;

    fn visit_binary(
        &mut self,
        op: BinaryOperator,
        lhs: &Expr,
        rhs: &Expr,
        span: Span,
    ) -> Result<Self::Value, Self::Error>;

    fn visit_call(
        &mut self,
        callee: &Ident,
        args: &[Expr],
        span: Span,
    ) -> Result<Self::Value, Self::Error>;

    fn visit_block(&mut self, body: &[Stmt]) -> Result<(), Self::Error> {
        for stmt in body {
            stmt.accept(self)?;
        }
        Ok(())
    }
}

impl Stmt {
    pub fn accept<V: Visitor + ?Sized>(&self, visitor: &mut V) -> Result<(), V::Error> {
        match &self.kind {
            StmtKind::Assignment { target, value } => visitor.visit_assignment(target, value),
            StmtKind::Print { items, newline } => visitor.visit_print(items, *newline),
            StmtKind::Input { prompt, target } => visitor.visit_input(prompt.as_deref(), target),
            StmtKind::Conditional { arms, else_arm } => {
                visitor.visit_conditional(arms, else_arm.as_deref())
            }
            StmtKind::For(for_loop) => visitor.visit_for(for_loop),
            StmtKind::While { predicate, body } => visitor.visit_while(predicate, body),
            StmtKind::Cls => visitor.visit_cls(),
            StmtKind::Locate { row, col } => visitor.visit_locate(row, col),
        }
    }
}

impl Expr {
    pub fn accept<V: Visitor + ?Sized>(&self, visitor: &mut V) -> Result<V::Value, V::Error> {
        match &self.kind {
            ExprKind::Number(value) => visitor.visit_number(*value, self.span),
            ExprKind::String(value) => visitor.visit_string(value, self.span),
            ExprKind::Var(ident) => visitor.visit_var(ident),
            ExprKind::Unary { op, expr } => visitor.visit_unary(*op, expr, self.span),
            ExprKind::Binary { op, lhs, rhs } => visitor.visit_binary(*op, lhs, rhs, self.span),
            ExprKind::Call { callee, args } => visitor.visit_call(callee, args, self.span),
        }
    }
}

/// Visits every variable that a statement list may assign to, in source
/// order, including the ones nested in blocks.
pub fn for_each_assigned(body: &[Stmt], f: &mut impl FnMut(&Ident)) {
    for stmt in body {
        match &stmt.kind {
            StmtKind::Assignment { target, .. } | StmtKind::Input { target, .. } => f(target),
            StmtKind::Conditional { arms, else_arm } => {
                for arm in arms {
                    for_each_assigned(&arm.body, f);
                }
                if let Some(else_arm) = else_arm {
                    for_each_assigned(else_arm, f);
                }
            }
            StmtKind::For(for_loop) => {
                f(&for_loop.var);
                for_each_assigned(&for_loop.body, f);
            }
            StmtKind::While { body, .. } => for_each_assigned(body, f),
            StmtKind::Print { .. } | StmtKind::Cls | StmtKind::Locate { .. } => {}
        }
    }
}

/// Visits every expression of a statement list, sub-expressions included,
/// parents before children.
pub fn for_each_expr(body: &[Stmt], f: &mut impl FnMut(&Expr)) {
    fn walk(expr: &Expr, f: &mut impl FnMut(&Expr)) {
        f(expr);
        match &expr.kind {
            ExprKind::Unary { expr, .. } => walk(expr, f),
            ExprKind::Binary { lhs, rhs, .. } => {
                walk(lhs, f);
                walk(rhs, f);
            }
            ExprKind::Call { args, .. } => args.iter().for_each(|arg| walk(arg, f)),
            ExprKind::Number(_) | ExprKind::String(_) | ExprKind::Var(_) => {}
        }
    }

    for stmt in body {
        match &stmt.kind {
            StmtKind::Assignment { value, .. } => walk(value, f),
            StmtKind::Print { items, .. } => {
                for item in items {
                    if let PrintItem::Expr(expr) = item {
                        walk(expr, f);
                    }
                }
            }
            StmtKind::Input { .. } | StmtKind::Cls => {}
            StmtKind::Conditional { arms, else_arm } => {
                for arm in arms {
                    walk(&arm.predicate, f);
                    for_each_expr(&arm.body, f);
                }
                if let Some(else_arm) = else_arm {
                    for_each_expr(else_arm, f);
                }
            }
            StmtKind::For(for_loop) => {
                walk(&for_loop.start, f);
                walk(&for_loop.end, f);
                if let Some(step) = &for_loop.step {
                    walk(step, f);
                }
                for_each_expr(&for_loop.body, f);
            }
            StmtKind::While { predicate, body } => {
                walk(predicate, f);
                for_each_expr(body, f);
            }
            StmtKind::Locate { row, col } => {
                walk(row, f);
                walk(col, f);
            }
        }
    }
}
