use std::{collections::HashMap, io};

use tracing::debug;

use crate::{
    ast::{
        BinaryOperator, Builtin, CondArm, Expr, ForLoop, Ident, PrintItem, Program, Stmt,
        UnaryOperator, VarType, Visitor,
    },
    token::{Span, Spanned},
    util::intern::{Interner, Symbol},
};

mod console;

pub use console::{CapturedConsole, Console, TerminalConsole};

/// A runtime value.
#[derive(Clone, Debug, PartialEq)]
pub enum Value {
    Number(f64),
    String(String),
}

impl Value {
    pub fn ty(&self) -> VarType {
        match self {
            Value::Number(_) => VarType::Number,
            Value::String(_) => VarType::String,
        }
    }

    fn from_bool(value: bool) -> Value {
        Value::Number(if value { 1.0 } else { 0.0 })
    }
}

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("undefined variable {0}")]
    UndefinedVariable(Box<str>),
    #[error("type mismatch: expected {expected}, but got {actual}")]
    TypeMismatch { expected: VarType, actual: VarType },
    #[error("division by zero")]
    DivisionByZero,
    #[error("unknown function {0}")]
    UnknownFunction(Box<str>),
    #[error("{name} takes {expected} argument(s), but got {actual}")]
    Arity {
        name: Box<str>,
        expected: usize,
        actual: usize,
    },
    #[error("console failure: {0}")]
    Io(#[from] io::Error),
}

type Result<T, E = Spanned<Error>> = std::result::Result<T, E>;

/// Executes a program by walking its tree, against a whole-program variable
/// environment and a [`Console`].
pub struct Interpreter<'i, C> {
    idents: &'i Interner,
    console: C,
    vars: HashMap<Symbol, Value>,
}

impl<'i, C: Console> Interpreter<'i, C> {
    pub fn new(idents: &'i Interner, console: C) -> Interpreter<'i, C> {
        Interpreter {
            idents,
            console,
            vars: HashMap::with_capacity(32),
        }
    }

    /// Initializes the console and runs the program to completion, stopping
    /// at the first runtime error.
    pub fn run(&mut self, program: &Program) -> Result<()> {
        debug!(statements = program.body.len(), "interpreting");
        self.console
            .init()
            .map_err(|e| Span::default().wrap(e.into()))?;
        program.accept(self)
    }

    pub fn into_console(self) -> C {
        self.console
    }

    fn name(&self, ident: &Ident) -> Box<str> {
        self.idents.get(ident).into()
    }

    fn store(&mut self, target: &Ident, value: Value) -> Result<()> {
        if value.ty() != target.ty {
            return Err(target.span.wrap(Error::TypeMismatch {
                expected: target.ty,
                actual: value.ty(),
            }));
        }
        self.vars.insert(target.name, value);
        Ok(())
    }

    fn number(&mut self, expr: &Expr) -> Result<f64> {
        match expr.accept(self)? {
            Value::Number(n) => Ok(n),
            other => Err(expr.span.wrap(Error::TypeMismatch {
                expected: VarType::Number,
                actual: other.ty(),
            })),
        }
    }

    fn string(&mut self, expr: &Expr) -> Result<String> {
        match expr.accept(self)? {
            Value::String(s) => Ok(s),
            other => Err(expr.span.wrap(Error::TypeMismatch {
                expected: VarType::String,
                actual: other.ty(),
            })),
        }
    }

    fn truthy(&mut self, expr: &Expr) -> Result<bool> {
        Ok(self.number(expr)? != 0.0)
    }

    fn print(&mut self, text: &[u8], span: Span) -> Result<()> {
        self.console.print(text).map_err(|e| span.wrap(e.into()))
    }
}

impl<C: Console> Visitor for Interpreter<'_, C> {
    type Value = Value;
    type Error = Spanned<Error>;

    fn visit_assignment(&mut self, target: &Ident, value: &Expr) -> Result<()> {
        let value = value.accept(self)?;
        self.store(target, value)
    }

    fn visit_print(&mut self, items: &[PrintItem], newline: bool) -> Result<()> {
        // Item by item, so that POS() and CSRLIN() observe the earlier items.
        for item in items {
            match item {
                PrintItem::Expr(expr) => match expr.accept(self)? {
                    Value::Number(n) => {
                        self.print(rt_core::format_number(n).as_bytes(), expr.span)?;
                    }
                    Value::String(s) => self.print(s.as_bytes(), expr.span)?,
                },
                PrintItem::Tab => self.print(b"\t", Span::default())?,
            }
        }
        if newline {
            self.print(b"\n", Span::default())?;
        }
        Ok(())
    }

    fn visit_input(&mut self, prompt: Option<&str>, target: &Ident) -> Result<()> {
        if let Some(prompt) = prompt {
            self.print(prompt.as_bytes(), target.span)?;
        }
        let line = self.console.read_line();
        let value = match target.ty {
            VarType::Number => Value::Number(rt_core::parse_number(line.as_bytes())),
            VarType::String => Value::String(line),
        };
        self.store(target, value)
    }

    fn visit_conditional(&mut self, arms: &[CondArm], else_arm: Option<&[Stmt]>) -> Result<()> {
        for arm in arms {
            if self.truthy(&arm.predicate)? {
                return self.visit_block(&arm.body);
            }
        }
        match else_arm {
            Some(body) => self.visit_block(body),
            None => Ok(()),
        }
    }

    fn visit_for(&mut self, for_loop: &ForLoop) -> Result<()> {
        let var = &for_loop.var;
        if var.ty != VarType::Number {
            return Err(var.span.wrap(Error::TypeMismatch {
                expected: VarType::Number,
                actual: var.ty,
            }));
        }

        let start = self.number(&for_loop.start)?;
        let end = self.number(&for_loop.end)?;
        let step = match &for_loop.step {
            Some(step) => self.number(step)?,
            None => 1.0,
        };

        self.vars.insert(var.name, Value::Number(start));
        loop {
            let current = self.number_var(var)?;
            let proceed = if step >= 0.0 {
                current <= end
            } else {
                current >= end
            };
            if !proceed {
                break;
            }
            self.visit_block(&for_loop.body)?;
            let current = self.number_var(var)?;
            self.vars.insert(var.name, Value::Number(current + step));
        }
        Ok(())
    }

    fn visit_while(&mut self, predicate: &Expr, body: &[Stmt]) -> Result<()> {
        while self.truthy(predicate)? {
            self.visit_block(body)?;
        }
        Ok(())
    }

    fn visit_cls(&mut self) -> Result<()> {
        let span = Span::default();
        self.print(rt_core::CLEAR_SCREEN, span)?;
        self.console
            .move_cursor_to(0, 0)
            .map_err(|e| span.wrap(e.into()))
    }

    fn visit_locate(&mut self, row: &Expr, col: &Expr) -> Result<()> {
        let row_value = self.number(row)?;
        let col_value = self.number(col)?;
        // Saturating, with NaN mapping to zero, exactly like compiled code.
        let (col_index, row_index) = ((col_value - 1.0) as i32, (row_value - 1.0) as i32);
        self.console
            .move_cursor_to(col_index, row_index)
            .map_err(|e| row.span.to(col.span).wrap(e.into()))
    }

    fn visit_number(&mut self, value: f64, _span: Span) -> Result<Value> {
        Ok(Value::Number(value))
    }

    fn visit_string(&mut self, value: &str, _span: Span) -> Result<Value> {
        Ok(Value::String(value.to_owned()))
    }

    fn visit_var(&mut self, ident: &Ident) -> Result<Value> {
        match self.vars.get(&ident.name) {
            Some(value) => Ok(value.clone()),
            None => Err(ident.span.wrap(Error::UndefinedVariable(self.name(ident)))),
        }
    }

    fn visit_unary(&mut self, op: UnaryOperator, expr: &Expr, _span: Span) -> Result<Value> {
        let operand = self.number(expr)?;
        Ok(match op {
            UnaryOperator::Neg => Value::Number(-operand),
            UnaryOperator::Plus => Value::Number(operand),
            UnaryOperator::Not => Value::from_bool(operand == 0.0),
        })
    }

    fn visit_binary(
        &mut self,
        op: BinaryOperator,
        lhs: &Expr,
        rhs: &Expr,
        span: Span,
    ) -> Result<Value> {
        use BinaryOperator::*;

        let l = self.number(lhs)?;
        let r = self.number(rhs)?;
        #[allow(clippy::float_cmp)]
        let value = match op {
            Add => Value::Number(l + r),
            Sub => Value::Number(l - r),
            Mul => Value::Number(l * r),
            Div if r == 0.0 => return Err(span.wrap(Error::DivisionByZero)),
            Div => Value::Number(l / r),
            Eq => Value::from_bool(l == r),
            NotEq => Value::from_bool(l != r),
            Less => Value::from_bool(l < r),
            LessEq => Value::from_bool(l <= r),
            Greater => Value::from_bool(l > r),
            GreaterEq => Value::from_bool(l >= r),
            And => Value::from_bool(l != 0.0 && r != 0.0),
            Or => Value::from_bool(l != 0.0 || r != 0.0),
        };
        Ok(value)
    }

    fn visit_call(&mut self, callee: &Ident, args: &[Expr], span: Span) -> Result<Value> {
        let Some(builtin) = Builtin::from_name(self.idents.get(callee)) else {
            return Err(callee.span.wrap(Error::UnknownFunction(self.name(callee))));
        };
        if args.len() != builtin.arity() {
            return Err(span.wrap(Error::Arity {
                name: self.name(callee),
                expected: builtin.arity(),
                actual: args.len(),
            }));
        }

        let value = match builtin {
            Builtin::Abs => self.number(&args[0])?.abs(),
            Builtin::Int => rt_core::floor(self.number(&args[0])?),
            Builtin::Sqr => self.number(&args[0])?.sqrt(),
            Builtin::Len => self.string(&args[0])?.len() as f64,
            Builtin::Val => rt_core::parse_number(self.string(&args[0])?.as_bytes()),
            Builtin::Pos => f64::from(self.console.cursor_pos().0 + 1),
            Builtin::CsrLin => f64::from(self.console.cursor_pos().1 + 1),
            Builtin::Cols => f64::from(self.console.window_size().0),
            Builtin::Rows => f64::from(self.console.window_size().1),
        };
        Ok(Value::Number(value))
    }
}

impl<C: Console> Interpreter<'_, C> {
    fn number_var(&mut self, var: &Ident) -> Result<f64> {
        match self.visit_var(var)? {
            Value::Number(n) => Ok(n),
            other => Err(var.span.wrap(Error::TypeMismatch {
                expected: VarType::Number,
                actual: other.ty(),
            })),
        }
    }
}
