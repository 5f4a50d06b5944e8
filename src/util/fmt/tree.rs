use std::io::Write;

use crate::{ast::*, util::intern::Interner};

const INDENT_WIDTH: usize = 2;

pub fn print_program_string(idents: &Interner, program: &Program) -> String {
    let mut buf = Vec::with_capacity(1024);
    print_program(&mut buf, idents, program).unwrap();
    String::from_utf8(buf).unwrap()
}

pub fn print_expr_string(idents: &Interner, expr: &Expr) -> String {
    let mut buf = Vec::with_capacity(512);
    print_expr(&mut buf, idents, 0, expr).unwrap();
    String::from_utf8(buf).unwrap()
}

pub fn print_program(
    w: &mut impl Write,
    idents: &Interner,
    program: &Program,
) -> std::io::Result<()> {
    print_block(w, idents, 0, &program.body)
}

fn print_block(
    w: &mut impl Write,
    idents: &Interner,
    i: usize,
    body: &[Stmt],
) -> std::io::Result<()> {
    for stmt in body {
        print_stmt(w, idents, i, stmt)?;
    }
    Ok(())
}

fn print_stmt(
    w: &mut impl Write,
    idents: &Interner,
    i: usize,
    stmt: &Stmt,
) -> std::io::Result<()> {
    sp(w, i)?;
    let span = stmt.span;
    match &stmt.kind {
        StmtKind::Assignment { target, value } => {
            writeln!(w, "assignment {} ({span})", idents.get(target))?;
            print_expr(w, idents, i + 1, value)?;
        }
        StmtKind::Print { items, newline } => {
            let suffix = if *newline { "" } else { " no-newline" };
            writeln!(w, "print{suffix} ({span})")?;
            for item in items {
                match item {
                    PrintItem::Expr(expr) => print_expr(w, idents, i + 1, expr)?,
                    PrintItem::Tab => {
                        sp(w, i + 1)?;
                        writeln!(w, "tab")?;
                    }
                }
            }
        }
        StmtKind::Input { prompt, target } => {
            writeln!(w, "input {} ({span})", idents.get(target))?;
            if let Some(prompt) = prompt {
                sp(w, i + 1)?;
                writeln!(w, "prompt {prompt:?}")?;
            }
        }
        StmtKind::Conditional { arms, else_arm } => {
            writeln!(w, "conditional ({span})")?;
            for arm in arms {
                sp(w, i + 1)?;
                writeln!(w, "arm")?;
                print_expr(w, idents, i + 2, &arm.predicate)?;
                sp(w, i + 2)?;
                writeln!(w, "then")?;
                print_block(w, idents, i + 3, &arm.body)?;
            }
            if let Some(else_arm) = else_arm {
                sp(w, i + 1)?;
                writeln!(w, "else")?;
                print_block(w, idents, i + 2, else_arm)?;
            }
        }
        StmtKind::For(for_loop) => {
            let ForLoop {
                var,
                start,
                end,
                step,
                body,
            } = &**for_loop;
            writeln!(w, "for {} ({span})", idents.get(var))?;
            let parts = [("from", Some(start)), ("to", Some(end)), ("step", step.as_ref())];
            for (label, expr) in parts {
                if let Some(expr) = expr {
                    sp(w, i + 1)?;
                    writeln!(w, "{label}")?;
                    print_expr(w, idents, i + 2, expr)?;
                }
            }
            sp(w, i + 1)?;
            writeln!(w, "body")?;
            print_block(w, idents, i + 2, body)?;
        }
        StmtKind::While { predicate, body } => {
            writeln!(w, "while ({span})")?;
            print_expr(w, idents, i + 1, predicate)?;
            sp(w, i + 1)?;
            writeln!(w, "body")?;
            print_block(w, idents, i + 2, body)?;
        }
        StmtKind::Cls => {
            writeln!(w, "cls ({span})")?;
        }
        StmtKind::Locate { row, col } => {
            writeln!(w, "locate ({span})")?;
            print_expr(w, idents, i + 1, row)?;
            print_expr(w, idents, i + 1, col)?;
        }
    }
    Ok(())
}

pub fn print_expr(
    w: &mut impl Write,
    idents: &Interner,
    i: usize,
    expr: &Expr,
) -> std::io::Result<()> {
    sp(w, i)?;
    let span = expr.span;
    match &expr.kind {
        ExprKind::Number(val) => {
            writeln!(w, "number {val} ({span})")?;
        }
        ExprKind::String(val) => {
            writeln!(w, "string {val:?} ({span})")?;
        }
        ExprKind::Var(ident) => {
            writeln!(w, "var {} ({span})", idents.get(ident))?;
        }
        ExprKind::Unary {
            op,
            expr: inner_expr,
        } => {
            writeln!(w, "unary {op:?} ({span})")?;
            print_expr(w, idents, i + 1, inner_expr)?;
        }
        ExprKind::Binary { op, lhs, rhs } => {
            writeln!(w, "binary {op:?} ({span})")?;
            print_expr(w, idents, i + 1, lhs)?;
            print_expr(w, idents, i + 1, rhs)?;
        }
        ExprKind::Call { callee, args } => {
            writeln!(w, "call {} ({span})", idents.get(callee))?;
            for arg in args {
                print_expr(w, idents, i + 1, arg)?;
            }
        }
    }
    Ok(())
}

fn sp(w: &mut impl Write, i: usize) -> std::io::Result<()> {
    write!(w, "{:width$}", "", width = i * INDENT_WIDTH)
}
