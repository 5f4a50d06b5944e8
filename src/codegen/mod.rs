use std::collections::HashMap;

use cranelift_codegen::{
    ir::{
        condcodes::FloatCC, immediates::Imm64, types, AbiParam, Block, ExtFuncData, ExternalName,
        FuncRef, Function, GlobalValue, GlobalValueData, InstBuilder, Signature, StackSlot,
        StackSlotData, StackSlotKind, Type, UserExternalName, UserFuncName, Value,
    },
    isa::CallConv,
};
use cranelift_frontend::{FunctionBuilder, FunctionBuilderContext, Variable};
use tracing::debug;

use crate::{
    ast::{
        self, BinaryOperator, Builtin, CondArm, Expr, ExprKind, ForLoop, Ident, PrintItem,
        Program, Stmt, UnaryOperator, VarType, Visitor,
    },
    token::{Span, Spanned},
    util::intern::{Interner, Symbol},
};

pub mod runtime;

use runtime::RuntimeFn;

/// User external name namespace of the runtime functions.
pub const FUNC_NAMESPACE: u32 = 0;

/// User external name namespace of the string literals.
pub const DATA_NAMESPACE: u32 = 1;

const DIVISION_BY_ZERO_MESSAGE: &[u8] = b"Error: division by zero\n";

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Error {
    #[error("undefined variable {0}")]
    UndefinedVariable(Box<str>),
    #[error("unknown function {0}")]
    UnknownFunction(Box<str>),
    #[error("{name} takes {expected} argument(s), but got {actual}")]
    Arity {
        name: Box<str>,
        expected: usize,
        actual: usize,
    },
    #[error("type mismatch: expected {expected}, but got {actual}")]
    TypeMismatch { expected: VarType, actual: VarType },
}

type Result<T, E = Spanned<Error>> = std::result::Result<T, E>;

/// The machine properties lowering depends on. The native pipeline checks
/// that the selected target agrees with them.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct LoweringTarget {
    pub pointer: Type,
    pub call_conv: CallConv,
}

impl LoweringTarget {
    pub fn host() -> LoweringTarget {
        let pointer = if cfg!(target_pointer_width = "32") {
            types::I32
        } else {
            types::I64
        };
        LoweringTarget {
            pointer,
            call_conv: CallConv::SystemV,
        }
    }
}

/// A lowered program: the `basic_main` function and the contents of the
/// string literals it refers to.
///
/// The function refers to runtime function `i` as the user name
/// `(FUNC_NAMESPACE, i)` and to `data[i]` as `(DATA_NAMESPACE, i)`.
#[derive(Debug)]
pub struct Lowered {
    pub func: Function,
    pub data: Vec<Box<[u8]>>,
    pub target: LoweringTarget,
}

/// Lowers the program into a single Cranelift function.
pub fn lower(program: &Program, idents: &Interner, target: LoweringTarget) -> Result<Lowered> {
    let mut sig = Signature::new(target.call_conv);
    sig.returns.push(AbiParam::new(types::I32));
    let name = UserFuncName::testcase(runtime::MAIN_SYMBOL);
    let mut func = Function::with_name_signature(name, sig);
    let mut builder_ctx = FunctionBuilderContext::new();

    let data = {
        let builder = FunctionBuilder::new(&mut func, &mut builder_ctx);
        let mut compiler = Compiler::new(idents, target, builder, program);
        program.accept(&mut compiler)?;
        compiler.finish()
    };
    debug!(strings = data.len(), "lowered program");

    Ok(Lowered { func, data, target })
}

/// An expression result.
#[derive(Copy, Clone, Debug)]
pub enum Operand {
    Number(Value),
    /// A pointer and a byte length, both pointer sized.
    String { ptr: Value, len: Value },
}

impl Operand {
    pub fn ty(self) -> VarType {
        match self {
            Operand::Number(_) => VarType::Number,
            Operand::String { .. } => VarType::String,
        }
    }
}

/// Storage of an assigned variable.
#[derive(Copy, Clone)]
enum Slot {
    Number(Variable),
    /// String variables own their bytes, so assignments copy.
    String {
        len: Variable,
        buffer: StackSlot,
        capacity: u32,
    },
}

/// Lowers the AST into the body of `basic_main`, one node at a time.
pub struct Compiler<'i, 'f> {
    idents: &'i Interner,
    ptr: Type,
    builder: FunctionBuilder<'f>,
    imports: Vec<FuncRef>,
    strings: HashMap<Box<[u8]>, GlobalValue>,
    data: Vec<Box<[u8]>>,
    vars: HashMap<Symbol, Slot>,
    line: StackSlot,
    pair: StackSlot,
}

impl<'i, 'f> Compiler<'i, 'f> {
    fn new(
        idents: &'i Interner,
        target: LoweringTarget,
        mut builder: FunctionBuilder<'f>,
        program: &Program,
    ) -> Compiler<'i, 'f> {
        let ptr = target.pointer;
        let imports = RuntimeFn::ALL
            .iter()
            .map(|&f| {
                let signature = builder.import_signature(f.signature(ptr, target.call_conv));
                let name = UserExternalName::new(FUNC_NAMESPACE, f.index());
                let name = builder.func.declare_imported_user_function(name);
                builder.import_function(ExtFuncData {
                    name: ExternalName::user(name),
                    signature,
                    colocated: false,
                })
            })
            .collect();

        let entry = builder.create_block();
        builder.switch_to_block(entry);
        builder.seal_block(entry);

        let line = builder.create_sized_stack_slot(StackSlotData::new(
            StackSlotKind::ExplicitSlot,
            rt_core::LINE_CAPACITY as u32,
            0,
        ));
        let pair = builder.create_sized_stack_slot(StackSlotData::new(
            StackSlotKind::ExplicitSlot,
            8,
            2,
        ));

        let mut compiler = Compiler {
            idents,
            ptr,
            builder,
            imports,
            strings: HashMap::new(),
            data: Vec::new(),
            vars: HashMap::with_capacity(32),
            line,
            pair,
        };
        compiler.call(RuntimeFn::Init, &[]);
        compiler.declare_vars(program);
        compiler
    }

    /// Allocates storage for every assigned variable, in source order, with
    /// its initial value.
    fn declare_vars(&mut self, program: &Program) {
        let mut capacity = rt_core::LINE_CAPACITY;
        ast::for_each_expr(&program.body, &mut |expr| {
            if let ExprKind::String(s) = &expr.kind {
                capacity = capacity.max(s.len());
            }
        });
        let capacity = capacity as u32;

        let mut targets = Vec::new();
        ast::for_each_assigned(&program.body, &mut |ident| targets.push(*ident));

        for ident in targets {
            if self.vars.contains_key(&ident.name) {
                continue;
            }
            let var = Variable::from_u32(self.vars.len() as u32);
            let slot = match ident.ty {
                VarType::Number => {
                    self.builder.declare_var(var, types::F64);
                    let zero = self.builder.ins().f64const(0.0);
                    self.builder.def_var(var, zero);
                    Slot::Number(var)
                }
                VarType::String => {
                    self.builder.declare_var(var, self.ptr);
                    let zero = self.builder.ins().iconst(self.ptr, 0);
                    self.builder.def_var(var, zero);
                    let buffer = self.builder.create_sized_stack_slot(StackSlotData::new(
                        StackSlotKind::ExplicitSlot,
                        capacity,
                        0,
                    ));
                    Slot::String {
                        len: var,
                        buffer,
                        capacity,
                    }
                }
            };
            self.vars.insert(ident.name, slot);
        }
    }

    /// Returns zero from `basic_main` and seals the function.
    fn finish(mut self) -> Vec<Box<[u8]>> {
        let zero = self.builder.ins().iconst(types::I32, 0);
        self.builder.ins().return_(&[zero]);
        self.builder.seal_all_blocks();
        self.builder.finalize();
        self.data
    }

    fn call(&mut self, f: RuntimeFn, args: &[Value]) -> Option<Value> {
        let inst = self.builder.ins().call(self.imports[f.index() as usize], args);
        self.builder.inst_results(inst).first().copied()
    }

    /// Calls a runtime function that returns a value.
    fn call_value(&mut self, f: RuntimeFn, args: &[Value]) -> Value {
        match self.call(f, args) {
            Some(value) => value,
            None => unreachable!("{f} returns nothing"),
        }
    }

    fn literal(&mut self, bytes: &[u8]) -> Operand {
        let len = self.builder.ins().iconst(self.ptr, bytes.len() as i64);
        if bytes.is_empty() {
            let ptr = self.builder.ins().iconst(self.ptr, 0);
            return Operand::String { ptr, len };
        }

        let gv = match self.strings.get(bytes) {
            Some(&gv) => gv,
            None => {
                let index = self.data.len() as u32;
                let name = UserExternalName::new(DATA_NAMESPACE, index);
                let name = self.builder.func.declare_imported_user_function(name);
                let gv = self.builder.create_global_value(GlobalValueData::Symbol {
                    name: ExternalName::user(name),
                    offset: Imm64::new(0),
                    colocated: true,
                    tls: false,
                });
                self.data.push(bytes.into());
                self.strings.insert(bytes.into(), gv);
                gv
            }
        };
        let ptr = self.builder.ins().symbol_value(self.ptr, gv);
        Operand::String { ptr, len }
    }

    fn print_literal(&mut self, bytes: &[u8]) {
        if let Operand::String { ptr, len } = self.literal(bytes) {
            self.call(RuntimeFn::PrintString, &[ptr, len]);
        }
    }

    fn name(&self, ident: &Ident) -> Box<str> {
        self.idents.get(ident).into()
    }

    fn slot(&self, ident: &Ident) -> Result<Slot> {
        self.vars
            .get(&ident.name)
            .copied()
            .ok_or_else(|| ident.span.wrap(Error::UndefinedVariable(self.name(ident))))
    }

    fn store(&mut self, target: &Ident, operand: Operand) -> Result<()> {
        match (self.slot(target)?, operand) {
            (Slot::Number(var), Operand::Number(value)) => self.builder.def_var(var, value),
            (
                Slot::String {
                    len: len_var,
                    buffer,
                    capacity,
                },
                Operand::String { ptr, len },
            ) => {
                let dest = self.builder.ins().stack_addr(self.ptr, buffer, 0);
                let capacity = self.builder.ins().iconst(self.ptr, i64::from(capacity));
                let len = self.builder.ins().umin(len, capacity);
                self.call(RuntimeFn::Memmove, &[dest, ptr, len]);
                self.builder.def_var(len_var, len);
            }
            (_, operand) => {
                return Err(target.span.wrap(Error::TypeMismatch {
                    expected: target.ty,
                    actual: operand.ty(),
                }));
            }
        }
        Ok(())
    }

    fn number(&mut self, expr: &Expr) -> Result<Value> {
        match expr.accept(self)? {
            Operand::Number(value) => Ok(value),
            other => Err(expr.span.wrap(Error::TypeMismatch {
                expected: VarType::Number,
                actual: other.ty(),
            })),
        }
    }

    fn string(&mut self, expr: &Expr) -> Result<(Value, Value)> {
        match expr.accept(self)? {
            Operand::String { ptr, len } => Ok((ptr, len)),
            other => Err(expr.span.wrap(Error::TypeMismatch {
                expected: VarType::String,
                actual: other.ty(),
            })),
        }
    }

    /// A boolean (`i8`) that is set for any non zero number.
    fn truthy(&mut self, expr: &Expr) -> Result<Value> {
        let value = self.number(expr)?;
        let zero = self.builder.ins().f64const(0.0);
        Ok(self.builder.ins().fcmp(FloatCC::NotEqual, value, zero))
    }

    fn from_bool(&mut self, cond: Value) -> Value {
        let one = self.builder.ins().f64const(1.0);
        let zero = self.builder.ins().f64const(0.0);
        self.builder.ins().select(cond, one, zero)
    }

    fn compare(&mut self, cc: FloatCC, l: Value, r: Value) -> Value {
        let cond = self.builder.ins().fcmp(cc, l, r);
        self.from_bool(cond)
    }

    /// Calls a runtime function which fills two `i32` out parameters.
    fn query_pair(&mut self, f: RuntimeFn) -> (Value, Value) {
        let first = self.builder.ins().stack_addr(self.ptr, self.pair, 0);
        let second = self.builder.ins().stack_addr(self.ptr, self.pair, 4);
        self.call(f, &[first, second]);
        let first = self.builder.ins().stack_load(types::I32, self.pair, 0);
        let second = self.builder.ins().stack_load(types::I32, self.pair, 4);
        (first, second)
    }

    fn i32_to_number(&mut self, value: Value, plus: i64) -> Value {
        let value = self.builder.ins().iadd_imm(value, plus);
        self.builder.ins().fcvt_from_sint(types::F64, value)
    }

    /// Branches to `then` when `cond` holds; continues in a new block
    /// otherwise, which is returned.
    fn branch_unless(&mut self, cond: Value, then: Block) -> Block {
        let next = self.builder.create_block();
        self.builder.ins().brif(cond, then, &[], next, &[]);
        next
    }
}

impl Visitor for Compiler<'_, '_> {
    type Value = Operand;
    type Error = Spanned<Error>;

    fn visit_assignment(&mut self, target: &Ident, value: &Expr) -> Result<()> {
        let operand = value.accept(self)?;
        self.store(target, operand)
    }

    fn visit_print(&mut self, items: &[PrintItem], newline: bool) -> Result<()> {
        for item in items {
            match item {
                PrintItem::Expr(expr) => match expr.accept(self)? {
                    Operand::Number(value) => {
                        self.call(RuntimeFn::PrintNumber, &[value]);
                    }
                    Operand::String { ptr, len } => {
                        self.call(RuntimeFn::PrintString, &[ptr, len]);
                    }
                },
                PrintItem::Tab => self.print_literal(b"\t"),
            }
        }
        if newline {
            self.print_literal(b"\n");
        }
        Ok(())
    }

    fn visit_input(&mut self, prompt: Option<&str>, target: &Ident) -> Result<()> {
        if let Some(prompt) = prompt {
            self.print_literal(prompt.as_bytes());
        }
        let capacity = self.builder.ins().iconst(self.ptr, rt_core::LINE_CAPACITY as i64);
        match self.slot(target)? {
            Slot::Number(var) => {
                let buf = self.builder.ins().stack_addr(self.ptr, self.line, 0);
                let len = self.call_value(RuntimeFn::ReadLine, &[buf, capacity]);
                let value = self.call_value(RuntimeFn::ParseNumber, &[buf, len]);
                self.builder.def_var(var, value);
            }
            Slot::String { len, buffer, .. } => {
                let buf = self.builder.ins().stack_addr(self.ptr, buffer, 0);
                let read = self.call_value(RuntimeFn::ReadLine, &[buf, capacity]);
                self.builder.def_var(len, read);
            }
        }
        Ok(())
    }

    fn visit_conditional(&mut self, arms: &[CondArm], else_arm: Option<&[Stmt]>) -> Result<()> {
        let merge = self.builder.create_block();
        for arm in arms {
            let cond = self.truthy(&arm.predicate)?;
            let then = self.builder.create_block();
            let next = self.branch_unless(cond, then);

            self.builder.switch_to_block(then);
            self.visit_block(&arm.body)?;
            self.builder.ins().jump(merge, &[]);

            self.builder.switch_to_block(next);
        }
        if let Some(body) = else_arm {
            self.visit_block(body)?;
        }
        self.builder.ins().jump(merge, &[]);
        self.builder.switch_to_block(merge);
        Ok(())
    }

    fn visit_for(&mut self, for_loop: &ForLoop) -> Result<()> {
        let var = &for_loop.var;
        let Slot::Number(counter) = self.slot(var)? else {
            return Err(var.span.wrap(Error::TypeMismatch {
                expected: VarType::Number,
                actual: var.ty,
            }));
        };

        let start = self.number(&for_loop.start)?;
        let end = self.number(&for_loop.end)?;
        let step = match &for_loop.step {
            Some(step) => self.number(step)?,
            None => self.builder.ins().f64const(1.0),
        };
        self.builder.def_var(counter, start);

        let header = self.builder.create_block();
        let body = self.builder.create_block();
        let exit = self.builder.create_block();
        self.builder.ins().jump(header, &[]);

        self.builder.switch_to_block(header);
        let current = self.builder.use_var(counter);
        let zero = self.builder.ins().f64const(0.0);
        let ascending = self.builder.ins().fcmp(FloatCC::GreaterThanOrEqual, step, zero);
        let below = self.builder.ins().fcmp(FloatCC::LessThanOrEqual, current, end);
        let above = self.builder.ins().fcmp(FloatCC::GreaterThanOrEqual, current, end);
        let proceed = self.builder.ins().select(ascending, below, above);
        self.builder.ins().brif(proceed, body, &[], exit, &[]);

        self.builder.switch_to_block(body);
        self.visit_block(&for_loop.body)?;
        let current = self.builder.use_var(counter);
        let next = self.builder.ins().fadd(current, step);
        self.builder.def_var(counter, next);
        self.builder.ins().jump(header, &[]);

        self.builder.switch_to_block(exit);
        Ok(())
    }

    fn visit_while(&mut self, predicate: &Expr, body: &[Stmt]) -> Result<()> {
        let header = self.builder.create_block();
        let body_block = self.builder.create_block();
        let exit = self.builder.create_block();
        self.builder.ins().jump(header, &[]);

        self.builder.switch_to_block(header);
        let cond = self.truthy(predicate)?;
        self.builder.ins().brif(cond, body_block, &[], exit, &[]);

        self.builder.switch_to_block(body_block);
        self.visit_block(body)?;
        self.builder.ins().jump(header, &[]);

        self.builder.switch_to_block(exit);
        Ok(())
    }

    fn visit_cls(&mut self) -> Result<()> {
        self.print_literal(rt_core::CLEAR_SCREEN);
        let zero = self.builder.ins().iconst(types::I32, 0);
        self.call(RuntimeFn::MoveCursorTo, &[zero, zero]);
        Ok(())
    }

    fn visit_locate(&mut self, row: &Expr, col: &Expr) -> Result<()> {
        let row = self.number(row)?;
        let col = self.number(col)?;
        let one = self.builder.ins().f64const(1.0);
        let row = self.builder.ins().fsub(row, one);
        let col = self.builder.ins().fsub(col, one);
        let row = self.builder.ins().fcvt_to_sint_sat(types::I32, row);
        let col = self.builder.ins().fcvt_to_sint_sat(types::I32, col);
        self.call(RuntimeFn::MoveCursorTo, &[col, row]);
        Ok(())
    }

    fn visit_number(&mut self, value: f64, _span: Span) -> Result<Operand> {
        Ok(Operand::Number(self.builder.ins().f64const(value)))
    }

    fn visit_string(&mut self, value: &str, _span: Span) -> Result<Operand> {
        Ok(self.literal(value.as_bytes()))
    }

    fn visit_var(&mut self, ident: &Ident) -> Result<Operand> {
        Ok(match self.slot(ident)? {
            Slot::Number(var) => Operand::Number(self.builder.use_var(var)),
            Slot::String { len, buffer, .. } => Operand::String {
                ptr: self.builder.ins().stack_addr(self.ptr, buffer, 0),
                len: self.builder.use_var(len),
            },
        })
    }

    fn visit_unary(&mut self, op: UnaryOperator, expr: &Expr, _span: Span) -> Result<Operand> {
        let operand = self.number(expr)?;
        let value = match op {
            UnaryOperator::Neg => self.builder.ins().fneg(operand),
            UnaryOperator::Plus => operand,
            UnaryOperator::Not => {
                let zero = self.builder.ins().f64const(0.0);
                let cond = self.builder.ins().fcmp(FloatCC::Equal, operand, zero);
                self.from_bool(cond)
            }
        };
        Ok(Operand::Number(value))
    }

    fn visit_binary(
        &mut self,
        op: BinaryOperator,
        lhs: &Expr,
        rhs: &Expr,
        _span: Span,
    ) -> Result<Operand> {
        use BinaryOperator::*;

        let l = self.number(lhs)?;
        let r = self.number(rhs)?;
        let value = match op {
            Add => self.builder.ins().fadd(l, r),
            Sub => self.builder.ins().fsub(l, r),
            Mul => self.builder.ins().fmul(l, r),
            Div => {
                let zero = self.builder.ins().f64const(0.0);
                let is_zero = self.builder.ins().fcmp(FloatCC::Equal, r, zero);
                let trap = self.builder.create_block();
                let cont = self.branch_unless(is_zero, trap);

                self.builder.switch_to_block(trap);
                self.builder.set_cold_block(trap);
                self.print_literal(DIVISION_BY_ZERO_MESSAGE);
                let code = self.builder.ins().iconst(types::I32, 1);
                self.call(RuntimeFn::Exit, &[code]);
                // Unreachable, as `basic_exit` never returns.
                self.builder.ins().return_(&[code]);

                self.builder.switch_to_block(cont);
                self.builder.ins().fdiv(l, r)
            }
            Eq => self.compare(FloatCC::Equal, l, r),
            NotEq => self.compare(FloatCC::NotEqual, l, r),
            Less => self.compare(FloatCC::LessThan, l, r),
            LessEq => self.compare(FloatCC::LessThanOrEqual, l, r),
            Greater => self.compare(FloatCC::GreaterThan, l, r),
            GreaterEq => self.compare(FloatCC::GreaterThanOrEqual, l, r),
            And | Or => {
                let zero = self.builder.ins().f64const(0.0);
                let l = self.builder.ins().fcmp(FloatCC::NotEqual, l, zero);
                let r = self.builder.ins().fcmp(FloatCC::NotEqual, r, zero);
                let cond = if op == And {
                    self.builder.ins().band(l, r)
                } else {
                    self.builder.ins().bor(l, r)
                };
                self.from_bool(cond)
            }
        };
        Ok(Operand::Number(value))
    }

    fn visit_call(&mut self, callee: &Ident, args: &[Expr], span: Span) -> Result<Operand> {
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
            Builtin::Abs => {
                let x = self.number(&args[0])?;
                self.builder.ins().fabs(x)
            }
            Builtin::Int => {
                let x = self.number(&args[0])?;
                self.builder.ins().floor(x)
            }
            Builtin::Sqr => {
                let x = self.number(&args[0])?;
                self.builder.ins().sqrt(x)
            }
            Builtin::Len => {
                let (_, len) = self.string(&args[0])?;
                self.builder.ins().fcvt_from_uint(types::F64, len)
            }
            Builtin::Val => {
                let (ptr, len) = self.string(&args[0])?;
                self.call_value(RuntimeFn::ParseNumber, &[ptr, len])
            }
            Builtin::Pos | Builtin::CsrLin => {
                let (col, row) = self.query_pair(RuntimeFn::GetCursorPos);
                let coord = if builtin == Builtin::Pos { col } else { row };
                self.i32_to_number(coord, 1)
            }
            Builtin::Cols | Builtin::Rows => {
                let (width, height) = self.query_pair(RuntimeFn::GetWindowSize);
                let dim = if builtin == Builtin::Cols { width } else { height };
                self.i32_to_number(dim, 0)
            }
        };
        Ok(Operand::Number(value))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::test_utils::parse_program;
    use cranelift_codegen::{settings, verify_function};
    use indoc::indoc;
    use pretty_assertions::assert_eq;

    fn lower_src(src: &str) -> std::result::Result<Lowered, String> {
        let (idents, program) = parse_program(src);
        lower(&program, &idents, LoweringTarget::host())
            .map_err(|Spanned { span, inner }| format!("{span}: {inner}"))
    }

    #[track_caller]
    fn lower_ok(src: &str) -> Lowered {
        let lowered = lower_src(src).expect("lowering failed");
        let flags = settings::Flags::new(settings::builder());
        if let Err(errors) = verify_function(&lowered.func, &flags) {
            panic!("invalid IR:\n{errors}\n{}", lowered.func.display());
        }
        lowered
    }

    #[test]
    fn test_lowered_programs_verify() {
        lower_ok("");
        lower_ok(indoc! {r#"
            INPUT "Name? "; N$
            INPUT A
            GREETING$ = "Hello, " : COPY$ = N$
            PRINT GREETING$; COPY$, LEN(N$); VAL("3") + A
            FOR I = 10 TO 1 STEP -1
              IF I / 2 = INT(I / 2) THEN
                PRINT I;
              ELSEIF I = 3 OR I = 5 AND NOT 0 THEN
                PRINT -I;
              ELSE
                PRINT ABS(I - 7) * SQR(4)
              END IF
            NEXT I
            WHILE POS() < COLS() AND CSRLIN() <= ROWS()
              PRINT "."; : IF 1 THEN LOCATE 1, 1 ELSE CLS
            WEND
        "#});
    }

    #[test]
    fn test_literals_are_deduplicated() {
        let lowered = lower_ok(indoc! {r#"
            PRINT "a", "b"
            PRINT "a", ""
        "#});
        let data: Vec<&[u8]> = lowered.data.iter().map(AsRef::as_ref).collect();
        assert_eq!(data, [&b"a"[..], b"\t", b"b", b"\n"]);
    }

    #[test]
    fn test_division_checks_for_zero() {
        let lowered = lower_ok("X = 1 / 3");
        assert!(lowered
            .data
            .iter()
            .any(|d| d.as_ref() == DIVISION_BY_ZERO_MESSAGE));
    }

    #[test]
    fn test_lowering_errors() {
        let cases = [
            ("PRINT X", "6..7: undefined variable X"),
            ("X = \"a\" * 2", "4..7: type mismatch: expected number, but got string"),
            ("X$ = 1", "0..2: type mismatch: expected string, but got number"),
            ("PRINT LEN(1)", "10..11: type mismatch: expected string, but got number"),
            ("X = RND(1)", "4..7: unknown function RND"),
            ("X = COLS(1)", "4..11: COLS takes 0 argument(s), but got 1"),
            ("FOR S$ = 1 TO 2\nNEXT", "4..6: type mismatch: expected number, but got string"),
        ];
        for (src, expected) in cases {
            assert_eq!(lower_src(src).map(|_| ()), Err(expected.to_owned()), "{src}");
        }
    }
}
