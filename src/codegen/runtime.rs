use std::fmt;

use cranelift_codegen::{
    ir::{types, AbiParam, Signature, Type},
    isa::CallConv,
};

/// The symbol of the lowered program, called by the runtime's entry point.
pub const MAIN_SYMBOL: &str = "basic_main";

/// The process entry point defined by the runtime library.
pub const ENTRY_SYMBOL: &str = "basic_entry";

/// Runtime library functions called by compiled programs.
///
/// Every lowered function imports all of them, in [`RuntimeFn::ALL`] order,
/// so an import's user-name index is its position in that list.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum RuntimeFn {
    Init,
    ParseNumber,
    PrintString,
    PrintNumber,
    ReadLine,
    GetWindowSize,
    MoveCursorTo,
    GetCursorPos,
    Exit,
    Memmove,
}

impl RuntimeFn {
    pub const ALL: &'static [RuntimeFn] = &[
        RuntimeFn::Init,
        RuntimeFn::ParseNumber,
        RuntimeFn::PrintString,
        RuntimeFn::PrintNumber,
        RuntimeFn::ReadLine,
        RuntimeFn::GetWindowSize,
        RuntimeFn::MoveCursorTo,
        RuntimeFn::GetCursorPos,
        RuntimeFn::Exit,
        RuntimeFn::Memmove,
    ];

    pub fn index(self) -> u32 {
        self as u32
    }

    pub fn symbol(self) -> &'static str {
        match self {
            RuntimeFn::Init => "basic_init",
            RuntimeFn::ParseNumber => "basic_parse_number",
            RuntimeFn::PrintString => "basic_print_string",
            RuntimeFn::PrintNumber => "basic_print_number",
            RuntimeFn::ReadLine => "basic_read_line",
            RuntimeFn::GetWindowSize => "basic_get_window_size",
            RuntimeFn::MoveCursorTo => "basic_move_cursor_to",
            RuntimeFn::GetCursorPos => "basic_get_cursor_pos",
            RuntimeFn::Exit => "basic_exit",
            RuntimeFn::Memmove => "memmove",
        }
    }

    /// The C signature, with sizes and pointers as `ptr`.
    pub fn signature(self, ptr: Type, call_conv: CallConv) -> Signature {
        let (params, returns): (&[Type], &[Type]) = match self {
            RuntimeFn::Init => (&[], &[]),
            RuntimeFn::ParseNumber => (&[ptr, ptr], &[types::F64]),
            RuntimeFn::PrintString => (&[ptr, ptr], &[]),
            RuntimeFn::PrintNumber => (&[types::F64], &[]),
            RuntimeFn::ReadLine => (&[ptr, ptr], &[ptr]),
            RuntimeFn::GetWindowSize | RuntimeFn::GetCursorPos => (&[ptr, ptr], &[]),
            RuntimeFn::MoveCursorTo => (&[types::I32, types::I32], &[]),
            RuntimeFn::Exit => (&[types::I32], &[]),
            RuntimeFn::Memmove => (&[ptr, ptr, ptr], &[ptr]),
        };
        let mut sig = Signature::new(call_conv);
        sig.params.extend(params.iter().copied().map(AbiParam::new));
        sig.returns.extend(returns.iter().copied().map(AbiParam::new));
        sig
    }
}

impl fmt::Display for RuntimeFn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_indices_follow_import_order() {
        for (i, f) in RuntimeFn::ALL.iter().enumerate() {
            assert_eq!(f.index() as usize, i, "{f}");
        }
    }
}
