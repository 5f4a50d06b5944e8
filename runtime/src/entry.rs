//! The process entry point: runs `basic_main` and exits with its result.

#[cfg(target_arch = "x86_64")]
core::arch::global_asm!(
    ".globl basic_entry",
    ".type basic_entry, @function",
    "basic_entry:",
    "xor ebp, ebp",
    "and rsp, -16",
    "call basic_main",
    "mov edi, eax",
    "call basic_exit",
    "ud2",
);

#[cfg(target_arch = "aarch64")]
core::arch::global_asm!(
    ".globl basic_entry",
    ".type basic_entry, %function",
    "basic_entry:",
    "mov x29, #0",
    "mov x30, #0",
    "bl basic_main",
    "bl basic_exit",
    "brk #0",
);
