//! The runtime library of compiled BASIC programs.
//!
//! Linked statically into every executable, which has no C library: console
//! I/O goes straight to the kernel, and this crate also supplies the memory
//! routines the compiler may emit calls to.
#![no_std]
#![no_builtins]
#![allow(clippy::missing_safety_doc)]

#[cfg(not(all(target_os = "linux", any(target_arch = "x86_64", target_arch = "aarch64"))))]
compile_error!("the runtime supports Linux on x86_64 and aarch64 only");

mod console;
mod entry;
mod math;
mod mem;
mod sys;

#[panic_handler]
fn panic(_info: &core::panic::PanicInfo) -> ! {
    sys::exit(101)
}
