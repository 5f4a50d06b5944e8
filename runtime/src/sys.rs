//! Raw Linux system calls.

use core::arch::asm;

#[cfg(target_arch = "x86_64")]
mod nr {
    pub const READ: usize = 0;
    pub const WRITE: usize = 1;
    pub const IOCTL: usize = 16;
    pub const EXIT_GROUP: usize = 231;
}

#[cfg(target_arch = "aarch64")]
mod nr {
    pub const READ: usize = 63;
    pub const WRITE: usize = 64;
    pub const IOCTL: usize = 29;
    pub const EXIT_GROUP: usize = 94;
}

pub const STDIN: usize = 0;
pub const STDOUT: usize = 1;

const EINTR: isize = -4;

pub const TCGETS: usize = 0x5401;
pub const TCSETS: usize = 0x5402;
pub const TIOCGWINSZ: usize = 0x5413;

pub const ICANON: u32 = 0o2;
pub const ECHO: u32 = 0o10;
pub const VTIME: usize = 5;
pub const VMIN: usize = 6;

/// The kernel's `struct termios`.
#[repr(C)]
#[derive(Clone, Copy)]
pub struct Termios {
    pub iflag: u32,
    pub oflag: u32,
    pub cflag: u32,
    pub lflag: u32,
    pub line: u8,
    pub cc: [u8; 19],
}

impl Termios {
    pub const fn zeroed() -> Self {
        Termios {
            iflag: 0,
            oflag: 0,
            cflag: 0,
            lflag: 0,
            line: 0,
            cc: [0; 19],
        }
    }
}

#[repr(C)]
#[derive(Clone, Copy, Default)]
pub struct Winsize {
    pub row: u16,
    pub col: u16,
    pub xpixel: u16,
    pub ypixel: u16,
}

#[cfg(target_arch = "x86_64")]
unsafe fn syscall3(n: usize, a1: usize, a2: usize, a3: usize) -> isize {
    let ret: isize;
    asm!(
        "syscall",
        inlateout("rax") n as isize => ret,
        in("rdi") a1,
        in("rsi") a2,
        in("rdx") a3,
        lateout("rcx") _,
        lateout("r11") _,
        options(nostack),
    );
    ret
}

#[cfg(target_arch = "aarch64")]
unsafe fn syscall3(n: usize, a1: usize, a2: usize, a3: usize) -> isize {
    let ret: isize;
    asm!(
        "svc 0",
        in("x8") n,
        inlateout("x0") a1 as isize => ret,
        in("x1") a2,
        in("x2") a3,
        options(nostack),
    );
    ret
}

/// Reads into `buf`, retrying when interrupted. Returns the byte count, `0` at
/// end of input or a negative errno.
pub fn read(fd: usize, buf: &mut [u8]) -> isize {
    loop {
        // SAFETY: `buf` is valid for writes of `buf.len()` bytes.
        let ret = unsafe { syscall3(nr::READ, fd, buf.as_mut_ptr() as usize, buf.len()) };
        if ret != EINTR {
            return ret;
        }
    }
}

/// Writes all of `bytes`. Returns `false` if the descriptor stops accepting
/// output.
pub fn write_all(fd: usize, mut bytes: &[u8]) -> bool {
    while !bytes.is_empty() {
        // SAFETY: `bytes` is valid for reads of `bytes.len()` bytes.
        let ret = unsafe { syscall3(nr::WRITE, fd, bytes.as_ptr() as usize, bytes.len()) };
        match ret {
            EINTR => continue,
            n if n <= 0 => return false,
            n => bytes = &bytes[n as usize..],
        }
    }
    true
}

pub fn tcgets(fd: usize, termios: &mut Termios) -> bool {
    // SAFETY: the kernel writes exactly one `struct termios`.
    unsafe { syscall3(nr::IOCTL, fd, TCGETS, core::ptr::from_mut(termios) as usize) == 0 }
}

pub fn tcsets(fd: usize, termios: &Termios) -> bool {
    // SAFETY: the kernel only reads the `struct termios`.
    unsafe { syscall3(nr::IOCTL, fd, TCSETS, core::ptr::from_ref(termios) as usize) == 0 }
}

pub fn window_size(fd: usize) -> Option<Winsize> {
    let mut ws = Winsize::default();
    // SAFETY: the kernel writes exactly one `struct winsize`.
    let ret = unsafe { syscall3(nr::IOCTL, fd, TIOCGWINSZ, core::ptr::from_mut(&mut ws) as usize) };
    (ret == 0).then_some(ws)
}

pub fn isatty(fd: usize) -> bool {
    tcgets(fd, &mut Termios::zeroed())
}

pub fn exit(code: i32) -> ! {
    loop {
        // SAFETY: `exit_group` takes no pointers and does not return.
        unsafe {
            syscall3(nr::EXIT_GROUP, code as usize, 0, 0);
        }
    }
}
