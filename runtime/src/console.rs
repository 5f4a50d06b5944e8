//! The functions compiled programs import.

use core::{
    slice,
    sync::atomic::{AtomicU8, Ordering},
};

use rt_core::{
    clamp_cursor, cursor_escape, format_number, normalize_newlines, parse_cursor_report,
    parse_number, read_terminal_line, strip_line_terminator, CURSOR_REPORT_QUERY,
    FALLBACK_WINDOW_SIZE,
};

use crate::sys::{self, Termios, ECHO, ICANON, STDIN, STDOUT, VMIN, VTIME};

const UNINIT: u8 = 0x80;
const STDOUT_TTY: u8 = 1 << 0;
const STDIN_TTY: u8 = 1 << 1;

static STATE: AtomicU8 = AtomicU8::new(UNINIT);

/// Console state, detected on first use.
fn state() -> u8 {
    let state = STATE.load(Ordering::Relaxed);
    if state != UNINIT {
        return state;
    }
    let mut state = 0;
    if sys::isatty(STDOUT) {
        state |= STDOUT_TTY;
    }
    if sys::isatty(STDIN) {
        state |= STDIN_TTY;
    }
    STATE.store(state, Ordering::Relaxed);
    state
}

fn interactive() -> bool {
    state() & STDOUT_TTY != 0
}

fn print(bytes: &[u8]) {
    normalize_newlines(bytes, interactive(), |chunk| {
        sys::write_all(STDOUT, chunk);
    });
}

unsafe fn bytes<'a>(ptr: *const u8, len: usize) -> &'a [u8] {
    if ptr.is_null() || len == 0 {
        &[]
    } else {
        slice::from_raw_parts(ptr, len)
    }
}

fn window_size() -> (i32, i32) {
    if !interactive() {
        return FALLBACK_WINDOW_SIZE;
    }
    match sys::window_size(STDOUT) {
        Some(ws) if ws.col > 0 && ws.row > 0 => (i32::from(ws.col), i32::from(ws.row)),
        _ => FALLBACK_WINDOW_SIZE,
    }
}

#[no_mangle]
pub extern "C" fn basic_init() {
    state();
}

#[no_mangle]
pub unsafe extern "C" fn basic_parse_number(ptr: *const u8, len: usize) -> f64 {
    parse_number(bytes(ptr, len))
}

#[no_mangle]
pub unsafe extern "C" fn basic_print_string(ptr: *const u8, len: usize) {
    print(bytes(ptr, len));
}

#[no_mangle]
pub extern "C" fn basic_print_number(value: f64) {
    print(format_number(value).as_bytes());
}

/// Reads one line into `buf`, without its terminator, keeping at most
/// `capacity` bytes. The rest of an overlong line is discarded. Returns the
/// stored length, `0` at end of input or on failure.
#[no_mangle]
pub unsafe extern "C" fn basic_read_line(buf: *mut u8, capacity: usize) -> usize {
    if buf.is_null() || capacity == 0 {
        return 0;
    }
    let buf = slice::from_raw_parts_mut(buf, capacity);

    if state() & STDIN_TTY != 0 {
        return read_terminal_line(buf, |chunk| sys::read(STDIN, chunk));
    }

    // Byte by byte, so input past this line stays unread.
    let mut len = 0;
    let mut byte = [0];
    loop {
        match sys::read(STDIN, &mut byte) {
            0 => break,
            n if n < 0 => return 0,
            _ => {}
        }
        if len < capacity {
            buf[len] = byte[0];
            len += 1;
        }
        if byte[0] == b'\n' {
            break;
        }
    }
    strip_line_terminator(&buf[..len]).len()
}

#[no_mangle]
pub unsafe extern "C" fn basic_get_window_size(width: *mut i32, height: *mut i32) {
    let (w, h) = window_size();
    if let Some(width) = width.as_mut() {
        *width = w;
    }
    if let Some(height) = height.as_mut() {
        *height = h;
    }
}

#[no_mangle]
pub extern "C" fn basic_move_cursor_to(col: i32, row: i32) {
    if !interactive() {
        return;
    }
    let (width, height) = window_size();
    let (col, row) = clamp_cursor(col, row, width, height);
    sys::write_all(STDOUT, cursor_escape(col, row).as_bytes());
}

/// Asks the terminal where the cursor is. Reports `(0, 0)` when there is no
/// terminal to ask or it does not answer in time.
#[no_mangle]
pub unsafe extern "C" fn basic_get_cursor_pos(col: *mut i32, row: *mut i32) {
    let (c, r) = query_cursor().unwrap_or((0, 0));
    if let Some(col) = col.as_mut() {
        *col = c;
    }
    if let Some(row) = row.as_mut() {
        *row = r;
    }
}

fn query_cursor() -> Option<(i32, i32)> {
    if state() & (STDOUT_TTY | STDIN_TTY) != STDOUT_TTY | STDIN_TTY {
        return None;
    }

    let mut saved = Termios::zeroed();
    if !sys::tcgets(STDIN, &mut saved) {
        return None;
    }
    let mut raw = saved;
    raw.lflag &= !(ICANON | ECHO);
    raw.cc[VMIN] = 0;
    raw.cc[VTIME] = 10;
    if !sys::tcsets(STDIN, &raw) {
        return None;
    }

    let mut report = [0; 32];
    let mut len = 0;
    if sys::write_all(STDOUT, CURSOR_REPORT_QUERY) {
        while len < report.len() {
            match sys::read(STDIN, &mut report[len..]) {
                n if n > 0 => len += n as usize,
                _ => break,
            }
            if report[..len].contains(&b'R') {
                break;
            }
        }
    }
    sys::tcsets(STDIN, &saved);

    // Skip anything typed ahead of the report.
    let start = report[..len].iter().rposition(|&b| b == 0x1b)?;
    parse_cursor_report(&report[start..len])
}

#[no_mangle]
pub extern "C" fn basic_exit(code: i32) -> ! {
    sys::exit(code)
}
