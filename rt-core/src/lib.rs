//! Host-independent pieces of the BASIC runtime.
//!
//! Everything here is shared between the tree-walking interpreter (which links
//! it normally) and the freestanding runtime archive (which links it into
//! `no_std` code), so both execution modes parse, format and emit console
//! bytes identically.
#![cfg_attr(not(test), no_std)]

/// Number parsing and formatting.
pub mod number;

/// Console byte sequences: newline normalization and cursor control.
pub mod console;

mod buf;

pub use buf::AsciiBuf;
pub use console::{
    clamp_cursor, cursor_escape, normalize_newlines, parse_cursor_report, read_terminal_line,
    strip_line_terminator, CLEAR_SCREEN, CURSOR_REPORT_QUERY, FALLBACK_WINDOW_SIZE, LINE_CAPACITY,
};
pub use number::{floor, format_number, parse_number, NumberText};
