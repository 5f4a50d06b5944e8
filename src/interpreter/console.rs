use std::{
    collections::VecDeque,
    io::{self, BufRead, Write},
};

use crossterm::{cursor, queue, terminal, tty::IsTty};
use rt_core::{clamp_cursor, normalize_newlines, strip_line_terminator, LINE_CAPACITY};
use tracing::warn;

/// The console operations a program may perform, mirroring the runtime
/// library that compiled programs link against.
///
/// Positions are zero-based `(col, row)` pairs relative to the window.
pub trait Console {
    /// Prepares the console. Called once, before the first statement runs.
    fn init(&mut self) -> io::Result<()>;

    fn print(&mut self, text: &[u8]) -> io::Result<()>;

    /// Reads one line without its terminator. Returns an empty line if the
    /// input could not be read.
    fn read_line(&mut self) -> String;

    fn window_size(&mut self) -> (i32, i32);

    /// Moves the cursor, clamped into the window. Does nothing if the console
    /// is not interactive.
    fn move_cursor_to(&mut self, col: i32, row: i32) -> io::Result<()>;

    /// Returns `(0, 0)` if the position can't be queried.
    fn cursor_pos(&mut self) -> (i32, i32);
}

/// The process' own terminal (or whatever stdin and stdout are redirected
/// to).
pub struct TerminalConsole {
    stdout: io::Stdout,
    stdin: io::Stdin,
    interactive: bool,
}

impl TerminalConsole {
    pub fn new() -> TerminalConsole {
        TerminalConsole {
            stdout: io::stdout(),
            stdin: io::stdin(),
            interactive: false,
        }
    }
}

impl Default for TerminalConsole {
    fn default() -> Self {
        Self::new()
    }
}

impl Console for TerminalConsole {
    fn init(&mut self) -> io::Result<()> {
        self.interactive = self.stdout.is_tty();
        Ok(())
    }

    fn print(&mut self, text: &[u8]) -> io::Result<()> {
        let mut result = Ok(());
        let out = &mut self.stdout;
        normalize_newlines(text, self.interactive, |chunk| {
            if result.is_ok() {
                result = out.write_all(chunk);
            }
        });
        result?;
        self.stdout.flush()
    }

    fn read_line(&mut self) -> String {
        let mut line = Vec::with_capacity(LINE_CAPACITY);
        if let Err(error) = self.stdin.lock().read_until(b'\n', &mut line) {
            warn!(%error, "failed to read from stdin");
            return String::new();
        }
        let line = strip_line_terminator(&line);
        let line = &line[..line.len().min(LINE_CAPACITY)];
        String::from_utf8_lossy(line).into_owned()
    }

    fn window_size(&mut self) -> (i32, i32) {
        if !self.interactive {
            return rt_core::FALLBACK_WINDOW_SIZE;
        }
        match terminal::size() {
            Ok((cols, rows)) if cols > 0 && rows > 0 => (i32::from(cols), i32::from(rows)),
            _ => rt_core::FALLBACK_WINDOW_SIZE,
        }
    }

    fn move_cursor_to(&mut self, col: i32, row: i32) -> io::Result<()> {
        if !self.interactive {
            return Ok(());
        }
        let (width, height) = self.window_size();
        let (col, row) = clamp_cursor(col, row, width, height);
        queue!(self.stdout, cursor::MoveTo(col as u16, row as u16))?;
        self.stdout.flush()
    }

    fn cursor_pos(&mut self) -> (i32, i32) {
        if !self.interactive {
            return (0, 0);
        }
        cursor::position().map_or((0, 0), |(col, row)| (i32::from(col), i32::from(row)))
    }
}

/// An in-memory console. Input lines are queued up front; output is
/// collected for inspection.
///
/// When marked interactive it behaves like a terminal of the given size:
/// newlines are normalized and cursor moves are recorded and echoed as
/// escape sequences.
#[derive(Debug)]
pub struct CapturedConsole {
    output: Vec<u8>,
    input: VecDeque<String>,
    interactive: bool,
    size: (i32, i32),
    cursor: (i32, i32),
    initialized: bool,
}

impl CapturedConsole {
    pub fn new(input: &str) -> CapturedConsole {
        CapturedConsole {
            output: Vec::new(),
            input: input.lines().map(str::to_owned).collect(),
            interactive: false,
            size: rt_core::FALLBACK_WINDOW_SIZE,
            cursor: (0, 0),
            initialized: false,
        }
    }

    pub fn interactive(mut self, width: i32, height: i32) -> CapturedConsole {
        self.interactive = true;
        self.size = (width, height);
        self
    }

    pub fn output(&self) -> &[u8] {
        &self.output
    }

    pub fn output_string(&self) -> String {
        String::from_utf8_lossy(&self.output).into_owned()
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized
    }
}

impl Console for CapturedConsole {
    fn init(&mut self) -> io::Result<()> {
        self.initialized = true;
        Ok(())
    }

    fn print(&mut self, text: &[u8]) -> io::Result<()> {
        let output = &mut self.output;
        normalize_newlines(text, self.interactive, |chunk| output.extend_from_slice(chunk));
        Ok(())
    }

    fn read_line(&mut self) -> String {
        let mut line = self.input.pop_front().unwrap_or_default();
        if line.len() > LINE_CAPACITY {
            let mut end = LINE_CAPACITY;
            while !line.is_char_boundary(end) {
                end -= 1;
            }
            line.truncate(end);
        }
        line
    }

    fn window_size(&mut self) -> (i32, i32) {
        self.size
    }

    fn move_cursor_to(&mut self, col: i32, row: i32) -> io::Result<()> {
        if !self.interactive {
            return Ok(());
        }
        let (width, height) = self.size;
        self.cursor = clamp_cursor(col, row, width, height);
        self.output
            .extend_from_slice(rt_core::cursor_escape(self.cursor.0, self.cursor.1).as_bytes());
        Ok(())
    }

    fn cursor_pos(&mut self) -> (i32, i32) {
        if self.interactive {
            self.cursor
        } else {
            (0, 0)
        }
    }
}
