use crate::AsciiBuf;

/// Window size reported when the output is not an interactive console.
pub const FALLBACK_WINDOW_SIZE: (i32, i32) = (80, 25);

/// Capacity of the line buffer compiled programs hand to `read_line`.
pub const LINE_CAPACITY: usize = 256;

/// Erases the whole screen. The cursor is positioned separately.
pub const CLEAR_SCREEN: &[u8] = b"\x1b[2J";

/// Device status report request; the terminal answers with `ESC[row;colR`.
pub const CURSOR_REPORT_QUERY: &[u8] = b"\x1b[6n";

/// Splits `text` into the chunks that must be written to the console.
///
/// On an interactive console every bare line feed becomes `\r\n`; a line feed
/// already preceded by a carriage return is written through unchanged.
/// Non-interactive output is passed through verbatim.
pub fn normalize_newlines(text: &[u8], interactive: bool, mut emit: impl FnMut(&[u8])) {
    if !interactive {
        if !text.is_empty() {
            emit(text);
        }
        return;
    }

    let mut start = 0;
    for (i, &byte) in text.iter().enumerate() {
        if byte == b'\n' && (i == 0 || text[i - 1] != b'\r') {
            if i > start {
                emit(&text[start..i]);
            }
            emit(b"\r\n");
            start = i + 1;
        }
    }
    if start < text.len() {
        emit(&text[start..]);
    }
}

/// Clamps a window-relative position into `[0, width-1] x [0, height-1]`.
pub fn clamp_cursor(col: i32, row: i32, width: i32, height: i32) -> (i32, i32) {
    let max_col = (width - 1).max(0);
    let max_row = (height - 1).max(0);
    (col.clamp(0, max_col), row.clamp(0, max_row))
}

/// The escape sequence moving the cursor to a zero-based `(col, row)`.
pub fn cursor_escape(col: i32, row: i32) -> AsciiBuf<24> {
    let mut buf = AsciiBuf::new();
    buf.push_str("\x1b[");
    buf.push_u64(u64::from(row.max(0).unsigned_abs()) + 1, 1);
    buf.push(b';');
    buf.push_u64(u64::from(col.max(0).unsigned_abs()) + 1, 1);
    buf.push(b'H');
    buf
}

/// Decodes a cursor position report (`ESC[row;colR`, one-based) into a
/// zero-based `(col, row)`. Bytes before the escape are ignored.
pub fn parse_cursor_report(report: &[u8]) -> Option<(i32, i32)> {
    let start = report.windows(2).position(|w| w == b"\x1b[")? + 2;
    let mut rest = &report[start..];

    let row = take_number(&mut rest)?;
    rest = rest.strip_prefix(b";")?;
    let col = take_number(&mut rest)?;
    rest.strip_prefix(b"R")?;

    Some((col - 1, row - 1))
}

/// Drops a trailing `\n` or `\r\n`.
pub fn strip_line_terminator(line: &[u8]) -> &[u8] {
    let line = line.strip_suffix(b"\n").unwrap_or(line);
    line.strip_suffix(b"\r").unwrap_or(line)
}

/// Reads one line from a canonical-mode terminal into `buf`. `read` fills a
/// chunk and returns its length, `0` at end of input or a negative value on
/// failure; each call yields at most one line. A line longer than `buf` is
/// kept truncated and the rest of it is consumed. Returns the stored length
/// without the terminator.
pub fn read_terminal_line(buf: &mut [u8], mut read: impl FnMut(&mut [u8]) -> isize) -> usize {
    let len = match usize::try_from(read(buf)) {
        Ok(n) if n > 0 => n,
        _ => return 0,
    };
    if len == buf.len() && buf[len - 1] != b'\n' {
        let mut rest = [0; 64];
        while let Ok(n @ 1..) = usize::try_from(read(&mut rest)) {
            if rest[..n].contains(&b'\n') {
                break;
            }
        }
    }
    strip_line_terminator(&buf[..len]).len()
}

fn take_number(rest: &mut &[u8]) -> Option<i32> {
    let digits = rest.iter().take_while(|b| b.is_ascii_digit()).count();
    if digits == 0 || digits > 5 {
        return None;
    }
    let mut value = 0;
    for &b in &rest[..digits] {
        value = value * 10 + i32::from(b - b'0');
    }
    *rest = &rest[digits..];
    Some(value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn normalized(text: &str, interactive: bool) -> String {
        let mut out = Vec::new();
        normalize_newlines(text.as_bytes(), interactive, |chunk| {
            out.extend_from_slice(chunk);
        });
        String::from_utf8(out).unwrap()
    }

    #[test]
    fn test_newline_normalization() {
        assert_eq!(normalized("a\nb", true), "a\r\nb");
        assert_eq!(normalized("a\r\nb", true), "a\r\nb");
        assert_eq!(normalized("\n\n", true), "\r\n\r\n");
        assert_eq!(normalized("tail\n", true), "tail\r\n");
        assert_eq!(normalized("a\nb", false), "a\nb");
        assert_eq!(normalized("", true), "");
    }

    #[test]
    fn test_cursor_clamp() {
        assert_eq!(clamp_cursor(-5, 999, 80, 25), (0, 24));
        assert_eq!(clamp_cursor(10, 3, 80, 25), (10, 3));
        assert_eq!(clamp_cursor(80, 25, 80, 25), (79, 24));
        assert_eq!(clamp_cursor(5, 5, 0, 0), (0, 0));
    }

    #[test]
    fn test_cursor_escape() {
        assert_eq!(cursor_escape(0, 0).as_str(), "\x1b[1;1H");
        assert_eq!(cursor_escape(79, 24).as_str(), "\x1b[25;80H");
    }

    #[test]
    fn test_parse_cursor_report() {
        assert_eq!(parse_cursor_report(b"\x1b[12;40R"), Some((39, 11)));
        assert_eq!(parse_cursor_report(b"junk\x1b[1;1R"), Some((0, 0)));
        assert_eq!(parse_cursor_report(b"\x1b[12;40"), None);
        assert_eq!(parse_cursor_report(b"\x1b[;40R"), None);
        assert_eq!(parse_cursor_report(b""), None);
    }

    #[test]
    fn test_strip_line_terminator() {
        assert_eq!(strip_line_terminator(b"abc\r\n"), b"abc");
        assert_eq!(strip_line_terminator(b"abc\n"), b"abc");
        assert_eq!(strip_line_terminator(b"abc"), b"abc");
        assert_eq!(strip_line_terminator(b"\n"), b"");
    }

    /// Replays `chunks` the way a terminal hands out reads, recording what
    /// is left unread.
    fn terminal_line(capacity: usize, chunks: &[&str]) -> (String, usize) {
        let mut pending = chunks.iter();
        let mut buf = vec![0; capacity];
        let len = read_terminal_line(&mut buf, |out| {
            let Some(chunk) = pending.next() else {
                return 0;
            };
            let n = chunk.len().min(out.len());
            out[..n].copy_from_slice(&chunk.as_bytes()[..n]);
            assert_eq!(n, chunk.len(), "chunk larger than the read");
            isize::try_from(n).unwrap()
        });
        (String::from_utf8(buf[..len].to_vec()).unwrap(), pending.len())
    }

    #[test]
    fn test_read_terminal_line() {
        assert_eq!(terminal_line(8, &["abc\n", "next\n"]), ("abc".to_owned(), 1));
        assert_eq!(terminal_line(8, &["abc\r\n"]), ("abc".to_owned(), 0));
        assert_eq!(terminal_line(8, &[]), (String::new(), 0));
        assert_eq!(terminal_line(4, &["abc\n", "next\n"]), ("abc".to_owned(), 1));
    }

    #[test]
    fn test_overlong_terminal_line_is_consumed() {
        // The first read fills the buffer; the rest of the line follows.
        let chunks = ["abcd", "efgh\n", "next\n"];
        assert_eq!(terminal_line(4, &chunks), ("abcd".to_owned(), 1));

        let chunks = ["abcd", "\n", "next\n"];
        assert_eq!(terminal_line(4, &chunks), ("abcd".to_owned(), 1));

        let chunks = ["abcd", "efgh"];
        assert_eq!(terminal_line(4, &chunks), ("abcd".to_owned(), 0));
    }

    #[test]
    fn test_terminal_read_failure() {
        let mut buf = [0; 4];
        assert_eq!(read_terminal_line(&mut buf, |_| -1), 0);
    }
}
