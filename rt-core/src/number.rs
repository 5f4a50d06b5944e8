use crate::AsciiBuf;

/// Number of fractional digits kept when printing a non-integral value.
pub const FRACTION_DIGITS: usize = 4;

const FRACTION_SCALE: u64 = 10_000;

/// Magnitudes at or above this print in mantissa/exponent form.
const EXPONENT_THRESHOLD: f64 = 1e18;

/// Digits past this mantissa no longer add precision to an `f64`.
const MANTISSA_LIMIT: u64 = 100_000_000_000_000_000;

/// Values at or above 2^52 are always integral.
const INTEGRAL_THRESHOLD: f64 = 4_503_599_627_370_496.0;

pub type NumberText = AsciiBuf<32>;

/// Parses an optionally signed, optionally fractional decimal number.
///
/// Leading whitespace is skipped and parsing stops at the first byte that
/// cannot extend the number. Returns `0` when no digit was consumed.
pub fn parse_number(text: &[u8]) -> f64 {
    let mut i = 0;
    while i < text.len() && matches!(text[i], b' ' | b'\t' | b'\r' | b'\n') {
        i += 1;
    }

    let mut negative = false;
    if let Some(&sign @ (b'+' | b'-')) = text.get(i) {
        negative = sign == b'-';
        i += 1;
    }

    let mut mantissa: u64 = 0;
    let mut exponent: i32 = 0;
    let mut digits = 0;
    let mut seen_point = false;
    while let Some(&c) = text.get(i) {
        match c {
            b'0'..=b'9' => {
                digits += 1;
                if mantissa < MANTISSA_LIMIT {
                    mantissa = mantissa * 10 + u64::from(c - b'0');
                    if seen_point {
                        exponent -= 1;
                    }
                } else if !seen_point {
                    exponent += 1;
                }
            }
            b'.' if !seen_point => seen_point = true,
            _ => break,
        }
        i += 1;
    }

    if digits == 0 {
        return 0.0;
    }

    let magnitude = if exponent < 0 {
        mantissa as f64 / pow10(exponent.unsigned_abs())
    } else {
        mantissa as f64 * pow10(exponent.unsigned_abs())
    };
    if negative {
        -magnitude
    } else {
        magnitude
    }
}

/// Formats a number for display.
///
/// Integral values print without a fractional part. Other values are rounded
/// half-up to [`FRACTION_DIGITS`] digits, with trailing zeros (and a bare
/// trailing point) trimmed. Magnitudes of 1e18 and above, integral or not,
/// print as a mantissa formatted the same way followed by `E+` and an
/// exponent of at least two digits, so `1e18` gives `1E+18`.
pub fn format_number(value: f64) -> NumberText {
    let mut out = NumberText::new();
    if value.is_nan() {
        out.push_str("NaN");
        return out;
    }

    let negative = value < 0.0;
    let magnitude = if negative { -value } else { value };

    if magnitude == f64::INFINITY {
        out.push_str(if negative { "-inf" } else { "inf" });
        return out;
    }

    if magnitude >= EXPONENT_THRESHOLD {
        let mut mantissa = magnitude;
        let mut exponent = 0;
        while mantissa >= 10.0 {
            mantissa /= 10.0;
            exponent += 1;
        }
        let (mut whole, mut fraction) = split_rounded(mantissa);
        if whole >= 10 {
            whole = 1;
            fraction = 0;
            exponent += 1;
        }
        if negative {
            out.push(b'-');
        }
        push_fixed(&mut out, whole, fraction);
        out.push_str("E+");
        out.push_u64(exponent, 2);
        return out;
    }

    let (whole, fraction) = split_rounded(magnitude);
    if whole == 0 && fraction == 0 {
        out.push(b'0');
        return out;
    }
    if negative {
        out.push(b'-');
    }
    push_fixed(&mut out, whole, fraction);
    out
}

/// Largest integral value not greater than `value`.
///
/// Implemented with integer conversions only, since freestanding code has no
/// `floor` to call.
pub fn floor(value: f64) -> f64 {
    let magnitude = if value < 0.0 { -value } else { value };
    if !(magnitude < INTEGRAL_THRESHOLD) {
        return value;
    }
    let truncated = value as i64 as f64;
    if truncated > value {
        truncated - 1.0
    } else {
        truncated
    }
}

/// Splits a non-negative magnitude below 1e18 into its whole part and its
/// fraction scaled by [`FRACTION_SCALE`], rounding half-up.
fn split_rounded(magnitude: f64) -> (u64, u64) {
    let mut whole = magnitude as u64;
    let fraction = magnitude - whole as f64;
    let mut scaled = (fraction * FRACTION_SCALE as f64 + 0.5) as u64;
    if scaled >= FRACTION_SCALE {
        whole += 1;
        scaled -= FRACTION_SCALE;
    }
    (whole, scaled)
}

fn push_fixed(out: &mut NumberText, whole: u64, fraction: u64) {
    out.push_u64(whole, 1);
    if fraction != 0 {
        out.push(b'.');
        out.push_u64(fraction, FRACTION_DIGITS);
        out.trim_end(b'0');
    }
}

fn pow10(n: u32) -> f64 {
    let mut result = 1.0;
    for _ in 0..n {
        result *= 10.0;
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn show(value: f64) -> String {
        format_number(value).as_str().to_string()
    }

    #[test]
    fn test_tolerant_parsing() {
        assert_eq!(parse_number(b" -3"), -3.0);
        assert_eq!(parse_number(b".5"), 0.5);
        assert_eq!(parse_number(b"abc"), 0.0);
        assert_eq!(parse_number(b"12x"), 12.0);
        assert_eq!(parse_number(b"+7.25 apples"), 7.25);
        assert_eq!(parse_number(b"1.2.3"), 1.2);
        assert_eq!(parse_number(b"-"), 0.0);
        assert_eq!(parse_number(b""), 0.0);
        assert_eq!(parse_number(b"\t 42\r\n"), 42.0);
    }

    #[test]
    fn test_parse_long_mantissa() {
        assert_eq!(parse_number(b"123456789012345678901"), 1.234_567_890_123_456_8e20);
        assert_eq!(parse_number(b"0.5e3"), 0.5);
    }

    #[test]
    fn test_format_integral() {
        assert_eq!(show(0.0), "0");
        assert_eq!(show(-0.0), "0");
        assert_eq!(show(7.0), "7");
        assert_eq!(show(-12.0), "-12");
        assert_eq!(show(1_000_000.0), "1000000");
    }

    #[test]
    fn test_format_fractional() {
        assert_eq!(show(1.5), "1.5");
        assert_eq!(show(-0.25), "-0.25");
        assert_eq!(show(3.14159), "3.1416");
        assert_eq!(show(2.99999), "3");
        assert_eq!(show(0.00004), "0");
        assert_eq!(show(-0.00004), "0");
        assert_eq!(show(0.00005), "0.0001");
        assert_eq!(show(10.0 / 3.0), "3.3333");
    }

    #[test]
    fn test_format_special() {
        assert_eq!(show(f64::NAN), "NaN");
        assert_eq!(show(f64::INFINITY), "inf");
        assert_eq!(show(f64::NEG_INFINITY), "-inf");
        assert_eq!(show(1e18), "1E+18");
        assert_eq!(show(-2.5e20), "-2.5E+20");
    }

    #[test]
    fn test_round_trip() {
        let cases = [
            ("0", "0"),
            ("42", "42"),
            ("-42", "-42"),
            ("1.5", "1.5"),
            ("1.50", "1.5"),
            ("0.0001", "0.0001"),
            ("12.3456", "12.3456"),
            ("-0.125", "-0.125"),
            ("100.1000", "100.1"),
            ("007", "7"),
            ("3.0000", "3"),
            ("999.9999", "999.9999"),
        ];
        for (input, expected) in cases {
            assert_eq!(show(parse_number(input.as_bytes())), expected, "{input}");
        }
    }

    #[test]
    fn test_floor() {
        assert_eq!(floor(2.7), 2.0);
        assert_eq!(floor(-2.2), -3.0);
        assert_eq!(floor(-3.0), -3.0);
        assert_eq!(floor(0.5), 0.0);
        assert_eq!(floor(1e300), 1e300);
        assert!(floor(f64::NAN).is_nan());
    }
}
