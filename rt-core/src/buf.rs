/// A fixed-capacity ASCII buffer. Pushes past the capacity are dropped.
#[derive(Clone, Copy)]
pub struct AsciiBuf<const N: usize> {
    bytes: [u8; N],
    len: usize,
}

impl<const N: usize> AsciiBuf<N> {
    pub const fn new() -> Self {
        AsciiBuf {
            bytes: [0; N],
            len: 0,
        }
    }

    pub fn push(&mut self, byte: u8) {
        if self.len < N {
            self.bytes[self.len] = byte;
            self.len += 1;
        }
    }

    pub fn push_str(&mut self, s: &str) {
        for &byte in s.as_bytes() {
            self.push(byte);
        }
    }

    /// Pushes the decimal digits of `value`, left padded with zeros up to
    /// `min_digits`.
    pub fn push_u64(&mut self, mut value: u64, min_digits: usize) {
        let mut digits = [0u8; 20];
        let mut count = 0;
        while value > 0 || count < min_digits.max(1) {
            digits[count] = b'0' + (value % 10) as u8;
            value /= 10;
            count += 1;
        }
        while count > 0 {
            count -= 1;
            self.push(digits[count]);
        }
    }

    /// Removes trailing occurrences of `byte`.
    pub fn trim_end(&mut self, byte: u8) {
        while self.len > 0 && self.bytes[self.len - 1] == byte {
            self.len -= 1;
        }
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes[..self.len]
    }

    pub fn as_str(&self) -> &str {
        core::str::from_utf8(self.as_bytes()).unwrap_or_default()
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }
}

impl<const N: usize> Default for AsciiBuf<N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<const N: usize> core::fmt::Debug for AsciiBuf<N> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{:?}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_push_u64_padding() {
        let mut buf = AsciiBuf::<16>::new();
        buf.push_u64(42, 4);
        buf.push(b'|');
        buf.push_u64(0, 0);
        assert_eq!(buf.as_str(), "0042|0");
    }

    #[test]
    fn test_overflow_is_dropped() {
        let mut buf = AsciiBuf::<3>::new();
        buf.push_str("abcdef");
        assert_eq!(buf.as_str(), "abc");
    }
}
