//! Byte-cursor parsing of `<key>;<value>` lines straight out of the mapped
//! file. No allocation, no validation: the input format is trusted, and
//! malformed records are undefined behavior by contract.

/// Separates the key from the value on every line.
pub const DELIMITER: u8 = b';';

// Odd multiplier mixed into the key hash, one byte at a time.
const HASH_MULTIPLIER: u32 = 82805;

/// Scan position over a line-aligned byte range. The offset is explicit so
/// the parser has no hidden state and each step can be tested in isolation.
pub struct Cursor<'a> {
    buf: &'a [u8],
    pos: usize,
}

impl<'a> Cursor<'a> {
    pub fn new(buf: &'a [u8]) -> Self {
        Cursor { buf, pos: 0 }
    }

    pub fn is_done(&self) -> bool {
        self.pos >= self.buf.len()
    }

    /// Reads the key up to (not including) the delimiter, hashing it on the
    /// fly, and leaves the cursor just past the delimiter. Returns the hash
    /// and the key's extent for equality checks against map slots.
    ///
    /// Bytes are consumed in little-endian 4-byte groups; the tail (and any
    /// key shorter than 4 bytes) falls back to single bytes.
    pub fn read_key(&mut self) -> (u32, &'a [u8]) {
        let buf = self.buf;
        let start = self.pos;
        let mut pos = self.pos;
        let mut hash = 0u32;

        'outer: loop {
            if buf.len() - pos >= 4 {
                let word =
                    u32::from_le_bytes([buf[pos], buf[pos + 1], buf[pos + 2], buf[pos + 3]]);
                for shift in [0, 8, 16, 24] {
                    let b = (word >> shift) & 0xff;
                    if b == DELIMITER as u32 {
                        break 'outer;
                    }
                    hash ^= b * HASH_MULTIPLIER;
                    pos += 1;
                }
            } else {
                if buf[pos] == DELIMITER {
                    break;
                }
                hash ^= buf[pos] as u32 * HASH_MULTIPLIER;
                pos += 1;
            }
        }

        self.pos = pos + 1;
        (hash, &buf[start..pos])
    }

    /// Reads one `-?\d+\.\d` value as a tenths-scaled integer and consumes
    /// the line terminator (a lone `\n`, a `\r\n` pair, or end of buffer on
    /// an unterminated final line).
    pub fn read_value(&mut self) -> i64 {
        let buf = self.buf;
        let mut pos = self.pos;

        let negative = buf[pos] == b'-';
        if negative {
            pos += 1;
        }

        let mut value = 0i64;
        while buf[pos] != b'.' {
            value = value * 10 + (buf[pos] - b'0') as i64;
            pos += 1;
        }
        pos += 1;
        value = value * 10 + (buf[pos] - b'0') as i64;
        pos += 1;

        if pos < buf.len() && buf[pos] == b'\r' {
            pos += 1;
        }
        if pos < buf.len() && buf[pos] == b'\n' {
            pos += 1;
        }

        self.pos = pos;
        if negative {
            -value
        } else {
            value
        }
    }
}
