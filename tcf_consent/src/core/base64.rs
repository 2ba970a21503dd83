use std::io;
use std::io::Read;
use thiserror::Error;

/// The error type that describes failures to decode Base64 encoded strings.
#[derive(Error, Debug)]
pub enum DecodeError {
    /// An invalid byte was found in the input. The offset and offending byte are provided.
    #[error("invalid byte {1} at offset {0}")]
    InvalidByte(usize, u8),
}

/// The two 64 character dictionaries found in TCF data.
///
/// Bit fields of a TC string are always encoded with the URL-safe dictionary. The legacy
/// creation timestamp reader works on the standard one, where `+` and `/` replace `-` and `_`.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Alphabet {
    UrlSafe,
    Standard,
}

impl Alphabet {
    /// Returns the 6-bit value of a character, or [`None`] if it is not part of the dictionary.
    pub fn value(self, b: u8) -> Option<u8> {
        match (self, b) {
            (_, b'A'..=b'Z') => Some(b - b'A'),
            (_, b'a'..=b'z') => Some(b - b'a' + 26),
            (_, b'0'..=b'9') => Some(b - b'0' + 52),
            (Self::UrlSafe, b'-') | (Self::Standard, b'+') => Some(62),
            (Self::UrlSafe, b'_') | (Self::Standard, b'/') => Some(63),
            _ => None,
        }
    }
}

/// A reader turning URL-safe, unpadded Base64 text into raw bytes.
///
/// Every input character contributes 6 bits. Trailing bits which do not fill a whole byte
/// are emitted as a final byte padded with zeroes.
pub struct Base64Reader<R> {
    inner: R,
    offset: usize,
    bits: u32,
    bit_count: u32,
    exhausted: bool,
}

impl<R> Base64Reader<R>
where
    R: Read,
{
    pub fn new(r: R) -> Self {
        Self {
            inner: r,
            offset: 0,
            bits: 0,
            bit_count: 0,
            exhausted: false,
        }
    }

    fn fill(&mut self) -> io::Result<()> {
        let mut byte = [0];
        while self.bit_count < 8 && !self.exhausted {
            if self.inner.read(&mut byte)? == 0 {
                self.exhausted = true;
                break;
            }

            let value = Alphabet::UrlSafe.value(byte[0]).ok_or_else(|| {
                io::Error::new(
                    io::ErrorKind::InvalidData,
                    DecodeError::InvalidByte(self.offset, byte[0]),
                )
            })?;
            self.offset += 1;
            self.bits = (self.bits << 6) | u32::from(value);
            self.bit_count += 6;
        }

        Ok(())
    }
}

impl<R> Read for Base64Reader<R>
where
    R: Read,
{
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let mut written = 0;

        for out in buf.iter_mut() {
            self.fill()?;

            if self.bit_count >= 8 {
                self.bit_count -= 8;
                *out = (self.bits >> self.bit_count) as u8;
                self.bits &= (1 << self.bit_count) - 1;
            } else if self.bit_count > 0 {
                // end of input, left align what remains
                *out = (self.bits << (8 - self.bit_count)) as u8;
                self.bits = 0;
                self.bit_count = 0;
            } else {
                break;
            }
            written += 1;
        }

        Ok(written)
    }
}
