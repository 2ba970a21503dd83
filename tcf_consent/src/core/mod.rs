use crate::core::base64::Base64Reader;
use bitstream_io::{BigEndian, BitRead, BitReader};
use std::collections::BTreeSet;
use std::io;
use std::io::Read;
use std::iter::repeat_with;

pub mod base64;

/// A publisher restriction entry: a purpose, a restriction type and the vendors it targets.
#[derive(Debug, Eq, PartialEq)]
pub struct Range {
    pub key: u8,
    pub range_type: u8,
    pub ids: BTreeSet<u16>,
}

/// Readers for the composite field types found in a TC string.
pub trait DataRead {
    fn read_string(&mut self, chars: usize) -> io::Result<String>;

    fn read_datetime_as_unix_timestamp(&mut self) -> io::Result<u64>;

    fn read_fixed_bitfield(&mut self, bits: u16) -> io::Result<BTreeSet<u16>>;

    fn read_range_section(&mut self) -> io::Result<BTreeSet<u16>>;

    fn read_vendor_section(&mut self) -> io::Result<BTreeSet<u16>>;

    fn read_array_of_ranges(&mut self) -> io::Result<Vec<Range>>;
}

impl<T> DataRead for T
where
    T: BitRead,
{
    fn read_string(&mut self, chars: usize) -> io::Result<String> {
        repeat_with(|| self.read_unsigned::<6, u8>())
            .take(chars)
            .map(|r| r.map(|n| (n + b'A') as char))
            .collect::<Result<String, _>>()
    }

    fn read_datetime_as_unix_timestamp(&mut self) -> io::Result<u64> {
        Ok(self.read_unsigned::<36, u64>()? / 10) // deciseconds
    }

    fn read_fixed_bitfield(&mut self, bits: u16) -> io::Result<BTreeSet<u16>> {
        let mut result = BTreeSet::new();
        for i in 1..=bits {
            if self.read_bit()? {
                result.insert(i);
            }
        }

        Ok(result)
    }

    fn read_range_section(&mut self) -> io::Result<BTreeSet<u16>> {
        let n = self.read_unsigned::<12, u16>()?;
        let mut ids = BTreeSet::new();

        for _ in 0..n {
            let is_range = self.read_bit()?;
            let start = self.read_unsigned::<16, u16>()?;
            if is_range {
                let end = self.read_unsigned::<16, u16>()?;
                ids.extend(start..=end);
            } else {
                ids.insert(start);
            }
        }

        Ok(ids)
    }

    fn read_vendor_section(&mut self) -> io::Result<BTreeSet<u16>> {
        let max_vendor_id = self.read_unsigned::<16, u16>()?;
        if self.read_bit()? {
            self.read_range_section()
        } else {
            self.read_fixed_bitfield(max_vendor_id)
        }
    }

    fn read_array_of_ranges(&mut self) -> io::Result<Vec<Range>> {
        let n = self.read_unsigned::<12, u16>()? as usize;
        repeat_with(|| {
            Ok(Range {
                key: self.read_unsigned::<6, u8>()?,
                range_type: self.read_unsigned::<2, u8>()?,
                ids: self.read_range_section()?,
            })
        })
        .take(n)
        .collect()
    }
}

pub(crate) fn base64_bit_reader<R: Read>(r: R) -> BitReader<impl Read, BigEndian> {
    BitReader::endian(Base64Reader::new(r), BigEndian)
}
