use crate::utils::traits::SafeAccess;
use std::io::{Error, ErrorKind};

/// Big-endian cursor over an in-memory byte stream.
///
/// Every read is bounds checked; running off the end yields an
/// `UnexpectedEof` error instead of a panic.
#[derive(Debug, Clone)]
pub struct ByteReader<'a> {
    data: &'a [u8],
    position: usize,
}

impl<'a> ByteReader<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        ByteReader { data, position: 0 }
    }

    /// Reads a single byte from the stream.
    ///
    /// # Returns
    /// - The byte read
    /// - `std::io::Error` if the stream is exhausted
    pub fn read_u8(&mut self) -> Result<u8, Error> {
        let byte = *self.data.get(self.position).ok_or_else(|| eof(self.position, 1))?;
        self.position += 1;

        Ok(byte)
    }

    /// Reads a big-endian 16-bit value.
    pub fn read_u16(&mut self) -> Result<u16, Error> {
        let bytes = self.read_array::<2>()?;

        Ok(u16::from_be_bytes(bytes))
    }

    /// Reads a big-endian 32-bit value.
    pub fn read_u32(&mut self) -> Result<u32, Error> {
        let bytes = self.read_array::<4>()?;

        Ok(u32::from_be_bytes(bytes))
    }

    /// Reads exactly `N` bytes into an array.
    pub fn read_array<const N: usize>(&mut self) -> Result<[u8; N], Error> {
        let mut out = [0u8; N];
        out.copy_from_slice(self.read_bytes(N)?);

        Ok(out)
    }

    /// Borrows the next `n` bytes from the stream without copying them.
    ///
    /// # Parameters
    /// - `n`: The number of bytes to take
    ///
    /// # Returns
    /// - A slice of the underlying data
    /// - `std::io::Error` if fewer than `n` bytes are left
    pub fn read_bytes(&mut self, n: usize) -> Result<&'a [u8], Error> {
        let end = self.position.checked_add(n).ok_or_else(|| eof(self.position, n))?;
        let bytes = self.data.get_range_safe(self.position..end)?;
        self.position = end;

        Ok(bytes)
    }

    /// Reads bytes up to (not including) the next NUL byte and consumes the NUL.
    pub fn read_null_terminated(&mut self) -> Result<&'a [u8], Error> {
        let rest = &self.data[self.position..];
        let len = rest.iter().position(|&b| b == 0).ok_or_else(|| {
            Error::new(ErrorKind::InvalidData, "Missing NUL separator")
        })?;

        let bytes = self.read_bytes(len)?;
        self.position += 1;

        Ok(bytes)
    }

    /// Takes everything left in the stream.
    pub fn read_to_end(&mut self) -> &'a [u8] {
        let rest = &self.data[self.position..];
        self.position = self.data.len();

        rest
    }

    pub fn skip(&mut self, n: usize) -> Result<(), Error> {
        self.read_bytes(n).map(|_| ())
    }

    pub fn bytes_left(&self) -> usize {
        self.data.len() - self.position
    }

    pub fn has_remaining(&self) -> bool {
        self.position < self.data.len()
    }

    pub fn position(&self) -> usize {
        self.position
    }
}

fn eof(position: usize, wanted: usize) -> Error {
    Error::new(
        ErrorKind::UnexpectedEof,
        format!("Wanted {} bytes at offset {}, stream ended", wanted, position),
    )
}

#[cfg(test)]
mod tests {
    use super::ByteReader;

    #[test]
    fn reads_big_endian_values() {
        let data = [0x12, 0x34, 0x00, 0x00, 0x01, 0x00, 0xFF];
        let mut reader = ByteReader::new(&data);

        assert_eq!(reader.read_u16().unwrap(), 0x1234);
        assert_eq!(reader.read_u32().unwrap(), 256);
        assert_eq!(reader.read_u8().unwrap(), 0xFF);
        assert!(!reader.has_remaining());
        assert!(reader.read_u8().is_err());
    }

    #[test]
    fn reads_null_terminated_strings() {
        let data = b"Title\0Hello";
        let mut reader = ByteReader::new(data);

        assert_eq!(reader.read_null_terminated().unwrap(), b"Title");
        assert_eq!(reader.read_to_end(), b"Hello");
        assert_eq!(reader.bytes_left(), 0);
    }

    #[test]
    fn short_read_does_not_advance() {
        let data = [1u8, 2, 3];
        let mut reader = ByteReader::new(&data);

        assert!(reader.read_u32().is_err());
        assert_eq!(reader.position(), 0);
        assert_eq!(reader.read_bytes(3).unwrap(), &[1, 2, 3]);
    }
}
