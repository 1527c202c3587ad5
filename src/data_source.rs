//! In-memory data source backing a parsed document.

use bytes::Bytes;

use crate::error::{Error, Result};

/// Byte buffer with a read cursor.
#[derive(Debug, Clone)]
pub struct DataSource {
    data: Bytes,
    offset: usize,
}

impl DataSource {
    /// Wrap `data`. Empty input is rejected.
    pub fn new(data: impl Into<Bytes>) -> Result<Self> {
        let data = data.into();
        if data.is_empty() {
            return Err(Error::InvalidArgument("data source is empty".to_string()));
        }
        Ok(Self { data, offset: 0 })
    }

    /// Total size in bytes.
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Always false: empty sources cannot be built.
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Current read position.
    pub fn offset(&self) -> usize {
        self.offset
    }

    /// Move the read position.
    pub fn move_to(&mut self, offset: usize) -> Result<()> {
        if offset > self.data.len() {
            return Err(Error::InvalidArgument(format!(
                "offset {} is beyond the end of the data ({} bytes)",
                offset,
                self.data.len()
            )));
        }
        self.offset = offset;
        Ok(())
    }

    /// Read `count` bytes and advance.
    pub fn read_bytes(&mut self, count: usize) -> Result<Bytes> {
        let end = self
            .offset
            .checked_add(count)
            .filter(|&end| end <= self.data.len())
            .ok_or(Error::UnexpectedEof)?;
        let bytes = self.data.slice(self.offset..end);
        self.offset = end;
        Ok(bytes)
    }

    /// The whole buffer, regardless of the read position.
    pub fn read_all(&self) -> Bytes {
        self.data.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_source_rejected() {
        assert!(matches!(DataSource::new(Vec::new()), Err(Error::InvalidArgument(_))));
    }

    #[test]
    fn test_read_bytes_advances() {
        let mut source = DataSource::new(&b"%PDF-1.4\n"[..]).unwrap();
        assert_eq!(source.len(), 9);
        assert_eq!(&source.read_bytes(4).unwrap()[..], b"%PDF");
        assert_eq!(source.offset(), 4);
        assert_eq!(&source.read_bytes(5).unwrap()[..], b"-1.4\n");
    }

    #[test]
    fn test_read_past_end() {
        let mut source = DataSource::new(&b"abc"[..]).unwrap();
        source.move_to(2).unwrap();
        assert!(matches!(source.read_bytes(2), Err(Error::UnexpectedEof)));
        assert_eq!(source.offset(), 2);
    }

    #[test]
    fn test_move_to_bounds() {
        let mut source = DataSource::new(&b"abc"[..]).unwrap();
        assert!(source.move_to(3).is_ok());
        assert!(matches!(source.move_to(4), Err(Error::InvalidArgument(_))));
    }

    #[test]
    fn test_read_all_ignores_cursor() {
        let mut source = DataSource::new(&b"abc"[..]).unwrap();
        source.read_bytes(1).unwrap();
        assert_eq!(&source.read_all()[..], b"abc");
    }
}
