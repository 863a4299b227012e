//! Buffered Input
//!
//! Reads XML from any source implementing Read into an owned buffer. The
//! whole document is needed before decoding, since encoding detection looks at
//! the first bytes and the tree borrows nothing from the source.

use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

/// Buffer size for reading chunks
const DEFAULT_BUFFER_SIZE: usize = 8192;

/// Read entire XML document from a Read source
pub fn read_all<R: Read>(reader: R) -> std::io::Result<Vec<u8>> {
    let mut reader = BufReader::with_capacity(DEFAULT_BUFFER_SIZE, reader);
    let mut buffer = Vec::new();
    reader.read_to_end(&mut buffer)?;
    Ok(buffer)
}

/// Read a file; the handle is closed before this returns, on every path
pub fn read_path(path: &Path) -> std::io::Result<Vec<u8>> {
    let file = File::open(path)?;
    let len = file.metadata().map(|m| m.len() as usize).unwrap_or(0);

    let mut buffer = Vec::with_capacity(len);
    BufReader::with_capacity(DEFAULT_BUFFER_SIZE, file).read_to_end(&mut buffer)?;
    Ok(buffer)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{Cursor, Write};

    #[test]
    fn test_read_all() {
        let data = b"<root>content</root>";
        let result = read_all(Cursor::new(data.to_vec())).unwrap();
        assert_eq!(result, data);
    }

    #[test]
    fn test_read_all_larger_than_buffer() {
        let data = vec![b'x'; DEFAULT_BUFFER_SIZE * 3 + 7];
        assert_eq!(read_all(data.as_slice()).unwrap().len(), data.len());
    }

    #[test]
    fn test_read_path() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(b"<a/>").unwrap();
        assert_eq!(read_path(file.path()).unwrap(), b"<a/>");
    }

    #[test]
    fn test_read_missing_path() {
        let dir = tempfile::tempdir().unwrap();
        assert!(read_path(&dir.path().join("missing.xml")).is_err());
    }
}
