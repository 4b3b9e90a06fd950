//! Block I/O (C1): read, write, and append fixed-size blocks in one file.
use crate::errors::Error;
use std::fs::File;
use std::io::{Read, Seek, SeekFrom, Write};

/// Size of a block, in bytes. Block 0 holds the file header; every other
/// block holds exactly one B-tree node.
pub const BLOCK_SIZE: usize = 512;

/// A file accessed one 512-byte block at a time.
///
/// Every read or write seeks first, so callers may freely interleave reads
/// and writes to different offsets; no block-level cache is kept between
/// calls.
pub struct BlockDevice {
    file: File,
}

impl BlockDevice {
    pub fn new(file: File) -> Self {
        BlockDevice { file }
    }

    /// Read exactly one block at `offset`. A short read (past end of file)
    /// surfaces as an `IOFailure`.
    pub fn read_block(&mut self, offset: u64) -> Result<[u8; BLOCK_SIZE], Error> {
        self.file.seek(SeekFrom::Start(offset))?;
        let mut buf = [0u8; BLOCK_SIZE];
        self.file.read_exact(&mut buf)?;
        Ok(buf)
    }

    /// Overwrite exactly one block at `offset`.
    pub fn write_block(&mut self, offset: u64, data: &[u8; BLOCK_SIZE]) -> Result<(), Error> {
        self.file.seek(SeekFrom::Start(offset))?;
        self.file.write_all(data)?;
        Ok(())
    }

    /// Append one zero-filled block and return its offset (the file's length
    /// before the append). The caller owns initializing its contents.
    pub fn append_block(&mut self) -> Result<u64, Error> {
        let offset = self.file.seek(SeekFrom::End(0))?;
        self.file.write_all(&[0u8; BLOCK_SIZE])?;
        Ok(offset)
    }

    /// Current file length in bytes.
    pub fn len(&self) -> Result<u64, Error> {
        Ok(self.file.metadata()?.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::NamedTempFile;

    fn device() -> BlockDevice {
        let file = NamedTempFile::new().unwrap().reopen().unwrap();
        BlockDevice::new(file)
    }

    #[test]
    fn append_then_read_back() {
        let mut dev = device();
        let off = dev.append_block().unwrap();
        assert_eq!(off, 0);
        let block = dev.read_block(off).unwrap();
        assert_eq!(block, [0u8; BLOCK_SIZE]);
    }

    #[test]
    fn write_then_read_roundtrip() {
        let mut dev = device();
        let off = dev.append_block().unwrap();
        let mut data = [0u8; BLOCK_SIZE];
        data[0] = 0xAB;
        data[BLOCK_SIZE - 1] = 0xCD;
        dev.write_block(off, &data).unwrap();
        assert_eq!(dev.read_block(off).unwrap(), data);
    }

    #[test]
    fn successive_appends_are_contiguous() {
        let mut dev = device();
        let a = dev.append_block().unwrap();
        let b = dev.append_block().unwrap();
        assert_eq!(b - a, BLOCK_SIZE as u64);
        assert_eq!(dev.len().unwrap(), 2 * BLOCK_SIZE as u64);
    }

    #[test]
    fn read_past_end_of_file_is_io_failure() {
        let mut dev = device();
        match dev.read_block(0) {
            Err(Error::IOFailure(_)) => {}
            other => panic!("expected IOFailure, got {:?}", other),
        }
    }
}
