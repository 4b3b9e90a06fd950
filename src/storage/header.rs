//! Header codec (C2): the 512-byte block 0 of an index file.
use super::block::{BlockDevice, BLOCK_SIZE};
use crate::errors::Error;

/// The 8 ASCII bytes every index file starts with.
pub const MAGIC: &[u8; 8] = b"BTREEIDX";

/// Decoded header: just the root node's byte offset. `0` means the tree is
/// empty.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Header {
    pub root_offset: u64,
}

/// Write a fresh header block (magic + `root = 0` + zero padding) as block 0.
pub fn write_fresh_header(device: &mut BlockDevice) -> Result<(), Error> {
    let mut buf = [0u8; BLOCK_SIZE];
    buf[0..8].copy_from_slice(MAGIC);
    buf[8..16].copy_from_slice(&0u64.to_be_bytes());
    device.write_block(0, &buf)
}

/// Read and validate the header. Fails with `InvalidIndexFile` if the magic
/// doesn't match.
pub fn read_header(device: &mut BlockDevice) -> Result<Header, Error> {
    let buf = device.read_block(0)?;
    if &buf[0..8] != MAGIC {
        return Err(Error::InvalidIndexFile);
    }
    let root_offset = u64::from_be_bytes(buf[8..16].try_into().unwrap());
    Ok(Header { root_offset })
}

/// Rewrite the root offset, leaving the rest of the header block untouched.
pub fn write_root(device: &mut BlockDevice, offset: u64) -> Result<(), Error> {
    let mut buf = device.read_block(0)?;
    buf[8..16].copy_from_slice(&offset.to_be_bytes());
    device.write_block(0, &buf)
}
