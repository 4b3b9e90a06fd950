//! Node codec (C3): one B-tree node per 512-byte block.
use super::block::BLOCK_SIZE;
use crate::err;
use crate::errors::Error;

/// Minimum degree `t`. Each node holds `[t-1, 2t-1]` keys; an internal node
/// has one more child than keys.
pub const MIN_DEGREE: usize = 4;

/// Maximum number of keys a node can hold (`2t - 1`).
pub const MAX_KEYS: usize = 2 * MIN_DEGREE - 1;

/// Minimum number of keys a non-root node must hold (`t - 1`).
pub const MIN_KEYS: usize = MIN_DEGREE - 1;

/// An in-memory materialization of one node block.
///
/// `children` is empty for a leaf and has `keys.len() + 1` entries for an
/// internal node. Node identity is the file offset it lives at, not this
/// struct — callers track the offset separately.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Node {
    pub is_leaf: bool,
    pub keys: Vec<u32>,
    pub values: Vec<u32>,
    pub children: Vec<u64>,
}

impl Node {
    pub fn new_leaf() -> Self {
        Node {
            is_leaf: true,
            keys: Vec::new(),
            values: Vec::new(),
            children: Vec::new(),
        }
    }

    pub fn new_internal() -> Self {
        Node {
            is_leaf: false,
            keys: Vec::new(),
            values: Vec::new(),
            children: Vec::new(),
        }
    }

    pub fn is_full(&self) -> bool {
        self.keys.len() == MAX_KEYS
    }

    /// Encode to a 512-byte block. Big-endian throughout: `is_leaf` (1 byte),
    /// `num_keys` (u32), keys (u32 each), values (u32 each), and — for
    /// internal nodes only — `num_keys + 1` child offsets (u64 each).
    pub fn encode(&self) -> Result<[u8; BLOCK_SIZE], Error> {
        if self.keys.len() > MAX_KEYS {
            return Err(err!(
                Corruption,
                "node has {} keys, maximum is {}",
                self.keys.len(),
                MAX_KEYS
            ));
        }
        if !self.is_leaf && self.children.len() != self.keys.len() + 1 {
            return Err(err!(
                Corruption,
                "internal node has {} keys but {} children",
                self.keys.len(),
                self.children.len()
            ));
        }

        let mut buf = [0u8; BLOCK_SIZE];
        buf[0] = self.is_leaf as u8;
        buf[1..5].copy_from_slice(&(self.keys.len() as u32).to_be_bytes());

        let mut off = 5;
        for k in &self.keys {
            buf[off..off + 4].copy_from_slice(&k.to_be_bytes());
            off += 4;
        }
        for v in &self.values {
            buf[off..off + 4].copy_from_slice(&v.to_be_bytes());
            off += 4;
        }
        if !self.is_leaf {
            for c in &self.children {
                if off + 8 > BLOCK_SIZE {
                    return Err(err!(Corruption, "encoded node exceeds block size"));
                }
                buf[off..off + 8].copy_from_slice(&c.to_be_bytes());
                off += 8;
            }
        }
        Ok(buf)
    }

    /// Decode a 512-byte block. Fails with `Corruption` if the encoded shape
    /// could not have come from a valid node (out-of-range `num_keys`, or a
    /// body that would overrun the block).
    pub fn decode(buf: &[u8; BLOCK_SIZE]) -> Result<Self, Error> {
        let is_leaf = match buf[0] {
            0 => false,
            1 => true,
            other => return Err(err!(Corruption, "invalid is_leaf byte {}", other)),
        };
        let num_keys = u32::from_be_bytes(buf[1..5].try_into().unwrap()) as usize;
        if num_keys > MAX_KEYS {
            return Err(err!(
                Corruption,
                "decoded num_keys {} exceeds maximum {}",
                num_keys,
                MAX_KEYS
            ));
        }

        let keys_start = 5;
        let keys_end = keys_start + num_keys * 4;
        let values_end = keys_end + num_keys * 4;
        let num_children = if is_leaf { 0 } else { num_keys + 1 };
        let children_end = values_end + num_children * 8;
        if children_end > BLOCK_SIZE {
            return Err(err!(Corruption, "node body would overrun the block"));
        }

        let mut keys = Vec::with_capacity(num_keys);
        for i in 0..num_keys {
            let s = keys_start + i * 4;
            keys.push(u32::from_be_bytes(buf[s..s + 4].try_into().unwrap()));
        }

        let mut values = Vec::with_capacity(num_keys);
        for i in 0..num_keys {
            let s = keys_end + i * 4;
            values.push(u32::from_be_bytes(buf[s..s + 4].try_into().unwrap()));
        }

        let mut children = Vec::with_capacity(num_children);
        for i in 0..num_children {
            let s = values_end + i * 8;
            children.push(u64::from_be_bytes(buf[s..s + 8].try_into().unwrap()));
        }

        Ok(Node {
            is_leaf,
            keys,
            values,
            children,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn leaf_roundtrip() {
        let node = Node {
            is_leaf: true,
            keys: vec![10, 20, 30],
            values: vec![1, 2, 3],
            children: vec![],
        };
        let encoded = node.encode().unwrap();
        assert_eq!(encoded.len(), BLOCK_SIZE);
        assert_eq!(Node::decode(&encoded).unwrap(), node);
    }

    #[test]
    fn internal_roundtrip() {
        let node = Node {
            is_leaf: false,
            keys: vec![40],
            values: vec![4],
            children: vec![512, 1024],
        };
        let encoded = node.encode().unwrap();
        assert_eq!(Node::decode(&encoded).unwrap(), node);
    }

    #[test]
    fn full_leaf_roundtrip() {
        let node = Node {
            is_leaf: true,
            keys: (0..MAX_KEYS as u32).collect(),
            values: (100..100 + MAX_KEYS as u32).collect(),
            children: vec![],
        };
        let encoded = node.encode().unwrap();
        assert_eq!(Node::decode(&encoded).unwrap(), node);
    }

    #[test]
    fn encode_rejects_too_many_keys() {
        let node = Node {
            is_leaf: true,
            keys: (0..=MAX_KEYS as u32).collect(),
            values: (0..=MAX_KEYS as u32).collect(),
            children: vec![],
        };
        assert!(matches!(node.encode(), Err(Error::Corruption(_))));
    }

    #[test]
    fn decode_rejects_bad_num_keys() {
        let mut buf = [0u8; BLOCK_SIZE];
        buf[0] = 1;
        buf[1..5].copy_from_slice(&((MAX_KEYS as u32) + 1).to_be_bytes());
        assert!(matches!(Node::decode(&buf), Err(Error::Corruption(_))));
    }

    #[test]
    fn decode_rejects_bad_is_leaf_byte() {
        let mut buf = [0u8; BLOCK_SIZE];
        buf[0] = 2;
        assert!(matches!(Node::decode(&buf), Err(Error::Corruption(_))));
    }
}
