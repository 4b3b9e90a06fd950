//! B-tree engine (C5): insert, search, and in-order traversal over blocks
//! managed by [`BlockDevice`].
use super::block::BlockDevice;
use super::header;
use super::node::{Node, MIN_DEGREE};
use crate::errors::Error;
use std::io::Write;

/// A B-tree living in an already-open, already-headered index file.
///
/// `root_offset` mirrors block 0's header field and is kept in sync with it
/// on every structural change (root split, first insert into an empty tree).
pub struct BTree {
    device: BlockDevice,
    root_offset: u64,
}

impl BTree {
    pub fn new(device: BlockDevice, root_offset: u64) -> Self {
        BTree {
            device,
            root_offset,
        }
    }

    pub fn root_offset(&self) -> u64 {
        self.root_offset
    }

    fn read_node(&mut self, offset: u64) -> Result<Node, Error> {
        let buf = self.device.read_block(offset)?;
        Node::decode(&buf)
    }

    fn write_node(&mut self, offset: u64, node: &Node) -> Result<(), Error> {
        let buf = node.encode()?;
        self.device.write_block(offset, &buf)
    }

    fn allocate_node(&mut self, node: &Node) -> Result<u64, Error> {
        let offset = self.device.append_block()?;
        self.write_node(offset, node)?;
        Ok(offset)
    }

    fn set_root(&mut self, offset: u64) -> Result<(), Error> {
        self.root_offset = offset;
        header::write_root(&mut self.device, offset)
    }

    /// Insert `key -> value`. Fails with `DuplicateKey` if `key` is already
    /// present anywhere in the tree.
    ///
    /// The tree is empty iff `root_offset == 0` (block 0 is the header, so no
    /// node ever lives there). On the very first insert a leaf root is
    /// allocated. Otherwise, following the classical preemptive-split
    /// algorithm: if the root is full it is split *before* descending, so
    /// `insert_non_full` never recurses into a full node.
    pub fn insert(&mut self, key: u32, value: u32) -> Result<(), Error> {
        if self.root_offset == 0 {
            let mut root = Node::new_leaf();
            root.keys.push(key);
            root.values.push(value);
            let offset = self.allocate_node(&root)?;
            self.set_root(offset)?;
            return Ok(());
        }

        let root_offset = self.root_offset;
        let root = self.read_node(root_offset)?;

        if root.is_full() {
            let mut new_root = Node::new_internal();
            new_root.children.push(root_offset);
            let new_root_offset = self.allocate_node(&new_root)?;
            self.split_child(new_root_offset, 0)?;
            self.set_root(new_root_offset)?;
            self.insert_non_full(new_root_offset, key, value)
        } else {
            self.insert_non_full(root_offset, key, value)
        }
    }

    /// Split the full child at `children[child_index]` of the node at
    /// `parent_offset`, promoting its median key/value up into the parent.
    ///
    /// Order matters: the upper half of the child's keys/values/children must
    /// be copied into the new sibling, and the median promoted into the
    /// parent, *before* the child is truncated — truncating first discards
    /// the very slices the copy and promotion depend on.
    fn split_child(&mut self, parent_offset: u64, child_index: usize) -> Result<(), Error> {
        let mut parent = self.read_node(parent_offset)?;
        let child_offset = parent.children[child_index];
        let mut child = self.read_node(child_offset)?;

        let mid = MIN_DEGREE - 1;
        let promoted_key = child.keys[mid];
        let promoted_value = child.values[mid];

        let mut sibling = if child.is_leaf {
            Node::new_leaf()
        } else {
            Node::new_internal()
        };
        sibling.keys = child.keys.split_off(mid + 1);
        sibling.values = child.values.split_off(mid + 1);
        if !child.is_leaf {
            sibling.children = child.children.split_off(mid + 1);
        }

        child.keys.truncate(mid);
        child.values.truncate(mid);

        let sibling_offset = self.allocate_node(&sibling)?;

        parent.keys.insert(child_index, promoted_key);
        parent.values.insert(child_index, promoted_value);
        parent.children.insert(child_index + 1, sibling_offset);

        self.write_node(child_offset, &child)?;
        self.write_node(parent_offset, &parent)?;
        Ok(())
    }

    /// Insert into the subtree rooted at `node_offset`, which the caller
    /// guarantees is not full.
    ///
    /// For a leaf, find the insertion point by scanning right to left, but
    /// check for a duplicate at the *pre-shift* index `i`: after the
    /// right-to-left shift loop, `i` has already been decremented past any
    /// key greater than `key`, so `keys[i] == key` (checked only once `i` is
    /// still in bounds) is the correct duplicate test — checking before the
    /// shift, or at the post-shift insertion index, both misfire.
    ///
    /// For an internal node, route to the child that would hold `key` by
    /// scanning left to right for the first key not less than `key` (the
    /// same scan `search` uses), and check equality against that matched
    /// index: that is the only index a promoted routing key can ever sit at,
    /// so checking the pre-shift/post-shift endpoints of a right-to-left
    /// scan (as the leaf branch does) would never catch it. Then descend,
    /// splitting the target child first if full (so the recursive call
    /// never lands on a full node), re-reading the parent and re-scanning
    /// the child index afterward since the split may have inserted a new
    /// key/child into the parent and shifted which child covers `key`.
    fn insert_non_full(&mut self, node_offset: u64, key: u32, value: u32) -> Result<(), Error> {
        let mut node = self.read_node(node_offset)?;

        if node.is_leaf {
            let mut i = node.keys.len() as isize - 1;
            node.keys.push(0);
            node.values.push(0);
            while i >= 0 && key < node.keys[i as usize] {
                node.keys[i as usize + 1] = node.keys[i as usize];
                node.values[i as usize + 1] = node.values[i as usize];
                i -= 1;
            }
            if i >= 0 && node.keys[i as usize] == key {
                return Err(Error::DuplicateKey(key));
            }
            node.keys[(i + 1) as usize] = key;
            node.values[(i + 1) as usize] = value;
            self.write_node(node_offset, &node)?;
            Ok(())
        } else {
            let mut i = 0;
            while i < node.keys.len() && key > node.keys[i] {
                i += 1;
            }
            if i < node.keys.len() && node.keys[i] == key {
                return Err(Error::DuplicateKey(key));
            }

            let child_offset = node.children[i];
            let child = self.read_node(child_offset)?;
            if child.is_full() {
                self.split_child(node_offset, i)?;
                let parent = self.read_node(node_offset)?;
                let mut i = 0;
                while i < parent.keys.len() && key > parent.keys[i] {
                    i += 1;
                }
                if i < parent.keys.len() && parent.keys[i] == key {
                    return Err(Error::DuplicateKey(key));
                }
                self.insert_non_full(parent.children[i], key, value)
            } else {
                self.insert_non_full(child_offset, key, value)
            }
        }
    }

    /// Search for `key`, returning its value if present.
    pub fn search(&mut self, key: u32) -> Result<Option<u32>, Error> {
        if self.root_offset == 0 {
            return Ok(None);
        }
        self.search_node(self.root_offset, key)
    }

    fn search_node(&mut self, node_offset: u64, key: u32) -> Result<Option<u32>, Error> {
        let node = self.read_node(node_offset)?;
        let mut i = 0;
        while i < node.keys.len() && key > node.keys[i] {
            i += 1;
        }
        if i < node.keys.len() && node.keys[i] == key {
            return Ok(Some(node.values[i]));
        }
        if node.is_leaf {
            return Ok(None);
        }
        self.search_node(node.children[i], key)
    }

    /// Visit every key/value pair in ascending key order.
    pub fn traverse(&mut self, mut visit: impl FnMut(u32, u32)) -> Result<(), Error> {
        if self.root_offset == 0 {
            return Ok(());
        }
        self.traverse_node(self.root_offset, &mut visit)
    }

    fn traverse_node(&mut self, node_offset: u64, visit: &mut impl FnMut(u32, u32)) -> Result<(), Error> {
        let node = self.read_node(node_offset)?;
        for i in 0..node.keys.len() {
            if !node.is_leaf {
                self.traverse_node(node.children[i], visit)?;
            }
            visit(node.keys[i], node.values[i]);
        }
        if !node.is_leaf {
            self.traverse_node(*node.children.last().unwrap(), visit)?;
        }
        Ok(())
    }

    /// Write every key/value pair in ascending order as `"key,value\n"` lines.
    pub fn extract_to(&mut self, mut writer: impl Write) -> Result<(), Error> {
        let mut first_err: Option<Error> = None;
        self.traverse(|k, v| {
            if first_err.is_some() {
                return;
            }
            if let Err(e) = writeln!(writer, "{},{}", k, v) {
                first_err = Some(Error::from(e));
            }
        })?;
        match first_err {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use super::super::node::{MAX_KEYS, MIN_KEYS};
    use tempfile::NamedTempFile;

    fn fresh_tree() -> BTree {
        let file = NamedTempFile::new().unwrap().reopen().unwrap();
        let mut device = BlockDevice::new(file);
        device.append_block().unwrap();
        header::write_fresh_header(&mut device).unwrap();
        BTree::new(device, 0)
    }

    #[test]
    fn insert_then_search_single_key() {
        let mut tree = fresh_tree();
        tree.insert(5, 50).unwrap();
        assert_eq!(tree.search(5).unwrap(), Some(50));
        assert_eq!(tree.search(6).unwrap(), None);
    }

    #[test]
    fn search_on_empty_tree_is_none() {
        let mut tree = fresh_tree();
        assert_eq!(tree.search(1).unwrap(), None);
    }

    #[test]
    fn duplicate_key_is_rejected() {
        let mut tree = fresh_tree();
        tree.insert(5, 50).unwrap();
        match tree.insert(5, 99) {
            Err(Error::DuplicateKey(5)) => {}
            other => panic!("expected DuplicateKey(5), got {:?}", other),
        }
        assert_eq!(tree.search(5).unwrap(), Some(50));
    }

    #[test]
    fn insert_many_ascending_keeps_them_searchable() {
        let mut tree = fresh_tree();
        for k in 0..200u32 {
            tree.insert(k, k * 10).unwrap();
        }
        for k in 0..200u32 {
            assert_eq!(tree.search(k).unwrap(), Some(k * 10));
        }
    }

    #[test]
    fn insert_many_descending_keeps_them_searchable() {
        let mut tree = fresh_tree();
        for k in (0..200u32).rev() {
            tree.insert(k, k + 1).unwrap();
        }
        for k in 0..200u32 {
            assert_eq!(tree.search(k).unwrap(), Some(k + 1));
        }
    }

    #[test]
    fn traverse_visits_keys_in_ascending_order() {
        let mut tree = fresh_tree();
        let inserted = [50u32, 10, 90, 30, 70, 20, 60, 40, 80, 5, 100, 1];
        for &k in &inserted {
            tree.insert(k, k).unwrap();
        }
        let mut seen = Vec::new();
        tree.traverse(|k, v| {
            seen.push((k, v));
        })
        .unwrap();
        let mut expected: Vec<u32> = inserted.to_vec();
        expected.sort();
        let expected: Vec<(u32, u32)> = expected.into_iter().map(|k| (k, k)).collect();
        assert_eq!(seen, expected);
    }

    #[test]
    fn extract_to_writes_ascending_csv_lines() {
        let mut tree = fresh_tree();
        tree.insert(2, 20).unwrap();
        tree.insert(1, 10).unwrap();
        tree.insert(3, 30).unwrap();
        let mut out = Vec::new();
        tree.extract_to(&mut out).unwrap();
        assert_eq!(String::from_utf8(out).unwrap(), "1,10\n2,20\n3,30\n");
    }

    #[test]
    fn duplicate_of_a_promoted_routing_key_is_rejected() {
        // E3+E4: fill one leaf, force a root split so `40` is promoted into
        // the new internal root, then try to reinsert it.
        let mut tree = fresh_tree();
        for (k, v) in [(10, 1), (20, 2), (30, 3), (40, 4), (50, 5), (60, 6), (70, 7)] {
            tree.insert(k, v).unwrap();
        }
        tree.insert(80, 8).unwrap();

        match tree.insert(40, 999) {
            Err(Error::DuplicateKey(40)) => {}
            other => panic!("expected DuplicateKey(40), got {:?}", other),
        }
        assert_eq!(tree.search(40).unwrap(), Some(4));
        assert_eq!(tree.search(80).unwrap(), Some(8));
    }

    #[test]
    fn degree_bounds_hold_after_many_inserts() {
        // Invariant 8: every non-root node has num_keys in [t-1, 2t-1]; the
        // root has num_keys in [1, 2t-1].
        let mut tree = fresh_tree();
        for k in 0..300u32 {
            tree.insert(k, k).unwrap();
        }
        let root_offset = tree.root_offset();
        check_degree_bounds(&mut tree, root_offset, true);
    }

    fn check_degree_bounds(tree: &mut BTree, offset: u64, is_root: bool) {
        let node = tree.read_node(offset).unwrap();
        if is_root {
            assert!(!node.keys.is_empty() && node.keys.len() <= MAX_KEYS);
        } else {
            assert!(node.keys.len() >= MIN_KEYS && node.keys.len() <= MAX_KEYS);
        }
        if !node.is_leaf {
            for &child in &node.children {
                check_degree_bounds(tree, child, false);
            }
        }
    }

    #[test]
    fn root_offset_changes_after_first_split() {
        let mut tree = fresh_tree();
        for k in 0..MAX_KEYS as u32 {
            tree.insert(k, k).unwrap();
        }
        let root_before = tree.root_offset();
        tree.insert(MAX_KEYS as u32, MAX_KEYS as u32).unwrap();
        assert_ne!(tree.root_offset(), root_before);
        for k in 0..=MAX_KEYS as u32 {
            assert_eq!(tree.search(k).unwrap(), Some(k));
        }
    }
}
