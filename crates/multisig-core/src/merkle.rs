//! Tree hash over log entries
//!
//! A log's content hash at length `L` is a Blake3 merkle root over its first
//! `L` entries, bound to `L` itself so that every length has its own hash.

use crate::hash::{hash_chunks, Hash32};

const LEAF_TAG: &[u8] = &[0x00];
const PARENT_TAG: &[u8] = &[0x01];
const ROOT_TAG: &[u8] = &[0x02];

/// Hash a single entry as a merkle leaf
pub fn leaf_hash(entry: &[u8]) -> Hash32 {
    hash_chunks(&[LEAF_TAG, entry])
}

fn parent_hash(left: &Hash32, right: &Hash32) -> Hash32 {
    hash_chunks(&[PARENT_TAG, left.as_bytes(), right.as_bytes()])
}

/// Build a merkle root from leaf hashes
///
/// Pairs are combined as `H(0x01 || left || right)`; an odd node at the end of
/// a level is promoted unchanged. An empty tree has the all-zero root.
pub fn merkle_root(leaves: &[Hash32]) -> Hash32 {
    if leaves.is_empty() {
        return Hash32::default();
    }

    let mut current_level = leaves.to_vec();
    while current_level.len() > 1 {
        let mut next_level = Vec::with_capacity(current_level.len().div_ceil(2));
        for pair in current_level.chunks(2) {
            let node = match pair {
                [left, right] => parent_hash(left, right),
                _ => pair[0],
            };
            next_level.push(node);
        }
        current_level = next_level;
    }

    current_level[0]
}

/// Tree hash of a log whose entries are exactly `entries`
pub fn tree_hash<E: AsRef<[u8]>>(entries: &[E]) -> Hash32 {
    let leaves: Vec<Hash32> = entries.iter().map(|e| leaf_hash(e.as_ref())).collect();
    tree_hash_from_leaves(&leaves)
}

/// Tree hash from precomputed leaf hashes
pub fn tree_hash_from_leaves(leaves: &[Hash32]) -> Hash32 {
    let root = merkle_root(leaves);
    let length = leaves.len() as u64;
    hash_chunks(&[ROOT_TAG, &length.to_le_bytes(), root.as_bytes()])
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entries(n: usize) -> Vec<Vec<u8>> {
        (0..n).map(|i| format!("content {i}").into_bytes()).collect()
    }

    #[test]
    fn test_tree_hash_deterministic() {
        assert_eq!(tree_hash(&entries(5)), tree_hash(&entries(5)));
    }

    #[test]
    fn test_every_length_distinct() {
        let all = entries(8);
        let hashes: Vec<Hash32> = (0..=all.len()).map(|n| tree_hash(&all[..n])).collect();
        for (i, a) in hashes.iter().enumerate() {
            for b in &hashes[i + 1..] {
                assert_ne!(a, b);
            }
        }
    }

    #[test]
    fn test_empty_log_is_not_zero() {
        let empty: [Vec<u8>; 0] = [];
        assert_ne!(tree_hash(&empty), Hash32::default());
    }

    #[test]
    fn test_mutating_entry_changes_hash() {
        let mut all = entries(5);
        let before = tree_hash(&all);
        all[3] = b"tampered".to_vec();
        assert_ne!(before, tree_hash(&all));
    }

    #[test]
    fn test_odd_node_promotion() {
        let leaves: Vec<Hash32> = entries(3).iter().map(|e| leaf_hash(e)).collect();
        let expected = parent_hash(&parent_hash(&leaves[0], &leaves[1]), &leaves[2]);
        assert_eq!(merkle_root(&leaves), expected);
    }
}
