// Merkle commitment over ordered leaves
//
// Leaves are padded with the zero hash up to the next power of two, then
// paired bottom-up. The root binds the top node to the unpadded leaf count,
// so padding positions cannot be claimed as leaves.

use crate::hash::{domain_hash, HashOutput};
use crate::{CryptoError, CryptoResult};

const NODE_DOMAIN: &str = "attest/node";
const ROOT_DOMAIN: &str = "attest/root";

/// A fully materialized binary Merkle tree
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MerkleTree {
    /// Levels from the (padded) leaves up to the root
    levels: Vec<Vec<HashOutput>>,
    /// Number of leaves before padding
    leaf_count: usize,
}

impl MerkleTree {
    /// Build a tree over the given leaves
    pub fn build(leaves: &[HashOutput]) -> CryptoResult<Self> {
        if leaves.is_empty() {
            return Err(CryptoError::EmptyCommitment);
        }

        let mut level = leaves.to_vec();
        level.resize(leaves.len().next_power_of_two(), HashOutput::ZERO);

        let mut levels = vec![level];
        while let Some(current) = levels.last() {
            if current.len() == 1 {
                break;
            }
            let next = current
                .chunks(2)
                .map(|pair| node_hash(&pair[0], &pair[1]))
                .collect();
            levels.push(next);
        }

        Ok(Self {
            levels,
            leaf_count: leaves.len(),
        })
    }

    /// Top node of the padded tree
    pub fn top(&self) -> HashOutput {
        self.levels
            .last()
            .and_then(|level| level.first())
            .copied()
            .unwrap_or(HashOutput::ZERO)
    }

    /// Root of the tree, committing to the leaf count
    pub fn root(&self) -> HashOutput {
        let count = (self.leaf_count as u64).to_le_bytes();
        domain_hash(ROOT_DOMAIN, &[&count, self.top().as_bytes()])
    }

    /// Number of leaves the tree was built from
    pub fn leaf_count(&self) -> usize {
        self.leaf_count
    }

    /// Height of the tree (a single leaf has height 0)
    pub fn height(&self) -> usize {
        self.levels.len() - 1
    }
}

/// Hash two child nodes into their parent
pub fn node_hash(left: &HashOutput, right: &HashOutput) -> HashOutput {
    domain_hash(NODE_DOMAIN, &[left.as_bytes(), right.as_bytes()])
}

/// Compute the Merkle root over the given leaves
pub fn merkle_root(leaves: &[HashOutput]) -> CryptoResult<HashOutput> {
    Ok(MerkleTree::build(leaves)?.root())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hash::content_hash;

    fn leaves(n: usize) -> Vec<HashOutput> {
        (0..n).map(|i| content_hash(&[i as u8])).collect()
    }

    #[test]
    fn test_empty_tree_rejected() {
        assert_eq!(MerkleTree::build(&[]).unwrap_err(), CryptoError::EmptyCommitment);
    }

    #[test]
    fn test_single_leaf_is_top() {
        let leaf = content_hash(b"only");
        let tree = MerkleTree::build(&[leaf]).unwrap();
        assert_eq!(tree.top(), leaf);
        assert_ne!(tree.root(), leaf);
        assert_eq!(tree.height(), 0);
    }

    #[test]
    fn test_odd_leaf_count_is_padded() {
        let l = leaves(3);
        let tree = MerkleTree::build(&l).unwrap();
        let expected = node_hash(
            &node_hash(&l[0], &l[1]),
            &node_hash(&l[2], &HashOutput::ZERO),
        );
        assert_eq!(tree.top(), expected);
        assert_eq!(tree.leaf_count(), 3);
        assert_eq!(tree.height(), 2);
    }

    #[test]
    fn test_root_depends_on_order() {
        let mut l = leaves(4);
        let root = merkle_root(&l).unwrap();
        l.swap(0, 1);
        assert_ne!(merkle_root(&l).unwrap(), root);
    }

    #[test]
    fn test_padding_leaf_changes_root() {
        let l = leaves(5);
        let mut padded = l.clone();
        padded.push(HashOutput::ZERO);

        let honest = MerkleTree::build(&l).unwrap();
        let extended = MerkleTree::build(&padded).unwrap();
        assert_eq!(honest.top(), extended.top());
        assert_ne!(honest.root(), extended.root());
    }
}
