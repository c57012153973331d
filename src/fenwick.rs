//! # Binary Indexed Tree — Counting Unsieved Positions in O(log n)
//!
//! During the special-leaf computation each leaf needs the number of
//! unsieved positions in a prefix of the current segment, *between* two
//! prime crossing-off rounds. Recounting bits would cost O(segment) per
//! leaf; this Fenwick tree answers the prefix count in O(log n) and absorbs
//! each bit clearing as an O(log n) point update.
//!
//! The tree is rebuilt from the sieve in O(n) at every segment start via
//! the carry-propagation trick (each node pushes its subtotal to its
//! parent), instead of n individual O(log n) inserts.
//!
//! ## References
//!
//! - Peter M. Fenwick, "A New Data Structure for Cumulative Frequency
//!   Tables", Software: Practice and Experience, 24(3):327-336, 1994.

pub struct BinaryIndexedTree {
    tree: Vec<u32>,
}

impl BinaryIndexedTree {
    pub fn new() -> Self {
        BinaryIndexedTree { tree: Vec::new() }
    }

    /// Rebuild the tree so that `count(pos)` reflects the set bits of
    /// `sieve` over [low, high): position i mirrors sieve bit low + i.
    ///
    /// O(n) total: node i accumulates its own value, then donates its
    /// subtotal to parent i + (i & -i).
    pub fn init(&mut self, sieve: &crate::bit_sieve::BitSieve, len: usize) {
        let n = len;
        self.tree.clear();
        self.tree.resize(n + 1, 0);
        for i in 1..=n {
            self.tree[i] += u32::from(sieve.get(i - 1));
            let parent = i + (i & i.wrapping_neg());
            if parent <= n {
                self.tree[parent] += self.tree[i];
            }
        }
    }

    /// A set position has been cleared in the sieve: decrement all nodes
    /// covering `pos`. Precondition: the position was counted as set.
    #[inline]
    pub fn update(&mut self, pos: usize) {
        let mut i = pos + 1;
        let n = self.tree.len() - 1;
        while i <= n {
            debug_assert!(self.tree[i] > 0, "tree count underflow at {}", i);
            self.tree[i] -= 1;
            i += i & i.wrapping_neg();
        }
    }

    /// Number of set positions in [0, pos], clamped to the tree size.
    #[inline]
    pub fn count(&self, pos: usize) -> u64 {
        let n = self.tree.len() - 1;
        let mut i = (pos + 1).min(n);
        let mut sum = 0u64;
        while i > 0 {
            sum += u64::from(self.tree[i]);
            i -= i & i.wrapping_neg();
        }
        sum
    }
}

impl Default for BinaryIndexedTree {
    fn default() -> Self {
        Self::new()
    }
}
