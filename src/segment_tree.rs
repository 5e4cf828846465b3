//! Static interval map with stabbing queries.
//!
//! Intervals `[start, end)` are collected in a batch, then [`build`]
//! compacts them into a binary tree over the sorted distinct endpoints.
//! Every interval is registered on its canonical node cover: the O(log n)
//! highest nodes whose ranges tile it exactly.  A stabbing query walks
//! one root-to-leaf path and gathers the registered intervals along the
//! way, so it reports all k hits in O(log n + k).
//!
//! [`build`]: SegmentTree::build

use crate::error::{Error, Result};

struct Segment<K, V> {
    start: K,
    end: K,
    value: V,
}

struct TreeNode<K> {
    low: K,
    high: K,
    left: Option<usize>,
    right: Option<usize>,
    /// Indices of the segments whose canonical cover includes this node.
    segments: Vec<usize>,
}

struct TreeStore<K> {
    nodes: Vec<TreeNode<K>>,
    root: Option<usize>,
}

/// A batch-built map from intervals to values answering "which intervals
/// contain this point".
pub struct SegmentTree<K, V> {
    segments: Vec<Segment<K, V>>,
    tree: Option<TreeStore<K>>,
}

impl<K, V> SegmentTree<K, V>
where
    K: PartialOrd + Copy,
{
    /// Create an empty, unbuilt tree.
    #[must_use]
    pub fn new() -> Self {
        SegmentTree {
            segments: Vec::new(),
            tree: None,
        }
    }

    /// Number of registered intervals.
    #[must_use]
    pub fn len(&self) -> usize {
        self.segments.len()
    }

    /// True if no intervals are registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    /// True if the tree reflects the current interval batch.
    #[must_use]
    pub fn is_built(&self) -> bool {
        self.tree.is_some()
    }

    /// Register the interval `[start, end)` with `value`.  Invalidates a
    /// previously built tree.
    ///
    /// Fails with `InvalidArgument` unless `start < end`.
    pub fn insert(&mut self, start: K, end: K, value: V) -> Result<()> {
        if start >= end {
            return Err(Error::InvalidArgument(
                "interval start must be less than its end".to_string(),
            ));
        }
        self.segments.push(Segment { start, end, value });
        self.tree = None;
        Ok(())
    }

    /// Drop every interval whose value equals `value`; true if any was
    /// dropped.  Invalidates a previously built tree.
    pub fn remove(&mut self, value: &V) -> bool
    where
        V: PartialEq,
    {
        let before = self.segments.len();
        self.segments.retain(|s| s.value != *value);
        let removed = self.segments.len() != before;
        if removed {
            self.tree = None;
        }
        removed
    }

    /// Construct the query tree from the current interval batch.
    pub fn build(&mut self) {
        let mut endpoints: Vec<K> = Vec::with_capacity(self.segments.len() * 2);
        for segment in &self.segments {
            endpoints.push(segment.start);
            endpoints.push(segment.end);
        }
        endpoints.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
        endpoints.dedup();

        if endpoints.len() < 2 {
            self.tree = Some(TreeStore {
                nodes: Vec::new(),
                root: None,
            });
            return;
        }

        // Leaves tile the key space into elementary intervals.
        let mut nodes: Vec<TreeNode<K>> = endpoints
            .windows(2)
            .map(|pair| TreeNode {
                low: pair[0],
                high: pair[1],
                left: None,
                right: None,
                segments: Vec::new(),
            })
            .collect();

        // Pair the nodes up level by level; an odd node is carried over.
        let mut level: Vec<usize> = (0..nodes.len()).collect();
        while level.len() > 1 {
            let mut next_level = Vec::with_capacity(level.len().div_ceil(2));
            for pair in level.chunks(2) {
                if let [left, right] = *pair {
                    let parent = TreeNode {
                        low: nodes[left].low,
                        high: nodes[right].high,
                        left: Some(left),
                        right: Some(right),
                        segments: Vec::new(),
                    };
                    nodes.push(parent);
                    next_level.push(nodes.len() - 1);
                } else {
                    next_level.push(pair[0]);
                }
            }
            level = next_level;
        }
        let root = level[0];

        // Register each interval on its canonical node cover.
        for (id, segment) in self.segments.iter().enumerate() {
            Self::descend_insert(&mut nodes, root, id, segment.start, segment.end);
        }

        self.tree = Some(TreeStore {
            nodes,
            root: Some(root),
        });
    }

    fn descend_insert(nodes: &mut [TreeNode<K>], at: usize, id: usize, start: K, end: K) {
        let (low, high, left, right) = {
            let node = &nodes[at];
            (node.low, node.high, node.left, node.right)
        };
        if end <= low || high <= start {
            return;
        }
        if start <= low && high <= end {
            nodes[at].segments.push(id);
            return;
        }
        if let Some(left) = left {
            Self::descend_insert(nodes, left, id, start, end);
        }
        if let Some(right) = right {
            Self::descend_insert(nodes, right, id, start, end);
        }
    }

    /// Collect every value whose interval contains `point`.
    ///
    /// Fails with `InvalidArgument` if the tree has not been built (or was
    /// invalidated by a mutation) since the last batch change.
    pub fn search(&self, point: K) -> Result<Vec<&V>> {
        let tree = self.tree.as_ref().ok_or_else(|| {
            Error::InvalidArgument("segment tree must be built before searching".to_string())
        })?;
        let mut hits = Vec::new();
        let Some(root) = tree.root else {
            return Ok(hits);
        };

        let mut current = Some(root);
        while let Some(at) = current {
            let node = &tree.nodes[at];
            if point < node.low || node.high <= point {
                break;
            }
            for &id in &node.segments {
                hits.push(&self.segments[id].value);
            }
            current = match (node.left, node.right) {
                (Some(left), _) if Self::node_contains(&tree.nodes[left], point) => Some(left),
                (_, Some(right)) if Self::node_contains(&tree.nodes[right], point) => Some(right),
                _ => None,
            };
        }
        Ok(hits)
    }

    fn node_contains(node: &TreeNode<K>, point: K) -> bool {
        node.low <= point && point < node.high
    }
}

impl<K: PartialOrd + Copy, V> Default for SegmentTree<K, V> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sorted<'a>(mut hits: Vec<&'a &'a str>) -> Vec<&'a str> {
        let mut out: Vec<&str> = hits.drain(..).map(|s| *s).collect();
        out.sort_unstable();
        out
    }

    #[test]
    fn test_stabbing_basic() {
        let mut tree = SegmentTree::new();
        tree.insert(0, 10, "A").unwrap();
        tree.insert(2, 6, "B").unwrap();
        tree.insert(5, 15, "C").unwrap();
        tree.build();
        assert!(tree.is_built());

        assert_eq!(sorted(tree.search(3).unwrap()), vec!["A", "B"]);
        assert_eq!(sorted(tree.search(7).unwrap()), vec!["A", "C"]);
        assert_eq!(sorted(tree.search(0).unwrap()), vec!["A"]);
        assert_eq!(sorted(tree.search(5).unwrap()), vec!["A", "B", "C"]);

        // End boundaries are exclusive.
        assert!(tree.search(15).unwrap().is_empty());
        assert!(tree.search(-1).unwrap().is_empty());
        assert_eq!(sorted(tree.search(14).unwrap()), vec!["C"]);
    }

    #[test]
    fn test_search_requires_build() {
        let mut tree = SegmentTree::new();
        tree.insert(0, 4, "A").unwrap();
        assert!(!tree.is_built());
        assert!(tree.search(1).is_err());

        tree.build();
        assert!(tree.search(1).is_ok());

        // A mutation invalidates the built tree.
        tree.insert(1, 2, "B").unwrap();
        assert!(!tree.is_built());
        assert!(tree.search(1).is_err());
    }

    #[test]
    fn test_remove_by_value() {
        let mut tree = SegmentTree::new();
        tree.insert(0, 8, "A").unwrap();
        tree.insert(4, 12, "B").unwrap();
        tree.build();
        assert_eq!(sorted(tree.search(5).unwrap()), vec!["A", "B"]);

        assert!(tree.remove(&"B"));
        assert!(!tree.remove(&"B"));
        assert_eq!(tree.len(), 1);
        tree.build();
        assert_eq!(sorted(tree.search(5).unwrap()), vec!["A"]);
    }

    #[test]
    fn test_empty_tree() {
        let mut tree: SegmentTree<i64, &str> = SegmentTree::new();
        assert!(tree.is_empty());
        tree.build();
        assert!(tree.search(0).unwrap().is_empty());
    }

    #[test]
    fn test_rejects_degenerate_interval() {
        let mut tree = SegmentTree::new();
        assert!(tree.insert(5, 5, "A").is_err());
        assert!(tree.insert(6, 2, "B").is_err());
        assert!(tree.is_empty());
    }

    #[test]
    fn test_brute_force_cross_check() {
        let intervals: &[(i64, i64)] = &[
            (0, 5),
            (3, 9),
            (8, 20),
            (1, 2),
            (14, 16),
            (2, 18),
            (7, 8),
        ];
        let mut tree = SegmentTree::new();
        for (i, &(start, end)) in intervals.iter().enumerate() {
            tree.insert(start, end, i).unwrap();
        }
        tree.build();

        for point in -2..24 {
            let mut hits: Vec<usize> = tree
                .search(point)
                .unwrap()
                .into_iter()
                .copied()
                .collect();
            hits.sort_unstable();
            let expected: Vec<usize> = intervals
                .iter()
                .enumerate()
                .filter(|(_, &(s, e))| s <= point && point < e)
                .map(|(i, _)| i)
                .collect();
            assert_eq!(hits, expected, "stab at {point}");
        }
    }
}
