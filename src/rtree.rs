//! Dynamic R-tree: a spatial index keyed by axis-aligned boxes.
//!
//! Values are stored under bounding boxes in a balanced tree of directory
//! nodes.  Insertion descends by least cost (overlap increase at the leaf
//! level, area enlargement above it), and an overflowing directory first
//! re-inserts its outliers (when enabled) and then splits along the axis
//! with the smallest margin sum — the R\*-tree recipe.  A point query
//! descends every directory whose box contains the point.
//!
//! # Representation
//!
//! Parent links would form reference cycles under owned child pointers,
//! so nodes live in an arena (`Vec` of slots) and refer to each other by
//! index.  Freed slots are recycled through a free list.

use std::mem;

use num_traits::Num;

use crate::error::{Error, Result};

/// Numeric key usable as a box coordinate.
pub trait RTreeKey: Num + PartialOrd + Copy + Default {}

impl<T: Num + PartialOrd + Copy + Default> RTreeKey for T {}

/// An axis-aligned box spanning `start..=end` in every dimension.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingBox<K, const N: usize> {
    /// Lower corner, inclusive.
    pub start: [K; N],
    /// Upper corner, inclusive.
    pub end: [K; N],
}

impl<K: RTreeKey, const N: usize> BoundingBox<K, N> {
    /// Create a box from two corner points.
    #[must_use]
    pub fn new(start: [K; N], end: [K; N]) -> Self {
        BoundingBox { start, end }
    }

    /// True if the box contains `point` in every dimension.
    #[must_use]
    pub fn contains(&self, point: &[K; N]) -> bool {
        (0..N).all(|d| self.start[d] <= point[d] && point[d] <= self.end[d])
    }

    /// Grow this box to cover `other`; true if any side moved.
    fn enlarge_to_fit(&mut self, other: &BoundingBox<K, N>) -> bool {
        let mut enlarged = false;
        for d in 0..N {
            if other.start[d] < self.start[d] {
                self.start[d] = other.start[d];
                enlarged = true;
            }
            if self.end[d] < other.end[d] {
                self.end[d] = other.end[d];
                enlarged = true;
            }
        }
        enlarged
    }

    /// Length of the overlap of two boxes along one dimension.
    fn linear_intersection(dim: usize, a: &Self, b: &Self) -> K {
        let (mut start1, mut end1) = (a.start[dim], a.end[dim]);
        let (mut start2, mut end2) = (b.start[dim], b.end[dim]);
        if start1 > start2 {
            mem::swap(&mut start1, &mut start2);
            mem::swap(&mut end1, &mut end2);
        }
        if end1 < start2 {
            // Disjoint along this dimension.
            return K::zero();
        }
        if end1 < end2 {
            end1 - start2
        } else {
            end2 - start2
        }
    }

    /// Volume of the intersection of two boxes; zero when disjoint.
    fn intersection(a: &Self, b: &Self) -> K {
        let mut volume = K::one();
        for d in 0..N {
            let segment = Self::linear_intersection(d, a, b);
            if segment == K::zero() {
                return K::zero();
            }
            volume = volume * segment;
        }
        volume
    }

    /// Volume of the box.
    fn area(&self) -> K {
        let mut area = K::one();
        for d in 0..N {
            area = area * (self.end[d] - self.start[d]);
        }
        area
    }

    /// Sum of the box's extents over all dimensions.
    fn margin(&self) -> K {
        let mut margin = K::zero();
        for d in 0..N {
            margin = margin + (self.end[d] - self.start[d]);
        }
        margin
    }

    /// Growth in volume required to also cover `guest`.
    fn area_enlargement(&self, guest: &Self) -> K {
        let mut enlarged = *self;
        if !enlarged.enlarge_to_fit(guest) {
            return K::zero();
        }
        enlarged.area() - self.area()
    }

    /// Center coordinates doubled, avoiding division on integer keys.
    /// Consistent scaling keeps comparisons valid.
    fn doubled_center(&self) -> [K; N] {
        let mut center = [K::zero(); N];
        for d in 0..N {
            center[d] = self.start[d] + self.end[d];
        }
        center
    }

    /// Squared distance between the doubled centers of two boxes.
    fn center_distance(a: &Self, b: &Self) -> K {
        let ca = a.doubled_center();
        let cb = b.doubled_center();
        let mut total = K::zero();
        for d in 0..N {
            let delta = if ca[d] > cb[d] {
                ca[d] - cb[d]
            } else {
                cb[d] - ca[d]
            };
            total = total + delta * delta;
        }
        total
    }
}

impl<K: RTreeKey, const N: usize> Default for BoundingBox<K, N> {
    fn default() -> Self {
        BoundingBox {
            start: [K::default(); N],
            end: [K::default(); N],
        }
    }
}

/// Fan-out bounds and overflow policy.
#[derive(Debug, Clone, Copy)]
pub struct RTreeConfig {
    /// Fewest children a non-root directory may keep.
    pub min_entries: usize,
    /// Most children any directory may hold.
    pub max_entries: usize,
    /// Re-insert a directory's outliers before splitting it.
    pub forced_reinsertion: bool,
}

impl Default for RTreeConfig {
    fn default() -> Self {
        RTreeConfig {
            min_entries: 3,
            max_entries: 8,
            forced_reinsertion: true,
        }
    }
}

type NodeId = usize;

#[derive(Debug)]
enum NodeKind<V> {
    /// Directory whose children are value entries.
    Leaf(Vec<NodeId>),
    /// Directory whose children are directories.
    Branch(Vec<NodeId>),
    /// A stored value under its bounding box.
    Value(V),
}

#[derive(Debug)]
struct Node<K, V, const N: usize> {
    parent: Option<NodeId>,
    bbox: BoundingBox<K, N>,
    kind: NodeKind<V>,
}

/// One hit of a point query.
#[derive(Debug)]
pub struct SearchEntry<'a, K, V, const N: usize> {
    /// The bounding box the value was stored under.
    pub extent: BoundingBox<K, N>,
    /// The stored value.
    pub value: &'a V,
}

/// A dynamic spatial index over `N`-dimensional boxes.
#[derive(Debug)]
pub struct RTree<K, V, const N: usize> {
    nodes: Vec<Option<Node<K, V, N>>>,
    free: Vec<NodeId>,
    root: NodeId,
    len: usize,
    config: RTreeConfig,
}

impl<K: RTreeKey, V, const N: usize> RTree<K, V, N> {
    /// Create an empty tree with the default configuration.
    #[must_use]
    pub fn new() -> Self {
        match Self::with_config(RTreeConfig::default()) {
            Ok(tree) => tree,
            Err(_) => unreachable!("default configuration is valid"),
        }
    }

    /// Create an empty tree with explicit fan-out bounds.
    ///
    /// Requires `1 <= min_entries <= max_entries / 2`.
    pub fn with_config(config: RTreeConfig) -> Result<Self> {
        if config.min_entries == 0 || config.min_entries > config.max_entries / 2 {
            return Err(Error::InvalidArgument(
                "min_entries must be in 1..=max_entries/2".to_string(),
            ));
        }
        let root_node = Node {
            parent: None,
            bbox: BoundingBox::default(),
            kind: NodeKind::Leaf(Vec::new()),
        };
        Ok(RTree {
            nodes: vec![Some(root_node)],
            free: Vec::new(),
            root: 0,
            len: 0,
            config,
        })
    }

    /// Build a tree from a batch of boxed values by level-by-level tile
    /// packing, cycling the sort dimension per level.  Much faster than
    /// repeated insertion and yields well-filled nodes.
    pub fn bulk_load(items: Vec<(BoundingBox<K, N>, V)>, config: RTreeConfig) -> Result<Self> {
        let mut tree = Self::with_config(config)?;
        if items.is_empty() {
            return Ok(tree);
        }

        tree.len = items.len();
        let mut level: Vec<NodeId> = items
            .into_iter()
            .map(|(bbox, value)| {
                tree.alloc(Node {
                    parent: None,
                    bbox,
                    kind: NodeKind::Value(value),
                })
            })
            .collect();

        let mut dim = 0;
        let mut leaf_level = true;
        loop {
            level.sort_by(|a, b| {
                let ca = tree.node(*a).bbox.doubled_center()[dim];
                let cb = tree.node(*b).bbox.doubled_center()[dim];
                ca.partial_cmp(&cb).unwrap_or(std::cmp::Ordering::Equal)
            });

            let mut parents = Vec::new();
            for chunk in level.chunks(tree.config.max_entries) {
                let children = chunk.to_vec();
                let mut bbox = tree.node(children[0]).bbox;
                for &child in &children[1..] {
                    bbox.enlarge_to_fit(&tree.node(child).bbox);
                }
                let kind = if leaf_level {
                    NodeKind::Leaf(children.clone())
                } else {
                    NodeKind::Branch(children.clone())
                };
                let parent = tree.alloc(Node {
                    parent: None,
                    bbox,
                    kind,
                });
                for child in children {
                    tree.node_mut(child).parent = Some(parent);
                }
                parents.push(parent);
            }

            if parents.len() == 1 {
                let old_root = tree.root;
                tree.root = parents[0];
                tree.release(old_root);
                return Ok(tree);
            }
            level = parents;
            leaf_level = false;
            dim = (dim + 1) % N;
        }
    }

    /// Number of stored values.
    #[must_use]
    pub fn len(&self) -> usize {
        self.len
    }

    /// True if no values are stored.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Bounding box of everything stored.
    #[must_use]
    pub fn extent(&self) -> BoundingBox<K, N> {
        self.node(self.root).bbox
    }

    /// Insert `value` under `extent`.
    pub fn insert(&mut self, extent: BoundingBox<K, N>, value: V) {
        let id = self.alloc(Node {
            parent: None,
            bbox: extent,
            kind: NodeKind::Value(value),
        });
        self.len += 1;
        self.insert_node(id, true);
    }

    /// Collect every value whose box contains `point`.
    #[must_use]
    pub fn search(&self, point: &[K; N]) -> Vec<SearchEntry<'_, K, V, N>> {
        let mut results = Vec::new();
        self.search_descend(point, self.root, &mut results);
        results
    }

    /// Remove the value stored under exactly `extent` that compares equal
    /// to `value`.  Returns true if an entry was removed.
    pub fn remove(&mut self, extent: &BoundingBox<K, N>, value: &V) -> bool
    where
        V: PartialEq,
    {
        let Some(target) = self.find_value_node(self.root, extent, value) else {
            return false;
        };
        let parent = match self.node(target).parent {
            Some(p) => p,
            None => unreachable!("value node without a parent directory"),
        };
        self.detach_child(parent, target);
        self.release(target);
        self.len -= 1;
        self.condense(parent);
        true
    }

    // ---- arena ------------------------------------------------------------

    fn alloc(&mut self, node: Node<K, V, N>) -> NodeId {
        match self.free.pop() {
            Some(id) => {
                self.nodes[id] = Some(node);
                id
            }
            None => {
                self.nodes.push(Some(node));
                self.nodes.len() - 1
            }
        }
    }

    fn release(&mut self, id: NodeId) {
        self.nodes[id] = None;
        self.free.push(id);
    }

    fn node(&self, id: NodeId) -> &Node<K, V, N> {
        match &self.nodes[id] {
            Some(node) => node,
            None => unreachable!("node {id} has been freed"),
        }
    }

    fn node_mut(&mut self, id: NodeId) -> &mut Node<K, V, N> {
        match &mut self.nodes[id] {
            Some(node) => node,
            None => unreachable!("node {id} has been freed"),
        }
    }

    fn children(&self, id: NodeId) -> &[NodeId] {
        match &self.node(id).kind {
            NodeKind::Leaf(c) | NodeKind::Branch(c) => c,
            NodeKind::Value(_) => unreachable!("value node {id} has no children"),
        }
    }

    fn children_mut(&mut self, id: NodeId) -> &mut Vec<NodeId> {
        match &mut self.node_mut(id).kind {
            NodeKind::Leaf(c) | NodeKind::Branch(c) => c,
            NodeKind::Value(_) => unreachable!("value node {id} has no children"),
        }
    }

    // ---- insertion --------------------------------------------------------

    /// Attach an orphan node (a value entry, or a directory during
    /// re-insertion) below the best directory and resolve any overflow.
    fn insert_node(&mut self, id: NodeId, allow_reinsert: bool) {
        let dest = self.choose_subtree(&self.node(id).bbox);
        self.attach_child(dest, id);
        if self.children(dest).len() > self.config.max_entries {
            self.handle_overflow(dest, allow_reinsert);
        }
    }

    /// Descend from the root to the leaf directory where a box should
    /// live.  Among children holding leaf directories, pick the least
    /// overlap-cost increase; otherwise the least area enlargement; ties
    /// fall to the smaller area.
    fn choose_subtree(&self, bbox: &BoundingBox<K, N>) -> NodeId {
        let mut current = self.root;
        loop {
            match &self.node(current).kind {
                NodeKind::Leaf(_) => return current,
                NodeKind::Branch(children) => {
                    let leaf_level = children
                        .iter()
                        .any(|&c| matches!(self.node(c).kind, NodeKind::Leaf(_)));

                    let mut best: Option<(NodeId, K, K, K)> = None;
                    for &child in children {
                        let child_box = &self.node(child).bbox;
                        let overlap = if leaf_level {
                            self.overlap_cost(bbox, child)
                        } else {
                            K::zero()
                        };
                        let enlargement = child_box.area_enlargement(bbox);
                        let area = child_box.area();
                        let better = match &best {
                            None => true,
                            Some((_, best_overlap, best_enlargement, best_area)) => {
                                if overlap != *best_overlap {
                                    overlap < *best_overlap
                                } else if enlargement != *best_enlargement {
                                    enlargement < *best_enlargement
                                } else {
                                    area < *best_area
                                }
                            }
                        };
                        if better {
                            best = Some((child, overlap, enlargement, area));
                        }
                    }
                    current = match best {
                        Some((id, ..)) => id,
                        None => unreachable!("branch directory with no children"),
                    };
                }
                NodeKind::Value(_) => unreachable!("descended into a value node"),
            }
        }
    }

    /// Total intersection volume between `bbox` and the children of the
    /// directory `dir`.
    fn overlap_cost(&self, bbox: &BoundingBox<K, N>, dir: NodeId) -> K {
        let mut cost = K::zero();
        for &child in self.children(dir) {
            cost = cost + BoundingBox::intersection(&self.node(child).bbox, bbox);
        }
        cost
    }

    /// Add `child` under `parent` and push the box enlargement up to the
    /// root.
    fn attach_child(&mut self, parent: NodeId, child: NodeId) {
        self.node_mut(child).parent = Some(parent);
        let child_box = self.node(child).bbox;
        let first = self.children(parent).is_empty();
        self.children_mut(parent).push(child);
        if first {
            self.node_mut(parent).bbox = child_box;
        } else {
            self.node_mut(parent).bbox.enlarge_to_fit(&child_box);
        }

        let mut current = self.node(parent).parent;
        while let Some(id) = current {
            self.node_mut(id).bbox.enlarge_to_fit(&child_box);
            current = self.node(id).parent;
        }
    }

    fn detach_child(&mut self, parent: NodeId, child: NodeId) {
        self.children_mut(parent).retain(|&c| c != child);
        self.node_mut(child).parent = None;
        self.recompute_boxes_upward(parent);
    }

    /// Recompute the box of `id` from its children, then each ancestor's.
    fn recompute_boxes_upward(&mut self, id: NodeId) {
        let mut current = Some(id);
        while let Some(node_id) = current {
            let children: Vec<NodeId> = self.children(node_id).to_vec();
            if let Some((&first, rest)) = children.split_first() {
                let mut bbox = self.node(first).bbox;
                for &child in rest {
                    bbox.enlarge_to_fit(&self.node(child).bbox);
                }
                self.node_mut(node_id).bbox = bbox;
            }
            current = self.node(node_id).parent;
        }
    }

    /// An overflown directory either re-inserts its outliers (once per
    /// insertion, leaf level only) or splits.
    fn handle_overflow(&mut self, id: NodeId, allow_reinsert: bool) {
        let is_leaf = matches!(self.node(id).kind, NodeKind::Leaf(_));
        if allow_reinsert && self.config.forced_reinsertion && is_leaf && id != self.root {
            self.reinsert_outliers(id);
        } else {
            self.split(id);
        }
    }

    /// Evict the ~30% of entries farthest from the directory's center and
    /// insert them again from the root.
    fn reinsert_outliers(&mut self, id: NodeId) {
        let node_box = self.node(id).bbox;
        let mut children: Vec<NodeId> = self.children(id).to_vec();
        children.sort_by(|&a, &b| {
            let da = BoundingBox::center_distance(&self.node(a).bbox, &node_box);
            let db = BoundingBox::center_distance(&self.node(b).bbox, &node_box);
            db.partial_cmp(&da).unwrap_or(std::cmp::Ordering::Equal)
        });

        let evict_count = (self.config.max_entries * 3 / 10).max(1);
        let evicted: Vec<NodeId> = children.drain(..evict_count).collect();
        *self.children_mut(id) = children;
        self.recompute_boxes_upward(id);

        for orphan in evicted {
            self.insert_node(orphan, false);
        }
    }

    /// R\*-style split: choose the axis with the least margin sum over all
    /// valid distributions, then the distribution with the least overlap
    /// between the two groups, ties by least total area.
    fn split(&mut self, id: NodeId) {
        let mut children: Vec<NodeId> = self.children_mut(id).drain(..).collect();
        let min = self.config.min_entries;
        let count = children.len();

        let mut best_axis = 0;
        let mut best_margin: Option<K> = None;
        for axis in 0..N {
            children.sort_by(|&a, &b| self.compare_along_axis(a, b, axis));
            let mut margin_sum = K::zero();
            for k in min..=count - min {
                let (g1, g2) = self.group_boxes(&children, k);
                margin_sum = margin_sum + g1.margin() + g2.margin();
            }
            let better = match best_margin {
                None => true,
                Some(best) => margin_sum < best,
            };
            if better {
                best_margin = Some(margin_sum);
                best_axis = axis;
            }
        }

        children.sort_by(|&a, &b| self.compare_along_axis(a, b, best_axis));
        let mut best_split = min;
        let mut best_cost: Option<(K, K)> = None;
        for k in min..=count - min {
            let (g1, g2) = self.group_boxes(&children, k);
            let overlap = BoundingBox::intersection(&g1, &g2);
            let area = g1.area() + g2.area();
            let better = match &best_cost {
                None => true,
                Some((best_overlap, best_area)) => {
                    if overlap != *best_overlap {
                        overlap < *best_overlap
                    } else {
                        area < *best_area
                    }
                }
            };
            if better {
                best_cost = Some((overlap, area));
                best_split = k;
            }
        }

        let second_half: Vec<NodeId> = children.split_off(best_split);
        let is_leaf = matches!(self.node(id).kind, NodeKind::Leaf(_));
        *self.children_mut(id) = children;
        self.recompute_boxes_upward(id);

        let sibling_kind = if is_leaf {
            NodeKind::Leaf(second_half.clone())
        } else {
            NodeKind::Branch(second_half.clone())
        };
        let mut sibling_box = self.node(second_half[0]).bbox;
        for &child in &second_half[1..] {
            sibling_box.enlarge_to_fit(&self.node(child).bbox);
        }
        let sibling = self.alloc(Node {
            parent: None,
            bbox: sibling_box,
            kind: sibling_kind,
        });
        for child in second_half {
            self.node_mut(child).parent = Some(sibling);
        }

        if id == self.root {
            // Grow the tree by one level.
            let new_root = self.alloc(Node {
                parent: None,
                bbox: BoundingBox::default(),
                kind: NodeKind::Branch(Vec::new()),
            });
            self.root = new_root;
            self.attach_child(new_root, id);
            self.attach_child(new_root, sibling);
        } else {
            let parent = match self.node(id).parent {
                Some(p) => p,
                None => unreachable!("non-root node without a parent"),
            };
            self.attach_child(parent, sibling);
            if self.children(parent).len() > self.config.max_entries {
                self.handle_overflow(parent, false);
            }
        }
    }

    fn compare_along_axis(&self, a: NodeId, b: NodeId, axis: usize) -> std::cmp::Ordering {
        let box_a = &self.node(a).bbox;
        let box_b = &self.node(b).bbox;
        box_a.start[axis]
            .partial_cmp(&box_b.start[axis])
            .unwrap_or(std::cmp::Ordering::Equal)
            .then(
                box_a.end[axis]
                    .partial_cmp(&box_b.end[axis])
                    .unwrap_or(std::cmp::Ordering::Equal),
            )
    }

    /// Enclosing boxes of `children[..k]` and `children[k..]`.
    fn group_boxes(&self, children: &[NodeId], k: usize) -> (BoundingBox<K, N>, BoundingBox<K, N>) {
        let mut g1 = self.node(children[0]).bbox;
        for &child in &children[1..k] {
            g1.enlarge_to_fit(&self.node(child).bbox);
        }
        let mut g2 = self.node(children[k]).bbox;
        for &child in &children[k + 1..] {
            g2.enlarge_to_fit(&self.node(child).bbox);
        }
        (g1, g2)
    }

    // ---- search and removal -----------------------------------------------

    fn search_descend<'a>(
        &'a self,
        point: &[K; N],
        id: NodeId,
        results: &mut Vec<SearchEntry<'a, K, V, N>>,
    ) {
        let node = self.node(id);
        if !node.bbox.contains(point) {
            return;
        }
        match &node.kind {
            NodeKind::Leaf(children) | NodeKind::Branch(children) => {
                for &child in children {
                    self.search_descend(point, child, results);
                }
            }
            NodeKind::Value(value) => {
                results.push(SearchEntry {
                    extent: node.bbox,
                    value,
                });
            }
        }
    }

    fn find_value_node(
        &self,
        id: NodeId,
        extent: &BoundingBox<K, N>,
        value: &V,
    ) -> Option<NodeId>
    where
        V: PartialEq,
    {
        let node = self.node(id);
        match &node.kind {
            NodeKind::Value(stored) => {
                (node.bbox == *extent && stored == value).then_some(id)
            }
            NodeKind::Leaf(children) | NodeKind::Branch(children) => {
                let mut probe = node.bbox;
                if !probe.enlarge_to_fit(extent) || id == self.root {
                    // Only directories whose box covers the extent can hold it.
                    for &child in children {
                        if let Some(found) = self.find_value_node(child, extent, value) {
                            return Some(found);
                        }
                    }
                }
                None
            }
        }
    }

    /// Walk from a shrunken directory to the root, dissolving underfull
    /// directories and re-inserting the values they carried.
    fn condense(&mut self, start: NodeId) {
        let mut orphaned_values = Vec::new();
        let mut current = Some(start);
        while let Some(id) = current {
            let parent = self.node(id).parent;
            let underfull = parent.is_some() && self.children(id).len() < self.config.min_entries;
            if underfull {
                let parent_id = match parent {
                    Some(p) => p,
                    None => unreachable!("underfull check excludes the root"),
                };
                self.detach_child(parent_id, id);
                self.collect_values(id, &mut orphaned_values);
            } else {
                self.recompute_boxes_upward(id);
            }
            current = parent;
        }

        // The root never dissolves, but a one-child branch root shrinks
        // the tree by a level.
        loop {
            let root = self.root;
            let single_child = match &self.node(root).kind {
                NodeKind::Branch(children) if children.len() == 1 => Some(children[0]),
                _ => None,
            };
            match single_child {
                Some(child) => {
                    self.node_mut(child).parent = None;
                    self.release(root);
                    self.root = child;
                }
                None => break,
            }
        }

        for orphan in orphaned_values {
            self.insert_node(orphan, false);
        }
    }

    /// Free the directory subtree under `id`, keeping the value nodes it
    /// carried for re-insertion.
    fn collect_values(&mut self, id: NodeId, out: &mut Vec<NodeId>) {
        match &self.node(id).kind {
            NodeKind::Value(_) => {
                out.push(id);
                return;
            }
            NodeKind::Leaf(_) | NodeKind::Branch(_) => {}
        }
        let children: Vec<NodeId> = self.children(id).to_vec();
        for child in children {
            self.collect_values(child, out);
        }
        self.release(id);
    }
}

impl<K: RTreeKey, V, const N: usize> Default for RTree<K, V, N> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bb(x1: i64, y1: i64, x2: i64, y2: i64) -> BoundingBox<i64, 2> {
        BoundingBox::new([x1, y1], [x2, y2])
    }

    /// Walk the whole tree checking fan-out bounds, parent links, and box
    /// containment; returns the number of reachable values.
    fn check_integrity(tree: &RTree<i64, i32, 2>) -> usize {
        fn walk(tree: &RTree<i64, i32, 2>, id: usize, is_root: bool) -> usize {
            let node = tree.node(id);
            match &node.kind {
                NodeKind::Value(_) => 1,
                NodeKind::Leaf(children) | NodeKind::Branch(children) => {
                    assert!(children.len() <= tree.config.max_entries);
                    if !is_root {
                        assert!(children.len() >= tree.config.min_entries);
                    }
                    let mut count = 0;
                    for &child in children {
                        let child_node = tree.node(child);
                        assert_eq!(child_node.parent, Some(id));
                        let mut parent_box = node.bbox;
                        assert!(!parent_box.enlarge_to_fit(&child_node.bbox));
                        count += walk(tree, child, false);
                    }
                    count
                }
            }
        }
        walk(tree, tree.root, true)
    }

    #[test]
    fn test_insert_and_point_search() {
        let mut tree: RTree<i64, i32, 2> = RTree::new();
        tree.insert(bb(0, 0, 10, 10), 1);
        tree.insert(bb(5, 5, 15, 15), 2);
        tree.insert(bb(20, 20, 30, 30), 3);
        assert_eq!(tree.len(), 3);

        let hits = tree.search(&[7, 7]);
        let mut values: Vec<i32> = hits.iter().map(|e| *e.value).collect();
        values.sort_unstable();
        assert_eq!(values, vec![1, 2]);

        let hits = tree.search(&[25, 25]);
        assert_eq!(hits.len(), 1);
        assert_eq!(*hits[0].value, 3);
        assert_eq!(hits[0].extent, bb(20, 20, 30, 30));

        assert!(tree.search(&[100, 100]).is_empty());
    }

    #[test]
    fn test_extent_grows_with_insertions() {
        let mut tree: RTree<i64, i32, 2> = RTree::new();
        tree.insert(bb(2, 2, 4, 4), 1);
        assert_eq!(tree.extent(), bb(2, 2, 4, 4));
        tree.insert(bb(0, 6, 8, 9), 2);
        assert_eq!(tree.extent(), bb(0, 2, 8, 9));
    }

    #[test]
    fn test_overflow_split_keeps_everything_findable() {
        let mut tree: RTree<i64, i32, 2> = RTree::new();
        for i in 0..100i64 {
            let x = (i % 10) * 10;
            let y = (i / 10) * 10;
            tree.insert(bb(x, y, x + 5, y + 5), i as i32);
        }
        assert_eq!(tree.len(), 100);
        check_integrity(&tree);

        for i in 0..100i64 {
            let x = (i % 10) * 10 + 2;
            let y = (i / 10) * 10 + 2;
            let hits = tree.search(&[x, y]);
            assert_eq!(hits.len(), 1, "probe for value {i}");
            assert_eq!(*hits[0].value, i as i32);
        }
    }

    #[test]
    fn test_overflow_without_forced_reinsertion() {
        let config = RTreeConfig {
            min_entries: 2,
            max_entries: 4,
            forced_reinsertion: false,
        };
        let mut tree: RTree<i64, i32, 2> = RTree::with_config(config).unwrap();
        for i in 0..40i64 {
            tree.insert(bb(i * 3, 0, i * 3 + 2, 2), i as i32);
        }
        assert_eq!(check_integrity(&tree), 40);
        let hits = tree.search(&[1, 1]);
        assert_eq!(hits.len(), 1);
    }

    #[test]
    fn test_remove_and_condense() {
        let mut tree: RTree<i64, i32, 2> = RTree::new();
        for i in 0..30i64 {
            tree.insert(bb(i * 4, i * 4, i * 4 + 3, i * 4 + 3), i as i32);
        }

        assert!(tree.remove(&bb(40, 40, 43, 43), &10));
        assert_eq!(tree.len(), 29);
        assert!(tree.search(&[41, 41]).is_empty());

        // Removing it again finds nothing.
        assert!(!tree.remove(&bb(40, 40, 43, 43), &10));

        // The rest survives the condensation.
        for i in (0..30i64).filter(|&i| i != 10) {
            let hits = tree.search(&[i * 4 + 1, i * 4 + 1]);
            assert_eq!(hits.len(), 1);
            assert_eq!(*hits[0].value, i as i32);
        }
        check_integrity(&tree);
    }

    #[test]
    fn test_remove_down_to_empty() {
        let mut tree: RTree<i64, i32, 2> = RTree::new();
        tree.insert(bb(0, 0, 1, 1), 1);
        tree.insert(bb(2, 2, 3, 3), 2);
        assert!(tree.remove(&bb(0, 0, 1, 1), &1));
        assert!(tree.remove(&bb(2, 2, 3, 3), &2));
        assert!(tree.is_empty());
        assert!(tree.search(&[0, 0]).is_empty());
    }

    #[test]
    fn test_bulk_load() {
        let items: Vec<(BoundingBox<i64, 2>, i32)> = (0..64i64)
            .map(|i| {
                let x = (i % 8) * 10;
                let y = (i / 8) * 10;
                (bb(x, y, x + 4, y + 4), i as i32)
            })
            .collect();
        let tree = RTree::bulk_load(items, RTreeConfig::default()).unwrap();
        assert_eq!(tree.len(), 64);

        for i in 0..64i64 {
            let x = (i % 8) * 10 + 1;
            let y = (i / 8) * 10 + 1;
            let hits = tree.search(&[x, y]);
            assert_eq!(hits.len(), 1);
            assert_eq!(*hits[0].value, i as i32);
        }

        let empty: RTree<i64, i32, 2> =
            RTree::bulk_load(Vec::new(), RTreeConfig::default()).unwrap();
        assert!(empty.is_empty());
    }

    #[test]
    fn test_float_keys_three_dimensions() {
        let mut tree: RTree<f64, &str, 3> = RTree::new();
        tree.insert(
            BoundingBox::new([0.0, 0.0, 0.0], [1.0, 1.0, 1.0]),
            "unit",
        );
        tree.insert(
            BoundingBox::new([0.5, 0.5, 0.5], [2.0, 2.0, 2.0]),
            "offset",
        );
        let hits = tree.search(&[0.75, 0.75, 0.75]);
        assert_eq!(hits.len(), 2);
        let hits = tree.search(&[1.5, 1.5, 1.5]);
        assert_eq!(hits.len(), 1);
        assert_eq!(*hits[0].value, "offset");
    }

    #[test]
    fn test_invalid_config() {
        let config = RTreeConfig {
            min_entries: 5,
            max_entries: 8,
            forced_reinsertion: false,
        };
        assert!(RTree::<i64, i32, 2>::with_config(config).is_err());
    }
}
