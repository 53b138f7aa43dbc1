//! k-d tree container, construction and queries.

use std::cmp::Ordering;
use std::collections::BinaryHeap;

use nalgebra::Point2;

use crate::point::DataPoint;

use super::node::KdNode;
use super::selector::{AxisSelector, WidestSpread};
use super::visitor::{CollectingVisitor, NeighborVisitor};

/// A point returned by a query.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Neighbor {
    /// Index of the point in the store the tree was built from.
    pub index: usize,
    /// Squared Euclidean distance to the query location.
    pub distance_sq: f32,
}

impl Neighbor {
    #[inline]
    pub fn distance(&self) -> f32 {
        self.distance_sq.sqrt()
    }

    /// Orders by distance, then by index so equal distances are deterministic.
    pub fn cmp_by_distance(a: &Neighbor, b: &Neighbor) -> Ordering {
        a.distance_sq
            .total_cmp(&b.distance_sq)
            .then(a.index.cmp(&b.index))
    }
}

/// Max-heap entry: the worst candidate sits on top.
struct Candidate(Neighbor);

impl PartialEq for Candidate {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Candidate {}

impl PartialOrd for Candidate {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Candidate {
    fn cmp(&self, other: &Self) -> Ordering {
        Neighbor::cmp_by_distance(&self.0, &other.0)
    }
}

/// A k-d tree over 2D positions.
///
/// # Construction
///
/// Trees are built from a slice of points using an [`AxisSelector`] to choose
/// split axes; the median along that axis becomes the node:
///
/// ```ignore
/// let tree = KdTree::build(store.as_slice(), &WidestSpread);
/// ```
///
/// # Queries
///
/// [`k_nearest`](Self::k_nearest) and [`range`](Self::range) return
/// neighbors sorted by increasing distance. Every query is read-only and
/// answers for the points as they were when the tree was built.
#[derive(Debug, Clone, Default)]
pub struct KdTree {
    root: Option<KdNode>,
    len: usize,
}

impl KdTree {
    /// Creates an empty tree.
    pub fn new() -> Self {
        Self { root: None, len: 0 }
    }

    /// Builds a tree over the positions of `points`.
    ///
    /// Node indices are positions in `points`. Returns an empty tree if the
    /// input is empty.
    pub fn build<S: AxisSelector>(points: &[DataPoint], selector: &S) -> Self {
        let mut entries: Vec<(usize, Point2<f32>)> =
            points.iter().enumerate().map(|(i, p)| (i, p.pos())).collect();
        let mut scratch = Vec::with_capacity(entries.len());
        Self {
            root: build_node(&mut entries, 0, selector, &mut scratch),
            len: points.len(),
        }
    }

    /// Builds a tree using the default selector ([`WidestSpread`]).
    pub fn from_points(points: &[DataPoint]) -> Self {
        Self::build(points, &WidestSpread)
    }

    /// Drops every node.
    pub fn clear(&mut self) {
        self.root = None;
        self.len = 0;
    }

    /// Returns `true` if the tree holds no points.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.root.is_none()
    }

    /// Returns the number of indexed points.
    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    /// Returns a reference to the root node, if any.
    #[inline]
    pub fn root(&self) -> Option<&KdNode> {
        self.root.as_ref()
    }

    /// Returns the maximum depth of the tree (0 for empty tree).
    pub fn depth(&self) -> usize {
        self.root.as_ref().map_or(0, |n| n.depth())
    }

    /// Returns the closest point to `query`.
    pub fn nearest(&self, query: Point2<f32>) -> Option<Neighbor> {
        self.k_nearest(query, 1).into_iter().next()
    }

    /// Returns the `k` closest points to `query`, closest first.
    ///
    /// Returns every point when the tree holds fewer than `k`.
    pub fn k_nearest(&self, query: Point2<f32>, k: usize) -> Vec<Neighbor> {
        let k = k.min(self.len);
        if k == 0 {
            return Vec::new();
        }
        let mut heap = BinaryHeap::with_capacity(k + 1);
        if let Some(ref root) = self.root {
            k_nearest_node(root, &query, k, &mut heap);
        }
        let mut result: Vec<Neighbor> = heap.into_iter().map(|c| c.0).collect();
        result.sort_by(Neighbor::cmp_by_distance);
        result
    }

    /// Returns every point within `radius` of `query` (inclusive), closest first.
    pub fn range(&self, query: Point2<f32>, radius: f32) -> Vec<Neighbor> {
        let mut visitor = CollectingVisitor::new();
        self.visit_range(query, radius, &mut visitor);
        visitor.into_sorted()
    }

    /// Calls `visitor` for every point within `radius` of `query`, in
    /// traversal order.
    pub fn visit_range<V: NeighborVisitor>(
        &self,
        query: Point2<f32>,
        radius: f32,
        visitor: &mut V,
    ) {
        if radius < 0.0 || radius.is_nan() {
            return;
        }
        if let Some(ref root) = self.root {
            visit_range_node(root, &query, radius * radius, visitor);
        }
    }
}

/// Recursively builds the subtree over `entries`, reordering them in place.
fn build_node<S: AxisSelector>(
    entries: &mut [(usize, Point2<f32>)],
    depth: usize,
    selector: &S,
    scratch: &mut Vec<Point2<f32>>,
) -> Option<KdNode> {
    if entries.is_empty() {
        return None;
    }

    scratch.clear();
    scratch.extend(entries.iter().map(|e| e.1));
    let axis = selector.select(&scratch[..], depth);

    // Median split; ties broken by index so builds are reproducible
    let mid = entries.len() / 2;
    entries.select_nth_unstable_by(mid, |a, b| {
        axis.coord(&a.1)
            .total_cmp(&axis.coord(&b.1))
            .then(a.0.cmp(&b.0))
    });

    let (index, pos) = entries[mid];
    let (low, rest) = entries.split_at_mut(mid);
    let high = &mut rest[1..];

    let mut node = KdNode::new(index, pos, axis);
    node.set_low(build_node(low, depth + 1, selector, scratch));
    node.set_high(build_node(high, depth + 1, selector, scratch));
    Some(node)
}

fn k_nearest_node(node: &KdNode, query: &Point2<f32>, k: usize, heap: &mut BinaryHeap<Candidate>) {
    let candidate = Neighbor {
        index: node.index(),
        distance_sq: (node.pos() - query).norm_squared(),
    };
    if heap.len() < k {
        heap.push(Candidate(candidate));
    } else if let Some(worst) = heap.peek() {
        if Neighbor::cmp_by_distance(&candidate, &worst.0) == Ordering::Less {
            heap.pop();
            heap.push(Candidate(candidate));
        }
    }

    let (near, far, offset) = node.order_children(query);
    if let Some(near) = near {
        k_nearest_node(near, query, k, heap);
    }
    if let Some(far) = far {
        // The far side can only help if the splitting line is within reach
        let reachable = heap.len() < k
            || heap
                .peek()
                .is_some_and(|worst| offset * offset <= worst.0.distance_sq);
        if reachable {
            k_nearest_node(far, query, k, heap);
        }
    }
}

fn visit_range_node<V: NeighborVisitor>(
    node: &KdNode,
    query: &Point2<f32>,
    radius_sq: f32,
    visitor: &mut V,
) {
    let distance_sq = (node.pos() - query).norm_squared();
    if distance_sq <= radius_sq {
        visitor.visit(Neighbor {
            index: node.index(),
            distance_sq,
        });
    }

    let (near, far, offset) = node.order_children(query);
    if let Some(near) = near {
        visit_range_node(near, query, radius_sq, visitor);
    }
    if let Some(far) = far {
        if offset * offset <= radius_sq {
            visit_range_node(far, query, radius_sq, visitor);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kdtree::{Alternating, FnVisitor};

    fn grid(n: usize) -> Vec<DataPoint> {
        (0..n * n)
            .map(|i| DataPoint::at((i % n) as f32, (i / n) as f32 * 0.7))
            .collect()
    }

    fn brute_force(points: &[DataPoint], query: Point2<f32>) -> Vec<Neighbor> {
        let mut all: Vec<Neighbor> = points
            .iter()
            .enumerate()
            .map(|(index, p)| Neighbor {
                index,
                distance_sq: (p.pos() - query).norm_squared(),
            })
            .collect();
        all.sort_by(Neighbor::cmp_by_distance);
        all
    }

    #[test]
    fn empty_tree() {
        let tree = KdTree::new();
        assert!(tree.is_empty());
        assert_eq!(tree.len(), 0);
        assert_eq!(tree.depth(), 0);
        assert!(tree.nearest(Point2::origin()).is_none());
        assert!(tree.k_nearest(Point2::origin(), 3).is_empty());
        assert!(tree.range(Point2::origin(), 10.0).is_empty());
    }

    #[test]
    fn build_empty() {
        let tree = KdTree::from_points(&[]);
        assert!(tree.is_empty());
    }

    #[test]
    fn build_is_balanced() {
        let points = grid(8);
        let tree = KdTree::from_points(&points);
        assert_eq!(tree.len(), 64);
        assert_eq!(tree.root().map(KdNode::point_count), Some(64));
        // 64 points fit in 7 levels with median splits
        assert_eq!(tree.depth(), 7);
    }

    #[test]
    fn every_point_finds_itself_first() {
        let points = grid(6);
        let tree = KdTree::from_points(&points);
        for (i, p) in points.iter().enumerate() {
            let nearest = tree.k_nearest(p.pos(), 4);
            assert_eq!(nearest[0].index, i);
            assert_eq!(nearest[0].distance_sq, 0.0);
            assert!(nearest.windows(2).all(|w| w[0].distance_sq <= w[1].distance_sq));
        }
    }

    #[test]
    fn k_nearest_matches_brute_force() {
        let points = grid(7);
        for tree in [KdTree::from_points(&points), KdTree::build(&points, &Alternating)] {
            for query in [Point2::new(2.3, 1.1), Point2::new(-3.0, 9.0), Point2::new(6.0, 0.35)] {
                let expected: Vec<usize> =
                    brute_force(&points, query)[..5].iter().map(|n| n.index).collect();
                let found: Vec<usize> = tree.k_nearest(query, 5).iter().map(|n| n.index).collect();
                assert_eq!(found, expected);
            }
        }
    }

    #[test]
    fn k_larger_than_cloud_returns_everything() {
        let points = grid(2);
        let tree = KdTree::from_points(&points);
        assert_eq!(tree.k_nearest(Point2::new(0.5, 0.5), 10).len(), 4);
        assert!(tree.k_nearest(Point2::new(0.5, 0.5), 0).is_empty());
    }

    #[test]
    fn huge_k_is_clamped_to_cloud_size() {
        let points = vec![DataPoint::at(0.0, 0.0), DataPoint::at(1.0, 0.0)];
        let tree = KdTree::from_points(&points);
        let found = tree.k_nearest(Point2::new(0.0, 0.0), usize::MAX);
        assert_eq!(found.iter().map(|n| n.index).collect::<Vec<_>>(), vec![0, 1]);
        assert_eq!(tree.k_nearest(Point2::new(0.0, 0.0), 1 << 50).len(), 2);
        assert!(KdTree::new().k_nearest(Point2::new(0.0, 0.0), usize::MAX).is_empty());
    }

    #[test]
    fn duplicates_are_all_indexed() {
        let points = vec![DataPoint::at(1.0, 1.0); 5];
        let tree = KdTree::from_points(&points);
        let found = tree.range(Point2::new(1.0, 1.0), 0.0);
        let indices: Vec<usize> = found.iter().map(|n| n.index).collect();
        assert_eq!(indices, vec![0, 1, 2, 3, 4]);
    }

    #[test]
    fn range_matches_brute_force() {
        let points = grid(9);
        let tree = KdTree::from_points(&points);
        let query = Point2::new(4.2, 2.9);
        let radius: f32 = 1.6;

        let expected: Vec<usize> = brute_force(&points, query)
            .into_iter()
            .filter(|n| n.distance_sq <= radius * radius)
            .map(|n| n.index)
            .collect();
        let found: Vec<usize> = tree.range(query, radius).iter().map(|n| n.index).collect();
        assert_eq!(found, expected);
    }

    #[test]
    fn negative_radius_finds_nothing() {
        let tree = KdTree::from_points(&grid(3));
        assert!(tree.range(Point2::new(1.0, 1.0), -1.0).is_empty());
    }

    #[test]
    fn visit_range_with_closure() {
        let tree = KdTree::from_points(&grid(4));
        let mut count = 0;
        tree.visit_range(Point2::new(0.0, 0.0), 1.0, &mut FnVisitor::new(|_| count += 1));
        // (0,0), (1,0), (0,0.7)
        assert_eq!(count, 3);
    }

    #[test]
    fn clear_empties_tree() {
        let mut tree = KdTree::from_points(&grid(3));
        tree.clear();
        assert!(tree.is_empty());
        assert_eq!(tree.len(), 0);
    }
}
