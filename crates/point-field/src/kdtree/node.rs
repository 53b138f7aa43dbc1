//! k-d tree node implementation.

use nalgebra::Point2;

use super::selector::Axis;

/// A node in the k-d tree.
///
/// Each node stores exactly one point of the cloud and splits the plane with
/// the line through that point perpendicular to `axis`. Points whose
/// coordinate along `axis` is smaller than or equal to the node's live in the
/// `low` subtree, the others in `high`. Equal coordinates may appear on both
/// sides after a median split, so searches must not assume strictness.
#[derive(Debug, Clone)]
pub struct KdNode {
    /// Index of the point in the store at build time.
    index: usize,

    /// Position of the point at build time.
    pos: Point2<f32>,

    /// Axis of the splitting line.
    axis: Axis,

    /// Subtree on the low side of the splitting line.
    low: Option<Box<KdNode>>,

    /// Subtree on the high side of the splitting line.
    high: Option<Box<KdNode>>,
}

impl KdNode {
    /// Creates a leaf node.
    pub fn new(index: usize, pos: Point2<f32>, axis: Axis) -> Self {
        Self {
            index,
            pos,
            axis,
            low: None,
            high: None,
        }
    }

    #[inline]
    pub fn index(&self) -> usize {
        self.index
    }

    #[inline]
    pub fn pos(&self) -> Point2<f32> {
        self.pos
    }

    #[inline]
    pub fn axis(&self) -> Axis {
        self.axis
    }

    /// Coordinate of the splitting line along [`axis`](Self::axis).
    #[inline]
    pub fn split_value(&self) -> f32 {
        self.axis.coord(&self.pos)
    }

    #[inline]
    pub fn low(&self) -> Option<&KdNode> {
        self.low.as_deref()
    }

    #[inline]
    pub fn high(&self) -> Option<&KdNode> {
        self.high.as_deref()
    }

    #[inline]
    pub fn set_low(&mut self, node: Option<KdNode>) {
        self.low = node.map(Box::new);
    }

    #[inline]
    pub fn set_high(&mut self, node: Option<KdNode>) {
        self.high = node.map(Box::new);
    }

    /// Checks if this node has any children.
    #[inline]
    pub fn is_leaf(&self) -> bool {
        self.low.is_none() && self.high.is_none()
    }

    /// Returns the (near, far) children for a query coordinate, with the
    /// signed offset of the query from the splitting line.
    pub(crate) fn order_children(
        &self,
        query: &Point2<f32>,
    ) -> (Option<&KdNode>, Option<&KdNode>, f32) {
        let offset = self.axis.coord(query) - self.split_value();
        if offset <= 0.0 {
            (self.low(), self.high(), offset)
        } else {
            (self.high(), self.low(), offset)
        }
    }

    /// Returns the number of points in this subtree.
    pub fn point_count(&self) -> usize {
        1 + self.low.as_ref().map_or(0, |n| n.point_count())
            + self.high.as_ref().map_or(0, |n| n.point_count())
    }

    /// Returns the depth of this subtree (1 for a leaf node).
    pub fn depth(&self) -> usize {
        let low_depth = self.low.as_ref().map_or(0, |n| n.depth());
        let high_depth = self.high.as_ref().map_or(0, |n| n.depth());
        1 + low_depth.max(high_depth)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_node_is_leaf() {
        let node = KdNode::new(0, Point2::new(1.0, 2.0), Axis::Y);
        assert!(node.is_leaf());
        assert_eq!(node.point_count(), 1);
        assert_eq!(node.depth(), 1);
        assert_eq!(node.split_value(), 2.0);
    }

    #[test]
    fn set_children_updates_leaf_status() {
        let mut node = KdNode::new(0, Point2::new(0.0, 0.0), Axis::X);
        node.set_low(Some(KdNode::new(1, Point2::new(-1.0, 0.0), Axis::Y)));
        assert!(!node.is_leaf());

        node.set_low(None);
        assert!(node.is_leaf());
    }

    #[test]
    fn depth_and_count() {
        let mut root = KdNode::new(0, Point2::new(0.0, 0.0), Axis::X);
        let mut low = KdNode::new(1, Point2::new(-1.0, 0.0), Axis::Y);
        low.set_high(Some(KdNode::new(2, Point2::new(-1.0, 1.0), Axis::X)));
        root.set_low(Some(low));
        root.set_high(Some(KdNode::new(3, Point2::new(1.0, 0.0), Axis::Y)));

        assert_eq!(root.depth(), 3);
        assert_eq!(root.point_count(), 4);
    }

    #[test]
    fn children_ordered_by_query_side() {
        let mut node = KdNode::new(0, Point2::new(0.0, 0.0), Axis::X);
        node.set_low(Some(KdNode::new(1, Point2::new(-1.0, 0.0), Axis::Y)));
        node.set_high(Some(KdNode::new(2, Point2::new(1.0, 0.0), Axis::Y)));

        let (near, far, offset) = node.order_children(&Point2::new(0.5, 3.0));
        assert_eq!(near.map(KdNode::index), Some(2));
        assert_eq!(far.map(KdNode::index), Some(1));
        assert_eq!(offset, 0.5);
    }
}
