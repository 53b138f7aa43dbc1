//! Visitor pattern for range traversal.
//!
//! Visitors let callers consume neighbors as the tree finds them, without
//! allocating a result list.

use super::tree::Neighbor;

/// Receives every point found by [`KdTree::visit_range`](super::KdTree::visit_range).
///
/// Neighbors arrive in traversal order, not sorted by distance.
pub trait NeighborVisitor {
    fn visit(&mut self, neighbor: Neighbor);
}

/// A visitor that collects all visited neighbors.
#[derive(Debug, Default)]
pub struct CollectingVisitor {
    collected: Vec<Neighbor>,
}

impl CollectingVisitor {
    /// Creates a new empty collecting visitor.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a reference to the collected neighbors.
    pub fn neighbors(&self) -> &[Neighbor] {
        &self.collected
    }

    /// Returns the collected neighbors sorted by increasing distance.
    pub fn into_sorted(mut self) -> Vec<Neighbor> {
        self.collected.sort_by(Neighbor::cmp_by_distance);
        self.collected
    }
}

impl NeighborVisitor for CollectingVisitor {
    fn visit(&mut self, neighbor: Neighbor) {
        self.collected.push(neighbor);
    }
}

/// A visitor that calls a closure for each neighbor.
pub struct FnVisitor<F>
where
    F: FnMut(Neighbor),
{
    func: F,
}

impl<F> FnVisitor<F>
where
    F: FnMut(Neighbor),
{
    /// Creates a new visitor from a closure.
    pub fn new(func: F) -> Self {
        Self { func }
    }
}

impl<F> NeighborVisitor for FnVisitor<F>
where
    F: FnMut(Neighbor),
{
    fn visit(&mut self, neighbor: Neighbor) {
        (self.func)(neighbor);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn neighbor(index: usize, distance_sq: f32) -> Neighbor {
        Neighbor { index, distance_sq }
    }

    #[test]
    fn collecting_visitor_empty() {
        let visitor = CollectingVisitor::new();
        assert!(visitor.neighbors().is_empty());
    }

    #[test]
    fn collecting_visitor_sorts_by_distance_then_index() {
        let mut visitor = CollectingVisitor::new();
        visitor.visit(neighbor(4, 2.0));
        visitor.visit(neighbor(3, 0.5));
        visitor.visit(neighbor(1, 2.0));

        let sorted = visitor.into_sorted();
        let order: Vec<usize> = sorted.iter().map(|n| n.index).collect();
        assert_eq!(order, vec![3, 1, 4]);
    }

    #[test]
    fn fn_visitor_calls_closure() {
        let mut total = 0;
        {
            let mut visitor = FnVisitor::new(|n: Neighbor| total += n.index);
            visitor.visit(neighbor(2, 0.0));
            visitor.visit(neighbor(5, 1.0));
        }
        assert_eq!(total, 7);
    }
}
