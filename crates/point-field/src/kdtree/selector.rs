//! Split-axis strategies for k-d tree construction.
//!
//! The axis choice affects how square the cells are and therefore how much
//! of the tree a query has to visit.

use nalgebra::Point2;

/// Coordinate axis a node splits on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Axis {
    X,
    Y,
}

impl Axis {
    /// Returns the coordinate of `p` along this axis.
    #[inline]
    pub fn coord(self, p: &Point2<f32>) -> f32 {
        match self {
            Axis::X => p.x,
            Axis::Y => p.y,
        }
    }

    #[inline]
    pub fn other(self) -> Axis {
        match self {
            Axis::X => Axis::Y,
            Axis::Y => Axis::X,
        }
    }
}

/// Strategy for choosing the split axis of a node.
pub trait AxisSelector {
    /// Selects the axis for a node holding `positions`, found at `depth`
    /// (0 for the root). `positions` is never empty.
    fn select(&self, positions: &[Point2<f32>], depth: usize) -> Axis;
}

/// Splits along the axis with the largest extent.
///
/// Keeps cells close to square on anisotropic clouds, such as points sampled
/// along a curve. Ties go to X.
#[derive(Debug, Clone, Copy, Default)]
pub struct WidestSpread;

impl AxisSelector for WidestSpread {
    fn select(&self, positions: &[Point2<f32>], _depth: usize) -> Axis {
        let mut min = positions[0];
        let mut max = positions[0];
        for p in &positions[1..] {
            min = min.inf(p);
            max = max.sup(p);
        }
        let extent = max - min;
        if extent.y > extent.x { Axis::Y } else { Axis::X }
    }
}

/// Cycles X, Y, X, ... with depth, the textbook k-d tree.
#[derive(Debug, Clone, Copy, Default)]
pub struct Alternating;

impl AxisSelector for Alternating {
    fn select(&self, _positions: &[Point2<f32>], depth: usize) -> Axis {
        if depth % 2 == 0 { Axis::X } else { Axis::Y }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn widest_spread_picks_long_axis() {
        let tall = [Point2::new(0.0, 0.0), Point2::new(1.0, 10.0)];
        let wide = [Point2::new(0.0, 0.0), Point2::new(10.0, 1.0)];
        assert_eq!(WidestSpread.select(&tall, 0), Axis::Y);
        assert_eq!(WidestSpread.select(&wide, 3), Axis::X);
    }

    #[test]
    fn widest_spread_single_point() {
        assert_eq!(WidestSpread.select(&[Point2::new(4.0, 2.0)], 0), Axis::X);
    }

    #[test]
    fn alternating_follows_depth() {
        let pts = [Point2::new(0.0, 0.0)];
        assert_eq!(Alternating.select(&pts, 0), Axis::X);
        assert_eq!(Alternating.select(&pts, 1), Axis::Y);
        assert_eq!(Alternating.select(&pts, 2), Axis::X);
    }

    #[test]
    fn axis_coord_and_other() {
        let p = Point2::new(3.0, -1.0);
        assert_eq!(Axis::X.coord(&p), 3.0);
        assert_eq!(Axis::Y.coord(&p), -1.0);
        assert_eq!(Axis::X.other(), Axis::Y);
    }
}
