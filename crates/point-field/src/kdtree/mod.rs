//! k-d tree over the positions of a point cloud.
//!
//! The tree is a snapshot: it is built from the store in one pass and never
//! updated incrementally. Queries answer for the points as they were at the
//! last build.
//!
//! # Example
//!
//! ```
//! use point_field::kdtree::KdTree;
//! use point_field::DataPoint;
//! use nalgebra::Point2;
//!
//! let points = vec![DataPoint::at(0.0, 0.0), DataPoint::at(1.0, 0.0), DataPoint::at(5.0, 5.0)];
//! let tree = KdTree::from_points(&points);
//!
//! let nearest = tree.k_nearest(Point2::new(0.9, 0.1), 2);
//! assert_eq!(nearest[0].index, 1);
//! assert_eq!(nearest[1].index, 0);
//! ```
//!
//! # Architecture
//!
//! - [`KdTree`]: the container holding the root node
//! - [`KdNode`]: one point per node plus the axis it splits on
//! - [`AxisSelector`]: strategy choosing the split axis
//! - [`NeighborVisitor`]: callback for range traversal

mod node;
mod selector;
mod tree;
mod visitor;

pub use node::KdNode;
pub use selector::{Alternating, Axis, AxisSelector, WidestSpread};
pub use tree::{KdTree, Neighbor};
pub use visitor::{CollectingVisitor, FnVisitor, NeighborVisitor};
