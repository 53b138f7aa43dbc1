//! Fitting passes: algorithms turning neighborhood queries into scalar
//! fields that can be drawn.
//!
//! Every pass implements the uniform [`DrawingPass`] interface. Passes also
//! carry their own parameter type and result state, reachable with full type
//! information through [`PassRegistry::process_pass`] and a [`PassVisitor`].
//!
//! # Architecture
//!
//! - [`PassKind`]: the fixed name ↔ index catalog
//! - [`FittingPass`]: tagged union holding one concrete pass per kind
//! - [`PassRegistry`]: owns one instance of every pass
//! - [`FitKernel`]: local fitting strategy shared by the fit-based passes

mod catalog;
mod distance;
mod fields;
pub mod kernel;
mod registry;

use std::fmt::Debug;

use nalgebra::{Point2, Vector2};

use crate::config::PassDefaults;
use crate::kdtree::KdTree;
use crate::point::DataPoint;

pub use catalog::{PASS_COUNT, PassKind};
pub use distance::{DistanceFieldFromOnePoint, DistanceFieldWithKdTree, OnePointParams};
pub use fields::{BestFitField, MlsField, MlsParams, OneFitField, OneFitParams};
pub use kernel::{
    FitKernel, OrientedSphereFit, PlaneFit, SphereFit, UnorientedSphereFit, WeightedSample,
};
pub use registry::{FittingPass, PassRegistry, PassVisitor};

pub type PlaneFitField = MlsField<PlaneFit>;
pub type SphereFitField = MlsField<SphereFit>;
pub type OrientedSphereFitField = MlsField<OrientedSphereFit>;
pub type UnorientedSphereFitField = MlsField<UnorientedSphereFit>;
pub type BestPlaneFitField = BestFitField<PlaneFit>;
pub type BestSphereFitField = BestFitField<SphereFit>;
pub type BestOrientedSphereFitField = BestFitField<OrientedSphereFit>;
pub type OnePlaneFitField = OneFitField<PlaneFit>;
pub type OneSphereFitField = OneFitField<SphereFit>;
pub type OneOrientedSphereFitField = OneFitField<OrientedSphereFit>;

/// Read-only view of the cloud and its index, handed to passes.
#[derive(Debug, Clone, Copy)]
pub struct Cloud<'a> {
    points: &'a [DataPoint],
    tree: &'a KdTree,
}

impl<'a> Cloud<'a> {
    pub fn new(points: &'a [DataPoint], tree: &'a KdTree) -> Self {
        Self { points, tree }
    }

    #[inline]
    pub fn points(&self) -> &'a [DataPoint] {
        self.points
    }

    #[inline]
    pub fn tree(&self) -> &'a KdTree {
        self.tree
    }

    #[inline]
    pub fn point(&self, index: usize) -> Option<&'a DataPoint> {
        self.points.get(index)
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.points.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Points within `scale` of `center`, weighted by [`kernel::smooth_weight`].
    pub fn weighted_samples(&self, center: Point2<f32>, scale: f32) -> Vec<WeightedSample> {
        self.tree
            .range(center, scale)
            .into_iter()
            .filter_map(|n| {
                let p = self.points.get(n.index)?;
                Some(WeightedSample {
                    pos: p.pos(),
                    normal: p.normal(),
                    weight: kernel::smooth_weight(n.distance_sq, scale),
                })
            })
            .collect()
    }

    /// Every point with unit weight.
    pub fn uniform_samples(&self) -> Vec<WeightedSample> {
        self.points
            .iter()
            .map(|p| WeightedSample {
                pos: p.pos(),
                normal: p.normal(),
                weight: 1.0,
            })
            .collect()
    }
}

/// Value of a pass at one location.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FieldSample {
    /// Scalar field value; the fitted curve is its zero level set.
    pub potential: f32,
    pub gradient: Vector2<f32>,
}

/// Uniform interface shared by every pass.
pub trait DrawingPass {
    /// Refreshes state derived from the cloud. Called after every index
    /// rebuild and whenever parameters change.
    fn prepare(&mut self, _cloud: &Cloud<'_>) {}

    /// Evaluates the field at `at`; `None` where the pass has no fit.
    fn evaluate(&self, cloud: &Cloud<'_>, at: Point2<f32>) -> Option<FieldSample>;
}

/// Parameter set for passes without tunables.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct NoParams;

/// Typed parameters of a pass.
pub trait Parameterized: Sized {
    type Params: Debug + Clone;

    fn from_defaults(defaults: &PassDefaults) -> Self;

    fn params(&self) -> &Self::Params;

    fn params_mut(&mut self) -> &mut Self::Params;
}

/// A concrete pass type, bound to exactly one catalog entry.
///
/// Implemented only by the registry, next to the variant that stores the type.
pub trait ConcretePass: DrawingPass + Parameterized + Debug + 'static {
    const KIND: PassKind;
}

/// Row-major sampling lattice over an axis-aligned rectangle.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GridSpec {
    pub min: Point2<f32>,
    pub max: Point2<f32>,
    pub width: usize,
    pub height: usize,
}

impl GridSpec {
    /// Center of cell `(col, row)`.
    pub fn cell_center(&self, col: usize, row: usize) -> Point2<f32> {
        let cells = Vector2::new(self.width as f32, self.height as f32);
        let step = (self.max - self.min).component_div(&cells);
        Point2::new(
            self.min.x + (col as f32 + 0.5) * step.x,
            self.min.y + (row as f32 + 0.5) * step.y,
        )
    }
}

/// Samples the potential of `pass` at every cell center of `grid`.
pub fn sample_grid<P: DrawingPass + ?Sized>(
    pass: &P,
    cloud: &Cloud<'_>,
    grid: &GridSpec,
) -> Vec<Option<f32>> {
    let mut values = Vec::with_capacity(grid.width * grid.height);
    for row in 0..grid.height {
        for col in 0..grid.width {
            values.push(pass.evaluate(cloud, grid.cell_center(col, row)).map(|s| s.potential));
        }
    }
    values
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn weighted_samples_fall_off_with_distance() {
        let points = vec![
            DataPoint::at(0.0, 0.0),
            DataPoint::at(0.5, 0.0),
            DataPoint::at(2.0, 0.0),
        ];
        let tree = KdTree::from_points(&points);
        let cloud = Cloud::new(&points, &tree);

        let samples = cloud.weighted_samples(Point2::origin(), 1.0);
        assert_eq!(samples.len(), 2);
        assert_eq!(samples[0].weight, 1.0);
        assert_relative_eq!(samples[1].weight, 0.5625, epsilon = 1e-6);
    }

    #[test]
    fn grid_cell_centers() {
        let grid = GridSpec {
            min: Point2::new(0.0, 0.0),
            max: Point2::new(4.0, 2.0),
            width: 4,
            height: 2,
        };
        assert_eq!(grid.cell_center(0, 0), Point2::new(0.5, 0.5));
        assert_eq!(grid.cell_center(3, 1), Point2::new(3.5, 1.5));
    }

    #[test]
    fn sample_grid_is_row_major() {
        let points = vec![DataPoint::at(0.0, 0.0)];
        let tree = KdTree::from_points(&points);
        let cloud = Cloud::new(&points, &tree);
        let grid = GridSpec {
            min: Point2::new(-1.0, -1.0),
            max: Point2::new(3.0, 1.0),
            width: 2,
            height: 1,
        };

        let values = sample_grid(&DistanceFieldWithKdTree::default(), &cloud, &grid);
        assert_eq!(values.len(), 2);
        // cell centers (0, 0) and (2, 0)
        assert_relative_eq!(values[0].unwrap(), 0.0, epsilon = 1e-6);
        assert_relative_eq!(values[1].unwrap(), 2.0, epsilon = 1e-6);
    }
}
