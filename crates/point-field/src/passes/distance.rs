//! Distance-based passes that need no fit.

use nalgebra::{Point2, Vector2};

use crate::config::PassDefaults;

use super::{Cloud, DrawingPass, FieldSample, NoParams, Parameterized};

/// Unsigned distance to the nearest point of the cloud.
#[derive(Debug, Clone, Default)]
pub struct DistanceFieldWithKdTree {
    params: NoParams,
}

impl DrawingPass for DistanceFieldWithKdTree {
    fn evaluate(&self, cloud: &Cloud<'_>, at: Point2<f32>) -> Option<FieldSample> {
        let nearest = cloud.tree().nearest(at)?;
        let source = cloud.point(nearest.index)?.pos();
        Some(radial_sample(at, source, 0.0))
    }
}

impl Parameterized for DistanceFieldWithKdTree {
    type Params = NoParams;

    fn from_defaults(_defaults: &PassDefaults) -> Self {
        Self::default()
    }

    fn params(&self) -> &NoParams {
        &self.params
    }

    fn params_mut(&mut self) -> &mut NoParams {
        &mut self.params
    }
}

/// Parameters of [`DistanceFieldFromOnePoint`].
#[derive(Debug, Clone, PartialEq)]
pub struct OnePointParams {
    /// Radius of the zero level set around the source point.
    pub scale: f32,
    /// Index of the source point in the store.
    pub source_index: usize,
}

/// Distance to one chosen point, offset by the scale: the zero level set is
/// the circle a local fit around that point would see.
#[derive(Debug, Clone)]
pub struct DistanceFieldFromOnePoint {
    params: OnePointParams,
    source: Option<Point2<f32>>,
}

impl DistanceFieldFromOnePoint {
    /// Source position captured by the last [`prepare`](DrawingPass::prepare).
    pub fn source(&self) -> Option<Point2<f32>> {
        self.source
    }
}

impl DrawingPass for DistanceFieldFromOnePoint {
    fn prepare(&mut self, cloud: &Cloud<'_>) {
        self.source = cloud.point(self.params.source_index).map(|p| p.pos());
        if self.source.is_none() && !cloud.is_empty() {
            log::warn!(
                "source index {} out of range for {} points",
                self.params.source_index,
                cloud.len()
            );
        }
    }

    fn evaluate(&self, _cloud: &Cloud<'_>, at: Point2<f32>) -> Option<FieldSample> {
        Some(radial_sample(at, self.source?, self.params.scale))
    }
}

impl Parameterized for DistanceFieldFromOnePoint {
    type Params = OnePointParams;

    fn from_defaults(defaults: &PassDefaults) -> Self {
        Self {
            params: OnePointParams {
                scale: defaults.scale,
                source_index: defaults.source_index,
            },
            source: None,
        }
    }

    fn params(&self) -> &OnePointParams {
        &self.params
    }

    fn params_mut(&mut self) -> &mut OnePointParams {
        &mut self.params
    }
}

/// `|at - source| - offset` and its gradient (zero at the source itself).
fn radial_sample(at: Point2<f32>, source: Point2<f32>, offset: f32) -> FieldSample {
    let d = at - source;
    let distance = d.norm();
    let gradient = if distance > f32::EPSILON {
        d / distance
    } else {
        Vector2::zeros()
    };
    FieldSample {
        potential: distance - offset,
        gradient,
    }
}
