//! Passes built on a [`FitKernel`]: local (MLS), global and single fits.

use nalgebra::Point2;

use crate::config::PassDefaults;

use super::kernel::FitKernel;
use super::{Cloud, DrawingPass, FieldSample, NoParams, Parameterized};

fn sample_of<K: FitKernel>(fit: &K, at: Point2<f32>) -> FieldSample {
    FieldSample {
        potential: fit.potential(at),
        gradient: fit.gradient(at),
    }
}

/// Parameters of [`MlsField`].
#[derive(Debug, Clone, PartialEq)]
pub struct MlsParams {
    /// Neighborhood radius.
    pub scale: f32,
    /// Number of fit-and-project steps; 0 behaves as 1.
    pub iterations: usize,
}

/// Moving least squares: a fresh fit around every query location.
///
/// The fit is computed around the query, the evaluation center is projected
/// onto it, and the fit is recomputed there, `iterations` times in total.
/// The returned potential is that of the last stable fit at the query.
#[derive(Debug, Clone)]
pub struct MlsField<K: FitKernel> {
    params: MlsParams,
    _kernel: std::marker::PhantomData<K>,
}

impl<K: FitKernel> MlsField<K> {
    /// Runs the fit-and-project loop and returns the final fit.
    pub fn fit_at(&self, cloud: &Cloud<'_>, at: Point2<f32>) -> Option<K> {
        let mut center = at;
        let mut last = None;
        for _ in 0..self.params.iterations.max(1) {
            let samples = cloud.weighted_samples(center, self.params.scale);
            let mut fit = K::default();
            if !fit.fit(&samples) {
                break;
            }
            center = fit.project(center);
            last = Some(fit);
        }
        last
    }
}

impl<K: FitKernel> DrawingPass for MlsField<K> {
    fn evaluate(&self, cloud: &Cloud<'_>, at: Point2<f32>) -> Option<FieldSample> {
        self.fit_at(cloud, at).map(|fit| sample_of(&fit, at))
    }
}

impl<K: FitKernel> Parameterized for MlsField<K> {
    type Params = MlsParams;

    fn from_defaults(defaults: &PassDefaults) -> Self {
        Self {
            params: MlsParams {
                scale: defaults.scale,
                iterations: defaults.mls_iterations,
            },
            _kernel: std::marker::PhantomData,
        }
    }

    fn params(&self) -> &MlsParams {
        &self.params
    }

    fn params_mut(&mut self) -> &mut MlsParams {
        &mut self.params
    }
}

/// One fit over the whole cloud with uniform weights, computed on prepare.
#[derive(Debug, Clone, Default)]
pub struct BestFitField<K: FitKernel> {
    params: NoParams,
    fit: Option<K>,
}

impl<K: FitKernel> BestFitField<K> {
    /// Fit computed by the last prepare, if it was stable.
    pub fn fit(&self) -> Option<&K> {
        self.fit.as_ref()
    }
}

impl<K: FitKernel> DrawingPass for BestFitField<K> {
    fn prepare(&mut self, cloud: &Cloud<'_>) {
        let samples = cloud.uniform_samples();
        let mut fit = K::default();
        self.fit = fit.fit(&samples).then_some(fit);
    }

    fn evaluate(&self, _cloud: &Cloud<'_>, at: Point2<f32>) -> Option<FieldSample> {
        self.fit.as_ref().map(|fit| sample_of(fit, at))
    }
}

impl<K: FitKernel> Parameterized for BestFitField<K> {
    type Params = NoParams;

    fn from_defaults(_defaults: &PassDefaults) -> Self {
        Self {
            params: NoParams,
            fit: None,
        }
    }

    fn params(&self) -> &NoParams {
        &self.params
    }

    fn params_mut(&mut self) -> &mut NoParams {
        &mut self.params
    }
}

/// Parameters of [`OneFitField`].
#[derive(Debug, Clone, PartialEq)]
pub struct OneFitParams {
    /// Neighborhood radius around the source point.
    pub scale: f32,
    /// Index of the point whose neighborhood is fitted.
    pub source_index: usize,
}

/// One fit over the neighborhood of a single point, computed on prepare and
/// extrapolated everywhere.
#[derive(Debug, Clone)]
pub struct OneFitField<K: FitKernel> {
    params: OneFitParams,
    fit: Option<K>,
}

impl<K: FitKernel> OneFitField<K> {
    /// Fit computed by the last prepare, if it was stable.
    pub fn fit(&self) -> Option<&K> {
        self.fit.as_ref()
    }
}

impl<K: FitKernel> DrawingPass for OneFitField<K> {
    fn prepare(&mut self, cloud: &Cloud<'_>) {
        self.fit = cloud.point(self.params.source_index).and_then(|source| {
            let samples = cloud.weighted_samples(source.pos(), self.params.scale);
            let mut fit = K::default();
            fit.fit(&samples).then_some(fit)
        });
    }

    fn evaluate(&self, _cloud: &Cloud<'_>, at: Point2<f32>) -> Option<FieldSample> {
        self.fit.as_ref().map(|fit| sample_of(fit, at))
    }
}

impl<K: FitKernel> Parameterized for OneFitField<K> {
    type Params = OneFitParams;

    fn from_defaults(defaults: &PassDefaults) -> Self {
        Self {
            params: OneFitParams {
                scale: defaults.scale,
                source_index: defaults.source_index,
            },
            fit: None,
        }
    }

    fn params(&self) -> &OneFitParams {
        &self.params
    }

    fn params_mut(&mut self) -> &mut OneFitParams {
        &mut self.params
    }
}
