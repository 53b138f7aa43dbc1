//! Local fitting kernels consumed by the MLS, best-fit and one-fit passes.
//!
//! A kernel turns a set of weighted, oriented samples into an implicit
//! scalar field whose zero level set approximates the sampled curve. Fields
//! are normalized so that the potential approximates the signed distance
//! near the curve, positive on the side the sample normals point to.

use std::fmt::Debug;

use nalgebra::{Matrix4, Point2, Vector2, Vector4};

use crate::normals::fit_line;

/// A neighbor prepared for fitting.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WeightedSample {
    pub pos: Point2<f32>,
    pub normal: Vector2<f32>,
    pub weight: f32,
}

/// Smooth compact weight `(1 - d²/h²)²`, zero from distance `h` on.
#[inline]
pub fn smooth_weight(distance_sq: f32, scale: f32) -> f32 {
    let h_sq = scale * scale;
    if distance_sq >= h_sq {
        return 0.0;
    }
    let t = 1.0 - distance_sq / h_sq;
    t * t
}

/// Strategy computing an implicit fit from weighted samples.
pub trait FitKernel: Debug + Clone + Default + 'static {
    /// Fewest samples with non-zero weight needed for a stable fit.
    const MIN_SAMPLES: usize;

    /// Replaces the current fit. Returns whether the new fit is stable;
    /// an unstable kernel must not be evaluated.
    fn fit(&mut self, samples: &[WeightedSample]) -> bool;

    fn is_stable(&self) -> bool;

    /// Approximate signed distance from `q` to the fitted curve.
    fn potential(&self, q: Point2<f32>) -> f32;

    /// Gradient of [`potential`](Self::potential) at `q`.
    fn gradient(&self, q: Point2<f32>) -> Vector2<f32>;

    /// Moves `q` one Newton step towards the fitted curve.
    fn project(&self, q: Point2<f32>) -> Point2<f32> {
        let g = self.gradient(q);
        let g_sq = g.norm_squared();
        if g_sq <= f32::EPSILON {
            return q;
        }
        q - g * (self.potential(q) / g_sq)
    }
}

fn effective_samples(samples: &[WeightedSample]) -> usize {
    samples.iter().filter(|s| s.weight > 0.0).count()
}

fn weighted_mean_normal(samples: &[WeightedSample]) -> Vector2<f32> {
    samples.iter().map(|s| s.normal * s.weight).sum()
}

/// Straight line through the weighted centroid, normal from the covariance.
#[derive(Debug, Clone, Default)]
pub struct PlaneFit {
    origin: Point2<f32>,
    normal: Vector2<f32>,
    stable: bool,
}

impl PlaneFit {
    /// A point on the fitted line.
    pub fn origin(&self) -> Point2<f32> {
        self.origin
    }

    /// Unit normal of the fitted line.
    pub fn normal(&self) -> Vector2<f32> {
        self.normal
    }
}

impl FitKernel for PlaneFit {
    const MIN_SAMPLES: usize = 2;

    fn fit(&mut self, samples: &[WeightedSample]) -> bool {
        self.stable = false;
        if effective_samples(samples) < Self::MIN_SAMPLES {
            return false;
        }
        let Some((origin, normal)) = fit_line(samples.iter().map(|s| (s.pos, s.weight))) else {
            return false;
        };
        let normal = if normal.dot(&weighted_mean_normal(samples)) < 0.0 {
            -normal
        } else {
            normal
        };
        self.origin = origin;
        self.normal = normal;
        self.stable = true;
        true
    }

    fn is_stable(&self) -> bool {
        self.stable
    }

    fn potential(&self, q: Point2<f32>) -> f32 {
        self.normal.dot(&(q - self.origin))
    }

    fn gradient(&self, _q: Point2<f32>) -> Vector2<f32> {
        self.normal
    }
}

/// Algebraic circle `uc + ul·x + uq·|x|² = 0` expressed around a local
/// basis center, Pratt-normalized (`|ul|² - 4·uc·uq = 1`).
#[derive(Debug, Clone, Default)]
struct AlgebraicCircle {
    basis: Point2<f32>,
    uc: f32,
    ul: Vector2<f32>,
    uq: f32,
}

impl AlgebraicCircle {
    fn potential(&self, q: Point2<f32>) -> f32 {
        let x = q - self.basis;
        self.uc + self.ul.dot(&x) + self.uq * x.norm_squared()
    }

    fn gradient(&self, q: Point2<f32>) -> Vector2<f32> {
        let x = q - self.basis;
        self.ul + x * (2.0 * self.uq)
    }

    /// Rescales to the Pratt norm. Fails for imaginary circles.
    fn normalize(&mut self) -> bool {
        let pratt = self.ul.norm_squared() - 4.0 * self.uc * self.uq;
        if pratt.is_nan() || pratt <= f32::EPSILON {
            return false;
        }
        let inv = pratt.sqrt().recip();
        self.uc *= inv;
        self.ul *= inv;
        self.uq *= inv;
        true
    }

    /// Flips the field so its gradient agrees with the sample normals.
    fn orient(&mut self, samples: &[WeightedSample]) {
        let agreement: f32 = samples
            .iter()
            .map(|s| self.gradient(s.pos).dot(&s.normal) * s.weight)
            .sum();
        if agreement < 0.0 {
            self.uc = -self.uc;
            self.ul = -self.ul;
            self.uq = -self.uq;
        }
    }

    fn center(&self) -> Option<Point2<f32>> {
        if self.uq.abs() <= f32::EPSILON {
            return None;
        }
        Some(self.basis - self.ul / (2.0 * self.uq))
    }

    fn radius(&self) -> Option<f32> {
        if self.uq.abs() <= f32::EPSILON {
            return None;
        }
        // Pratt-normalized: r = 1 / (2|uq|)
        Some(1.0 / (2.0 * self.uq.abs()))
    }
}

/// Circle fitted to positions only, as the smallest eigenvector of the
/// weighted algebraic design matrix.
#[derive(Debug, Clone, Default)]
pub struct SphereFit {
    circle: AlgebraicCircle,
    stable: bool,
}

impl SphereFit {
    /// Center of the fitted circle, `None` when the fit is a line.
    pub fn center(&self) -> Option<Point2<f32>> {
        self.circle.center()
    }

    /// Radius of the fitted circle, `None` when the fit is a line.
    pub fn radius(&self) -> Option<f32> {
        self.circle.radius()
    }
}

impl FitKernel for SphereFit {
    const MIN_SAMPLES: usize = 3;

    fn fit(&mut self, samples: &[WeightedSample]) -> bool {
        self.stable = false;
        if effective_samples(samples) < Self::MIN_SAMPLES {
            return false;
        }
        let weight_sum: f32 = samples.iter().map(|s| s.weight).sum();
        let weighted: Vector2<f32> = samples.iter().map(|s| s.pos.coords * s.weight).sum();
        let basis = Point2::from(weighted / weight_sum);

        // Conditioning: solve in a frame scaled to unit RMS spread
        let spread = (samples
            .iter()
            .map(|s| (s.pos - basis).norm_squared() * s.weight)
            .sum::<f32>()
            / weight_sum)
            .sqrt();
        if spread <= f32::EPSILON {
            return false;
        }

        let mut design = Matrix4::zeros();
        for s in samples {
            let x = (s.pos - basis) / spread;
            let row = Vector4::new(1.0, x.x, x.y, x.norm_squared());
            design += row * row.transpose() * s.weight;
        }
        let eigen = design.symmetric_eigen();
        let min_idx = eigen.eigenvalues.imin();
        let u = eigen.eigenvectors.column(min_idx);

        // Back to world units: x_local = (q - basis) / spread
        let mut circle = AlgebraicCircle {
            basis,
            uc: u[0],
            ul: Vector2::new(u[1], u[2]) / spread,
            uq: u[3] / (spread * spread),
        };
        if !circle.normalize() {
            return false;
        }
        circle.orient(samples);
        self.circle = circle;
        self.stable = true;
        true
    }

    fn is_stable(&self) -> bool {
        self.stable
    }

    fn potential(&self, q: Point2<f32>) -> f32 {
        self.circle.potential(q)
    }

    fn gradient(&self, q: Point2<f32>) -> Vector2<f32> {
        self.circle.gradient(q)
    }
}

/// Circle fitted to positions and normals in closed form.
///
/// The quadratic term comes from how normals vary with position; the
/// linear and constant terms then match the mean normal and mean position.
#[derive(Debug, Clone, Default)]
pub struct OrientedSphereFit {
    circle: AlgebraicCircle,
    stable: bool,
}

impl OrientedSphereFit {
    pub fn center(&self) -> Option<Point2<f32>> {
        self.circle.center()
    }

    pub fn radius(&self) -> Option<f32> {
        self.circle.radius()
    }

    /// Algebraic coefficients `(uc, ul, uq)` relative to the fit's basis center.
    pub fn coefficients(&self) -> (f32, Vector2<f32>, f32) {
        (self.circle.uc, self.circle.ul, self.circle.uq)
    }

    fn fit_with_normals<I>(&mut self, samples: I) -> bool
    where
        I: Iterator<Item = WeightedSample> + Clone,
    {
        self.stable = false;
        let weight_sum: f32 = samples.clone().map(|s| s.weight).sum();
        if weight_sum <= f32::EPSILON {
            return false;
        }
        let weighted: Vector2<f32> = samples.clone().map(|s| s.pos.coords * s.weight).sum();
        let basis = Point2::from(weighted / weight_sum);

        let mut sum_p = Vector2::zeros();
        let mut sum_n = Vector2::zeros();
        let mut sum_dot_pn = 0.0f32;
        let mut sum_dot_pp = 0.0f32;
        for s in samples {
            let p = s.pos - basis;
            sum_p += p * s.weight;
            sum_n += s.normal * s.weight;
            sum_dot_pn += s.weight * p.dot(&s.normal);
            sum_dot_pp += s.weight * p.norm_squared();
        }

        let inv_w = weight_sum.recip();
        let numerator = sum_dot_pn - inv_w * sum_p.dot(&sum_n);
        let denominator = sum_dot_pp - inv_w * sum_p.dot(&sum_p);
        let uq = if denominator.abs() > f32::EPSILON {
            0.5 * numerator / denominator
        } else {
            0.0
        };
        let ul = (sum_n - sum_p * (2.0 * uq)) * inv_w;
        let uc = -inv_w * (ul.dot(&sum_p) + uq * sum_dot_pp);

        let mut circle = AlgebraicCircle { basis, uc, ul, uq };
        if !circle.normalize() {
            return false;
        }
        self.circle = circle;
        self.stable = true;
        true
    }
}

impl FitKernel for OrientedSphereFit {
    const MIN_SAMPLES: usize = 2;

    fn fit(&mut self, samples: &[WeightedSample]) -> bool {
        if effective_samples(samples) < Self::MIN_SAMPLES {
            self.stable = false;
            return false;
        }
        self.fit_with_normals(samples.iter().copied())
    }

    fn is_stable(&self) -> bool {
        self.stable
    }

    fn potential(&self, q: Point2<f32>) -> f32 {
        self.circle.potential(q)
    }

    fn gradient(&self, q: Point2<f32>) -> Vector2<f32> {
        self.circle.gradient(q)
    }
}

/// Oriented circle fit that tolerates inconsistently signed normals.
///
/// Normals are first flipped to agree with the dominant normal direction of
/// the neighborhood, then fitted like [`OrientedSphereFit`].
#[derive(Debug, Clone, Default)]
pub struct UnorientedSphereFit {
    inner: OrientedSphereFit,
}

impl UnorientedSphereFit {
    pub fn center(&self) -> Option<Point2<f32>> {
        self.inner.center()
    }

    pub fn radius(&self) -> Option<f32> {
        self.inner.radius()
    }
}

/// Unit axis maximizing `Σ w (n·d)²`, sign chosen to agree with the first
/// weighted normal.
fn dominant_axis(samples: &[WeightedSample]) -> Option<Vector2<f32>> {
    let mut tensor = nalgebra::Matrix2::zeros();
    for s in samples {
        tensor += s.normal * s.normal.transpose() * s.weight;
    }
    let eigen = tensor.symmetric_eigen();
    let axis: Vector2<f32> = eigen.eigenvectors.column(eigen.eigenvalues.imax()).into_owned();
    if axis.norm_squared() <= f32::EPSILON {
        return None;
    }
    let reference = samples.iter().find(|s| s.weight > 0.0)?.normal;
    Some(if axis.dot(&reference) < 0.0 { -axis } else { axis })
}

impl FitKernel for UnorientedSphereFit {
    const MIN_SAMPLES: usize = 2;

    fn fit(&mut self, samples: &[WeightedSample]) -> bool {
        if effective_samples(samples) < Self::MIN_SAMPLES {
            self.inner.stable = false;
            return false;
        }
        let Some(axis) = dominant_axis(samples) else {
            self.inner.stable = false;
            return false;
        };
        self.inner.fit_with_normals(samples.iter().map(move |s| WeightedSample {
            normal: if s.normal.dot(&axis) < 0.0 { -s.normal } else { s.normal },
            ..*s
        }))
    }

    fn is_stable(&self) -> bool {
        self.inner.is_stable()
    }

    fn potential(&self, q: Point2<f32>) -> f32 {
        self.inner.potential(q)
    }

    fn gradient(&self, q: Point2<f32>) -> Vector2<f32> {
        self.inner.gradient(q)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use std::f32::consts::PI;

    /// Samples on a circle with outward normals, uniform weights.
    fn circle_samples(
        center: Point2<f32>,
        radius: f32,
        count: usize,
        arc: f32,
    ) -> Vec<WeightedSample> {
        (0..count)
            .map(|i| {
                let t = arc * i as f32 / count as f32;
                let n = Vector2::new(t.cos(), t.sin());
                WeightedSample {
                    pos: center + n * radius,
                    normal: n,
                    weight: 1.0,
                }
            })
            .collect()
    }

    fn line_samples() -> Vec<WeightedSample> {
        (0..5)
            .map(|i| WeightedSample {
                pos: Point2::new(i as f32, 1.0),
                normal: Vector2::new(0.0, 1.0),
                weight: 1.0,
            })
            .collect()
    }

    #[test]
    fn smooth_weight_profile() {
        assert_eq!(smooth_weight(0.0, 2.0), 1.0);
        assert_relative_eq!(smooth_weight(1.0, 2.0), 0.5625, epsilon = 1e-6);
        assert_eq!(smooth_weight(4.0, 2.0), 0.0);
        assert_eq!(smooth_weight(9.0, 2.0), 0.0);
    }

    #[test]
    fn plane_fit_on_horizontal_line() {
        let mut fit = PlaneFit::default();
        assert!(fit.fit(&line_samples()));
        assert_relative_eq!(fit.potential(Point2::new(10.0, 3.0)), 2.0, epsilon = 1e-5);
        assert_relative_eq!(fit.potential(Point2::new(-4.0, 0.0)), -1.0, epsilon = 1e-5);
        let projected = fit.project(Point2::new(2.5, 7.0));
        assert_relative_eq!(projected.y, 1.0, epsilon = 1e-5);
        assert_relative_eq!(fit.normal().y, 1.0, epsilon = 1e-5);
    }

    #[test]
    fn plane_fit_needs_two_weighted_samples() {
        let mut samples = line_samples();
        for s in &mut samples[1..] {
            s.weight = 0.0;
        }
        let mut fit = PlaneFit::default();
        assert!(!fit.fit(&samples));
        assert!(!fit.is_stable());
    }

    #[test]
    fn sphere_fit_recovers_circle() {
        let center = Point2::new(1.0, -2.0);
        let mut fit = SphereFit::default();
        assert!(fit.fit(&circle_samples(center, 3.0, 24, 2.0 * PI)));

        let c = fit.center().unwrap();
        assert_relative_eq!(c.x, 1.0, epsilon = 1e-3);
        assert_relative_eq!(c.y, -2.0, epsilon = 1e-3);
        assert_relative_eq!(fit.radius().unwrap(), 3.0, epsilon = 1e-3);
        // outside is positive, like the normals
        assert_relative_eq!(fit.potential(Point2::new(4.0, -2.0)), 0.0, epsilon = 1e-3);
        assert!(fit.potential(Point2::new(5.0, -2.0)) > 0.0);
        assert!(fit.potential(center) < 0.0);
    }

    #[test]
    fn sphere_fit_on_collinear_points_is_a_line() {
        let mut fit = SphereFit::default();
        assert!(fit.fit(&line_samples()));
        assert!(fit.radius().is_none_or(|r| r > 1e3));
        assert_relative_eq!(fit.potential(Point2::new(0.0, 3.0)), 2.0, epsilon = 1e-3);
    }

    #[test]
    fn oriented_sphere_fit_recovers_partial_arc() {
        let center = Point2::new(-1.0, 0.5);
        let mut fit = OrientedSphereFit::default();
        assert!(fit.fit(&circle_samples(center, 2.0, 10, PI / 2.0)));

        let c = fit.center().unwrap();
        assert_relative_eq!(c.x, -1.0, epsilon = 1e-3);
        assert_relative_eq!(c.y, 0.5, epsilon = 1e-3);
        assert_relative_eq!(fit.radius().unwrap(), 2.0, epsilon = 1e-3);
        assert!(fit.potential(center) < 0.0);
    }

    #[test]
    fn oriented_sphere_fit_on_line_is_flat() {
        let mut fit = OrientedSphereFit::default();
        assert!(fit.fit(&line_samples()));
        let (_, ul, uq) = fit.coefficients();
        assert_relative_eq!(uq, 0.0, epsilon = 1e-6);
        assert_relative_eq!(ul.y, 1.0, epsilon = 1e-5);
        assert_relative_eq!(fit.potential(Point2::new(3.0, 0.0)), -1.0, epsilon = 1e-5);
    }

    #[test]
    fn unoriented_fit_ignores_flipped_normals() {
        let center = Point2::new(0.0, 0.0);
        let mut samples = circle_samples(center, 1.5, 8, PI / 3.0);
        for s in samples.iter_mut().skip(1).step_by(2) {
            s.normal = -s.normal;
        }

        let mut fit = UnorientedSphereFit::default();
        assert!(fit.fit(&samples));
        assert_relative_eq!(fit.radius().unwrap(), 1.5, epsilon = 1e-2);
        assert!(fit.potential(Point2::new(3.0, 0.0)) > 0.0);
    }

    #[test]
    fn project_converges_onto_circle() {
        let mut fit = OrientedSphereFit::default();
        assert!(fit.fit(&circle_samples(Point2::origin(), 1.0, 16, 2.0 * PI)));
        let mut q = Point2::new(2.0, 0.3);
        for _ in 0..8 {
            q = fit.project(q);
        }
        assert_relative_eq!(q.coords.norm(), 1.0, epsilon = 1e-4);
    }
}
