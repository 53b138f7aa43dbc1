//! Normal estimation by covariance line fitting.
//!
//! For every point, the k nearest neighbors (the point included) are
//! gathered from the spatial index. The eigenvector of the smallest
//! eigenvalue of their covariance matrix is perpendicular to the best-fit
//! line and becomes the point's normal.

use nalgebra::{Matrix2, Point2, Vector2};

use crate::kdtree::KdTree;
use crate::point::DataPoint;

/// Below this |cos| between old and new normal, the old orientation is
/// considered uninformative.
const ORIENTATION_EPSILON: f32 = 1e-3;

/// Weighted centroid and unit normal of the best-fit line through `samples`.
///
/// Returns `None` for fewer than two samples, a non-positive total weight or
/// a neighborhood collapsed onto a single location. The normal sign is
/// arbitrary.
pub(crate) fn fit_line<I>(samples: I) -> Option<(Point2<f32>, Vector2<f32>)>
where
    I: IntoIterator<Item = (Point2<f32>, f32)> + Clone,
{
    let mut count = 0usize;
    let mut weight_sum = 0.0f32;
    let mut weighted = Vector2::zeros();
    for (p, w) in samples.clone() {
        count += 1;
        weight_sum += w;
        weighted += p.coords * w;
    }
    if count < 2 || weight_sum <= f32::EPSILON {
        return None;
    }
    let centroid = Point2::from(weighted / weight_sum);

    let mut cov = Matrix2::zeros();
    for (p, w) in samples {
        let d = p - centroid;
        cov += d * d.transpose() * w;
    }
    cov /= weight_sum;

    let eigen = cov.symmetric_eigen();
    let (min_idx, max_idx) = if eigen.eigenvalues[0] <= eigen.eigenvalues[1] {
        (0, 1)
    } else {
        (1, 0)
    };
    if eigen.eigenvalues[max_idx] <= f32::EPSILON {
        return None;
    }
    let normal: Vector2<f32> = eigen.eigenvectors.column(min_idx).into_owned();
    Some((centroid, normal.normalize()))
}

/// Flips `normal` to agree with `previous`, or into the upper half-plane
/// when `previous` is perpendicular to it.
fn orient(normal: Vector2<f32>, previous: Vector2<f32>) -> Vector2<f32> {
    let agreement = normal.dot(&previous);
    if agreement < -ORIENTATION_EPSILON {
        return -normal;
    }
    if agreement > ORIENTATION_EPSILON {
        return normal;
    }
    if normal.y < 0.0 || (normal.y == 0.0 && normal.x < 0.0) {
        -normal
    } else {
        normal
    }
}

/// Re-estimates the normal angle of every point from its `k` nearest
/// neighbors in `tree`.
///
/// `tree` must have been built from `points` (positions unchanged since).
/// Neighborhoods that cannot define a line (a lone point, coincident points)
/// keep their angle. With fewer than `k` points the whole cloud is used.
/// Returns the number of points whose angle was recomputed.
pub fn compute_normals(points: &mut [DataPoint], tree: &KdTree, k: usize) -> usize {
    let k = if k == 0 {
        log::warn!("normal estimation needs at least one neighbor, using k = 1");
        1
    } else {
        k.min(points.len())
    };

    let mut updated = 0;
    let mut neighborhood = Vec::with_capacity(k);
    for i in 0..points.len() {
        neighborhood.clear();
        neighborhood.extend(
            tree.k_nearest(points[i].pos(), k)
                .iter()
                .filter_map(|n| points.get(n.index))
                .map(|p| (p.pos(), 1.0f32)),
        );

        if let Some((_, normal)) = fit_line(neighborhood.iter().copied()) {
            let normal = orient(normal, points[i].normal());
            points[i].set_angle(normal.y.atan2(normal.x));
            updated += 1;
        }
    }
    log::debug!("estimated {updated}/{} normals with k = {k}", points.len());
    updated
}
