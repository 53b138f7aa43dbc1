//! Ordered, mutable point container.

use std::ops::{Deref, DerefMut};

use nalgebra::Point2;

use crate::error::RangeError;
use crate::point::DataPoint;

/// A closed scalar interval `[start, end]`.
///
/// `start > end` is allowed and describes a mirrored mapping.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Range {
    pub start: f32,
    pub end: f32,
}

impl Range {
    pub const fn new(start: f32, end: f32) -> Self {
        Self { start, end }
    }

    #[inline]
    pub fn span(&self) -> f32 {
        self.end - self.start
    }

    fn check_finite(&self) -> Result<(), RangeError> {
        if self.start.is_finite() && self.end.is_finite() {
            Ok(())
        } else {
            Err(RangeError::NonFinite)
        }
    }
}

impl From<(f32, f32)> for Range {
    fn from((start, end): (f32, f32)) -> Self {
        Self::new(start, end)
    }
}

/// The point collection, in insertion order.
///
/// A point's position in the store is its identity: the spatial index and
/// the single-point passes refer to points by this index. Mutating the store
/// never reindexes; callers batch their edits and rebuild once.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PointStore {
    points: Vec<DataPoint>,
}

impl PointStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Read access to the points.
    #[inline]
    pub fn as_slice(&self) -> &[DataPoint] {
        &self.points
    }

    /// Mutable access for batched edits.
    #[inline]
    pub fn as_mut_vec(&mut self) -> &mut Vec<DataPoint> {
        &mut self.points
    }

    /// Replaces the whole content.
    pub fn replace(&mut self, points: Vec<DataPoint>) {
        self.points = points;
    }

    /// Smallest interval holding every x and y coordinate, or `None` when empty.
    pub fn coordinate_range(&self) -> Option<Range> {
        let mut it = self.points.iter().flat_map(|p| [p.x(), p.y()]);
        let first = it.next()?;
        let (lo, hi) = it.fold((first, first), |(lo, hi), v| (lo.min(v), hi.max(v)));
        Some(Range::new(lo, hi))
    }

    /// Affinely maps both coordinates of every point from `source` to `target`.
    ///
    /// With `source == None` the source interval is [`coordinate_range`](Self::coordinate_range),
    /// so x and y share a scale and the cloud keeps its aspect ratio.
    /// Angles are left untouched. A zero-width source, or a mapping that would
    /// leave any coordinate non-finite, is rejected before any point moves.
    /// An empty store is a no-op.
    pub fn fit_to_range(&mut self, target: Range, source: Option<Range>) -> Result<(), RangeError> {
        target.check_finite()?;
        let source = match source.or_else(|| self.coordinate_range()) {
            Some(source) => source,
            None => return Ok(()),
        };
        source.check_finite()?;
        if source.span() == 0.0 {
            return Err(RangeError::Degenerate {
                start: source.start,
                end: source.end,
            });
        }

        let scale = target.span() / source.span();
        if !scale.is_finite() {
            return Err(RangeError::NonFinite);
        }
        let remap = |v: f32| target.start + (v - source.start) * scale;
        let remapped = self
            .points
            .iter()
            .map(|p| {
                let pos = Point2::new(remap(p.x()), remap(p.y()));
                if pos.x.is_finite() && pos.y.is_finite() {
                    Ok(pos)
                } else {
                    Err(RangeError::NonFinite)
                }
            })
            .collect::<Result<Vec<_>, _>>()?;
        for (p, pos) in self.points.iter_mut().zip(remapped) {
            p.set_pos(pos);
        }
        log::debug!(
            "remapped {} points from [{}, {}] to [{}, {}]",
            self.points.len(),
            source.start,
            source.end,
            target.start,
            target.end
        );
        Ok(())
    }
}

impl Deref for PointStore {
    type Target = [DataPoint];

    fn deref(&self) -> &[DataPoint] {
        &self.points
    }
}

impl DerefMut for PointStore {
    fn deref_mut(&mut self) -> &mut [DataPoint] {
        &mut self.points
    }
}

impl From<Vec<DataPoint>> for PointStore {
    fn from(points: Vec<DataPoint>) -> Self {
        Self { points }
    }
}

impl FromIterator<DataPoint> for PointStore {
    fn from_iter<I: IntoIterator<Item = DataPoint>>(iter: I) -> Self {
        Self {
            points: iter.into_iter().collect(),
        }
    }
}
