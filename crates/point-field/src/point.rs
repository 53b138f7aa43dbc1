//! Oriented 2D sample representation.

use std::f32::consts::FRAC_PI_2;

use nalgebra::{Point2, Vector2};

/// Orientation given to points that carry no normal information: straight up.
pub const DEFAULT_POINT_ANGLE: f32 = FRAC_PI_2;

/// A point of the cloud: a position and the angle of its normal, in radians.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DataPoint {
    pos: Point2<f32>,
    angle: f32,
}

impl DataPoint {
    /// Creates a point from coordinates and a normal angle.
    pub fn new(x: f32, y: f32, angle: f32) -> Self {
        Self {
            pos: Point2::new(x, y),
            angle,
        }
    }

    /// Creates a point with [`DEFAULT_POINT_ANGLE`].
    pub fn at(x: f32, y: f32) -> Self {
        Self::new(x, y, DEFAULT_POINT_ANGLE)
    }

    #[inline]
    pub fn pos(&self) -> Point2<f32> {
        self.pos
    }

    #[inline]
    pub fn x(&self) -> f32 {
        self.pos.x
    }

    #[inline]
    pub fn y(&self) -> f32 {
        self.pos.y
    }

    /// Returns the normal angle in radians.
    #[inline]
    pub fn angle(&self) -> f32 {
        self.angle
    }

    #[inline]
    pub fn set_pos(&mut self, pos: Point2<f32>) {
        self.pos = pos;
    }

    #[inline]
    pub fn set_angle(&mut self, angle: f32) {
        self.angle = angle;
    }

    /// Returns the unit normal encoded by the angle.
    #[inline]
    pub fn normal(&self) -> Vector2<f32> {
        Vector2::new(self.angle.cos(), self.angle.sin())
    }

    /// Returns the unit tangent, the normal rotated a quarter turn clockwise.
    #[inline]
    pub fn tangent(&self) -> Vector2<f32> {
        let n = self.normal();
        Vector2::new(n.y, -n.x)
    }
}

impl From<[f32; 3]> for DataPoint {
    fn from([x, y, angle]: [f32; 3]) -> Self {
        Self::new(x, y, angle)
    }
}

impl From<DataPoint> for [f32; 3] {
    fn from(p: DataPoint) -> Self {
        [p.x(), p.y(), p.angle()]
    }
}
