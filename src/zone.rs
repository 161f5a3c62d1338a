use nalgebra as na;

use crate::config::Config;
use crate::error::Error;
use crate::math;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LineSegment {
    pub a: na::Point2<f32>,
    pub b: na::Point2<f32>,
}

impl LineSegment {
    #[inline]
    pub fn new(a: na::Point2<f32>, b: na::Point2<f32>) -> Self {
        Self { a, b }
    }

    /// Signed side of `p`: the cross product of `(b - a)` and `(p - a)`.
    #[inline]
    pub fn side(&self, p: &na::Point2<f32>) -> f32 {
        math::cross(&self.a, &self.b, p)
    }

    /// True when `p1` and `p2` lie strictly on opposite sides.
    #[inline]
    pub fn crossed(&self, p1: &na::Point2<f32>, p2: &na::Point2<f32>) -> bool {
        math::sign(self.side(p1)) * math::sign(self.side(p2)) < 0
    }
}

/// Static half-plane membership against a line and a reference point.
#[derive(Debug, Clone)]
pub struct ZoneClassifier {
    line: LineSegment,
    restricted_sign: i8,
}

impl ZoneClassifier {
    pub fn new(line: LineSegment, reference: na::Point2<f32>) -> Self {
        Self {
            restricted_sign: math::sign(line.side(&reference)),
            line,
        }
    }

    /// Built from `line` and `restricted_point`; both are required.
    pub fn from_config(config: &Config) -> Result<Self, Error> {
        let scenario = config.scenario;
        let (a, b) = config.line_points().ok_or(Error::MissingZoneSetting {
            scenario,
            field: "line",
        })?;
        let reference = config.restricted_point().ok_or(Error::MissingZoneSetting {
            scenario,
            field: "restricted_point",
        })?;

        Ok(Self::new(LineSegment::new(a, b), reference))
    }

    #[inline]
    pub fn line(&self) -> &LineSegment {
        &self.line
    }

    /// -1, 0 or 1. Zero means the reference point sits on the line and
    /// nothing is ever restricted.
    #[inline]
    pub fn restricted_sign(&self) -> i8 {
        self.restricted_sign
    }

    #[inline]
    pub fn is_restricted(&self, p: &na::Point2<f32>) -> bool {
        math::sign(self.line.side(p)) * self.restricted_sign > 0
    }
}
