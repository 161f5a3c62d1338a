use nalgebra as na;
use serde_derive::{Deserialize, Serialize};
use std::marker::PhantomData;

pub trait BBoxFormat: std::fmt::Debug {}

/// Left-top-right-bottom format, contains left top and right bottom corners
#[derive(Serialize, Deserialize, Debug, Default, Copy, Clone, PartialEq)]
pub struct Ltrb;
impl BBoxFormat for Ltrb {}

/// X-y-width-height format, contains coordinates of the center of bbox and width-height
#[derive(Serialize, Deserialize, Debug, Default, Copy, Clone, PartialEq)]
pub struct Xywh;
impl BBoxFormat for Xywh {}

/// Box in source-frame pixels. Serialized as a bare `[f32; 4]`.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq)]
#[serde(transparent)]
pub struct BBox<F: BBoxFormat>([f32; 4], #[serde(skip)] PhantomData<F>);

impl<F: BBoxFormat> From<BBox<F>> for [f32; 4] {
    fn from(bbox: BBox<F>) -> Self {
        bbox.0
    }
}

impl<F: BBoxFormat> BBox<F> {
    #[inline]
    pub fn as_slice(&self) -> &[f32; 4] {
        &self.0
    }

    #[inline]
    pub fn is_finite(&self) -> bool {
        self.0.iter().all(|v| v.is_finite())
    }
}

impl BBox<Ltrb> {
    #[inline]
    pub fn ltrb(x1: f32, y1: f32, x2: f32, y2: f32) -> Self {
        BBox([x1, y1, x2, y2], PhantomData)
    }

    #[inline(always)]
    pub fn width(&self) -> f32 {
        self.0[2] - self.0[0]
    }

    #[inline(always)]
    pub fn height(&self) -> f32 {
        self.0[3] - self.0[1]
    }

    #[inline]
    pub fn area(&self) -> f32 {
        self.width().max(0.0) * self.height().max(0.0)
    }

    #[inline]
    pub fn center(&self) -> na::Point2<f32> {
        na::Point2::new(
            (self.0[0] + self.0[2]) * 0.5,
            (self.0[1] + self.0[3]) * 0.5,
        )
    }

    /// Non-finite corners or a box without positive width and height.
    #[inline]
    pub fn is_degenerate(&self) -> bool {
        !self.is_finite() || self.width() <= 0.0 || self.height() <= 0.0
    }

    #[inline]
    pub fn as_xywh(&self) -> BBox<Xywh> {
        self.into()
    }
}

impl BBox<Xywh> {
    #[inline]
    pub fn xywh(cx: f32, cy: f32, w: f32, h: f32) -> Self {
        BBox([cx, cy, w, h], PhantomData)
    }

    #[inline(always)]
    pub fn as_ltrb(&self) -> BBox<Ltrb> {
        self.into()
    }

    #[inline(always)]
    pub fn cx(&self) -> f32 {
        self.0[0]
    }

    #[inline(always)]
    pub fn cy(&self) -> f32 {
        self.0[1]
    }

    #[inline(always)]
    pub fn width(&self) -> f32 {
        self.0[2]
    }

    #[inline(always)]
    pub fn height(&self) -> f32 {
        self.0[3]
    }
}

impl<'a> From<&'a BBox<Ltrb>> for BBox<Xywh> {
    #[inline]
    fn from(v: &'a BBox<Ltrb>) -> Self {
        let c = v.center();

        Self([c.x, c.y, v.width(), v.height()], PhantomData)
    }
}

impl<'a> From<&'a BBox<Xywh>> for BBox<Ltrb> {
    #[inline]
    fn from(v: &'a BBox<Xywh>) -> Self {
        let w2 = v.0[2] / 2.0;
        let h2 = v.0[3] / 2.0;

        Self(
            [v.0[0] - w2, v.0[1] - h2, v.0[0] + w2, v.0[1] + h2],
            PhantomData,
        )
    }
}
