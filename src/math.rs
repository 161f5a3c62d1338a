use nalgebra as na;
use num_traits::Float;

/// One exponential smoothing step: `alpha * sample + (1 - alpha) * prev`.
#[inline]
pub fn ema<F: Float>(alpha: F, sample: F, prev: F) -> F {
    alpha * sample + (F::one() - alpha) * prev
}

/// `delta / dt`, or zero when `dt` is not a usable interval.
#[inline]
pub fn rate<F: Float>(delta: F, dt: F) -> F {
    if dt.is_finite() && dt > F::zero() && delta.is_finite() {
        delta / dt
    } else {
        F::zero()
    }
}

/// 2D cross product of `(b - a)` and `(p - a)`.
#[inline]
pub fn cross<F>(a: &na::Point2<F>, b: &na::Point2<F>, p: &na::Point2<F>) -> F
where
    F: na::RealField + Float,
{
    (b.x - a.x) * (p.y - a.y) - (b.y - a.y) * (p.x - a.x)
}

/// Sign as -1, 0 or 1. NaN maps to 0.
#[inline]
pub fn sign<F: Float>(v: F) -> i8 {
    if v > F::zero() {
        1
    } else if v < F::zero() {
        -1
    } else {
        0
    }
}

/// Magnitude of the axis-aligned extent `(max - min)` of a point set.
pub fn extent<'a, I>(points: I) -> Option<f32>
where
    I: IntoIterator<Item = &'a na::Point2<f32>>,
{
    let mut iter = points.into_iter();
    let first = iter.next()?;

    let (min, max) = iter.fold((*first, *first), |(min, max), p| {
        (
            na::Point2::new(min.x.min(p.x), min.y.min(p.y)),
            na::Point2::new(max.x.max(p.x), max.y.max(p.y)),
        )
    });

    Some(na::distance(&min, &max))
}
