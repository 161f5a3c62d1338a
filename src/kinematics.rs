use nalgebra as na;

use crate::config::{Config, TimeBase};
use crate::math;
use crate::track::Track;

/// Instantaneous speed from the last two samples, exponentially smoothed
/// together with the acceleration magnitude.
#[derive(Debug, Clone)]
pub struct KinematicEstimator {
    alpha: f32,
    frame_time: f32,
    time_base: TimeBase,
}

impl KinematicEstimator {
    pub fn new(alpha: f32, frame_time: f32, time_base: TimeBase) -> Self {
        Self {
            alpha,
            frame_time,
            time_base,
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(config.ema_alpha, config.frame_time(), config.time_base)
    }

    /// Updates the smoothed values in place and returns the instantaneous
    /// speed. Tracks with a single sample are left untouched.
    pub fn update(&self, track: &mut Track) -> f32 {
        let (prev, last) = match track.history.last_pair() {
            Some((prev, last)) => (*prev, *last),
            None => {
                track.instant_speed = 0.0;
                return 0.0;
            }
        };

        let dt = match self.time_base {
            TimeBase::FrameRate => self.frame_time,
            TimeBase::Timestamps => last.ts - prev.ts,
        };

        let dist = na::distance(&prev.pos, &last.pos);
        let speed = math::rate(dist, dt);

        if dist.is_finite() {
            track.distance_accum += dist;
        }

        track.prev_ema_speed = track.ema_speed;
        track.ema_speed = math::ema(self.alpha, speed, track.ema_speed);

        let accel = math::rate((track.ema_speed - track.prev_ema_speed).abs(), dt);
        track.ema_accel = math::ema(self.alpha, accel, track.ema_accel);

        track.instant_speed = speed;
        speed
    }
}
