//! Running and loitering detection.
//!
//! Running is a three state machine (IDLE -> POSSIBLE -> RUNNING -> IDLE)
//! over the smoothed speed and acceleration: a track has to stay fast and
//! accelerating for `possible_frames` consecutive frames and cover
//! `min_distance` pixels before it is confirmed, and drops back once the
//! smoothed speed falls under 60% of the entry threshold.
//!
//! Loitering is independent: the newest `loiter_time` seconds of history
//! must fit in a box whose diagonal is under `loiter_radius`, continuously,
//! for longer than `loiter_time`.

use tracing::debug;

use crate::config::Config;
use crate::math;
use crate::processor::Label;
use crate::track::{MotionState, Track};

/// RUNNING is left below this share of `min_running_speed`.
const RUNNING_EXIT_RATIO: f32 = 0.6;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Behavior {
    pub running: bool,
    pub loitering: bool,
}

impl Behavior {
    /// RUNNING wins over LOITERING.
    #[inline]
    pub fn label(&self) -> Label {
        if self.running {
            Label::Running
        } else if self.loitering {
            Label::Loitering
        } else {
            Label::Normal
        }
    }
}

#[derive(Debug, Clone)]
pub struct BehaviorClassifier {
    pub min_running_speed: f32,
    pub min_acceleration: f32,
    pub min_distance: f32,
    pub possible_frames: u32,
    pub loiter_time: f32,
    pub loiter_radius: f32,
    loiter_len: usize,
}

impl BehaviorClassifier {
    pub fn from_config(config: &Config) -> Self {
        Self {
            min_running_speed: config.min_running_speed,
            min_acceleration: config.min_acceleration,
            min_distance: config.min_distance,
            possible_frames: config.possible_frames,
            loiter_time: config.loiter_time,
            loiter_radius: config.loiter_radius,
            loiter_len: config.loiter_len().max(1),
        }
    }

    /// Samples needed before confinement is evaluated.
    #[inline]
    pub fn loiter_len(&self) -> usize {
        self.loiter_len
    }

    /// Runs both detectors on a track whose kinematics are already updated.
    pub fn classify(&self, track: &mut Track) -> Behavior {
        if let Some((from, to)) = self.update_motion(track) {
            debug!(
                "track {}: {:?} -> {:?} (speed {:.1}, accel {:.1}, dist {:.1})",
                track.track_id, from, to, track.ema_speed, track.ema_accel, track.distance_accum
            );
        }

        let was_loitering = track.is_loitering;
        let loitering = self.update_loitering(track);
        if loitering != was_loitering {
            debug!("track {}: loitering = {}", track.track_id, loitering);
        }

        Behavior {
            running: track.is_running(),
            loitering,
        }
    }

    /// One step of the running state machine; returns the edge taken, if any.
    pub fn update_motion(&self, track: &mut Track) -> Option<(MotionState, MotionState)> {
        let from = track.state;
        let fast = track.ema_speed > self.min_running_speed;

        match track.state {
            MotionState::Idle => {
                if fast {
                    track.state = MotionState::Possible;
                    track.state_counter = 1;
                    track.distance_accum = 0.0;
                }
            }
            MotionState::Possible => {
                if fast && track.ema_accel > self.min_acceleration {
                    track.state_counter += 1;
                } else {
                    track.reset_motion();
                }

                if track.state == MotionState::Possible
                    && track.state_counter >= self.possible_frames
                    && track.distance_accum >= self.min_distance
                {
                    track.state = MotionState::Running;
                }
            }
            MotionState::Running => {
                if track.ema_speed < self.min_running_speed * RUNNING_EXIT_RATIO {
                    track.reset_motion();
                }
            }
        }

        let to = track.state;
        debug_assert!(from == to || from.can_transition(to));

        if from != to {
            Some((from, to))
        } else {
            None
        }
    }

    /// Timestamp of the oldest sample of the confinement window when the
    /// newest `loiter_time` seconds of history fit within `loiter_radius`.
    pub fn confined_since(&self, track: &Track) -> Option<f32> {
        if track.history.len() < self.loiter_len {
            return None;
        }

        let oldest = track.history.recent(self.loiter_len).next()?.ts;
        let spread = math::extent(track.history.recent(self.loiter_len).map(|s| &s.pos))?;

        if spread < self.loiter_radius {
            Some(oldest)
        } else {
            None
        }
    }

    pub fn update_loitering(&self, track: &mut Track) -> bool {
        let now = track.last_seen;

        match self.confined_since(track) {
            Some(since) => {
                let start = *track.loiter_start.get_or_insert(since);

                if now - start > self.loiter_time {
                    track.is_loitering = true;
                }
            }
            None => {
                track.loiter_start = None;
                track.is_loitering = false;
            }
        }

        track.is_loitering
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kinematics::KinematicEstimator;
    use nalgebra as na;

    const FPS: f32 = 25.0;

    fn setup() -> (KinematicEstimator, BehaviorClassifier) {
        let config = Config::default();
        (
            KinematicEstimator::from_config(&config),
            BehaviorClassifier::from_config(&config),
        )
    }

    fn step(
        est: &KinematicEstimator,
        cls: &BehaviorClassifier,
        track: &mut Track,
        frame: u32,
        x: f32,
        y: f32,
    ) -> Behavior {
        track.push(frame as f32 / FPS, na::Point2::new(x, y));
        est.update(track);
        cls.classify(track)
    }

    #[test]
    fn sprint_reaches_running_on_fifth_frame() {
        let (est, cls) = setup();
        let mut track = Track::new(1, 375, 0.0);
        let mut states = Vec::new();

        for i in 0..6 {
            step(&est, &cls, &mut track, i, 150.0 * i as f32, 0.0);
            states.push(track.state);
        }

        use MotionState::*;
        assert_eq!(states, vec![Idle, Possible, Possible, Possible, Running, Running]);
        assert_eq!(track.state_counter, 4);
        assert!(track.distance_accum >= 100.0);
    }

    #[test]
    fn running_label_wins_over_loitering() {
        let b = Behavior {
            running: true,
            loitering: true,
        };
        assert_eq!(b.label(), Label::Running);

        let b = Behavior {
            running: false,
            loitering: true,
        };
        assert_eq!(b.label(), Label::Loitering);
        assert_eq!(Behavior::default().label(), Label::Normal);
    }

    #[test]
    fn short_burst_falls_back_to_idle() {
        let (est, cls) = setup();
        let mut track = Track::new(1, 375, 0.0);

        step(&est, &cls, &mut track, 0, 0.0, 0.0);
        step(&est, &cls, &mut track, 1, 150.0, 0.0);
        assert_eq!(track.state, MotionState::Possible);

        // standing still: speed decays, acceleration check fails
        let mut frame = 2;
        while track.state == MotionState::Possible {
            step(&est, &cls, &mut track, frame, 150.0, 0.0);
            frame += 1;
        }

        assert_eq!(track.state, MotionState::Idle);
        assert_eq!(track.state_counter, 0);
        assert_eq!(track.distance_accum, 0.0);
    }

    #[test]
    fn running_exits_below_sixty_percent() {
        let (_, cls) = setup();
        let mut track = Track::new(1, 16, 0.0);
        track.state = MotionState::Running;

        track.ema_speed = 73.0;
        assert_eq!(cls.update_motion(&mut track), None);

        track.ema_speed = 71.0;
        assert_eq!(
            cls.update_motion(&mut track),
            Some((MotionState::Running, MotionState::Idle))
        );
    }

    #[test]
    fn idle_never_jumps_to_running() {
        let (_, cls) = setup();
        let mut track = Track::new(1, 16, 0.0);

        track.ema_speed = 10_000.0;
        track.ema_accel = 10_000.0;
        track.distance_accum = 10_000.0;

        assert_eq!(
            cls.update_motion(&mut track),
            Some((MotionState::Idle, MotionState::Possible))
        );
        assert_eq!(track.distance_accum, 0.0);
    }

    #[test]
    fn loitering_needs_full_window() {
        let (est, cls) = setup();
        let mut track = Track::new(1, 375, 0.0);

        for i in 0..(cls.loiter_len() as u32 - 1) {
            let b = step(&est, &cls, &mut track, i, 100.0 + (i % 5) as f32, 100.0);
            assert!(!b.loitering);
            assert!(track.loiter_start.is_none());
        }
    }

    #[test]
    fn leaving_the_radius_clears_loitering() {
        let (est, cls) = setup();
        let mut track = Track::new(1, 375, 0.0);

        let mut frame = 0;
        while frame < 10 * FPS as u32 {
            step(&est, &cls, &mut track, frame, 200.0, 200.0);
            frame += 1;
        }
        assert!(track.is_loitering);

        step(&est, &cls, &mut track, frame, 400.0, 200.0);
        assert!(!track.is_loitering);
        assert!(track.loiter_start.is_none());
    }
}
