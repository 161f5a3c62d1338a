use nalgebra as na;
use serde_derive::Serialize;

use crate::circular_queue::CircularQueue;
use crate::TrackId;

/// Running detector state.
#[derive(Serialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MotionState {
    #[default]
    Idle,
    Possible,
    Running,
}

impl MotionState {
    /// Edges the running detector may take. Self-loops are not transitions.
    #[inline]
    pub fn can_transition(self, to: MotionState) -> bool {
        use MotionState::*;

        matches!(
            (self, to),
            (Idle, Possible) | (Possible, Idle) | (Possible, Running) | (Running, Idle)
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Sample {
    pub ts: f32,
    pub pos: na::Point2<f32>,
}

#[derive(Debug, Clone)]
pub struct Track {
    pub track_id: TrackId,
    pub history: CircularQueue<Sample>,

    // in px/s
    pub instant_speed: f32,
    pub ema_speed: f32,
    pub prev_ema_speed: f32,

    // in px/s^2
    pub ema_accel: f32,

    // px travelled since the last running-state reset
    pub distance_accum: f32,

    pub state: MotionState,
    pub state_counter: u32,

    pub loiter_start: Option<f32>,
    pub is_loitering: bool,

    pub first_seen: f32,
    pub last_seen: f32,
}

impl Track {
    pub fn new(track_id: TrackId, history_len: usize, ts: f32) -> Self {
        Self {
            track_id,
            history: CircularQueue::with_capacity(history_len),
            instant_speed: 0.0,
            ema_speed: 0.0,
            prev_ema_speed: 0.0,
            ema_accel: 0.0,
            distance_accum: 0.0,
            state: MotionState::Idle,
            state_counter: 0,
            loiter_start: None,
            is_loitering: false,
            first_seen: ts,
            last_seen: ts,
        }
    }

    #[inline]
    pub fn push(&mut self, ts: f32, pos: na::Point2<f32>) {
        self.history.push(Sample { ts, pos });
        self.last_seen = ts;
    }

    #[inline]
    pub fn position(&self) -> Option<na::Point2<f32>> {
        self.history.last().map(|s| s.pos)
    }

    #[inline]
    pub fn is_running(&self) -> bool {
        self.state == MotionState::Running
    }

    /// Back to IDLE with the hysteresis accumulators cleared.
    #[inline]
    pub fn reset_motion(&mut self) {
        self.state = MotionState::Idle;
        self.state_counter = 0;
        self.distance_accum = 0.0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn legal_edges() {
        use MotionState::*;

        assert!(Idle.can_transition(Possible));
        assert!(Possible.can_transition(Running));
        assert!(Possible.can_transition(Idle));
        assert!(Running.can_transition(Idle));

        assert!(!Idle.can_transition(Running));
        assert!(!Running.can_transition(Possible));
        assert!(!Idle.can_transition(Idle));
    }

    #[test]
    fn history_is_bounded() {
        let mut track = Track::new(1, 3, 0.0);
        for i in 0..10 {
            track.push(i as f32, na::Point2::new(i as f32, 0.0));
        }

        assert_eq!(track.history.len(), 3);
        assert_eq!(track.position(), Some(na::Point2::new(9.0, 0.0)));
        assert_eq!(track.last_seen, 9.0);
        assert_eq!(track.first_seen, 0.0);
    }
}
