use serde_derive::{Deserialize, Serialize};

use crate::observation::Observation;

#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
pub struct Frame {
    #[serde(default)]
    pub index: u64,
    pub timestamp: f32, // in seconds
    #[serde(default)]
    pub observations: Vec<Observation>,
}

impl Frame {
    #[inline]
    pub fn new(index: u64, timestamp: f32, observations: Vec<Observation>) -> Self {
        Self {
            index,
            timestamp,
            observations,
        }
    }

    /// Frame whose timestamp is derived from its index at a fixed rate.
    #[inline]
    pub fn at_rate(index: u64, fps: f32, observations: Vec<Observation>) -> Self {
        Self::new(index, index as f32 / fps, observations)
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.observations.len()
    }

    #[inline]
    pub fn iter(&self) -> impl Iterator<Item = &Observation> {
        self.observations.iter()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.observations.is_empty()
    }

    /// Timestamp of an observation, defaulting to the frame's.
    #[inline]
    pub fn timestamp_of(&self, obs: &Observation) -> f32 {
        obs.timestamp.unwrap_or(self.timestamp)
    }
}
