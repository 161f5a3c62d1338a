//! Per-track behavior classification for video analytics.
//!
//! Feed one [`Frame`] of tracker output at a time into a [`FrameProcessor`]
//! and get back one [`ClassificationResult`] per observation: `RUNNING`,
//! `LOITERING`, `RESTRICTED_AREA` or `NORMAL`. Detection, tracking, decoding
//! and rendering all live outside this crate.

pub mod bbox;
pub mod behavior;
pub mod config;
pub mod error;
pub mod frame;
pub mod kinematics;
pub mod math;
pub mod observation;
pub mod processor;
pub mod store;
pub mod zone;

mod circular_queue;
mod track;

pub use config::{Config, Eviction, LabelPolicy, Scenario, TimeBase};
pub use error::Error;
pub use frame::Frame;
pub use observation::Observation;
pub use processor::{ClassificationResult, FrameProcessor, Label};
pub use track::{MotionState, Sample, Track};

use std::collections::HashMap;

pub type TrackId = i64;

pub trait Classifying {
    fn process(&mut self, frame: &Frame) -> Vec<ClassificationResult>;
    fn reset(&mut self);
}

/// Independent processors keyed by stream name. Nothing is shared between
/// streams.
pub struct StreamMonitor {
    streams: HashMap<String, FrameProcessor>,
}

impl StreamMonitor {
    pub fn new() -> Self {
        Self {
            streams: HashMap::new(),
        }
    }

    /// Registers (or replaces) a stream. Configuration errors surface here,
    /// before any frame is processed.
    pub fn add_stream(&mut self, src: &str, config: &Config) -> Result<(), Error> {
        let processor = FrameProcessor::new(config)?;
        self.streams.insert(src.to_string(), processor);
        Ok(())
    }

    pub fn remove_stream(&mut self, src: &str) -> Option<FrameProcessor> {
        self.streams.remove(src)
    }

    pub fn process(&mut self, src: &str, frame: &Frame) -> Result<Vec<ClassificationResult>, Error> {
        self.streams
            .get_mut(src)
            .map(|processor| processor.process(frame))
            .ok_or_else(|| Error::UnknownStream(src.to_string()))
    }

    pub fn reset(&mut self, src: &str) -> Result<(), Error> {
        let processor = self
            .streams
            .get_mut(src)
            .ok_or_else(|| Error::UnknownStream(src.to_string()))?;

        processor.reset();
        Ok(())
    }

    #[inline]
    pub fn stream(&self, src: &str) -> Option<&FrameProcessor> {
        self.streams.get(src)
    }

    #[inline]
    pub fn streams(&self) -> impl Iterator<Item = &str> {
        self.streams.keys().map(String::as_str)
    }
}

impl Default for StreamMonitor {
    fn default() -> Self {
        Self::new()
    }
}
