use std::fmt;

use serde_derive::Serialize;
use tracing::{debug, info};

use crate::bbox::{BBox, Ltrb};
use crate::behavior::{Behavior, BehaviorClassifier};
use crate::config::{Config, LabelPolicy, Scenario};
use crate::error::Error;
use crate::frame::Frame;
use crate::kinematics::KinematicEstimator;
use crate::store::TrackStore;
use crate::zone::ZoneClassifier;
use crate::TrackId;

#[derive(Serialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Label {
    Normal,
    Running,
    Loitering,
    RestrictedArea,
}

impl Label {
    pub fn as_str(self) -> &'static str {
        match self {
            Label::Normal => "NORMAL",
            Label::Running => "RUNNING",
            Label::Loitering => "LOITERING",
            Label::RestrictedArea => "RESTRICTED_AREA",
        }
    }
}

impl fmt::Display for Label {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct ClassificationResult {
    pub track_id: TrackId,
    pub label: Label,
    pub bbox: BBox<Ltrb>,
    pub running: bool,
    pub loitering: bool,
    pub restricted: bool,
}

impl LabelPolicy {
    pub fn combine(self, behavior: Behavior, restricted: bool) -> Label {
        match (self, restricted) {
            (LabelPolicy::ZoneFirst, true) => Label::RestrictedArea,
            (LabelPolicy::BehaviorFirst, true) if behavior.label() == Label::Normal => {
                Label::RestrictedArea
            }
            _ => behavior.label(),
        }
    }
}

/// Per-stream classification core. `process` is called once per frame,
/// never concurrently with itself or `reset`.
#[derive(Debug, Clone)]
pub struct FrameProcessor {
    scenario: Scenario,
    policy: LabelPolicy,
    store: TrackStore,
    kinematics: KinematicEstimator,
    behavior: Option<BehaviorClassifier>,
    zone: Option<ZoneClassifier>,
}

impl FrameProcessor {
    pub fn new(config: &Config) -> Result<Self, Error> {
        config.validate()?;

        let zone = if config.scenario.uses_zone() {
            Some(ZoneClassifier::from_config(config)?)
        } else {
            None
        };

        let behavior = if config.scenario.uses_behavior() {
            Some(BehaviorClassifier::from_config(config))
        } else {
            None
        };

        info!(
            "frame processor ready: scenario {}, {} fps, history {} samples, eviction {:?}",
            config.scenario,
            config.fps,
            config.history_len(),
            config.eviction
        );

        if let Some(zone) = &zone {
            if zone.restricted_sign() == 0 {
                info!("restricted point lies on the line, no area will be restricted");
            }
        }

        Ok(Self {
            scenario: config.scenario,
            policy: config.label_policy,
            store: TrackStore::new(config.history_len(), config.eviction),
            kinematics: KinematicEstimator::from_config(config),
            behavior,
            zone,
        })
    }

    #[inline]
    pub fn scenario(&self) -> Scenario {
        self.scenario
    }

    #[inline]
    pub fn store(&self) -> &TrackStore {
        &self.store
    }

    #[inline]
    pub fn zone(&self) -> Option<&ZoneClassifier> {
        self.zone.as_ref()
    }

    /// Classifies every valid observation of the frame, in input order.
    /// Invalid observations are skipped.
    pub fn process(&mut self, frame: &Frame) -> Vec<ClassificationResult> {
        let mut results = Vec::with_capacity(frame.len());

        for obs in frame.iter() {
            if let Err(err) = obs.validate() {
                debug!("frame {}: skipping observation: {}", frame.index, err);
                continue;
            }

            let ts = frame.timestamp_of(obs);
            if !ts.is_finite() {
                debug!(
                    "frame {}: skipping track {}: non-finite timestamp {}",
                    frame.index, obs.track_id, ts
                );
                continue;
            }

            let center = obs.center();

            let track = self.store.observe(obs.track_id, center, ts);
            self.kinematics.update(track);

            let behavior = match &self.behavior {
                Some(classifier) => classifier.classify(track),
                None => Behavior::default(),
            };

            let restricted = self
                .zone
                .as_ref()
                .map_or(false, |zone| zone.is_restricted(&center));

            results.push(ClassificationResult {
                track_id: obs.track_id,
                label: self.policy.combine(behavior, restricted),
                bbox: obs.bbox,
                running: behavior.running,
                loitering: behavior.loitering,
                restricted,
            });
        }

        self.store.evict(frame.timestamp);

        results
    }

    /// Drops every track. Only valid between frames.
    pub fn reset(&mut self) {
        info!("resetting {} track(s)", self.store.len());
        self.store.clear();
    }
}

impl crate::Classifying for FrameProcessor {
    #[inline]
    fn process(&mut self, frame: &Frame) -> Vec<ClassificationResult> {
        FrameProcessor::process(self, frame)
    }

    #[inline]
    fn reset(&mut self) {
        FrameProcessor::reset(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::observation::Observation;

    fn boxed(id: TrackId, cx: f32, cy: f32) -> Observation {
        Observation::new(id, BBox::ltrb(cx - 10.0, cy - 20.0, cx + 10.0, cy + 20.0))
    }

    fn combined() -> Config {
        Config {
            scenario: Scenario::Combined,
            line: Some([[0.0, 100.0], [200.0, 100.0]]),
            restricted_point: Some([50.0, 150.0]),
            ..Config::default()
        }
    }

    #[test]
    fn zone_first_precedence() {
        let policy = LabelPolicy::ZoneFirst;
        let running = Behavior {
            running: true,
            loitering: false,
        };

        assert_eq!(policy.combine(running, true), Label::RestrictedArea);
        assert_eq!(policy.combine(running, false), Label::Running);
        assert_eq!(policy.combine(Behavior::default(), false), Label::Normal);
    }

    #[test]
    fn behavior_first_precedence() {
        let policy = LabelPolicy::BehaviorFirst;
        let loitering = Behavior {
            running: false,
            loitering: true,
        };

        assert_eq!(policy.combine(loitering, true), Label::Loitering);
        assert_eq!(policy.combine(Behavior::default(), true), Label::RestrictedArea);
    }

    #[test]
    fn zone_scenario_requires_line() {
        let config = Config {
            scenario: Scenario::LineCrossing,
            ..Config::default()
        };

        assert!(matches!(
            FrameProcessor::new(&config),
            Err(Error::MissingZoneSetting { .. })
        ));
    }

    #[test]
    fn invalid_config_fails_at_setup() {
        let config = Config {
            fps: -1.0,
            ..Config::default()
        };

        assert!(matches!(
            FrameProcessor::new(&config),
            Err(Error::InvalidConfig { field: "fps", .. })
        ));
    }

    #[test]
    fn degenerate_box_is_skipped_locally() {
        let mut processor = FrameProcessor::new(&combined()).unwrap();
        let frame = Frame::at_rate(
            0,
            25.0,
            vec![
                boxed(1, 50.0, 50.0),
                Observation::new(2, BBox::ltrb(5.0, 5.0, 5.0, 5.0)),
                boxed(3, 50.0, 150.0),
            ],
        );

        let results = processor.process(&frame);
        let ids: Vec<_> = results.iter().map(|r| r.track_id).collect();

        assert_eq!(ids, vec![1, 3]);
        assert!(processor.store().get(2).is_none());
        assert_eq!(results[0].label, Label::Normal);
        assert_eq!(results[1].label, Label::RestrictedArea);
        assert!(results[1].restricted);
    }

    #[test]
    fn behavior_scenario_never_restricts() {
        let config = Config {
            scenario: Scenario::Behavior,
            ..combined()
        };
        let mut processor = FrameProcessor::new(&config).unwrap();
        assert!(processor.zone().is_none());

        let results = processor.process(&Frame::at_rate(0, 25.0, vec![boxed(1, 50.0, 150.0)]));
        assert_eq!(results[0].label, Label::Normal);
        assert!(!results[0].restricted);
    }

    #[test]
    fn reset_discards_tracks() {
        let mut processor = FrameProcessor::new(&combined()).unwrap();
        processor.process(&Frame::at_rate(0, 25.0, vec![boxed(1, 0.0, 0.0), boxed(2, 5.0, 5.0)]));
        assert_eq!(processor.store().len(), 2);

        processor.reset();
        assert!(processor.store().is_empty());
    }

    #[test]
    fn stale_tracks_are_evicted() {
        let config = Config {
            eviction: crate::config::Eviction::Ttl { seconds: 1.0 },
            ..combined()
        };
        let mut processor = FrameProcessor::new(&config).unwrap();

        processor.process(&Frame::at_rate(0, 25.0, vec![boxed(1, 0.0, 0.0)]));
        processor.process(&Frame::at_rate(10, 25.0, vec![boxed(2, 0.0, 0.0)]));
        assert_eq!(processor.store().len(), 2);

        processor.process(&Frame::at_rate(50, 25.0, vec![boxed(2, 0.0, 0.0)]));
        assert!(processor.store().get(1).is_none());
        assert!(processor.store().get(2).is_some());
    }

    #[test]
    fn untimed_frame_does_not_create_tracks() {
        let config = Config {
            eviction: crate::config::Eviction::Ttl { seconds: 1.0 },
            ..Config::default()
        };
        let mut processor = FrameProcessor::new(&config).unwrap();

        let results = processor.process(&Frame::new(0, f32::NAN, vec![boxed(1, 50.0, 50.0)]));
        assert!(results.is_empty());
        assert!(processor.store().get(1).is_none());

        // an observation's own timestamp still rescues it
        let timed = boxed(2, 50.0, 50.0).with_timestamp(0.5);
        let results = processor.process(&Frame::new(1, f32::NAN, vec![timed]));
        assert_eq!(results.len(), 1);

        for k in 1..=50u64 {
            processor.process(&Frame::at_rate(k, 25.0, vec![boxed(3, 0.0, 0.0)]));
        }
        assert!(processor.store().get(2).is_none());
        assert!(processor.store().get(3).is_some());
    }

    #[test]
    fn untimed_first_frame_does_not_block_loitering() {
        let mut processor = FrameProcessor::new(&Config::default()).unwrap();
        processor.process(&Frame::new(0, f32::NAN, vec![boxed(1, 300.0, 200.0)]));

        let mut first = None;
        for k in 1..=(20 * 25u64) {
            let result = processor.process(&Frame::at_rate(k, 25.0, vec![boxed(1, 300.0, 200.0)]));
            if result[0].loitering && first.is_none() {
                first = Some(k);
            }
        }

        let first = first.expect("standing still for 20 s must loiter");
        assert!(first as f32 / 25.0 > 8.0);
        assert!(first as f32 / 25.0 < 10.0);
    }

    #[test]
    fn result_serializes_plainly() {
        let result = ClassificationResult {
            track_id: 4,
            label: Label::RestrictedArea,
            bbox: BBox::ltrb(1.0, 2.0, 3.0, 4.0),
            running: false,
            loitering: false,
            restricted: true,
        };

        let value = serde_json::to_value(&result).unwrap();
        assert_eq!(value["label"], "RESTRICTED_AREA");
        assert_eq!(value["track_id"], 4);
        assert_eq!(value["bbox"][2], 3.0);
    }
}
