use nalgebra as na;
use serde_derive::{Deserialize, Serialize};

use crate::bbox::{BBox, Ltrb};
use crate::error::Error;
use crate::TrackId;

/// One tracked box as reported by the external detector/tracker.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq)]
pub struct Observation {
    #[serde(alias = "id")]
    pub track_id: TrackId,
    pub bbox: BBox<Ltrb>,
    /// Seconds. Falls back to the frame timestamp when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<f32>,
}

impl Observation {
    #[inline]
    pub fn new(track_id: TrackId, bbox: BBox<Ltrb>) -> Self {
        Self {
            track_id,
            bbox,
            timestamp: None,
        }
    }

    #[inline]
    pub fn with_timestamp(mut self, ts: f32) -> Self {
        self.timestamp = Some(ts);
        self
    }

    #[inline(always)]
    pub fn center(&self) -> na::Point2<f32> {
        self.bbox.center()
    }

    pub fn validate(&self) -> Result<(), Error> {
        if self.bbox.is_degenerate() {
            return Err(Error::InvalidObservation {
                track_id: self.track_id,
                reason: format!("degenerate bbox {:?}", self.bbox.as_slice()),
            });
        }

        if let Some(ts) = self.timestamp {
            if !ts.is_finite() {
                return Err(Error::InvalidObservation {
                    track_id: self.track_id,
                    reason: format!("non-finite timestamp {}", ts),
                });
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_tracker_output() {
        let obs: Observation =
            serde_json::from_str(r#"{"id": 7, "bbox": [10, 20, 30, 60]}"#).unwrap();

        assert_eq!(obs.track_id, 7);
        assert_eq!(obs.timestamp, None);
        assert_eq!(obs.center(), na::Point2::new(20.0, 40.0));
        assert!(obs.validate().is_ok());
    }

    #[test]
    fn zero_area_box_is_invalid() {
        let obs = Observation::new(3, BBox::ltrb(10.0, 10.0, 10.0, 40.0));

        assert!(matches!(
            obs.validate(),
            Err(Error::InvalidObservation { track_id: 3, .. })
        ));
    }

    #[test]
    fn nan_timestamp_is_invalid() {
        let obs = Observation::new(1, BBox::ltrb(0.0, 0.0, 4.0, 4.0)).with_timestamp(f32::NAN);
        assert!(obs.validate().is_err());
    }
}
