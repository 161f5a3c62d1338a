//! Run configuration.
//!
//! Deserialized from the JSON scenario files the host keeps around; keys the
//! classifier does not use (`video`, `confidence`, ...) are ignored.

use std::fmt;
use std::path::Path;
use std::str::FromStr;

use nalgebra as na;
use serde_derive::{Deserialize, Serialize};
use tracing::warn;

use crate::error::Error;

/// Which classifiers a run applies.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scenario {
    /// Running and loitering only.
    #[serde(rename = "BEHAVIOR", alias = "behavior")]
    Behavior,

    /// Restricted half-plane only.
    #[serde(
        rename = "LINE_CROSSING",
        alias = "line_crossing",
        alias = "metro_line"
    )]
    LineCrossing,

    /// Both.
    #[serde(rename = "COMBINED", alias = "combined")]
    Combined,
}

impl Scenario {
    #[inline]
    pub fn uses_behavior(self) -> bool {
        matches!(self, Scenario::Behavior | Scenario::Combined)
    }

    #[inline]
    pub fn uses_zone(self) -> bool {
        matches!(self, Scenario::LineCrossing | Scenario::Combined)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Scenario::Behavior => "BEHAVIOR",
            Scenario::LineCrossing => "LINE_CROSSING",
            Scenario::Combined => "COMBINED",
        }
    }
}

impl fmt::Display for Scenario {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Scenario {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "BEHAVIOR" | "behavior" => Ok(Scenario::Behavior),
            "LINE_CROSSING" | "line_crossing" | "metro_line" => Ok(Scenario::LineCrossing),
            "COMBINED" | "combined" => Ok(Scenario::Combined),
            other => Err(Error::UnknownScenario(other.to_string())),
        }
    }
}

/// Where the per-sample time step comes from.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum TimeBase {
    /// Nominal `1 / fps` between consecutive samples.
    FrameRate,
    /// Difference of the observation timestamps.
    Timestamps,
}

/// Combined label precedence when several conditions hold at once.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum LabelPolicy {
    /// RESTRICTED_AREA > RUNNING > LOITERING > NORMAL
    ZoneFirst,
    /// RUNNING > LOITERING > RESTRICTED_AREA > NORMAL
    BehaviorFirst,
}

/// Track eviction, keyed on the last observed timestamp.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq)]
#[serde(tag = "policy", rename_all = "snake_case")]
pub enum Eviction {
    Never,
    Ttl { seconds: f32 },
    Lru { capacity: usize },
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Config {
    #[serde(default = "default_scenario")]
    pub scenario: Scenario,

    /// Source frame rate, samples per second
    #[serde(default = "default_fps")]
    pub fps: f32,

    /// px/s
    #[serde(default = "default_min_running_speed")]
    pub min_running_speed: f32,

    /// px/s^2
    #[serde(default = "default_min_acceleration")]
    pub min_acceleration: f32,

    /// px
    #[serde(default = "default_min_distance")]
    pub min_distance: f32,

    /// seconds
    #[serde(default = "default_loiter_time")]
    pub loiter_time: f32,

    /// px
    #[serde(default = "default_loiter_radius")]
    pub loiter_radius: f32,

    /// Consecutive qualifying frames needed to confirm running
    #[serde(default = "default_possible_frames")]
    pub possible_frames: u32,

    #[serde(default = "default_ema_alpha")]
    pub ema_alpha: f32,

    /// Length of the per-track position history, seconds
    #[serde(default = "default_history_seconds")]
    pub history_seconds: f32,

    #[serde(default = "default_time_base")]
    pub time_base: TimeBase,

    #[serde(default)]
    pub line: Option<[[f32; 2]; 2]>,

    #[serde(default)]
    pub restricted_point: Option<[f32; 2]>,

    #[serde(default = "default_label_policy")]
    pub label_policy: LabelPolicy,

    #[serde(default = "default_eviction")]
    pub eviction: Eviction,
}

fn default_scenario() -> Scenario {
    Scenario::Behavior
}

fn default_fps() -> f32 {
    25.0
}

fn default_min_running_speed() -> f32 {
    120.0
}

fn default_min_acceleration() -> f32 {
    120.0
}

fn default_min_distance() -> f32 {
    100.0
}

fn default_loiter_time() -> f32 {
    8.0
}

fn default_loiter_radius() -> f32 {
    60.0
}

fn default_possible_frames() -> u32 {
    4
}

fn default_ema_alpha() -> f32 {
    0.4
}

fn default_history_seconds() -> f32 {
    15.0
}

fn default_time_base() -> TimeBase {
    TimeBase::FrameRate
}

fn default_label_policy() -> LabelPolicy {
    LabelPolicy::ZoneFirst
}

fn default_eviction() -> Eviction {
    Eviction::Ttl { seconds: 30.0 }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            scenario: default_scenario(),
            fps: default_fps(),
            min_running_speed: default_min_running_speed(),
            min_acceleration: default_min_acceleration(),
            min_distance: default_min_distance(),
            loiter_time: default_loiter_time(),
            loiter_radius: default_loiter_radius(),
            possible_frames: default_possible_frames(),
            ema_alpha: default_ema_alpha(),
            history_seconds: default_history_seconds(),
            time_base: default_time_base(),
            line: None,
            restricted_point: None,
            label_policy: default_label_policy(),
            eviction: default_eviction(),
        }
    }
}

impl Config {
    pub fn from_json(content: &str) -> Result<Self, Error> {
        Ok(serde_json::from_str(content)?)
    }

    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, Error> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| Error::Io {
            path: path.to_path_buf(),
            source,
        })?;

        Self::from_json(&content)
    }

    /// Nominal seconds between two frames.
    #[inline]
    pub fn frame_time(&self) -> f32 {
        1.0 / self.fps
    }

    /// Number of samples kept per track, never shorter than the loitering
    /// window.
    #[inline]
    pub fn history_len(&self) -> usize {
        ((self.fps * self.history_seconds) as usize).max(self.loiter_len())
    }

    /// Number of samples spanning `loiter_time`, rounded up.
    #[inline]
    pub fn loiter_len(&self) -> usize {
        (self.fps * self.loiter_time).ceil() as usize
    }

    pub fn line_points(&self) -> Option<(na::Point2<f32>, na::Point2<f32>)> {
        self.line
            .map(|[a, b]| (na::Point2::new(a[0], a[1]), na::Point2::new(b[0], b[1])))
    }

    pub fn restricted_point(&self) -> Option<na::Point2<f32>> {
        self.restricted_point.map(|p| na::Point2::new(p[0], p[1]))
    }

    /// Replace `line` from `"x1,y1,x2,y2"`. Anything else keeps the current value.
    pub fn apply_line_override(&mut self, value: &str) -> bool {
        match parse_ints::<4>(value) {
            Some([x1, y1, x2, y2]) => {
                self.line = Some([[x1 as f32, y1 as f32], [x2 as f32, y2 as f32]]);
                true
            }
            None => {
                warn!("ignoring malformed line override {:?}", value);
                false
            }
        }
    }

    /// Replace `restricted_point` from `"x,y"`. Anything else keeps the current value.
    pub fn apply_restricted_point_override(&mut self, value: &str) -> bool {
        match parse_ints::<2>(value) {
            Some([x, y]) => {
                self.restricted_point = Some([x as f32, y as f32]);
                true
            }
            None => {
                warn!("ignoring malformed restricted point override {:?}", value);
                false
            }
        }
    }

    pub fn validate(&self) -> Result<(), Error> {
        positive("fps", self.fps)?;
        positive("loiter_time", self.loiter_time)?;
        positive("history_seconds", self.history_seconds)?;
        non_negative("min_running_speed", self.min_running_speed)?;
        non_negative("min_acceleration", self.min_acceleration)?;
        non_negative("min_distance", self.min_distance)?;
        non_negative("loiter_radius", self.loiter_radius)?;

        if !(self.ema_alpha > 0.0 && self.ema_alpha <= 1.0) {
            return Err(invalid("ema_alpha", format!("{} is outside (0, 1]", self.ema_alpha)));
        }

        if self.possible_frames == 0 {
            return Err(invalid("possible_frames", "must be at least 1".to_string()));
        }

        if let Some((a, b)) = self.line_points() {
            if !a.coords.iter().chain(b.coords.iter()).all(|v| v.is_finite()) {
                return Err(invalid("line", "non-finite coordinate".to_string()));
            }

            if a == b {
                return Err(invalid("line", "endpoints coincide".to_string()));
            }
        }

        if let Some(p) = self.restricted_point() {
            if !p.coords.iter().all(|v| v.is_finite()) {
                return Err(invalid("restricted_point", "non-finite coordinate".to_string()));
            }
        }

        match self.eviction {
            Eviction::Ttl { seconds } => positive("eviction.seconds", seconds)?,
            Eviction::Lru { capacity: 0 } => {
                return Err(invalid("eviction.capacity", "must be at least 1".to_string()))
            }
            _ => (),
        }

        Ok(())
    }
}

fn parse_ints<const N: usize>(value: &str) -> Option<[i64; N]> {
    let parts: Vec<&str> = value.split(',').collect();
    if parts.len() != N {
        return None;
    }

    let mut out = [0i64; N];
    for (slot, part) in out.iter_mut().zip(parts) {
        *slot = part.trim().parse().ok()?;
    }

    Some(out)
}

fn invalid(field: &'static str, reason: String) -> Error {
    Error::InvalidConfig { field, reason }
}

fn positive(field: &'static str, value: f32) -> Result<(), Error> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(invalid(field, format!("{} must be a positive number", value)))
    }
}

fn non_negative(field: &'static str, value: f32) -> Result<(), Error> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(invalid(field, format!("{} must be a non-negative number", value)))
    }
}
