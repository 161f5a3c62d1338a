use std::collections::HashMap;

use nalgebra as na;
use tracing::info;

use crate::config::Eviction;
use crate::track::Track;
use crate::TrackId;

/// Per-stream track records, created on first observation.
#[derive(Debug, Clone)]
pub struct TrackStore {
    tracks: HashMap<TrackId, Track>,
    history_len: usize,
    eviction: Eviction,
}

impl TrackStore {
    pub fn new(history_len: usize, eviction: Eviction) -> Self {
        Self {
            tracks: HashMap::with_capacity(64),
            history_len,
            eviction,
        }
    }

    /// Append a sample to the track, creating the record if needed.
    pub fn observe(&mut self, id: TrackId, pos: na::Point2<f32>, ts: f32) -> &mut Track {
        let history_len = self.history_len;
        let track = self
            .tracks
            .entry(id)
            .or_insert_with(|| Track::new(id, history_len, ts));

        track.push(ts, pos);
        track
    }

    #[inline]
    pub fn get(&self, id: TrackId) -> Option<&Track> {
        self.tracks.get(&id)
    }

    #[inline]
    pub fn get_mut(&mut self, id: TrackId) -> Option<&mut Track> {
        self.tracks.get_mut(&id)
    }

    #[inline]
    pub fn remove(&mut self, id: TrackId) -> Option<Track> {
        self.tracks.remove(&id)
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.tracks.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.tracks.is_empty()
    }

    #[inline]
    pub fn clear(&mut self) {
        self.tracks.clear()
    }

    #[inline]
    pub fn iter(&self) -> impl Iterator<Item = &Track> {
        self.tracks.values()
    }

    #[inline]
    pub fn eviction(&self) -> Eviction {
        self.eviction
    }

    /// Apply the eviction policy as of `now`; returns the dropped ids.
    pub fn evict(&mut self, now: f32) -> Vec<TrackId> {
        let mut evicted = match self.eviction {
            Eviction::Never => Vec::new(),
            Eviction::Ttl { seconds } => self
                .tracks
                .values()
                .filter(|t| now - t.last_seen > seconds)
                .map(|t| t.track_id)
                .collect(),
            Eviction::Lru { capacity } => {
                if self.tracks.len() <= capacity {
                    Vec::new()
                } else {
                    let mut by_age: Vec<(f32, TrackId)> = self
                        .tracks
                        .values()
                        .map(|t| (t.last_seen, t.track_id))
                        .collect();

                    by_age.sort_by(|a, b| a.0.total_cmp(&b.0).then(a.1.cmp(&b.1)));
                    by_age.truncate(self.tracks.len() - capacity);
                    by_age.into_iter().map(|(_, id)| id).collect()
                }
            }
        };

        evicted.sort_unstable();

        for id in &evicted {
            self.tracks.remove(id);
        }

        if !evicted.is_empty() {
            info!("evicted {} track(s): {:?}", evicted.len(), evicted);
        }

        evicted
    }
}
