use std::collections::BTreeMap;

use crate::shared::constants::{EVICTION_QUALITY_FLOOR, TRACK_PADDING_X, TRACK_PADDING_Y};
use crate::shared::frame::GrayFrame;
use crate::shared::region::Region;
use crate::tracking::domain::face_localizer::{FaceLocalizer, LocalizerFactory};

/// Identity-agnostic handle on a face followed between detection passes.
#[derive(Clone, Debug, PartialEq)]
pub struct TrackedFace {
    pub id: u64,
    pub region: Region,
    /// `None` until the first re-localization after spawning.
    pub quality_score: Option<f64>,
}

/// What happened to a detection offered to [`TrackerPool::associate`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Association {
    Matched(u64),
    Spawned(u64),
    /// Unmatched, but classified as a known identity, so no track was started.
    Skipped,
}

struct TrackEntry {
    face: TrackedFace,
    localizer: Box<dyn FaceLocalizer>,
}

/// Owns the set of actively tracked faces.
///
/// Ids come from a monotonically increasing counter and are never reused.
/// Entries are kept ordered by id so that the smallest id wins whenever a
/// detection matches several tracks.
pub struct TrackerPool {
    tracks: BTreeMap<u64, TrackEntry>,
    next_id: u64,
    factory: Box<dyn LocalizerFactory>,
    eviction_floor: f64,
}

impl TrackerPool {
    pub fn new(factory: Box<dyn LocalizerFactory>) -> Self {
        Self {
            tracks: BTreeMap::new(),
            next_id: 0,
            factory,
            eviction_floor: EVICTION_QUALITY_FLOOR,
        }
    }

    /// Re-localizes every track in `frame` and drops the stale ones.
    ///
    /// A track is evicted when its quality falls below the floor or its
    /// localizer fails. Tracks that drifted onto each other (mutual centroid
    /// containment) are collapsed into the one with the smallest id.
    /// Returns the removed ids.
    pub fn update(&mut self, frame: &GrayFrame) -> Vec<u64> {
        let floor = self.eviction_floor;
        let mut removed = Vec::new();

        for (&id, entry) in self.tracks.iter_mut() {
            let keep = match entry.localizer.update(frame) {
                Ok(loc) => {
                    entry.face.region = loc.region;
                    entry.face.quality_score = Some(loc.quality);
                    loc.quality >= floor
                }
                Err(e) => {
                    log::debug!("Track {id} failed to re-localize: {e}");
                    false
                }
            };
            if !keep {
                removed.push(id);
            }
        }
        for id in &removed {
            self.tracks.remove(id);
        }

        removed.extend(self.collapse_duplicates());

        if !removed.is_empty() {
            log::debug!("Evicted tracks {removed:?}");
        }
        removed
    }

    /// Smallest-id track whose region mutually contains `detection`, if any.
    pub fn match_detection(&self, detection: &Region) -> Option<u64> {
        self.tracks
            .values()
            .find(|entry| detection.mutually_contains(&entry.face.region))
            .map(|entry| entry.face.id)
    }

    /// Starts a new track seeded from the padded detection and returns its id.
    pub fn spawn(&mut self, detection: &Region, frame: &GrayFrame) -> u64 {
        let seed = detection.padded(TRACK_PADDING_X, TRACK_PADDING_Y);
        let localizer = self.factory.start(frame, seed);

        let id = self.next_id;
        self.next_id += 1;
        self.tracks.insert(
            id,
            TrackEntry {
                face: TrackedFace {
                    id,
                    region: seed,
                    quality_score: None,
                },
                localizer,
            },
        );
        log::debug!("Spawned track {id} at {seed:?}");
        id
    }

    /// Matches `detection` against the pool, spawning a track when it is
    /// unmatched and not a known identity.
    ///
    /// A detection whose padded seed would itself duplicate an existing track
    /// counts as a match on that track, so a spawn never introduces a pair of
    /// mutually containing entries.
    pub fn associate(&mut self, detection: &Region, frame: &GrayFrame, known: bool) -> Association {
        let seed = detection.padded(TRACK_PADDING_X, TRACK_PADDING_Y);
        if let Some(id) = self
            .match_detection(detection)
            .or_else(|| self.match_detection(&seed))
        {
            return Association::Matched(id);
        }
        if known {
            return Association::Skipped;
        }
        Association::Spawned(self.spawn(detection, frame))
    }

    pub fn tracks(&self) -> impl Iterator<Item = &TrackedFace> {
        self.tracks.values().map(|entry| &entry.face)
    }

    pub fn get(&self, id: u64) -> Option<&TrackedFace> {
        self.tracks.get(&id).map(|entry| &entry.face)
    }

    pub fn len(&self) -> usize {
        self.tracks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tracks.is_empty()
    }

    /// Drops every track. The id counter keeps running.
    pub fn clear(&mut self) {
        self.tracks.clear();
    }

    fn collapse_duplicates(&mut self) -> Vec<u64> {
        let mut kept: Vec<Region> = Vec::with_capacity(self.tracks.len());
        let mut duplicates = Vec::new();
        for (&id, entry) in &self.tracks {
            let region = entry.face.region;
            if kept.iter().any(|k| k.mutually_contains(&region)) {
                duplicates.push(id);
            } else {
                kept.push(region);
            }
        }
        for id in &duplicates {
            self.tracks.remove(id);
        }
        duplicates
    }
}
