use std::sync::Arc;

use ab_glyph::FontVec;

use crate::alarm::domain::alarm_stack::AlarmCandidate;
use crate::detection::domain::face_detector::FaceDetector;
use crate::detection::domain::face_recognizer::{FaceRecognizer, Prediction};
use crate::identity::domain::identity_store::IdentityStore;
use crate::monitoring::annotation::{Annotator, FramePacket, Overlay};
use crate::monitoring::confidence_gate::{classify, Verdict};
use crate::monitoring::event_log::EventLog;
use crate::monitoring::settings::MonitorSettings;
use crate::shared::constants::REASSOCIATION_INTERVAL;
use crate::shared::frame::{Frame, GrayFrame};
use crate::shared::region::Region;
use crate::shared::timestamp::AlarmTimestamp;
use crate::tracking::domain::tracker_pool::TrackerPool;

/// Result of one frame cycle.
#[derive(Debug)]
pub struct CycleOutput {
    pub packet: FramePacket,
    /// One candidate per face that crossed the auto-alarm threshold.
    pub alarms: Vec<AlarmCandidate>,
}

/// Runs detection, tracking and recognition on one frame at a time.
///
/// Per cycle: every track is re-localized (stale ones evicted), the detector
/// runs on the analysis frame, each detection is optionally recognized and
/// gated, and on every `REASSOCIATION_INTERVAL`-th cycle detections are
/// matched against the tracks or spawn new ones. Known faces never spawn a
/// track. Collaborator failures are logged and degrade the cycle; they never
/// abort it.
pub struct FrameProcessor {
    detector: Box<dyn FaceDetector>,
    recognizer: Option<Box<dyn FaceRecognizer>>,
    identities: Option<Box<dyn IdentityStore>>,
    pool: TrackerPool,
    log: EventLog,
    frame_counter: u64,
    warned_no_recognizer: bool,
    label_font: Option<Arc<FontVec>>,
}

impl FrameProcessor {
    pub fn new(detector: Box<dyn FaceDetector>, pool: TrackerPool, log: EventLog) -> Self {
        Self {
            detector,
            recognizer: None,
            identities: None,
            pool,
            log,
            frame_counter: 0,
            warned_no_recognizer: false,
            label_font: None,
        }
    }

    pub fn with_recognizer(mut self, recognizer: Box<dyn FaceRecognizer>) -> Self {
        self.recognizer = Some(recognizer);
        self
    }

    pub fn with_identity_store(mut self, store: Box<dyn IdentityStore>) -> Self {
        self.identities = Some(store);
        self
    }

    /// Font for the name and "unknown" tags; without one only the tags are painted.
    pub fn with_label_font(mut self, font: FontVec) -> Self {
        self.label_font = Some(Arc::new(font));
        self
    }

    pub fn pool(&self) -> &TrackerPool {
        &self.pool
    }

    /// Cycles processed with tracking enabled.
    pub fn frame_counter(&self) -> u64 {
        self.frame_counter
    }

    pub fn process(&mut self, frame: Frame, settings: &MonitorSettings) -> CycleOutput {
        let mut annotator = Annotator::new(&frame).with_font(self.label_font.clone());

        if !settings.tracking_enabled {
            if !self.pool.is_empty() {
                log::debug!("Tracking disabled, dropping {} tracks", self.pool.len());
                self.pool.clear();
            }
            return CycleOutput {
                packet: annotator.finish(frame),
                alarms: Vec::new(),
            };
        }

        let gray = frame.to_gray();
        let analysis = if settings.equalize_histogram {
            gray.equalized()
        } else {
            gray.clone()
        };

        self.pool.update(&gray);
        let detections = self.detect(&analysis);

        self.frame_counter += 1;
        let reassociate = self.frame_counter % REASSOCIATION_INTERVAL == 0;

        let mut alarm_count = 0usize;
        for detection in &detections {
            let mut known = false;
            if settings.recognition_enabled {
                annotator.detection(*detection);
                if let Some(prediction) = self.recognize(&analysis, detection, settings) {
                    match classify(
                        prediction.confidence,
                        settings.confidence_threshold,
                        settings.auto_alarm_threshold,
                    ) {
                        Verdict::Known => {
                            known = true;
                            let name = self.resolve_name(prediction.face_id);
                            annotator.label(Overlay::known(*detection, name));
                        }
                        Verdict::Unknown { raise_alarm } => {
                            annotator.label(Overlay::unknown(*detection));
                            if raise_alarm && settings.alarms_enabled {
                                log::info!(
                                    "Alarm signal raised for face_id {} (confidence {:.2})",
                                    prediction.face_id,
                                    prediction.confidence
                                );
                                alarm_count += 1;
                            }
                        }
                    }
                }
            }

            if reassociate {
                self.pool.associate(detection, &gray, known);
            }
        }

        let tracked: Vec<(u64, Region)> = self.pool.tracks().map(|t| (t.id, t.region)).collect();
        for (id, region) in &tracked {
            annotator.track(*id, *region);
        }
        if !tracked.is_empty() {
            annotator.tracking_active();
        }

        let alarms = if alarm_count > 0 {
            let timestamp = AlarmTimestamp::now();
            (0..alarm_count)
                .map(|_| AlarmCandidate {
                    timestamp,
                    snapshot: annotator.frame().clone(),
                })
                .collect()
        } else {
            Vec::new()
        };

        CycleOutput {
            packet: annotator.finish(frame),
            alarms,
        }
    }

    /// Drops all tracks; nothing from the previous run survives a restart.
    pub fn reset(&mut self) {
        self.pool.clear();
        self.frame_counter = 0;
    }

    /// Detector output restricted to regions with at least one visible pixel.
    fn detect(&mut self, frame: &GrayFrame) -> Vec<Region> {
        let regions = match self.detector.detect(frame) {
            Ok(regions) => regions,
            Err(e) => {
                self.log.error(format!("Error: face detection failed: {e}"));
                return Vec::new();
            }
        };
        let (visible, outside): (Vec<Region>, Vec<Region>) = regions
            .into_iter()
            .partition(|r| r.clamp_to(frame.width(), frame.height()).is_some());
        for region in outside {
            self.log.warn(format!(
                "Warning: discarding detection outside the frame: {region:?}"
            ));
        }
        visible
    }

    fn recognize(
        &mut self,
        frame: &GrayFrame,
        detection: &Region,
        settings: &MonitorSettings,
    ) -> Option<Prediction> {
        let Some(recognizer) = self.recognizer.as_mut() else {
            if !self.warned_no_recognizer {
                self.log
                    .warn("Warning: no recognizer loaded, face recognition is unavailable");
                self.warned_no_recognizer = true;
            }
            return None;
        };

        let Some(face) = frame.crop(detection) else {
            self.log
                .warn(format!("Warning: no pixels to recognize in {detection:?}"));
            return None;
        };
        match recognizer.predict(&face) {
            Ok(prediction) => {
                log::debug!(
                    "face_id: {}, confidence: {}",
                    prediction.face_id,
                    prediction.confidence
                );
                if settings.debug_mode {
                    self.log.debug(format!(
                        "Debug -> face_id: {}, confidence: {:.2}",
                        prediction.face_id, prediction.confidence
                    ));
                }
                Some(prediction)
            }
            Err(e) => {
                self.log.error(format!("Error: face recognition failed: {e}"));
                None
            }
        }
    }

    fn resolve_name(&mut self, face_id: i64) -> String {
        let lookup = match self.identities.as_mut() {
            Some(store) => store.lookup(face_id).map_err(|e| e.to_string()),
            None => Err("identity store is not configured".to_string()),
        };
        match lookup {
            Ok(Some(name)) => name,
            Ok(None) => {
                self.log.error(format!(
                    "Error: no identity on record for face_id {face_id}"
                ));
                String::new()
            }
            Err(e) => {
                self.log.error(format!(
                    "Error: cannot read identity for face_id {face_id}: {e}"
                ));
                String::new()
            }
        }
    }
}
