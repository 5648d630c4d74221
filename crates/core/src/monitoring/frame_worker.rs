use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use crossbeam_channel::{Sender, TrySendError};

use crate::alarm::domain::alarm_stack::AlarmStack;
use crate::camera::domain::camera_source::CameraSource;
use crate::monitoring::annotation::FramePacket;
use crate::monitoring::event_log::EventLog;
use crate::monitoring::frame_processor::FrameProcessor;
use crate::monitoring::settings::SettingsHandle;

const NO_FRAME_BACKOFF: Duration = Duration::from_millis(10);

/// Everything the frame loop owns or talks to.
pub struct FrameWorker {
    pub camera: Box<dyn CameraSource>,
    pub processor: FrameProcessor,
    pub settings: SettingsHandle,
    pub display: Sender<FramePacket>,
    pub alarms: AlarmStack,
    pub log: EventLog,
    /// Minimum time between two captures; zero runs as fast as the camera.
    pub frame_interval: Duration,
}

/// Frame loop state handed back when the worker exits.
pub struct StoppedWorker {
    pub camera: Box<dyn CameraSource>,
    pub processor: FrameProcessor,
    pub frames_processed: u64,
}

impl FrameWorker {
    /// Runs one capture-process-publish cycle per iteration until `cancelled`
    /// is set. The flag is checked between cycles, so an in-flight detector or
    /// recognizer call always completes before the camera is released.
    pub fn run(mut self, cancelled: &AtomicBool) -> StoppedWorker {
        let mut frames_processed = 0u64;
        let mut display_dropped = 0u64;

        while !cancelled.load(Ordering::Relaxed) {
            let started = Instant::now();

            let frame = match self.camera.read() {
                Ok(Some(frame)) => frame,
                Ok(None) => {
                    thread::sleep(NO_FRAME_BACKOFF);
                    continue;
                }
                Err(e) => {
                    self.log.error(format!("Error: failed to read camera frame: {e}"));
                    thread::sleep(NO_FRAME_BACKOFF);
                    continue;
                }
            };

            let settings = self.settings.snapshot();
            let output = self.processor.process(frame, &settings);
            frames_processed += 1;

            for candidate in output.alarms {
                self.alarms.push(candidate);
            }

            match self.display.try_send(output.packet) {
                Ok(()) => {}
                Err(TrySendError::Full(_)) => {
                    display_dropped += 1;
                    log::trace!("Display queue full, dropped frame ({display_dropped} so far)");
                }
                Err(TrySendError::Disconnected(_)) => {
                    log::trace!("Display consumer gone, frame discarded");
                }
            }

            if let Some(rest) = self.frame_interval.checked_sub(started.elapsed()) {
                thread::sleep(rest);
            }
        }

        self.processor.reset();
        self.camera.release();
        log::info!(
            "Frame loop stopped after {frames_processed} frames ({display_dropped} not displayed)"
        );

        StoppedWorker {
            camera: self.camera,
            processor: self.processor,
            frames_processed,
        }
    }
}

/// Starts the frame loop on a dedicated thread.
///
/// Returns the cancel flag alongside the handle; set it and join to stop.
pub fn spawn_frame_worker(
    worker: FrameWorker,
) -> (thread::JoinHandle<StoppedWorker>, Arc<AtomicBool>) {
    let cancelled = Arc::new(AtomicBool::new(false));
    let flag = Arc::clone(&cancelled);
    let handle = thread::spawn(move || worker.run(&flag));
    (handle, cancelled)
}
