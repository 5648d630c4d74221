use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::Duration;

use crossbeam_channel::Receiver;

use crate::alarm::domain::alarm_aggregator::{spawn_alarm_worker, AlarmAggregator};
use crate::alarm::domain::alarm_stack::AlarmStack;
use crate::camera::domain::camera_source::{CameraError, CameraIndex, CameraSource};
use crate::monitoring::annotation::FramePacket;
use crate::monitoring::config::MonitorConfig;
use crate::monitoring::event_log::EventLog;
use crate::monitoring::frame_processor::FrameProcessor;
use crate::monitoring::frame_worker::{spawn_frame_worker, FrameWorker, StoppedWorker};
use crate::monitoring::settings::SettingsHandle;

/// Camera and pacing parameters for [`MonitorRuntime::start`].
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RuntimeOptions {
    pub camera: CameraIndex,
    pub frame_width: u32,
    pub frame_height: u32,
    pub display_capacity: usize,
    pub frame_interval: Duration,
}

impl From<&MonitorConfig> for RuntimeOptions {
    fn from(config: &MonitorConfig) -> Self {
        Self {
            camera: config.camera,
            frame_width: config.frame_width,
            frame_height: config.frame_height,
            display_capacity: config.display_capacity.max(1),
            frame_interval: Duration::from_millis(config.frame_interval_ms),
        }
    }
}

/// Pieces wired together by the runtime.
///
/// The processor and the aggregator should share the `log` and the
/// aggregator's `settings` with the caller, so toggles and status lines flow
/// through the same handles.
pub struct MonitorComponents {
    pub camera: Box<dyn CameraSource>,
    pub processor: FrameProcessor,
    pub aggregator: AlarmAggregator,
    pub settings: SettingsHandle,
    pub log: EventLog,
}

/// The two long-lived workers: the frame loop and the alarm aggregator.
pub struct MonitorRuntime {
    frame_worker: Option<JoinHandle<StoppedWorker>>,
    alarm_worker: Option<JoinHandle<()>>,
    cancelled: Arc<AtomicBool>,
    alarms: AlarmStack,
    settings: SettingsHandle,
    log: EventLog,
}

impl MonitorRuntime {
    /// Opens the camera and starts both workers.
    ///
    /// The camera must produce a first frame (which is discarded), otherwise
    /// start-up fails and nothing is spawned. Returns the display receiver.
    pub fn start(
        components: MonitorComponents,
        options: RuntimeOptions,
    ) -> Result<(Self, Receiver<FramePacket>), Box<dyn std::error::Error>> {
        let MonitorComponents {
            mut camera,
            processor,
            aggregator,
            settings,
            log,
        } = components;

        if let Err(e) = open_camera(camera.as_mut(), &options) {
            camera.release();
            log.error(format!("Error: camera {} failed to start: {e}", options.camera));
            return Err(e);
        }
        log.info(format!(
            "Info: camera {} started at {}x{}",
            options.camera, options.frame_width, options.frame_height
        ));

        let alarms = aggregator.stack().clone();
        let (display_tx, display_rx) = crossbeam_channel::bounded(options.display_capacity);
        let alarm_worker = spawn_alarm_worker(aggregator);
        let (frame_worker, cancelled) = spawn_frame_worker(FrameWorker {
            camera,
            processor,
            settings: settings.clone(),
            display: display_tx,
            alarms: alarms.clone(),
            log: log.clone(),
            frame_interval: options.frame_interval,
        });

        Ok((
            Self {
                frame_worker: Some(frame_worker),
                alarm_worker: Some(alarm_worker),
                cancelled,
                alarms,
                settings,
                log,
            },
            display_rx,
        ))
    }

    pub fn settings(&self) -> &SettingsHandle {
        &self.settings
    }

    pub fn pending_alarms(&self) -> usize {
        self.alarms.len()
    }

    pub fn is_running(&self) -> bool {
        self.frame_worker.is_some()
    }

    /// Stops the frame loop (releasing the camera) and then the aggregator.
    /// Calling it again is a no-op.
    pub fn stop(&mut self) {
        let Some(frame_worker) = self.frame_worker.take() else {
            return;
        };

        self.cancelled.store(true, Ordering::Relaxed);
        match frame_worker.join() {
            Ok(stopped) => {
                log::debug!("Frame worker joined after {} frames", stopped.frames_processed)
            }
            Err(_) => log::error!("Frame worker panicked"),
        }

        self.alarms.close();
        if let Some(alarm_worker) = self.alarm_worker.take() {
            if alarm_worker.join().is_err() {
                log::error!("Alarm worker panicked");
            }
        }
        self.log.info("Info: monitoring stopped");
    }
}

impl Drop for MonitorRuntime {
    fn drop(&mut self) {
        self.stop();
    }
}

fn open_camera(
    camera: &mut dyn CameraSource,
    options: &RuntimeOptions,
) -> Result<(), Box<dyn std::error::Error>> {
    camera.open(options.camera, options.frame_width, options.frame_height)?;
    match camera.read()? {
        Some(_) => Ok(()),
        None => Err(CameraError::NoFirstFrame(options.camera).into()),
    }
}
