use std::path::{Path, PathBuf};
use std::process;
use std::thread;
use std::time::{Duration, Instant};

use chrono::Local;
use clap::Parser;

use facewatch_core::alarm::domain::alarm_aggregator::AlarmAggregator;
use facewatch_core::alarm::domain::alarm_stack::AlarmStack;
use facewatch_core::alarm::infrastructure::image_evidence_store::ImageEvidenceStore;
use facewatch_core::alarm::infrastructure::push_config::PushConfig;
use facewatch_core::alarm::infrastructure::telegram_push::TelegramPush;
use facewatch_core::alarm::infrastructure::terminal_bell::TerminalBell;
use facewatch_core::camera::domain::camera_source::{CameraIndex, CameraSource};
use facewatch_core::camera::infrastructure::image_sequence_camera::ImageSequenceCamera;
use facewatch_core::detection::infrastructure::replay_face_detector::ReplayFaceDetector;
use facewatch_core::detection::infrastructure::replay_face_recognizer::ReplayFaceRecognizer;
use facewatch_core::identity::domain::identity_store::{check_identity_store, StoreStatus};
use facewatch_core::identity::infrastructure::json_identity_store::JsonIdentityStore;
use facewatch_core::monitoring::annotation::{load_label_font, FramePacket};
use facewatch_core::monitoring::config::MonitorConfig;
use facewatch_core::monitoring::event_log::EventLog;
use facewatch_core::monitoring::frame_processor::FrameProcessor;
use facewatch_core::monitoring::runtime::{MonitorComponents, MonitorRuntime, RuntimeOptions};
use facewatch_core::monitoring::settings::SettingsHandle;
use facewatch_core::tracking::domain::tracker_pool::TrackerPool;
use facewatch_core::tracking::infrastructure::correlation_localizer::CorrelationLocalizerFactory;

const DISPLAY_POLL_INTERVAL: Duration = Duration::from_millis(5);

/// Live face monitoring with tracking, recognition and unknown-face alarms.
#[derive(Parser)]
#[command(name = "facewatch")]
struct Cli {
    /// Directory of images replayed as the local camera (index 0).
    #[arg(long)]
    camera_dir: PathBuf,

    /// Directory of images replayed as the external camera (index 1).
    #[arg(long)]
    external_camera_dir: Option<PathBuf>,

    /// Use the external camera instead of the local one.
    #[arg(long)]
    external: bool,

    /// JSON file of face rectangles per frame index.
    #[arg(long)]
    detections: PathBuf,

    /// JSON file of recognizer predictions per frame index.
    #[arg(long)]
    recognitions: Option<PathBuf>,

    /// JSON file of `{ face_id, name }` identity records.
    #[arg(long)]
    identities: Option<PathBuf>,

    /// Push channel credentials (JSON).
    #[arg(long)]
    push_config: Option<PathBuf>,

    /// Where alarm snapshots are stored.
    #[arg(long)]
    evidence_dir: Option<PathBuf>,

    /// TrueType/OpenType font used to print names on frames.
    #[arg(long)]
    label_font: Option<PathBuf>,

    /// Monitor config file (defaults to the platform config directory).
    #[arg(long)]
    config: Option<PathBuf>,

    /// Enable face recognition (requires tracking).
    #[arg(long)]
    recognition: bool,

    /// Disable face tracking.
    #[arg(long)]
    no_tracking: bool,

    /// Do not raise alarms for unknown faces.
    #[arg(long)]
    no_alarms: bool,

    /// Report every recognition result.
    #[arg(long)]
    debug: bool,

    /// Equalize the histogram before detection and recognition.
    #[arg(long)]
    equalize: bool,

    /// Scores below this are a known face.
    #[arg(long)]
    confidence_threshold: Option<f64>,

    /// Scores above this raise an alarm.
    #[arg(long)]
    auto_alarm_threshold: Option<f64>,

    /// Do not ring the terminal bell on alarms.
    #[arg(long)]
    no_bell: bool,

    /// Send push notifications on alarms.
    #[arg(long)]
    push: bool,

    /// Stop after this many seconds.
    #[arg(long)]
    duration: Option<f64>,

    /// Stop after this many displayed frames.
    #[arg(long)]
    max_frames: Option<usize>,

    /// Save annotated frames to this directory.
    #[arg(long)]
    output_dir: Option<PathBuf>,
}

fn main() {
    env_logger::init();

    if let Err(e) = run() {
        eprintln!("Error: {e}");
        process::exit(1);
    }
}

fn run() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let config = resolve_config(&cli)?;
    validate(&cli, &config)?;

    let (log, log_rx) = EventLog::channel();
    let log_consumer = thread::spawn(move || {
        for entry in log_rx {
            eprintln!("{}", entry.render(Local::now()));
        }
    });

    let settings = SettingsHandle::new(config.to_settings());
    let components = build_components(&cli, &config, &settings, &log)?;
    let (mut runtime, display) =
        MonitorRuntime::start(components, RuntimeOptions::from(&config))?;

    let deadline = cli
        .duration
        .map(|secs| Instant::now() + Duration::from_secs_f64(secs));
    let mut shown = 0usize;

    loop {
        if deadline.is_some_and(|d| Instant::now() >= d) {
            break;
        }
        if cli.max_frames.is_some_and(|max| shown >= max) {
            break;
        }
        match display.try_recv() {
            Ok(packet) => {
                shown += 1;
                if let Some(dir) = &cli.output_dir {
                    save_packet(dir, &packet)?;
                }
            }
            Err(crossbeam_channel::TryRecvError::Empty) => thread::sleep(DISPLAY_POLL_INTERVAL),
            Err(crossbeam_channel::TryRecvError::Disconnected) => break,
        }
    }

    runtime.stop();
    log::info!(
        "Displayed {shown} frames, {} alarm signals left pending",
        runtime.pending_alarms()
    );
    drop(runtime);
    drop(log);
    let _ = log_consumer.join();
    Ok(())
}

fn resolve_config(cli: &Cli) -> Result<MonitorConfig, Box<dyn std::error::Error>> {
    let mut config = MonitorConfig::load_or_default(cli.config.as_deref())?;

    if cli.external {
        config.camera = CameraIndex::External;
    }
    if cli.recognition {
        config.recognition_enabled = true;
    }
    if cli.no_tracking {
        config.tracking_enabled = false;
    }
    if cli.no_alarms {
        config.alarms_enabled = false;
    }
    if cli.debug {
        config.debug_mode = true;
    }
    if cli.equalize {
        config.equalize_histogram = true;
    }
    if let Some(value) = cli.confidence_threshold {
        config.confidence_threshold = value;
    }
    if let Some(value) = cli.auto_alarm_threshold {
        config.auto_alarm_threshold = value;
    }
    if cli.no_bell {
        config.bell_enabled = false;
    }
    if cli.push {
        config.push_enabled = true;
    }
    if let Some(dir) = &cli.evidence_dir {
        config.evidence_dir = dir.clone();
    }
    if let Some(path) = &cli.identities {
        config.identity_store = Some(path.clone());
    }
    if let Some(path) = &cli.push_config {
        config.push_config = Some(path.clone());
    }
    if let Some(path) = &cli.label_font {
        config.label_font = Some(path.clone());
    }

    config.validate()?;
    Ok(config)
}

fn validate(cli: &Cli, config: &MonitorConfig) -> Result<(), Box<dyn std::error::Error>> {
    if !cli.camera_dir.is_dir() {
        return Err(format!("Camera directory not found: {}", cli.camera_dir.display()).into());
    }
    if !cli.detections.is_file() {
        return Err(format!("Detections file not found: {}", cli.detections.display()).into());
    }
    if config.camera == CameraIndex::External && cli.external_camera_dir.is_none() {
        return Err("--external requires --external-camera-dir".into());
    }
    if config.recognition_enabled && !config.tracking_enabled {
        return Err("Face recognition requires tracking; drop --no-tracking".into());
    }
    if !config.bell_enabled && !config.push_enabled {
        return Err("At least one alarm channel (bell or push) must be enabled".into());
    }
    if config.push_enabled && config.push_config.is_none() {
        return Err("Push notifications need --push-config".into());
    }
    if let Some(secs) = cli.duration {
        if !secs.is_finite() || secs <= 0.0 {
            return Err(format!("Duration must be a positive number of seconds, got {secs}").into());
        }
    }
    Ok(())
}

fn build_components(
    cli: &Cli,
    config: &MonitorConfig,
    settings: &SettingsHandle,
    log: &EventLog,
) -> Result<MonitorComponents, Box<dyn std::error::Error>> {
    let mut camera = ImageSequenceCamera::new().with_device(CameraIndex::Local, &cli.camera_dir);
    if let Some(dir) = &cli.external_camera_dir {
        camera = camera.with_device(CameraIndex::External, dir);
    }
    let camera: Box<dyn CameraSource> = Box::new(camera);

    let pool = TrackerPool::new(Box::new(CorrelationLocalizerFactory::default()));
    let detector = ReplayFaceDetector::from_json_file(&cli.detections)?;
    let mut processor = FrameProcessor::new(Box::new(detector), pool, log.clone());

    if let Some(path) = &cli.recognitions {
        processor = processor.with_recognizer(Box::new(ReplayFaceRecognizer::from_json_file(path)?));
    }

    if let Some(path) = &config.label_font {
        let font = load_label_font(path)
            .map_err(|e| format!("Cannot load label font {}: {e}", path.display()))?;
        processor = processor.with_label_font(font);
    }

    if let Some(path) = &config.identity_store {
        let mut store = JsonIdentityStore::new(path);
        match check_identity_store(&mut store) {
            StoreStatus::Ready(n) => log.info(format!("Info: {n} identities loaded")),
            StoreStatus::Empty => {
                log.warn("Warning: identity store is empty, face recognition is unavailable")
            }
            StoreStatus::NotReady => log.warn(format!(
                "Warning: identity store {} not found, names will be blank until it appears",
                path.display()
            )),
        }
        processor = processor.with_identity_store(Box::new(store));
    }

    let evidence = ImageEvidenceStore::new(&config.evidence_dir);
    let mut aggregator = AlarmAggregator::new(
        AlarmStack::new(),
        Box::new(evidence),
        settings.clone(),
        log.clone(),
    )
    .with_signal_threshold(config.alarm_signal_threshold)
    .with_audible(Box::new(TerminalBell::stderr()));

    if let Some(path) = &config.push_config {
        let push = TelegramPush::new(PushConfig::load(path)?)?;
        aggregator = aggregator.with_push(Box::new(push));
    }

    Ok(MonitorComponents {
        camera,
        processor,
        aggregator,
        settings: settings.clone(),
        log: log.clone(),
    })
}

fn save_packet(dir: &Path, packet: &FramePacket) -> Result<(), Box<dyn std::error::Error>> {
    std::fs::create_dir_all(dir)?;
    let img = packet
        .annotated
        .to_rgb_image()
        .ok_or("Failed to create image from frame data")?;
    img.save(dir.join(format!("{:06}.png", packet.annotated.index())))?;
    Ok(())
}
